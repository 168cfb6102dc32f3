use {
    crate::{
        bid::LeadingBid,
        AuctionId,
        UserId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Scheduled,
    Active,
    Ended,
    Cancelled,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SellerDecision {
    Pending,
    Accepted,
    Rejected,
    CounterOffered,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CounterOfferStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Post-close negotiation state, owned by the negotiation workflow and
/// exposed read-only by this server.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct Negotiation {
    pub seller_decision:         Option<SellerDecision>,
    #[schema(example = 1500.0)]
    pub counter_offer_amount:    Option<f64>,
    pub counter_offer_status:    Option<CounterOfferStatus>,
    pub is_transaction_complete: bool,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct Auction {
    /// The id of the auction
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:                  AuctionId,
    #[schema(example = "Antique writing desk")]
    pub title:               String,
    pub description:         String,
    #[schema(example = "Furniture")]
    pub category:            Option<String>,
    /// The floor for the first bid, in monetary units
    #[schema(example = 1000.0)]
    pub starting_price:      f64,
    /// The minimum step between consecutive bids
    #[schema(example = 100.0)]
    pub bid_increment:       f64,
    /// Denormalized snapshot of the leading bid amount, if any bid exists
    #[schema(example = 1100.0)]
    pub current_highest_bid: Option<f64>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_time:          OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_time:            OffsetDateTime,
    /// The effective status, recomputed from the clock at read time
    pub status:              AuctionStatus,
    #[schema(value_type = String)]
    pub seller_id:           UserId,
    #[schema(value_type = Option<String>)]
    pub winner_id:           Option<UserId>,
    pub winning_bid:         Option<f64>,
    pub negotiation:         Negotiation,
    /// The minimum amount the next bid must meet
    #[schema(example = 1200.0)]
    pub minimum_next_bid:    f64,
}

/// The registry view of an auction merged with the fast-path leading-bid
/// snapshot when one is fresher than the durable row.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct AuctionSnapshot {
    pub auction:           Auction,
    pub leading_bid:       Option<LeadingBid>,
    #[schema(example = 7)]
    pub participant_count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CreateAuction {
    #[schema(example = "Antique writing desk")]
    pub title:          String,
    pub description:    String,
    #[schema(example = "Furniture")]
    pub category:       Option<String>,
    #[schema(example = 1000.0)]
    pub starting_price: f64,
    #[schema(example = 100.0)]
    pub bid_increment:  f64,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_time:     OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_time:       OffsetDateTime,
}
