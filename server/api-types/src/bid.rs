use {
    crate::{
        profile::UserSummary,
        AuctionId,
        BidId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct Bid {
    /// The id of the bid
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:         BidId,
    #[schema(value_type = String)]
    pub auction_id: AuctionId,
    /// Amount of the bid in monetary units
    #[schema(example = 1100.0)]
    pub amount:     f64,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub bid_time:   OffsetDateTime,
    /// Whether this bid is the current leading bid of its auction
    pub is_winning: bool,
    pub bidder:     UserSummary,
}

/// The leading bid of an auction, as served from the fast-path cache or
/// repaired from the durable ledger.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct LeadingBid {
    #[schema(value_type = String)]
    pub bid_id:   BidId,
    #[schema(example = 1100.0)]
    pub amount:   f64,
    pub bidder:   UserSummary,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub bid_time: OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct PlaceBid {
    /// Amount of the bid in monetary units
    #[schema(example = 1100.0)]
    pub amount: f64,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct BidResult {
    pub bid:              Bid,
    /// The smallest amount the next bid must meet
    #[schema(example = 1200.0)]
    pub minimum_next_bid: f64,
}

#[derive(Serialize, Deserialize, IntoParams, Clone, Debug)]
pub struct PageQueryParams {
    /// 1-based page number
    #[param(example = 1)]
    pub page:  Option<u32>,
    /// Page size, capped by the server
    #[param(example = 20)]
    pub limit: Option<u32>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct Bids {
    pub bids:         Vec<Bid>,
    pub total_items:  u64,
    pub total_pages:  u64,
    pub current_page: u32,
}
