use {
    super::AuctionId,
    crate::kernel::entities::UserId,
    bidhub_api_types as api_types,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;

/// The public identity a bid carries into events and responses.
#[derive(Clone, Debug, PartialEq)]
pub struct Bidder {
    pub id:         UserId,
    pub username:   String,
    pub first_name: String,
    pub last_name:  String,
}

impl Bidder {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:         BidId,
    pub auction_id: AuctionId,
    pub amount:     f64,
    pub bid_time:   OffsetDateTime,
    pub is_winning: bool,
    pub bidder:     Bidder,
}

/// The leading-bid snapshot held in the fast-path cache and served to late
/// joiners. Non-authoritative; the ledger's winning bid is the truth.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadingBid {
    pub bid_id:   BidId,
    pub amount:   f64,
    pub bidder:   Bidder,
    pub bid_time: OffsetDateTime,
}

impl LeadingBid {
    pub fn of(bid: &Bid) -> Self {
        Self {
            bid_id:   bid.id,
            amount:   bid.amount,
            bidder:   bid.bidder.clone(),
            bid_time: bid.bid_time,
        }
    }
}

impl From<Bidder> for api_types::profile::UserSummary {
    fn from(bidder: Bidder) -> Self {
        Self {
            id:         bidder.id,
            username:   bidder.username,
            first_name: bidder.first_name,
            last_name:  bidder.last_name,
        }
    }
}

impl From<Bid> for api_types::bid::Bid {
    fn from(bid: Bid) -> Self {
        Self {
            id:         bid.id,
            auction_id: bid.auction_id,
            amount:     bid.amount,
            bid_time:   bid.bid_time,
            is_winning: bid.is_winning,
            bidder:     bid.bidder.into(),
        }
    }
}

impl From<LeadingBid> for api_types::bid::LeadingBid {
    fn from(leading: LeadingBid) -> Self {
        Self {
            bid_id:   leading.bid_id,
            amount:   leading.amount,
            bidder:   leading.bidder.into(),
            bid_time: leading.bid_time,
        }
    }
}
