use {
    super::bid::LeadingBid,
    crate::kernel::entities::UserId,
    bidhub_api_types as api_types,
    std::sync::Arc,
    time::OffsetDateTime,
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AuctionId = Uuid;

/// Serializes bid commits for one auction. Held only for the duration of a
/// single commit; bids on different auctions never contend.
pub type AuctionLock = Arc<Mutex<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    Draft,
    Scheduled,
    Active,
    Ended,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SellerDecision {
    Pending,
    Accepted,
    Rejected,
    CounterOffered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterOfferStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Post-close negotiation state. Owned by the negotiation workflow; the core
/// only carries it through to the read surface and the ended handoff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Negotiation {
    pub seller_decision:         Option<SellerDecision>,
    pub counter_offer_amount:    Option<f64>,
    pub counter_offer_status:    Option<CounterOfferStatus>,
    pub is_transaction_complete: bool,
}

#[derive(Clone, Debug)]
pub struct Auction {
    pub id:                  AuctionId,
    pub title:               String,
    pub description:         String,
    pub category:            Option<String>,
    pub starting_price:      f64,
    pub bid_increment:       f64,
    pub current_highest_bid: Option<f64>,
    pub start_time:          OffsetDateTime,
    pub end_time:            OffsetDateTime,
    pub status:              AuctionStatus,
    pub seller_id:           UserId,
    pub winner_id:           Option<UserId>,
    pub winning_bid:         Option<f64>,
    pub negotiation:         Negotiation,
    pub creation_time:       OffsetDateTime,
}

impl Auction {
    /// The effective status at `now`. The stored status can lag the clock
    /// between sweeps, so every decision that depends on the auction being
    /// live recomputes it instead of trusting the stored value.
    ///
    /// Draft, ended and cancelled states are terminal for this computation;
    /// scheduled/active only ever move forward with the clock.
    pub fn status_at(&self, now: OffsetDateTime) -> AuctionStatus {
        match self.status {
            AuctionStatus::Draft => AuctionStatus::Draft,
            AuctionStatus::Ended => AuctionStatus::Ended,
            AuctionStatus::Cancelled => AuctionStatus::Cancelled,
            AuctionStatus::Scheduled | AuctionStatus::Active => {
                if now >= self.end_time {
                    AuctionStatus::Ended
                } else if now >= self.start_time {
                    AuctionStatus::Active
                } else {
                    AuctionStatus::Scheduled
                }
            }
        }
    }

    pub fn is_open_for_bids(&self, now: OffsetDateTime) -> bool {
        self.status_at(now) == AuctionStatus::Active && now < self.end_time
    }

    /// The smallest acceptable next bid given the current leading amount,
    /// falling back to the starting price when no bid exists.
    pub fn minimum_next_bid(&self, leading_amount: Option<f64>) -> f64 {
        leading_amount.unwrap_or(self.starting_price) + self.bid_increment
    }

    pub fn to_api_type(&self, leading_bid: Option<&LeadingBid>, now: OffsetDateTime) -> api_types::auction::Auction {
        // The cache snapshot wins over the durable row when it is present:
        // the row can lag one commit behind the fast path.
        let leading_amount = leading_bid
            .map(|bid| bid.amount)
            .or(self.current_highest_bid);
        api_types::auction::Auction {
            id:                  self.id,
            title:               self.title.clone(),
            description:         self.description.clone(),
            category:            self.category.clone(),
            starting_price:      self.starting_price,
            bid_increment:       self.bid_increment,
            current_highest_bid: leading_amount,
            start_time:          self.start_time,
            end_time:            self.end_time,
            status:              self.status_at(now).into(),
            seller_id:           self.seller_id,
            winner_id:           self.winner_id,
            winning_bid:         self.winning_bid,
            negotiation:         api_types::auction::Negotiation {
                seller_decision:         self.negotiation.seller_decision.map(Into::into),
                counter_offer_amount:    self.negotiation.counter_offer_amount,
                counter_offer_status:    self.negotiation.counter_offer_status.map(Into::into),
                is_transaction_complete: self.negotiation.is_transaction_complete,
            },
            minimum_next_bid:    self.minimum_next_bid(leading_amount),
        }
    }
}

impl From<AuctionStatus> for api_types::auction::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Draft => Self::Draft,
            AuctionStatus::Scheduled => Self::Scheduled,
            AuctionStatus::Active => Self::Active,
            AuctionStatus::Ended => Self::Ended,
            AuctionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<SellerDecision> for api_types::auction::SellerDecision {
    fn from(decision: SellerDecision) -> Self {
        match decision {
            SellerDecision::Pending => Self::Pending,
            SellerDecision::Accepted => Self::Accepted,
            SellerDecision::Rejected => Self::Rejected,
            SellerDecision::CounterOffered => Self::CounterOffered,
        }
    }
}

impl From<CounterOfferStatus> for api_types::auction::CounterOfferStatus {
    fn from(status: CounterOfferStatus) -> Self {
        match status {
            CounterOfferStatus::Pending => Self::Pending,
            CounterOfferStatus::Accepted => Self::Accepted,
            CounterOfferStatus::Rejected => Self::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        time::Duration,
    };

    fn auction_at(status: AuctionStatus, start: OffsetDateTime, end: OffsetDateTime) -> Auction {
        Auction {
            id: Uuid::new_v4(),
            title: "test".to_string(),
            description: String::new(),
            category: None,
            starting_price: 1000.0,
            bid_increment: 100.0,
            current_highest_bid: None,
            start_time: start,
            end_time: end,
            status,
            seller_id: Uuid::new_v4(),
            winner_id: None,
            winning_bid: None,
            negotiation: Negotiation::default(),
            creation_time: start,
        }
    }

    #[test]
    fn status_follows_the_clock() {
        let start = OffsetDateTime::UNIX_EPOCH + Duration::hours(1);
        let end = start + Duration::hours(2);
        let auction = auction_at(AuctionStatus::Scheduled, start, end);

        assert_eq!(
            auction.status_at(start - Duration::minutes(1)),
            AuctionStatus::Scheduled
        );
        assert_eq!(auction.status_at(start), AuctionStatus::Active);
        assert_eq!(
            auction.status_at(end - Duration::seconds(1)),
            AuctionStatus::Active
        );
        // At the deadline exactly, the auction is no longer biddable.
        assert_eq!(auction.status_at(end), AuctionStatus::Ended);
        assert!(!auction.is_open_for_bids(end));
    }

    #[test]
    fn status_never_regresses() {
        let start = OffsetDateTime::UNIX_EPOCH;
        let end = start + Duration::hours(1);
        let auction = auction_at(AuctionStatus::Scheduled, start, end);

        let order = |status: AuctionStatus| match status {
            AuctionStatus::Draft => 0,
            AuctionStatus::Scheduled => 1,
            AuctionStatus::Active => 2,
            AuctionStatus::Ended => 3,
            AuctionStatus::Cancelled => 4,
        };
        let mut last = 0;
        for minutes in 0..=90 {
            let status = auction.status_at(start + Duration::minutes(minutes));
            assert!(order(status) >= last);
            last = order(status);
        }
    }

    #[test]
    fn terminal_statuses_ignore_the_clock() {
        let start = OffsetDateTime::UNIX_EPOCH;
        let end = start + Duration::hours(1);
        let cancelled = auction_at(AuctionStatus::Cancelled, start, end);
        assert_eq!(
            cancelled.status_at(start + Duration::minutes(30)),
            AuctionStatus::Cancelled
        );
        let draft = auction_at(AuctionStatus::Draft, start, end);
        assert_eq!(
            draft.status_at(start + Duration::minutes(30)),
            AuctionStatus::Draft
        );
    }

    #[test]
    fn minimum_next_bid_falls_back_to_starting_price() {
        let start = OffsetDateTime::UNIX_EPOCH;
        let auction = auction_at(AuctionStatus::Active, start, start + Duration::hours(1));
        assert_eq!(auction.minimum_next_bid(None), 1100.0);
        assert_eq!(auction.minimum_next_bid(Some(1100.0)), 1200.0);
    }
}
