use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

impl Service {
    /// The precondition ladder for an incoming bid, checked in order so the
    /// caller always gets the most specific rejection. The same deadline and
    /// minimum checks run again inside the commit transaction; this pass only
    /// rejects cheaply before the auction lock is taken.
    pub(super) fn verify_bid_preconditions(
        &self,
        auction: &entities::Auction,
        bidder_id: UserId,
        amount: f64,
        leading_amount: Option<f64>,
        now: OffsetDateTime,
    ) -> Result<(), RestError> {
        if !auction.is_open_for_bids(now) {
            return Err(RestError::AuctionNotActive);
        }
        if auction.seller_id == bidder_id {
            return Err(RestError::SelfBidding);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RestError::BadParameters(
                "Bid amount must be a positive number".to_string(),
            ));
        }
        let minimum = auction.minimum_next_bid(leading_amount.or(auction.current_highest_bid));
        if amount < minimum {
            return Err(RestError::BidTooLow { minimum });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::tests::setup_service,
        crate::{
            api::RestError,
            auction::{
                entities,
                repository::MockDatabase,
            },
            notification,
        },
        time::{
            Duration,
            OffsetDateTime,
        },
        uuid::Uuid,
    };

    fn active_auction(now: OffsetDateTime) -> entities::Auction {
        entities::Auction {
            id:                  Uuid::new_v4(),
            title:               "desk".to_string(),
            description:         String::new(),
            category:            None,
            starting_price:      1000.0,
            bid_increment:       100.0,
            current_highest_bid: None,
            start_time:          now - Duration::hours(1),
            end_time:            now + Duration::hours(1),
            status:              entities::AuctionStatus::Active,
            seller_id:           Uuid::new_v4(),
            winner_id:           None,
            winning_bid:         None,
            negotiation:         entities::Negotiation::default(),
            creation_time:       now - Duration::hours(2),
        }
    }

    #[tokio::test]
    async fn rejections_are_checked_in_order() {
        let service = setup_service(
            MockDatabase::new(),
            notification::repository::MockDatabase::new(),
        );
        let now = OffsetDateTime::now_utc();
        let auction = active_auction(now);
        let bidder = Uuid::new_v4();

        // Past the deadline the auction is closed no matter what else is
        // wrong with the bid.
        assert_eq!(
            service.verify_bid_preconditions(
                &auction,
                auction.seller_id,
                -1.0,
                None,
                now + Duration::hours(2)
            ),
            Err(RestError::AuctionNotActive)
        );
        assert_eq!(
            service.verify_bid_preconditions(&auction, auction.seller_id, 1100.0, None, now),
            Err(RestError::SelfBidding)
        );
        assert_eq!(
            service.verify_bid_preconditions(&auction, bidder, f64::NAN, None, now),
            Err(RestError::BadParameters(
                "Bid amount must be a positive number".to_string()
            ))
        );
        assert_eq!(
            service.verify_bid_preconditions(&auction, bidder, 1099.0, None, now),
            Err(RestError::BidTooLow { minimum: 1100.0 })
        );
        assert_eq!(
            service.verify_bid_preconditions(&auction, bidder, 1100.0, None, now),
            Ok(())
        );
    }

    #[tokio::test]
    async fn minimum_prefers_the_cache_snapshot_over_the_row() {
        let service = setup_service(
            MockDatabase::new(),
            notification::repository::MockDatabase::new(),
        );
        let now = OffsetDateTime::now_utc();
        let mut auction = active_auction(now);
        auction.current_highest_bid = Some(1100.0);
        let bidder = Uuid::new_v4();

        // The durable row says 1100 but the cache already saw 1200.
        assert_eq!(
            service.verify_bid_preconditions(&auction, bidder, 1250.0, Some(1200.0), now),
            Err(RestError::BidTooLow { minimum: 1300.0 })
        );
        // Without a cache snapshot the row's denormalized amount is the floor.
        assert_eq!(
            service.verify_bid_preconditions(&auction, bidder, 1200.0, None, now),
            Ok(())
        );
    }
}
