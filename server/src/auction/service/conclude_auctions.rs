use {
    super::Service,
    crate::{
        api::ws::UpdateEvent,
        auction::entities,
        kernel::entities::format_amount,
        notification::{
            entities::NotificationType,
            service::NotifyInput,
        },
    },
    bidhub_api_types::ws::AuctionEndedUpdate,
    serde_json::json,
    time::OffsetDateTime,
};

impl Service {
    /// The other half of a sweep: ends due active auctions and hands off the
    /// outcome to notifications and the event fanout.
    pub async fn conclude_auctions(&self) {
        let due = match self.repo.get_auctions_to_end(OffsetDateTime::now_utc()).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = e.to_string(), "Failed to query auctions to end");
                return;
            }
        };
        for auction in due {
            let auction_id = auction.id;
            if let Err(e) = self.conclude_auction(auction).await {
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "Failed to conclude auction"
                );
            }
        }
    }

    async fn conclude_auction(&self, auction: entities::Auction) -> anyhow::Result<()> {
        // Resolve the outcome before the guarded flip drops the cache state.
        let final_bid = self.repo.get_leading_bid(auction.id).await?;
        if !self.repo.end_auction(auction.id).await? {
            // Another sweep won the race; the event was already published.
            return Ok(());
        }
        tracing::info!(auction_id = auction.id.to_string(), "Auction ended");

        match &final_bid {
            Some(leading) => {
                self.notification_service
                    .notify(NotifyInput {
                        user_id:    leading.bidder.id,
                        auction_id: Some(auction.id),
                        kind:       NotificationType::AuctionWon,
                        title:      "Congratulations! You Won".to_string(),
                        message:    format!(
                            "You won \"{}\" with a bid of {}",
                            auction.title,
                            format_amount(leading.amount),
                        ),
                        data:       Some(json!({
                            "auction_id": auction.id,
                            "amount": leading.amount,
                        })),
                    })
                    .await;
                self.notification_service
                    .notify(NotifyInput {
                        user_id:    auction.seller_id,
                        auction_id: Some(auction.id),
                        kind:       NotificationType::AuctionEnded,
                        title:      "Auction Ended".to_string(),
                        message:    format!(
                            "Your auction \"{}\" has ended. The winning bid was {}",
                            auction.title,
                            format_amount(leading.amount),
                        ),
                        data:       Some(json!({
                            "auction_id": auction.id,
                            "amount": leading.amount,
                        })),
                    })
                    .await;
            }
            None => {
                self.notification_service
                    .notify(NotifyInput {
                        user_id:    auction.seller_id,
                        auction_id: Some(auction.id),
                        kind:       NotificationType::AuctionEnded,
                        title:      "Auction Ended".to_string(),
                        message:    format!(
                            "Your auction \"{}\" has ended with no bids. Highest bid: {}",
                            auction.title,
                            format_amount(0.0),
                        ),
                        data:       Some(json!({
                            "auction_id": auction.id,
                            "amount": 0.0,
                        })),
                    })
                    .await;
            }
        }

        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::AuctionEnded(AuctionEndedUpdate {
                auction_id: auction.id,
                final_bid:  final_bid.clone().map(Into::into),
                winner:     final_bid.map(|leading| leading.bidder.into()),
            }))
        {
            tracing::trace!(error = e.to_string(), "No subscriber for ended update");
        }
        self.repo.clear_auction_cache(auction.id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::tests::setup_service,
        crate::{
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

    fn expired_auction() -> entities::Auction {
        let now = OffsetDateTime::now_utc();
        entities::Auction {
            id:                  Uuid::new_v4(),
            title:               "desk".to_string(),
            description:         String::new(),
            category:            None,
            starting_price:      1000.0,
            bid_increment:       100.0,
            current_highest_bid: None,
            start_time:          now - Duration::hours(2),
            end_time:            now - Duration::minutes(1),
            status:              entities::AuctionStatus::Active,
            seller_id:           Uuid::new_v4(),
            winner_id:           None,
            winning_bid:         None,
            negotiation:         entities::Negotiation::default(),
            creation_time:       now - Duration::hours(3),
        }
    }

    #[tokio::test]
    async fn no_bids_means_only_a_seller_notification() {
        let auction = expired_auction();
        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auctions_to_end()
                .returning(move |_| Ok(vec![auction.clone()]));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        db.expect_end_auction().times(1).returning(|_| Ok(true));

        let mut notification_db = notification::repository::MockDatabase::new();
        let seller_id = auction.seller_id;
        notification_db
            .expect_add_notification()
            .times(1)
            .withf(move |n| {
                n.user_id == seller_id
                    && n.kind == notification::entities::NotificationType::AuctionEnded
                    && n.message.contains("0.00")
            })
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        service.conclude_auctions().await;
    }

    #[tokio::test]
    async fn winner_and_seller_are_both_notified() {
        let auction = expired_auction();
        let winner = Uuid::new_v4();
        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auctions_to_end()
                .returning(move |_| Ok(vec![auction.clone()]));
        }
        {
            let auction_id = auction.id;
            db.expect_get_winning_bid().returning(move |_| {
                Ok(Some(entities::Bid {
                    id:         Uuid::new_v4(),
                    auction_id,
                    amount:     1500.0,
                    bid_time:   OffsetDateTime::now_utc(),
                    is_winning: true,
                    bidder:     entities::Bidder {
                        id:         winner,
                        username:   "alice".to_string(),
                        first_name: "Alice".to_string(),
                        last_name:  "Tester".to_string(),
                    },
                }))
            });
        }
        db.expect_end_auction().times(1).returning(|_| Ok(true));

        let mut notification_db = notification::repository::MockDatabase::new();
        let seller_id = auction.seller_id;
        notification_db
            .expect_add_notification()
            .times(2)
            .withf(move |n| {
                (n.user_id == winner
                    && n.kind == notification::entities::NotificationType::AuctionWon)
                    || (n.user_id == seller_id
                        && n.kind == notification::entities::NotificationType::AuctionEnded)
            })
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        service.conclude_auctions().await;
    }

    #[tokio::test]
    async fn losing_the_guard_race_publishes_nothing() {
        let auction = expired_auction();
        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auctions_to_end()
                .returning(move |_| Ok(vec![auction.clone()]));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        // Zero rows affected: another sweep already ended it.
        db.expect_end_auction().times(1).returning(|_| Ok(false));

        // No notification expectations: any persistence attempt panics.
        let service = setup_service(db, notification::repository::MockDatabase::new());
        service.conclude_auctions().await;
    }
}
