use {
    super::Service,
    crate::{
        api::ws::UpdateEvent,
        auction::entities,
        notification::{
            entities::NotificationType,
            service::NotifyInput,
        },
    },
    bidhub_api_types::ws::AuctionStartedUpdate,
    serde_json::json,
    time::OffsetDateTime,
};

impl Service {
    /// One half of a sweep: flips due scheduled auctions to active.
    /// Per-auction failures are logged and skipped so one bad row cannot
    /// stall the rest of the sweep.
    pub async fn start_auctions(&self) {
        let due = match self.repo.get_auctions_to_start(OffsetDateTime::now_utc()).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = e.to_string(), "Failed to query auctions to start");
                return;
            }
        };
        for auction in due {
            let auction_id = auction.id;
            if let Err(e) = self.start_auction(auction).await {
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "Failed to start auction"
                );
            }
        }
    }

    async fn start_auction(&self, auction: entities::Auction) -> anyhow::Result<()> {
        if !self.repo.start_auction(auction.id).await? {
            // Another sweep won the race; the event was already published.
            return Ok(());
        }
        tracing::info!(auction_id = auction.id.to_string(), "Auction started");

        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::AuctionStarted(AuctionStartedUpdate {
                auction_id: auction.id,
                start_time: auction.start_time,
                end_time:   auction.end_time,
            }))
        {
            tracing::trace!(error = e.to_string(), "No subscriber for started update");
        }
        self.notification_service
            .notify(NotifyInput {
                user_id:    auction.seller_id,
                auction_id: Some(auction.id),
                kind:       NotificationType::AuctionStarted,
                title:      "Auction Started".to_string(),
                message:    format!("Your auction \"{}\" is now live", auction.title),
                data:       Some(json!({ "auction_id": auction.id })),
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::tests::setup_service,
        crate::{
            api::ws::UpdateEvent,
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

    fn due_auction() -> entities::Auction {
        let now = OffsetDateTime::now_utc();
        entities::Auction {
            id:                  Uuid::new_v4(),
            title:               "desk".to_string(),
            description:         String::new(),
            category:            None,
            starting_price:      1000.0,
            bid_increment:       100.0,
            current_highest_bid: None,
            start_time:          now - Duration::minutes(1),
            end_time:            now + Duration::hours(1),
            status:              entities::AuctionStatus::Scheduled,
            seller_id:           Uuid::new_v4(),
            winner_id:           None,
            winning_bid:         None,
            negotiation:         entities::Negotiation::default(),
            creation_time:       now - Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn starting_publishes_the_event_and_notifies_the_seller() {
        let auction = due_auction();
        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auctions_to_start()
                .returning(move |_| Ok(vec![auction.clone()]));
        }
        db.expect_start_auction().times(1).returning(|_| Ok(true));

        let mut notification_db = notification::repository::MockDatabase::new();
        let seller_id = auction.seller_id;
        notification_db
            .expect_add_notification()
            .times(1)
            .withf(move |n| {
                n.user_id == seller_id
                    && n.kind == notification::entities::NotificationType::AuctionStarted
            })
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        let mut events = service.event_sender.subscribe();
        service.start_auctions().await;

        match events.try_recv().unwrap() {
            UpdateEvent::AuctionStarted(update) => {
                assert_eq!(update.auction_id, auction.id);
                assert_eq!(update.end_time, auction.end_time);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn losing_the_start_race_publishes_nothing() {
        let auction = due_auction();
        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auctions_to_start()
                .returning(move |_| Ok(vec![auction.clone()]));
        }
        // Zero rows affected: another sweep already started it.
        db.expect_start_auction().times(1).returning(|_| Ok(false));

        // No notification expectations: any persistence attempt panics.
        let service = setup_service(db, notification::repository::MockDatabase::new());
        let mut events = service.event_sender.subscribe();
        service.start_auctions().await;

        assert!(events.try_recv().is_err());
    }
}
