use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::{
            entities,
            repository::CommitBidInput,
        },
        kernel::entities::format_amount,
        notification::{
            entities::NotificationType,
            service::NotifyInput,
        },
    },
    bidhub_api_types::ws::NewBidUpdate,
    serde_json::json,
    time::OffsetDateTime,
    tracing::instrument,
};

#[derive(Clone, Debug)]
pub struct PlaceBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder:     entities::Bidder,
    pub amount:     f64,
}

#[derive(Clone, Debug)]
pub struct PlacedBid {
    pub bid:              entities::Bid,
    pub minimum_next_bid: f64,
}

impl Service {
    /// Accepts or rejects a bid. Success means the ledger row is committed;
    /// everything after the commit (cache, notifications, fanout) is best
    /// effort and can never turn a committed bid into a failure.
    #[instrument(
        target = "metrics",
        name = "place_bid",
        fields(category = "auction_service", result = "success", name = "place_bid"),
        skip_all
    )]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<PlacedBid, RestError> {
        let result = self.place_bid_inner(input).await;
        if result.is_err() {
            tracing::Span::current().record("result", "error");
        }
        result
    }

    async fn place_bid_inner(&self, input: PlaceBidInput) -> Result<PlacedBid, RestError> {
        let now = OffsetDateTime::now_utc();
        let auction = self.repo.get_auction(input.auction_id).await?;
        let leading = self
            .repo
            .get_leading_bid(input.auction_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = e.to_string(),
                    auction_id = input.auction_id.to_string(),
                    "Failed to resolve leading bid"
                );
                RestError::TemporarilyUnavailable
            })?;
        self.verify_bid_preconditions(
            &auction,
            input.bidder.id,
            input.amount,
            leading.as_ref().map(|leading| leading.amount),
            now,
        )?;

        // Serialize commits per auction; the transaction re-checks deadline
        // and minimum under the row lock, so a racer that loses the lock
        // race is measured against the winner's amount.
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let committed = {
            let _lock = auction_lock.lock().await;
            self.repo
                .commit_bid(CommitBidInput {
                    auction_id: input.auction_id,
                    bidder:     input.bidder,
                    amount:     input.amount,
                    now:        OffsetDateTime::now_utc(),
                })
                .await
        };
        // The local clone must be gone before cleanup, or the entry always
        // looks contended and is never reclaimed.
        drop(auction_lock);
        self.repo.remove_auction_lock(&input.auction_id).await;
        let committed = committed?;

        let bid = committed.bid;
        let minimum_next_bid = auction.minimum_next_bid(Some(bid.amount));

        self.notification_service
            .notify(NotifyInput {
                user_id:    auction.seller_id,
                auction_id: Some(auction.id),
                kind:       NotificationType::NewBid,
                title:      "New Bid Received".to_string(),
                message:    format!(
                    "{} placed a bid of {} on your auction \"{}\"",
                    bid.bidder.display_name(),
                    format_amount(bid.amount),
                    auction.title,
                ),
                data:       Some(json!({
                    "auction_id": auction.id,
                    "amount": bid.amount,
                })),
            })
            .await;
        if let Some(previous) = committed.previous_leader {
            if previous.bidder_id != bid.bidder.id {
                self.notification_service
                    .notify(NotifyInput {
                        user_id:    previous.bidder_id,
                        auction_id: Some(auction.id),
                        kind:       NotificationType::Outbid,
                        title:      "You Have Been Outbid".to_string(),
                        message:    format!(
                            "You have been outbid on \"{}\". The highest bid is now {}",
                            auction.title,
                            format_amount(bid.amount),
                        ),
                        data:       Some(json!({
                            "auction_id": auction.id,
                            "amount": bid.amount,
                            "previous_amount": previous.amount,
                        })),
                    })
                    .await;
            }
        }

        if let Err(e) = self.event_sender.send(UpdateEvent::NewBid(NewBidUpdate {
            auction_id: auction.id,
            bid: bid.clone().into(),
            minimum_next_bid,
        })) {
            tracing::trace!(error = e.to_string(), "No subscriber for new bid update");
        }

        Ok(PlacedBid {
            bid,
            minimum_next_bid,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::setup_service,
            *,
        },
        crate::{
            auction::repository::{
                CommittedBid,
                MockDatabase,
                PreviousLeader,
            },
            notification,
        },
        time::Duration,
        uuid::Uuid,
    };

    fn bidder(name: &str) -> entities::Bidder {
        entities::Bidder {
            id:         Uuid::new_v4(),
            username:   name.to_string(),
            first_name: name.to_string(),
            last_name:  "Tester".to_string(),
        }
    }

    fn active_auction() -> entities::Auction {
        let now = OffsetDateTime::now_utc();
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

    fn committed(auction_id: entities::AuctionId, bidder: entities::Bidder, amount: f64) -> CommittedBid {
        CommittedBid {
            bid:             entities::Bid {
                id: Uuid::new_v4(),
                auction_id,
                amount,
                bid_time: OffsetDateTime::now_utc(),
                is_winning: true,
                bidder,
            },
            previous_leader: None,
        }
    }

    #[tokio::test]
    async fn accepted_bid_notifies_seller_and_updates_cache() {
        let auction = active_auction();
        let alice = bidder("alice");

        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auction()
                .returning(move |_| Ok(auction.clone()));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        {
            let alice = alice.clone();
            let auction_id = auction.id;
            db.expect_commit_bid()
                .times(1)
                .returning(move |input| Ok(committed(auction_id, alice.clone(), input.amount)));
        }
        let mut notification_db = notification::repository::MockDatabase::new();
        notification_db
            .expect_add_notification()
            .times(1)
            .withf({
                let seller_id = auction.seller_id;
                move |n| {
                    n.user_id == seller_id
                        && n.kind == notification::entities::NotificationType::NewBid
                }
            })
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        let placed = service
            .place_bid(PlaceBidInput {
                auction_id: auction.id,
                bidder:     alice.clone(),
                amount:     1100.0,
            })
            .await
            .unwrap();

        assert_eq!(placed.bid.amount, 1100.0);
        assert_eq!(placed.minimum_next_bid, 1200.0);
        // The fast path now serves the committed bid without a db read.
        let leading = service.repo.get_leading_bid(auction.id).await.unwrap();
        assert_eq!(leading.map(|l| l.amount), Some(1100.0));
    }

    #[tokio::test]
    async fn auction_lock_entry_is_reclaimed_after_the_commit() {
        let auction = active_auction();
        let alice = bidder("alice");

        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auction()
                .returning(move |_| Ok(auction.clone()));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        {
            let alice = alice.clone();
            let auction_id = auction.id;
            db.expect_commit_bid()
                .returning(move |input| Ok(committed(auction_id, alice.clone(), input.amount)));
        }
        let mut notification_db = notification::repository::MockDatabase::new();
        notification_db
            .expect_add_notification()
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        service
            .place_bid(PlaceBidInput {
                auction_id: auction.id,
                bidder:     alice,
                amount:     1100.0,
            })
            .await
            .unwrap();

        // Uncontended lock entries do not outlive the commit.
        assert!(service
            .repo
            .in_memory_store
            .auction_locks
            .lock()
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn displaced_leader_gets_an_outbid_notification() {
        let auction = active_auction();
        let alice = bidder("alice");
        let bob = bidder("bob");

        let mut db = MockDatabase::new();
        {
            let mut auction = auction.clone();
            auction.current_highest_bid = Some(1100.0);
            db.expect_get_auction()
                .returning(move |_| Ok(auction.clone()));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        {
            let bob = bob.clone();
            let alice_id = alice.id;
            let auction_id = auction.id;
            db.expect_commit_bid().times(1).returning(move |input| {
                let mut result = committed(auction_id, bob.clone(), input.amount);
                result.previous_leader = Some(PreviousLeader {
                    bidder_id: alice_id,
                    amount:    1100.0,
                });
                Ok(result)
            });
        }
        let mut notification_db = notification::repository::MockDatabase::new();
        let seller_id = auction.seller_id;
        let alice_id = alice.id;
        notification_db
            .expect_add_notification()
            .times(2)
            .withf(move |n| {
                (n.user_id == seller_id
                    && n.kind == notification::entities::NotificationType::NewBid)
                    || (n.user_id == alice_id
                        && n.kind == notification::entities::NotificationType::Outbid)
            })
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        service
            .place_bid(PlaceBidInput {
                auction_id: auction.id,
                bidder:     bob,
                amount:     1200.0,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn raising_your_own_leading_bid_sends_no_outbid() {
        let auction = active_auction();
        let alice = bidder("alice");

        let mut db = MockDatabase::new();
        {
            let mut auction = auction.clone();
            auction.current_highest_bid = Some(1100.0);
            db.expect_get_auction()
                .returning(move |_| Ok(auction.clone()));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        {
            let alice = alice.clone();
            let auction_id = auction.id;
            db.expect_commit_bid().times(1).returning(move |input| {
                let mut result = committed(auction_id, alice.clone(), input.amount);
                result.previous_leader = Some(PreviousLeader {
                    bidder_id: alice.id,
                    amount:    1100.0,
                });
                Ok(result)
            });
        }
        // Only the seller notification; times(1) fails on an outbid push.
        let mut notification_db = notification::repository::MockDatabase::new();
        notification_db
            .expect_add_notification()
            .times(1)
            .returning(|_| Ok(()));

        let service = setup_service(db, notification_db);
        service
            .place_bid(PlaceBidInput {
                auction_id: auction.id,
                bidder:     alice,
                amount:     1200.0,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn commit_rejection_is_returned_verbatim() {
        let auction = active_auction();

        let mut db = MockDatabase::new();
        {
            let auction = auction.clone();
            db.expect_get_auction()
                .returning(move |_| Ok(auction.clone()));
        }
        db.expect_get_winning_bid().returning(|_| Ok(None));
        // The racer lost: commit-time minimum moved to 1200.
        db.expect_commit_bid()
            .times(1)
            .returning(|_| Err(RestError::BidTooLow { minimum: 1200.0 }));
        let service = setup_service(db, notification::repository::MockDatabase::new());

        let result = service
            .place_bid(PlaceBidInput {
                auction_id: auction.id,
                bidder:     bidder("bob"),
                amount:     1100.0,
            })
            .await;
        assert_eq!(
            result.err().map(|e| e.to_status_and_message().1),
            Some("Minimum bid is 1200.00".to_string())
        );
    }
}
