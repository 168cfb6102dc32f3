use {
    super::Repository,
    crate::auction::entities,
    tokio::time::Instant,
};

impl Repository {
    async fn get_cached_leading_bid(
        &self,
        auction_id: entities::AuctionId,
    ) -> Option<entities::LeadingBid> {
        {
            let leading_bids = self.in_memory_store.leading_bids.read().await;
            match leading_bids.get(&auction_id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.snapshot.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Stale entry: drop it so the next read goes straight to the db.
        self.in_memory_store
            .leading_bids
            .write()
            .await
            .remove(&auction_id);
        None
    }

    /// The current leading bid, served from the cache when fresh and repaired
    /// from the ledger's winning bid otherwise.
    pub async fn get_leading_bid(
        &self,
        auction_id: entities::AuctionId,
    ) -> anyhow::Result<Option<entities::LeadingBid>> {
        if let Some(snapshot) = self.get_cached_leading_bid(auction_id).await {
            return Ok(Some(snapshot));
        }
        match self.db.get_winning_bid(auction_id).await? {
            Some(bid) => {
                let snapshot = entities::LeadingBid::of(&bid);
                self.set_leading_bid(auction_id, snapshot.clone()).await;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::{
            MockDatabase,
            Repository,
        },
        crate::auction::entities,
        std::time::Duration,
        time::OffsetDateTime,
        uuid::Uuid,
    };

    fn bid(auction_id: entities::AuctionId, amount: f64) -> entities::Bid {
        entities::Bid {
            id: Uuid::new_v4(),
            auction_id,
            amount,
            bid_time: OffsetDateTime::UNIX_EPOCH,
            is_winning: true,
            bidder: entities::Bidder {
                id:         Uuid::new_v4(),
                username:   "bidder".to_string(),
                first_name: "Bid".to_string(),
                last_name:  "Der".to_string(),
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entries_never_touch_the_db() {
        let auction_id = Uuid::new_v4();
        let cached = bid(auction_id, 1100.0);
        let repo = Repository::new(MockDatabase::new(), Duration::from_secs(60));
        repo.set_leading_bid(auction_id, entities::LeadingBid::of(&cached))
            .await;

        let got = repo.get_leading_bid(auction_id).await.unwrap();
        assert_eq!(got.map(|b| b.bid_id), Some(cached.id));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_repaired_from_the_db() {
        let auction_id = Uuid::new_v4();
        let cached = bid(auction_id, 1100.0);
        let repaired = bid(auction_id, 1200.0);
        let repaired_id = repaired.id;

        let mut db = MockDatabase::new();
        db.expect_get_winning_bid()
            .times(1)
            .returning(move |_| Ok(Some(repaired.clone())));
        let repo = Repository::new(db, Duration::from_secs(60));
        repo.set_leading_bid(auction_id, entities::LeadingBid::of(&cached))
            .await;

        tokio::time::advance(Duration::from_secs(61)).await;
        let got = repo.get_leading_bid(auction_id).await.unwrap();
        assert_eq!(got.map(|b| b.bid_id), Some(repaired_id));

        // The repaired snapshot is cached again; times(1) above would fail
        // if this read went back to the db.
        let got = repo.get_leading_bid(auction_id).await.unwrap();
        assert_eq!(got.map(|b| b.bid_id), Some(repaired_id));
    }

    #[tokio::test]
    async fn missing_auction_has_no_leading_bid() {
        let mut db = MockDatabase::new();
        db.expect_get_winning_bid().returning(|_| Ok(None));
        let repo = Repository::new(db, Duration::from_secs(60));
        assert!(repo
            .get_leading_bid(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
