use {
    super::Repository,
    crate::{
        auction::entities,
        kernel::entities::UserId,
    },
};

impl Repository {
    /// Records the user in the auction's participant set and returns the new
    /// count. The set is additive for the auction's lifetime; leaving the
    /// room does not shrink it.
    pub async fn add_participant(
        &self,
        auction_id: entities::AuctionId,
        user_id: UserId,
    ) -> usize {
        let mut participants = self.in_memory_store.participants.write().await;
        let set = participants.entry(auction_id).or_default();
        set.insert(user_id);
        set.len()
    }

    pub async fn count_participants(&self, auction_id: entities::AuctionId) -> usize {
        self.in_memory_store
            .participants
            .read()
            .await
            .get(&auction_id)
            .map(|set| set.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::{
            MockDatabase,
            Repository,
        },
        std::time::Duration,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn participant_set_deduplicates_users() {
        let repo = Repository::new(MockDatabase::new(), Duration::from_secs(60));
        let auction_id = Uuid::new_v4();
        let user = Uuid::new_v4();

        assert_eq!(repo.add_participant(auction_id, user).await, 1);
        assert_eq!(repo.add_participant(auction_id, user).await, 1);
        assert_eq!(repo.add_participant(auction_id, Uuid::new_v4()).await, 2);
        assert_eq!(repo.count_participants(auction_id).await, 2);
        assert_eq!(repo.count_participants(Uuid::new_v4()).await, 0);
    }
}
