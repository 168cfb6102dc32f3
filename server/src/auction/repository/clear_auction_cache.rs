use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    /// Drops all fast-path state for a concluded auction. Safe to call at any
    /// time; readers fall back to the durable stores.
    pub async fn clear_auction_cache(&self, auction_id: entities::AuctionId) {
        self.in_memory_store
            .leading_bids
            .write()
            .await
            .remove(&auction_id);
        self.in_memory_store
            .participants
            .write()
            .await
            .remove(&auction_id);
        self.remove_auction_lock(&auction_id).await;
    }
}
