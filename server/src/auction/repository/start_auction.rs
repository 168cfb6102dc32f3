use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    /// Returns false when another sweep already started the auction.
    pub async fn start_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool> {
        self.db.start_auction(auction_id).await
    }
}
