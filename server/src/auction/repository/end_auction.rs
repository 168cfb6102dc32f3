use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    /// Returns false when another sweep already ended the auction.
    pub async fn end_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool> {
        self.db.end_auction(auction_id).await
    }
}
