use {
    super::{
        CachedLeadingBid,
        Repository,
    },
    crate::auction::entities,
    tokio::time::Instant,
};

impl Repository {
    pub async fn set_leading_bid(
        &self,
        auction_id: entities::AuctionId,
        snapshot: entities::LeadingBid,
    ) {
        let entry = CachedLeadingBid {
            expires_at: Instant::now() + self.leading_bid_ttl,
            snapshot,
        };
        self.in_memory_store
            .leading_bids
            .write()
            .await
            .insert(auction_id, entry);
    }
}
