use {
    super::{
        CommitBidInput,
        CommittedBid,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    // NOTE: Only call this while holding the auction's `AuctionLock`.
    pub async fn commit_bid(&self, input: CommitBidInput) -> Result<CommittedBid, RestError> {
        let committed = self.db.commit_bid(input).await?;
        // Cache updates after the commit are best effort: a crash between the
        // commit and here leaves a stale entry that the TTL repairs.
        self.set_leading_bid(
            committed.bid.auction_id,
            entities::LeadingBid::of(&committed.bid),
        )
        .await;
        self.add_participant(committed.bid.auction_id, committed.bid.bidder.id)
            .await;
        Ok(committed)
    }
}
