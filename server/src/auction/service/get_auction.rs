use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
    bidhub_api_types as api_types,
    time::OffsetDateTime,
};

impl Service {
    /// The registry view merged with the fast-path snapshot: the cache's
    /// leading bid can be one commit ahead of the durable row.
    pub async fn get_auction_snapshot(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<api_types::auction::AuctionSnapshot, RestError> {
        let auction = self.repo.get_auction(auction_id).await?;
        let leading = self.repo.get_leading_bid(auction_id).await.map_err(|e| {
            tracing::error!(
                error = e.to_string(),
                auction_id = auction_id.to_string(),
                "Failed to resolve leading bid"
            );
            RestError::TemporarilyUnavailable
        })?;
        let participant_count = self.repo.count_participants(auction_id).await;
        Ok(api_types::auction::AuctionSnapshot {
            auction: auction.to_api_type(leading.as_ref(), OffsetDateTime::now_utc()),
            leading_bid: leading.map(Into::into),
            participant_count,
        })
    }
}
