use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Bid>, u64), RestError> {
        self.db.get_bids(auction_id, limit, offset).await
    }
}
