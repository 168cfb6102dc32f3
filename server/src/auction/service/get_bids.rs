use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
    bidhub_api_types as api_types,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 50;

impl Service {
    pub async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<api_types::bid::Bids, RestError> {
        // Unknown auctions are a 404, not an empty page.
        self.repo.get_auction(auction_id).await?;

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);
        let (bids, total_items) = self
            .repo
            .get_bids(auction_id, i64::from(limit), offset)
            .await?;
        Ok(api_types::bid::Bids {
            bids: bids.into_iter().map(Into::into).collect(),
            total_items,
            total_pages: total_items.div_ceil(u64::from(limit)),
            current_page: page,
        })
    }
}
