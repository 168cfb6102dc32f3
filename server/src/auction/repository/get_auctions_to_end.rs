use {
    super::Repository,
    crate::auction::entities,
    time::OffsetDateTime,
};

impl Repository {
    pub async fn get_auctions_to_end(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::Auction>> {
        self.db.get_auctions_to_end(now).await
    }
}
