use {
    super::Repository,
    crate::kernel::entities::UserId,
};

impl Repository {
    pub async fn count_unread(&self, user_id: UserId) -> anyhow::Result<u64> {
        self.db.count_unread(user_id).await
    }
}
