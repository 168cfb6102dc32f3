use {
    super::Repository,
    crate::notification::entities,
};

impl Repository {
    pub async fn add_notification(
        &self,
        notification: entities::Notification,
    ) -> anyhow::Result<entities::Notification> {
        self.db.add_notification(&notification).await?;
        Ok(notification)
    }
}
