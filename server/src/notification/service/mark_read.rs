use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        notification::entities,
    },
};

impl Service {
    pub async fn mark_read(
        &self,
        user_id: UserId,
        notification_id: entities::NotificationId,
    ) -> Result<(), RestError> {
        self.repo.mark_notification_read(user_id, notification_id).await
    }
}
