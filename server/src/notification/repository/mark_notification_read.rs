use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        notification::entities,
    },
};

impl Repository {
    pub async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: entities::NotificationId,
    ) -> Result<(), RestError> {
        self.db.mark_notification_read(user_id, notification_id).await
    }
}
