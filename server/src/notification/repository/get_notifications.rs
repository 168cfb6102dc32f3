use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        notification::entities,
    },
};

impl Repository {
    pub async fn get_notifications(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Notification>, u64), RestError> {
        self.db.get_notifications(user_id, limit, offset).await
    }
}
