use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::UserId,
    },
    bidhub_api_types as api_types,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 50;

impl Service {
    pub async fn get_notifications(
        &self,
        user_id: UserId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<api_types::notification::Notifications, RestError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        let (notifications, total_items) = self
            .repo
            .get_notifications(user_id, i64::from(limit), offset)
            .await?;
        let unread_count = self.repo.count_unread(user_id).await.map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to count unread notifications");
            RestError::TemporarilyUnavailable
        })?;

        Ok(api_types::notification::Notifications {
            notifications: notifications.into_iter().map(Into::into).collect(),
            total_items,
            total_pages: total_items.div_ceil(u64::from(limit)),
            current_page: page,
            unread_count,
        })
    }
}
