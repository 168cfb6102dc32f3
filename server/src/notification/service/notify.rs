use {
    super::Service,
    crate::{
        api::ws::UpdateEvent,
        auction::entities::AuctionId,
        kernel::entities::UserId,
        notification::entities,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

#[derive(Clone, Debug)]
pub struct NotifyInput {
    pub user_id:    UserId,
    pub auction_id: Option<AuctionId>,
    pub kind:       entities::NotificationType,
    pub title:      String,
    pub message:    String,
    pub data:       Option<serde_json::Value>,
}

impl Service {
    /// Persists the notification, then pushes it to the recipient's live
    /// connections. The persisted record is the truth; the push is a
    /// convenience. Failures are logged and swallowed so callers on the bid
    /// path never fail because of a notification.
    pub async fn notify(&self, input: NotifyInput) -> Option<entities::Notification> {
        let notification = entities::Notification {
            id:            Uuid::new_v4(),
            user_id:       input.user_id,
            auction_id:    input.auction_id,
            kind:          input.kind,
            title:         input.title,
            message:       input.message,
            is_read:       false,
            data:          input.data,
            creation_time: OffsetDateTime::now_utc(),
        };
        match self.repo.add_notification(notification).await {
            Ok(notification) => {
                // No live subscriber is not an error.
                let _ = self.event_sender.send(UpdateEvent::Notification {
                    user_id:      notification.user_id,
                    notification: notification.clone().into(),
                });
                Some(notification)
            }
            Err(e) => {
                tracing::error!(
                    error = e.to_string(),
                    user_id = input.user_id.to_string(),
                    "Failed to persist notification"
                );
                None
            }
        }
    }
}
