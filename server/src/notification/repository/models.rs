#[cfg(test)]
use mockall::automock;
use {
    crate::{
        api::RestError,
        auction::entities::AuctionId,
        kernel::{
            db::DB,
            entities::UserId,
        },
        notification::entities,
    },
    axum::async_trait,
    sqlx::FromRow,
    std::fmt::Debug,
    time::{
        PrimitiveDateTime,
        UtcOffset,
    },
    tracing::instrument,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
pub enum NotificationType {
    NewBid,
    Outbid,
    AuctionWon,
    AuctionLost,
    AuctionStarted,
    AuctionEnded,
    BidAccepted,
    BidRejected,
    CounterOffer,
    CounterOfferAccepted,
    CounterOfferRejected,
}

impl From<NotificationType> for entities::NotificationType {
    fn from(kind: NotificationType) -> Self {
        match kind {
            NotificationType::NewBid => Self::NewBid,
            NotificationType::Outbid => Self::Outbid,
            NotificationType::AuctionWon => Self::AuctionWon,
            NotificationType::AuctionLost => Self::AuctionLost,
            NotificationType::AuctionStarted => Self::AuctionStarted,
            NotificationType::AuctionEnded => Self::AuctionEnded,
            NotificationType::BidAccepted => Self::BidAccepted,
            NotificationType::BidRejected => Self::BidRejected,
            NotificationType::CounterOffer => Self::CounterOffer,
            NotificationType::CounterOfferAccepted => Self::CounterOfferAccepted,
            NotificationType::CounterOfferRejected => Self::CounterOfferRejected,
        }
    }
}

impl From<entities::NotificationType> for NotificationType {
    fn from(kind: entities::NotificationType) -> Self {
        match kind {
            entities::NotificationType::NewBid => Self::NewBid,
            entities::NotificationType::Outbid => Self::Outbid,
            entities::NotificationType::AuctionWon => Self::AuctionWon,
            entities::NotificationType::AuctionLost => Self::AuctionLost,
            entities::NotificationType::AuctionStarted => Self::AuctionStarted,
            entities::NotificationType::AuctionEnded => Self::AuctionEnded,
            entities::NotificationType::BidAccepted => Self::BidAccepted,
            entities::NotificationType::BidRejected => Self::BidRejected,
            entities::NotificationType::CounterOffer => Self::CounterOffer,
            entities::NotificationType::CounterOfferAccepted => Self::CounterOfferAccepted,
            entities::NotificationType::CounterOfferRejected => Self::CounterOfferRejected,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Notification {
    pub id:            entities::NotificationId,
    pub user_id:       UserId,
    pub auction_id:    Option<AuctionId>,
    pub kind:          NotificationType,
    pub title:         String,
    pub message:       String,
    pub is_read:       bool,
    pub data:          Option<serde_json::Value>,
    pub creation_time: PrimitiveDateTime,
}

impl Notification {
    pub fn get_notification_entity(&self) -> entities::Notification {
        entities::Notification {
            id:            self.id,
            user_id:       self.user_id,
            auction_id:    self.auction_id,
            kind:          self.kind.into(),
            title:         self.title.clone(),
            message:       self.message.clone(),
            is_read:       self.is_read,
            data:          self.data.clone(),
            creation_time: self.creation_time.assume_offset(UtcOffset::UTC),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_notification(&self, notification: &entities::Notification) -> anyhow::Result<()>;
    /// Recipient-scoped: marking another user's notification is NotFound.
    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: entities::NotificationId,
    ) -> Result<(), RestError>;
    async fn get_notifications(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Notification>, u64), RestError>;
    async fn count_unread(&self, user_id: UserId) -> anyhow::Result<u64>;
}

#[async_trait]
impl Database for DB {
    #[instrument(name = "db_add_notification", skip_all)]
    async fn add_notification(&self, notification: &entities::Notification) -> anyhow::Result<()> {
        let creation_time = {
            let utc = notification.creation_time.to_offset(UtcOffset::UTC);
            PrimitiveDateTime::new(utc.date(), utc.time())
        };
        sqlx::query(
            "INSERT INTO notification (id, user_id, auction_id, kind, title, message, is_read, data, creation_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.auction_id)
        .bind(NotificationType::from(notification.kind))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(&notification.data)
        .bind(creation_time)
        .execute(self)
        .await?;
        Ok(())
    }

    #[instrument(name = "db_mark_notification_read", skip_all)]
    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: entities::NotificationId,
    ) -> Result<(), RestError> {
        let updated =
            sqlx::query("UPDATE notification SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(self)
                .await
                .map_err(|e| {
                    tracing::error!(error = e.to_string(), "Failed to mark notification read");
                    RestError::TemporarilyUnavailable
                })?
                .rows_affected();
        if updated == 0 {
            return Err(RestError::NotificationNotFound);
        }
        Ok(())
    }

    #[instrument(name = "db_get_notifications", skip_all)]
    async fn get_notifications(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Notification>, u64), RestError> {
        let error = |e: sqlx::Error| {
            tracing::error!(
                error = e.to_string(),
                user_id = user_id.to_string(),
                "Failed to get notifications from db"
            );
            RestError::TemporarilyUnavailable
        };
        let notifications: Vec<Notification> = sqlx::query_as(
            "SELECT * FROM notification WHERE user_id = $1 \
             ORDER BY creation_time DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self)
        .await
        .map_err(error)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notification WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self)
            .await
            .map_err(error)?;
        Ok((
            notifications
                .iter()
                .map(|notification| notification.get_notification_entity())
                .collect(),
            total as u64,
        ))
    }

    #[instrument(name = "db_count_unread", skip_all)]
    async fn count_unread(&self, user_id: UserId) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(self)
        .await?;
        Ok(count as u64)
    }
}
