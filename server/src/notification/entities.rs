use {
    crate::{
        auction::entities::AuctionId,
        kernel::entities::UserId,
    },
    bidhub_api_types as api_types,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type NotificationId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id:            NotificationId,
    pub user_id:       UserId,
    pub auction_id:    Option<AuctionId>,
    pub kind:          NotificationType,
    pub title:         String,
    pub message:       String,
    pub is_read:       bool,
    pub data:          Option<serde_json::Value>,
    pub creation_time: OffsetDateTime,
}

impl From<NotificationType> for api_types::notification::NotificationType {
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

impl From<Notification> for api_types::notification::Notification {
    fn from(notification: Notification) -> Self {
        Self {
            id:         notification.id,
            auction_id: notification.auction_id,
            kind:       notification.kind.into(),
            title:      notification.title,
            message:    notification.message,
            is_read:    notification.is_read,
            data:       notification.data,
            created_at: notification.creation_time,
        }
    }
}
