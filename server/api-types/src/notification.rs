use {
    crate::{
        AuctionId,
        NotificationId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
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

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct Notification {
    /// The id of the notification
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:         NotificationId,
    #[schema(value_type = Option<String>)]
    pub auction_id: Option<AuctionId>,
    #[serde(rename = "type")]
    pub kind:       NotificationType,
    #[schema(example = "You Have Been Outbid")]
    pub title:      String,
    pub message:    String,
    pub is_read:    bool,
    /// Opaque payload for client rendering
    #[schema(value_type = Option<Object>)]
    pub data:       Option<serde_json::Value>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct Notifications {
    pub notifications: Vec<Notification>,
    pub total_items:   u64,
    pub total_pages:   u64,
    pub current_page:  u32,
    pub unread_count:  u64,
}
