use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub mod auction;
pub mod bid;
pub mod notification;
pub mod profile;
pub mod ws;

pub type UserId = Uuid;
pub type AuctionId = Uuid;
pub type BidId = Uuid;
pub type NotificationId = Uuid;

#[derive(ToResponse, ToSchema, Serialize, Deserialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}
