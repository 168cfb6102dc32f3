use {
    crate::{
        auction::AuctionSnapshot,
        bid::{
            Bid,
            LeadingBid,
        },
        notification::{
            Notification,
            Notifications,
        },
        profile::UserSummary,
        AuctionId,
        NotificationId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::ToSchema,
};

#[derive(Deserialize, Clone, ToSchema, Serialize, Debug, PartialEq)]
#[serde(tag = "method", content = "params")]
pub enum ClientMessage {
    /// Join an auction room; the reply carries the state a late joiner needs
    /// to render immediately.
    #[serde(rename = "join_auction")]
    JoinAuction {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
    #[serde(rename = "leave_auction")]
    LeaveAuction {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
    /// Subscribe to lifecycle (started/ended) events only, without joining
    /// the full bid-event room.
    #[serde(rename = "subscribe_timer")]
    SubscribeTimer {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
    #[serde(rename = "unsubscribe_timer")]
    UnsubscribeTimer {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
    /// Request the current auction snapshot, e.g. to resynchronize after a
    /// reconnect.
    #[serde(rename = "request_snapshot")]
    RequestSnapshot {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
    #[serde(rename = "mark_notification_read")]
    MarkNotificationRead {
        #[schema(value_type = String)]
        notification_id: NotificationId,
    },
    #[serde(rename = "get_notifications")]
    GetNotifications {
        page:  Option<u32>,
        limit: Option<u32>,
    },
}

#[derive(Deserialize, Clone, ToSchema, Serialize, Debug, PartialEq)]
pub struct ClientRequest {
    pub id:  String,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
pub struct NewBidUpdate {
    #[schema(value_type = String)]
    pub auction_id:       AuctionId,
    pub bid:              Bid,
    #[schema(example = 1200.0)]
    pub minimum_next_bid: f64,
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
pub struct AuctionStartedUpdate {
    #[schema(value_type = String)]
    pub auction_id: AuctionId,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_time:   OffsetDateTime,
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
pub struct AuctionEndedUpdate {
    #[schema(value_type = String)]
    pub auction_id: AuctionId,
    /// The final leading bid, absent when the auction ended without bids
    pub final_bid:  Option<LeadingBid>,
    pub winner:     Option<UserSummary>,
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
pub struct ParticipantUpdate {
    #[schema(value_type = String)]
    pub auction_id:        AuctionId,
    pub user:              UserSummary,
    #[schema(example = 7)]
    pub participant_count: usize,
}

/// This enum is used to send an update to the client for any subscriptions
/// made.
#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerUpdateResponse {
    #[serde(rename = "new_bid")]
    NewBid(NewBidUpdate),
    #[serde(rename = "auction_started")]
    AuctionStarted(AuctionStartedUpdate),
    #[serde(rename = "auction_ended")]
    AuctionEnded(AuctionEndedUpdate),
    #[serde(rename = "participant_joined")]
    ParticipantJoined(ParticipantUpdate),
    #[serde(rename = "participant_left")]
    ParticipantLeft(ParticipantUpdate),
    #[serde(rename = "notification")]
    Notification { notification: Notification },
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(untagged)]
pub enum APIResponse {
    AuctionJoined(AuctionSnapshot),
    AuctionSnapshot(AuctionSnapshot),
    Notifications(Notifications),
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "status", content = "result")]
pub enum ServerResultMessage {
    #[serde(rename = "success")]
    Success(Option<APIResponse>),
    #[serde(rename = "error")]
    Err(String),
}

/// This enum is used to send the result for a specific client request with
/// the same id. Id is only None when the client message is invalid.
#[derive(Serialize, ToSchema, Deserialize, Clone, Debug)]
pub struct ServerResultResponse {
    pub id:     Option<String>,
    #[serde(flatten)]
    pub result: ServerResultMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_request_wire_format() {
        let request: ClientRequest = serde_json::from_str(
            r#"{"id":"1","method":"join_auction","params":{"auction_id":"f47ac10b-58cc-4372-a567-0e02b2c3d479"}}"#,
        )
        .unwrap();
        assert_eq!(request.id, "1");
        assert!(matches!(request.msg, ClientMessage::JoinAuction { .. }));

        let request: ClientRequest = serde_json::from_str(
            r#"{"id":"2","method":"get_notifications","params":{"page":2,"limit":10}}"#,
        )
        .unwrap();
        assert_eq!(
            request.msg,
            ClientMessage::GetNotifications {
                page:  Some(2),
                limit: Some(10),
            }
        );
    }

    #[test]
    fn server_update_is_tagged_by_type() {
        let update = ServerUpdateResponse::AuctionStarted(AuctionStartedUpdate {
            auction_id: uuid::Uuid::nil(),
            start_time: OffsetDateTime::UNIX_EPOCH,
            end_time:   OffsetDateTime::UNIX_EPOCH,
        });
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "auction_started");
    }
}
