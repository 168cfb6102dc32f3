use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
    },
    bidhub_api_types::{
        self as api_types,
        ws::ParticipantUpdate,
    },
};

#[derive(Clone, Debug)]
pub struct JoinAuctionInput {
    pub auction_id: entities::AuctionId,
    pub user:       entities::Bidder,
}

impl Service {
    /// Adds the user to the auction's participant set and returns the
    /// snapshot a late joiner needs to render immediately.
    pub async fn join_auction(
        &self,
        input: JoinAuctionInput,
    ) -> Result<api_types::auction::AuctionSnapshot, RestError> {
        // Joining an unknown auction fails before any state changes.
        self.repo.get_auction(input.auction_id).await?;
        let participant_count = self
            .repo
            .add_participant(input.auction_id, input.user.id)
            .await;

        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::ParticipantJoined(ParticipantUpdate {
                auction_id: input.auction_id,
                user: input.user.into(),
                participant_count,
            }))
        {
            tracing::trace!(error = e.to_string(), "No subscriber for participant update");
        }
        self.get_auction_snapshot(input.auction_id).await
    }
}
