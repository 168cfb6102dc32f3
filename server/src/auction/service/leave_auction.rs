use {
    super::Service,
    crate::{
        api::ws::UpdateEvent,
        auction::entities,
    },
    bidhub_api_types::ws::ParticipantUpdate,
};

impl Service {
    /// Announces the departure to the room. The participant set is additive
    /// for the auction's lifetime, so the count does not shrink.
    pub async fn leave_auction(&self, auction_id: entities::AuctionId, user: entities::Bidder) {
        let participant_count = self.repo.count_participants(auction_id).await;
        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::ParticipantLeft(ParticipantUpdate {
                auction_id,
                user: user.into(),
                participant_count,
            }))
        {
            tracing::trace!(error = e.to_string(), "No subscriber for participant update");
        }
    }
}
