use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    bidhub_api_types as api_types,
    time::OffsetDateTime,
    uuid::Uuid,
};

#[derive(Clone, Debug)]
pub struct AddAuctionInput {
    pub seller_id: UserId,
    pub params:    api_types::auction::CreateAuction,
}

impl Service {
    /// Registers an auction in the scheduled state. Auctions whose start
    /// time has already passed go live on the next sweep.
    pub async fn add_auction(
        &self,
        input: AddAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let params = input.params;
        if params.title.trim().is_empty() {
            return Err(RestError::BadParameters("Title must not be empty".to_string()));
        }
        if !params.starting_price.is_finite() || params.starting_price <= 0.0 {
            return Err(RestError::BadParameters(
                "Starting price must be a positive number".to_string(),
            ));
        }
        if !params.bid_increment.is_finite() || params.bid_increment <= 0.0 {
            return Err(RestError::BadParameters(
                "Bid increment must be a positive number".to_string(),
            ));
        }
        if params.end_time <= params.start_time {
            return Err(RestError::BadParameters(
                "End time must be after start time".to_string(),
            ));
        }

        let auction = entities::Auction {
            id:                  Uuid::new_v4(),
            title:               params.title,
            description:         params.description,
            category:            params.category,
            starting_price:      params.starting_price,
            bid_increment:       params.bid_increment,
            current_highest_bid: None,
            start_time:          params.start_time,
            end_time:            params.end_time,
            status:              entities::AuctionStatus::Scheduled,
            seller_id:           input.seller_id,
            winner_id:           None,
            winning_bid:         None,
            negotiation:         entities::Negotiation::default(),
            creation_time:       OffsetDateTime::now_utc(),
        };
        self.repo.add_auction(auction).await.map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to add auction");
            RestError::TemporarilyUnavailable
        })
    }
}
