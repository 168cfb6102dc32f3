use {
    crate::{
        api::{
            Auth,
            RestError,
        },
        auction::{
            entities,
            service::{
                add_auction::AddAuctionInput,
                place_bid::PlaceBidInput,
            },
        },
        models,
        state::StoreNew,
    },
    axum::{
        extract::{
            Path,
            Query,
            State,
        },
        Json,
    },
    bidhub_api_types::{
        auction::{
            Auction,
            AuctionSnapshot,
            CreateAuction,
        },
        bid::{
            BidResult,
            Bids,
            PageQueryParams,
            PlaceBid,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
    time::OffsetDateTime,
};

impl models::User {
    pub fn to_bidder(&self) -> entities::Bidder {
        entities::Bidder {
            id:         self.id,
            username:   self.username.clone(),
            first_name: self.first_name.clone(),
            last_name:  self.last_name.clone(),
        }
    }
}

/// Register an auction.
///
/// Auctions are created in the scheduled state and go live on the sweep after
/// their start time. Requires a seller or admin account.
#[utoipa::path(post, path = "/v1/auctions",
    security(("bearerAuth" = [])),
    request_body = CreateAuction,
    responses(
        (status = 200, description = "The registered auction", body = Auction),
        (status = 400, response = ErrorBodyResponse)
    ),
)]
pub async fn post_auction(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Json(params): Json<CreateAuction>,
) -> Result<Json<Auction>, RestError> {
    let user = auth.user()?;
    if !user.can_create_auctions() {
        return Err(RestError::Forbidden);
    }
    let auction = store
        .auction_service
        .add_auction(AddAuctionInput {
            seller_id: user.id,
            params,
        })
        .await?;
    Ok(Json(auction.to_api_type(None, OffsetDateTime::now_utc())))
}

/// Get an auction with its live snapshot.
///
/// The view merges the durable row with the fast-path leading-bid cache, so
/// the highest bid and minimum next bid reflect the latest committed bid.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}",
    params(("auction_id" = String, description = "Auction id to query for")),
    responses(
        (status = 200, description = "The auction with its live snapshot", body = AuctionSnapshot),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse)
    ),
)]
pub async fn get_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<entities::AuctionId>,
) -> Result<Json<AuctionSnapshot>, RestError> {
    let snapshot = store.auction_service.get_auction_snapshot(auction_id).await?;
    Ok(Json(snapshot))
}

/// Get the paged bid history of an auction, highest amount first.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}/bids",
    params(
        ("auction_id" = String, description = "Auction id to query for"),
        PageQueryParams
    ),
    responses(
        (status = 200, description = "Paginated bids of the auction", body = Bids),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse)
    ),
)]
pub async fn get_auction_bids(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<entities::AuctionId>,
    Query(pagination): Query<PageQueryParams>,
) -> Result<Json<Bids>, RestError> {
    let bids = store
        .auction_service
        .get_bids(auction_id, pagination.page, pagination.limit)
        .await?;
    Ok(Json(bids))
}

/// Place a bid on an auction.
///
/// The bid is accepted only if the auction is active, the caller is not the
/// seller and the amount meets the current minimum. Success means the bid is
/// durably committed and is the new leading bid.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/bids",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to bid on")),
    request_body = PlaceBid,
    responses(
        (status = 200, description = "The committed bid", body = BidResult),
        (status = 400, response = ErrorBodyResponse),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse)
    ),
)]
pub async fn post_bid(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<entities::AuctionId>,
    Json(params): Json<PlaceBid>,
) -> Result<Json<BidResult>, RestError> {
    let user = auth.user()?;
    if !store.store.bid_rate_limiter.try_acquire(user.id).await {
        return Err(RestError::TooManyRequests);
    }
    let placed = store
        .auction_service
        .place_bid(PlaceBidInput {
            auction_id,
            bidder: user.to_bidder(),
            amount: params.amount,
        })
        .await?;
    Ok(Json(BidResult {
        bid:              placed.bid.into(),
        minimum_next_bid: placed.minimum_next_bid,
    }))
}
