use {
    crate::{
        auction::api as auction_api,
        config::RunOptions,
        kernel::entities::format_amount,
        models,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::Result,
    axum::{
        async_trait,
        extract::FromRequestParts,
        http::{
            request::Parts,
            StatusCode,
        },
        response::{
            IntoResponse,
            Response,
        },
        routing::get,
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    axum_prometheus::PrometheusMetricLayerBuilder,
    bidhub_api_types::{
        auction::{
            Auction,
            AuctionSnapshot,
            AuctionStatus,
            CounterOfferStatus,
            CreateAuction,
            Negotiation,
            SellerDecision,
        },
        bid::{
            Bid,
            BidResult,
            Bids,
            LeadingBid,
            PlaceBid,
        },
        notification::{
            Notification,
            NotificationType,
            Notifications,
        },
        profile::UserSummary,
        ws::{
            APIResponse,
            AuctionEndedUpdate,
            AuctionStartedUpdate,
            ClientMessage,
            ClientRequest,
            NewBidUpdate,
            ParticipantUpdate,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        ErrorBodyResponse,
    },
    clap::crate_version,
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub(crate) mod ws;

async fn root() -> String {
    format!("BidHub Auction Server API {}", crate_version!())
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

#[derive(Clone, Debug, PartialEq)]
pub enum RestError {
    /// The request contained invalid parameters.
    BadParameters(String),
    /// The authorization token is missing, expired, or revoked.
    Unauthorized,
    /// The authenticated user may not perform this action.
    Forbidden,
    /// The auction was not found.
    AuctionNotFound,
    /// The auction is not accepting bids right now.
    AuctionNotActive,
    /// Sellers cannot bid on their own auctions.
    SelfBidding,
    /// The bid does not meet the current minimum.
    BidTooLow { minimum: f64 },
    /// The notification was not found for this user.
    NotificationNotFound,
    /// The user exceeded the bid rate limit.
    TooManyRequests,
    /// The requester IP has too many open websocket connections.
    TooManyOpenWebsocketConnections,
    /// Internal error occurred during processing the request.
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization token".to_string(),
            ),
            RestError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not allowed to perform this action".to_string(),
            ),
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::AuctionNotActive => (
                StatusCode::BAD_REQUEST,
                "Auction is not currently active".to_string(),
            ),
            RestError::SelfBidding => (
                StatusCode::BAD_REQUEST,
                "Sellers cannot bid on their own auctions".to_string(),
            ),
            RestError::BidTooLow { minimum } => (
                StatusCode::BAD_REQUEST,
                format!("Minimum bid is {}", format_amount(*minimum)),
            ),
            RestError::NotificationNotFound => (
                StatusCode::NOT_FOUND,
                "Notification with the specified id was not found".to_string(),
            ),
            RestError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many bid attempts, please slow down".to_string(),
            ),
            RestError::TooManyOpenWebsocketConnections => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many open websocket connections".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

/// The authentication verdict for a request, resolved from the bearer token
/// against the users and access token tables.
#[derive(Clone)]
pub enum Auth {
    Authorized { token: String, user: models::User },
    Unauthorized,
}

impl Auth {
    /// The authenticated user, or 401 for anonymous requests.
    pub fn user(&self) -> Result<&models::User, RestError> {
        match self {
            Auth::Authorized { user, .. } => Ok(user),
            Auth::Unauthorized => Err(RestError::Unauthorized),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<StoreNew>> for Auth {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<StoreNew>,
    ) -> Result<Self, Self::Rejection> {
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(token)) => {
                let user = state.store.get_user_by_token(token.token()).await?;
                Ok(Auth::Authorized {
                    token: token.token().to_string(),
                    user,
                })
            }
            Err(e) if e.is_missing() => Ok(Auth::Unauthorized),
            Err(_) => Err(RestError::Unauthorized),
        }
    }
}

pub async fn start_api(run_options: RunOptions, store: Arc<StoreNew>) -> Result<()> {
    // Make sure functions included in the paths section have distinct names, otherwise some api generators will fail
    #[derive(OpenApi)]
    #[openapi(
    paths(
    auction_api::post_auction,
    auction_api::get_auction,
    auction_api::get_auction_bids,
    auction_api::post_bid,
    ),
    components(
    schemas(
    Auction,
    AuctionSnapshot,
    AuctionStatus,
    SellerDecision,
    CounterOfferStatus,
    Negotiation,
    CreateAuction,
    Bid,
    Bids,
    BidResult,
    LeadingBid,
    PlaceBid,
    Notification,
    NotificationType,
    Notifications,
    UserSummary,
    ErrorBodyResponse,
    APIResponse,
    ClientRequest,
    ClientMessage,
    NewBidUpdate,
    AuctionStartedUpdate,
    AuctionEndedUpdate,
    ParticipantUpdate,
    ServerResultMessage,
    ServerUpdateResponse,
    ServerResultResponse,
    ),
    responses(
    ErrorBodyResponse,
    Auction,
    AuctionSnapshot,
    BidResult,
    Bids,
    ),
    ),
    tags(
    (name = "BidHub Auction Server", description = "The auction server coordinates concurrent bids in real time. It \
    validates and commits bids, fans out live updates to auction rooms, and drives auction lifecycle transitions.")
    )
    )]
    struct ApiDoc;

    let auction_routes = Router::new()
        .route(
            "/",
            axum::routing::post(auction_api::post_auction),
        )
        .route("/:auction_id", get(auction_api::get_auction))
        .route(
            "/:auction_id/bids",
            get(auction_api::get_auction_bids).post(auction_api::post_bid),
        );

    let v1_routes = Router::new().nest(
        "/v1",
        Router::new()
            .nest("/auctions", auction_routes)
            .route("/ws", get(ws::ws_route_handler)),
    );

    let (prometheus_layer, _) = PrometheusMetricLayerBuilder::new()
        .with_metrics_from_fn(|| store.store.metrics_recorder.clone())
        .build_pair();

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .merge(v1_routes)
        .route("/", get(root))
        .route("/live", get(live))
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer)
        .with_state(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    tracing::info!(
        listen_addr = run_options.server.listen_addr.to_string(),
        "Starting API server..."
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down API server...");
        })
        .await?;
    Ok(())
}
