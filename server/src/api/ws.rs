use {
    super::{
        Auth,
        RestError,
    },
    crate::{
        auction::{
            entities::AuctionId,
            service::join_auction::JoinAuctionInput,
        },
        kernel::entities::UserId,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::{
        extract::{
            ws::{
                Message,
                WebSocket,
            },
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
    },
    bidhub_api_types::{
        notification::Notification,
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
    },
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        future::Future,
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::{
        broadcast,
        RwLock,
        Semaphore,
    },
    tracing::{
        instrument,
        Instrument,
    },
};

pub struct WsState {
    pub requester_ip_header_name: String,
    max_subscribers_per_ip:       usize,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
    pub broadcast_sender:         broadcast::Sender<UpdateEvent>,
    pub broadcast_receiver:       broadcast::Receiver<UpdateEvent>,
}

impl WsState {
    pub fn new(
        requester_ip_header_name: String,
        max_subscribers_per_ip: usize,
        broadcast_channel_size: usize,
    ) -> Self {
        let (broadcast_sender, broadcast_receiver) = broadcast::channel(broadcast_channel_size);
        Self {
            requester_ip_header_name,
            max_subscribers_per_ip,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
            broadcast_sender,
            broadcast_receiver,
        }
    }

    /// If the specified IP address has too many open websocket connections, this function will
    /// return none. Otherwise, it will return the new subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= self.max_subscribers_per_ip {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }
}

/// A state change published by the services, to be fanned out to every
/// subscriber it is relevant to. Each subscriber filters on its own joined
/// rooms, timer subscriptions and user id.
#[derive(Clone, Debug)]
pub enum UpdateEvent {
    NewBid(NewBidUpdate),
    AuctionStarted(AuctionStartedUpdate),
    AuctionEnded(AuctionEndedUpdate),
    ParticipantJoined(ParticipantUpdate),
    ParticipantLeft(ParticipantUpdate),
    Notification {
        user_id:      UserId,
        notification: Notification,
    },
}

pub type SubscriberId = usize;

#[derive(Debug, Clone)]
struct DeferredResponse {
    response:        ServerResultResponse,
    auction_to_join: Option<AuctionId>,
}

pub async fn ws_route_handler(
    auth: Auth,
    ws: WebSocketUpgrade,
    State(store): State<Arc<StoreNew>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // The hub only serves authenticated users; refuse before the upgrade.
    if auth.user().is_err() {
        return RestError::Unauthorized.into_response();
    }

    let ws_state = &store.store.ws;
    let requester_ip = headers
        .get(ws_state.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Only take the first ip if there are multiple
        .and_then(|value| value.parse().ok());

    if requester_ip.is_none() {
        tracing::warn!("Failed to get requester IP address");
    }

    match ws_state.get_new_subscriber_id(requester_ip).await {
        Some(subscriber_id) => ws.on_upgrade(move |socket| {
            websocket_handler(socket, store, subscriber_id, auth, requester_ip)
        }),
        None => RestError::TooManyOpenWebsocketConnections.into_response(),
    }
}

async fn websocket_handler(
    stream: WebSocket,
    state: Arc<StoreNew>,
    subscriber_id: SubscriberId,
    auth: Auth,
    requester_ip: Option<IpAddr>,
) {
    let ws_state = &state.store.ws;
    let (sender, receiver) = stream.split();
    let new_receiver = ws_state.broadcast_receiver.resubscribe();
    let mut subscriber = Subscriber::new(
        subscriber_id,
        state.clone(),
        new_receiver,
        receiver,
        sender,
        auth,
    );
    subscriber.run().await;
    ws_state.remove_subscriber(subscriber_id, requester_ip).await;
}

/// Subscriber is an actor that handles a single websocket connection.
/// It listens to the services for updates and sends the relevant ones to
/// the client.
pub struct Subscriber {
    id:                  SubscriberId,
    closed:              bool,
    store:               Arc<StoreNew>,
    notify_receiver:     broadcast::Receiver<UpdateEvent>,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    auction_ids:         HashSet<AuctionId>,
    timer_ids:           HashSet<AuctionId>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
    auth:                Auth,
    active_requests:     Arc<Semaphore>,
    response_sender:     broadcast::Sender<DeferredResponse>,
    response_receiver:   broadcast::Receiver<DeferredResponse>,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);

const MAX_ACTIVE_REQUESTS: usize = 50;

fn ok_response(id: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Success(None),
    }
}

impl Subscriber {
    pub fn new(
        id: SubscriberId,
        store: Arc<StoreNew>,
        notify_receiver: broadcast::Receiver<UpdateEvent>,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
        auth: Auth,
    ) -> Self {
        let (response_sender, response_receiver) = broadcast::channel(100);
        Self {
            id,
            closed: false,
            store,
            notify_receiver,
            receiver,
            sender,
            auction_ids: HashSet::new(),
            timer_ids: HashSet::new(),
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            responded_to_ping: true, // We start with true so we don't close the connection immediately
            auth,
            active_requests: Arc::new(Semaphore::new(MAX_ACTIVE_REQUESTS)),
            response_sender,
            response_receiver,
        }
    }

    pub async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(subscriber = self.id, error = ?e, "Error Handling Subscriber Message.");
                break;
            }
        }
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update_event = self.notify_receiver.recv() => {
                match maybe_update_event {
                    Ok(event) => self.handle_update(event).await,
                    Err(e) => Err(anyhow!("Error receiving update event: {:?}", e)),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            response_received = self.response_receiver.recv() => {
                match response_received {
                    Ok(DeferredResponse { response, auction_to_join }) => {
                        if let Some(auction_id) = auction_to_join {
                            self.auction_ids.insert(auction_id);
                        }
                        self.sender.send(serde_json::to_string(&response)?.into()).await?;
                    }
                    Err(e) => {
                        tracing::warn!(
                            subscriber = self.id,
                            error = ?e,
                            "Error Handling Subscriber Response Message."
                        );
                    }
                }
                Ok(())
            },
            _  = self.ping_interval.tick() => {
                // Sessions die with their credentials: a revoked token or a
                // deactivated account closes the connection on the next tick.
                if let Auth::Authorized { token, .. } = &self.auth {
                    if self.store.store.get_user_by_token(token).await.is_err() {
                        return Err(anyhow!("Invalid token. Closing connection."));
                    }
                }
                if !self.responded_to_ping {
                    return Err(anyhow!("Subscriber did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    fn user_id(&self) -> Option<UserId> {
        match &self.auth {
            Auth::Authorized { user, .. } => Some(user.id),
            Auth::Unauthorized => None,
        }
    }

    async fn send_update(&mut self, response: ServerUpdateResponse) -> Result<()> {
        let message = serde_json::to_string(&response)?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_update", result = "success", name),
        skip_all
    )]
    async fn handle_update(&mut self, event: UpdateEvent) -> Result<()> {
        let result = match event {
            UpdateEvent::NewBid(update) => {
                tracing::Span::current().record("name", "new_bid");
                if !self.auction_ids.contains(&update.auction_id) {
                    // Irrelevant update
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::NewBid(update)).await
            }
            UpdateEvent::AuctionStarted(update) => {
                tracing::Span::current().record("name", "auction_started");
                if !self.auction_ids.contains(&update.auction_id)
                    && !self.timer_ids.contains(&update.auction_id)
                {
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::AuctionStarted(update))
                    .await
            }
            UpdateEvent::AuctionEnded(update) => {
                tracing::Span::current().record("name", "auction_ended");
                if !self.auction_ids.contains(&update.auction_id)
                    && !self.timer_ids.contains(&update.auction_id)
                {
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::AuctionEnded(update))
                    .await
            }
            UpdateEvent::ParticipantJoined(update) => {
                tracing::Span::current().record("name", "participant_joined");
                if !self.auction_ids.contains(&update.auction_id) {
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::ParticipantJoined(update))
                    .await
            }
            UpdateEvent::ParticipantLeft(update) => {
                tracing::Span::current().record("name", "participant_left");
                if !self.auction_ids.contains(&update.auction_id) {
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::ParticipantLeft(update))
                    .await
            }
            UpdateEvent::Notification {
                user_id,
                notification,
            } => {
                tracing::Span::current().record("name", "notification");
                if self.user_id() != Some(user_id) {
                    return Ok(());
                }
                self.send_update(ServerUpdateResponse::Notification { notification })
                    .await
            }
        };
        if result.is_err() {
            tracing::Span::current().record("result", "error");
        }
        result
    }

    fn send_response(
        response_sender: &broadcast::Sender<DeferredResponse>,
        deferred_response: DeferredResponse,
    ) {
        if matches!(
            deferred_response.response.result,
            ServerResultMessage::Err(_)
        ) {
            tracing::Span::current().record("result", "error");
        }
        if let Err(e) = response_sender.send(deferred_response) {
            tracing::warn!(error = ?e, "Error sending response to subscriber");
        }
    }

    async fn spawn_deferred(
        &mut self,
        fut: impl Future<Output = DeferredResponse> + Send + 'static,
    ) -> Result<()> {
        let permit = self
            .active_requests
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("Request semaphore is closed"))?;
        let response_sender = self.response_sender.clone();
        self.store.task_tracker.spawn(
            async move {
                let resp = fut.await;
                Self::send_response(&response_sender, resp);
                drop(permit);
            }
            .in_current_span(),
        );
        Ok(())
    }

    async fn handle_join_auction(&mut self, message_id: String, auction_id: AuctionId) -> Result<()> {
        let user = match self.auth.user() {
            Ok(user) => user.to_bidder(),
            Err(e) => {
                Self::send_response(
                    &self.response_sender,
                    DeferredResponse {
                        response:        ServerResultResponse {
                            id:     Some(message_id),
                            result: ServerResultMessage::Err(e.to_status_and_message().1),
                        },
                        auction_to_join: None,
                    },
                );
                return Ok(());
            }
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .auction_service
                .join_auction(JoinAuctionInput { auction_id, user })
                .await
            {
                Ok(snapshot) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Success(Some(APIResponse::AuctionJoined(
                            snapshot,
                        ))),
                    },
                    auction_to_join: Some(auction_id),
                },
                Err(e) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Err(e.to_status_and_message().1),
                    },
                    auction_to_join: None,
                },
            }
        })
        .await
    }

    async fn handle_leave_auction(&mut self, message_id: String, auction_id: AuctionId) {
        self.auction_ids.remove(&auction_id);
        if let Ok(user) = self.auth.user() {
            self.store
                .auction_service
                .leave_auction(auction_id, user.to_bidder())
                .await;
        }
        Self::send_response(
            &self.response_sender,
            DeferredResponse {
                response:        ok_response(message_id),
                auction_to_join: None,
            },
        );
    }

    async fn handle_request_snapshot(
        &mut self,
        message_id: String,
        auction_id: AuctionId,
    ) -> Result<()> {
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store.auction_service.get_auction_snapshot(auction_id).await {
                Ok(snapshot) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Success(Some(APIResponse::AuctionSnapshot(
                            snapshot,
                        ))),
                    },
                    auction_to_join: None,
                },
                Err(e) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Err(e.to_status_and_message().1),
                    },
                    auction_to_join: None,
                },
            }
        })
        .await
    }

    async fn handle_mark_notification_read(
        &mut self,
        message_id: String,
        notification_id: crate::notification::entities::NotificationId,
    ) -> Result<()> {
        let user_id = match self.user_id() {
            Some(user_id) => user_id,
            None => return Ok(()),
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            let response = match store
                .notification_service
                .mark_read(user_id, notification_id)
                .await
            {
                Ok(()) => ok_response(message_id),
                Err(e) => ServerResultResponse {
                    id:     Some(message_id),
                    result: ServerResultMessage::Err(e.to_status_and_message().1),
                },
            };
            DeferredResponse {
                response,
                auction_to_join: None,
            }
        })
        .await
    }

    async fn handle_get_notifications(
        &mut self,
        message_id: String,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<()> {
        let user_id = match self.user_id() {
            Some(user_id) => user_id,
            None => return Ok(()),
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .notification_service
                .get_notifications(user_id, page, limit)
                .await
            {
                Ok(notifications) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Success(Some(APIResponse::Notifications(
                            notifications,
                        ))),
                    },
                    auction_to_join: None,
                },
                Err(e) => DeferredResponse {
                    response:        ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Err(e.to_status_and_message().1),
                    },
                    auction_to_join: None,
                },
            }
        })
        .await
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_client_message", result = "success", name),
        skip_all
    )]
    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        let maybe_client_message = match message {
            Message::Close(_) => {
                // Closing the connection. We don't remove it from the subscribers
                // list, instead when the Subscriber struct is dropped the channel
                // to subscribers list will be closed and it will eventually get
                // removed.
                // Send the close message to gracefully shut down the connection
                // Otherwise the client might get an abnormal Websocket closure
                // error.
                tracing::Span::current().record("name", "close");
                if let Err(e) = self.sender.close().await {
                    tracing::Span::current().record("result", "error");
                    return Err(e.into());
                }
                self.closed = true;
                return Ok(());
            }
            Message::Text(text) => serde_json::from_str::<ClientRequest>(&text),
            Message::Binary(data) => serde_json::from_slice::<ClientRequest>(&data),
            Message::Ping(_) => {
                // Axum will send Pong automatically
                tracing::Span::current().record("name", "ping");
                return Ok(());
            }
            Message::Pong(_) => {
                tracing::Span::current().record("name", "pong");
                self.responded_to_ping = true;
                return Ok(());
            }
        };

        match maybe_client_message {
            Err(e) => {
                let resp = DeferredResponse {
                    response:        ServerResultResponse {
                        id:     None,
                        result: ServerResultMessage::Err(e.to_string()),
                    },
                    auction_to_join: None,
                };
                Self::send_response(&self.response_sender, resp);
            }
            Ok(ClientRequest { msg, id }) => match msg {
                ClientMessage::JoinAuction { auction_id } => {
                    tracing::Span::current().record("name", "join_auction");
                    self.handle_join_auction(id, auction_id).await?
                }
                ClientMessage::LeaveAuction { auction_id } => {
                    tracing::Span::current().record("name", "leave_auction");
                    self.handle_leave_auction(id, auction_id).await
                }
                ClientMessage::SubscribeTimer { auction_id } => {
                    tracing::Span::current().record("name", "subscribe_timer");
                    self.timer_ids.insert(auction_id);
                    Self::send_response(
                        &self.response_sender,
                        DeferredResponse {
                            response:        ok_response(id),
                            auction_to_join: None,
                        },
                    );
                }
                ClientMessage::UnsubscribeTimer { auction_id } => {
                    tracing::Span::current().record("name", "unsubscribe_timer");
                    self.timer_ids.remove(&auction_id);
                    Self::send_response(
                        &self.response_sender,
                        DeferredResponse {
                            response:        ok_response(id),
                            auction_to_join: None,
                        },
                    );
                }
                ClientMessage::RequestSnapshot { auction_id } => {
                    tracing::Span::current().record("name", "request_snapshot");
                    self.handle_request_snapshot(id, auction_id).await?
                }
                ClientMessage::MarkNotificationRead { notification_id } => {
                    tracing::Span::current().record("name", "mark_notification_read");
                    self.handle_mark_notification_read(id, notification_id)
                        .await?
                }
                ClientMessage::GetNotifications { page, limit } => {
                    tracing::Span::current().record("name", "get_notifications");
                    self.handle_get_notifications(id, page, limit).await?
                }
            },
        };

        Ok(())
    }
}
