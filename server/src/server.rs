use {
    crate::{
        api,
        api::ws::WsState,
        auction::{
            repository::Repository as AuctionRepository,
            service::{
                Config as AuctionServiceConfig,
                Service as AuctionService,
            },
        },
        config::{
            Config,
            RunOptions,
        },
        metrics,
        notification::{
            repository::Repository as NotificationRepository,
            service::Service as NotificationService,
        },
        state::{
            BidRateLimiter,
            Store,
            StoreNew,
        },
    },
    anyhow::anyhow,
    axum_prometheus::metrics_exporter_prometheus::PrometheusBuilder,
    futures::future::join_all,
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio_util::task::TaskTracker,
};

const DATABASE_MAX_CONNECTIONS: u32 = 10;

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to listen for shutdown signal");
        }
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect(&run_options.server.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let ws_state = WsState::new(
        config.websocket.requester_ip_header_name.clone(),
        config.websocket.max_connections_per_ip,
        config.websocket.broadcast_channel_size,
    );
    let event_sender = ws_state.broadcast_sender.clone();

    let store = Arc::new(Store {
        db:               pool.clone(),
        ws:               ws_state,
        bid_rate_limiter: BidRateLimiter::new(&config.bid_rate_limit),
        metrics_recorder: PrometheusBuilder::new().install_recorder()?,
    });

    let task_tracker = TaskTracker::new();
    let notification_service = NotificationService::new(
        Arc::new(NotificationRepository::new(pool.clone())),
        event_sender.clone(),
    );
    let auction_service = AuctionService::new(
        AuctionServiceConfig {
            sweep_interval: config.sweep_interval,
        },
        Arc::new(AuctionRepository::new(pool, config.leading_bid_ttl)),
        notification_service.clone(),
        task_tracker.clone(),
        event_sender,
    );
    let store_new = Arc::new(StoreNew {
        store:                store.clone(),
        auction_service:      auction_service.clone(),
        notification_service,
        task_tracker:         task_tracker.clone(),
    });

    let lifecycle_loop = tokio::spawn({
        let service = auction_service;
        async move { service.run_lifecycle_loop().await }
    });
    let server_loop = tokio::spawn(api::start_api(run_options.clone(), store_new));
    let metrics_loop = tokio::spawn(metrics::start_metrics(run_options, store));
    join_all(vec![lifecycle_loop, server_loop, metrics_loop]).await;

    task_tracker.close();
    task_tracker.wait().await;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down. This is used to
// gracefully shutdown the application.
//
// NOTE: A more idiomatic approach would be to use a tokio::sync::broadcast channel, and to send a
// shutdown signal to all running tasks. However, this is a bit more complicated to implement and
// we don't rely on global state for anything else.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
