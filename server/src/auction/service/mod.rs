use {
    super::repository::Repository,
    crate::{
        api::ws::UpdateEvent,
        notification,
    },
    std::{
        ops::Deref,
        sync::Arc,
        time::Duration,
    },
    tokio::sync::broadcast,
    tokio_util::task::TaskTracker,
};

pub mod add_auction;
pub mod conclude_auctions;
pub mod get_auction;
pub mod get_bids;
pub mod join_auction;
pub mod leave_auction;
pub mod place_bid;
pub mod start_auctions;
pub mod verification;
pub mod workers;

pub struct Config {
    pub sweep_interval: Duration,
}

pub struct ServiceInner {
    config:               Config,
    repo:                 Arc<Repository>,
    notification_service: notification::service::Service,
    task_tracker:         TaskTracker,
    event_sender:         broadcast::Sender<UpdateEvent>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl Deref for Service {
    type Target = ServiceInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        config: Config,
        repo: Arc<Repository>,
        notification_service: notification::service::Service,
        task_tracker: TaskTracker,
        event_sender: broadcast::Sender<UpdateEvent>,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            repo,
            notification_service,
            task_tracker,
            event_sender,
        }))
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            auction::repository::MockDatabase,
            notification,
        },
    };

    pub fn setup_service(
        db: MockDatabase,
        notification_db: notification::repository::MockDatabase,
    ) -> Service {
        let (event_sender, _) = broadcast::channel(100);
        let notification_service = notification::service::Service::new(
            Arc::new(notification::repository::Repository::new(notification_db)),
            event_sender.clone(),
        );
        Service::new(
            Config {
                sweep_interval: Duration::from_secs(5),
            },
            Arc::new(Repository::new(db, Duration::from_secs(3600))),
            notification_service,
            TaskTracker::new(),
            event_sender,
        )
    }
}
