use {
    super::repository::Repository,
    crate::api::ws::UpdateEvent,
    std::{
        ops::Deref,
        sync::Arc,
    },
    tokio::sync::broadcast,
};

mod get_notifications;
mod mark_read;
mod notify;

pub use notify::NotifyInput;

pub struct ServiceInner {
    repo:         Arc<Repository>,
    event_sender: broadcast::Sender<UpdateEvent>,
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
    pub fn new(repo: Arc<Repository>, event_sender: broadcast::Sender<UpdateEvent>) -> Self {
        Self(Arc::new(ServiceInner { repo, event_sender }))
    }
}
