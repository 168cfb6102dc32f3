use models::Database;

mod add_notification;
mod count_unread;
mod get_notifications;
mod mark_notification_read;
mod models;

#[cfg(test)]
pub use models::MockDatabase;

#[derive(Debug)]
pub struct Repository {
    db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self { db: Box::new(db) }
    }
}
