use {
    crate::{
        api::{
            ws::WsState,
            RestError,
        },
        auction,
        config::BidRateLimitConfig,
        kernel::{
            db::DB,
            entities::UserId,
        },
        models,
        notification,
    },
    axum_prometheus::metrics_exporter_prometheus::PrometheusHandle,
    std::{
        collections::HashMap,
        sync::Arc,
        time::Duration,
    },
    tokio::{
        sync::RwLock,
        time::Instant,
    },
    tokio_util::task::TaskTracker,
};

pub struct Store {
    pub db:               DB,
    pub ws:               WsState,
    pub bid_rate_limiter: BidRateLimiter,
    pub metrics_recorder: PrometheusHandle,
}

impl Store {
    /// Resolves a bearer token to its user. This is the auth verdict the
    /// rest of the server trusts; revoked tokens and deactivated accounts
    /// are both rejected here.
    pub async fn get_user_by_token(&self, token: &str) -> Result<models::User, RestError> {
        let user: models::User = sqlx::query_as(
            "SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.role, u.is_active \
             FROM access_token t JOIN users u ON u.id = t.user_id \
             WHERE t.token = $1 AND t.revoked_at IS NULL",
        )
        .bind(token)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RestError::Unauthorized,
            _ => {
                tracing::error!(error = e.to_string(), "Failed to fetch user by token");
                RestError::TemporarilyUnavailable
            }
        })?;
        if !user.is_active {
            return Err(RestError::Unauthorized);
        }
        Ok(user)
    }
}

struct AttemptWindow {
    window_start: Instant,
    attempts:     u32,
}

/// Per-user fixed-window limiter for bid submissions. Windows reset lazily
/// on the first attempt after expiry.
pub struct BidRateLimiter {
    max_attempts: u32,
    window:       Duration,
    windows:      RwLock<HashMap<UserId, AttemptWindow>>,
}

impl BidRateLimiter {
    pub fn new(config: &BidRateLimitConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window:       config.window,
            windows:      RwLock::new(HashMap::new()),
        }
    }

    pub async fn try_acquire(&self, user_id: UserId) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        // Expired windows carry no state worth keeping; sweep them out so the
        // map stays bounded by the set of recently active bidders.
        windows.retain(|_, window| now.duration_since(window.window_start) < self.window);
        let entry = windows.entry(user_id).or_insert(AttemptWindow {
            window_start: now,
            attempts:     0,
        });
        if entry.attempts >= self.max_attempts {
            return false;
        }
        entry.attempts += 1;
        true
    }
}

pub struct StoreNew {
    pub store:                Arc<Store>,
    pub auction_service:      auction::service::Service,
    pub notification_service: notification::service::Service,
    pub task_tracker:         TaskTracker,
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        uuid::Uuid,
    };

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_resets_after_the_window() {
        let limiter = BidRateLimiter::new(&BidRateLimitConfig {
            max_attempts: 2,
            window:       Duration::from_secs(60),
        });
        let user = Uuid::new_v4();

        assert!(limiter.try_acquire(user).await);
        assert!(limiter.try_acquire(user).await);
        assert!(!limiter.try_acquire(user).await);
        // Other users have their own window.
        assert!(limiter.try_acquire(Uuid::new_v4()).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.try_acquire(user).await);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_windows_are_swept_out() {
        let limiter = BidRateLimiter::new(&BidRateLimitConfig {
            max_attempts: 2,
            window:       Duration::from_secs(60),
        });

        assert!(limiter.try_acquire(Uuid::new_v4()).await);
        assert!(limiter.try_acquire(Uuid::new_v4()).await);
        assert_eq!(limiter.windows.read().await.len(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        // The next attempt sweeps the expired entries before recording.
        assert!(limiter.try_acquire(Uuid::new_v4()).await);
        assert_eq!(limiter.windows.read().await.len(), 1);
    }
}
