use {
    super::Service,
    crate::server::{
        EXIT_CHECK_INTERVAL,
        SHOULD_EXIT,
    },
    anyhow::Result,
    std::sync::atomic::Ordering,
};

impl Service {
    /// Drives auction lifecycle transitions on a fixed-interval sweep until
    /// shutdown is requested.
    pub async fn run_lifecycle_loop(&self) -> Result<()> {
        tracing::info!("Starting auction lifecycle sweeper...");
        let mut sweep_interval = tokio::time::interval(self.config.sweep_interval);
        let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);

        while !SHOULD_EXIT.load(Ordering::Acquire) {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    self.start_auctions().await;
                    self.conclude_auctions().await;
                }
                _ = exit_check_interval.tick() => {}
            }
        }
        tracing::info!("Shutting down auction lifecycle sweeper...");
        Ok(())
    }
}
