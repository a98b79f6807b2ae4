//! Background TTL sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use conclave_core::traits::ISessionStateStore;

/// Periodically purge expired terminal sessions until `cancel` fires.
pub fn spawn_expiry_sweeper(
    store: Arc<dyn ISessionStateStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match store.expire_stale() {
                        Ok(0) => {}
                        Ok(removed) => tracing::debug!(removed, "sweeper expired sessions"),
                        Err(e) => tracing::warn!(error = %e, "session sweep failed"),
                    }
                }
            }
        }
    })
}
