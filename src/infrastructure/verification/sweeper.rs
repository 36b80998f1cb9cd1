//! Periodic removal of expired verification records

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::service::VerificationService;

/// Runs `VerificationService::sweep` on a fixed interval until cancelled
#[derive(Debug)]
pub struct VerificationSweeper {
    service: Arc<VerificationService>,
    interval: Duration,
}

impl VerificationSweeper {
    pub fn new(service: Arc<VerificationService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Verification sweeper started");
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.service.sweep().await {
                            Ok(deleted) => debug!(deleted, "Verification sweep finished"),
                            Err(e) => error!(error = %e, "Failed to sweep expired verification records"),
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("Verification sweeper received shutdown signal");
                        break;
                    }
                }
            }
            info!("Verification sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration as ChronoDuration;

    use crate::config::VerificationConfig;
    use crate::domain::clock::ManualClock;
    use crate::domain::verification::{NewVerification, VerificationRepository};
    use crate::domain::Clock;
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::notification::LoggingNotificationSink;
    use crate::infrastructure::storage::InMemoryStore;
    use crate::infrastructure::verification::VerificationServiceDeps;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";
    const INTERVAL: Duration = Duration::from_secs(300);

    fn service(store: &InMemoryStore, clock: Arc<ManualClock>) -> Arc<VerificationService> {
        let tokens =
            Arc::new(JwtService::new(JwtConfig::new(SECRET, "todo-app"), clock.clone()).unwrap());

        Arc::new(VerificationService::new(
            VerificationServiceDeps {
                records: Arc::new(store.clone()),
                users: Arc::new(store.clone()),
                activator: Arc::new(store.clone()),
                tokens,
                notifier: Arc::new(LoggingNotificationSink::new(10)),
                clock,
            },
            VerificationConfig::default(),
        ))
    }

    async fn save_record(store: &InMemoryStore, email: &str, clock: &ManualClock) {
        VerificationRepository::save(
            store,
            NewVerification {
                email: email.to_string(),
                code: "123456".to_string(),
                expires_at: clock.now() + ChronoDuration::minutes(10),
                created_at: clock.now(),
            },
        )
        .await
        .unwrap();
    }

    async fn remaining(store: &InMemoryStore) -> u64 {
        let far_past = ManualClock::fixed().now() - ChronoDuration::days(1);
        store.count_recent("a@x.io", far_past).await.unwrap()
            + store.count_recent("b@x.io", far_past).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_expired_records_on_each_tick() {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::fixed());
        save_record(&store, "a@x.io", &clock).await;
        clock.advance(ChronoDuration::minutes(5));
        save_record(&store, "b@x.io", &clock).await;

        let shutdown = CancellationToken::new();
        let sweeper = Arc::new(VerificationSweeper::new(
            service(&store, clock.clone()),
            INTERVAL,
        ));
        let handle = sweeper.start(shutdown.clone());

        // first tick fires at start; nothing has expired yet
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(remaining(&store).await, 2);

        // a@x.io expires, b@x.io is still live
        clock.advance(ChronoDuration::minutes(6));
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(remaining(&store).await, 1);
        assert!(store
            .find_active("b@x.io", clock.now())
            .await
            .unwrap()
            .is_some());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_cancel_and_sweeps_no_more() {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::fixed());
        save_record(&store, "a@x.io", &clock).await;

        let shutdown = CancellationToken::new();
        let handle = Arc::new(VerificationSweeper::new(
            service(&store, clock.clone()),
            INTERVAL,
        ))
        .start(shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        // no ticks after cancellation, even once the record has expired
        clock.advance(ChronoDuration::minutes(11));
        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(remaining(&store).await, 1);
    }
}
