//! Sweep Scheduler - owns the recurring payment status sweep
//!
//! - `start()` runs one sweep immediately, then one per interval
//! - `stop()` on the returned handle ends the loop and joins the task
//! - a running flag keeps sweeps from overlapping; a tick that finds a sweep
//!   in flight is skipped, a manual `run_now()` gets `AppError::Conflict`

use crate::application::payment_sweep::{PaymentStatusChecker, SweepReport};
use crate::error::{AppError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

pub struct SweepScheduler {
    checker: Arc<PaymentStatusChecker>,
    interval: Duration,
    running: AtomicBool,
    last_report: RwLock<Option<SweepReport>>,
}

/// Clears the running flag when the sweep finishes, even on panic
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SweepScheduler {
    /// # Arguments
    /// * `checker` - Sweep implementation
    /// * `interval` - Time between scheduled sweeps (must be non-zero)
    pub fn new(checker: Arc<PaymentStatusChecker>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(AppError::Validation(
                "Sweep interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            checker,
            interval,
            running: AtomicBool::new(false),
            last_report: RwLock::new(None),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn last_report(&self) -> Option<SweepReport> {
        self.last_report.read().await.clone()
    }

    pub fn checker(&self) -> &PaymentStatusChecker {
        &self.checker
    }

    /// Spawn the sweep loop
    pub fn start(self: &Arc<Self>) -> SweepSchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);

        let task = tokio::spawn(async move {
            info!(
                interval_secs = scheduler.interval.as_secs(),
                grace_period_days = scheduler.checker.grace_period_days(),
                "Payment sweep scheduler started"
            );

            // First tick completes immediately
            let mut tick = interval(scheduler.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = tick.tick() => {
                        match scheduler.run_guarded().await {
                            Ok(_) => {}
                            Err(AppError::Conflict(_)) => {
                                warn!("Previous payment sweep still running, skipping tick");
                            }
                            Err(e) => {
                                error!(
                                    error = %e,
                                    "Scheduled payment sweep failed, retrying next tick"
                                );
                            }
                        }
                    }
                }
            }

            info!("Payment sweep scheduler stopped");
        });

        SweepSchedulerHandle { shutdown_tx, task }
    }

    /// Run a sweep now (manual trigger)
    pub async fn run_now(&self) -> Result<SweepReport> {
        info!("Running manual payment sweep...");
        self.run_guarded().await
    }

    async fn run_guarded(&self) -> Result<SweepReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::Conflict(
                "A payment sweep is already running".to_string(),
            ));
        }
        let _guard = RunningGuard(&self.running);

        let report = self.checker.sweep().await?;
        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }
}

/// Handle to a started scheduler
pub struct SweepSchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepSchedulerHandle {
    /// Signal shutdown and wait for the loop to exit
    ///
    /// A sweep already in flight runs to completion first.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = ?e, "Payment sweep scheduler task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewNotification, Notification, NotificationId, Spa, SpaId};
    use crate::port::{
        FixedTimeProvider, NotificationRepository, SpaRepository, UuidProvider,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Counts selections; can stall inside one or fail the first few
    struct CountingSpaRepository {
        selections: AtomicUsize,
        failures_left: AtomicUsize,
        stall: Duration,
    }

    #[async_trait]
    impl SpaRepository for CountingSpaRepository {
        async fn find_by_id(&self, _id: SpaId) -> Result<Option<Spa>> {
            Ok(None)
        }

        async fn find_verified_due_before(&self, _due_before: NaiveDate) -> Result<Vec<Spa>> {
            self.selections.fetch_add(1, Ordering::SeqCst);
            if !self.stall.is_zero() {
                tokio::time::sleep(self.stall).await;
            }
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::Database("database is locked".to_string()));
            }
            Ok(vec![])
        }

        async fn demote_to_unverified(&self, _id: SpaId, _updated_at: i64) -> Result<bool> {
            Ok(true)
        }
    }

    struct NoNotifications;

    #[async_trait]
    impl NotificationRepository for NoNotifications {
        async fn insert(&self, _notification: &NewNotification) -> Result<NotificationId> {
            Ok(1)
        }

        async fn list_for_spa(&self, _spa_id: SpaId, _limit: i64) -> Result<Vec<Notification>> {
            Ok(vec![])
        }
    }

    fn scheduler(stall: Duration) -> (Arc<SweepScheduler>, Arc<CountingSpaRepository>) {
        failing_scheduler(stall, 0)
    }

    fn failing_scheduler(
        stall: Duration,
        failures: usize,
    ) -> (Arc<SweepScheduler>, Arc<CountingSpaRepository>) {
        let spas = Arc::new(CountingSpaRepository {
            selections: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            stall,
        });
        let checker = Arc::new(PaymentStatusChecker::new(
            spas.clone(),
            Arc::new(NoNotifications),
            Arc::new(FixedTimeProvider::new(
                0,
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            )),
            Arc::new(UuidProvider),
        ));
        let scheduler = Arc::new(SweepScheduler::new(checker, DAY).unwrap());
        (scheduler, spas)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let (scheduler, _) = scheduler(Duration::ZERO);
        let result = SweepScheduler::new(scheduler.checker.clone(), Duration::ZERO);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let (scheduler, spas) = scheduler(Duration::ZERO);
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 1, "eager first run");
        assert!(scheduler.last_report().await.is_some());

        tokio::time::sleep(DAY).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 2);

        handle.stop().await;

        tokio::time::sleep(DAY * 3).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 2, "no runs after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_run_conflicts_with_running_sweep() {
        let (scheduler, spas) = scheduler(Duration::from_secs(10));
        let handle = scheduler.start();

        // Scheduled sweep is stalled inside the store
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.is_running());
        assert!(matches!(
            scheduler.run_now().await,
            Err(AppError::Conflict(_))
        ));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!scheduler.is_running());
        assert!(scheduler.run_now().await.is_ok());
        assert_eq!(spas.selections.load(Ordering::SeqCst), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sweep_retried_next_tick() {
        let (scheduler, spas) = failing_scheduler(Duration::ZERO, 1);
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 1);
        assert!(scheduler.last_report().await.is_none());
        assert!(!scheduler.is_running());

        tokio::time::sleep(DAY).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 2);
        assert!(scheduler.last_report().await.is_some());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_skipped_while_manual_run_in_flight() {
        let (scheduler, spas) = scheduler(Duration::from_secs(10));

        let manual = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run_now().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.is_running());

        // First tick fires immediately and finds the manual run in flight
        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(spas.selections.load(Ordering::SeqCst), 1);

        assert!(manual.await.unwrap().is_ok());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            spas.selections.load(Ordering::SeqCst),
            1,
            "skipped tick is not replayed"
        );

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_run_now_records_last_report() {
        let (scheduler, _) = scheduler(Duration::ZERO);
        assert!(scheduler.last_report().await.is_none());

        let report = scheduler.run_now().await.unwrap();
        assert!(report.is_noop());
        assert_eq!(scheduler.last_report().await, Some(report));
        assert!(!scheduler.is_running());
    }
}
