//! Payment Status Checker
//!
//! One sweep demotes every VERIFIED spa whose `next_payment_date` lies more
//! than [`GRACE_PERIOD_DAYS`] days before today, and appends one warning
//! notification per demotion.
//!
//! Failure policy:
//! - selecting candidates fails: the whole sweep fails, nothing is mutated
//! - one spa's status write fails: logged, remaining spas are still processed
//! - one notification insert fails: logged, the status change stays

use crate::application::constants::GRACE_PERIOD_DAYS;
use crate::domain::{NewNotification, Spa, SpaId};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, NotificationRepository, SpaRepository, TimeProvider};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one sweep invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_id: String,
    pub today: NaiveDate,
    /// Due dates strictly before this were overdue
    pub cutoff: NaiveDate,
    pub started_at: i64,
    pub finished_at: i64,
    pub candidates: usize,
    pub demoted: Vec<SpaId>,
    /// Rows that stopped being VERIFIED between selection and update
    pub skipped: Vec<SpaId>,
    pub notifications_created: usize,
    pub status_failures: usize,
    pub notification_failures: usize,
}

impl SweepReport {
    pub fn is_noop(&self) -> bool {
        self.candidates == 0
    }
}

/// A spa the next sweep would demote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueSpa {
    pub id: SpaId,
    pub name: String,
    pub next_payment_date: NaiveDate,
    pub days_overdue: i64,
}

/// Dry-run result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPreview {
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    pub candidates: Vec<OverdueSpa>,
}

pub struct PaymentStatusChecker {
    spa_repo: Arc<dyn SpaRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    grace_period_days: i64,
}

impl PaymentStatusChecker {
    pub fn new(
        spa_repo: Arc<dyn SpaRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            spa_repo,
            notification_repo,
            time_provider,
            id_provider,
            grace_period_days: GRACE_PERIOD_DAYS,
        }
    }

    pub fn grace_period_days(&self) -> i64 {
        self.grace_period_days
    }

    /// `days_overdue > grace` is the same as `due < today - grace`
    fn cutoff(&self, today: NaiveDate) -> Result<NaiveDate> {
        today
            .checked_sub_days(Days::new(self.grace_period_days.unsigned_abs()))
            .ok_or_else(|| AppError::Internal(format!("Cutoff date out of range for {today}")))
    }

    /// Load candidates and keep only those the domain rule agrees are overdue
    async fn load_overdue(&self, today: NaiveDate, cutoff: NaiveDate) -> Result<Vec<Spa>> {
        let rows = self.spa_repo.find_verified_due_before(cutoff).await?;

        Ok(rows
            .into_iter()
            .filter(|spa| {
                let overdue = spa.is_overdue(today, self.grace_period_days);
                if !overdue {
                    warn!(
                        spa_id = spa.id,
                        status = %spa.status,
                        next_payment_date = ?spa.next_payment_date,
                        "Store returned a spa that is not overdue, ignoring"
                    );
                }
                overdue
            })
            .collect())
    }

    /// Run one sweep
    pub async fn sweep(&self) -> Result<SweepReport> {
        let run_id = self.id_provider.generate_id();
        let started_at = self.time_provider.now_millis();
        let today = self.time_provider.today();
        let cutoff = self.cutoff(today)?;

        info!(
            run_id = %run_id,
            today = %today,
            cutoff = %cutoff,
            grace_period_days = self.grace_period_days,
            "Starting payment status sweep"
        );

        let overdue = self.load_overdue(today, cutoff).await.map_err(|e| {
            error!(run_id = %run_id, error = %e, "Failed to load overdue spas, sweep aborted");
            e
        })?;

        let mut report = SweepReport {
            run_id,
            today,
            cutoff,
            started_at,
            finished_at: started_at,
            candidates: overdue.len(),
            demoted: Vec::new(),
            skipped: Vec::new(),
            notifications_created: 0,
            status_failures: 0,
            notification_failures: 0,
        };

        if overdue.is_empty() {
            debug!(run_id = %report.run_id, "No overdue spas");
            report.finished_at = self.time_provider.now_millis();
            return Ok(report);
        }

        for mut spa in overdue {
            self.demote_one(&mut spa, &mut report).await;
        }

        report.finished_at = self.time_provider.now_millis();

        info!(
            run_id = %report.run_id,
            candidates = report.candidates,
            demoted = report.demoted.len(),
            skipped = report.skipped.len(),
            status_failures = report.status_failures,
            notification_failures = report.notification_failures,
            "Payment status sweep completed"
        );

        Ok(report)
    }

    async fn demote_one(&self, spa: &mut Spa, report: &mut SweepReport) {
        let Some(due_date) = spa.next_payment_date else {
            return;
        };
        let now = self.time_provider.now_millis();

        if let Err(e) = spa.demote(now) {
            warn!(
                run_id = %report.run_id,
                spa_id = spa.id,
                error = %e,
                "Spa cannot be demoted, skipping"
            );
            report.skipped.push(spa.id);
            return;
        }

        match self
            .spa_repo
            .demote_to_unverified(spa.id, spa.updated_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    run_id = %report.run_id,
                    spa_id = spa.id,
                    "Spa changed status during sweep, skipping"
                );
                report.skipped.push(spa.id);
                return;
            }
            Err(e) => {
                error!(
                    run_id = %report.run_id,
                    spa_id = spa.id,
                    error = %e,
                    "Failed to demote spa"
                );
                report.status_failures += 1;
                return;
            }
        }

        report.demoted.push(spa.id);

        info!(
            run_id = %report.run_id,
            spa_id = spa.id,
            spa_name = %spa.name,
            next_payment_date = %due_date,
            days_overdue = (report.today - due_date).num_days(),
            "Spa demoted to unverified (payment overdue)"
        );

        let notification = NewNotification::payment_overdue(spa, due_date, now);
        match self.notification_repo.insert(&notification).await {
            Ok(notification_id) => {
                debug!(spa_id = spa.id, notification_id, "Overdue notification created");
                report.notifications_created += 1;
            }
            Err(e) => {
                error!(
                    run_id = %report.run_id,
                    spa_id = spa.id,
                    error = %e,
                    "Failed to create overdue notification (status change kept)"
                );
                report.notification_failures += 1;
            }
        }
    }

    /// List what a sweep would demote right now, without mutating anything
    pub async fn preview(&self) -> Result<SweepPreview> {
        let today = self.time_provider.today();
        let cutoff = self.cutoff(today)?;

        let candidates = self
            .load_overdue(today, cutoff)
            .await?
            .into_iter()
            .filter_map(|spa| {
                let due = spa.next_payment_date?;
                Some(OverdueSpa {
                    id: spa.id,
                    days_overdue: (today - due).num_days(),
                    name: spa.name,
                    next_payment_date: due,
                })
            })
            .collect();

        Ok(SweepPreview {
            today,
            cutoff,
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpaStatus;
    use crate::port::{FixedTimeProvider, MockNotificationRepository, MockSpaRepository};
    use mockall::predicate::eq;

    const NOW: i64 = 1_710_072_000_000;

    struct SeqIds;

    impl IdProvider for SeqIds {
        fn generate_id(&self) -> String {
            "run-1".to_string()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn verified(id: SpaId, days_ago: u64) -> Spa {
        Spa::new(id, format!("Spa {id}"), SpaStatus::Verified, 0)
            .with_next_payment_date(today().checked_sub_days(Days::new(days_ago)).unwrap())
    }

    fn checker(
        spas: MockSpaRepository,
        notifications: MockNotificationRepository,
    ) -> PaymentStatusChecker {
        PaymentStatusChecker::new(
            Arc::new(spas),
            Arc::new(notifications),
            Arc::new(FixedTimeProvider::new(NOW, today())),
            Arc::new(SeqIds),
        )
    }

    #[tokio::test]
    async fn test_demotes_overdue_and_notifies() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .with(eq(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
            .times(1)
            .returning(|_| Ok(vec![verified(72, 7)]));
        spas.expect_demote_to_unverified()
            .with(eq(72), eq(NOW))
            .times(1)
            .returning(|_, _| Ok(true));

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(|n| {
                n.related_entity_id == 72
                    && n.recipient_id == 72
                    && n.kind == "warning"
                    && n.related_entity_type == "payment"
                    && n.message.contains("03/03/2024")
            })
            .times(1)
            .returning(|_| Ok(1));

        let report = checker(spas, notifications).sweep().await.unwrap();

        assert_eq!(report.run_id, "run-1");
        assert_eq!(report.cutoff, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(report.demoted, vec![72]);
        assert_eq!(report.notifications_created, 1);
        assert_eq!(report.notification_failures, 0);
    }

    #[tokio::test]
    async fn test_transition_gates_store_write() {
        let mut spas = MockSpaRepository::new();
        spas.expect_demote_to_unverified().never();
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();
        let checker = checker(spas, notifications);

        let mut report = SweepReport {
            run_id: "run-1".to_string(),
            today: today(),
            cutoff: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            started_at: NOW,
            finished_at: NOW,
            candidates: 1,
            demoted: Vec::new(),
            skipped: Vec::new(),
            notifications_created: 0,
            status_failures: 0,
            notification_failures: 0,
        };
        let mut spa = Spa::new(40, "Rejected Spa", SpaStatus::Rejected, 0)
            .with_next_payment_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        checker.demote_one(&mut spa, &mut report).await;

        assert_eq!(report.skipped, vec![40]);
        assert!(report.demoted.is_empty());
        assert_eq!(spa.status, SpaStatus::Rejected);
        assert_eq!(spa.updated_at, 0);
    }

    #[tokio::test]
    async fn test_no_overdue_is_silent_noop() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Ok(vec![]));
        spas.expect_demote_to_unverified().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let report = checker(spas, notifications).sweep().await.unwrap();
        assert!(report.is_noop());
        assert!(report.demoted.is_empty());
    }

    #[tokio::test]
    async fn test_selection_failure_aborts_sweep() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Err(AppError::Database("connection refused".to_string())));
        spas.expect_demote_to_unverified().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let result = checker(spas, notifications).sweep().await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_status_change() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Ok(vec![verified(1, 10), verified(2, 6)]));
        spas.expect_demote_to_unverified()
            .times(2)
            .returning(|_, _| Ok(true));

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(|n| n.related_entity_id == 1)
            .returning(|_| Err(AppError::Database("notifications table locked".to_string())));
        notifications
            .expect_insert()
            .withf(|n| n.related_entity_id == 2)
            .returning(|_| Ok(9));

        let report = checker(spas, notifications).sweep().await.unwrap();

        assert_eq!(report.demoted, vec![1, 2]);
        assert_eq!(report.notifications_created, 1);
        assert_eq!(report.notification_failures, 1);
    }

    #[tokio::test]
    async fn test_status_write_failure_does_not_stop_siblings() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Ok(vec![verified(1, 30), verified(2, 30)]));
        spas.expect_demote_to_unverified()
            .with(eq(1), eq(NOW))
            .returning(|_, _| Err(AppError::Database("busy".to_string())));
        spas.expect_demote_to_unverified()
            .with(eq(2), eq(NOW))
            .returning(|_, _| Ok(true));

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(|n| n.related_entity_id == 2)
            .times(1)
            .returning(|_| Ok(1));

        let report = checker(spas, notifications).sweep().await.unwrap();

        assert_eq!(report.status_failures, 1);
        assert_eq!(report.demoted, vec![2]);
        assert_eq!(report.notifications_created, 1);
    }

    #[tokio::test]
    async fn test_concurrently_changed_row_is_skipped() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Ok(vec![verified(5, 8)]));
        spas.expect_demote_to_unverified()
            .returning(|_, _| Ok(false));

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let report = checker(spas, notifications).sweep().await.unwrap();
        assert_eq!(report.skipped, vec![5]);
        assert!(report.demoted.is_empty());
    }

    #[tokio::test]
    async fn test_rows_within_grace_are_ignored() {
        // A misbehaving store returns rows the rule rejects
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before().returning(|_| {
            let mut blacklisted = verified(3, 40);
            blacklisted.status = SpaStatus::Blacklisted;
            Ok(vec![verified(1, 5), blacklisted])
        });
        spas.expect_demote_to_unverified().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let report = checker(spas, notifications).sweep().await.unwrap();
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_preview_does_not_mutate() {
        let mut spas = MockSpaRepository::new();
        spas.expect_find_verified_due_before()
            .returning(|_| Ok(vec![verified(72, 7)]));
        spas.expect_demote_to_unverified().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let preview = checker(spas, notifications).preview().await.unwrap();
        assert_eq!(preview.today, today());
        assert_eq!(preview.candidates.len(), 1);
        assert_eq!(preview.candidates[0].id, 72);
        assert_eq!(preview.candidates[0].days_overdue, 7);
    }
}
