//! Shared fixtures for the end-to-end tests
//!
//! Every harness owns a private in-memory SQLite database with the
//! production migrations applied and a clock pinned to a fixed date.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use lsa_core::application::PaymentStatusChecker;
use lsa_core::domain::{Spa, SpaId, SpaStatus};
use lsa_core::port::{FixedTimeProvider, TimeProvider, UuidProvider};
use lsa_infra_sqlite::{
    create_pool, run_migrations, SqliteNotificationRepository, SqliteSpaRepository,
};
use sqlx::SqlitePool;

/// 2024-03-10 12:00:00 UTC
pub const NOW_MILLIS: i64 = 1_710_072_000_000;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

pub fn days_ago(days: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(days)).unwrap()
}

pub struct Harness {
    pub pool: SqlitePool,
    pub spas: Arc<SqliteSpaRepository>,
    pub notifications: Arc<SqliteNotificationRepository>,
    pub clock: Arc<dyn TimeProvider>,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();

        Self {
            spas: Arc::new(SqliteSpaRepository::new(pool.clone())),
            notifications: Arc::new(SqliteNotificationRepository::new(pool.clone())),
            clock: Arc::new(FixedTimeProvider::new(NOW_MILLIS, today())),
            pool,
        }
    }

    pub fn checker(&self) -> Arc<PaymentStatusChecker> {
        Arc::new(PaymentStatusChecker::new(
            self.spas.clone(),
            self.notifications.clone(),
            self.clock.clone(),
            Arc::new(UuidProvider),
        ))
    }

    pub async fn seed(&self, id: SpaId, status: SpaStatus, due: Option<NaiveDate>) {
        let mut spa = Spa::new(id, format!("Spa {id}"), status, NOW_MILLIS - 86_400_000);
        spa.next_payment_date = due;
        self.spas.upsert(&spa).await.unwrap();
    }

    pub async fn status_of(&self, id: SpaId) -> SpaStatus {
        let status: String = sqlx::query_scalar("SELECT status FROM spas WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        status.parse().unwrap()
    }

    pub async fn notification_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
