//! RPC Request/Response Types
//!
//! Parameters and results of the admin JSON-RPC methods.

use chrono::NaiveDate;
use lsa_core::application::SweepReport;
use lsa_core::domain::{Notification, SpaId, SpaStatus};
use serde::{Deserialize, Serialize};

/// sweep.status.v1
#[derive(Debug, Clone, Serialize)]
pub struct SweepStatusResponse {
    pub running: bool,
    pub interval_secs: u64,
    pub grace_period_days: i64,
    pub last_report: Option<SweepReport>,
}

/// spa.get.v1 - Look up one spa
#[derive(Debug, Deserialize)]
pub struct GetSpaRequest {
    pub spa_id: SpaId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaResponse {
    pub id: SpaId,
    pub name: String,
    pub status: SpaStatus,
    pub next_payment_date: Option<NaiveDate>,
    /// Days past the due date as of today (negative = not yet due)
    pub days_overdue: Option<i64>,
    pub updated_at: i64,
}

/// notifications.list.v1 - Notifications addressed to a spa
#[derive(Debug, Deserialize)]
pub struct ListNotificationsRequest {
    pub spa_id: SpaId,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNotificationsResponse {
    pub spa_id: SpaId,
    pub notifications: Vec<Notification>,
}
