// Spa Repository Port (Interface)

use crate::domain::{Spa, SpaId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository interface for spa persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpaRepository: Send + Sync {
    /// Find spa by ID
    async fn find_by_id(&self, id: SpaId) -> Result<Option<Spa>>;

    /// VERIFIED spas whose next_payment_date is strictly before `due_before`,
    /// ordered by id
    async fn find_verified_due_before(&self, due_before: NaiveDate) -> Result<Vec<Spa>>;

    /// Set status to UNVERIFIED and stamp updated_at, only if the row is
    /// still VERIFIED
    ///
    /// # Returns
    /// true if the row was demoted, false if it was no longer VERIFIED
    async fn demote_to_unverified(&self, id: SpaId, updated_at: i64) -> Result<bool>;
}
