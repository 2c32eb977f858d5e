// Spa Domain Model

use super::error::{DomainError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spa ID (relational primary key)
pub type SpaId = i64;

/// Verification status of a spa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaStatus {
    Pending,
    Verified,
    Unverified,
    Rejected,
    Blacklisted,
}

impl SpaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaStatus::Pending => "pending",
            SpaStatus::Verified => "verified",
            SpaStatus::Unverified => "unverified",
            SpaStatus::Rejected => "rejected",
            SpaStatus::Blacklisted => "blacklisted",
        }
    }
}

impl std::fmt::Display for SpaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpaStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SpaStatus::Pending),
            "verified" => Ok(SpaStatus::Verified),
            "unverified" => Ok(SpaStatus::Unverified),
            "rejected" => Ok(SpaStatus::Rejected),
            "blacklisted" => Ok(SpaStatus::Blacklisted),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Spa entity (only the columns the payment sweep cares about)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spa {
    pub id: SpaId,
    pub name: String,
    pub status: SpaStatus,
    /// None = no due date set, never swept
    pub next_payment_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Spa {
    pub fn new(id: SpaId, name: impl Into<String>, status: SpaStatus, created_at: i64) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            next_payment_date: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_next_payment_date(mut self, date: NaiveDate) -> Self {
        self.next_payment_date = Some(date);
        self
    }

    /// Whole days between the due date and `today`; negative while not yet due
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        self.next_payment_date.map(|due| (today - due).num_days())
    }

    /// True when the sweep must demote this spa
    pub fn is_overdue(&self, today: NaiveDate, grace_period_days: i64) -> bool {
        self.status == SpaStatus::Verified
            && self
                .days_overdue(today)
                .is_some_and(|days| days > grace_period_days)
    }

    /// VERIFIED -> UNVERIFIED
    pub fn demote(&mut self, now: i64) -> Result<()> {
        if self.status != SpaStatus::Verified {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: SpaStatus::Unverified.to_string(),
            });
        }
        self.status = SpaStatus::Unverified;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            SpaStatus::Pending,
            SpaStatus::Verified,
            SpaStatus::Unverified,
            SpaStatus::Rejected,
            SpaStatus::Blacklisted,
        ] {
            assert_eq!(status.as_str().parse::<SpaStatus>().unwrap(), status);
        }
        assert!("VERIFIED".parse::<SpaStatus>().is_err());
    }

    #[test]
    fn test_days_overdue_ignores_missing_date() {
        let spa = Spa::new(1, "Lotus", SpaStatus::Verified, 0);
        assert_eq!(spa.days_overdue(date(2024, 3, 10)), None);
        assert!(!spa.is_overdue(date(2024, 3, 10), 5));
    }

    #[test]
    fn test_grace_period_boundary() {
        let today = date(2024, 3, 10);

        let five =
            Spa::new(1, "A", SpaStatus::Verified, 0).with_next_payment_date(date(2024, 3, 5));
        assert_eq!(five.days_overdue(today), Some(5));
        assert!(!five.is_overdue(today, 5), "exactly 5 days is still within grace");

        let six = Spa::new(2, "B", SpaStatus::Verified, 0).with_next_payment_date(date(2024, 3, 4));
        assert!(six.is_overdue(today, 5));

        let future =
            Spa::new(3, "C", SpaStatus::Verified, 0).with_next_payment_date(date(2024, 4, 1));
        assert!(future.days_overdue(today).unwrap() < 0);
        assert!(!future.is_overdue(today, 5));
    }

    #[test]
    fn test_only_verified_is_overdue() {
        let today = date(2024, 3, 10);
        for status in [
            SpaStatus::Pending,
            SpaStatus::Unverified,
            SpaStatus::Rejected,
            SpaStatus::Blacklisted,
        ] {
            let spa = Spa::new(1, "X", status, 0).with_next_payment_date(date(2020, 1, 1));
            assert!(!spa.is_overdue(today, 5), "{status} must never be swept");
        }
    }

    #[test]
    fn test_demote() {
        let mut spa = Spa::new(1, "Lotus", SpaStatus::Verified, 100);
        assert!(spa.demote(200).is_ok());
        assert_eq!(spa.status, SpaStatus::Unverified);
        assert_eq!(spa.updated_at, 200);

        // Already unverified
        assert!(spa.demote(300).is_err());
        assert_eq!(spa.updated_at, 200);
    }
}
