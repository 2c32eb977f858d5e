// Notification Domain Model (append-only)

use super::spa::{Spa, SpaId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type NotificationId = i64;

/// Recipient role of a spa's own admin
pub const RECIPIENT_SPA: &str = "spa";

/// Notification category for demotions
pub const TYPE_WARNING: &str = "warning";

/// Related entity kind for payment notifications
pub const RELATED_PAYMENT: &str = "payment";

pub const OVERDUE_TITLE: &str = "Payment Overdue - Status Changed";

/// Notification to be appended (no id yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_type: String,
    pub recipient_id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub related_entity_type: String,
    pub related_entity_id: i64,
    pub created_at: i64,
}

impl NewNotification {
    /// Warning sent to a spa's admin after the sweep demoted it
    pub fn payment_overdue(spa: &Spa, due_date: NaiveDate, created_at: i64) -> Self {
        Self {
            recipient_type: RECIPIENT_SPA.to_string(),
            recipient_id: spa.id,
            title: OVERDUE_TITLE.to_string(),
            message: format!(
                "Your spa \"{}\" has been marked as unverified because the payment due \
                 on {} is overdue. Please complete your payment to restore verified status.",
                spa.name,
                format_display_date(due_date)
            ),
            kind: TYPE_WARNING.to_string(),
            related_entity_type: RELATED_PAYMENT.to_string(),
            related_entity_id: spa.id,
            created_at,
        }
    }
}

/// Stored notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_type: String,
    pub recipient_id: SpaId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub related_entity_type: String,
    pub related_entity_id: i64,
    pub is_read: bool,
    pub created_at: i64,
}

/// day/month/year, zero padded
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpaStatus;

    #[test]
    fn test_format_display_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_display_date(date), "05/03/2024");
    }

    #[test]
    fn test_payment_overdue_notification() {
        let due = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let spa = Spa::new(72, "Blue Lotus", SpaStatus::Unverified, 0).with_next_payment_date(due);

        let n = NewNotification::payment_overdue(&spa, due, 1_000);

        assert_eq!(n.recipient_type, "spa");
        assert_eq!(n.recipient_id, 72);
        assert_eq!(n.kind, "warning");
        assert_eq!(n.related_entity_type, "payment");
        assert_eq!(n.related_entity_id, 72);
        assert_eq!(n.created_at, 1_000);
        assert!(n.message.contains("\"Blue Lotus\""));
        assert!(n.message.contains("25/12/2024"));
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let spa = Spa::new(1, "A", SpaStatus::Unverified, 0);
        let value = serde_json::to_value(NewNotification::payment_overdue(&spa, due, 0)).unwrap();
        assert_eq!(value["type"], "warning");
        assert!(value.get("kind").is_none());
    }
}
