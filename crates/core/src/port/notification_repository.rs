// Notification Repository Port (append-only)

use crate::domain::{NewNotification, Notification, NotificationId, SpaId};
use crate::error::Result;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Append a notification
    async fn insert(&self, notification: &NewNotification) -> Result<NotificationId>;

    /// Notifications addressed to a spa, newest first
    async fn list_for_spa(&self, spa_id: SpaId, limit: i64) -> Result<Vec<Notification>>;
}
