// SQLite NotificationRepository Implementation (append-only)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use lsa_core::domain::notification::RECIPIENT_SPA;
use lsa_core::domain::{NewNotification, Notification, NotificationId, SpaId};
use lsa_core::error::Result;
use lsa_core::port::NotificationRepository;
use sqlx::SqlitePool;

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: &NewNotification) -> Result<NotificationId> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (
                recipient_type, recipient_id, title, message, type,
                related_entity_type, related_entity_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.recipient_type)
        .bind(notification.recipient_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(&notification.related_entity_type)
        .bind(notification.related_entity_id)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_for_spa(&self, spa_id: SpaId, limit: i64) -> Result<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, recipient_type, recipient_id, title, message, type,
                   related_entity_type, related_entity_id, is_read, created_at
            FROM notifications
            WHERE recipient_type = ? AND recipient_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(RECIPIENT_SPA)
        .bind(spa_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NotificationRow::into_notification).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_type: String,
    recipient_id: i64,
    title: String,
    message: String,
    #[sqlx(rename = "type")]
    kind: String,
    related_entity_type: Option<String>,
    related_entity_id: Option<i64>,
    is_read: i64,
    created_at: i64,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            recipient_type: self.recipient_type,
            recipient_id: self.recipient_id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            related_entity_type: self.related_entity_type.unwrap_or_default(),
            related_entity_id: self.related_entity_id.unwrap_or_default(),
            is_read: self.is_read != 0,
            created_at: self.created_at,
        }
    }
}
