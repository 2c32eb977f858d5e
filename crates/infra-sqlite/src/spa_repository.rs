// SQLite SpaRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use chrono::NaiveDate;
use lsa_core::domain::{Spa, SpaId, SpaStatus};
use lsa_core::error::{AppError, Result};
use lsa_core::port::SpaRepository;
use sqlx::SqlitePool;

const SPA_COLUMNS: &str = "id, name, status, next_payment_date, created_at, updated_at";

pub struct SqliteSpaRepository {
    pool: SqlitePool,
}

impl SqliteSpaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a spa row (imports and fixtures; registration
    /// itself happens in the admin application)
    pub async fn upsert(&self, spa: &Spa) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO spas (id, name, status, next_payment_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                next_payment_date = excluded.next_payment_date,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(spa.id)
        .bind(&spa.name)
        .bind(spa.status.as_str())
        .bind(spa.next_payment_date)
        .bind(spa.created_at)
        .bind(spa.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl SpaRepository for SqliteSpaRepository {
    async fn find_by_id(&self, id: SpaId) -> Result<Option<Spa>> {
        let row = sqlx::query_as::<_, SpaRow>(&format!(
            "SELECT {SPA_COLUMNS} FROM spas WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(SpaRow::into_spa).transpose()
    }

    async fn find_verified_due_before(&self, due_before: NaiveDate) -> Result<Vec<Spa>> {
        // ISO dates compare correctly as text
        let rows: Vec<SpaRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SPA_COLUMNS} FROM spas
            WHERE status = ?
            AND next_payment_date IS NOT NULL
            AND next_payment_date < ?
            ORDER BY id ASC
            "#
        ))
        .bind(SpaStatus::Verified.as_str())
        .bind(due_before)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(SpaRow::into_spa).collect()
    }

    async fn demote_to_unverified(&self, id: SpaId, updated_at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE spas
            SET status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(SpaStatus::Unverified.as_str())
        .bind(updated_at)
        .bind(id)
        .bind(SpaStatus::Verified.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SpaRow {
    id: i64,
    name: String,
    status: String,
    next_payment_date: Option<NaiveDate>,
    created_at: i64,
    updated_at: i64,
}

impl SpaRow {
    fn into_spa(self) -> Result<Spa> {
        let status: SpaStatus = self.status.parse().map_err(AppError::Domain)?;

        Ok(Spa {
            id: self.id,
            name: self.name,
            status,
            next_payment_date: self.next_payment_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
