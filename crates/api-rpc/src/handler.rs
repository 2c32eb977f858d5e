//! RPC Method Handlers
//!
//! Implements the logic behind each admin JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    GetSpaRequest, ListNotificationsRequest, ListNotificationsResponse, SpaResponse,
    SweepStatusResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use lsa_core::application::constants::{DEFAULT_NOTIFICATION_LIMIT, MAX_NOTIFICATION_LIMIT};
use lsa_core::application::{SweepPreview, SweepReport, SweepScheduler};
use lsa_core::error::AppError;
use lsa_core::port::{NotificationRepository, SpaRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    scheduler: Arc<SweepScheduler>,
    spa_repo: Arc<dyn SpaRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RpcHandler {
    pub fn new(
        scheduler: Arc<SweepScheduler>,
        spa_repo: Arc<dyn SpaRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            scheduler,
            spa_repo,
            notification_repo,
            time_provider,
        }
    }

    /// sweep.run.v1
    pub async fn run_sweep(&self) -> Result<SweepReport, ErrorObjectOwned> {
        info!("Manual sweep requested over RPC");
        self.scheduler.run_now().await.map_err(to_rpc_error)
    }

    /// sweep.status.v1
    pub async fn sweep_status(&self) -> Result<SweepStatusResponse, ErrorObjectOwned> {
        Ok(SweepStatusResponse {
            running: self.scheduler.is_running(),
            interval_secs: self.scheduler.interval().as_secs(),
            grace_period_days: self.scheduler.checker().grace_period_days(),
            last_report: self.scheduler.last_report().await,
        })
    }

    /// sweep.preview.v1
    pub async fn preview_sweep(&self) -> Result<SweepPreview, ErrorObjectOwned> {
        self.scheduler
            .checker()
            .preview()
            .await
            .map_err(to_rpc_error)
    }

    /// spa.get.v1
    pub async fn get_spa(&self, params: GetSpaRequest) -> Result<SpaResponse, ErrorObjectOwned> {
        let spa = self
            .spa_repo
            .find_by_id(params.spa_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Spa {} not found",
                    params.spa_id
                )))
            })?;

        let today = self.time_provider.today();

        Ok(SpaResponse {
            days_overdue: spa.days_overdue(today),
            id: spa.id,
            name: spa.name,
            status: spa.status,
            next_payment_date: spa.next_payment_date,
            updated_at: spa.updated_at,
        })
    }

    /// notifications.list.v1
    pub async fn list_notifications(
        &self,
        params: ListNotificationsRequest,
    ) -> Result<ListNotificationsResponse, ErrorObjectOwned> {
        let limit = params.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
        if !(1..=MAX_NOTIFICATION_LIMIT).contains(&limit) {
            return Err(to_rpc_error(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_NOTIFICATION_LIMIT
            ))));
        }

        let notifications = self
            .notification_repo
            .list_for_spa(params.spa_id, limit)
            .await
            .map_err(to_rpc_error)?;

        Ok(ListNotificationsResponse {
            spa_id: params.spa_id,
            notifications,
        })
    }
}
