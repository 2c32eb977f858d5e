//! JSON-RPC Server
//!
//! Admin JSON-RPC 2.0 server over TCP, bound to localhost only.

use crate::handler::RpcHandler;
use crate::types::{GetSpaRequest, ListNotificationsRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use lsa_core::application::SweepScheduler;
use lsa_core::port::{NotificationRepository, SpaRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        scheduler: Arc<SweepScheduler>,
        spa_repo: Arc<dyn SpaRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(
                scheduler,
                spa_repo,
                notification_repo,
                time_provider,
            )),
        }
    }

    /// Build the method table
    pub fn into_module(self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.run.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.run_sweep().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.status.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.sweep_status().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.preview.v1", move |_params, _, _| {
                let handler = handler.clone();
                async move { handler.preview_sweep().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("spa.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: GetSpaRequest = params.parse()?;
                    handler.get_spa(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("notifications.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListNotificationsRequest = params.parse()?;
                    handler.list_notifications(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Security: only binds to the configured host (127.0.0.1 by default)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting admin JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let module = self.into_module()?;
        let handle = server.start(module);

        info!("Admin JSON-RPC server started successfully");
        Ok(handle)
    }
}
