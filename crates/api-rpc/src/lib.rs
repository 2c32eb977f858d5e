//! Admin JSON-RPC API Layer
//!
//! Operator surface of the payment status service: trigger and inspect
//! sweeps, look up spas and their notifications.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
