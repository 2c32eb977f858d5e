// LSA Infrastructure - SQLite Adapter
// Implements: SpaRepository, NotificationRepository

mod connection;
mod error;
mod migration;
mod notification_repository;
mod spa_repository;

pub use connection::create_pool;
pub use migration::{current_version, run_migrations};
pub use notification_repository::SqliteNotificationRepository;
pub use spa_repository::SqliteSpaRepository;
