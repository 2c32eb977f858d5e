// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod notification_repository;
pub mod spa_repository;
pub mod time_provider;

// Re-exports
pub use id_provider::{IdProvider, UuidProvider};
pub use notification_repository::NotificationRepository;
pub use spa_repository::SpaRepository;
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};

#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
#[cfg(test)]
pub use spa_repository::MockSpaRepository;
