// Domain Layer - Pure business rules and entities

pub mod error;
pub mod notification;
pub mod spa;

// Re-exports
pub use error::DomainError;
pub use notification::{format_display_date, NewNotification, Notification, NotificationId};
pub use spa::{Spa, SpaId, SpaStatus};
