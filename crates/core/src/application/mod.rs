// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod payment_sweep;
pub mod sweep_scheduler;

// Re-exports
pub use payment_sweep::{OverdueSpa, PaymentStatusChecker, SweepPreview, SweepReport};
pub use sweep_scheduler::{SweepScheduler, SweepSchedulerHandle};
