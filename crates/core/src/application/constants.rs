// Payment sweep constants (no magic values)
use std::time::Duration;

/// Days a VERIFIED spa may stay unpaid past its due date before demotion
pub const GRACE_PERIOD_DAYS: i64 = 5;

/// Default interval between scheduled sweeps (once daily)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default page size when listing notifications
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;

/// Upper bound for a single notification listing
pub const MAX_NOTIFICATION_LIMIT: i64 = 500;
