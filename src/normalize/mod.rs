//! Reconciles untrusted generated content plans with the simulated cadence.

pub mod raw;
pub mod schedule;
pub mod weekly;

pub use raw::RawStrategy;
pub use schedule::{normalize_posting_schedule, normalize_time};
pub use weekly::{fallback_weekly_plans, normalize_weekly_plans, WeekTargets};
