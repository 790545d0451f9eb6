pub mod alternate;
pub mod observation_plan;
pub mod scheduler;
pub mod scheduling_policy;

/// `tracing` target of the per-placement scheduling events.
pub const PLAN_ANALYTICS_TARGET: &str = "plan_analytics";
