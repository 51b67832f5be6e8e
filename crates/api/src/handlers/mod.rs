pub mod automations;
pub mod events;
pub mod executions;
pub mod point_loads;
