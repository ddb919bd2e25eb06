//! Deployment planning, placement and reversal.

pub mod clear;
pub mod executor;
pub mod planner;

pub use clear::{ClearEngine, ClearReport};
pub use executor::{DeployEngine, DeployReport};
pub use planner::{DeploymentPlan, PlanEntry, Planner};
