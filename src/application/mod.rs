// Application module: planning use cases orchestrating build, solve and extraction

pub mod planner;

pub use planner::{AssignmentPlanner, PlanOutcome, PlanningError};
