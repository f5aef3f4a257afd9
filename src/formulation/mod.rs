// Problem builder: turns a dataset into a solver-ready MILP

pub mod builder;
pub mod config;
pub mod error;
pub mod layout;

pub use builder::{ComponentValues, ObjectiveComponents, ProblemBuilder, ScheduleProblem};
pub use config::{
    AssignmentDomain, DurationDomain, FormulationConfig, ObjectiveWeights, VariableCostMode,
};
pub use error::FormulationError;
pub use layout::{VariableFamily, VariableLayout};
