// Domain layer: solver-agnostic optimization models and the solver contract
pub mod domain;

// Data model: parameter tensors, loaders and the instance generator
pub mod data;

// Problem builder: the stochastic assignment MILP
pub mod formulation;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Result extraction: solver values back to assignment tables
pub mod extraction;

// Application layer: planning use cases
pub mod application;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, OptimizationType, Solution,
    SolutionStatus, SolverBackend, SolverConfig, SolverError, SolverService, Variable,
    VariableType,
};

pub use data::{DataError, DataSource, Dataset, Dimensions, InstanceGenerator, JsonFileSource};

pub use formulation::{
    AssignmentDomain, DurationDomain, FormulationConfig, FormulationError, ObjectiveWeights,
    ProblemBuilder, ScheduleProblem, VariableCostMode,
};

pub use extraction::{ExtractError, ResultExtractor, Schedule};

pub use application::{AssignmentPlanner, PlanOutcome, PlanningError};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
pub use solver::{SolveRunner, SolverFactory};
