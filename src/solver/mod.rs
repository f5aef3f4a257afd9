// Solver adapters: concrete implementations of SolverService

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc_solver;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_solver;
pub mod runner;

#[cfg(feature = "coin_cbc")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
pub use runner::SolveRunner;

#[cfg(any(feature = "highs", feature = "coin_cbc"))]
use crate::domain::{
    models::{OptimizationProblem, Solution, SolverStatistics, FEASIBILITY_TOLERANCE},
    value_objects::SolutionStatus,
};

/// Wrap raw column values from a backend into a checked domain solution
#[cfg(any(feature = "highs", feature = "coin_cbc"))]
pub(crate) fn solution_from_values(
    problem: &OptimizationProblem,
    status: SolutionStatus,
    values: Vec<f64>,
    statistics: SolverStatistics,
) -> Solution {
    let objective = problem.objective.evaluate(&values);
    let quality = problem.assess(&values);
    let solution = match status {
        SolutionStatus::Optimal => Solution::optimal(objective, values),
        _ => Solution::feasible(objective, values),
    };
    let message = format!("{} solution found for '{}'", status, problem.name);
    solution
        .with_message(message)
        .with_statistics(statistics)
        .with_quality(quality)
}

/// A solution without values, for every non-success status
#[cfg(any(feature = "highs", feature = "coin_cbc"))]
pub(crate) fn solution_without_values(
    status: SolutionStatus,
    message: impl Into<String>,
    statistics: SolverStatistics,
) -> Solution {
    Solution::new(status, message).with_statistics(statistics)
}

/// A backend stopped at its time limit and handed back its current point.
/// The point is kept as `Feasible` only if it satisfies every row and
/// integrality requirement; otherwise the solve timed out with nothing usable.
#[cfg(any(feature = "highs", feature = "coin_cbc"))]
pub(crate) fn solution_at_time_limit(
    problem: &OptimizationProblem,
    values: Vec<f64>,
    statistics: SolverStatistics,
) -> Solution {
    let quality = problem.assess(&values);
    if values.len() == problem.num_variables() && quality.is_within(FEASIBILITY_TOLERANCE) {
        solution_from_values(problem, SolutionStatus::Feasible, values, statistics)
    } else {
        tracing::warn!(
            problem = %problem.name,
            max_violation = quality.max_constraint_violation,
            "time limit reached without a feasible incumbent"
        );
        solution_without_values(
            SolutionStatus::TimedOut,
            "Time limit reached without a feasible solution",
            statistics,
        )
    }
}
