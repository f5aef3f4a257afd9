// Domain service interface for solving optimization problems
// Defines the contract that any solver backend must follow; the rest of the crate only sees this trait

use std::time::Duration;

use super::models::{OptimizationProblem, Solution};

/// Failures to run a solver at all. A solver that ran and reported
/// `infeasible` or `unbounded` returns `Ok` with that status instead.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// Implementations are pure protocol bridges: they translate an
/// [`OptimizationProblem`] into a backend's API, apply the time limit,
/// and normalize the backend's answer into a [`Solution`].
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem, giving up after `time_limit` when set
    fn solve(&self, problem: &OptimizationProblem, time_limit: Option<Duration>)
        -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = problem.num_variables();

        if num_vars == 0 {
            errors.push("Problem must have at least one variable".to_string());
        }

        if problem.objective.num_variables() != num_vars {
            errors.push(format!(
                "Number of variables ({}) doesn't match objective coefficients ({})",
                num_vars,
                problem.objective.num_variables()
            ));
        }

        if problem.objective.coefficients.iter().any(|c| !c.is_finite()) {
            errors.push("Objective has a non-finite coefficient".to_string());
        }

        for (i, constraint) in problem.constraints.iter().enumerate() {
            if let Some(&(index, _)) = constraint.terms.iter().find(|(idx, _)| *idx >= num_vars) {
                errors.push(format!(
                    "Constraint {} '{}' references variable {} but problem has {} variables",
                    i, constraint.name, index, num_vars
                ));
            }
            if !constraint.bound.is_finite() || constraint.terms.iter().any(|(_, c)| !c.is_finite())
            {
                errors.push(format!(
                    "Constraint {} '{}' has a non-finite coefficient or bound",
                    i, constraint.name
                ));
            }
        }

        for (i, var) in problem.variables.iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, ObjectiveFunction, OptimizationType, Variable};

    struct NullSolver;

    impl SolverService for NullSolver {
        fn solve(&self, _: &OptimizationProblem, _: Option<Duration>) -> Result<Solution> {
            Err(SolverError::SolverNotAvailable("null".into()))
        }

        fn name(&self) -> &str {
            "null"
        }

        fn supports_mip(&self) -> bool {
            false
        }
    }

    fn problem() -> OptimizationProblem {
        OptimizationProblem::new(ObjectiveFunction::new(
            OptimizationType::Minimize,
            vec![1.0, 1.0],
        ))
        .with_variables(vec![Variable::continuous("x"), Variable::continuous("y")])
    }

    #[test]
    fn test_validate_accepts_consistent_problem() {
        let p = problem().with_constraints(vec![Constraint::geq(vec![(0, 1.0), (1, 1.0)], 1.0)]);
        assert!(NullSolver.validate(&p).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_term() {
        let p = problem().with_constraints(vec![Constraint::geq(vec![(2, 1.0)], 1.0)]);
        let err = NullSolver.validate(&p).unwrap_err();
        assert!(err.to_string().contains("references variable 2"));
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let p = problem().with_variables(vec![
            Variable::continuous("x").with_bounds(2.0, Some(1.0)),
            Variable::continuous("y"),
        ]);
        assert!(matches!(
            NullSolver.validate(&p),
            Err(SolverError::InvalidProblem(_))
        ));
    }
}
