// Async front end for blocking solvers.
// Each solve runs on tokio's blocking pool and owns its problem through an
// `Arc`; nothing mutates a problem once it is handed over. Backends honor
// the time limit themselves, and a watchdog at `time_limit + grace` turns a
// backend that overruns into a `TimedOut` answer instead of a hang.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::domain::{
    models::{OptimizationProblem, Solution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolutionStatus,
};

pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SolveRunner {
    solver: Arc<dyn SolverService>,
    grace: Duration,
}

impl SolveRunner {
    pub fn new(solver: Arc<dyn SolverService>) -> Self {
        Self {
            solver,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Solve on the calling thread; only the backend's own limit applies
    pub fn solve_blocking(
        &self,
        problem: &OptimizationProblem,
        time_limit: Option<Duration>,
    ) -> Result<Solution> {
        self.solver.solve(problem, time_limit)
    }

    pub async fn solve(
        &self,
        problem: Arc<OptimizationProblem>,
        time_limit: Option<Duration>,
    ) -> Result<Solution> {
        let solver = Arc::clone(&self.solver);
        let task_problem = Arc::clone(&problem);
        let handle =
            tokio::task::spawn_blocking(move || solver.solve(&task_problem, time_limit));

        let joined = match time_limit {
            Some(limit) => match tokio::time::timeout(limit + self.grace, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking task is detached and finishes on its own
                    tracing::warn!(
                        problem = %problem.name,
                        solver = self.solver.name(),
                        ?limit,
                        "solver overran its time limit, abandoning"
                    );
                    let statistics = SolverStatistics::for_problem(
                        &problem,
                        (limit + self.grace).as_secs_f64() * 1000.0,
                    );
                    return Ok(Solution::new(
                        SolutionStatus::TimedOut,
                        format!("{} did not return within {:?}", self.solver.name(), limit),
                    )
                    .with_statistics(statistics));
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| SolverError::ExecutionFailed(format!("solver task failed: {}", e)))?
    }

    /// Solve independent problems concurrently, answers in input order
    pub async fn solve_all(
        &self,
        problems: Vec<Arc<OptimizationProblem>>,
        time_limit: Option<Duration>,
    ) -> Vec<Result<Solution>> {
        join_all(problems.into_iter().map(|p| self.solve(p, time_limit))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObjectiveFunction, OptimizationType, Variable};

    /// Returns every variable at its lower bound after a fixed delay
    struct SleepySolver(Duration);

    impl SolverService for SleepySolver {
        fn solve(&self, problem: &OptimizationProblem, _: Option<Duration>) -> Result<Solution> {
            std::thread::sleep(self.0);
            let values: Vec<f64> = problem.variables.iter().map(|v| v.lower_bound).collect();
            Ok(Solution::optimal(problem.objective.evaluate(&values), values))
        }

        fn name(&self) -> &str {
            "sleepy"
        }

        fn supports_mip(&self) -> bool {
            false
        }
    }

    struct PanickingSolver;

    impl SolverService for PanickingSolver {
        fn solve(&self, _: &OptimizationProblem, _: Option<Duration>) -> Result<Solution> {
            panic!("backend crashed")
        }

        fn name(&self) -> &str {
            "panicking"
        }

        fn supports_mip(&self) -> bool {
            false
        }
    }

    fn tiny(name: &str) -> Arc<OptimizationProblem> {
        Arc::new(
            OptimizationProblem::new(ObjectiveFunction::new(OptimizationType::Minimize, vec![2.0]))
                .with_name(name)
                .with_variables(vec![Variable::continuous("x").with_bounds(3.0, Some(4.0))]),
        )
    }

    #[tokio::test]
    async fn test_solve_within_limit() {
        let runner = SolveRunner::new(Arc::new(SleepySolver(Duration::from_millis(5))));
        let solution = runner
            .solve(tiny("a"), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, Some(6.0));
    }

    #[tokio::test]
    async fn test_watchdog_times_out() {
        let runner = SolveRunner::new(Arc::new(SleepySolver(Duration::from_millis(500))))
            .with_grace(Duration::from_millis(20));
        let solution = runner
            .solve(tiny("slow"), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::TimedOut);
        assert!(solution.variable_values.is_empty());
    }

    #[tokio::test]
    async fn test_crashed_backend_is_execution_failure() {
        let runner = SolveRunner::new(Arc::new(PanickingSolver));
        assert!(matches!(
            runner.solve(tiny("boom"), None).await,
            Err(SolverError::ExecutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_solve_all_keeps_order() {
        let runner = SolveRunner::new(Arc::new(SleepySolver(Duration::from_millis(1))));
        let results = runner
            .solve_all(vec![tiny("a"), tiny("b"), tiny("c")], None)
            .await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|s| s.is_optimal())));
    }
}
