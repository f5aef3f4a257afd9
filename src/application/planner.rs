// Use case: dataset in, assignment schedule out
// Build → solve → extract, with every failure surfaced as a typed error

use std::sync::Arc;
use std::time::Duration;

use crate::data::{DataError, DataSource, Dataset};
use crate::domain::{Solution, SolverError, SolverService};
use crate::extraction::{ExtractError, ResultExtractor, Schedule};
use crate::formulation::{FormulationConfig, FormulationError, ProblemBuilder, ScheduleProblem};
use crate::solver::SolveRunner;

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Formulation(#[from] FormulationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// A finished plan: the problem that was solved, the raw answer and the tables
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub problem: ScheduleProblem,
    pub solution: Solution,
    pub schedule: Schedule,
}

pub struct AssignmentPlanner {
    builder: ProblemBuilder,
    runner: SolveRunner,
    extractor: ResultExtractor,
    time_limit: Option<Duration>,
}

impl AssignmentPlanner {
    pub fn new(solver: Arc<dyn SolverService>, config: FormulationConfig) -> Self {
        Self {
            builder: ProblemBuilder::new(config),
            runner: SolveRunner::new(solver),
            extractor: ResultExtractor::default(),
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_extractor(mut self, extractor: ResultExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_runner(mut self, runner: SolveRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn builder(&self) -> &ProblemBuilder {
        &self.builder
    }

    pub fn extractor(&self) -> &ResultExtractor {
        &self.extractor
    }

    /// Plan one instance on the calling thread
    pub fn plan(&self, data: &Dataset) -> Result<PlanOutcome, PlanningError> {
        let problem = self.builder.build(data)?;
        tracing::info!(solver = self.runner.solver_name(), "solving {}", problem.problem.name);
        let solution = self
            .runner
            .solve_blocking(&problem.problem, self.time_limit)?;
        self.finish(problem, solution)
    }

    /// Load from any source, then plan
    pub fn plan_from(&self, source: &dyn DataSource) -> Result<PlanOutcome, PlanningError> {
        let data = source.load()?;
        self.plan(&data)
    }

    /// Plan one instance on the blocking pool, guarded by the watchdog
    pub async fn plan_async(&self, data: &Dataset) -> Result<PlanOutcome, PlanningError> {
        let problem = self.builder.build(data)?;
        let solution = self
            .runner
            .solve(Arc::clone(&problem.problem), self.time_limit)
            .await?;
        self.finish(problem, solution)
    }

    /// Plan independent instances concurrently; answers keep the input order.
    /// Every instance is built before any solver starts.
    pub async fn plan_all(&self, datasets: &[Dataset]) -> Vec<Result<PlanOutcome, PlanningError>> {
        let built: Vec<Result<ScheduleProblem, FormulationError>> =
            datasets.iter().map(|d| self.builder.build(d)).collect();

        let to_solve: Vec<_> = built
            .iter()
            .filter_map(|b| b.as_ref().ok())
            .map(|p| Arc::clone(&p.problem))
            .collect();
        let mut solutions = self
            .runner
            .solve_all(to_solve, self.time_limit)
            .await
            .into_iter();

        built
            .into_iter()
            .map(|b| {
                let problem = b?;
                match solutions.next() {
                    Some(solution) => self.finish(problem, solution?),
                    None => Err(PlanningError::Solver(SolverError::ExecutionFailed(
                        "missing solution for a built problem".to_string(),
                    ))),
                }
            })
            .collect()
    }

    fn finish(
        &self,
        problem: ScheduleProblem,
        solution: Solution,
    ) -> Result<PlanOutcome, PlanningError> {
        let schedule = self.extractor.extract(&problem, &solution)?;
        Ok(PlanOutcome {
            problem,
            solution,
            schedule,
        })
    }
}
