// HiGHS Solver Adapter
// Translates domain problems to the HiGHS row-wise API and normalizes its model status

use std::time::{Duration, Instant};

use highs::{HighsModelStatus, RowProblem, Sense};

use super::{solution_from_values, solution_without_values};
use crate::domain::{
    models::{OptimizationProblem, Solution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus, VariableType},
};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem, time_limit: Option<Duration>) -> Result<Solution> {
        self.validate(problem)?;

        let start_time = Instant::now();

        // Add variables first, then constraints
        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(problem.num_variables());

        for (var_def, &obj_coeff) in problem.variables.iter().zip(&problem.objective.coefficients) {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, lower..upper)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, lower..upper),
            };
            cols.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .terms
                .iter()
                .filter(|(_, coeff)| *coeff != 0.0)
                .map(|&(i, coeff)| (cols[i], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => pb.add_row(..=constraint.bound, &terms),
                ConstraintType::Equal => pb.add_row(constraint.bound..=constraint.bound, &terms),
                ConstraintType::GreaterThanOrEqual => pb.add_row(constraint.bound.., &terms),
            }
        }

        let sense = match problem.objective.optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut model = pb.optimise(sense);
        model.set_option("output_flag", problem.solver_config.verbose);
        if let Some(limit) = time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        if let Some(gap) = problem.solver_config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolverError::ExecutionFailed(format!("HiGHS refused the model: {:?}", status)))?;
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_problem(problem, solve_time);

        let solution = match solved.status() {
            HighsModelStatus::Optimal => {
                let values = solved.get_solution().columns().to_vec();
                solution_from_values(problem, SolutionStatus::Optimal, values, statistics)
            }
            HighsModelStatus::Infeasible => solution_without_values(
                SolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
                statistics,
            ),
            HighsModelStatus::UnboundedOrInfeasible => solution_without_values(
                SolutionStatus::Infeasible,
                "Problem is infeasible or unbounded",
                statistics,
            ),
            HighsModelStatus::Unbounded => solution_without_values(
                SolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
                statistics,
            ),
            HighsModelStatus::ReachedTimeLimit => solution_without_values(
                SolutionStatus::TimedOut,
                format!("Time limit of {:?} reached", time_limit.unwrap_or_default()),
                statistics,
            ),
            status => solution_without_values(
                SolutionStatus::Error,
                format!("HiGHS solver returned status: {:?}", status),
                statistics,
            ),
        };

        tracing::info!(
            solver = self.name(),
            status = %solution.status,
            elapsed_ms = solve_time,
            "solve finished"
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dimensions, InstanceGenerator};
    use crate::domain::{Constraint, ObjectiveFunction, Variable};
    use crate::formulation::{FormulationConfig, ProblemBuilder};

    // Knapsack: maximize 150a + 90b + 120c subject to 7a + 3b + 4c <= 10
    fn knapsack() -> OptimizationProblem {
        OptimizationProblem::new(ObjectiveFunction::new(
            OptimizationType::Maximize,
            vec![150.0, 90.0, 120.0],
        ))
        .with_name("knapsack")
        .with_variables(vec![
            Variable::binary("tent"),
            Variable::binary("stove"),
            Variable::binary("food"),
        ])
        .with_constraints(vec![Constraint::leq(
            vec![(0, 7.0), (1, 3.0), (2, 4.0)],
            10.0,
        )])
    }

    #[test]
    fn test_knapsack_optimal() {
        let solution = HighsSolver::new().solve(&knapsack(), None).unwrap();
        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value.map(f64::round), Some(240.0));
        assert!(solution.quality.is_within(1e-6));
        assert_eq!(solution.statistics.num_binary_vars, 3);
    }

    #[test]
    fn test_infeasible_reports_status() {
        let problem = knapsack()
            .with_constraints(vec![Constraint::geq(vec![(0, 1.0), (1, 1.0), (2, 1.0)], 4.0)]);
        let solution = HighsSolver::new().solve(&problem, None).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.variable_values.is_empty());
    }

    #[test]
    fn test_invalid_problem_is_error() {
        let problem = knapsack().with_constraints(vec![Constraint::leq(vec![(9, 1.0)], 1.0)]);
        assert!(matches!(
            HighsSolver::new().solve(&problem, None),
            Err(SolverError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_time_limit_reports_timed_out_without_values() {
        let data = InstanceGenerator::new(Dimensions::new(10, 15, 6, 4), 3).generate();
        let config = FormulationConfig::default()
            .with_quality_floors(0.0, 0.0)
            .with_budget_cap(1e7);
        let built = ProblemBuilder::new(config).build(&data).unwrap();

        let solution = HighsSolver::new()
            .solve(&built.problem, Some(Duration::from_micros(1)))
            .unwrap();
        assert_eq!(solution.status, SolutionStatus::TimedOut);
        assert!(solution.variable_values.is_empty());
        assert!(solution.objective_value.is_none());
    }
}
