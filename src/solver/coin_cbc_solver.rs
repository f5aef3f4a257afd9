// COIN-OR CBC Solver Adapter, driven through good_lp

use std::time::{Duration, Instant};

use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolutionStatus as GoodLpStatus, SolverModel,
    Variable as GoodLpVariable,
};

use super::{solution_at_time_limit, solution_from_values, solution_without_values};
use crate::domain::{
    models::{OptimizationProblem, Solution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus, VariableType},
};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem, time_limit: Option<Duration>) -> Result<Solution> {
        self.validate(problem)?;

        let start_time = Instant::now();

        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(problem.num_variables());

        for var_def in &problem.variables {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let var = match var_def.variable_type {
                VariableType::Binary => vars.add(variable().binary()),
                VariableType::Integer => vars.add(variable().integer().min(lower).max(upper)),
                VariableType::Continuous => vars.add(variable().min(lower).max(upper)),
            };
            lp_variables.push(var);
        }

        // good_lp minimizes, so negate for maximization
        let is_maximize = problem.objective.optimization_type == OptimizationType::Maximize;
        let mut obj_expr: Expression = 0.into();
        for (&coeff, &var) in problem.objective.coefficients.iter().zip(&lp_variables) {
            if coeff != 0.0 {
                let c = if is_maximize { -coeff } else { coeff };
                obj_expr += c * var;
            }
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);
        if !problem.solver_config.verbose {
            lp_model.set_parameter("log", "0");
        }
        if let Some(limit) = time_limit {
            lp_model.set_parameter("seconds", &format!("{:.3}", limit.as_secs_f64()));
        }
        if let Some(gap) = problem.solver_config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        for constraint in &problem.constraints {
            let mut lhs: Expression = 0.into();
            for &(i, coeff) in &constraint.terms {
                if coeff != 0.0 {
                    lhs += coeff * lp_variables[i];
                }
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_problem(problem, solve_time);

        let solution = match solution_result {
            Ok(sol) => {
                let values: Vec<f64> = lp_variables.iter().map(|&var| sol.value(var)).collect();
                match sol.status() {
                    GoodLpStatus::Optimal => {
                        solution_from_values(problem, SolutionStatus::Optimal, values, statistics)
                    }
                    // CBC hands back its current columns whether or not it has an incumbent
                    GoodLpStatus::TimeLimit => solution_at_time_limit(problem, values, statistics),
                    _ => solution_from_values(problem, SolutionStatus::Feasible, values, statistics),
                }
            }
            Err(ResolutionError::Infeasible) => solution_without_values(
                SolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
                statistics,
            ),
            Err(ResolutionError::Unbounded) => solution_without_values(
                SolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
                statistics,
            ),
            Err(e) => return Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        };

        tracing::info!(
            solver = self.name(),
            status = %solution.status,
            elapsed_ms = solution.statistics.solve_time_ms,
            "solve finished"
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
