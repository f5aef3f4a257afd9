use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};

/// Tolerance used when checking a returned point against the problem
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Decision variable in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        self.variable_type.is_integral()
    }
}

/// Linear objective over the problem's variables, plus a constant offset
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    /// One coefficient per variable, in variable order
    pub coefficients: Vec<f64>,
    pub constant: f64,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, coefficients: Vec<f64>) -> Self {
        Self {
            optimization_type,
            coefficients,
            constant: 0.0,
        }
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .fold(self.constant, |acc, (c, v)| acc + c * v)
    }
}

/// Sparse linear constraint: `Σ coeff * x[index]  (≤ | = | ≥)  bound`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub terms: Vec<(usize, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self {
            constraint_type,
            terms,
            bound,
            name: String::new(),
        }
    }

    pub fn leq(terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, terms, bound)
    }

    pub fn eq(terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::new(ConstraintType::Equal, terms, bound)
    }

    pub fn geq(terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, terms, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(i, c)| c * values.get(i).copied().unwrap_or(0.0))
            .sum()
    }

    /// Amount by which `values` violates this row (zero when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        self.constraint_type.violation(self.lhs(values), self.bound)
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            gap_tolerance: None,
            verbose: false,
        }
    }
}

/// Complete optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// Measure how far a candidate point is from satisfying the problem
    pub fn assess(&self, values: &[f64]) -> SolutionQuality {
        let max_constraint_violation = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);

        let max_bound_violation = self
            .variables
            .iter()
            .zip(values)
            .map(|(var, &v)| {
                let below = (var.lower_bound - v).max(0.0);
                let above = var.upper_bound.map_or(0.0, |ub| (v - ub).max(0.0));
                below.max(above)
            })
            .fold(0.0, f64::max);

        let max_integrality_violation = self
            .variables
            .iter()
            .zip(values)
            .filter(|(var, _)| var.is_integer())
            .map(|(_, &v)| (v - v.round()).abs())
            .fold(0.0, f64::max);

        SolutionQuality {
            max_constraint_violation: max_constraint_violation.max(max_bound_violation),
            max_integrality_violation,
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_problem(problem: &OptimizationProblem, solve_time_ms: f64) -> Self {
        let count = |t: VariableType| {
            problem
                .variables
                .iter()
                .filter(|v| v.variable_type == t)
                .count() as u32
        };

        Self {
            solve_time_ms,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.constraints.len() as u32,
            num_integer_vars: count(VariableType::Integer),
            num_binary_vars: count(VariableType::Binary),
        }
    }
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

impl SolutionQuality {
    pub fn is_within(&self, tolerance: f64) -> bool {
        self.max_constraint_violation <= tolerance && self.max_integrality_violation <= tolerance
    }
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    /// One value per problem variable when `status` has a solution, empty otherwise
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self::with_values(SolutionStatus::Optimal, value, variable_values)
    }

    pub fn feasible(value: f64, variable_values: Vec<f64>) -> Self {
        Self::with_values(SolutionStatus::Feasible, value, variable_values)
    }

    fn with_values(status: SolutionStatus, value: f64, variable_values: Vec<f64>) -> Self {
        let message = match status {
            SolutionStatus::Optimal => "Optimal solution found",
            _ => "Feasible solution found",
        };
        Self {
            status,
            objective_value: Some(value),
            variable_values,
            message: message.to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn is_feasible(&self) -> bool {
        self.status.has_solution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> OptimizationProblem {
        let objective =
            ObjectiveFunction::new(OptimizationType::Maximize, vec![3.0, 2.0]).with_constant(1.0);
        OptimizationProblem::new(objective)
            .with_variables(vec![Variable::binary("a"), Variable::binary("b")])
            .with_constraints(vec![Constraint::leq(vec![(0, 2.0), (1, 2.0)], 3.0)])
    }

    #[test]
    fn test_objective_includes_constant() {
        let problem = knapsack();
        assert_eq!(problem.objective.evaluate(&[1.0, 0.0]), 4.0);
    }

    #[test]
    fn test_violation_by_constraint_type() {
        let row = vec![(0, 1.0), (1, 1.0)];
        let values = [1.0, 1.0];
        assert_eq!(Constraint::leq(row.clone(), 1.5).violation(&values), 0.5);
        assert_eq!(Constraint::eq(row.clone(), 1.0).violation(&values), 1.0);
        assert_eq!(Constraint::geq(row, 2.5).violation(&values), 0.5);
    }

    #[test]
    fn test_assess_reports_bounds_and_integrality() {
        let problem = knapsack();
        let quality = problem.assess(&[1.0, 0.0]);
        assert!(quality.is_within(FEASIBILITY_TOLERANCE));

        let quality = problem.assess(&[0.5, 1.2]);
        assert!((quality.max_constraint_violation - 0.4).abs() < 1e-9);
        assert!((quality.max_integrality_violation - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_count_variable_kinds() {
        let problem = knapsack().with_variables(vec![
            Variable::binary("a"),
            Variable::integer("b"),
        ]);
        let stats = SolverStatistics::for_problem(&problem, 1.5);
        assert_eq!(stats.num_binary_vars, 1);
        assert_eq!(stats.num_integer_vars, 1);
        assert_eq!(stats.num_constraints, 1);
        assert!(problem.is_mixed_integer());
    }
}
