// Domain value objects shared by every optimization problem the crate builds

use std::fmt;

/// Domain of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Continuous,
    Integer,
    /// Integer restricted to {0, 1}
    Binary,
}

impl VariableType {
    /// Whether a solver must return a whole value for this column
    pub fn is_integral(&self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Binary)
    }
}

/// Sense of a linear row `lhs ? bound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    LessThanOrEqual,
    Equal,
    GreaterThanOrEqual,
}

impl ConstraintType {
    /// How far `lhs` lies on the wrong side of `bound`, zero when satisfied
    pub fn violation(&self, lhs: f64, bound: f64) -> f64 {
        match self {
            ConstraintType::LessThanOrEqual => (lhs - bound).max(0.0),
            ConstraintType::Equal => (lhs - bound).abs(),
            ConstraintType::GreaterThanOrEqual => (bound - lhs).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    Minimize,
    Maximize,
}

/// Terminal status reported by a solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Found feasible solution (may not be optimal)
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached before a usable answer
    TimedOut,
    /// Solver error occurred
    Error,
}

impl SolutionStatus {
    /// Whether the variable values of a solution with this status can be used
    pub fn has_solution(&self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Feasible)
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "optimal"),
            SolutionStatus::Feasible => write!(f, "feasible"),
            SolutionStatus::Infeasible => write!(f, "infeasible"),
            SolutionStatus::Unbounded => write!(f, "unbounded"),
            SolutionStatus::TimedOut => write!(f, "timedOut"),
            SolutionStatus::Error => write!(f, "error"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    /// Automatically select best available solver
    Auto,
    /// HiGHS (in-process, MIP capable)
    Highs,
    /// COIN-OR CBC through good_lp
    CoinCbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}

impl std::str::FromStr for SolverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SolverBackend::Auto),
            "highs" => Ok(SolverBackend::Highs),
            "cbc" | "coin_cbc" | "coin-cbc" => Ok(SolverBackend::CoinCbc),
            other => Err(format!("unknown solver backend '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_by_sense() {
        assert_eq!(ConstraintType::LessThanOrEqual.violation(5.0, 3.0), 2.0);
        assert_eq!(ConstraintType::LessThanOrEqual.violation(1.0, 3.0), 0.0);
        assert_eq!(ConstraintType::GreaterThanOrEqual.violation(1.0, 3.0), 2.0);
        assert_eq!(ConstraintType::Equal.violation(1.0, 3.0), 2.0);
    }

    #[test]
    fn test_status_display_and_usability() {
        assert_eq!(SolutionStatus::TimedOut.to_string(), "timedOut");
        assert!(SolutionStatus::Feasible.has_solution());
        assert!(!SolutionStatus::TimedOut.has_solution());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("HiGHS".parse::<SolverBackend>(), Ok(SolverBackend::Highs));
        assert_eq!("coin-cbc".parse::<SolverBackend>(), Ok(SolverBackend::CoinCbc));
        assert!("gurobi".parse::<SolverBackend>().is_err());
    }
}
