use std::sync::Arc;

use crate::domain::{
    models::OptimizationProblem,
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "coin_cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver based on the problem configuration
    pub fn create_solver(problem: &OptimizationProblem) -> Result<Arc<dyn SolverService>> {
        Self::create_from_backend(problem.solver_config.backend)
    }

    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Self::default_solver(),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => Ok(Arc::new(HighsSolver::new())),
            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Ok(Arc::new(CoinCbcSolver::new())),
            #[allow(unreachable_patterns)]
            other => Err(SolverError::SolverNotAvailable(format!(
                "{} support was not compiled in",
                other
            ))),
        }
    }

    /// The first compiled-in backend, HiGHS preferred
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        match Self::available_backends().first() {
            Some(&backend) => Self::create_from_backend(backend),
            None => Err(SolverError::SolverNotAvailable(
                "no solver backend was compiled in".to_string(),
            )),
        }
    }

    pub fn available_backends() -> Vec<SolverBackend> {
        // Stays empty when no backend feature is enabled
        #[allow(unused_mut)]
        let mut backends = Vec::new();
        #[cfg(feature = "highs")]
        backends.push(SolverBackend::Highs);
        #[cfg(feature = "coin_cbc")]
        backends.push(SolverBackend::CoinCbc);
        backends
    }
}
