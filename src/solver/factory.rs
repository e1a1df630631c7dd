use crate::domain::{
    solver_service::{Result, SolverBackend, SolverError},
    value_objects::Engine,
};

#[cfg(feature = "cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;

/// Factory for creating backend instances based on the engine selector
pub struct SolverFactory;

impl SolverFactory {
    /// Allocate the backend for `engine`.
    ///
    /// Fails when the engine's feature is not compiled in or its native
    /// environment cannot be created.
    pub fn create_backend(engine: Engine) -> Result<Box<dyn SolverBackend>> {
        match engine {
            #[cfg(feature = "cbc")]
            Engine::CoinCbc => Ok(Box::new(CoinCbcSolver::new())),
            #[cfg(feature = "highs")]
            Engine::Highs => Ok(Box::new(HighsSolver::new()?)),
            #[allow(unreachable_patterns)]
            other => Err(SolverError::SolverNotAvailable(format!(
                "{} support is not compiled in (enable the '{}' feature)",
                other,
                feature_name(other)
            ))),
        }
    }

    /// Engines usable in this build
    pub fn available_engines() -> Vec<Engine> {
        [Engine::CoinCbc, Engine::Highs]
            .into_iter()
            .filter(|e| e.is_available())
            .collect()
    }
}

fn feature_name(engine: Engine) -> &'static str {
    match engine {
        Engine::CoinCbc => "cbc",
        Engine::Highs => "highs",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_engines_follow_features() {
        let engines = SolverFactory::available_engines();
        assert_eq!(engines.contains(&Engine::CoinCbc), cfg!(feature = "cbc"));
        assert_eq!(engines.contains(&Engine::Highs), cfg!(feature = "highs"));
    }

    #[cfg(not(feature = "cbc"))]
    #[test]
    fn test_cbc_unavailable() {
        let err = SolverFactory::create_backend(Engine::CoinCbc).err().unwrap();
        assert!(matches!(err, SolverError::SolverNotAvailable(_)));
        assert!(err.to_string().contains("'cbc' feature"));
    }

    #[cfg(not(feature = "highs"))]
    #[test]
    fn test_highs_unavailable() {
        let err = SolverFactory::create_backend(Engine::Highs).err().unwrap();
        assert!(matches!(err, SolverError::SolverNotAvailable(_)));
    }

    #[cfg(feature = "cbc")]
    #[test]
    fn test_create_cbc_backend() {
        let backend = SolverFactory::create_backend(Engine::CoinCbc).unwrap();
        assert_eq!(backend.name(), "COIN-OR CBC");
    }

    #[cfg(feature = "highs")]
    #[test]
    fn test_create_highs_backend() {
        let backend = SolverFactory::create_backend(Engine::Highs).unwrap();
        assert_eq!(backend.name(), "HiGHS");
    }
}
