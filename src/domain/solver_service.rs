// Domain service interface for solver backends
// Defines the contract that every engine adapter must follow (Dependency Inversion Principle)

use super::models::{LinearProgram, SolveConfig};
use super::value_objects::SolveStatus;
use std::path::Path;

/// Error types for the solver facade
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Invalid row sense '{0}'")]
    InvalidRowSense(char),

    #[error("Invalid variable type '{0}'")]
    InvalidVarType(char),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("No problem loaded")]
    NotLoaded,

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// What a backend reports after one solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Column values in column order, present only when the engine holds a solution
    pub columns: Option<Vec<f64>>,
}

impl SolveOutcome {
    pub fn new(status: SolveStatus, columns: Option<Vec<f64>>) -> Self {
        Self { status, columns }
    }
}

/// Capability interface of one solver engine.
///
/// An implementation owns exactly one native environment and releases it on
/// drop. Calls arrive sequentially from the owning facade.
pub trait SolverBackend {
    /// Sentinel the engine uses for an unbounded bound
    fn infinity(&self) -> f64;

    /// Replace the engine's problem with `program`
    fn load(&mut self, program: &LinearProgram, verbose: bool) -> Result<()>;

    /// Run one blocking search on the loaded problem
    fn solve(&mut self, config: &SolveConfig) -> Result<SolveOutcome>;

    /// Write the loaded problem in LP format, optionally with column and row names
    fn write_lp(
        &mut self,
        path: &Path,
        col_names: Option<&[&str]>,
        row_names: Option<&[&str]>,
    ) -> Result<()>;

    /// Whether `threads > 1` can actually run a concurrent search
    fn supports_parallel(&self) -> bool;

    /// Get the name of this solver backend
    fn name(&self) -> &str;
}
