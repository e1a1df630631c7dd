#![deny(unsafe_code)]

// Domain layer: problem encodings, engine contract, status vocabulary
pub mod domain;

// Application layer: the solver facade
pub mod application;

// Infrastructure layer: model file output
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverBackend
pub mod solver;

// Re-export commonly used types
pub use domain::{
    ColumnMatrix, Engine, LinearProgram, RangeProblem, Result, RowSense, SenseProblem,
    SolveConfig, SolveOutcome, SolveStatus, SolverBackend, SolverConfig, SolverError, VarType,
};

pub use application::Solver;

pub use solver::SolverFactory;

#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;

#[cfg(feature = "highs")]
pub use solver::HighsSolver;
