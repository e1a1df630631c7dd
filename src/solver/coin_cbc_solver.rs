// COIN-OR CBC Solver Adapter
// Implements the SolverBackend interface on top of the Cbc C API

use crate::domain::{
    models::{LinearProgram, ModelNames, SolveConfig},
    solver_service::{Result, SolveOutcome, SolverBackend, SolverError},
    value_objects::SolveStatus,
};
use crate::infrastructure::lp_writer;
use coin_cbc::raw::Model;
use std::ffi::CString;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// COIN_DBL_MAX, what Cbc reports as an infinite bound
const CBC_INFINITY: f64 = f64::MAX;

// Cbc secondary status codes
const UNLAUNCHED: i32 = -1;
const HAS_SOLUTION: i32 = 0;
const LP_INFEASIBLE: i32 = 1;
const STOPPED_ON_GAP: i32 = 2;
const STOPPED_ON_SOLUTIONS: i32 = 6;
const RELAXATION_UNBOUNDED: i32 = 7;

/// Cbc keeps its best objective at or above this until it finds an incumbent
const NO_INCUMBENT_OBJECTIVE: f64 = 1e50;

/// Cbc backend.
///
/// The loaded problem is the environment; every solve runs in a fresh Cbc
/// session built from it, so parameters never leak from one solve to the next.
pub struct CoinCbcSolver {
    program: Option<LinearProgram>,
}

impl CoinCbcSolver {
    pub fn new() -> Self {
        debug!(
            component = "solver",
            operation = "init_cbc",
            "Creating CBC backend"
        );
        Self { program: None }
    }

    fn session(program: &LinearProgram) -> Model {
        let mut model = Model::new();
        model.load_problem(
            program.num_cols(),
            program.num_rows,
            &program.starts,
            &program.indices,
            &program.values,
            Some(program.col_lower.as_slice()),
            Some(program.col_upper.as_slice()),
            Some(program.objective.as_slice()),
            Some(program.row_lower.as_slice()),
            Some(program.row_upper.as_slice()),
        );
        for (col, _) in program.integer.iter().enumerate().filter(|(_, is_int)| **is_int) {
            model.set_integer(col);
        }
        model
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn set_parameter(model: &mut Model, name: &str, value: &str) -> Result<()> {
    trace!(component = "solver", operation = "set_parameter", name, value, "CBC parameter");
    let name = CString::new(name).map_err(|e| SolverError::ExecutionFailed(e.to_string()))?;
    let value = CString::new(value).map_err(|e| SolverError::ExecutionFailed(e.to_string()))?;
    model.set_parameter(&name, &value);
    Ok(())
}

/// Verdict of one finished Cbc search
#[derive(Debug, Clone, Copy, PartialEq)]
struct Termination {
    proven_infeasible: bool,
    continuous_unbounded: bool,
    proven_optimal: bool,
    secondary_status: i32,
    objective: f64,
}

impl Termination {
    fn read(model: &Model) -> Self {
        Self {
            proven_infeasible: model.is_proven_infeasible(),
            continuous_unbounded: model.is_continuous_unbounded(),
            proven_optimal: model.is_proven_optimal(),
            secondary_status: model.secondary_status() as i32,
            objective: model.obj_value(),
        }
    }

    /// Status reported to the caller: Cbc's secondary status, or a verdict
    /// derived from the relaxation when branch-and-bound never launched.
    fn status_code(&self) -> i32 {
        if self.proven_infeasible {
            return LP_INFEASIBLE;
        }
        if self.continuous_unbounded {
            return RELAXATION_UNBOUNDED;
        }
        match self.secondary_status {
            UNLAUNCHED if self.proven_optimal => HAS_SOLUTION,
            code => code,
        }
    }

    fn has_incumbent(&self, code: i32) -> bool {
        match code {
            HAS_SOLUTION | STOPPED_ON_GAP | STOPPED_ON_SOLUTIONS => true,
            UNLAUNCHED | LP_INFEASIBLE | RELAXATION_UNBOUNDED => false,
            // stopped on a time, node, iteration or user limit
            _ => self.objective.abs() < NO_INCUMBENT_OBJECTIVE,
        }
    }
}

impl SolverBackend for CoinCbcSolver {
    fn infinity(&self) -> f64 {
        CBC_INFINITY
    }

    fn load(&mut self, program: &LinearProgram, _verbose: bool) -> Result<()> {
        debug!(
            component = "solver",
            operation = "load_problem",
            engine = "cbc",
            num_cols = program.num_cols(),
            num_rows = program.num_rows,
            num_nonzeros = program.num_nonzeros(),
            num_integers = program.num_integers(),
            "Loading problem"
        );
        self.program = Some(program.clone());
        Ok(())
    }

    fn solve(&mut self, config: &SolveConfig) -> Result<SolveOutcome> {
        let program = self.program.as_ref().ok_or(SolverError::NotLoaded)?;
        let start_time = Instant::now();
        let mut model = Self::session(program);

        let max_solutions = config.max_solutions.to_string();
        set_parameter(&mut model, "log", &config.log_level.to_string())?;
        set_parameter(&mut model, "maxSolutions", &max_solutions)?;
        set_parameter(&mut model, "maxSavedSolutions", &max_solutions)?;

        let parallel = config.is_parallel() && self.supports_parallel();
        let time_limit = if parallel {
            set_parameter(&mut model, "threads", &config.threads.to_string())?;
            config.scaled_time_limit(config.threads)
        } else {
            if config.is_parallel() {
                debug!(
                    component = "solver",
                    operation = "solve",
                    threads = config.threads,
                    "CBC built without parallel search; solving on one thread"
                );
            }
            config.time_limit
        };
        if let Some(limit) = time_limit {
            set_parameter(&mut model, "sec", &limit.as_secs_f64().to_string())?;
        }

        debug!(
            component = "solver",
            operation = "solve",
            engine = "cbc",
            parallel,
            threads = config.threads,
            time_limit_secs = time_limit.map(|t| t.as_secs_f64()),
            "Solving model"
        );
        model.solve();

        let termination = Termination::read(&model);
        let code = termination.status_code();
        let columns = termination
            .has_incumbent(code)
            .then(|| model.col_solution().to_vec());

        debug!(
            component = "solver",
            operation = "solve",
            engine = "cbc",
            status_code = code,
            has_solution = columns.is_some(),
            solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "Solve finished"
        );

        Ok(SolveOutcome::new(SolveStatus::from_code(code), columns))
    }

    fn write_lp(
        &mut self,
        path: &Path,
        col_names: Option<&[&str]>,
        row_names: Option<&[&str]>,
    ) -> Result<()> {
        let program = self.program.as_ref().ok_or(SolverError::NotLoaded)?;
        let names = ModelNames::resolve(program.num_cols(), program.num_rows, col_names, row_names)?;
        debug!(
            component = "solver",
            operation = "write_lp",
            engine = "cbc",
            path = %path.display(),
            "Writing model file"
        );
        lp_writer::write_lp_file(path, program, &names, CBC_INFINITY)
    }

    fn supports_parallel(&self) -> bool {
        cfg!(feature = "cbc-parallel")
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_properties() {
        let solver = CoinCbcSolver::new();
        assert_eq!(solver.name(), "COIN-OR CBC");
        assert_eq!(solver.infinity(), f64::MAX);
        assert_eq!(solver.infinity(), solver.infinity());
        assert_eq!(solver.supports_parallel(), cfg!(feature = "cbc-parallel"));
    }

    fn finished(secondary_status: i32, objective: f64) -> Termination {
        Termination {
            proven_infeasible: false,
            continuous_unbounded: false,
            proven_optimal: false,
            secondary_status,
            objective,
        }
    }

    #[test]
    fn test_relaxation_verdicts_override_secondary_status() {
        let infeasible = Termination {
            proven_infeasible: true,
            ..finished(UNLAUNCHED, 0.0)
        };
        assert_eq!(infeasible.status_code(), LP_INFEASIBLE);
        assert!(!infeasible.has_incumbent(infeasible.status_code()));

        let unbounded = Termination {
            continuous_unbounded: true,
            ..finished(UNLAUNCHED, -1e60)
        };
        assert_eq!(unbounded.status_code(), RELAXATION_UNBOUNDED);
        assert!(!unbounded.has_incumbent(unbounded.status_code()));
    }

    #[test]
    fn test_unlaunched_search() {
        // pure LP solved at the root
        let solved = Termination {
            proven_optimal: true,
            ..finished(UNLAUNCHED, -10.0)
        };
        assert_eq!(solved.status_code(), HAS_SOLUTION);
        assert!(solved.has_incumbent(HAS_SOLUTION));

        let abandoned = finished(UNLAUNCHED, 0.0);
        assert_eq!(abandoned.status_code(), UNLAUNCHED);
        assert!(!abandoned.has_incumbent(UNLAUNCHED));
    }

    #[test]
    fn test_search_stops_with_incumbent() {
        for code in [HAS_SOLUTION, STOPPED_ON_GAP, STOPPED_ON_SOLUTIONS] {
            let t = finished(code, 1e60);
            assert_eq!(t.status_code(), code);
            assert!(t.has_incumbent(code));
        }
    }

    #[test]
    fn test_limit_stops_depend_on_objective() {
        // 3 nodes, 4 time, 5 user event, 8 iterations
        for code in [3, 4, 5, 8] {
            let found = finished(code, 42.5);
            assert_eq!(found.status_code(), code);
            assert!(found.has_incumbent(code), "code {}", code);

            let none = finished(code, 1e50);
            assert!(!none.has_incumbent(code), "code {}", code);
            assert!(!finished(code, -f64::MAX).has_incumbent(code));
        }
    }

    #[test]
    fn test_solve_requires_problem() {
        let mut solver = CoinCbcSolver::new();
        let config = SolveConfig::new(1, None, false);
        assert!(matches!(solver.solve(&config), Err(SolverError::NotLoaded)));
    }
}
