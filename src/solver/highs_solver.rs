// HiGHS Solver Adapter
// Implements the SolverBackend interface directly on the HiGHS C API
// This is an adapter pattern - translates our domain models to HiGHS calls
#![allow(unsafe_code)]

use crate::domain::{
    models::{LinearProgram, ModelNames, SolveConfig},
    solver_service::{Result, SolveOutcome, SolverBackend, SolverError},
    value_objects::SolveStatus,
};
use highs_sys::HighsInt;
use std::ffi::{c_void, CString};
use std::path::Path;
use std::ptr::NonNull;
use std::time::Instant;
use tracing::{debug, trace, warn};

const STATUS_ERROR: HighsInt = -1;
const MATRIX_FORMAT_COLWISE: HighsInt = 1;
const OBJ_SENSE_MINIMIZE: HighsInt = 1;
const SOLUTION_STATUS_FEASIBLE: HighsInt = 2;

// HiGHS model status codes
const MODEL_STATUS_NOTSET: HighsInt = 0;
const MODEL_STATUS_MODEL_EMPTY: HighsInt = 6;
const MODEL_STATUS_OPTIMAL: HighsInt = 7;
const MODEL_STATUS_SOLUTION_LIMIT: HighsInt = 16;

/// Owned `Highs` instance, destroyed on drop
struct HighsHandle(NonNull<c_void>);

impl HighsHandle {
    fn create() -> Result<Self> {
        let ptr = unsafe { highs_sys::Highs_create() };
        NonNull::new(ptr).map(HighsHandle).ok_or_else(|| {
            SolverError::InitializationFailed("Highs_create returned null".to_string())
        })
    }

    fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl Drop for HighsHandle {
    fn drop(&mut self) {
        unsafe { highs_sys::Highs_destroy(self.0.as_ptr()) };
    }
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| SolverError::ExecutionFailed(e.to_string()))
}

fn check(status: HighsInt, operation: &'static str) -> Result<()> {
    if status == STATUS_ERROR {
        warn!(
            component = "solver",
            operation,
            engine = "highs",
            status_code = status,
            "HiGHS call failed"
        );
        return Err(SolverError::ExecutionFailed(format!(
            "HiGHS {} returned status {}",
            operation, status
        )));
    }
    Ok(())
}

/// Caller-facing status for a HiGHS model status.
///
/// HiGHS' "not set" is 0, which would read as success, so it maps to
/// [`SolveStatus::NOT_SOLVED`].
fn status_code(model_status: HighsInt, primal_feasible: bool) -> SolveStatus {
    match model_status {
        MODEL_STATUS_OPTIMAL | MODEL_STATUS_MODEL_EMPTY => SolveStatus::SUCCESS,
        MODEL_STATUS_SOLUTION_LIMIT if primal_feasible => SolveStatus::SUCCESS,
        MODEL_STATUS_NOTSET => SolveStatus::NOT_SOLVED,
        other => SolveStatus::from_code(other as i32),
    }
}

/// HiGHS backend holding one native instance for its lifetime
pub struct HighsSolver {
    handle: HighsHandle,
    num_cols: usize,
    num_rows: usize,
    loaded: bool,
}

impl HighsSolver {
    pub fn new() -> Result<Self> {
        let handle = HighsHandle::create()?;
        debug!(
            component = "solver",
            operation = "init_highs",
            status = "success",
            "Creating HiGHS instance"
        );
        let mut solver = Self {
            handle,
            num_cols: 0,
            num_rows: 0,
            loaded: false,
        };
        // quiet until a problem is loaded with an explicit verbosity
        solver.set_bool_option("output_flag", false)?;
        Ok(solver)
    }

    fn set_bool_option(&mut self, name: &str, value: bool) -> Result<()> {
        trace!(component = "solver", operation = "set_option", name, value, "HiGHS option");
        let option = c_string(name)?;
        let status = unsafe {
            highs_sys::Highs_setBoolOptionValue(
                self.handle.as_ptr(),
                option.as_ptr(),
                HighsInt::from(value),
            )
        };
        check(status, "set_option")
    }

    fn set_double_option(&mut self, name: &str, value: f64) -> Result<()> {
        trace!(component = "solver", operation = "set_option", name, value, "HiGHS option");
        let option = c_string(name)?;
        let status = unsafe {
            highs_sys::Highs_setDoubleOptionValue(self.handle.as_ptr(), option.as_ptr(), value)
        };
        check(status, "set_option")
    }

    fn primal_feasible(&self) -> bool {
        let Ok(name) = c_string("primal_solution_status") else {
            return false;
        };
        let mut value: HighsInt = 0;
        let status = unsafe {
            highs_sys::Highs_getIntInfoValue(self.handle.as_ptr(), name.as_ptr(), &mut value)
        };
        status != STATUS_ERROR && value == SOLUTION_STATUS_FEASIBLE
    }

    fn column_values(&self) -> Result<Vec<f64>> {
        let mut col_value = vec![0.0; self.num_cols];
        let mut col_dual = vec![0.0; self.num_cols];
        let mut row_value = vec![0.0; self.num_rows];
        let mut row_dual = vec![0.0; self.num_rows];
        let status = unsafe {
            highs_sys::Highs_getSolution(
                self.handle.as_ptr(),
                col_value.as_mut_ptr(),
                col_dual.as_mut_ptr(),
                row_value.as_mut_ptr(),
                row_dual.as_mut_ptr(),
            )
        };
        check(status, "get_solution")?;
        Ok(col_value)
    }
}

fn to_highs_int(value: usize, what: &str) -> Result<HighsInt> {
    HighsInt::try_from(value)
        .map_err(|_| SolverError::InvalidProblem(format!("{} {} exceeds HiGHS index range", what, value)))
}

impl SolverBackend for HighsSolver {
    fn infinity(&self) -> f64 {
        unsafe { highs_sys::Highs_getInfinity(self.handle.as_ptr()) }
    }

    fn load(&mut self, program: &LinearProgram, verbose: bool) -> Result<()> {
        let num_cols = to_highs_int(program.num_cols(), "column count")?;
        let num_rows = to_highs_int(program.num_rows, "row count")?;
        let num_nonzeros = to_highs_int(program.num_nonzeros(), "nonzero count")?;
        let starts: Vec<HighsInt> = program.starts.iter().map(|&s| s as HighsInt).collect();
        let indices: Vec<HighsInt> = program.indices.iter().map(|&i| i as HighsInt).collect();
        let integrality: Vec<HighsInt> =
            program.integer.iter().map(|&i| HighsInt::from(i)).collect();

        debug!(
            component = "solver",
            operation = "load_problem",
            engine = "highs",
            num_cols = program.num_cols(),
            num_rows = program.num_rows,
            num_nonzeros = program.num_nonzeros(),
            num_integers = program.num_integers(),
            "Loading problem"
        );

        let status = unsafe {
            highs_sys::Highs_passMip(
                self.handle.as_ptr(),
                num_cols,
                num_rows,
                num_nonzeros,
                MATRIX_FORMAT_COLWISE,
                OBJ_SENSE_MINIMIZE,
                0.0,
                program.objective.as_ptr(),
                program.col_lower.as_ptr(),
                program.col_upper.as_ptr(),
                program.row_lower.as_ptr(),
                program.row_upper.as_ptr(),
                starts.as_ptr(),
                indices.as_ptr(),
                program.values.as_ptr(),
                integrality.as_ptr(),
            )
        };
        check(status, "pass_mip")?;

        self.num_cols = program.num_cols();
        self.num_rows = program.num_rows;
        self.loaded = true;
        self.set_bool_option("output_flag", verbose)
    }

    fn solve(&mut self, config: &SolveConfig) -> Result<SolveOutcome> {
        if !self.loaded {
            return Err(SolverError::NotLoaded);
        }
        let start_time = Instant::now();

        // HiGHS keeps options between runs, so an unset limit is restored explicitly
        let time_limit = config.time_limit.map_or(f64::INFINITY, |t| t.as_secs_f64());
        self.set_double_option("time_limit", time_limit)?;
        if config.is_parallel() {
            debug!(
                component = "solver",
                operation = "solve",
                threads = config.threads,
                "HiGHS runs its MIP search on one thread; thread hint ignored"
            );
        }

        debug!(
            component = "solver",
            operation = "solve",
            engine = "highs",
            num_cols = self.num_cols,
            num_rows = self.num_rows,
            time_limit_secs = config.time_limit.map(|t| t.as_secs_f64()),
            "Solving model"
        );
        let run_status = unsafe { highs_sys::Highs_run(self.handle.as_ptr()) };
        if run_status == STATUS_ERROR {
            warn!(
                component = "solver",
                operation = "solve",
                engine = "highs",
                status_code = run_status,
                "Highs_run reported an error"
            );
        }

        let model_status = unsafe { highs_sys::Highs_getModelStatus(self.handle.as_ptr()) };
        let status = status_code(model_status, self.primal_feasible());
        let columns = if status.is_success() && self.num_cols > 0 {
            Some(self.column_values()?)
        } else {
            None
        };

        debug!(
            component = "solver",
            operation = "solve",
            engine = "highs",
            model_status,
            status_code = status.code(),
            has_solution = columns.is_some(),
            solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "Solve finished"
        );

        Ok(SolveOutcome::new(status, columns))
    }

    fn write_lp(
        &mut self,
        path: &Path,
        col_names: Option<&[&str]>,
        row_names: Option<&[&str]>,
    ) -> Result<()> {
        if !self.loaded {
            return Err(SolverError::NotLoaded);
        }
        let names = ModelNames::resolve(self.num_cols, self.num_rows, col_names, row_names)?;

        for (col, name) in names.cols.iter().enumerate() {
            let name = c_string(name)?;
            let status = unsafe {
                highs_sys::Highs_passColName(
                    self.handle.as_ptr(),
                    to_highs_int(col, "column")?,
                    name.as_ptr(),
                )
            };
            check(status, "pass_col_name")?;
        }
        for (row, name) in names.rows.iter().enumerate() {
            let name = c_string(name)?;
            let status = unsafe {
                highs_sys::Highs_passRowName(
                    self.handle.as_ptr(),
                    to_highs_int(row, "row")?,
                    name.as_ptr(),
                )
            };
            check(status, "pass_row_name")?;
        }

        let file = path.to_str().ok_or_else(|| {
            SolverError::ExecutionFailed(format!("path {} is not valid UTF-8", path.display()))
        })?;
        debug!(
            component = "solver",
            operation = "write_lp",
            engine = "highs",
            path = file,
            "Writing model file"
        );
        let file = c_string(file)?;
        let status = unsafe { highs_sys::Highs_writeModel(self.handle.as_ptr(), file.as_ptr()) };
        check(status, "write_model")
    }

    fn supports_parallel(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_normalization() {
        assert_eq!(status_code(MODEL_STATUS_OPTIMAL, true), SolveStatus::SUCCESS);
        assert_eq!(status_code(MODEL_STATUS_MODEL_EMPTY, false), SolveStatus::SUCCESS);
        assert_eq!(status_code(MODEL_STATUS_SOLUTION_LIMIT, true), SolveStatus::SUCCESS);
        assert_eq!(status_code(MODEL_STATUS_SOLUTION_LIMIT, false).code(), 16);
        // infeasible and time limit pass through unmodified
        assert_eq!(status_code(8, false).code(), 8);
        assert_eq!(status_code(13, true).code(), 13);
        assert_eq!(status_code(MODEL_STATUS_NOTSET, false), SolveStatus::NOT_SOLVED);
    }

    #[test]
    fn test_backend_properties() {
        let solver = HighsSolver::new().expect("failed to create HiGHS instance");
        assert_eq!(solver.name(), "HiGHS");
        assert!(!solver.supports_parallel());
        let infinity = solver.infinity();
        assert!(infinity >= 1e20);
        assert_eq!(infinity, solver.infinity());
    }

    #[test]
    fn test_requires_problem() {
        let mut solver = HighsSolver::new().expect("failed to create HiGHS instance");
        let config = SolveConfig::new(1, None, false);
        assert!(matches!(solver.solve(&config), Err(SolverError::NotLoaded)));
        let path = Path::new("unused.lp");
        assert!(matches!(
            solver.write_lp(path, None, None),
            Err(SolverError::NotLoaded)
        ));
    }
}
