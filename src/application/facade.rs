// Solver facade: one engine, one problem, at most one held solution

use crate::domain::{
    models::{LinearProgram, RangeProblem, SenseProblem, SolveConfig, SolverConfig},
    solver_service::{Result, SolverBackend, SolverError},
    value_objects::{Engine, SolveStatus},
};
use crate::solver::SolverFactory;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Uniform handle over one solver engine.
///
/// The engine is fixed at construction and its native environment lives
/// exactly as long as the `Solver`. Operations are meant to be called in
/// order from one thread: load a problem, solve (as often as needed), read
/// the solution, optionally write the model to a file.
///
/// ```no_run
/// use milpfacade::{ColumnMatrix, Engine, RangeProblem, Solver};
///
/// let mut solver = Solver::new(Engine::CoinCbc)?;
/// let inf = solver.infinity();
/// // maximize x + y subject to x + y <= 10
/// solver.load_problem(&RangeProblem {
///     matrix: ColumnMatrix::new(1, &[0, 1, 2], &[0, 0], &[1.0, 1.0]),
///     col_lower: &[0.0, 0.0],
///     col_upper: &[inf, inf],
///     objective: &[-1.0, -1.0],
///     row_lower: &[-inf],
///     row_upper: &[10.0],
///     integer: &[false, false],
/// })?;
/// if solver.solve(1)?.is_success() {
///     println!("{:?}", solver.solution());
/// }
/// # Ok::<(), milpfacade::SolverError>(())
/// ```
pub struct Solver {
    config: SolverConfig,
    backend: Box<dyn SolverBackend>,
    num_cols: usize,
    num_rows: usize,
    loaded: bool,
    solution: Option<Vec<f64>>,
}

impl Solver {
    /// Create a facade over `engine` with default settings
    pub fn new(engine: Engine) -> Result<Self> {
        Self::with_config(SolverConfig::new(engine))
    }

    pub fn with_config(config: SolverConfig) -> Result<Self> {
        let backend = SolverFactory::create_backend(config.engine)?;
        Ok(Self::from_backend(config, backend))
    }

    pub(crate) fn from_backend(config: SolverConfig, backend: Box<dyn SolverBackend>) -> Self {
        debug!(
            component = "facade",
            operation = "create",
            engine = %config.engine,
            backend = backend.name(),
            "Solver created"
        );
        Self {
            config,
            backend,
            num_cols: 0,
            num_rows: 0,
            loaded: false,
            solution: None,
        }
    }

    pub fn engine(&self) -> Engine {
        self.config.engine
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Value the active engine reads as an unbounded bound.
    ///
    /// Use it instead of a literal when building open bounds; the engines do
    /// not share a sentinel.
    pub fn infinity(&self) -> f64 {
        self.backend.infinity()
    }

    /// Load a problem whose rows are lower/upper bound pairs.
    ///
    /// Malformed input is rejected before the engine sees it and leaves the
    /// previous problem in place. A load the engine itself rejects leaves no
    /// problem loaded.
    pub fn load_problem(&mut self, problem: &RangeProblem<'_>) -> Result<()> {
        let program = LinearProgram::from_ranges(problem)?;
        self.load(program)
    }

    /// Load a problem whose rows are a sense plus right-hand side
    pub fn load_problem_sense(&mut self, problem: &SenseProblem<'_>) -> Result<()> {
        let program = LinearProgram::from_senses(problem, self.backend.infinity())?;
        self.load(program)
    }

    fn load(&mut self, program: LinearProgram) -> Result<()> {
        self.solution = None;
        if let Err(e) = self.backend.load(&program, self.config.verbose) {
            // the backend may already have dropped the previous model
            self.loaded = false;
            self.num_cols = 0;
            self.num_rows = 0;
            return Err(e);
        }
        self.num_cols = program.num_cols();
        self.num_rows = program.num_rows;
        self.loaded = true;
        debug!(
            component = "facade",
            operation = "load_problem",
            num_cols = self.num_cols,
            num_rows = self.num_rows,
            "Problem loaded"
        );
        Ok(())
    }

    /// Wall-clock budget for later solves; `None` or zero means unbounded
    pub fn set_time_limit(&mut self, time_limit: Option<Duration>) {
        self.config.time_limit = time_limit;
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.config.time_limit
    }

    /// Run one blocking search on the loaded problem.
    ///
    /// `thread_hint` above 1 asks for a parallel search where the engine
    /// supports one. Any previously held solution is released first; a new
    /// one is held when the engine found a solution.
    pub fn solve(&mut self, thread_hint: usize) -> Result<SolveStatus> {
        if !self.loaded {
            return Err(SolverError::NotLoaded);
        }
        self.solution = None;

        let config = SolveConfig::new(thread_hint, self.config.time_limit, self.config.verbose);
        let outcome = self.backend.solve(&config)?;

        if let Some(columns) = &outcome.columns {
            debug_assert_eq!(columns.len(), self.num_cols);
        }
        self.solution = outcome.columns.filter(|columns| !columns.is_empty());

        debug!(
            component = "facade",
            operation = "solve",
            engine = %self.config.engine,
            status = %outcome.status,
            has_solution = self.solution.is_some(),
            "Solve returned"
        );
        Ok(outcome.status)
    }

    /// Column values of the last solve, in column order
    pub fn solution(&self) -> Option<&[f64]> {
        self.solution.as_deref()
    }

    pub fn take_solution(&mut self) -> Option<Vec<f64>> {
        self.solution.take()
    }

    /// Write the loaded problem in LP format.
    ///
    /// Names, when given, are meant to hold one entry per column / row;
    /// missing entries fall back to default names and extra ones are ignored.
    pub fn write_lp(
        &mut self,
        path: impl AsRef<Path>,
        col_names: Option<&[&str]>,
        row_names: Option<&[&str]>,
    ) -> Result<()> {
        if !self.loaded {
            return Err(SolverError::NotLoaded);
        }
        self.backend.write_lp(path.as_ref(), col_names, row_names)
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("engine", &self.config.engine)
            .field("num_cols", &self.num_cols)
            .field("num_rows", &self.num_rows)
            .field("time_limit", &self.config.time_limit)
            .field("has_solution", &self.solution.is_some())
            .finish_non_exhaustive()
    }
}
