use super::solver_service::{Result, SolverError};
use super::value_objects::{Engine, RowSense, VarType};
use std::time::Duration;

/// Constraint matrix in compressed sparse column form, borrowed from the caller.
///
/// Column `j` owns the entries `starts[j]..starts[j + 1]` of `indices` (row
/// numbers) and `values` (coefficients).
#[derive(Debug, Clone, Copy)]
pub struct ColumnMatrix<'a> {
    pub num_rows: usize,
    pub starts: &'a [i32],
    pub indices: &'a [i32],
    pub values: &'a [f64],
}

impl<'a> ColumnMatrix<'a> {
    pub fn new(num_rows: usize, starts: &'a [i32], indices: &'a [i32], values: &'a [f64]) -> Self {
        Self {
            num_rows,
            starts,
            indices,
            values,
        }
    }

    pub fn num_cols(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }
}

/// Problem with rows given as lower/upper bound pairs and a boolean
/// integrality marker per column (CBC's native encoding).
#[derive(Debug, Clone, Copy)]
pub struct RangeProblem<'a> {
    pub matrix: ColumnMatrix<'a>,
    pub col_lower: &'a [f64],
    pub col_upper: &'a [f64],
    pub objective: &'a [f64],
    pub row_lower: &'a [f64],
    pub row_upper: &'a [f64],
    pub integer: &'a [bool],
}

/// Problem with rows given as a sense plus right-hand side and a typed
/// integrality marker per column.
#[derive(Debug, Clone, Copy)]
pub struct SenseProblem<'a> {
    pub matrix: ColumnMatrix<'a>,
    pub col_lower: &'a [f64],
    pub col_upper: &'a [f64],
    pub objective: &'a [f64],
    pub var_types: &'a [VarType],
    pub senses: &'a [RowSense],
    pub rhs: &'a [f64],
}

/// Owned, backend-agnostic minimization problem handed to a backend.
///
/// Row indices lie in `[0, num_rows)` and are non-decreasing within each column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearProgram {
    pub num_rows: usize,
    pub starts: Vec<i32>,
    pub indices: Vec<i32>,
    pub values: Vec<f64>,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub objective: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub integer: Vec<bool>,
}

impl LinearProgram {
    pub fn from_ranges(problem: &RangeProblem<'_>) -> Result<Self> {
        let matrix = &problem.matrix;
        let num_cols = matrix.num_cols();
        let num_rows = matrix.num_rows;
        let mut errors = Vec::new();

        let num_nonzeros = check_matrix(matrix, &mut errors);
        check_len("col_lower", problem.col_lower.len(), num_cols, &mut errors);
        check_len("col_upper", problem.col_upper.len(), num_cols, &mut errors);
        check_len("objective", problem.objective.len(), num_cols, &mut errors);
        check_len("integer", problem.integer.len(), num_cols, &mut errors);
        check_len("row_lower", problem.row_lower.len(), num_rows, &mut errors);
        check_len("row_upper", problem.row_upper.len(), num_rows, &mut errors);

        if !errors.is_empty() {
            return Err(SolverError::InvalidProblem(errors.join("; ")));
        }

        let (indices, values) = sorted_entries(matrix, num_nonzeros);
        Ok(Self {
            num_rows,
            starts: matrix.starts.to_vec(),
            indices,
            values,
            col_lower: problem.col_lower.to_vec(),
            col_upper: problem.col_upper.to_vec(),
            objective: problem.objective.to_vec(),
            row_lower: problem.row_lower.to_vec(),
            row_upper: problem.row_upper.to_vec(),
            integer: problem.integer.to_vec(),
        })
    }

    /// Rows are converted to bound pairs using `infinity` for the open side.
    pub fn from_senses(problem: &SenseProblem<'_>, infinity: f64) -> Result<Self> {
        let matrix = &problem.matrix;
        let num_cols = matrix.num_cols();
        let num_rows = matrix.num_rows;
        let mut errors = Vec::new();

        let num_nonzeros = check_matrix(matrix, &mut errors);
        check_len("col_lower", problem.col_lower.len(), num_cols, &mut errors);
        check_len("col_upper", problem.col_upper.len(), num_cols, &mut errors);
        check_len("objective", problem.objective.len(), num_cols, &mut errors);
        check_len("var_types", problem.var_types.len(), num_cols, &mut errors);
        check_len("senses", problem.senses.len(), num_rows, &mut errors);
        check_len("rhs", problem.rhs.len(), num_rows, &mut errors);

        if !errors.is_empty() {
            return Err(SolverError::InvalidProblem(errors.join("; ")));
        }

        let (row_lower, row_upper) = problem
            .senses
            .iter()
            .zip(problem.rhs)
            .map(|(sense, &rhs)| sense.bounds(rhs, infinity))
            .unzip();

        let (indices, values) = sorted_entries(matrix, num_nonzeros);
        Ok(Self {
            num_rows,
            starts: matrix.starts.to_vec(),
            indices,
            values,
            col_lower: problem.col_lower.to_vec(),
            col_upper: problem.col_upper.to_vec(),
            objective: problem.objective.to_vec(),
            row_lower,
            row_upper,
            integer: problem.var_types.iter().map(|t| t.is_integer()).collect(),
        })
    }

    pub fn num_cols(&self) -> usize {
        self.objective.len()
    }

    pub fn num_nonzeros(&self) -> usize {
        self.values.len()
    }

    pub fn num_integers(&self) -> usize {
        self.integer.iter().filter(|&&i| i).count()
    }

    /// (row, coefficient) entries of column `col`
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let begin = self.starts[col] as usize;
        let end = self.starts[col + 1] as usize;
        self.indices[begin..end]
            .iter()
            .zip(&self.values[begin..end])
            .map(|(&row, &value)| (row as usize, value))
    }

    /// Row-wise view of the matrix: for each row, its (column, coefficient) entries
    pub fn rows(&self) -> Vec<Vec<(usize, f64)>> {
        let mut rows = vec![Vec::new(); self.num_rows];
        for col in 0..self.num_cols() {
            for (row, value) in self.column(col) {
                if let Some(entries) = rows.get_mut(row) {
                    entries.push((col, value));
                }
            }
        }
        rows
    }
}

/// Column and row identifiers for a model file.
///
/// Missing entries get default names (`x<j>`, `R<i>`); extra entries are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    pub cols: Vec<String>,
    pub rows: Vec<String>,
}

impl ModelNames {
    pub fn resolve(
        num_cols: usize,
        num_rows: usize,
        col_names: Option<&[&str]>,
        row_names: Option<&[&str]>,
    ) -> Result<Self> {
        Ok(Self {
            cols: resolve_names(num_cols, col_names, "x")?,
            rows: resolve_names(num_rows, row_names, "R")?,
        })
    }
}

fn resolve_names(count: usize, given: Option<&[&str]>, prefix: &str) -> Result<Vec<String>> {
    let given = given.unwrap_or_default();
    (0..count)
        .map(|i| match given.get(i) {
            Some(name) => validate_name(name).map(|_| name.to_string()),
            None => Ok(format!("{}{}", prefix, i)),
        })
        .collect()
}

/// Characters with a meaning of their own in LP text
const LP_RESERVED: &[char] = &[':', '+', '-', '*', '^', '<', '>', '=', '[', ']'];

// LP identifiers are whitespace-delimited and may not start like a number.
fn validate_name(name: &str) -> Result<()> {
    let starts_like_number = name
        .chars()
        .next()
        .map_or(true, |c| c.is_ascii_digit() || c == '.');
    if starts_like_number
        || name
            .chars()
            .any(|c| c.is_whitespace() || LP_RESERVED.contains(&c))
    {
        return Err(SolverError::InvalidName(format!("'{}'", name)));
    }
    Ok(())
}

fn check_len(field: &str, got: usize, expected: usize, errors: &mut Vec<String>) {
    if got != expected {
        errors.push(format!("{} has {} entries, expected {}", field, got, expected));
    }
}

/// Checks the column pointers and returns the number of nonzeros they address.
fn check_matrix(matrix: &ColumnMatrix<'_>, errors: &mut Vec<String>) -> usize {
    if matrix.starts.is_empty() {
        errors.push("starts must hold num_cols + 1 entries".to_string());
        return 0;
    }

    let num_nonzeros = matrix.starts[matrix.num_cols()];
    if num_nonzeros < 0 {
        errors.push(format!("negative nonzero count {}", num_nonzeros));
        return 0;
    }
    let num_nonzeros = num_nonzeros as usize;

    if matrix.starts.windows(2).any(|w| w[0] > w[1]) || matrix.starts[0] < 0 {
        errors.push("starts must be non-negative and non-decreasing".to_string());
    }
    if matrix.indices.len() < num_nonzeros {
        errors.push(format!(
            "indices has {} entries, starts address {}",
            matrix.indices.len(),
            num_nonzeros
        ));
    }
    if matrix.values.len() < num_nonzeros {
        errors.push(format!(
            "values has {} entries, starts address {}",
            matrix.values.len(),
            num_nonzeros
        ));
    }

    let num_rows = matrix.num_rows;
    let out_of_range: Vec<String> = matrix
        .indices
        .iter()
        .take(num_nonzeros)
        .enumerate()
        .filter(|(_, row)| **row < 0 || (**row as usize) >= num_rows)
        .map(|(k, row)| format!("{}@{}", row, k))
        .collect();
    if !out_of_range.is_empty() {
        errors.push(format!(
            "row indices outside [0, {}): {}",
            num_rows,
            out_of_range.join(", ")
        ));
    }
    num_nonzeros
}

/// Copies the addressed entries with each column ordered by row index.
///
/// Only called on a matrix that passed `check_matrix`.
fn sorted_entries(matrix: &ColumnMatrix<'_>, num_nonzeros: usize) -> (Vec<i32>, Vec<f64>) {
    let mut indices = matrix.indices[..num_nonzeros].to_vec();
    let mut values = matrix.values[..num_nonzeros].to_vec();
    for bounds in matrix.starts.windows(2) {
        let (begin, end) = (bounds[0] as usize, bounds[1] as usize);
        let column = &indices[begin..end];
        if column.windows(2).all(|w| w[0] <= w[1]) {
            continue;
        }
        let mut entries: Vec<(i32, f64)> = column
            .iter()
            .copied()
            .zip(values[begin..end].iter().copied())
            .collect();
        entries.sort_by_key(|&(row, _)| row);
        for (k, (row, value)) in entries.into_iter().enumerate() {
            indices[begin + k] = row;
            values[begin + k] = value;
        }
    }
    (indices, values)
}

/// Configuration for the solver facade
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub engine: Engine,
    /// Wall-clock search budget; `None` (or zero) means unbounded
    pub time_limit: Option<Duration>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            engine: Engine::CoinCbc,
            time_limit: None,
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Settings for a single solve call, interpreted natively by each backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveConfig {
    pub log_level: u32,
    /// Requested search threads, at least 1
    pub threads: usize,
    pub time_limit: Option<Duration>,
    /// Ceiling on solutions found and kept by the search
    pub max_solutions: u32,
}

impl SolveConfig {
    pub const MAX_SOLUTIONS: u32 = 1000;

    pub fn new(thread_hint: usize, time_limit: Option<Duration>, verbose: bool) -> Self {
        Self {
            log_level: u32::from(verbose),
            threads: thread_hint.max(1),
            time_limit: time_limit.filter(|t| !t.is_zero()),
            max_solutions: Self::MAX_SOLUTIONS,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.threads > 1
    }

    /// Time limit for a search spread over `workers` threads whose budget is
    /// accounted as CPU time summed across them.
    pub fn scaled_time_limit(&self, workers: usize) -> Option<Duration> {
        let workers = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
        self.time_limit.map(|t| t.saturating_mul(workers))
    }
}
