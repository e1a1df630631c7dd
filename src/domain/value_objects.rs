// Domain value objects: engine selection, row/column encodings, status codes

use super::solver_service::SolverError;
use std::fmt;
use std::str::FromStr;

/// Solver engine owned by a facade for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// COIN-OR CBC branch-and-cut
    CoinCbc,
    /// HiGHS
    Highs,
}

impl Engine {
    /// Whether this build links the engine's native library
    pub fn is_available(self) -> bool {
        match self {
            Engine::CoinCbc => cfg!(feature = "cbc"),
            Engine::Highs => cfg!(feature = "highs"),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::CoinCbc => write!(f, "COIN-OR CBC"),
            Engine::Highs => write!(f, "HiGHS"),
        }
    }
}

impl FromStr for Engine {
    type Err = SolverError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cbc" | "coin_cbc" | "coin-cbc" | "coincbc" => Ok(Engine::CoinCbc),
            "highs" => Ok(Engine::Highs),
            other => Err(SolverError::SolverNotAvailable(format!(
                "unknown engine '{}'",
                other
            ))),
        }
    }
}

/// Sense of a constraint row in right-hand-side form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// Less than or equal (≤)
    LessEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterEqual,
    /// Free row, no bound on either side
    Free,
}

impl RowSense {
    pub fn as_char(self) -> char {
        match self {
            RowSense::LessEqual => 'L',
            RowSense::Equal => 'E',
            RowSense::GreaterEqual => 'G',
            RowSense::Free => 'N',
        }
    }

    /// Lower/upper bound pair equivalent to `sense rhs`
    pub fn bounds(self, rhs: f64, infinity: f64) -> (f64, f64) {
        match self {
            RowSense::LessEqual => (-infinity, rhs),
            RowSense::Equal => (rhs, rhs),
            RowSense::GreaterEqual => (rhs, infinity),
            RowSense::Free => (-infinity, infinity),
        }
    }
}

impl TryFrom<char> for RowSense {
    type Error = SolverError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'L' => Ok(RowSense::LessEqual),
            'E' => Ok(RowSense::Equal),
            'G' => Ok(RowSense::GreaterEqual),
            'N' => Ok(RowSense::Free),
            _ => Err(SolverError::InvalidRowSense(c)),
        }
    }
}

/// Type of decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarType {
    /// Continuous real number (x ∈ ℝ)
    #[default]
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
}

impl VarType {
    pub fn as_char(self) -> char {
        match self {
            VarType::Continuous => 'C',
            VarType::Integer => 'I',
        }
    }

    pub fn is_integer(self) -> bool {
        self == VarType::Integer
    }
}

impl TryFrom<char> for VarType {
    type Error = SolverError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'C' => Ok(VarType::Continuous),
            'I' => Ok(VarType::Integer),
            _ => Err(SolverError::InvalidVarType(c)),
        }
    }
}

/// Outcome code of a solve.
///
/// `0` means a solution was found and, when the problem has columns, can be
/// read back from the facade. Any other value is the engine's own code and
/// only means "not a success"; consult the engine's documentation to tell a
/// time-limited search from a proven-infeasible one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolveStatus(i32);

impl SolveStatus {
    pub const SUCCESS: SolveStatus = SolveStatus(0);

    /// Code used when the engine never reached a verdict
    pub const NOT_SOLVED: SolveStatus = SolveStatus(-1);

    pub fn from_code(code: i32) -> Self {
        SolveStatus(code)
    }

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            write!(f, "success")
        } else {
            write!(f, "status {}", self.0)
        }
    }
}
