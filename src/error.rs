//! Error types for the transfer planner.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// All errors that can occur while planning transfers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("irrecoverable inconsistency among positions: {}", join(.0))]
    DataConsistency(Vec<Inconsistency>),

    #[error("transfer problem is infeasible (balances do not sum to zero?)")]
    Infeasible,

    #[error("transfer problem is unbounded")]
    Unbounded,

    #[error("solver did not finish within {0:?}")]
    SolverTimeout(Duration),

    #[error("malformed linear program: {0}")]
    MalformedProblem(String),

    #[error("solver failure: {0}")]
    Solver(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read cache file {path}: {source}")]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse cache file {path}: {source}")]
    CacheParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize plan: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised by the planning pipeline itself, as opposed to
    /// I/O and configuration around it.
    pub fn is_planning(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput(_)
                | Error::DataConsistency(_)
                | Error::Infeasible
                | Error::Unbounded
                | Error::SolverTimeout(_)
                | Error::MalformedProblem(_)
                | Error::Solver(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One disagreement between a position and the reference position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    pub instrument: String,
    pub kind: InconsistencyKind,
    pub expected: String,
    pub found: String,
}

/// Which tag of a position disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InconsistencyKind {
    Currency,
    Unit,
    UnitType,
}

impl fmt::Display for InconsistencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistencyKind::Currency => write!(f, "currency"),
            InconsistencyKind::Unit => write!(f, "unit"),
            InconsistencyKind::UnitType => write!(f, "unit type"),
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} differs for {} ({:?} != {:?})",
            self.kind, self.instrument, self.found, self.expected
        )
    }
}

fn join(items: &[Inconsistency]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
