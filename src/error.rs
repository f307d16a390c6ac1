//! Error types for grid construction and strategy setup.

use std::fmt;
use thiserror::Error;

/// Why a wall or obstacle could not be placed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementReason {
    OutOfBounds,
    Start,
    Target,
    Wall,
}

impl fmt::Display for PlacementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlacementReason::OutOfBounds => "cell is outside the grid",
            PlacementReason::Start => "cell is the start",
            PlacementReason::Target => "cell is the target",
            PlacementReason::Wall => "cell is a static wall",
        };
        f.write_str(text)
    }
}

/// Errors raised by the search engine.
///
/// Running out of frontier or hitting a depth ceiling are not errors; those
/// are reported through `StepEvent::Failure`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A wall or dynamic obstacle was requested on a protected or missing cell.
    #[error("invalid placement at ({x}, {y}): {reason}")]
    InvalidPlacement {
        x: usize,
        y: usize,
        reason: PlacementReason,
    },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The algorithm name did not match any strategy.
    #[error("unknown algorithm '{0}', expected one of bfs, dfs, ucs, dls, iddfs, bidirectional or all")]
    UnknownAlgorithm(String),
}

impl SearchError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        SearchError::Configuration {
            message: message.into(),
        }
    }
}

/// Result type for search engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;
