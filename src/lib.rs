pub mod algorithms;
pub mod config;
pub mod error;
pub mod grid;
pub mod obstacles;
pub mod simulation;
pub mod state;
pub mod statistics;

pub use algorithms::{Algorithm, FailureReason, Search, SearchNode, StepEvent};
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use grid::{CellState, Grid, Position};
pub use obstacles::ObstacleMonitor;
pub use statistics::{finalize, SearchMetrics, SearchResult};
