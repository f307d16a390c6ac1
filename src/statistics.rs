use crate::algorithms::common::{FailureReason, StepEvent};
use crate::grid::{path_cost, Position};
use crate::state::SearchState;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchMetrics {
    /// Expansions performed, re-expansions included.
    pub nodes_explored: usize,
    /// Cells in the path, endpoints included; 0 when nothing was found.
    pub path_length: usize,
    pub path_cost: f64,
    pub obstacles_encountered: usize,
    pub replans_triggered: usize,
}

/// Uniform outcome of one run. Built once by [`finalize`] and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub found: bool,
    pub path: Vec<Position>,
    /// Distinct expanded cells in first-visit order.
    pub explored: Vec<Position>,
    pub frontier_at_termination: Vec<Position>,
    pub failure: Option<FailureReason>,
    /// Obstacles spawned during the run, in spawn order.
    pub dynamic_obstacles: Vec<Position>,
    pub metrics: SearchMetrics,
}

impl SearchResult {
    fn build(path: Vec<Position>, failure: Option<FailureReason>, state: &SearchState) -> Self {
        let metrics = SearchMetrics {
            nodes_explored: state.expansions(),
            path_length: path.len(),
            path_cost: path_cost(&path),
            obstacles_encountered: state.obstacles_encountered(),
            replans_triggered: state.replans_triggered(),
        };
        SearchResult {
            found: failure.is_none(),
            path,
            explored: state.explored_order().to_vec(),
            frontier_at_termination: state.terminal_frontier().to_vec(),
            failure,
            dynamic_obstacles: state.spawned().to_vec(),
            metrics,
        }
    }

    pub(crate) fn from_failure(reason: FailureReason, state: &SearchState) -> Self {
        Self::build(Vec::new(), Some(reason), state)
    }
}

/// Turns a terminal event and the run's bookkeeping into a [`SearchResult`].
///
/// Returns `None` for non-terminal events.
pub fn finalize(event: &StepEvent, state: &SearchState) -> Option<SearchResult> {
    match event {
        StepEvent::Success(path) => Some(SearchResult::build(path.clone(), None, state)),
        StepEvent::Failure(reason) => Some(SearchResult::from_failure(*reason, state)),
        _ => None,
    }
}

impl fmt::Display for SearchMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes Explored: {}", self.nodes_explored)?;
        writeln!(f, "Path Length: {}", self.path_length)?;
        writeln!(f, "Path Cost: {:.3}", self.path_cost)?;
        writeln!(f, "Obstacles Encountered: {}", self.obstacles_encountered)?;
        writeln!(f, "Replans Triggered: {}", self.replans_triggered)?;
        Ok(())
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure {
            None => writeln!(f, "Result: path found")?,
            Some(reason) => writeln!(f, "Result: no path ({})", reason)?,
        }
        write!(f, "{}", self.metrics)?;
        writeln!(f, "Cells Explored: {}", self.explored.len())?;
        writeln!(f, "Frontier at Termination: {}", self.frontier_at_termination.len())?;

        if !self.dynamic_obstacles.is_empty() {
            writeln!(f, "Dynamic Obstacles Spawned: {}", self.dynamic_obstacles.len())?;
        }

        if self.found && self.metrics.nodes_explored > 0 {
            let focus = self.path.len() as f64 / self.explored.len().max(1) as f64;
            writeln!(f, "Search Focus: {:.1}% of explored cells on path", focus * 100.0)?;
        }

        Ok(())
    }
}
