pub mod bfs;
pub mod bidirectional;
pub mod common;
pub mod dfs;
pub mod dls;
pub mod iddfs;
pub mod ucs;

pub use bfs::Bfs;
pub use bidirectional::Bidirectional;
pub use common::{Annotation, FailureReason, Origin, SearchNode, StepEvent};
pub use dfs::Dfs;
pub use dls::Dls;
pub use iddfs::Iddfs;
pub use ucs::Ucs;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::grid::Grid;
use crate::obstacles::ObstacleMonitor;
use crate::state::SearchState;
use crate::statistics::{finalize, SearchResult};
use common::Context;
use log::debug;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// The six uninformed strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Bfs,
    Dfs,
    Ucs,
    Dls,
    Iddfs,
    Bidirectional,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Bfs,
        Algorithm::Dfs,
        Algorithm::Ucs,
        Algorithm::Dls,
        Algorithm::Iddfs,
        Algorithm::Bidirectional,
    ];

    /// Short name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
            Algorithm::Ucs => "ucs",
            Algorithm::Dls => "dls",
            Algorithm::Iddfs => "iddfs",
            Algorithm::Bidirectional => "bidirectional",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Bfs => "Breadth-First Search",
            Algorithm::Dfs => "Depth-First Search",
            Algorithm::Ucs => "Uniform-Cost Search",
            Algorithm::Dls => "Depth-Limited Search",
            Algorithm::Iddfs => "Iterative Deepening DFS",
            Algorithm::Bidirectional => "Bidirectional Search",
        }
    }

    /// Starts a run of this strategy on `grid`.
    ///
    /// The returned [`Search`] borrows the grid mutably for the whole run,
    /// since dynamic obstacles are spawned into it.
    pub fn search<'g>(self, grid: &'g mut Grid, config: &SearchConfig) -> Result<Search<'g>> {
        Search::new(grid, self, config.clone())
    }
}

impl FromStr for Algorithm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "bfs" => Ok(Algorithm::Bfs),
            "dfs" => Ok(Algorithm::Dfs),
            "ucs" => Ok(Algorithm::Ucs),
            "dls" => Ok(Algorithm::Dls),
            "iddfs" | "ids" => Ok(Algorithm::Iddfs),
            "bidirectional" | "bidi" => Ok(Algorithm::Bidirectional),
            _ => Err(SearchError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Bfs(Bfs),
    Dfs(Dfs),
    Ucs(Ucs),
    Dls(Dls),
    Iddfs(Iddfs),
    Bidirectional(Bidirectional),
}

impl Strategy {
    fn build(algorithm: Algorithm, grid: &Grid, config: &SearchConfig) -> Self {
        let start = grid.start();
        match algorithm {
            Algorithm::Bfs => Strategy::Bfs(Bfs::new(start)),
            Algorithm::Dfs => Strategy::Dfs(Dfs::new(start)),
            Algorithm::Ucs => Strategy::Ucs(Ucs::new(start)),
            Algorithm::Dls => Strategy::Dls(Dls::new(start, config.depth_limit)),
            Algorithm::Iddfs => Strategy::Iddfs(Iddfs::new(
                start,
                config.max_depth_for(grid.width(), grid.height()),
            )),
            Algorithm::Bidirectional => {
                Strategy::Bidirectional(Bidirectional::new(start, grid.target()))
            }
        }
    }

    fn advance(&mut self, ctx: &mut Context<'_>) {
        match self {
            Strategy::Bfs(s) => s.advance(ctx),
            Strategy::Dfs(s) => s.advance(ctx),
            Strategy::Ucs(s) => s.advance(ctx),
            Strategy::Dls(s) => s.advance(ctx),
            Strategy::Iddfs(s) => s.advance(ctx),
            Strategy::Bidirectional(s) => s.advance(ctx),
        }
    }
}

/// A single run of a strategy, pulled one [`StepEvent`] at a time.
///
/// The sequence is finite and ends with exactly one `Success` or `Failure`.
/// Dropping the search mid-run is always safe. A finished search cannot be
/// restarted; start a new one instead.
pub struct Search<'g> {
    algorithm: Algorithm,
    grid: &'g mut Grid,
    config: SearchConfig,
    monitor: Option<ObstacleMonitor>,
    state: SearchState,
    strategy: Strategy,
    pending: VecDeque<StepEvent>,
    result: Option<SearchResult>,
    done: bool,
}

impl<'g> Search<'g> {
    /// Prepares the run. An obstacle monitor is created only for a positive
    /// spawn probability; validation happens in [`Search::with_monitor`].
    pub fn new(grid: &'g mut Grid, algorithm: Algorithm, config: SearchConfig) -> Result<Self> {
        let monitor = if config.dynamic_obstacle_probability > 0.0 {
            Some(ObstacleMonitor::from_config(&config)?)
        } else {
            None
        };
        Self::with_monitor(grid, algorithm, config, monitor)
    }

    /// Like [`Search::new`] but with a caller-supplied monitor, or none.
    pub fn with_monitor(
        grid: &'g mut Grid,
        algorithm: Algorithm,
        config: SearchConfig,
        monitor: Option<ObstacleMonitor>,
    ) -> Result<Self> {
        config.validate()?;
        let strategy = Strategy::build(algorithm, grid, &config);
        let mut pending = VecDeque::new();
        if grid.start() == grid.target() {
            pending.push_back(StepEvent::Success(vec![grid.start()]));
        }
        debug!(
            "starting {} on {}x{} grid from {} to {}",
            algorithm.name(),
            grid.width(),
            grid.height(),
            grid.start(),
            grid.target()
        );
        Ok(Search {
            algorithm,
            grid,
            config,
            monitor,
            state: SearchState::new(),
            strategy,
            pending,
            result: None,
            done: false,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn grid(&self) -> &Grid {
        &*self.grid
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// The aggregated result, once the terminal event has been pulled.
    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Pulls the next event, or `None` once the terminal event was returned.
    pub fn next_step(&mut self) -> Option<StepEvent> {
        if self.done {
            return None;
        }
        while self.pending.is_empty() {
            let mut ctx = Context {
                grid: &mut *self.grid,
                monitor: self.monitor.as_mut(),
                state: &mut self.state,
                config: &self.config,
                events: &mut self.pending,
            };
            self.strategy.advance(&mut ctx);
        }
        let event = self.pending.pop_front()?;
        if event.is_terminal() {
            self.done = true;
            self.pending.clear();
            self.result = finalize(&event, &self.state);
        }
        Some(event)
    }

    /// Drives the run to completion and returns its result.
    pub fn run_to_end(mut self) -> SearchResult {
        while self.next_step().is_some() {}
        match self.result.take() {
            Some(result) => result,
            None => SearchResult::from_failure(FailureReason::Exhausted, &self.state),
        }
    }
}

impl Iterator for Search<'_> {
    type Item = StepEvent;

    fn next(&mut self) -> Option<StepEvent> {
        self.next_step()
    }
}
