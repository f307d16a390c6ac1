use crate::config::SearchConfig;
use crate::grid::{CellState, Grid, Position};
use crate::obstacles::ObstacleMonitor;
use crate::state::{ChainMetric, Invalidation, SearchState, SearchTree};
use log::{debug, trace};
use std::collections::VecDeque;
use std::fmt;

/// Which endpoint a bidirectional frontier grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    FromStart,
    FromTarget,
}

impl Origin {
    pub fn opposite(self) -> Self {
        match self {
            Origin::FromStart => Origin::FromTarget,
            Origin::FromTarget => Origin::FromStart,
        }
    }
}

/// Strategy-specific data attached to an expanded cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    None,
    Cost(f64),
    Depth(usize),
    Origin(Origin),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchNode {
    pub position: Position,
    pub annotation: Annotation,
}

impl SearchNode {
    pub fn plain(position: Position) -> Self {
        SearchNode {
            position,
            annotation: Annotation::None,
        }
    }

    pub fn with_cost(position: Position, cost: f64) -> Self {
        SearchNode {
            position,
            annotation: Annotation::Cost(cost),
        }
    }

    pub fn with_depth(position: Position, depth: usize) -> Self {
        SearchNode {
            position,
            annotation: Annotation::Depth(depth),
        }
    }

    pub fn with_origin(position: Position, origin: Origin) -> Self {
        SearchNode {
            position,
            annotation: Annotation::Origin(origin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The frontier emptied without reaching the target.
    Exhausted,
    /// Reachable cells were left unexplored because of the depth ceiling.
    DepthExceeded,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Exhausted => write!(f, "frontier exhausted"),
            FailureReason::DepthExceeded => write!(f, "depth limit exceeded"),
        }
    }
}

/// One observable step of a running search.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A cell was expanded. Snapshots are empty when recording is disabled.
    Expanded {
        node: SearchNode,
        frontier: Vec<Position>,
        explored: Vec<Position>,
    },
    /// A neighbor candidate was dropped because a dynamic obstacle sits on it.
    ObstacleEncountered(Position),
    /// A new obstacle landed inside the search tree and the tree was corrected.
    Replanned { blocked: Position },
    Success(Vec<Position>),
    Failure(FailureReason),
}

impl StepEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepEvent::Success(_) | StepEvent::Failure(_))
    }
}

/// Everything a strategy touches while it advances by one step.
pub(crate) struct Context<'a> {
    pub grid: &'a mut Grid,
    pub monitor: Option<&'a mut ObstacleMonitor>,
    pub state: &'a mut SearchState,
    pub config: &'a SearchConfig,
    pub events: &'a mut VecDeque<StepEvent>,
}

impl Context<'_> {
    pub fn target(&self) -> Position {
        self.grid.target()
    }

    pub fn diagonal(&self) -> bool {
        self.config.diagonal_movement_allowed
    }

    /// Gives the obstacle monitor its one draw for the expansion of `current`.
    pub fn consult_monitor(&mut self, current: Position) -> Option<Position> {
        let monitor = self.monitor.as_deref_mut()?;
        let spawned = monitor.maybe_spawn(&mut *self.grid, self.state.expansions(), current)?;
        self.state.record_spawn(spawned);
        Some(spawned)
    }

    /// Removes `blocked` from `tree`; see [`SearchTree::invalidate`].
    pub fn invalidate(
        &self,
        tree: &mut SearchTree,
        blocked: Position,
        metric: ChainMetric,
    ) -> Option<Invalidation> {
        tree.invalidate(blocked, &*self.grid, self.diagonal(), metric)
    }

    pub fn replanned(&mut self, blocked: Position) {
        debug!("replanning around dynamic obstacle at {}", blocked);
        self.state.record_replan();
        self.events.push_back(StepEvent::Replanned { blocked });
    }

    /// Traversable neighbors of `pos` in expansion order.
    ///
    /// Dynamic obstacles among them are reported once each as
    /// `ObstacleEncountered`; walls are skipped silently.
    pub fn candidates(&mut self, pos: Position) -> Vec<Position> {
        let mut out = Vec::with_capacity(8);
        for next in self.grid.neighbors_with(pos, self.diagonal()) {
            match self.grid.state(next) {
                Some(CellState::DynamicObstacle) => {
                    if self.state.record_obstacle(next) {
                        self.events.push_back(StepEvent::ObstacleEncountered(next));
                    }
                }
                Some(CellState::Wall) | None => {}
                Some(_) => out.push(next),
            }
        }
        out
    }

    /// Records the expansion of `node` and queues its event.
    pub fn expanded<F>(&mut self, node: SearchNode, frontier: F)
    where
        F: FnOnce() -> Vec<Position>,
    {
        trace!("expanded {} ({:?})", node.position, node.annotation);
        self.state.record_expansion(node.position);
        let (frontier, explored) = if self.config.record_snapshots {
            (frontier(), self.state.explored_order().to_vec())
        } else {
            (Vec::new(), Vec::new())
        };
        self.events.push_back(StepEvent::Expanded {
            node,
            frontier,
            explored,
        });
    }

    pub fn succeed(&mut self, path: Vec<Position>, frontier: Vec<Position>) {
        debug!(
            "target reached after {} expansions, path of {} cells",
            self.state.expansions(),
            path.len()
        );
        self.state.set_terminal_frontier(frontier);
        self.events.push_back(StepEvent::Success(path));
    }

    pub fn fail(&mut self, reason: FailureReason, frontier: Vec<Position>) {
        debug!(
            "search failed after {} expansions: {}",
            self.state.expansions(),
            reason
        );
        self.state.set_terminal_frontier(frontier);
        self.events.push_back(StepEvent::Failure(reason));
    }

    /// True when every cell of `path` can still be walked.
    pub fn path_is_clear(&self, path: &[Position]) -> bool {
        path.iter().all(|&pos| self.grid.is_traversable(pos))
    }
}
