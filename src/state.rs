//! Bookkeeping shared by all strategies: parent trees, frontier containers
//! and per-run counters.

use crate::grid::{path_cost, step_cost, Grid, Position};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Common view over the different frontier containers.
pub trait Frontier {
    /// Cells currently waiting for expansion, in container order.
    fn cells(&self) -> Vec<Position>;

    /// Drops every entry whose cell is in `cells`.
    fn discard(&mut self, cells: &FxHashSet<Position>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Frontier for VecDeque<Position> {
    fn cells(&self) -> Vec<Position> {
        self.iter().copied().collect()
    }

    fn discard(&mut self, cells: &FxHashSet<Position>) {
        self.retain(|pos| !cells.contains(pos));
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

impl Frontier for Vec<Position> {
    fn cells(&self) -> Vec<Position> {
        self.clone()
    }

    fn discard(&mut self, cells: &FxHashSet<Position>) {
        self.retain(|pos| !cells.contains(pos));
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Depth-annotated stack used by depth-limited search.
impl Frontier for Vec<(Position, usize)> {
    fn cells(&self) -> Vec<Position> {
        self.iter().map(|&(pos, _)| pos).collect()
    }

    fn discard(&mut self, cells: &FxHashSet<Position>) {
        self.retain(|(pos, _)| !cells.contains(pos));
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Outcome of removing a newly blocked cell from a [`SearchTree`].
#[derive(Debug, Clone, Default)]
pub struct Invalidation {
    /// The blocked cell plus every descendant that could not be re-attached.
    pub removed: FxHashSet<Position>,
    /// Descendants that now hang off a different expanded neighbor.
    pub repaired: Vec<Position>,
}

const SCORE_EPSILON: f64 = 1e-9;

/// How re-attachment ranks candidate chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMetric {
    /// Number of moves from the root.
    Steps,
    /// Sum of step costs (1 orthogonal, √2 diagonal).
    Cost,
}

impl ChainMetric {
    fn step(self, from: Position, to: Position) -> f64 {
        match self {
            ChainMetric::Steps => 1.0,
            ChainMetric::Cost => step_cost(from, to),
        }
    }
}

/// Parent map rooted at one endpoint, plus the set of expanded cells.
#[derive(Debug, Clone)]
pub struct SearchTree {
    root: Position,
    parents: FxHashMap<Position, Position>,
    explored: FxHashSet<Position>,
}

impl SearchTree {
    pub fn new(root: Position) -> Self {
        SearchTree {
            root,
            parents: FxHashMap::default(),
            explored: FxHashSet::default(),
        }
    }

    pub fn root(&self) -> Position {
        self.root
    }

    pub fn is_discovered(&self, pos: Position) -> bool {
        pos == self.root || self.parents.contains_key(&pos)
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.explored.contains(&pos)
    }

    pub fn explored_len(&self) -> usize {
        self.explored.len()
    }

    pub fn parent(&self, pos: Position) -> Option<Position> {
        self.parents.get(&pos).copied()
    }

    /// Records `pos` as reached from `parent` unless it is already known.
    pub fn discover(&mut self, pos: Position, parent: Position) -> bool {
        if self.is_discovered(pos) {
            return false;
        }
        self.parents.insert(pos, parent);
        true
    }

    /// Overwrites the predecessor of `pos`; used when a cheaper route appears.
    pub fn set_parent(&mut self, pos: Position, parent: Position) {
        if pos != self.root {
            self.parents.insert(pos, parent);
        }
    }

    /// Drops a non-root cell so it can be discovered again.
    pub fn forget(&mut self, pos: Position) {
        self.parents.remove(&pos);
        self.explored.remove(&pos);
    }

    pub fn mark_explored(&mut self, pos: Position) -> bool {
        self.explored.insert(pos)
    }

    /// Cells from the root to `pos`, or `None` when the chain is broken.
    pub fn path_to(&self, pos: Position) -> Option<Vec<Position>> {
        let mut path = vec![pos];
        let mut current = pos;
        while current != self.root {
            current = *self.parents.get(&current)?;
            path.push(current);
            if path.len() > self.parents.len() + 1 {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Number of steps from the root to `pos`.
    pub fn depth_of(&self, pos: Position) -> Option<usize> {
        self.path_to(pos).map(|path| path.len() - 1)
    }

    pub fn cost_of(&self, pos: Position) -> Option<f64> {
        self.path_to(pos).map(|path| path_cost(&path))
    }

    /// Forgets everything except the root.
    pub fn clear(&mut self) {
        self.parents.clear();
        self.explored.clear();
    }

    fn chain_score(&self, pos: Position, metric: ChainMetric) -> Option<f64> {
        match metric {
            ChainMetric::Steps => self.depth_of(pos).map(|depth| depth as f64),
            ChainMetric::Cost => self.cost_of(pos),
        }
    }

    /// Drops a cell that just became blocked, along with its stale subtree.
    ///
    /// Every descendant of `blocked` is re-attached to an adjacent expanded
    /// cell whose own chain is intact. Attachments are made cheapest first
    /// under `metric`, so a re-attached cell hangs off its best available
    /// anchor and can itself anchor later cells. Ties go to the earlier
    /// neighbor in expansion order. Descendants that find no anchor are
    /// released: removed from the parent map and explored set so a later
    /// expansion can rediscover them.
    /// Returns `None` when `blocked` was never part of this tree.
    pub fn invalidate(
        &mut self,
        blocked: Position,
        grid: &Grid,
        diagonal: bool,
        metric: ChainMetric,
    ) -> Option<Invalidation> {
        if blocked == self.root || !self.is_discovered(blocked) {
            return None;
        }

        let mut children: FxHashMap<Position, Vec<Position>> = FxHashMap::default();
        for (&child, &parent) in &self.parents {
            children.entry(parent).or_default().push(child);
        }

        let mut stale = Vec::new();
        let mut queue = VecDeque::from([blocked]);
        while let Some(cell) = queue.pop_front() {
            if let Some(kids) = children.get(&cell) {
                let mut kids = kids.clone();
                kids.sort();
                queue.extend(kids);
            }
            if cell != blocked {
                stale.push(cell);
            }
        }

        self.parents.remove(&blocked);
        self.explored.remove(&blocked);

        let mut unresolved: FxHashSet<Position> = stale.iter().copied().collect();
        let mut scores: FxHashMap<Position, f64> = FxHashMap::default();
        let mut repaired = Vec::new();

        loop {
            let mut best: Option<(f64, Position, Position)> = None;
            for &cell in &stale {
                if !unresolved.contains(&cell) {
                    continue;
                }
                for anchor in grid.neighbors_with(cell, diagonal) {
                    if !grid.is_traversable(anchor)
                        || !self.explored.contains(&anchor)
                        || unresolved.contains(&anchor)
                    {
                        continue;
                    }
                    let base = match scores.get(&anchor) {
                        Some(&score) => score,
                        None => match self.chain_score(anchor, metric) {
                            Some(score) => score,
                            None => continue,
                        },
                    };
                    let score = base + metric.step(anchor, cell);
                    if best.map_or(true, |(known, _, _)| score + SCORE_EPSILON < known) {
                        best = Some((score, cell, anchor));
                    }
                }
            }
            let Some((score, cell, anchor)) = best else {
                break;
            };
            self.parents.insert(cell, anchor);
            unresolved.remove(&cell);
            scores.insert(cell, score);
            repaired.push(cell);
        }

        let mut removed: FxHashSet<Position> = FxHashSet::default();
        removed.insert(blocked);
        for cell in stale {
            if unresolved.contains(&cell) {
                self.parents.remove(&cell);
                self.explored.remove(&cell);
                removed.insert(cell);
            }
        }

        Some(Invalidation { removed, repaired })
    }
}

/// Counters and history accumulated over one run.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    explored_order: Vec<Position>,
    visited: FxHashSet<Position>,
    expansions: usize,
    obstacles_encountered: usize,
    replans_triggered: usize,
    encountered: FxHashSet<Position>,
    spawned: Vec<Position>,
    terminal_frontier: Vec<Position>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_expansion(&mut self, pos: Position) {
        self.expansions += 1;
        if self.visited.insert(pos) {
            self.explored_order.push(pos);
        }
    }

    /// Counts a blocked neighbor the first time it is seen.
    pub fn record_obstacle(&mut self, pos: Position) -> bool {
        if self.encountered.insert(pos) {
            self.obstacles_encountered += 1;
            true
        } else {
            false
        }
    }

    pub fn record_replan(&mut self) {
        self.replans_triggered += 1;
    }

    pub fn record_spawn(&mut self, pos: Position) {
        self.spawned.push(pos);
    }

    pub fn set_terminal_frontier(&mut self, frontier: Vec<Position>) {
        self.terminal_frontier = frontier;
    }

    /// Distinct expanded cells in first-visit order.
    pub fn explored_order(&self) -> &[Position] {
        &self.explored_order
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    pub fn obstacles_encountered(&self) -> usize {
        self.obstacles_encountered
    }

    pub fn replans_triggered(&self) -> usize {
        self.replans_triggered
    }

    pub fn spawned(&self) -> &[Position] {
        &self.spawned
    }

    pub fn terminal_frontier(&self) -> &[Position] {
        &self.terminal_frontier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_grid() -> Grid {
        Grid::new(5, 3, Position::new(0, 1), Position::new(4, 1)).unwrap()
    }

    /// Chain (0,1) -> (1,1) -> (2,1) -> (3,1), everything expanded but the tip.
    fn line_tree() -> SearchTree {
        let mut tree = SearchTree::new(Position::new(0, 1));
        tree.mark_explored(Position::new(0, 1));
        for x in 1..4 {
            assert!(tree.discover(Position::new(x, 1), Position::new(x - 1, 1)));
            if x < 3 {
                tree.mark_explored(Position::new(x, 1));
            }
        }
        tree
    }

    #[test]
    fn path_reconstruction_walks_parents() {
        let tree = line_tree();
        assert_eq!(
            tree.path_to(Position::new(3, 1)),
            Some(vec![
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(3, 1),
            ])
        );
        assert_eq!(tree.depth_of(Position::new(2, 1)), Some(2));
        assert_eq!(tree.path_to(Position::new(4, 2)), None);
    }

    #[test]
    fn discover_refuses_known_cells() {
        let mut tree = line_tree();
        assert!(!tree.discover(Position::new(2, 1), Position::new(1, 0)));
        assert!(!tree.discover(Position::new(0, 1), Position::new(1, 1)));
        assert_eq!(tree.parent(Position::new(2, 1)), Some(Position::new(1, 1)));
    }

    #[test]
    fn invalidate_ignores_cells_outside_tree() {
        let mut tree = line_tree();
        let grid = line_grid();
        assert!(tree.invalidate(Position::new(4, 0), &grid, true, ChainMetric::Steps).is_none());
        assert!(tree.invalidate(Position::new(0, 1), &grid, true, ChainMetric::Steps).is_none());
    }

    #[test]
    fn invalidate_reattaches_descendants_to_intact_neighbors() {
        let mut tree = line_tree();
        let mut grid = line_grid();
        let blocked = Position::new(1, 1);
        grid.spawn_dynamic_obstacle(blocked).unwrap();

        // (3,1) hangs off (2,1); (2,1) only touches the root side through the
        // blocked cell, so without diagonals it cannot be re-attached.
        let result = tree.invalidate(blocked, &grid, false, ChainMetric::Steps).unwrap();
        assert!(result.removed.contains(&blocked));
        assert!(result.removed.contains(&Position::new(2, 1)));
        assert!(result.removed.contains(&Position::new(3, 1)));
        assert!(!tree.is_discovered(Position::new(2, 1)));
        assert!(!tree.is_explored(Position::new(2, 1)));
    }

    #[test]
    fn invalidate_repairs_through_expanded_side_cells() {
        let mut tree = line_tree();
        let mut grid = line_grid();
        // Expanded detour above the line: (0,0) and (1,0) hang off the root.
        tree.discover(Position::new(0, 0), Position::new(0, 1));
        tree.mark_explored(Position::new(0, 0));
        tree.discover(Position::new(1, 0), Position::new(0, 0));
        tree.mark_explored(Position::new(1, 0));

        let blocked = Position::new(1, 1);
        grid.spawn_dynamic_obstacle(blocked).unwrap();
        let result = tree.invalidate(blocked, &grid, true, ChainMetric::Steps).unwrap();

        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.repaired.len(), 2);
        assert_eq!(tree.parent(Position::new(2, 1)), Some(Position::new(1, 0)));
        let path = tree.path_to(Position::new(3, 1)).unwrap();
        assert!(!path.contains(&blocked));
        assert_eq!(path.first(), Some(&Position::new(0, 1)));
    }

    #[test]
    fn invalidate_prefers_the_shallowest_anchor() {
        let mut grid = line_grid();
        let blocked = Position::new(1, 1);
        grid.spawn_dynamic_obstacle(blocked).unwrap();

        for metric in [ChainMetric::Steps, ChainMetric::Cost] {
            let mut tree = line_tree();
            // (1,0) is offered first by direction order but sits two moves
            // deep; (1,2) hangs directly off the root.
            tree.discover(Position::new(0, 0), Position::new(0, 1));
            tree.mark_explored(Position::new(0, 0));
            tree.discover(Position::new(1, 0), Position::new(0, 0));
            tree.mark_explored(Position::new(1, 0));
            tree.discover(Position::new(1, 2), Position::new(0, 1));
            tree.mark_explored(Position::new(1, 2));

            let result = tree.invalidate(blocked, &grid, true, metric).unwrap();
            assert_eq!(result.removed.len(), 1, "{:?}", metric);
            assert!(result.removed.contains(&blocked));
            assert_eq!(tree.parent(Position::new(2, 1)), Some(Position::new(1, 2)));
            assert_eq!(tree.depth_of(Position::new(2, 1)), Some(2));
            assert_eq!(tree.depth_of(Position::new(3, 1)), Some(3));
        }
    }

    #[test]
    fn state_counts_first_visits_only() {
        let mut state = SearchState::new();
        state.record_expansion(Position::new(1, 1));
        state.record_expansion(Position::new(1, 1));
        state.record_expansion(Position::new(2, 1));
        assert_eq!(state.expansions(), 3);
        assert_eq!(
            state.explored_order(),
            &[Position::new(1, 1), Position::new(2, 1)]
        );
        assert!(state.record_obstacle(Position::new(3, 3)));
        assert!(!state.record_obstacle(Position::new(3, 3)));
        assert_eq!(state.obstacles_encountered(), 1);
    }

    #[test]
    fn frontier_discard_removes_matching_cells() {
        let mut queue: VecDeque<Position> =
            [Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)].into();
        let mut stack: Vec<(Position, usize)> =
            vec![(Position::new(0, 0), 1), (Position::new(1, 0), 2)];
        let drop: FxHashSet<Position> = [Position::new(1, 0)].into_iter().collect();
        queue.discard(&drop);
        stack.discard(&drop);
        assert_eq!(queue.cells(), vec![Position::new(0, 0), Position::new(2, 0)]);
        assert_eq!(Frontier::len(&stack), 1);
    }
}
