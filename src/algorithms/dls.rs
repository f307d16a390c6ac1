use crate::algorithms::common::{Context, FailureReason, SearchNode};
use crate::grid::Position;
use crate::state::{Frontier, SearchTree};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Result of a single depth-limited step, shared with iterative deepening.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DlsOutcome {
    Running,
    Found(Vec<Position>),
    /// Stack emptied. `cut_off` is set when reachable cells lay past the limit.
    Exhausted { cut_off: bool },
}

/// Depth-limited search over a stack of `(cell, depth)` entries.
///
/// A cell is settled at its recorded depth. Reaching it again through a
/// strictly shorter chain reopens it, so every cell within the limit is
/// eventually expanded at its shallowest depth. The explored set is therefore
/// keyed by depth here: an explored cell is expanded again only when it is
/// reached shallower than before.
#[derive(Debug, Clone)]
pub struct Dls {
    tree: SearchTree,
    stack: Vec<(Position, usize)>,
    depths: FxHashMap<Position, usize>,
    limit: usize,
    cutoff: Vec<Position>,
}

impl Dls {
    pub fn new(start: Position, limit: usize) -> Self {
        let mut depths = FxHashMap::default();
        depths.insert(start, 0);
        Dls {
            tree: SearchTree::new(start),
            stack: vec![(start, 0)],
            depths,
            limit,
            cutoff: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn frontier(&self) -> Vec<Position> {
        self.stack.cells()
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        match self.step(ctx) {
            DlsOutcome::Running => {}
            DlsOutcome::Found(path) => {
                let frontier = self.frontier();
                ctx.succeed(path, frontier);
            }
            DlsOutcome::Exhausted { cut_off } => {
                let reason = if cut_off {
                    FailureReason::DepthExceeded
                } else {
                    FailureReason::Exhausted
                };
                ctx.fail(reason, Vec::new());
            }
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut Context<'_>) -> DlsOutcome {
        let Some((current, depth)) = self.stack.pop() else {
            return DlsOutcome::Exhausted {
                cut_off: self.cut_off_reachable(ctx),
            };
        };
        if self.depths.get(&current) != Some(&depth) || !self.tree.is_discovered(current) {
            return DlsOutcome::Running;
        }

        if current == ctx.target() && depth <= self.limit {
            match self.tree.path_to(current) {
                Some(path) if ctx.path_is_clear(&path) => return DlsOutcome::Found(path),
                _ => {
                    self.tree.forget(current);
                    self.depths.remove(&current);
                    return DlsOutcome::Running;
                }
            }
        }

        if depth >= self.limit {
            self.cutoff.push(current);
            return DlsOutcome::Running;
        }

        if let Some(blocked) = ctx.consult_monitor(current) {
            self.replan(ctx, blocked, current);
            match self.depths.get(&current) {
                Some(&now) if now == depth => {}
                Some(&now) => {
                    self.stack.push((current, now));
                    return DlsOutcome::Running;
                }
                None => return DlsOutcome::Running,
            }
        }

        self.tree.mark_explored(current);
        let root = self.tree.root();
        let next_depth = depth + 1;
        for next in ctx.candidates(current).into_iter().rev() {
            if next == root {
                continue;
            }
            let shallower = self
                .depths
                .get(&next)
                .map_or(true, |&known| next_depth < known);
            if shallower {
                self.tree.set_parent(next, current);
                self.depths.insert(next, next_depth);
                self.stack.push((next, next_depth));
            }
        }
        let stack = &self.stack;
        ctx.expanded(SearchNode::with_depth(current, depth), || stack.cells());
        DlsOutcome::Running
    }

    /// True when some cell held back at the limit still leads somewhere: it is
    /// the target, it borders free space never discovered, or an expanded
    /// neighbor offers it a shorter chain than the one it was cut off on.
    fn cut_off_reachable(&self, ctx: &Context<'_>) -> bool {
        let target = ctx.target();
        self.cutoff.iter().any(|&cell| {
            let Some(&depth) = self.depths.get(&cell) else {
                return false;
            };
            if depth < self.limit {
                return false;
            }
            cell == target
                || ctx
                    .grid
                    .neighbors_with(cell, ctx.diagonal())
                    .into_iter()
                    .filter(|&next| ctx.grid.is_traversable(next))
                    .any(|next| match self.depths.get(&next) {
                        None => true,
                        Some(&known) => self.tree.is_explored(next) && known + 1 < depth,
                    })
        })
    }

    /// Rebuilds parents and depths over the cells already expanded.
    ///
    /// A breadth-first sweep from the root passes only through expanded cells
    /// shallower than the limit, so each of them again offers every
    /// traversable neighbor at its shallowest depth. Expanded cells the sweep
    /// misses, or reaches at the limit, lose their expanded status. Reached
    /// cells that are not expanded go back on the stack, except `current`,
    /// which the caller re-examines.
    fn replan(&mut self, ctx: &mut Context<'_>, blocked: Position, current: Position) {
        let root = self.tree.root();
        if blocked == root || !self.depths.contains_key(&blocked) {
            return;
        }

        let mut tree = SearchTree::new(root);
        let mut depths = FxHashMap::default();
        depths.insert(root, 0);
        let mut leaves = Vec::new();
        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((cell, depth)) = queue.pop_front() {
            if depth >= self.limit || !self.tree.is_explored(cell) {
                leaves.push((cell, depth));
                continue;
            }
            tree.mark_explored(cell);
            for next in ctx.grid.neighbors_with(cell, ctx.diagonal()) {
                if depths.contains_key(&next) || !ctx.grid.is_traversable(next) {
                    continue;
                }
                tree.set_parent(next, cell);
                depths.insert(next, depth + 1);
                queue.push_back((next, depth + 1));
            }
        }

        // Entries already on the stack keep their order on top; newly exposed
        // leaves go underneath, shallowest nearest the top.
        let leaf_depths: FxHashMap<Position, usize> = leaves.iter().copied().collect();
        let mut seen = FxHashSet::default();
        seen.insert(current);
        let mut kept: Vec<(Position, usize)> = self
            .stack
            .iter()
            .rev()
            .filter_map(|&(pos, _)| {
                let depth = *leaf_depths.get(&pos)?;
                seen.insert(pos).then_some((pos, depth))
            })
            .collect();
        kept.reverse();
        let mut fresh: Vec<(Position, usize)> = leaves
            .into_iter()
            .filter(|&(pos, _)| seen.insert(pos))
            .collect();
        fresh.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        fresh.extend(kept);

        self.tree = tree;
        self.depths = depths;
        self.stack = fresh;
        ctx.replanned(blocked);
    }
}
