use crate::algorithms::common::{Context, FailureReason, Origin, SearchNode};
use crate::grid::Position;
use crate::state::{ChainMetric, Frontier, SearchTree};
use std::collections::VecDeque;
use std::iter;

/// Two breadth-first frontiers, one grown from each endpoint.
///
/// The sides take turns one whole BFS level at a time. A cell dequeued on one
/// side while already expanded by the other is a meeting candidate; the shortest
/// joined path among the candidates in that level wins.
#[derive(Debug, Clone)]
pub struct Bidirectional {
    forward: SearchTree,
    backward: SearchTree,
    forward_queue: VecDeque<Position>,
    backward_queue: VecDeque<Position>,
    side: Origin,
    level_remaining: usize,
}

impl Bidirectional {
    pub fn new(start: Position, target: Position) -> Self {
        Bidirectional {
            forward: SearchTree::new(start),
            backward: SearchTree::new(target),
            forward_queue: VecDeque::from([start]),
            backward_queue: VecDeque::from([target]),
            side: Origin::FromStart,
            level_remaining: 1,
        }
    }

    fn tree(&self, origin: Origin) -> &SearchTree {
        match origin {
            Origin::FromStart => &self.forward,
            Origin::FromTarget => &self.backward,
        }
    }

    fn tree_mut(&mut self, origin: Origin) -> &mut SearchTree {
        match origin {
            Origin::FromStart => &mut self.forward,
            Origin::FromTarget => &mut self.backward,
        }
    }

    fn queue(&self, origin: Origin) -> &VecDeque<Position> {
        match origin {
            Origin::FromStart => &self.forward_queue,
            Origin::FromTarget => &self.backward_queue,
        }
    }

    fn queue_mut(&mut self, origin: Origin) -> &mut VecDeque<Position> {
        match origin {
            Origin::FromStart => &mut self.forward_queue,
            Origin::FromTarget => &mut self.backward_queue,
        }
    }

    fn frontier(&self) -> Vec<Position> {
        let mut cells = self.forward_queue.cells();
        cells.extend(self.backward_queue.iter().copied());
        cells
    }

    /// Start-side chain to `meeting` followed by the target-side chain reversed.
    fn join_at(&self, meeting: Position) -> Option<Vec<Position>> {
        let mut path = self.forward.path_to(meeting)?;
        let back = self.backward.path_to(meeting)?;
        path.extend(back.into_iter().rev().skip(1));
        Some(path)
    }

    fn best_meeting(&self, current: Position, ctx: &Context<'_>) -> Option<Vec<Position>> {
        let own = self.tree(self.side);
        let other = self.tree(self.side.opposite());
        let rest_of_level = self
            .queue(self.side)
            .iter()
            .take(self.level_remaining)
            .copied();

        let mut best: Option<Vec<Position>> = None;
        for cell in iter::once(current).chain(rest_of_level) {
            if !other.is_explored(cell) || !own.is_discovered(cell) {
                continue;
            }
            let Some(path) = self.join_at(cell) else {
                continue;
            };
            if !ctx.path_is_clear(&path) {
                continue;
            }
            if best.as_ref().map_or(true, |known| path.len() < known.len()) {
                best = Some(path);
            }
        }
        best
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        if self.level_remaining == 0 {
            if self.forward_queue.is_empty() && self.backward_queue.is_empty() {
                ctx.fail(FailureReason::Exhausted, Vec::new());
                return;
            }
            self.side = self.side.opposite();
            self.level_remaining = self.queue(self.side).len();
            return;
        }

        let side = self.side;
        let Some(current) = self.queue_mut(side).pop_front() else {
            self.level_remaining = 0;
            return;
        };
        self.level_remaining -= 1;

        let tree = self.tree(side);
        if tree.is_explored(current) || !tree.is_discovered(current) {
            return;
        }

        if self.tree(side.opposite()).is_explored(current) {
            if let Some(path) = self.best_meeting(current, ctx) {
                let frontier = self.frontier();
                ctx.succeed(path, frontier);
                return;
            }
        }

        if let Some(blocked) = ctx.consult_monitor(current) {
            self.replan(ctx, blocked);
            if !self.tree(side).is_discovered(current) {
                return;
            }
        }

        self.tree_mut(side).mark_explored(current);
        for next in ctx.candidates(current) {
            if self.tree_mut(side).discover(next, current) {
                self.queue_mut(side).push_back(next);
            }
        }
        let this: &Self = self;
        ctx.expanded(SearchNode::with_origin(current, side), || this.frontier());
    }

    fn replan(&mut self, ctx: &mut Context<'_>, blocked: Position) {
        let forward = ctx.invalidate(&mut self.forward, blocked, ChainMetric::Steps);
        let backward = ctx.invalidate(&mut self.backward, blocked, ChainMetric::Steps);
        if forward.is_none() && backward.is_none() {
            return;
        }

        let side = self.side;
        for (origin, invalidation) in [(Origin::FromStart, forward), (Origin::FromTarget, backward)] {
            let Some(invalidation) = invalidation else {
                continue;
            };
            if origin == side {
                let dropped = self
                    .queue(origin)
                    .iter()
                    .take(self.level_remaining)
                    .filter(|&&pos| invalidation.removed.contains(&pos))
                    .count();
                self.level_remaining -= dropped;
            }
            self.queue_mut(origin).discard(&invalidation.removed);
        }
        ctx.replanned(blocked);
    }
}
