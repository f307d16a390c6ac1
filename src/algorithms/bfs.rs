use crate::algorithms::common::{Context, FailureReason, SearchNode};
use crate::grid::Position;
use crate::state::{ChainMetric, Frontier, SearchTree};
use std::collections::VecDeque;

/// Breadth-first search over a FIFO queue. Cells are claimed when first
/// discovered, so the first time the target leaves the queue its path is a
/// shortest one in steps.
#[derive(Debug, Clone)]
pub struct Bfs {
    tree: SearchTree,
    queue: VecDeque<Position>,
}

impl Bfs {
    pub fn new(start: Position) -> Self {
        Bfs {
            tree: SearchTree::new(start),
            queue: VecDeque::from([start]),
        }
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        let Some(current) = self.queue.pop_front() else {
            ctx.fail(FailureReason::Exhausted, Vec::new());
            return;
        };
        if self.tree.is_explored(current) || !self.tree.is_discovered(current) {
            return;
        }

        if current == ctx.target() {
            match self.tree.path_to(current) {
                Some(path) if ctx.path_is_clear(&path) => {
                    let frontier = self.queue.cells();
                    ctx.succeed(path, frontier);
                }
                _ => {
                    self.tree.forget(current);
                }
            }
            return;
        }

        if let Some(blocked) = ctx.consult_monitor(current) {
            let invalidation = ctx.invalidate(&mut self.tree, blocked, ChainMetric::Steps);
            if let Some(invalidation) = invalidation {
                self.queue.discard(&invalidation.removed);
                ctx.replanned(blocked);
            }
            if !self.tree.is_discovered(current) {
                return;
            }
        }

        self.tree.mark_explored(current);
        for next in ctx.candidates(current) {
            if self.tree.discover(next, current) {
                self.queue.push_back(next);
            }
        }
        let queue = &self.queue;
        ctx.expanded(SearchNode::plain(current), || queue.cells());
    }
}
