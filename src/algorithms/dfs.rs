use crate::algorithms::common::{Context, FailureReason, SearchNode};
use crate::grid::Position;
use crate::state::{ChainMetric, Frontier, SearchTree};

/// Depth-first search over a LIFO stack.
///
/// Neighbors are pushed in reverse so the first direction in expansion order
/// is popped first.
#[derive(Debug, Clone)]
pub struct Dfs {
    tree: SearchTree,
    stack: Vec<Position>,
}

impl Dfs {
    pub fn new(start: Position) -> Self {
        Dfs {
            tree: SearchTree::new(start),
            stack: vec![start],
        }
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        let Some(current) = self.stack.pop() else {
            ctx.fail(FailureReason::Exhausted, Vec::new());
            return;
        };
        if self.tree.is_explored(current) || !self.tree.is_discovered(current) {
            return;
        }

        if current == ctx.target() {
            match self.tree.path_to(current) {
                Some(path) if ctx.path_is_clear(&path) => {
                    let frontier = self.stack.cells();
                    ctx.succeed(path, frontier);
                }
                _ => self.tree.forget(current),
            }
            return;
        }

        if let Some(blocked) = ctx.consult_monitor(current) {
            let invalidation = ctx.invalidate(&mut self.tree, blocked, ChainMetric::Steps);
            if let Some(invalidation) = invalidation {
                self.stack.discard(&invalidation.removed);
                ctx.replanned(blocked);
            }
            if !self.tree.is_discovered(current) {
                return;
            }
        }

        self.tree.mark_explored(current);
        for next in ctx.candidates(current).into_iter().rev() {
            if self.tree.discover(next, current) {
                self.stack.push(next);
            }
        }
        let stack = &self.stack;
        ctx.expanded(SearchNode::plain(current), || stack.cells());
    }
}
