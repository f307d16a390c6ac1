use crate::algorithms::common::{Context, FailureReason, SearchNode};
use crate::grid::{step_cost, Position};
use crate::state::{ChainMetric, Frontier, SearchTree};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const COST_EPSILON: f64 = 1e-9;

/// Heap entry ordered so that `BinaryHeap` pops the cheapest, oldest entry first.
#[derive(Clone, Copy, Debug)]
struct CostEntry {
    cost: f64,
    seq: u64,
    pos: Position,
}

impl PartialEq for CostEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CostEntry {}

impl PartialOrd for CostEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CostEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour; insertion order breaks ties.
        match other.cost.total_cmp(&self.cost) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ordering => ordering,
        }
    }
}

impl Frontier for BinaryHeap<CostEntry> {
    fn cells(&self) -> Vec<Position> {
        let mut seen = FxHashSet::default();
        let mut entries: Vec<&CostEntry> = self.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
            .into_iter()
            .filter(|entry| seen.insert(entry.pos))
            .map(|entry| entry.pos)
            .collect()
    }

    fn discard(&mut self, cells: &FxHashSet<Position>) {
        self.retain(|entry| !cells.contains(&entry.pos));
    }

    fn len(&self) -> usize {
        BinaryHeap::len(self)
    }
}

/// Uniform-cost search: orthogonal steps cost 1, diagonal steps √2.
///
/// Costs are relaxed in place and stale heap entries are skipped on pop, so a
/// cell is expanded exactly once, at its cheapest known cost.
#[derive(Debug, Clone)]
pub struct Ucs {
    tree: SearchTree,
    heap: BinaryHeap<CostEntry>,
    costs: FxHashMap<Position, f64>,
    seq: u64,
}

impl Ucs {
    pub fn new(start: Position) -> Self {
        let mut ucs = Ucs {
            tree: SearchTree::new(start),
            heap: BinaryHeap::new(),
            costs: FxHashMap::default(),
            seq: 0,
        };
        ucs.push(start, 0.0);
        ucs
    }

    fn push(&mut self, pos: Position, cost: f64) {
        self.costs.insert(pos, cost);
        self.heap.push(CostEntry {
            cost,
            seq: self.seq,
            pos,
        });
        self.seq += 1;
    }

    /// An entry is live only while it carries the cell's current cost; a
    /// replan can raise that cost above older entries still in the heap.
    fn is_stale(&self, entry: &CostEntry) -> bool {
        self.tree.is_explored(entry.pos)
            || !self.tree.is_discovered(entry.pos)
            || self
                .costs
                .get(&entry.pos)
                .map_or(true, |&best| (entry.cost - best).abs() > COST_EPSILON)
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        let Some(entry) = self.heap.pop() else {
            ctx.fail(FailureReason::Exhausted, Vec::new());
            return;
        };
        if self.is_stale(&entry) {
            return;
        }
        let current = entry.pos;

        // The target's cost is tentative until its chain is confirmed walkable.
        if current == ctx.target() {
            match self.tree.path_to(current) {
                Some(path) if ctx.path_is_clear(&path) => {
                    let frontier = self.heap.cells();
                    ctx.succeed(path, frontier);
                }
                _ => {
                    self.tree.forget(current);
                    self.costs.remove(&current);
                }
            }
            return;
        }

        if let Some(blocked) = ctx.consult_monitor(current) {
            self.replan(ctx, blocked);
            if !self.tree.is_discovered(current) {
                return;
            }
        }

        let cost = self.costs.get(&current).copied().unwrap_or(entry.cost);
        self.tree.mark_explored(current);
        for next in ctx.candidates(current) {
            if self.tree.is_explored(next) {
                continue;
            }
            let new_cost = cost + step_cost(current, next);
            let improves = self
                .costs
                .get(&next)
                .map_or(true, |&known| new_cost + COST_EPSILON < known);
            if improves {
                self.tree.set_parent(next, current);
                self.push(next, new_cost);
            }
        }
        let heap = &self.heap;
        ctx.expanded(SearchNode::with_cost(current, cost), || heap.cells());
    }

    fn replan(&mut self, ctx: &mut Context<'_>, blocked: Position) {
        let Some(invalidation) = ctx.invalidate(&mut self.tree, blocked, ChainMetric::Cost) else {
            return;
        };
        self.heap.discard(&invalidation.removed);
        for pos in &invalidation.removed {
            self.costs.remove(pos);
        }
        // Re-attached cells carry a new chain, so their costs are recomputed
        // and frontier cells are queued again at the corrected cost.
        for &pos in &invalidation.repaired {
            if let Some(cost) = self.tree.cost_of(pos) {
                self.costs.insert(pos, cost);
            }
        }
        for &pos in &invalidation.repaired {
            if !self.tree.is_explored(pos) {
                if let Some(&cost) = self.costs.get(&pos) {
                    self.heap.push(CostEntry {
                        cost,
                        seq: self.seq,
                        pos,
                    });
                    self.seq += 1;
                }
            }
        }
        ctx.replanned(blocked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_pops_cheapest_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(CostEntry {
            cost: 2.0,
            seq: 0,
            pos: Position::new(0, 0),
        });
        heap.push(CostEntry {
            cost: 1.0,
            seq: 2,
            pos: Position::new(2, 0),
        });
        heap.push(CostEntry {
            cost: 1.0,
            seq: 1,
            pos: Position::new(1, 0),
        });
        let order: Vec<Position> = std::iter::from_fn(|| heap.pop().map(|e| e.pos)).collect();
        assert_eq!(
            order,
            vec![Position::new(1, 0), Position::new(2, 0), Position::new(0, 0)]
        );
    }

    #[test]
    fn entries_off_the_current_cost_are_stale() {
        let start = Position::new(0, 0);
        let cell = Position::new(1, 0);
        let mut ucs = Ucs::new(start);
        ucs.tree.set_parent(cell, start);
        ucs.push(cell, 1.0);
        let old = CostEntry {
            cost: 1.0,
            seq: 1,
            pos: cell,
        };
        // A replan re-attached the cell through a dearer chain.
        ucs.push(cell, 3.0);
        let current = CostEntry {
            cost: 3.0,
            seq: 2,
            pos: cell,
        };

        assert!(ucs.is_stale(&old));
        assert!(!ucs.is_stale(&current));
        assert!(!ucs.is_stale(&CostEntry {
            cost: 3.0 + 1e-12,
            seq: 3,
            pos: cell,
        }));

        ucs.tree.mark_explored(cell);
        assert!(ucs.is_stale(&current));
    }
}
