use crate::algorithms::common::{Context, FailureReason};
use crate::algorithms::dls::{Dls, DlsOutcome};
use crate::grid::Position;
use log::debug;

/// Iterative deepening: depth-limited passes with limits 1, 2, 3, ... up to
/// `max_depth`. Each pass starts from a fresh tree; the first pass that
/// reaches the target therefore returns a shallowest path.
#[derive(Debug, Clone)]
pub struct Iddfs {
    start: Position,
    max_depth: usize,
    pass: Dls,
}

impl Iddfs {
    pub fn new(start: Position, max_depth: usize) -> Self {
        Iddfs {
            start,
            max_depth,
            pass: Dls::new(start, 1),
        }
    }

    pub fn current_limit(&self) -> usize {
        self.pass.limit()
    }

    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) {
        match self.pass.step(ctx) {
            DlsOutcome::Running => {}
            DlsOutcome::Found(path) => {
                let frontier = self.pass.frontier();
                ctx.succeed(path, frontier);
            }
            DlsOutcome::Exhausted { cut_off: false } => {
                // Nothing was held back by the limit, so deeper passes cannot help.
                ctx.fail(FailureReason::Exhausted, Vec::new());
            }
            DlsOutcome::Exhausted { cut_off: true } => {
                let limit = self.pass.limit();
                if limit >= self.max_depth {
                    ctx.fail(FailureReason::DepthExceeded, Vec::new());
                } else {
                    debug!("iterative deepening: raising depth limit to {}", limit + 1);
                    self.pass = Dls::new(self.start, limit + 1);
                }
            }
        }
    }
}
