use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::grid::{Grid, Position};
use log::{trace, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Decides, once per expansion, whether a dynamic obstacle appears.
#[derive(Debug, Clone)]
pub struct ObstacleMonitor {
    rng: StdRng,
    probability: f64,
}

impl ObstacleMonitor {
    /// Seeded monitors are reproducible; without a seed the generator draws from entropy.
    pub fn new(probability: f64, seed: Option<u64>) -> Result<Self> {
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };
        Self::with_rng(probability, rng)
    }

    pub fn with_rng(probability: f64, rng: StdRng) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SearchError::configuration(format!(
                "dynamic_obstacle_probability must be within [0, 1], got {}",
                probability
            )));
        }
        Ok(ObstacleMonitor { rng, probability })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(config.dynamic_obstacle_probability, config.seed)
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draws one sample; on success blocks a uniformly chosen free cell.
    ///
    /// Start, target and the cell being expanded (`expanding`) are never chosen.
    /// Returns the newly blocked cell.
    pub fn maybe_spawn(
        &mut self,
        grid: &mut Grid,
        step_index: usize,
        expanding: Position,
    ) -> Option<Position> {
        if self.probability <= 0.0 || !self.rng.gen_bool(self.probability) {
            return None;
        }

        let candidates: Vec<Position> = grid
            .free_cells()
            .into_iter()
            .filter(|&pos| pos != expanding)
            .collect();
        let cell = *candidates.choose(&mut self.rng)?;

        match grid.spawn_dynamic_obstacle(cell) {
            Ok(_) => {
                trace!("step {}: dynamic obstacle spawned at {}", step_index, cell);
                Some(cell)
            }
            Err(err) => {
                warn!("step {}: could not spawn obstacle: {}", step_index, err);
                None
            }
        }
    }
}
