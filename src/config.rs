use crate::error::{Result, SearchError};
use crate::grid::Position;
use clap::Parser;

/// Options recognized by every strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Depth ceiling for depth-limited search, in steps.
    pub depth_limit: usize,
    /// Deepest limit iterative deepening will try. `None` means `width * height`.
    pub max_depth: Option<usize>,
    /// Chance per expansion that a dynamic obstacle appears.
    pub dynamic_obstacle_probability: f64,
    /// Allow the four diagonal moves.
    pub diagonal_movement_allowed: bool,
    /// Seed for the obstacle monitor; entropy when absent.
    pub seed: Option<u64>,
    /// Copy frontier and explored sets into every `Expanded` event.
    pub record_snapshots: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth_limit: 10,
            max_depth: None,
            dynamic_obstacle_probability: 0.0,
            diagonal_movement_allowed: true,
            seed: None,
            record_snapshots: true,
        }
    }
}

impl SearchConfig {
    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_obstacle_probability(mut self, probability: f64) -> Self {
        self.dynamic_obstacle_probability = probability;
        self
    }

    pub fn with_diagonal_movement(mut self, allowed: bool) -> Self {
        self.diagonal_movement_allowed = allowed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_snapshots(mut self, record: bool) -> Self {
        self.record_snapshots = record;
        self
    }

    /// Rejects out-of-range values before any run starts.
    pub fn validate(&self) -> Result<()> {
        if self.depth_limit == 0 {
            return Err(SearchError::configuration("depth_limit must be at least 1"));
        }
        if self.max_depth == Some(0) {
            return Err(SearchError::configuration("max_depth must be at least 1"));
        }
        let p = self.dynamic_obstacle_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(SearchError::configuration(format!(
                "dynamic_obstacle_probability must be within [0, 1], got {}",
                p
            )));
        }
        Ok(())
    }

    /// Iterative deepening ceiling for a grid of the given size.
    pub fn max_depth_for(&self, width: usize, height: usize) -> usize {
        self.max_depth.unwrap_or_else(|| (width * height).max(1))
    }
}

/// Command line options for the driver binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = 20)]
    pub width: usize,

    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Fraction of free cells turned into walls.
    #[arg(long, default_value_t = 0.2)]
    pub wall_density: f64,

    #[arg(long)]
    pub start_x: Option<usize>,

    #[arg(long)]
    pub start_y: Option<usize>,

    #[arg(long)]
    pub target_x: Option<usize>,

    #[arg(long)]
    pub target_y: Option<usize>,

    /// bfs, dfs, ucs, dls, iddfs, bidirectional or all
    #[arg(long, default_value = "bfs")]
    pub algorithm: String,

    #[arg(long, default_value_t = 10)]
    pub depth_limit: usize,

    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long, default_value_t = 0.0)]
    pub obstacle_probability: f64,

    #[arg(long, default_value_t = false)]
    pub no_diagonal: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,
}

impl Config {
    pub fn start(&self) -> Position {
        Position::new(self.start_x.unwrap_or(0), self.start_y.unwrap_or(0))
    }

    pub fn target(&self) -> Position {
        Position::new(
            self.target_x.unwrap_or(self.width.saturating_sub(1)),
            self.target_y.unwrap_or(self.height.saturating_sub(1)),
        )
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            depth_limit: self.depth_limit,
            max_depth: self.max_depth,
            dynamic_obstacle_probability: self.obstacle_probability,
            diagonal_movement_allowed: !self.no_diagonal,
            seed: self.seed,
            record_snapshots: !self.no_visualization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(SearchConfig::default().with_depth_limit(0).validate().is_err());
        assert!(SearchConfig::default().with_max_depth(0).validate().is_err());
        assert!(SearchConfig::default()
            .with_obstacle_probability(1.5)
            .validate()
            .is_err());
        assert!(SearchConfig::default()
            .with_obstacle_probability(-0.1)
            .validate()
            .is_err());
        assert!(SearchConfig::default()
            .with_obstacle_probability(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn max_depth_defaults_to_cell_count() {
        let config = SearchConfig::default();
        assert_eq!(config.max_depth_for(4, 5), 20);
        assert_eq!(config.with_max_depth(3).max_depth_for(4, 5), 3);
    }

    #[test]
    fn cli_maps_onto_search_config() {
        let cli = Config::parse_from([
            "uninformed_search",
            "--width",
            "8",
            "--height",
            "6",
            "--no-diagonal",
            "--obstacle-probability",
            "0.25",
        ]);
        assert_eq!(cli.target(), Position::new(7, 5));
        let config = cli.search_config();
        assert!(!config.diagonal_movement_allowed);
        assert_eq!(config.dynamic_obstacle_probability, 0.25);
    }
}
