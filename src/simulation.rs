use crate::algorithms::{Algorithm, Search, StepEvent};
use crate::config::{Config, SearchConfig};
use crate::error::Result;
use crate::grid::{Grid, Position};
use crate::statistics::SearchResult;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::thread;
use std::time::{Duration, Instant};

/// A reproducible layout shared by every strategy in a comparison.
#[derive(Debug, Clone)]
pub struct EnvironmentSetup {
    pub width: usize,
    pub height: usize,
    pub start: Position,
    pub target: Position,
    pub walls: Vec<Position>,
    pub seed: u64,
}

impl EnvironmentSetup {
    /// Generates walls at the configured density. The same seed always yields
    /// the same layout.
    pub fn generate(config: &Config, seed: Option<u64>) -> Result<Self> {
        let seed = seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = StdRng::seed_from_u64(seed);

        let start = config.start();
        let target = config.target();
        let grid = Grid::with_wall_density(
            config.width,
            config.height,
            start,
            target,
            config.wall_density,
            &mut rng,
        )?;
        let walls = grid.walls();

        info!(
            "generated environment {}x{} - start: {}, target: {}, walls: {}",
            config.width,
            config.height,
            start,
            target,
            walls.len()
        );

        Ok(EnvironmentSetup {
            width: config.width,
            height: config.height,
            start,
            target,
            walls,
            seed,
        })
    }

    pub fn create_grid(&self) -> Result<Grid> {
        Grid::with_walls(
            self.width,
            self.height,
            self.start,
            self.target,
            self.walls.iter().copied(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AlgorithmResult {
    pub algorithm: Algorithm,
    pub result: SearchResult,
    pub elapsed: Duration,
}

/// Cells on a shortest start-to-target path over static walls, or `None` when
/// the target is unreachable.
pub fn reference_shortest_path_len(grid: &Grid, diagonal: bool) -> Option<usize> {
    let target = grid.target();
    pathfinding::prelude::bfs(
        &grid.start(),
        |&pos| {
            grid.neighbors_with(pos, diagonal)
                .into_iter()
                .filter(|&next| grid.is_traversable(next))
        },
        |&pos| pos == target,
    )
    .map(|path| path.len())
}

pub struct Simulation {
    grid: Grid,
    algorithm: Algorithm,
    config: Config,
    search_config: SearchConfig,
    environment: EnvironmentSetup,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self> {
        let environment = EnvironmentSetup::generate(&config, config.seed)?;
        Self::new_with_environment(config, environment)
    }

    pub fn new_with_environment(config: Config, environment: EnvironmentSetup) -> Result<Self> {
        let algorithm: Algorithm = config.algorithm.parse()?;
        let search_config = config.search_config();
        search_config.validate()?;
        let grid = environment.create_grid()?;
        Ok(Simulation {
            grid,
            algorithm,
            config,
            search_config,
            environment,
        })
    }

    pub fn environment(&self) -> &EnvironmentSetup {
        &self.environment
    }

    /// Runs the configured strategy once, animating each step unless
    /// visualization is disabled.
    pub fn run(&mut self) -> Result<AlgorithmResult> {
        self.grid.reset_dynamic_obstacles();
        let visualize = !self.config.no_visualization;
        let delay = Duration::from_millis(self.config.delay_ms);
        let algorithm = self.algorithm;

        let started = Instant::now();
        let mut search = Search::new(&mut self.grid, algorithm, self.search_config.clone())?;
        let mut step = 0;
        while let Some(event) = search.next_step() {
            if !visualize {
                continue;
            }
            if let StepEvent::Expanded {
                node,
                frontier,
                explored,
            } = &event
            {
                step += 1;
                Self::clear_screen();
                println!("=== {} ===", algorithm.label().to_uppercase());
                println!(
                    "Step: {} | Expanding: {} | Frontier: {} | Explored: {}",
                    step,
                    node.position,
                    frontier.len(),
                    explored.len()
                );
                print!("{}", search.grid().render(&[], explored, frontier));
                thread::sleep(delay);
            }
        }
        let result = search.run_to_end();
        let elapsed = started.elapsed();

        if visualize {
            Self::clear_screen();
            println!("=== {} ===", algorithm.label().to_uppercase());
            print!(
                "{}",
                self.grid
                    .render(&result.path, &result.explored, &result.frontier_at_termination)
            );
        }

        Ok(AlgorithmResult {
            algorithm,
            result,
            elapsed,
        })
    }

    /// Runs every strategy on one generated environment. Dynamic obstacles are
    /// cleared between runs and each run shares the same obstacle seed.
    pub fn run_all_algorithms(config: Config) -> Result<Vec<AlgorithmResult>> {
        let environment = EnvironmentSetup::generate(&config, config.seed)?;
        let mut grid = environment.create_grid()?;
        let mut search_config = config.search_config().with_snapshots(false);
        search_config.seed = Some(environment.seed);
        search_config.validate()?;

        println!("Running comparison of {} algorithms...", Algorithm::ALL.len());
        println!("Environment seed: {} (for reproducibility)", environment.seed);
        println!(
            "Environment: Grid {}x{}, Walls: {}, Obstacle probability: {}",
            environment.width,
            environment.height,
            environment.walls.len(),
            search_config.dynamic_obstacle_probability
        );
        println!("Start: {}, Target: {}", environment.start, environment.target);
        match reference_shortest_path_len(&grid, search_config.diagonal_movement_allowed) {
            Some(len) => println!("Reference shortest path: {} cells", len),
            None => println!("Target is unreachable from start on this layout"),
        }
        println!();

        let mut results = Vec::with_capacity(Algorithm::ALL.len());
        for (i, algorithm) in Algorithm::ALL.into_iter().enumerate() {
            println!(
                "Running algorithm {} of {}: {}",
                i + 1,
                Algorithm::ALL.len(),
                algorithm.name()
            );
            grid.reset_dynamic_obstacles();

            let started = Instant::now();
            let result = Search::new(&mut grid, algorithm, search_config.clone())?.run_to_end();
            let elapsed = started.elapsed();

            println!(
                "Completed: {} - Found: {}, Path length: {}, Nodes explored: {}",
                algorithm.name(),
                result.found,
                result.metrics.path_length,
                result.metrics.nodes_explored
            );
            results.push(AlgorithmResult {
                algorithm,
                result,
                elapsed,
            });
        }
        grid.reset_dynamic_obstacles();

        Ok(results)
    }

    pub fn print_comparison_results(results: &[AlgorithmResult]) {
        println!("\n=== ALGORITHM COMPARISON RESULTS ===");
        println!();
        println!(
            "{:<15} {:<8} {:<8} {:<10} {:<10} {:<10} {:<10} {:<12}",
            "Algorithm", "Found", "Length", "Cost", "Explored", "Obstacles", "Replans", "Time"
        );
        println!("{}", "-".repeat(90));

        for entry in results {
            let metrics = &entry.result.metrics;
            println!(
                "{:<15} {:<8} {:<8} {:<10.3} {:<10} {:<10} {:<10} {:<12}",
                entry.algorithm.name(),
                entry.result.found,
                metrics.path_length,
                metrics.path_cost,
                metrics.nodes_explored,
                metrics.obstacles_encountered,
                metrics.replans_triggered,
                format!("{:.2?}", entry.elapsed)
            );
        }
        println!();

        let found: Vec<&AlgorithmResult> = results.iter().filter(|r| r.result.found).collect();
        if found.is_empty() {
            println!("No algorithm reached the target.");
            return;
        }

        println!("=== PERFORMANCE ANALYSIS ===");
        if let Some(shortest) = found.iter().min_by_key(|r| r.result.metrics.path_length) {
            println!(
                "Shortest path: {} ({} cells)",
                shortest.algorithm.name(),
                shortest.result.metrics.path_length
            );
        }
        if let Some(cheapest) = found
            .iter()
            .min_by(|a, b| a.result.metrics.path_cost.total_cmp(&b.result.metrics.path_cost))
        {
            println!(
                "Cheapest path: {} ({:.3})",
                cheapest.algorithm.name(),
                cheapest.result.metrics.path_cost
            );
        }
        if let Some(leanest) = found.iter().min_by_key(|r| r.result.metrics.nodes_explored) {
            println!(
                "Fewest expansions: {} ({} nodes)",
                leanest.algorithm.name(),
                leanest.result.metrics.nodes_explored
            );
        }
        if let Some(fastest) = found.iter().min_by_key(|r| r.elapsed) {
            println!("Fastest: {} ({:.2?})", fastest.algorithm.name(), fastest.elapsed);
        }
    }

    fn clear_screen() {
        print!("\x1B[2J\x1B[1;1H");
    }
}
