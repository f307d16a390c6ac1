use clap::Parser;

use uninformed_search::config::Config;
use uninformed_search::simulation::{reference_shortest_path_len, Simulation};

fn main() {
    env_logger::init();
    let config = Config::parse();

    println!("Starting uninformed search...");
    println!("Grid size: {}x{}", config.width, config.height);
    println!(
        "Wall density: {}, Obstacle probability: {}",
        config.wall_density, config.obstacle_probability
    );
    println!("Algorithm: {}", config.algorithm);

    if config.no_visualization {
        println!("Visualization disabled - running in fast mode");
    } else {
        println!("Visualization enabled with {}ms delay", config.delay_ms);
    }
    println!();

    if config.algorithm == "all" {
        match Simulation::run_all_algorithms(config) {
            Ok(results) => Simulation::print_comparison_results(&results),
            Err(e) => {
                eprintln!("Error running all algorithms: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let diagonal = !config.no_diagonal;
    let mut simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("Failed to create simulation: {}", e);
            std::process::exit(1);
        }
    };

    match simulation.run() {
        Ok(outcome) => {
            println!("\n=== FINAL RESULTS ===");
            println!("Algorithm: {}", outcome.algorithm);
            println!("{}", outcome.result);
            println!("Elapsed: {:.2?}", outcome.elapsed);

            let environment = simulation.environment();
            println!("Environment seed: {}", environment.seed);
            if let Ok(grid) = environment.create_grid() {
                match reference_shortest_path_len(&grid, diagonal) {
                    Some(len) if outcome.result.found => {
                        let extra = outcome.result.metrics.path_length.saturating_sub(len);
                        println!("Reference shortest path: {} cells ({} extra)", len, extra);
                    }
                    Some(len) => println!("Reference shortest path: {} cells", len),
                    None => {
                        println!("Target unreachable on this layout");
                        println!("Try reducing --wall-density");
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Search failed to start: {}", e);
            std::process::exit(1);
        }
    }
}
