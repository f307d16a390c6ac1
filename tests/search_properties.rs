use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uninformed_search::grid::is_valid_path;
use uninformed_search::simulation::reference_shortest_path_len;
use uninformed_search::state::SearchState;
use uninformed_search::{
    Algorithm, FailureReason, Grid, Position, Search, SearchConfig, SearchError, SearchResult,
    StepEvent,
};

fn p(x: usize, y: usize) -> Position {
    Position::new(x, y)
}

fn run(grid: &mut Grid, algorithm: Algorithm, config: &SearchConfig) -> SearchResult {
    algorithm.search(grid, config).unwrap().run_to_end()
}

fn random_grid(width: usize, height: usize, density: f64, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    Grid::with_wall_density(
        width,
        height,
        p(0, 0),
        p(width - 1, height - 1),
        density,
        &mut rng,
    )
    .unwrap()
}

#[test]
fn start_equal_to_target_succeeds_immediately() {
    for algorithm in Algorithm::ALL {
        let mut grid = Grid::new(3, 3, p(1, 1), p(1, 1)).unwrap();
        let mut search = algorithm.search(&mut grid, &SearchConfig::default()).unwrap();
        assert_eq!(search.next_step(), Some(StepEvent::Success(vec![p(1, 1)])));
        assert_eq!(search.next_step(), None);

        let result = search.result().unwrap();
        assert!(result.found);
        assert_eq!(result.metrics.nodes_explored, 0);
        assert_eq!(result.metrics.path_length, 1);
    }
}

#[test]
fn walled_off_target_exhausts_every_strategy() {
    for algorithm in Algorithm::ALL {
        let mut grid =
            Grid::with_walls(5, 5, p(0, 0), p(4, 4), [p(3, 3), p(3, 4), p(4, 3)]).unwrap();
        let result = run(&mut grid, algorithm, &SearchConfig::default());
        assert!(!result.found, "{}", algorithm.name());
        assert!(result.path.is_empty());
        assert_eq!(
            result.failure,
            Some(FailureReason::Exhausted),
            "{}",
            algorithm.name()
        );
    }
}

#[test]
fn bfs_expansion_order_follows_direction_order() {
    let mut grid = Grid::new(3, 3, p(1, 1), p(0, 2)).unwrap();
    let search = Algorithm::Bfs
        .search(&mut grid, &SearchConfig::default())
        .unwrap();

    let mut expanded = Vec::new();
    let mut last = None;
    for event in search {
        match event {
            StepEvent::Expanded { node, explored, .. } => {
                expanded.push(node.position);
                assert_eq!(explored, expanded);
            }
            other => last = Some(other),
        }
    }

    assert_eq!(
        expanded,
        vec![p(1, 1), p(1, 0), p(2, 1), p(1, 2), p(2, 2), p(0, 1), p(0, 0), p(2, 0)]
    );
    assert_eq!(last, Some(StepEvent::Success(vec![p(1, 1), p(0, 2)])));
}

#[test]
fn bfs_first_frontier_snapshot_lists_all_neighbors() {
    let mut grid = Grid::new(3, 3, p(1, 1), p(0, 2)).unwrap();
    let mut search = Algorithm::Bfs
        .search(&mut grid, &SearchConfig::default())
        .unwrap();
    match search.next_step() {
        Some(StepEvent::Expanded { frontier, .. }) => assert_eq!(
            frontier,
            vec![p(1, 0), p(2, 1), p(1, 2), p(2, 2), p(0, 1), p(0, 0), p(2, 0), p(0, 2)]
        ),
        other => panic!("unexpected first event {:?}", other),
    }
}

#[test]
fn open_grid_bfs_walks_the_diagonal() {
    let mut grid = Grid::new(10, 10, p(0, 0), p(9, 9)).unwrap();
    let result = run(&mut grid, Algorithm::Bfs, &SearchConfig::default());
    assert!(result.found);
    assert_eq!(result.metrics.path_length, 10);
    assert!(result.metrics.nodes_explored <= 100);
    assert!(is_valid_path(&result.path, p(0, 0), p(9, 9)));
}

#[test]
fn wall_row_forces_path_through_gap() {
    for algorithm in Algorithm::ALL {
        let mut grid = Grid::with_walls(
            5,
            5,
            p(0, 0),
            p(4, 4),
            [p(0, 2), p(1, 2), p(3, 2), p(4, 2)],
        )
        .unwrap();
        let result = run(&mut grid, algorithm, &SearchConfig::default());
        assert!(result.found, "{}", algorithm.name());
        assert!(result.path.contains(&p(2, 2)), "{}", algorithm.name());
        assert!(is_valid_path(&result.path, p(0, 0), p(4, 4)));
    }
}

#[test]
fn orthogonal_only_movement_never_steps_diagonally() {
    let config = SearchConfig::default().with_diagonal_movement(false);
    for algorithm in Algorithm::ALL {
        let mut grid = Grid::new(6, 4, p(0, 0), p(5, 3)).unwrap();
        let result = run(&mut grid, algorithm, &config);
        assert!(result.found, "{}", algorithm.name());
        for pair in result.path.windows(2) {
            assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
    }
}

#[test]
fn dls_reports_depth_exceeded_on_short_limit() {
    let mut grid = Grid::new(5, 1, p(0, 0), p(4, 0)).unwrap();
    let config = SearchConfig::default().with_depth_limit(2);
    let result = run(&mut grid, Algorithm::Dls, &config);
    assert!(!result.found);
    assert_eq!(result.failure, Some(FailureReason::DepthExceeded));

    let config = SearchConfig::default().with_depth_limit(4);
    let result = run(&mut grid, Algorithm::Dls, &config);
    assert!(result.found);
    assert_eq!(result.path, vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0), p(4, 0)]);
}

#[test]
fn iddfs_reports_depth_exceeded_below_max_depth() {
    let mut grid = Grid::new(6, 1, p(0, 0), p(5, 0)).unwrap();
    let config = SearchConfig::default().with_max_depth(3);
    let result = run(&mut grid, Algorithm::Iddfs, &config);
    assert_eq!(result.failure, Some(FailureReason::DepthExceeded));

    let config = SearchConfig::default().with_max_depth(5);
    let result = run(&mut grid, Algorithm::Iddfs, &config);
    assert!(result.found);
    assert_eq!(result.metrics.path_length, 6);
}

#[test]
fn ucs_prefers_cheaper_orthogonal_detour() {
    // Diagonal moves cost more than one orthogonal step, so on a straight
    // corridor UCS stays on the row.
    let mut grid = Grid::new(5, 3, p(0, 1), p(4, 1)).unwrap();
    let result = run(&mut grid, Algorithm::Ucs, &SearchConfig::default());
    assert_eq!(result.path, vec![p(0, 1), p(1, 1), p(2, 1), p(3, 1), p(4, 1)]);
    assert!((result.metrics.path_cost - 4.0).abs() < 1e-9);
}

#[test]
fn bidirectional_path_contains_meeting_cell_once() {
    let mut grid = Grid::new(7, 7, p(0, 3), p(6, 3)).unwrap();
    let result = run(&mut grid, Algorithm::Bidirectional, &SearchConfig::default());
    assert!(result.found);
    assert_eq!(result.metrics.path_length, 7);
    let mut sorted = result.path.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), result.path.len());
}

#[test]
fn runs_without_obstacles_are_reproducible() {
    for algorithm in Algorithm::ALL {
        let mut grid = random_grid(9, 7, 0.25, 11);
        let first = run(&mut grid, algorithm, &SearchConfig::default());
        grid.reset_dynamic_obstacles();
        let second = run(&mut grid, algorithm, &SearchConfig::default());
        assert_eq!(first, second, "{}", algorithm.name());

        let third = Search::with_monitor(&mut grid, algorithm, SearchConfig::default(), None)
            .unwrap()
            .run_to_end();
        assert_eq!(first, third, "{}", algorithm.name());
    }
}

#[test]
fn disabled_snapshots_leave_expanded_events_empty() {
    let mut grid = Grid::new(4, 4, p(0, 0), p(3, 3)).unwrap();
    let config = SearchConfig::default().with_snapshots(false);
    let search = Algorithm::Dfs.search(&mut grid, &config).unwrap();
    for event in search {
        if let StepEvent::Expanded {
            frontier, explored, ..
        } = event
        {
            assert!(frontier.is_empty());
            assert!(explored.is_empty());
        }
    }
}

#[test]
fn invalid_configuration_is_rejected_before_searching() {
    let mut grid = Grid::new(4, 4, p(0, 0), p(3, 3)).unwrap();
    let bad = [
        SearchConfig::default().with_obstacle_probability(1.5),
        SearchConfig::default().with_obstacle_probability(-0.1),
        SearchConfig::default().with_depth_limit(0),
        SearchConfig::default().with_max_depth(0),
        SearchConfig::default().with_obstacle_probability(f64::NAN),
        SearchConfig::default()
            .with_obstacle_probability(0.5)
            .with_depth_limit(0),
    ];
    for config in bad {
        assert!(matches!(
            Algorithm::Bfs.search(&mut grid, &config),
            Err(SearchError::Configuration { .. })
        ));
    }

    assert!(Grid::new(0, 3, p(0, 0), p(0, 0)).is_err());
    assert!(matches!(
        Grid::new(3, 3, p(3, 0), p(0, 0)),
        Err(SearchError::InvalidPlacement { .. })
    ));
}

#[test]
fn aggregator_ignores_nonterminal_events() {
    let state = SearchState::new();
    let event = StepEvent::ObstacleEncountered(p(1, 1));
    assert_eq!(uninformed_search::finalize(&event, &state), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn breadth_first_strategies_match_reference(
        width in 3usize..10,
        height in 3usize..10,
        density in 0.0f64..0.4,
        seed in any::<u64>(),
        diagonal in any::<bool>(),
    ) {
        let mut grid = random_grid(width, height, density, seed);
        let config = SearchConfig::default().with_diagonal_movement(diagonal);
        let reference = reference_shortest_path_len(&grid, diagonal);

        for algorithm in [Algorithm::Bfs, Algorithm::Bidirectional, Algorithm::Iddfs] {
            let result = run(&mut grid, algorithm, &config);
            match reference {
                Some(len) => {
                    prop_assert!(result.found, "{} missed a reachable target", algorithm.name());
                    prop_assert_eq!(result.metrics.path_length, len, "{}", algorithm.name());
                    prop_assert!(is_valid_path(&result.path, grid.start(), grid.target()));
                }
                None => {
                    prop_assert_eq!(result.failure, Some(FailureReason::Exhausted));
                }
            }
        }
    }

    #[test]
    fn ucs_is_never_costlier_than_bfs_or_dfs(
        width in 3usize..10,
        height in 3usize..10,
        density in 0.0f64..0.4,
        seed in any::<u64>(),
    ) {
        let mut grid = random_grid(width, height, density, seed);
        let config = SearchConfig::default();
        let ucs = run(&mut grid, Algorithm::Ucs, &config);
        let bfs = run(&mut grid, Algorithm::Bfs, &config);
        let dfs = run(&mut grid, Algorithm::Dfs, &config);

        prop_assert_eq!(ucs.found, bfs.found);
        prop_assert_eq!(dfs.found, bfs.found);
        if ucs.found {
            prop_assert!(ucs.metrics.path_cost <= bfs.metrics.path_cost + 1e-9);
            prop_assert!(ucs.metrics.path_cost <= dfs.metrics.path_cost + 1e-9);
            prop_assert!(is_valid_path(&dfs.path, grid.start(), grid.target()));
        }
    }

    #[test]
    fn explored_cells_are_distinct_and_traversable(
        width in 3usize..8,
        height in 3usize..8,
        density in 0.0f64..0.3,
        seed in any::<u64>(),
    ) {
        let mut grid = random_grid(width, height, density, seed);
        for algorithm in Algorithm::ALL {
            let result = run(&mut grid, algorithm, &SearchConfig::default());
            let mut cells = result.explored.clone();
            cells.sort();
            cells.dedup();
            prop_assert_eq!(cells.len(), result.explored.len());
            prop_assert!(result.explored.iter().all(|&cell| grid.is_traversable(cell)));
            prop_assert!(result.metrics.nodes_explored >= result.explored.len());
        }
    }
}
