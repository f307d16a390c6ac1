use crate::error::{PlacementReason, Result, SearchError};
use rand::Rng;
use rustc_hash::FxHashSet;
use std::f64::consts::SQRT_2;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Number of king moves between two cells.
    pub fn chebyshev(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// True when `other` is one of the eight surrounding cells.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self != other && self.chebyshev(other) == 1
    }

    fn offset(&self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.offset();
        let x = self.x.checked_add_signed(dx as isize)?;
        let y = self.y.checked_add_signed(dy as isize)?;
        Some(Position { x, y })
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Relative move from a cell, listed in expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    BottomRight,
    Left,
    TopLeft,
    TopRight,
    BottomLeft,
}

impl Direction {
    /// Expansion order shared by every strategy. Changing it changes tie-breaking.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::BottomRight,
        Direction::Left,
        Direction::TopLeft,
        Direction::TopRight,
        Direction::BottomLeft,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::BottomRight => (1, 1),
            Direction::Left => (-1, 0),
            Direction::TopLeft => (-1, -1),
            Direction::TopRight => (1, -1),
            Direction::BottomLeft => (-1, 1),
        }
    }

    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Free,
    Wall,
    DynamicObstacle,
    Start,
    Target,
}

/// Cost of a single move between adjacent cells: 1 orthogonally, √2 diagonally.
pub fn step_cost(from: Position, to: Position) -> f64 {
    if from.x != to.x && from.y != to.y {
        SQRT_2
    } else {
        1.0
    }
}

/// Total step cost along a path.
pub fn path_cost(path: &[Position]) -> f64 {
    path.windows(2).map(|pair| step_cost(pair[0], pair[1])).sum()
}

/// Dense grid of cell states, indexed `cells[x][y]`.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<CellState>>,
    start: Position,
    target: Position,
}

impl Grid {
    /// Creates an open grid. `start` may equal `target`.
    pub fn new(width: usize, height: usize, start: Position, target: Position) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SearchError::configuration(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let mut grid = Grid {
            width,
            height,
            cells: vec![vec![CellState::Free; height]; width],
            start,
            target,
        };
        for pos in [start, target] {
            if !grid.in_bounds(pos) {
                return Err(SearchError::InvalidPlacement {
                    x: pos.x,
                    y: pos.y,
                    reason: PlacementReason::OutOfBounds,
                });
            }
        }
        grid.cells[target.x][target.y] = CellState::Target;
        grid.cells[start.x][start.y] = CellState::Start;
        Ok(grid)
    }

    /// Creates a grid with an explicit wall list. Fails fast on the first bad wall.
    pub fn with_walls<I>(
        width: usize,
        height: usize,
        start: Position,
        target: Position,
        walls: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut grid = Grid::new(width, height, start, target)?;
        for wall in walls {
            grid.add_wall(wall)?;
        }
        Ok(grid)
    }

    /// Creates a grid whose free cells are walled with the given density.
    pub fn with_wall_density<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        start: Position,
        target: Position,
        density: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&density) {
            return Err(SearchError::configuration(format!(
                "wall density must be within [0, 1], got {}",
                density
            )));
        }
        let mut grid = Grid::new(width, height, start, target)?;
        let count = (grid.free_cells().len() as f64 * density).round() as usize;
        grid.add_walls_randomly(count, rng);
        Ok(grid)
    }

    /// Places up to `count` random walls, giving up after `count * 10` draws.
    /// Returns the number of walls placed.
    pub fn add_walls_randomly<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> usize {
        let mut walls_placed = 0;
        let mut attempts = 0;
        let max_attempts = count.saturating_mul(10);

        while walls_placed < count && attempts < max_attempts {
            let pos = Position {
                x: rng.gen_range(0..self.width),
                y: rng.gen_range(0..self.height),
            };
            if self.cells[pos.x][pos.y] == CellState::Free {
                self.cells[pos.x][pos.y] = CellState::Wall;
                walls_placed += 1;
            }
            attempts += 1;
        }
        walls_placed
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn state(&self, pos: Position) -> Option<CellState> {
        if self.in_bounds(pos) {
            Some(self.cells[pos.x][pos.y])
        } else {
            None
        }
    }

    /// In-bounds neighbors in the fixed eight-direction order, regardless of state.
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        self.neighbors_with(pos, true)
    }

    /// Like [`Grid::neighbors`], optionally dropping the diagonal moves.
    pub fn neighbors_with(&self, pos: Position, diagonal: bool) -> Vec<Position> {
        Direction::ALL
            .iter()
            .filter(|direction| diagonal || !direction.is_diagonal())
            .filter_map(|&direction| pos.offset(direction))
            .filter(|&next| self.in_bounds(next))
            .collect()
    }

    /// False for walls, dynamic obstacles and anything out of bounds.
    pub fn is_traversable(&self, pos: Position) -> bool {
        !matches!(
            self.state(pos),
            None | Some(CellState::Wall) | Some(CellState::DynamicObstacle)
        )
    }

    pub fn add_wall(&mut self, pos: Position) -> Result<()> {
        self.check_placement(pos)?;
        self.cells[pos.x][pos.y] = CellState::Wall;
        Ok(())
    }

    /// Marks a free cell as blocked. Returns whether the cell changed.
    pub fn spawn_dynamic_obstacle(&mut self, pos: Position) -> Result<bool> {
        self.check_placement(pos)?;
        match self.cells[pos.x][pos.y] {
            CellState::Wall => Err(SearchError::InvalidPlacement {
                x: pos.x,
                y: pos.y,
                reason: PlacementReason::Wall,
            }),
            CellState::DynamicObstacle => Ok(false),
            _ => {
                self.cells[pos.x][pos.y] = CellState::DynamicObstacle;
                Ok(true)
            }
        }
    }

    /// Frees a dynamic obstacle. Returns whether the cell changed.
    pub fn clear_dynamic_obstacle(&mut self, pos: Position) -> Result<bool> {
        self.check_placement(pos)?;
        if self.cells[pos.x][pos.y] == CellState::DynamicObstacle {
            self.cells[pos.x][pos.y] = CellState::Free;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Clears every dynamic obstacle, returning how many were removed.
    pub fn reset_dynamic_obstacles(&mut self) -> usize {
        let mut cleared = 0;
        for column in self.cells.iter_mut() {
            for cell in column.iter_mut() {
                if *cell == CellState::DynamicObstacle {
                    *cell = CellState::Free;
                    cleared += 1;
                }
            }
        }
        cleared
    }

    pub fn dynamic_obstacles(&self) -> Vec<Position> {
        self.cells_in(CellState::DynamicObstacle)
    }

    pub fn walls(&self) -> Vec<Position> {
        self.cells_in(CellState::Wall)
    }

    /// Cells in the `Free` state, column by column.
    pub fn free_cells(&self) -> Vec<Position> {
        self.cells_in(CellState::Free)
    }

    fn cells_in(&self, wanted: CellState) -> Vec<Position> {
        let mut found = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                if self.cells[x][y] == wanted {
                    found.push(Position { x, y });
                }
            }
        }
        found
    }

    fn check_placement(&self, pos: Position) -> Result<()> {
        let reason = if !self.in_bounds(pos) {
            PlacementReason::OutOfBounds
        } else if pos == self.start {
            PlacementReason::Start
        } else if pos == self.target {
            PlacementReason::Target
        } else {
            return Ok(());
        };
        Err(SearchError::InvalidPlacement {
            x: pos.x,
            y: pos.y,
            reason,
        })
    }

    /// Text picture of the grid with search overlays.
    ///
    /// Legend: `S` start, `T` target, `#` wall, `X` dynamic obstacle, `*` path,
    /// `+` frontier, `:` explored, `.` free.
    pub fn render(&self, path: &[Position], explored: &[Position], frontier: &[Position]) -> String {
        let path: FxHashSet<Position> = path.iter().copied().collect();
        let explored: FxHashSet<Position> = explored.iter().copied().collect();
        let frontier: FxHashSet<Position> = frontier.iter().copied().collect();

        let mut out = String::with_capacity((self.width * 2 + 4) * (self.height + 1));
        out.push_str("   ");
        for x in 0..self.width {
            out.push_str(&format!("{:2}", x % 10));
        }
        out.push('\n');

        for y in 0..self.height {
            out.push_str(&format!("{:2} ", y));
            for x in 0..self.width {
                let pos = Position { x, y };
                let symbol = match self.cells[x][y] {
                    CellState::Start => 'S',
                    CellState::Target => 'T',
                    CellState::Wall => '#',
                    CellState::DynamicObstacle => 'X',
                    CellState::Free if path.contains(&pos) => '*',
                    CellState::Free if frontier.contains(&pos) => '+',
                    CellState::Free if explored.contains(&pos) => ':',
                    CellState::Free => '.',
                };
                out.push(' ');
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }
}

/// True when `path` runs from `start` to `target` through adjacent cells.
pub fn is_valid_path(path: &[Position], start: Position, target: Position) -> bool {
    match (path.first(), path.last()) {
        (Some(&first), Some(&last)) if first == start && last == target => path
            .windows(2)
            .all(|pair| pair[0].is_adjacent(&pair[1])),
        _ => false,
    }
}
