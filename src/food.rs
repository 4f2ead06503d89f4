use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GridSize;
use crate::snake::{Cell, Snake};

/// Where replacement food may land.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoodPolicy {
    /// Any cell of the grid, including cells under the snake.
    #[default]
    Anywhere,
    /// Only cells the snake does not occupy.
    AvoidSnake,
}

/// Draws a uniformly random cell in `[0, columns) x [0, rows)`.
///
/// Snake cells are not excluded.
#[must_use]
pub fn spawn<R: Rng + ?Sized>(rng: &mut R, grid: GridSize) -> Cell {
    Cell {
        x: rng.gen_range(0..i32::from(grid.columns)),
        y: rng.gen_range(0..i32::from(grid.rows)),
    }
}

/// Random draws tried before falling back to an indexed walk of the grid.
const MAX_SPAWN_ATTEMPTS: usize = 64;

/// Draws uniformly among cells the snake does not occupy.
///
/// Rejection sampling handles the common sparse board; a crowded board falls
/// back to picking the k-th free cell in row-major order. Neither path
/// allocates per grid cell. Returns `None` when the snake fills the grid.
#[must_use]
pub fn spawn_avoiding<R: Rng + ?Sized>(rng: &mut R, grid: GridSize, snake: &Snake) -> Option<Cell> {
    let occupied: HashSet<Cell> = snake.segments().copied().collect();
    let free_cells = grid.total_cells().checked_sub(occupied.len())?;
    if free_cells == 0 {
        return None;
    }

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let cell = spawn(rng, grid);
        if !occupied.contains(&cell) {
            return Some(cell);
        }
    }

    let k = rng.gen_range(0..free_cells);
    nth_free_cell(grid, &occupied, k)
}

fn nth_free_cell(grid: GridSize, occupied: &HashSet<Cell>, k: usize) -> Option<Cell> {
    (0..i32::from(grid.rows))
        .flat_map(|y| (0..i32::from(grid.columns)).map(move |x| Cell { x, y }))
        .filter(|cell| !occupied.contains(cell))
        .nth(k)
}

/// Spawns food according to `policy`.
#[must_use]
pub fn spawn_with_policy<R: Rng + ?Sized>(
    rng: &mut R,
    grid: GridSize,
    snake: &Snake,
    policy: FoodPolicy,
) -> Option<Cell> {
    match policy {
        FoodPolicy::Anywhere => Some(spawn(rng, grid)),
        FoodPolicy::AvoidSnake => spawn_avoiding(rng, grid, snake),
    }
}
