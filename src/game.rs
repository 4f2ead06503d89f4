use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, GameConfig, GridSize};
use crate::food::{FoodPolicy, spawn_with_policy};
use crate::input::{Direction, direction_change_is_valid};
use crate::snake::{Cell, SEED_HEAD, Snake};

/// Why a run ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Termination {
    /// The head left the grid.
    Wall,
    /// The head ran into the body.
    SelfCollision,
    /// No free cell was left for food under [`FoodPolicy::AvoidSnake`].
    BoardFilled,
}

/// Result of one [`Controller::tick`] call.
///
/// `Terminated` is returned exactly once, on the tick that ended the run;
/// callers use it as the signal to stop their clock.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TickOutcome {
    Moved,
    Grew,
    Terminated(Termination),
    Idle,
}

/// Rejected controller setups.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("snake segment ({}, {}) lies outside the grid", cell.x, cell.y)]
    SegmentOutOfBounds { cell: Cell },

    #[error("snake segment ({}, {}) appears more than once", cell.x, cell.y)]
    DuplicateSegment { cell: Cell },

    #[error("food ({}, {}) lies outside the grid", cell.x, cell.y)]
    FoodOutOfBounds { cell: Cell },
}

/// Complete game state for one run. Only [`Controller`] mutates it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GameState {
    snake: Snake,
    food: Cell,
    pending_direction: Direction,
    score: u32,
    running: bool,
    termination: Option<Termination>,
    tick_count: u64,
}

impl GameState {
    fn new(snake: Snake, food: Cell) -> Self {
        Self {
            pending_direction: snake.direction(),
            snake,
            food,
            score: 0,
            running: true,
            termination: None,
            tick_count: 0,
        }
    }

    #[must_use]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[must_use]
    pub fn food(&self) -> Cell {
        self.food
    }

    #[must_use]
    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Number of ticks processed while running, the terminating one included.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Owned, read-only view of a [`GameState`] for rendering.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Snapshot {
    pub snake_cells: Vec<Cell>,
    pub food: Cell,
    pub score: u32,
    pub running: bool,
    pub direction: Direction,
    pub termination: Option<Termination>,
    pub tick_count: u64,
}

/// Tick-driven state machine that owns one run of the game.
#[derive(Debug, Clone)]
pub struct Controller<R = StdRng> {
    grid: GridSize,
    food_policy: FoodPolicy,
    state: GameState,
    rng: R,
}

impl Controller<StdRng> {
    /// Starts a run with an entropy-seeded random source.
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Starts a reproducible run for tests and replays.
    pub fn with_seed(config: &GameConfig, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Controller<R> {
    /// Starts a run with the seeded snake and a freshly spawned food.
    pub fn with_rng(config: &GameConfig, mut rng: R) -> Result<Self, GameError> {
        let grid = config.validate()?;
        let snake = Snake::seed();

        let board_too_small = || ConfigError::BoardTooSmall {
            columns: grid.columns,
            rows: grid.rows,
            needed_columns: (SEED_HEAD.x + 1) as u16,
            needed_rows: (SEED_HEAD.y + 1) as u16,
        };
        if !snake.segments().all(|cell| grid.contains(*cell)) {
            return Err(board_too_small().into());
        }

        let food = spawn_with_policy(&mut rng, grid, &snake, config.food_policy)
            .ok_or_else(board_too_small)?;

        info!(
            columns = grid.columns,
            rows = grid.rows,
            food_policy = ?config.food_policy,
            "game started"
        );

        Ok(Self {
            grid,
            food_policy: config.food_policy,
            state: GameState::new(snake, food),
            rng,
        })
    }

    /// Starts a run from an explicit snake and food placement.
    ///
    /// The layout must satisfy the running invariants: every segment inside
    /// the grid, no repeated segment, food inside the grid.
    pub fn with_layout(
        config: &GameConfig,
        snake: Snake,
        food: Cell,
        rng: R,
    ) -> Result<Self, GameError> {
        let grid = config.validate()?;

        let mut seen = HashSet::with_capacity(snake.len());
        for &cell in snake.segments() {
            if !grid.contains(cell) {
                return Err(GameError::SegmentOutOfBounds { cell });
            }
            if !seen.insert(cell) {
                return Err(GameError::DuplicateSegment { cell });
            }
        }
        if !grid.contains(food) {
            return Err(GameError::FoodOutOfBounds { cell: food });
        }

        Ok(Self {
            grid,
            food_policy: config.food_policy,
            state: GameState::new(snake, food),
            rng,
        })
    }

    /// Advances the run by one step.
    ///
    /// Commits the pending direction unless it reverses the current one,
    /// then moves, grows or ends the run. After the run has ended every call
    /// is a no-op returning [`TickOutcome::Idle`].
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running {
            return TickOutcome::Idle;
        }

        self.state.tick_count += 1;

        let committed = self.state.snake.direction();
        let direction = if direction_change_is_valid(committed, self.state.pending_direction) {
            self.state.pending_direction
        } else {
            trace!(?committed, pending = ?self.state.pending_direction, "reversal ignored");
            self.state.pending_direction = committed;
            committed
        };
        self.state.snake.set_direction(direction);

        let new_head = self.state.snake.advance(direction);

        if !self.grid.contains(new_head) {
            return self.terminate(Termination::Wall);
        }

        if self.state.snake.would_collide_with_self(new_head) {
            return self.terminate(Termination::SelfCollision);
        }

        if new_head != self.state.food {
            self.state.snake.commit_move(new_head);
            return TickOutcome::Moved;
        }

        self.state.score += 1;
        self.state.snake.commit_growth(new_head);

        let Some(food) = spawn_with_policy(
            &mut self.rng,
            self.grid,
            &self.state.snake,
            self.food_policy,
        ) else {
            return self.terminate(Termination::BoardFilled);
        };
        self.state.food = food;

        debug!(
            score = self.state.score,
            length = self.state.snake.len(),
            food_x = food.x,
            food_y = food.y,
            "food eaten"
        );

        TickOutcome::Grew
    }

    /// Records the direction to apply on the next tick. The last call wins.
    pub fn set_pending_direction(&mut self, direction: Direction) {
        self.state.pending_direction = direction;
    }

    /// Returns an owned copy of the renderable state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake_cells: self.state.snake.segments().copied().collect(),
            food: self.state.food,
            score: self.state.score,
            running: self.state.running,
            direction: self.state.snake.direction(),
            termination: self.state.termination,
            tick_count: self.state.tick_count,
        }
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    fn terminate(&mut self, cause: Termination) -> TickOutcome {
        self.state.running = false;
        self.state.termination = Some(cause);

        info!(
            ?cause,
            score = self.state.score,
            length = self.state.snake.len(),
            ticks = self.state.tick_count,
            "game over"
        );

        TickOutcome::Terminated(cause)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::config::{ConfigError, GameConfig};
    use crate::food::FoodPolicy;
    use crate::input::Direction;
    use crate::snake::{Cell, Snake};

    use super::{Controller, GameError, Termination, TickOutcome};

    fn snake(raw: &[(i32, i32)], direction: Direction) -> Snake {
        let segments = raw.iter().map(|&(x, y)| Cell { x, y }).collect();
        Snake::from_segments(segments, direction).expect("test snake is non-empty")
    }

    fn controller(columns: u16, rows: u16, snake: Snake, food: Cell) -> Controller {
        Controller::with_layout(
            &GameConfig::with_cells(columns, rows),
            snake,
            food,
            StdRng::seed_from_u64(1),
        )
        .expect("test layout is valid")
    }

    #[test]
    fn new_game_starts_with_seed_snake() {
        let game = Controller::with_seed(&GameConfig::default(), 5).expect("defaults are valid");
        let snapshot = game.snapshot();

        assert!(snapshot.running);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.snake_cells.len(), 3);
        assert_eq!(snapshot.snake_cells[0], Cell { x: 4, y: 5 });
        assert_eq!(snapshot.direction, Direction::Right);
        assert!(game.grid().contains(snapshot.food));
    }

    #[test]
    fn ordinary_move_keeps_length() {
        let mut game = controller(
            10,
            10,
            snake(&[(2, 2), (1, 2), (0, 2)], Direction::Right),
            Cell { x: 7, y: 7 },
        );

        assert_eq!(game.tick(), TickOutcome::Moved);

        let snapshot = game.snapshot();
        assert_eq!(
            snapshot.snake_cells,
            vec![Cell { x: 3, y: 2 }, Cell { x: 2, y: 2 }, Cell { x: 1, y: 2 }]
        );
        assert_eq!(snapshot.food, Cell { x: 7, y: 7 });
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn eating_food_grows_scores_and_respawns() {
        let mut game = controller(
            10,
            10,
            snake(&[(2, 2), (1, 2), (0, 2)], Direction::Right),
            Cell { x: 3, y: 2 },
        );

        assert_eq!(game.tick(), TickOutcome::Grew);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.snake_cells.len(), 4);
        assert_eq!(snapshot.snake_cells[0], Cell { x: 3, y: 2 });
        assert_eq!(snapshot.snake_cells[3], Cell { x: 0, y: 2 });
        assert!(game.grid().contains(snapshot.food));
    }

    #[test]
    fn respawn_draws_from_the_injected_rng() {
        let layout = || snake(&[(2, 2), (1, 2), (0, 2)], Direction::Right);
        let config = GameConfig::with_cells(10, 10);
        let food = Cell { x: 3, y: 2 };

        let mut first =
            Controller::with_layout(&config, layout(), food, StdRng::seed_from_u64(99))
                .expect("valid layout");
        let mut second =
            Controller::with_layout(&config, layout(), food, StdRng::seed_from_u64(99))
                .expect("valid layout");
        first.tick();
        second.tick();

        let mut reference = StdRng::seed_from_u64(99);
        let grid = config.grid().expect("valid config");
        let expected = crate::food::spawn(&mut reference, grid);

        assert_eq!(first.snapshot().food, second.snapshot().food);
        assert_eq!(first.snapshot().food, expected);
    }

    #[test]
    fn wall_collision_terminates_without_moving() {
        let mut game = controller(
            4,
            4,
            snake(&[(3, 0), (2, 0), (1, 0)], Direction::Right),
            Cell { x: 0, y: 3 },
        );
        let before = game.snapshot().snake_cells;

        assert_eq!(game.tick(), TickOutcome::Terminated(Termination::Wall));

        let snapshot = game.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.snake_cells, before);
        assert_eq!(snapshot.termination, Some(Termination::Wall));
    }

    #[test]
    fn self_collision_terminates() {
        let mut game = controller(
            6,
            6,
            snake(&[(2, 2), (1, 2), (1, 1), (2, 1)], Direction::Down),
            Cell { x: 5, y: 5 },
        );

        game.set_pending_direction(Direction::Left);

        assert_eq!(
            game.tick(),
            TickOutcome::Terminated(Termination::SelfCollision)
        );
        assert!(!game.is_running());
    }

    #[test]
    fn moving_into_current_tail_is_a_collision() {
        let mut game = controller(
            6,
            6,
            snake(&[(1, 2), (2, 2), (2, 1), (1, 1)], Direction::Left),
            Cell { x: 5, y: 5 },
        );

        game.set_pending_direction(Direction::Up);

        assert_eq!(
            game.tick(),
            TickOutcome::Terminated(Termination::SelfCollision)
        );
    }

    #[test]
    fn reversal_is_rejected_at_tick() {
        let mut game = controller(
            10,
            10,
            snake(&[(2, 2), (1, 2), (0, 2)], Direction::Right),
            Cell { x: 7, y: 7 },
        );

        game.set_pending_direction(Direction::Left);
        game.tick();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.direction, Direction::Right);
        assert_eq!(snapshot.snake_cells[0], Cell { x: 3, y: 2 });
        assert_eq!(game.state().pending_direction(), Direction::Right);
    }

    #[test]
    fn last_pending_direction_wins() {
        let mut game = controller(
            10,
            10,
            snake(&[(2, 2), (1, 2), (0, 2)], Direction::Right),
            Cell { x: 7, y: 7 },
        );

        game.set_pending_direction(Direction::Up);
        game.set_pending_direction(Direction::Left);
        game.tick();

        // Left reverses the committed Right, so the earlier Up is lost too.
        assert_eq!(game.snapshot().snake_cells[0], Cell { x: 3, y: 2 });

        game.set_pending_direction(Direction::Left);
        game.set_pending_direction(Direction::Down);
        game.tick();

        assert_eq!(game.snapshot().snake_cells[0], Cell { x: 3, y: 3 });
        assert_eq!(game.snapshot().direction, Direction::Down);
    }

    #[test]
    fn ticks_after_termination_are_idle() {
        let mut game = controller(
            4,
            4,
            snake(&[(3, 0), (2, 0), (1, 0)], Direction::Right),
            Cell { x: 0, y: 3 },
        );
        game.tick();
        let terminal = game.state().clone();

        game.set_pending_direction(Direction::Down);
        for _ in 0..5 {
            assert_eq!(game.tick(), TickOutcome::Idle);
        }

        assert_eq!(game.state().snake(), terminal.snake());
        assert_eq!(game.state().food(), terminal.food());
        assert_eq!(game.state().score(), terminal.score());
        assert_eq!(game.state().tick_count(), terminal.tick_count());
        assert!(!game.is_running());
    }

    #[test]
    fn avoid_snake_policy_ends_run_when_board_fills() {
        let config = GameConfig {
            food_policy: FoodPolicy::AvoidSnake,
            ..GameConfig::with_cells(2, 2)
        };
        let mut game = Controller::with_layout(
            &config,
            snake(&[(0, 1), (0, 0), (1, 0)], Direction::Down),
            Cell { x: 1, y: 1 },
            StdRng::seed_from_u64(4),
        )
        .expect("valid layout");

        game.set_pending_direction(Direction::Right);

        assert_eq!(
            game.tick(),
            TickOutcome::Terminated(Termination::BoardFilled)
        );
        assert_eq!(game.snapshot().score, 1);
        assert_eq!(game.snapshot().snake_cells.len(), 4);
    }

    #[test]
    fn avoid_snake_policy_starts_on_the_largest_grid() {
        let config = GameConfig {
            food_policy: FoodPolicy::AvoidSnake,
            ..GameConfig::with_cells(u16::MAX, u16::MAX)
        };
        assert!(config.validate().is_ok());

        let game = Controller::with_seed(&config, 1).expect("largest grid is valid");
        let snapshot = game.snapshot();

        assert!(game.grid().contains(snapshot.food));
        assert!(!snapshot.snake_cells.contains(&snapshot.food));
    }

    #[test]
    fn default_policy_may_respawn_food_under_the_snake() {
        // On a 4x1 strip the grown snake covers three of four cells, so most
        // seeds redraw the food onto the body.
        let lands_on_body = |seed: u64| {
            let mut game = Controller::with_layout(
                &GameConfig::with_cells(4, 1),
                snake(&[(1, 0), (0, 0)], Direction::Right),
                Cell { x: 2, y: 0 },
                StdRng::seed_from_u64(seed),
            )
            .expect("valid layout");

            assert_eq!(game.tick(), TickOutcome::Grew);
            let snapshot = game.snapshot();
            snapshot.snake_cells.contains(&snapshot.food)
        };

        assert!((0..32).any(lands_on_body));
    }

    #[test]
    fn small_board_cannot_hold_seed() {
        let result = Controller::with_seed(&GameConfig::with_cells(4, 4), 1);

        assert!(matches!(
            result,
            Err(GameError::Config(ConfigError::BoardTooSmall {
                needed_columns: 5,
                needed_rows: 6,
                ..
            }))
        ));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let config = GameConfig::with_cells(4, 4);
        let rng = || StdRng::seed_from_u64(0);

        assert!(matches!(
            Controller::with_layout(
                &config,
                snake(&[(4, 0), (3, 0)], Direction::Right),
                Cell { x: 0, y: 0 },
                rng(),
            ),
            Err(GameError::SegmentOutOfBounds { .. })
        ));
        assert!(matches!(
            Controller::with_layout(
                &config,
                snake(&[(1, 0), (0, 0), (1, 0)], Direction::Right),
                Cell { x: 3, y: 3 },
                rng(),
            ),
            Err(GameError::DuplicateSegment { cell: Cell { x: 1, y: 0 } })
        ));
        assert!(matches!(
            Controller::with_layout(
                &config,
                snake(&[(1, 0)], Direction::Right),
                Cell { x: 0, y: 4 },
                rng(),
            ),
            Err(GameError::FoodOutOfBounds { .. })
        ));
    }
}
