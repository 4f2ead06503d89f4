use std::collections::VecDeque;

use crate::input::Direction;

/// Head of the starting snake.
pub const SEED_HEAD: Cell = Cell { x: 4, y: 5 };

/// Number of segments in the starting snake.
pub const SEED_LENGTH: usize = 3;

/// Grid position in cell units.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    /// Returns the neighbouring cell one step in `direction`.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Snake body (front is head) and its last committed direction.
///
/// Movement is split in two: [`Snake::advance`] computes the next head
/// without touching the body, and the caller commits it with either
/// [`Snake::commit_move`] or [`Snake::commit_growth`] once the collision
/// checks have passed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Snake {
    body: VecDeque<Cell>,
    direction: Direction,
}

impl Snake {
    /// Creates the starting snake: a straight body trailing left of
    /// [`SEED_HEAD`], pointed right.
    #[must_use]
    pub fn seed() -> Self {
        let body = (0..SEED_LENGTH)
            .map(|offset| Cell {
                x: SEED_HEAD.x - offset as i32,
                y: SEED_HEAD.y,
            })
            .collect();

        Self {
            body,
            direction: Direction::Right,
        }
    }

    /// Creates a snake from explicit body segments (front is head).
    ///
    /// Returns `None` when `segments` is empty.
    #[must_use]
    pub fn from_segments(segments: Vec<Cell>, direction: Direction) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            body: VecDeque::from(segments),
            direction,
        })
    }

    /// Returns the current head position.
    #[must_use]
    pub fn head(&self) -> Cell {
        // Constructors reject empty bodies and commits only ever push.
        self.body[0]
    }

    /// Returns where the head would land one step in `direction`.
    #[must_use]
    pub fn advance(&self, direction: Direction) -> Cell {
        self.head().step(direction)
    }

    /// Returns true if `new_head` hits any current segment, tail included.
    #[must_use]
    pub fn would_collide_with_self(&self, new_head: Cell) -> bool {
        self.body.contains(&new_head)
    }

    /// Pushes `new_head` and keeps the tail.
    pub fn commit_growth(&mut self, new_head: Cell) {
        self.body.push_front(new_head);
    }

    /// Pushes `new_head` and drops the tail.
    pub fn commit_move(&mut self, new_head: Cell) {
        self.body.push_front(new_head);
        self.body.pop_back();
    }

    /// Records the direction applied on the current tick.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Returns the last committed movement direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns true if any segment occupies `cell`.
    #[must_use]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Returns current segment count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true when there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Iterates over body segments from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }
}
