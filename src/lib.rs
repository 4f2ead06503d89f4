//! Classic grid Snake.
//!
//! The library is the game state machine: grid geometry, the snake body,
//! food placement and the tick-driven [`game::Controller`]. The terminal
//! front end in `main.rs` only reads [`game::Snapshot`]s and forwards
//! directions.

pub mod clock;
pub mod config;
pub mod food;
pub mod game;
pub mod input;
pub mod renderer;
pub mod snake;
pub mod terminal_runtime;
