use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::food::FoodPolicy;
use crate::snake::Cell;

const APP_DIR_NAME: &str = "classic-snake";
const CONFIG_FILE_NAME: &str = "config.json";

/// Default board width in board units.
pub const DEFAULT_BOARD_WIDTH: u32 = 600;

/// Default board height in board units.
pub const DEFAULT_BOARD_HEIGHT: u32 = 600;

/// Default edge length of one cell in board units.
pub const DEFAULT_CELL_SIZE: u32 = 25;

/// Default tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 150;

/// Playable grid dimensions in cell units.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GridSize {
    pub columns: u16,
    pub rows: u16,
}

impl GridSize {
    /// Returns the total number of cells in the grid.
    #[must_use]
    pub fn total_cells(self) -> usize {
        usize::from(self.columns) * usize::from(self.rows)
    }

    /// Returns true when `cell` lies in `[0, columns) x [0, rows)`.
    #[must_use]
    pub fn contains(self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.x < i32::from(self.columns)
            && cell.y < i32::from(self.rows)
    }
}

/// Rejected configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroDimension { name: &'static str },

    #[error("cell size {cell_size} does not divide {name} {value}")]
    CellSizeMismatch {
        name: &'static str,
        value: u32,
        cell_size: u32,
    },

    #[error("{name} spans {cells} cells, more than the supported {}", u16::MAX)]
    GridTooLarge { name: &'static str, cells: u32 },

    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error(
        "a {columns}x{rows} grid cannot hold the starting snake (needs at least {needed_columns}x{needed_rows})"
    )]
    BoardTooSmall {
        columns: u16,
        rows: u16,
        needed_columns: u16,
        needed_rows: u16,
    },

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Construction-time game configuration.
///
/// Board dimensions are given in board units (pixels in a windowed front
/// end) and converted to cells through `cell_size`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct GameConfig {
    pub board_width: u32,
    pub board_height: u32,
    pub cell_size: u32,
    pub tick_interval_ms: u64,
    pub food_policy: FoodPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            food_policy: FoodPolicy::default(),
        }
    }
}

impl GameConfig {
    /// Creates a configuration for a `columns` x `rows` grid with unit cells.
    #[must_use]
    pub fn with_cells(columns: u16, rows: u16) -> Self {
        Self {
            board_width: u32::from(columns),
            board_height: u32::from(rows),
            cell_size: 1,
            ..Self::default()
        }
    }

    /// Validates the board geometry and returns the grid in cell units.
    pub fn grid(&self) -> Result<GridSize, ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::ZeroDimension { name: "cell size" });
        }

        Ok(GridSize {
            columns: cells_along("board width", self.board_width, self.cell_size)?,
            rows: cells_along("board height", self.board_height, self.cell_size)?,
        })
    }

    /// Runs every construction-time check.
    pub fn validate(&self) -> Result<GridSize, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        self.grid()
    }

    /// Returns the fixed interval between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Returns the platform-correct default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let mut base = dirs::config_dir()?;
        base.push(APP_DIR_NAME);
        base.push(CONFIG_FILE_NAME);
        Some(base)
    }

    /// Loads a configuration file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` when given, otherwise the default path if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

fn cells_along(name: &'static str, value: u32, cell_size: u32) -> Result<u16, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDimension { name });
    }
    if value % cell_size != 0 {
        return Err(ConfigError::CellSizeMismatch {
            name,
            value,
            cell_size,
        });
    }

    let cells = value / cell_size;
    u16::try_from(cells).map_err(|_| ConfigError::GridTooLarge { name, cells })
}
