use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use classic_snake::clock::TickClock;
use classic_snake::config::GameConfig;
use classic_snake::food::FoodPolicy;
use classic_snake::game::{Controller, TickOutcome};
use classic_snake::input::GameInput;
use classic_snake::terminal_runtime::TerminalSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "classic-snake", version, about = "Classic grid Snake in the terminal")]
struct Cli {
    /// JSON config file; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board width in board units.
    #[arg(long)]
    width: Option<u32>,

    /// Board height in board units.
    #[arg(long)]
    height: Option<u32>,

    /// Edge length of one cell in board units.
    #[arg(long = "cell-size")]
    cell_size: Option<u32>,

    /// Milliseconds between ticks.
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Seed for food placement, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Never place food on the snake.
    #[arg(long = "avoid-snake-food")]
    avoid_snake_food: bool,

    /// Write tracing output to this file (filtered by RUST_LOG).
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<GameConfig> {
        let mut config = GameConfig::load_or_default(self.config.as_deref())?;

        if let Some(width) = self.width {
            config.board_width = width;
        }
        if let Some(height) = self.height {
            config.board_height = height;
        }
        if let Some(cell_size) = self.cell_size {
            config.cell_size = cell_size;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if self.avoid_snake_food {
            config.food_policy = FoodPolicy::AvoidSnake;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    let config = cli.resolve_config()?;
    let controller = match cli.seed {
        Some(seed) => Controller::with_seed(&config, seed),
        None => Controller::new(&config),
    }
    .context("invalid game configuration")?;

    info!(?config, seed = ?cli.seed, "configuration resolved");

    let mut session =
        TerminalSession::enter(controller.grid()).context("failed to set up terminal")?;
    run(&mut session, controller, config.tick_interval())
}

fn run(session: &mut TerminalSession, mut controller: Controller, interval: Duration) -> Result<()> {
    let mut clock = TickClock::start(interval, Instant::now());

    loop {
        session.draw(&controller.snapshot())?;

        match session.next_input(&clock)? {
            Some(GameInput::Quit) => break,
            Some(GameInput::Direction(direction)) => controller.set_pending_direction(direction),
            None => {}
        }

        if clock.due(Instant::now())
            && matches!(controller.tick(), TickOutcome::Terminated(_))
        {
            clock.stop();
        }
    }

    let snapshot = controller.snapshot();
    info!(
        score = snapshot.score,
        length = snapshot.snake_cells.len(),
        ticks = snapshot.tick_count,
        termination = ?snapshot.termination,
        "session ended"
    );

    Ok(())
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
