use std::io;
use std::panic;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

use crate::clock::TickClock;
use crate::config::GridSize;
use crate::game::Snapshot;
use crate::input::{GameInput, poll_input};
use crate::renderer;

/// Longest wait for input before the next redraw.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Terminal front end for one game: owns raw mode and the alternate screen
/// and draws snapshots of a fixed grid.
///
/// Raw mode is left on drop, and also from the panic hook installed by
/// [`TerminalSession::enter`].
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    grid: GridSize,
}

impl TerminalSession {
    /// Takes over the terminal for a game on `grid`.
    ///
    /// A terminal smaller than [`renderer::required_size`] is accepted with a
    /// warning; the renderer shows a resize notice until it grows.
    pub fn enter(grid: GridSize) -> io::Result<Self> {
        install_restore_on_panic();
        enable_raw_mode()?;

        if let Err(error) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            leave_raw_screen();
            return Err(error);
        }

        let session = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(terminal) => Self { terminal, grid },
            Err(error) => {
                leave_raw_screen();
                return Err(error);
            }
        };

        if !session.fits()? {
            let (width, height) = renderer::required_size(grid);
            warn!(width, height, "terminal is smaller than the board");
        }

        Ok(session)
    }

    /// Returns true when the whole board, border and score row fit.
    pub fn fits(&self) -> io::Result<bool> {
        let size = self.terminal.size()?;
        let (width, height) = renderer::required_size(self.grid);
        Ok(size.width >= width && size.height >= height)
    }

    /// Draws one frame of `snapshot`.
    pub fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let grid = self.grid;
        self.terminal
            .draw(|frame| renderer::render(frame, snapshot, grid))?;
        Ok(())
    }

    /// Waits for input no longer than the next redraw or the next due tick.
    pub fn next_input(&self, clock: &TickClock) -> io::Result<Option<GameInput>> {
        let timeout = poll_timeout(clock, Instant::now());
        let input = poll_input(timeout)?;
        if let Some(input) = input {
            debug!(?input, "input received");
        }
        Ok(input)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        leave_raw_screen();
    }
}

/// Poll timeout capped by [`FRAME_INTERVAL`]; a stopped clock only redraws.
#[must_use]
pub fn poll_timeout(clock: &TickClock, now: Instant) -> Duration {
    clock
        .time_until_next(now)
        .map_or(FRAME_INTERVAL, |left| left.min(FRAME_INTERVAL))
}

fn install_restore_on_panic() {
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        leave_raw_screen();
        previous(panic_info);
    }));
}

fn leave_raw_screen() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
}
