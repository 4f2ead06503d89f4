use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::config::GridSize;
use crate::game::{Snapshot, Termination};
use crate::input::Direction;
use crate::snake::Cell;

/// Terminal columns used per grid cell so cells come out roughly square.
const CELL_COLUMNS: u16 = 2;

const GLYPH_CELL: &str = "██";
const SNAKE_COLOR: Color = Color::Green;
const FOOD_COLOR: Color = Color::Red;
const BOARD_BG: Color = Color::Black;
const SCORE_COLOR: Color = Color::White;
const GAME_OVER_COLOR: Color = Color::Red;

/// Renders one frame from a snapshot. Never touches game state.
pub fn render(frame: &mut Frame<'_>, snapshot: &Snapshot, grid: GridSize) {
    let area = frame.area();
    let Some(board) = board_area(area, grid) else {
        render_too_small(frame, area, grid);
        return;
    };

    let score_text = format!("Score: {}", snapshot.score);
    let score_row = Rect {
        y: board.y.saturating_sub(1),
        height: 1,
        ..board
    };
    frame.buffer_mut().set_string(
        centered_x(score_row, &score_text),
        score_row.y,
        &score_text,
        Style::new().fg(SCORE_COLOR).add_modifier(Modifier::BOLD),
    );

    let block = Block::bordered().style(Style::new().bg(BOARD_BG));
    let inner = block.inner(board);
    frame.render_widget(block, board);

    if !snapshot.running {
        render_game_over(frame, inner, snapshot.termination);
        return;
    }

    let buffer = frame.buffer_mut();
    if let Some((x, y)) = cell_to_terminal(inner, grid, snapshot.food) {
        buffer.set_string(x, y, GLYPH_CELL, Style::new().fg(FOOD_COLOR).bg(BOARD_BG));
    }
    for (index, cell) in snapshot.snake_cells.iter().enumerate() {
        let Some((x, y)) = cell_to_terminal(inner, grid, *cell) else {
            continue;
        };
        let glyph = if index == 0 {
            head_glyph(snapshot.direction)
        } else {
            GLYPH_CELL
        };
        buffer.set_string(x, y, glyph, Style::new().fg(SNAKE_COLOR).bg(BOARD_BG));
    }
}

fn head_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "▲▲",
        Direction::Down => "▼▼",
        Direction::Left => "◀█",
        Direction::Right => "█▶",
    }
}

fn termination_text(termination: Option<Termination>) -> &'static str {
    match termination {
        Some(Termination::Wall) => "Hit the wall",
        Some(Termination::SelfCollision) => "Ran into yourself",
        Some(Termination::BoardFilled) => "Board filled!",
        None => "",
    }
}

fn render_game_over(frame: &mut Frame<'_>, inner: Rect, termination: Option<Termination>) {
    let message = "Game Over";
    let cause = termination_text(termination);
    let hint = "[Q]/[Esc] Quit";
    let middle = inner.y + inner.height / 2;

    let buffer = frame.buffer_mut();
    buffer.set_string(
        centered_x(inner, message),
        middle,
        message,
        Style::new()
            .fg(GAME_OVER_COLOR)
            .bg(BOARD_BG)
            .add_modifier(Modifier::BOLD),
    );
    if middle + 1 < inner.bottom() && !cause.is_empty() {
        buffer.set_string(
            centered_x(inner, cause),
            middle + 1,
            cause,
            Style::new().fg(SCORE_COLOR).bg(BOARD_BG),
        );
    }
    if middle + 2 < inner.bottom() {
        buffer.set_string(
            centered_x(inner, hint),
            middle + 2,
            hint,
            Style::new().fg(Color::DarkGray).bg(BOARD_BG),
        );
    }
}

fn render_too_small(frame: &mut Frame<'_>, area: Rect, grid: GridSize) {
    let (width, height) = required_size(grid);
    let message = format!("Terminal too small: need {width}x{height}");
    frame.render_widget(Paragraph::new(message), area);
}

/// Terminal size needed for the board, its border and the score row.
#[must_use]
pub fn required_size(grid: GridSize) -> (u16, u16) {
    (
        grid.columns.saturating_mul(CELL_COLUMNS).saturating_add(2),
        grid.rows.saturating_add(3),
    )
}

/// Bordered board rectangle centered in `area`, below the score row.
fn board_area(area: Rect, grid: GridSize) -> Option<Rect> {
    let (width, height) = required_size(grid);
    if width > area.width || height > area.height {
        return None;
    }

    Some(Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2 + 1,
        width,
        height: height - 1,
    })
}

fn centered_x(area: Rect, text: &str) -> u16 {
    let text_width = u16::try_from(text.width()).unwrap_or(u16::MAX);
    area.x + area.width.saturating_sub(text_width) / 2
}

fn cell_to_terminal(inner: Rect, grid: GridSize, cell: Cell) -> Option<(u16, u16)> {
    if !grid.contains(cell) {
        return None;
    }

    let x = inner
        .x
        .saturating_add(u16::try_from(cell.x).ok()?.saturating_mul(CELL_COLUMNS));
    let y = inner.y.saturating_add(u16::try_from(cell.y).ok()?);
    if x >= inner.right() || y >= inner.bottom() {
        return None;
    }

    Some((x, y))
}
