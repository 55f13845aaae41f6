use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{self, stdout, Stdout, Write},
    time::{Duration, Instant},
};

use ntris::board::{CellState, BOARD_HEIGHT, BOARD_WIDTH};
use ntris::game::{Game, GameEvent, GameState, MAX_START_LEVEL, MIN_START_LEVEL};
use ntris::piece::{Rotation, TetrominoType};

// ============================================================================
// Command Line
// ============================================================================

/// NES-style falling-block puzzle for the terminal.
#[derive(Debug, Parser)]
#[command(name = "ntris", version, about)]
struct Args {
    /// Level preselected on the start screen.
    #[arg(short, long, default_value_t = 1, value_parser = value_parser!(u32).range(1..=10))]
    level: u32,

    /// Seed for the piece sequence. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Target frames per second.
    #[arg(long, default_value_t = 60, value_parser = value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Do not ring the terminal bell on line clears.
    #[arg(long)]
    no_bell: bool,
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const GHOST_CHAR: &str = "[]";
const EMPTY_CHAR: &str = "··";

// Longest frame handed to the game, so a stall never skips rows.
const MAX_DELTA_SECS: f64 = 0.1;

// ============================================================================
// Color Mapping
// ============================================================================

fn tetromino_color(t: TetrominoType) -> Color {
    match t {
        TetrominoType::I => Color::Cyan,
        TetrominoType::O => Color::Yellow,
        TetrominoType::T => Color::Magenta,
        TetrominoType::S => Color::Green,
        TetrominoType::Z => Color::Red,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0),
    }
}

// ============================================================================
// Frame Timing
// ============================================================================

struct FrameTimer {
    frame: Duration,
    last_tick: Instant,
}

impl FrameTimer {
    fn new(fps: u32) -> Self {
        Self {
            frame: Duration::from_secs_f64(1.0 / fps as f64),
            last_tick: Instant::now(),
        }
    }

    fn until_next_frame(&self) -> Duration {
        self.frame.saturating_sub(self.last_tick.elapsed())
    }

    fn frame_due(&self) -> bool {
        self.last_tick.elapsed() >= self.frame
    }

    /// Seconds since the previous tick, capped at `MAX_DELTA_SECS`.
    fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        delta.min(MAX_DELTA_SECS)
    }
}

// ============================================================================
// App
// ============================================================================

struct App {
    game: Game,
    selected_level: u32,
    bell: bool,
}

enum Flow {
    Continue,
    Quit,
}

impl App {
    fn handle_key(&mut self, code: KeyCode) -> Flow {
        match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            KeyCode::Char('p') | KeyCode::Char('P') => self.game.toggle_pause(),
            _ => match self.game.state() {
                GameState::StartScreen => self.handle_start_key(code),
                GameState::Playing => self.handle_play_key(code),
                GameState::GameOver => {
                    if code == KeyCode::Enter {
                        self.game.initialize();
                    }
                }
                GameState::Paused => {}
            },
        }
        Flow::Continue
    }

    fn handle_start_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Down => {
                self.selected_level = self.selected_level.saturating_sub(1).max(MIN_START_LEVEL);
            }
            KeyCode::Right | KeyCode::Up => {
                self.selected_level = (self.selected_level + 1).min(MAX_START_LEVEL);
            }
            KeyCode::Enter => {
                self.game.begin(self.selected_level);
            }
            _ => {}
        }
    }

    fn handle_play_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => {
                self.game.move_left();
            }
            KeyCode::Right => {
                self.game.move_right();
            }
            KeyCode::Down => {
                self.game.move_down();
            }
            KeyCode::Up => {
                self.game.rotate();
            }
            KeyCode::Char(' ') => {
                self.game.hard_drop();
            }
            _ => {}
        }
    }

    fn drain_events(&mut self) -> io::Result<()> {
        let cleared = self
            .game
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::LinesCleared(_)));
        if cleared && self.bell {
            let mut out = stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();

    match app.game.state() {
        GameState::StartScreen => render_start_screen(frame, app, area),
        GameState::Playing => render_game(frame, &app.game, area),
        GameState::Paused => render_paused(frame, &app.game, area),
        GameState::GameOver => render_game_over(frame, &app.game, area),
    }
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let grid_display_width = (BOARD_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = BOARD_HEIGHT as u16 + 2;
    let side_width = 16;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Next / Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).split(horizontal[1]);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game, side[0]);
    render_info(frame, game, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→: Move | ↑: Rotate | ↓: Soft Drop | Space: Hard Drop | P: Pause | Q: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ntris ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visual_grid = game.render_grid();

    let piece = *game.current_piece();
    let ghost_y = game.ghost_y();
    let ghost = if game.state() == GameState::Playing && ghost_y != piece.position.y {
        let mut landed = piece;
        landed.position.y = ghost_y;
        Some(landed.blocks())
    } else {
        None
    };

    let mut lines: Vec<Line> = Vec::new();

    for (y, row) in visual_grid.iter().enumerate() {
        let mut spans: Vec<Span> = Vec::new();

        for (x, cell) in row.iter().enumerate() {
            let is_ghost = ghost.as_ref().is_some_and(|blocks| {
                blocks
                    .iter()
                    .any(|b| b.x == x as i16 && b.y == y as i16)
            });

            let (symbol, style) = match *cell {
                CellState::Filled(piece_type) => {
                    (BLOCK_CHAR, Style::default().fg(tetromino_color(piece_type)))
                }
                CellState::Empty if is_ghost => (
                    GHOST_CHAR,
                    Style::default()
                        .fg(tetromino_color(piece.tetromino_type))
                        .add_modifier(Modifier::DIM),
                ),
                CellState::Empty => (EMPTY_CHAR, Style::default().fg(Color::DarkGray)),
            };

            spans.push(Span::styled(symbol, style));
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

fn render_preview(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if game.is_over() {
        return;
    }

    let next = game.next_piece();
    let shape = next.shape(Rotation::R0);
    let color = tetromino_color(next);

    let mut lines: Vec<Line> = Vec::new();
    let max_y = shape.iter().map(|(_, y)| *y).max().unwrap_or(0);

    for y in 0i16..=max_y {
        let mut spans: Vec<Span> = Vec::new();
        spans.push(Span::raw(" "));

        for x in 0i16..4i16 {
            if shape.contains(&(x, y)) {
                spans.push(Span::styled(BLOCK_CHAR, Style::default().fg(color)));
            } else {
                spans.push(Span::raw("  "));
            }
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score())),
        Line::from(""),
        Line::from(Span::styled("High Score", Style::default().fg(Color::Magenta))),
        Line::from(format!("{}", game.high_score())),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.level())),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.lines_cleared())),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_start_screen(frame: &mut Frame, app: &App, area: Rect) {
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled("N T R I S", Style::default().fg(Color::Cyan))),
        Line::from("NES-style falling blocks"),
        Line::from(""),
        Line::from(Span::styled("SELECT LEVEL", Style::default().fg(Color::Yellow))),
        Line::from(""),
    ];

    for first in [MIN_START_LEVEL, MIN_START_LEVEL + 5] {
        let spans: Vec<Span> = (first..first + 5)
            .map(|level| {
                if level == app.selected_level {
                    Span::styled(
                        format!("[{:>2}]", level),
                        Style::default().add_modifier(Modifier::REVERSED),
                    )
                } else {
                    Span::raw(format!(" {:>2} ", level))
                }
            })
            .collect();
        text.push(Line::from(spans));
    }

    text.extend([
        Line::from(""),
        Line::from(format!("High Score: {}", app.game.high_score())),
        Line::from(""),
        Line::from(Span::styled(
            "←→: Level | Enter: Start | Q: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" ntris ")
            .title_alignment(Alignment::Center),
    );

    let popup_area = centered_rect(40, 16, area);
    frame.render_widget(paragraph, popup_area);
}

fn render_game_over(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let high_line = if game.score() > 0 && game.score() == game.high_score() {
        Line::from(Span::styled(
            "NEW SESSION HIGH!",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(format!("High Score: {}", game.high_score()))
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", game.score())),
        high_line,
        Line::from(format!("Lines: {}", game.lines_cleared())),
        Line::from(format!("Level: {}", game.level())),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: Play again",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Q/ESC: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(26, 13, area);
    frame.render_widget(paragraph, popup_area);
}

fn render_paused(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Press P to resume",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Press ESC to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Paused ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(24, 10, area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Terminal Setup
// ============================================================================

/// Raw mode and the alternate screen, undone when dropped.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        // From here on a failure still drops the guard and leaves raw mode
        let mut guard = Self { out };
        guard
            .out
            .execute(EnterAlternateScreen)
            .context("failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = self.out.execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App, fps: u32) -> Result<()> {
    let mut timer = FrameTimer::new(fps);

    loop {
        terminal
            .draw(|frame| render(frame, app))
            .context("failed to draw frame")?;

        if event::poll(timer.until_next_frame())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Flow::Quit = app.handle_key(key.code) {
                        return Ok(());
                    }
                }
            }
        }

        if timer.frame_due() {
            let delta = timer.tick();
            if !app.game.is_paused() {
                app.game.update(delta);
            }
        }

        app.drain_events()?;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut app = App {
        game: Game::with_seed(seed),
        selected_level: args.level,
        bell: !args.no_bell,
    };

    let _guard = TerminalGuard::enter(stdout())?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout())).context("failed to create terminal")?;

    run(&mut terminal, &mut app, args.fps)
}
