use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, CellState, BOARD_HEIGHT, BOARD_WIDTH};
use crate::piece::{Tetromino, TetrominoType};

// ============================================================================
// Configuration
// ============================================================================

pub const MIN_START_LEVEL: u32 = 1;
pub const MAX_START_LEVEL: u32 = 10;
pub const LINES_PER_LEVEL: u32 = 10;

// Timing (in seconds)
pub const LOCK_DELAY_SECS: f64 = 0.5;
const BASE_GRAVITY_SECS: f64 = 0.8;
const MIN_GRAVITY_SECS: f64 = 0.05;
const GRAVITY_STEP_PER_LEVEL: f64 = 0.007;

// Scoring
pub const LINE_CLEAR_SCORES: [u32; 5] = [0, 100, 300, 500, 800];
pub const SOFT_DROP_SCORE: u32 = 1;
pub const HARD_DROP_SCORE_PER_ROW: u32 = 2;

/// Offsets tried in order when rotating. The same table applies to every piece.
pub const WALL_KICKS: [(i16, i16); 6] = [(0, 0), (-1, 0), (1, 0), (0, -1), (-2, 0), (2, 0)];

/// Seconds per automatic one-row descent at `level`.
pub fn gravity_speed(level: u32) -> f64 {
    let steps = level.saturating_sub(1) as f64;
    (BASE_GRAVITY_SECS - steps * GRAVITY_STEP_PER_LEVEL).max(MIN_GRAVITY_SECS)
}

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    StartScreen,
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GameStarted,
    PieceMoved,
    PieceRotated,
    PieceLocked,
    HardDropped(u32),
    LinesCleared(u32),
    LevelUp(u32),
    Paused,
    Unpaused,
    GameOver,
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform draws from an injected random generator.
pub struct RandomPieceProvider<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomPieceProvider<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPieceProvider<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PieceProvider for RandomPieceProvider<R> {
    fn next_piece(&mut self) -> TetrominoType {
        self.rng.gen()
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    board: Board,
    state: GameState,
    current_piece: Tetromino,
    next_piece: TetrominoType,
    score: u32,
    lines_cleared: u32,
    level: u32,
    high_score: u32,
    gravity_timer: f64,
    lock_delay_timer: f64,
    grounded: bool,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

// ============================================================================
// Game Logic
// ============================================================================

impl Game {
    pub fn with_seed(seed: u64) -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::seeded(seed)))
    }

    /// A fresh session on the start screen drawing pieces from `provider`.
    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        let mut game = Self {
            board: Board::new(),
            state: GameState::StartScreen,
            current_piece: Tetromino::spawn(TetrominoType::I),
            next_piece: TetrominoType::I,
            score: 0,
            lines_cleared: 0,
            level: MIN_START_LEVEL,
            high_score: 0,
            gravity_timer: 0.0,
            lock_delay_timer: 0.0,
            grounded: false,
            piece_provider: provider,
            events: Vec::new(),
        };
        game.initialize();
        game
    }

    /// A start-screen session over a prepared board with `current_piece`
    /// active. `begin` validates the piece like any other start.
    pub fn with_board(board: Board, current_piece: Tetromino) -> Self {
        let provider = Box::new(RandomPieceProvider::seeded(0));
        Self::with_board_and_provider(board, current_piece, provider)
    }

    /// Like `with_board`, drawing later pieces from `provider`. The provider's
    /// first draw is discarded and its second becomes the next piece.
    pub fn with_board_and_provider(
        board: Board,
        current_piece: Tetromino,
        provider: Box<dyn PieceProvider>,
    ) -> Self {
        let mut game = Self::with_provider(provider);
        game.board = board;
        game.current_piece = current_piece;
        game
    }

    /// Resets to the start screen with an empty board and fresh pieces.
    /// The session high score and any uncollected events survive.
    pub fn initialize(&mut self) {
        self.board.clear_all();
        self.state = GameState::StartScreen;
        self.score = 0;
        self.lines_cleared = 0;
        self.level = MIN_START_LEVEL;
        self.gravity_timer = 0.0;
        self.lock_delay_timer = 0.0;
        self.grounded = false;

        let current = self.piece_provider.next_piece();
        self.next_piece = self.piece_provider.next_piece();
        self.current_piece = Tetromino::spawn(current);
    }

    /// Leaves the start screen at `level` (clamped to 1..=10). Returns whether
    /// the session is playing afterwards; a blocked spawn ends it at once.
    pub fn begin(&mut self, level: u32) -> bool {
        if self.state != GameState::StartScreen {
            return false;
        }
        self.level = level.clamp(MIN_START_LEVEL, MAX_START_LEVEL);
        self.state = GameState::Playing;
        self.events.push(GameEvent::GameStarted);

        if self.piece_collides(&self.current_piece) {
            self.end_game();
            return false;
        }
        true
    }

    /// Promotes the queued piece to the spawn point and queues a new one.
    /// Returns false, ending the game, when the spawned piece collides.
    pub fn spawn_next(&mut self) -> bool {
        if self.state == GameState::GameOver {
            return false;
        }
        self.current_piece = Tetromino::spawn(self.next_piece);
        self.next_piece = self.piece_provider.next_piece();
        self.grounded = false;
        self.lock_delay_timer = 0.0;

        if self.piece_collides(&self.current_piece) {
            self.end_game();
            return false;
        }
        true
    }

    /// Advances gravity and lock delay by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f64) {
        if self.state != GameState::Playing {
            return;
        }

        self.gravity_timer += delta_time;
        if self.gravity_timer >= self.gravity_speed() {
            self.gravity_timer = 0.0;
            let below = self.current_piece.moved(0, 1);
            if self.piece_collides(&below) {
                self.grounded = true;
            } else {
                self.current_piece = below;
                self.reset_lock_delay();
            }
        }

        if self.grounded || self.resting_on_stack() {
            self.grounded = true;
            self.lock_delay_timer += delta_time;
            if self.lock_delay_timer >= LOCK_DELAY_SECS {
                self.lock_and_spawn();
            }
        } else {
            self.lock_delay_timer = 0.0;
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1)
    }

    /// Soft drop: one row down for one point. Never locks.
    pub fn move_down(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let moved = self.current_piece.moved(0, 1);
        if self.piece_collides(&moved) {
            return false;
        }
        self.current_piece = moved;
        self.score += SOFT_DROP_SCORE;
        self.reset_lock_delay();
        self.events.push(GameEvent::PieceMoved);
        true
    }

    /// Rotates clockwise, taking the first kick offset that fits.
    pub fn rotate(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let rotated = self.current_piece.rotated_cw();
        let fit = WALL_KICKS
            .iter()
            .map(|&(dx, dy)| rotated.moved(dx, dy))
            .find(|candidate| !self.piece_collides(candidate));

        match fit {
            Some(piece) => {
                self.current_piece = piece;
                if !self.resting_on_stack() {
                    self.reset_lock_delay();
                }
                self.events.push(GameEvent::PieceRotated);
                true
            }
            None => false,
        }
    }

    /// Drops the piece to its landing row and locks it immediately.
    /// Returns the number of rows travelled.
    pub fn hard_drop(&mut self) -> u32 {
        if self.state != GameState::Playing {
            return 0;
        }
        let mut distance = 0;
        loop {
            let below = self.current_piece.moved(0, 1);
            if self.piece_collides(&below) {
                break;
            }
            self.current_piece = below;
            distance += 1;
        }

        self.score += HARD_DROP_SCORE_PER_ROW * distance;
        self.events.push(GameEvent::HardDropped(distance));
        self.lock_and_spawn();
        distance
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Playing;
                self.events.push(GameEvent::Unpaused);
            }
            GameState::StartScreen | GameState::GameOver => {}
        }
    }

    /// Row the active piece would lock at if hard-dropped now.
    pub fn ghost_y(&self) -> i16 {
        let mut ghost = self.current_piece;
        loop {
            let below = ghost.moved(0, 1);
            if self.piece_collides(&below) {
                return ghost.position.y;
            }
            ghost = below;
        }
    }

    fn shift(&mut self, dx: i16) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let moved = self.current_piece.moved(dx, 0);
        if self.piece_collides(&moved) {
            return false;
        }
        self.current_piece = moved;
        if !self.resting_on_stack() {
            self.reset_lock_delay();
        }
        self.events.push(GameEvent::PieceMoved);
        true
    }

    fn piece_collides(&self, piece: &Tetromino) -> bool {
        self.board.collides(
            piece.tetromino_type,
            piece.rotation,
            piece.position.x,
            piece.position.y,
        )
    }

    fn resting_on_stack(&self) -> bool {
        self.piece_collides(&self.current_piece.moved(0, 1))
    }

    fn reset_lock_delay(&mut self) {
        self.grounded = false;
        self.lock_delay_timer = 0.0;
    }

    fn lock_and_spawn(&mut self) {
        let piece = self.current_piece;
        self.board.lock(
            piece.tetromino_type,
            piece.rotation,
            piece.position.x,
            piece.position.y,
        );
        self.events.push(GameEvent::PieceLocked);

        let lines = self.board.clear_full_rows();
        if lines > 0 {
            self.add_score(lines);
        }
        self.spawn_next();
    }

    fn add_score(&mut self, lines: u32) {
        let base = LINE_CLEAR_SCORES
            .get(lines as usize)
            .copied()
            .unwrap_or(LINE_CLEAR_SCORES[4]);
        self.score += base * self.level;
        self.lines_cleared += lines;
        self.events.push(GameEvent::LinesCleared(lines));

        // Level follows total lines from here on, even below the start level.
        let new_level = 1 + self.lines_cleared / LINES_PER_LEVEL;
        if new_level > self.level {
            self.events.push(GameEvent::LevelUp(new_level));
        }
        self.level = new_level;
    }

    fn end_game(&mut self) {
        self.state = GameState::GameOver;
        self.high_score = self.high_score.max(self.score);
        self.events.push(GameEvent::GameOver);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.state == GameState::Paused
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    /// Best final score reached by any game of this session.
    pub fn high_score(&self) -> u32 {
        self.high_score.max(self.score)
    }

    pub fn next_piece(&self) -> TetrominoType {
        self.next_piece
    }

    pub fn current_piece(&self) -> &Tetromino {
        &self.current_piece
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn gravity_speed(&self) -> f64 {
        gravity_speed(self.level)
    }

    /// Returns the visual grid state with the current piece overlaid
    pub fn render_grid(&self) -> [[CellState; BOARD_WIDTH]; BOARD_HEIGHT] {
        let mut visual_grid = *self.board.rows();

        if matches!(self.state, GameState::Playing | GameState::Paused) {
            for block in self.current_piece.blocks() {
                if block.y >= 0
                    && block.y < BOARD_HEIGHT as i16
                    && block.x >= 0
                    && block.x < BOARD_WIDTH as i16
                {
                    visual_grid[block.y as usize][block.x as usize] =
                        CellState::Filled(self.current_piece.tetromino_type);
                }
            }
        }

        visual_grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
