use crate::piece::{ColorId, Rotation, TetrominoType};

// ============================================================================
// Configuration
// ============================================================================

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellState {
    #[default]
    Empty,
    Filled(TetrominoType),
}

impl CellState {
    pub fn is_empty(self) -> bool {
        self == CellState::Empty
    }

    pub fn color_id(self) -> ColorId {
        match self {
            CellState::Empty => 0,
            CellState::Filled(piece) => piece.color(),
        }
    }
}

pub type Row = [CellState; BOARD_WIDTH];

/// Locked cells of the playfield. Row 0 is the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    rows: [Row; BOARD_HEIGHT],
}

fn in_bounds(x: i16, y: i16) -> bool {
    x >= 0 && (x as usize) < BOARD_WIDTH && y >= 0 && (y as usize) < BOARD_HEIGHT
}

fn row_full(row: &Row) -> bool {
    row.iter().all(|cell| !cell.is_empty())
}

// ============================================================================
// Board Logic
// ============================================================================

impl Board {
    pub fn new() -> Self {
        Self {
            rows: [[CellState::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn clear_all(&mut self) {
        self.rows = [[CellState::Empty; BOARD_WIDTH]; BOARD_HEIGHT];
    }

    /// True if the piece placed with its origin at (x, y) would leave the side
    /// walls, pass the floor, or overlap a locked cell. Cells above row 0 are
    /// allowed so pieces can spawn partly out of view.
    pub fn collides(&self, piece: TetrominoType, rotation: Rotation, x: i16, y: i16) -> bool {
        for &(dx, dy) in piece.shape(rotation) {
            let bx = x + dx;
            let by = y + dy;

            if bx < 0 || bx as usize >= BOARD_WIDTH {
                return true;
            }
            if by >= BOARD_HEIGHT as i16 {
                return true;
            }
            if by < 0 {
                continue;
            }
            if !self.rows[by as usize][bx as usize].is_empty() {
                return true;
            }
        }
        false
    }

    /// Writes the piece into the board. Cells outside the board are dropped.
    pub fn lock(&mut self, piece: TetrominoType, rotation: Rotation, x: i16, y: i16) {
        for &(dx, dy) in piece.shape(rotation) {
            let bx = x + dx;
            let by = y + dy;
            if in_bounds(bx, by) {
                self.rows[by as usize][bx as usize] = CellState::Filled(piece);
            }
        }
    }

    /// Removes every full row and lets the rows above fall into place.
    /// Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut compacted = [[CellState::Empty; BOARD_WIDTH]; BOARD_HEIGHT];
        let mut write = BOARD_HEIGHT;
        let mut cleared = 0;

        for row in self.rows.iter().rev() {
            if row_full(row) {
                cleared += 1;
            } else {
                write -= 1;
                compacted[write] = *row;
            }
        }

        if cleared > 0 {
            self.rows = compacted;
        }
        cleared
    }

    /// Color at (x, y), or 0 when the coordinate is off the board.
    pub fn cell_at(&self, x: i16, y: i16) -> ColorId {
        self.cell(x, y).color_id()
    }

    pub fn cell(&self, x: i16, y: i16) -> CellState {
        if in_bounds(x, y) {
            self.rows[y as usize][x as usize]
        } else {
            CellState::Empty
        }
    }

    /// Writes a single cell. Off-board coordinates are ignored.
    pub fn set(&mut self, x: i16, y: i16, cell: CellState) {
        if in_bounds(x, y) {
            self.rows[y as usize][x as usize] = cell;
        }
    }

    /// Whether anything occupies the 2x2 block at the top center.
    ///
    /// Diagnostic only: game over is decided by `collides` on the spawned
    /// piece, not by this check.
    pub fn spawn_area_blocked(&self) -> bool {
        let left = BOARD_WIDTH / 2 - 1;
        self.rows[..2]
            .iter()
            .any(|row| row[left..left + 2].iter().any(|cell| !cell.is_empty()))
    }

    pub fn rows(&self) -> &[Row; BOARD_HEIGHT] {
        &self.rows
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        row_full(&self.rows[y])
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|cell| !cell.is_empty()).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn fill_row(board: &mut Board, y: usize) {
        for x in 0..BOARD_WIDTH {
            board.set(x as i16, y as i16, CellState::Filled(TetrominoType::T));
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: usize, gap_x: usize) {
        for x in 0..BOARD_WIDTH {
            if x != gap_x {
                board.set(x as i16, y as i16, CellState::Filled(TetrominoType::T));
            }
        }
    }

    /// Marks each listed (x, y) cell as filled.
    pub fn fill_cells(board: &mut Board, cells: &[(i16, i16)]) {
        for &(x, y) in cells {
            board.set(x, y, CellState::Filled(TetrominoType::T));
        }
    }
}
