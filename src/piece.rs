use rand::distributions::{Distribution, Standard};
use rand::Rng;

// ============================================================================
// Configuration
// ============================================================================

/// Spawn column of a shape's origin.
pub const SPAWN_X: i16 = 3;
/// Spawn row of a shape's origin.
pub const SPAWN_Y: i16 = 0;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

/// Four cell offsets relative to a piece origin. x grows right, y grows down.
pub type Shape = [(i16, i16); 4];

/// Color identifier stored in the board. 0 is empty, 1..=7 map to pieces.
pub type ColorId = u8;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TetrominoType {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

// ============================================================================
// Shape Table
// ============================================================================

/// Every shape, indexed by `[TetrominoType::index()][Rotation::index()]`.
pub static SHAPES: [[Shape; 4]; 7] = [
    // I
    [
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ],
    // O
    [
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
    ],
    // T
    [
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (1, 2)],
        [(1, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // S
    [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(1, 1), (2, 1), (0, 2), (1, 2)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // Z
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(2, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ],
    // J
    [
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ],
    // L
    [
        [(2, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
    ],
];

const NAMES: [&str; 7] = [
    "I-piece", "O-piece", "T-piece", "S-piece", "Z-piece", "J-piece", "L-piece",
];

// ============================================================================
// Catalog
// ============================================================================

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::S,
        TetrominoType::Z,
        TetrominoType::J,
        TetrominoType::L,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn shape(self, rotation: Rotation) -> &'static Shape {
        &SHAPES[self.index()][rotation.index()]
    }

    pub fn color(self) -> ColorId {
        self.index() as ColorId + 1
    }

    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }
}

impl Distribution<TetrominoType> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TetrominoType {
        TetrominoType::ALL[rng.gen_range(0..TetrominoType::ALL.len())]
    }
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Next orientation clockwise, wrapping from 270 back to 0.
    pub fn cw(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

// Raw lookups for callers holding plain integers. Out-of-range input yields a
// sentinel instead of panicking.

pub fn shape_by_index(piece: u8, rotation: u8) -> Option<&'static Shape> {
    let piece = TetrominoType::from_index(piece)?;
    let rotation = Rotation::from_index(rotation)?;
    Some(piece.shape(rotation))
}

pub fn color_by_index(piece: u8) -> ColorId {
    TetrominoType::from_index(piece).map_or(0, TetrominoType::color)
}

pub fn name_by_index(piece: u8) -> &'static str {
    TetrominoType::from_index(piece).map_or("Invalid", TetrominoType::name)
}

// ============================================================================
// Active Piece
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tetromino {
    pub tetromino_type: TetrominoType,
    pub position: Position,
    pub rotation: Rotation,
}

impl Tetromino {
    /// A piece at the spawn coordinate in its default orientation.
    pub fn spawn(tetromino_type: TetrominoType) -> Self {
        Self::new_at(tetromino_type, SPAWN_X, SPAWN_Y)
    }

    pub fn new_at(tetromino_type: TetrominoType, x: i16, y: i16) -> Self {
        Self {
            tetromino_type,
            position: Position { x, y },
            rotation: Rotation::R0,
        }
    }

    pub fn shape(&self) -> &'static Shape {
        self.tetromino_type.shape(self.rotation)
    }

    /// Absolute cells covered by the piece.
    pub fn blocks(&self) -> [Position; 4] {
        let shape = *self.shape();
        shape.map(|(dx, dy)| Position {
            x: self.position.x + dx,
            y: self.position.y + dy,
        })
    }

    pub fn moved(&self, dx: i16, dy: i16) -> Self {
        Self {
            position: Position {
                x: self.position.x + dx,
                y: self.position.y + dy,
            },
            ..*self
        }
    }

    pub fn rotated_cw(&self) -> Self {
        Self {
            rotation: self.rotation.cw(),
            ..*self
        }
    }
}
