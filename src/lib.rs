//! Falling-block puzzle simulation.
//!
//! The library is the pure core: a piece catalog, a collision-checked board
//! and the `Game` state machine. It performs no I/O and reads no clock; the
//! caller supplies elapsed time to [`game::Game::update`] and a piece source
//! through [`game::PieceProvider`].

pub mod board;
pub mod game;
pub mod piece;
