//! A perfect agent for playing or analysing the board game 'Tic-tac-toe'
//!
//! This agent uses a full minimax game tree search with alpha-beta pruning
//! to find the optimal move for any position.
//!
//! # Basic Usage
//!
//! ```
//! use tictactoe_ai::{board::{Board, Move}, solver::Solver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // X takes a corner, O the centre, X the opposite corner
//! let mut board = Board::from_moves("159")?;
//! let (score, best_move) = Solver::new(&mut board).solve();
//!
//! assert!((score, best_move) == (0, Some(Move::new(0, 1))));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod solver;

pub mod analysis;


/// The width and height of the game board in cells
pub const SIZE: usize = 3;

/// The number of cells on the game board
pub const NUM_CELLS: usize = SIZE * SIZE;

// moves are written as single digits and positions are coded in base 3 into a u32
const_assert!(NUM_CELLS <= 9);
const_assert!(SIZE >= 3);
