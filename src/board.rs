use anyhow::{anyhow, Result};
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::fmt;
use std::io::{stdout, Write};
use std::ops::{Deref, DerefMut};

use crate::{NUM_CELLS, SIZE};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Cell {
    /// The human side, plays 'X' and moves first
    PlayerOne,
    /// The automated side, plays 'O'
    PlayerTwo,
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            _ => false,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Cell::PlayerOne => 'X',
            Cell::PlayerTwo => 'O',
            Cell::Empty => ' ',
        }
    }

    /// The other player's mark, `Empty` stays `Empty`
    pub fn opponent(&self) -> Cell {
        match self {
            Cell::PlayerOne => Cell::PlayerTwo,
            Cell::PlayerTwo => Cell::PlayerOne,
            Cell::Empty => Cell::Empty,
        }
    }

    fn code(&self) -> u32 {
        match self {
            Cell::Empty => 0,
            Cell::PlayerOne => 1,
            Cell::PlayerTwo => 2,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameState {
    Playing,
    PlayerOneWin,
    PlayerTwoWin,
    Draw,
}

/// A (row, column) coordinate on the board
///
/// Ordering is row-major, the same order `Board::available_moves` yields moves in.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Move {
    pub row: usize,
    pub column: usize,
}

impl Move {
    /// Creates a move without range checks
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Creates a move, rejecting coordinates outside the board
    pub fn checked(row: usize, column: usize) -> Result<Self, MoveError> {
        if row >= SIZE || column >= SIZE {
            return Err(MoveError::OutOfRange { row, column });
        }
        Ok(Self::new(row, column))
    }

    /// The move for a cell index counted left-to-right, top-to-bottom
    pub const fn from_index(index: usize) -> Self {
        Self::new(index / SIZE, index % SIZE)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Misuse of the board caught by the checked move functions
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MoveError {
    OutOfRange { row: usize, column: usize },
    Occupied { row: usize, column: usize },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::OutOfRange { row, column } => write!(
                f,
                "Invalid move, ({}, {}) out of range. Rows and columns must be between 0 and {}",
                row,
                column,
                SIZE - 1
            ),
            MoveError::Occupied { row, column } => {
                write!(f, "Invalid move, ({}, {}) is already taken", row, column)
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// A 3x3 grid of cells, stored row-major
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; SIZE]; SIZE],
        }
    }

    /// Builds a board from a string of cell digits (1-9, row-major), players alternating
    /// starting with `PlayerOne`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for cell_char in moves.as_ref().chars() {
            match cell_char.to_digit(10).map(|c| c as usize) {
                Some(cell @ 1..=NUM_CELLS) => {
                    // abort if the position is decided at any point
                    if board.state() != GameState::Playing {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    let mark = board.next_player();
                    board.play_checked(Move::from_index(cell - 1), mark)?;
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", cell_char)),
            }
        }
        Ok(board)
    }

    /// Renders the board to stdout
    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();

        for row in self.cells.iter() {
            for (column, cell) in row.iter().enumerate() {
                if column > 0 {
                    stdout.queue(PrintStyledContent(style(" | ")))?;
                }
                stdout.queue(PrintStyledContent(
                    style(cell.symbol())
                        .attribute(Attribute::Bold)
                        .with(match cell {
                            Cell::PlayerOne => Color::Red,
                            Cell::PlayerTwo => Color::Yellow,
                            Cell::Empty => Color::Reset,
                        }),
                ))?;
            }
            stdout.queue(PrintStyledContent(style(format!("\n{}\n", row_separator()))))?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn cell(&self, position: Move) -> Cell {
        self.cells[position.row][position.column]
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|cell| !cell.is_empty())
    }

    /// Whether `mark` owns a complete row, column or diagonal
    pub fn is_winner(&self, mark: Cell) -> bool {
        let owns = |row: usize, column: usize| self.cells[row][column] == mark;

        (0..SIZE).any(|row| (0..SIZE).all(|column| owns(row, column)))
            || (0..SIZE).any(|column| (0..SIZE).all(|row| owns(row, column)))
            || (0..SIZE).all(|i| owns(i, i))
            || (0..SIZE).all(|i| owns(i, SIZE - 1 - i))
    }

    /// All empty cells in row-major order
    pub fn available_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(NUM_CELLS);
        for row in 0..SIZE {
            for column in 0..SIZE {
                if self.cells[row][column].is_empty() {
                    moves.push(Move::new(row, column));
                }
            }
        }
        moves
    }

    /// Overwrites a cell, no validation. Playing `Cell::Empty` undoes a move.
    pub fn make_move(&mut self, position: Move, mark: Cell) {
        self.cells[position.row][position.column] = mark;
    }

    /// Plays a move after checking it is on the board and the target cell is free
    pub fn play_checked(&mut self, position: Move, mark: Cell) -> Result<GameState> {
        let position = Move::checked(position.row, position.column)?;
        if !self.cell(position).is_empty() {
            return Err(MoveError::Occupied {
                row: position.row,
                column: position.column,
            }
            .into());
        }
        self.make_move(position, mark);
        Ok(self.state())
    }

    /// Plays a move that is undone when the returned guard goes out of scope
    pub fn speculate(&mut self, position: Move, mark: Cell) -> Speculation<'_> {
        self.make_move(position, mark);
        Speculation {
            board: self,
            position,
        }
    }

    /// Plays a move, runs `f` on the resulting board and undoes the move,
    /// even if `f` unwinds
    pub fn with_move<R, F>(&mut self, position: Move, mark: Cell, f: F) -> R
    where
        F: FnOnce(&mut Board) -> R,
    {
        let mut speculation = self.speculate(position, mark);
        f(&mut *speculation)
    }

    pub fn num_moves(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }

    /// The player to move, assuming `PlayerOne` moved first
    pub fn next_player(&self) -> Cell {
        let player_one = self.count(Cell::PlayerOne);
        let player_two = self.count(Cell::PlayerTwo);
        if player_one > player_two {
            Cell::PlayerTwo
        } else {
            Cell::PlayerOne
        }
    }

    /// Computed on demand from the grid, never cached
    pub fn state(&self) -> GameState {
        if self.is_winner(Cell::PlayerOne) {
            GameState::PlayerOneWin
        } else if self.is_winner(Cell::PlayerTwo) {
            GameState::PlayerTwoWin
        } else if self.is_full() {
            GameState::Draw
        } else {
            GameState::Playing
        }
    }

    // base 3 code of the grid, unique per position
    pub fn position_code(&self) -> u32 {
        self.cells
            .iter()
            .flatten()
            .fold(0, |code, cell| code * 3 + cell.code())
    }

    fn count(&self, mark: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell == mark).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            let symbols: Vec<String> = row.iter().map(|cell| cell.symbol().to_string()).collect();
            writeln!(f, "{}", symbols.join(" | "))?;
            writeln!(f, "{}", row_separator())?;
        }
        Ok(())
    }
}

fn row_separator() -> String {
    "-".repeat(2 * SIZE - 1)
}

/// A move played on a borrowed board, reverted to `Cell::Empty` on drop
pub struct Speculation<'a> {
    board: &'a mut Board,
    position: Move,
}

impl Drop for Speculation<'_> {
    fn drop(&mut self) {
        self.board.make_move(self.position, Cell::Empty);
    }
}

impl Deref for Speculation<'_> {
    type Target = Board;

    fn deref(&self) -> &Self::Target {
        &*self.board
    }
}

impl DerefMut for Speculation<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.board
    }
}
