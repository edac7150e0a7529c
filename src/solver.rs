//! An agent to solve the game of Tic-tac-toe

use crate::board::*;
use crate::NUM_CELLS;

use static_assertions::const_assert;

use std::cmp::Ordering;
use std::time::Instant;

/// The score of a position won by the maximizing side with no moves played
pub const WIN_SCORE: i32 = 10;
/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -WIN_SCORE;
/// The maximum possible score of a position
pub const MAX_SCORE: i32 = WIN_SCORE;

/// Lower bound of an unbounded search window
pub const NEG_INFINITY: i32 = i32::MIN;
/// Upper bound of an unbounded search window
pub const POS_INFINITY: i32 = i32::MAX;

/// The automated side, maximizing the score
pub const MAXIMIZING_MARK: Cell = Cell::PlayerTwo;
/// The human side, minimizing the score
pub const MINIMIZING_MARK: Cell = Cell::PlayerOne;

// a win found at the deepest possible ply must still outscore a draw
const_assert!(WIN_SCORE > NUM_CELLS as i32);

/// Minimax state shared across one call tree
struct Search {
    pruning: bool,
    node_count: usize,
}

impl Search {
    fn new(pruning: bool) -> Self {
        Self {
            pruning,
            node_count: 0,
        }
    }

    /// Performs game tree search
    ///
    /// Returns the score of the position from the maximizing side's view and the best
    /// move for the side to move, or `None` for a finished game. Every speculative
    /// move is undone before returning.
    fn minimax(
        &mut self,
        board: &mut Board,
        depth: usize,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> (i32, Option<Move>) {
        self.node_count += 1;

        // terminal positions, losses are checked first
        if board.is_winner(MINIMIZING_MARK) {
            return (MIN_SCORE + depth as i32, None);
        }
        if board.is_winner(MAXIMIZING_MARK) {
            return (MAX_SCORE - depth as i32, None);
        }
        if board.is_full() {
            return (0, None);
        }

        let mut best_move = None;
        if maximizing {
            let mut max_eval = NEG_INFINITY;
            for candidate in board.available_moves() {
                let (eval, _) = board.with_move(candidate, MAXIMIZING_MARK, |board| {
                    self.minimax(board, depth + 1, false, alpha, beta)
                });
                // ties keep the earliest move
                if eval > max_eval {
                    max_eval = eval;
                    best_move = Some(candidate);
                }
                alpha = alpha.max(eval);
                if self.pruning && beta <= alpha {
                    break;
                }
            }
            (max_eval, best_move)
        } else {
            let mut min_eval = POS_INFINITY;
            for candidate in board.available_moves() {
                let (eval, _) = board.with_move(candidate, MINIMIZING_MARK, |board| {
                    self.minimax(board, depth + 1, true, alpha, beta)
                });
                if eval < min_eval {
                    min_eval = eval;
                    best_move = Some(candidate);
                }
                beta = beta.min(eval);
                if self.pruning && beta <= alpha {
                    break;
                }
            }
            (min_eval, best_move)
        }
    }
}

/// Minimax search with alpha-beta pruning on a borrowed board
///
/// Returns the score from `MAXIMIZING_MARK`'s view and the best move for the side to move.
/// The board is left exactly as it was given.
pub fn minimax(
    board: &mut Board,
    depth: usize,
    maximizing: bool,
    alpha: i32,
    beta: i32,
) -> (i32, Option<Move>) {
    Search::new(true).minimax(board, depth, maximizing, alpha, beta)
}

/// An agent to solve Tic-tac-toe positions
///
/// # Notes
/// The agent borrows the board exclusively and explores the game tree by playing
/// and undoing moves on it in place, so the board is unchanged once a search returns.
///
/// # Position Scoring
/// Scores are always given from the view of the automated player (`PlayerTwo`).
/// A win for it scores `10 - n` where `n` is the number of moves until the winning
/// move, a loss scores `-10 + n` and a draw scores 0. Faster wins and slower losses
/// are therefore preferred.
pub struct Solver<'a> {
    board: &'a mut Board,
    pruning: bool,

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
}

impl<'a> Solver<'a> {
    /// Creates a new `Solver` borrowing a board
    pub fn new(board: &'a mut Board) -> Self {
        Self {
            board,
            pruning: true,
            node_count: 0,
        }
    }

    /// Disables alpha-beta cutoffs, every node of the game tree is searched
    pub fn without_pruning(mut self) -> Self {
        self.pruning = false;
        self
    }

    /// Calculate the score and best move for the automated player
    pub fn solve(&mut self) -> (i32, Option<Move>) {
        self.search(true)
    }

    /// Calculate the score and best move for the given player to move
    pub fn solve_for(&mut self, mark: Cell) -> (i32, Option<Move>) {
        self.search(mark == MAXIMIZING_MARK)
    }

    /// Calculate the score and best move for the automated player, logging the search to stdout
    pub fn solve_verbose(&mut self) -> (i32, Option<Move>) {
        let start = Instant::now();
        let (score, best_move) = self.solve();
        let finish = Instant::now();

        println!(
            "Searched {} positions in {:.3}ms",
            self.node_count,
            (finish - start).as_secs_f64() * 1000.0
        );
        match best_move {
            Some(best_move) => println!("Score: {}, best move: {}", score, best_move),
            None => println!("Score: {}, game is over", score),
        }
        (score, best_move)
    }

    fn search(&mut self, maximizing: bool) -> (i32, Option<Move>) {
        let mut search = Search::new(self.pruning);
        let result = search.minimax(&mut *self.board, 0, maximizing, NEG_INFINITY, POS_INFINITY);
        self.node_count += search.node_count;
        result
    }

    /// Converts a position score to the number of moves until the game ends under
    /// perfect play
    pub fn score_to_win_distance(&self, score: i32) -> usize {
        match score.cmp(&0) {
            Ordering::Equal => NUM_CELLS - self.board.num_moves(),
            Ordering::Greater => (MAX_SCORE - score) as usize,
            Ordering::Less => (score - MIN_SCORE) as usize,
        }
    }
}

impl std::ops::Deref for Solver<'_> {
    type Target = Board;

    fn deref(&self) -> &Self::Target {
        &*self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn line(board: &mut Board, mark: Cell, cells: [usize; 3]) {
        for &index in cells.iter() {
            board.make_move(Move::from_index(index), mark);
        }
    }

    #[test]
    fn terminal_scores() -> Result<()> {
        let mut board = Board::new();
        line(&mut board, MAXIMIZING_MARK, [0, 4, 8]);
        assert_eq!(minimax(&mut board, 0, true, NEG_INFINITY, POS_INFINITY), (10, None));
        assert_eq!(minimax(&mut board, 1, true, NEG_INFINITY, POS_INFINITY), (9, None));
        assert_eq!(minimax(&mut board, 1, false, NEG_INFINITY, POS_INFINITY), (9, None));

        let mut board = Board::new();
        line(&mut board, MINIMIZING_MARK, [2, 5, 8]);
        assert_eq!(minimax(&mut board, 0, true, NEG_INFINITY, POS_INFINITY), (-10, None));
        assert_eq!(minimax(&mut board, 3, false, NEG_INFINITY, POS_INFINITY), (-7, None));

        let mut board = Board::from_moves("125379846")?;
        assert_eq!(Solver::new(&mut board).solve(), (0, None));
        Ok(())
    }

    #[test]
    fn takes_winning_move() -> Result<()> {
        // O holds the centre and top middle, bottom middle wins
        let mut board = Board::from_moves("15329")?;
        let (score, best_move) = Solver::new(&mut board).solve();
        // O at 2 and 5 already, playing 8 wins on the next ply
        assert_eq!(best_move, Some(Move::new(2, 1)));
        assert_eq!(score, 9);
        Ok(())
    }

    #[test]
    fn blocks_losing_move() -> Result<()> {
        // X threatens the top row
        let mut board = Board::from_moves("152")?;
        let (score, best_move) = Solver::new(&mut board).solve();
        assert_eq!(best_move, Some(Move::new(0, 2)));
        assert_eq!(score, 0);
        Ok(())
    }

    #[test]
    fn minimizing_side_wins() -> Result<()> {
        // X to move with the top row open
        let mut board = Board::from_moves("1427")?;
        let (score, best_move) = Solver::new(&mut board).solve_for(Cell::PlayerOne);
        assert_eq!(best_move, Some(Move::new(0, 2)));
        assert_eq!(score, -9);
        Ok(())
    }

    #[test]
    fn opening_move() {
        let mut board = Board::new();
        let mut solver = Solver::new(&mut board);
        assert_eq!(solver.solve(), (0, Some(Move::new(0, 0))));
        assert!(solver.node_count > 1);
        assert_eq!(solver.score_to_win_distance(0), 9);
    }

    #[test]
    fn search_restores_board() -> Result<()> {
        for moves in ["", "5", "15", "159", "1592", "15928"].iter() {
            let mut board = Board::from_moves(moves)?;
            let before = board;
            let mark = board.next_player();
            Solver::new(&mut board).solve_for(mark);
            assert_eq!(board, before);
            Solver::new(&mut board).without_pruning().solve();
            assert_eq!(board, before);
        }
        Ok(())
    }

    #[test]
    fn pruning_visits_fewer_nodes() {
        let mut board = Board::new();
        let mut pruned = Solver::new(&mut board);
        let (pruned_score, pruned_move) = pruned.solve();
        let pruned_nodes = pruned.node_count;

        let mut exhaustive = Solver::new(&mut board).without_pruning();
        let (score, best_move) = exhaustive.solve();

        assert_eq!(pruned_score, score);
        assert_eq!(pruned_move, best_move);
        assert!(pruned_nodes < exhaustive.node_count);
        // every node of the full tree from the empty board, plus the root
        assert_eq!(exhaustive.node_count, 549_946);
    }

    #[test]
    fn win_distance() -> Result<()> {
        let mut board = Board::from_moves("1427")?;
        let solver = Solver::new(&mut board);
        assert_eq!(solver.score_to_win_distance(-9), 1);
        assert_eq!(solver.score_to_win_distance(7), 3);
        assert_eq!(solver.score_to_win_distance(0), 5);
        Ok(())
    }
}
