//! Exhaustive analysis of the Tic-tac-toe game tree

use anyhow::{anyhow, Result};
use indicatif::*;
use rayon::prelude::*;

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use crate::{board::*, solver::Solver};

/// Counts gathered over every reachable position
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct TreeReport {
    /// Unique positions reachable from the empty board, including it
    pub positions: usize,
    pub terminal_positions: usize,
    pub player_one_wins: usize,
    pub player_two_wins: usize,
    pub draws: usize,

    // open positions by the result of perfect play
    pub forced_player_one_wins: usize,
    pub forced_player_two_wins: usize,
    pub forced_draws: usize,

    /// Nodes visited solving every open position with alpha-beta pruning
    pub pruned_nodes: usize,
    /// Nodes visited solving every open position without pruning
    pub unpruned_nodes: usize,
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reachable positions: {}", self.positions)?;
        writeln!(
            f,
            "Finished games: {} (X wins: {}, O wins: {}, draws: {})",
            self.terminal_positions, self.player_one_wins, self.player_two_wins, self.draws
        )?;
        writeln!(
            f,
            "Open positions under perfect play: X wins: {}, O wins: {}, draws: {}",
            self.forced_player_one_wins, self.forced_player_two_wins, self.forced_draws
        )?;
        write!(
            f,
            "Nodes searched: {} with pruning, {} without",
            self.pruned_nodes, self.unpruned_nodes
        )
    }
}

/// Every position reachable from the empty board with `PlayerOne` moving first,
/// stopping at finished games
pub fn reachable_positions() -> Vec<Board> {
    let mut seen = HashSet::new();
    let mut positions = Vec::new();
    collect_positions(&mut Board::new(), &mut seen, &mut positions);
    positions
}

fn collect_positions(board: &mut Board, seen: &mut HashSet<u32>, positions: &mut Vec<Board>) {
    if !seen.insert(board.position_code()) {
        return;
    }
    positions.push(*board);

    if board.state() != GameState::Playing {
        return;
    }
    let mark = board.next_player();
    for candidate in board.available_moves() {
        board.with_move(candidate, mark, |board| {
            collect_positions(board, seen, positions)
        });
    }
}

struct Evaluation {
    score: i32,
    pruned_nodes: usize,
    unpruned_nodes: usize,
}

fn evaluate(position: &Board) -> Result<Evaluation> {
    let mut board = *position;
    let mark = board.next_player();

    let mut solver = Solver::new(&mut board);
    let (score, _) = solver.solve_for(mark);
    let pruned_nodes = solver.node_count;

    let mut exhaustive = Solver::new(&mut board).without_pruning();
    let (exhaustive_score, _) = exhaustive.solve_for(mark);
    let unpruned_nodes = exhaustive.node_count;

    if score != exhaustive_score {
        return Err(anyhow!(
            "pruned search scored {} but full search scored {} for position\n{}",
            score,
            exhaustive_score,
            position
        ));
    }
    if board != *position {
        return Err(anyhow!("search left the board modified\n{}", board));
    }

    Ok(Evaluation {
        score,
        pruned_nodes,
        unpruned_nodes,
    })
}

/// Solves every reachable position in parallel, checking the pruned search against
/// a full search
///
/// When `verbose` is set a progress bar is shown and the report is printed.
pub fn analyse(verbose: bool) -> Result<TreeReport> {
    let start = Instant::now();
    let positions = reachable_positions();

    let mut report = TreeReport {
        positions: positions.len(),
        ..TreeReport::default()
    };

    let mut open = Vec::new();
    for position in positions {
        match position.state() {
            GameState::Playing => open.push(position),
            GameState::PlayerOneWin => report.player_one_wins += 1,
            GameState::PlayerTwoWin => report.player_two_wins += 1,
            GameState::Draw => report.draws += 1,
        }
    }
    report.terminal_positions = report.player_one_wins + report.player_two_wins + report.draws;

    let progress = if verbose {
        ProgressBar::new(open.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Solving positions: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let evaluations = open
        .par_iter()
        .map(|position| {
            let evaluation = evaluate(position);
            progress.inc(1);
            evaluation
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish();

    for evaluation in evaluations.iter() {
        if evaluation.score > 0 {
            report.forced_player_two_wins += 1;
        } else if evaluation.score < 0 {
            report.forced_player_one_wins += 1;
        } else {
            report.forced_draws += 1;
        }
        report.pruned_nodes += evaluation.pruned_nodes;
        report.unpruned_nodes += evaluation.unpruned_nodes;
    }

    if verbose {
        println!("{}", report);
        println!(
            "Analysis completed in {}",
            HumanDuration(Instant::now() - start)
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_position_counts() {
        let positions = reachable_positions();
        assert_eq!(positions.len(), 5478);
        assert_eq!(positions[0], Board::new());

        let finished = positions
            .iter()
            .filter(|position| position.state() != GameState::Playing)
            .count();
        assert_eq!(finished, 958);
    }

    #[test]
    fn pruned_search_matches_full_search() -> Result<()> {
        let report = analyse(false)?;

        assert_eq!(report.positions, 5478);
        assert_eq!(report.terminal_positions, 958);
        assert_eq!(report.player_one_wins, 626);
        assert_eq!(report.player_two_wins, 316);
        assert_eq!(report.draws, 16);
        assert_eq!(
            report.forced_player_one_wins + report.forced_player_two_wins + report.forced_draws,
            5478 - 958
        );
        assert!(report.pruned_nodes < report.unpruned_nodes);
        Ok(())
    }
}
