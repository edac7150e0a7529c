use anyhow::{anyhow, Result};

use std::cmp::Ordering;
use std::io::{stdin, stdout, Stdin, Write};

use tictactoe_ai::{analysis, board::*, solver::Solver};

fn main() -> Result<()> {
    // solve the whole game tree instead of playing
    if let Some("analyse") = std::env::args().nth(1).as_deref() {
        analysis::analyse(true)?;
        return Ok(());
    }

    let mut board = Board::new();

    let stdin = stdin();

    println!("Welcome to Tic-tac-toe\n");

    let ai_players = (
        ask(&stdin, "Is player 1 (X) AI controlled? y/n: ")?,
        ask(&stdin, "Is player 2 (O) AI controlled? y/n: ")?,
    );

    // game loop
    loop {
        board.display()?;

        match board.state() {
            GameState::Playing => {
                let player = board.next_player();
                let next_move =
                    // AI player
                    if (player == Cell::PlayerOne && ai_players.0) || (player == Cell::PlayerTwo && ai_players.1) {
                        println!("AI is thinking...");
                        stdout().flush()?;

                        // slow down play if both players are AI
                        if ai_players == (true, true) {
                            std::thread::sleep(std::time::Duration::new(1, 0));
                        }

                        let mut solver = Solver::new(&mut board);
                        let (score, best_move) = solver.solve_for(player);

                        let win_distance = solver.score_to_win_distance(score);
                        let move_string = if win_distance == 1 { "move" } else { "moves" };
                        match score.cmp(&0) {
                            Ordering::Greater => println!(
                                "Player 2 can force a win in at most {} {}.",
                                win_distance, move_string
                            ),
                            Ordering::Less => println!(
                                "Player 1 can force a win in at most {} {}.",
                                win_distance, move_string
                            ),
                            Ordering::Equal => println!(
                                "Neither player can force a win, {} {} remaining",
                                win_distance, move_string
                            ),
                        }

                        let best_move = best_move.ok_or_else(|| anyhow!("no move found for an open position"))?;
                        println!("Best move: {}", best_move);
                        best_move

                    // human player
                    } else {
                        println!("Your turn, playing {}", player.symbol());
                        let row = match read_coordinate(&stdin, "Enter row (0, 1, 2): ")? {
                            Some(row) => row,
                            None => continue,
                        };
                        let column = match read_coordinate(&stdin, "Enter column (0, 1, 2): ")? {
                            Some(column) => column,
                            None => continue,
                        };
                        match Move::checked(row, column) {
                            Ok(next_move) => next_move,
                            Err(err) => {
                                println!("{}", err);
                                continue;
                            }
                        }
                    };

                if let Err(err) = board.play_checked(next_move, player) {
                    println!("{}", err);
                    // try the move again
                    continue;
                }
            }

            // end states
            GameState::PlayerOneWin => {
                println!("Player 1 wins!");
                break;
            }
            GameState::PlayerTwoWin => {
                println!("Player 2 wins!");
                break;
            }
            GameState::Draw => {
                println!("Draw!");
                break;
            }
        }
    }
    Ok(())
}

fn read_line(stdin: &Stdin, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    stdout().flush()?;

    let mut buffer = String::new();
    if stdin.read_line(&mut buffer)? == 0 {
        return Err(anyhow!("input closed"));
    }
    Ok(buffer)
}

// y/n question, asked until answered
fn ask(stdin: &Stdin, question: &str) -> Result<bool> {
    loop {
        let buffer = read_line(stdin, question)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => return Ok(true),
            Some(_letter @ 'n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}

fn read_coordinate(stdin: &Stdin, prompt: &str) -> Result<Option<usize>> {
    let input = read_line(stdin, prompt)?;
    match input.trim().parse::<usize>() {
        Err(_) => {
            println!("Invalid number: {}", input.trim());
            Ok(None)
        }
        Ok(coordinate) => Ok(Some(coordinate)),
    }
}
