use anyhow::Context;
use clap::Parser;
use sokoban_solver::engine::{Direction, Game};
use sokoban_solver::utils::level_from_str;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the level file (XSB notation)
    level_file: PathBuf,
}

fn direction_for_key(key: &str) -> Option<Direction> {
    match key {
        "w" => Some(Direction::Up),
        "s" => Some(Direction::Down),
        "a" => Some(Direction::Left),
        "d" => Some(Direction::Right),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let content = fs::read_to_string(&args.level_file)
        .with_context(|| format!("failed to read level file {}", args.level_file.display()))?;
    let level = level_from_str(&content)
        .with_context(|| format!("invalid level in {}", args.level_file.display()))?;

    let mut game = Game::new(level);
    println!("Welcome to Sokoban!");

    loop {
        println!("---------------------");
        println!("Moves: {}, Pushes: {}", game.moves(), game.pushes());
        println!("{}", game.level().render(game.state()));

        if game.is_solved() {
            println!();
            println!("---------------------");
            println!("🎉 LEVEL SOLVED! 🎉");
            println!("Total Moves: {}", game.moves());
            println!("Total Pushes: {}", game.pushes());
            println!("---------------------");
            break;
        }

        print!("Enter a move (w/a/s/d), or 'u' to undo, 'q' to quit: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if game.undo_last_move() {
                    println!("Move undone.");
                } else {
                    println!("Cannot undo further (no moves made).");
                }
            }
            key => match direction_for_key(key) {
                Some(dir) => {
                    if !game.process_move(dir) {
                        println!("Blocked: cannot move {:?}.", dir);
                    }
                }
                None => println!("Invalid input. Use w/a/s/d, 'u', or 'q'."),
            },
        }
    }
    Ok(())
}
