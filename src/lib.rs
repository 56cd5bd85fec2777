//! # Sokoban Solver Library
//!
//! This library provides a best-first (A*-style) search engine and the
//! Sokoban puzzle model it is used to solve.
//!
//! It is used by three binaries:
//! - `human_player`: Play a level interactively from the command line.
//! - `ai_solver`: Solve a level file and print the move sequence, either in one
//!   go or paced a few search steps per tick.
//! - `heuristic_evaluator`: Compare the heuristics on seeded random levels.
//!
//! ## Modules
//! - `engine`: Positions, moves, `SokobanState`, `Level` (the search problem)
//!   and `Game` (interactive play with undo).
//! - `solver`: The `SearchProblem` trait, the `BestFirstSearch` driver with its
//!   single-step API, and the `solve` convenience runner.
//! - `queue`: The min-priority queue backing the open set.
//! - `node`: Search nodes and solution path reconstruction.
//! - `heuristics`: The evaluators and the `HeuristicKind` selector.
//! - `config`: `SearchConfig`, loaded from TOML.
//! - `utils`: Level parsing (XSB notation) and random level generation.

pub mod config;
pub mod engine;
pub mod heuristics;
pub mod node;
pub mod queue;
pub mod solver;
pub mod utils;

use crate::config::SearchConfig;
use crate::engine::{Action, Level};
use crate::solver::{solve, Solution, SolveError};

/// Solves `level` with the heuristic, duplicate policy and expansion budget
/// named in `config`.
///
/// ```
/// use sokoban_solver::config::SearchConfig;
/// use sokoban_solver::engine::actions_to_lurd;
/// use sokoban_solver::solve_level;
/// use sokoban_solver::utils::level_from_str_array;
///
/// let level = level_from_str_array(&["#####", "#@$.#", "#####"]).unwrap();
/// let solution = solve_level(&level, &SearchConfig::default()).unwrap();
/// assert_eq!(actions_to_lurd(&solution.actions), "R");
/// ```
pub fn solve_level(level: &Level, config: &SearchConfig) -> Result<Solution<Action>, SolveError> {
    let evaluator = config.heuristic.evaluator(level.goal_positions());
    solve(
        level,
        evaluator,
        config.duplicate_policy,
        config.max_expansions,
    )
}
