//! Heuristic evaluators for best-first search.
//!
//! Every evaluator maps a state to a non-negative estimate of the remaining
//! cost; lower means closer to the goal. The free functions are pure and take
//! the goal cells and the state's positions directly. `HeuristicKind` selects
//! one of them by name (CLI and TOML config), and `GoalEvaluator` binds a kind
//! to a level's goals so it can be handed to the search driver.
//!
//! Only `Zero` and `RemainingGoals` are admissible for unit-cost moves. The
//! distance-based variants ignore walls, other crates and the player's walk
//! around a crate, so they can overestimate.
use crate::engine::Position;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// Read access to the parts of a state the evaluators look at.
pub trait PuzzleState {
    fn player_position(&self) -> Position;
    fn crate_positions(&self) -> &[Position];
}

/// A strategy estimating the remaining cost from a state.
///
/// Any `Fn(&S) -> f64` closure is an evaluator, so hosts can plug in their own:
///
/// ```
/// use sokoban_solver::heuristics::Evaluator;
/// let half = |n: &u32| f64::from(*n) / 2.0;
/// assert_eq!(half.estimate(&6), 3.0);
/// ```
pub trait Evaluator<S> {
    fn estimate(&self, state: &S) -> f64;
}

impl<S, F> Evaluator<S> for F
where
    F: Fn(&S) -> f64,
{
    fn estimate(&self, state: &S) -> f64 {
        self(state)
    }
}

/// Always 0. Turns best-first search into uniform-cost search.
pub fn zero<S>(_state: &S) -> f64 {
    0.0
}

/// Number of goal cells not covered by a crate.
pub fn remaining_goals(goals: &[Position], crates: &[Position]) -> f64 {
    let uncovered = goals.iter().filter(|&g| !crates.contains(g)).count();
    uncovered as f64
}

/// For each crate, the straight-line distance to its nearest goal, summed.
pub fn euclidean_nearest_sum(goals: &[Position], crates: &[Position]) -> f64 {
    if goals.is_empty() {
        return 0.0;
    }
    crates
        .iter()
        .map(|&c| {
            goals
                .iter()
                .map(|&g| c.euclidean(g))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

/// For each crate, the Manhattan distance to every goal, all summed, plus the
/// player's Manhattan distance to the closest crate.
///
/// Counts each crate against all goals, so it grows with the square of the
/// crate count. Kept for comparison against `manhattan_nearest_with_player`.
pub fn manhattan_all_goals_with_player(
    goals: &[Position],
    crates: &[Position],
    player: Position,
) -> f64 {
    let crate_term: i32 = crates
        .iter()
        .map(|&c| goals.iter().map(|&g| c.manhattan(g)).sum::<i32>())
        .sum();
    f64::from(crate_term + nearest_crate_distance(crates, player))
}

/// For each crate, the Manhattan distance to its nearest goal, summed, plus
/// the player's Manhattan distance to the closest crate.
pub fn manhattan_nearest_with_player(
    goals: &[Position],
    crates: &[Position],
    player: Position,
) -> f64 {
    let crate_term: i32 = crates
        .iter()
        .map(|&c| goals.iter().map(|&g| c.manhattan(g)).min().unwrap_or(0))
        .sum();
    let score = f64::from(crate_term + nearest_crate_distance(crates, player));
    tracing::trace!(score, "manhattan-nearest estimate");
    score
}

// 0 when there are no crates.
fn nearest_crate_distance(crates: &[Position], player: Position) -> i32 {
    crates
        .iter()
        .map(|&c| c.manhattan(player))
        .min()
        .unwrap_or(0)
}

/// Names the available evaluators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    /// Always 0 (uniform-cost search).
    Zero,
    /// Goals not yet covered by a crate.
    RemainingGoals,
    /// Sum of straight-line distances from each crate to its nearest goal.
    EuclideanNearest,
    /// Sum of Manhattan distances from each crate to every goal, plus player-to-crate.
    ManhattanAllGoals,
    /// Sum of Manhattan distances from each crate to its nearest goal, plus player-to-crate.
    #[default]
    ManhattanNearest,
}

impl HeuristicKind {
    pub const ALL: [HeuristicKind; 5] = [
        HeuristicKind::Zero,
        HeuristicKind::RemainingGoals,
        HeuristicKind::EuclideanNearest,
        HeuristicKind::ManhattanAllGoals,
        HeuristicKind::ManhattanNearest,
    ];

    /// The kebab-case name used on the command line and in config files.
    pub fn name(self) -> &'static str {
        match self {
            HeuristicKind::Zero => "zero",
            HeuristicKind::RemainingGoals => "remaining-goals",
            HeuristicKind::EuclideanNearest => "euclidean-nearest",
            HeuristicKind::ManhattanAllGoals => "manhattan-all-goals",
            HeuristicKind::ManhattanNearest => "manhattan-nearest",
        }
    }

    /// Whether the estimate never exceeds the true remaining cost when every
    /// move costs 1.
    pub fn is_admissible(self) -> bool {
        matches!(self, HeuristicKind::Zero | HeuristicKind::RemainingGoals)
    }

    /// Binds this kind to a level's goal cells.
    pub fn evaluator(self, goals: &[Position]) -> GoalEvaluator {
        GoalEvaluator::new(self, goals.to_vec())
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A `HeuristicKind` together with the goal cells it measures against.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalEvaluator {
    kind: HeuristicKind,
    goals: Vec<Position>,
}

impl GoalEvaluator {
    pub fn new(kind: HeuristicKind, goals: Vec<Position>) -> Self {
        GoalEvaluator { kind, goals }
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }
}

impl<S: PuzzleState> Evaluator<S> for GoalEvaluator {
    fn estimate(&self, state: &S) -> f64 {
        let crates = state.crate_positions();
        match self.kind {
            HeuristicKind::Zero => zero(state),
            HeuristicKind::RemainingGoals => remaining_goals(&self.goals, crates),
            HeuristicKind::EuclideanNearest => euclidean_nearest_sum(&self.goals, crates),
            HeuristicKind::ManhattanAllGoals => {
                manhattan_all_goals_with_player(&self.goals, crates, state.player_position())
            }
            HeuristicKind::ManhattanNearest => {
                manhattan_nearest_with_player(&self.goals, crates, state.player_position())
            }
        }
    }
}
