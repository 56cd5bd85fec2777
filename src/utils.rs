use crate::engine::{Direction, Level, Position, SokobanState};
use rand::Rng;
use std::collections::VecDeque;

/// Reasons a level description is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("Level has no rows")]
    Empty,
    #[error("Unrecognized character '{ch}' in row {row} col {col}")]
    UnrecognizedChar { ch: char, row: usize, col: usize },
    #[error("Level has no player ('@' or '+')")]
    MissingPlayer,
    #[error("Level has more than one player, second one at {0}")]
    MultiplePlayers(Position),
    #[error("Level has {crates} crates but {goals} goals")]
    CrateGoalMismatch { crates: usize, goals: usize },
    #[error("The {what} at {at} sits inside a wall")]
    Blocked { what: &'static str, at: Position },
}

/// Parses an array of string slices in XSB notation into a `Level`.
///
/// Each string slice is one row, starting from the top (row 0). Rows may have
/// different lengths; missing cells on the right are treated as floor outside
/// the walls.
///
/// Valid characters are:
/// - `#`: wall
/// - ` `, `-`, `_`: floor
/// - `.`: goal
/// - `$`: crate
/// - `*`: crate on a goal
/// - `@`: player
/// - `+`: player on a goal
///
/// # Returns
/// * `Ok(Level)` if parsing succeeds.
/// * `Err(LevelError)` if the input is empty, contains an unrecognized character,
///   has zero or several players, or its crate and goal counts differ.
///
/// # Examples
/// ```
/// use sokoban_solver::engine::Position;
/// use sokoban_solver::utils::level_from_str_array;
///
/// let level = level_from_str_array(&[
///     "#####",
///     "#@$.#",
///     "#####",
/// ]).unwrap();
/// assert_eq!(level.start().player(), Position::new(1, 1));
/// assert_eq!(level.goal_positions(), &[Position::new(3, 1)]);
///
/// assert!(level_from_str_array(&["#@X#"]).is_err());
/// ```
pub fn level_from_str_array(rows: &[&str]) -> Result<Level, LevelError> {
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let mut walls = Vec::with_capacity(rows.len());
    let mut goals = Vec::new();
    let mut crates = Vec::new();
    let mut player: Option<Position> = None;

    for (r, row) in rows.iter().enumerate() {
        let mut wall_row = Vec::with_capacity(row.len());
        for (c, ch) in row.chars().enumerate() {
            let pos = Position::new(c as i32, r as i32);
            wall_row.push(ch == '#');
            match ch {
                '#' | ' ' | '-' | '_' => {}
                '.' => goals.push(pos),
                '$' => crates.push(pos),
                '*' => {
                    crates.push(pos);
                    goals.push(pos);
                }
                '@' | '+' => {
                    if player.replace(pos).is_some() {
                        return Err(LevelError::MultiplePlayers(pos));
                    }
                    if ch == '+' {
                        goals.push(pos);
                    }
                }
                _ => {
                    return Err(LevelError::UnrecognizedChar { ch, row: r, col: c });
                }
            }
        }
        walls.push(wall_row);
    }

    let player = player.ok_or(LevelError::MissingPlayer)?;
    Level::new(walls, goals, SokobanState::new(player, crates))
}

/// Parses a whole level file.
///
/// Leading and trailing blank lines and `;` comment lines are ignored, as are
/// carriage returns.
pub fn level_from_str(text: &str) -> Result<Level, LevelError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim_start().starts_with(';'))
        .collect();

    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => level_from_str_array(&lines[first..=last]),
        _ => Err(LevelError::Empty),
    }
}

/// Produces a new, solvable starting layout for `level` by playing backwards.
///
/// Starts from the solved layout (every crate on a goal) and makes `pulls`
/// random reverse moves: the player steps into a free neighbouring cell and,
/// at random, drags along a crate sitting directly behind it. Every such move
/// can be undone by a forward push, so the result is always solvable.
///
/// Pass a seeded `rand::rngs::SmallRng` for reproducible layouts.
pub fn scramble_level<R: Rng>(level: &Level, pulls: usize, rng: &mut R) -> Level {
    let goals = level.goal_positions().to_vec();
    let Some(player) = reachable_non_goal_cell(level) else {
        return level.clone();
    };

    let mut state = SokobanState::new(player, goals);
    for _ in 0..pulls {
        let dir = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let here = state.player();
        let next = here.step(dir);
        if !level.is_free(&state, next) {
            continue;
        }
        let behind = here.step(dir.opposite());
        let crate_move = if state.has_crate_at(behind) && rng.gen_bool(0.5) {
            Some((behind, here))
        } else {
            None
        };
        state = state.moved(next, crate_move);
    }
    level.with_start(state)
}

// First cell (in flood-fill order from the start player) that is not a goal,
// ignoring crates. The solved layout needs the player off the goals.
fn reachable_non_goal_cell(level: &Level) -> Option<Position> {
    let origin = level.start().player();
    let mut seen = vec![origin];
    let mut queue = VecDeque::from([origin]);
    while let Some(pos) = queue.pop_front() {
        if !level.is_goal_cell(pos) {
            return Some(pos);
        }
        for dir in Direction::ALL {
            let next = pos.step(dir);
            if !level.is_wall(next) && !seen.contains(&next) {
                seen.push(next);
                queue.push_back(next);
            }
        }
    }
    None
}
