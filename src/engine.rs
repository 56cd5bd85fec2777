//! Sokoban state model.
//!
//! This module defines the puzzle's fundamental components:
//! - `Position`, `Direction` and `Action`: grid coordinates, player moves and
//!   the LURD labels attached to each transition.
//! - `SokobanState`: the player position plus the canonical set of crate positions.
//! - `Level`: static walls and goal cells, the start state, and the move rules.
//!   `Level` implements `SearchProblem`, so the best-first driver can solve it.
//! - `Game`: an interactive session with move history (for undo), used by the
//!   `human_player` binary and for replaying solver output.
use crate::heuristics::PuzzleState;
use crate::solver::{SearchProblem, Successor};
use crate::utils::LevelError;
use std::fmt;

/// A cell on the level grid. `x` grows to the right, `y` grows downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Returns the neighbouring cell in direction `dir`.
    pub fn step(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// `|dx| + |dy|` between the two cells.
    ///
    /// ```
    /// use sokoban_solver::engine::Position;
    /// assert_eq!(Position::new(1, 1).manhattan(Position::new(4, -1)), 5);
    /// ```
    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Straight-line distance between the two cells.
    pub fn euclidean(self, other: Position) -> f64 {
        f64::from(self.x - other.x).hypot(f64::from(self.y - other.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the four player moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by `Level::successors`.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Lowercase LURD letter for this direction.
    pub fn to_char(self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        }
    }

    /// Parses a LURD letter in either case.
    pub fn from_char(c: char) -> Option<Direction> {
        match c.to_ascii_lowercase() {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }
}

/// The label of a transition: which way the player moved and whether a crate
/// was pushed on the way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    pub direction: Direction,
    pub pushed: bool,
}

impl Action {
    /// LURD notation: lowercase for a walk, uppercase for a push.
    ///
    /// ```
    /// use sokoban_solver::engine::{Action, Direction};
    /// let push = Action { direction: Direction::Left, pushed: true };
    /// assert_eq!(push.to_char(), 'L');
    /// ```
    pub fn to_char(self) -> char {
        let c = self.direction.to_char();
        if self.pushed {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Joins a sequence of actions into a LURD string.
pub fn actions_to_lurd(actions: &[Action]) -> String {
    actions.iter().map(|a| a.to_char()).collect()
}

/// A point in the search: where the player stands and where the crates are.
///
/// Crates are kept sorted and free of duplicates, so two states with the same
/// layout compare and hash equal regardless of how they were reached.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SokobanState {
    player: Position,
    crates: Vec<Position>,
}

impl SokobanState {
    pub fn new(player: Position, crates: impl IntoIterator<Item = Position>) -> Self {
        let mut crates: Vec<Position> = crates.into_iter().collect();
        crates.sort_unstable();
        crates.dedup();
        SokobanState { player, crates }
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn crates(&self) -> &[Position] {
        &self.crates
    }

    pub fn has_crate_at(&self, pos: Position) -> bool {
        self.crates.binary_search(&pos).is_ok()
    }

    /// Moves the player to `to`, optionally relocating one crate.
    pub(crate) fn moved(&self, to: Position, crate_move: Option<(Position, Position)>) -> Self {
        let mut crates = self.crates.clone();
        if let Some((from, dest)) = crate_move {
            if let Ok(idx) = crates.binary_search(&from) {
                crates.remove(idx);
            }
            let insert_at = crates.binary_search(&dest).unwrap_or_else(|i| i);
            crates.insert(insert_at, dest);
        }
        SokobanState { player: to, crates }
    }
}

impl PuzzleState for SokobanState {
    fn player_position(&self) -> Position {
        self.player
    }

    fn crate_positions(&self) -> &[Position] {
        &self.crates
    }
}

/// A Sokoban level: the static map plus its starting layout.
///
/// Cells outside the `width` x `height` grid count as walls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    width: usize,
    height: usize,
    walls: Vec<Vec<bool>>,
    goals: Vec<Position>,
    start: SokobanState,
}

impl Level {
    /// Builds a level from a wall grid (`walls[y][x]`), its goal cells and the
    /// starting layout.
    ///
    /// # Returns
    /// * `Err(LevelError::CrateGoalMismatch)` if crate and goal counts differ.
    /// * `Err(LevelError::Blocked)` if the player, a crate or a goal sits in a wall.
    pub fn new(
        walls: Vec<Vec<bool>>,
        goals: Vec<Position>,
        start: SokobanState,
    ) -> Result<Self, LevelError> {
        let mut walls = walls;
        let height = walls.len();
        let width = walls.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut walls {
            row.resize(width, false);
        }

        let mut goals = goals;
        goals.sort_unstable();
        goals.dedup();

        if goals.len() != start.crates().len() {
            return Err(LevelError::CrateGoalMismatch {
                crates: start.crates().len(),
                goals: goals.len(),
            });
        }

        let level = Level {
            width,
            height,
            walls,
            goals,
            start,
        };

        if level.is_wall(level.start.player()) {
            return Err(LevelError::Blocked {
                what: "player",
                at: level.start.player(),
            });
        }
        if let Some(&at) = level.start.crates().iter().find(|&&c| level.is_wall(c)) {
            return Err(LevelError::Blocked { what: "crate", at });
        }
        if let Some(&at) = level.goals.iter().find(|&&g| level.is_wall(g)) {
            return Err(LevelError::Blocked { what: "goal", at });
        }
        Ok(level)
    }

    /// Same map, different starting layout. The layout must keep the crate count.
    pub(crate) fn with_start(&self, start: SokobanState) -> Level {
        debug_assert_eq!(start.crates().len(), self.goals.len());
        Level {
            start,
            ..self.clone()
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Goal cells, sorted.
    pub fn goal_positions(&self) -> &[Position] {
        &self.goals
    }

    pub fn start(&self) -> &SokobanState {
        &self.start
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return true;
        }
        match self.walls.get(pos.y as usize) {
            Some(row) => row.get(pos.x as usize).copied().unwrap_or(true),
            None => true,
        }
    }

    pub fn is_goal_cell(&self, pos: Position) -> bool {
        self.goals.binary_search(&pos).is_ok()
    }

    /// A cell the player or a crate can move into.
    pub fn is_free(&self, state: &SokobanState, pos: Position) -> bool {
        !self.is_wall(pos) && !state.has_crate_at(pos)
    }

    /// Applies one player move to `state`.
    ///
    /// The player walks into a free cell, or pushes the crate in front of it
    /// when the cell behind that crate is free. Returns `None` for a blocked
    /// move.
    pub fn apply(&self, state: &SokobanState, dir: Direction) -> Option<(SokobanState, Action)> {
        let target = state.player().step(dir);
        if self.is_wall(target) {
            return None;
        }

        if state.has_crate_at(target) {
            let beyond = target.step(dir);
            if !self.is_free(state, beyond) {
                return None;
            }
            let next = state.moved(target, Some((target, beyond)));
            return Some((
                next,
                Action {
                    direction: dir,
                    pushed: true,
                },
            ));
        }

        Some((
            state.moved(target, None),
            Action {
                direction: dir,
                pushed: false,
            },
        ))
    }

    /// Every goal cell holds a crate.
    pub fn is_solved(&self, state: &SokobanState) -> bool {
        self.goals.iter().all(|&g| state.has_crate_at(g))
    }

    /// Renders `state` on this map in XSB notation, one line per row with
    /// trailing floor trimmed.
    pub fn render(&self, state: &SokobanState) -> String {
        let mut lines = Vec::with_capacity(self.height);
        for y in 0..self.height {
            let mut line = String::with_capacity(self.width);
            for x in 0..self.width {
                let pos = Position::new(x as i32, y as i32);
                let goal = self.is_goal_cell(pos);
                let ch = if self.is_wall(pos) {
                    '#'
                } else if state.player() == pos {
                    if goal {
                        '+'
                    } else {
                        '@'
                    }
                } else if state.has_crate_at(pos) {
                    if goal {
                        '*'
                    } else {
                        '$'
                    }
                } else if goal {
                    '.'
                } else {
                    ' '
                };
                line.push(ch);
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }
}

impl fmt::Display for Level {
    /// Formats the level in its starting layout.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&self.start))
    }
}

impl SearchProblem for Level {
    type State = SokobanState;
    type Action = Action;

    fn start_state(&self) -> SokobanState {
        self.start.clone()
    }

    fn is_goal(&self, state: &SokobanState) -> bool {
        self.is_solved(state)
    }

    /// One successor per unblocked direction, in `Direction::ALL` order, each
    /// costing one move.
    fn successors(&self, state: &SokobanState) -> Vec<Successor<SokobanState, Action>> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.apply(state, dir))
            .map(|(state, action)| Successor {
                state,
                action,
                cost: 1.0,
            })
            .collect()
    }
}

/// Manages an interactive play session on a level.
///
/// # Examples
/// ```
/// use sokoban_solver::engine::{Direction, Game};
/// use sokoban_solver::utils::level_from_str_array;
///
/// let level = level_from_str_array(&["#####", "#@$.#", "#####"]).unwrap();
/// let mut game = Game::new(level);
/// assert!(game.process_move(Direction::Right));
/// assert!(game.is_solved());
/// assert!(game.undo_last_move());
/// assert_eq!(game.moves(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Game {
    level: Level,
    state: SokobanState,
    moves: u32,
    pushes: u32,
    history: Vec<(SokobanState, u32, u32)>, // (state, moves, pushes) for undo
}

impl Game {
    pub fn new(level: Level) -> Self {
        let state = level.start().clone();
        Game {
            history: vec![(state.clone(), 0, 0)],
            level,
            state,
            moves: 0,
            pushes: 0,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn state(&self) -> &SokobanState {
        &self.state
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pushes(&self) -> u32 {
        self.pushes
    }

    /// Moves the player one cell in `dir`, pushing a crate if one is in the way.
    ///
    /// # Returns
    /// * `true` if the move was legal and applied.
    /// * `false` if the player walked into a wall or a crate that cannot move.
    pub fn process_move(&mut self, dir: Direction) -> bool {
        self.play(dir).is_some()
    }

    fn play(&mut self, dir: Direction) -> Option<Action> {
        let (next, action) = self.level.apply(&self.state, dir)?;
        self.state = next;
        self.moves += 1;
        if action.pushed {
            self.pushes += 1;
        }
        self.history
            .push((self.state.clone(), self.moves, self.pushes));
        Some(action)
    }

    /// Reverts the last move.
    ///
    /// # Returns
    /// `false` when no move has been made yet.
    pub fn undo_last_move(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        self.history.pop();
        match self.history.last() {
            Some((state, moves, pushes)) => {
                self.state = state.clone();
                self.moves = *moves;
                self.pushes = *pushes;
                true
            }
            None => false,
        }
    }

    /// Plays `actions` in order. Stops and returns `false` at the first action
    /// that is illegal or whose push flag does not match what actually happened.
    pub fn replay(&mut self, actions: &[Action]) -> bool {
        for expected in actions {
            match self.play(expected.direction) {
                Some(actual) if actual == *expected => {}
                _ => return false,
            }
        }
        true
    }

    pub fn is_solved(&self) -> bool {
        self.level.is_solved(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::level_from_str_array;

    fn corridor() -> Level {
        level_from_str_array(&[
            "#######", //
            "#@ $ .#",
            "#######",
        ])
        .unwrap()
    }

    #[test]
    fn test_position_distances() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(b.manhattan(a), 7);
        assert!((a.euclidean(b) - 5.0).abs() < 1e-9);
        assert_eq!(a.step(Direction::Up), Position::new(0, -1));
        assert_eq!(a.step(Direction::Right), Position::new(1, 0));
    }

    #[test]
    fn test_direction_round_trip_chars() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_char(dir.to_char()), Some(dir));
            assert_eq!(
                Direction::from_char(dir.to_char().to_ascii_uppercase()),
                Some(dir)
            );
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::from_char('x'), None);
    }

    #[test]
    fn test_actions_to_lurd() {
        let actions = [
            Action {
                direction: Direction::Right,
                pushed: false,
            },
            Action {
                direction: Direction::Right,
                pushed: true,
            },
            Action {
                direction: Direction::Up,
                pushed: false,
            },
        ];
        assert_eq!(actions_to_lurd(&actions), "rRu");
    }

    #[test]
    fn test_state_is_canonical() {
        let p = Position::new(1, 1);
        let a = SokobanState::new(p, [Position::new(3, 1), Position::new(2, 2)]);
        let b = SokobanState::new(p, [Position::new(2, 2), Position::new(3, 1)]);
        assert_eq!(a, b);
        assert_eq!(a.crates(), &[Position::new(2, 2), Position::new(3, 1)][..]);
        assert!(a.has_crate_at(Position::new(2, 2)));
        assert!(!a.has_crate_at(p));
    }

    #[test]
    fn test_outside_grid_is_wall() {
        let level = corridor();
        assert!(level.is_wall(Position::new(-1, 1)));
        assert!(level.is_wall(Position::new(1, 10)));
        assert!(level.is_wall(Position::new(0, 1)));
        assert!(!level.is_wall(Position::new(1, 1)));
        assert_eq!(level.width(), 7);
        assert_eq!(level.height(), 3);
    }

    #[test]
    fn test_apply_walk_and_push() {
        let level = corridor();
        let start = level.start().clone();

        assert!(level.apply(&start, Direction::Up).is_none());
        assert!(level.apply(&start, Direction::Left).is_none());

        let (walked, action) = level.apply(&start, Direction::Right).unwrap();
        assert!(!action.pushed);
        assert_eq!(walked.player(), Position::new(2, 1));
        assert_eq!(walked.crates(), start.crates());

        let (pushed, action) = level.apply(&walked, Direction::Right).unwrap();
        assert!(action.pushed);
        assert_eq!(pushed.player(), Position::new(3, 1));
        assert_eq!(pushed.crates(), &[Position::new(4, 1)][..]);
    }

    #[test]
    fn test_push_blocked_by_wall_and_crate() {
        let level = level_from_str_array(&[
            "#######", //
            "#@$$..#",
            "# $.  #",
            "#######",
        ])
        .unwrap();
        let start = level.start().clone();
        // crate behind crate
        assert!(level.apply(&start, Direction::Right).is_none());

        let (below, _) = level.apply(&start, Direction::Down).unwrap();
        let (next, action) = level.apply(&below, Direction::Right).unwrap();
        assert!(action.pushed);
        assert_eq!(next.player(), Position::new(2, 2));
        assert!(next.has_crate_at(Position::new(3, 2)));
        // wall below, crate against the top wall above
        assert!(level.apply(&next, Direction::Down).is_none());
        assert!(level.apply(&next, Direction::Up).is_none());
    }

    #[test]
    fn test_successors_order_and_cost() {
        let level = level_from_str_array(&[
            "#####", //
            "# . #",
            "# $ #",
            "# @ #",
            "#####",
        ])
        .unwrap();
        let successors = level.successors(level.start());
        let labels: Vec<char> = successors.iter().map(|s| s.action.to_char()).collect();
        assert_eq!(labels, vec!['U', 'l', 'r']);
        assert!(successors.iter().all(|s| s.cost == 1.0));
    }

    #[test]
    fn test_goal_predicate() {
        let level = corridor();
        assert!(!level.is_goal(level.start()));
        let solved = SokobanState::new(Position::new(4, 1), [Position::new(5, 1)]);
        assert!(level.is_goal(&solved));
    }

    #[test]
    fn test_render_matches_source() {
        let rows = [
            "  #####", //
            "###   #",
            "#.@$  #",
            "### $.#",
            "#.##$ #",
            "# # . ##",
            "#$ *$$.#",
            "#   .  #",
            "########",
        ];
        let level = level_from_str_array(&rows).unwrap();
        assert_eq!(level.to_string(), rows.join("\n"));
    }

    #[test]
    fn test_render_player_on_goal() {
        let level = level_from_str_array(&["#####", "#+$ #", "#$. #", "#####"]).unwrap();
        assert_eq!(level.to_string(), "#####\n#+$ #\n#$. #\n#####");
    }

    #[test]
    fn test_game_move_and_undo() {
        let mut game = Game::new(corridor());
        assert!(!game.process_move(Direction::Left));
        assert_eq!(game.moves(), 0);

        assert!(game.process_move(Direction::Right));
        assert!(game.process_move(Direction::Right));
        assert_eq!(game.moves(), 2);
        assert_eq!(game.pushes(), 1);
        assert!(!game.is_solved());

        assert!(game.process_move(Direction::Right));
        assert!(game.is_solved());
        assert_eq!(game.pushes(), 2);

        assert!(game.undo_last_move());
        assert_eq!(game.moves(), 2);
        assert_eq!(game.pushes(), 1);
        assert!(game.undo_last_move());
        assert!(game.undo_last_move());
        assert_eq!(game.state(), game.level().start());
        assert!(!game.undo_last_move());
    }

    #[test]
    fn test_game_replay_checks_push_flags() {
        let walk = Action {
            direction: Direction::Right,
            pushed: false,
        };
        let push = Action {
            direction: Direction::Right,
            pushed: true,
        };

        let mut game = Game::new(corridor());
        assert!(game.replay(&[walk, push, push]));
        assert!(game.is_solved());

        let mut game = Game::new(corridor());
        assert!(!game.replay(&[walk, walk]));
    }
}
