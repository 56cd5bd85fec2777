//! Best-first search driver.
//!
//! `BestFirstSearch` owns the open set (a `PriorityQueue` keyed by `f = g + h`),
//! the closed set of expanded states, and the arena of every node created.
//! Hosts advance it one expansion at a time with `step()`, so a game loop can
//! pace it per frame while a command-line tool simply loops until it finishes.
//! `solve` wraps that loop with an optional expansion budget.
//!
//! Duplicate states may sit in the open set at different costs; only the
//! closed set stops a state from being expanded twice. `DuplicatePolicy::PruneWorse`
//! additionally skips successors that are no cheaper than a copy already queued.

use crate::heuristics::Evaluator;
use crate::node::{extract_actions, extract_path, NodeId, SearchNode};
use crate::queue::PriorityQueue;
use clap::ValueEnum;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// The problem model the driver searches over.
pub trait SearchProblem {
    type State: Clone + Eq + Hash;
    type Action: Clone;

    fn start_state(&self) -> Self::State;

    fn is_goal(&self, state: &Self::State) -> bool;

    /// The states reachable from `state` in one transition. The order is part
    /// of the tie-break: equal-priority successors are expanded in this order.
    fn successors(&self, state: &Self::State) -> Vec<Successor<Self::State, Self::Action>>;
}

/// One transition out of a state.
#[derive(Clone, Debug, PartialEq)]
pub struct Successor<S, A> {
    pub state: S,
    pub action: A,
    /// Must be non-negative.
    pub cost: f64,
}

/// What to do with a successor whose state is already waiting in the open set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Enqueue it anyway; the closed set discards the extra copies later.
    #[default]
    KeepAll,
    /// Enqueue it only if it is strictly cheaper than every queued copy.
    PruneWorse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Running,
    Solved,
    Exhausted,
}

/// Result of one `step()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome<A> {
    Running,
    /// A goal was reached; carries the actions from the start state.
    Success(Vec<A>),
    /// The open set ran dry without reaching a goal.
    Failure,
}

/// Counters collected while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes taken off the open set and expanded.
    pub expanded: u64,
    /// Nodes created, the start node included.
    pub generated: u64,
    /// Open-set entries discarded because their state was already closed.
    pub stale_pops: u64,
    /// Successors dropped because their state was already closed.
    pub skipped_closed: u64,
    /// Successors dropped by `DuplicatePolicy::PruneWorse`.
    pub pruned: u64,
    /// Largest open-set size seen.
    pub peak_open: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expanded {}, generated {}, stale pops {}, skipped closed {}, pruned {}, peak open {}",
            self.expanded,
            self.generated,
            self.stale_pops,
            self.skipped_closed,
            self.pruned,
            self.peak_open
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Solved(NodeId),
    Exhausted,
}

/// Incremental best-first (A*-style) search over a `SearchProblem`.
///
/// # Examples
/// ```
/// use sokoban_solver::heuristics::HeuristicKind;
/// use sokoban_solver::solver::{BestFirstSearch, StepOutcome};
/// use sokoban_solver::utils::level_from_str_array;
///
/// let level = level_from_str_array(&["######", "#@$ .#", "######"]).unwrap();
/// let evaluator = HeuristicKind::ManhattanNearest.evaluator(level.goal_positions());
/// let mut search = BestFirstSearch::new(&level, evaluator);
///
/// let path = loop {
///     match search.step() {
///         StepOutcome::Running => continue,
///         StepOutcome::Success(path) => break path,
///         StepOutcome::Failure => panic!("level is solvable"),
///     }
/// };
/// assert_eq!(path.len(), 2);
/// assert!(search.is_finished());
/// ```
pub struct BestFirstSearch<'p, P: SearchProblem, E> {
    problem: &'p P,
    evaluator: E,
    policy: DuplicatePolicy,
    nodes: Vec<SearchNode<P::State, P::Action>>,
    open: PriorityQueue<OrderedFloat<f64>, NodeId>,
    closed: HashSet<P::State>,
    best_g: HashMap<P::State, f64>,
    phase: Phase,
    stats: SearchStats,
}

impl<'p, P, E> BestFirstSearch<'p, P, E>
where
    P: SearchProblem,
    E: Evaluator<P::State>,
{
    /// Starts a search that keeps every duplicate successor.
    pub fn new(problem: &'p P, evaluator: E) -> Self {
        Self::with_policy(problem, evaluator, DuplicatePolicy::KeepAll)
    }

    /// Builds the start node and seeds the open set with it.
    pub fn with_policy(problem: &'p P, evaluator: E, policy: DuplicatePolicy) -> Self {
        let start = problem.start_state();
        let h = evaluator.estimate(&start);

        let mut best_g = HashMap::new();
        if policy == DuplicatePolicy::PruneWorse {
            best_g.insert(start.clone(), 0.0);
        }

        let root = SearchNode::root(start, h);
        let mut open = PriorityQueue::new();
        open.enqueue(OrderedFloat(root.f()), 0);
        tracing::debug!(h, ?policy, "search initialized");

        BestFirstSearch {
            problem,
            evaluator,
            policy,
            nodes: vec![root],
            open,
            closed: HashSet::new(),
            best_g,
            phase: Phase::Running,
            stats: SearchStats {
                generated: 1,
                peak_open: 1,
                ..SearchStats::default()
            },
        }
    }

    /// Advances the search by one expansion.
    ///
    /// Takes the lowest-`f` node whose state is not yet closed and closes it.
    /// A goal node ends the search with `Success`. Any other node is expanded:
    /// each successor outside the closed set becomes a new node and joins the
    /// open set. An empty open set ends the search with `Failure`.
    ///
    /// Once the search has finished, further calls do no work and return the
    /// same terminal outcome.
    pub fn step(&mut self) -> StepOutcome<P::Action> {
        if self.phase != Phase::Running {
            return self.outcome();
        }

        let Some(current) = self.pop_unclosed() else {
            self.phase = Phase::Exhausted;
            tracing::debug!(
                expanded = self.stats.expanded,
                closed = self.closed.len(),
                "open set exhausted without reaching a goal"
            );
            return StepOutcome::Failure;
        };

        let problem = self.problem;
        if problem.is_goal(self.nodes[current].state()) {
            self.phase = Phase::Solved(current);
            tracing::debug!(
                cost = self.nodes[current].g(),
                depth = self.nodes[current].depth(),
                expanded = self.stats.expanded,
                "goal reached"
            );
            return self.outcome();
        }

        self.expand(current);
        StepOutcome::Running
    }

    /// Steps until the search finishes.
    pub fn run(&mut self) -> StepOutcome<P::Action> {
        loop {
            match self.step() {
                StepOutcome::Running => {}
                terminal => return terminal,
            }
        }
    }

    // Pops until a node with an unclosed state turns up, closing it.
    fn pop_unclosed(&mut self) -> Option<NodeId> {
        while let Some(id) = self.open.dequeue() {
            if self.closed.insert(self.nodes[id].state().clone()) {
                return Some(id);
            }
            self.stats.stale_pops += 1;
        }
        None
    }

    fn expand(&mut self, current: NodeId) {
        self.stats.expanded += 1;
        let (g, depth) = {
            let node = &self.nodes[current];
            (node.g(), node.depth())
        };
        let successors = self.problem.successors(self.nodes[current].state());
        tracing::trace!(
            node = current,
            g,
            f = self.nodes[current].f(),
            successors = successors.len(),
            "expanding"
        );

        for Successor { state, action, cost } in successors {
            debug_assert!(cost >= 0.0, "negative step cost {cost}");
            if self.closed.contains(&state) {
                self.stats.skipped_closed += 1;
                continue;
            }

            let next_g = g + cost;
            if self.policy == DuplicatePolicy::PruneWorse {
                if let Some(&best) = self.best_g.get(&state) {
                    if best <= next_g {
                        self.stats.pruned += 1;
                        continue;
                    }
                }
                self.best_g.insert(state.clone(), next_g);
            }

            let h = self.evaluator.estimate(&state);
            let node = SearchNode::child(state, next_g, h, action, current, depth + 1);
            let id = self.nodes.len();
            self.open.enqueue(OrderedFloat(node.f()), id);
            self.nodes.push(node);
            self.stats.generated += 1;
        }
        self.stats.peak_open = self.open.peak_len();
    }

    fn outcome(&self) -> StepOutcome<P::Action> {
        match self.phase {
            Phase::Running => StepOutcome::Running,
            Phase::Solved(id) => StepOutcome::Success(extract_actions(&self.nodes, id)),
            Phase::Exhausted => StepOutcome::Failure,
        }
    }

    pub fn status(&self) -> SearchStatus {
        match self.phase {
            Phase::Running => SearchStatus::Running,
            Phase::Solved(_) => SearchStatus::Solved,
            Phase::Exhausted => SearchStatus::Exhausted,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase != Phase::Running
    }

    /// The action path to the goal, once one has been reached.
    pub fn solution(&self) -> Option<Vec<P::Action>> {
        match self.phase {
            Phase::Solved(id) => Some(extract_actions(&self.nodes, id)),
            _ => None,
        }
    }

    pub fn solution_cost(&self) -> Option<f64> {
        self.solution_node().map(SearchNode::g)
    }

    pub fn solution_node(&self) -> Option<&SearchNode<P::State, P::Action>> {
        match self.phase {
            Phase::Solved(id) => self.nodes.get(id),
            _ => None,
        }
    }

    pub fn solution_id(&self) -> Option<NodeId> {
        match self.phase {
            Phase::Solved(id) => Some(id),
            _ => None,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SearchNode<P::State, P::Action>> {
        self.nodes.get(id)
    }

    /// Nodes from the start node down to `id`. Empty for an unknown id.
    pub fn path_to(&self, id: NodeId) -> Vec<&SearchNode<P::State, P::Action>> {
        if id >= self.nodes.len() {
            return Vec::new();
        }
        extract_path(&self.nodes, id)
            .into_iter()
            .map(|idx| &self.nodes[idx])
            .collect()
    }

    pub fn is_closed(&self, state: &P::State) -> bool {
        self.closed.contains(state)
    }

    pub fn closed_len(&self) -> usize {
        self.closed.len()
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }
}

/// A finished search's answer.
#[derive(Clone, Debug)]
pub struct Solution<A> {
    pub actions: Vec<A>,
    pub cost: f64,
    pub stats: SearchStats,
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("no solution: open set exhausted ({stats})")]
    Unsolvable { stats: SearchStats },
    #[error("expansion budget of {budget} spent without reaching a goal ({stats})")]
    BudgetExhausted { budget: u64, stats: SearchStats },
}

impl SolveError {
    pub fn stats(&self) -> SearchStats {
        match self {
            SolveError::Unsolvable { stats } | SolveError::BudgetExhausted { stats, .. } => *stats,
        }
    }
}

/// Runs a search to completion, stopping early once `max_expansions` nodes
/// have been expanded.
pub fn solve<P, E>(
    problem: &P,
    evaluator: E,
    policy: DuplicatePolicy,
    max_expansions: Option<u64>,
) -> Result<Solution<P::Action>, SolveError>
where
    P: SearchProblem,
    E: Evaluator<P::State>,
{
    let mut search = BestFirstSearch::with_policy(problem, evaluator, policy);
    loop {
        match search.step() {
            StepOutcome::Success(actions) => {
                return Ok(Solution {
                    actions,
                    cost: search.solution_cost().unwrap_or_default(),
                    stats: search.stats(),
                })
            }
            StepOutcome::Failure => {
                return Err(SolveError::Unsolvable {
                    stats: search.stats(),
                })
            }
            StepOutcome::Running => {
                if let Some(budget) = max_expansions {
                    if search.stats().expanded >= budget {
                        tracing::debug!(budget, "expansion budget spent");
                        return Err(SolveError::BudgetExhausted {
                            budget,
                            stats: search.stats(),
                        });
                    }
                }
            }
        }
    }
}
