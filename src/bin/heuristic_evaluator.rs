use rand::rngs::SmallRng;
use rand::SeedableRng;
use sokoban_solver::engine::Game;
use sokoban_solver::heuristics::HeuristicKind;
use sokoban_solver::solver::{solve, DuplicatePolicy};
use sokoban_solver::utils::{level_from_str_array, scramble_level};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

const NUM_RANDOM_LEVELS_FOR_EVALUATION: usize = 20;
const START_SEED: u64 = 0;
const PULLS_PER_LEVEL: usize = 40;
const MAX_EXPANSIONS: u64 = 200_000;

const BASE_LEVEL: [&str; 8] = [
    "#########", //
    "#       #",
    "#  .  . #",
    "#  ###  #",
    "#   .   #",
    "# $ $ $ #",
    "#   @   #",
    "#########",
];

#[derive(Default)]
struct Tally {
    solved: usize,
    total_cost: f64,
    total_expanded: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let base = level_from_str_array(&BASE_LEVEL)?;
    let mut tallies: HashMap<HeuristicKind, Tally> = HashMap::new();

    println!(
        "Starting heuristic evaluation for {} levels...",
        NUM_RANDOM_LEVELS_FOR_EVALUATION
    );

    for level_idx in 0..NUM_RANDOM_LEVELS_FOR_EVALUATION {
        let current_seed = START_SEED + level_idx as u64;
        let mut rng = SmallRng::seed_from_u64(current_seed);
        let level = scramble_level(&base, PULLS_PER_LEVEL, &mut rng);

        println!("\nEvaluating Level {} (Seed: {})", level_idx, current_seed);
        println!("{}", level);

        for kind in HeuristicKind::ALL {
            let evaluator = kind.evaluator(level.goal_positions());
            let tally = tallies.entry(kind).or_default();
            match solve(
                &level,
                evaluator,
                DuplicatePolicy::KeepAll,
                Some(MAX_EXPANSIONS),
            ) {
                Ok(solution) => {
                    let mut game = Game::new(level.clone());
                    if !game.replay(&solution.actions) || !game.is_solved() {
                        eprintln!(
                            "Error: heuristic {} on level {} (Seed: {}) produced a path that does not solve it",
                            kind, level_idx, current_seed
                        );
                        continue;
                    }
                    println!(
                        "  Heuristic: {:<20}, Cost: {:<6}, Expanded: {}",
                        kind, solution.cost, solution.stats.expanded
                    );
                    tally.solved += 1;
                    tally.total_cost += solution.cost;
                    tally.total_expanded += solution.stats.expanded;
                }
                Err(err) => {
                    println!("  Heuristic: {:<20}, {}", kind, err);
                }
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of levels evaluated: {}", NUM_RANDOM_LEVELS_FOR_EVALUATION);
    println!(
        "Heuristics evaluated: {}",
        HeuristicKind::ALL
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<&str>>()
            .join(", ")
    );
    println!("\n--- Averages over solved levels ---");

    let mut rows: Vec<(HeuristicKind, &Tally)> = HeuristicKind::ALL
        .iter()
        .filter_map(|kind| tallies.get(kind).map(|tally| (*kind, tally)))
        .collect();

    // Most levels solved first, then fewest expansions
    rows.sort_by(|a, b| {
        let avg = |t: &Tally| t.total_expanded as f64 / t.solved.max(1) as f64;
        b.1.solved
            .cmp(&a.1.solved)
            .then(avg(a.1).total_cmp(&avg(b.1)))
    });

    for (kind, tally) in rows {
        if tally.solved == 0 {
            println!("Heuristic {:<20}: No levels solved.", kind);
            continue;
        }
        let n = tally.solved as f64;
        println!(
            "Heuristic {:<20}: Solved {}/{}, Average Cost = {:.2}, Average Expanded = {:.1}",
            kind,
            tally.solved,
            NUM_RANDOM_LEVELS_FOR_EVALUATION,
            tally.total_cost / n,
            tally.total_expanded as f64 / n
        );
    }
    Ok(())
}
