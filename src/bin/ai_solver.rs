use anyhow::{bail, Context};
use clap::Parser;
use sokoban_solver::config::SearchConfig;
use sokoban_solver::engine::{actions_to_lurd, Game, Level};
use sokoban_solver::heuristics::HeuristicKind;
use sokoban_solver::solver::{BestFirstSearch, SearchStats, StepOutcome};
use sokoban_solver::utils::level_from_str;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the level file (XSB notation)
    level_file: PathBuf,

    /// Heuristic used to order the search; overrides the config file
    #[clap(long, value_enum)]
    heuristic: Option<HeuristicKind>,

    /// TOML file with solver settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Give up after this many expansions; overrides the config file
    #[clap(short, long)]
    max_expansions: Option<u64>,

    /// Advance the search this many steps per tick instead of all at once
    #[clap(short, long)]
    steps_per_tick: Option<u32>,
}

fn read_level_file(path: &Path) -> anyhow::Result<Level> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    level_from_str(&content).with_context(|| format!("invalid level in {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if let Some(heuristic) = args.heuristic {
        config.heuristic = heuristic;
    }
    if args.max_expansions.is_some() {
        config.max_expansions = args.max_expansions;
    }
    if args.steps_per_tick.is_some() {
        config.steps_per_tick = args.steps_per_tick;
    }
    config.validate();

    let level = read_level_file(&args.level_file)?;
    println!("Loaded level from {}\n", args.level_file.display());
    println!("Initial level state:\n{}\n", level);
    println!(
        "Searching with heuristic {} ({:?} duplicates)...\n",
        config.heuristic, config.duplicate_policy
    );

    let evaluator = config.heuristic.evaluator(level.goal_positions());
    let mut search = BestFirstSearch::with_policy(&level, evaluator, config.duplicate_policy);
    let started = Instant::now();

    let steps_per_tick = config.steps_per_tick.unwrap_or(u32::MAX).max(1);
    let tick = Duration::from_millis(config.tick_interval_ms);
    let paced = config.steps_per_tick.is_some();
    let mut ticks = 0u64;

    let outcome = 'search: loop {
        for _ in 0..steps_per_tick {
            let outcome = search.step();
            if outcome != StepOutcome::Running {
                break 'search outcome;
            }
            if let Some(budget) = config.max_expansions {
                if search.stats().expanded >= budget {
                    report_stats(&search.stats(), started.elapsed());
                    bail!("expansion budget of {budget} spent without reaching a goal");
                }
            }
        }
        ticks += 1;
        if paced {
            tracing::info!(
                tick = ticks,
                expanded = search.stats().expanded,
                open = search.open_len(),
                closed = search.closed_len(),
                "search progress"
            );
            thread::sleep(tick);
        }
    };

    let stats = search.stats();
    match outcome {
        StepOutcome::Success(actions) => {
            println!("Solution found:\n");
            if actions.is_empty() {
                println!("  Level is already solved.");
            } else {
                println!("Moves ({}): {}", actions.len(), actions_to_lurd(&actions));
            }
            println!("Cost: {}", search.solution_cost().unwrap_or_default());
            report_stats(&stats, started.elapsed());

            let mut game = Game::new(level.clone());
            if !game.replay(&actions) {
                bail!("solution does not replay on the level");
            }
            println!(
                "\nPushes: {}\nFinal level state:\n{}\n",
                game.pushes(),
                level.render(game.state())
            );
        }
        StepOutcome::Failure => {
            println!("No solution found.\n");
            report_stats(&stats, started.elapsed());
        }
        StepOutcome::Running => unreachable!("search loop only breaks on a terminal outcome"),
    }
    Ok(())
}

fn report_stats(stats: &SearchStats, elapsed: Duration) {
    println!("Search stats: {stats}");
    println!("Elapsed: {:.3}s", elapsed.as_secs_f64());
}
