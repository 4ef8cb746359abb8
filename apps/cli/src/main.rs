#![deny(warnings)]

//! Headless CLI: load a scenario, run the ascension solver for each goal,
//! and print the resulting schedules.

use anyhow::{Context, Result};
use sim_ascend::{solve, SolverOptions, SolverReport};
use sim_core::{EconomyConfig, EconomyState};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    scenario: Option<String>,
    goals: Vec<f64>,
    start: u64,
    max_oracle_calls: Option<u64>,
    pruning: bool,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        scenario: None,
        goals: Vec::new(),
        start: 0,
        max_oracle_calls: None,
        pruning: true,
        json: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--goal" => {
                let v = it.next().context("--goal needs a value")?;
                args.goals.push(v.parse::<f64>().context("invalid --goal")?);
            }
            "--start" => {
                let v = it.next().context("--start needs a value")?;
                args.start = v.parse().context("invalid --start")?;
            }
            "--max-oracle-calls" => {
                let v = it.next().context("--max-oracle-calls needs a value")?;
                args.max_oracle_calls = Some(v.parse().context("invalid --max-oracle-calls")?);
            }
            "--no-prune" => args.pruning = false,
            "--json" => args.json = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    if args.goals.is_empty() {
        // The reference goal sweep.
        args.goals = vec![5000.0, 50_000.0, 5e8];
    }
    Ok(args)
}

fn load_config(path: Option<&str>) -> Result<EconomyConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {p}"))?;
            let cfg: EconomyConfig = serde_yaml::from_str(&text).with_context(|| format!("parsing {p}"))?;
            Ok(cfg)
        }
        None => Ok(EconomyConfig::default()),
    }
}

fn print_report(goal: f64, baseline: u64, report: &SolverReport) {
    println!(
        "goal {goal:.0}: {} ticks (no-ascend baseline {}){}",
        report.total_time,
        baseline,
        if report.complete { "" } else { " [budget hit, best effort]" }
    );
    for combo in &report.schedule {
        println!("  step {:>6}  x{:.4}", combo.step, combo.multiplier);
    }
    println!(
        "  search: {} nodes, {} oracle calls, pruned {}/{}/{} (time/gain/dominated)",
        report.stats.nodes,
        report.stats.oracle_calls,
        report.stats.pruned_by_best_time,
        report.stats.pruned_by_gain,
        report.stats.pruned_dominated
    );
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args()?;
    let config = load_config(args.scenario.as_deref())?;
    info!(
        scenario = args.scenario.as_deref().unwrap_or("builtin"),
        goals = args.goals.len(),
        start = args.start,
        "starting solver"
    );

    let options = SolverOptions {
        pruning: args.pruning,
        max_oracle_calls: args.max_oracle_calls,
    };
    let state = EconomyState::new(config)?;

    for &goal in &args.goals {
        let report = solve(&state, goal, args.start, &options)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let mut ghost = state.clone();
            let baseline = sim_oracle::time_to_goal(&mut ghost, goal)?;
            print_report(goal, baseline, &report);
        }
    }
    Ok(())
}
