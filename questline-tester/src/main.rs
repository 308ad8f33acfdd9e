mod scenarios;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use scenarios::{Scenario, ScenarioCtx, all_scenarios, scenarios_by_names};

#[derive(Debug, Parser)]
#[command(name = "questline-tester", version = "0.1.0")]
#[command(about = "Automated QA testing for the Questline mission board - deterministic logic scenarios")]
struct Args {
    /// Scenarios to run (comma-separated names, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct ScenarioResult {
    scenario_name: String,
    passed: bool,
    iterations_run: usize,
    successful_iterations: usize,
    failures: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for scenario in all_scenarios() {
            println!("{:<20} {}", scenario.name.bold(), scenario.summary);
        }
        return Ok(());
    }

    println!(
        "{}",
        "Questline mission board tester".bold().underline()
    );

    let names = split_csv(&args.scenarios);
    let selected = scenarios_by_names(&names);
    anyhow::ensure!(
        !selected.is_empty(),
        "no scenarios match {:?}; try --list-scenarios",
        args.scenarios
    );
    let seeds = parse_seeds(&args.seeds)?;

    let start_time = Instant::now();
    let results: Vec<ScenarioResult> = selected
        .iter()
        .map(|scenario| run_scenario(scenario, &seeds, args.iterations, args.verbose))
        .collect();

    write_report(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_scenario(
    scenario: &Scenario,
    seeds: &[u64],
    iterations: usize,
    verbose: bool,
) -> ScenarioResult {
    let mut failures = Vec::new();
    let mut successes = 0usize;
    let mut runs = 0usize;

    for &seed in seeds {
        for iteration in 0..iterations {
            runs += 1;
            // Each iteration gets its own engine seeded deterministically.
            let iteration_seed = seed.wrapping_add(iteration as u64);
            let mut ctx = ScenarioCtx::new(iteration_seed, scenario.mode);
            match (scenario.run)(&mut ctx) {
                Ok(()) => successes += 1,
                Err(err) => {
                    log::warn!("{}: seed {iteration_seed:#x}: {err:#}", scenario.name);
                    failures.push(format!("seed {iteration_seed:#x}: {err:#}"));
                }
            }
        }
    }

    let passed = failures.is_empty();
    let marker = if passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("{marker} {:<20} {successes}/{runs} iterations", scenario.name);
    if verbose {
        for failure in &failures {
            println!("      {}", failure.dimmed());
        }
    }

    ScenarioResult {
        scenario_name: scenario.name.to_string(),
        passed,
        iterations_run: runs,
        successful_iterations: successes,
        failures,
    }
}

fn write_report(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let elapsed = start_time.elapsed();
    match args.report.as_str() {
        "json" => {
            let payload = serde_json::json!({
                "elapsed_ms": elapsed.as_millis() as u64,
                "results": results,
            });
            let rendered = serde_json::to_string_pretty(&payload)?;
            match &args.output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("creating report at {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    writeln!(writer, "{rendered}")?;
                }
                None => {
                    let mut out = stdout().lock();
                    writeln!(out, "{rendered}")?;
                }
            }
        }
        _ => {
            let total: usize = results.iter().map(|r| r.iterations_run).sum();
            let ok: usize = results.iter().map(|r| r.successful_iterations).sum();
            println!(
                "\n{} {ok}/{total} iterations in {:.2}s",
                "Summary:".bold(),
                elapsed.as_secs_f64()
            );
        }
    }
    Ok(())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_seeds(value: &str) -> Result<Vec<u64>> {
    split_csv(value)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect()
}
