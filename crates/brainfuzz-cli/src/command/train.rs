use std::path::PathBuf;

use anyhow::Context as _;
use brainfuzz_evolution::{Evolution, EvolutionParams, EvolutionSeed, GenerationReport};
use brainfuzz_program::Program;
use chrono::Utc;
use rand::Rng as _;

use crate::{
    model::TrainedProgram,
    oracle::{DemoOracle, OracleKind},
    util,
};

const DEFAULT_GENERATIONS: u64 = 1000;
const DEFAULT_MAX_LEN: usize = 64;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Built-in scoring oracle
    #[arg(long, default_value = "size")]
    oracle: OracleKind,
    /// Target aggregate size for the `target` oracle
    #[arg(long, default_value_t = 10.0)]
    target: f64,
    /// Number of generations to run
    #[arg(long, default_value_t = DEFAULT_GENERATIONS)]
    generations: u64,
    /// Maximum program length when starting from an empty program
    #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
    max_len: usize,
    /// Run seed as a 32-character hex string (random if omitted)
    #[arg(long)]
    seed: Option<EvolutionSeed>,
    /// Evolution parameters JSON file (defaults if omitted)
    #[arg(long)]
    params: Option<PathBuf>,
    /// Seed program JSON file (empty program if omitted)
    #[arg(long)]
    seed_program: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Only log generations in which the champion improved
    #[arg(long)]
    quiet: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        oracle,
        target,
        generations,
        max_len,
        seed,
        params,
        seed_program,
        output,
        quiet,
    } = arg;

    let params: EvolutionParams = match params {
        Some(path) => util::read_json_file("evolution params", path)?,
        None => EvolutionParams::default(),
    };
    let mut program: Program = match seed_program {
        Some(path) => util::read_json_file("seed program", path)?,
        None => Program::new(*max_len),
    };
    let rng_seed = seed.unwrap_or_else(|| rand::rng().random());

    eprintln!("Training with {} oracle", oracle.name());
    eprintln!("  Seed:        {rng_seed}");
    eprintln!("  Generations: {generations}");
    eprintln!(
        "  Program:     {} tokens (max {})",
        program.len(),
        program.max_len()
    );
    eprintln!("  Population:  {}", params.generation_size);

    let mut evolution = Evolution::new(
        &program,
        DemoOracle::new(*oracle, *target),
        params.clone(),
        rng_seed,
    )
    .context("Failed to start evolution")?;
    eprintln!("  Seed score:  {:.3}", evolution.champion().score());

    for _ in 0..*generations {
        let report = evolution.step();
        if !quiet || report.champion_improved {
            log_report(&report);
        }
    }

    let summary = evolution
        .finish(&mut program)
        .context("Failed to write back the evolved program")?;

    eprintln!("{} oracle training completed.", oracle.name());

    let trained = TrainedProgram {
        name: oracle.name().to_owned(),
        trained_at: Utc::now(),
        generations: summary.generations,
        final_score: summary.final_score,
        final_size: summary.final_size,
        rng_seed,
        params,
        program,
    };
    util::save_json(&trained, output.as_deref())?;

    eprintln!();
    eprintln!("Program saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Trained at: {}", trained.trained_at);
    eprintln!("  Final score: {:.3}", trained.final_score);
    eprintln!("  Final size: {:.3}", trained.final_size);
    eprintln!("  Length: {} tokens", trained.program.len());

    Ok(())
}

fn log_report(report: &GenerationReport) {
    let marker = if report.champion_improved { "*" } else { " " };
    eprint!(
        "{marker}{:5} Best: {:.3} (len {}) Champion: {:.3} (len {}) Alive: {} Survivors: {} Failed: {}",
        report.generation,
        report.best_score,
        report.best_len,
        report.champion_score,
        report.champion_len,
        report.alive,
        report.survivors,
        report.respawn_failures,
    );
    if let Some(stats) = &report.score_stats {
        eprint!(" Mean: {:.3} StdDev: {:.3}", stats.mean, stats.std_dev);
    }
    eprintln!();
}
