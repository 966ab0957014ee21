use std::{
    fs,
    io::{self, IsTerminal},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use sched_sim::{
    Algorithm, Sim, WorkloadSpec,
    core::Ticks,
    sim::{Detailed, GeneratorConfig, Summary, WorkloadGenerator},
};

/// Discrete-event simulator for uniprocessor CPU scheduling policies.
///
/// Reads a workload description from --input or a pipe on stdin. With no
/// workload a synthetic one is generated and saved for later replay.
#[derive(Debug, Parser)]
struct Opts {
    /// Print per-process timings after each summary line.
    #[clap(short = 'd', long, action = clap::ArgAction::SetTrue)]
    detailed: bool,

    /// Print every process state transition. Specify twice for debug
    /// logging, three times for engine traces.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Policy to simulate: FCFS, SJF, SRTN or RR<quantum>. May be repeated;
    /// defaults to FCFS, SJF, SRTN, RR10, RR50 and RR100.
    #[clap(short = 'a', long = "algorithm")]
    algorithms: Vec<Algorithm>,

    /// Workload description file.
    #[clap(short = 'i', long, conflicts_with = "generate")]
    input: Option<PathBuf>,

    /// Generate this many processes instead of reading a workload.
    #[clap(short = 'g', long)]
    generate: Option<usize>,

    /// Process switch overhead for generated workloads.
    #[clap(long, default_value = "5")]
    overhead: Ticks,

    /// Seed for the workload generator.
    #[clap(long)]
    seed: Option<u64>,

    /// Where to save a generated workload description.
    #[clap(long, default_value = "generated_processes.txt")]
    save: PathBuf,
}

fn read_input(opts: &Opts) -> Result<Option<String>> {
    if let Some(path) = &opts.input {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read workload from {}", path.display()))?;
        return Ok(Some(text));
    }

    if opts.generate.is_some() || io::stdin().is_terminal() {
        return Ok(None);
    }

    let text = io::read_to_string(io::stdin()).context("Failed to read workload from stdin")?;
    Ok(Some(text).filter(|text| !text.trim().is_empty()))
}

fn generate_workload(opts: &Opts) -> Result<WorkloadSpec> {
    let count = opts.generate.unwrap_or(GeneratorConfig::default().count);
    info!("No input provided. Generating {count} random processes...");

    let config = GeneratorConfig {
        count,
        switch_overhead: opts.overhead,
        seed: opts.seed,
        ..Default::default()
    };
    let spec = WorkloadGenerator::new(config)?.generate();

    let mut out = fs::File::create(&opts.save)
        .with_context(|| format!("Failed to create {}", opts.save.display()))?;
    spec.write_description(&mut out)
        .with_context(|| format!("Failed to write {}", opts.save.display()))?;
    info!("Random processes saved to '{}'", opts.save.display());

    Ok(spec)
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let llv = match opts.verbose {
        0 | 1 => simplelog::LevelFilter::Info,
        2 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Off)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let spec = match read_input(&opts)? {
        Some(text) => WorkloadSpec::parse(&text).context("Invalid workload description")?,
        None => generate_workload(&opts)?,
    };
    let mut sim = Sim::from_spec(&spec)?;

    let algorithms = if opts.algorithms.is_empty() {
        Algorithm::defaults()
    } else {
        opts.algorithms.clone()
    };

    for algorithm in algorithms {
        let report = if opts.verbose > 0 {
            sim.run_traced(algorithm, |transition| println!("{transition}"))
        } else {
            sim.run(algorithm)
        };

        if opts.detailed {
            println!("{}", Detailed(&report));
        } else {
            println!("{}", Summary(&report));
        }
    }

    Ok(())
}
