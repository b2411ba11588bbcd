//! Command line front end: solve a single instance file, or recursively
//! discover and solve every `.smt` instance below a directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use itertools::Itertools;
use log::LevelFilter;

use rcpspt::{parser, validate, Scheduler, DEFAULT_PASSES};

const FILE_EXTENSION: &str = "smt";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Problem instance file, or a directory searched recursively for
    /// `.smt` instance files (directory mode requires OUTPUT)
    instance: PathBuf,

    /// File the per-instance results are written to (directory mode only)
    output: Option<PathBuf>,

    /// Number of tournament passes per instance
    #[arg(short, long, default_value_t = DEFAULT_PASSES)]
    passes: usize,

    /// Fixed seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log preprocessing and per-pass details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init();

    if let Err(e) = run(args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let scheduler = Scheduler::Tournament {
        passes: args.passes,
        seed: args.seed,
    };
    if args.instance.is_dir() {
        let output = args
            .output
            .as_deref()
            .context("directory mode needs an output file argument")?;
        solve_directory(&args.instance, output, &scheduler)
    } else {
        solve_single(&args.instance, &scheduler)
    }
}

fn solve_single(path: &Path, scheduler: &Scheduler) -> anyhow::Result<()> {
    println!("File: {}", path.display());
    println!();

    let problem = parse_instance(path)?;
    let start = Instant::now();
    let result = scheduler.schedule(&problem);
    let millis = start.elapsed().as_millis();

    match result {
        Ok((solution, _)) => {
            println!("Makespan: {}", solution.value);
            println!();
            println!("Took {millis} ms");
            let valid = validate::validate(&problem, &solution.finish).is_ok();
            println!("Valid? {valid}");
        }
        Err(_) => {
            println!("Found no feasible solution.");
            println!("Took {millis} ms");
        }
    }
    Ok(())
}

/// Recursively find all `.smt` instance files under `directory`, solve them
/// in lexicographic path order, and write one result block per instance to
/// `output`. Progress is reported to standard output in 1% increments.
fn solve_directory(directory: &Path, output: &Path, scheduler: &Scheduler) -> anyhow::Result<()> {
    println!("Test data directory: {}", directory.display());
    let file = File::create(output)
        .with_context(|| format!("can't create or open output file {}", output.display()))?;
    let mut out = BufWriter::new(file);

    let mut paths = Vec::new();
    collect_instances(directory, &mut paths)?;
    let paths = paths.into_iter().sorted().collect_vec();

    println!("Solving {} problems...", paths.len());
    let step = (paths.len() / 100).max(1);
    for (i, path) in paths.iter().enumerate() {
        let problem = parse_instance(path)?;
        let start = Instant::now();
        let result = scheduler.schedule(&problem);
        let millis = start.elapsed().as_millis();

        writeln!(out, "{}", path.display())?;
        match &result {
            Ok((solution, _)) => writeln!(out, "makespan {}", solution.value)?,
            Err(_) => writeln!(out, "nosolution")?,
        }
        writeln!(out, "cpu_milis {millis}")?;
        writeln!(out)?;

        if let Ok((solution, _)) = &result {
            if validate::validate(&problem, &solution.finish).is_err() {
                println!("Invalid solution: {}", path.display());
            }
        }
        if i % step == 0 {
            println!("{}%", i / step);
        }
    }

    out.flush()?;
    println!();
    println!("Results written to output file: {}", output.display());
    Ok(())
}

fn parse_instance(path: &Path) -> anyhow::Result<rcpspt::Problem> {
    let file =
        File::open(path).with_context(|| format!("can't open input file {}", path.display()))?;
    parser::parse_instance(file).with_context(|| format!("can't parse {}", path.display()))
}

fn collect_instances(directory: &Path, paths: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("can't read directory {}", directory.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_instances(&path, paths)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(FILE_EXTENSION) {
            paths.push(path);
        }
    }
    Ok(())
}
