//! Runs a program on the MMC virtual machine.
//!
//! Assembles a source file (or loads a program image produced by the
//! `assembler` binary), runs it from address 0 and streams its output to
//! stdout in fixed-width chunks, one chunk per line.
//!
//! # Usage
//! ```text
//! mmc <program.asm|program.bin> [OPTIONS]
//! ```
//!
//! # Options
//! - `-i, --input <v1,v2,...>`: Pre-supplied input values (defaults to prompting on the console)
//! - `-s, --max-steps <n>`: Abort after `n` instructions
//! - `-w, --width <n>`: Characters per output chunk
//! - `-p, --profile`: Print the execution profile after the run
//! - `-t, --trace`: Log every executed instruction
//!
//! # Environment
//! `MMC_MAX_STEPS`, `MMC_OUTPUT_WIDTH` and `MMC_LOG` provide defaults for the
//! options above; flags take precedence.

use mmc::config::{RunConfig, parse_positive};
use mmc::machine::assembler::assemble_file;
use mmc::machine::errors::MachineError;
use mmc::machine::program::Program;
use mmc::machine::vm::{
    ExecutionProfile, InputSource, LineInput, QueuedInput, StreamOutput, VM,
};
use mmc::utils::log::Level;
use mmc::{error, info};
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut config = RunConfig::from_env().unwrap_or_else(|e| {
        error!("{e}");
        process::exit(1)
    });

    let program_path = &args[1];
    let mut inputs: Option<Vec<i64>> = None;
    let mut show_profile = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--input" | "-i" | "--max-steps" | "-s" | "--width" | "-w") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                let value = &args[i];
                let parsed = match k {
                    "--input" | "-i" => parse_inputs(value).map(|v| inputs = Some(v)),
                    "--max-steps" | "-s" => {
                        parse_positive(k, value).map(|n| config.max_steps = Some(n))
                    }
                    _ => parse_positive(k, value).map(|n| config.output_width = n),
                };
                if let Err(e) = parsed {
                    error!("{e}");
                    process::exit(1);
                }
                i += 1;
            }
            "--profile" | "-p" => {
                show_profile = true;
                i += 1;
            }
            "--trace" | "-t" => {
                config.log_level = Level::Debug;
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    config.apply_logging();

    let program = load_program(program_path).unwrap_or_else(|e| {
        error!("Failed to load {}: {}", program_path, e);
        process::exit(1)
    });

    let mut input: Box<dyn InputSource> = match inputs {
        Some(values) => Box::new(QueuedInput::new(values)),
        None => Box::new(LineInput::stdin()),
    };

    let mut vm = VM::with_output(StreamOutput::new(io::stdout().lock(), config.output_width));
    if let Err(e) = vm.load(program.words()) {
        error!("{e}");
        process::exit(1);
    }

    let result = match config.max_steps {
        Some(limit) => vm.run_with_limit(&mut *input, limit),
        None => vm.run(&mut *input),
    };

    if let Err(e) = vm.output_mut().finish() {
        error!("{e}");
    }

    if show_profile {
        print_profile(vm.profile());
    }

    match result {
        Ok(()) => info!("Halted after {} steps", vm.steps()),
        Err(e) => {
            error!(
                "Execution failed at address {} after {} steps: {}",
                vm.current_ip(),
                vm.steps(),
                e
            );
            process::exit(1);
        }
    }
}

/// Loads a program image (`.bin`) or assembles anything else.
fn load_program(path: &str) -> Result<Program, MachineError> {
    if Path::new(path).extension().is_some_and(|ext| ext == "bin") {
        let bytes = fs::read(path).map_err(|e| MachineError::IoError {
            path: path.to_string(),
            source: e.to_string(),
        })?;
        Program::from_bytes(&bytes)
    } else {
        assemble_file(path)
    }
}

fn parse_inputs(value: &str) -> Result<Vec<i64>, MachineError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| MachineError::InvalidConfig {
                key: "--input".to_string(),
                value: part.to_string(),
                reason: "expected a decimal integer",
            })
        })
        .collect()
}

fn print_profile(profile: &ExecutionProfile) {
    let total_u = profile.total();
    let total = total_u as f64;

    let cat_w = 2 + profile
        .iter()
        .map(|(c, _)| c.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("total".chars().count());

    let amt_w = profile
        .iter()
        .map(|(_, a)| format_with_commas(a).chars().count())
        .max()
        .unwrap_or(0)
        .max(format_with_commas(total_u).chars().count());

    let dash_w = cat_w + 1 + amt_w + 2 + "( 100.0%)".len();

    println!("Execution Profile:");
    println!("{}", "-".repeat(dash_w));

    for (class, count) in profile.iter() {
        if count == 0 {
            continue;
        }

        let percent = if total > 0.0 {
            (count as f64 / total) * 100.0
        } else {
            0.0
        };

        println!(
            "{:<cat_w$} {:>amt_w$} ({:>5.1}%)",
            class.as_str(),
            format_with_commas(count),
            percent,
        );
    }

    println!("{}", "-".repeat(dash_w));
    println!(
        "{:<cat_w$} {:>amt_w$} ({:>5.1}%)",
        "total",
        format_with_commas(total_u),
        100.0,
    );
}

fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

const USAGE: &str = "\
MMC Runner

USAGE:
    {program} <program.asm|program.bin> [OPTIONS]

ARGS:
    <program>    Assembly source, or a program image ending in .bin

OPTIONS:
    -i, --input <v1,v2,...>   Input values for INP (defaults to console prompts)
    -s, --max-steps <n>       Abort after n instructions
    -w, --width <n>           Characters per output chunk (default 4)
    -p, --profile             Print the execution profile
    -t, --trace               Log every executed instruction
    -h, --help                Print this help message

ENVIRONMENT:
    MMC_MAX_STEPS, MMC_OUTPUT_WIDTH, MMC_LOG=debug|info|warn|error

EXAMPLES:
    # Run a source file, prompting for input
    {program} countdown.asm

    # Run an assembled image with queued input and a step budget
    {program} countdown.bin -i 10 -s 10000 -p
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
