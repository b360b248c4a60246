//! Tomasulo simulator CLI.
//!
//! This binary assembles a program file, runs it on the engine, and reports:
//! 1. **Timing table:** Issue / exec-start / exec-end / write-back per instruction.
//! 2. **Registers:** Final integer and FP register contents.
//! 3. **Statistics:** Cycle, stall, and cache counters.
//!
//! Configuration comes from an optional JSON file (any subset of fields;
//! the rest fall back to defaults).

use clap::Parser;
use std::{fs, process};

use tomasulo_core::SimConfig;
use tomasulo_core::engine::Engine;
use tomasulo_core::isa::asm;

#[derive(Parser, Debug)]
#[command(
    name = "tomasim",
    version,
    about = "Cycle-accurate Tomasulo dynamic-scheduling simulator",
    long_about = "Assemble a program and run it cycle by cycle on a Tomasulo machine.\n\nExamples:\n  tomasim program.asm\n  tomasim program.asm --config machine.json --trace\n  tomasim program.asm --cycles 40"
)]
struct Cli {
    /// Assembly program to run.
    program: String,

    /// JSON configuration file (stations, latencies, cache). Defaults apply
    /// to any omitted field.
    #[arg(short, long)]
    config: Option<String>,

    /// Stop after exactly this many cycles instead of running to quiescence.
    #[arg(long)]
    cycles: Option<u64>,

    /// Safety cap when running to quiescence.
    #[arg(long, default_value_t = 100_000)]
    max_cycles: u64,

    /// Print a one-line summary of every cycle.
    #[arg(long)]
    trace: bool,

    /// Dump the full register files after the run.
    #[arg(long)]
    regs: bool,
}

fn main() {
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.program).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.program, e);
        process::exit(1);
    });

    let program = asm::assemble(&source).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            });
            serde_json::from_str::<SimConfig>(&text).unwrap_or_else(|e| {
                eprintln!("Error in {}: {}", path, e);
                process::exit(1);
            })
        }
        None => SimConfig::default(),
    };

    let mut engine = Engine::new(program, &config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    run(&mut engine, &cli);

    print_timing_table(&engine);
    if cli.regs {
        println!();
        engine.registers().dump();
    }
    println!();
    let cache = &engine.state().cache;
    engine.stats().print(cache.hits, cache.misses);
}

/// Steps the engine until quiescence, the requested cycle count, or the cap.
fn run(engine: &mut Engine, cli: &Cli) {
    let limit = cli.cycles.unwrap_or(cli.max_cycles);
    for _ in 0..limit {
        let report = match engine.next_cycle() {
            Ok(report) => report,
            Err(e) => {
                eprintln!("\n[!] FATAL at cycle {}: {}", engine.cycle(), e);
                process::exit(1);
            }
        };
        if cli.trace {
            println!(
                "cycle {:>4}  pc={:<3} issued={} wb={} commits={} executing={}",
                report.cycle,
                engine.pc(),
                report.issued as u8,
                report.wrote_back as u8,
                report.stores_committed,
                report.units_executing
            );
        }
        // When running to quiescence, stop at the first idle cycle.
        if cli.cycles.is_none() && !report.made_progress() {
            break;
        }
    }
}

/// Prints the per-instruction timing table.
fn print_timing_table(engine: &Engine) {
    let fmt = |stamp: Option<u64>| match stamp {
        Some(c) => c.to_string(),
        None => "-".to_string(),
    };

    println!("Idx | Issue | ExecStart | ExecEnd | WriteBack | Instruction");
    println!("----+-------+-----------+---------+-----------+------------");
    for (instr, timing) in engine.program().instructions().iter().zip(engine.timings()) {
        println!(
            "{:>3} | {:>5} | {:>9} | {:>7} | {:>9} | {}",
            instr.index,
            fmt(timing.issue),
            fmt(timing.exec_start),
            fmt(timing.exec_end),
            fmt(timing.write_back),
            instr.text
        );
    }
}
