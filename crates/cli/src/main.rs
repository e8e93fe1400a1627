//! RV32IM cache simulator CLI.
//!
//! This binary is the driver for the policy comparison. It performs:
//! 1. **Setup:** Argument parsing, logging, and configuration loading.
//! 2. **Runs:** Two independent executions of the same image, one under true
//!    LRU and one under tree-bit pseudo-LRU.
//! 3. **Reporting:** The hit-rate comparison table on stdout and, when
//!    requested, a post-run register/memory image from the LRU run.

use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::process;

use rvcache_core::common::error::{SimError, SimResult};
use rvcache_core::config::{ReplacementPolicyKind, SimConfig};
use rvcache_core::sim::{loader, Simulation};
use rvcache_core::stats;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    version,
    about = "RV32IM trace-driven cache replacement simulator",
    long_about = "Runs a guest image twice, once under true LRU and once under tree-bit\npseudo-LRU, and prints a hit-rate comparison table.\n\nExamples:\n  cachesim -i image.bin\n  cachesim -i image.bin -o dump.bin 0x1000 256\n  cachesim -i image.bin -d --strict"
)]
struct Cli {
    /// Input register + memory image.
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    input: PathBuf,

    /// Write post-run registers and a memory window, taken after the LRU run.
    #[arg(
        short = 'o',
        long = "output",
        num_args = 3,
        value_names = ["PATH", "START", "SIZE"]
    )]
    output: Option<Vec<String>>,

    /// Enable diagnostic tracing (instruction trace, misalignment warnings,
    /// register dumps).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Fail on unknown opcodes instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// JSON configuration file overriding the built-in defaults.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    // Argument errors exit with code 1; --help and --version stay code 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}

/// Loads the configuration and image, runs both policies, and reports.
fn run(cli: Cli) -> SimResult<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<SimConfig>(&text)
                .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?
        }
        None => SimConfig::default(),
    };
    config.general.trace_instructions |= cli.debug;
    config.general.strict_decode |= cli.strict;
    config.validate()?;

    let output = match &cli.output {
        Some(raw) => Some(parse_output_spec(raw)?),
        None => None,
    };

    let image = loader::load_image(&cli.input)?;

    info!("running {} under LRU", cli.input.display());
    let mut lru = Simulation::new(&config, ReplacementPolicyKind::Lru, &image)?;
    let lru_outcome = lru.run()?;
    debug!(
        "LRU run stopped ({:?}) after {} instructions",
        lru_outcome.reason, lru_outcome.instructions_retired
    );
    if cli.debug {
        lru.cpu.regs.dump();
    }

    info!("running {} under bit-pLRU", cli.input.display());
    let mut plru = Simulation::new(&config, ReplacementPolicyKind::BitPlru, &image)?;
    let plru_outcome = plru.run()?;
    debug!(
        "bit-pLRU run stopped ({:?}) after {} instructions",
        plru_outcome.reason, plru_outcome.instructions_retired
    );
    if cli.debug {
        plru.cpu.regs.dump();
    }

    stats::print_comparison(&lru.stats(), &plru.stats());

    if let Some((path, start, size)) = output {
        loader::write_image(
            &path,
            lru.cpu.pc,
            &lru.cpu.regs,
            lru.cpu.cache.memory(),
            start,
            size,
        )?;
        info!("wrote {} bytes from {:#x} to {}", size, start, path.display());
    }

    Ok(())
}

/// Parses the three-value output specification: path, start address, size.
fn parse_output_spec(raw: &[String]) -> SimResult<(PathBuf, u32, u32)> {
    let path = PathBuf::from(&raw[0]);
    let start = parse_u32(&raw[1])?;
    let size = parse_u32(&raw[2])?;
    Ok((path, start, size))
}

/// Parses a 32-bit value in decimal or `0x`-prefixed hexadecimal.
fn parse_u32(text: &str) -> SimResult<u32> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse::<u32>()
    };
    parsed.map_err(|_| SimError::Config(format!("'{}' is not a valid 32-bit value", text)))
}
