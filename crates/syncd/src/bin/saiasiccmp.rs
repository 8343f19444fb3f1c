//! Offline ASIC view comparison.
//!
//! Loads two syncd snapshots of the same switch and reports the operations
//! that would take the first one to the second. Exits 0 when the views are
//! equal, 1 otherwise.

use anyhow::{ensure, Context};
use clap::Parser;
use log::{error, info, warn};
use sonic_syncd::{compare_snapshots, ApplyViewConfig, Snapshot};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compare two ASIC snapshots
#[derive(Parser, Debug)]
#[command(name = "saiasiccmp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at info level (same as --log-level info)
    #[arg(short = 'i', long = "enableLogLevelInfo")]
    info: bool,

    /// Print the differences to stderr
    #[arg(short = 'd', long = "dumpDiffToStdErr")]
    dump_diff: bool,

    /// Apply-view configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    /// Current view snapshot
    file1: PathBuf,

    /// Requested view snapshot
    file2: PathBuf,
}

fn compare(args: &Args) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => ApplyViewConfig::load_or_default(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ApplyViewConfig::default(),
    };
    config.validate()?;

    let a = Snapshot::load(&args.file1).with_context(|| format!("loading {}", args.file1.display()))?;
    let b = Snapshot::load(&args.file2).with_context(|| format!("loading {}", args.file2.display()))?;
    ensure!(
        a.switch_vid() == b.switch_vid(),
        "snapshots belong to different switches: {} vs {}",
        a.switch_vid(),
        b.switch_vid()
    );

    let ops = compare_snapshots(&a, &b, &config)?;
    if ops.is_empty() {
        info!("views are equal");
        return Ok(true);
    }

    warn!("views are NOT EQUAL, operations count: {}", ops.len());
    if args.dump_diff {
        eprintln!("views are NOT EQUAL, operations count: {}", ops.len());
    }
    for op in &ops {
        info!("{}: {}", op.kind, op.key);
        if args.dump_diff {
            eprintln!("{}: {}", op.kind, op.key);
        }
        for (field, value) in op.fields() {
            info!("- {field} {value}");
            if args.dump_diff {
                eprintln!("- {field} {value}");
            }
        }
    }
    Ok(false)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.info { "info" } else { args.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match compare(&args) {
        Ok(true) => {
            println!("views are equal");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Exception: {e:#}");
            ExitCode::FAILURE
        }
    }
}
