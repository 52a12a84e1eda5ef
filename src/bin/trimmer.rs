//! Terminal session trimmer
//!
//! Cuts a recording down to an inclusive frame range and saves it as a new
//! recording, optionally rebasing timestamps so the result starts at time
//! zero.

use anyhow::{bail, Result};
use clap::Parser;
use recast_rs::{export_to_path, Session};
use std::path::Path;

#[derive(Parser)]
#[command(name = "trimmer")]
#[command(about = "Trim recorded terminal sessions down to a frame range")]
#[command(version = "0.1.0")]
struct Cli {
    /// Recording to trim
    #[arg(value_name = "CAST_FILE")]
    cast_file: String,

    /// First frame of the range
    #[arg(short, long)]
    start: usize,

    /// Last frame of the range (inclusive)
    #[arg(short, long)]
    end: usize,

    /// Rebase timestamps so the trimmed recording starts at time zero
    #[arg(short, long)]
    retime: bool,

    /// Output file for the trimmed recording
    #[arg(short, long, default_value = "trimmed.cast")]
    output: String,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = Session::load(&cli.cast_file)?;

    if Path::new(&cli.output).exists() && !cli.force {
        bail!(
            "output file {} already exists (use --force to overwrite)",
            cli.output
        );
    }

    if cli.verbose {
        println!("🎬 Recording: {} ({} events)", cli.cast_file, session.len());
        println!("✂️  Range: [{}, {}]", cli.start, cli.end);
        println!(
            "⏱️  Timestamps: {}",
            if cli.retime { "rebased to zero" } else { "unchanged" }
        );
        println!();
    }

    export_to_path(&session, &cli.output, cli.start, cli.end, cli.retime)?;

    println!(
        "✅ Trimmed {} of {} events into {}",
        cli.end - cli.start + 1,
        session.len(),
        cli.output
    );

    Ok(())
}
