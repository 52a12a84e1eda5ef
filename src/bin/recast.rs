//! Combined terminal session inspector, player and trimmer
//!
//! A unified CLI tool for working with recorded terminal sessions: show
//! recording metadata, replay with original timing, reconstruct the screen
//! at any frame, or trim a range into a new recording.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use recast_rs::{export_to_path, render_frame, Playback, Session, Tick};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Scrub, replay and trim recorded terminal sessions")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recording metadata and size
    Info {
        /// Recording to inspect
        #[arg(value_name = "CAST_FILE")]
        cast_file: String,
    },
    /// Replay a recording with its original timing
    Play {
        /// Recording to replay
        #[arg(value_name = "CAST_FILE")]
        cast_file: String,

        /// First frame of the playback loop (defaults to the start)
        #[arg(short, long)]
        start: Option<usize>,

        /// Last frame of the playback loop (defaults to the end)
        #[arg(short, long)]
        end: Option<usize>,

        /// Playback speed multiplier (1.0 = normal, 2.0 = 2x speed, 0.5 = half speed)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Stop after one pass instead of looping
        #[arg(short, long)]
        once: bool,
    },
    /// Print the reconstructed screen at a frame index
    Frame {
        /// Recording to scrub
        #[arg(value_name = "CAST_FILE")]
        cast_file: String,

        /// Frame index to reconstruct (0 = before any output)
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Also print the window title, if one was set
        #[arg(short, long)]
        title: bool,
    },
    /// Trim a frame range into a new recording
    Trim {
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
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { cast_file } => {
            let session = Session::load(&cast_file)?;
            let info = session.header().info();

            println!("🎬 {}", cast_file);
            if let Some(version) = info.version {
                println!("   📦 Format version: {}", version);
            }
            if let (Some(width), Some(height)) = (info.width, info.height) {
                println!("   📐 Terminal size: {}x{}", width, height);
            }
            if let Some(title) = &info.title {
                println!("   🪟 Title: {}", title);
            }
            if let Some(command) = &info.command {
                println!("   🖥️  Command: {}", command);
            }
            if let Some(shell) = &info.shell {
                println!("   🐚 Shell: {}", shell);
            }
            let outputs = session.events().iter().filter(|e| e.is_output()).count();
            println!("   🎞  Events: {} ({} output)", session.len(), outputs);
            if let Some(last) = session.events().last() {
                println!("   ⏱️  Duration: {:.3}s", last.timestamp);
            }
        }
        Commands::Play {
            cast_file,
            start,
            end,
            speed,
            once,
        } => {
            let session = Session::load(&cast_file)?;
            if session.is_empty() {
                bail!("recording {} has no events", cast_file);
            }
            let start = start.unwrap_or(0);
            let end = end.unwrap_or(session.len().saturating_sub(1));
            let mut playback = Playback::with_bounds(&session, start, end)?;

            playback.play();
            while let Some(tick) = playback.tick(&session) {
                match tick {
                    Tick::Render { frame, next_delay } => {
                        draw(&session, frame)?;
                        let adjusted_delay = next_delay.as_secs_f64() / speed;
                        if adjusted_delay >= 0.0001 {
                            thread::sleep(Duration::from_secs_f64(adjusted_delay));
                        }
                    }
                    Tick::Looped => {
                        if once {
                            break;
                        }
                    }
                }
            }
        }
        Commands::Frame {
            cast_file,
            index,
            title,
        } => {
            let session = Session::load(&cast_file)?;
            let frame = render_frame(&session, index);
            print!("{}", frame.text);
            if title {
                match frame.title {
                    Some(t) => println!("🪟 Title: {}", t),
                    None => println!("🪟 Title: (none)"),
                }
            }
        }
        Commands::Trim {
            cast_file,
            start,
            end,
            retime,
            output,
            force,
        } => {
            let session = Session::load(&cast_file)?;

            if Path::new(&output).exists() && !force {
                bail!(
                    "output file {} already exists (use --force to overwrite)",
                    output
                );
            }

            export_to_path(&session, &output, start, end, retime)?;
            println!(
                "✅ Trimmed {} of {} events into {}",
                end - start + 1,
                session.len(),
                output
            );
        }
    }

    Ok(())
}

/// Redraw the terminal with the reconstructed screen at `frame_index`.
fn draw(session: &Session, frame_index: usize) -> Result<()> {
    let frame = render_frame(session, frame_index);

    let mut stdout = std::io::stdout();
    write!(stdout, "\u{1b}[H\u{1b}[2J{}", frame.text)?;
    if let Some(title) = &frame.title {
        write!(stdout, "\u{1b}]2;{}\u{7}", title)?;
    }
    stdout.flush()?;

    Ok(())
}
