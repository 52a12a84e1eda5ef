//! Terminal session player
//!
//! A simple CLI tool for replaying recorded terminal sessions using the
//! recording's own timing. Supports loop bounds, speed control and a
//! run-once mode.

use anyhow::{bail, Result};
use clap::Parser;
use recast_rs::{render_frame, Playback, Session, Tick};
use std::io::Write;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "player")]
#[command(about = "Replay recorded terminal sessions with their original timing")]
#[command(version = "0.1.0")]
struct Cli {
    /// Recording to replay (defaults to session.cast)
    #[arg(value_name = "CAST_FILE", default_value = "session.cast")]
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

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = Session::load(&cli.cast_file)?;
    if session.is_empty() {
        bail!("recording {} has no events", cli.cast_file);
    }

    // Warn when the recording will not fit the current terminal
    let info = session.header().info();
    if let (Some(width), Some((terminal_size::Width(cols), _))) =
        (info.width, terminal_size::terminal_size())
    {
        if width > cols {
            eprintln!(
                "⚠️  Recording is {} columns wide, terminal only has {}",
                width, cols
            );
        }
    }

    let start = cli.start.unwrap_or(0);
    let end = cli.end.unwrap_or(session.len().saturating_sub(1));
    let mut playback = Playback::with_bounds(&session, start, end)?;

    if cli.verbose {
        println!("🎬 Recording: {} ({} events)", cli.cast_file, session.len());
        println!("🔁 Loop bounds: [{}, {}]", start, end);
        println!("🚀 Speed: {}x | Press Ctrl+C to stop", cli.speed);
        println!();
    }

    playback.play();
    while let Some(tick) = playback.tick(&session) {
        match tick {
            Tick::Render { frame, next_delay } => {
                draw(&session, frame)?;
                let adjusted_delay = next_delay.as_secs_f64() / cli.speed;
                if adjusted_delay >= 0.0001 {
                    thread::sleep(Duration::from_secs_f64(adjusted_delay));
                }
            }
            Tick::Looped => {
                if cli.once {
                    break;
                }
            }
        }
    }

    if cli.verbose {
        println!();
        println!("🎊 Playback completed!");
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
