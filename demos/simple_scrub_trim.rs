//! Simple example showing how to scrub through and trim a recorded session

use recast_rs::{export, render_frame, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A small recording: a title update, some typing with a correction,
    // and a screen clear
    let cast = concat!(
        "{\"version\": 2, \"width\": 80, \"height\": 24}\n",
        "[0.1, \"o\", \"\\u001b]2;demo shell\\u0007\"]\n",
        "[0.6, \"o\", \"$ echo helloo\\b\"]\n",
        "[1.4, \"o\", \"\\r\\nhello\\r\\n\"]\n",
        "[2.0, \"o\", \"\\u001b[H\\u001b[2J$ \"]\n",
    );

    let session = Session::parse(cast)?;
    println!("🎬 Loaded {} events", session.len());

    println!("\n📺 Scrubbing through the recording...");
    for index in 0..=session.len() {
        let frame = render_frame(&session, index);
        println!("   frame {}: {:?} (title: {:?})", index, frame.text, frame.title);
    }

    // Cut out the middle of the session, rebased to start at time zero
    let trimmed = export(&session, 1, 2, true)?;
    println!("\n✂️  Trimmed recording:\n{}", trimmed);

    println!("🎉 Done!");
    Ok(())
}
