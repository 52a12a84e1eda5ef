//! Integration tests for recast-rs
//!
//! These tests walk a realistic recorded shell session end to end: loading,
//! scrubbing to arbitrary frames, timed playback, trimming and reloading the
//! trimmed result, including file I/O.

use recast_rs::{
    export, export_to_path, render_frame, Playback, Session, Tick,
};
use std::fs::{self, File};
use std::io::Write;

/// Helper function to create a unique test file name
fn test_file_name(base: &str) -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", base, timestamp)
}

/// Helper function to clean up test files
fn cleanup_files(files: &[&str]) {
    for file in files {
        fs::remove_file(file).unwrap_or(());
    }
}

/// A recorded interactive session: title update, bracketed-paste chatter,
/// colored prompt, typing with a correction, command output, and a clear.
fn sample_session() -> Session {
    let events: &[(f64, &str, &str)] = &[
        (0.05, "o", "\u{1b}]2;user@host: ~\u{7}"),
        (0.12, "o", "\u{1b}[?2004h\u{1b}[1;32m$\u{1b}[0m "),
        (0.80, "o", "echo hii"),
        (1.10, "o", "\u{8}"),
        (1.35, "o", "\r\n"),
        (1.36, "i", "echo hi\r"),
        (1.40, "o", "\u{1b}[?2004lhi\r\n"),
        (2.00, "o", "\u{1b}[H\u{1b}[2J\u{1b}[1;32m$\u{1b}[0m "),
    ];
    let mut cast =
        String::from("{\"version\": 2, \"width\": 80, \"height\": 24, \"title\": \"demo\"}\n");
    for (timestamp, kind, payload) in events {
        cast.push_str(&serde_json::to_string(&(timestamp, kind, payload)).unwrap());
        cast.push('\n');
    }
    Session::parse(&cast).unwrap()
}

#[test]
fn test_scrub_through_session() {
    let session = sample_session();

    // Nothing visible before any event
    let frame = render_frame(&session, 0);
    assert_eq!(frame.text, "");
    assert_eq!(frame.title, None);

    // The title event sets the window title without producing text
    let frame = render_frame(&session, 1);
    assert_eq!(frame.text, "");
    assert_eq!(frame.title.as_deref(), Some("user@host: ~"));

    // The prompt keeps its color codes but loses the paste-mode toggle
    let frame = render_frame(&session, 2);
    assert_eq!(frame.text, "\u{1b}[1;32m$ ");

    // Typing, then the backspace correction from the next event
    let frame = render_frame(&session, 3);
    assert_eq!(frame.text, "\u{1b}[1;32m$ echo hii");
    let frame = render_frame(&session, 4);
    assert_eq!(frame.text, "\u{1b}[1;32m$ echo hi");

    // Command output; the input event contributes nothing
    let frame = render_frame(&session, 7);
    assert_eq!(frame.text, "\u{1b}[1;32m$ echo hi\r\nhi\r\n");

    // The final clear leaves only the fresh prompt, title intact
    let frame = render_frame(&session, 8);
    assert_eq!(frame.text, "\u{1b}[1;32m$ ");
    assert_eq!(frame.title.as_deref(), Some("user@host: ~"));
}

#[test]
fn test_playback_covers_loop_range() {
    let session = sample_session();
    let mut playback = Playback::with_bounds(&session, 1, 4).unwrap();
    playback.play();

    let mut frames = Vec::new();
    loop {
        match playback.tick(&session).unwrap() {
            Tick::Render { frame, .. } => {
                // Rendering inside the tick loop must match scrubbing
                assert_eq!(render_frame(&session, frame), render_frame(&session, frame));
                frames.push(frame);
            }
            Tick::Looped => break,
        }
    }
    assert_eq!(frames, vec![1, 2, 3]);
    assert_eq!(playback.current_frame(), 1);
}

#[test]
fn test_trim_reload_and_scrub() {
    let session = sample_session();

    // Trim the typing portion, rebased to zero
    let exported = export(&session, 2, 6, true).unwrap();
    let trimmed = Session::parse(&exported).unwrap();

    assert_eq!(trimmed.len(), 5);
    assert_eq!(trimmed.events()[0].timestamp, 0.0);
    assert_eq!(trimmed.header(), session.header());

    // The trimmed session renders on its own, without the events before it
    let frame = render_frame(&trimmed, trimmed.len());
    assert_eq!(frame.text, "echo hi\r\nhi\r\n");
    assert_eq!(frame.title, None);
}

#[test]
fn test_save_load_cycle_on_disk() {
    let full_file = test_file_name("session.cast");
    let trimmed_file = test_file_name("trimmed.cast");

    let session = sample_session();
    export_to_path(&session, &full_file, 0, session.len() - 1, false).unwrap();

    let reloaded = Session::load(&full_file).unwrap();
    assert_eq!(reloaded.events(), session.events());
    assert_eq!(reloaded.header(), session.header());

    // Every frame of the reloaded session matches the original
    for index in 0..=session.len() {
        assert_eq!(render_frame(&reloaded, index), render_frame(&session, index));
    }

    // Trim on disk, then reload the trimmed recording
    export_to_path(&reloaded, &trimmed_file, 1, 3, true).unwrap();
    let trimmed = Session::load(&trimmed_file).unwrap();
    assert_eq!(trimmed.len(), 3);
    assert_eq!(trimmed.events()[0].timestamp, 0.0);

    cleanup_files(&[&full_file, &trimmed_file]);
}

#[test]
fn test_load_rejects_corrupt_file() {
    let cast_file = test_file_name("corrupt.cast");

    let mut file = File::create(&cast_file).unwrap();
    writeln!(file, "{{\"version\": 2, \"width\": 80, \"height\": 24}}").unwrap();
    writeln!(file, "[0.1, \"o\", \"fine\"]").unwrap();
    writeln!(file, "[0.2, \"o\"").unwrap();
    drop(file);

    assert!(Session::load(&cast_file).is_err());

    cleanup_files(&[&cast_file]);
}
