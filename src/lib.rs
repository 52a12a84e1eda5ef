//! # recast-rs
//!
//! A Rust library for scrubbing, replaying and trimming recorded terminal
//! sessions stored in the asciicast-style line format: a JSON header line
//! followed by one `[time, "kind", "data"]` event per line. Reconstructs the
//! screen content a viewer would have seen at any point of the recording,
//! without being a full terminal emulator.
//!
//! ## Features
//!
//! - **Scrub to any frame**: Reconstruct the visible screen text and window
//!   title at an arbitrary position in the recording
//! - **Escape sequence handling**: Clean up problematic control sequences
//!   (mode toggles, cursor chatter, clears, backspace editing) while
//!   preserving colors for display
//! - **Timed playback**: Replay frames using the recording's own inter-event
//!   delays, looping between configurable bounds
//! - **Trim and retime**: Export any frame range as a new recording,
//!   optionally rebased to start at time zero, with exact round-trip escaping
//! - **Strict loading**: A malformed header or event line rejects the whole
//!   file instead of producing a half-loaded session
//!
//! ## Quick Start
//!
//! ```rust
//! use recast_rs::{export, render_frame, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cast = concat!(
//!     "{\"version\": 2, \"width\": 80, \"height\": 24}\n",
//!     "[0.12, \"o\", \"$ ls\\r\\n\"]\n",
//!     "[0.85, \"o\", \"Cargo.toml  src\\r\\n\"]\n",
//! );
//! let session = Session::parse(cast)?;
//!
//! // Scrub: reconstruct the screen after the first event
//! let frame = render_frame(&session, 1);
//! assert_eq!(frame.text, "$ ls\r\n");
//!
//! // Trim the first event into its own recording, rebased to time zero
//! let trimmed = export(&session, 0, 0, true)?;
//! assert!(trimmed.ends_with("[0.0, \"o\", \"$ ls\\r\\n\"]\n"));
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Event kind tag carried by screen-visible output events.
const OUTPUT_KIND: &str = "o";

/// Full-screen clear emitted by `clear` and friends: cursor home plus
/// erase-display. Treated as a reset instruction, never passed through.
const CLEAR_SCREEN: &str = "\u{1b}[H\u{1b}[2J";

/// The two window-title dialects seen in recordings, both terminated by BEL.
const TITLE_PREFIXES: [&str; 2] = ["\u{1b}]2;", "\u{1b}]1;"];
const TITLE_TERMINATOR: char = '\u{7}';

/// Control sequences with no effect on the reconstructed screen content.
///
/// Everything not in this table (notably SGR color codes) passes through
/// untouched so a downstream renderer can still style the text.
const NON_VISUAL_CODES: &[&str] = &[
    "\u{1b}[?1h",    // application cursor keys
    "\u{1b}[?1l",
    "\u{1b}>",       // keypad mode
    "\u{1b}=",
    "\u{1b}[?2004h", // bracketed paste
    "\u{1b}[?2004l",
    "\u{1b}[?25l",   // hide cursor
    "\u{1b}[?25h",   // show cursor
    "\u{1b}[?12l",   // cursor blink
    "\u{1b}[?47h",   // alternate screen
    "\u{1b}[?47l",
    "\u{1b}[?1049h",
    "\u{1b}[?1049l",
    "\u{1b}7",       // save cursor
    "\u{1b}8",       // restore cursor
    "\u{1b}[2J",     // clear screen
    "\u{1b}[2K",     // clear line
    "\u{1b}[K",      // clear to end of line
    "\u{1b}[J",      // clear below cursor
    "\u{1b}[1G",     // move to column 1
    "\u{1b}[A",      // cursor up
    "\u{1b}[0m",     // reset attributes
    "\u{1b}[24m",    // underline off
    "\u{1b}[27m",    // inverse off
    "\u{1b}[39m",    // default foreground
    "\u{1b}[49m",    // default background
];

/// Errors produced while loading, slicing or exporting a recording.
///
/// Parse failures are fatal to the load that produced them: no partial
/// session is ever constructed, so a caller that keeps its previous session
/// around loses nothing on a failed reload.
#[derive(Debug, Error)]
pub enum CastError {
    /// The input had no lines at all.
    #[error("recording has no header line")]
    MissingHeader,

    /// Line 0 was not valid JSON.
    #[error("invalid header line: {0}")]
    InvalidHeader(#[source] serde_json::Error),

    /// Line 0 decoded, but not as a JSON object.
    #[error("header line is not a JSON object")]
    HeaderNotObject,

    /// An event line did not decode as a `[number, string, string]` record.
    #[error("line {line}: malformed event record: {source}")]
    InvalidEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A frame range fell outside the event sequence.
    #[error("invalid frame range [{start}, {end}] for {len} events")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// Reading or writing a recording file failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Known asciicast v2 header fields, decoded best-effort for display.
///
/// The session keeps the header opaque; this view only exists so tools can
/// show dimensions and metadata. A header that does not match these types
/// simply yields an empty view, never a load failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderInfo {
    pub version: Option<u8>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub timestamp: Option<f64>,
    pub title: Option<String>,
    pub command: Option<String>,
    pub shell: Option<String>,
    pub env: Option<std::collections::HashMap<String, String>>,
}

/// Recording header: the first line of a cast file.
///
/// The raw line is preserved verbatim so an exported recording re-emits it
/// byte-for-byte; the core never interprets it beyond requiring a JSON
/// object.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    raw: String,
    value: serde_json::Value,
}

impl Header {
    fn parse(line: &str) -> Result<Self, CastError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(CastError::InvalidHeader)?;
        if !value.is_object() {
            return Err(CastError::HeaderNotObject);
        }
        Ok(Self {
            raw: line.to_string(),
            value,
        })
    }

    /// The header line exactly as it appeared in the recording.
    pub fn as_json(&self) -> &str {
        &self.raw
    }

    /// The decoded header object.
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Decode the known header fields for display.
    pub fn info(&self) -> HeaderInfo {
        serde_json::from_value(self.value.clone()).unwrap_or_default()
    }
}

/// One timestamped record of the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Seconds since the start of the recording. Expected to be
    /// non-decreasing across the log, but never enforced.
    pub timestamp: f64,
    /// Event kind tag. Only `"o"` events carry screen-visible output; other
    /// kinds are preserved and passed through untouched.
    pub kind: String,
    /// Raw recorded text, possibly containing control sequences.
    pub payload: String,
}

impl Event {
    /// Whether this event contributes to the visible screen.
    pub fn is_output(&self) -> bool {
        self.kind == OUTPUT_KIND
    }
}

/// A loaded recording: header metadata plus an ordered, immutable event log.
///
/// The event order is the sole sequencing authority; there is no separate
/// playback state inside the session. Scrubbing, playback and export all
/// read it without modifying it.
#[derive(Debug, Clone)]
pub struct Session {
    header: Header,
    events: Vec<Event>,
}

impl Session {
    /// Load a recording from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a cast file: a JSON-object header line followed by
    ///   one `[time, "kind", "data"]` event per line
    ///
    /// A malformed header or event line fails the entire load; no partial
    /// session is constructed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CastError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let session = Self::parse(&content)?;
        debug!(
            path = %path.display(),
            events = session.len(),
            "recording loaded"
        );
        Ok(session)
    }

    /// Parse a recording from already-read text.
    ///
    /// Line 0 must decode as a JSON object; every subsequent non-blank line
    /// must decode as exactly `[number, string, string]`. Blank lines are
    /// skipped; they are not records.
    pub fn parse(input: &str) -> Result<Self, CastError> {
        let mut lines = input.lines().enumerate();
        let (_, header_line) = lines.next().ok_or(CastError::MissingHeader)?;
        let header = Header::parse(header_line)?;

        let mut events = Vec::new();
        for (index, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (timestamp, kind, payload): (f64, String, String) = serde_json::from_str(line)
                .map_err(|source| CastError::InvalidEvent {
                    line: index + 1,
                    source,
                })?;
            events.push(Event {
                timestamp,
                kind,
                payload,
            });
        }

        Ok(Self { header, events })
    }

    /// The recording header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The full event log, in recorded order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in the recording.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the recording has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Inclusive slice of the event log.
    ///
    /// Empty when `start > end` or `start` is past the last event; `end`
    /// clamps to the last event. Export performs its own strict range
    /// validation, so this accessor never fails.
    pub fn slice(&self, start: usize, end: usize) -> &[Event] {
        if start > end || start >= self.events.len() {
            return &[];
        }
        let end = end.min(self.events.len() - 1);
        &self.events[start..=end]
    }
}

/// Remove every occurrence of the known non-visual control sequences.
///
/// Color and style codes not in the table survive so a downstream renderer
/// can interpret them; unknown sequences pass through as literal text rather
/// than being guessed at.
pub fn strip_control_codes(input: &str) -> String {
    let mut result = input.to_string();
    for code in NON_VISUAL_CODES {
        if result.contains(code) {
            result = result.replace(code, "");
        }
    }
    result
}

/// Accumulates the visible screen text and window title produced by a stream
/// of recorded output chunks.
///
/// Feeding payloads in recorded order models the destructive operations a
/// terminal would have applied: a full-screen clear discards everything
/// accumulated so far, title sequences update the window title as a side
/// effect, known non-visual codes are stripped, and backspace deletes the
/// preceding character (across payload boundaries).
#[derive(Debug, Default)]
pub struct Screen {
    text: String,
    title: Option<String>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one recorded output payload.
    pub fn feed(&mut self, payload: &str) {
        // A clear discards everything before it, including earlier text of
        // this same payload; only what follows the last occurrence survives.
        let chunk = match payload.rfind(CLEAR_SCREEN) {
            Some(at) => {
                self.text.clear();
                &payload[at + CLEAR_SCREEN.len()..]
            }
            None => payload,
        };

        let chunk = self.extract_titles(chunk);
        let chunk = strip_control_codes(&chunk);

        for ch in chunk.chars() {
            if ch == '\u{8}' {
                self.text.pop();
            } else {
                self.text.push(ch);
            }
        }
    }

    /// Pull every title sequence out of `chunk`, returning what remains for
    /// the screen.
    ///
    /// Plain text preceding a title sequence joins the title instead of the
    /// screen; text after the terminator stays on screen. A sequence with no
    /// terminator consumes the rest of the payload: title sequences never
    /// span payloads.
    fn extract_titles(&mut self, chunk: &str) -> String {
        let mut remaining = chunk;
        loop {
            let hit = TITLE_PREFIXES
                .iter()
                .filter_map(|prefix| remaining.find(prefix).map(|at| (at, prefix.len())))
                .min_by_key(|&(at, _)| at);
            let Some((at, prefix_len)) = hit else {
                return remaining.to_string();
            };

            let before = &remaining[..at];
            let after = &remaining[at + prefix_len..];
            match after.find(TITLE_TERMINATOR) {
                Some(end) => {
                    self.title = Some(format!("{}{}", before, &after[..end]));
                    remaining = &after[end + TITLE_TERMINATOR.len_utf8()..];
                }
                None => {
                    self.title = Some(format!("{}{}", before, after));
                    return String::new();
                }
            }
        }
    }

    /// The screen text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The most recently extracted window title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Finish the pass and take the accumulated state.
    pub fn into_frame(self) -> Frame {
        Frame {
            text: self.text,
            title: self.title,
        }
    }
}

/// The reconstructed viewer-visible state at one point of a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sanitized screen text, still carrying color/style codes for display.
    pub text: String,
    /// Window title at this point, if any title sequence was seen.
    pub title: Option<String>,
}

/// Reconstruct the screen as it looked after the first `frame_index` events.
///
/// # Arguments
///
/// * `session` - The recording to replay
/// * `frame_index` - How many events are visible; `0` yields an empty frame,
///   an index past the end clamps to the full recording
///
/// Every output event below the index is fed through one [`Screen`] pass, so
/// clears, titles and backspace edits carry across event boundaries. This is
/// a pure function of its arguments: rendering the same frame twice yields
/// identical results, at O(frame_index) cost per call.
pub fn render_frame(session: &Session, frame_index: usize) -> Frame {
    let visible = frame_index.min(session.len());
    let mut screen = Screen::new();
    for event in &session.events()[..visible] {
        if event.is_output() {
            screen.feed(&event.payload);
        }
    }
    screen.into_frame()
}

/// Whether playback is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// Outcome of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Render `frame`, then wait `next_delay` before the next tick.
    Render { frame: usize, next_delay: Duration },
    /// The end bound was reached; the cursor moved back to the start bound.
    /// Playback keeps looping; a run-once driver stops here instead.
    Looped,
}

/// Loop playback over a session's frames using its own recorded timing.
///
/// An explicit state machine driven by a caller-owned timer: each call to
/// [`Playback::tick`] yields the frame to render and the delay to wait
/// before ticking again. Pausing cancels: a paused playback produces no
/// further ticks until resumed.
#[derive(Debug)]
pub struct Playback {
    state: PlayState,
    current: usize,
    start_bound: usize,
    end_bound: usize,
    last_timestamp: Option<f64>,
}

impl Playback {
    /// Playback over the whole recording, initially stopped.
    pub fn new(session: &Session) -> Self {
        Self {
            state: PlayState::Stopped,
            current: 0,
            start_bound: 0,
            end_bound: session.len().saturating_sub(1),
            last_timestamp: None,
        }
    }

    /// Playback looping over an inclusive frame range.
    pub fn with_bounds(session: &Session, start: usize, end: usize) -> Result<Self, CastError> {
        let mut playback = Self::new(session);
        playback.set_bounds(session, start, end)?;
        playback.current = start;
        Ok(playback)
    }

    /// Start (or resume) playback. The first tick after this carries zero
    /// delay.
    pub fn play(&mut self) {
        if self.state == PlayState::Stopped {
            self.state = PlayState::Playing;
            self.last_timestamp = None;
            trace!(frame = self.current, "playback started");
        }
    }

    /// Pause playback, cancelling any pending tick.
    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Stopped;
            trace!(frame = self.current, "playback paused");
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// The frame the next tick will render.
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// The inclusive loop bounds.
    pub fn bounds(&self) -> (usize, usize) {
        (self.start_bound, self.end_bound)
    }

    /// Reposition the loop bounds.
    ///
    /// Bounds changed while playing take effect on the next tick; while
    /// stopped, the cursor is clamped into the new bounds immediately.
    pub fn set_bounds(
        &mut self,
        session: &Session,
        start: usize,
        end: usize,
    ) -> Result<(), CastError> {
        if start > end || end >= session.len() {
            return Err(CastError::InvalidRange {
                start,
                end,
                len: session.len(),
            });
        }
        self.start_bound = start;
        self.end_bound = end;
        if self.state == PlayState::Stopped {
            self.current = self.current.clamp(start, end);
        }
        Ok(())
    }

    /// Move the cursor to `frame`, clamped into the loop bounds. The next
    /// tick after a seek carries zero delay.
    pub fn seek(&mut self, frame: usize) {
        self.current = frame.clamp(self.start_bound, self.end_bound);
        self.last_timestamp = None;
    }

    /// Advance the state machine by one tick.
    ///
    /// Returns `None` while stopped (a pause cancels any pending tick) or
    /// when the session has no events. While playing, yields the frame to
    /// render plus the wait before the next tick: the absolute difference
    /// between the newly current frame's recorded timestamp and the
    /// previously observed one, so even non-monotonic timestamps produce a
    /// positive wait. Reaching the end bound wraps the cursor back to the
    /// start bound and yields [`Tick::Looped`].
    pub fn tick(&mut self, session: &Session) -> Option<Tick> {
        if self.state != PlayState::Playing || session.is_empty() {
            return None;
        }

        if self.current < self.end_bound {
            let frame = self.current;
            self.current += 1;
            let observed = session.events()[self.current.min(session.len() - 1)].timestamp;
            let delay = match self.last_timestamp {
                Some(previous) => (observed - previous).abs(),
                None => 0.0,
            };
            self.last_timestamp = Some(observed);
            Some(Tick::Render {
                frame,
                next_delay: Duration::from_secs_f64(delay),
            })
        } else {
            self.current = self.start_bound;
            self.last_timestamp = None;
            trace!(frame = self.current, "playback wrapped to start bound");
            Some(Tick::Looped)
        }
    }
}

/// Escape recorded text for an event line.
///
/// The substitution table is fixed: ESC and BEL take their `\u00XX`-form
/// escapes, carriage return, newline, tab and backspace take the standard
/// single-letter escapes, and quote and backslash are escaped. Everything
/// else passes through unescaped. This exact table is what keeps exported
/// recordings byte-compatible with the format the loader and third-party
/// players read.
pub fn escape_payload(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '\u{1b}' => out.push_str("\\u001b"),
            '\u{7}' => out.push_str("\\u0007"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            _ => out.push(ch),
        }
    }
    out
}

fn json_number(value: f64) -> String {
    // Timestamps come out of JSON, so they are always finite.
    serde_json::Number::from_f64(value).map_or_else(|| String::from("0"), |n| n.to_string())
}

/// Serialize an inclusive frame range back into the recording format.
///
/// # Arguments
///
/// * `session` - The recording to trim
/// * `start` - First event of the range
/// * `end` - Last event of the range (inclusive)
/// * `retime` - Rebase every emitted timestamp against the timestamp at
///   `start`, so the exported recording begins at time zero
///
/// The header line is re-emitted verbatim. Bounds outside the event sequence
/// or `start > end` are rejected with [`CastError::InvalidRange`] rather
/// than silently clamped.
pub fn export(
    session: &Session,
    start: usize,
    end: usize,
    retime: bool,
) -> Result<String, CastError> {
    let len = session.len();
    if start > end || end >= len {
        return Err(CastError::InvalidRange { start, end, len });
    }

    let base = session.events()[start].timestamp;
    let mut out = String::with_capacity(session.header().as_json().len() + (end - start + 1) * 32);
    out.push_str(session.header().as_json());
    out.push('\n');

    for event in &session.events()[start..=end] {
        let timestamp = if retime {
            event.timestamp - base
        } else {
            event.timestamp
        };
        out.push_str(&format!(
            "[{}, \"{}\", \"{}\"]\n",
            json_number(timestamp),
            escape_payload(&event.kind),
            escape_payload(&event.payload),
        ));
    }

    debug!(start, end, retime, events = end - start + 1, "range exported");
    Ok(out)
}

/// Trim a frame range into a new recording file.
///
/// See [`export`] for the range and retime semantics. The original session
/// is never written back in place; export always produces a new recording.
pub fn export_to_path<P: AsRef<Path>>(
    session: &Session,
    path: P,
    start: usize,
    end: usize,
    retime: bool,
) -> Result<(), CastError> {
    let serialized = export(session, start, end, retime)?;
    std::fs::write(path.as_ref(), serialized)?;
    debug!(path = %path.as_ref().display(), "recording saved");
    Ok(())
}
