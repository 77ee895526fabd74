// Single-key terminal input
//
// Raw mode is held only for the duration of one read, so log lines printed
// between keys render normally. The guard restores the terminal on every
// exit path, including errors and panics. Reads poll in short slices so a
// shutdown raised outside the terminal (SIGINT from another process) is seen
// without waiting for a keystroke.

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::warn;

use crate::error::Result;
use crate::shutdown::ShutdownSignal;

/// Ctrl-C as delivered in raw mode
pub const CTRL_C: char = '\u{3}';

/// Stand-in for keys without a character (arrows, function keys)
pub const UNMAPPED: char = '\0';

/// Longest single wait before the shutdown flag is checked again
pub const KEY_POLL_SLICE: Duration = Duration::from_millis(100);

/// Source of single keystrokes
pub trait KeySource {
    /// Wait for the next key; `None` timeout blocks until one arrives
    ///
    /// Returns `Ok(None)` when the timeout elapses without a key.
    fn next_key(&mut self, timeout: Option<Duration>) -> Result<Option<char>>;
}

/// Puts the terminal in raw mode until dropped
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Keys from the controlling terminal via crossterm
///
/// A triggered shutdown ends the read early with `Ok(None)`.
#[derive(Debug, Clone)]
pub struct TerminalKeys {
    shutdown: ShutdownSignal,
}

impl TerminalKeys {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self { shutdown }
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self, timeout: Option<Duration>) -> Result<Option<char>> {
        let _raw = RawModeGuard::enable()?;
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if self.shutdown.is_triggered() {
                return Ok(None);
            }
            let Some(slice) = poll_slice(deadline, Instant::now()) else {
                return Ok(None);
            };
            if !event::poll(slice)? {
                continue;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                return Ok(Some(key_to_char(&key)));
            }
        }
    }
}

/// How long the next poll may block, or `None` once the deadline has passed
pub fn poll_slice(deadline: Option<Instant>, now: Instant) -> Option<Duration> {
    match deadline {
        None => Some(KEY_POLL_SLICE),
        Some(deadline) if deadline <= now => None,
        Some(deadline) => Some((deadline - now).min(KEY_POLL_SLICE)),
    }
}

/// Map a key event to the byte a raw terminal would have produced
pub fn key_to_char(key: &KeyEvent) -> char {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => CTRL_C,
        KeyCode::Char(c) => c,
        KeyCode::Enter => '\r',
        KeyCode::Tab => '\t',
        KeyCode::Backspace => '\u{7f}',
        KeyCode::Esc => '\u{1b}',
        _ => UNMAPPED,
    }
}
