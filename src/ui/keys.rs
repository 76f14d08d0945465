//! Bounded-timeout semantic key decoder.
//!
//! Wraps the crossterm event stream and maps key events to the closed set
//! of semantic inputs the menu understands. Escape-sequence assembly (arrow
//! keys arriving as `ESC [ A/B/C/D`) and bare-ESC disambiguation happen in
//! crossterm's parser; this layer adds the bounded poll so callers stay
//! responsive with no key pressed, and a literal mode used while editing
//! filter text so command letters come through as plain characters.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Semantic input event, one per decoder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Quit,
    Help,
    Filter,
    Delete,
    Retry,
    SortToggle,
    SortReverse,
    Char(char),
}

/// One decoder step: a key, a terminal resize, or nothing within the
/// timeout window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Key(Key),
    Resize(u16, u16),
    Idle,
}

/// Map a key event to a semantic input (normal mode).
pub fn semantic_key(key: KeyEvent) -> Option<Key> {
    if is_interrupt(key) {
        return Some(Key::Quit);
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Key::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Char('q') | KeyCode::Esc => Some(Key::Quit),
        KeyCode::Char('h') | KeyCode::Char('?') => Some(Key::Help),
        KeyCode::Char('/') | KeyCode::Char('f') => Some(Key::Filter),
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('d') => Some(Key::Delete),
        KeyCode::Char('r') => Some(Key::Retry),
        KeyCode::Char('s') => Some(Key::SortToggle),
        KeyCode::Char('S') => Some(Key::SortReverse),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

/// Map a key event in force-literal mode (filter editing).
///
/// Characters bypass semantic mapping entirely; only the editing controls
/// (commit, cancel, erase) keep their meaning.
pub fn literal_key(key: KeyEvent) -> Option<Key> {
    if is_interrupt(key) {
        return Some(Key::Quit);
    }

    match key.code {
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Quit),
        KeyCode::Backspace | KeyCode::Delete => Some(Key::Delete),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

fn is_interrupt(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Polling decoder over the crossterm event stream.
#[derive(Debug, Clone, Copy)]
pub struct KeyDecoder {
    timeout: Duration,
}

impl KeyDecoder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Read the next semantic event, waiting at most the poll timeout.
    ///
    /// Returns `Decoded::Idle` when no input arrived in the window so the
    /// caller's loop can check cancellation flags and repaint.
    pub fn next(&self, literal: bool) -> io::Result<Decoded> {
        if !event::poll(self.timeout)? {
            return Ok(Decoded::Idle);
        }

        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return Ok(Decoded::Idle);
                }
                let mapped = if literal {
                    literal_key(key)
                } else {
                    semantic_key(key)
                };
                Ok(mapped.map_or(Decoded::Idle, Decoded::Key))
            }
            Event::Resize(w, h) => Ok(Decoded::Resize(w, h)),
            _ => Ok(Decoded::Idle),
        }
    }
}
