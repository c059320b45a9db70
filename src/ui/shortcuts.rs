//! Keyboard shortcut labels and the process-wide shortcut registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

pub const TOGGLE_PALETTE: &str = "Ctrl+K";
pub const SELECT_NEXT: &str = "↓";
pub const SELECT_PREV: &str = "↑";
pub const OPEN: &str = "Enter";
pub const CLOSE: &str = "Esc";
pub const SCROLL: &str = "PgUp/PgDn";
pub const THEME: &str = "F2";
pub const QUIT: &str = "Ctrl+C";

/// A key plus modifiers, matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Chord {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Primary-modifier + K.
    pub const fn palette_toggle() -> Self {
        Self::new(KeyCode::Char('k'), KeyModifiers::CONTROL)
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        let code = match key.code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        code == self.code && key.modifiers == self.modifiers
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("shortcut {0:?} is already bound")]
    AlreadyBound(Chord),
}

#[derive(Debug, Default)]
struct RegistryInner {
    bindings: HashMap<Chord, u64>,
}

/// Chords currently owned by a mounted component.
///
/// A component acquires its chord on mount and holds the returned guard;
/// dropping the guard releases the chord. Acquiring an owned chord fails,
/// so remounts never stack duplicate handlers.
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    next_token: Arc<AtomicU64>,
}

static GLOBAL: Lazy<ShortcutRegistry> = Lazy::new(ShortcutRegistry::default);

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process.
    pub fn global() -> &'static ShortcutRegistry {
        &GLOBAL
    }

    pub fn acquire(&self, chord: Chord) -> Result<ShortcutGuard, ShortcutError> {
        let mut inner = self.inner.lock();
        if inner.bindings.contains_key(&chord) {
            return Err(ShortcutError::AlreadyBound(chord));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        inner.bindings.insert(chord, token);
        debug!(?chord, token, "shortcut acquired");
        Ok(ShortcutGuard {
            registry: self.clone(),
            chord,
            token,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, chord: Chord, token: u64) {
        let mut inner = self.inner.lock();
        if inner.bindings.get(&chord) == Some(&token) {
            inner.bindings.remove(&chord);
            debug!(?chord, token, "shortcut released");
        }
    }
}

/// Ownership of one chord; released on drop.
#[derive(Debug)]
pub struct ShortcutGuard {
    registry: ShortcutRegistry,
    chord: Chord,
    token: u64,
}

impl ShortcutGuard {
    /// Whether `key` triggers the owned chord.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.chord.matches(key)
    }
}

impl Drop for ShortcutGuard {
    fn drop(&mut self) {
        self.registry.release(self.chord, self.token);
    }
}
