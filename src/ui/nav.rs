//! Selection cursor over the flat result index.
//!
//! Invariant: `selected` is `Some(i)` with `i < len` whenever `len > 0`, and
//! `None` (inert) when `len == 0`.

/// Input the palette reacts to, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    Up,
    Down,
    Enter,
    Escape,
    Backspace,
    Char(char),
    /// Pointer moved over the row with this global index.
    Hover(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<usize>,
    len: usize,
}

impl Selection {
    pub fn new(len: usize) -> Self {
        let mut s = Self::default();
        s.reset(len);
        s
    }

    /// Rebuild for a fresh flat index: first row selected, or inert when empty.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.selected = if len > 0 { Some(0) } else { None };
    }

    pub fn clear(&mut self) {
        self.reset(0);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> Option<usize> {
        self.selected
    }

    /// Move down, wrapping from last to first.
    pub fn next(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + 1) % self.len);
        }
    }

    /// Move up, wrapping from first to last.
    pub fn prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + self.len - 1) % self.len);
        }
    }

    /// Hover shares the keyboard cursor. Out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) -> bool {
        if index < self.len {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }
}
