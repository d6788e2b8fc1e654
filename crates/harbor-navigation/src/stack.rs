//! Back/forward stack with a cursor
//!
//! Invariant: when the stack is non-empty, `cursor < entries.len()`.

use serde::{Deserialize, Serialize};

/// How an observed url was folded into a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMove {
    Unchanged,
    Back,
    Forward,
    Pushed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl NavHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            entries: vec![url.into()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn can_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_forward(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    /// Drops everything past the cursor and appends `url`. Pushing the url
    /// already at the cursor does nothing.
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.current() == Some(url.as_str()) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(url);
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Overwrites the entry at the cursor (redirects).
    pub fn replace(&mut self, url: impl Into<String>) {
        match self.entries.get_mut(self.cursor) {
            Some(slot) => *slot = url.into(),
            None => {
                self.push(url);
            }
        }
    }

    pub fn back(&mut self) -> Option<&str> {
        if !self.can_back() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_forward() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn reset(&mut self, url: Option<String>) {
        self.entries.clear();
        self.cursor = 0;
        if let Some(url) = url {
            self.entries.push(url);
        }
    }

    /// Folds a url reported by the background into the stack.
    pub fn observe(&mut self, url: &str) -> NavMove {
        if self.current() == Some(url) {
            return NavMove::Unchanged;
        }

        if self.can_back() && self.entries[self.cursor - 1] == url {
            self.cursor -= 1;
            return NavMove::Back;
        }

        if self.can_forward() && self.entries[self.cursor + 1] == url {
            self.cursor += 1;
            return NavMove::Forward;
        }

        self.push(url);
        NavMove::Pushed
    }
}
