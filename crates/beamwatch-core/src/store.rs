//! Ordered history of complete artifact groups with a navigation cursor.
//!
//! The history only grows. Each batch handed to [`ArtifactGroupStore::record_new_groups`]
//! is sorted by its own timestamps and appended; earlier entries are never re-merged.
//! The navigation methods return `None` at a boundary, which callers use to
//! suppress redundant pushes. Out-of-range moves clamp.

use std::collections::HashSet;

use crate::types::ArtifactGroup;

#[derive(Debug, Default)]
pub struct ArtifactGroupStore {
    history: Vec<ArtifactGroup>,
    tracked: HashSet<String>,
    /// Meaningful only while `history` is non-empty; stays 0 (the sentinel) otherwise.
    cursor: usize,
}

impl ArtifactGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly discovered groups, oldest first. Returns how many were appended.
    pub fn record_new_groups(&mut self, mut groups: Vec<ArtifactGroup>) -> usize {
        // Stable: equal timestamps keep the order the scanner produced them in.
        groups.sort_by_key(|g| g.discovered_at);
        let mut appended = 0;
        for group in groups {
            if !self.tracked.insert(group.tag.clone()) {
                continue;
            }
            self.history.push(group);
            appended += 1;
        }
        appended
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tracked.contains(tag)
    }

    /// Tags already in the history, for the scanner to skip.
    pub fn tracked(&self) -> &HashSet<String> {
        &self.tracked
    }

    pub fn get(&self, index: usize) -> Option<&ArtifactGroup> {
        self.history.get(index)
    }

    pub fn groups(&self) -> &[ArtifactGroup] {
        &self.history
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|g| g.tag.as_str())
    }

    /// Cursor position, `None` while the history is empty.
    pub fn cursor(&self) -> Option<usize> {
        if self.history.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn current(&self) -> Option<&ArtifactGroup> {
        self.history.get(self.cursor)
    }

    pub fn at_start(&self) -> bool {
        self.cursor == 0
    }

    /// An empty history counts as being at the latest entry.
    pub fn at_latest(&self) -> bool {
        match self.last_index() {
            Some(last) => self.cursor == last,
            None => true,
        }
    }

    /// Jump to the newest group. `None` if already there or nothing is tracked.
    pub fn move_to_latest(&mut self) -> Option<ArtifactGroup> {
        let last = self.last_index()?;
        if self.cursor == last {
            return None;
        }
        self.cursor = last;
        self.current().cloned()
    }

    /// Step back one group. `None` (cursor unchanged) when already at the first.
    pub fn move_previous(&mut self) -> Option<ArtifactGroup> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current().cloned()
    }

    /// Step forward one group. `None` (cursor clamped to the last) when already at the end.
    pub fn move_next(&mut self) -> Option<ArtifactGroup> {
        let last = self.last_index()?;
        if self.cursor >= last {
            self.cursor = last;
            return None;
        }
        self.cursor += 1;
        self.current().cloned()
    }

    fn last_index(&self) -> Option<usize> {
        self.history.len().checked_sub(1)
    }
}
