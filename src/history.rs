//! Bounded command history addressed by command id.

use std::io::{self, Write};

/// Number of commands the shell remembers by default.
pub const HISTORY_DEPTH: usize = 10;

/// Maximum stored line size in bytes, terminator included.
///
/// Longer lines are cut down to `MAX_LINE_LEN - 1` bytes of text.
pub const MAX_LINE_LEN: usize = 1024;

/// A fixed-size ring of recently executed command lines.
///
/// Every recorded line receives the next command id. Ids keep growing while
/// slots are reused, so only the newest `depth` ids can be resolved; older ids
/// report "not found" instead of whatever now occupies their slot.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    slots: Vec<String>,
    total_commands: usize,
}

impl HistoryStore {
    /// Create a store with the default depth of [`HISTORY_DEPTH`] entries.
    pub fn new() -> Self {
        Self::with_depth(HISTORY_DEPTH)
    }

    /// Create a store retaining `depth` entries. A depth of zero is bumped to one.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            slots: vec![String::new(); depth.max(1)],
            total_commands: 0,
        }
    }

    /// Append a line under the next command id.
    pub fn record(&mut self, line: &str) {
        let index = self.total_commands % self.slots.len();
        let slot = &mut self.slots[index];
        slot.clear();
        slot.push_str(truncate(line));
        // Publish the id only once the slot holds the new text.
        self.total_commands += 1;
    }

    /// Resolve a command id to its line, if it is still retained.
    pub fn lookup(&self, id: usize) -> Option<&str> {
        if id >= self.total_commands || self.total_commands - id > self.slots.len() {
            return None;
        }
        Some(&self.slots[id % self.slots.len()])
    }

    /// The most recently recorded line.
    pub fn last(&self) -> Option<&str> {
        self.total_commands
            .checked_sub(1)
            .and_then(|id| self.lookup(id))
    }

    /// Forget everything and restart ids from zero.
    pub fn clear(&mut self) {
        self.total_commands = 0;
    }

    /// Retained entries, newest first.
    pub fn recent(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        let oldest = self.total_commands.saturating_sub(self.slots.len());
        (oldest..self.total_commands)
            .rev()
            .map(move |id| (id, self.slots[id % self.slots.len()].as_str()))
    }

    /// Write the retained entries as `"<id>:\t<line>\n"`, newest first.
    pub fn render_recent(&self, out: &mut dyn Write) -> io::Result<()> {
        for (id, line) in self.recent() {
            writeln!(out, "{}:\t{}", id, line)?;
        }
        Ok(())
    }

    /// Number of lines recorded since creation or the last clear.
    pub fn total_commands(&self) -> usize {
        self.total_commands
    }

    /// Number of retrievable entries.
    pub fn len(&self) -> usize {
        self.total_commands.min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.total_commands == 0
    }

    /// Maximum number of retained entries.
    pub fn depth(&self) -> usize {
        self.slots.len()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(line: &str) -> &str {
    let limit = MAX_LINE_LEN - 1;
    if line.len() <= limit {
        return line;
    }
    let mut end = limit;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
