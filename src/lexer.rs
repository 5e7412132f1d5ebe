//! Splitting raw input into whitespace-delimited tokens.

/// Token that, in last position, sends a command to the background.
pub const BACKGROUND_MARKER: &str = "&";

/// One tokenized input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    /// Non-empty tokens, background marker removed.
    pub tokens: Vec<String>,
    /// Set when the line ended with a bare `&`.
    pub background: bool,
}

impl CommandLine {
    /// Tokenize `line` and strip one trailing background marker.
    pub fn parse(line: &str) -> Self {
        let mut tokens = split_into_tokens(line);
        let background = tokens.last().is_some_and(|t| t == BACKGROUND_MARKER);
        if background {
            tokens.pop();
        }
        Self { tokens, background }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reconstruct the line as stored in history: tokens joined by single
    /// spaces, with the background marker put back.
    pub fn to_history_line(&self) -> String {
        let mut line = self.tokens.join(" ");
        if self.background {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(BACKGROUND_MARKER);
        }
        line
    }
}

/// Split on spaces, tabs and newlines. Returned tokens are never empty.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split([' ', '\t', '\n'])
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}
