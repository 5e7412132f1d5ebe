use thiserror::Error;

/// Operator-facing failures. Each one ends the current command only.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("too many arguments to '{name}' call, expected {expected} arguments")]
    TooManyArguments { name: String, expected: Arity },

    #[error("No commands in history")]
    HistoryEmpty,

    #[error("Command not in history")]
    HistoryInvalid,

    #[error("{context}: {source}")]
    Os {
        context: String,
        #[source]
        source: nix::Error,
    },
}

/// How many arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    AtMostOne,
}

impl Arity {
    pub fn max(self) -> usize {
        match self {
            Arity::None => 0,
            Arity::AtMostOne => 1,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::None => f.write_str("0"),
            Arity::AtMostOne => f.write_str("0 or 1"),
        }
    }
}

impl ShellError {
    pub(crate) fn os(context: impl Into<String>, source: nix::Error) -> Self {
        ShellError::Os {
            context: context.into(),
            source,
        }
    }
}
