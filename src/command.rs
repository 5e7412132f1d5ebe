//! Classification of tokenized lines and history expansion.
//!
//! [`classify`] decides what a line means without executing anything; the
//! history forms it recognizes (`!!`, `!<n>`) are turned back into a concrete
//! [`CommandLine`] by [`expand`].

use crate::builtin::{Builtin, Cd, Help};
use crate::error::{Arity, ShellError};
use crate::history::HistoryStore;
use crate::lexer::CommandLine;
use tracing::debug;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Prefix of every history directive.
pub const HISTORY_PREFIX: char = '!';

/// Meaning of one tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Not a built-in; run it as a program found on `PATH`.
    External,
    Builtin(Builtin),
    /// `!-`
    HistoryClear,
    /// `!!`
    RepeatLast,
    /// `!<n>`, already checked against the store.
    RepeatById(usize),
    /// A built-in or history directive followed by too many tokens.
    TooManyArguments { name: String, expected: Arity },
    /// `!!` with nothing recorded.
    HistoryEmpty,
    /// Bare `!`, malformed id, or an id that is not retained.
    HistoryInvalid,
}

impl Command {
    /// The error to report for the failure variants.
    pub fn error(&self) -> Option<ShellError> {
        match self {
            Command::TooManyArguments { name, expected } => Some(ShellError::TooManyArguments {
                name: name.clone(),
                expected: *expected,
            }),
            Command::HistoryEmpty => Some(ShellError::HistoryEmpty),
            Command::HistoryInvalid => Some(ShellError::HistoryInvalid),
            _ => None,
        }
    }

    /// Whether the line must be resolved through history before running.
    pub fn is_repeat(&self) -> bool {
        matches!(self, Command::RepeatLast | Command::RepeatById(_))
    }
}

/// Classify a non-empty token sequence.
pub fn classify(tokens: &[String], history: &HistoryStore) -> Command {
    let Some((name, args)) = tokens.split_first() else {
        return Command::HistoryInvalid;
    };

    let command = match classify_builtin(name, args) {
        Some(command) => command,
        None if name.starts_with(HISTORY_PREFIX) => classify_history(name, args, history),
        None => Command::External,
    };
    debug!(?command, "classified {:?}", name);
    command
}

fn classify_builtin(name: &str, args: &[String]) -> Option<Command> {
    let arity = match name {
        "exit" | "pwd" | "history" => Arity::None,
        "cd" | "help" => Arity::AtMostOne,
        _ => return None,
    };
    if args.len() > arity.max() {
        return Some(Command::TooManyArguments {
            name: name.to_owned(),
            expected: arity,
        });
    }

    let arg = args.first().cloned();
    let builtin = match name {
        "exit" => Builtin::Exit,
        "pwd" => Builtin::Pwd,
        "history" => Builtin::History,
        "cd" => Builtin::Cd(Cd { target: arg }),
        _ => Builtin::Help(Help { topic: arg }),
    };
    Some(Command::Builtin(builtin))
}

fn classify_history(name: &str, args: &[String], history: &HistoryStore) -> Command {
    if !args.is_empty() {
        return Command::TooManyArguments {
            name: name.to_owned(),
            expected: Arity::None,
        };
    }

    match &name[HISTORY_PREFIX.len_utf8()..] {
        "!" if history.is_empty() => Command::HistoryEmpty,
        "!" => Command::RepeatLast,
        "-" => Command::HistoryClear,
        id => match parse_id(id) {
            Some(id) if history.lookup(id).is_some() => Command::RepeatById(id),
            _ => Command::HistoryInvalid,
        },
    }
}

/// Strictly parse a command id: ASCII digits only, no sign, no overflow.
fn parse_id(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve a repeat directive to the stored line, re-tokenized.
///
/// Returns the raw stored text alongside the parsed line so the caller can
/// echo exactly what is being run.
pub fn expand(command: &Command, history: &HistoryStore) -> Result<(String, CommandLine), ShellError> {
    let resolved = match command {
        Command::RepeatLast => history.last(),
        Command::RepeatById(id) => history.lookup(*id),
        _ => None,
    };
    let text = resolved.ok_or(ShellError::HistoryInvalid)?.to_owned();
    let line = CommandLine::parse(&text);
    if line.is_empty() {
        return Err(ShellError::HistoryInvalid);
    }
    Ok((text, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        crate::lexer::split_into_tokens(line)
    }

    fn history_of(lines: &[&str]) -> HistoryStore {
        let mut history = HistoryStore::new();
        for line in lines {
            history.record(line);
        }
        history
    }

    #[test]
    fn test_builtins_without_arguments() {
        let history = HistoryStore::new();
        assert_eq!(classify(&tokens("exit"), &history), Command::Builtin(Builtin::Exit));
        assert_eq!(classify(&tokens("pwd"), &history), Command::Builtin(Builtin::Pwd));
        assert_eq!(
            classify(&tokens("history"), &history),
            Command::Builtin(Builtin::History)
        );
        assert_eq!(
            classify(&tokens("cd"), &history),
            Command::Builtin(Builtin::Cd(Cd { target: None }))
        );
        assert_eq!(
            classify(&tokens("help cd"), &history),
            Command::Builtin(Builtin::Help(Help {
                topic: Some("cd".into())
            }))
        );
    }

    #[test]
    fn test_builtin_arity_violations() {
        let history = HistoryStore::new();
        for (line, name, expected) in [
            ("exit x", "exit", Arity::None),
            ("pwd x", "pwd", Arity::None),
            ("history x", "history", Arity::None),
            ("cd a b", "cd", Arity::AtMostOne),
            ("help a b", "help", Arity::AtMostOne),
        ] {
            assert_eq!(
                classify(&tokens(line), &history),
                Command::TooManyArguments {
                    name: name.into(),
                    expected
                },
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_history_forms_reject_arguments() {
        let history = history_of(&["ls"]);
        let command = classify(&tokens("!! now"), &history);
        assert_eq!(
            command.error().unwrap().to_string(),
            "too many arguments to '!!' call, expected 0 arguments"
        );
        assert!(matches!(
            classify(&tokens("!0 x"), &history),
            Command::TooManyArguments { .. }
        ));
    }

    #[test]
    fn test_repeat_last_depends_on_store() {
        assert_eq!(classify(&tokens("!!"), &HistoryStore::new()), Command::HistoryEmpty);
        assert_eq!(classify(&tokens("!!"), &history_of(&["ls"])), Command::RepeatLast);
    }

    #[test]
    fn test_clear_and_bare_bang() {
        let history = history_of(&["ls"]);
        assert_eq!(classify(&tokens("!-"), &history), Command::HistoryClear);
        assert_eq!(classify(&tokens("!"), &history), Command::HistoryInvalid);
    }

    #[test]
    fn test_repeat_by_id_validation() {
        let history = history_of(&["ls", "pwd"]);
        assert_eq!(classify(&tokens("!1"), &history), Command::RepeatById(1));
        assert_eq!(classify(&tokens("!2"), &history), Command::HistoryInvalid);
        assert_eq!(classify(&tokens("!1a"), &history), Command::HistoryInvalid);
        assert_eq!(classify(&tokens("!-1"), &history), Command::HistoryInvalid);
        assert_eq!(classify(&tokens("!+1"), &history), Command::HistoryInvalid);
        assert_eq!(
            classify(&tokens("!99999999999999999999999"), &history),
            Command::HistoryInvalid
        );
    }

    #[test]
    fn test_evicted_id_is_invalid() {
        let mut history = HistoryStore::new();
        for i in 0..12 {
            history.record(&format!("echo {}", i));
        }
        assert_eq!(classify(&tokens("!1"), &history), Command::HistoryInvalid);
        assert_eq!(classify(&tokens("!2"), &history), Command::RepeatById(2));
    }

    #[test]
    fn test_everything_else_is_external() {
        let history = HistoryStore::new();
        assert_eq!(classify(&tokens("ls -l"), &history), Command::External);
        assert_eq!(classify(&tokens("exit2"), &history), Command::External);
        assert_eq!(classify(&tokens("./!x"), &history), Command::External);
    }

    #[test]
    fn test_expand_reparses_background_marker() {
        let history = history_of(&["sleep 1 &", "pwd"]);

        let (text, line) = expand(&Command::RepeatById(0), &history).unwrap();
        assert_eq!(text, "sleep 1 &");
        assert_eq!(line.tokens, vec!["sleep", "1"]);
        assert!(line.background);

        let (text, line) = expand(&Command::RepeatLast, &history).unwrap();
        assert_eq!(text, "pwd");
        assert!(!line.background);
    }

    #[test]
    fn test_expand_missing_entry_is_invalid() {
        let history = HistoryStore::new();
        assert!(matches!(
            expand(&Command::RepeatById(4), &history),
            Err(ShellError::HistoryInvalid)
        ));
        assert!(matches!(
            expand(&Command::External, &history),
            Err(ShellError::HistoryInvalid)
        ));
    }
}
