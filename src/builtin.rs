use crate::command::ExitCode;
use crate::env::Environment;
use crate::history::HistoryStore;
use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Lines printed by `help` with no topic, and on every interrupt.
pub const HELP_LINES: [&str; 4] = [
    "'cd' is a builtin command for changing the current working directory.",
    "'exit' is a builtin command that closes the shell.",
    "'help' is a builtin command that provides info on all supported commands.",
    "'pwd' is a builtin command that displays the current working directory.",
];

/// Built-in commands known to the shell at compile time.
///
/// Builtins are executed directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode>;
}

/// A validated built-in invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Pwd,
    Cd(Cd),
    Help(Help),
    History,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Exit => Exit::name(),
            Builtin::Pwd => Pwd::name(),
            Builtin::Cd(_) => Cd::name(),
            Builtin::Help(_) => Help::name(),
            Builtin::History => History::name(),
        }
    }

    /// Run the built-in. Failures are written to `stdout` and turn into exit code 1.
    pub fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode> {
        let res = match self {
            Builtin::Exit => Exit.execute(stdout, env, history),
            Builtin::Pwd => Pwd.execute(stdout, env, history),
            Builtin::Cd(cd) => cd.execute(stdout, env, history),
            Builtin::Help(help) => help.execute(stdout, env, history),
            Builtin::History => History.execute(stdout, env, history),
        };
        match res {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{:#}", e)?;
                Ok(1)
            }
        }
    }
}

/// Close the shell.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<ExitCode> {
        let cwd = env::current_dir().context("pwd")?;
        env.current_dir = cwd;
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
/// If no target is provided, changes to the configured home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) => PathBuf::from(t),
            None => env.home.clone(),
        };

        env::set_current_dir(&target).with_context(|| format!("cd: {}", target.display()))?;
        env.current_dir = env::current_dir().unwrap_or(target);
        Ok(0)
    }
}

/// Describe the built-ins, or say whether a name is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Help {
    pub topic: Option<String>,
}

impl Help {
    /// Write the four-line overview.
    pub fn overview(stdout: &mut dyn Write) -> std::io::Result<()> {
        for line in HELP_LINES {
            writeln!(stdout, "{}", line)?;
        }
        Ok(())
    }
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode> {
        let Some(topic) = self.topic else {
            Help::overview(stdout)?;
            return Ok(0);
        };

        let known = match topic.as_str() {
            "cd" => Some(HELP_LINES[0]),
            "exit" => Some(HELP_LINES[1]),
            "help" => Some(HELP_LINES[2]),
            "pwd" => Some(HELP_LINES[3]),
            _ => None,
        };
        match known {
            Some(line) => writeln!(stdout, "{}", line)?,
            None if topic == History::name() => writeln!(
                stdout,
                "'history' is a builtin command that lists the {} most recent commands.",
                history.depth()
            )?,
            None => writeln!(stdout, "'{}' is an external command or application", topic)?,
        }
        Ok(0)
    }
}

/// List the most recent commands, newest first.
pub struct History;

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode> {
        history.render_recent(stdout)?;
        Ok(0)
    }
}
