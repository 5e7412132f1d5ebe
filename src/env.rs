use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Fallback target of a bare `cd` when neither `--home` nor `HOME` is set.
pub const DEFAULT_HOME: &str = "/";

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: a snapshot of the process variables, used for `PATH` lookups.
/// - `current_dir`: the working directory, refreshed by `cd` and `pwd`.
/// - `home`: where `cd` without arguments goes.
/// - `should_exit`: set by `exit`; the loop checks it after every command.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub home: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state.
    ///
    /// `home` falls back to `HOME`, then to [`DEFAULT_HOME`].
    pub fn new(home: Option<PathBuf>) -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home = home
            .or_else(|| vars.get("HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME));
        Self {
            vars,
            current_dir,
            home,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Text of the interactive prompt: the working directory followed by `$ `.
    pub fn prompt(&self) -> String {
        format!("{}$ ", self.current_dir.display())
    }
}
