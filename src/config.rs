use crate::history::HISTORY_DEPTH;
use argh::FromArgs;
use std::path::PathBuf;

/// Log filter used when neither `--log` nor `RUST_LOG` is given.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(FromArgs, Debug)]
/// An interactive shell with `!!`, `!-` and `!<n>` history expansion.
pub struct Options {
    #[argh(option)]
    /// directory that `cd` with no argument switches to. Defaults to $HOME.
    pub home: Option<PathBuf>,

    #[argh(option, default = "HISTORY_DEPTH")]
    /// number of commands kept for `history` and `!<n>`.
    pub history_depth: usize,

    #[argh(option)]
    /// tracing filter for diagnostics on stderr, e.g. `debug`. Overrides RUST_LOG.
    pub log: Option<String>,

    #[argh(switch)]
    /// leave SIGINT at its default action instead of printing help.
    pub no_signals: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            home: None,
            history_depth: HISTORY_DEPTH,
            log: None,
            no_signals: false,
        }
    }
}
