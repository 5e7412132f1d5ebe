//! A small interactive shell with history expansion.
//!
//! Each input line is tokenized, classified as a built-in (`exit`, `pwd`,
//! `cd`, `help`, `history`), a history directive (`!!`, `!-`, `!<n>`) or an
//! external program, and then executed. External programs run as forked
//! children, in the foreground or, with a trailing `&`, in the background.
//! Finished background children are reaped silently after every launch.
//!
//! The main entry point is [`Interpreter`]. [`HistoryStore`] keeps the last
//! few command lines, addressable by a growing command id.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
pub mod io_adapters;
mod interpreter;
pub mod lexer;
pub mod signal;

#[cfg(test)]
mod test_support;

pub use builtin::{Builtin, Cd, HELP_LINES, Help};
pub use error::ShellError;
pub use history::HistoryStore;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Flow, INTERRUPT_ENTRY, Interpreter};
