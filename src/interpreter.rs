use crate::builtin::{Builtin, Help};
use crate::command::{self, Command};
use crate::config::Options;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{Outcome, Supervisor, find_command_path};
use crate::history::HistoryStore;
use crate::io_adapters::{LineSource, ReadEvent};
use crate::lexer::CommandLine;
use crate::signal::SignalController;
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Synthetic history entry recorded for every keyboard interrupt.
pub const INTERRUPT_ENTRY: &str = "help";

/// Whether the loop should keep reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The interactive shell: history, environment, child processes and interrupts.
///
/// Example
/// ```
/// use bang_shell::{Flow, Interpreter};
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// sh.execute_line("help exit", &mut out).unwrap();
/// assert_eq!(sh.execute_line("exit", &mut out).unwrap(), Flow::Exit);
/// assert_eq!(sh.history().last(), Some("exit"));
/// ```
pub struct Interpreter {
    env: Environment,
    history: HistoryStore,
    supervisor: Supervisor,
    signals: SignalController,
}

impl Interpreter {
    /// Create an interpreter configured from command-line options.
    ///
    /// No signal handler is installed yet; see [`Interpreter::install_signals`].
    pub fn new(options: &Options) -> Self {
        Self {
            env: Environment::new(options.home.clone()),
            history: HistoryStore::with_depth(options.history_depth),
            supervisor: Supervisor::new(),
            signals: SignalController::new(),
        }
    }

    /// Route SIGINT to the help-and-record behaviour of this interpreter.
    pub fn install_signals(&mut self) -> Result<()> {
        self.signals
            .install()
            .context("failed to install SIGINT handler")
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Handle to the interrupt flag, e.g. to simulate Ctrl-C.
    pub fn signals(&self) -> &SignalController {
        &self.signals
    }

    /// Read-Eval-Print Loop.
    ///
    /// Returns on `exit` or end of input. A failed read is the only error
    /// that ends the loop.
    pub fn repl(&mut self, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<()> {
        info!("shell started");
        loop {
            let prompt = self.env.prompt();
            let event = input
                .read_line(&prompt)
                .context("Unable to read command from keyboard. Terminating.")?;
            if event == ReadEvent::Interrupted {
                self.signals.notify();
            }
            self.poll_interrupt(out)?;

            match event {
                ReadEvent::Line(line) => {
                    if self.execute_line(&line, out)? == Flow::Exit {
                        break;
                    }
                }
                ReadEvent::Interrupted => continue,
                ReadEvent::Eof => {
                    info!("end of input");
                    break;
                }
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Classify, expand, record and run one input line.
    ///
    /// Errors returned here are failures to write to `out`; everything the
    /// operator did wrong is reported on `out` and yields [`Flow::Continue`].
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let mut cmdline = CommandLine::parse(line);
        if cmdline.is_empty() {
            return Ok(Flow::Continue);
        }

        let mut command = command::classify(&cmdline.tokens, &self.history);
        if command.is_repeat() {
            match command::expand(&command, &self.history) {
                Ok((text, expanded)) => {
                    writeln!(out, "{}", text)?;
                    cmdline = expanded;
                    command = match command::classify(&cmdline.tokens, &self.history) {
                        c if c.is_repeat() || c == Command::HistoryClear => Command::HistoryInvalid,
                        c => c,
                    };
                }
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    return Ok(Flow::Continue);
                }
            }
        }

        self.dispatch(command, &cmdline, out)
    }

    fn dispatch(&mut self, command: Command, cmdline: &CommandLine, out: &mut dyn Write) -> Result<Flow> {
        match command {
            Command::HistoryClear => {
                debug!("history cleared");
                self.history.clear();
            }
            Command::Builtin(builtin) => {
                let listing = builtin == Builtin::History;
                if !listing {
                    self.history.record(&cmdline.to_history_line());
                }
                debug!(builtin = builtin.name(), "running builtin");
                builtin.execute(out, &mut self.env, &self.history)?;
                if listing {
                    self.history.record(&cmdline.to_history_line());
                }
                if self.env.should_exit {
                    return Ok(Flow::Exit);
                }
            }
            Command::External => {
                if self.is_on_path(&cmdline.tokens[0]) {
                    self.history.record(&cmdline.to_history_line());
                }
                self.launch(cmdline, out)?;
            }
            other => {
                let err = other.error().unwrap_or(ShellError::HistoryInvalid);
                writeln!(out, "{}", err)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn launch(&mut self, cmdline: &CommandLine, out: &mut dyn Write) -> Result<()> {
        let Self {
            supervisor,
            history,
            signals,
            ..
        } = &mut *self;
        let mut serviced: io::Result<()> = Ok(());
        let res = {
            let mut on_interrupt = || {
                if signals.take_pending() {
                    if let Err(e) = service_interrupt(history, out) {
                        serviced = Err(e);
                    }
                }
            };
            supervisor.launch(cmdline, &mut on_interrupt)
        };
        serviced?;
        self.poll_interrupt(out)?;

        match res {
            Ok(Outcome::Background(pid)) => {
                debug!(%pid, "running in background");
                writeln!(out, "Running in background")?;
            }
            Ok(Outcome::Exited(code)) => debug!(code, "command finished"),
            Err(e) => writeln!(out, "{}", e)?,
        }
        Ok(())
    }

    /// Whether `name` resolves to a program via `PATH` (or as a path).
    fn is_on_path(&self, name: &str) -> bool {
        let paths = self.env.get_var("PATH").unwrap_or_default();
        find_command_path(OsStr::new(&paths), Path::new(name)).is_some()
    }

    /// Service an interrupt raised since the last poll, if there is one.
    fn poll_interrupt(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if self.signals.take_pending() {
            service_interrupt(&mut self.history, out)?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

/// Record the synthetic entry and print the help overview.
fn service_interrupt(history: &mut HistoryStore, out: &mut dyn Write) -> io::Result<()> {
    debug!("servicing interrupt");
    history.record(INTERRUPT_ENTRY);
    Help::overview(out)?;
    out.flush()
}
