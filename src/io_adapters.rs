use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::ErrorKind;

/// Result of one attempt to read a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Line(String),
    /// The read was cut short by Ctrl-C / SIGINT.
    Interrupted,
    /// No more input.
    Eof,
}

/// Where the interpreter reads its command lines from.
pub trait LineSource {
    /// Show `prompt` and block for the next line.
    ///
    /// An `Err` means input can no longer be read at all.
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent>;
}

/// Interactive terminal input backed by rustyline.
///
/// The editor keeps no history of its own; `!!` and friends go through the
/// shell's [`crate::history::HistoryStore`].
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Io(e)) if e.kind() == ErrorKind::Interrupted => {
                Ok(ReadEvent::Interrupted)
            }
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(err) => Err(anyhow::anyhow!("Unable to read command from keyboard: {}", err)),
        }
    }
}

/// Memory-backed line source for driving the interpreter from tests.
#[derive(Debug, Default)]
pub struct Script {
    events: VecDeque<ReadEvent>,
    prompts: Vec<String>,
}

impl Script {
    /// A script that yields each line in order, then EOF.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: lines.into_iter().map(|l| ReadEvent::Line(l.into())).collect(),
            prompts: Vec::new(),
        }
    }

    /// Queue an arbitrary event after the ones already scripted.
    pub fn push(&mut self, event: ReadEvent) {
        self.events.push_back(event);
    }

    /// Prompts shown so far, one per read.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl LineSource for Script {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(ReadEvent::Eof))
    }
}
