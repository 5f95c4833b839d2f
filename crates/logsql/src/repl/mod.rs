//! Interactive read-evaluate-print loop over a [`Session`].
//!
//! Lines starting with `.` are dot-commands; everything else accumulates
//! until a line ends the statement with `;`. A failing command or statement
//! prints one `Error: ...` line and the loop carries on.

pub mod commands;

use crate::cli::Renderer;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::TABLE_NAME;
use colored::Colorize;
use commands::Outcome;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, Write};
use tracing::debug;

pub const PROMPT: &str = "current> ";
pub const CONTINUATION_PROMPT: &str = "   ...> ";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// One read from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Where the loop gets its lines from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Reads lines from any buffered reader without printing prompts.
///
/// Used when stdin is piped, and in tests.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Input> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Input::Eof);
        }
        Ok(Input::Line(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string()))
    }
}

/// Line editor with history for interactive terminals.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    AwaitingInput,
    AccumulatingSql,
    Exiting,
}

pub struct Repl<S, W> {
    session: Session,
    source: S,
    out: W,
    renderer: Renderer,
    buffer: String,
    state: ReplState,
    color: bool,
}

impl<S: LineSource, W: Write> Repl<S, W> {
    pub fn new(session: Session, source: S, out: W, renderer: Renderer) -> Self {
        Self {
            session,
            source,
            out,
            renderer,
            buffer: String::new(),
            state: ReplState::AwaitingInput,
            color: false,
        }
    }

    /// Highlight the `Error:` prefix.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn state(&self) -> ReplState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs until `.q`, end of input or an interrupt.
    ///
    /// Only failures to read input or write output end the loop early.
    pub fn run(&mut self) -> Result<()> {
        while self.state != ReplState::Exiting {
            let prompt = match self.state {
                ReplState::AccumulatingSql => CONTINUATION_PROMPT,
                _ => PROMPT,
            };

            match self.source.read_line(prompt)? {
                Input::Line(line) => self.handle_line(&line)?,
                Input::Eof => {
                    if !self.buffer.trim().is_empty() {
                        debug!(buffer = %self.buffer, "discarding unterminated statement");
                    }
                    writeln!(self.out, "Exit.")?;
                    self.state = ReplState::Exiting;
                }
                Input::Interrupted => {
                    self.state = ReplState::Exiting;
                }
            }
        }

        self.out.flush()?;
        Ok(())
    }

    /// Processes one input line.
    pub fn handle_line(&mut self, line: &str) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let outcome = if self.state == ReplState::AwaitingInput && trimmed.starts_with('.') {
            self.dispatch_command(trimmed)
        } else {
            match self.accumulate(line) {
                Some(statement) => self.execute_sql(&statement),
                None => return Ok(()),
            }
        };

        self.apply(outcome)
    }

    fn dispatch_command(&mut self, line: &str) -> Result<Outcome> {
        let (command, args) = commands::parse(line)?;
        debug!(?command, ?args, "dot-command");
        command.run(&mut self.session, &args, &self.renderer)
    }

    /// Appends a line to the statement buffer and returns the statement once
    /// it is terminated by `;`.
    fn accumulate(&mut self, line: &str) -> Option<String> {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        match self.buffer.trim_end().strip_suffix(';') {
            Some(statement) => {
                let statement = statement.trim().to_string();
                self.buffer.clear();
                self.state = ReplState::AwaitingInput;
                Some(statement)
            }
            None => {
                self.state = ReplState::AccumulatingSql;
                None
            }
        }
    }

    fn execute_sql(&mut self, sql: &str) -> Result<Outcome> {
        if sql.is_empty() {
            return Ok(Outcome::Nothing);
        }
        debug!(sql, "executing statement");
        let result = self.session.query(sql)?;
        Ok(Outcome::Print(
            self.renderer.render_result(&result, self.session.columns()),
        ))
    }

    fn apply(&mut self, outcome: Result<Outcome>) -> Result<()> {
        match outcome {
            Ok(Outcome::Print(text)) => writeln!(self.out, "{}", text)?,
            Ok(Outcome::ClearScreen) => write!(self.out, "{}", CLEAR_SCREEN)?,
            Ok(Outcome::Exit) => {
                writeln!(self.out, "Exit.")?;
                self.state = ReplState::Exiting;
            }
            Ok(Outcome::Nothing) => {}
            Err(err) => self.report_error(&err)?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn report_error(&mut self, err: &Error) -> Result<()> {
        let kind = if err.is_query_error() {
            "query"
        } else if err.is_usage_error() {
            "usage"
        } else if err.is_load_error() {
            "load"
        } else {
            "io"
        };
        debug!(kind, error = ?err, "command failed");
        let message = err.to_string().split_whitespace().collect::<Vec<_>>().join(" ");
        if self.color {
            writeln!(self.out, "{} {}", "Error:".red().bold(), message)?;
        } else {
            writeln!(self.out, "Error: {}", message)?;
        }
        Ok(())
    }
}

/// Greeting printed before an interactive session.
pub fn banner(session: &Session) -> String {
    format!(
        "SQL shell for table '{}' ({}: {} rows, {} columns, separator '{}')\n\
         Type SQL statements terminated with ';'\n\
         Built-in commands: .help, .cols, .head [N], .tail [N], .sep <char>, .clear, .q to quit",
        TABLE_NAME,
        session.path().display(),
        session.table().row_count(),
        session.columns().len(),
        session.delimiter()
    )
}
