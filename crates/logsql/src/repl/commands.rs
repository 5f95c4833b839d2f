//! Dot-commands.

use crate::cli::Renderer;
use crate::error::{Error, Result};
use crate::loader::Delimiter;
use crate::session::Session;

/// Rows shown by `.head` and `.tail` without an argument.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

pub const HELP: &str = r#"Examples:
  SELECT * FROM current LIMIT 10;
  SELECT URL, Host FROM current WHERE 风险级别='高';
  SELECT $1, $2 FROM current WHERE $3='something';  -- files without header

Built-in commands:
  .cols           Show columns
  .head [N]       Show first N rows (default 5)
  .tail [N]       Show last N rows (default 5)
  .sep [DELIM]    Show or change the separator and reload the file
                  (e.g. .sep ,   .sep \t   .sep \s+   .sep ' ')
  .clear          Clear screen
  .help           Show this help message
  .q              Quit

Notes:
  SQL statements end with ';' and may span several lines.
  Files ending in .csv use their first row as column names; other files are
  split on whitespace and use $1, $2, ... for columns.
  Rows shorter than the first row are padded with empty values; extra fields
  in longer rows are dropped."#;

/// What the loop should do after a command succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    ClearScreen,
    Exit,
    Nothing,
}

/// Uniform signature of every dot-command handler.
pub type Handler = fn(&mut Session, &[&str], &Renderer) -> Result<Outcome>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotCommand {
    Cols,
    Head,
    Tail,
    Sep,
    Clear,
    Help,
    Quit,
}

const COMMANDS: &[(&str, DotCommand)] = &[
    (".cols", DotCommand::Cols),
    (".head", DotCommand::Head),
    (".tail", DotCommand::Tail),
    (".sep", DotCommand::Sep),
    (".clear", DotCommand::Clear),
    (".help", DotCommand::Help),
    (".q", DotCommand::Quit),
    (".quit", DotCommand::Quit),
    (".exit", DotCommand::Quit),
];

impl DotCommand {
    /// Looks up a command by name, ignoring case.
    pub fn lookup(name: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, command)| *command)
    }

    pub fn handler(self) -> Handler {
        match self {
            DotCommand::Cols => cols,
            DotCommand::Head => head,
            DotCommand::Tail => tail,
            DotCommand::Sep => sep,
            DotCommand::Clear => clear,
            DotCommand::Help => help,
            DotCommand::Quit => quit,
        }
    }

    pub fn run(self, session: &mut Session, args: &[&str], renderer: &Renderer) -> Result<Outcome> {
        (self.handler())(session, args, renderer)
    }
}

/// Splits a dot-command line into the command and its arguments.
pub fn parse(line: &str) -> Result<(DotCommand, Vec<&str>)> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next().unwrap_or_default();
    let command = DotCommand::lookup(name).ok_or_else(|| Error::UnknownCommand(name.to_string()))?;
    Ok((command, tokens.collect()))
}

fn cols(session: &mut Session, _args: &[&str], renderer: &Renderer) -> Result<Outcome> {
    Ok(Outcome::Print(renderer.render_columns(session.table())))
}

fn head(session: &mut Session, args: &[&str], renderer: &Renderer) -> Result<Outcome> {
    let n = row_count_arg(".head", args)?;
    Ok(Outcome::Print(renderer.render_result(&session.head(n), session.columns())))
}

fn tail(session: &mut Session, args: &[&str], renderer: &Renderer) -> Result<Outcome> {
    let n = row_count_arg(".tail", args)?;
    Ok(Outcome::Print(renderer.render_result(&session.tail(n), session.columns())))
}

fn sep(session: &mut Session, args: &[&str], _renderer: &Renderer) -> Result<Outcome> {
    if args.is_empty() {
        return Ok(Outcome::Print(format!("Current separator: '{}'", session.delimiter())));
    }

    let delimiter = Delimiter::parse(&args.join(" "))?;
    let report = session.reload(delimiter)?;

    let mut out = format!(
        "Separator changed to: '{}' ({} columns, {} rows)",
        session.delimiter(),
        session.columns().len(),
        session.table().row_count()
    );
    if let Some(notice) = report.notice() {
        out.push('\n');
        out.push_str(&notice);
    }
    Ok(Outcome::Print(out))
}

fn clear(_session: &mut Session, _args: &[&str], _renderer: &Renderer) -> Result<Outcome> {
    Ok(Outcome::ClearScreen)
}

fn help(_session: &mut Session, _args: &[&str], _renderer: &Renderer) -> Result<Outcome> {
    Ok(Outcome::Print(HELP.to_string()))
}

fn quit(_session: &mut Session, _args: &[&str], _renderer: &Renderer) -> Result<Outcome> {
    Ok(Outcome::Exit)
}

fn row_count_arg(command: &str, args: &[&str]) -> Result<usize> {
    match args {
        [] => Ok(DEFAULT_PREVIEW_ROWS),
        [n] => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(Error::Usage(format!("{} [N] expects a positive integer, got {:?}", command, n))),
        },
        _ => Err(Error::Usage(format!("{} [N] takes at most one argument", command))),
    }
}
