//! Field separators accepted by `--sep` and `.sep`.

use crate::error::{Error, Result};
use crate::loader::HeaderMode;
use regex::Regex;
use std::fmt;

/// How a line of input is split into fields.
#[derive(Debug, Clone)]
pub enum Delimiter {
    /// Runs of whitespace (`\s+`).
    Whitespace,
    /// A single character.
    Char(char),
    /// A regular expression.
    Pattern(Regex),
}

impl Delimiter {
    /// Parses user input into a delimiter.
    ///
    /// Accepts `\s+` (or `\s`, `whitespace`) for whitespace runs, a single
    /// character, or a regex. The escapes `\t`, `\n`, `\r` and `\\` are
    /// honored, and a value wrapped in matching quotes is unquoted so that
    /// `' '` selects a single space.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = unquote(input.trim_matches(|c| c == '\n' || c == '\r'));

        if raw.is_empty() {
            return Err(Error::Usage("separator must not be empty".into()));
        }

        if matches!(raw, r"\s+" | r"\s" | "whitespace") {
            return Ok(Delimiter::Whitespace);
        }

        let text = unescape(raw);
        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Delimiter::Char(c));
        }

        // Regex syntax understands \t, \n and friends natively.
        Regex::new(raw)
            .map(Delimiter::Pattern)
            .map_err(|source| Error::InvalidSeparator {
                input: input.to_string(),
                source,
            })
    }

    /// The delimiter a file gets when none is given on the command line.
    pub fn default_for(mode: HeaderMode) -> Self {
        match mode {
            HeaderMode::Detect => Delimiter::Char(','),
            HeaderMode::Absent => Delimiter::Whitespace,
        }
    }

    /// The byte to hand to the CSV reader, if this delimiter can be parsed
    /// with quoting rules.
    pub fn csv_byte(&self) -> Option<u8> {
        match self {
            Delimiter::Char(c) if c.is_ascii() && !matches!(*c, '"' | '\n' | '\r') => Some(*c as u8),
            _ => None,
        }
    }

    /// Splits one line into trimmed fields, without quote handling.
    pub fn split(&self, line: &str) -> Vec<String> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().map(String::from).collect(),
            Delimiter::Char(c) => line.split(*c).map(|f| f.trim().to_string()).collect(),
            Delimiter::Pattern(re) => re.split(line.trim()).map(|f| f.trim().to_string()).collect(),
        }
    }
}

impl PartialEq for Delimiter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Delimiter::Whitespace, Delimiter::Whitespace) => true,
            (Delimiter::Char(a), Delimiter::Char(b)) => a == b,
            (Delimiter::Pattern(a), Delimiter::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Whitespace => f.write_str(r"\s+"),
            Delimiter::Char('\t') => f.write_str(r"\t"),
            Delimiter::Char('\n') => f.write_str(r"\n"),
            Delimiter::Char('\r') => f.write_str(r"\r"),
            Delimiter::Char('\\') => f.write_str(r"\\"),
            Delimiter::Char(c) => write!(f, "{}", c),
            Delimiter::Pattern(re) => f.write_str(re.as_str()),
        }
    }
}

fn unquote(input: &str) -> &str {
    for quote in ['\'', '"'] {
        if input.len() >= 2 && input.starts_with(quote) && input.ends_with(quote) {
            return &input[1..input.len() - 1];
        }
    }
    input
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
