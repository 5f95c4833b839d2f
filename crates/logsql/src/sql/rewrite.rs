//! Positional column references (`$1`, `$2`, ...) in user SQL.
//!
//! SQLite would read `$3` as a bind parameter, so references are rewritten to
//! the column's query name before the statement reaches the engine. Text
//! inside single-quoted literals is left alone.
//!
//! Names are emitted in backticks: SQLite falls back to a string literal for
//! a double-quoted name that matches no column, but never for a backticked
//! one.

use crate::loader::ColumnMapping;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn positional_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$(\d+)").expect("valid positional pattern"))
}

/// Rewrites `$N` to the N-th column's query name.
///
/// Out-of-range positions become `_N`, which the engine reports as an
/// unknown column.
pub fn rewrite_positional(sql: &str, columns: &ColumnMapping) -> String {
    let pattern = positional_pattern();

    // Splitting on quotes puts literal contents at odd indexes. An escaped
    // quote ('') yields an empty segment and keeps the parity right.
    sql.split('\'')
        .enumerate()
        .map(|(i, segment)| {
            if i % 2 == 1 {
                return segment.to_string();
            }
            pattern
                .replace_all(segment, |caps: &Captures| {
                    let position: Option<usize> = caps[1].parse().ok();
                    let name = match position.and_then(|p| columns.query_name_at(p)) {
                        Some(name) => name.to_string(),
                        None => format!("_{}", &caps[1]),
                    };
                    backtick(&name)
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("'")
}

fn backtick(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
