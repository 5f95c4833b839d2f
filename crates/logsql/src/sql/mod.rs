//! SQL execution against the `current` table.
//!
//! SQLite (bundled through rusqlite) does the parsing and evaluation. This
//! module only materializes the table, rewrites `$N` references and collects
//! results.

mod engine;
mod rewrite;

pub use engine::{quote_identifier, QueryEngine, QueryResult};
pub use rewrite::rewrite_positional;
