//! # logsql
//!
//! Query CSV files and delimited text logs with SQL.
//!
//! The input file is loaded into an in-memory SQLite table named `current`.
//! Files ending in `.csv` are read with their header row as column names;
//! anything else is treated as headerless text split on whitespace, with
//! columns addressed as `$1`, `$2`, ... (stored internally as `_1`, `_2`, ...).
//!
//! ## Quick Start
//!
//! ```no_run
//! use logsql::{Renderer, Session};
//!
//! fn main() -> logsql::Result<()> {
//!     let (session, _report) = Session::open("access.log", None)?;
//!     let result = session.query("SELECT $1, COUNT(*) FROM current GROUP BY $1")?;
//!
//!     let renderer = Renderer::default();
//!     println!("{}", renderer.render_result(&result, session.columns()));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod repl;
pub mod session;
pub mod sql;

pub use cli::{OutputFormat, Renderer};
pub use config::Config;
pub use error::{Error, Result};
pub use loader::{ColumnMapping, Delimiter, HeaderMode, LoadOptions, LoadReport, Table};
pub use repl::Repl;
pub use session::Session;
pub use sql::{QueryEngine, QueryResult};

/// Name of the table every query runs against.
pub const TABLE_NAME: &str = "current";
