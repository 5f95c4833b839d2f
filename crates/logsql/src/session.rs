//! Session state: the loaded file, its table and the engine built from it.

use crate::error::Result;
use crate::loader::{self, ColumnMapping, Delimiter, HeaderMode, LoadOptions, LoadReport, Table};
use crate::sql::{rewrite_positional, QueryEngine, QueryResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a shell session operates on.
///
/// The table, delimiter and engine only change together, through
/// [`Session::reload`].
pub struct Session {
    path: PathBuf,
    header: HeaderMode,
    delimiter: Delimiter,
    table: Table,
    engine: QueryEngine,
}

impl Session {
    /// Loads `path` and prepares it for querying.
    ///
    /// The header mode comes from the file extension and stays fixed for the
    /// life of the session. `delimiter` overrides the mode's default.
    pub fn open(path: impl Into<PathBuf>, delimiter: Option<Delimiter>) -> Result<(Self, LoadReport)> {
        let path = path.into();
        let options = LoadOptions::for_path(&path, delimiter);
        let (table, report) = loader::load(&path, &options)?;
        let engine = QueryEngine::from_table(&table)?;

        let session = Self {
            path,
            header: options.header,
            delimiter: options.delimiter,
            table,
            engine,
        };
        Ok((session, report))
    }

    /// Re-reads the file with a new delimiter.
    ///
    /// On failure the session keeps its previous table and delimiter.
    pub fn reload(&mut self, delimiter: Delimiter) -> Result<LoadReport> {
        let options = LoadOptions {
            header: self.header,
            delimiter,
        };
        let (table, report) = loader::load(&self.path, &options)?;
        let engine = QueryEngine::from_table(&table)?;

        info!(
            path = %self.path.display(),
            delimiter = %options.delimiter,
            columns = table.columns().len(),
            "reloaded table"
        );

        self.delimiter = options.delimiter;
        self.table = table;
        self.engine = engine;
        Ok(report)
    }

    /// Runs a SQL statement. `$N` refers to the N-th column.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let sql = rewrite_positional(sql, self.table.columns());
        self.engine.execute(&sql)
    }

    /// The first `n` rows of the table.
    pub fn head(&self, n: usize) -> QueryResult {
        QueryResult::from_rows(self.query_names(), self.table.head(n))
    }

    /// The last `n` rows of the table.
    pub fn tail(&self, n: usize) -> QueryResult {
        QueryResult::from_rows(self.query_names(), self.table.tail(n))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header_mode(&self) -> HeaderMode {
        self.header
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> &ColumnMapping {
        self.table.columns()
    }

    fn query_names(&self) -> Vec<String> {
        self.columns().query_names().into_iter().map(String::from).collect()
    }
}
