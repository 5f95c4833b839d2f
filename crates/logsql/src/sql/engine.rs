//! SQL query engine over the loaded table.

use crate::error::{Error, Result};
use crate::loader::Table;
use crate::TABLE_NAME;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Map, Value};
use tracing::debug;

/// Executes SQL against an in-memory SQLite copy of a [`Table`].
///
/// The table is materialized once as `current`, with column types inferred
/// from the data, and the connection is then switched to query-only mode.
///
/// # Example
///
/// ```
/// use logsql::{ColumnMapping, QueryEngine, Table};
///
/// let rows = vec![vec!["GET".to_string(), "200".to_string()]];
/// let table = Table::new(ColumnMapping::positional(2), rows, false);
/// let engine = QueryEngine::from_table(&table)?;
///
/// let result = engine.execute("SELECT _2 + 1 AS next FROM current")?;
/// assert_eq!(result.columns, vec!["next"]);
/// # Ok::<(), logsql::Error>(())
/// ```
pub struct QueryEngine {
    conn: Connection,
}

impl QueryEngine {
    /// Creates an engine holding `table` as `current`.
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        populate(&mut conn, table)?;
        conn.pragma_update(None, "query_only", true)?;
        Ok(Self { conn })
    }

    /// Executes a single read-only SQL statement and returns the results.
    ///
    /// Any SQL SQLite supports for reading works here, including CTEs, window
    /// functions and aggregations. Statements that would modify the database
    /// are rejected.
    pub fn execute(&self, query: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(query)?;
        if !stmt.readonly() {
            return Err(Error::Sql(rusqlite::Error::InvalidQuery));
        }

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map([], |row| row_to_values(row, columns.len()))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "query finished");
        Ok(QueryResult { columns, rows })
    }
}

fn populate(conn: &mut Connection, table: &Table) -> Result<()> {
    let types = table.column_types();
    let definitions: Vec<String> = table
        .columns()
        .iter()
        .zip(&types)
        .map(|(column, ty)| format!("{} {}", quote_identifier(&column.name), ty.sql_type()))
        .collect();
    let placeholders: Vec<String> = (1..=types.len()).map(|i| format!("?{}", i)).collect();

    let tx = conn.transaction()?;
    tx.execute(
        &format!("CREATE TABLE {} ({})", TABLE_NAME, definitions.join(", ")),
        [],
    )?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            TABLE_NAME,
            placeholders.join(", ")
        ))?;
        for row in table.rows() {
            let values = row.iter().zip(&types).map(|(cell, ty)| ty.to_sql_value(cell));
            insert.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;

    debug!(
        columns = types.len(),
        rows = table.row_count(),
        "materialized table {}",
        TABLE_NAME
    );
    Ok(())
}

/// Quotes an identifier for use in generated SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn row_to_values(row: &Row, col_count: usize) -> rusqlite::Result<Vec<Value>> {
    (0..col_count)
        .map(|i| {
            Ok(match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::Number(n.into()),
                ValueRef::Real(n) => serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string())),
                ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
                ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
            })
        })
        .collect()
}

/// The result of a SQL query execution.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column labels as reported by the engine.
    pub columns: Vec<String>,
    /// Row data as JSON scalars.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Returns true if the result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Builds a result straight from table rows. Empty cells become null.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<String>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            Value::Null
                        } else {
                            Value::String(cell.clone())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Converts the result to a JSON array of objects keyed by `labels`.
    pub fn to_json_array(&self, labels: &[String]) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, label) in labels.iter().enumerate() {
                    obj.insert(label.clone(), row.get(i).cloned().unwrap_or(Value::Null));
                }
                Value::Object(obj)
            })
            .collect()
    }
}
