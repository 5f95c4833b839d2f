//! Reads a CSV or delimited text file into a [`Table`].
//!
//! Files ending in `.csv` are read with header detection; everything else is
//! treated as headerless. Rows whose width differs from the column count are
//! padded with empty cells or have their extra fields dropped, and the counts
//! are returned in a [`LoadReport`].

mod columns;
mod delimiter;

pub use columns::{sanitize_identifier, Column, ColumnMapping};
pub use delimiter::Delimiter;

use crate::error::{Error, Result};
use rusqlite::types::Value;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whether the first record of a file may be a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Treat the first record as a header unless it has empty fields.
    Detect,
    /// Every record is data.
    Absent,
}

impl HeaderMode {
    /// `.csv` files get header detection, anything else is headerless.
    pub fn for_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            HeaderMode::Detect
        } else {
            HeaderMode::Absent
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub header: HeaderMode,
    pub delimiter: Delimiter,
}

impl LoadOptions {
    /// Options for `path`, using `delimiter` or the default for its header mode.
    pub fn for_path(path: &Path, delimiter: Option<Delimiter>) -> Self {
        let header = HeaderMode::for_path(path);
        Self {
            header,
            delimiter: delimiter.unwrap_or_else(|| Delimiter::default_for(header)),
        }
    }
}

/// What happened while normalizing the rows of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Rows that were short and got empty cells appended.
    pub padded: usize,
    /// Rows that were long and had extra fields dropped.
    pub truncated: usize,
    /// Header detection was requested but the first record had empty fields.
    pub header_fallback: bool,
}

impl LoadReport {
    /// User-facing note about anything unusual in the load, if there was any.
    pub fn notice(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.header_fallback {
            parts.push("no usable header row, columns are named $1, $2, ...".to_string());
        }
        if self.padded > 0 {
            parts.push(format!(
                "{} short {} padded with empty values",
                self.padded,
                plural(self.padded, "row", "rows")
            ));
        }
        if self.truncated > 0 {
            parts.push(format!(
                "{} long {} had extra fields dropped",
                self.truncated,
                plural(self.truncated, "row", "rows")
            ));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("Note: {}", parts.join("; ")))
        }
    }
}

/// SQL storage class inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Infers the narrowest type that holds every non-empty cell.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut inferred = None;

        for cell in cells.into_iter().filter(|c| !c.is_empty()) {
            let cell_type = if cell.parse::<i64>().is_ok() {
                ColumnType::Integer
            } else if cell.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                ColumnType::Real
            } else {
                return ColumnType::Text;
            };

            inferred = Some(match (inferred, cell_type) {
                (None, t) => t,
                (Some(ColumnType::Integer), ColumnType::Integer) => ColumnType::Integer,
                _ => ColumnType::Real,
            });
        }

        inferred.unwrap_or(ColumnType::Text)
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Converts a cell to the value stored in SQLite. Empty cells become NULL.
    pub fn to_sql_value(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnType::Integer => cell
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Real => cell
                .parse()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Text => Value::Text(cell.to_string()),
        }
    }
}

/// The loaded data: column mapping plus rows of trimmed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: ColumnMapping,
    rows: Vec<Vec<String>>,
    has_header: bool,
}

impl Table {
    /// Builds a table, normalizing every row to the mapping's width.
    pub fn new(columns: ColumnMapping, rows: Vec<Vec<String>>, has_header: bool) -> Self {
        let (table, _) = Self::normalized(columns, rows, has_header);
        table
    }

    fn normalized(
        columns: ColumnMapping,
        mut rows: Vec<Vec<String>>,
        has_header: bool,
    ) -> (Self, LoadReport) {
        let width = columns.len();
        let mut report = LoadReport {
            rows: rows.len(),
            ..LoadReport::default()
        };

        for row in &mut rows {
            match row.len().cmp(&width) {
                Ordering::Less => {
                    row.resize(width, String::new());
                    report.padded += 1;
                }
                Ordering::Greater => {
                    row.truncate(width);
                    report.truncated += 1;
                }
                Ordering::Equal => {}
            }
        }

        let table = Self {
            columns,
            rows,
            has_header,
        };
        (table, report)
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> &[Vec<String>] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|i| ColumnType::infer(self.rows.iter().map(|row| row[i].as_str())))
            .collect()
    }
}

/// Loads `path` into a table.
///
/// The whole file is read at once, so no handle outlives this call.
pub fn load(path: &Path, options: &LoadOptions) -> Result<(Table, LoadReport)> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    let text = std::str::from_utf8(bytes).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = read_records(text, &options.delimiter)?;
    if records.is_empty() {
        return Err(Error::EmptyFile(path.to_path_buf()));
    }

    let mut header_fallback = false;
    let (columns, has_header) = match options.header {
        HeaderMode::Detect if is_header(&records[0]) => {
            let header = records.remove(0);
            (ColumnMapping::from_header(&header[..]), true)
        }
        HeaderMode::Detect => {
            warn!(path = %path.display(), "first record has empty fields, loading without header");
            header_fallback = true;
            (ColumnMapping::positional(records[0].len()), false)
        }
        HeaderMode::Absent => (ColumnMapping::positional(records[0].len()), false),
    };

    let (table, mut report) = Table::normalized(columns, records, has_header);
    report.header_fallback = header_fallback;

    debug!(
        path = %path.display(),
        delimiter = %options.delimiter,
        has_header,
        columns = table.columns().len(),
        rows = report.rows,
        padded = report.padded,
        truncated = report.truncated,
        "loaded table"
    );

    Ok((table, report))
}

/// Splits `text` into records, skipping blank lines.
fn read_records(text: &str, delimiter: &Delimiter) -> Result<Vec<Vec<String>>> {
    let Some(byte) = delimiter.csv_byte() else {
        return Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| delimiter.split(line))
            .collect());
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        records.push(record.iter().map(String::from).collect());
    }
    Ok(records)
}

fn is_header(fields: &[String]) -> bool {
    !fields.is_empty() && fields.iter().all(|f| !f.is_empty())
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
