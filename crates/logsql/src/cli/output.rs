use crate::error::Result;
use crate::loader::{ColumnMapping, Table as DataTable};
use crate::sql::QueryResult;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// Width tables wrap at when neither `--max-width` nor a terminal gives one.
pub const DEFAULT_WIDTH: u16 = 120;

/// Narrowest column worth wrapping into, excluding padding and borders.
const MIN_COLUMN_WIDTH: u16 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Jsonl,
    Csv,
}

/// Formats results as text grids.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    max_width: Option<u16>,
}

impl Renderer {
    /// `max_width` fixes the table width; `None` uses the terminal width
    /// when there is one.
    pub fn new(max_width: Option<u16>) -> Self {
        Self { max_width }
    }

    pub fn create_table(&self, column_count: usize) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);

        let width = self.max_width.or_else(|| table.width()).unwrap_or(DEFAULT_WIDTH);
        if width < min_table_width(column_count) {
            debug!(width, column_count, "table too narrow, not wrapping");
            table.set_content_arrangement(ContentArrangement::Disabled);
        } else {
            table
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(width);
        }
        table
    }

    pub fn render_grid(&self, headers: Vec<String>, rows: Vec<Vec<String>>) -> String {
        let mut table = self.create_table(headers.len());
        table.set_header(headers);
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }

    /// Renders a query result followed by its row count.
    pub fn render_result(&self, result: &QueryResult, columns: &ColumnMapping) -> String {
        if result.is_empty() {
            return row_count_footer(0);
        }

        let headers = columns.display_labels(&result.columns);
        let rows = result
            .rows
            .iter()
            .map(|row| row.iter().map(format_value).collect())
            .collect();

        format!(
            "{}\n{}",
            self.render_grid(headers, rows),
            row_count_footer(result.row_count())
        )
    }

    /// The `.cols` listing: display names, query names when they differ,
    /// and a one-row preview.
    pub fn render_columns(&self, table: &DataTable) -> String {
        let columns = table.columns();
        let mut out = format!("Columns:\n{}", columns.display_names().join(", "));

        if columns.has_renamed_columns() {
            out.push_str(&format!("\nQuery names: {}", columns.query_names().join(", ")));
        }

        if let Some(first) = table.rows().first() {
            let headers = columns.display_names().into_iter().map(String::from).collect();
            let preview = self.render_grid(headers, vec![first.clone()]);
            out.push_str(&format!("\n\nFirst row preview:\n{}", preview));
        }
        out
    }
}

fn min_table_width(column_count: usize) -> u16 {
    // Each column carries two padding spaces and one border.
    let per_column = usize::from(MIN_COLUMN_WIDTH) + 3;
    u16::try_from(column_count * per_column + 1).unwrap_or(u16::MAX)
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

pub fn row_count_footer(count: usize) -> String {
    if count == 1 {
        "(1 row)".to_string()
    } else {
        format!("({} rows)", count)
    }
}

/// Writes a result in one of the one-shot formats.
pub fn write_result<W: Write>(
    writer: &mut W,
    result: &QueryResult,
    columns: &ColumnMapping,
    format: OutputFormat,
    renderer: &Renderer,
) -> Result<()> {
    let labels = columns.display_labels(&result.columns);

    match format {
        OutputFormat::Table => {
            writeln!(writer, "{}", renderer.render_result(result, columns))?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result.to_json_array(&labels))?;
            writeln!(writer, "{}", json)?;
        }
        OutputFormat::Jsonl => {
            for row in result.to_json_array(&labels) {
                writeln!(writer, "{}", serde_json::to_string(&row)?)?;
            }
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(&mut *writer);
            csv_writer.write_record(&labels)?;
            for row in &result.rows {
                csv_writer.write_record(row.iter().map(format_value))?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn display_width(line: &str) -> usize {
        line.chars()
            .map(|c| if ('\u{1100}'..='\u{FFDC}').contains(&c) && !is_box_drawing(c) { 2 } else { 1 })
            .sum()
    }

    fn is_box_drawing(c: char) -> bool {
        ('\u{2500}'..='\u{257F}').contains(&c)
    }

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_render_maps_labels_and_counts_rows() {
        let renderer = Renderer::new(Some(80));
        let mapping = ColumnMapping::positional(3);
        let out = renderer.render_result(
            &result(&["_3", "n"], vec![vec![json!("攻击"), json!(2)]]),
            &mapping,
        );

        assert!(out.contains("$3"));
        assert!(!out.contains("_3"));
        assert!(out.contains("攻击"));
        assert!(out.ends_with("(1 row)"));
    }

    #[test]
    fn test_empty_result() {
        let renderer = Renderer::default();
        let out = renderer.render_result(&result(&["_1"], vec![]), &ColumnMapping::positional(1));
        assert_eq!(out, "(0 rows)");
    }

    #[test]
    fn test_cells_are_trimmed_and_nulls_blank() {
        assert_eq!(format_value(&json!("  padded  ")), "padded");
        assert_eq!(format_value(&Value::Null), "");
        assert_eq!(format_value(&json!(1.5)), "1.5");
    }

    #[test]
    fn test_long_cells_wrap_instead_of_truncating() {
        let renderer = Renderer::new(Some(40));
        let long = "x".repeat(200);
        let out = renderer.render_result(
            &result(&["_1"], vec![vec![json!(long)]]),
            &ColumnMapping::positional(1),
        );

        let grid: Vec<&str> = out.lines().filter(|l| !l.starts_with('(')).collect();
        assert!(grid.iter().all(|line| display_width(line) <= 40));
        assert_eq!(out.matches('x').count(), 200);
    }

    #[test]
    fn test_wide_characters_align() {
        let renderer = Renderer::new(Some(100));
        let out = renderer.render_result(
            &result(
                &["类型", "URL"],
                vec![
                    vec![json!("注入攻击"), json!("/a")],
                    vec![json!("scan"), json!("/index.html")],
                ],
            ),
            &ColumnMapping::from_header(&["类型", "URL"]),
        );

        let widths: Vec<usize> = out
            .lines()
            .filter(|l| !l.starts_with('('))
            .map(display_width)
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{:?}\n{}", widths, out);
    }

    #[test]
    fn test_narrow_width_disables_wrapping() {
        assert_eq!(min_table_width(5), 36);

        let renderer = Renderer::new(Some(10));
        let row: Vec<Value> = (0..5).map(|i| json!(format!("value{}", i))).collect();
        let out = renderer.render_result(
            &result(&["_1", "_2", "_3", "_4", "_5"], vec![row]),
            &ColumnMapping::positional(5),
        );

        // Unwrapped: every value stays on one line.
        for i in 0..5 {
            assert!(out.contains(&format!("value{}", i)));
        }
    }

    #[test]
    fn test_render_columns() {
        let rows = vec![vec!["a".to_string(), "b".to_string()]];
        let table = DataTable::new(ColumnMapping::positional(2), rows, false);
        let out = Renderer::new(Some(80)).render_columns(&table);

        assert!(out.starts_with("Columns:\n$1, $2\n"));
        assert!(!out.contains("Query names"));
        assert!(out.contains("First row preview:"));

        let table = DataTable::new(ColumnMapping::from_header(&["Risk Level"]), vec![], true);
        let out = Renderer::new(Some(80)).render_columns(&table);
        assert_eq!(out, "Columns:\nRisk Level\nQuery names: Risk_Level");
    }

    #[test]
    fn test_write_csv_and_jsonl() {
        let mapping = ColumnMapping::positional(2);
        let res = result(&["_1", "_2"], vec![vec![json!("a,b"), json!(1)]]);
        let renderer = Renderer::default();

        let mut buf = Vec::new();
        write_result(&mut buf, &res, &mapping, OutputFormat::Csv, &renderer).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "$1,$2\n\"a,b\",1\n");

        let mut buf = Vec::new();
        write_result(&mut buf, &res, &mapping, OutputFormat::Jsonl, &renderer).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"$1\":\"a,b\",\"$2\":1}\n");
    }
}
