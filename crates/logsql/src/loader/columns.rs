//! Column naming: what the user sees versus what SQL refers to.

use std::collections::HashSet;

/// Words SQLite's parser reserves. A header spelled like one of these gets a
/// trailing `_` in its query name.
const SQL_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// One column of the loaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Name shown to the user: header text, or `$N` for headerless input.
    pub display: String,
    /// Name of the column in the SQL table: a plain identifier.
    pub name: String,
}

/// Ordered bijection between display names and query names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<Column>,
}

impl ColumnMapping {
    /// Builds the mapping for a file whose first record is a header.
    ///
    /// Repeated header text gets a numeric suffix (`URL`, `URL_2`). Query
    /// names are sanitized and kept unique ignoring ASCII case, since SQLite
    /// resolves column names that way.
    pub fn from_header<S: AsRef<str>>(fields: &[S]) -> Self {
        let displays = dedupe(fields.iter().map(|f| f.as_ref().to_string()), |s| s.to_string());
        let names = dedupe(
            displays.iter().map(|d| sanitize_identifier(d)),
            |s| s.to_ascii_lowercase(),
        );

        Self {
            columns: displays
                .into_iter()
                .zip(names)
                .map(|(display, name)| Column { display, name })
                .collect(),
        }
    }

    /// Builds `$1..$N` / `_1.._N` for headerless input.
    pub fn positional(count: usize) -> Self {
        Self {
            columns: (1..=count)
                .map(|i| Column {
                    display: format!("${}", i),
                    name: format!("_{}", i),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn display_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.display.as_str()).collect()
    }

    pub fn query_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Query name of the 1-based column `position`.
    pub fn query_name_at(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .map(|c| c.name.as_str())
    }

    /// Display name for a result label, if the label is a column's query name.
    ///
    /// SQLite labels a bare column reference with the declared name whatever
    /// case the query used, so only exact matches are relabeled. An alias
    /// such as `AS url` is left as written.
    pub fn display_for(&self, label: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == label)
            .map(|c| c.display.as_str())
    }

    /// Maps result labels to what the user should see.
    pub fn display_labels(&self, labels: &[String]) -> Vec<String> {
        labels
            .iter()
            .map(|l| self.display_for(l).unwrap_or(l).to_string())
            .collect()
    }

    /// True when at least one column must be queried under a different name
    /// than the one displayed.
    pub fn has_renamed_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.display != c.name && !c.display.starts_with('$'))
    }
}

/// Turns arbitrary header text into an identifier SQLite accepts unquoted.
///
/// Letters (including non-ASCII), digits and `_` are kept; everything else
/// becomes `_`. SQL keywords get a trailing `_` (`order` → `order_`).
pub fn sanitize_identifier(text: &str) -> String {
    let mut name: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() {
        name.push_str("col");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    } else if is_keyword(&name) {
        name.push('_');
    }
    name
}

fn is_keyword(name: &str) -> bool {
    SQL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

fn dedupe<I, K>(names: I, key: K) -> Vec<String>
where
    I: IntoIterator<Item = String>,
    K: Fn(&str) -> String,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for name in names {
        let mut candidate = name.clone();
        let mut suffix = 2;
        while seen.contains(&key(&candidate)) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        seen.insert(key(&candidate));
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_verbatim() {
        let mapping = ColumnMapping::from_header(&["时间", "类型", "风险级别", "URL"]);
        assert_eq!(mapping.display_names(), vec!["时间", "类型", "风险级别", "URL"]);
        assert_eq!(mapping.query_names(), vec!["时间", "类型", "风险级别", "URL"]);
        assert!(!mapping.has_renamed_columns());
    }

    #[test]
    fn test_duplicate_headers() {
        let mapping = ColumnMapping::from_header(&["URL", "Host", "URL", "URL"]);
        assert_eq!(mapping.display_names(), vec!["URL", "Host", "URL_2", "URL_3"]);
        assert_eq!(mapping.query_names(), vec!["URL", "Host", "URL_2", "URL_3"]);
    }

    #[test]
    fn test_sanitized_names_stay_unique() {
        let mapping = ColumnMapping::from_header(&["Risk Level", "Risk-Level", "risk_level", "2xx"]);
        assert_eq!(
            mapping.display_names(),
            vec!["Risk Level", "Risk-Level", "risk_level", "2xx"]
        );
        assert_eq!(
            mapping.query_names(),
            vec!["Risk_Level", "Risk_Level_2", "risk_level_3", "_2xx"]
        );
        assert!(mapping.has_renamed_columns());
    }

    #[test]
    fn test_positional() {
        let mapping = ColumnMapping::positional(3);
        assert_eq!(mapping.display_names(), vec!["$1", "$2", "$3"]);
        assert_eq!(mapping.query_names(), vec!["_1", "_2", "_3"]);
        assert_eq!(mapping.query_name_at(2), Some("_2"));
        assert_eq!(mapping.query_name_at(0), None);
        assert_eq!(mapping.query_name_at(4), None);
        assert!(!mapping.has_renamed_columns());
    }

    #[test]
    fn test_display_labels() {
        let mapping = ColumnMapping::positional(2);
        let labels = vec!["_2".to_string(), "COUNT(*)".to_string()];
        assert_eq!(mapping.display_labels(&labels), vec!["$2", "COUNT(*)"]);

        let mapping = ColumnMapping::from_header(&["Host Name", "URL"]);
        assert_eq!(mapping.display_for("Host_Name"), Some("Host Name"));
        assert_eq!(mapping.display_for("host_name"), None);
        let labels = vec!["url".to_string(), "URL".to_string()];
        assert_eq!(mapping.display_labels(&labels), vec!["url", "URL"]);
    }

    #[test]
    fn test_keyword_headers() {
        let mapping = ColumnMapping::from_header(&["order", "Group", "URL", "order_"]);
        assert_eq!(mapping.display_names(), vec!["order", "Group", "URL", "order_"]);
        assert_eq!(mapping.query_names(), vec!["order_", "Group_", "URL", "order__2"]);
        assert!(mapping.has_renamed_columns());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("风险级别"), "风险级别");
        assert_eq!(sanitize_identifier("user.agent"), "user_agent");
        assert_eq!(sanitize_identifier("404"), "_404");
        assert_eq!(sanitize_identifier("select"), "select_");
        assert_eq!(sanitize_identifier("selection"), "selection");
        assert_eq!(sanitize_identifier(""), "col");
    }
}
