//! Output formatting for the shell and one-shot queries.

pub mod output;

pub use output::{format_value, row_count_footer, write_result, OutputFormat, Renderer, DEFAULT_WIDTH};
