// Result Rendering
//
// Turns a result set into text for the terminal.

use crate::config::OutputFormat;
use crate::query::executor::result::{QueryResult, QueryResultSet};

/// Render `result` in the requested format
pub fn render(result: &QueryResultSet, format: OutputFormat) -> QueryResult<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Json => render_json(result),
    }
}

fn render_table(result: &QueryResultSet) -> String {
    if result.row_count() == 0 {
        return format!("{}\n", result.empty_message());
    }
    format!("{}({} rows)\n", result.to_string_table(), result.row_count())
}

// One object per line
fn render_json(result: &QueryResultSet) -> QueryResult<String> {
    let mut out = String::new();
    for row in result.rows() {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}
