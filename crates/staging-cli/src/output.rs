use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Report tables
// ---------------------------------------------------------------------------

/// Column-aligned text table. The last column is left unpadded so long
/// reasons do not drag trailing whitespace along.
pub struct Table<'a> {
    headers: &'a [&'a str],
    rows: Vec<Vec<String>>,
}

impl<'a> Table<'a> {
    pub fn new(headers: &'a [&'a str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        let mut out = render_line(self.headers, &widths);
        out.push_str(&render_line(&sep, &widths));
        for row in &self.rows {
            out.push_str(&render_line(row, &widths));
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn render_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell.as_ref()))
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

// ---------------------------------------------------------------------------
// GitHub Actions workflow commands
// ---------------------------------------------------------------------------

pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Emit `::<kind>::<message>` for the runner to turn into an annotation.
/// Written to stderr, which the runner also scans, so stdout stays clean
/// for `--json` consumers.
pub fn workflow_command(kind: &str, message: &str) {
    eprintln!("{}", format_workflow_command(kind, message));
}

fn format_workflow_command(kind: &str, message: &str) -> String {
    let data = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{kind}::{data}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_workflow_command_data() {
        assert_eq!(
            format_workflow_command("warning", "50% done\nnext"),
            "::warning::50%25 done%0Anext"
        );
        assert_eq!(format_workflow_command("error", "plain"), "::error::plain");
    }

    #[test]
    fn table_aligns_columns_and_trims_last() {
        let mut table = Table::new(&["STAGING", "RESULT", "DETAIL"]);
        table.row(vec!["staging-a".into(), "kept".into(), "busy".into()]);
        table.row(vec!["b".into(), "suspended".into(), String::new()]);
        assert_eq!(
            table.render(),
            "STAGING    RESULT     DETAIL\n\
             ---------  ---------  ------\n\
             staging-a  kept       busy\n\
             b          suspended\n"
        );
    }
}
