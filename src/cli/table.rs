//! Table formatting for command results
//!
//! Terminal and Markdown output go through `tabled`; TSV and CSV stay
//! single-line per row for piping.

use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::escape_csv;
use crate::cli::OutputFormat;

/// Rows of pre-formatted cells under a header
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render for a tabular format; YAML and JSON fall back to the terminal style
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Tsv => self.delimited("\t", |s| s.replace('\t', " ")),
            OutputFormat::Csv => self.delimited(",", escape_csv),
            OutputFormat::Md => {
                let mut out = self.builder().build().with(Style::markdown()).to_string();
                out.push('\n');
                out
            }
            _ => {
                let mut out = self.builder().build().with(Style::rounded()).to_string();
                out.push('\n');
                out
            }
        }
    }

    fn builder(&self) -> Builder {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder
    }

    fn delimited(&self, sep: &str, escape: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            let cells: Vec<String> = line.iter().map(|c| escape(c)).collect();
            out.push_str(&cells.join(sep));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(["Path", "Notes"]);
        table.push_row(["/Sat/A", "primary, cold"]);
        table.push_row(["/Sat/B", "-"]);
        table
    }

    #[test]
    fn test_tsv() {
        let out = sample().render(OutputFormat::Tsv);
        assert_eq!(out, "Path\tNotes\n/Sat/A\tprimary, cold\n/Sat/B\t-\n");
    }

    #[test]
    fn test_csv_escapes() {
        let out = sample().render(OutputFormat::Csv);
        assert!(out.contains("/Sat/A,\"primary, cold\""));
    }

    #[test]
    fn test_markdown_and_terminal() {
        let table = sample();
        assert_eq!(table.len(), 2);
        let md = table.render(OutputFormat::Md);
        assert!(md.contains("| Path"));
        assert!(md.contains("/Sat/B"));
        let term = table.render(OutputFormat::Auto);
        assert!(term.contains("/Sat/A"));
    }
}
