//! Result tables and experiment summaries.
//!
//! Every tabular result implements [`ResultTable`] and is written with the
//! same `write_results(path, append)` contract: a header naming the columns,
//! then one line per row, either into a fresh file or appended to an
//! existing one.

pub mod results;
pub mod tables;
pub mod summary;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{HoneypotError, Result};

pub use results::{FailureRecord, ResultMap, ResultRecord};
pub use summary::{print_summary, write_json_summary};

/// Quote a CSV field when it contains a separator, a quote or a newline
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    let mut line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Current UTC time for the timestamp column
pub fn utc_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub trait ResultTable {
    fn header(&self) -> Vec<String>;

    fn rows(&self) -> Vec<Vec<String>>;

    /// Write the table as CSV. With `append`, rows go to the end of an
    /// existing file and the header is only written if the file is new or
    /// empty.
    fn write_results(&self, path: &Path, append: bool) -> Result<()> {
        let needs_header = !append || fs::metadata(path).map_or(true, |m| m.len() == 0);

        let mut content = String::new();
        if needs_header {
            content.push_str(&csv_line(&self.header()));
        }
        for row in self.rows() {
            content.push_str(&csv_line(&row));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| HoneypotError::io(path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| HoneypotError::io(path, e))?;

        log::debug!("Wrote {} rows to {}", self.rows().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixed(Vec<Vec<String>>);

    impl ResultTable for Fixed {
        fn header(&self) -> Vec<String> {
            vec!["a".to_string(), "b".to_string()]
        }

        fn rows(&self) -> Vec<Vec<String>> {
            self.0.clone()
        }
    }

    fn row(a: &str, b: &str) -> Vec<String> {
        vec![a.to_string(), b.to_string()]
    }

    #[test]
    fn test_fresh_then_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");

        Fixed(vec![row("1", "x")]).write_results(&path, true).unwrap();
        Fixed(vec![row("2", "y,z")]).write_results(&path, true).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a,b\n1,x\n2,\"y,z\"\n");

        Fixed(vec![row("3", "w")]).write_results(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n3,w\n");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_unwritable_path_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        let err = Fixed(vec![]).write_results(&path, false).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
