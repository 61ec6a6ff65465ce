//! Edge-list network loader.
//!
//! One edge per line, two non-negative integer ids separated by whitespace,
//! commas, semicolons or tabs. A line holding a single id declares an
//! isolated vertex. Blank lines and lines starting with `#` or `%` are skipped.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{Graph, VertexId};
use crate::error::{HoneypotError, Result};

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;]+").expect("Invalid separator regex"));

fn parse_id(token: &str, source_name: &str, line: usize) -> Result<VertexId> {
    token.parse::<VertexId>().map_err(|_| HoneypotError::Format {
        source_name: source_name.to_string(),
        line,
        reason: format!("'{}' is not a vertex id", token),
    })
}

/// Parse edge-list text into a graph named `name`
pub fn parse_edge_list(name: &str, content: &str) -> Result<Graph> {
    let mut graph = Graph::new(name);

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }

        let tokens: Vec<&str> = SEPARATOR.split(line).filter(|t| !t.is_empty()).collect();
        match tokens.as_slice() {
            [v] => graph.add_vertex(parse_id(v, name, line_no)?),
            [u, v] => {
                let u = parse_id(u, name, line_no)?;
                let v = parse_id(v, name, line_no)?;
                graph.add_edge(u, v);
            }
            _ => {
                return Err(HoneypotError::Format {
                    source_name: name.to_string(),
                    line: line_no,
                    reason: format!("expected two vertex ids, found {} fields", tokens.len()),
                })
            }
        }
    }

    log::debug!(
        "Parsed network {}: {} vertices, {} edges",
        name,
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Load an edge-list file; the graph is named after the file stem
pub fn load_edge_list(path: &Path) -> Result<Graph> {
    log::info!("Loading network from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| HoneypotError::io(path, e))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_edge_list(&name, &content)
}
