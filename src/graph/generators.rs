//! Parametric graph families.

use super::types::{Graph, VertexId};
use crate::error::{HoneypotError, Result};

/// Complete graph on vertices `0..n`
pub fn complete(n: u32) -> Graph {
    let mut g = Graph::new(format!("complete_{}", n));
    for u in 0..n {
        g.add_vertex(u);
        for v in (u + 1)..n {
            g.add_edge(u, v);
        }
    }
    g
}

/// Circulant graph on `0..n`: vertex `i` is joined to `i ± s (mod n)` for every offset `s`
pub fn circulant(n: u32, offsets: &[u32]) -> Result<Graph> {
    if n == 0 {
        return Err(HoneypotError::Configuration(
            "circulant graph needs at least one vertex".to_string(),
        ));
    }
    if let Some(bad) = offsets.iter().find(|&&s| s % n == 0) {
        return Err(HoneypotError::Configuration(format!(
            "circulant offset {} is a multiple of {} and would create self-loops",
            bad, n
        )));
    }

    let label = offsets
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("_");
    let mut g = Graph::new(format!("circulant_{}_{}", n, label));
    for i in 0..n {
        g.add_vertex(i);
        for &s in offsets {
            let j: VertexId = (i + s % n) % n;
            g.add_edge(i, j);
        }
    }
    Ok(g)
}
