//! Core graph container.
//!
//! Vertices are kept in ascending id order everywhere, so any iteration
//! over the graph is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{HoneypotError, Result};

/// Vertex identifier as it appears in the network source
pub type VertexId = u32;

/// Undirected simple graph (self-loops tolerated until cleanup)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    name: String,
    adjacency: BTreeMap<VertexId, BTreeSet<VertexId>>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adjacency: BTreeMap::new(),
        }
    }

    /// Network identity used in configuration keys and result tables
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_vertex(&mut self, v: VertexId) {
        self.adjacency.entry(v).or_default();
    }

    /// Add an undirected edge, creating missing endpoints. Parallel edges collapse.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) {
        self.adjacency.entry(u).or_default().insert(v);
        self.adjacency.entry(v).or_default().insert(u);
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        let loops = self.self_loop_vertices().len();
        let endpoints: usize = self.adjacency.values().map(BTreeSet::len).sum();
        (endpoints - loops) / 2 + loops
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.adjacency.contains_key(&v)
    }

    /// Vertex ids in ascending order
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices().collect()
    }

    pub fn neighbors(&self, v: VertexId) -> Result<&BTreeSet<VertexId>> {
        self.adjacency.get(&v).ok_or(HoneypotError::NotFound(v))
    }

    /// Number of distinct neighbours (a self-loop counts once)
    pub fn degree(&self, v: VertexId) -> Result<usize> {
        self.neighbors(v).map(BTreeSet::len)
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).max().unwrap_or(0)
    }

    pub fn average_degree(&self) -> f64 {
        if self.adjacency.is_empty() {
            return 0.0;
        }
        let total: usize = self.adjacency.values().map(BTreeSet::len).sum();
        total as f64 / self.adjacency.len() as f64
    }

    /// Edges as `(u, v)` with `u <= v`, sorted
    pub fn edges(&self) -> Vec<(VertexId, VertexId)> {
        self.adjacency
            .iter()
            .flat_map(|(&u, nbrs)| nbrs.range(u..).map(move |&v| (u, v)))
            .collect()
    }

    pub fn has_self_loops(&self) -> bool {
        self.adjacency.iter().any(|(v, nbrs)| nbrs.contains(v))
    }

    fn self_loop_vertices(&self) -> Vec<VertexId> {
        self.adjacency
            .iter()
            .filter(|(v, nbrs)| nbrs.contains(v))
            .map(|(&v, _)| v)
            .collect()
    }

    /// Drop every self-loop; returns how many were removed
    pub fn remove_self_loops(&mut self) -> usize {
        let loops = self.self_loop_vertices();
        for v in &loops {
            if let Some(nbrs) = self.adjacency.get_mut(v) {
                nbrs.remove(v);
            }
        }
        if !loops.is_empty() {
            log::debug!("Removed {} self-loops from {}", loops.len(), self.name);
        }
        loops.len()
    }

    /// Remove a vertex together with its incident edges
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<()> {
        let nbrs = self.adjacency.remove(&v).ok_or(HoneypotError::NotFound(v))?;
        for u in nbrs {
            if let Some(set) = self.adjacency.get_mut(&u) {
                set.remove(&v);
            }
        }
        Ok(())
    }

    /// Dense, index-addressed view used by the hot loops (simulation, BFS).
    /// Self-loops are dropped from the view.
    pub fn indexed(&self) -> IndexedGraph {
        let ids = self.vertex_ids();
        let neighbors = self
            .adjacency
            .iter()
            .map(|(&v, nbrs)| {
                nbrs.iter()
                    .filter(|&&u| u != v)
                    .filter_map(|u| ids.binary_search(u).ok())
                    .collect()
            })
            .collect();
        IndexedGraph { ids, neighbors }
    }
}

/// Graph snapshot with vertices renumbered `0..n` in ascending id order
#[derive(Debug, Clone)]
pub struct IndexedGraph {
    ids: Vec<VertexId>,
    neighbors: Vec<Vec<usize>>,
}

impl IndexedGraph {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    pub fn id(&self, index: usize) -> VertexId {
        self.ids[index]
    }

    pub fn index_of(&self, v: VertexId) -> Option<usize> {
        self.ids.binary_search(&v).ok()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors[index].len()
    }
}
