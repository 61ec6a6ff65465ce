//! Connectivity and distance analytics.
//!
//! Components are labelled by breadth-first search started from vertices in
//! ascending id order, so component `0` always holds the smallest id.
//! All-pairs distance statistics run one BFS per source on the rayon pool.

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::{Graph, IndexedGraph, VertexId};
use crate::error::{HoneypotError, Result};

/// Aggregate shortest-path statistics over reachable ordered pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceStatistics {
    /// `None` when no pair of distinct vertices is reachable
    pub average: Option<f64>,
    pub maximum: usize,
    pub reachable_pairs: u64,
    /// False means the values above only describe reachable pairs
    pub connected: bool,
}

impl DistanceStatistics {
    /// Reject statistics computed on a disconnected graph
    pub fn require_connected(self) -> Result<Self> {
        if self.connected {
            Ok(self)
        } else {
            Err(HoneypotError::Input(
                "distances are undefined on a disconnected graph; reduce it to its largest component first"
                    .to_string(),
            ))
        }
    }
}

/// One-line description of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub network: String,
    pub vertices: usize,
    pub edges: usize,
    pub average_degree: f64,
    pub max_degree: usize,
    pub distances: DistanceStatistics,
}

fn bfs_levels(graph: &IndexedGraph, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.len()];
    let mut queue = VecDeque::new();
    dist[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        let next = dist[v].map_or(0, |d| d + 1);
        for &u in graph.neighbors(v) {
            if dist[u].is_none() {
                dist[u] = Some(next);
                queue.push_back(u);
            }
        }
    }
    dist
}

impl Graph {
    /// Connected components, each sorted ascending, in order of their smallest vertex
    pub fn connected_components(&self) -> Vec<Vec<VertexId>> {
        let indexed = self.indexed();
        let mut label: Vec<Option<usize>> = vec![None; indexed.len()];
        let mut components: Vec<Vec<VertexId>> = Vec::new();

        for start in 0..indexed.len() {
            if label[start].is_some() {
                continue;
            }
            let id = components.len();
            let mut members = Vec::new();
            let mut queue = VecDeque::from([start]);
            label[start] = Some(id);

            while let Some(v) = queue.pop_front() {
                members.push(indexed.id(v));
                for &u in indexed.neighbors(v) {
                    if label[u].is_none() {
                        label[u] = Some(id);
                        queue.push_back(u);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }

        components
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Vertices of the most populous component. Ties go to the component
    /// holding the smallest vertex id.
    pub fn largest_connected_component(&self) -> Vec<VertexId> {
        let mut best: Vec<VertexId> = Vec::new();
        for component in self.connected_components() {
            if component.len() > best.len() {
                best = component;
            }
        }
        best
    }

    /// Discard every vertex outside the largest component; returns how many were removed
    pub fn retain_largest_component(&mut self) -> usize {
        let keep = self.largest_connected_component();
        let doomed: Vec<VertexId> = self
            .vertices()
            .filter(|v| keep.binary_search(v).is_err())
            .collect();

        for &v in &doomed {
            // every id comes from the vertex set itself
            let _ = self.remove_vertex(v);
        }
        if !doomed.is_empty() {
            log::info!(
                "Reduced {} to its largest component: removed {} of {} vertices",
                self.name(),
                doomed.len(),
                doomed.len() + self.vertex_count()
            );
        }
        doomed.len()
    }

    /// Hop counts from `source` to every reachable vertex
    pub fn shortest_path_lengths(&self, source: VertexId) -> Result<BTreeMap<VertexId, usize>> {
        let indexed = self.indexed();
        let start = indexed.index_of(source).ok_or(HoneypotError::NotFound(source))?;
        Ok(bfs_levels(&indexed, start)
            .into_iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (indexed.id(i), d)))
            .collect())
    }

    /// Hop distance between two vertices, `None` when they are disconnected
    pub fn distance(&self, u: VertexId, v: VertexId) -> Result<Option<usize>> {
        if !self.contains(v) {
            return Err(HoneypotError::NotFound(v));
        }
        Ok(self.shortest_path_lengths(u)?.get(&v).copied())
    }

    pub fn distance_statistics(&self) -> DistanceStatistics {
        let indexed = self.indexed();
        let n = indexed.len();

        let (sum, maximum, pairs) = (0..n)
            .into_par_iter()
            .map(|s| {
                let mut sum = 0u64;
                let mut max = 0usize;
                let mut pairs = 0u64;
                for d in bfs_levels(&indexed, s).into_iter().flatten() {
                    if d > 0 {
                        sum += d as u64;
                        max = max.max(d);
                        pairs += 1;
                    }
                }
                (sum, max, pairs)
            })
            .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1.max(b.1), a.2 + b.2));

        let expected = (n as u64) * (n as u64).saturating_sub(1);
        DistanceStatistics {
            average: (pairs > 0).then(|| sum as f64 / pairs as f64),
            maximum,
            reachable_pairs: pairs,
            connected: pairs == expected,
        }
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            network: self.name().to_string(),
            vertices: self.vertex_count(),
            edges: self.edge_count(),
            average_degree: self.average_degree(),
            max_degree: self.max_degree(),
            distances: self.distance_statistics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: u32) -> Graph {
        let mut g = Graph::new("path");
        for v in 1..n {
            g.add_edge(v - 1, v);
        }
        g
    }

    #[test]
    fn test_components_ordered_by_smallest_id() {
        let mut g = Graph::new("g");
        g.add_edge(5, 6);
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        g.add_vertex(0);

        let comps = g.connected_components();
        assert_eq!(comps, vec![vec![0], vec![1, 2, 3], vec![5, 6]]);
        assert_eq!(g.largest_connected_component(), vec![1, 2, 3]);
    }

    #[test]
    fn test_largest_component_tie_keeps_smallest_id() {
        let mut g = Graph::new("g");
        g.add_edge(7, 8);
        g.add_edge(2, 3);
        assert_eq!(g.largest_connected_component(), vec![2, 3]);
    }

    #[test]
    fn test_retain_largest_component_drops_isolated_vertex() {
        let mut g = path(4);
        g.add_vertex(99);
        assert!(!g.is_connected());

        assert_eq!(g.retain_largest_component(), 1);
        assert!(!g.contains(99));
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 3);
        assert!(g.is_connected());
    }

    #[test]
    fn test_distances_on_path() {
        let g = path(4);
        assert_eq!(g.distance(0, 3).unwrap(), Some(3));
        let stats = g.distance_statistics();
        // ordered pairs: 6 at distance 1, 4 at 2, 2 at 3
        assert_eq!(stats.reachable_pairs, 12);
        assert_eq!(stats.maximum, 3);
        assert!((stats.average.unwrap() - 20.0 / 12.0).abs() < 1e-12);
        assert!(stats.connected);
    }

    #[test]
    fn test_disconnected_distances_are_flagged() {
        let mut g = path(3);
        g.add_edge(10, 11);

        let stats = g.distance_statistics();
        assert!(!stats.connected);
        assert_eq!(g.distance(0, 10).unwrap(), None);
        assert!(matches!(stats.require_connected(), Err(HoneypotError::Input(_))));
    }

    #[test]
    fn test_single_vertex_has_no_average_distance() {
        let mut g = Graph::new("g");
        g.add_vertex(1);
        let stats = g.distance_statistics();
        assert_eq!(stats.average, None);
        assert!(stats.connected);
    }

    #[test]
    fn test_unknown_source_is_not_found() {
        let g = path(3);
        assert!(matches!(g.shortest_path_lengths(42), Err(HoneypotError::NotFound(42))));
        assert!(matches!(g.distance(0, 42), Err(HoneypotError::NotFound(42))));
    }
}
