//! k-core decomposition by degeneracy peeling.
//!
//! Vertices are held in buckets keyed by their true current degree. Each
//! step removes the smallest id from the lowest non-empty bucket and moves
//! every remaining neighbour one bucket down. A vertex's core number is the
//! largest removal degree seen up to its own removal. Since a removal lowers
//! degrees by one, the scan pointer steps back at most one bucket per
//! removal.

use std::collections::BTreeMap;

use super::types::{Graph, VertexId};
use crate::error::{HoneypotError, Result};

/// Result of peeling a graph down to nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreDecomposition {
    /// Vertices in the order they were removed
    pub order: Vec<VertexId>,
    pub core_numbers: BTreeMap<VertexId, usize>,
}

impl CoreDecomposition {
    /// Largest core number in the graph
    pub fn degeneracy(&self) -> usize {
        self.core_numbers.values().copied().max().unwrap_or(0)
    }

    /// Members of the k-core, ascending
    pub fn k_core(&self, k: usize) -> Vec<VertexId> {
        self.core_numbers
            .iter()
            .filter(|(_, &c)| c >= k)
            .map(|(&v, _)| v)
            .collect()
    }
}

/// Vertex indices grouped by current degree, smallest index drawn first.
///
/// Entries go stale when their vertex moves down or is removed and are
/// skipped on the way out. A bucket is re-sorted only if vertices arrived
/// since it was last drawn from.
struct DegreeBuckets {
    /// Descending, so the smallest index pops last
    entries: Vec<Vec<usize>>,
    unsorted: Vec<bool>,
}

impl DegreeBuckets {
    fn new(degree: &[usize], max_degree: usize) -> Self {
        let mut entries = vec![Vec::new(); max_degree + 1];
        for (i, &d) in degree.iter().enumerate().rev() {
            entries[d].push(i);
        }
        Self {
            entries,
            unsorted: vec![false; max_degree + 1],
        }
    }

    fn push(&mut self, d: usize, v: usize) {
        self.entries[d].push(v);
        self.unsorted[d] = true;
    }

    /// Smallest live vertex of degree `d`
    fn pop_min(&mut self, d: usize, degree: &[usize], removed: &[bool]) -> Option<usize> {
        let live = |v: &usize| !removed[*v] && degree[*v] == d;
        if self.unsorted[d] {
            let bucket = &mut self.entries[d];
            bucket.retain(live);
            bucket.sort_unstable_by(|a, b| b.cmp(a));
            self.unsorted[d] = false;
        }
        while let Some(v) = self.entries[d].pop() {
            if live(&v) {
                return Some(v);
            }
        }
        None
    }
}

impl Graph {
    pub fn core_decomposition(&self) -> Result<CoreDecomposition> {
        if self.has_self_loops() {
            return Err(HoneypotError::Configuration(format!(
                "k-core decomposition of {} requires self-loops to be removed first",
                self.name()
            )));
        }

        let indexed = self.indexed();
        let n = indexed.len();
        let mut degree: Vec<usize> = (0..n).map(|i| indexed.degree(i)).collect();
        let max_degree = degree.iter().copied().max().unwrap_or(0);

        let mut buckets = DegreeBuckets::new(&degree, max_degree);
        let mut removed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut core_numbers = BTreeMap::new();
        let mut current = 0usize;
        let mut core = 0usize;

        while order.len() < n && current <= max_degree {
            let Some(v) = buckets.pop_min(current, &degree, &removed) else {
                current += 1;
                continue;
            };
            core = core.max(current);
            removed[v] = true;
            order.push(indexed.id(v));
            core_numbers.insert(indexed.id(v), core);

            for &u in indexed.neighbors(v) {
                if !removed[u] {
                    degree[u] -= 1;
                    buckets.push(degree[u], u);
                }
            }
            current = current.saturating_sub(1);
        }

        Ok(CoreDecomposition {
            order,
            core_numbers,
        })
    }

    /// Core number of every vertex
    pub fn core_numbers(&self) -> Result<BTreeMap<VertexId, usize>> {
        Ok(self.core_decomposition()?.core_numbers)
    }

    /// Peeling order (minimum current degree first, ties by ascending id)
    pub fn degeneracy_ordering(&self) -> Result<Vec<VertexId>> {
        Ok(self.core_decomposition()?.order)
    }

    pub fn core_number(&self, v: VertexId) -> Result<usize> {
        self.core_numbers()?
            .get(&v)
            .copied()
            .ok_or(HoneypotError::NotFound(v))
    }
}
