//! Scenario coverage matrix shared by every optimizer.

use std::collections::HashMap;

use crate::error::{HoneypotError, Result};
use crate::graph::VertexId;
use crate::simulation::ScenarioSet;

/// Scenarios by vertices, stored sparsely both ways.
///
/// `rows[i]` lists the vertex indices that detect scenario `i`;
/// `columns[v]` lists the scenarios vertex index `v` detects.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMatrix {
    vertex_ids: Vec<VertexId>,
    rows: Vec<Vec<usize>>,
    columns: Vec<Vec<usize>>,
    weights: Vec<f64>,
}

impl CoverageMatrix {
    /// Build from the virtual-detection rows of a scenario set, weighting
    /// every scenario `1 / R`
    pub fn from_scenarios(set: &ScenarioSet) -> Result<Self> {
        if set.is_empty() {
            return Err(HoneypotError::InsufficientData(format!(
                "scenario set {} has no rows",
                set.key()
            )));
        }
        let rows = set
            .detections()
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(v, &d)| d.then_some(v))
                    .collect()
            })
            .collect();
        Self::from_rows(set.vertex_ids().to_vec(), rows)
    }

    /// Build from explicit detector lists with uniform weights
    pub fn from_rows(vertex_ids: Vec<VertexId>, rows: Vec<Vec<usize>>) -> Result<Self> {
        let n = vertex_ids.len();
        let mut columns = vec![Vec::new(); n];
        for (i, row) in rows.iter().enumerate() {
            for &v in row {
                if v >= n {
                    return Err(HoneypotError::Configuration(format!(
                        "scenario {} names vertex index {} but only {} vertices exist",
                        i, v, n
                    )));
                }
                columns[v].push(i);
            }
        }
        for column in &mut columns {
            column.dedup();
        }
        let weight = if rows.is_empty() { 0.0 } else { 1.0 / rows.len() as f64 };
        let weights = vec![weight; rows.len()];
        Ok(Self {
            vertex_ids,
            rows,
            columns,
            weights,
        })
    }

    /// Replace the uniform scenario weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != self.rows.len() {
            return Err(HoneypotError::Configuration(format!(
                "{} weights supplied for {} scenarios",
                weights.len(),
                self.rows.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(HoneypotError::Configuration(
                "scenario weights must be finite and non-negative".to_string(),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.len()
    }

    pub fn scenario_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn columns(&self) -> &[Vec<usize>] {
        &self.columns
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Covered flag per scenario for a selection of vertex indices
    pub fn covered_rows(&self, selection: &[usize]) -> Vec<bool> {
        let mut covered = vec![false; self.rows.len()];
        for &v in selection {
            for &i in &self.columns[v] {
                covered[i] = true;
            }
        }
        covered
    }

    /// Weighted coverage of a selection of vertex indices
    pub fn coverage_of_indices(&self, selection: &[usize]) -> f64 {
        self.covered_rows(selection)
            .iter()
            .zip(&self.weights)
            .filter(|(&c, _)| c)
            .map(|(_, w)| w)
            .sum()
    }

    /// Map vertex ids to column indices
    pub fn indices_of(&self, honeypots: &[VertexId]) -> Result<Vec<usize>> {
        let lookup: HashMap<VertexId, usize> = self
            .vertex_ids
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        honeypots
            .iter()
            .map(|v| lookup.get(v).copied().ok_or(HoneypotError::NotFound(*v)))
            .collect()
    }

    /// Weighted coverage of a selection of vertex ids
    pub fn coverage(&self, honeypots: &[VertexId]) -> Result<f64> {
        Ok(self.coverage_of_indices(&self.indices_of(honeypots)?))
    }

    /// Upper bound on the best `k`-subset value: the selection's value plus
    /// the `k` largest marginal gains among unselected vertices.
    pub fn posterior_bound(&self, selection: &[usize], k: usize) -> f64 {
        let covered = self.covered_rows(selection);
        let objective: f64 = covered
            .iter()
            .zip(&self.weights)
            .filter(|(&c, _)| c)
            .map(|(_, w)| w)
            .sum();
        let mut selected = vec![false; self.vertex_count()];
        for &v in selection {
            selected[v] = true;
        }
        let mut gains: Vec<f64> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(v, _)| !selected[*v])
            .map(|(_, column)| {
                column
                    .iter()
                    .filter(|&&i| !covered[i])
                    .map(|&i| self.weights[i])
                    .sum()
            })
            .collect();
        gains.sort_by(|a, b| b.total_cmp(a));
        let bound = objective + gains.iter().take(k).sum::<f64>();
        bound.min(self.total_weight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn matrix() -> CoverageMatrix {
        // 4 scenarios over vertices 10, 20, 30
        CoverageMatrix::from_rows(
            vec![10, 20, 30],
            vec![vec![0], vec![0, 1], vec![2], vec![]],
        )
        .unwrap()
    }

    #[test]
    fn test_coverage_by_id_and_index() {
        let m = matrix();
        assert_eq!(m.columns()[0], vec![0, 1]);
        assert_abs_diff_eq!(m.coverage_of_indices(&[0]), 0.5);
        assert_abs_diff_eq!(m.coverage(&[10, 30]).unwrap(), 0.75);
        assert!(matches!(m.coverage(&[99]), Err(HoneypotError::NotFound(99))));
    }

    #[test]
    fn test_posterior_bound() {
        let m = matrix();
        // nothing selected: best single gain is 0.5
        assert_abs_diff_eq!(m.posterior_bound(&[], 1), 0.5);
        // after vertex 0, remaining gains are 0.0 and 0.25
        assert_abs_diff_eq!(m.posterior_bound(&[0], 1), 0.75);
        assert_abs_diff_eq!(m.posterior_bound(&[], 3), 0.75);
    }

    #[test]
    fn test_weights_are_validated() {
        assert!(matrix().with_weights(vec![0.1; 3]).is_err());
        assert!(matrix().with_weights(vec![-1.0, 0.0, 0.0, 0.0]).is_err());
        let m = matrix().with_weights(vec![0.4, 0.3, 0.2, 0.1]).unwrap();
        assert_abs_diff_eq!(m.coverage_of_indices(&[2]), 0.2);
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(CoverageMatrix::from_rows(vec![0], vec![vec![1]]).is_err());
    }
}
