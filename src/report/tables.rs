//! Tables for results that are not keyed by a full configuration.

use super::{utc_now, ResultTable};
use crate::graph::NetworkSummary;
use crate::simulation::CalibrationReport;

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ResultTable for NetworkSummary {
    fn header(&self) -> Vec<String> {
        [
            "network",
            "vertices",
            "edges",
            "average_degree",
            "max_degree",
            "average_distance",
            "max_distance",
            "connected",
            "utc",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.network.clone(),
            self.vertices.to_string(),
            self.edges.to_string(),
            self.average_degree.to_string(),
            self.max_degree.to_string(),
            optional(self.distances.average),
            self.distances.maximum.to_string(),
            self.distances.connected.to_string(),
            utc_now(),
        ]]
    }
}

impl ResultTable for CalibrationReport {
    fn header(&self) -> Vec<String> {
        [
            "network",
            "model",
            "transmissibility",
            "target_fraction",
            "repetitions",
            "time_steps",
            "success_rate",
            "success_lower_bound",
            "mean_time_to_target",
            "selected",
            "utc",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let utc = utc_now();
        self.points
            .iter()
            .map(|p| {
                vec![
                    self.network.clone(),
                    self.model.to_string(),
                    self.transmissibility.to_string(),
                    self.target_fraction.to_string(),
                    self.repetitions.to_string(),
                    p.time_steps.to_string(),
                    p.success_rate.to_string(),
                    p.success_lower_bound.to_string(),
                    optional(p.mean_time_to_target),
                    (self.selected == Some(p.time_steps)).to_string(),
                    utc.clone(),
                ]
            })
            .collect()
    }
}
