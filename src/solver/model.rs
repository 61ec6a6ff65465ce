//! Solver-neutral mixed-integer model.
//!
//! Maximisation only. Variables are either binary or continuous with
//! finite lower bounds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(j, a)| a * values[j]).sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(values);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + tolerance,
            Sense::GreaterEqual => lhs >= self.rhs - tolerance,
            Sense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MipModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Vec<(usize, f64)>,
    start: Option<Vec<f64>>,
}

impl MipModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        });
        self.variables.len() - 1
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        });
        self.variables.len() - 1
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, terms: Vec<(usize, f64)>, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }

    /// Linear objective to maximise
    pub fn set_objective(&mut self, terms: Vec<(usize, f64)>) {
        self.objective = terms;
    }

    /// Known feasible point handed to the solver as its first incumbent
    pub fn set_start(&mut self, values: Vec<f64>) {
        self.start = Some(values);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(usize, f64)] {
        &self.objective
    }

    pub fn start(&self) -> Option<&[f64]> {
        self.start.as_deref()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().map(|&(j, c)| c * values[j]).sum()
    }

    /// Copy with every binary variable relaxed to `[0, 1]`
    pub fn relaxed(&self) -> MipModel {
        let mut relaxed = self.clone();
        for v in &mut relaxed.variables {
            v.kind = VarKind::Continuous;
        }
        relaxed
    }

    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within_bounds = self.variables.iter().zip(values).all(|(v, &x)| {
            let integral = v.kind == VarKind::Continuous || (x - x.round()).abs() <= tolerance;
            integral && x >= v.lower - tolerance && x <= v.upper + tolerance
        });
        within_bounds && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feasibility_check() {
        let mut m = MipModel::new();
        let x = m.add_binary("x");
        let y = m.add_continuous("y", 0.0, 2.0);
        m.add_constraint("c", vec![(x, 1.0), (y, 1.0)], Sense::LessEqual, 2.5);
        m.set_objective(vec![(x, 3.0), (y, 1.0)]);

        assert!(m.is_feasible(&[1.0, 1.5], 1e-9));
        assert!(!m.is_feasible(&[0.5, 1.0], 1e-9));
        assert!(!m.is_feasible(&[1.0, 2.0], 1e-9));
        assert_eq!(m.objective_value(&[1.0, 1.5]), 4.5);
        assert!(m.relaxed().is_feasible(&[0.5, 1.0], 1e-9));
    }
}
