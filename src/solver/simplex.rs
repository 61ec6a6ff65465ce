//! Bounded-variable primal simplex for LP relaxations.
//!
//! Variables are shifted to their lower bounds. Finite upper bounds are
//! handled in the ratio test rather than as rows, so a nonbasic column sits
//! at either of its bounds and a bounded model can never look unbounded.
//! The tableau is dense and is rebuilt from the original columns at regular
//! intervals to shed accumulated rounding error.
//!
//! Pricing is Dantzig's rule; a long run of degenerate pivots switches to
//! Bland's rule until the objective moves again. The ratio test is Harris's
//! two-pass variant, preferring large pivot elements among near-ties.

use std::time::Instant;

use super::model::{MipModel, Sense};
use crate::error::{HoneypotError, Result};

const EPS: f64 = 1e-9;
const PIVOT_TOLERANCE: f64 = 1e-9;
const HARRIS_TOLERANCE: f64 = 1e-9;
const PHASE_ONE_TOLERANCE: f64 = 1e-7;
const SINGULAR_TOLERANCE: f64 = 1e-11;
const MIN_REFACTOR_INTERVAL: usize = 100;
const DEGENERATE_STREAK: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal { objective: f64, values: Vec<f64> },
    Infeasible,
    Unbounded,
    /// The solve was abandoned before reaching an answer
    Stopped(LpStop),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStop {
    TimeLimit,
    IterationLimit,
    /// The basis became numerically singular
    Numerical,
}

struct Row {
    coeffs: Vec<f64>,
    sense: Sense,
    rhs: f64,
}

enum Pivoting {
    Optimal,
    Unbounded,
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting
fn invert(mut m: Vec<Vec<f64>>, deadline: Option<Instant>) -> std::result::Result<Vec<Vec<f64>>, LpStop> {
    let n = m.len();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            row
        })
        .collect();

    for c in 0..n {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(LpStop::TimeLimit);
        }
        let p = (c..n)
            .max_by(|&a, &b| m[a][c].abs().total_cmp(&m[b][c].abs()))
            .ok_or(LpStop::Numerical)?;
        if m[p][c].abs() < SINGULAR_TOLERANCE {
            return Err(LpStop::Numerical);
        }
        m.swap(c, p);
        inv.swap(c, p);

        let pv = m[c][c];
        for k in 0..n {
            m[c][k] /= pv;
            inv[c][k] /= pv;
        }
        let pivot_row = m[c].clone();
        let pivot_inv = inv[c].clone();
        for r in 0..n {
            let f = m[r][c];
            if r == c || f == 0.0 {
                continue;
            }
            for k in 0..n {
                m[r][k] -= f * pivot_row[k];
                inv[r][k] -= f * pivot_inv[k];
            }
        }
    }
    Ok(inv)
}

/// Standard-form LP `A x = b`, `0 <= x <= upper`, with its current basis
struct Simplex {
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    upper: Vec<f64>,
    /// `B^-1 A`
    tableau: Vec<Vec<f64>>,
    /// Values of the basic columns, one per row
    beta: Vec<f64>,
    reduced: Vec<f64>,
    cost: Vec<f64>,
    basis: Vec<usize>,
    is_basic: Vec<bool>,
    at_upper: Vec<bool>,
    pivots: usize,
    max_pivots: usize,
    since_refactor: usize,
    refactor_interval: usize,
    deadline: Option<Instant>,
}

impl Simplex {
    /// Start from a basis whose columns form the identity
    fn new(a: Vec<Vec<f64>>, b: Vec<f64>, upper: Vec<f64>, basis: Vec<usize>, deadline: Option<Instant>) -> Self {
        let columns = upper.len();
        let m = b.len();
        let mut is_basic = vec![false; columns];
        for &j in &basis {
            is_basic[j] = true;
        }
        Self {
            tableau: a.clone(),
            beta: b.clone(),
            a,
            b,
            upper,
            reduced: vec![0.0; columns],
            cost: vec![0.0; columns],
            basis,
            is_basic,
            at_upper: vec![false; columns],
            pivots: 0,
            max_pivots: 1_000 + 20 * (m + columns),
            since_refactor: 0,
            refactor_interval: MIN_REFACTOR_INTERVAL.max(m),
            deadline,
        }
    }

    fn columns(&self) -> usize {
        self.upper.len()
    }

    fn nonbasic_value(&self, j: usize) -> f64 {
        if self.at_upper[j] {
            self.upper[j]
        } else {
            0.0
        }
    }

    fn objective(&self) -> f64 {
        let basic: f64 = self
            .basis
            .iter()
            .zip(&self.beta)
            .map(|(&j, &x)| self.cost[j] * x)
            .sum();
        let nonbasic: f64 = (0..self.columns())
            .filter(|&j| !self.is_basic[j] && self.at_upper[j])
            .map(|j| self.cost[j] * self.upper[j])
            .sum();
        basic + nonbasic
    }

    fn set_cost(&mut self, cost: Vec<f64>) {
        self.cost = cost;
        self.reprice();
    }

    fn reprice(&mut self) {
        let n = self.columns();
        let mut priced = vec![0.0; n];
        for (row, &j) in self.tableau.iter().zip(&self.basis) {
            let c = self.cost[j];
            if c == 0.0 {
                continue;
            }
            for (p, &t) in priced.iter_mut().zip(row) {
                *p += c * t;
            }
        }
        for j in 0..n {
            self.reduced[j] = if self.is_basic[j] { 0.0 } else { self.cost[j] - priced[j] };
        }
    }

    /// Rebuild the tableau, basic values and reduced costs from `A` and `b`
    fn refactor(&mut self) -> std::result::Result<(), LpStop> {
        let m = self.b.len();
        let n = self.columns();
        let basis_matrix: Vec<Vec<f64>> = (0..m)
            .map(|i| self.basis.iter().map(|&j| self.a[i][j]).collect())
            .collect();
        let inverse = invert(basis_matrix, self.deadline)?;

        let mut rhs = self.b.clone();
        for j in (0..n).filter(|&j| !self.is_basic[j] && self.at_upper[j]) {
            for (r, row) in rhs.iter_mut().zip(&self.a) {
                *r -= row[j] * self.upper[j];
            }
        }

        for i in 0..m {
            let mut row = vec![0.0; n];
            let mut value = 0.0;
            for k in 0..m {
                let f = inverse[i][k];
                if f == 0.0 {
                    continue;
                }
                for (t, &a) in row.iter_mut().zip(&self.a[k]) {
                    *t += f * a;
                }
                value += f * rhs[k];
            }
            self.tableau[i] = row;
            self.beta[i] = value;
        }
        self.reprice();
        self.since_refactor = 0;
        Ok(())
    }

    /// Improving nonbasic column below `limit` and its direction of travel
    fn entering(&self, limit: usize, bland: bool) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for j in 0..limit {
            if self.is_basic[j] || self.upper[j] <= EPS {
                continue;
            }
            let d = self.reduced[j];
            let (score, direction) = if !self.at_upper[j] && d > EPS {
                (d, 1.0)
            } else if self.at_upper[j] && d < -EPS {
                (-d, -1.0)
            } else {
                continue;
            };
            if bland {
                return Some((j, direction));
            }
            if best.map_or(true, |(_, s, _)| score > s) {
                best = Some((j, score, direction));
            }
        }
        best.map(|(j, _, direction)| (j, direction))
    }

    /// Harris ratio test; the row that blocks the entering column, if any
    fn leaving(&self, col: usize, direction: f64) -> Option<(usize, f64)> {
        let bound = |i: usize, alpha: f64, slack: f64| -> Option<f64> {
            if alpha > PIVOT_TOLERANCE {
                Some((self.beta[i] + slack) / alpha)
            } else if alpha < -PIVOT_TOLERANCE {
                let ub = self.upper[self.basis[i]];
                ub.is_finite().then(|| (ub - self.beta[i] + slack) / -alpha)
            } else {
                None
            }
        };

        let relaxed = (0..self.beta.len())
            .filter_map(|i| bound(i, direction * self.tableau[i][col], HARRIS_TOLERANCE))
            .fold(f64::INFINITY, f64::min);
        if !relaxed.is_finite() {
            return None;
        }

        let mut chosen: Option<(usize, f64, f64)> = None;
        for i in 0..self.beta.len() {
            let alpha = direction * self.tableau[i][col];
            let Some(ratio) = bound(i, alpha, 0.0) else { continue };
            if ratio > relaxed {
                continue;
            }
            let better = chosen.map_or(true, |(r, _, a)| {
                alpha.abs() > a || (alpha.abs() == a && self.basis[i] < self.basis[r])
            });
            if better {
                chosen = Some((i, ratio.max(0.0), alpha.abs()));
            }
        }
        chosen.map(|(i, ratio, _)| (i, ratio))
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let p = self.tableau[row][col];
        for v in self.tableau[row].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.tableau[row].clone();
        for (i, r) in self.tableau.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let f = r[col];
            if f != 0.0 {
                for (a, b) in r.iter_mut().zip(&pivot_row) {
                    *a -= f * b;
                }
                r[col] = 0.0;
            }
        }
        let d = self.reduced[col];
        if d != 0.0 {
            for (r, b) in self.reduced.iter_mut().zip(&pivot_row) {
                *r -= d * b;
            }
        }

        let leaving = self.basis[row];
        self.is_basic[leaving] = false;
        self.reduced[leaving] = -d * pivot_row[leaving];
        self.is_basic[col] = true;
        self.reduced[col] = 0.0;
        self.basis[row] = col;
    }

    /// One step along column `col`: either a bound flip or a basis change.
    /// Returns the step length.
    fn step(&mut self, col: usize, direction: f64) -> Option<f64> {
        let blocking = self.leaving(col, direction);
        let flip = self.upper[col].is_finite()
            && blocking.map_or(true, |(_, ratio)| self.upper[col] <= ratio);

        if flip {
            let theta = self.upper[col];
            for (x, row) in self.beta.iter_mut().zip(&self.tableau) {
                *x -= direction * theta * row[col];
            }
            self.at_upper[col] = !self.at_upper[col];
            return Some(theta);
        }

        let (row, theta) = blocking?;
        let entering_value = self.nonbasic_value(col) + direction * theta;
        let alpha = direction * self.tableau[row][col];
        for (x, r) in self.beta.iter_mut().zip(&self.tableau) {
            *x -= direction * theta * r[col];
        }
        let leaving = self.basis[row];
        self.pivot(row, col);
        self.beta[row] = entering_value;
        self.at_upper[leaving] = alpha < 0.0;
        self.at_upper[col] = false;
        Some(theta)
    }

    /// Maximise the current cost using columns below `limit` as entering candidates
    fn optimise(&mut self, limit: usize) -> std::result::Result<Pivoting, LpStop> {
        let mut degenerate = 0usize;
        loop {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(LpStop::TimeLimit);
            }
            if self.pivots >= self.max_pivots {
                return Err(LpStop::IterationLimit);
            }
            if self.since_refactor >= self.refactor_interval {
                self.refactor()?;
            }

            let Some((col, direction)) = self.entering(limit, degenerate >= DEGENERATE_STREAK) else {
                if self.since_refactor == 0 {
                    return Ok(Pivoting::Optimal);
                }
                // confirm optimality on a freshly rebuilt tableau
                self.refactor()?;
                continue;
            };

            let Some(theta) = self.step(col, direction) else {
                return Ok(Pivoting::Unbounded);
            };
            self.pivots += 1;
            self.since_refactor += 1;
            degenerate = if theta <= EPS { degenerate + 1 } else { 0 };
        }
    }

    /// Move remaining zero-level artificial columns out of the basis where possible
    fn drive_out(&mut self, first_artificial: usize) {
        for row in 0..self.basis.len() {
            if self.basis[row] < first_artificial {
                continue;
            }
            let candidate = (0..first_artificial)
                .filter(|&j| !self.is_basic[j])
                .max_by(|&a, &b| self.tableau[row][a].abs().total_cmp(&self.tableau[row][b].abs()));
            if let Some(col) = candidate.filter(|&j| self.tableau[row][j].abs() > 1e-7) {
                let value = self.nonbasic_value(col);
                let leaving = self.basis[row];
                self.pivot(row, col);
                self.beta[row] = value;
                self.at_upper[leaving] = false;
                self.at_upper[col] = false;
                self.since_refactor += 1;
            }
        }
    }
}

fn stopped(stop: LpStop) -> Result<LpOutcome> {
    Ok(LpOutcome::Stopped(stop))
}

/// Solve the continuous relaxation of `model` with per-variable bounds
/// `lower`/`upper` overriding the model's own, giving up at `deadline`.
pub fn solve_relaxation(
    model: &MipModel,
    lower: &[f64],
    upper: &[f64],
    deadline: Option<Instant>,
) -> Result<LpOutcome> {
    let n = model.variables().len();
    if lower.iter().any(|l| !l.is_finite()) {
        return Err(HoneypotError::Solver(
            "variables need finite lower bounds".to_string(),
        ));
    }
    if lower.iter().zip(upper).any(|(l, u)| u < &(l - EPS)) {
        return Ok(LpOutcome::Infeasible);
    }

    // free columns are variables with a non-degenerate range
    let mut column_of = vec![None; n];
    let mut free = Vec::new();
    for j in 0..n {
        if upper[j] - lower[j] > EPS {
            column_of[j] = Some(free.len());
            free.push(j);
        }
    }
    let width = free.len();

    let mut rows: Vec<Row> = Vec::new();
    for c in model.constraints() {
        let mut coeffs = vec![0.0; width];
        let mut rhs = c.rhs;
        for &(j, a) in &c.terms {
            if let Some(col) = column_of[j] {
                coeffs[col] += a;
            }
            rhs -= a * lower[j];
        }
        if coeffs.iter().all(|&a| a.abs() <= EPS) {
            let ok = match c.sense {
                Sense::LessEqual => 0.0 <= rhs + PHASE_ONE_TOLERANCE,
                Sense::GreaterEqual => 0.0 >= rhs - PHASE_ONE_TOLERANCE,
                Sense::Equal => rhs.abs() <= PHASE_ONE_TOLERANCE,
            };
            if !ok {
                return Ok(LpOutcome::Infeasible);
            }
            continue;
        }
        rows.push(Row { coeffs, sense: c.sense, rhs });
    }

    for row in &mut rows {
        if row.rhs < 0.0 || (row.rhs == 0.0 && row.sense == Sense::GreaterEqual) {
            row.rhs = -row.rhs;
            for a in &mut row.coeffs {
                *a = -*a;
            }
            row.sense = match row.sense {
                Sense::LessEqual => Sense::GreaterEqual,
                Sense::GreaterEqual => Sense::LessEqual,
                Sense::Equal => Sense::Equal,
            };
        }
    }

    let logicals = rows.iter().filter(|r| r.sense != Sense::Equal).count();
    let artificials = rows.iter().filter(|r| r.sense != Sense::LessEqual).count();
    let first_artificial = width + logicals;
    let columns = first_artificial + artificials;
    let m = rows.len();

    let mut bounds = vec![f64::INFINITY; columns];
    for (col, &j) in free.iter().enumerate() {
        bounds[col] = upper[j] - lower[j];
    }

    let mut a = vec![vec![0.0; columns]; m];
    let mut b = vec![0.0; m];
    let mut basis = vec![0; m];
    let mut next_logical = width;
    let mut next_artificial = first_artificial;
    for (i, row) in rows.iter().enumerate() {
        a[i][..width].copy_from_slice(&row.coeffs);
        b[i] = row.rhs;
        match row.sense {
            Sense::LessEqual => {
                a[i][next_logical] = 1.0;
                basis[i] = next_logical;
                next_logical += 1;
            }
            Sense::GreaterEqual => {
                a[i][next_logical] = -1.0;
                next_logical += 1;
                a[i][next_artificial] = 1.0;
                basis[i] = next_artificial;
                next_artificial += 1;
            }
            Sense::Equal => {
                a[i][next_artificial] = 1.0;
                basis[i] = next_artificial;
                next_artificial += 1;
            }
        }
    }

    let mut simplex = Simplex::new(a, b, bounds, basis, deadline);

    if artificials > 0 {
        let mut phase_one = vec![0.0; columns];
        for c in phase_one.iter_mut().skip(first_artificial) {
            *c = -1.0;
        }
        simplex.set_cost(phase_one);
        match simplex.optimise(columns) {
            Ok(_) => {}
            Err(stop) => return stopped(stop),
        }
        if simplex.objective() < -PHASE_ONE_TOLERANCE {
            return Ok(LpOutcome::Infeasible);
        }
        // artificials are pinned at zero from here on
        for j in first_artificial..columns {
            simplex.upper[j] = 0.0;
            simplex.at_upper[j] = false;
        }
        simplex.drive_out(first_artificial);
        if let Err(stop) = simplex.refactor() {
            return stopped(stop);
        }
    }

    let mut cost = vec![0.0; columns];
    for &(j, c) in model.objective() {
        if let Some(col) = column_of[j] {
            cost[col] += c;
        }
    }
    simplex.set_cost(cost);
    match simplex.optimise(first_artificial) {
        Ok(Pivoting::Optimal) => {}
        Ok(Pivoting::Unbounded) => return Ok(LpOutcome::Unbounded),
        Err(stop) => return stopped(stop),
    }

    let mut shifted: Vec<f64> = (0..width).map(|col| simplex.nonbasic_value(col)).collect();
    for (&col, &x) in simplex.basis.iter().zip(&simplex.beta) {
        if col < width {
            shifted[col] = x;
        }
    }
    let mut values = lower.to_vec();
    for (col, &j) in free.iter().enumerate() {
        values[j] += shifted[col].clamp(0.0, upper[j] - lower[j]);
    }
    log::trace!("LP solved in {} pivots", simplex.pivots);
    Ok(LpOutcome::Optimal {
        objective: model.objective_value(&values),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::MipModel;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    fn bounds(model: &MipModel) -> (Vec<f64>, Vec<f64>) {
        (
            model.variables().iter().map(|v| v.lower).collect(),
            model.variables().iter().map(|v| v.upper).collect(),
        )
    }

    #[test]
    fn test_textbook_lp() {
        // max 3x + 5y  s.t. x <= 4, 2y <= 12, 3x + 2y <= 18
        let mut m = MipModel::new();
        let x = m.add_continuous("x", 0.0, f64::INFINITY);
        let y = m.add_continuous("y", 0.0, f64::INFINITY);
        m.add_constraint("a", vec![(x, 1.0)], Sense::LessEqual, 4.0);
        m.add_constraint("b", vec![(y, 2.0)], Sense::LessEqual, 12.0);
        m.add_constraint("c", vec![(x, 3.0), (y, 2.0)], Sense::LessEqual, 18.0);
        m.set_objective(vec![(x, 3.0), (y, 5.0)]);

        let (lo, up) = bounds(&m);
        match solve_relaxation(&m, &lo, &up, None).unwrap() {
            LpOutcome::Optimal { objective, values } => {
                assert_abs_diff_eq!(objective, 36.0, epsilon = 1e-9);
                assert_abs_diff_eq!(values[x], 2.0, epsilon = 1e-9);
                assert_abs_diff_eq!(values[y], 6.0, epsilon = 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_equality_and_lower_bounds() {
        // max x + 2y  s.t. x + y = 3, x >= 2.5, x in [1, 10], y in [0, 1]
        let mut m = MipModel::new();
        let x = m.add_continuous("x", 1.0, 10.0);
        let y = m.add_continuous("y", 0.0, 1.0);
        m.add_constraint("sum", vec![(x, 1.0), (y, 1.0)], Sense::Equal, 3.0);
        m.add_constraint("cap", vec![(x, 1.0)], Sense::GreaterEqual, 2.5);
        m.set_objective(vec![(x, 1.0), (y, 2.0)]);

        let (lo, up) = bounds(&m);
        match solve_relaxation(&m, &lo, &up, None).unwrap() {
            LpOutcome::Optimal { objective, values } => {
                assert_abs_diff_eq!(values[x] + values[y], 3.0, epsilon = 1e-9);
                assert_abs_diff_eq!(values[y], 0.5, epsilon = 1e-9);
                assert_abs_diff_eq!(objective, 3.5, epsilon = 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_infeasible_and_unbounded() {
        let mut m = MipModel::new();
        let x = m.add_continuous("x", 0.0, 1.0);
        m.add_constraint("c", vec![(x, 1.0)], Sense::GreaterEqual, 2.0);
        let (lo, up) = bounds(&m);
        assert_eq!(solve_relaxation(&m, &lo, &up, None).unwrap(), LpOutcome::Infeasible);

        let mut m = MipModel::new();
        let x = m.add_continuous("x", 0.0, f64::INFINITY);
        m.set_objective(vec![(x, 1.0)]);
        let (lo, up) = bounds(&m);
        assert_eq!(solve_relaxation(&m, &lo, &up, None).unwrap(), LpOutcome::Unbounded);
    }

    #[test]
    fn test_upper_bounds_flip_without_rows() {
        // max x + y with both in [0, 1] and no constraints at all
        let mut m = MipModel::new();
        let x = m.add_binary("x");
        let y = m.add_binary("y");
        m.set_objective(vec![(x, 1.0), (y, 1.0)]);
        let (lo, up) = bounds(&m);
        match solve_relaxation(&m, &lo, &up, None).unwrap() {
            LpOutcome::Optimal { objective, values } => {
                assert_eq!(values, vec![1.0, 1.0]);
                assert_abs_diff_eq!(objective, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fixed_variables_are_substituted() {
        let mut m = MipModel::new();
        let x = m.add_binary("x");
        let y = m.add_binary("y");
        m.add_constraint("c", vec![(x, 1.0), (y, 1.0)], Sense::LessEqual, 1.0);
        m.set_objective(vec![(x, 2.0), (y, 1.0)]);

        match solve_relaxation(&m, &[0.0, 0.0], &[0.0, 1.0], None).unwrap() {
            LpOutcome::Optimal { objective, values } => {
                assert_eq!(values[x], 0.0);
                assert_abs_diff_eq!(values[y], 1.0, epsilon = 1e-9);
                assert_abs_diff_eq!(objective, 1.0, epsilon = 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            solve_relaxation(&m, &[1.0, 1.0], &[1.0, 1.0], None).unwrap(),
            LpOutcome::Infeasible
        );
    }

    #[test]
    fn test_expired_deadline_stops_the_solve() {
        let mut m = MipModel::new();
        let x = m.add_binary("x");
        let y = m.add_binary("y");
        m.add_constraint("pick", vec![(x, 1.0), (y, 1.0)], Sense::Equal, 1.0);
        m.set_objective(vec![(x, 1.0)]);
        let (lo, up) = bounds(&m);

        let past = Instant::now() - Duration::from_millis(1);
        assert_eq!(
            solve_relaxation(&m, &lo, &up, Some(past)).unwrap(),
            LpOutcome::Stopped(LpStop::TimeLimit)
        );
    }

    #[test]
    fn test_dense_coverage_relaxation_is_bounded() {
        // 30 columns, 120 rows of three detectors each, pick 4
        let mut m = MipModel::new();
        let x: Vec<usize> = (0..30).map(|v| m.add_binary(format!("x{}", v))).collect();
        let u: Vec<usize> = (0..120).map(|i| m.add_binary(format!("u{}", i))).collect();
        m.add_constraint("k", x.iter().map(|&j| (j, 1.0)).collect(), Sense::Equal, 4.0);
        for (i, &ui) in u.iter().enumerate() {
            let mut terms: Vec<(usize, f64)> = [i, 7 * i + 3, 13 * i + 5]
                .iter()
                .map(|&v| (x[v % 30], 1.0))
                .collect();
            terms.sort_unstable_by_key(|t| t.0);
            terms.dedup_by_key(|t| t.0);
            terms.push((ui, -1.0));
            m.add_constraint(format!("c{}", i), terms, Sense::GreaterEqual, 0.0);
        }
        m.set_objective(u.iter().map(|&j| (j, 1.0 / 120.0)).collect());

        let (lo, up) = bounds(&m);
        match solve_relaxation(&m, &lo, &up, None).unwrap() {
            LpOutcome::Optimal { objective, values } => {
                assert!(objective > 0.0 && objective <= 1.0 + 1e-9);
                let picked: f64 = x.iter().map(|&j| values[j]).sum();
                assert_abs_diff_eq!(picked, 4.0, epsilon = 1e-6);
                assert!(m.relaxed().is_feasible(&values, 1e-6));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
