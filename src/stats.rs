//! Monte-Carlo estimate container and the distribution quantiles behind it.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{HoneypotError, Result};

/// Significance level, validated to lie strictly between 0 and 1
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Alpha(f64);

impl Alpha {
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha > 0.0 && alpha < 1.0 {
            Ok(Alpha(alpha))
        } else {
            Err(HoneypotError::Configuration(format!(
                "alpha must lie in (0, 1), got {}",
                alpha
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `z_{1 - alpha/2}`
    pub fn two_sided_z(&self) -> Result<f64> {
        normal_quantile(1.0 - self.0 / 2.0)
    }

    /// `z_{1 - alpha}`
    pub fn one_sided_z(&self) -> Result<f64> {
        normal_quantile(1.0 - self.0)
    }

    /// `t_{dof, 1 - alpha}`
    pub fn one_sided_t(&self, dof: usize) -> Result<f64> {
        student_t_quantile(1.0 - self.0, dof as f64)
    }
}

impl TryFrom<f64> for Alpha {
    type Error = HoneypotError;

    fn try_from(value: f64) -> Result<Self> {
        Alpha::new(value)
    }
}

impl From<Alpha> for f64 {
    fn from(alpha: Alpha) -> f64 {
        alpha.0
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Alpha(0.05)
    }
}

/// Standard normal quantile
pub fn normal_quantile(p: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| HoneypotError::Configuration(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Student-t quantile with `dof` degrees of freedom
pub fn student_t_quantile(p: f64, dof: f64) -> Result<f64> {
    let t = StudentsT::new(0.0, 1.0, dof).map_err(|e| HoneypotError::Configuration(e.to_string()))?;
    Ok(t.inverse_cdf(p))
}

/// Point estimate with its standard error and confidence interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub point: f64,
    pub std_error: f64,
    pub alpha: f64,
    pub half_width: f64,
    pub lower: f64,
    pub upper: f64,
    pub sample_size: usize,
}

impl Estimate {
    /// Symmetric interval `point ± quantile * std_error`
    pub fn symmetric(point: f64, std_error: f64, quantile: f64, alpha: Alpha, sample_size: usize) -> Self {
        let half_width = quantile * std_error;
        Self {
            point,
            std_error,
            alpha: alpha.value(),
            half_width,
            lower: point - half_width,
            upper: point + half_width,
            sample_size,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Two-sided normal-approximation interval for a success proportion
pub fn proportion_estimate(successes: usize, n: usize, alpha: Alpha) -> Result<Estimate> {
    if n == 0 {
        return Err(HoneypotError::InsufficientData(
            "a proportion needs at least one observation".to_string(),
        ));
    }
    let p = successes as f64 / n as f64;
    let std_error = (p * (1.0 - p) / n as f64).sqrt();
    Ok(Estimate::symmetric(p, std_error, alpha.two_sided_z()?, alpha, n))
}

/// Weighted share of `hits`, with the binomial standard error taken at the
/// Kish effective sample size `(sum w)^2 / sum w^2`
pub fn weighted_proportion_estimate(hits: &[bool], weights: &[f64], alpha: Alpha) -> Result<Estimate> {
    let total: f64 = weights.iter().sum();
    if hits.is_empty() || hits.len() != weights.len() || total <= 0.0 {
        return Err(HoneypotError::InsufficientData(
            "a weighted proportion needs observations with positive total weight".to_string(),
        ));
    }
    let p = hits.iter().zip(weights).filter(|(h, _)| **h).map(|(_, w)| w).sum::<f64>() / total;
    let effective = total * total / weights.iter().map(|w| w * w).sum::<f64>();
    let std_error = (p * (1.0 - p) / effective).sqrt();
    Ok(Estimate::symmetric(p, std_error, alpha.two_sided_z()?, alpha, hits.len()))
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
