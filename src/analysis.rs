//! Regression and t-test summary over the final analysis table.
//!
//! Three ordinary least squares models of outage duration (on average
//! temperature, on the `is_hot` flag, and on temperature category dummies
//! with "neutral" as baseline) plus a Welch two-sample t-test comparing
//! durations of hot and not-hot months. Models that cannot be fitted
//! (too few rows, singular design) are reported as unavailable.

use crate::constants::columns;
use crate::error::Result;
use crate::models::TempCategory;
use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;
use tracing::debug;

/// One estimated coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTerm {
    pub name: String,
    pub coefficient: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Result of an OLS fit with intercept
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub label: String,
    pub terms: Vec<RegressionTerm>,
    pub r_squared: f64,
    pub n: usize,
}

impl OlsFit {
    pub fn term(&self, name: &str) -> Option<&RegressionTerm> {
        self.terms.iter().find(|t| t.name == name)
    }
}

/// Result of Welch's unequal-variance t-test
#[derive(Debug, Clone, PartialEq)]
pub struct WelchTest {
    pub mean_a: f64,
    pub mean_b: f64,
    pub n_a: usize,
    pub n_b: usize,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Full summary for one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub duration_on_temperature: Option<OlsFit>,
    pub duration_on_is_hot: Option<OlsFit>,
    pub duration_on_category: Option<OlsFit>,
    pub hot_vs_not_hot: Option<WelchTest>,
}

impl AnalysisReport {
    /// Fit every model on the final table
    pub fn from_table(df: &DataFrame) -> Result<Self> {
        let duration = df.column(columns::OUTAGE_DURATION)?.f64()?;
        let temp = df.column(columns::AVG_TEMP_F)?.f64()?;
        let is_hot = df.column(columns::IS_HOT)?.i32()?;
        let category = df.column(columns::TEMP_CATEGORY)?.str()?;

        let mut on_temp = (Vec::new(), Vec::new());
        let mut on_flag = (Vec::new(), Vec::new());
        let mut on_category = (Vec::new(), Vec::new());
        let mut hot = Vec::new();
        let mut not_hot = Vec::new();

        for i in 0..df.height() {
            let Some(y) = duration.get(i) else {
                continue;
            };
            if let Some(t) = temp.get(i) {
                on_temp.0.push(y);
                on_temp.1.push(vec![t]);
            }
            if let Some(flag) = is_hot.get(i) {
                on_flag.0.push(y);
                on_flag.1.push(vec![flag as f64]);
                if flag == 1 {
                    hot.push(y);
                } else {
                    not_hot.push(y);
                }
            }
            if let Some(c) = category.get(i) {
                on_category.0.push(y);
                on_category.1.push(vec![
                    (c == TempCategory::Cold.as_str()) as u8 as f64,
                    (c == TempCategory::Hot.as_str()) as u8 as f64,
                ]);
            }
        }

        let report = Self {
            duration_on_temperature: fit_ols(
                "duration ~ avg_temp_f",
                &on_temp.0,
                &on_temp.1,
                &[columns::AVG_TEMP_F],
            ),
            duration_on_is_hot: fit_ols(
                "duration ~ is_hot",
                &on_flag.0,
                &on_flag.1,
                &[columns::IS_HOT],
            ),
            duration_on_category: fit_ols(
                "duration ~ temp_category",
                &on_category.0,
                &on_category.1,
                &["temp_category[cold]", "temp_category[hot]"],
            ),
            hot_vs_not_hot: welch_t_test(&hot, &not_hot),
        };

        debug!("Analysis report: {:?}", report);
        Ok(report)
    }
}

/// Fit `y = b0 + b1*x1 + ... + bp*xp` by ordinary least squares
///
/// `rows` holds the regressors of each observation (intercept excluded).
pub fn fit_ols(label: &str, y: &[f64], rows: &[Vec<f64>], names: &[&str]) -> Option<OlsFit> {
    let n = y.len();
    let k = names.len() + 1;
    if n != rows.len() || n <= k || rows.iter().any(|r| r.len() != names.len()) {
        return None;
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in rows.iter().zip(y) {
        for a in 0..k {
            xty[a] += design_value(row, a) * yi;
            for b in 0..k {
                xtx[a][b] += design_value(row, a) * design_value(row, b);
            }
        }
    }

    let inverse = invert(xtx)?;
    let beta: Vec<f64> = (0..k)
        .map(|a| (0..k).map(|b| inverse[a][b] * xty[b]).sum())
        .collect();

    let mean_y = y.iter().sum::<f64>() / n as f64;
    let (mut sse, mut sst) = (0.0, 0.0);
    for (row, &yi) in rows.iter().zip(y) {
        let fitted: f64 = (0..k).map(|j| beta[j] * design_value(row, j)).sum();
        sse += (yi - fitted).powi(2);
        sst += (yi - mean_y).powi(2);
    }

    let dof = (n - k) as f64;
    let sigma2 = sse / dof;
    let terms = std::iter::once("intercept")
        .chain(names.iter().copied())
        .enumerate()
        .map(|(j, name)| {
            let std_error = (sigma2 * inverse[j][j]).sqrt();
            let t_value = beta[j] / std_error;
            RegressionTerm {
                name: name.to_string(),
                coefficient: beta[j],
                std_error,
                t_value,
                p_value: student_t_two_sided(t_value, dof),
            }
        })
        .collect();

    Some(OlsFit {
        label: label.to_string(),
        terms,
        r_squared: if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN },
        n,
    })
}

/// Design matrix entry: column 0 is the intercept
fn design_value(row: &[f64], j: usize) -> f64 {
    if j == 0 { 1.0 } else { row[j - 1] }
}

/// Welch's t-test of mean(a) - mean(b)
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (mean_a, var_a) = mean_and_variance(a);
    let (mean_b, var_b) = mean_and_variance(b);
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let se_a = var_a / na;
    let se_b = var_b / nb;
    let se2 = se_a + se_b;
    if se2 <= 0.0 {
        return None;
    }

    let t_statistic = (mean_a - mean_b) / se2.sqrt();
    let degrees_of_freedom = se2.powi(2) / (se_a.powi(2) / (na - 1.0) + se_b.powi(2) / (nb - 1.0));

    Some(WelchTest {
        mean_a,
        mean_b,
        n_a: a.len(),
        n_b: b.len(),
        t_statistic,
        degrees_of_freedom,
        p_value: student_t_two_sided(t_statistic, degrees_of_freedom),
    })
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

/// Gauss-Jordan inversion with partial pivoting; None when singular
fn invert(mut m: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let k = m.len();
    let scale = m
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);
    let mut inv: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for c in 0..k {
        let pivot = (c..k).max_by(|&a, &b| m[a][c].abs().total_cmp(&m[b][c].abs()))?;
        if m[pivot][c].abs() < 1e-12 * scale {
            return None;
        }
        m.swap(c, pivot);
        inv.swap(c, pivot);

        let p = m[c][c];
        for j in 0..k {
            m[c][j] /= p;
            inv[c][j] /= p;
        }
        let (pivot_row, pivot_inv) = (m[c].clone(), inv[c].clone());
        for r in 0..k {
            if r != c {
                let factor = m[r][c];
                if factor != 0.0 {
                    for j in 0..k {
                        m[r][j] -= factor * pivot_row[j];
                        inv[r][j] -= factor * pivot_inv[j];
                    }
                }
            }
        }
    }

    Some(inv)
}

/// Two-sided p-value of Student's t distribution
///
/// NaN when `t` is NaN or `dof` is not a valid number of degrees of freedom.
pub fn student_t_two_sided(t: f64, dof: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, dof) {
        Ok(distribution) => (2.0 * distribution.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

impl fmt::Display for OlsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (n = {}, R² = {:.4})", self.label, self.n, self.r_squared)?;
        for term in &self.terms {
            writeln!(
                f,
                "    {:<22} {:>12.3} {:>12.3} {:>8.3} {:>8.4}",
                term.name, term.coefficient, term.std_error, term.t_value, term.p_value
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for WelchTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Welch t-test, hot vs not hot: mean {:.1} (n = {}) vs {:.1} (n = {}), t = {:.3}, df = {:.1}, p = {:.4}",
            self.mean_a,
            self.n_a,
            self.mean_b,
            self.n_b,
            self.t_statistic,
            self.degrees_of_freedom,
            self.p_value
        )
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let models = [
            ("duration ~ avg_temp_f", &self.duration_on_temperature),
            ("duration ~ is_hot", &self.duration_on_is_hot),
            ("duration ~ temp_category", &self.duration_on_category),
        ];
        for (label, fit) in models {
            match fit {
                Some(fit) => write!(f, "{}", fit)?,
                None => writeln!(f, "{}: unavailable", label)?,
            }
        }
        match &self.hot_vs_not_hot {
            Some(test) => write!(f, "{}", test),
            None => writeln!(f, "Welch t-test, hot vs not hot: unavailable"),
        }
    }
}
