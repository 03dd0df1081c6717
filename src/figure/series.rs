//! Plot series, regression fits, ticks and result comparisons
//!
//! Everything here is plain data: the renderer only draws what these
//! functions return.

use crate::analysis::ResultSet;
use crate::matrix::CriterionMatrix;
use crate::{Error, Result};

/// One line of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// X coordinates
    pub x: Vec<f64>,
    /// Mean values (may contain NaN)
    pub y: Vec<f64>,
    /// Error half-widths, same length as `y`
    pub err: Vec<f64>,
}

impl Series {
    /// Points with finite coordinates.
    #[must_use]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x
            .iter()
            .zip(&self.y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect()
    }

    /// `(x, y - err, y + err)` with finite coordinates.
    #[must_use]
    pub fn band(&self) -> Vec<(f64, f64, f64)> {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.err)
            .map(|((&x, &y), &e)| (x, y - e, y + e))
            .filter(|(x, lo, hi)| x.is_finite() && lo.is_finite() && hi.is_finite())
            .collect()
    }

    /// Apply `f` to every x coordinate.
    #[must_use]
    pub fn map_x(mut self, f: impl Fn(f64) -> f64) -> Self {
        self.x = self.x.into_iter().map(f).collect();
        self
    }

    /// Apply `f` to the values and their error bounds.
    #[must_use]
    pub fn map_y(self, f: impl Fn(f64) -> f64) -> Self {
        let (mut y, mut err) = (Vec::with_capacity(self.y.len()), Vec::with_capacity(self.y.len()));
        for (&v, &e) in self.y.iter().zip(&self.err) {
            let (lo, hi) = (f(v - e), f(v + e));
            y.push(f(v));
            err.push((hi - lo).abs() / 2.0);
        }
        Self { x: self.x, y, err }
    }
}

fn sem_scale(values: Vec<f64>, sem_n: f64) -> Vec<f64> {
    let scale = sem_n.sqrt();
    values.into_iter().map(|v| v / scale).collect()
}

/// Task at ordinal position `task` (0-based) across its repetitions.
///
/// `x = 1..=N - task`, `y = diag(mean, task)`.
#[must_use]
pub fn times_trained_series(result: &ResultSet, task: usize, sem_n: f64) -> Series {
    let y = result.mean.diag(task);
    let x = (1..=y.len()).map(|v| v as f64).collect();
    Series {
        x,
        y,
        err: sem_scale(result.std.diag(task), sem_n),
    }
}

/// Repetition `times` (0-based) across the tasks introduced so far.
///
/// `x = times + 1..=N`, `y = mean[times, times..]`.
#[must_use]
pub fn tasks_trained_series(result: &ResultSet, times: usize, sem_n: f64) -> Series {
    let cols = result.mean.cols();
    let y = result.mean.row(times)[times.min(cols)..].to_vec();
    let err = result.std.row(times)[times.min(cols)..].to_vec();
    Series {
        x: (times + 1..=cols).map(|v| v as f64).collect(),
        y,
        err: sem_scale(err, sem_n),
    }
}

/// Raw accuracy curve of one row, up to its first unset sample.
///
/// `x` counts training examples: epoch `k` of row `row` sits at
/// `k * examples_per_epoch(row)`, shifted by `start_x` when rows are
/// stacked one after another.
#[must_use]
pub fn raw_accuracy_series(
    result: &ResultSet,
    row: usize,
    examples_per_epoch: f64,
    sem_n: f64,
    start_x: f64,
) -> Series {
    let values = result.mean.row(row);
    let len = values.iter().position(|v| v.is_nan()).unwrap_or(values.len());
    Series {
        x: (1..=len).map(|k| start_x + k as f64 * examples_per_epoch).collect(),
        y: values[..len].to_vec(),
        err: sem_scale(result.std.row(row)[..len].to_vec(), sem_n),
    }
}

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Value at `x = 0` (or `ln x = 0` for a log-x fit)
    pub intercept: f64,
    /// Change per unit `x`
    pub slope: f64,
}

impl LinearFit {
    /// Fitted value at `x`.
    #[must_use]
    pub fn predict(&self, x: f64, log_x: bool) -> f64 {
        let x = if log_x { x.ln() } else { x };
        self.intercept + self.slope * x
    }

    /// Legend text, e.g. `log(y) = -0.1234 x + 10.5`.
    #[must_use]
    pub fn label(&self, log_x: bool, log_y: bool, digits: usize) -> String {
        let wrap = |name: &str, log: bool| if log { format!("log({name})") } else { name.to_string() };
        format!(
            "{} = {} {} + {}",
            wrap("y", log_y),
            format_significant(self.slope, digits),
            wrap("x", log_x),
            format_significant(self.intercept, digits)
        )
    }
}

/// Fit a line through `(x, y)`, optionally in log space.
///
/// Pairs with a non-finite coordinate (after the log) are skipped.
///
/// # Errors
///
/// Returns `InvalidInput` with fewer than two usable points or when
/// all x values coincide.
pub fn fit_regression_line(x: &[f64], y: &[f64], log_x: bool, log_y: bool) -> Result<LinearFit> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&x, &y)| (if log_x { x.ln() } else { x }, if log_y { y.ln() } else { y }))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "regression needs at least 2 points, got {}",
            pairs.len()
        )));
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = pairs.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx == 0.0 {
        return Err(Error::InvalidInput(
            "regression x values are all equal".to_string(),
        ));
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        intercept: mean_y - slope * mean_x,
        slope,
    })
}

/// `scale * 2^k` for `k` in `min_power..max_power`.
#[must_use]
pub fn generate_custom_ticks(scale: f64, max_power: u32, min_power: u32) -> Vec<f64> {
    (min_power..max_power)
        .map(|k| scale * f64::from(2_u32.pow(k)))
        .collect()
}

/// Default log-scale ticks: 4k to 512k.
#[must_use]
pub fn default_log_scale_ticks() -> Vec<f64> {
    generate_custom_ticks(4000.0, 8, 0)
}

/// Tick label in whole thousands: `4000 -> "4k"`.
#[must_use]
pub fn thousands_label(value: f64) -> String {
    format!("{}k", (value / 1000.0).floor() as i64)
}

/// Format with `digits` significant digits, trailing zeros trimmed.
#[must_use]
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let digits = digits.max(1);
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= digits as i32 {
        return format!("{:.*e}", digits - 1, value);
    }
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Element-wise comparison of a modulated result against its baseline.
#[derive(Debug, Clone, Copy)]
pub enum Comparison {
    /// `a - b`; null line at 0
    Subtract,
    /// `a / b`; null line at 1
    Divide,
    /// Any other cell function; the null line must be given
    Custom {
        /// Cell function
        func: fn(f64, f64) -> f64,
        /// Value at which both results agree
        null_line: Option<f64>,
    },
}

impl Comparison {
    /// Value at which the compared results agree.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComparison` for a custom function without one.
    pub fn null_line(&self) -> Result<f64> {
        match self {
            Self::Subtract => Ok(0.0),
            Self::Divide => Ok(1.0),
            Self::Custom {
                null_line: Some(value),
                ..
            } => Ok(*value),
            Self::Custom { null_line: None, .. } => Err(Error::InvalidComparison(
                "only subtract and divide have a default null line".to_string(),
            )),
        }
    }

    fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Subtract => a - b,
            Self::Divide => a / b,
            Self::Custom { func, .. } => func(a, b),
        }
    }

    /// Compare two result sets cell by cell.
    ///
    /// With `baseline_first` the baseline is the left operand. Subtraction
    /// combines the deviations as `sqrt(a² + b²)`; every other comparison
    /// keeps the baseline's deviation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on shape mismatch.
    pub fn compare(
        &self,
        modulated: &ResultSet,
        baseline: &ResultSet,
        baseline_first: bool,
    ) -> Result<ResultSet> {
        let (left, right) = if baseline_first {
            (baseline, modulated)
        } else {
            (modulated, baseline)
        };
        let mean = left.mean.zip_with(&right.mean, |a, b| self.apply(a, b))?;
        let std: CriterionMatrix = match self {
            Self::Subtract => modulated.std.zip_with(&baseline.std, f64::hypot)?,
            _ => baseline.std.clone(),
        };
        Ok(ResultSet {
            name: "diff".to_string(),
            mean,
            std,
        })
    }
}
