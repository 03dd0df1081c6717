//! Criterion matrices
//!
//! Dense row-major grids of `f64` where NaN marks an unset cell. Row and
//! column semantics belong to the producer (see [`crate::analysis`]);
//! this module only knows shapes, diagonals and cell-wise statistics.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense matrix with NaN as the "unset" marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr", into = "MatrixRepr")]
pub struct CriterionMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Serialized form: unset cells become `null`, infinities `"inf"`/`"-inf"`.
#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Cell>>,
}

/// A set cell; JSON numbers cannot hold infinities.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Cell {
    Finite(f64),
    Infinite(Infinity),
}

#[derive(Serialize, Deserialize)]
enum Infinity {
    #[serde(rename = "inf")]
    Positive,
    #[serde(rename = "-inf")]
    Negative,
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value == f64::INFINITY {
            Self::Infinite(Infinity::Positive)
        } else if value == f64::NEG_INFINITY {
            Self::Infinite(Infinity::Negative)
        } else {
            Self::Finite(value)
        }
    }
}

impl From<Cell> for f64 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Finite(value) => value,
            Cell::Infinite(Infinity::Positive) => Self::INFINITY,
            Cell::Infinite(Infinity::Negative) => Self::NEG_INFINITY,
        }
    }
}

impl From<CriterionMatrix> for MatrixRepr {
    fn from(matrix: CriterionMatrix) -> Self {
        Self {
            rows: matrix.rows,
            cols: matrix.cols,
            cells: matrix
                .data
                .into_iter()
                .map(|v| if v.is_nan() { None } else { Some(Cell::from(v)) })
                .collect(),
        }
    }
}

impl TryFrom<MatrixRepr> for CriterionMatrix {
    type Error = Error;

    fn try_from(repr: MatrixRepr) -> Result<Self> {
        if repr.cells.len() != repr.rows * repr.cols {
            return Err(Error::CacheError(format!(
                "matrix {}x{} has {} cells",
                repr.rows,
                repr.cols,
                repr.cells.len()
            )));
        }
        Ok(Self {
            rows: repr.rows,
            cols: repr.cols,
            data: repr
                .cells
                .into_iter()
                .map(|v| v.map_or(f64::NAN, f64::from))
                .collect(),
        })
    }
}

impl CriterionMatrix {
    /// Create a matrix with every cell unset.
    #[must_use]
    pub fn unset(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, f64::NAN)
    }

    /// Create a matrix with every cell set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Create a matrix from row vectors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the rows have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(Error::InvalidInput(
                "all rows of a matrix must have the same length".to_string(),
            ));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell value, `None` when out of range or unset.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let value = self.data[row * self.cols + col];
        (!value.is_nan()).then_some(value)
    }

    /// Whether a cell holds a value.
    #[must_use]
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// Raw row slice (unset cells are NaN).
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Upper diagonal at `offset`: cells `[j, j + offset]`.
    ///
    /// Empty when `offset` is past the last column.
    #[must_use]
    pub fn diag(&self, offset: usize) -> Vec<f64> {
        (0..self.rows)
            .take_while(|j| j + offset < self.cols)
            .map(|j| self[(j, j + offset)])
            .collect()
    }

    /// Iterate `(row, col, value)` over the set cells.
    pub fn populated(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(move |(i, &v)| (i / self.cols, i % self.cols, v))
    }

    /// Apply `f` to every cell (NaN cells stay NaN for NaN-preserving `f`).
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Natural logarithm of every cell.
    #[must_use]
    pub fn ln(&self) -> Self {
        self.map(f64::ln)
    }

    /// Combine two same-shaped matrices cell by cell.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on shape mismatch.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        self.ensure_same_shape(other)?;
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Cell-wise mean over a stack of matrices.
    ///
    /// A cell that is unset in any input is unset in the result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the stack is empty or shapes differ.
    pub fn mean(stack: &[Self]) -> Result<Self> {
        let first = Self::check_stack(stack)?;
        let n = stack.len() as f64;
        let mut mean = Self::filled(first.rows, first.cols, 0.0);
        for matrix in stack {
            for (acc, v) in mean.data.iter_mut().zip(&matrix.data) {
                *acc += v;
            }
        }
        for acc in &mut mean.data {
            *acc /= n;
        }
        Ok(mean)
    }

    /// Cell-wise population standard deviation over a stack of matrices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the stack is empty or shapes differ.
    pub fn std(stack: &[Self]) -> Result<Self> {
        let mean = Self::mean(stack)?;
        let n = stack.len() as f64;
        let mut variance = Self::filled(mean.rows, mean.cols, 0.0);
        for matrix in stack {
            for ((acc, v), m) in variance.data.iter_mut().zip(&matrix.data).zip(&mean.data) {
                *acc += (v - m).powi(2);
            }
        }
        Ok(variance.map(|v| (v / n).sqrt()))
    }

    fn check_stack(stack: &[Self]) -> Result<&Self> {
        let first = stack.first().ok_or_else(|| {
            Error::InvalidInput("cannot aggregate an empty set of matrices".to_string())
        })?;
        for matrix in &stack[1..] {
            first.ensure_same_shape(matrix)?;
        }
        Ok(first)
    }

    fn ensure_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::InvalidInput(format!(
                "shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for CriterionMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for CriterionMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        &mut self.data[row * self.cols + col]
    }
}

/// Unset cells compare equal to each other.
impl PartialEq for CriterionMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

/// Boxed grid with a `###` corner and 1-based row/column labels.
impl fmt::Display for CriterionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = std::iter::once("###".to_string())
            .chain((1..=self.cols).map(|c| c.to_string()))
            .collect();
        let body: Vec<Vec<String>> = (0..self.rows)
            .map(|r| {
                std::iter::once((r + 1).to_string())
                    .chain(self.row(r).iter().map(|&v| format_cell(v)))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|c| {
                body.iter()
                    .map(|row| row[c].chars().count())
                    .chain(std::iter::once(header[c].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let rule = |left: &str, fill: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| fill.repeat(w + 2)).collect();
            format!("{left}{}{right}", segments.join(mid))
        };
        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i == 0 {
                        format!(" {cell:<w$} ")
                    } else {
                        format!(" {cell:>w$} ")
                    }
                })
                .collect();
            format!("│{}│", padded.join("│"))
        };

        writeln!(f, "{}", rule("╒", "═", "╤", "╕"))?;
        writeln!(f, "{}", line(&header))?;
        writeln!(f, "{}", rule("╞", "═", "╪", "╡"))?;
        for (i, row) in body.iter().enumerate() {
            writeln!(f, "{}", line(row))?;
            if i + 1 < body.len() {
                writeln!(f, "{}", rule("├", "─", "┼", "┤"))?;
            }
        }
        write!(f, "{}", rule("╘", "═", "╧", "╛"))
    }
}
