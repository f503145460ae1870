//! Yield-curve data containers.
//!
//! Purpose
//! -------
//! Provide a validated panel of yields (one row per date, one column per
//! maturity) plus optional observed factors, so that the Kalman filter can
//! assume clean, complete input.
//!
//! Key behaviors
//! -------------
//! - [`YieldPanel::new`] enforces shape, finiteness, and date-order
//!   invariants once at the boundary.
//! - [`YieldPanel::observation`] yields a borrowed [`YieldObservation`] view
//!   of a single date.
//! - [`YieldPanel::observation_vector`] stacks yields and factors into the
//!   measurement vector used by the filter.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least one row; `yields.ncols() == maturities.len()`.
//! - Every yield and factor value is finite (missing rows are dropped by the
//!   loader before construction).
//! - When present, dates are strictly increasing and one per row, and the
//!   factor matrix has one row per date.
//!
//! Conventions
//! -----------
//! - Rows are time `t = 0..T-1`; columns follow the order of `maturities`.
//! - Maturities are in data periods; the panel does not interpret units.
use crate::term_structure::errors::{AffineError, AffineResult};
use chrono::NaiveDate;
use nalgebra::DVector;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Validated yield panel with optional observed factors.
///
/// Fields
/// ------
/// - `dates`: `Option<Vec<NaiveDate>>`
///   One date per row when available (synthetic panels may omit them).
/// - `maturities`: `Vec<usize>`
///   Maturity of each yield column.
/// - `yields`: `Array2<f64>` (T×m)
/// - `factors`: `Option<Array2<f64>>` (T×n_obs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPanel {
    dates: Option<Vec<NaiveDate>>,
    maturities: Vec<usize>,
    yields: Array2<f64>,
    factors: Option<Array2<f64>>,
}

/// Borrowed view of one date's observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldObservation<'a> {
    pub date: Option<NaiveDate>,
    pub maturities: &'a [usize],
    pub yields: ArrayView1<'a, f64>,
    pub factors: Option<ArrayView1<'a, f64>>,
}

impl YieldPanel {
    /// Build a validated panel.
    ///
    /// Errors
    /// ------
    /// - `AffineError::EmptyPanel` if `yields` has no rows.
    /// - `AffineError::ShapeMismatch` if the yield columns, factor rows, or
    ///   date count disagree with the panel shape.
    /// - `AffineError::NonFiniteData` for the first NaN/±inf encountered
    ///   (yields first, then factors with column offset `m`).
    /// - `AffineError::UnsortedDates` if dates are not strictly increasing.
    pub fn new(
        dates: Option<Vec<NaiveDate>>, maturities: Vec<usize>, yields: Array2<f64>,
        factors: Option<Array2<f64>>,
    ) -> AffineResult<Self> {
        let (t, m) = yields.dim();
        if t == 0 {
            return Err(AffineError::EmptyPanel);
        }
        if m != maturities.len() {
            return Err(AffineError::ShapeMismatch {
                context: "yield columns".to_string(),
                expected: (t, maturities.len()),
                found: (t, m),
            });
        }
        if let Some(f) = &factors {
            if f.nrows() != t {
                return Err(AffineError::ShapeMismatch {
                    context: "factor rows".to_string(),
                    expected: (t, f.ncols()),
                    found: f.dim(),
                });
            }
        }
        if let Some(d) = &dates {
            if d.len() != t {
                return Err(AffineError::ShapeMismatch {
                    context: "dates".to_string(),
                    expected: (t, 1),
                    found: (d.len(), 1),
                });
            }
            if let Some(index) = d.windows(2).position(|w| w[1] <= w[0]) {
                return Err(AffineError::UnsortedDates { index: index + 1 });
            }
        }

        for ((row, col), &value) in yields.indexed_iter() {
            if !value.is_finite() {
                return Err(AffineError::NonFiniteData { row, col, value });
            }
        }
        if let Some(f) = &factors {
            for ((row, col), &value) in f.indexed_iter() {
                if !value.is_finite() {
                    return Err(AffineError::NonFiniteData { row, col: m + col, value });
                }
            }
        }

        Ok(Self { dates, maturities, yields, factors })
    }

    /// Number of dates `T`.
    pub fn len(&self) -> usize {
        self.yields.nrows()
    }

    /// Always `false` for a constructed panel; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.yields.nrows() == 0
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn maturities(&self) -> &[usize] {
        &self.maturities
    }

    pub fn yields(&self) -> &Array2<f64> {
        &self.yields
    }

    pub fn factors(&self) -> Option<&Array2<f64>> {
        self.factors.as_ref()
    }

    /// Observation at row `t`, or `None` past the end.
    pub fn observation(&self, t: usize) -> Option<YieldObservation<'_>> {
        if t >= self.len() {
            return None;
        }
        Some(YieldObservation {
            date: self.dates.as_ref().map(|d| d[t]),
            maturities: &self.maturities,
            yields: self.yields.row(t),
            factors: self.factors.as_ref().map(|f| f.row(t)),
        })
    }

    /// Measurement vector `[yields_t; factors_t]`, taking the first
    /// `n_observed` factor columns.
    ///
    /// The caller guarantees `t < len()` and that at least `n_observed`
    /// factor columns exist (see `ModelSpecification::check_panel`).
    pub(crate) fn observation_vector(&self, t: usize, n_observed: usize) -> DVector<f64> {
        let yields = self.yields.row(t);
        let m = yields.len();
        DVector::from_fn(m + n_observed, |i, _| match (&self.factors, i < m) {
            (_, true) => yields[i],
            (Some(f), false) => f[(t, i - m)],
            (None, false) => 0.0,
        })
    }

    /// Rows `[start, end)` as a new panel.
    ///
    /// # Errors
    /// - `EmptyPanel` if the range selects no rows.
    pub fn slice(&self, start: usize, end: usize) -> AffineResult<Self> {
        let end = end.min(self.len());
        if start >= end {
            return Err(AffineError::EmptyPanel);
        }
        Ok(Self {
            dates: self.dates.as_ref().map(|d| d[start..end].to_vec()),
            maturities: self.maturities.clone(),
            yields: self.yields.slice(ndarray::s![start..end, ..]).to_owned(),
            factors: self.factors.as_ref().map(|f| f.slice(ndarray::s![start..end, ..]).to_owned()),
        })
    }
}
