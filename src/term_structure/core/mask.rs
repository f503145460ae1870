//! Masked parameter matrices.
//!
//! Purpose
//! -------
//! Represent each coefficient matrix of an affine model as a grid of cells
//! that are either estimated (`Free`) or held at a constant (`Fixed`). The
//! free cells, visited row-major, are the coordinates of the optimizer's
//! parameter vector.
//!
//! Key behaviors
//! -------------
//! - [`ParameterMatrix::new`] starts every cell fixed at a fill value; the
//!   `mark_*` helpers then free whole matrices, regions, or single cells.
//! - [`ParameterMatrix::apply_mask`] accepts a boolean grid (`true` = free)
//!   for callers coming from masked-array style configurations.
//! - [`ParameterMatrix::resolve_into`] writes fixed constants and a slice of
//!   proposed values into a dense complex matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - A free cell has no stored value; whatever was there before it was freed
//!   is discarded, so nothing downstream can depend on it.
//! - Every index-taking method validates bounds and reports
//!   [`AffineError::ShapeMismatch`] instead of panicking.
//!
//! Conventions
//! -----------
//! - Indices are `(row, col)`, 0-based.
//! - Traversal order is row-major (C order) within a matrix.
use crate::term_structure::{
    core::params::MatrixName,
    errors::{AffineError, AffineResult},
};
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A single matrix entry: estimated or held fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Free,
    Fixed(Complex64),
}

impl Cell {
    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }
}

/// Region selector for [`ParameterMatrix::mark_region_free`].
///
/// `LowerTriangular` includes the diagonal, matching `np.tri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    All,
    LowerTriangular,
    StrictlyLowerTriangular,
    Diagonal,
    Row(usize),
    Column(usize),
    Cells(Vec<(usize, usize)>),
}

/// A named coefficient matrix whose cells are tagged free or fixed.
///
/// Fields
/// ------
/// - `name`: [`MatrixName`]
///   Which model matrix this is; fixes its position in the canonical order.
/// - `cells`: `Array2<Cell>`
///   Cell tags in the matrix's own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMatrix {
    name: MatrixName,
    cells: Array2<Cell>,
}

impl ParameterMatrix {
    /// Matrix of shape `(rows, cols)` with every cell fixed at `fill`.
    pub fn new(name: MatrixName, rows: usize, cols: usize, fill: Complex64) -> Self {
        Self { name, cells: Array2::from_elem((rows, cols), Cell::Fixed(fill)) }
    }

    /// Matrix of shape `(rows, cols)` with every cell fixed at zero.
    pub fn zeros(name: MatrixName, rows: usize, cols: usize) -> Self {
        Self::new(name, rows, cols, Complex64::new(0.0, 0.0))
    }

    /// All-fixed matrix holding the given real values.
    pub fn from_real(name: MatrixName, values: ArrayView2<'_, f64>) -> Self {
        Self { name, cells: values.mapv(|v| Cell::Fixed(Complex64::new(v, 0.0))) }
    }

    /// All-fixed matrix holding the given complex values.
    pub fn from_complex(name: MatrixName, values: ArrayView2<'_, Complex64>) -> Self {
        Self { name, cells: values.mapv(Cell::Fixed) }
    }

    pub fn name(&self) -> MatrixName {
        self.name
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    /// Cell at `(i, j)`, or `None` when out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<Cell> {
        self.cells.get((i, j)).copied()
    }

    /// Number of free cells.
    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_free()).count()
    }

    /// Row-major `(i, j)` coordinates of the free cells.
    pub fn free_positions(&self) -> Vec<(usize, usize)> {
        self.cells
            .indexed_iter()
            .filter(|(_, c)| c.is_free())
            .map(|(ij, _)| ij)
            .collect()
    }

    pub fn mark_all_free(&mut self) {
        self.cells.fill(Cell::Free);
    }

    pub fn mark_all_fixed(&mut self, value: Complex64) {
        self.cells.fill(Cell::Fixed(value));
    }

    /// Free every cell in `region`.
    ///
    /// # Errors
    /// - `ShapeMismatch` when a `Row`, `Column`, or `Cells` index lies
    ///   outside the matrix. No cell is modified in that case.
    pub fn mark_region_free(&mut self, region: Region) -> AffineResult<()> {
        match region {
            Region::All => self.mark_all_free(),
            Region::LowerTriangular => self.free_where(|i, j| j <= i),
            Region::StrictlyLowerTriangular => self.free_where(|i, j| j < i),
            Region::Diagonal => self.free_where(|i, j| i == j),
            Region::Row(r) => {
                self.check_index(r, 0)?;
                self.free_where(|i, _| i == r);
            }
            Region::Column(c) => {
                self.check_index(0, c)?;
                self.free_where(|_, j| j == c);
            }
            Region::Cells(list) => {
                for &(i, j) in &list {
                    self.check_index(i, j)?;
                }
                for (i, j) in list {
                    self.cells[(i, j)] = Cell::Free;
                }
            }
        }
        Ok(())
    }

    /// Free the single cell `(i, j)`.
    pub fn mark_free(&mut self, i: usize, j: usize) -> AffineResult<()> {
        self.check_index(i, j)?;
        self.cells[(i, j)] = Cell::Free;
        Ok(())
    }

    /// Fix cell `(i, j)` at `value`, overwriting a previous constant or
    /// un-freeing the cell.
    pub fn set_fixed(&mut self, i: usize, j: usize, value: Complex64) -> AffineResult<()> {
        self.check_index(i, j)?;
        self.cells[(i, j)] = Cell::Fixed(value);
        Ok(())
    }

    /// Apply a boolean mask (`true` = free). Cells marked `false` keep their
    /// current tag.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `mask.dim() != self.shape()`.
    pub fn apply_mask(&mut self, mask: &Array2<bool>) -> AffineResult<()> {
        if mask.dim() != self.shape() {
            return Err(AffineError::ShapeMismatch {
                context: format!("mask for `{}`", self.name),
                expected: self.shape(),
                found: mask.dim(),
            });
        }
        ndarray::Zip::from(&mut self.cells).and(mask).for_each(|cell, &free| {
            if free {
                *cell = Cell::Free;
            }
        });
        Ok(())
    }

    /// Write this matrix into `out`, taking free-cell values from the front of
    /// `values` in row-major order. Returns the unconsumed tail.
    ///
    /// The caller guarantees `values` holds at least [`free_count`] entries
    /// and that `out` has this matrix's shape.
    ///
    /// [`free_count`]: ParameterMatrix::free_count
    pub(crate) fn resolve_into<'v>(
        &self, values: &'v [f64], out: &mut Array2<Complex64>,
    ) -> &'v [f64] {
        let mut rest = values;
        for (ij, cell) in self.cells.indexed_iter() {
            out[ij] = match *cell {
                Cell::Fixed(v) => v,
                Cell::Free => {
                    let (head, tail) = rest.split_at(1);
                    rest = tail;
                    Complex64::new(head[0], 0.0)
                }
            };
        }
        rest
    }

    // ---- Helper Methods ----

    fn free_where(&mut self, pred: impl Fn(usize, usize) -> bool) {
        for ((i, j), cell) in self.cells.indexed_iter_mut() {
            if pred(i, j) {
                *cell = Cell::Free;
            }
        }
    }

    fn check_index(&self, i: usize, j: usize) -> AffineResult<()> {
        let (rows, cols) = self.shape();
        if i >= rows || j >= cols {
            return Err(AffineError::ShapeMismatch {
                context: format!("cell ({i}, {j}) of `{}`", self.name),
                expected: (rows, cols),
                found: (i + 1, j + 1),
            });
        }
        Ok(())
    }
}
