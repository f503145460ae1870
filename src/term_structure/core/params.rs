//! Named parameter matrices and the flat parameter-vector mapping.
//!
//! Purpose
//! -------
//! Group the eight coefficient matrices of an affine term-structure model,
//! define their canonical order, and translate between the optimizer's flat
//! vector of free values and dense matrices.
//!
//! Key behaviors
//! -------------
//! - [`MatrixName`] enumerates the matrices in canonical order and knows each
//!   one's shape for a model with `k` factors and `m` maturities.
//! - [`ParameterSet::resolve`] unflattens a proposal into
//!   [`ResolvedParams<Complex64>`]; [`ParameterSet::flatten`] is its inverse
//!   on real resolved parameters.
//! - [`ResolvedParams::realize`] drops the imaginary parts after checking they
//!   are within tolerance.
//!
//! Invariants & assumptions
//! ------------------------
//! - Canonical order is `lam_0, lam_1, delta_0, delta_1, mu, phi, sigma,
//!   obs_sd`; within each matrix, free cells are visited row-major.
//! - `flatten(resolve(θ).realize(tol)?) == θ` for every θ of the right
//!   length, since free cells are always filled with real values.
//!
//! Conventions
//! -----------
//! - `k = n_observed + n_latent` is the state dimension, `m` the number of
//!   maturities.
//! - Shapes: `lam_0`, `delta_1`, `mu` are `k×1`; `lam_1`, `phi`, `sigma` are
//!   `k×k`; `delta_0` is `1×1`; `obs_sd` is `m×1`.
use crate::term_structure::{
    core::mask::ParameterMatrix,
    errors::{AffineError, AffineResult, EvalFailure},
};
use ndarray::{Array, Array1, Array2, Dimension};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of one model coefficient matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatrixName {
    /// Market price of risk intercept `λ0`.
    #[serde(rename = "lam_0")]
    Lam0,
    /// Market price of risk slope `λ1`.
    #[serde(rename = "lam_1")]
    Lam1,
    /// Short-rate intercept `δ0`.
    #[serde(rename = "delta_0")]
    Delta0,
    /// Short-rate factor loading `δ1`.
    #[serde(rename = "delta_1")]
    Delta1,
    /// Factor drift `μ`.
    #[serde(rename = "mu")]
    Mu,
    /// Factor transition `Φ`.
    #[serde(rename = "phi")]
    Phi,
    /// Factor innovation loading `Σ`.
    #[serde(rename = "sigma")]
    Sigma,
    /// Measurement-error standard deviation per maturity.
    #[serde(rename = "obs_sd")]
    ObsSd,
}

impl MatrixName {
    /// Canonical traversal order.
    pub const ALL: [MatrixName; 8] = [
        MatrixName::Lam0,
        MatrixName::Lam1,
        MatrixName::Delta0,
        MatrixName::Delta1,
        MatrixName::Mu,
        MatrixName::Phi,
        MatrixName::Sigma,
        MatrixName::ObsSd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixName::Lam0 => "lam_0",
            MatrixName::Lam1 => "lam_1",
            MatrixName::Delta0 => "delta_0",
            MatrixName::Delta1 => "delta_1",
            MatrixName::Mu => "mu",
            MatrixName::Phi => "phi",
            MatrixName::Sigma => "sigma",
            MatrixName::ObsSd => "obs_sd",
        }
    }

    /// Required shape for `k` factors and `m` maturities.
    pub fn shape(&self, k: usize, m: usize) -> (usize, usize) {
        match self {
            MatrixName::Lam0 | MatrixName::Delta1 | MatrixName::Mu => (k, 1),
            MatrixName::Lam1 | MatrixName::Phi | MatrixName::Sigma => (k, k),
            MatrixName::Delta0 => (1, 1),
            MatrixName::ObsSd => (m, 1),
        }
    }
}

impl std::fmt::Display for MatrixName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatrixName {
    type Err = AffineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatrixName::ALL.into_iter().find(|name| name.as_str() == s).ok_or_else(|| {
            AffineError::InvalidSpecification {
                reason: format!(
                    "unknown matrix name '{s}'; expected one of lam_0, lam_1, delta_0, delta_1, \
                     mu, phi, sigma, obs_sd"
                ),
            }
        })
    }
}

/// Position of one free parameter: which matrix and which cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCell {
    pub matrix: MatrixName,
    pub row: usize,
    pub col: usize,
}

impl std::fmt::Display for FreeCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{},{}]", self.matrix, self.row, self.col)
    }
}

/// The eight masked matrices of an affine model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    lam_0: ParameterMatrix,
    lam_1: ParameterMatrix,
    delta_0: ParameterMatrix,
    delta_1: ParameterMatrix,
    mu: ParameterMatrix,
    phi: ParameterMatrix,
    sigma: ParameterMatrix,
    obs_sd: ParameterMatrix,
}

impl ParameterSet {
    /// All-fixed zero matrices shaped for `k` factors and `m` maturities.
    pub fn zeros(k: usize, m: usize) -> Self {
        let z = |name: MatrixName| {
            let (r, c) = name.shape(k, m);
            ParameterMatrix::zeros(name, r, c)
        };
        Self {
            lam_0: z(MatrixName::Lam0),
            lam_1: z(MatrixName::Lam1),
            delta_0: z(MatrixName::Delta0),
            delta_1: z(MatrixName::Delta1),
            mu: z(MatrixName::Mu),
            phi: z(MatrixName::Phi),
            sigma: z(MatrixName::Sigma),
            obs_sd: z(MatrixName::ObsSd),
        }
    }

    pub fn get(&self, name: MatrixName) -> &ParameterMatrix {
        match name {
            MatrixName::Lam0 => &self.lam_0,
            MatrixName::Lam1 => &self.lam_1,
            MatrixName::Delta0 => &self.delta_0,
            MatrixName::Delta1 => &self.delta_1,
            MatrixName::Mu => &self.mu,
            MatrixName::Phi => &self.phi,
            MatrixName::Sigma => &self.sigma,
            MatrixName::ObsSd => &self.obs_sd,
        }
    }

    pub fn get_mut(&mut self, name: MatrixName) -> &mut ParameterMatrix {
        match name {
            MatrixName::Lam0 => &mut self.lam_0,
            MatrixName::Lam1 => &mut self.lam_1,
            MatrixName::Delta0 => &mut self.delta_0,
            MatrixName::Delta1 => &mut self.delta_1,
            MatrixName::Mu => &mut self.mu,
            MatrixName::Phi => &mut self.phi,
            MatrixName::Sigma => &mut self.sigma,
            MatrixName::ObsSd => &mut self.obs_sd,
        }
    }

    /// Replace the matrix with the same name as `matrix`.
    ///
    /// Shapes are not checked here; `ModelSpecification::new` validates them
    /// against the factor and maturity counts.
    pub fn set(&mut self, matrix: ParameterMatrix) {
        let name = matrix.name();
        *self.get_mut(name) = matrix;
    }

    /// Matrices in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterMatrix> + '_ {
        MatrixName::ALL.into_iter().map(move |name| self.get(name))
    }

    /// Total number of free cells, i.e. the length of a parameter vector.
    pub fn free_count(&self) -> usize {
        self.iter().map(ParameterMatrix::free_count).sum()
    }

    /// Free cells in canonical traversal order.
    pub fn free_cells(&self) -> Vec<FreeCell> {
        self.iter()
            .flat_map(|m| {
                let matrix = m.name();
                m.free_positions().into_iter().map(move |(row, col)| FreeCell { matrix, row, col })
            })
            .collect()
    }

    /// Unflatten `theta` into dense complex matrices.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `theta.len() != self.free_count()`.
    pub fn resolve(&self, theta: &[f64]) -> AffineResult<ResolvedParams<Complex64>> {
        let expected = self.free_count();
        if theta.len() != expected {
            return Err(AffineError::ShapeMismatch {
                context: "parameter vector".to_string(),
                expected: (expected, 1),
                found: (theta.len(), 1),
            });
        }
        let mut rest = theta;
        let mut take = |m: &ParameterMatrix| {
            let mut out = Array2::zeros(m.shape());
            rest = m.resolve_into(rest, &mut out);
            out
        };
        Ok(ResolvedParams {
            lam_0: take(&self.lam_0),
            lam_1: take(&self.lam_1),
            delta_0: take(&self.delta_0),
            delta_1: take(&self.delta_1),
            mu: take(&self.mu),
            phi: take(&self.phi),
            sigma: take(&self.sigma),
            obs_sd: take(&self.obs_sd),
        })
    }

    /// Read the free-cell values out of resolved matrices, in canonical order.
    pub fn flatten(&self, resolved: &ResolvedParams<f64>) -> Array1<f64> {
        self.free_cells()
            .into_iter()
            .map(|cell| resolved.get(cell.matrix)[(cell.row, cell.col)])
            .collect()
    }
}

/// Dense parameter matrices with every cell filled in.
///
/// `T = Complex64` inside the loading recursion, `T = f64` once realised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParams<T> {
    pub lam_0: Array2<T>,
    pub lam_1: Array2<T>,
    pub delta_0: Array2<T>,
    pub delta_1: Array2<T>,
    pub mu: Array2<T>,
    pub phi: Array2<T>,
    pub sigma: Array2<T>,
    pub obs_sd: Array2<T>,
}

impl<T> ResolvedParams<T> {
    pub fn get(&self, name: MatrixName) -> &Array2<T> {
        match name {
            MatrixName::Lam0 => &self.lam_0,
            MatrixName::Lam1 => &self.lam_1,
            MatrixName::Delta0 => &self.delta_0,
            MatrixName::Delta1 => &self.delta_1,
            MatrixName::Mu => &self.mu,
            MatrixName::Phi => &self.phi,
            MatrixName::Sigma => &self.sigma,
            MatrixName::ObsSd => &self.obs_sd,
        }
    }
}

impl ResolvedParams<Complex64> {
    /// Drop imaginary parts, failing on the first matrix whose largest
    /// `|Im|` exceeds `tol`.
    pub fn realize(&self, tol: f64) -> Result<ResolvedParams<f64>, EvalFailure> {
        Ok(ResolvedParams {
            lam_0: realize_array(MatrixName::Lam0.as_str(), &self.lam_0, tol)?,
            lam_1: realize_array(MatrixName::Lam1.as_str(), &self.lam_1, tol)?,
            delta_0: realize_array(MatrixName::Delta0.as_str(), &self.delta_0, tol)?,
            delta_1: realize_array(MatrixName::Delta1.as_str(), &self.delta_1, tol)?,
            mu: realize_array(MatrixName::Mu.as_str(), &self.mu, tol)?,
            phi: realize_array(MatrixName::Phi.as_str(), &self.phi, tol)?,
            sigma: realize_array(MatrixName::Sigma.as_str(), &self.sigma, tol)?,
            obs_sd: realize_array(MatrixName::ObsSd.as_str(), &self.obs_sd, tol)?,
        })
    }
}

/// Real part of `values` if every `|Im|` is at most `tol`.
///
/// NaN imaginary parts fail the check.
pub(crate) fn realize_array<D: Dimension>(
    label: &str, values: &Array<Complex64, D>, tol: f64,
) -> Result<Array<f64, D>, EvalFailure> {
    for z in values.iter() {
        let imag = z.im.abs();
        if !(imag <= tol) {
            return Err(EvalFailure::ComplexResidual { matrix: label.to_string(), imag, tol });
        }
    }
    Ok(values.mapv(|z| z.re))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::core::mask::Region;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Canonical ordering of free cells across matrices.
    // - The flatten/unflatten round trip, including free cells scattered
    //   over every matrix.
    // - Length checking in `resolve`.
    // - Rejection of residual imaginary parts in `realize`.
    // - Name parsing.
    // -------------------------------------------------------------------------

    fn two_factor_set() -> ParameterSet {
        let mut set = ParameterSet::zeros(2, 3);
        set.get_mut(MatrixName::Phi)
            .mark_region_free(Region::LowerTriangular)
            .expect("in range");
        set.get_mut(MatrixName::Lam0).mark_all_free();
        set.get_mut(MatrixName::Delta0).mark_all_free();
        set
    }

    #[test]
    // Purpose
    // -------
    // Verify free cells are listed matrix-by-matrix in canonical order and
    // row-major within each matrix.
    //
    // Given
    // -----
    // - `phi` lower-triangular free, `lam_0` and `delta_0` all free.
    //
    // Expect
    // ------
    // - Order: lam_0[0,0], lam_0[1,0], delta_0[0,0], phi[0,0], phi[1,0],
    //   phi[1,1].
    fn free_cells_follow_canonical_order() {
        // Arrange
        let set = two_factor_set();

        // Act
        let labels: Vec<String> = set.free_cells().iter().map(ToString::to_string).collect();

        // Assert
        assert_eq!(
            labels,
            vec!["lam_0[0,0]", "lam_0[1,0]", "delta_0[0,0]", "phi[0,0]", "phi[1,0]", "phi[1,1]"]
        );
        assert_eq!(set.free_count(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure unflattening then flattening reproduces the parameter vector
    // exactly.
    //
    // Given
    // -----
    // - The two-factor set and θ = [0.1, -0.2, 0.03, 0.9, 0.05, 0.7].
    //
    // Expect
    // ------
    // - `flatten(realize(resolve(θ))) == θ`; fixed cells stay zero.
    fn resolve_then_flatten_round_trips() {
        // Arrange
        let set = two_factor_set();
        let theta = [0.1, -0.2, 0.03, 0.9, 0.05, 0.7];

        // Act
        let resolved = set.resolve(&theta).expect("length matches").realize(1e-12);
        let resolved = resolved.expect("free cells are real");
        let back = set.flatten(&resolved);

        // Assert
        assert_eq!(back.to_vec(), theta.to_vec());
        assert_eq!(resolved.phi, array![[0.9, 0.0], [0.05, 0.7]]);
        assert_eq!(resolved.mu, array![[0.0], [0.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure the i-th entry of θ lands in the i-th listed free cell when
    // every matrix has scattered free cells, and that `flatten` reads them
    // back in the same order.
    //
    // Given
    // -----
    // - k = 2, three maturities; single cells free in `lam_0`, `mu`,
    //   `sigma`, off-diagonal cells in `lam_1`, lower-triangular `phi`,
    //   all of `delta_0`/`delta_1`, and two `obs_sd` rows.
    // - θ = [1, 2, ..., 13].
    //
    // Expect
    // ------
    // - `resolved[cell_i] == θ[i]` for every listed cell.
    // - `flatten` returns θ unchanged.
    fn flatten_order_matches_resolve_across_matrices() {
        // Arrange
        let mut set = ParameterSet::zeros(2, 3);
        set.get_mut(MatrixName::Lam0).mark_free(1, 0).expect("in range");
        set.get_mut(MatrixName::Lam1).mark_free(0, 1).expect("in range");
        set.get_mut(MatrixName::Lam1).mark_free(1, 0).expect("in range");
        set.get_mut(MatrixName::Delta0).mark_all_free();
        set.get_mut(MatrixName::Delta1).mark_all_free();
        set.get_mut(MatrixName::Mu).mark_free(0, 0).expect("in range");
        set.get_mut(MatrixName::Phi)
            .mark_region_free(Region::LowerTriangular)
            .expect("square");
        set.get_mut(MatrixName::Sigma).mark_free(1, 1).expect("in range");
        set.get_mut(MatrixName::ObsSd).mark_free(0, 0).expect("in range");
        set.get_mut(MatrixName::ObsSd).mark_free(2, 0).expect("in range");
        let theta: Vec<f64> = (1..=13).map(f64::from).collect();

        // Act
        let resolved = set.resolve(&theta).expect("length matches").realize(1e-12);
        let resolved = resolved.expect("free cells are real");
        let back = set.flatten(&resolved);

        // Assert
        let cells = set.free_cells();
        assert_eq!(cells.len(), 13);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(resolved.get(cell.matrix)[(cell.row, cell.col)], theta[i], "cell {cell}");
        }
        assert_eq!(back.to_vec(), theta);
        assert_eq!(resolved.lam_1, array![[0.0, 2.0], [3.0, 0.0]]);
        assert_eq!(resolved.mu, array![[7.0], [0.0]]);
        assert_eq!(resolved.phi, array![[8.0, 0.0], [9.0, 10.0]]);
        assert_eq!(resolved.obs_sd, array![[12.0], [0.0], [13.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Check that a parameter vector of the wrong length is rejected.
    //
    // Given
    // -----
    // - Six free cells and a five-element vector.
    //
    // Expect
    // ------
    // - `ShapeMismatch` with expected (6, 1) and found (5, 1).
    fn resolve_rejects_wrong_length() {
        // Arrange
        let set = two_factor_set();

        // Act
        let err = set.resolve(&[0.0; 5]).expect_err("length differs");

        // Assert
        assert!(matches!(
            err,
            AffineError::ShapeMismatch { expected: (6, 1), found: (5, 1), .. }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify `realize` reports the first matrix with an imaginary part above
    // tolerance.
    //
    // Given
    // -----
    // - `sigma` fixed with a 1e-3 imaginary entry; tolerance 1e-8.
    //
    // Expect
    // ------
    // - `EvalFailure::ComplexResidual` naming `sigma`.
    fn realize_rejects_imaginary_residual() {
        // Arrange
        let mut set = ParameterSet::zeros(1, 1);
        set.set(ParameterMatrix::from_complex(
            MatrixName::Sigma,
            array![[Complex64::new(1.0, 1e-3)]].view(),
        ));
        let resolved = set.resolve(&[]).expect("no free cells");

        // Act
        let err = resolved.realize(1e-8).expect_err("imaginary part too large");

        // Assert
        match err {
            EvalFailure::ComplexResidual { matrix, imag, .. } => {
                assert_eq!(matrix, "sigma");
                assert!((imag - 1e-3).abs() < 1e-15);
            }
            other => panic!("unexpected failure {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Confirm names parse from their canonical strings and unknown names
    // fail.
    //
    // Given
    // -----
    // - "obs_sd" and "kappa".
    //
    // Expect
    // ------
    // - `ObsSd` and `InvalidSpecification`.
    fn matrix_name_parses_canonical_strings() {
        // Arrange / Act
        let ok = "obs_sd".parse::<MatrixName>();
        let bad = "kappa".parse::<MatrixName>();

        // Assert
        assert_eq!(ok, Ok(MatrixName::ObsSd));
        assert!(matches!(bad, Err(AffineError::InvalidSpecification { .. })));
    }
}
