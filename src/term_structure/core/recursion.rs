//! Affine bond-pricing recursion for yield loadings.
//!
//! For a short rate `r_t = δ0 + δ1'X_t`, state dynamics
//! `X_{t+1} = μ + Φ X_t + Σ ε_{t+1}`, and market prices of risk
//! `λ_t = λ0 + λ1 X_t`, log bond prices are affine, `p_n = a_n + b_n'X`, with
//!
//! ```text
//! a_1 = -δ0,                b_1 = -δ1
//! a_{n+1} = a_n + b_n'(μ - Σλ0) + ½ b_n'ΣΣ'b_n - δ0
//! b_{n+1} = (Φ - Σλ1)' b_n - δ1
//! ```
//!
//! and yields `y_n = A_n + B_n'X` with `A_n = -a_n/n`, `B_n = -b_n/n`.
//!
//! The recursion runs in `Complex64`; transposes are plain (not conjugate)
//! and inner products are unconjugated sums, so a purely real input gives a
//! purely real output. [`AffineLoadings::realize`] is the single exit point
//! back to `f64`.
use crate::term_structure::{
    core::params::{ResolvedParams, realize_array},
    errors::EvalFailure,
};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Per-maturity yield intercepts `A` (length m) and loadings `B` (m×k).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineLoadings<T> {
    pub a: Array1<T>,
    pub b: Array2<T>,
}

impl AffineLoadings<Complex64> {
    /// Real loadings, or `ComplexResidual` naming `A` or `B`.
    pub fn realize(&self, tol: f64) -> Result<AffineLoadings<f64>, EvalFailure> {
        Ok(AffineLoadings { a: realize_array("A", &self.a, tol)?, b: realize_array("B", &self.b, tol)? })
    }
}

/// Compute `(A_n, B_n)` for each maturity in `maturities`, in that order.
///
/// The recursion is iterated once up to the largest maturity. Maturities
/// must be positive (guaranteed by `ModelSpecification::new`).
pub fn affine_loadings(
    p: &ResolvedParams<Complex64>, maturities: &[usize],
) -> AffineLoadings<Complex64> {
    let k = p.phi.nrows();
    let m = maturities.len();
    let max_n = maturities.iter().copied().max().unwrap_or(0);

    let delta_0 = p.delta_0[(0, 0)];
    let delta_1 = p.delta_1.column(0).to_owned();
    let drift_q = (&p.mu - &p.sigma.dot(&p.lam_0)).column(0).to_owned();
    let phi_q_t = (&p.phi - &p.sigma.dot(&p.lam_1)).t().to_owned();
    let sst = p.sigma.dot(&p.sigma.t());
    let half = Complex64::new(0.5, 0.0);

    // Row `n - 1` holds (a_n, b_n).
    let mut a_path = Array1::<Complex64>::zeros(max_n);
    let mut b_path = Array2::<Complex64>::zeros((max_n, k));
    let mut a = -delta_0;
    let mut b = -&delta_1;
    for n in 1..=max_n {
        a_path[n - 1] = a;
        b_path.row_mut(n - 1).assign(&b);
        if n == max_n {
            break;
        }
        let a_next = a + b.dot(&drift_q) + half * b.dot(&sst.dot(&b)) - delta_0;
        let b_next = phi_q_t.dot(&b) - &delta_1;
        a = a_next;
        b = b_next;
    }

    let mut out = AffineLoadings {
        a: Array1::zeros(m),
        b: Array2::zeros((m, k)),
    };
    for (i, &n) in maturities.iter().enumerate() {
        let scale = Complex64::new(-1.0 / n as f64, 0.0);
        out.a[i] = a_path[n - 1] * scale;
        out.b.row_mut(i).assign(&b_path.row(n - 1).mapv(|z| z * scale));
    }
    out
}
