//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin’s generic wiring behind small builders that apply the
//! crate-level [`MLEOptions`] (tolerances, L-BFGS memory, simplex setup) so
//! [`maximize`](super::maximize) can request a configured solver for any
//! [`Algorithm`](super::traits::Algorithm).
//!
//! Key behaviors
//! -------------
//! - L-BFGS with Hager–Zhang or More–Thuente line search
//!   ([`build_optimizer_hager_zhang`], [`build_optimizer_more_thuente`]).
//! - BFGS over any line search ([`build_bfgs`]).
//! - Nelder–Mead with an initial simplex spanned around `θ₀`
//!   ([`build_nelder_mead`]).
//!
//! Conventions
//! -----------
//! - Builders never set the initial parameter vector (except the simplex,
//!   which *is* the Nelder–Mead starting point) or `max_iters`; those are
//!   applied by the runners in [`run`](super::run).
//! - Tolerance rejections from Argmin surface as [`OptError`] through the
//!   crate’s `From<argmin::core::Error>` conversion.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::{BFGS, LBFGS};

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, NELDER_MEAD_STEP, NELDER_MEAD_ZERO_STEP, NelderMeadSolver, Theta,
        },
    },
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// Uses `opts.lbfgs_mem` (or [`DEFAULT_LBFGS_MEM`]) and the optional
/// gradient / cost tolerances.
///
/// # Errors
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// # Errors
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply optional gradient and cost tolerances to an L-BFGS solver,
/// regardless of its line-search type. Absent tolerances keep Argmin’s
/// defaults.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Construct a dense BFGS solver over `linesearch` with the configured
/// tolerances. The identity starting inverse Hessian is set by the runner.
///
/// # Errors
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_bfgs<L>(linesearch: L, opts: &MLEOptions) -> OptResult<BFGS<L, Cost>> {
    let mut solver = BFGS::new(linesearch);
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Construct a Nelder–Mead solver whose simplex is `θ₀` plus one vertex
/// per coordinate.
///
/// Vertex `i` scales coordinate `i` by `1 + NELDER_MEAD_STEP`, or sets it
/// to `NELDER_MEAD_ZERO_STEP` when it is exactly zero. `opts.tols.tol_cost`
/// becomes the simplex standard-deviation tolerance; `tol_grad` is ignored.
///
/// # Errors
/// - `OptError` when Argmin rejects the tolerance.
pub fn build_nelder_mead(theta0: &Theta, opts: &MLEOptions) -> OptResult<NelderMeadSolver> {
    let mut simplex = Vec::with_capacity(theta0.len() + 1);
    simplex.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + NELDER_MEAD_STEP)
        } else {
            NELDER_MEAD_ZERO_STEP
        };
        simplex.push(vertex);
    }
    let mut solver = NelderMeadSolver::new(simplex);
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_sd_tolerance(c)?;
    }
    Ok(solver)
}
