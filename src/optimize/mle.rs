//! optimize::mle — L-BFGS maximization of user-supplied objectives.
//!
//! Purpose
//! -------
//! Provide the single optimization entry point the estimator training loop
//! uses: maximize a log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)` with `argmin`'s L-BFGS, wrapped so that neither the
//! ensemble layer nor user models ever touch `argmin` generics directly.
//!
//! Key behaviors
//! -------------
//! - Objectives implement [`LogLikelihood`]; analytic gradients are
//!   optional. When absent, a central-difference gradient of the cost is
//!   computed, falling back to forward differences if a cost evaluation
//!   fails or the central gradient is invalid.
//! - Line search is selectable ([`LineSearcher::MoreThuente`] or
//!   [`LineSearcher::HagerZhang`]); tolerances and iteration caps come from
//!   validated [`Tolerances`].
//! - Results are normalized into [`OptimOutcome`]: best parameters, best
//!   log-likelihood (sign restored), convergence flag, status string, and
//!   the last gradient norm if available.
//!
//! Conventions
//! -----------
//! - User gradients are gradients of `ℓ(θ)`; the adapter flips the sign.
//! - `Theta`, `Grad`, and `Cost` alias the `ndarray`/`f64` shapes used
//!   everywhere in this crate.
//!
//! Downstream usage
//! ----------------
//! - `ensemble::Ensemble::fit` maximizes each member's training
//!   log-likelihood through [`maximize`], warm-starting from the member's
//!   current parameters.
//!
//! Testing notes
//! -------------
//! - Unit tests solve a concave quadratic with and without an analytic
//!   gradient, and pin option/tolerance validation errors.

use std::cell::RefCell;
use std::str::FromStr;

use crate::optimize::errors::{OptError, OptResult};
use argmin::core::{CostFunction, Error, Executor, Gradient, State, TerminationStatus};
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use argmin_math::ArgminL2Norm;
use finitediff::FiniteDiff;
use ndarray::Array1;

/// Parameter vector `θ` for log-likelihood optimization.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)` for optimization.
pub type Grad = Array1<f64>;

/// Scalar objective value; in this crate the cost `c(θ) = -ℓ(θ)`.
pub type Cost = f64;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return [`OptError::InvalidLineSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol(tol_grad, true)?;
        verify_tol(tol_cost, false)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

fn verify_tol(tol: Option<f64>, is_grad: bool) -> OptResult<()> {
    if let Some(tol) = tol {
        let reason = if !tol.is_finite() {
            Some("Tolerance must be finite.")
        } else if tol <= 0.0 {
            Some("Tolerance must be positive.")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(if is_grad {
                OptError::InvalidTolGrad { tol, reason }
            } else {
                OptError::InvalidTolCost { tol, reason }
            });
        }
    }
    Ok(())
}

/// Optimizer-level configuration.
///
/// Default: `tol_grad = 1e-6`, `max_iter = 300`, More–Thuente line search,
/// no verbosity, default L-BFGS memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric validation of the tolerances is performed inside
    /// [`Tolerances::new`]; here only the L-BFGS memory is checked.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Canonical result returned by [`maximize`].
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ̂)` (not the cost).
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - [`OptError::MissingThetaHat`] if the solver produced no parameters.
    /// - [`OptError::InvalidThetaHat`] / [`OptError::NonFiniteCost`] for
    ///   non-finite estimates or values.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, converged: TerminationStatus, iterations: u64,
        grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = theta_hat_opt.ok_or(OptError::MissingThetaHat)?;
        for (index, &v) in theta_hat.iter().enumerate() {
            if !v.is_finite() {
                return Err(OptError::InvalidThetaHat {
                    index,
                    value: v,
                    reason: "Parameter estimates must be finite.",
                });
            }
        }
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        let status: String;
        let converged = match converged {
            TerminationStatus::NotTerminated => {
                status = "Not terminated".to_string();
                false
            }
            _ => {
                status = format!("{converged:?}");
                true
            }
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations: iterations as usize, grad_norm })
    }
}

fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Bridges a user [`LogLikelihood`] to `argmin`'s `CostFunction` and
/// `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)` (negative log-likelihood).
/// - `Gradient::gradient` returns `-∇ℓ(θ)` when the user provides an
///   analytic gradient, or a finite-difference gradient of the cost (no
///   sign flip needed in that branch).
#[derive(Debug, Clone)]
struct NllAdapter<'a, F: LogLikelihood> {
    f: &'a F,
    data: &'a F::Data,
}

impl<'a, F: LogLikelihood> CostFunction for NllAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for NllAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// If the user implements `grad`, validate it and return `-grad`.
    /// Otherwise finite-difference the cost: central differences first,
    /// falling back to forward differences when a cost evaluation inside
    /// the stencil failed or the central gradient does not validate. The FD
    /// closure cannot return `Result`, so the first error it hits is parked
    /// in `closure_err` and resurfaced afterwards.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                closure_err.replace(None);
                let fd_grad = theta.forward_diff(&cost_func);
                if let Some(err) = closure_err.take() {
                    return Err(err);
                }
                validate_grad(&fd_grad, dim)?;
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Maximize a log-likelihood `ℓ(θ)` using L-BFGS with the chosen line
/// search.
///
/// Validates the initial guess via `f.check`, wraps `(f, data)` in an
/// adapter exposing the minimization problem `c(θ) = -ℓ(θ)`, and runs the
/// configured solver.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates solver configuration and runtime errors (line-search
///   failures, non-finite costs) via `From<argmin::core::Error>`.
/// - Propagates [`OptimOutcome`] validation errors.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = NllAdapter { f, data };
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let mut solver = LBFGS::new(MoreThuenteLS::new(), mem);
            if let Some(g) = opts.tols.tol_grad {
                solver = solver.with_tolerance_grad(g)?;
            }
            if let Some(c) = opts.tols.tol_cost {
                solver = solver.with_tolerance_cost(c)?;
            }
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let mut solver = LBFGS::new(HagerZhangLS::new(), mem);
            if let Some(g) = opts.tols.tol_grad {
                solver = solver.with_tolerance_grad(g)?;
            }
            if let Some(c) = opts.tols.tol_cost {
                solver = solver.with_tolerance_cost(c)?;
            }
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

/// Shared runner: configure the executor, run the solver, and convert the
/// final state into an [`OptimOutcome`] (restoring the log-likelihood
/// sign).
fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: NllAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<
            NllAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    #[cfg(not(feature = "obs_slog"))]
    let _ = opts.verbose;
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        grad,
    )
}
