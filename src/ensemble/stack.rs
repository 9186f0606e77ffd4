//! ensemble::stack — training data, ensemble fitting, and stacked
//! inference.
//!
//! Purpose
//! -------
//! Hold the accumulated `(θ, t)` training pairs, fit every ensemble member
//! on them by maximum likelihood, and combine the surviving members into a
//! validation-weighted mixture for log-density evaluation and sampling.
//!
//! Key behaviors
//! -------------
//! - Each fit shuffles a train/validation split, maximizes every active
//!   member's mean training log-likelihood warm-started from its current
//!   parameters, and accepts the new parameters only when they do not
//!   worsen the member's validation loss.
//! - A member whose optimization fails is dropped from the active set and
//!   never consulted again; the failure is reported, and the fit only
//!   errors when no member survives.
//! - Stacking weights are `softmax(-validation_loss)` over active members,
//!   recomputed after every fit.
//!
//! Invariants & assumptions
//! ------------------------
//! - All members share `n_parameters`/`n_conditionals`; enforced at
//!   ensemble construction.
//! - `active` indices always point at live members; `weights` has one entry
//!   per active member and sums to one after a successful fit.
//!
//! Downstream usage
//! ----------------
//! - The engine calls [`Ensemble::fit`] once per population, uses
//!   [`Ensemble::stacked_val_loss`] for early stopping, and draws proposal
//!   parameters through [`Ensemble::sample`].
//!
//! Testing notes
//! -------------
//! - Unit tests fit a two-member ensemble on synthetic conditional-Gaussian
//!   data and pin weight normalization, failure removal, and state
//!   round-tripping.

use crate::{
    ensemble::{
        errors::{NdeError, NdeResult},
        estimator::{ConditionalDensityEstimator, EstimatorSpec},
        gaussian::build_estimator,
    },
    optimize::{
        errors::{OptError, OptResult},
        mle::{maximize, Cost, LogLikelihood, MLEOptions, Theta},
    },
    utils::{softmax, split_indices},
};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Accumulated `(θ, t)` training pairs, grown across populations.
///
/// Rows are aligned: `params.row(i)` is the parameter vector whose
/// simulation compressed to `summaries.row(i)`.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    params: Array2<f64>,
    summaries: Array2<f64>,
}

impl TrainingSet {
    /// Start an empty table with fixed widths.
    pub fn empty(n_parameters: usize, n_summaries: usize) -> Self {
        Self {
            params: Array2::zeros((0, n_parameters)),
            summaries: Array2::zeros((0, n_summaries)),
        }
    }

    /// Wrap pre-assembled tables.
    ///
    /// # Errors
    /// [`NdeError::RowCountMismatch`] when the tables disagree on rows.
    pub fn new(params: Array2<f64>, summaries: Array2<f64>) -> NdeResult<Self> {
        if params.nrows() != summaries.nrows() {
            return Err(NdeError::RowCountMismatch {
                params: params.nrows(),
                summaries: summaries.nrows(),
            });
        }
        Ok(Self { params, summaries })
    }

    /// Append one aligned `(θ, t)` pair.
    pub fn push(&mut self, theta: &ArrayView1<f64>, summary: &ArrayView1<f64>) -> NdeResult<()> {
        self.params
            .push_row(*theta)
            .map_err(|_| NdeError::RowLengthMismatch {
                expected: self.params.ncols(),
                actual: theta.len(),
            })?;
        self.summaries
            .push_row(*summary)
            .map_err(|_| NdeError::RowLengthMismatch {
                expected: self.summaries.ncols(),
                actual: summary.len(),
            })?;
        Ok(())
    }

    /// Append a whole batch of aligned rows.
    pub fn extend(&mut self, params: &Array2<f64>, summaries: &Array2<f64>) -> NdeResult<()> {
        if params.nrows() != summaries.nrows() {
            return Err(NdeError::RowCountMismatch {
                params: params.nrows(),
                summaries: summaries.nrows(),
            });
        }
        for i in 0..params.nrows() {
            self.push(&params.row(i), &summaries.row(i))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn params(&self) -> &Array2<f64> {
        &self.params
    }

    pub fn summaries(&self) -> &Array2<f64> {
        &self.summaries
    }
}

/// Per-fit configuration: validation fraction plus the optimizer options
/// forwarded to every member's L-BFGS run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub f_val: f64,
    pub mle: MLEOptions,
}

impl TrainOptions {
    /// # Errors
    /// [`NdeError::InvalidValidationFraction`] unless `0 <= f_val < 1`.
    pub fn new(f_val: f64, mle: MLEOptions) -> NdeResult<Self> {
        if !f_val.is_finite() || !(0.0..1.0).contains(&f_val) {
            return Err(NdeError::InvalidValidationFraction { value: f_val });
        }
        Ok(Self { f_val, mle })
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self { f_val: 0.1, mle: MLEOptions::default() }
    }
}

/// Outcome of one [`Ensemble::fit`] call.
///
/// `val_losses` pairs each still-active member index with its accepted
/// validation loss; `failed` lists the members dropped this round.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub val_losses: Vec<(usize, f64)>,
    pub failed: Vec<usize>,
}

/// Training objective for one member: mean log-density of the listed rows
/// under a candidate flat-parameter vector.
struct MemberObjective<'a> {
    estimator: &'a dyn ConditionalDensityEstimator,
    rows: Vec<usize>,
}

impl LogLikelihood for MemberObjective<'_> {
    type Data = TrainingSet;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost> {
        let mut acc = 0.0;
        for &r in &self.rows {
            let lp = self
                .estimator
                .log_prob_with(&theta.view(), &data.params().row(r), &data.summaries().row(r))
                .map_err(|e| OptError::Model { text: e.to_string() })?;
            acc += lp;
        }
        Ok(acc / self.rows.len() as f64)
    }

    fn check(&self, theta: &Theta, _data: &Self::Data) -> OptResult<()> {
        if self.rows.is_empty() {
            return Err(OptError::Model { text: "no training rows".to_string() });
        }
        if theta.len() != self.estimator.n_trainable() {
            return Err(OptError::Model {
                text: format!(
                    "parameter length {} does not match the estimator's {}",
                    theta.len(),
                    self.estimator.n_trainable()
                ),
            });
        }
        Ok(())
    }
}

/// Serializable snapshot of one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberState {
    pub spec: EstimatorSpec,
    pub params: Vec<f64>,
    pub val_loss: f64,
    pub active: bool,
}

/// Serializable snapshot of a whole ensemble, sufficient to rebuild it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleState {
    pub members: Vec<MemberState>,
}

/// Validation-weighted stack of conditional density estimators.
pub struct Ensemble {
    members: Vec<Box<dyn ConditionalDensityEstimator>>,
    active: Vec<usize>,
    val_losses: Vec<f64>,
    weights: Array1<f64>,
}

impl Ensemble {
    /// Build an ensemble over freshly initialized or pre-trained members.
    ///
    /// # Errors
    /// - [`NdeError::NoMembers`] for an empty member list.
    /// - [`NdeError::MemberShapeMismatch`] when members disagree on the
    ///   target or conditional dimension.
    pub fn new(members: Vec<Box<dyn ConditionalDensityEstimator>>) -> NdeResult<Self> {
        if members.is_empty() {
            return Err(NdeError::NoMembers);
        }
        let p = members[0].n_parameters();
        let q = members[0].n_conditionals();
        for (i, m) in members.iter().enumerate().skip(1) {
            if m.n_parameters() != p || m.n_conditionals() != q {
                return Err(NdeError::MemberShapeMismatch { member: i });
            }
        }
        let n = members.len();
        let active: Vec<usize> = (0..n).collect();
        let weights = Array1::from_elem(n, 1.0 / n as f64);
        Ok(Self { members, active, val_losses: vec![f64::INFINITY; n], weights })
    }

    /// Rebuild an ensemble from a persisted snapshot.
    pub fn from_state(state: &EnsembleState) -> NdeResult<Self> {
        let mut members = Vec::with_capacity(state.members.len());
        let mut active = Vec::new();
        let mut val_losses = Vec::with_capacity(state.members.len());
        for (i, m) in state.members.iter().enumerate() {
            let mut est = build_estimator(&m.spec)?;
            let params = Array1::from_vec(m.params.clone());
            est.set_params(&params.view())
                .map_err(|e| NdeError::StateMismatch { text: e.to_string() })?;
            members.push(est);
            val_losses.push(m.val_loss);
            if m.active {
                active.push(i);
            }
        }
        if members.is_empty() {
            return Err(NdeError::NoMembers);
        }
        if active.is_empty() {
            return Err(NdeError::AllMembersFailed);
        }
        let weights = softmax(
            &active.iter().map(|&i| -val_losses[i]).collect::<Vec<f64>>(),
        );
        Ok(Self { members, active, val_losses, weights })
    }

    /// Snapshot the ensemble for persistence.
    pub fn state(&self) -> EnsembleState {
        EnsembleState {
            members: self
                .members
                .iter()
                .enumerate()
                .map(|(i, m)| MemberState {
                    spec: m.spec(),
                    params: m.params().to_vec(),
                    val_loss: self.val_losses[i],
                    active: self.active.contains(&i),
                })
                .collect(),
        }
    }

    pub fn n_parameters(&self) -> usize {
        self.members[0].n_parameters()
    }

    pub fn n_conditionals(&self) -> usize {
        self.members[0].n_conditionals()
    }

    pub fn n_active(&self) -> usize {
        self.active.len()
    }

    /// Stacking weights over active members, in `active` order.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Per-member validation losses as `(member index, loss)` pairs, in
    /// `active` order.
    pub fn member_val_losses(&self) -> Vec<(usize, f64)> {
        self.active.iter().map(|&i| (i, self.val_losses[i])).collect()
    }

    /// Validation loss of the weighted stack, used for early stopping.
    pub fn stacked_val_loss(&self) -> f64 {
        self.active
            .iter()
            .zip(self.weights.iter())
            .map(|(&i, &w)| w * self.val_losses[i])
            .sum()
    }

    /// Fit every active member on the training set.
    ///
    /// Splits `0..data.len()` into train/validation, maximizes each
    /// member's mean training log-likelihood (warm start at its current
    /// parameters), and keeps the new parameters only if validation loss
    /// does not degrade. Members whose optimization errors are dropped from
    /// the active set.
    ///
    /// # Errors
    /// - [`NdeError::EmptyTrainingSet`] when `data` has no rows.
    /// - [`NdeError::AllMembersFailed`] when no member survives the round.
    pub fn fit(
        &mut self, data: &TrainingSet, opts: &TrainOptions, rng: &mut dyn RngCore,
    ) -> NdeResult<FitReport> {
        if data.is_empty() {
            return Err(NdeError::EmptyTrainingSet);
        }
        let (train_rows, val_rows) = split_indices(data.len(), opts.f_val, rng);
        // Score on validation when it exists, otherwise on the training rows.
        let score_rows: &[usize] = if val_rows.is_empty() { &train_rows } else { &val_rows };

        let mut failed = Vec::new();
        let mut accepted = Vec::new();
        for &i in &self.active {
            let member = self.members[i].as_ref();
            let current = member.params();
            let current_loss = match mean_neg_log_prob(member, &current.view(), data, score_rows) {
                Ok(l) => l,
                Err(_) => f64::INFINITY,
            };
            let objective = MemberObjective { estimator: member, rows: train_rows.clone() };
            let candidate = match maximize(&objective, current.clone(), data, &opts.mle) {
                Ok(outcome) => outcome.theta_hat,
                Err(_) => {
                    failed.push(i);
                    continue;
                }
            };
            let candidate_loss =
                match mean_neg_log_prob(member, &candidate.view(), data, score_rows) {
                    Ok(l) => l,
                    Err(_) => f64::INFINITY,
                };
            if candidate_loss.is_finite() && candidate_loss <= current_loss {
                accepted.push((i, candidate, candidate_loss));
            } else if current_loss.is_finite() {
                accepted.push((i, current, current_loss));
            } else {
                failed.push(i);
            }
        }

        for (i, params, loss) in &accepted {
            self.members[*i].set_params(&params.view())?;
            self.val_losses[*i] = *loss;
        }
        self.active.retain(|i| !failed.contains(i));
        if self.active.is_empty() {
            return Err(NdeError::AllMembersFailed);
        }
        self.weights = softmax(
            &self.active.iter().map(|&i| -self.val_losses[i]).collect::<Vec<f64>>(),
        );

        Ok(FitReport {
            val_losses: self.active.iter().map(|&i| (i, self.val_losses[i])).collect(),
            failed,
        })
    }

    /// Stacked log-density `log Σ_i w_i p_i(θ | t)` over active members.
    pub fn weighted_log_prob(
        &self, theta: &ArrayView1<f64>, conditional: &ArrayView1<f64>,
    ) -> NdeResult<f64> {
        let mut terms = Vec::with_capacity(self.active.len());
        for (&i, &w) in self.active.iter().zip(self.weights.iter()) {
            let lp = self.members[i].log_prob(theta, conditional)?;
            terms.push(w.ln() + lp);
        }
        let max = terms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Ok(f64::NEG_INFINITY);
        }
        let sum: f64 = terms.iter().map(|t| (t - max).exp()).sum();
        Ok(max + sum.ln())
    }

    /// Draw `θ` from the stacked mixture: pick a member by weight, then
    /// sample it.
    pub fn sample(
        &self, rng: &mut dyn RngCore, conditional: &ArrayView1<f64>,
    ) -> NdeResult<Array1<f64>> {
        let u: f64 = rng.gen();
        let mut acc = 0.0;
        let mut chosen = *self.active.last().ok_or(NdeError::AllMembersFailed)?;
        for (&i, &w) in self.active.iter().zip(self.weights.iter()) {
            acc += w;
            if u <= acc {
                chosen = i;
                break;
            }
        }
        self.members[chosen].sample(rng, conditional)
    }
}

fn mean_neg_log_prob(
    member: &dyn ConditionalDensityEstimator, params: &ArrayView1<f64>, data: &TrainingSet,
    rows: &[usize],
) -> NdeResult<f64> {
    let mut acc = 0.0;
    for &r in rows {
        acc -= member.log_prob_with(params, &data.params().row(r), &data.summaries().row(r))?;
    }
    Ok(acc / rows.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::estimator::FeatureMap;
    use crate::ensemble::gaussian::GaussianLinearEstimator;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, StandardNormal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Training-set row alignment and push validation.
    // - Fitting a two-member ensemble on synthetic conditional-Gaussian
    //   data: weights normalize, validation losses drop, and the stacked
    //   density rises at the truth.
    // - State snapshot/rebuild round-tripping.
    //
    // They intentionally DO NOT cover:
    // - L-BFGS internals (tested in optimize::mle).
    // -------------------------------------------------------------------------

    fn synthetic_data(n: usize, seed: u64) -> TrainingSet {
        // θ ~ U-ish grid, t = θ + 0.1 ε: the summary is informative of θ.
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut data = TrainingSet::empty(2, 2);
        for i in 0..n {
            let theta = array![
                -1.0 + 2.0 * (i as f64 / n as f64),
                1.0 - 2.0 * (i as f64 / n as f64)
            ];
            let eps: f64 = StandardNormal.sample(&mut rng);
            let eps2: f64 = StandardNormal.sample(&mut rng);
            let summary = array![theta[0] + 0.1 * eps, theta[1] + 0.1 * eps2];
            data.push(&theta.view(), &summary.view()).unwrap();
        }
        data
    }

    fn two_member_ensemble() -> Ensemble {
        Ensemble::new(vec![
            Box::new(GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap()),
            Box::new(GaussianLinearEstimator::new(2, 2, FeatureMap::Quadratic).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify training-set alignment checks.
    //
    // Given
    // -----
    // - A 2-wide table pushed with a 3-long parameter row, and mismatched
    //   batch tables.
    //
    // Expect
    // ------
    // - RowLengthMismatch and RowCountMismatch respectively.
    fn training_set_validates_rows() {
        // Arrange
        let mut data = TrainingSet::empty(2, 2);

        // Act / Assert
        match data.push(&array![1.0, 2.0, 3.0].view(), &array![0.0, 0.0].view()) {
            Err(NdeError::RowLengthMismatch { expected: 2, actual: 3 }) => {}
            other => panic!("Expected RowLengthMismatch, got {other:?}"),
        }
        match TrainingSet::new(Array2::zeros((3, 2)), Array2::zeros((2, 2))) {
            Err(NdeError::RowCountMismatch { params: 3, summaries: 2 }) => {}
            other => panic!("Expected RowCountMismatch, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Fit the ensemble on informative synthetic data and verify weights
    // normalize and the stacked density prefers the truth.
    //
    // Given
    // -----
    // - 120 rows with t ≈ θ, both members active, capped iterations.
    //
    // Expect
    // ------
    // - No member fails, weights sum to 1, and the stacked log-density at
    //   the generating θ exceeds that at a distant θ.
    fn fit_weights_and_stacked_density() {
        // Arrange
        let mut ensemble = two_member_ensemble();
        let data = synthetic_data(120, 1);
        let mle = MLEOptions {
            tols: crate::optimize::Tolerances {
                tol_grad: Some(1e-5),
                tol_cost: None,
                max_iter: Some(60),
            },
            ..MLEOptions::default()
        };
        let opts = TrainOptions::new(0.1, mle).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        // Act
        let report = ensemble.fit(&data, &opts, &mut rng).unwrap();

        // Assert
        assert!(report.failed.is_empty());
        assert_eq!(ensemble.n_active(), 2);
        assert!((ensemble.weights().sum() - 1.0).abs() < 1e-12);
        assert!(ensemble.stacked_val_loss().is_finite());

        let t = array![0.5, -0.5];
        let near = ensemble.weighted_log_prob(&array![0.5, -0.5].view(), &t.view()).unwrap();
        let far = ensemble.weighted_log_prob(&array![-0.9, 0.9].view(), &t.view()).unwrap();
        assert!(near > far);
    }

    #[test]
    // Purpose
    // -------
    // Verify sampling draws finite vectors of the right length from the
    // fitted stack.
    //
    // Given
    // -----
    // - A fitted two-member ensemble and a fixed conditional.
    //
    // Expect
    // ------
    // - 50 draws of length 2, all finite.
    fn sample_draws_from_the_stack() {
        // Arrange
        let mut ensemble = two_member_ensemble();
        let data = synthetic_data(80, 2);
        let opts = TrainOptions::default();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        ensemble.fit(&data, &opts, &mut rng).unwrap();
        let t = array![0.2, -0.2];

        // Act / Assert
        for _ in 0..50 {
            let draw = ensemble.sample(&mut rng, &t.view()).unwrap();
            assert_eq!(draw.len(), 2);
            assert!(draw.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    // Purpose
    // -------
    // Round-trip the ensemble through its serializable state.
    //
    // Given
    // -----
    // - A fitted ensemble snapshotted and rebuilt via from_state.
    //
    // Expect
    // ------
    // - The rebuilt stack evaluates identically and keeps the same active
    //   count and weights.
    fn state_roundtrip_preserves_the_stack() {
        // Arrange
        let mut ensemble = two_member_ensemble();
        let data = synthetic_data(60, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        ensemble.fit(&data, &TrainOptions::default(), &mut rng).unwrap();

        // Act
        let state = ensemble.state();
        let rebuilt = Ensemble::from_state(&state).unwrap();

        // Assert
        assert_eq!(rebuilt.n_active(), ensemble.n_active());
        let theta = array![0.1, 0.1];
        let t = array![0.1, 0.1];
        let a = ensemble.weighted_log_prob(&theta.view(), &t.view()).unwrap();
        let b = rebuilt.weighted_log_prob(&theta.view(), &t.view()).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure construction rejects empty and mismatched member lists.
    //
    // Given
    // -----
    // - An empty vector and members with different target dimensions.
    //
    // Expect
    // ------
    // - NoMembers and MemberShapeMismatch respectively.
    fn new_validates_members() {
        // Act / Assert
        match Ensemble::new(vec![]) {
            Err(NdeError::NoMembers) => {}
            other => panic!("Expected NoMembers, got {:?}", other.map(|_| ())),
        }
        match Ensemble::new(vec![
            Box::new(GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap())
                as Box<dyn ConditionalDensityEstimator>,
            Box::new(GaussianLinearEstimator::new(3, 2, FeatureMap::Linear).unwrap()),
        ]) {
            Err(NdeError::MemberShapeMismatch { member: 1 }) => {}
            other => panic!("Expected MemberShapeMismatch, got {:?}", other.map(|_| ())),
        }
    }
}
