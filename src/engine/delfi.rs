//! engine::delfi — the sequential likelihood-free inference engine.
//!
//! Purpose
//! -------
//! Drive the full loop: draw parameters, run the simulator, compress the
//! data, grow the training set, refit the estimator ensemble, and propose
//! the next population from the current posterior approximation. Also owns
//! the analytic Fisher pretraining pass that warms the ensemble up before
//! any real simulation is spent.
//!
//! Key behaviors
//! -------------
//! - Input normalization: with [`InputNorm::Fisher`], parameters are
//!   centered on the fiducial point and scaled by `sqrt(diag F̄)`, and
//!   summaries are mapped through `F̄⁻¹` into pseudo-MLE space and scaled
//!   identically, so targets and conditionals reach the ensemble on the
//!   same footing.
//! - Proposals: after the first fit, new parameters are drawn from the
//!   stacked ensemble conditioned on the observed summary, rejected when
//!   they leave the prior support, with a bounded retry count and a prior
//!   fallback. No Markov chain is involved.
//! - Early stopping: the stacked validation loss is tracked across
//!   populations; `patience` populations without improvement end the run.
//! - Determinism: one engine seed expands into per-simulation and per-fit
//!   seeds through a splitmix64 stream, so a run is exactly replayable.
//! - Persistence: when a results directory is configured, each population
//!   record, the final history, and the ensemble state are written as JSON.
//!
//! Invariants & assumptions
//! ------------------------
//! - `prior.dim() == theta_fiducial.len() == ensemble.n_parameters() ==
//!   ensemble.n_conditionals()` and the hardened Fisher matrix is square of
//!   the same side; all checked at construction.
//! - The training set only ever grows; populations append, never replace.
//!
//! Testing notes
//! -------------
//! - Unit tests run a toy linear-Gaussian pipeline end to end with small
//!   populations; the full-size configuration lives in the integration
//!   tests.

use crate::{
    compression::{
        fisher::{cholesky_lower, invert_symmetric, FisherMatrix},
        score::{Compressor, CompressorArgs},
    },
    engine::{
        errors::{DelfiError, DelfiResult},
        history::{PopulationRecord, Termination, TrainingHistory},
        options::{InputNorm, PretrainOptions, SequentialOptions},
    },
    ensemble::stack::{Ensemble, FitReport, TrainingSet},
    priors::Prior,
    simulate::Simulator,
    utils::next_seed,
};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;
use std::path::PathBuf;

/// Sequential likelihood-free inference driver.
///
/// Construct once per analysis with the observed summary, the
/// interesting-parameter prior, a fresh ensemble, and the hardened Fisher
/// matrix from score compression; then optionally
/// [`fisher_pretraining`](Delfi::fisher_pretraining) and finally
/// [`sequential_training`](Delfi::sequential_training).
pub struct Delfi<P: Prior> {
    summary_obs_norm: Array1<f64>,
    prior: P,
    ensemble: Ensemble,
    fisher: Array2<f64>,
    fisher_inverse: Array2<f64>,
    pretrain_chol: Array2<f64>,
    scale: Array1<f64>,
    theta_fiducial: Array1<f64>,
    param_names: Vec<String>,
    results_dir: Option<PathBuf>,
    input_norm: InputNorm,
    seed_state: u64,
    training: TrainingSet,
    n_sims: usize,
}

impl<P: Prior> Delfi<P> {
    /// Build a validated engine.
    ///
    /// # Parameters
    /// - `summary_obs`: raw compressed observed summary, length `dim`.
    /// - `prior`: prior over the interesting parameters.
    /// - `ensemble`: estimator stack with `n_parameters == n_conditionals
    ///   == dim`.
    /// - `fisher`: the Fisher matrix from score compression; its hardened
    ///   block drives normalization and pretraining.
    /// - `theta_fiducial`: fiducial values of the interesting parameters.
    /// - `param_names`: one label per parameter, for run records.
    /// - `results_dir`: where to write JSON records; created if missing.
    /// - `seed`: master seed for every stochastic step of the run.
    ///
    /// # Errors
    /// - [`DelfiError::DimMismatch`] for any disagreeing dimension.
    /// - Fisher inversion errors when `F̄` or `F̄⁻¹` is not positive
    ///   definite.
    /// - I/O errors creating the results directory.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        summary_obs: Array1<f64>, prior: P, ensemble: Ensemble, fisher: &FisherMatrix,
        theta_fiducial: Array1<f64>, param_names: Vec<String>, results_dir: Option<PathBuf>,
        input_norm: InputNorm, seed: u64,
    ) -> DelfiResult<Self> {
        let dim = prior.dim();
        if theta_fiducial.len() != dim {
            return Err(DelfiError::DimMismatch {
                what: "theta_fiducial",
                expected: dim,
                actual: theta_fiducial.len(),
            });
        }
        if summary_obs.len() != dim {
            return Err(DelfiError::DimMismatch {
                what: "summary_obs",
                expected: dim,
                actual: summary_obs.len(),
            });
        }
        if ensemble.n_parameters() != dim {
            return Err(DelfiError::DimMismatch {
                what: "ensemble target dimension",
                expected: dim,
                actual: ensemble.n_parameters(),
            });
        }
        if ensemble.n_conditionals() != dim {
            return Err(DelfiError::DimMismatch {
                what: "ensemble conditional dimension",
                expected: dim,
                actual: ensemble.n_conditionals(),
            });
        }
        let hardened = fisher.hardened();
        if hardened.nrows() != dim {
            return Err(DelfiError::DimMismatch {
                what: "hardened Fisher matrix",
                expected: dim,
                actual: hardened.nrows(),
            });
        }
        if param_names.len() != dim {
            return Err(DelfiError::DimMismatch {
                what: "param_names",
                expected: dim,
                actual: param_names.len(),
            });
        }
        let fisher_inverse = invert_symmetric(hardened)?;
        let pretrain_chol = cholesky_lower(&fisher_inverse)?;
        let scale: Array1<f64> = (0..dim).map(|i| hardened[[i, i]].sqrt()).collect();
        if let Some(dir) = &results_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut engine = Self {
            summary_obs_norm: Array1::zeros(dim),
            prior,
            ensemble,
            fisher: hardened.clone(),
            fisher_inverse,
            pretrain_chol,
            scale,
            theta_fiducial,
            param_names,
            results_dir,
            input_norm,
            seed_state: seed,
            training: TrainingSet::empty(dim, dim),
            n_sims: 0,
        };
        engine.summary_obs_norm = engine.norm_summary(&summary_obs.view());
        Ok(engine)
    }

    pub fn dim(&self) -> usize {
        self.theta_fiducial.len()
    }

    pub fn n_sims(&self) -> usize {
        self.n_sims
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training
    }

    /// Parameters as the ensemble sees them.
    fn norm_params(&self, theta: &ArrayView1<f64>) -> Array1<f64> {
        match self.input_norm {
            InputNorm::Fisher => (theta.to_owned() - &self.theta_fiducial) * &self.scale,
            InputNorm::None => theta.to_owned(),
        }
    }

    /// Invert [`Delfi::norm_params`].
    fn denorm_params(&self, theta: &ArrayView1<f64>) -> Array1<f64> {
        match self.input_norm {
            InputNorm::Fisher => theta.to_owned() / &self.scale + &self.theta_fiducial,
            InputNorm::None => theta.to_owned(),
        }
    }

    /// Summaries as the ensemble sees them: pseudo-MLE displacement on the
    /// parameter scale under Fisher normalization.
    fn norm_summary(&self, summary: &ArrayView1<f64>) -> Array1<f64> {
        match self.input_norm {
            InputNorm::Fisher => self.fisher_inverse.dot(summary) * &self.scale,
            InputNorm::None => summary.to_owned(),
        }
    }

    fn derive_rng(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(next_seed(&mut self.seed_state))
    }

    /// Warm the ensemble up on synthetic fiducial-region pairs before any
    /// simulation is spent.
    ///
    /// For each draw: `θ ~ prior`, `θ̂ = θ + L z` with `L Lᵀ = F̄⁻¹` and
    /// `z ~ N(0, I)`, and the matching summary `t = F̄ (θ̂ − θ_fid)` — the
    /// asymptotic sampling distribution of the score summary. The synthetic
    /// set is fitted and discarded; real populations start from scratch.
    ///
    /// # Errors
    /// - Prior draw failures.
    /// - Ensemble fitting failures (all members failing is fatal).
    pub fn fisher_pretraining(&mut self, opts: &PretrainOptions) -> DelfiResult<FitReport> {
        let dim = self.dim();
        let mut rng = self.derive_rng();
        let mut synthetic = TrainingSet::empty(dim, dim);
        for _ in 0..opts.n_draws {
            let theta = self.prior.sample(&mut rng)?;
            let z: Array1<f64> = (0..dim).map(|_| StandardNormal.sample(&mut rng)).collect();
            let theta_hat = &theta + &self.pretrain_chol.dot(&z);
            let summary = self.fisher.dot(&(&theta_hat - &self.theta_fiducial));
            let row_params = self.norm_params(&theta.view());
            let row_summary = self.norm_summary(&summary.view());
            synthetic.push(&row_params.view(), &row_summary.view())?;
        }
        let report = self.ensemble.fit(&synthetic, &opts.train, &mut rng)?;
        Ok(report)
    }

    /// Run the full sequential loop.
    ///
    /// Population 0 is drawn from the prior (`n_initial` simulations); each
    /// later population adds `n_batch` simulations at parameters proposed
    /// from the current posterior approximation. The ensemble is refitted
    /// on the accumulated set after every population, and the run stops
    /// early when the stacked validation loss fails to improve for
    /// `patience` populations.
    ///
    /// # Errors
    /// - Dimension mismatches between the engine, simulator, and
    ///   compressor.
    /// - Simulation, compression, prior, fitting, and persistence
    ///   failures.
    pub fn sequential_training<S: Simulator, C: Compressor>(
        &mut self, simulator: &S, compressor: &C, args: &CompressorArgs,
        opts: &SequentialOptions,
    ) -> DelfiResult<TrainingHistory> {
        let dim = self.dim();
        if simulator.n_parameters() != dim {
            return Err(DelfiError::DimMismatch {
                what: "simulator parameter dimension",
                expected: dim,
                actual: simulator.n_parameters(),
            });
        }
        if compressor.n_data() != simulator.n_data() {
            return Err(DelfiError::DimMismatch {
                what: "compressor data dimension",
                expected: simulator.n_data(),
                actual: compressor.n_data(),
            });
        }
        if compressor.n_summaries() != dim {
            return Err(DelfiError::DimMismatch {
                what: "compressor summary dimension",
                expected: dim,
                actual: compressor.n_summaries(),
            });
        }

        let mut rng = self.derive_rng();
        let mut populations = Vec::new();
        let mut termination = Termination::Exhausted;

        // Population 0: the prior.
        let initial = self.prior.sample_batch(&mut rng, opts.n_initial)?;
        self.simulate_batch(simulator, compressor, args, &initial)?;
        self.ensemble.fit(&self.training, &opts.train, &mut rng)?;
        let record = self.record_population(0);
        self.save_population(&record)?;
        let mut best_loss = record.val_loss;
        populations.push(record);
        let mut stall = 0_usize;

        for pop in 1..=opts.n_populations {
            let mut proposals = Array2::zeros((opts.n_batch, dim));
            for i in 0..opts.n_batch {
                let theta = self.propose(&mut rng, opts.proposal_tries)?;
                proposals.row_mut(i).assign(&theta);
            }
            self.simulate_batch(simulator, compressor, args, &proposals)?;
            self.ensemble.fit(&self.training, &opts.train, &mut rng)?;

            let record = self.record_population(pop);
            self.save_population(&record)?;
            let loss = record.val_loss;
            populations.push(record);

            if loss < best_loss {
                best_loss = loss;
                stall = 0;
            } else {
                stall += 1;
                if stall >= opts.patience {
                    termination = Termination::EarlyStopped { population: pop };
                    break;
                }
            }
        }

        let history = TrainingHistory { populations, termination };
        self.save_json("history.json", &history)?;
        Ok(history)
    }

    /// Stacked log-density of `θ` given the observed summary; `-inf`
    /// outside the prior support.
    pub fn log_posterior(&self, theta: &ArrayView1<f64>) -> DelfiResult<f64> {
        if !self.prior.contains(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let theta_norm = self.norm_params(theta);
        Ok(self
            .ensemble
            .weighted_log_prob(&theta_norm.view(), &self.summary_obs_norm.view())?)
    }

    /// Draw `n` posterior samples (ensemble draws at the observed summary,
    /// prior-support rejected with fallback).
    pub fn sample_posterior(&mut self, n: usize, tries: usize) -> DelfiResult<Array2<f64>> {
        let mut rng = self.derive_rng();
        let mut out = Array2::zeros((n, self.dim()));
        for i in 0..n {
            let theta = self.propose(&mut rng, tries)?;
            out.row_mut(i).assign(&theta);
        }
        Ok(out)
    }

    /// One posterior proposal: sample the stacked ensemble at the observed
    /// summary, reject draws outside the prior support, and fall back to
    /// the prior after `tries` attempts.
    fn propose(&self, rng: &mut dyn RngCore, tries: usize) -> DelfiResult<Array1<f64>> {
        for _ in 0..tries {
            let draw = self.ensemble.sample(rng, &self.summary_obs_norm.view())?;
            let theta = self.denorm_params(&draw.view());
            if theta.iter().all(|v| v.is_finite()) && self.prior.contains(&theta.view()) {
                return Ok(theta);
            }
        }
        Ok(self.prior.sample(rng)?)
    }

    /// Simulate and compress one row per parameter vector, appending the
    /// normalized pairs to the training set.
    fn simulate_batch<S: Simulator, C: Compressor>(
        &mut self, simulator: &S, compressor: &C, args: &CompressorArgs, thetas: &Array2<f64>,
    ) -> DelfiResult<()> {
        for theta in thetas.rows() {
            let seed = next_seed(&mut self.seed_state);
            let data = simulator.simulate(&theta, seed, 1)?;
            let summary = compressor.compress(&data.row(0), args)?;
            let row_params = self.norm_params(&theta);
            let row_summary = self.norm_summary(&summary.view());
            self.training.push(&row_params.view(), &row_summary.view())?;
            self.n_sims += 1;
        }
        Ok(())
    }

    fn record_population(&self, population: usize) -> PopulationRecord {
        PopulationRecord {
            population,
            n_total_sims: self.n_sims,
            val_loss: self.ensemble.stacked_val_loss(),
            member_val_losses: self.ensemble.member_val_losses(),
            weights: self.ensemble.weights().to_vec(),
            n_active: self.ensemble.n_active(),
        }
    }

    /// Persist the population record and refresh the ensemble snapshot.
    fn save_population(&self, record: &PopulationRecord) -> DelfiResult<()> {
        self.save_json(&format!("population_{:03}.json", record.population), record)?;
        self.save_json("ensemble.json", &self.ensemble.state())
    }

    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> DelfiResult<()> {
        if let Some(dir) = &self.results_dir {
            let file = std::fs::File::create(dir.join(name))?;
            serde_json::to_writer_pretty(file, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compression::score::{MeanModel, ScoreCompressor},
        compression::errors::CompressionResult,
        ensemble::{estimator::FeatureMap, gaussian::GaussianLinearEstimator},
        optimize::{MLEOptions, Tolerances},
        priors::BoxUniform,
        simulate::SimResult,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction validation of engine dimensions.
    // - Fisher pretraining producing a usable (finite-loss) ensemble.
    // - A small sequential run: population accounting, termination within
    //   the schedule, and posterior samples inside the prior support.
    // - Seed determinism of the accumulated training set.
    //
    // They intentionally DO NOT cover:
    // - The full-size configuration (integration tests).
    // -------------------------------------------------------------------------

    /// Linear-Gaussian toy: data = [θ0, θ1, θ0 + θ1] + 0.2 ε.
    struct ToySim;

    impl Simulator for ToySim {
        fn n_parameters(&self) -> usize {
            2
        }

        fn n_data(&self) -> usize {
            3
        }

        fn simulate(
            &self, theta: &ArrayView1<f64>, seed: u64, batch: usize,
        ) -> SimResult<Array2<f64>> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut out = Array2::zeros((batch, 3));
            for i in 0..batch {
                let mean = [theta[0], theta[1], theta[0] + theta[1]];
                for j in 0..3 {
                    let eps: f64 = StandardNormal.sample(&mut rng);
                    out[[i, j]] = mean[j] + 0.2 * eps;
                }
            }
            Ok(out)
        }
    }

    struct ToyMean;

    impl MeanModel for ToyMean {
        fn n_data(&self) -> usize {
            3
        }

        fn n_parameters(&self) -> usize {
            2
        }

        fn mean(&self, theta: &ArrayView1<f64>) -> CompressionResult<Array1<f64>> {
            Ok(array![theta[0], theta[1], theta[0] + theta[1]])
        }
    }

    fn toy_compressor() -> ScoreCompressor {
        ScoreCompressor::new(
            &ToyMean,
            array![0.2, -0.75],
            array![1e-4, 1e-4],
            Array2::eye(3) / 0.04,
            &[],
        )
        .unwrap()
    }

    fn toy_ensemble() -> Ensemble {
        Ensemble::new(vec![
            Box::new(GaussianLinearEstimator::new(2, 2, FeatureMap::Linear).unwrap()),
            Box::new(GaussianLinearEstimator::new(2, 2, FeatureMap::Quadratic).unwrap()),
        ])
        .unwrap()
    }

    fn toy_engine(seed: u64) -> Delfi<BoxUniform> {
        let compressor = toy_compressor();
        let observed = ToySim.simulate(&array![0.25, -0.6].view(), 999, 1).unwrap();
        let summary_obs = compressor
            .compress(&observed.row(0), &CompressorArgs::default())
            .unwrap();
        Delfi::new(
            summary_obs,
            BoxUniform::new(array![0.0, -1.5], array![0.6, 0.0]).unwrap(),
            toy_ensemble(),
            compressor.fisher(),
            array![0.2, -0.75],
            vec!["omega".to_string(), "w0".to_string()],
            None,
            InputNorm::Fisher,
            seed,
        )
        .unwrap()
    }

    fn quick_train() -> crate::ensemble::stack::TrainOptions {
        crate::ensemble::stack::TrainOptions::new(
            0.1,
            MLEOptions {
                tols: Tolerances { tol_grad: Some(1e-4), tol_cost: None, max_iter: Some(40) },
                ..MLEOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify construction rejects a summary of the wrong length.
    //
    // Given
    // -----
    // - A 2-D prior with a 3-long observed summary.
    //
    // Expect
    // ------
    // - DimMismatch naming summary_obs.
    fn new_rejects_mismatched_summary() {
        // Arrange
        let compressor = toy_compressor();

        // Act
        let result = Delfi::new(
            array![0.0, 0.0, 0.0],
            BoxUniform::new(array![0.0, -1.5], array![0.6, 0.0]).unwrap(),
            toy_ensemble(),
            compressor.fisher(),
            array![0.2, -0.75],
            vec!["omega".to_string(), "w0".to_string()],
            None,
            InputNorm::Fisher,
            1,
        );

        // Assert
        match result {
            Err(DelfiError::DimMismatch { what: "summary_obs", expected: 2, actual: 3 }) => {}
            other => panic!("Expected DimMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    // Purpose
    // -------
    // Check Fisher pretraining leaves a finite, normalized stack.
    //
    // Given
    // -----
    // - The toy engine pretrained on 200 synthetic draws.
    //
    // Expect
    // ------
    // - No member fails, weights sum to one, stacked loss is finite.
    fn fisher_pretraining_warms_up_the_stack() {
        // Arrange
        let mut engine = toy_engine(11);
        let opts = PretrainOptions::new(200, quick_train()).unwrap();

        // Act
        let report = engine.fisher_pretraining(&opts).unwrap();

        // Assert
        assert!(report.failed.is_empty());
        assert!((engine.ensemble().weights().sum() - 1.0).abs() < 1e-12);
        assert!(engine.ensemble().stacked_val_loss().is_finite());
        for (_, loss) in &report.val_losses {
            assert!(loss.is_finite());
        }
    }

    #[test]
    // Purpose
    // -------
    // Run a small sequential loop end to end and verify population
    // accounting, termination, and posterior support.
    //
    // Given
    // -----
    // - n_initial = 30, n_batch = 20, n_populations = 3, patience = 3.
    //
    // Expect
    // ------
    // - At most 4 population records (initial + 3); simulation totals grow
    //   by exactly n_batch per population; posterior samples respect the
    //   prior box.
    fn sequential_training_runs_and_proposes_in_support() {
        // Arrange
        let mut engine = toy_engine(29);
        let compressor = toy_compressor();
        let opts =
            SequentialOptions::new(30, 20, 3, 3, 200, quick_train()).unwrap();

        // Act
        let history = engine
            .sequential_training(&ToySim, &compressor, &CompressorArgs::default(), &opts)
            .unwrap();

        // Assert
        assert!(!history.populations.is_empty());
        assert!(history.populations.len() <= 4);
        assert_eq!(history.populations[0].n_total_sims, 30);
        for pair in history.populations.windows(2) {
            assert_eq!(pair[1].n_total_sims - pair[0].n_total_sims, 20);
        }
        assert_eq!(engine.n_sims(), history.n_total_sims());

        let samples = engine.sample_posterior(50, 200).unwrap();
        for row in samples.rows() {
            assert!(row[0] >= 0.0 && row[0] <= 0.6);
            assert!(row[1] >= -1.5 && row[1] <= 0.0);
        }
        let inside = engine.log_posterior(&array![0.25, -0.6].view()).unwrap();
        let outside = engine.log_posterior(&array![2.0, 0.5].view()).unwrap();
        assert!(inside.is_finite());
        assert!(outside.is_infinite() && outside < 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Pin the patience path: with patience 1 and a generous population
    // budget, the first non-improving stacked validation loss ends the run
    // and the history records which population stopped it.
    //
    // Given
    // -----
    // - n_initial = 20, n_batch = 10, n_populations = 30, patience = 1,
    //   seed 3.
    //
    // Expect
    // ------
    // - EarlyStopped naming the last recorded population; fewer records
    //   than the full schedule would produce.
    fn patience_of_one_stops_the_run_early() {
        // Arrange
        let mut engine = toy_engine(3);
        let compressor = toy_compressor();
        let opts = SequentialOptions::new(20, 10, 30, 1, 100, quick_train()).unwrap();

        // Act
        let history = engine
            .sequential_training(&ToySim, &compressor, &CompressorArgs::default(), &opts)
            .unwrap();

        // Assert
        match history.termination {
            Termination::EarlyStopped { population } => {
                assert!(population >= 1);
                assert_eq!(history.populations.len(), population + 1);
            }
            Termination::Exhausted => panic!("Expected an early stop under patience 1"),
        }
        assert!(history.populations.len() < 31);
        assert_eq!(
            engine.n_sims(),
            20 + 10 * (history.populations.len() - 1)
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the accumulated training set is identical across two runs
    // with the same seed and differs under another seed.
    //
    // Given
    // -----
    // - Three engines, seeds (7, 7, 8), one initial population each.
    //
    // Expect
    // ------
    // - Seed-7 training tables match exactly; seed-8 differs.
    fn runs_are_seed_deterministic() {
        // Arrange
        let compressor = toy_compressor();
        let opts = SequentialOptions::new(15, 5, 1, 1, 50, quick_train()).unwrap();
        let mut runs = Vec::new();

        // Act
        for seed in [7, 7, 8] {
            let mut engine = toy_engine(seed);
            engine
                .sequential_training(&ToySim, &compressor, &CompressorArgs::default(), &opts)
                .unwrap();
            runs.push(engine.training_set().params().clone());
        }

        // Assert
        assert_eq!(runs[0], runs[1]);
        assert_ne!(runs[0], runs[2]);
    }
}
