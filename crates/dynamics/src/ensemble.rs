use nalgebra::DMatrix;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::TrainingSet;
use crate::error::DynamicsError;

/// Diagonal Gaussian over the next-state delta predicted by one member.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianPrediction {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

/// What a call to [`DynamicsEnsemble::fit`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub samples: usize,
    pub members: usize,
    /// Mean squared delta error averaged over members, each scored on the
    /// rows it was fitted on.
    pub train_mse: f32,
}

/// A set of independently parameterised transition-delta predictors.
pub trait DynamicsEnsemble {
    /// Number of members.
    fn members(&self) -> usize;

    fn is_fitted(&self) -> bool;

    /// Fits every member on `data`, blocking until done.
    ///
    /// `epochs` bounds the passes of iterative learners over `data`; closed-form
    /// learners may ignore it. All previously fitted parameters are discarded;
    /// the result depends only on `data`, `epochs` and the state of `rng`.
    ///
    /// # Errors
    ///
    /// Implementations reject empty or ragged training sets.
    fn fit(
        &mut self,
        data: &TrainingSet,
        epochs: usize,
        rng: &mut dyn RngCore,
    ) -> Result<FitSummary, DynamicsError>;

    /// Delta prediction of a single member for one `state ‖ action` input.
    ///
    /// # Errors
    ///
    /// Fails before the first fit, for an out-of-range member, or for an input
    /// of the wrong width.
    fn predict_member(&self, member: usize, input: &[f32]) -> Result<GaussianPrediction, DynamicsError>;

    /// One prediction per member.
    ///
    /// # Errors
    ///
    /// See [`DynamicsEnsemble::predict_member`].
    fn predict(&self, input: &[f32]) -> Result<Vec<GaussianPrediction>, DynamicsError> {
        (0..self.members())
            .map(|member| self.predict_member(member, input))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearEnsembleConfig {
    pub members: usize,
    /// L2 penalty on the non-bias weights.
    pub ridge: f32,
    /// Fit each member on its own resample with replacement.
    pub bootstrap: bool,
    /// Lower bound on every predicted standard deviation.
    pub min_std: f32,
}

impl Default for LinearEnsembleConfig {
    fn default() -> Self {
        Self { members: 5, ridge: 1e-3, bootstrap: true, min_std: 1e-4 }
    }
}

#[derive(Debug, Clone)]
struct LinearMember {
    /// `(input_dim + 1) x output_dim`, bias in the last row.
    weights: DMatrix<f32>,
    residual_std: Vec<f32>,
}

/// Bootstrapped ensemble of ridge regressions from `state ‖ action` to the
/// state delta.
///
/// Each member is solved in closed form, so a fit is exactly reproducible
/// from the data and the random source. The residual spread of each member on
/// its own sample serves as its predictive standard deviation.
#[derive(Debug, Clone)]
pub struct LinearEnsemble {
    config: LinearEnsembleConfig,
    state_dim: usize,
    action_dim: usize,
    members: Vec<LinearMember>,
}

impl LinearEnsemble {
    pub fn new(state_dim: usize, action_dim: usize, config: LinearEnsembleConfig) -> Self {
        Self { config, state_dim, action_dim, members: Vec::new() }
    }

    pub fn config(&self) -> &LinearEnsembleConfig {
        &self.config
    }

    fn input_dim(&self) -> usize {
        self.state_dim + self.action_dim
    }

    fn check_rows(&self, data: &TrainingSet) -> Result<(), DynamicsError> {
        if data.is_empty() {
            return Err(DynamicsError::EmptyDataset);
        }
        if data.targets.len() != data.inputs.len() {
            return Err(DynamicsError::DimensionMismatch {
                what: "target rows",
                expected: data.inputs.len(),
                actual: data.targets.len(),
            });
        }
        if let Some(row) = data.inputs.iter().find(|r| r.len() != self.input_dim()) {
            return Err(DynamicsError::DimensionMismatch {
                what: "model input",
                expected: self.input_dim(),
                actual: row.len(),
            });
        }
        if let Some(row) = data.targets.iter().find(|r| r.len() != self.state_dim) {
            return Err(DynamicsError::DimensionMismatch {
                what: "delta target",
                expected: self.state_dim,
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn fit_member(
        &self,
        member: usize,
        data: &TrainingSet,
        rows: &[usize],
    ) -> Result<(LinearMember, f32), DynamicsError> {
        let n = rows.len();
        let p = self.input_dim() + 1;
        let x = DMatrix::from_fn(n, p, |r, c| {
            if c == p - 1 {
                1.0
            } else {
                data.inputs[rows[r]][c]
            }
        });
        let y = DMatrix::from_fn(n, self.state_dim, |r, c| data.targets[rows[r]][c]);

        let xt = x.transpose();
        let mut gram = &xt * &x;
        for i in 0..p - 1 {
            gram[(i, i)] += self.config.ridge;
        }
        let rhs = &xt * &y;
        let weights = gram
            .cholesky()
            .ok_or(DynamicsError::SingularSystem { member })?
            .solve(&rhs);

        let residual = y - &x * &weights;
        let residual_std: Vec<f32> = residual
            .column_iter()
            .map(|col| {
                let var = col.iter().map(|r| r * r).sum::<f32>() / n as f32;
                var.sqrt().max(self.config.min_std)
            })
            .collect();
        let mse = residual.iter().map(|r| r * r).sum::<f32>() / residual.len() as f32;
        Ok((LinearMember { weights, residual_std }, mse))
    }
}

impl DynamicsEnsemble for LinearEnsemble {
    fn members(&self) -> usize {
        self.config.members
    }

    fn is_fitted(&self) -> bool {
        !self.members.is_empty()
    }

    /// Ridge regression has a closed-form solution, so `epochs` is unused.
    fn fit(
        &mut self,
        data: &TrainingSet,
        _epochs: usize,
        rng: &mut dyn RngCore,
    ) -> Result<FitSummary, DynamicsError> {
        self.check_rows(data)?;
        self.members.clear();

        let n = data.len();
        let mut fitted = Vec::with_capacity(self.config.members);
        let mut total_mse = 0.0;
        for member in 0..self.config.members {
            let rows: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let (fit, mse) = self.fit_member(member, data, &rows)?;
            debug!(member, mse, "fitted ensemble member");
            total_mse += mse;
            fitted.push(fit);
        }
        self.members = fitted;

        Ok(FitSummary {
            samples: n,
            members: self.config.members,
            train_mse: total_mse / self.config.members.max(1) as f32,
        })
    }

    fn predict_member(&self, member: usize, input: &[f32]) -> Result<GaussianPrediction, DynamicsError> {
        if !self.is_fitted() {
            return Err(DynamicsError::NotFitted);
        }
        let fit = self.members.get(member).ok_or(DynamicsError::InvalidMember {
            index: member,
            members: self.members.len(),
        })?;
        if input.len() != self.input_dim() {
            return Err(DynamicsError::DimensionMismatch {
                what: "model input",
                expected: self.input_dim(),
                actual: input.len(),
            });
        }
        let bias_row = self.input_dim();
        let mean = (0..self.state_dim)
            .map(|j| {
                input
                    .iter()
                    .enumerate()
                    .map(|(i, x)| x * fit.weights[(i, j)])
                    .sum::<f32>()
                    + fit.weights[(bias_row, j)]
            })
            .collect();
        Ok(GaussianPrediction { mean, std: fit.residual_std.clone() })
    }
}
