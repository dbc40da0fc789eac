//! Batch normalization whose behavior is chosen per call instead of per backend.

use burn::module::{Module, Param, RunningState};
use burn::tensor::{backend::Backend, Tensor};

use crate::mode::Mode;

#[derive(Debug, Clone)]
pub struct StageNormConfig {
    pub num_features: usize,
    pub epsilon: f64,
    pub momentum: f64,
}

impl StageNormConfig {
    pub fn new(num_features: usize) -> Self {
        Self {
            num_features,
            epsilon: 1e-5,
            momentum: 0.1,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> StageNorm<B> {
        let n = self.num_features;
        StageNorm {
            gamma: Param::from_tensor(Tensor::ones([n], device)),
            beta: Param::from_tensor(Tensor::zeros([n], device)),
            running_mean: RunningState::new(Tensor::zeros([n], device)),
            running_var: RunningState::new(Tensor::ones([n], device)),
            momentum: self.momentum,
            epsilon: self.epsilon,
        }
    }
}

/// 2-d batch norm over `[B, C, H, W]` inputs.
#[derive(Module, Debug)]
pub struct StageNorm<B: Backend> {
    pub gamma: Param<Tensor<B, 1>>,
    pub beta: Param<Tensor<B, 1>>,
    pub running_mean: RunningState<Tensor<B, 1>>,
    pub running_var: RunningState<Tensor<B, 1>>,
    momentum: f64,
    epsilon: f64,
}

impl<B: Backend> StageNorm<B> {
    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        let [_, channels, _, _] = input.dims();
        let (mean, var) = match mode {
            Mode::Train => self.batch_statistics(input.clone()),
            Mode::Eval => (self.running_mean.value(), self.running_var.value()),
        };
        let shape = [1, channels, 1, 1];
        let std = var.reshape(shape).add_scalar(self.epsilon).sqrt();
        let normalized = (input - mean.reshape(shape)) / std;
        normalized * self.gamma.val().reshape(shape) + self.beta.val().reshape(shape)
    }

    /// Disable gradients on the affine parameters.
    pub fn fix_affine(self) -> Self {
        self.no_grad()
    }

    pub fn affine_requires_grad(&self) -> bool {
        self.gamma.val().is_require_grad() || self.beta.val().is_require_grad()
    }

    fn batch_statistics(&self, input: Tensor<B, 4>) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let [batch, channels, height, width] = input.dims();
        let flat = input
            .swap_dims(0, 1)
            .reshape([channels, batch * height * width]);
        let mean = flat.clone().mean_dim(1);
        let var = (flat - mean.clone()).powf_scalar(2.0).mean_dim(1);
        let mean = mean.reshape([channels]);
        let var = var.reshape([channels]);

        let m = self.momentum;
        let running_mean = self.running_mean.value_sync();
        let running_var = self.running_var.value_sync();
        self.running_mean.update(
            (running_mean.mul_scalar(1.0 - m) + mean.clone().detach().mul_scalar(m)).detach(),
        );
        self.running_var.update(
            (running_var.mul_scalar(1.0 - m) + var.clone().detach().mul_scalar(m)).detach(),
        );
        (mean, var)
    }
}
