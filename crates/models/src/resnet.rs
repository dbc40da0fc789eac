//! ResNet trunk split into the `conv1..conv4` stages.
//!
//! Shapes (base width `w`, bottleneck expansion `e = 4`, basic `e = 1`):
//! - `conv1`: `[B, 3, H, W]` -> `[B, w, H/4, W/4]` (7x7/2 conv, norm, relu, 3x3/2 max-pool)
//! - `conv2`: -> `[B, w*e, H/4, W/4]`
//! - `conv3`: -> `[B, 2w*e, H/8, W/8]`
//! - `conv4`: -> `[B, 4w*e, H/16, W/16]`

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::{backend::Backend, Tensor};

use crate::mode::Mode;
use crate::norm::{StageNorm, StageNormConfig};
use crate::stage::{PerStage, Stage, StageSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResNetDepth {
    R18,
    R34,
    R50,
    R101,
    R152,
}

impl ResNetDepth {
    pub fn name(self) -> &'static str {
        match self {
            ResNetDepth::R18 => "res18",
            ResNetDepth::R34 => "res34",
            ResNetDepth::R50 => "res50",
            ResNetDepth::R101 => "res101",
            ResNetDepth::R152 => "res152",
        }
    }

    /// Residual blocks in `conv2`, `conv3`, `conv4`.
    pub fn blocks(self) -> [usize; 3] {
        match self {
            ResNetDepth::R18 => [2, 2, 2],
            ResNetDepth::R34 | ResNetDepth::R50 => [3, 4, 6],
            ResNetDepth::R101 => [3, 4, 23],
            ResNetDepth::R152 => [3, 8, 36],
        }
    }

    pub fn bottleneck(self) -> bool {
        !matches!(self, ResNetDepth::R18 | ResNetDepth::R34)
    }

    pub fn expansion(self) -> usize {
        if self.bottleneck() {
            4
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResNetConfig {
    pub depth: ResNetDepth,
    pub base_width: usize,
}

impl ResNetConfig {
    pub fn new(depth: ResNetDepth) -> Self {
        Self {
            depth,
            base_width: 64,
        }
    }

    pub fn with_base_width(mut self, base_width: usize) -> Self {
        self.base_width = base_width.max(1);
        self
    }

    pub fn output_channels(&self, stage: Stage) -> usize {
        let w = self.base_width;
        let e = self.depth.expansion();
        match stage {
            Stage::Conv1 => w,
            Stage::Conv2 => w * e,
            Stage::Conv3 => 2 * w * e,
            Stage::Conv4 => 4 * w * e,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let w = self.base_width;
        let [n2, n3, n4] = self.depth.blocks();
        let bottleneck = self.depth.bottleneck();
        ResNet {
            conv1: Stem::new(w, device),
            conv2: ResidualStage::new(w, w, n2, 1, bottleneck, device),
            conv3: ResidualStage::new(
                self.output_channels(Stage::Conv2),
                2 * w,
                n3,
                2,
                bottleneck,
                device,
            ),
            conv4: ResidualStage::new(
                self.output_channels(Stage::Conv3),
                4 * w,
                n4,
                2,
                bottleneck,
                device,
            ),
        }
    }
}

/// Convolution followed by a stage norm (no activation).
#[derive(Module, Debug)]
pub struct ConvNorm<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: StageNorm<B>,
}

impl<B: Backend> ConvNorm<B> {
    fn new(
        channels: [usize; 2],
        kernel: usize,
        stride: usize,
        padding: usize,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new(channels, [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_bias(false)
            .init(device);
        let norm = StageNormConfig::new(channels[1]).init(device);
        Self { conv, norm }
    }

    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(input), mode)
    }

    fn fix_norm(mut self) -> Self {
        self.norm = self.norm.fix_affine();
        self
    }
}

#[derive(Module, Debug)]
pub struct Stem<B: Backend> {
    pub conv: ConvNorm<B>,
    pool: MaxPool2d,
}

impl<B: Backend> Stem<B> {
    fn new(width: usize, device: &B::Device) -> Self {
        let pool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();
        Self {
            conv: ConvNorm::new([3, width], 7, 2, 3, device),
            pool,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        self.pool.forward(relu(self.conv.forward(input, mode)))
    }

    fn fix_norms(mut self) -> Self {
        self.conv = self.conv.fix_norm();
        self
    }

    fn requires_grad(&self) -> bool {
        self.conv.conv.weight.val().is_require_grad()
    }

    fn norms_require_grad(&self) -> bool {
        self.conv.norm.affine_requires_grad()
    }
}

/// Basic (two 3x3) or bottleneck (1x1, 3x3, 1x1) residual block.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    pub convs: Vec<ConvNorm<B>>,
    pub downsample: Option<ConvNorm<B>>,
}

impl<B: Backend> ResidualBlock<B> {
    fn new(
        in_channels: usize,
        planes: usize,
        stride: usize,
        bottleneck: bool,
        device: &B::Device,
    ) -> Self {
        let (convs, out_channels) = if bottleneck {
            let out = planes * 4;
            (
                vec![
                    ConvNorm::new([in_channels, planes], 1, 1, 0, device),
                    ConvNorm::new([planes, planes], 3, stride, 1, device),
                    ConvNorm::new([planes, out], 1, 1, 0, device),
                ],
                out,
            )
        } else {
            (
                vec![
                    ConvNorm::new([in_channels, planes], 3, stride, 1, device),
                    ConvNorm::new([planes, planes], 3, 1, 1, device),
                ],
                planes,
            )
        };
        let downsample = (stride != 1 || in_channels != out_channels)
            .then(|| ConvNorm::new([in_channels, out_channels], 1, stride, 0, device));
        Self { convs, downsample }
    }

    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(down) => down.forward(input.clone(), mode),
            None => input.clone(),
        };
        let last = self.convs.len() - 1;
        let mut x = input;
        for (i, conv) in self.convs.iter().enumerate() {
            x = conv.forward(x, mode);
            if i < last {
                x = relu(x);
            }
        }
        relu(x + identity)
    }

    fn fix_norms(self) -> Self {
        Self {
            convs: self.convs.into_iter().map(ConvNorm::fix_norm).collect(),
            downsample: self.downsample.map(ConvNorm::fix_norm),
        }
    }

    /// Main path convolutions followed by the downsample projection, if any.
    fn conv_norms(&self) -> impl Iterator<Item = &ConvNorm<B>> {
        self.convs.iter().chain(self.downsample.iter())
    }

    fn norms(&self) -> impl Iterator<Item = &StageNorm<B>> {
        self.conv_norms().map(|conv| &conv.norm)
    }
}

#[derive(Module, Debug)]
pub struct ResidualStage<B: Backend> {
    pub blocks: Vec<ResidualBlock<B>>,
}

impl<B: Backend> ResidualStage<B> {
    fn new(
        in_channels: usize,
        planes: usize,
        count: usize,
        stride: usize,
        bottleneck: bool,
        device: &B::Device,
    ) -> Self {
        let expansion = if bottleneck { 4 } else { 1 };
        let mut blocks = Vec::with_capacity(count.max(1));
        blocks.push(ResidualBlock::new(
            in_channels,
            planes,
            stride,
            bottleneck,
            device,
        ));
        for _ in 1..count {
            blocks.push(ResidualBlock::new(
                planes * expansion,
                planes,
                1,
                bottleneck,
                device,
            ));
        }
        Self { blocks }
    }

    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        self.blocks
            .iter()
            .fold(input, |x, block| block.forward(x, mode))
    }

    fn fix_norms(self) -> Self {
        Self {
            blocks: self
                .blocks
                .into_iter()
                .map(ResidualBlock::fix_norms)
                .collect(),
        }
    }

    fn requires_grad(&self) -> bool {
        self.blocks
            .iter()
            .flat_map(ResidualBlock::conv_norms)
            .any(|conv| conv.conv.weight.val().is_require_grad())
    }

    fn norms_require_grad(&self) -> bool {
        self.blocks
            .iter()
            .flat_map(ResidualBlock::norms)
            .any(StageNorm::affine_requires_grad)
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub conv1: Stem<B>,
    pub conv2: ResidualStage<B>,
    pub conv3: ResidualStage<B>,
    pub conv4: ResidualStage<B>,
}

impl<B: Backend> ResNet<B> {
    /// Run stages in order up to the deepest requested one.
    ///
    /// Each stage normalizes with its entry in `modes`.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        modes: PerStage<Mode>,
        outputs: StageSet,
    ) -> Vec<(Stage, Tensor<B, 4>)> {
        let Some(deepest) = outputs.last() else {
            return Vec::new();
        };
        let mut features = Vec::with_capacity(outputs.len());
        let mut x = input;
        for stage in Stage::ALL.into_iter().take_while(|s| *s <= deepest) {
            let mode = modes.get(stage);
            x = match stage {
                Stage::Conv1 => self.conv1.forward(x, mode),
                Stage::Conv2 => self.conv2.forward(x, mode),
                Stage::Conv3 => self.conv3.forward(x, mode),
                Stage::Conv4 => self.conv4.forward(x, mode),
            };
            if outputs.contains(stage) {
                features.push((stage, x.clone()));
            }
        }
        features
    }

    /// Disable gradients on every parameter owned by `stage`.
    pub fn freeze_stage(mut self, stage: Stage) -> Self {
        match stage {
            Stage::Conv1 => self.conv1 = self.conv1.no_grad(),
            Stage::Conv2 => self.conv2 = self.conv2.no_grad(),
            Stage::Conv3 => self.conv3 = self.conv3.no_grad(),
            Stage::Conv4 => self.conv4 = self.conv4.no_grad(),
        }
        self
    }

    /// Disable gradients on the affine parameters of every norm in every stage.
    pub fn fix_norms(self) -> Self {
        Self {
            conv1: self.conv1.fix_norms(),
            conv2: self.conv2.fix_norms(),
            conv3: self.conv3.fix_norms(),
            conv4: self.conv4.fix_norms(),
        }
    }

    /// Whether any convolution weight in `stage` still receives gradients.
    pub fn stage_requires_grad(&self, stage: Stage) -> bool {
        match stage {
            Stage::Conv1 => self.conv1.requires_grad(),
            Stage::Conv2 => self.conv2.requires_grad(),
            Stage::Conv3 => self.conv3.requires_grad(),
            Stage::Conv4 => self.conv4.requires_grad(),
        }
    }

    /// Whether any norm affine parameter in `stage` still receives gradients.
    pub fn norms_require_grad(&self, stage: Stage) -> bool {
        match stage {
            Stage::Conv1 => self.conv1.norms_require_grad(),
            Stage::Conv2 => self.conv2.norms_require_grad(),
            Stage::Conv3 => self.conv3.norms_require_grad(),
            Stage::Conv4 => self.conv4.norms_require_grad(),
        }
    }

    /// First norm of `stage`, for inspecting running statistics.
    pub fn first_norm(&self, stage: Stage) -> &StageNorm<B> {
        match stage {
            Stage::Conv1 => &self.conv1.conv.norm,
            Stage::Conv2 => &self.conv2.blocks[0].convs[0].norm,
            Stage::Conv3 => &self.conv3.blocks[0].convs[0].norm,
            Stage::Conv4 => &self.conv4.blocks[0].convs[0].norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn stage_outputs_follow_documented_shapes() {
        let device = Default::default();
        let cfg = ResNetConfig::new(ResNetDepth::R50).with_base_width(4);
        let net = cfg.init::<B>(&device);
        let input = Tensor::<B, 4>::zeros([1, 3, 32, 32], &device);
        let features = net.forward(input, PerStage::splat(Mode::Eval), StageSet::all());
        let dims: Vec<_> = features.iter().map(|(s, t)| (*s, t.dims())).collect();
        assert_eq!(
            dims,
            vec![
                (Stage::Conv1, [1, 4, 8, 8]),
                (Stage::Conv2, [1, 16, 8, 8]),
                (Stage::Conv3, [1, 32, 4, 4]),
                (Stage::Conv4, [1, 64, 2, 2]),
            ]
        );
    }

    #[test]
    fn forward_stops_at_deepest_requested_stage() {
        let device = Default::default();
        let net = ResNetConfig::new(ResNetDepth::R18)
            .with_base_width(4)
            .init::<B>(&device);
        let input = Tensor::<B, 4>::zeros([1, 3, 16, 16], &device);
        let features = net.forward(
            input,
            PerStage::splat(Mode::Eval),
            StageSet::single(Stage::Conv2),
        );
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0, Stage::Conv2);
        assert_eq!(features[0].1.dims(), [1, 4, 4, 4]);
    }

    #[test]
    fn block_counts_match_depth() {
        let device = Default::default();
        let net = ResNetConfig::new(ResNetDepth::R34)
            .with_base_width(2)
            .init::<B>(&device);
        assert_eq!(net.conv2.blocks.len(), 3);
        assert_eq!(net.conv3.blocks.len(), 4);
        assert_eq!(net.conv4.blocks.len(), 6);
        assert!(net.conv2.blocks[0].downsample.is_none());
        assert!(net.conv3.blocks[0].downsample.is_some());
    }

    #[test]
    fn trainable_downsample_keeps_stage_trainable() {
        type A = burn::backend::Autodiff<B>;
        let device = Default::default();
        let cfg = ResNetConfig::new(ResNetDepth::R18).with_base_width(2);
        let mut net = cfg.init::<A>(&device).freeze_stage(Stage::Conv3);
        assert!(!net.stage_requires_grad(Stage::Conv3));

        let fresh = cfg.init::<A>(&device);
        net.conv3.blocks[0].downsample = fresh.conv3.blocks[0].downsample.clone();
        assert!(net.stage_requires_grad(Stage::Conv3));
    }
}
