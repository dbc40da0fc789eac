//! Detector base: backbone composition, freeze policy and training-mode control.

use std::collections::HashSet;

use burn::module::{Ignored, Module};
use burn::tensor::{backend::Backend, Tensor};
use tracing::{debug, info};

use crate::backbone::{build_backbone, BackboneConfig, BackboneFactory, FeatureExtractor};
use crate::error::{ModelError, ModelResult};
use crate::mode::Mode;
use crate::resnet::ResNet;
use crate::stage::{PerStage, Stage, StageSet};

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Class names; position is the class id.
    pub classes: Vec<String>,
    /// Share box regression across classes.
    pub class_agnostic: bool,
    pub backbone: BackboneConfig,
}

impl DetectorConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        let mut seen = HashSet::new();
        for name in &self.classes {
            if !seen.insert(name.as_str()) {
                return Err(ModelError::DuplicateClass(name.clone()));
            }
        }
        Ok(())
    }
}

/// How many stages past `conv1` are excluded from gradient updates.
///
/// `conv1` is always fixed; `conv{s}` for `s` in 2..=4 is fixed iff
/// `fixed_stages >= s - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezePolicy {
    fixed_stages: usize,
}

impl FreezePolicy {
    pub const MAX_FIXED_STAGES: usize = 3;

    pub fn new(fixed_stages: usize) -> ModelResult<Self> {
        if fixed_stages > Self::MAX_FIXED_STAGES {
            return Err(ModelError::InvalidFixedStages(fixed_stages));
        }
        Ok(Self { fixed_stages })
    }

    pub fn fixed_stages(self) -> usize {
        self.fixed_stages
    }

    pub fn is_frozen(self, stage: Stage) -> bool {
        stage == Stage::Conv1 || self.fixed_stages + 1 >= stage.ordinal()
    }

    pub fn frozen_stages(self) -> StageSet {
        Stage::ALL.into_iter().filter(|s| self.is_frozen(*s)).collect()
    }
}

/// Per-stage behavior plus per-stage norm behavior.
///
/// A stage normalizes with training behavior only when both its own mode and
/// its norm mode are [`Mode::Train`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageModes {
    stage: PerStage<Mode>,
    norm: PerStage<Mode>,
}

impl StageModes {
    pub fn eval_all() -> Self {
        Self {
            stage: PerStage::splat(Mode::Eval),
            norm: PerStage::splat(Mode::Eval),
        }
    }

    /// First phase of entering training: everything trains.
    pub fn enable_all(&mut self) {
        self.stage = PerStage::splat(Mode::Train);
        self.norm = PerStage::splat(Mode::Train);
    }

    /// Second phase: pin the frozen stages and every norm back to evaluation.
    pub fn restrict_frozen(&mut self, policy: FreezePolicy) {
        for stage in policy.frozen_stages().iter() {
            *self.stage.get_mut(stage) = Mode::Eval;
        }
        self.norm = PerStage::splat(Mode::Eval);
    }

    pub fn stage(&self, stage: Stage) -> Mode {
        self.stage.get(stage)
    }

    pub fn norm(&self, stage: Stage) -> Mode {
        self.norm.get(stage)
    }

    pub fn effective(&self) -> PerStage<Mode> {
        let mut out = PerStage::splat(Mode::Eval);
        for stage in Stage::ALL {
            *out.get_mut(stage) = self.stage(stage).and(self.norm(stage));
        }
        out
    }
}

/// Immutable configuration kept alongside the backbone.
#[derive(Debug, Clone)]
pub struct DetectorMeta {
    classes: Vec<String>,
    class_agnostic: bool,
    backbone_name: String,
    pretrained: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainState {
    policy: Option<FreezePolicy>,
    modes: StageModes,
    training: bool,
}

/// Base shared by concrete detectors: a staged backbone plus its class list.
#[derive(Module, Debug)]
pub struct ObjectDetector<B: Backend> {
    feat_extractor: FeatureExtractor<B>,
    meta: Ignored<DetectorMeta>,
    state: Ignored<TrainState>,
}

impl<B: Backend> ObjectDetector<B> {
    /// Build the backbone named in `config` and store the detector configuration.
    ///
    /// Starts in evaluation mode with no freeze policy applied.
    pub fn new(config: DetectorConfig, device: &B::Device) -> ModelResult<Self> {
        config.validate()?;
        let feat_extractor = build_backbone::<B>(&config.backbone, device)?;
        Ok(Self::from_parts(config, feat_extractor))
    }

    pub fn with_factory(
        config: DetectorConfig,
        factory: &dyn BackboneFactory<B>,
        device: &B::Device,
    ) -> ModelResult<Self> {
        config.validate()?;
        debug!(family = factory.family(), backbone = %config.backbone.name, "building backbone");
        let feat_extractor = factory.build(&config.backbone, device)?;
        Ok(Self::from_parts(config, feat_extractor))
    }

    fn from_parts(config: DetectorConfig, feat_extractor: FeatureExtractor<B>) -> Self {
        info!(
            backbone = %config.backbone.name,
            family = feat_extractor.kind().family(),
            classes = config.classes.len(),
            stages = ?feat_extractor.outputs().names(),
            "detector initialized"
        );
        Self {
            feat_extractor,
            meta: Ignored(DetectorMeta {
                classes: config.classes,
                class_agnostic: config.class_agnostic,
                backbone_name: config.backbone.name,
                pretrained: config.backbone.pretrained,
            }),
            state: Ignored(TrainState {
                modes: StageModes::eval_all(),
                ..Default::default()
            }),
        }
    }

    /// Disable gradients on the fixed stages and on every norm's affine parameters.
    ///
    /// Fails without touching the detector if `fixed_stages > 3`, or if it would
    /// thaw a stage fixed by an earlier call.
    pub fn apply_freeze_policy(&mut self, fixed_stages: usize) -> ModelResult<()> {
        let policy = FreezePolicy::new(fixed_stages)?;
        if let Some(current) = self.state.0.policy {
            if policy.fixed_stages() < current.fixed_stages() {
                return Err(ModelError::ThawRejected {
                    current: current.fixed_stages(),
                    requested: policy.fixed_stages(),
                });
            }
        }

        let mut extractor = self.feat_extractor.clone();
        for stage in policy.frozen_stages().iter() {
            extractor = extractor.freeze_stage(stage);
        }
        self.feat_extractor = extractor.fix_norms();
        self.state.0.policy = Some(policy);
        debug!(
            fixed_stages,
            frozen = ?policy.frozen_stages().names(),
            "freeze policy applied"
        );
        Ok(())
    }

    /// Switch between training and evaluation behavior.
    ///
    /// Training runs two phases: enable every stage and norm, then pin the
    /// frozen stages and all norms back to evaluation.
    pub fn set_training_mode(&mut self, training: bool) {
        let state = &mut self.state.0;
        if training {
            let policy = state.policy.unwrap_or_default();
            state.modes.enable_all();
            state.modes.restrict_frozen(policy);
        } else {
            state.modes = StageModes::eval_all();
        }
        state.training = training;
        debug!(training, modes = ?state.modes, "training mode set");
    }

    /// Requested stage features, in stage order.
    pub fn forward_features(&self, images: Tensor<B, 4>) -> Vec<(Stage, Tensor<B, 4>)> {
        self.feat_extractor
            .forward(images, self.state.0.modes.effective())
    }

    pub fn classes(&self) -> &[String] {
        &self.meta.0.classes
    }

    pub fn n_classes(&self) -> usize {
        self.meta.0.classes.len()
    }

    pub fn class_agnostic(&self) -> bool {
        self.meta.0.class_agnostic
    }

    pub fn backbone_name(&self) -> &str {
        &self.meta.0.backbone_name
    }

    pub fn pretrained(&self) -> bool {
        self.meta.0.pretrained
    }

    pub fn feature_stages(&self) -> StageSet {
        self.feat_extractor.outputs()
    }

    /// Fixed stage count of the applied policy, if any.
    pub fn fixed_stages(&self) -> Option<usize> {
        self.state.0.policy.map(FreezePolicy::fixed_stages)
    }

    pub fn is_training(&self) -> bool {
        self.state.0.training
    }

    pub fn stage_mode(&self, stage: Stage) -> Mode {
        self.state.0.modes.stage(stage)
    }

    pub fn norm_mode(&self, stage: Stage) -> Mode {
        self.state.0.modes.norm(stage)
    }

    pub fn stage_requires_grad(&self, stage: Stage) -> bool {
        self.feat_extractor.trunk().stage_requires_grad(stage)
    }

    pub fn norms_require_grad(&self, stage: Stage) -> bool {
        self.feat_extractor.trunk().norms_require_grad(stage)
    }

    pub fn backbone(&self) -> &ResNet<B> {
        self.feat_extractor.trunk()
    }
}
