//! Backbone families and the factories that build them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use burn::module::{Ignored, Module};
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::{backend::Backend, Tensor};
use tracing::{debug, info};

use crate::error::{ModelError, ModelResult};
use crate::mode::Mode;
use crate::resnet::{ResNet, ResNetConfig, ResNetDepth};
use crate::stage::{PerStage, Stage, StageSet};

/// Backbone architecture named by a short identifier such as `res101`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneKind {
    ResNet(ResNetDepth),
    /// Recognized so that it can be rejected explicitly.
    Vgg(u8),
}

impl BackboneKind {
    pub fn family(self) -> &'static str {
        match self {
            BackboneKind::ResNet(_) => "resnet",
            BackboneKind::Vgg(_) => "vgg",
        }
    }
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackboneKind::ResNet(depth) => f.write_str(depth.name()),
            BackboneKind::Vgg(depth) => write!(f, "vgg{depth}"),
        }
    }
}

impl FromStr for BackboneKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "res18" => BackboneKind::ResNet(ResNetDepth::R18),
            "res34" => BackboneKind::ResNet(ResNetDepth::R34),
            "res50" => BackboneKind::ResNet(ResNetDepth::R50),
            "res101" => BackboneKind::ResNet(ResNetDepth::R101),
            "res152" => BackboneKind::ResNet(ResNetDepth::R152),
            "vgg11" => BackboneKind::Vgg(11),
            "vgg13" => BackboneKind::Vgg(13),
            "vgg16" => BackboneKind::Vgg(16),
            "vgg19" => BackboneKind::Vgg(19),
            other => return Err(ModelError::UnknownBackbone(other.to_string())),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone)]
pub struct BackboneConfig {
    /// Architecture identifier, e.g. `res101`.
    pub name: String,
    /// Stages whose outputs the extractor returns.
    pub feature_stages: StageSet,
    pub pretrained: bool,
    /// Directory holding `<name>.bin` records for pretrained loading.
    pub weights_dir: PathBuf,
    pub base_width: usize,
}

impl BackboneConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature_stages: StageSet::single(Stage::Conv4),
            pretrained: true,
            weights_dir: PathBuf::from("assets/weights"),
            base_width: 64,
        }
    }

    pub fn with_feature_stages(mut self, stages: StageSet) -> Self {
        self.feature_stages = stages;
        self
    }

    pub fn with_pretrained(mut self, pretrained: bool) -> Self {
        self.pretrained = pretrained;
        self
    }

    pub fn with_weights_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.weights_dir = dir.into();
        self
    }

    pub fn with_base_width(mut self, base_width: usize) -> Self {
        self.base_width = base_width;
        self
    }

    pub fn kind(&self) -> ModelResult<BackboneKind> {
        self.name.parse()
    }

    /// Record path without extension; the recorder appends `.bin`.
    pub fn weights_stem(&self) -> PathBuf {
        self.weights_dir.join(&self.name)
    }
}

/// Staged feature extractor built by a [`BackboneFactory`].
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    trunk: ResNet<B>,
    outputs: Ignored<StageSet>,
    kind: Ignored<BackboneKind>,
}

impl<B: Backend> FeatureExtractor<B> {
    pub fn new(trunk: ResNet<B>, kind: BackboneKind, outputs: StageSet) -> Self {
        Self {
            trunk,
            outputs: Ignored(outputs),
            kind: Ignored(kind),
        }
    }

    pub fn kind(&self) -> BackboneKind {
        self.kind.0
    }

    pub fn outputs(&self) -> StageSet {
        self.outputs.0
    }

    pub fn trunk(&self) -> &ResNet<B> {
        &self.trunk
    }

    pub fn forward(&self, input: Tensor<B, 4>, modes: PerStage<Mode>) -> Vec<(Stage, Tensor<B, 4>)> {
        self.trunk.forward(input, modes, self.outputs.0)
    }

    pub fn freeze_stage(mut self, stage: Stage) -> Self {
        self.trunk = self.trunk.freeze_stage(stage);
        self
    }

    pub fn fix_norms(mut self) -> Self {
        self.trunk = self.trunk.fix_norms();
        self
    }
}

/// Builds the backbone for one architecture family.
pub trait BackboneFactory<B: Backend> {
    fn family(&self) -> &'static str;

    fn build(&self, config: &BackboneConfig, device: &B::Device)
        -> ModelResult<FeatureExtractor<B>>;
}

pub struct ResNetFactory {
    pub depth: ResNetDepth,
}

impl<B: Backend> BackboneFactory<B> for ResNetFactory {
    fn family(&self) -> &'static str {
        "resnet"
    }

    fn build(
        &self,
        config: &BackboneConfig,
        device: &B::Device,
    ) -> ModelResult<FeatureExtractor<B>> {
        if config.feature_stages.is_empty() {
            return Err(ModelError::NoFeatureStages);
        }
        let mut trunk = ResNetConfig::new(self.depth)
            .with_base_width(config.base_width)
            .init::<B>(device);
        if config.pretrained {
            let stem = config.weights_stem();
            let path = stem.with_extension("bin");
            if !path.exists() {
                return Err(ModelError::MissingWeights { path });
            }
            info!(backbone = %config.name, path = %path.display(), "loading pretrained weights");
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            trunk = trunk
                .load_file(stem, &recorder, device)
                .map_err(|e| ModelError::Weights {
                    path,
                    reason: format!("{e:?}"),
                })?;
        } else {
            info!(backbone = %config.name, "initializing backbone with random weights");
        }
        Ok(FeatureExtractor::new(
            trunk,
            BackboneKind::ResNet(self.depth),
            config.feature_stages,
        ))
    }
}

/// VGG trunks are not staged yet; building one is a configuration error.
pub struct VggFactory {
    pub depth: u8,
}

impl<B: Backend> BackboneFactory<B> for VggFactory {
    fn family(&self) -> &'static str {
        "vgg"
    }

    fn build(
        &self,
        config: &BackboneConfig,
        _device: &B::Device,
    ) -> ModelResult<FeatureExtractor<B>> {
        Err(ModelError::UnsupportedBackbone {
            family: "vgg",
            name: config.name.clone(),
        })
    }
}

pub fn factory_for<B: Backend>(kind: BackboneKind) -> Box<dyn BackboneFactory<B>> {
    match kind {
        BackboneKind::ResNet(depth) => Box::new(ResNetFactory { depth }),
        BackboneKind::Vgg(depth) => Box::new(VggFactory { depth }),
    }
}

/// Parse the backbone name and build it through the matching factory.
pub fn build_backbone<B: Backend>(
    config: &BackboneConfig,
    device: &B::Device,
) -> ModelResult<FeatureExtractor<B>> {
    let factory = factory_for::<B>(config.kind()?);
    debug!(family = factory.family(), backbone = %config.name, "building backbone");
    factory.build(config, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn names_round_trip_through_display() {
        for name in ["res18", "res34", "res50", "res101", "res152", "vgg16"] {
            let kind: BackboneKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn vgg_is_rejected_by_its_factory() {
        let device = Default::default();
        let cfg = BackboneConfig::new("vgg16").with_pretrained(false);
        let err = build_backbone::<B>(&cfg, &device).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedBackbone { family: "vgg", .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let device = Default::default();
        let cfg = BackboneConfig::new("mobilenet").with_pretrained(false);
        let err = build_backbone::<B>(&cfg, &device).unwrap_err();
        assert!(matches!(err, ModelError::UnknownBackbone(ref n) if n == "mobilenet"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn pretrained_without_record_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg = BackboneConfig::new("res18")
            .with_base_width(2)
            .with_weights_dir(tmp.path());
        let err = build_backbone::<B>(&cfg, &device).unwrap_err();
        assert!(matches!(err, ModelError::MissingWeights { path } if path == tmp.path().join("res18.bin")));
    }

    #[test]
    fn empty_feature_stages_rejected() {
        let device = Default::default();
        let cfg = BackboneConfig::new("res18")
            .with_pretrained(false)
            .with_feature_stages(StageSet::empty());
        assert!(matches!(
            build_backbone::<B>(&cfg, &device),
            Err(ModelError::NoFeatureStages)
        ));
    }
}
