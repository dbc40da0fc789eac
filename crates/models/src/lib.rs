//! Burn backbones and the detector base used by graspdet.
//!
//! - `ResNet`: stem plus residual stages, addressed through [`Stage`].
//! - `ObjectDetector`: composes a backbone, owns the class list and applies the
//!   stage-freezing policy and training-mode transitions.
//!
//! Burn has no module-level train/eval flag, so every stage receives an explicit
//! [`Mode`] on each forward pass.

#![recursion_limit = "256"]

pub mod backbone;
pub mod detector;
pub mod error;
pub mod mode;
pub mod norm;
pub mod resnet;
pub mod stage;

pub use backbone::{
    build_backbone, factory_for, BackboneConfig, BackboneFactory, BackboneKind,
    FeatureExtractor, ResNetFactory, VggFactory,
};
pub use detector::{DetectorConfig, FreezePolicy, ObjectDetector, StageModes};
pub use error::{ErrorKind, ModelError, ModelResult};
pub use mode::Mode;
pub use norm::{StageNorm, StageNormConfig};
pub use resnet::{ResNet, ResNetConfig, ResNetDepth};
pub use stage::{PerStage, Stage, StageSet};

/// Backend alias for tools (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type DefaultBackend = burn::backend::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type DefaultBackend = burn::backend::NdArray<f32>;

pub mod prelude {
    pub use super::{
        BackboneConfig, DetectorConfig, Mode, ModelError, ObjectDetector, Stage, StageSet,
    };
}
