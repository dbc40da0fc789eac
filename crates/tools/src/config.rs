use std::path::{Path, PathBuf};

use anyhow::Context;
use models::{BackboneConfig, DetectorConfig, StageSet};
use serde::Deserialize;
use tracing::warn;
use vision_core::{DataViewer, Typeface};

const DEFAULT_CONFIG_NAME: &str = "graspdet.toml";
const CONFIG_ENV: &str = "GRASPDET_CONFIG";

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub classes: Vec<String>,
    pub class_agnostic: bool,
    pub backbone: String,
    pub feature_stages: Vec<String>,
    pub pretrained: bool,
    pub weights_dir: PathBuf,
    pub base_width: usize,
    /// Stages past `conv1` excluded from gradient updates.
    pub fixed_blocks: usize,
    pub font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            classes: vec!["__background__".to_string()],
            class_agnostic: false,
            backbone: "res101".to_string(),
            feature_stages: vec!["conv4".to_string()],
            pretrained: true,
            weights_dir: PathBuf::from("assets/weights"),
            base_width: 64,
            fixed_blocks: 1,
            font_path: None,
            output_dir: PathBuf::from("overlays"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ToolConfigFile {
    detector: Option<DetectorSection>,
    backbone: Option<BackboneSection>,
    resnet: Option<ResnetSection>,
    viewer: Option<ViewerSection>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorSection {
    classes: Option<Vec<String>>,
    class_agnostic: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct BackboneSection {
    name: Option<String>,
    feature_stages: Option<Vec<String>>,
    pretrained: Option<bool>,
    weights_dir: Option<String>,
    base_width: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ResnetSection {
    fixed_blocks: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ViewerSection {
    font_path: Option<String>,
    output_dir: Option<String>,
}

impl ToolConfig {
    /// Load from `$GRASPDET_CONFIG`, else `graspdet.toml`, else defaults.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        let cfg = match Self::from_path(&path) {
            Ok(Some(cfg)) => cfg,
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("config {}: {err:#}; using defaults", path.display());
                Self::default()
            }
        };
        cfg.warn_if_invalid();
        cfg
    }

    /// `Ok(None)` when the file does not exist.
    pub fn from_path(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&raw).map(Some)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let file: ToolConfigFile = toml::from_str(raw).context("parsing config TOML")?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let defaults = Self::default();
        let detector = file.detector.unwrap_or_default();
        let backbone = file.backbone.unwrap_or_default();
        let viewer = file.viewer.unwrap_or_default();
        ToolConfig {
            classes: detector.classes.unwrap_or(defaults.classes),
            class_agnostic: detector.class_agnostic.unwrap_or(defaults.class_agnostic),
            backbone: backbone
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.backbone),
            feature_stages: backbone.feature_stages.unwrap_or(defaults.feature_stages),
            pretrained: backbone.pretrained.unwrap_or(defaults.pretrained),
            weights_dir: backbone
                .weights_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.weights_dir),
            base_width: backbone.base_width.unwrap_or(defaults.base_width),
            fixed_blocks: file
                .resnet
                .and_then(|r| r.fixed_blocks)
                .unwrap_or(defaults.fixed_blocks),
            font_path: viewer.font_path.map(|v| expand_path(&v)),
            output_dir: viewer
                .output_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.output_dir),
        }
    }

    fn warn_if_invalid(&self) {
        if self.classes.len() <= 1 {
            warn!("config: detector.classes lists {} class(es)", self.classes.len());
        }
        if self.fixed_blocks > models::FreezePolicy::MAX_FIXED_STAGES {
            warn!(
                "config: resnet.fixed_blocks = {} is out of range; freezing will fail",
                self.fixed_blocks
            );
        }
        if self.pretrained && !self.weights_dir.exists() {
            warn!(
                "config: weights_dir {} does not exist; pretrained loading will fail",
                self.weights_dir.display()
            );
        }
        if let Some(font) = &self.font_path {
            if !font.exists() {
                warn!("config: font_path {} does not exist", font.display());
            }
        }
    }

    pub fn detector_config(&self) -> anyhow::Result<DetectorConfig> {
        let stages = StageSet::parse(&self.feature_stages[..])?;
        Ok(DetectorConfig {
            classes: self.classes.clone(),
            class_agnostic: self.class_agnostic,
            backbone: BackboneConfig::new(self.backbone.clone())
                .with_feature_stages(stages)
                .with_pretrained(self.pretrained)
                .with_weights_dir(self.weights_dir.clone())
                .with_base_width(self.base_width),
        })
    }

    pub fn viewer(&self) -> anyhow::Result<DataViewer> {
        let viewer = DataViewer::new(self.classes.clone())?;
        Ok(match &self.font_path {
            Some(path) => viewer.with_typeface(Typeface::from_file(path)?),
            None => viewer,
        })
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let raw = expand_env(raw);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (raw.as_str(), home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}

/// Replace `${VAR}` with its value; unknown variables are left as written.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&rest[start..start + end + 3]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
