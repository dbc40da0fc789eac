use std::fs;
use std::path::PathBuf;

use graspdet_tools::ToolConfig;
use models::{Stage, StageSet};

#[test]
fn missing_file_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = ToolConfig::from_path(&tmp.path().join("absent.toml")).unwrap();
    assert!(cfg.is_none());
}

#[test]
fn sections_override_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("graspdet.toml");
    fs::write(
        &path,
        r#"
[detector]
classes = ["__background__", "box", "banana"]
class_agnostic = true

[backbone]
name = "res50"
feature_stages = ["conv3", "conv4"]
pretrained = false
base_width = 8

[resnet]
fixed_blocks = 2
"#,
    )
    .unwrap();

    let cfg = ToolConfig::from_path(&path).unwrap().expect("config present");
    assert_eq!(cfg.classes.len(), 3);
    assert!(cfg.class_agnostic);
    assert_eq!(cfg.backbone, "res50");
    assert_eq!(cfg.fixed_blocks, 2);
    assert_eq!(cfg.output_dir, PathBuf::from("overlays"));
    assert!(cfg.font_path.is_none());

    let det = cfg.detector_config().unwrap();
    assert_eq!(
        det.backbone.feature_stages,
        [Stage::Conv3, Stage::Conv4].into_iter().collect::<StageSet>()
    );
    assert!(!det.backbone.pretrained);
    assert_eq!(det.backbone.base_width, 8);
}

#[test]
fn empty_file_uses_defaults() {
    let cfg = ToolConfig::from_toml_str("").unwrap();
    assert_eq!(cfg.backbone, "res101");
    assert_eq!(cfg.fixed_blocks, 1);
    assert_eq!(cfg.feature_stages, vec!["conv4".to_string()]);
}

#[test]
fn bad_stage_name_surfaces_on_detector_config() {
    let cfg = ToolConfig::from_toml_str("[backbone]\nfeature_stages = [\"conv9\"]\n").unwrap();
    assert!(cfg.detector_config().is_err());
}

#[test]
fn malformed_toml_is_an_error() {
    assert!(ToolConfig::from_toml_str("[resnet]\nfixed_blocks = \"two\"\n").is_err());
}

#[test]
fn viewer_follows_class_list() {
    let cfg = ToolConfig::from_toml_str("[detector]\nclasses = [\"a\", \"b\"]\n").unwrap();
    let viewer = cfg.viewer().unwrap();
    assert_eq!(viewer.classes(), &["a".to_string(), "b".to_string()]);
}

#[test]
fn overlays_are_named_after_the_detection_file() {
    let out = PathBuf::from("overlays");
    let a = graspdet_tools::overlay_path(&out, &PathBuf::from("run1/scene_003.json"));
    let b = graspdet_tools::overlay_path(&out, &PathBuf::from("run2/scene_003_refined.json"));
    assert_eq!(a, out.join("scene_003.png"));
    assert_eq!(b, out.join("scene_003_refined.png"));
}
