use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use data_contracts::DetectionFile;
use graspdet_tools::ToolConfig;
use tracing::{debug, info, warn};
use vision_core::DataViewer;

#[derive(Parser, Debug)]
#[command(
    name = "draw_detections",
    about = "Overlay object boxes and grasp rectangles from detection JSON files"
)]
struct Args {
    /// Detection JSON files, or directories scanned for `*.json`.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output directory (defaults to viewer.output_dir from the config).
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Keep going when a single file fails.
    #[arg(long, default_value_t = false)]
    keep_going: bool,
}

fn collect_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("reading {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn render_one(viewer: &DataViewer, path: &Path, out_dir: &Path) -> anyhow::Result<PathBuf> {
    let dets = DetectionFile::load(path)?;
    debug!(
        input = %path.display(),
        objects = dets.valid_object_count(),
        grasps = dets.valid_grasp_count(),
        "detections loaded"
    );
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let img_path = dets.image_path(dir);
    let mut img = image::open(&img_path)
        .with_context(|| format!("opening image {}", img_path.display()))?
        .into_rgb8();

    match &dets.grasp_owners {
        Some(owners) => {
            viewer.draw_grasps_with_owners(&mut img, &dets.objects, &dets.grasps, owners)?;
        }
        None => {
            viewer.draw_object_detections(&mut img, &dets.objects, None)?;
            viewer.draw_grasp_detections(&mut img, &dets.grasps, None)?;
        }
    }

    let out_path = graspdet_tools::overlay_path(out_dir, path);
    img.save(&out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;
    Ok(out_path)
}

fn main() -> anyhow::Result<()> {
    graspdet_tools::init_tracing();
    let args = Args::parse();
    let cfg = ToolConfig::load();
    let viewer = cfg.viewer()?;
    let out_dir = args.out_dir.unwrap_or_else(|| cfg.output_dir.clone());
    fs::create_dir_all(&out_dir)?;

    let mut written = 0usize;
    for path in collect_inputs(&args.inputs)? {
        match render_one(&viewer, &path, &out_dir) {
            Ok(out) => {
                info!(input = %path.display(), output = %out.display(), "overlay written");
                written += 1;
            }
            Err(err) if args.keep_going => {
                warn!(input = %path.display(), "skipping: {err:#}");
            }
            Err(err) => return Err(err.context(format!("rendering {}", path.display()))),
        }
    }

    println!("{written} overlays written to {}", out_dir.display());
    Ok(())
}
