use burn::backend::Autodiff;
use clap::Parser;
use graspdet_tools::ToolConfig;
use models::{DefaultBackend, ObjectDetector, Stage};

type ADBackend = Autodiff<DefaultBackend>;

#[derive(Parser, Debug)]
#[command(
    name = "freeze_report",
    about = "Build the configured detector, apply the freeze policy and print per-stage state"
)]
struct Args {
    /// Override resnet.fixed_blocks.
    #[arg(long)]
    fixed_blocks: Option<usize>,
    /// Override backbone.name (e.g. res50).
    #[arg(long)]
    backbone: Option<String>,
    /// Skip pretrained loading and use random weights.
    #[arg(long, default_value_t = false)]
    random_init: bool,
    /// Report evaluation mode instead of training mode.
    #[arg(long, default_value_t = false)]
    eval: bool,
}

fn main() -> anyhow::Result<()> {
    graspdet_tools::init_tracing();
    let args = Args::parse();
    let mut cfg = ToolConfig::load();
    if let Some(name) = args.backbone {
        cfg.backbone = name;
    }
    if args.random_init {
        cfg.pretrained = false;
    }
    let fixed_blocks = args.fixed_blocks.unwrap_or(cfg.fixed_blocks);

    let device = <ADBackend as burn::tensor::backend::Backend>::Device::default();
    let mut detector = ObjectDetector::<ADBackend>::new(cfg.detector_config()?, &device)?;
    detector.apply_freeze_policy(fixed_blocks)?;
    detector.set_training_mode(!args.eval);

    println!(
        "backbone {} ({} classes, class_agnostic={}, fixed_blocks={fixed_blocks}, {})",
        detector.backbone_name(),
        detector.n_classes(),
        detector.class_agnostic(),
        if detector.is_training() { "train" } else { "eval" },
    );
    println!(
        "{:<6} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "stage", "grad", "norm grad", "mode", "norm", "output"
    );
    for stage in Stage::ALL {
        println!(
            "{:<6} {:>10} {:>10} {:>8} {:>8} {:>8}",
            stage.name(),
            detector.stage_requires_grad(stage),
            detector.norms_require_grad(stage),
            format!("{:?}", detector.stage_mode(stage)),
            format!("{:?}", detector.norm_mode(stage)),
            detector.feature_stages().contains(stage),
        );
    }
    Ok(())
}
