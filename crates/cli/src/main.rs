use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use face_cluster_core::jobs::background::{JobHandle, JobStatus};
use face_cluster_core::jobs::{spawn_clustering, spawn_detection};
use face_cluster_core::shared::settings::Settings;

/// Face detection, encoding and identity clustering for a photo library.
#[derive(Parser)]
#[command(name = "face-cluster")]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Encoding artifact shared by both jobs.
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect and encode faces in not-yet-processed images.
    Detect(DetectArgs),
    /// Group all encoded faces into identities and write sample crops.
    Cluster(ClusterArgs),
}

#[derive(Args)]
struct DetectArgs {
    /// Asset manifest (JSON array of asset rows).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory that relative asset paths resolve against.
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Also process assets already flagged as face-detected.
    #[arg(long)]
    all: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Save every detected face crop to this directory.
    #[arg(long)]
    face_crops: Option<PathBuf>,

    /// Face detector ONNX model (downloaded when omitted).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face encoder ONNX model (downloaded when omitted).
    #[arg(long)]
    encoder_model: Option<PathBuf>,
}

#[derive(Args)]
struct ClusterArgs {
    /// Output directory for identity crops.
    #[arg(long)]
    faces_dir: Option<PathBuf>,

    /// Neighborhood radius in embedding space.
    #[arg(long)]
    eps: Option<f64>,

    /// Faces needed within eps to form an identity, the face itself included.
    #[arg(long)]
    min_samples: Option<usize>,

    /// Maximum crops written per identity.
    #[arg(long)]
    max_samples: Option<usize>,

    /// Seed for crop sampling (random when omitted).
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let handle = match cli.command {
        Command::Detect(args) => spawn_detection(settings, args.all),
        Command::Cluster(_) => spawn_clustering(settings),
    };

    match wait_and_report(handle) {
        JobStatus::Failed(message) => Err(message.into()),
        _ => Ok(()),
    }
}

/// Loads the settings file, applies command-line overrides and validates.
fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &cli.artifact {
        settings.artifact_path = path.clone();
    }

    match &cli.command {
        Command::Detect(args) => {
            override_with(&mut settings.asset_manifest, &args.assets);
            override_with(&mut settings.media_root, &args.media_root);
            let d = &mut settings.detection;
            override_with(&mut d.confidence, &args.confidence);
            if args.face_crops.is_some() {
                d.face_crop_dir = args.face_crops.clone();
            }
            if args.detector_model.is_some() {
                d.detector_model = args.detector_model.clone();
            }
            if args.encoder_model.is_some() {
                d.encoder_model = args.encoder_model.clone();
            }
        }
        Command::Cluster(args) => {
            override_with(&mut settings.faces_dir, &args.faces_dir);
            let c = &mut settings.clustering;
            override_with(&mut c.eps, &args.eps);
            override_with(&mut c.min_samples_per_cluster, &args.min_samples);
            override_with(&mut c.max_samples_per_identity, &args.max_samples);
            if args.seed.is_some() {
                c.seed = args.seed;
            }
        }
    }

    settings.validate()?;
    log::debug!("Effective settings: {settings:?}");
    Ok(settings)
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn wait_and_report(handle: JobHandle) -> JobStatus {
    let name = handle.name().to_string();
    handle.wait(|status| match status {
        JobStatus::Started => println!("{name}: started"),
        JobStatus::Completed(summary) => println!("{name}: completed ({summary})"),
        JobStatus::Failed(message) => println!("{name}: failed ({message})"),
    })
}
