use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::clustering::infrastructure::dbscan_clusterer::DbscanClusterer;
use crate::detection::domain::detection_record::DetectionRecord;
use crate::encoding::domain::encoding_store::EncodingStore;
use crate::encoding::infrastructure::json_encoding_store::JsonEncodingStore;
use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
use crate::pipeline::cluster_faces_use_case::ClusterFacesUseCase;
use crate::pipeline::cluster_manifest::ClusterManifest;
use crate::pipeline::pipeline_logger::LogPipelineLogger;
use crate::shared::constants::CLUSTER_MANIFEST_NAME;
use crate::shared::settings::{ClusterSettings, Settings};

const PROGRESS_THROTTLE: usize = 10;

fn sampling_rng(settings: &ClusterSettings) -> Box<dyn RngCore + Send> {
    match settings.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    }
}

/// Sibling directory the next crop tree is built in, `<faces_dir>.part`.
fn staging_dir(faces_dir: &Path) -> PathBuf {
    let mut name = faces_dir.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Moves `staging` over `target`, dropping whatever `target` held.
fn replace_dir(staging: &Path, target: &Path) -> std::io::Result<()> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::rename(staging, target)
}

/// Clusters every stored encoding and writes representative crops plus a
/// `clusters.json` manifest under the faces directory.
///
/// The faces directory is rebuilt from scratch: the new tree is written to
/// `<faces_dir>.part` and replaces the previous run's only once complete.
pub fn run(settings: &Settings) -> Result<String, Box<dyn std::error::Error>> {
    let records = JsonEncodingStore::new(&settings.artifact_path).load()?;
    let faces_dir = &settings.faces_dir;
    let staging = staging_dir(faces_dir);
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .map_err(|e| format!("Cannot clear {}: {e}", staging.display()))?;
    }

    let result = build_crop_tree(settings, &records, &staging);
    if result.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }
    let summary = result?;

    replace_dir(&staging, faces_dir)
        .map_err(|e| format!("Cannot move crops into {}: {e}", faces_dir.display()))?;
    Ok(summary)
}

fn build_crop_tree(
    settings: &Settings,
    records: &[DetectionRecord],
    staging: &Path,
) -> Result<String, Box<dyn std::error::Error>> {
    let cfg = &settings.clustering;

    let mut use_case = ClusterFacesUseCase::new(
        Box::new(DbscanClusterer::new(cfg.eps, cfg.min_samples_per_cluster)),
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        sampling_rng(cfg),
        cfg.max_samples_per_identity,
        cfg.crop_size,
        Box::new(LogPipelineLogger::new("clustering", PROGRESS_THROTTLE)),
    );
    let mut report = use_case.execute(records, staging)?;
    for crop in &mut report.crops {
        if let Ok(relative) = crop.path.strip_prefix(staging) {
            crop.path = settings.faces_dir.join(relative);
        }
    }
    ClusterManifest::from_report(&report, records).write(staging)?;

    Ok(format!(
        "{} identities, {} noise faces, {} crops; manifest at {}",
        report.identity_count,
        report.noise_count,
        report.crops.len(),
        settings.faces_dir.join(CLUSTER_MANIFEST_NAME).display()
    ))
}
