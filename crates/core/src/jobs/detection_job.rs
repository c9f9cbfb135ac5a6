use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::domain::asset::ImageRef;
use crate::catalog::domain::asset_source::{select_images, AssetSource};
use crate::catalog::infrastructure::json_asset_source::JsonAssetSource;
use crate::detection::infrastructure::arcface_encoder::ArcFaceEncoder;
use crate::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use crate::encoding::infrastructure::json_encoding_store::JsonEncodingStore;
use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
use crate::pipeline::detect_faces_use_case::DetectFacesUseCase;
use crate::pipeline::pipeline_logger::LogPipelineLogger;
use crate::shared::model_resolver::{self, ProgressFn, FACE_DETECTOR_MODEL, FACE_ENCODER_MODEL};
use crate::shared::settings::Settings;

const PROGRESS_THROTTLE: usize = 50;

/// Image references due for detection, in manifest order.
pub fn collect_images(
    source: &dyn AssetSource,
    media_root: &Path,
    include_processed: bool,
) -> Result<Vec<ImageRef>, Box<dyn std::error::Error>> {
    let assets = source.list_assets()?;
    let listed = assets.len();
    let images: Vec<ImageRef> = select_images(assets, include_processed)
        .iter()
        .map(|a| a.image_ref(media_root))
        .collect();
    log::info!("{} of {listed} assets selected for detection", images.len());
    Ok(images)
}

/// Detects and encodes faces for every selected asset and replaces the
/// encoding artifact.
pub fn run(settings: &Settings, include_processed: bool) -> Result<String, Box<dyn std::error::Error>> {
    let source = JsonAssetSource::new(&settings.asset_manifest);
    let images = collect_images(&source, &settings.media_root, include_processed)?;

    let detection = &settings.detection;
    let detector_path = model_resolver::resolve(
        &FACE_DETECTOR_MODEL,
        detection.detector_model.as_deref(),
        Some(download_progress(FACE_DETECTOR_MODEL.name)),
    )?;
    let encoder_path = model_resolver::resolve(
        &FACE_ENCODER_MODEL,
        detection.encoder_model.as_deref(),
        Some(download_progress(FACE_ENCODER_MODEL.name)),
    )?;

    let detector = OnnxYoloDetector::new(&detector_path, detection.confidence)?;
    let encoder = ArcFaceEncoder::new(&encoder_path)?;

    let mut use_case = DetectFacesUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(detector),
        Box::new(encoder),
        Box::new(JsonEncodingStore::new(&settings.artifact_path)),
        Box::new(LogPipelineLogger::new("detection", PROGRESS_THROTTLE)),
    );
    if let Some(dir) = &detection.face_crop_dir {
        use_case = use_case.with_crop_dump(Box::new(ImageFileWriter::new()), dir);
    }

    let records = use_case.execute(&images)?;
    Ok(format!(
        "{} faces from {} images written to {}",
        records.len(),
        images.len(),
        settings.artifact_path.display()
    ))
}

/// Logs model download progress in 10% steps.
fn download_progress(name: &'static str) -> ProgressFn {
    let last_step = AtomicU64::new(0);
    Box::new(move |done, total| {
        if total == 0 {
            return;
        }
        let step = done * 10 / total;
        if step > last_step.swap(step, Ordering::Relaxed) {
            log::info!("Downloading {name}: {}%", step * 10);
        }
    })
}
