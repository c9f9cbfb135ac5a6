use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::catalog::domain::asset::ImageRef;
use crate::detection::domain::detection_record::DetectionRecord;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::encoding::domain::encoding_store::{EncodingStore, EncodingStoreError};
use crate::imaging::domain::image_reader::{ImageReadError, ImageReader};
use crate::imaging::domain::image_writer::ImageWriter;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    ImageRead(#[from] ImageReadError),
    #[error("inference failed on {path}: {message}")]
    Inference { path: PathBuf, message: String },
    #[error(transparent)]
    Store(#[from] EncodingStoreError),
}

/// Destination for a copy of every detected face.
struct CropDump {
    writer: Box<dyn ImageWriter>,
    dir: PathBuf,
}

/// Batch face detection: read → detect → crop → encode, then persist.
///
/// Missing or undecodable images are logged and skipped; everything else
/// aborts the run before the artifact is touched.
pub struct DetectFacesUseCase {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn FaceDetector>,
    encoder: Box<dyn FaceEncoder>,
    store: Box<dyn EncodingStore>,
    crop_dump: Option<CropDump>,
    logger: Box<dyn PipelineLogger>,
}

impl DetectFacesUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn FaceDetector>,
        encoder: Box<dyn FaceEncoder>,
        store: Box<dyn EncodingStore>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            detector,
            encoder,
            store,
            crop_dump: None,
            logger,
        }
    }

    /// Also save every detected face as `<dir>/<uuid>.jpg`.
    pub fn with_crop_dump(mut self, writer: Box<dyn ImageWriter>, dir: &Path) -> Self {
        self.crop_dump = Some(CropDump {
            writer,
            dir: dir.to_path_buf(),
        });
        self
    }

    /// Detects and encodes every face in `images`, in input order, and
    /// replaces the stored artifact with the result.
    pub fn execute(&mut self, images: &[ImageRef]) -> Result<Vec<DetectionRecord>, DetectError> {
        let total = images.len();
        let mut records = Vec::new();

        for (i, image) in images.iter().enumerate() {
            let t0 = Instant::now();
            let frame = match self.reader.read(&image.path) {
                Ok(frame) => frame,
                Err(e) if e.is_skippable() => {
                    log::warn!("Skipping asset {}: {e}", image.asset_id);
                    self.logger.count("skipped", 1);
                    self.logger.progress(i + 1, total);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            self.logger.timing("read", elapsed_ms(t0));

            let t0 = Instant::now();
            let locations = self
                .detector
                .detect(&frame)
                .map_err(|e| inference_error(&image.path, e))?;
            self.logger.timing("detect", elapsed_ms(t0));

            for location in locations {
                let Some(face) = frame.crop(&location) else {
                    log::warn!(
                        "Face {location:?} lies outside {} ({}x{}), dropped",
                        image.path.display(),
                        frame.width(),
                        frame.height()
                    );
                    continue;
                };

                let t0 = Instant::now();
                let embedding = self
                    .encoder
                    .encode(&face)
                    .map_err(|e| inference_error(&image.path, e))?;
                self.logger.timing("encode", elapsed_ms(t0));

                self.dump_crop(&face);
                records.push(DetectionRecord {
                    image_reference: image.clone(),
                    face_location: location,
                    embedding,
                });
                self.logger.count("faces", 1);
            }

            self.logger.count("images", 1);
            self.logger.progress(i + 1, total);
        }

        self.store.save(&records)?;
        self.logger.summary();
        Ok(records)
    }

    fn dump_crop(&self, face: &Frame) {
        let Some(dump) = &self.crop_dump else {
            return;
        };
        let path = dump.dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
        if let Err(e) = dump.writer.write(&path, face, None) {
            log::warn!("Failed to save face crop {}: {e}", path.display());
        }
    }
}

fn inference_error(path: &Path, e: Box<dyn std::error::Error>) -> DetectError {
    DetectError::Inference {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
