use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array2;
use rand::RngCore;
use thiserror::Error;

use crate::clustering::domain::cluster_assignment::{
    group_labels, identity_count, ClusterAssignment, ClusterLabel,
};
use crate::clustering::domain::face_clusterer::FaceClusterer;
use crate::clustering::domain::sampler::sample_members;
use crate::detection::domain::detection_record::{
    embedding_dimension, DetectionRecord, EmbeddingDimensionError,
};
use crate::imaging::domain::image_reader::{ImageReadError, ImageReader};
use crate::imaging::domain::image_writer::ImageWriter;
use crate::pipeline::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error(transparent)]
    Dimension(#[from] EmbeddingDimensionError),
    #[error("cannot arrange embeddings into a matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    ImageRead(#[from] ImageReadError),
    #[error("failed to write face crop {path}: {message}")]
    CropWrite { path: PathBuf, message: String },
}

/// A representative face written for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeCrop {
    pub label: ClusterLabel,
    pub record_index: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterReport {
    pub assignments: Vec<ClusterAssignment>,
    pub identity_count: usize,
    pub noise_count: usize,
    pub crops: Vec<RepresentativeCrop>,
}

/// Groups detection records into identities and writes a bounded sample of
/// face crops per identity.
pub struct ClusterFacesUseCase {
    clusterer: Box<dyn FaceClusterer>,
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    rng: Box<dyn RngCore + Send>,
    max_samples: usize,
    crop_size: u32,
    logger: Box<dyn PipelineLogger>,
}

impl ClusterFacesUseCase {
    pub fn new(
        clusterer: Box<dyn FaceClusterer>,
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        rng: Box<dyn RngCore + Send>,
        max_samples: usize,
        crop_size: u32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            clusterer,
            reader,
            writer,
            rng,
            max_samples,
            crop_size,
            logger,
        }
    }

    /// Clusters `records` by embedding and writes representative crops to
    /// `<output_dir>/<label>/<uuid>.jpg`. Noise is never sampled.
    ///
    /// The injected RNG decides which members are sampled; crop names are
    /// v4 uuids and never repeat between runs.
    pub fn execute(
        &mut self,
        records: &[DetectionRecord],
        output_dir: &Path,
    ) -> Result<ClusterReport, ClusterError> {
        let Some(dimension) = embedding_dimension(records)? else {
            log::info!("No encodings to cluster");
            return Ok(ClusterReport::default());
        };

        let flat: Vec<f32> = records
            .iter()
            .flat_map(|r| r.embedding.iter().copied())
            .collect();
        let embeddings = Array2::from_shape_vec((records.len(), dimension), flat)?;

        let t0 = Instant::now();
        let labels = self.clusterer.fit(embeddings.view());
        self.logger.timing("cluster", elapsed_ms(t0));

        let assignments = group_labels(&labels);
        let identities = identity_count(&assignments);
        let noise_count = labels.iter().filter(|l| l.is_noise()).count();
        log::info!(
            "Found {identities} identities across {} faces ({noise_count} noise)",
            records.len()
        );
        self.logger.count("identities", identities);
        self.logger.count("noise", noise_count);

        let mut crops = Vec::new();
        let total = assignments.len();
        for (i, assignment) in assignments.iter().enumerate() {
            if !assignment.label.is_noise() {
                self.write_identity(records, assignment, output_dir, &mut crops)?;
            }
            self.logger.progress(i + 1, total);
        }

        self.logger.summary();
        Ok(ClusterReport {
            assignments,
            identity_count: identities,
            noise_count,
            crops,
        })
    }

    fn write_identity(
        &mut self,
        records: &[DetectionRecord],
        assignment: &ClusterAssignment,
        output_dir: &Path,
        crops: &mut Vec<RepresentativeCrop>,
    ) -> Result<(), ClusterError> {
        let label_dir = output_dir.join(assignment.label.to_string());
        let sampled = sample_members(
            &assignment.member_indices,
            self.max_samples,
            self.rng.as_mut(),
        );

        for index in sampled {
            let record = &records[index];
            let t0 = Instant::now();
            let frame = match self.reader.read(&record.image_reference.path) {
                Ok(frame) => frame,
                Err(e) if e.is_skippable() => {
                    log::warn!("Skipping sample {index} of identity {}: {e}", assignment.label);
                    self.logger.count("skipped", 1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let location = record.face_location;
            let fits = location.clamp_to(frame.width(), frame.height()) == Some(location);
            let Some(face) = frame.crop(&location).filter(|_| fits) else {
                log::warn!(
                    "Face {:?} no longer fits {}, skipped",
                    record.face_location,
                    record.image_reference.path.display()
                );
                self.logger.count("skipped", 1);
                continue;
            };

            let path = label_dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
            self.writer
                .write(&path, &face, Some(self.crop_size))
                .map_err(|e| ClusterError::CropWrite {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            self.logger.timing("crop", elapsed_ms(t0));
            self.logger.count("crops", 1);

            crops.push(RepresentativeCrop {
                label: assignment.label,
                record_index: index,
                path,
            });
        }
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
