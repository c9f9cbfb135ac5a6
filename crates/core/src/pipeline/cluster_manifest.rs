use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::domain::asset::ImageRef;
use crate::detection::domain::detection_record::DetectionRecord;
use crate::pipeline::cluster_faces_use_case::ClusterReport;
use crate::shared::constants::CLUSTER_MANIFEST_NAME;
use crate::shared::face_location::FaceLocation;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to write cluster manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode cluster manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityMember {
    pub image_reference: ImageRef,
    pub face_location: FaceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub label: u32,
    pub members: Vec<IdentityMember>,
    pub crops: Vec<PathBuf>,
}

/// Summary of a clustering run, written as `clusters.json` beside the crops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterManifest {
    pub identity_count: usize,
    pub noise_count: usize,
    pub identities: Vec<IdentityEntry>,
}

impl ClusterManifest {
    pub fn from_report(report: &ClusterReport, records: &[DetectionRecord]) -> Self {
        let identities = report
            .assignments
            .iter()
            .filter_map(|a| a.label.identity().map(|label| (label, a)))
            .map(|(label, assignment)| IdentityEntry {
                label,
                members: assignment
                    .member_indices
                    .iter()
                    .filter_map(|&i| records.get(i))
                    .map(|r| IdentityMember {
                        image_reference: r.image_reference.clone(),
                        face_location: r.face_location,
                    })
                    .collect(),
                crops: report
                    .crops
                    .iter()
                    .filter(|c| c.label == assignment.label)
                    .map(|c| c.path.clone())
                    .collect(),
            })
            .collect();

        Self {
            identity_count: report.identity_count,
            noise_count: report.noise_count,
            identities,
        }
    }

    /// Writes the manifest into `dir`, returning the file path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = dir.join(CLUSTER_MANIFEST_NAME);
        let io_err = |e| ManifestError::Io {
            path: path.clone(),
            source: e,
        };

        fs::create_dir_all(dir).map_err(io_err)?;
        let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_err)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::domain::cluster_assignment::{ClusterAssignment, ClusterLabel};
    use crate::pipeline::cluster_faces_use_case::RepresentativeCrop;
    use tempfile::TempDir;

    fn record(id: &str) -> DetectionRecord {
        DetectionRecord {
            image_reference: ImageRef::new(id, format!("/photos/{id}.jpg")),
            face_location: FaceLocation::new(0, 10, 10, 0).unwrap(),
            embedding: vec![0.0],
        }
    }

    fn report() -> ClusterReport {
        ClusterReport {
            assignments: vec![
                ClusterAssignment {
                    label: ClusterLabel::Identity(0),
                    member_indices: vec![0, 2],
                },
                ClusterAssignment {
                    label: ClusterLabel::Noise,
                    member_indices: vec![1],
                },
            ],
            identity_count: 1,
            noise_count: 1,
            crops: vec![RepresentativeCrop {
                label: ClusterLabel::Identity(0),
                record_index: 2,
                path: PathBuf::from("/faces/0/x.jpg"),
            }],
        }
    }

    #[test]
    fn test_noise_is_counted_but_not_listed() {
        let manifest = ClusterManifest::from_report(&report(), &[record("a"), record("b"), record("c")]);

        assert_eq!(manifest.identity_count, 1);
        assert_eq!(manifest.noise_count, 1);
        assert_eq!(manifest.identities.len(), 1);

        let entry = &manifest.identities[0];
        assert_eq!(entry.label, 0);
        let ids: Vec<&str> = entry
            .members
            .iter()
            .map(|m| m.image_reference.asset_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(entry.crops, vec![PathBuf::from("/faces/0/x.jpg")]);
    }

    #[test]
    fn test_write_creates_readable_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("faces");
        let manifest = ClusterManifest::from_report(&report(), &[record("a"), record("b"), record("c")]);

        let path = manifest.write(&dir).unwrap();

        assert_eq!(path, dir.join("clusters.json"));
        let back: ClusterManifest = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, manifest);
    }
}
