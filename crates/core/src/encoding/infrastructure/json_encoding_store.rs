use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_record::{embedding_dimension, DetectionRecord};
use crate::encoding::domain::encoding_store::{EncodingStore, EncodingStoreError};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Artifact<'a> {
    version: u32,
    dimension: Option<usize>,
    records: Cow<'a, [DetectionRecord]>,
}

/// Stores detection records as a single JSON document.
///
/// Writes go to `<path>.part` and are renamed over `path` once flushed
/// and synced, so a concurrent reader sees either the previous artifact or
/// the new one in full.
pub struct JsonEncodingStore {
    path: PathBuf,
}

impl JsonEncodingStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }

    fn write_temp(&self, temp: &Path, artifact: &Artifact) -> Result<(), EncodingStoreError> {
        let write_err = |e: std::io::Error| EncodingStoreError::Write {
            path: temp.to_path_buf(),
            source: e,
        };

        let file = File::create(temp).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, artifact).map_err(|e| {
            EncodingStoreError::Serialize {
                path: temp.to_path_buf(),
                source: e,
            }
        })?;
        writer.flush().map_err(write_err)?;
        writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?
            .sync_all()
            .map_err(write_err)
    }
}

impl EncodingStore for JsonEncodingStore {
    fn save(&self, records: &[DetectionRecord]) -> Result<(), EncodingStoreError> {
        let artifact = Artifact {
            version: FORMAT_VERSION,
            dimension: embedding_dimension(records)?,
            records: Cow::Borrowed(records),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EncodingStoreError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp = self.temp_path();
        let result = self.write_temp(&temp, &artifact).and_then(|()| {
            fs::rename(&temp, &self.path).map_err(|e| EncodingStoreError::Write {
                path: self.path.clone(),
                source: e,
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result?;

        log::info!(
            "Saved {} encodings to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<Vec<DetectionRecord>, EncodingStoreError> {
        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodingStoreError::Missing(self.path.clone())
            } else {
                EncodingStoreError::Read {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;

        let artifact: Artifact<'static> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EncodingStoreError::Deserialize {
                path: self.path.clone(),
                source: e,
            })?;
        if artifact.version != FORMAT_VERSION {
            return Err(EncodingStoreError::Version {
                found: artifact.version,
                expected: FORMAT_VERSION,
            });
        }

        let records = artifact.records.into_owned();
        embedding_dimension(&records)?;
        log::debug!(
            "Loaded {} encodings from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}
