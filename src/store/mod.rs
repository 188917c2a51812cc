//! Durable artifact store for the trained pipeline and its metadata.
//!
//! Two JSON files under one directory: the model blob and the metadata
//! record. Writes land in a temp file first and are renamed into place, so a
//! crashed writer never leaves a torn artifact under the final name. The
//! metadata carries the model blob's SHA-256 and `load` verifies it.
//!
//! Single-writer by design. When several sessions share one store, the first
//! to train wins and the rest silently reuse its artifact.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::app_dirs;
use crate::pipeline::artifact::{ModelMetadata, TrainedPipeline};

/// Filename of the serialized pipeline blob.
pub const MODEL_FILE_NAME: &str = "forest_model.json";
/// Filename of the metadata record.
pub const META_FILE_NAME: &str = "forest_meta.json";

#[derive(Debug, Error)]
pub enum StoreError {
    /// No artifact exists in the store directory.
    #[error("no model artifact found")]
    NotFound,
    #[error("artifact io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The model blob does not match the checksum recorded in the metadata.
    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    /// The artifact parsed but fails structural validation.
    #[error("invalid model artifact: {0}")]
    Invalid(String),
    #[error(transparent)]
    AppDir(#[from] app_dirs::AppDirError),
}

/// Filesystem-backed store holding at most one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store anchored at the per-user app directory.
    pub fn default_location() -> Result<Self, StoreError> {
        Ok(Self::new(app_dirs::artifacts_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a complete artifact (model + metadata) is present.
    pub fn has(&self) -> bool {
        self.model_path().is_file() && self.meta_path().is_file()
    }

    /// Load and verify the stored artifact.
    pub fn load(&self) -> Result<(TrainedPipeline, ModelMetadata), StoreError> {
        if !self.has() {
            return Err(StoreError::NotFound);
        }
        let meta_bytes = self.read(&self.meta_path())?;
        let meta: ModelMetadata = serde_json::from_slice(&meta_bytes)?;

        let model_bytes = self.read(&self.model_path())?;
        let actual = sha256_hex(&model_bytes);
        if actual != meta.model_sha256 {
            return Err(StoreError::ChecksumMismatch {
                expected: meta.model_sha256,
                actual,
            });
        }

        let pipeline: TrainedPipeline = serde_json::from_slice(&model_bytes)?;
        pipeline.validate().map_err(StoreError::Invalid)?;
        Ok((pipeline, meta))
    }

    /// Persist an artifact, returning the metadata with its checksum stamped.
    pub fn save(
        &self,
        pipeline: &TrainedPipeline,
        meta: ModelMetadata,
    ) -> Result<ModelMetadata, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let model_bytes = serde_json::to_vec(pipeline)?;
        let meta = ModelMetadata {
            model_sha256: sha256_hex(&model_bytes),
            ..meta
        };
        let meta_bytes = serde_json::to_vec_pretty(&meta)?;

        self.write_atomic(&self.model_path(), &model_bytes)?;
        self.write_atomic(&self.meta_path(), &meta_bytes)?;
        Ok(meta)
    }

    /// Remove any stored artifact. The next `train_or_load` retrains.
    pub fn clear(&self) -> Result<(), StoreError> {
        for path in [self.model_path(), self.meta_path()] {
            if path.exists() {
                fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })?;
            }
        }
        Ok(())
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE_NAME)
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE_NAME)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
