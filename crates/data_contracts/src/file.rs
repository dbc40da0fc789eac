use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detection::{GRASP_ROW_LEN, OBJECT_ROW_LEN};

/// Detections for one image as written by an inference step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFile {
    /// Image path, relative to the detection file's directory unless absolute.
    pub image: String,
    #[serde(default)]
    pub objects: Vec<[f32; OBJECT_ROW_LEN]>,
    #[serde(default)]
    pub grasps: Vec<[f32; GRASP_ROW_LEN]>,
    /// Owning object index per valid grasp row (1-based, matching rendered `ind:` labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grasp_owners: Option<Vec<usize>>,
}

#[derive(Debug, Error)]
pub enum DetectionFileError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing image path")]
    MissingImage,
    #[error("{owners} grasp owners given for {grasps} valid grasp rows")]
    OwnerCountMismatch { owners: usize, grasps: usize },
}

impl DetectionFile {
    pub fn load(path: &Path) -> Result<Self, DetectionFileError> {
        let bytes = std::fs::read(path).map_err(|source| DetectionFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: Self =
            serde_json::from_slice(&bytes).map_err(|source| DetectionFileError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), DetectionFileError> {
        if self.image.trim().is_empty() {
            return Err(DetectionFileError::MissingImage);
        }
        if let Some(owners) = &self.grasp_owners {
            let grasps = self.valid_grasp_count();
            if owners.len() != grasps {
                return Err(DetectionFileError::OwnerCountMismatch {
                    owners: owners.len(),
                    grasps,
                });
            }
        }
        Ok(())
    }

    pub fn valid_object_count(&self) -> usize {
        crate::compact_objects(&self.objects).len()
    }

    pub fn valid_grasp_count(&self) -> usize {
        crate::compact_grasps(&self.grasps).len()
    }

    /// Resolve the image path against the directory holding the detection file.
    pub fn image_path(&self, file_dir: &Path) -> PathBuf {
        let image = Path::new(&self.image);
        if image.is_absolute() {
            image.to_path_buf()
        } else {
            file_dir.join(image)
        }
    }
}
