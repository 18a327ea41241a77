//! Startup artifact loading
//!
//! Reads the mapping table and both model artifacts from a directory. When
//! a `manifest.json` is present its SHA-256 digests are checked before any
//! artifact is parsed. Each file is read into memory in one go and its
//! handle closed before parsing starts.

use crate::error::{Result, ValuationError};
use crate::mapping::MappingTable;
use crate::predictor::{BrandInfluenceModel, TechnicalSpecModel};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MAPPINGS_FILE: &str = "mappings.json";
pub const TECH_MODEL_FILE: &str = "tech_model.json";
pub const BRAND_MODEL_FILE: &str = "brand_model.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Maximum artifact size in bytes (16MB)
pub const MAX_ARTIFACT_BYTES: u64 = 16 * 1024 * 1024;

/// Expected digests of the artifact files
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactManifest {
    pub files: BTreeMap<String, String>,
}

/// Parsed artifacts, ready to be bundled into a context
pub struct LoadedArtifacts {
    pub mapping: MappingTable,
    pub technical: TechnicalSpecModel,
    pub brand: BrandInfluenceModel,
}

/// Loads artifacts from a directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    verify_manifest: bool,
}

impl ArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            verify_manifest: true,
        }
    }

    pub fn verify_manifest(mut self, verify: bool) -> Self {
        self.verify_manifest = verify;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> Result<LoadedArtifacts> {
        let manifest = if self.verify_manifest {
            self.load_manifest()?
        } else {
            None
        };

        let mapping_bytes = self.read_artifact(MAPPINGS_FILE, manifest.as_ref())?;
        let tech_bytes = self.read_artifact(TECH_MODEL_FILE, manifest.as_ref())?;
        let brand_bytes = self.read_artifact(BRAND_MODEL_FILE, manifest.as_ref())?;

        let mapping = MappingTable::from_json(&mapping_bytes)?;
        let technical = TechnicalSpecModel::from_json(&tech_bytes)?;
        let brand = BrandInfluenceModel::from_json(&brand_bytes)?;

        info!(
            dir = %self.dir.display(),
            mapping_version = %mapping.version(),
            technical_version = %technical.version(),
            brand_version = %brand.version(),
            checksums_verified = manifest.is_some(),
            "Artifacts loaded"
        );

        Ok(LoadedArtifacts {
            mapping,
            technical,
            brand,
        })
    }

    fn load_manifest(&self) -> Result<Option<ArtifactManifest>> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "No artifact manifest, skipping checksum validation");
            return Ok(None);
        }
        let bytes = read_bounded(&path, MANIFEST_FILE)?;
        let manifest = serde_json::from_slice(&bytes)
            .map_err(|e| ValuationError::artifact(MANIFEST_FILE, e))?;
        Ok(Some(manifest))
    }

    fn read_artifact(&self, name: &str, manifest: Option<&ArtifactManifest>) -> Result<Vec<u8>> {
        let bytes = read_bounded(&self.dir.join(name), name)?;

        if let Some(manifest) = manifest {
            let expected = manifest.files.get(name).ok_or_else(|| {
                ValuationError::artifact(name, "not listed in manifest.json")
            })?;
            let computed = compute_checksum(&bytes);
            if !computed.eq_ignore_ascii_case(expected) {
                return Err(ValuationError::artifact(
                    name,
                    format!("checksum mismatch: expected {}, got {}", expected, computed),
                ));
            }
            debug!(artifact = name, checksum = %computed, "Artifact checksum validated");
        }

        Ok(bytes)
    }
}

fn read_bounded(path: &Path, name: &str) -> Result<Vec<u8>> {
    let mut file = File::open(path)
        .map_err(|e| ValuationError::artifact(name, format!("{}: {}", path.display(), e)))?;
    let size = file
        .metadata()
        .map_err(|e| ValuationError::artifact(name, e))?
        .len();
    if size > MAX_ARTIFACT_BYTES {
        return Err(ValuationError::artifact(
            name,
            format!("size {} exceeds maximum {}", size, MAX_ARTIFACT_BYTES),
        ));
    }

    let mut bytes = Vec::with_capacity(size as usize);
    file.read_to_end(&mut bytes)
        .map_err(|e| ValuationError::artifact(name, e))?;
    Ok(bytes)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_missing_directory_is_artifact_error() {
        let err = ArtifactLoader::new("/nonexistent/carval/artifacts")
            .load()
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::ArtifactLoad);
        assert!(err.to_string().contains(MAPPINGS_FILE), "{}", err);
    }

    #[test]
    fn test_oversized_artifact_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(MAPPINGS_FILE);
        let file = File::create(&path).unwrap();
        file.set_len(MAX_ARTIFACT_BYTES + 1).unwrap();

        let err = read_bounded(&path, MAPPINGS_FILE).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{}", err);
    }
}
