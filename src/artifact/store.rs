use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::artifact::{
    required_payload, ArtifactError, ArtifactMetadata, Provenance, DATA_DIR, FORMAT_VERSION,
    METADATA_FILE,
};
use crate::core::types::ArtifactType;
use crate::utils::validation::{compute_signature, file_md5, is_valid_md5};

/// An artifact directory on disk
#[derive(Debug, Clone)]
pub struct Artifact {
    root: PathBuf,
    metadata: ArtifactMetadata,
}

impl Artifact {
    /// Load an artifact's metadata and check that its payload is present
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::NotAnArtifact` if there is no metadata file,
    /// `ArtifactError::Metadata` if it does not parse,
    /// `ArtifactError::InvalidChecksum` for a recorded checksum that is not
    /// an MD5, or
    /// `ArtifactError::MissingPayload` if the type's payload file is absent.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let metadata_path = path.join(METADATA_FILE);
        if !metadata_path.is_file() {
            return Err(ArtifactError::NotAnArtifact(path.display().to_string()));
        }

        let content = fs::read_to_string(&metadata_path)?;
        let metadata: ArtifactMetadata = serde_json::from_str(&content)?;

        // Version check (warn but don't fail)
        if metadata.format_version != FORMAT_VERSION {
            warn!(
                "Artifact format version mismatch in {} (expected {}, found {})",
                path.display(),
                FORMAT_VERSION,
                metadata.format_version
            );
        }

        if let Some((file, _)) = metadata
            .checksums
            .iter()
            .find(|(_, md5)| !is_valid_md5(md5))
        {
            return Err(ArtifactError::InvalidChecksum {
                artifact: path.display().to_string(),
                file: file.clone(),
            });
        }

        let artifact = Self {
            root: path.to_path_buf(),
            metadata,
        };

        let required = required_payload(artifact.artifact_type());
        if !artifact.data_dir().join(required).exists() {
            return Err(ArtifactError::MissingPayload {
                artifact: path.display().to_string(),
                file: required.to_string(),
            });
        }

        Ok(artifact)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    #[must_use]
    pub fn artifact_type(&self) -> ArtifactType {
        self.metadata.artifact_type
    }

    #[must_use]
    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Path of a payload file, which must exist
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::MissingPayload` if the file is absent.
    pub fn payload(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.data_dir().join(name);
        if path.exists() {
            Ok(path)
        } else {
            Err(ArtifactError::MissingPayload {
                artifact: self.root.display().to_string(),
                file: name.to_string(),
            })
        }
    }

    /// Deterministic identifier of the payload (md5 over sorted checksums)
    #[must_use]
    pub fn signature(&self) -> String {
        compute_signature(self.metadata.checksums.values().map(String::as_str))
    }

    /// Recompute payload checksums and compare with the recorded ones
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::ChecksumMismatch` for the first differing or
    /// missing file.
    pub fn verify(&self) -> Result<(), ArtifactError> {
        let data_dir = self.data_dir();
        for (file, expected) in &self.metadata.checksums {
            let path = data_dir.join(file);
            let matches = path.is_file() && file_md5(&path)? == *expected;
            if !matches {
                return Err(ArtifactError::ChecksumMismatch {
                    artifact: self.root.display().to_string(),
                    file: file.clone(),
                });
            }
        }
        Ok(())
    }
}

/// An artifact being assembled in scratch space
#[derive(Debug)]
pub struct StagedArtifact {
    artifact_type: ArtifactType,
    data_dir: PathBuf,
}

impl StagedArtifact {
    /// Create `<scratch>/<name>/data` for a new artifact of the given type
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn new(artifact_type: ArtifactType, scratch: &Path, name: &str) -> io::Result<Self> {
        let data_dir = scratch.join(name).join(DATA_DIR);
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            artifact_type,
            data_dir,
        })
    }

    #[must_use]
    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path for a payload file inside the staged data directory
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Copy the staged payload to `dest` and write its metadata.
    ///
    /// A partially written destination is removed on failure.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::AlreadyExists` if `dest` exists,
    /// `ArtifactError::MissingPayload` if the type's payload was never
    /// written, or an IO error.
    pub fn commit(self, dest: &Path, provenance: Provenance) -> Result<Artifact, ArtifactError> {
        if dest.exists() {
            return Err(ArtifactError::AlreadyExists(dest.display().to_string()));
        }

        let required = required_payload(self.artifact_type);
        if !self.data_dir.join(required).exists() {
            return Err(ArtifactError::MissingPayload {
                artifact: dest.display().to_string(),
                file: required.to_string(),
            });
        }

        let files = list_files(&self.data_dir)?;
        let mut checksums = BTreeMap::new();
        for file in &files {
            checksums.insert(file.clone(), file_md5(&self.data_dir.join(file))?);
        }

        let metadata = ArtifactMetadata {
            format_version: FORMAT_VERSION.to_string(),
            artifact_type: self.artifact_type,
            format: self.artifact_type.format_name().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            provenance,
            checksums,
        };

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(dest)?;

        let result = write_artifact(&self.data_dir, &files, dest, &metadata);
        if let Err(e) = result {
            let _ = fs::remove_dir_all(dest);
            return Err(e);
        }

        debug!(
            "Committed {} ({} files) to {}",
            metadata.artifact_type,
            files.len(),
            dest.display()
        );

        Ok(Artifact {
            root: dest.to_path_buf(),
            metadata,
        })
    }
}

fn write_artifact(
    source: &Path,
    files: &[String],
    dest: &Path,
    metadata: &ArtifactMetadata,
) -> Result<(), ArtifactError> {
    let data_dir = dest.join(DATA_DIR);
    fs::create_dir(&data_dir)?;
    for file in files {
        let target = data_dir.join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source.join(file), target)?;
    }
    fs::write(
        dest.join(METADATA_FILE),
        serde_json::to_string_pretty(metadata)?,
    )?;
    Ok(())
}

/// List every file under `dir` as sorted `/`-separated relative paths
///
/// # Errors
///
/// Returns an IO error if a directory cannot be read.
pub fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(dir, "", &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, prefix: &str, files: &mut Vec<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &relative, files)?;
        } else {
            files.push(relative);
        }
    }
    Ok(())
}
