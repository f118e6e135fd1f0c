//! Typed, provenance-tracked artifact directories.
//!
//! ```text
//! <artifact>/
//!   metadata.json   type, format version, creation time, provenance, checksums
//!   data/           payload files
//! ```
//!
//! Actions never write into a final artifact path directly. They fill a
//! [`StagedArtifact`] inside their scratch directory, and the registry
//! commits it once the output type has been checked.

use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::ArtifactType;
use crate::formats::{FormatError, ParseError};
use crate::utils::validation::NameError;

pub mod import;
pub mod manifest;
pub mod store;

pub use store::{Artifact, StagedArtifact};

/// Artifact layout version for compatibility checking
pub const FORMAT_VERSION: &str = "1.0.0";

pub const METADATA_FILE: &str = "metadata.json";
pub const DATA_DIR: &str = "data";

pub const SEQUENCES_FILE: &str = "dna-sequences.fasta";
pub const TAXONOMY_FILE: &str = "taxonomy.tsv";
pub const ALIGNMENTS_FILE: &str = "output.paf";
pub const INDEX_FILE: &str = "index.mmi";
pub const MANIFEST_FILE: &str = "MANIFEST";
pub const VISUALIZATION_INDEX: &str = "index.html";

/// The payload file every artifact of the given type must contain
#[must_use]
pub fn required_payload(artifact_type: ArtifactType) -> &'static str {
    match artifact_type {
        ArtifactType::FeatureSequences => SEQUENCES_FILE,
        ArtifactType::FeatureTaxonomy => TAXONOMY_FILE,
        ArtifactType::PairwiseAlignments => ALIGNMENTS_FILE,
        ArtifactType::Minimap2Index => INDEX_FILE,
        ArtifactType::SingleEndReads | ArtifactType::PairedEndReads => MANIFEST_FILE,
        ArtifactType::Visualization => VISUALIZATION_INDEX,
    }
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse artifact metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("{0} is not an artifact (no {METADATA_FILE})")]
    NotAnArtifact(String),

    #[error("Output path already exists: {0}")]
    AlreadyExists(String),

    #[error("{artifact} is missing payload file '{file}'")]
    MissingPayload { artifact: String, file: String },

    #[error("Malformed checksum recorded for '{file}' in {artifact}")]
    InvalidChecksum { artifact: String, file: String },

    #[error("Checksum mismatch for '{file}' in {artifact}")]
    ChecksumMismatch { artifact: String, file: String },

    #[error("Cannot import {0} artifacts")]
    UnsupportedImport(ArtifactType),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidName(#[from] NameError),
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: String,
    pub artifact_type: ArtifactType,
    /// Directory format name, informational
    pub format: String,
    pub created_at: String,
    pub provenance: Provenance,
    /// Payload path relative to `data/` → md5
    pub checksums: BTreeMap<String, String>,
}

/// How an artifact came to be
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Producing action, or `import`
    pub action: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Input name → signature of the input artifact
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl Provenance {
    #[must_use]
    pub fn imported(source: &std::path::Path) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "source".to_string(),
            serde_json::Value::String(source.display().to_string()),
        );
        Self {
            action: "import".to_string(),
            parameters,
            inputs: BTreeMap::new(),
        }
    }
}
