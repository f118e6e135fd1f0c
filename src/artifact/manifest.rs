//! Per-sample read collections: Casava file names and the `MANIFEST` CSV.
//!
//! Payload layout:
//!
//! ```text
//! data/
//!   MANIFEST                        sample-id,filename,direction
//!   S1_0_L001_R1_001.fastq.gz
//!   S1_0_L001_R2_001.fastq.gz       paired-end only
//! ```

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::artifact::{Artifact, ArtifactError, MANIFEST_FILE};
use crate::core::sequence::SequenceCollection;
use crate::core::types::{ArtifactType, ReadDirection};
use crate::formats::fastq::write_fastq;
use crate::formats::{create_writer, open_reader, FormatError};
use crate::utils::validation::validate_sample_id;

const MANIFEST_HEADER: &str = "sample-id,filename,direction";

/// File-name suffixes recognised as FASTQ, longest first
const FASTQ_SUFFIXES: &[&str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];

/// One row of the `MANIFEST`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub sample_id: String,
    pub filename: String,
    pub direction: ReadDirection,
}

/// Files belonging to one sample, resolved to absolute paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFiles {
    pub sample_id: String,
    pub forward: PathBuf,
    pub reverse: Option<PathBuf>,
}

/// Canonical Casava 1.8 file name for a sample and direction
#[must_use]
pub fn casava_file_name(sample_id: &str, direction: ReadDirection) -> String {
    format!("{sample_id}_0_L001_R{}_001.fastq.gz", direction.read_number())
}

fn strip_fastq_suffix(file_name: &str) -> Option<&str> {
    let lower = file_name.to_lowercase();
    FASTQ_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &file_name[..file_name.len() - suffix.len()])
}

/// Parse `<sample>_<barcode>_L<lane>_R<1|2>_<set>.fastq[.gz]`
#[must_use]
pub fn parse_casava_name(file_name: &str) -> Option<(String, ReadDirection)> {
    let stem = strip_fastq_suffix(file_name)?;
    let parts: Vec<&str> = stem.rsplitn(5, '_').collect();
    let [set, read, lane, barcode, sample] = parts.as_slice() else {
        return None;
    };

    if sample.is_empty() || barcode.is_empty() || !set.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let lane_ok = lane
        .strip_prefix('L')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    if !lane_ok {
        return None;
    }

    let direction = match *read {
        "R1" => ReadDirection::Forward,
        "R2" => ReadDirection::Reverse,
        _ => return None,
    };

    Some(((*sample).to_string(), direction))
}

/// Derive sample id and direction from a FASTQ file name.
///
/// Casava names are parsed; otherwise `<sample>.fastq[.gz]` is taken as a
/// forward read file for `<sample>`.
///
/// # Errors
///
/// Returns `FormatError::UnrecognizedFileName` when the name is not FASTQ.
pub fn sample_from_file_name(file_name: &str) -> Result<(String, ReadDirection), FormatError> {
    if let Some(parsed) = parse_casava_name(file_name) {
        return Ok(parsed);
    }
    match strip_fastq_suffix(file_name) {
        Some(stem) if !stem.is_empty() => Ok((stem.to_string(), ReadDirection::Forward)),
        _ => Err(FormatError::UnrecognizedFileName(file_name.to_string())),
    }
}

/// Read a `MANIFEST` file
///
/// # Errors
///
/// Returns `FormatError::InvalidManifest` for a missing header, a row with
/// the wrong number of fields, or an unknown direction.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, FormatError> {
    read_manifest_from(open_reader(path)?)
}

/// Read `MANIFEST` rows from any buffered reader
///
/// # Errors
///
/// See [`read_manifest`].
pub fn read_manifest_from<R: BufRead>(reader: R) -> Result<Vec<ManifestEntry>, FormatError> {
    let mut entries = Vec::new();
    let mut header_seen = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !header_seen {
            if line != MANIFEST_HEADER {
                return Err(FormatError::InvalidManifest(format!(
                    "expected header '{MANIFEST_HEADER}', found '{line}'"
                )));
            }
            header_seen = true;
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [sample_id, filename, direction] = fields.as_slice() else {
            return Err(FormatError::InvalidManifest(format!(
                "line {}: expected 3 comma-separated fields",
                i + 1
            )));
        };
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(FormatError::InvalidManifest(format!(
                "line {}: invalid file name '{filename}'",
                i + 1
            )));
        }
        let direction = match *direction {
            "forward" => ReadDirection::Forward,
            "reverse" => ReadDirection::Reverse,
            other => {
                return Err(FormatError::InvalidManifest(format!(
                    "line {}: unknown direction '{other}'",
                    i + 1
                )))
            }
        };
        entries.push(ManifestEntry {
            sample_id: (*sample_id).to_string(),
            filename: (*filename).to_string(),
            direction,
        });
    }

    if !header_seen {
        return Err(FormatError::InvalidManifest("empty manifest".to_string()));
    }
    Ok(entries)
}

/// Write a `MANIFEST` file
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> std::io::Result<()> {
    let mut writer = create_writer(path)?;
    writeln!(writer, "{MANIFEST_HEADER}")?;
    for entry in entries {
        writeln!(
            writer,
            "{},{},{}",
            entry.sample_id,
            entry.filename,
            entry.direction.as_str()
        )?;
    }
    writer.finish()
}

/// Group manifest rows into samples and check them against the type.
///
/// Samples are returned sorted by id.
///
/// # Errors
///
/// Returns `FormatError::InvalidManifest` on duplicate rows, a missing
/// forward file, a reverse file in single-end data, or a missing reverse
/// file in paired-end data.
pub fn group_samples(
    entries: &[ManifestEntry],
    data_dir: &Path,
    artifact_type: ArtifactType,
) -> Result<Vec<SampleFiles>, FormatError> {
    let paired = artifact_type == ArtifactType::PairedEndReads;
    let mut by_sample: BTreeMap<&str, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

    for entry in entries {
        let slot = by_sample.entry(entry.sample_id.as_str()).or_default();
        let target = match entry.direction {
            ReadDirection::Forward => &mut slot.0,
            ReadDirection::Reverse => &mut slot.1,
        };
        if target.is_some() {
            return Err(FormatError::InvalidManifest(format!(
                "duplicate {} entry for sample '{}'",
                entry.direction.as_str(),
                entry.sample_id
            )));
        }
        *target = Some(data_dir.join(&entry.filename));
    }

    by_sample
        .into_iter()
        .map(|(sample_id, (forward, reverse))| {
            let forward = forward.ok_or_else(|| {
                FormatError::InvalidManifest(format!("sample '{sample_id}' has no forward reads"))
            })?;
            match (paired, reverse.is_some()) {
                (true, false) => Err(FormatError::InvalidManifest(format!(
                    "sample '{sample_id}' has no reverse reads"
                ))),
                (false, true) => Err(FormatError::InvalidManifest(format!(
                    "sample '{sample_id}' has reverse reads in single-end data"
                ))),
                _ => Ok(SampleFiles {
                    sample_id: sample_id.to_string(),
                    forward,
                    reverse,
                }),
            }
        })
        .collect()
}

/// Samples of a per-sample read artifact
///
/// # Errors
///
/// Returns an error if the `MANIFEST` is unreadable or inconsistent, or a
/// listed file is missing.
pub fn samples(artifact: &Artifact) -> Result<Vec<SampleFiles>, ArtifactError> {
    let manifest = artifact.payload(MANIFEST_FILE)?;
    let entries = read_manifest(&manifest)?;
    let samples = group_samples(&entries, &artifact.data_dir(), artifact.artifact_type())?;

    for sample in &samples {
        for path in std::iter::once(&sample.forward).chain(sample.reverse.as_ref()) {
            if !path.is_file() {
                return Err(ArtifactError::MissingPayload {
                    artifact: artifact.path().display().to_string(),
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                });
            }
        }
    }
    Ok(samples)
}

/// Writes per-sample FASTQ files under canonical names and the `MANIFEST`
#[derive(Debug)]
pub struct SampleSetWriter {
    data_dir: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl SampleSetWriter {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// Reserve the canonical file for a sample/direction and return its path
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::InvalidName` if the sample id is unsafe.
    pub fn path_for(
        &mut self,
        sample_id: &str,
        direction: ReadDirection,
    ) -> Result<PathBuf, ArtifactError> {
        validate_sample_id(sample_id)?;
        let filename = casava_file_name(sample_id, direction);
        let path = self.data_dir.join(&filename);
        self.entries.push(ManifestEntry {
            sample_id: sample_id.to_string(),
            filename,
            direction,
        });
        Ok(path)
    }

    /// Write a sample's reads as gzip FASTQ
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unsafe or the file cannot be written.
    pub fn write_reads(
        &mut self,
        sample_id: &str,
        direction: ReadDirection,
        reads: &SequenceCollection,
    ) -> Result<(), ArtifactError> {
        let path = self.path_for(sample_id, direction)?;
        write_fastq(&path, reads)?;
        Ok(())
    }

    /// Write the `MANIFEST`, rows sorted by sample then direction
    ///
    /// # Errors
    ///
    /// Returns an IO error if the manifest cannot be written.
    pub fn finish(mut self) -> std::io::Result<()> {
        self.entries.sort_by(|a, b| {
            a.sample_id
                .cmp(&b.sample_id)
                .then(a.direction.read_number().cmp(&b.direction.read_number()))
        });
        write_manifest(&self.data_dir.join(MANIFEST_FILE), &self.entries)
    }
}
