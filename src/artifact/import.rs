//! Importing plain files as artifacts and exporting payloads back out.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::artifact::manifest::{
    group_samples, read_manifest, sample_from_file_name, SampleSetWriter,
};
use crate::artifact::store::list_files;
use crate::artifact::{
    Artifact, ArtifactError, Provenance, StagedArtifact, ALIGNMENTS_FILE, INDEX_FILE,
    MANIFEST_FILE, SEQUENCES_FILE, TAXONOMY_FILE,
};
use crate::core::types::{ArtifactType, ReadDirection};
use crate::formats::fasta::{read_fasta, write_fasta};
use crate::formats::fastq::{is_fastq_file, read_fastq, require_quality};
use crate::formats::paf::{read_paf, write_paf};
use crate::formats::taxonomy::{read_taxonomy, write_taxonomy};
use crate::formats::FormatError;

/// Import `source` as an artifact of the given type at `dest`.
///
/// Sequence and table payloads are re-written in canonical form (unwrapped
/// FASTA, gzip FASTQ under Casava names, headed TSV).
///
/// # Errors
///
/// Returns `ArtifactError::AlreadyExists` if `dest` exists, a format error if
/// the source does not parse as the requested type, or
/// `ArtifactError::UnsupportedImport` for visualizations.
pub fn import_artifact(
    artifact_type: ArtifactType,
    source: &Path,
    dest: &Path,
) -> Result<Artifact, ArtifactError> {
    if dest.exists() {
        return Err(ArtifactError::AlreadyExists(dest.display().to_string()));
    }

    let scratch = TempDir::new()?;
    let staged = StagedArtifact::new(artifact_type, scratch.path(), "import")?;

    info!("Importing {} as {}", source.display(), artifact_type);

    match artifact_type {
        ArtifactType::FeatureSequences => {
            let records = read_fasta(source)?;
            debug!("Read {} sequences", records.len());
            write_fasta(&staged.file(SEQUENCES_FILE), &records)?;
        }
        ArtifactType::FeatureTaxonomy => {
            let table = read_taxonomy(source)?;
            let score_column = table.has_confidence().then_some("Confidence");
            write_taxonomy(&staged.file(TAXONOMY_FILE), &table, score_column)?;
        }
        ArtifactType::PairwiseAlignments => {
            let records = read_paf(source)?;
            write_paf(&staged.file(ALIGNMENTS_FILE), &records)?;
        }
        ArtifactType::Minimap2Index => {
            fs::copy(source, staged.file(INDEX_FILE))?;
        }
        ArtifactType::SingleEndReads | ArtifactType::PairedEndReads => {
            import_sample_directory(artifact_type, source, &staged)?;
        }
        ArtifactType::Visualization => {
            return Err(ArtifactError::UnsupportedImport(artifact_type));
        }
    }

    staged.commit(dest, Provenance::imported(source))
}

fn import_sample_directory(
    artifact_type: ArtifactType,
    source: &Path,
    staged: &StagedArtifact,
) -> Result<(), ArtifactError> {
    let mut files: BTreeMap<(String, u8), (ReadDirection, PathBuf)> = BTreeMap::new();

    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        if !path.is_file() || !is_fastq_file(&path) {
            continue;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (sample_id, direction) = sample_from_file_name(&file_name)?;
        let key = (sample_id, direction.read_number());
        if files.contains_key(&key) {
            return Err(FormatError::InvalidManifest(format!(
                "more than one {} file for sample '{}'",
                direction.as_str(),
                key.0
            ))
            .into());
        }
        files.insert(key, (direction, path));
    }

    if files.is_empty() {
        return Err(FormatError::InvalidManifest(format!(
            "no FASTQ files found in {}",
            source.display()
        ))
        .into());
    }

    let mut writer = SampleSetWriter::new(staged.data_dir());
    for ((sample_id, _), (direction, path)) in &files {
        require_quality(path)?;
        let reads = read_fastq(path)?;
        debug!(
            "Sample {} ({}): {} reads",
            sample_id,
            direction.as_str(),
            reads.len()
        );
        writer.write_reads(sample_id, *direction, &reads)?;
    }
    writer.finish()?;

    // Reject single-end files imported as paired data and vice versa
    let entries = read_manifest(&staged.file(MANIFEST_FILE))?;
    group_samples(&entries, staged.data_dir(), artifact_type)?;
    Ok(())
}

/// Copy an artifact's payload files into a new directory
///
/// # Errors
///
/// Returns `ArtifactError::AlreadyExists` if `dest` exists, or an IO error.
pub fn export_artifact(artifact: &Artifact, dest: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
    if dest.exists() {
        return Err(ArtifactError::AlreadyExists(dest.display().to_string()));
    }

    let data_dir = artifact.data_dir();
    let mut written = Vec::new();
    fs::create_dir_all(dest)?;
    for file in list_files(&data_dir)? {
        let target = dest.join(&file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(data_dir.join(&file), &target)?;
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::manifest::samples;
    use tempfile::TempDir;

    #[test]
    fn test_import_fasta_unwraps() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("refs.fasta");
        fs::write(&source, b">r1 desc\nACGT\nACGT\n").unwrap();
        let dest = dir.path().join("refs.qza");

        let artifact = import_artifact(ArtifactType::FeatureSequences, &source, &dest).unwrap();
        assert_eq!(artifact.metadata().provenance.action, "import");
        let payload = fs::read_to_string(artifact.payload(SEQUENCES_FILE).unwrap()).unwrap();
        assert_eq!(payload, ">r1\nACGTACGT\n");
    }

    #[test]
    fn test_import_single_end_directory() {
        let dir = TempDir::new().unwrap();
        let reads = dir.path().join("reads");
        fs::create_dir(&reads).unwrap();
        fs::write(reads.join("barcode01.fastq"), b"@r1\nACGT\n+\nIIII\n").unwrap();
        fs::write(reads.join("notes.txt"), b"ignored").unwrap();
        let dest = dir.path().join("reads.qza");

        let artifact = import_artifact(ArtifactType::SingleEndReads, &reads, &dest).unwrap();
        let samples = samples(&artifact).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].sample_id, "barcode01");
        assert!(samples[0]
            .forward
            .ends_with("barcode01_0_L001_R1_001.fastq.gz"));
    }

    #[test]
    fn test_import_paired_requires_both_mates() {
        let dir = TempDir::new().unwrap();
        let reads = dir.path().join("reads");
        fs::create_dir(&reads).unwrap();
        fs::write(
            reads.join("S1_0_L001_R1_001.fastq"),
            b"@r1\nACGT\n+\nIIII\n",
        )
        .unwrap();

        let err = import_artifact(
            ArtifactType::PairedEndReads,
            &reads,
            &dir.path().join("paired.qza"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no reverse reads"));
        assert!(!dir.path().join("paired.qza").exists());
    }

    #[test]
    fn test_import_rejects_fasta_reads() {
        let dir = TempDir::new().unwrap();
        let reads = dir.path().join("reads");
        fs::create_dir(&reads).unwrap();
        fs::write(reads.join("S1.fastq"), b">r1\nACGT\n").unwrap();

        let err = import_artifact(
            ArtifactType::SingleEndReads,
            &reads,
            &dir.path().join("reads.qza"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Format(FormatError::QualityRequired { .. })
        ));
    }

    #[test]
    fn test_export_copies_payload() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("tax.tsv");
        fs::write(&source, "Feature ID\tTaxon\na\tk__A\n").unwrap();
        let artifact = import_artifact(
            ArtifactType::FeatureTaxonomy,
            &source,
            &dir.path().join("tax.qza"),
        )
        .unwrap();

        let out = dir.path().join("exported");
        let written = export_artifact(&artifact, &out).unwrap();
        assert_eq!(written, vec![out.join(TAXONOMY_FILE)]);
        assert_eq!(
            fs::read_to_string(out.join(TAXONOMY_FILE)).unwrap(),
            "Feature ID\tTaxon\na\tk__A\n"
        );
        assert!(export_artifact(&artifact, &out).is_err());
    }

    #[test]
    fn test_visualization_import_unsupported() {
        let dir = TempDir::new().unwrap();
        let err = import_artifact(
            ArtifactType::Visualization,
            dir.path(),
            &dir.path().join("v.qzv"),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedImport(_)));
    }
}
