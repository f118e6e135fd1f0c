//! FASTQ reading (noodles) and four-line FASTQ writing.

use std::io::{BufRead, Write};
use std::path::Path;

use noodles::fastq;

use crate::core::sequence::{SequenceCollection, SequenceRecord};
use crate::formats::{
    create_writer, open_reader, sniff_sequence_file, FormatError, SequenceFileKind,
};

/// Check if the path has a FASTQ extension (`.fastq`, `.fq`, optionally gzipped)
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_fastq_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let trimmed = name.strip_suffix(".gz").unwrap_or(&name);
    trimmed.ends_with(".fastq") || trimmed.ends_with(".fq")
}

/// Read every record of a FASTQ file (plain or gzip-compressed)
///
/// # Errors
///
/// Returns `FormatError::Io` if the file cannot be read or
/// `FormatError::Noodles` if a record is malformed.
pub fn read_fastq(path: &Path) -> Result<SequenceCollection, FormatError> {
    let reader = open_reader(path)?;
    read_fastq_from(reader)
}

/// Read FASTQ records from any buffered reader
///
/// # Errors
///
/// Returns `FormatError::Noodles` if a record is malformed.
pub fn read_fastq_from<R: BufRead>(reader: R) -> Result<SequenceCollection, FormatError> {
    let mut fastq_reader = fastq::io::Reader::new(reader);
    let mut records = Vec::new();

    for result in fastq_reader.records() {
        let record = result
            .map_err(|e| FormatError::Noodles(format!("Failed to parse FASTQ record: {e}")))?;

        let id = String::from_utf8_lossy(record.name()).to_string();
        records.push(
            SequenceRecord::new(id, record.sequence().to_vec())
                .with_quality(record.quality_scores().to_vec()),
        );
    }

    Ok(SequenceCollection::new(records))
}

/// Confirm that a per-sample file carries quality scores.
///
/// Empty files pass; there is nothing to trim or align.
///
/// # Errors
///
/// Returns `FormatError::QualityRequired` when the file is FASTA and
/// `FormatError::UnrecognizedSequenceFormat` when it is neither.
pub fn require_quality(path: &Path) -> Result<(), FormatError> {
    match sniff_sequence_file(path)? {
        SequenceFileKind::Fastq | SequenceFileKind::Empty => Ok(()),
        SequenceFileKind::Fasta => Err(FormatError::QualityRequired {
            path: path.display().to_string(),
        }),
    }
}

/// Write a single record in four-line FASTQ form.
///
/// Records without quality get a constant `I` (Q40) string.
///
/// # Errors
///
/// Returns an IO error if writing fails.
pub fn write_fastq_record<W: Write>(writer: &mut W, record: &SequenceRecord) -> std::io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(record.id.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(&record.sequence)?;
    writer.write_all(b"\n+\n")?;
    match &record.quality {
        Some(quality) => writer.write_all(quality)?,
        None => writer.write_all(&vec![b'I'; record.sequence.len()])?,
    }
    writer.write_all(b"\n")
}

/// Write records to a FASTQ file, compressing when the name ends in `.gz`
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_fastq(path: &Path, records: &SequenceCollection) -> std::io::Result<()> {
    let mut writer = create_writer(path)?;
    for record in records {
        write_fastq_record(&mut writer, record)?;
    }
    writer.finish()
}
