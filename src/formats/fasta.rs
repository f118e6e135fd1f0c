//! FASTA reading (noodles) and unwrapped FASTA writing.
//!
//! Supported extensions: `.fa`, `.fasta`, `.fna`, optionally followed by
//! `.gz`/`.bgz`.

use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::Path;

use noodles::fasta;

use crate::core::sequence::{SequenceCollection, SequenceRecord};
use crate::formats::{create_writer, open_reader, FormatError};

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    let trimmed = path_str
        .strip_suffix(".gz")
        .or_else(|| path_str.strip_suffix(".bgz"))
        .unwrap_or(&path_str);

    matches!(
        Path::new(trimmed)
            .extension()
            .and_then(OsStr::to_str),
        Some("fa" | "fasta" | "fna")
    )
}

/// Read every record of a FASTA file (plain or gzip-compressed).
///
/// An empty file yields an empty collection.
///
/// # Errors
///
/// Returns `FormatError::Io` if the file cannot be read or
/// `FormatError::Noodles` if a record is malformed.
pub fn read_fasta(path: &Path) -> Result<SequenceCollection, FormatError> {
    let reader = open_reader(path)?;
    read_fasta_from(reader)
}

/// Read FASTA records from any buffered reader
///
/// # Errors
///
/// Returns `FormatError::Noodles` if a record is malformed.
pub fn read_fasta_from<R: BufRead>(reader: R) -> Result<SequenceCollection, FormatError> {
    let mut fasta_reader = fasta::io::Reader::new(reader);
    let mut records = Vec::new();

    for result in fasta_reader.records() {
        let record = result
            .map_err(|e| FormatError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let id = String::from_utf8_lossy(record.name()).to_string();
        let sequence = record.sequence().as_ref().to_vec();
        records.push(SequenceRecord::new(id, sequence));
    }

    Ok(SequenceCollection::new(records))
}

/// Write records as unwrapped FASTA, one line per sequence
///
/// # Errors
///
/// Returns an IO error if writing fails.
pub fn write_fasta_to<W: Write>(
    writer: &mut W,
    records: &SequenceCollection,
) -> std::io::Result<()> {
    for record in records {
        writer.write_all(b">")?;
        writer.write_all(record.id.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(&record.sequence)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write records to a FASTA file, compressing when the name ends in `.gz`
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_fasta(path: &Path, records: &SequenceCollection) -> std::io::Result<()> {
    let mut writer = create_writer(path)?;
    write_fasta_to(&mut writer, records)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_fasta_file() {
        assert!(is_fasta_file(Path::new("test.fa")));
        assert!(is_fasta_file(Path::new("test.fasta")));
        assert!(is_fasta_file(Path::new("test.fna.gz")));
        assert!(is_fasta_file(Path::new("/path/to/Reference.FA")));

        assert!(!is_fasta_file(Path::new("test.fastq")));
        assert!(!is_fasta_file(Path::new("test.sam")));
        assert!(!is_fasta_file(Path::new("test.gz")));
    }

    #[test]
    fn test_read_wrapped_fasta() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refs.fasta");
        std::fs::write(&path, b">chr1 description\nACGTACGT\nACGT\n>chr2\nGGGG\n").unwrap();

        let records = read_fasta(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[0].id, "chr1");
        assert_eq!(records.records()[0].sequence, b"ACGTACGTACGT");
        assert_eq!(records.records()[1].id, "chr2");
        assert!(records.records()[1].quality.is_none());
    }

    #[test]
    fn test_empty_fasta_is_empty_collection() {
        let records = read_fasta_from(&b""[..]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_write_is_unwrapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.fasta");
        let records: SequenceCollection = vec![
            SequenceRecord::new("a", "A".repeat(120)),
            SequenceRecord::new("b", "CC"),
        ]
        .into_iter()
        .collect();

        write_fasta(&path, &records).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!(">a\n{}\n>b\nCC\n", "A".repeat(120)));
        assert_eq!(read_fasta(&path).unwrap(), records);
    }
}
