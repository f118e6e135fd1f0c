//! Readers and writers for the file formats exchanged with external tools.
//!
//! - **FASTA** ([`fasta`]): reference and query sequences
//! - **FASTQ** ([`fastq`]): reads with quality, optionally gzip-compressed
//! - **PAF** ([`paf`]): `minimap2 -c` search results
//! - **SAM** ([`sam`]): `minimap2 -a` alignments
//! - **Taxonomy TSV** ([`taxonomy`]): reference lineages and classifications
//!
//! Writers emit unwrapped records and gzip streams with a zero mtime so that
//! identical inputs always produce identical bytes.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

pub mod fasta;
pub mod fastq;
pub mod paf;
pub mod sam;
pub mod taxonomy;

/// An input could not be converted into the on-disk format a tool needs
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("{path}: quality scores are required but the file is FASTA")]
    QualityRequired { path: String },

    #[error("{path}: not a FASTA or FASTQ file")]
    UnrecognizedSequenceFormat { path: String },

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Cannot derive a sample id from file name '{0}'")]
    UnrecognizedFileName(String),
}

/// A tool's output could not be turned back into the declared artifact
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed {format} record at line {line}: {reason}")]
    InvalidRecord {
        format: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Expected output file was not produced: {0}")]
    MissingOutput(String),

    #[error("{0} produced no output")]
    EmptyOutput(String),

    #[error(
        "Reference taxonomy and search results do not match. The following identifiers \
         were reported in the search results but are not present in the reference taxonomy: {}",
        .0.join(", ")
    )]
    UnknownReferenceIds(Vec<String>),

    #[error("Malformed tool output: {0}")]
    Malformed(#[from] FormatError),
}

/// Check whether a path names a gzip stream
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a file for buffered reading, decompressing gzip/bgzip transparently
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened.
pub fn open_reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Output file that is either plain or gzip-compressed
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    /// Flush buffers and write the gzip trailer
    ///
    /// # Errors
    ///
    /// Returns an IO error if the final write fails.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

/// Create a file for writing, gzip-compressing when the name ends in `.gz`
///
/// # Errors
///
/// Returns an IO error if the file cannot be created.
pub fn create_writer(path: &Path) -> io::Result<OutputFile> {
    let file = BufWriter::new(File::create(path)?);
    if is_gzipped(path) {
        Ok(OutputFile::Gzip(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(OutputFile::Plain(file))
    }
}

/// Kind of sequence file, decided from its first record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFileKind {
    Fasta,
    Fastq,
    /// No records at all
    Empty,
}

/// Peek at the first non-blank byte to tell FASTA from FASTQ
///
/// # Errors
///
/// Returns `FormatError::Io` if the file cannot be read, or
/// `FormatError::UnrecognizedSequenceFormat` for anything else.
pub fn sniff_sequence_file(path: &Path) -> Result<SequenceFileKind, FormatError> {
    let mut reader = open_reader(path)?;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(SequenceFileKind::Empty);
        }
        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if skip < buf.len() {
            return match buf[skip] {
                b'>' => Ok(SequenceFileKind::Fasta),
                b'@' => Ok(SequenceFileKind::Fastq),
                _ => Err(FormatError::UnrecognizedSequenceFormat {
                    path: path.display().to_string(),
                }),
            };
        }
        reader.consume(skip);
    }
}
