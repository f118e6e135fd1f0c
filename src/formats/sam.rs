//! SAM text reading and writing.
//!
//! Only the pieces the read filters need are interpreted (QNAME, FLAG,
//! CIGAR and the `NM` tag); every other column is carried through
//! untouched so the toolkit sees the aligner's records as written.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::core::alignment::SamRecord;
use crate::formats::{create_writer, open_reader, ParseError};

const FORMAT: &str = "SAM";

/// Header lines plus alignment records of one SAM file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamFile {
    /// `@`-prefixed header lines, without newlines
    pub header: Vec<String>,
    pub records: Vec<SamRecord>,
}

/// Parse one alignment line (`line_number` is 1-based, for errors)
///
/// # Errors
///
/// Returns `ParseError::InvalidRecord` if the line has fewer than 11
/// columns or an unparseable FLAG.
pub fn parse_sam_line(line: &str, line_number: usize) -> Result<SamRecord, ParseError> {
    let fields: Vec<String> = line.split('\t').map(String::from).collect();
    if fields.len() < 11 {
        return Err(ParseError::InvalidRecord {
            format: FORMAT,
            line: line_number,
            reason: format!("expected at least 11 columns, found {}", fields.len()),
        });
    }

    let flag = fields[1]
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidRecord {
            format: FORMAT,
            line: line_number,
            reason: format!("invalid FLAG '{}'", fields[1]),
        })?;

    Ok(SamRecord::from_parts(fields, flag))
}

/// Read a SAM stream
///
/// # Errors
///
/// Returns `ParseError` on IO failure or a malformed record.
pub fn read_sam_from<R: BufRead>(reader: R) -> Result<SamFile, ParseError> {
    let mut sam = SamFile::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if line.starts_with('@') {
            sam.header.push(line.to_string());
        } else {
            sam.records.push(parse_sam_line(line, i + 1)?);
        }
    }
    Ok(sam)
}

/// Read a SAM file produced by the aligner
///
/// # Errors
///
/// Returns `ParseError::MissingOutput` if the aligner did not write the
/// file, otherwise as [`read_sam_from`].
pub fn read_sam(path: &Path) -> Result<SamFile, ParseError> {
    if !path.exists() {
        return Err(ParseError::MissingOutput(path.display().to_string()));
    }
    read_sam_from(open_reader(path)?)
}

/// Write a header followed by the given records
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_sam<'a, I>(path: &Path, header: &[String], records: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = &'a SamRecord>,
{
    let mut writer = create_writer(path)?;
    for line in header {
        writeln!(writer, "{line}")?;
    }
    for record in records {
        writeln!(writer, "{}", record.to_line())?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAM: &str = "@HD\tVN:1.6\tSO:unsorted\n\
@SQ\tSN:ref1\tLN:1000\n\
@PG\tID:minimap2\tPN:minimap2\n\
read1\t0\tref1\t1\t60\t100M\t*\t0\t0\t*\t*\tNM:i:3\n\
read2\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n\
read1\t2048\tref1\t500\t10\t50H50M\t*\t0\t0\t*\t*\tNM:i:0\n";

    #[test]
    fn test_read_sam_splits_header_and_records() {
        let sam = read_sam_from(SAM.as_bytes()).unwrap();
        assert_eq!(sam.header.len(), 3);
        assert_eq!(sam.records.len(), 3);
        assert_eq!(sam.records[0].qname(), "read1");
        assert_eq!(sam.records[0].edit_distance(), Some(3));
        assert!(sam.records[1].is_unmapped());
        assert!(!sam.records[2].is_primary());
    }

    #[test]
    fn test_invalid_flag() {
        let err = parse_sam_line("r\tx\t*\t0\t0\t*\t*\t0\t0\tA\tI", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
        assert!(parse_sam_line("r\t0\t*", 1).is_err());
    }

    #[test]
    fn test_write_round_trips_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.sam");
        let sam = read_sam_from(SAM.as_bytes()).unwrap();
        write_sam(&path, &sam.header, &sam.records).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAM);

        assert!(matches!(
            read_sam(&dir.path().join("nope.sam")),
            Err(ParseError::MissingOutput(_))
        ));
    }
}
