//! PAF reading and writing.
//!
//! ```text
//! Col  Type    Description
//! 1    string  Query sequence name
//! 2    int     Query sequence length
//! 3    int     Query start (0-based)
//! 4    int     Query end
//! 5    char    Relative strand: '+', '-' ('*' on no-hit rows)
//! 6    string  Target sequence name ('*' on no-hit rows)
//! 7    int     Target sequence length
//! 8    int     Target start
//! 9    int     Target end
//! 10   int     Number of matching bases
//! 11   int     Alignment block length
//! 12   int     Mapping quality (0-255; 255 for missing)
//! ```

use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::core::alignment::PafRecord;
use crate::formats::{create_writer, open_reader, ParseError};

const FORMAT: &str = "PAF";

/// Parse one tab-separated PAF line (`line_number` is 1-based, for errors)
///
/// # Errors
///
/// Returns `ParseError::InvalidRecord` if the line has fewer than 12 fields
/// or a numeric column does not parse.
pub fn parse_paf_line(line: &str, line_number: usize) -> Result<PafRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 12 {
        return Err(ParseError::InvalidRecord {
            format: FORMAT,
            line: line_number,
            reason: format!("expected at least 12 columns, found {}", fields.len()),
        });
    }

    let number = |index: usize, name: &str| parse_column::<u64>(&fields, index, name, line_number);

    let strand = match fields[4] {
        "+" => '+',
        "-" => '-',
        "*" => '*',
        other => {
            return Err(ParseError::InvalidRecord {
                format: FORMAT,
                line: line_number,
                reason: format!("invalid strand '{other}'"),
            })
        }
    };

    Ok(PafRecord {
        query_name: fields[0].to_string(),
        query_len: number(1, "query length")?,
        query_start: number(2, "query start")?,
        query_end: number(3, "query end")?,
        strand,
        target_name: fields[5].to_string(),
        target_len: number(6, "target length")?,
        target_start: number(7, "target start")?,
        target_end: number(8, "target end")?,
        matches: number(9, "matches")?,
        block_len: number(10, "block length")?,
        mapq: parse_column::<u8>(&fields, 11, "mapping quality", line_number)?,
        tags: fields[12..].iter().map(|t| (*t).to_string()).collect(),
    })
}

fn parse_column<T: FromStr>(
    fields: &[&str],
    index: usize,
    name: &str,
    line_number: usize,
) -> Result<T, ParseError> {
    fields[index]
        .parse()
        .map_err(|_| ParseError::InvalidRecord {
            format: FORMAT,
            line: line_number,
            reason: format!("invalid {name} '{}'", fields[index]),
        })
}

/// Render a record as a PAF line without trailing newline
#[must_use]
pub fn format_paf_line(record: &PafRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.query_name,
        record.query_len,
        record.query_start,
        record.query_end,
        record.strand,
        record.target_name,
        record.target_len,
        record.target_start,
        record.target_end,
        record.matches,
        record.block_len,
        record.mapq,
    );
    for tag in &record.tags {
        line.push('\t');
        line.push_str(tag);
    }
    line
}

/// Read PAF rows from a buffered reader, skipping blank lines
///
/// # Errors
///
/// Returns `ParseError` on IO failure or a malformed row.
pub fn read_paf_from<R: BufRead>(reader: R) -> Result<Vec<PafRecord>, ParseError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        records.push(parse_paf_line(line, i + 1)?);
    }
    Ok(records)
}

/// Read a PAF file
///
/// # Errors
///
/// Returns `ParseError::MissingOutput` if the file does not exist, otherwise
/// as [`read_paf_from`].
pub fn read_paf(path: &Path) -> Result<Vec<PafRecord>, ParseError> {
    if !path.exists() {
        return Err(ParseError::MissingOutput(path.display().to_string()));
    }
    read_paf_from(open_reader(path)?)
}

/// Write PAF rows to a file
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_paf(path: &Path, records: &[PafRecord]) -> std::io::Result<()> {
    let mut writer = create_writer(path)?;
    for record in records {
        writeln!(writer, "{}", format_paf_line(record))?;
    }
    writer.finish()
}
