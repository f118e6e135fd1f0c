//! Taxonomy TSV: `Feature ID<TAB>Taxon[<TAB>Confidence|Consensus]`.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::core::taxonomy::{TaxonomyEntry, TaxonomyTable};
use crate::formats::{create_writer, open_reader, FormatError};

pub const FEATURE_ID_HEADER: &str = "Feature ID";
pub const TAXON_HEADER: &str = "Taxon";

/// Header accepted in place of `Feature ID` (legacy OTU tables)
const LEGACY_ID_HEADERS: &[&str] = &["#OTUID", "#OTU ID", "Feature-ID", "id"];

/// Read a taxonomy table.
///
/// A header row is optional; without one the first two columns are taken
/// as id and taxon. A third numeric column becomes the confidence.
///
/// # Errors
///
/// Returns `FormatError::InvalidTaxonomy` for rows with fewer than two
/// columns, an empty id, or a non-numeric confidence.
pub fn read_taxonomy(path: &Path) -> Result<TaxonomyTable, FormatError> {
    read_taxonomy_from(open_reader(path)?)
}

/// Read a taxonomy table from any buffered reader
///
/// # Errors
///
/// See [`read_taxonomy`].
pub fn read_taxonomy_from<R: BufRead>(reader: R) -> Result<TaxonomyTable, FormatError> {
    let mut table = TaxonomyTable::new();
    let mut seen_first = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if !seen_first {
            seen_first = true;
            let first = fields[0].trim();
            if first == FEATURE_ID_HEADER || LEGACY_ID_HEADERS.contains(&first) {
                continue;
            }
        }
        // Comment lines after the header
        if fields[0].starts_with('#') {
            continue;
        }

        if fields.len() < 2 {
            return Err(FormatError::InvalidTaxonomy(format!(
                "line {}: expected at least 2 tab-separated columns",
                i + 1
            )));
        }

        let feature_id = fields[0].trim();
        if feature_id.is_empty() {
            return Err(FormatError::InvalidTaxonomy(format!(
                "line {}: empty feature id",
                i + 1
            )));
        }

        let confidence = match fields.get(2).map(|c| c.trim()) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<f64>().map_err(|_| {
                FormatError::InvalidTaxonomy(format!(
                    "line {}: invalid confidence '{value}'",
                    i + 1
                ))
            })?),
        };

        table.insert(TaxonomyEntry {
            feature_id: feature_id.to_string(),
            taxon: fields[1].trim().to_string(),
            confidence,
        });
    }

    Ok(table)
}

/// Format a fraction the way the table stores it: whole numbers keep one
/// decimal (`1.0`), everything else uses the shortest exact representation.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn format_fraction(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Write a taxonomy table with a header row.
///
/// `score_column` names the third column (`Confidence` or `Consensus`);
/// with `None` only id and taxon are written.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_taxonomy(
    path: &Path,
    table: &TaxonomyTable,
    score_column: Option<&str>,
) -> std::io::Result<()> {
    let mut writer = create_writer(path)?;
    write_taxonomy_to(&mut writer, table, score_column)?;
    writer.finish()
}

/// Write a taxonomy table to any writer
///
/// # Errors
///
/// Returns an IO error if writing fails.
pub fn write_taxonomy_to<W: Write>(
    writer: &mut W,
    table: &TaxonomyTable,
    score_column: Option<&str>,
) -> std::io::Result<()> {
    match score_column {
        Some(name) => writeln!(writer, "{FEATURE_ID_HEADER}\t{TAXON_HEADER}\t{name}")?,
        None => writeln!(writer, "{FEATURE_ID_HEADER}\t{TAXON_HEADER}")?,
    }
    for entry in table.entries() {
        match (score_column, entry.confidence) {
            (Some(_), Some(score)) => writeln!(
                writer,
                "{}\t{}\t{}",
                entry.feature_id,
                entry.taxon,
                format_fraction(score)
            )?,
            (Some(_), None) => writeln!(writer, "{}\t{}\t", entry.feature_id, entry.taxon)?,
            (None, _) => writeln!(writer, "{}\t{}", entry.feature_id, entry.taxon)?,
        }
    }
    Ok(())
}
