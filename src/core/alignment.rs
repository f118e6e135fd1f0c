//! Alignment records produced by the aligner.
//!
//! Two row formats are handled: PAF rows from `minimap2 -c` searches and SAM
//! rows from `minimap2 -a` alignments. Both are kept close to their text form
//! so that rows which pass a filter are written back byte-for-byte.

/// Target name minimap2 reports for a query without any hit (`--paf-no-hit`)
pub const NO_HIT_TARGET: &str = "*";

/// SAM flag bits used by the filters
pub mod flags {
    pub const PAIRED: u16 = 0x1;
    pub const UNMAPPED: u16 = 0x4;
    pub const REVERSE: u16 = 0x10;
    pub const FIRST_IN_PAIR: u16 = 0x40;
    pub const SECOND_IN_PAIR: u16 = 0x80;
    pub const SECONDARY: u16 = 0x100;
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// One PAF row (12 mandatory columns, optional tags kept verbatim)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PafRecord {
    pub query_name: String,
    pub query_len: u64,
    pub query_start: u64,
    pub query_end: u64,
    /// '+' or '-', '*' on no-hit rows
    pub strand: char,
    pub target_name: String,
    pub target_len: u64,
    pub target_start: u64,
    pub target_end: u64,
    /// Number of matching bases (column 10)
    pub matches: u64,
    /// Alignment block length (column 11)
    pub block_len: u64,
    pub mapq: u8,
    /// SAM-style tags from column 13 onwards
    pub tags: Vec<String>,
}

impl PafRecord {
    /// BLAST-like identity (`matches / block_len`), `None` for no-hit rows
    #[must_use]
    pub fn identity(&self) -> Option<f64> {
        if self.block_len == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let identity = self.matches as f64 / self.block_len as f64;
        Some(identity)
    }

    #[must_use]
    pub fn is_no_hit(&self) -> bool {
        self.target_name == NO_HIT_TARGET
    }
}

/// One SAM alignment line.
///
/// Fields are stored as text; only FLAG is parsed eagerly because every
/// filter looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamRecord {
    fields: Vec<String>,
    flag: u16,
}

impl SamRecord {
    pub(crate) fn from_parts(fields: Vec<String>, flag: u16) -> Self {
        Self { fields, flag }
    }

    #[must_use]
    pub fn qname(&self) -> &str {
        &self.fields[0]
    }

    #[must_use]
    pub fn flag(&self) -> u16 {
        self.flag
    }

    pub fn set_flag(&mut self, flag: u16) {
        self.flag = flag;
        self.fields[1] = flag.to_string();
    }

    #[must_use]
    pub fn reference_name(&self) -> &str {
        &self.fields[2]
    }

    #[must_use]
    pub fn cigar(&self) -> &str {
        &self.fields[5]
    }

    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.flag & flags::UNMAPPED != 0
    }

    /// Neither secondary nor supplementary
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.flag & (flags::SECONDARY | flags::SUPPLEMENTARY) == 0
    }

    /// Edit distance from the `NM:i:` tag
    #[must_use]
    pub fn edit_distance(&self) -> Option<u64> {
        self.fields
            .iter()
            .skip(11)
            .find_map(|tag| tag.strip_prefix("NM:i:"))
            .and_then(|v| v.parse().ok())
    }

    /// Aligned length: sum of M, I and D operations. Zero for `*`.
    #[must_use]
    pub fn aligned_length(&self) -> u64 {
        cigar_aligned_length(self.cigar())
    }

    /// Fraction of aligned bases that match, `(len - NM) / len`.
    ///
    /// A missing NM tag counts as zero mismatches. Records without an
    /// alignment (CIGAR `*` or zero aligned length) report `None`.
    #[must_use]
    pub fn identity(&self) -> Option<f64> {
        let length = self.aligned_length();
        if length == 0 {
            return None;
        }
        let mismatches = self.edit_distance().unwrap_or(0).min(length);
        #[allow(clippy::cast_precision_loss)]
        let identity = (length - mismatches) as f64 / length as f64;
        Some(identity)
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Render as a tab-separated line without trailing newline
    #[must_use]
    pub fn to_line(&self) -> String {
        self.fields.join("\t")
    }
}

/// Sum the lengths of M/I/D operations in a CIGAR string
#[must_use]
pub fn cigar_aligned_length(cigar: &str) -> u64 {
    if cigar == "*" {
        return 0;
    }

    let mut total = 0u64;
    let mut current = 0u64;
    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            current = current.saturating_mul(10).saturating_add(u64::from(digit));
        } else {
            if matches!(c, 'M' | 'I' | 'D') {
                total = total.saturating_add(current);
            }
            current = 0;
        }
    }
    total
}
