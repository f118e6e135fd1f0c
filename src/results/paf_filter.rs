use std::collections::HashMap;

use crate::core::alignment::PafRecord;

/// Secondary filters applied to `minimap2 -c` hits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchFilter {
    /// Keep at most this many rows per query
    pub max_accepts: usize,
    /// Minimum `matches / block_len`
    pub perc_identity: Option<f64>,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            max_accepts: 1,
            perc_identity: None,
        }
    }
}

/// Keep the first `max_accepts` rows of every query, preserving row order
#[must_use]
pub fn apply_max_accepts(records: Vec<PafRecord>, max_accepts: usize) -> Vec<PafRecord> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    records
        .into_iter()
        .filter(|record| {
            let seen = counts.entry(record.query_name.clone()).or_insert(0);
            if *seen < max_accepts {
                *seen += 1;
                true
            } else {
                false
            }
        })
        .collect()
}

/// Keep rows whose identity is at least `threshold`.
///
/// Rows with a zero block length carry no identity and are always kept, so
/// no-hit rows survive.
#[must_use]
pub fn apply_perc_identity(records: Vec<PafRecord>, threshold: f64) -> Vec<PafRecord> {
    records
        .into_iter()
        .filter(|record| record.identity().map_or(true, |identity| identity >= threshold))
        .collect()
}

/// Max-accepts first, then the identity threshold if one is set
#[must_use]
pub fn filter_search_results(records: Vec<PafRecord>, filter: &SearchFilter) -> Vec<PafRecord> {
    let records = apply_max_accepts(records, filter.max_accepts);
    match filter.perc_identity {
        Some(threshold) => apply_perc_identity(records, threshold),
        None => records,
    }
}
