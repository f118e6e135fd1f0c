//! Mapped/unmapped selection over `minimap2 -a` output.
//!
//! Only primary records take part: secondary and supplementary alignments
//! would otherwise emit the same read more than once. A primary record is
//! mapped when it is aligned and, if a threshold is given, its identity
//! reaches that threshold. Everything else is unmapped, so the two
//! selections partition the primary records exactly.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::alignment::{flags, SamRecord};
use crate::core::types::ReadSelection;

/// How reads are selected from an alignment
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentFilter {
    pub keep: ReadSelection,
    /// Minimum `(len - NM) / len` for a read to count as mapped
    pub min_identity: Option<f64>,
}

/// Counts reported after a selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub primary: usize,
    pub non_primary: usize,
    pub kept: usize,
}

/// Whether a primary record counts as mapped.
///
/// Records without an aligned length (CIGAR `*`) have no identity and are
/// judged on the unmapped flag alone.
#[must_use]
pub fn is_mapped(record: &SamRecord, min_identity: Option<f64>) -> bool {
    if record.is_unmapped() {
        return false;
    }
    match min_identity {
        Some(threshold) => record.identity().unwrap_or(1.0) >= threshold,
        None => true,
    }
}

/// Split primary records into (mapped, unmapped), dropping the rest
#[must_use]
pub fn partition(records: &[SamRecord], min_identity: Option<f64>) -> (Vec<SamRecord>, Vec<SamRecord>) {
    records
        .iter()
        .filter(|r| r.is_primary())
        .cloned()
        .partition(|r| is_mapped(r, min_identity))
}

fn wanted(mapped: bool, keep: ReadSelection) -> bool {
    match keep {
        ReadSelection::Mapped => mapped,
        ReadSelection::Unmapped => !mapped,
    }
}

/// Select single-end reads
#[must_use]
pub fn select_single(records: &[SamRecord], filter: &AlignmentFilter) -> (Vec<SamRecord>, FilterSummary) {
    let mut summary = FilterSummary::default();
    let mut kept = Vec::new();
    for record in records {
        if !record.is_primary() {
            summary.non_primary += 1;
            continue;
        }
        summary.primary += 1;
        if wanted(is_mapped(record, filter.min_identity), filter.keep) {
            kept.push(record.clone());
        }
    }
    summary.kept = kept.len();
    debug!(
        "Kept {} of {} primary alignments ({} secondary/supplementary dropped)",
        summary.kept, summary.primary, summary.non_primary
    );
    (kept, summary)
}

/// Select paired-end reads.
///
/// Primary records are collated by read name. A pair is mapped only when
/// every primary mate is mapped, and both mates are kept or dropped
/// together. Kept mates
/// are written adjacent with `PAIRED|READ1` and `PAIRED|READ2` set so the
/// converter routes them to the forward and reverse files; a mate without a
/// partner ends up as a singleton.
#[must_use]
pub fn select_paired(records: &[SamRecord], filter: &AlignmentFilter) -> (Vec<SamRecord>, FilterSummary) {
    let mut summary = FilterSummary::default();
    let mut groups: Vec<Vec<&SamRecord>> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if !record.is_primary() {
            summary.non_primary += 1;
            continue;
        }
        summary.primary += 1;
        let slot = *by_name.entry(record.qname()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    let mut kept = Vec::new();
    for group in groups {
        let mapped = group.iter().all(|r| is_mapped(r, filter.min_identity));
        if !wanted(mapped, filter.keep) {
            continue;
        }
        if group.len() > 2 {
            warn!(
                "Read '{}' has {} primary records; keeping the first two",
                group[0].qname(),
                group.len()
            );
        }
        kept.extend(order_mates(&group));
    }
    summary.kept = kept.len();
    debug!(
        "Kept {} of {} primary alignments from paired reads ({} secondary/supplementary dropped)",
        summary.kept, summary.primary, summary.non_primary
    );
    (kept, summary)
}

/// Put READ1 before READ2 and set the pair flags on both
fn order_mates(group: &[&SamRecord]) -> Vec<SamRecord> {
    let mut mates: Vec<(usize, SamRecord)> = group
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let slot = if record.flag() & flags::FIRST_IN_PAIR != 0 {
                0
            } else if record.flag() & flags::SECOND_IN_PAIR != 0 {
                1
            } else {
                position
            };
            (slot, (*record).clone())
        })
        .collect();
    mates.sort_by_key(|(slot, _)| *slot);
    mates.truncate(2);

    mates
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut record))| {
            let (set, clear) = if i == 0 {
                (flags::FIRST_IN_PAIR, flags::SECOND_IN_PAIR)
            } else {
                (flags::SECOND_IN_PAIR, flags::FIRST_IN_PAIR)
            };
            record.set_flag((record.flag() | flags::PAIRED | set) & !clear);
            record
        })
        .collect()
}

/// Select single- or paired-end reads
#[must_use]
pub fn select(records: &[SamRecord], filter: &AlignmentFilter, paired: bool) -> (Vec<SamRecord>, FilterSummary) {
    if paired {
        select_paired(records, filter)
    } else {
        select_single(records, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::sam::parse_sam_line;
    use std::collections::HashSet;

    fn record(name: &str, flag: u16, cigar: &str, nm: Option<u32>) -> SamRecord {
        let mut line = format!("{name}\t{flag}\tref1\t1\t60\t{cigar}\t*\t0\t0\tACGTACGTAC\t*");
        if let Some(nm) = nm {
            line.push_str(&format!("\tNM:i:{nm}"));
        }
        parse_sam_line(&line, 1).unwrap()
    }

    fn names(records: &[SamRecord]) -> Vec<&str> {
        records.iter().map(SamRecord::qname).collect()
    }

    fn sample() -> Vec<SamRecord> {
        vec![
            record("perfect", 0, "10M", Some(0)),
            record("close", 16, "10M", Some(1)),
            record("poor", 0, "10M", Some(5)),
            record("unaligned", 4, "*", None),
            record("close", 256, "10M", Some(0)),
            record("poor", 2048, "5M5S", Some(0)),
        ]
    }

    #[test]
    fn test_is_mapped_thresholds() {
        let close = record("close", 0, "10M", Some(1));
        assert!(is_mapped(&close, None));
        assert!(is_mapped(&close, Some(0.9)));
        assert!(!is_mapped(&close, Some(0.91)));
        assert!(!is_mapped(&record("u", 4, "*", None), None));
        assert!(!is_mapped(&record("u", 4, "*", None), Some(0.0)));
    }

    #[test]
    fn test_select_single_mapped() {
        let filter = AlignmentFilter {
            keep: ReadSelection::Mapped,
            min_identity: Some(0.85),
        };
        let (kept, summary) = select_single(&sample(), &filter);
        assert_eq!(names(&kept), vec!["perfect", "close"]);
        assert_eq!(summary.primary, 4);
        assert_eq!(summary.non_primary, 2);
        assert_eq!(summary.kept, 2);
    }

    #[test]
    fn test_select_single_unmapped() {
        let filter = AlignmentFilter {
            keep: ReadSelection::Unmapped,
            min_identity: Some(0.85),
        };
        let (kept, _) = select_single(&sample(), &filter);
        assert_eq!(names(&kept), vec!["poor", "unaligned"]);
        assert!(kept.iter().all(SamRecord::is_primary));
    }

    #[test]
    fn test_selections_partition_primary_records() {
        let records = sample();
        for step in 0..=10 {
            let threshold = f64::from(step) / 10.0;
            let select_with = |keep| {
                let filter = AlignmentFilter {
                    keep,
                    min_identity: Some(threshold),
                };
                select_single(&records, &filter).0
            };
            let mapped = select_with(ReadSelection::Mapped);
            let unmapped = select_with(ReadSelection::Unmapped);

            for r in &mapped {
                assert!(r.identity().unwrap_or(1.0) >= threshold);
            }
            let mapped_names: HashSet<&str> = names(&mapped).into_iter().collect();
            let unmapped_names: HashSet<&str> = names(&unmapped).into_iter().collect();
            assert!(mapped_names.is_disjoint(&unmapped_names));
            assert_eq!(mapped.len() + unmapped.len(), 4, "threshold {threshold}");

            let (m, u) = partition(&records, Some(threshold));
            assert_eq!(m, mapped);
            assert_eq!(u, unmapped);
        }
    }

    #[test]
    fn test_select_paired_keeps_pairs_together() {
        let records = vec![
            record("p1", 0x1 | 0x40, "10M", Some(0)),
            record("p1", 0x1 | 0x80, "10M", Some(0)),
            record("p2", 0x1 | 0x40, "10M", Some(0)),
            record("p2", 0x1 | 0x4 | 0x80, "*", None),
            record("p3", 0x1 | 0x4 | 0x40, "*", None),
            record("p3", 0x1 | 0x4 | 0x80, "*", None),
        ];
        let mapped = AlignmentFilter::default();
        let (kept, summary) = select_paired(&records, &mapped);
        assert_eq!(names(&kept), vec!["p1", "p1"]);
        assert_eq!(summary.primary, 6);

        let unmapped = AlignmentFilter {
            keep: ReadSelection::Unmapped,
            min_identity: None,
        };
        let (kept, _) = select_paired(&records, &unmapped);
        assert_eq!(names(&kept), vec!["p2", "p2", "p3", "p3"]);
        assert_eq!(kept[2].flag(), 0x1 | 0x4 | 0x40);
        assert_eq!(kept[3].flag(), 0x1 | 0x4 | 0x80);
    }

    #[test]
    fn test_pair_with_one_weak_mate_is_unmapped() {
        let records = vec![
            record("p", 0x1 | 0x40, "10M", Some(0)),
            record("p", 0x1 | 0x80, "10M", Some(5)),
        ];
        let mapped = AlignmentFilter {
            keep: ReadSelection::Mapped,
            min_identity: Some(0.85),
        };
        let (kept, summary) = select_paired(&records, &mapped);
        assert!(kept.is_empty());
        assert_eq!(summary.kept, 0);

        let unmapped = AlignmentFilter {
            keep: ReadSelection::Unmapped,
            ..mapped
        };
        let (kept, _) = select_paired(&records, &unmapped);
        assert_eq!(names(&kept), vec!["p", "p"]);
    }

    #[test]
    fn test_select_paired_sets_mate_flags() {
        // Mates without pair flags: first seen becomes READ1
        let records = vec![
            record("r", 0, "10M", Some(0)),
            record("s", 0, "10M", Some(0)),
            record("r", 16, "10M", Some(0)),
            record("s", 16, "10M", Some(0)),
        ];
        let (kept, _) = select_paired(&records, &AlignmentFilter::default());
        assert_eq!(names(&kept), vec!["r", "r", "s", "s"]);
        assert_eq!(kept[0].flag(), 0x1 | 0x40);
        assert_eq!(kept[1].flag(), 0x1 | 0x10 | 0x80);
        assert_eq!(kept[2].flag(), 0x1 | 0x40);
        assert_eq!(kept[3].flag(), 0x1 | 0x10 | 0x80);
    }

    #[test]
    fn test_select_paired_orders_by_existing_flags() {
        let records = vec![
            record("r", 0x1 | 0x80, "10M", Some(0)),
            record("r", 0x1 | 0x40, "10M", Some(0)),
        ];
        let (kept, _) = select_paired(&records, &AlignmentFilter::default());
        assert_eq!(kept[0].flag() & 0x40, 0x40);
        assert_eq!(kept[1].flag() & 0x80, 0x80);
    }
}
