//! Consensus taxonomy over search hits.
//!
//! Every hit of a query contributes the lineage of its target. Ranks are
//! walked from the root; at each rank only lineages sharing the accepted
//! prefix vote, and the most common value is accepted while the share of
//! all hits carrying that prefix stays at or above `min_consensus`.
//! Segments are compared as written and rejoined with `;`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::alignment::PafRecord;
use crate::core::taxonomy::{ConsensusAssignment, TaxonomyTable};
use crate::formats::ParseError;

/// Default fraction of hits that must agree at a rank
pub const DEFAULT_MIN_CONSENSUS: f64 = 0.51;

/// Label for queries without a usable assignment
pub const DEFAULT_UNASSIGNABLE_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusParams {
    pub min_consensus: f64,
    pub unassignable_label: String,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            min_consensus: DEFAULT_MIN_CONSENSUS,
            unassignable_label: DEFAULT_UNASSIGNABLE_LABEL.to_string(),
        }
    }
}

/// Group the lineage of every hit under its query id.
///
/// No-hit rows (target `*`) contribute the unassignable label.
///
/// # Errors
///
/// Returns `ParseError::UnknownReferenceIds`, listing the ids in sorted
/// order, if any target is missing from the reference taxonomy.
pub fn collect_hits(
    records: &[PafRecord],
    taxonomy: &TaxonomyTable,
    unassignable_label: &str,
) -> Result<BTreeMap<String, Vec<String>>, ParseError> {
    let missing: BTreeSet<&str> = records
        .iter()
        .filter(|r| !r.is_no_hit() && !taxonomy.contains(&r.target_name))
        .map(|r| r.target_name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::UnknownReferenceIds(
            missing.into_iter().map(String::from).collect(),
        ));
    }

    let mut hits: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        let label = if record.is_no_hit() {
            unassignable_label
        } else {
            taxonomy.get(&record.target_name).unwrap_or(unassignable_label)
        };
        hits.entry(record.query_name.clone())
            .or_default()
            .push(label.to_string());
    }
    Ok(hits)
}

/// Consensus lineage and its supporting fraction for one query's labels
#[must_use]
pub fn consensus_label(labels: &[String], params: &ConsensusParams) -> (String, f64) {
    let unassigned = || (params.unassignable_label.clone(), 0.0);
    if labels.is_empty() {
        return unassigned();
    }

    let lineages: Vec<Vec<&str>> = labels
        .iter()
        .map(|label| label.split(';').collect())
        .collect();
    let depth = lineages.iter().map(Vec::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let total = lineages.len() as f64;

    let mut accepted: Vec<&str> = Vec::new();
    let mut fraction = 0.0;
    for rank in 0..depth {
        let candidates = lineages
            .iter()
            .filter(|l| l.len() > rank && l[..rank] == accepted[..])
            .map(|l| l[rank]);
        let Some((value, count)) = most_common(candidates) else {
            break;
        };
        #[allow(clippy::cast_precision_loss)]
        let share = count as f64 / total;
        if share < params.min_consensus {
            break;
        }
        accepted.push(value);
        fraction = share;
    }

    if accepted.is_empty() {
        unassigned()
    } else {
        (accepted.join(";"), fraction)
    }
}

/// Most frequent value, ties going to the one seen first
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> Option<(&'a str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for value in order {
        let count = counts[value];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best
}

/// Consensus assignment for every query in the search results, sorted by id
///
/// # Errors
///
/// Returns `ParseError::UnknownReferenceIds` if a hit names a target the
/// reference taxonomy does not contain.
pub fn find_consensus(
    records: &[PafRecord],
    taxonomy: &TaxonomyTable,
    params: &ConsensusParams,
) -> Result<Vec<ConsensusAssignment>, ParseError> {
    let hits = collect_hits(records, taxonomy, &params.unassignable_label)?;
    Ok(hits
        .into_iter()
        .map(|(feature_id, labels)| {
            let (taxon, consensus) = consensus_label(&labels, params);
            ConsensusAssignment {
                feature_id,
                taxon,
                consensus,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taxonomy::TaxonomyEntry;
    use crate::formats::paf::parse_paf_line;

    const LEGIONELLALES: &str =
        "k__Bacteria; p__Proteobacteria; c__Gammaproteobacteria; o__Legionellales; f__; g__; s__";
    const GAMMA: &str = "k__Bacteria; p__Proteobacteria; c__Gammaproteobacteria; o__; f__; g__; s__";
    const SAR202: &str = "k__Bacteria; p__Chloroflexi; c__SAR202; o__; f__; g__; s__";

    fn taxonomy() -> TaxonomyTable {
        [("ref1", LEGIONELLALES), ("ref2", GAMMA), ("ref3", SAR202)]
            .into_iter()
            .map(|(id, taxon)| TaxonomyEntry {
                feature_id: id.to_string(),
                taxon: taxon.to_string(),
                confidence: None,
            })
            .collect()
    }

    fn hit(query: &str, target: &str) -> PafRecord {
        parse_paf_line(
            &format!("{query}\t1400\t0\t1400\t+\t{target}\t1450\t0\t1400\t1390\t1400\t60"),
            1,
        )
        .unwrap()
    }

    fn no_hit(query: &str) -> PafRecord {
        parse_paf_line(&format!("{query}\t1400\t0\t0\t*\t*\t0\t0\t0\t0\t0\t0"), 1).unwrap()
    }

    fn search_results() -> Vec<PafRecord> {
        vec![
            hit("1111561", "ref1"),
            hit("1111561", "ref2"),
            hit("835097", "ref3"),
            no_hit("junk"),
        ]
    }

    #[test]
    fn test_collect_hits_groups_by_query() {
        let hits = collect_hits(&search_results(), &taxonomy(), "Unassigned").unwrap();
        assert_eq!(hits.keys().collect::<Vec<_>>(), vec!["1111561", "835097", "junk"]);
        assert_eq!(hits["1111561"], vec![LEGIONELLALES, GAMMA]);
        assert_eq!(hits["835097"], vec![SAR202]);
        assert_eq!(hits["junk"], vec!["Unassigned"]);
    }

    #[test]
    fn test_unknown_ids_are_named() {
        let mut records = search_results();
        records.push(hit("junk", "lost-id"));
        records.push(hit("junk", "also-lost"));
        let err = collect_hits(&records, &taxonomy(), "Unassigned").unwrap_err();
        match &err {
            ParseError::UnknownReferenceIds(ids) => assert_eq!(ids, &["also-lost", "lost-id"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("results do not match"));
        assert!(err.to_string().contains("lost-id"));
    }

    #[test]
    fn test_find_consensus_annotation() {
        let result =
            find_consensus(&search_results(), &taxonomy(), &ConsensusParams::default()).unwrap();
        let rows: Vec<(&str, &str, f64)> = result
            .iter()
            .map(|a| (a.feature_id.as_str(), a.taxon.as_str(), a.consensus))
            .collect();
        assert_eq!(
            rows,
            vec![
                (
                    "1111561",
                    "k__Bacteria; p__Proteobacteria; c__Gammaproteobacteria",
                    1.0
                ),
                ("835097", SAR202, 1.0),
                ("junk", "Unassigned", 1.0),
            ]
        );
    }

    #[test]
    fn test_partial_agreement_reports_fraction() {
        let labels = vec![
            "k__A; p__B; c__C".to_string(),
            "k__A; p__B; c__D".to_string(),
            "k__A; p__E".to_string(),
        ];
        let params = ConsensusParams {
            min_consensus: 0.6,
            ..ConsensusParams::default()
        };
        let (taxon, fraction) = consensus_label(&labels, &params);
        assert_eq!(taxon, "k__A; p__B");
        assert!((fraction - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_deeper_ranks_only_count_the_accepted_prefix() {
        let labels = vec![
            "k__A; p__X; c__1".to_string(),
            "k__A; p__Y; c__1".to_string(),
            "k__A; p__X; c__2".to_string(),
        ];
        let (taxon, fraction) = consensus_label(&labels, &ConsensusParams::default());
        assert_eq!(taxon, "k__A; p__X");
        assert!((fraction - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_labels_keep_their_separator_spacing() {
        let labels = vec!["k__A;p__B".to_string(), "k__A;p__B".to_string()];
        assert_eq!(
            consensus_label(&labels, &ConsensusParams::default()),
            ("k__A;p__B".to_string(), 1.0)
        );
    }

    #[test]
    fn test_no_accepted_rank_is_unassignable() {
        let labels = vec!["k__A".to_string(), "k__B".to_string()];
        let params = ConsensusParams {
            min_consensus: 0.51,
            unassignable_label: "Unknown".to_string(),
        };
        assert_eq!(consensus_label(&labels, &params), ("Unknown".to_string(), 0.0));
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let values = ["b", "a", "a", "b"];
        assert_eq!(most_common(values.into_iter()), Some(("b", 2)));
        assert_eq!(most_common(std::iter::empty()), None);
    }

    #[test]
    fn test_shorter_lineages_count_against_deeper_ranks() {
        let labels = vec!["k__A; p__B".to_string(), "k__A".to_string()];
        let params = ConsensusParams {
            min_consensus: 0.51,
            ..ConsensusParams::default()
        };
        assert_eq!(consensus_label(&labels, &params), ("k__A".to_string(), 1.0));
    }
}
