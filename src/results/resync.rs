//! Re-pairing mates after the forward and reverse files were trimmed
//! independently. The trimmer drops reads from each file on its own, so a
//! read may survive in one file and not the other.

use std::collections::HashMap;

use crate::core::sequence::{SequenceCollection, SequenceRecord};

/// Name shared by both mates: the id without a trailing `/1` or `/2`
#[must_use]
pub fn mate_key(id: &str) -> &str {
    id.strip_suffix("/1")
        .or_else(|| id.strip_suffix("/2"))
        .unwrap_or(id)
}

/// Mates that survived in both files, in forward order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncedPairs {
    pub forward: SequenceCollection,
    pub reverse: SequenceCollection,
    /// Reads dropped because their mate was missing
    pub orphans: usize,
}

/// Keep only reads whose mate is present in the other file.
///
/// The reverse file is reordered to follow the forward file. If a name
/// occurs more than once, the first occurrence in each file is used.
#[must_use]
pub fn resync_mates(forward: SequenceCollection, reverse: SequenceCollection) -> SyncedPairs {
    let total = forward.len() + reverse.len();
    let mut reverse_by_key: HashMap<String, SequenceRecord> = HashMap::new();
    for record in reverse.into_records() {
        reverse_by_key
            .entry(mate_key(&record.id).to_string())
            .or_insert(record);
    }

    let mut kept_forward = Vec::new();
    let mut kept_reverse = Vec::new();
    for record in forward.into_records() {
        if let Some(mate) = reverse_by_key.remove(mate_key(&record.id)) {
            kept_forward.push(record);
            kept_reverse.push(mate);
        }
    }

    SyncedPairs {
        orphans: total - 2 * kept_forward.len(),
        forward: SequenceCollection::new(kept_forward),
        reverse: SequenceCollection::new(kept_reverse),
    }
}
