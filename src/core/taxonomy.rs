use std::collections::HashMap;

/// Reference taxonomy: feature id → semicolon-delimited lineage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonomyTable {
    entries: Vec<TaxonomyEntry>,
    index: HashMap<String, usize>,
}

/// One row of a taxonomy table
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyEntry {
    pub feature_id: String,
    pub taxon: String,
    /// Confidence or consensus fraction, if the table carries one
    pub confidence: Option<f64>,
}

impl TaxonomyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the lineage for a feature, keeping first-seen order
    pub fn insert(&mut self, entry: TaxonomyEntry) {
        if let Some(&i) = self.index.get(&entry.feature_id) {
            self.entries[i] = entry;
        } else {
            self.index.insert(entry.feature_id.clone(), self.entries.len());
            self.entries.push(entry);
        }
    }

    #[must_use]
    pub fn get(&self, feature_id: &str) -> Option<&str> {
        self.index
            .get(feature_id)
            .map(|&i| self.entries[i].taxon.as_str())
    }

    #[must_use]
    pub fn contains(&self, feature_id: &str) -> bool {
        self.index.contains_key(feature_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one row carries a confidence value
    #[must_use]
    pub fn has_confidence(&self) -> bool {
        self.entries.iter().any(|e| e.confidence.is_some())
    }
}

impl FromIterator<TaxonomyEntry> for TaxonomyTable {
    fn from_iter<I: IntoIterator<Item = TaxonomyEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Consensus label chosen for one query
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusAssignment {
    pub feature_id: String,
    pub taxon: String,
    /// Fraction of hits agreeing at the deepest accepted rank
    pub consensus: f64,
}

impl ConsensusAssignment {
    #[must_use]
    pub fn into_entry(self) -> TaxonomyEntry {
        TaxonomyEntry {
            feature_id: self.feature_id,
            taxon: self.taxon,
            confidence: Some(self.consensus),
        }
    }
}
