/// A single read or feature sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Identifier (FASTA/FASTQ name without description)
    pub id: String,

    /// Nucleotide sequence
    pub sequence: Vec<u8>,

    /// Phred+33 quality string, present for FASTQ-derived records
    pub quality: Option<Vec<u8>>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            quality: None,
        }
    }

    #[must_use]
    pub fn with_quality(mut self, quality: impl Into<Vec<u8>>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Mean Phred quality computed in error-probability space, the way
    /// read-level quality filters report it.
    #[must_use]
    pub fn mean_quality(&self) -> Option<f64> {
        let quality = self.quality.as_ref()?;
        if quality.is_empty() {
            return None;
        }
        let total: f64 = quality
            .iter()
            .map(|q| 10f64.powf(-f64::from(q.saturating_sub(33)) / 10.0))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean_error = total / quality.len() as f64;
        Some(-10.0 * mean_error.log10())
    }
}

/// Ordered, immutable set of sequence records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceCollection {
    records: Vec<SequenceRecord>,
}

impl SequenceCollection {
    #[must_use]
    pub fn new(records: Vec<SequenceRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when every record carries quality scores
    #[must_use]
    pub fn has_quality(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.quality.is_some())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<SequenceRecord> {
        self.records
    }
}

impl FromIterator<SequenceRecord> for SequenceCollection {
    fn from_iter<I: IntoIterator<Item = SequenceRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SequenceCollection {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
