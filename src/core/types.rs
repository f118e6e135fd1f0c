use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic type of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactType {
    #[serde(rename = "FeatureData[Sequence]")]
    FeatureSequences,
    #[serde(rename = "FeatureData[Taxonomy]")]
    FeatureTaxonomy,
    #[serde(rename = "FeatureData[PairwiseAlignmentMN2]")]
    PairwiseAlignments,
    #[serde(rename = "Minimap2IndexDB")]
    Minimap2Index,
    #[serde(rename = "SampleData[SequencesWithQuality]")]
    SingleEndReads,
    #[serde(rename = "SampleData[PairedEndSequencesWithQuality]")]
    PairedEndReads,
    #[serde(rename = "Visualization")]
    Visualization,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 7] = [
        Self::FeatureSequences,
        Self::FeatureTaxonomy,
        Self::PairwiseAlignments,
        Self::Minimap2Index,
        Self::SingleEndReads,
        Self::PairedEndReads,
        Self::Visualization,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureSequences => "FeatureData[Sequence]",
            Self::FeatureTaxonomy => "FeatureData[Taxonomy]",
            Self::PairwiseAlignments => "FeatureData[PairwiseAlignmentMN2]",
            Self::Minimap2Index => "Minimap2IndexDB",
            Self::SingleEndReads => "SampleData[SequencesWithQuality]",
            Self::PairedEndReads => "SampleData[PairedEndSequencesWithQuality]",
            Self::Visualization => "Visualization",
        }
    }

    /// Name of the on-disk directory format backing this type
    #[must_use]
    pub fn format_name(self) -> &'static str {
        match self {
            Self::FeatureSequences => "DNASequencesDirectoryFormat",
            Self::FeatureTaxonomy => "TSVTaxonomyDirectoryFormat",
            Self::PairwiseAlignments => "PairwiseAlignmentMN2DirectoryFormat",
            Self::Minimap2Index => "Minimap2IndexDBDirFmt",
            Self::SingleEndReads | Self::PairedEndReads => {
                "CasavaOneEightSingleLanePerSampleDirFmt"
            }
            Self::Visualization => "HTMLVisualization",
        }
    }

    /// Per-sample read collections carry quality scores
    #[must_use]
    pub fn is_sample_data(self) -> bool {
        matches!(self, Self::SingleEndReads | Self::PairedEndReads)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == compact)
            .ok_or_else(|| format!("unknown artifact type '{s}'"))
    }
}

/// minimap2 preset describing the read technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MappingPreset {
    /// Noisy Nanopore reads (~10% error rate)
    #[default]
    MapOnt,
    /// PacBio HiFi reads
    MapHifi,
    /// PacBio continuous long reads
    MapPb,
}

impl MappingPreset {
    pub const CHOICES: &'static [&'static str] = &["map-ont", "map-hifi", "map-pb"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MapOnt => "map-ont",
            Self::MapHifi => "map-hifi",
            Self::MapPb => "map-pb",
        }
    }
}

impl FromStr for MappingPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "map-ont" => Ok(Self::MapOnt),
            "map-hifi" => Ok(Self::MapHifi),
            "map-pb" => Ok(Self::MapPb),
            other => Err(format!("unknown mapping preset '{other}'")),
        }
    }
}

impl fmt::Display for MappingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which reads survive an alignment-based filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReadSelection {
    /// Reads aligning to the reference
    #[default]
    Mapped,
    /// Reads without a qualifying alignment
    Unmapped,
}

impl ReadSelection {
    pub const CHOICES: &'static [&'static str] = &["mapped", "unmapped"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mapped => "mapped",
            Self::Unmapped => "unmapped",
        }
    }
}

impl FromStr for ReadSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapped" => Ok(Self::Mapped),
            "unmapped" => Ok(Self::Unmapped),
            other => Err(format!("unknown read selection '{other}'")),
        }
    }
}

impl fmt::Display for ReadSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a read file within a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadDirection {
    Forward,
    Reverse,
}

impl ReadDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }

    /// Casava read number (R1/R2)
    #[must_use]
    pub fn read_number(self) -> u8 {
        match self {
            Self::Forward => 1,
            Self::Reverse => 2,
        }
    }
}
