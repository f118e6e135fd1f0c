//! Inputs, parameters and helpers shared by several actions.

use std::path::PathBuf;

use crate::actions::schema::{Bound, InputSpec, ParamDefault, ParamKind, ParamSpec};
use crate::actions::{ActionContext, ActionError, ValidationError};
use crate::artifact::manifest::SampleFiles;
use crate::artifact::{INDEX_FILE, SEQUENCES_FILE};
use crate::core::types::{ArtifactType, MappingPreset, ReadSelection};
use crate::formats::fastq::require_quality;
use crate::tools::minimap2::{ReferenceTarget, ScoringOptions};

pub const INDEX_DATABASE: &str = "index_database";
pub const REFERENCE_READS: &str = "reference_reads";

pub const SAMPLE_READS: &[ArtifactType] = &[ArtifactType::SingleEndReads, ArtifactType::PairedEndReads];

pub const INDEX_DATABASE_INPUT: InputSpec = InputSpec {
    name: INDEX_DATABASE,
    types: &[ArtifactType::Minimap2Index],
    required: false,
    description: "minimap2 index database. Incompatible with reference_reads.",
};

pub const REFERENCE_READS_INPUT: InputSpec = InputSpec {
    name: REFERENCE_READS,
    types: &[ArtifactType::FeatureSequences],
    required: false,
    description: "Reference sequences. Incompatible with index_database.",
};

pub const REFERENCE_CHOICE: &[(&str, &str)] = &[(INDEX_DATABASE, REFERENCE_READS)];

/// `[0, 1]`
pub const FRACTION: ParamKind = ParamKind::Float {
    min: Some(Bound::Inclusive(0.0)),
    max: Some(Bound::Inclusive(1.0)),
};

pub const fn at_least(min: i64) -> ParamKind {
    ParamKind::Int {
        min: Some(min),
        max: None,
    }
}

pub const fn n_threads(default: i64) -> ParamSpec {
    ParamSpec {
        name: "n_threads",
        kind: at_least(1),
        default: ParamDefault::Int(default),
        description: "Number of threads to use",
    }
}

pub const MAPPING_PRESET: ParamSpec = ParamSpec {
    name: "mapping_preset",
    kind: ParamKind::Choice(MappingPreset::CHOICES),
    default: ParamDefault::Str("map-ont"),
    description: "minimap2 preset for the read technology",
};

pub const MIN_PER_IDENTITY: ParamSpec = ParamSpec {
    name: "min_per_identity",
    kind: FRACTION,
    default: ParamDefault::None,
    description: "Minimum identity for a read to count as mapped",
};

pub const MATCHING_SCORE: ParamSpec = ParamSpec {
    name: "matching_score",
    kind: ParamKind::Int {
        min: None,
        max: None,
    },
    default: ParamDefault::None,
    description: "Matching score (minimap2 -A)",
};

pub const MISMATCHING_PENALTY: ParamSpec = ParamSpec {
    name: "mismatching_penalty",
    kind: ParamKind::Int {
        min: None,
        max: None,
    },
    default: ParamDefault::None,
    description: "Mismatching penalty (minimap2 -B)",
};

pub const GAP_OPEN_PENALTY: ParamSpec = ParamSpec {
    name: "gap_open_penalty",
    kind: at_least(1),
    default: ParamDefault::None,
    description: "Gap open penalty (minimap2 -O)",
};

pub const GAP_EXTENSION_PENALTY: ParamSpec = ParamSpec {
    name: "gap_extension_penalty",
    kind: at_least(1),
    default: ParamDefault::None,
    description: "Gap extension penalty (minimap2 -E)",
};

/// `mapped` or `unmapped` selection, named `keep` or `extract`
pub const fn selection(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Choice(ReadSelection::CHOICES),
        default: ParamDefault::Str("mapped"),
        description,
    }
}

/// Index or reference sequences, whichever the call supplied
///
/// # Errors
///
/// Returns `ValidationError::ExclusiveInputs` if neither was given, or an
/// artifact error if the payload is missing.
pub fn reference_target(ctx: &ActionContext<'_>) -> Result<ReferenceTarget, ActionError> {
    if let Some(index) = ctx.optional_input(INDEX_DATABASE) {
        return Ok(ReferenceTarget::Index(index.payload(INDEX_FILE)?));
    }
    if let Some(reference) = ctx.optional_input(REFERENCE_READS) {
        return Ok(ReferenceTarget::Sequences(reference.payload(SEQUENCES_FILE)?));
    }
    Err(ValidationError::ExclusiveInputs(INDEX_DATABASE, REFERENCE_READS).into())
}

#[must_use]
pub fn scoring_options(ctx: &ActionContext<'_>) -> ScoringOptions {
    let params = ctx.params();
    ScoringOptions {
        matching_score: params.opt_int(MATCHING_SCORE.name),
        mismatching_penalty: params.opt_int(MISMATCHING_PENALTY.name),
        gap_open_penalty: params.opt_int(GAP_OPEN_PENALTY.name),
        gap_extension_penalty: params.opt_int(GAP_EXTENSION_PENALTY.name),
    }
}

/// Read files of a sample, forward first
#[must_use]
pub fn read_files(sample: &SampleFiles) -> Vec<PathBuf> {
    std::iter::once(sample.forward.clone())
        .chain(sample.reverse.clone())
        .collect()
}

/// Check that every read file carries quality scores
///
/// # Errors
///
/// Returns `FormatError::QualityRequired` for the first FASTA file found.
pub fn require_fastq(samples: &[SampleFiles]) -> Result<(), ActionError> {
    for sample in samples {
        for path in read_files(sample) {
            require_quality(&path)?;
        }
    }
    Ok(())
}
