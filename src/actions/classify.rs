//! `classify-consensus` and `find-consensus-annotation`: consensus
//! taxonomy over minimap2 search hits.

use tracing::info;

use crate::actions::common::{
    at_least, n_threads, FRACTION, INDEX_DATABASE_INPUT, REFERENCE_CHOICE, REFERENCE_READS_INPUT,
};
use crate::actions::schema::{
    ActionSignature, Bound, InputSpec, OutputSpec, OutputType, ParamDefault, ParamKind, ParamSpec,
};
use crate::actions::search::{search_hits, SearchSettings};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::{ALIGNMENTS_FILE, TAXONOMY_FILE};
use crate::core::alignment::PafRecord;
use crate::core::taxonomy::TaxonomyTable;
use crate::core::types::ArtifactType;
use crate::formats::paf::{read_paf, write_paf};
use crate::formats::taxonomy::{read_taxonomy, write_taxonomy};
use crate::results::consensus::{
    find_consensus, ConsensusParams, DEFAULT_MIN_CONSENSUS, DEFAULT_UNASSIGNABLE_LABEL,
};
use crate::results::paf_filter::SearchFilter;

/// Column holding the consensus fraction in classification output
pub const CONSENSUS_COLUMN: &str = "Consensus";

const REFERENCE_TAXONOMY: InputSpec = InputSpec {
    name: "reference_taxonomy",
    types: &[ArtifactType::FeatureTaxonomy],
    required: true,
    description: "Lineages of the reference sequences",
};

const MIN_CONSENSUS: ParamSpec = ParamSpec {
    name: "min_consensus",
    kind: ParamKind::Float {
        min: Some(Bound::Exclusive(0.5)),
        max: Some(Bound::Inclusive(1.0)),
    },
    default: ParamDefault::Float(DEFAULT_MIN_CONSENSUS),
    description: "Fraction of hits that must agree on a rank",
};

const UNASSIGNABLE_LABEL: ParamSpec = ParamSpec {
    name: "unassignable_label",
    kind: ParamKind::Str,
    default: ParamDefault::Str(DEFAULT_UNASSIGNABLE_LABEL),
    description: "Label for queries without a consensus",
};

pub static CLASSIFY_SIGNATURE: ActionSignature = ActionSignature {
    name: "classify-consensus",
    description: "Assign taxonomy to query sequences by consensus of minimap2 hits",
    inputs: &[
        InputSpec {
            name: "query",
            types: &[ArtifactType::FeatureSequences],
            required: true,
            description: "Query sequences",
        },
        REFERENCE_TAXONOMY,
        INDEX_DATABASE_INPUT,
        REFERENCE_READS_INPUT,
    ],
    parameters: &[
        ParamSpec {
            name: "maxaccepts",
            kind: at_least(1),
            default: ParamDefault::Int(10),
            description: "Maximum number of hits to keep per query",
        },
        ParamSpec {
            name: "perc_identity",
            kind: FRACTION,
            default: ParamDefault::Float(0.8),
            description: "Reject hits whose identity is below this fraction",
        },
        ParamSpec {
            name: "output_no_hits",
            kind: ParamKind::Bool,
            default: ParamDefault::Bool(true),
            description: "Report queries without any hit",
        },
        MIN_CONSENSUS,
        UNASSIGNABLE_LABEL,
        n_threads(3),
    ],
    outputs: &[
        OutputSpec {
            name: "search_results",
            output_type: OutputType::Fixed(ArtifactType::PairwiseAlignments),
            description: "Hits used for the consensus",
        },
        OutputSpec {
            name: "classification",
            output_type: OutputType::Fixed(ArtifactType::FeatureTaxonomy),
            description: "Consensus taxonomy per query",
        },
    ],
    exclusive_inputs: REFERENCE_CHOICE,
};

pub static CONSENSUS_SIGNATURE: ActionSignature = ActionSignature {
    name: "find-consensus-annotation",
    description: "Consensus taxonomy from existing search results",
    inputs: &[
        InputSpec {
            name: "search_results",
            types: &[ArtifactType::PairwiseAlignments],
            required: true,
            description: "minimap2 search results",
        },
        REFERENCE_TAXONOMY,
    ],
    parameters: &[MIN_CONSENSUS, UNASSIGNABLE_LABEL],
    outputs: &[OutputSpec {
        name: "consensus_taxonomy",
        output_type: OutputType::Fixed(ArtifactType::FeatureTaxonomy),
        description: "Consensus taxonomy per query",
    }],
    exclusive_inputs: &[],
};

fn consensus_params(ctx: &ActionContext<'_>) -> Result<ConsensusParams, ActionError> {
    Ok(ConsensusParams {
        min_consensus: ctx.params().float(MIN_CONSENSUS.name)?,
        unassignable_label: ctx.params().string(UNASSIGNABLE_LABEL.name)?.to_string(),
    })
}

/// Consensus table for `records` against the call's reference taxonomy
fn consensus_table(
    ctx: &ActionContext<'_>,
    records: &[PafRecord],
) -> Result<TaxonomyTable, ActionError> {
    let taxonomy = read_taxonomy(&ctx.input(REFERENCE_TAXONOMY.name)?.payload(TAXONOMY_FILE)?)?;
    let params = consensus_params(ctx)?;
    let assignments = find_consensus(records, &taxonomy, &params)?;

    let unassigned = assignments
        .iter()
        .filter(|a| a.taxon == params.unassignable_label)
        .count();
    info!(
        "Classified {} queries ({} unassigned)",
        assignments.len(),
        unassigned
    );
    Ok(assignments.into_iter().map(|a| a.into_entry()).collect())
}

/// # Errors
///
/// Returns the search errors of [`search_hits`], or
/// `ParseError::UnknownReferenceIds` if hits name targets missing from the
/// reference taxonomy.
pub fn run_classify(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let params = ctx.params();
    let settings = SearchSettings {
        n_threads: params.int("n_threads")?,
        filter: SearchFilter {
            max_accepts: usize::try_from(params.int("maxaccepts")?).unwrap_or(usize::MAX),
            perc_identity: params.opt_float("perc_identity"),
        },
        output_no_hits: params.flag("output_no_hits")?,
    };

    let records = search_hits(ctx, "query", &settings)?;
    let table = consensus_table(ctx, &records)?;

    let search_results = ctx.stage("search_results", ArtifactType::PairwiseAlignments)?;
    write_paf(&search_results.file(ALIGNMENTS_FILE), &records)?;
    let classification = ctx.stage("classification", ArtifactType::FeatureTaxonomy)?;
    write_taxonomy(
        &classification.file(TAXONOMY_FILE),
        &table,
        Some(CONSENSUS_COLUMN),
    )?;

    Ok(ActionOutputs::from([
        ("search_results", search_results),
        ("classification", classification),
    ]))
}

/// # Errors
///
/// Returns a `ParseError` if the search results cannot be read or name
/// targets missing from the reference taxonomy.
pub fn run_find_consensus(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let records = read_paf(&ctx.input("search_results")?.payload(ALIGNMENTS_FILE)?)?;
    let table = consensus_table(ctx, &records)?;

    let staged = ctx.stage("consensus_taxonomy", ArtifactType::FeatureTaxonomy)?;
    write_taxonomy(&staged.file(TAXONOMY_FILE), &table, Some(CONSENSUS_COLUMN))?;
    Ok(ActionOutputs::from([("consensus_taxonomy", staged)]))
}
