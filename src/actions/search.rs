//! `search`: align query sequences and keep the best hits per query.

use tracing::debug;

use crate::actions::common::{
    at_least, n_threads, reference_target, FRACTION, INDEX_DATABASE_INPUT, REFERENCE_CHOICE,
    REFERENCE_READS_INPUT,
};
use crate::actions::schema::{
    ActionSignature, InputSpec, OutputSpec, OutputType, ParamDefault, ParamKind, ParamSpec,
};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::{ALIGNMENTS_FILE, SEQUENCES_FILE};
use crate::core::alignment::PafRecord;
use crate::core::types::ArtifactType;
use crate::formats::paf::{read_paf, write_paf};
use crate::formats::{sniff_sequence_file, ParseError, SequenceFileKind};
use crate::results::paf_filter::{filter_search_results, SearchFilter};
use crate::tools::minimap2;

pub static SIGNATURE: ActionSignature = ActionSignature {
    name: "search",
    description: "Search query sequences against a reference with minimap2",
    inputs: &[
        InputSpec {
            name: "query_reads",
            types: &[ArtifactType::FeatureSequences],
            required: true,
            description: "Query sequences",
        },
        INDEX_DATABASE_INPUT,
        REFERENCE_READS_INPUT,
    ],
    parameters: &[
        n_threads(3),
        ParamSpec {
            name: "maxaccepts",
            kind: at_least(1),
            default: ParamDefault::Int(1),
            description: "Maximum number of hits to keep per query",
        },
        ParamSpec {
            name: "perc_identity",
            kind: FRACTION,
            default: ParamDefault::None,
            description: "Reject hits whose identity is below this fraction",
        },
        ParamSpec {
            name: "output_no_hits",
            kind: ParamKind::Bool,
            default: ParamDefault::Bool(true),
            description: "Report queries without any hit",
        },
    ],
    outputs: &[OutputSpec {
        name: "search_results",
        output_type: OutputType::Fixed(ArtifactType::PairwiseAlignments),
        description: "Hits in PAF format",
    }],
    exclusive_inputs: REFERENCE_CHOICE,
};

/// Settings of one minimap2 search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub n_threads: i64,
    pub filter: SearchFilter,
    pub output_no_hits: bool,
}

/// Run minimap2 against the call's reference and filter its hits.
///
/// # Errors
///
/// Returns a tool error if minimap2 fails, or a `ParseError` if its output
/// is missing, malformed, or empty although no-hit rows were requested
/// for a non-empty query.
pub fn search_hits(
    ctx: &ActionContext<'_>,
    query_input: &str,
    settings: &SearchSettings,
) -> Result<Vec<PafRecord>, ActionError> {
    let query = ctx.input(query_input)?.payload(SEQUENCES_FILE)?;
    let target = reference_target(ctx)?;

    let paf = ctx.scratch().join("search.paf");
    ctx.runner().run(&minimap2::search(
        &target,
        &query,
        settings.n_threads,
        &paf,
        settings.output_no_hits,
    ))?;

    let records = read_paf(&paf)?;
    if records.is_empty()
        && settings.output_no_hits
        && sniff_sequence_file(&query)? != SequenceFileKind::Empty
    {
        return Err(ParseError::EmptyOutput("minimap2".to_string()).into());
    }

    let total = records.len();
    let records = filter_search_results(records, &settings.filter);
    debug!("Kept {} of {} hits", records.len(), total);
    Ok(records)
}

/// # Errors
///
/// See [`search_hits`].
pub fn run(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let params = ctx.params();
    let settings = SearchSettings {
        n_threads: params.int("n_threads")?,
        filter: SearchFilter {
            max_accepts: usize::try_from(params.int("maxaccepts")?).unwrap_or(usize::MAX),
            perc_identity: params.opt_float("perc_identity"),
        },
        output_no_hits: params.flag("output_no_hits")?,
    };

    let records = search_hits(ctx, "query_reads", &settings)?;
    let staged = ctx.stage("search_results", ArtifactType::PairwiseAlignments)?;
    write_paf(&staged.file(ALIGNMENTS_FILE), &records)?;
    Ok(ActionOutputs::from([("search_results", staged)]))
}
