//! `build-index`: minimap2 index from reference sequences.

use tracing::debug;

use crate::actions::common::MAPPING_PRESET;
use crate::actions::schema::{
    ActionSignature, InputSpec, OutputSpec, OutputType, ParamDefault, ParamKind, ParamSpec,
};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::{INDEX_FILE, SEQUENCES_FILE};
use crate::core::types::{ArtifactType, MappingPreset};
use crate::formats::ParseError;
use crate::tools::minimap2;

pub static SIGNATURE: ActionSignature = ActionSignature {
    name: "build-index",
    description: "Build a minimap2 index database from reference sequences",
    inputs: &[InputSpec {
        name: "sequences",
        types: &[ArtifactType::FeatureSequences],
        required: true,
        description: "Reference sequences to index",
    }],
    parameters: &[
        MAPPING_PRESET,
        ParamSpec {
            name: "kmer_length",
            kind: ParamKind::Int {
                min: Some(1),
                max: Some(28),
            },
            default: ParamDefault::Int(15),
            description: "Minimizer k-mer length",
        },
    ],
    outputs: &[OutputSpec {
        name: "index_database",
        output_type: OutputType::Fixed(ArtifactType::Minimap2Index),
        description: "minimap2 index database",
    }],
    exclusive_inputs: &[],
};

/// # Errors
///
/// Returns a tool error if minimap2 fails, or `ParseError::MissingOutput`
/// if it exits cleanly without writing the index.
pub fn run(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let reference = ctx.input("sequences")?.payload(SEQUENCES_FILE)?;
    let preset: MappingPreset = ctx.params().choice("mapping_preset")?;
    let kmer_length = ctx.params().int("kmer_length")?;

    let staged = ctx.stage("index_database", ArtifactType::Minimap2Index)?;
    let index = staged.file(INDEX_FILE);
    ctx.runner()
        .run(&minimap2::build_index(preset, kmer_length, &reference, &index))?;

    if !index.is_file() {
        return Err(ParseError::MissingOutput(INDEX_FILE.to_string()).into());
    }
    debug!("Index written: {} bytes", std::fs::metadata(&index)?.len());

    Ok(ActionOutputs::from([("index_database", staged)]))
}
