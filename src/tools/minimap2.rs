//! minimap2 command lines: index building, PAF search and SAM alignment.

use std::path::{Path, PathBuf};

use crate::core::types::MappingPreset;
use crate::tools::{Tool, ToolInvocation};

/// What minimap2 aligns against: a prebuilt index or raw reference FASTA
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    Index(PathBuf),
    Sequences(PathBuf),
}

impl ReferenceTarget {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Index(path) | Self::Sequences(path) => path,
        }
    }
}

/// Optional alignment scoring overrides (`-A`, `-B`, `-O`, `-E`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringOptions {
    pub matching_score: Option<i64>,
    pub mismatching_penalty: Option<i64>,
    pub gap_open_penalty: Option<i64>,
    pub gap_extension_penalty: Option<i64>,
}

/// `minimap2 -x <preset> -d <index> <reference> -k <k>`
#[must_use]
pub fn build_index(
    preset: MappingPreset,
    kmer_length: i64,
    reference: &Path,
    index: &Path,
) -> ToolInvocation {
    ToolInvocation::new(Tool::Minimap2)
        .option("-x", preset)
        .arg("-d")
        .arg(index)
        .arg(reference)
        .option("-k", kmer_length)
}

/// `minimap2 -c <target> <query> -t <n> -o <paf> [--paf-no-hit]`
#[must_use]
pub fn search(
    target: &ReferenceTarget,
    query: &Path,
    n_threads: i64,
    output: &Path,
    output_no_hits: bool,
) -> ToolInvocation {
    ToolInvocation::new(Tool::Minimap2)
        .arg("-c")
        .arg(target.path())
        .arg(query)
        .option("-t", n_threads)
        .arg("-o")
        .arg(output)
        .flag_if("--paf-no-hit", output_no_hits)
}

/// `minimap2 -a -x <preset> <target> -t <n> -o <sam> [-A m] [-B x] [-O o] [-E e] <reads...>`
#[must_use]
pub fn align(
    preset: MappingPreset,
    target: &ReferenceTarget,
    reads: &[PathBuf],
    n_threads: i64,
    scoring: &ScoringOptions,
    output: &Path,
) -> ToolInvocation {
    ToolInvocation::new(Tool::Minimap2)
        .arg("-a")
        .option("-x", preset)
        .arg(target.path())
        .option("-t", n_threads)
        .arg("-o")
        .arg(output)
        .option_if_some("-A", scoring.matching_score)
        .option_if_some("-B", scoring.mismatching_penalty)
        .option_if_some("-O", scoring.gap_open_penalty)
        .option_if_some("-E", scoring.gap_extension_penalty)
        .args(reads)
}
