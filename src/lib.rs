//! # longread-qc
//!
//! Quality control and taxonomic classification of long-read sequencing data.
//!
//! Reads, references, search results and taxonomies are stored as
//! *artifacts*: directories holding a typed payload and a `metadata.json`
//! with checksums and provenance. Actions take artifacts in and write new
//! artifacts out, wrapping minimap2, samtools, chopper and NanoPlot:
//!
//! - **build-index**: minimap2 index of reference sequences
//! - **search**: PAF hits of query sequences against a reference
//! - **filter-reads** / **extract-reads**: keep reads that do or do not align
//! - **classify-consensus** / **find-consensus-annotation**: consensus
//!   taxonomy from the hits of each query
//! - **trim**: quality and length trimming with chopper
//! - **stats**: NanoPlot read report as an HTML visualization
//!
//! Every call is validated against the action's signature before any tool
//! runs, and outputs are only written once every step succeeded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use longread_qc::{ActionCall, ActionRegistry};
//!
//! let registry = ActionRegistry::new();
//! let call = ActionCall::new("find-consensus-annotation")
//!     .input("search_results", "hits.qza")
//!     .input("reference_taxonomy", "taxonomy.qza")
//!     .param("min_consensus", 0.6)
//!     .output("consensus_taxonomy", "consensus.qza");
//!
//! let outputs = registry.dispatch(&call).unwrap();
//! for (name, artifact) in &outputs {
//!     println!("{name}: {}", artifact.path().display());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`actions`]: Action signatures, validation and dispatch
//! - [`artifact`]: Artifact storage, import and export
//! - [`core`]: Sequence, alignment and taxonomy types
//! - [`formats`]: FASTA, FASTQ, PAF, SAM and taxonomy TSV readers and writers
//! - [`results`]: Post-processing of tool output
//! - [`tools`]: External tool command lines and the process runner
//! - [`cli`]: Command-line interface implementation

pub mod actions;
pub mod artifact;
pub mod cli;
pub mod core;
pub mod formats;
pub mod results;
pub mod tools;
pub mod utils;

// Re-export commonly used types for convenience
pub use actions::{ActionCall, ActionError, ActionRegistry, ValidationError};
pub use artifact::{Artifact, ArtifactError};
pub use core::types::*;
pub use tools::{Tool, ToolRunner};
