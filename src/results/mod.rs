//! Post-processing of external tool output.
//!
//! Each submodule takes the raw rows a tool wrote and applies the secondary
//! filtering or aggregation needed before the rows become an artifact:
//!
//! - [`paf_filter`]: max-accepts and identity filters over search hits
//! - [`sam_filter`]: mapped/unmapped selection over alignments
//! - [`consensus`]: per-query consensus taxonomy over search hits
//! - [`resync`]: re-pairing mates after independent trimming
//! - [`report`]: wrapping a NanoPlot report as a visualization

pub mod consensus;
pub mod paf_filter;
pub mod report;
pub mod resync;
pub mod sam_filter;
