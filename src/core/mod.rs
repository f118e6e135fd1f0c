//! Core data types shared by every action.
//!
//! - [`SequenceRecord`], [`SequenceCollection`]: reads and feature sequences
//! - [`PafRecord`], [`SamRecord`]: alignment rows produced by the aligner
//! - [`TaxonomyTable`], [`ConsensusAssignment`]: reference lineages and
//!   per-query consensus labels
//! - [`ArtifactType`], [`MappingPreset`], [`ReadSelection`]: enumerations
//!   used in action signatures
//!
//! [`SequenceRecord`]: sequence::SequenceRecord
//! [`SequenceCollection`]: sequence::SequenceCollection
//! [`PafRecord`]: alignment::PafRecord
//! [`SamRecord`]: alignment::SamRecord
//! [`TaxonomyTable`]: taxonomy::TaxonomyTable
//! [`ConsensusAssignment`]: taxonomy::ConsensusAssignment
//! [`ArtifactType`]: types::ArtifactType
//! [`MappingPreset`]: types::MappingPreset
//! [`ReadSelection`]: types::ReadSelection

pub mod alignment;
pub mod sequence;
pub mod taxonomy;
pub mod types;
