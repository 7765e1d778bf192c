//! Core data types for self-targeting spacer detection.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Span`], [`Strand`]: 0-based half-open coordinates and strands
//! - [`Contig`], [`Genome`]: the sequences a pipeline run works on
//! - [`Array`]: a CRISPR array with its [`Repeat`]s, [`Spacer`]s and [`ConsensusRepeat`]
//! - [`TargetHit`], [`MutationRecord`], [`OrientationCall`], [`LocusCall`]: per-hit results
//! - [`StsRecord`]: the persisted output unit
//!
//! ## Coordinates
//!
//! All spans are 0-based and half-open. They are shown 1-based inclusive
//! when displayed or exported to TSV:
//!
//! | Internal | Displayed |
//! |----------|-----------|
//! | `Span { start: 0, end: 10 }` | `1-10` |
//! | `Span { start: 99, end: 130 }` | `100-130` |
//!
//! ## Ownership
//!
//! An [`Array`] owns its repeats and spacers. A [`TargetHit`] refers back to
//! its spacer through a [`SpacerRef`] (array id + spacer number) rather than
//! holding the spacer itself.

pub mod array;
pub mod contig;
pub mod record;
pub mod types;

pub use array::{Array, ArrayError, ArrayId, ConsensusRepeat, ConsensusStatus, Repeat, Spacer, SpacerRef};
pub use contig::{Contig, Genome};
pub use record::{
    CasGeneHit, Completeness, Edit, EditType, FlankPair, LocusCall, MutationRecord, Orientation,
    OrientationCall, OrientationEvidence, RepeatComparison, RepeatDrift, StsRecord, Subtype,
    TargetContext, TargetHit,
};
pub use types::{Span, Strand};
