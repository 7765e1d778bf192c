//! Self-target detection and annotation.
//!
//! Similarity hits of valid spacers are first filtered down to genuine
//! self-targets by [`match_targets`]: anything overlapping an array (widened
//! by the pad distance) is the spacer finding itself. Each surviving hit is
//! then annotated by [`annotate_hit`]:
//!
//! | Field | Content |
//! |-------|---------|
//! | edits | guide vs. target, one column per guide base (semi-global re-alignment) |
//! | repeat drift | repeats on either side of the spacer vs. the consensus |
//! | flanks | `flank_width` bases either side of the target, crRNA orientation |
//! | context | annotated gene containing or surrounding the target |

pub mod align;
pub mod context;
pub mod matcher;
pub mod mutation;

pub use align::{align_guide, AlignOp, Alignment};
pub use context::target_context;
pub use matcher::{match_targets, Footprint};
pub use mutation::{annotate_hit, repeat_drift, HitAnnotation};
