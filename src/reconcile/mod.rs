//! Match result reconciliation.
//!
//! Persisted rows go through [`draft::build_draft`], the resulting draft is
//! edited inside a [`session::EditSession`], [`planner::plan`] diffs it into
//! store operations and [`pipeline::execute`] issues them in order.

pub mod draft;
pub mod pipeline;
pub mod planner;
pub mod session;

pub use draft::{build_draft, LineupSlot, MapDraft, MatchDraft, StatLine, Tracked, MAX_LINEUP_PER_SIDE};
pub use pipeline::{execute, PipelineError, PipelineStep, SubmissionOutcome};
pub use planner::{
    check_ownership, keeps_stat, map_winner, plan, score_preview, ReconcilePlan, RosterSizes, StoredMaps,
    ValidationError, ZERO_ROW_ROSTER_THRESHOLD,
};
pub use session::{EditSession, SessionError, SessionState};
