//! crates/study_companion_core/src/history/mod.rs
//!
//! Per-user history kept inside the user record: study plans, tutor sessions
//! and the companion thread. Each manager reads the whole mapping, edits the
//! current user's record and writes the whole mapping back.

pub mod companion;
pub mod plans;
pub mod tutor;

pub use companion::CompanionHistory;
pub use plans::PlanHistory;
pub use tutor::TutorHistory;

/// Conversations with fewer messages than this are not persisted.
pub const MIN_MESSAGES_TO_SAVE: usize = 2;
