//! Weekly hiking quiz state: which track, and how much of it is revealed.

/// `week,track_name` ledger used to avoid repeating recent tracks.
pub mod history;
/// Week number, hint level, reveal stage and track rotation.
pub mod progression;
