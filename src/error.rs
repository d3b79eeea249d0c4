//! Error types for the analysis engine
//!
//! Defines the error hierarchy for the library surface, with structural
//! precondition failures (ScoreError) and session state errors. Pure
//! detectors never return errors; they emit empty results instead.

use thiserror::Error;

/// Top-level error type for the analysis engine
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The parsed score violates a structural invariant
    #[error("invalid score: {0}")]
    InvalidScore(#[from] ScoreError),

    /// A persisted session state could not be rebuilt
    #[error("state import failed: {0}")]
    Import(String),

    /// JSON serialization or deserialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A chunk slice handed to a leaf detector was malformed
    #[error("chunk covering measures {start}..={end} failed: {reason}")]
    ChunkFailure {
        /// First measure of the failed chunk
        start: u32,
        /// Last measure of the failed chunk
        end: u32,
        /// Human-readable cause
        reason: String,
    },
}

/// Structural invariant violations in a [`crate::models::ParsedScore`]
#[derive(Debug, Clone, Error)]
pub enum ScoreError {
    /// A note references a measure number absent from the measure list
    #[error("note {index} references measure {measure}, which is not in the score")]
    NoteOutsideMeasures {
        /// Index of the offending note in the note list
        index: usize,
        /// The missing measure number
        measure: u32,
    },

    /// Notes are not sorted by (measure, beat, voice)
    #[error("notes are not sorted by (measure, beat, voice) at index {index}")]
    UnsortedNotes {
        /// Index of the first out-of-order note
        index: usize,
    },

    /// Measure numbers are not contiguous starting at 1
    #[error("measures are not contiguous: expected {expected}, found {found}")]
    NonContiguousMeasures {
        /// The measure number that should have appeared
        expected: u32,
        /// The measure number that actually appeared
        found: u32,
    },

    /// Key signature fifths outside [-7, 7]
    #[error("key signature fifths {fifths} outside the supported range -7..=7")]
    KeyOutOfRange {
        /// The offending fifths value
        fifths: i8,
    },

    /// Time signature with zero beats per measure
    #[error("time signature must have at least 1 beat per measure, got {beats}")]
    BadTimeSignature {
        /// The offending beat count
        beats: u32,
    },
}
