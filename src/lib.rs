//! Music structure analysis engine
//!
//! Ingests a symbolic score (and optionally decoded audio features) and
//! produces a hierarchical structural analysis — motives, sub-phrases,
//! phrases, periods, sections, and an overall form label — plus per-node
//! visual-scheme recommendations that adapt to user feedback within a
//! session.
//!
//! The decoding of score and audio bytes lives outside this crate; the
//! engine starts from [`models::ParsedScore`] and [`models::AudioFeatures`]
//! and ends at [`analysis::FullAnalysis`] and the session's exported state.

pub mod alignment;
pub mod analysis;
pub mod error;
pub mod mapping;
pub mod models;
pub mod pitch;
pub mod session;
pub mod tree;

// Re-export commonly used types
pub use analysis::{analyze_complete, analyze_complete_chunked, FullAnalysis};
pub use error::{AnalysisError, ScoreError};
pub use mapping::preference::UserAction;
pub use models::{AudioFeatures, ParsedScore};
pub use session::Session;
pub use tree::{StructureTree, MODEL_VERSION};
