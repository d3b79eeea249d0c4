//! Persisted session state
//!
//! The JSON-friendly layout a session exports and re-imports. Node graphs
//! are flattened into an id-keyed map; import rebuilds them in two passes
//! (create all, then link parents and children by id).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mapping::preference::UserAction;
use crate::models::audio::AudioFeatures;
use crate::models::form::FormAnalysis;
use crate::models::score::ParsedScore;
use crate::models::structure::{Cadence, Period, Phrase};
use crate::models::visual::VisualScheme;
use crate::tree::SerializedNode;

/// Layout version of the persisted state
pub const STATE_VERSION: &str = "1.0.0";

/// One entry in the preference learning history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEvent {
    /// What the user did
    pub action: UserAction,
    /// Node the scheme was shown for
    pub node_id: String,
    /// The scheme acted upon
    pub scheme_id: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// Alignment slice of the persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentState {
    /// Measure number to audio timestamp
    pub measure_to_time: BTreeMap<u32, f64>,
    /// Alignment confidence in [0, 1]
    pub confidence: f64,
}

/// Session identity and inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Stable session id
    pub session_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// The score the session analysed
    pub parsed_score: ParsedScore,
    /// Audio features, when audio accompanied the score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_features: Option<AudioFeatures>,
    /// Score-to-audio alignment, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentState>,
}

/// Structural analysis slice of the persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureState {
    /// Root node id
    pub root: String,
    /// Every tree node keyed by id
    pub nodes: BTreeMap<String, SerializedNode>,
    /// Overall form
    pub form_analysis: FormAnalysis,
    /// Detected cadences
    pub cadences: Vec<Cadence>,
    /// Detected phrases
    pub phrases: Vec<Phrase>,
    /// Detected periods
    pub periods: Vec<Period>,
}

/// Preference slice of the persisted state
///
/// Only the audit trail is persisted; the example buffer itself is
/// session-scoped by design and never crosses sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceState {
    /// Total recorded selections
    pub example_count: usize,
    /// Accepted selections
    pub accept_count: usize,
    /// Modified selections
    pub modify_count: usize,
    /// Rejected selections
    pub reject_count: usize,
    /// Every selection in order
    #[serde(default)]
    pub learning_history: Vec<LearningEvent>,
}

/// Complete persisted session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Layout version
    pub version: String,
    /// Session identity and inputs
    pub session: SessionInfo,
    /// Structural analysis, when one was run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureState>,
    /// Accepted or modified schemes keyed by node id
    #[serde(default)]
    pub visual_mappings: BTreeMap<String, VisualScheme>,
    /// Preference audit trail
    #[serde(default)]
    pub preferences: PreferenceState,
}
