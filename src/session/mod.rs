//! Analysis session
//!
//! Owns the score, the structural analysis, the alignment, and the
//! preference-learning recommender for one editing session. Exposes the
//! editing operations, the recommendation flow, and JSON export/import of
//! the whole state per the persisted layout.

pub mod state;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::alignment::{align_score, AlignmentResult};
use crate::analysis::{analyze_complete, FullAnalysis};
use crate::error::AnalysisError;
use crate::mapping::preference::UserAction;
use crate::mapping::recommend::{SchemeRecommender, DEFAULT_SCHEME_COUNT};
use crate::mapping::NodeSummary;
use crate::models::audio::AudioFeatures;
use crate::models::score::ParsedScore;
use crate::models::visual::VisualScheme;
use crate::tree::{edit, SerializedTree, StructureTree, StructureType};

use self::state::{
    AlignmentState, LearningEvent, PreferenceState, SessionInfo, SessionState, StructureState,
    STATE_VERSION,
};

/// Default PRNG seed for a fresh session's recommender
const DEFAULT_SEED: u64 = 0x5EED_0001;

/// One user session over a score
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    score: ParsedScore,
    audio: Option<AudioFeatures>,
    analysis: Option<FullAnalysis>,
    alignment: Option<AlignmentResult>,
    visual_mappings: BTreeMap<String, VisualScheme>,
    recommender: SchemeRecommender,
    history: Vec<LearningEvent>,
}

impl Session {
    /// Open a session over a validated score
    pub fn new(score: ParsedScore) -> Result<Self, AnalysisError> {
        Self::with_seed(score, DEFAULT_SEED)
    }

    /// Open a session with an explicit recommender seed
    pub fn with_seed(score: ParsedScore, seed: u64) -> Result<Self, AnalysisError> {
        score.validate()?;
        let created_at = Utc::now();
        Ok(Self {
            id: format!("session-{}", created_at.timestamp_millis()),
            created_at,
            score,
            audio: None,
            analysis: None,
            alignment: None,
            visual_mappings: BTreeMap::new(),
            recommender: SchemeRecommender::new(seed),
            history: Vec::new(),
        })
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The analysed score
    pub fn score(&self) -> &ParsedScore {
        &self.score
    }

    /// The analysis, when one was run or imported
    pub fn analysis(&self) -> Option<&FullAnalysis> {
        self.analysis.as_ref()
    }

    /// The alignment, when one was computed or imported
    pub fn alignment(&self) -> Option<&AlignmentResult> {
        self.alignment.as_ref()
    }

    /// Schemes the user accepted or modified, keyed by node id
    pub fn visual_mappings(&self) -> &BTreeMap<String, VisualScheme> {
        &self.visual_mappings
    }

    /// Attach decoded audio features
    pub fn attach_audio(&mut self, audio: AudioFeatures) {
        self.audio = Some(audio);
    }

    /// Run the full structural analysis
    pub fn analyze(&mut self) -> Result<&FullAnalysis, AnalysisError> {
        let analysis = analyze_complete(&self.score)?;
        Ok(self.analysis.insert(analysis))
    }

    /// Align the score against the attached audio's chroma frames
    ///
    /// Without audio, or with empty chroma, the degenerate alignment is
    /// stored so `time_for_measure` keeps its 0-by-convention behaviour.
    pub fn align(&mut self) -> &AlignmentResult {
        let alignment = match &self.audio {
            Some(audio) => align_score(&self.score, &audio.chroma, &audio.timestamps),
            None => AlignmentResult::degenerate(),
        };
        self.alignment.insert(alignment)
    }

    /// Manually pin a measure to a timestamp
    pub fn adjust_alignment(&mut self, measure: u32, time: f64) {
        if let Some(alignment) = &mut self.alignment {
            alignment.adjust(measure, time);
        }
    }

    fn tree(&self) -> Option<&StructureTree> {
        self.analysis.as_ref().map(|a| &a.tree)
    }

    fn tree_mut(&mut self) -> Option<&mut StructureTree> {
        self.analysis.as_mut().map(|a| &mut a.tree)
    }

    /// Recommendations for a node at an explicit time (tests pin the clock)
    pub fn recommend_at(
        &mut self,
        node_id: &str,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<VisualScheme> {
        let audio_summary = self.audio.as_ref().and_then(AudioFeatures::summary);
        let Some(tree) = self.tree() else {
            return Vec::new();
        };
        let Some(id) = tree.find(node_id) else {
            return Vec::new();
        };
        let Some(node) = tree.get(id) else {
            return Vec::new();
        };
        let emotion = crate::mapping::emotion::extract_emotion(node, audio_summary.as_ref());
        let summary = NodeSummary::from_node(node);
        let related = tree.sibling_materials(id);
        self.recommender.recommend(&summary, &emotion, &related, count, now)
    }

    /// Recommendations for a node, 3 to 5 ranked schemes
    pub fn recommend(&mut self, node_id: &str, count: usize) -> Vec<VisualScheme> {
        self.recommend_at(node_id, count, Utc::now())
    }

    /// Recommendations with the default suggestion count
    pub fn recommend_default(&mut self, node_id: &str) -> Vec<VisualScheme> {
        self.recommend(node_id, DEFAULT_SCHEME_COUNT)
    }

    /// Record a user action on a scheme at an explicit time
    pub fn record_action_at(
        &mut self,
        node_id: &str,
        scheme: VisualScheme,
        action: UserAction,
        now: DateTime<Utc>,
    ) {
        let audio_summary = self.audio.as_ref().and_then(AudioFeatures::summary);
        let Some(tree) = self.tree() else {
            return;
        };
        let Some(node) = tree.find(node_id).and_then(|id| tree.get(id)) else {
            return;
        };
        let emotion = crate::mapping::emotion::extract_emotion(node, audio_summary.as_ref());
        let summary = NodeSummary::from_node(node);
        self.history.push(LearningEvent {
            action,
            node_id: node_id.to_string(),
            scheme_id: scheme.id.clone(),
            timestamp: now,
        });
        match action {
            UserAction::Accept | UserAction::Modify => {
                self.visual_mappings.insert(node_id.to_string(), scheme.clone());
            }
            UserAction::Reject => {
                self.visual_mappings.remove(node_id);
            }
        }
        self.recommender.record(&summary, &emotion, scheme, action, now);
    }

    /// Record a user action on a scheme
    pub fn record_action(&mut self, node_id: &str, scheme: VisualScheme, action: UserAction) {
        self.record_action_at(node_id, scheme, action, Utc::now());
    }

    /// Move a node's boundaries; decrements its confidence
    pub fn update_boundaries(&mut self, node_id: &str, start: u32, end: u32) -> bool {
        let Some(id) = self.tree().and_then(|t| t.find(node_id)) else {
            return false;
        };
        self.tree_mut().map_or(false, |tree| edit::update_boundaries(tree, id, start, end))
    }

    /// Change a node's type; decrements its confidence
    pub fn update_type(&mut self, node_id: &str, node_type: StructureType) -> bool {
        let Some(id) = self.tree().and_then(|t| t.find(node_id)) else {
            return false;
        };
        self.tree_mut().map_or(false, |tree| edit::update_type(tree, id, node_type))
    }

    /// Change a node's material; decrements its confidence
    pub fn update_material(&mut self, node_id: &str, material: &str) -> bool {
        let Some(id) = self.tree().and_then(|t| t.find(node_id)) else {
            return false;
        };
        self.tree_mut().map_or(false, |tree| edit::update_material(tree, id, material))
    }

    /// Preference audit trail
    pub fn learning_history(&self) -> &[LearningEvent] {
        &self.history
    }

    /// Forget the analysis, mappings, and learned preferences
    pub fn reset(&mut self) {
        self.analysis = None;
        self.alignment = None;
        self.visual_mappings.clear();
        self.history.clear();
        self.recommender.reset();
    }

    /// Snapshot the whole session into the persisted layout
    pub fn export_state(&self) -> SessionState {
        let alignment = self.alignment.as_ref().map(|a| AlignmentState {
            measure_to_time: a.measure_to_time.clone(),
            confidence: a.confidence,
        });
        let structure = self.analysis.as_ref().map(|analysis| {
            let serialized = analysis.tree.to_serialized();
            StructureState {
                root: serialized.root,
                nodes: serialized.nodes,
                form_analysis: analysis.form.clone(),
                cadences: analysis.cadences.clone(),
                phrases: analysis.phrases.clone(),
                periods: analysis.periods.clone(),
            }
        });
        let accept_count =
            self.history.iter().filter(|e| e.action == UserAction::Accept).count();
        let modify_count =
            self.history.iter().filter(|e| e.action == UserAction::Modify).count();
        let reject_count =
            self.history.iter().filter(|e| e.action == UserAction::Reject).count();
        SessionState {
            version: STATE_VERSION.to_string(),
            session: SessionInfo {
                session_id: self.id.clone(),
                created_at: self.created_at,
                parsed_score: self.score.clone(),
                audio_features: self.audio.clone(),
                alignment,
            },
            structure,
            visual_mappings: self.visual_mappings.clone(),
            preferences: PreferenceState {
                example_count: self.history.len(),
                accept_count,
                modify_count,
                reject_count,
                learning_history: self.history.clone(),
            },
        }
    }

    /// Export the session as pretty-printed JSON
    pub fn export_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(&self.export_state())?)
    }

    /// Rebuild a session from a persisted state
    ///
    /// The structure (tree included, with any user edits) is restored from
    /// the state; purely derived outputs (motives, sub-phrases, statistics)
    /// are recomputed from the score. The preference example buffer is
    /// session-scoped and comes back empty; only the audit trail survives.
    pub fn import_state(state: SessionState) -> Result<Self, AnalysisError> {
        let mut session = Self::new(state.session.parsed_score.clone())?;
        session.id = state.session.session_id.clone();
        session.created_at = state.session.created_at;
        session.audio = state.session.audio_features.clone();
        session.alignment = state.session.alignment.as_ref().map(|a| {
            AlignmentResult::from_measure_map(a.measure_to_time.clone(), a.confidence)
        });
        session.visual_mappings = state.visual_mappings.clone();
        session.history = state.preferences.learning_history.clone();

        if let Some(structure) = &state.structure {
            let mut analysis = analyze_complete(&session.score)?;
            let serialized = SerializedTree {
                root: structure.root.clone(),
                nodes: structure.nodes.clone(),
            };
            analysis.tree = StructureTree::from_serialized(&serialized)
                .map_err(AnalysisError::Import)?;
            analysis.form = structure.form_analysis.clone();
            analysis.cadences = structure.cadences.clone();
            analysis.phrases = structure.phrases.clone();
            analysis.periods = structure.periods.clone();
            analysis.tooltips = analysis.tree.tooltip_map();
            session.analysis = Some(analysis);
        }
        Ok(session)
    }

    /// Rebuild a session from exported JSON
    pub fn import_json(json: &str) -> Result<Self, AnalysisError> {
        let state: SessionState = serde_json::from_str(json)?;
        Self::import_state(state)
    }

    /// Look up the deepest node covering a measure
    pub fn node_at_measure(&self, measure: u32) -> Option<&str> {
        let tree = self.tree()?;
        let id = tree.node_at_measure(measure)?;
        tree.get(id).map(|n| n.id.as_str())
    }
}
