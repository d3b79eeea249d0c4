//! Session-scoped preference learning
//!
//! A weighted-KNN learner over an append-only example buffer. Distances use
//! per-feature weights that adapt to accept/modify/reject signals; votes
//! decay with example age so recent feedback dominates. Everything lives
//! and dies with the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mapping::NodeSummary;
use crate::models::structure::{CadenceType, PeriodType};
use crate::models::visual::{EmotionFeatures, RecommendationSource, VisualScheme};

/// Dimensionality of the preference feature vector
pub const FEATURE_DIM: usize = 23;
/// Recency decay applied per minute of example age
const RECENCY_DECAY: f64 = 0.95;
/// Examples required before any recommendation is produced
const MIN_EXAMPLES: usize = 2;
/// Weight adjustment for positively rewarded selections
const WEIGHT_STEP_UP: f64 = 0.05;
/// Weight adjustment for rejected selections
const WEIGHT_STEP_DOWN: f64 = 0.03;
/// Feature weights stay inside this range
const WEIGHT_RANGE: (f64, f64) = (0.1, 2.0);

/// Slot layout of the feature vector
const TYPE_SLOTS: std::ops::Range<usize> = 0..6;
const CONFIDENCE_SLOT: usize = 6;
const DURATION_SLOT: usize = 7;
const MATERIAL_SLOTS: std::ops::Range<usize> = 8..10;
const CADENCE_SLOTS: std::ops::Range<usize> = 10..16;
const PERIOD_SLOTS: std::ops::Range<usize> = 16..20;
const TEMPO_SLOT: usize = 20;
const DYNAMICS_SLOT: usize = 21;
const TENSION_SLOT: usize = 22;

/// User feedback on a presented scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Accept,
    Modify,
    Reject,
}

impl UserAction {
    /// Reward signal fed into the learner
    pub fn reward(self) -> f64 {
        match self {
            UserAction::Accept => 1.0,
            UserAction::Modify => 0.5,
            UserAction::Reject => -1.0,
        }
    }
}

/// One recorded selection in the session buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceExample {
    /// Feature vector of the node the selection was made on
    pub features: [f64; FEATURE_DIM],
    /// The scheme the user acted on
    pub scheme: VisualScheme,
    /// Reward in {-1, 0.5, 1}
    pub reward: f64,
    /// When the selection was recorded
    pub timestamp: DateTime<Utc>,
}

/// Encode a node and its emotion features into the fixed feature vector
pub fn feature_vector(node: &NodeSummary, emotion: &EmotionFeatures) -> [f64; FEATURE_DIM] {
    let mut features = [0.0f64; FEATURE_DIM];
    features[node.node_type.ordinal()] = 1.0;
    features[CONFIDENCE_SLOT] = node.confidence;
    features[DURATION_SLOT] = (f64::from(node.duration_measures()) / 16.0).min(1.0);
    features[MATERIAL_SLOTS.start] = if node.has_prime() { 1.0 } else { 0.0 };
    features[MATERIAL_SLOTS.start + 1] =
        if node.period_type == Some(PeriodType::Compound) { 1.0 } else { 0.0 };
    let cadence_slot = CADENCE_SLOTS.start
        + match node.cadence {
            Some(CadenceType::PerfectAuthentic) => 0,
            Some(CadenceType::ImperfectAuthentic) => 1,
            Some(CadenceType::Half) => 2,
            Some(CadenceType::Deceptive) => 3,
            Some(CadenceType::Plagal) | Some(CadenceType::Phrygian) => 4,
            None => 5,
        };
    features[cadence_slot] = 1.0;
    let period_slot = PERIOD_SLOTS.start
        + match node.period_type {
            Some(PeriodType::Parallel) => 0,
            Some(PeriodType::Contrasting) => 1,
            Some(_) => 2,
            None => 3,
        };
    features[period_slot] = 1.0;
    features[TEMPO_SLOT] = emotion.tempo.numeric();
    features[DYNAMICS_SLOT] = emotion.dynamics.numeric();
    features[TENSION_SLOT] = emotion.tension.numeric();
    features
}

/// Weighted-KNN preference learner with recency decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceLearner {
    examples: Vec<PreferenceExample>,
    weights: [f64; FEATURE_DIM],
    accept_count: usize,
    modify_count: usize,
    reject_count: usize,
}

impl Default for PreferenceLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceLearner {
    /// A fresh learner with the initial weight profile
    pub fn new() -> Self {
        let mut weights = [0.0f64; FEATURE_DIM];
        for slot in TYPE_SLOTS {
            weights[slot] = 1.0;
        }
        weights[CONFIDENCE_SLOT] = 0.5;
        weights[DURATION_SLOT] = 0.8;
        for slot in MATERIAL_SLOTS {
            weights[slot] = 0.7;
        }
        for slot in CADENCE_SLOTS {
            weights[slot] = 0.9;
        }
        for slot in PERIOD_SLOTS {
            weights[slot] = 0.8;
        }
        weights[TEMPO_SLOT] = 0.6;
        weights[DYNAMICS_SLOT] = 0.6;
        weights[TENSION_SLOT] = 0.7;
        Self { examples: Vec::new(), weights, accept_count: 0, modify_count: 0, reject_count: 0 }
    }

    /// Current neighbourhood size, adapted to buffer growth
    pub fn k(&self) -> usize {
        if self.examples.len() > 20 {
            7
        } else if self.examples.len() > 10 {
            5
        } else {
            3
        }
    }

    /// Number of recorded examples
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    /// Counts of accept / modify / reject actions
    pub fn action_counts(&self) -> (usize, usize, usize) {
        (self.accept_count, self.modify_count, self.reject_count)
    }

    /// Record one user selection and adapt the feature weights
    pub fn record_selection(
        &mut self,
        features: [f64; FEATURE_DIM],
        scheme: VisualScheme,
        action: UserAction,
        now: DateTime<Utc>,
    ) {
        let reward = action.reward();
        match action {
            UserAction::Accept => self.accept_count += 1,
            UserAction::Modify => self.modify_count += 1,
            UserAction::Reject => self.reject_count += 1,
        }
        let adjust = if reward > 0.0 { WEIGHT_STEP_UP } else { -WEIGHT_STEP_DOWN };
        for slots in [TYPE_SLOTS, CADENCE_SLOTS, PERIOD_SLOTS] {
            for slot in slots {
                if features[slot] > 0.0 {
                    self.weights[slot] =
                        (self.weights[slot] + adjust).clamp(WEIGHT_RANGE.0, WEIGHT_RANGE.1);
                }
            }
        }
        self.examples.push(PreferenceExample { features, scheme, reward, timestamp: now });
    }

    /// Weighted distance between a query and an example
    fn distance(&self, query: &[f64; FEATURE_DIM], example: &[f64; FEATURE_DIM]) -> f64 {
        query
            .iter()
            .zip(example.iter())
            .zip(self.weights.iter())
            .map(|((q, e), w)| w * (q - e) * (q - e))
            .sum::<f64>()
            .sqrt()
    }

    /// Ranked scheme recommendations for a query vector
    ///
    /// Positively rewarded neighbours vote for their schemes; votes are
    /// summed per canonical scheme identity. With fewer than two examples
    /// the learner stays silent and the caller falls back on rules alone.
    pub fn recommendations(
        &self,
        query: &[f64; FEATURE_DIM],
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<VisualScheme> {
        if self.examples.len() < MIN_EXAMPLES {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &PreferenceExample)> = self
            .examples
            .iter()
            .filter(|example| example.reward > 0.0)
            .map(|example| {
                let distance = self.distance(query, &example.features);
                let age_minutes =
                    (now - example.timestamp).num_seconds().max(0) as f64 / 60.0;
                let recency = RECENCY_DECAY.powf(age_minutes);
                let combined = (1.0 / (distance + 0.1)) * example.reward * recency;
                (combined, example)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.k());

        // Group neighbour votes by canonical scheme identity
        let mut groups: BTreeMap<String, (VisualScheme, f64, usize)> = BTreeMap::new();
        for (combined, example) in scored {
            let key = example.scheme.canonical_key();
            let entry = groups
                .entry(key)
                .or_insert_with(|| (example.scheme.clone(), 0.0, 0));
            entry.1 += combined;
            entry.2 += 1;
        }
        let mut ranked: Vec<(VisualScheme, f64, usize)> = groups.into_values().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(count);

        ranked
            .into_iter()
            .map(|(mut scheme, score, matches)| {
                scheme.recommendation_source = RecommendationSource::PreferenceLearning;
                scheme.from_preference = Some(true);
                scheme.preference_score = Some(score);
                scheme.match_count = Some(matches);
                scheme
            })
            .collect()
    }

    /// Drop every example and counter, keeping the adapted weights
    pub fn clear(&mut self) {
        self.examples.clear();
        self.accept_count = 0;
        self.modify_count = 0;
        self.reject_count = 0;
    }
}
