//! Combined scheme recommender
//!
//! Learned suggestions first, rule-based generation to fill the remainder,
//! deduplicated on canonical scheme identity. The PRNG driving the
//! generator is owned here and seeded by the session so runs reproduce.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeSet;

use crate::mapping::preference::{feature_vector, PreferenceLearner, UserAction};
use crate::mapping::scheme::generate_schemes;
use crate::mapping::NodeSummary;
use crate::models::visual::{EmotionFeatures, VisualScheme};

/// Default number of suggestions per node
pub const DEFAULT_SCHEME_COUNT: usize = 5;

/// Session-scoped recommender blending rules and learned preferences
#[derive(Debug)]
pub struct SchemeRecommender {
    learner: PreferenceLearner,
    rng: Pcg64Mcg,
    seed: u64,
}

impl SchemeRecommender {
    /// Create a recommender with a deterministic PRNG seed
    pub fn new(seed: u64) -> Self {
        Self { learner: PreferenceLearner::new(), rng: Pcg64Mcg::seed_from_u64(seed), seed }
    }

    /// Borrow the underlying learner
    pub fn learner(&self) -> &PreferenceLearner {
        &self.learner
    }

    /// Ranked schemes for a node: learned first, rules fill the rest
    pub fn recommend(
        &mut self,
        node: &NodeSummary,
        emotion: &EmotionFeatures,
        related_materials: &[String],
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<VisualScheme> {
        let count = count.clamp(3, 5);
        let query = feature_vector(node, emotion);
        let mut result = self.learner.recommendations(&query, count, now);
        let mut seen: BTreeSet<String> =
            result.iter().map(VisualScheme::canonical_key).collect();

        if result.len() < count {
            let generated = generate_schemes(
                node,
                emotion,
                related_materials,
                count - result.len(),
                &mut self.rng,
            );
            for scheme in generated {
                if result.len() >= count {
                    break;
                }
                if seen.insert(scheme.canonical_key()) {
                    result.push(scheme);
                }
            }
        }
        result
    }

    /// Record a user action on a scheme shown for a node
    pub fn record(
        &mut self,
        node: &NodeSummary,
        emotion: &EmotionFeatures,
        scheme: VisualScheme,
        action: UserAction,
        now: DateTime<Utc>,
    ) {
        let features = feature_vector(node, emotion);
        self.learner.record_selection(features, scheme, action, now);
    }

    /// Forget everything learned and re-seed the PRNG
    pub fn reset(&mut self) {
        self.learner = PreferenceLearner::new();
        self.rng = Pcg64Mcg::seed_from_u64(self.seed);
    }
}
