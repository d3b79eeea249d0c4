//! Visual scheme contract
//!
//! The shapes/colors/animation bundles the recommender proposes for a
//! structure node, plus the coarse emotion features that drive them.

use serde::{Deserialize, Serialize};

/// Shape vocabulary of the scheme generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
    Octagon,
    Star4,
    Star5,
    Star6,
    Sun,
    Burst,
    Spiral,
    Wave,
}

/// Relative shape size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeSize {
    Small,
    Medium,
    Large,
}

/// One shape in a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSpec {
    /// Shape kind
    #[serde(rename = "type")]
    pub shape: ShapeType,
    /// Relative size
    pub size: ShapeSize,
}

/// Animation vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    Pulse,
    Bounce,
    Spin,
    Fade,
    Drift,
    Breathe,
    Shake,
    Flash,
    Tremble,
    Sway,
    Glow,
    Twinkle,
}

/// Spatial arrangement of the shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    Single,
    Sequence,
    Grid,
}

/// Relationship colour logic applied to the scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeRelationship {
    Similar,
    Contrasting,
    Recapitulated,
}

/// Where a recommendation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    RuleBased,
    PreferenceLearning,
}

/// Coarse tempo class of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoClass {
    Fast,
    Moderate,
    Slow,
}

impl TempoClass {
    /// Numeric encoding used by the preference feature vector
    pub fn numeric(self) -> f64 {
        match self {
            TempoClass::Slow => 0.0,
            TempoClass::Moderate => 0.5,
            TempoClass::Fast => 1.0,
        }
    }
}

/// Coarse dynamics class of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicsClass {
    Strong,
    Moderate,
    Soft,
}

impl DynamicsClass {
    /// Numeric encoding used by the preference feature vector
    pub fn numeric(self) -> f64 {
        match self {
            DynamicsClass::Soft => 0.0,
            DynamicsClass::Moderate => 0.5,
            DynamicsClass::Strong => 1.0,
        }
    }
}

/// Coarse harmonic tension class of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionClass {
    Tense,
    Neutral,
    Relaxed,
}

impl TensionClass {
    /// Numeric encoding used by the preference feature vector
    pub fn numeric(self) -> f64 {
        match self {
            TensionClass::Relaxed => 0.0,
            TensionClass::Neutral => 0.5,
            TensionClass::Tense => 1.0,
        }
    }
}

/// Emotion features derived from a node and optional audio scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionFeatures {
    /// Perceived pace
    pub tempo: TempoClass,
    /// Perceived loudness
    pub dynamics: DynamicsClass,
    /// Perceived tension
    pub tension: TensionClass,
}

/// A candidate visual scheme for one structure node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualScheme {
    /// Stable scheme id
    pub id: String,
    /// Shapes in draw order
    pub shapes: Vec<ShapeSpec>,
    /// Hex colour strings ("#RRGGBB"), cycled over the shapes
    pub colors: Vec<String>,
    /// Animation applied to the shapes
    pub animation: AnimationType,
    /// Spatial arrangement
    pub arrangement: Arrangement,
    /// Material-relationship colour logic that was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<SchemeRelationship>,
    /// Emotion features the scheme was generated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_features: Option<EmotionFeatures>,
    /// Rule-based or learned
    pub recommendation_source: RecommendationSource,
    /// Set when the scheme was surfaced by the preference learner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_preference: Option<bool>,
    /// Aggregated preference score for learned schemes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_score: Option<f64>,
    /// Number of buffer examples backing a learned scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

impl VisualScheme {
    /// Canonical identity of a scheme: shape kinds, colours, animation
    ///
    /// Two schemes with the same canonical key are treated as the same
    /// suggestion by deduplication and by the preference learner's grouping.
    pub fn canonical_key(&self) -> String {
        let shapes: Vec<&str> = self
            .shapes
            .iter()
            .map(|s| match s.shape {
                ShapeType::Circle => "circle",
                ShapeType::Square => "square",
                ShapeType::Triangle => "triangle",
                ShapeType::Diamond => "diamond",
                ShapeType::Hexagon => "hexagon",
                ShapeType::Octagon => "octagon",
                ShapeType::Star4 => "star4",
                ShapeType::Star5 => "star5",
                ShapeType::Star6 => "star6",
                ShapeType::Sun => "sun",
                ShapeType::Burst => "burst",
                ShapeType::Spiral => "spiral",
                ShapeType::Wave => "wave",
            })
            .collect();
        let animation = format!("{:?}", self.animation).to_lowercase();
        format!("{}|{}|{}", shapes.join(","), self.colors.join(","), animation)
    }
}
