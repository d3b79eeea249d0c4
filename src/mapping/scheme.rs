//! Rule-based visual scheme generation
//!
//! Produces candidate shape/colour/animation bundles for a node from its
//! structural role and emotion features, applies material-relationship
//! colour logic against sibling nodes, and tops up with randomly drawn
//! schemes when deduplication leaves too few.

use rand::Rng;
use std::collections::BTreeSet;

use crate::mapping::NodeSummary;
use crate::models::structure::{CadenceType, Closure};
use crate::models::visual::{
    AnimationType, Arrangement, DynamicsClass, EmotionFeatures, RecommendationSource,
    SchemeRelationship, ShapeSize, ShapeSpec, ShapeType, TempoClass, TensionClass, VisualScheme,
};
use crate::tree::StructureType;

/// Warm colour palette, hex strings
pub const WARM_COLORS: [&str; 5] = ["#E74C3C", "#E67E22", "#F1C40F", "#D35400", "#C0392B"];
/// Cool colour palette, hex strings
pub const COOL_COLORS: [&str; 5] = ["#3498DB", "#2980B9", "#1ABC9C", "#16A085", "#9B59B6"];
/// Mixed palette for moderate tempo
pub const MIXED_COLORS: [&str; 5] = ["#E74C3C", "#3498DB", "#F1C40F", "#1ABC9C", "#E67E22"];

/// Minimum number of suggestions after deduplication
const MIN_SCHEMES: usize = 3;

/// Structural default shape pool per node type
fn structural_shapes(node_type: StructureType) -> &'static [ShapeType; 3] {
    match node_type {
        StructureType::Motive => &[ShapeType::Circle, ShapeType::Diamond, ShapeType::Star4],
        StructureType::SubPhrase => &[ShapeType::Square, ShapeType::Triangle, ShapeType::Hexagon],
        StructureType::Phrase => &[ShapeType::Circle, ShapeType::Square, ShapeType::Star5],
        StructureType::Period => &[ShapeType::Hexagon, ShapeType::Octagon, ShapeType::Star6],
        StructureType::Theme => &[ShapeType::Star5, ShapeType::Sun, ShapeType::Burst],
        StructureType::Section => &[ShapeType::Octagon, ShapeType::Spiral, ShapeType::Wave],
    }
}

/// Dynamics-driven shape pool, overriding the structural default
fn dynamics_shapes(dynamics: DynamicsClass) -> Option<&'static [ShapeType; 3]> {
    match dynamics {
        DynamicsClass::Strong => Some(&[ShapeType::Star5, ShapeType::Burst, ShapeType::Sun]),
        DynamicsClass::Soft => Some(&[ShapeType::Circle, ShapeType::Wave, ShapeType::Spiral]),
        DynamicsClass::Moderate => None,
    }
}

fn size_for(dynamics: DynamicsClass) -> ShapeSize {
    match dynamics {
        DynamicsClass::Strong => ShapeSize::Large,
        DynamicsClass::Moderate => ShapeSize::Medium,
        DynamicsClass::Soft => ShapeSize::Small,
    }
}

/// Tension-specific colours used for the first variant
fn tension_colors(tension: TensionClass) -> Option<&'static [&'static str; 3]> {
    match tension {
        TensionClass::Tense => Some(&["#C0392B", "#8E44AD", "#2C3E50"]),
        TensionClass::Relaxed => Some(&["#27AE60", "#3498DB", "#A3E4D7"]),
        TensionClass::Neutral => None,
    }
}

fn tempo_animations(tempo: TempoClass) -> Option<&'static [AnimationType; 3]> {
    match tempo {
        TempoClass::Fast => Some(&[AnimationType::Pulse, AnimationType::Bounce, AnimationType::Spin]),
        TempoClass::Slow => Some(&[AnimationType::Fade, AnimationType::Drift, AnimationType::Breathe]),
        TempoClass::Moderate => None,
    }
}

fn tension_animations(tension: TensionClass) -> Option<&'static [AnimationType; 3]> {
    match tension {
        TensionClass::Tense => {
            Some(&[AnimationType::Shake, AnimationType::Flash, AnimationType::Tremble])
        }
        TensionClass::Relaxed => {
            Some(&[AnimationType::Sway, AnimationType::Glow, AnimationType::Fade])
        }
        TensionClass::Neutral => None,
    }
}

fn default_animations(node_type: StructureType) -> &'static [AnimationType; 3] {
    match node_type {
        StructureType::Motive => {
            &[AnimationType::Twinkle, AnimationType::Pulse, AnimationType::Fade]
        }
        StructureType::SubPhrase => {
            &[AnimationType::Sway, AnimationType::Fade, AnimationType::Pulse]
        }
        StructureType::Phrase => &[AnimationType::Fade, AnimationType::Drift, AnimationType::Glow],
        StructureType::Period => {
            &[AnimationType::Breathe, AnimationType::Fade, AnimationType::Drift]
        }
        StructureType::Theme => &[AnimationType::Glow, AnimationType::Breathe, AnimationType::Fade],
        StructureType::Section => {
            &[AnimationType::Drift, AnimationType::Fade, AnimationType::Breathe]
        }
    }
}

fn shape_count_for(duration: u32) -> usize {
    if duration <= 2 {
        1
    } else if duration <= 4 {
        2
    } else if duration <= 8 {
        3
    } else {
        4
    }
}

fn arrangement_for(duration: u32) -> Arrangement {
    if duration <= 2 {
        Arrangement::Single
    } else if duration <= 8 {
        Arrangement::Sequence
    } else {
        Arrangement::Grid
    }
}

/// Colour list for one variant
fn variant_colors(
    variant: usize,
    shape_count: usize,
    node: &NodeSummary,
    emotion: &EmotionFeatures,
) -> Vec<String> {
    if variant == 0 {
        if let Some(colors) = tension_colors(emotion.tension) {
            return colors
                .iter()
                .take(shape_count.clamp(1, 3))
                .map(|c| (*c).to_string())
                .collect();
        }
    }
    let closed = node.closure == Some(Closure::Closed)
        || node.cadence == Some(CadenceType::PerfectAuthentic);
    let palette: &[&str; 5] = match emotion.tempo {
        TempoClass::Fast => &WARM_COLORS,
        TempoClass::Slow => &COOL_COLORS,
        TempoClass::Moderate => {
            if closed {
                &WARM_COLORS
            } else {
                &MIXED_COLORS
            }
        }
    };
    let take = shape_count.clamp(1, 3);
    (0..take).map(|k| palette[(variant + k) % palette.len()].to_string()).collect()
}

/// Animation for one variant: tempo beats tension beats the type default
fn variant_animation(
    variant: usize,
    node_type: StructureType,
    emotion: &EmotionFeatures,
) -> AnimationType {
    let pool = tempo_animations(emotion.tempo)
        .or_else(|| tension_animations(emotion.tension))
        .unwrap_or_else(|| default_animations(node_type));
    pool[variant % pool.len()]
}

/// Generate candidate schemes for a node
///
/// `related_materials` are the material labels of the node's siblings; they
/// drive the relationship colour logic. At least `max(3, count)` distinct
/// schemes come back, topped up with random draws when the deterministic
/// variants collapse under deduplication.
pub fn generate_schemes<R: Rng>(
    node: &NodeSummary,
    emotion: &EmotionFeatures,
    related_materials: &[String],
    count: usize,
    rng: &mut R,
) -> Vec<VisualScheme> {
    let duration = node.duration_measures();
    let shape_count = shape_count_for(duration);
    let size = size_for(emotion.dynamics);
    let shape_pool = dynamics_shapes(emotion.dynamics)
        .unwrap_or_else(|| structural_shapes(node.node_type));
    let arrangement = arrangement_for(duration);

    let mut schemes: Vec<VisualScheme> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for variant in 0..count.max(1) {
        let shapes: Vec<ShapeSpec> = (0..shape_count)
            .map(|k| ShapeSpec { shape: shape_pool[(variant + k) % shape_pool.len()], size })
            .collect();
        let mut colors = variant_colors(variant, shape_count, node, emotion);
        let relationship = apply_relationship_colors(node, related_materials, &mut colors);
        let scheme = VisualScheme {
            id: format!("scheme-{}-{}", node.node_id, variant),
            shapes,
            colors,
            animation: variant_animation(variant, node.node_type, emotion),
            arrangement,
            relationship,
            emotion_features: Some(*emotion),
            recommendation_source: RecommendationSource::RuleBased,
            from_preference: None,
            preference_score: None,
            match_count: None,
        };
        if seen.insert(scheme.canonical_key()) {
            schemes.push(scheme);
        }
    }

    // Random top-up when dedup leaves fewer than the floor
    let target = count.max(MIN_SCHEMES);
    let mut draw = schemes.len();
    while schemes.len() < target && draw < target + 16 {
        let scheme = random_scheme(node, emotion, shape_count, size, arrangement, draw, rng);
        if seen.insert(scheme.canonical_key()) {
            schemes.push(scheme);
        }
        draw += 1;
    }
    schemes
}

/// Material-relationship colour logic
///
/// Siblings sharing the node's base letter mark the scheme similar and warm;
/// siblings with only different letters mark it contrasting and cool. A
/// primed material reads as recapitulated and pins the first colour.
fn apply_relationship_colors(
    node: &NodeSummary,
    related_materials: &[String],
    colors: &mut [String],
) -> Option<SchemeRelationship> {
    let base = node.base_letter();
    let mut relationship = None;
    if related_materials.iter().any(|m| m.starts_with(base)) {
        for (k, color) in colors.iter_mut().enumerate() {
            *color = WARM_COLORS[k % WARM_COLORS.len()].to_string();
        }
        relationship = Some(SchemeRelationship::Similar);
    } else if !related_materials.is_empty() {
        for (k, color) in colors.iter_mut().enumerate() {
            *color = COOL_COLORS[k % COOL_COLORS.len()].to_string();
        }
        relationship = Some(SchemeRelationship::Contrasting);
    }
    if node.material.ends_with('\'') {
        if let Some(first) = colors.first_mut() {
            let index = (base as usize) % WARM_COLORS.len();
            *first = WARM_COLORS[index].to_string();
        }
        relationship = Some(SchemeRelationship::Recapitulated);
    }
    relationship
}

/// One randomly drawn scheme respecting the emotion tables
fn random_scheme<R: Rng>(
    node: &NodeSummary,
    emotion: &EmotionFeatures,
    shape_count: usize,
    size: ShapeSize,
    arrangement: Arrangement,
    ordinal: usize,
    rng: &mut R,
) -> VisualScheme {
    const ALL_SHAPES: [ShapeType; 13] = [
        ShapeType::Circle,
        ShapeType::Square,
        ShapeType::Triangle,
        ShapeType::Diamond,
        ShapeType::Hexagon,
        ShapeType::Octagon,
        ShapeType::Star4,
        ShapeType::Star5,
        ShapeType::Star6,
        ShapeType::Sun,
        ShapeType::Burst,
        ShapeType::Spiral,
        ShapeType::Wave,
    ];
    let shapes: Vec<ShapeSpec> = (0..shape_count)
        .map(|_| ShapeSpec { shape: ALL_SHAPES[rng.gen_range(0..ALL_SHAPES.len())], size })
        .collect();
    let palette: &[&str; 5] = if rng.gen_bool(0.5) { &WARM_COLORS } else { &COOL_COLORS };
    let colors: Vec<String> = (0..shape_count.clamp(1, 3))
        .map(|_| palette[rng.gen_range(0..palette.len())].to_string())
        .collect();
    let animation_pool = tempo_animations(emotion.tempo)
        .or_else(|| tension_animations(emotion.tension))
        .unwrap_or_else(|| default_animations(node.node_type));
    VisualScheme {
        id: format!("scheme-{}-r{}", node.node_id, ordinal),
        shapes,
        colors,
        animation: animation_pool[rng.gen_range(0..animation_pool.len())],
        arrangement,
        relationship: None,
        emotion_features: Some(*emotion),
        recommendation_source: RecommendationSource::RuleBased,
        from_preference: None,
        preference_score: None,
        match_count: None,
    }
}
