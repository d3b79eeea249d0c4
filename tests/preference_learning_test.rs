// Preference learning convergence through the recommender

use chrono::{DateTime, TimeZone, Utc};
use scoremap::mapping::preference::{feature_vector, PreferenceLearner, UserAction};
use scoremap::mapping::recommend::SchemeRecommender;
use scoremap::mapping::NodeSummary;
use scoremap::models::{
    AnimationType, Arrangement, CadenceType, DynamicsClass, EmotionFeatures,
    RecommendationSource, ShapeSize, ShapeSpec, ShapeType, TempoClass, TensionClass,
    VisualScheme,
};
use scoremap::tree::StructureType;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).single().expect("valid time")
}

fn make_summary() -> NodeSummary {
    NodeSummary {
        node_id: "node-0003".to_string(),
        node_type: StructureType::Phrase,
        start_measure: 1,
        end_measure: 4,
        material: "a".to_string(),
        confidence: 0.85,
        cadence: Some(CadenceType::PerfectAuthentic),
        closure: None,
        period_type: None,
    }
}

fn make_emotion() -> EmotionFeatures {
    EmotionFeatures {
        tempo: TempoClass::Moderate,
        dynamics: DynamicsClass::Moderate,
        tension: TensionClass::Relaxed,
    }
}

fn make_scheme(id: &str, shape: ShapeType, color: &str) -> VisualScheme {
    VisualScheme {
        id: id.to_string(),
        shapes: vec![ShapeSpec { shape, size: ShapeSize::Medium }],
        colors: vec![color.to_string()],
        animation: AnimationType::Fade,
        arrangement: Arrangement::Sequence,
        relationship: None,
        emotion_features: None,
        recommendation_source: RecommendationSource::RuleBased,
        from_preference: None,
        preference_score: None,
        match_count: None,
    }
}

#[test]
fn repeated_accepts_converge_and_rejects_are_excluded() {
    let mut learner = PreferenceLearner::new();
    let features = feature_vector(&make_summary(), &make_emotion());
    let liked = make_scheme("scheme-x", ShapeType::Circle, "#E74C3C");
    let disliked = make_scheme("scheme-y", ShapeType::Square, "#3498DB");

    for minute in 0..3 {
        learner.record_selection(features, liked.clone(), UserAction::Accept, at(minute));
    }
    learner.record_selection(features, disliked.clone(), UserAction::Reject, at(3));

    let recommendations = learner.recommendations(&features, 5, at(4));
    assert!(!recommendations.is_empty());
    assert_eq!(recommendations[0].canonical_key(), liked.canonical_key());
    assert!(recommendations
        .iter()
        .all(|s| s.canonical_key() != disliked.canonical_key()));
    assert_eq!(
        recommendations[0].recommendation_source,
        RecommendationSource::PreferenceLearning
    );
    assert_eq!(recommendations[0].match_count, Some(3));
    assert!(recommendations[0].preference_score.unwrap_or(0.0) > 0.0);
}

#[test]
fn below_the_example_floor_nothing_is_recommended() {
    let mut learner = PreferenceLearner::new();
    let features = feature_vector(&make_summary(), &make_emotion());
    assert!(learner.recommendations(&features, 5, at(0)).is_empty());
    learner.record_selection(
        features,
        make_scheme("scheme-x", ShapeType::Circle, "#E74C3C"),
        UserAction::Accept,
        at(0),
    );
    assert!(learner.recommendations(&features, 5, at(1)).is_empty());
}

#[test]
fn recency_decay_prefers_fresh_feedback() {
    let mut learner = PreferenceLearner::new();
    let features = feature_vector(&make_summary(), &make_emotion());
    let old = make_scheme("scheme-old", ShapeType::Square, "#3498DB");
    let fresh = make_scheme("scheme-new", ShapeType::Circle, "#E74C3C");

    // The old favourite was accepted an hour before the fresh one
    learner.record_selection(features, old.clone(), UserAction::Accept, at(0));
    learner.record_selection(features, fresh.clone(), UserAction::Accept, at(59));

    let recommendations = learner.recommendations(&features, 5, at(59));
    assert_eq!(recommendations[0].canonical_key(), fresh.canonical_key());
}

#[test]
fn modify_counts_as_weak_positive_feedback() {
    let mut learner = PreferenceLearner::new();
    let features = feature_vector(&make_summary(), &make_emotion());
    let modified = make_scheme("scheme-m", ShapeType::Hexagon, "#1ABC9C");
    learner.record_selection(features, modified.clone(), UserAction::Modify, at(0));
    learner.record_selection(features, modified.clone(), UserAction::Modify, at(1));

    let recommendations = learner.recommendations(&features, 5, at(2));
    assert_eq!(recommendations[0].canonical_key(), modified.canonical_key());
}

#[test]
fn recommender_blends_learned_and_rule_based_suggestions() {
    let mut recommender = SchemeRecommender::new(99);
    let summary = make_summary();
    let emotion = make_emotion();

    let first = recommender.recommend(&summary, &emotion, &[], 5, at(0));
    assert!(first.len() >= 3 && first.len() <= 5);

    let favourite = first[0].clone();
    for minute in 0..3 {
        recommender.record(&summary, &emotion, favourite.clone(), UserAction::Accept, at(minute));
    }
    let blended = recommender.recommend(&summary, &emotion, &[], 5, at(4));
    assert_eq!(blended[0].canonical_key(), favourite.canonical_key());
    assert_eq!(blended[0].from_preference, Some(true));
    // The remainder comes from the rule-based generator
    assert!(blended[1..]
        .iter()
        .any(|s| s.recommendation_source == RecommendationSource::RuleBased));
}
