//! Emotion feature extraction
//!
//! Derives coarse tempo, dynamics, and tension classes from a structure node
//! and, when audio accompanies the score, overrides them from RMS and
//! spectral-centroid scalars.

use crate::models::audio::AudioSummary;
use crate::models::structure::{CadenceType, Closure};
use crate::models::visual::{DynamicsClass, EmotionFeatures, TempoClass, TensionClass};
use crate::tree::{StructureNode, StructureType};

/// Derive emotion features for a node
pub fn extract_emotion(node: &StructureNode, audio: Option<&AudioSummary>) -> EmotionFeatures {
    let duration = f64::from(node.end_measure - node.start_measure + 1);
    let activity = node.children.len() as f64 / duration.max(1.0);
    let tempo = if activity > 2.0 {
        TempoClass::Fast
    } else if activity < 0.5 {
        TempoClass::Slow
    } else {
        TempoClass::Moderate
    };

    let mut dynamics = match node.node_type {
        StructureType::Motive | StructureType::SubPhrase => DynamicsClass::Soft,
        StructureType::Phrase | StructureType::Period => DynamicsClass::Moderate,
        StructureType::Theme | StructureType::Section => DynamicsClass::Strong,
    };

    let cadence_type = node.features.cadence.as_ref().map(|c| c.cadence_type);
    let closure = node.features.closure;
    let mut tension = if cadence_type == Some(CadenceType::PerfectAuthentic)
        || closure == Some(Closure::Closed)
    {
        TensionClass::Relaxed
    } else if matches!(cadence_type, Some(CadenceType::Half | CadenceType::Deceptive))
        || closure == Some(Closure::Open)
    {
        TensionClass::Tense
    } else {
        TensionClass::Neutral
    };

    if let Some(audio) = audio {
        if audio.rms > 0.7 {
            dynamics = DynamicsClass::Strong;
        } else if audio.rms < 0.3 {
            dynamics = DynamicsClass::Soft;
        }
        if audio.spectral_centroid > 3000.0 {
            tension = TensionClass::Tense;
        } else if audio.spectral_centroid < 1000.0 {
            tension = TensionClass::Relaxed;
        }
    }

    EmotionFeatures { tempo, dynamics, tension }
}
