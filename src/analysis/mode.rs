//! Mode detection
//!
//! Chooses the best-fitting scale for the piece by weighted pitch-class
//! overlap: every note's duration votes for its pitch class, the histogram
//! is rotated into the tonic frame, and each candidate scale is scored by
//! the share of weight it covers.

use serde::{Deserialize, Serialize};

use crate::models::score::ParsedScore;
use crate::pitch::tonic_pitch_class;

/// Candidate scales, major/minor variants plus church and pentatonic modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    NaturalMinor,
    HarmonicMinor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    PentatonicMajor,
    PentatonicSuspended,
    PentatonicBluesMinor,
    PentatonicBluesMajor,
    PentatonicMinor,
}

impl ScaleKind {
    /// Scale degrees as semitone offsets from the tonic
    pub fn degrees(self) -> &'static [u8] {
        match self {
            ScaleKind::Major | ScaleKind::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::NaturalMinor | ScaleKind::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleKind::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleKind::PentatonicSuspended => &[0, 2, 5, 7, 10],
            ScaleKind::PentatonicBluesMinor => &[0, 3, 5, 8, 10],
            ScaleKind::PentatonicBluesMajor => &[0, 2, 5, 7, 9],
            ScaleKind::PentatonicMinor => &[0, 3, 5, 7, 10],
        }
    }

    /// Every candidate, in scoring order
    pub fn all() -> &'static [ScaleKind] {
        &[
            ScaleKind::Major,
            ScaleKind::NaturalMinor,
            ScaleKind::HarmonicMinor,
            ScaleKind::Ionian,
            ScaleKind::Dorian,
            ScaleKind::Phrygian,
            ScaleKind::Lydian,
            ScaleKind::Mixolydian,
            ScaleKind::Aeolian,
            ScaleKind::Locrian,
            ScaleKind::PentatonicMajor,
            ScaleKind::PentatonicSuspended,
            ScaleKind::PentatonicBluesMinor,
            ScaleKind::PentatonicBluesMajor,
            ScaleKind::PentatonicMinor,
        ]
    }
}

/// Winning scale plus the runner-up for tooltip display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDetection {
    /// Best-scoring scale
    pub scale: ScaleKind,
    /// Coverage score of the winner in [0, 1]
    pub confidence: f64,
    /// Second-best scale and its score
    pub runner_up: Option<(ScaleKind, f64)>,
}

/// Detect the best-fitting scale for a score
pub fn detect_mode(score: &ParsedScore) -> ModeDetection {
    let tonic = tonic_pitch_class(score.key_signature.fifths, score.key_signature.mode);
    let mut histogram = [0.0f64; 12];
    for note in &score.notes {
        if let Some(pitch) = &note.pitch {
            histogram[usize::from(pitch.pitch_class())] += note.duration.max(0.0);
        }
    }
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return ModeDetection {
            scale: ScaleKind::Major,
            confidence: 0.0,
            runner_up: None,
        };
    }

    // Rotate into the tonic-relative frame
    let mut relative = [0.0f64; 12];
    for (pc, &weight) in histogram.iter().enumerate() {
        let degree = (pc + 12 - usize::from(tonic)) % 12;
        relative[degree] = weight;
    }

    let mut scored: Vec<(ScaleKind, f64)> = ScaleKind::all()
        .iter()
        .map(|&scale| {
            let in_scale: f64 =
                scale.degrees().iter().map(|&d| relative[usize::from(d)]).sum();
            (scale, in_scale / total)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (scale, confidence) = scored[0];
    ModeDetection { scale, confidence, runner_up: scored.get(1).copied() }
}
