//! Structural analysis entities
//!
//! Cadences, motives, sub-phrases, phrases, and periods — the units the
//! rule engine emits on its way from a raw note stream to a form analysis.
//! Every sum domain is a closed enum so decision sites can match
//! exhaustively.

use serde::{Deserialize, Serialize};

use crate::models::note::Note;

/// Harmonic cadence categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceType {
    /// Perfect authentic: V-I with the tonic in the melody
    PerfectAuthentic,
    /// Imperfect authentic: V-I (or VII-I) without the melodic tonic
    ImperfectAuthentic,
    /// Half cadence: arrival on V
    Half,
    /// Deceptive: V resolving to VI
    Deceptive,
    /// Plagal: IV-I
    Plagal,
    /// Phrygian half cadence in minor: iv6-V
    Phrygian,
}

impl CadenceType {
    /// Closural weight of the cadence, 0..=1
    pub fn strength(self) -> f64 {
        match self {
            CadenceType::PerfectAuthentic => 1.0,
            CadenceType::ImperfectAuthentic => 0.8,
            CadenceType::Plagal => 0.7,
            CadenceType::Deceptive => 0.5,
            CadenceType::Half => 0.4,
            CadenceType::Phrygian => 0.3,
        }
    }
}

/// Coarse strength class reported alongside the cadence type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceStrength {
    Strong,
    Moderate,
    Weak,
}

/// A detected cadence at the end of a measure pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cadence {
    /// Arrival measure (the second of the pair)
    pub measure: u32,
    /// Beat of the arrival bass note
    pub beat: f64,
    /// Cadence category
    #[serde(rename = "type")]
    pub cadence_type: CadenceType,
    /// Coarse strength class
    pub strength: CadenceStrength,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

/// Strength of an optional cadence, 0.3 when absent
pub fn cadence_strength(cadence: Option<&Cadence>) -> f64 {
    cadence.map_or(0.3, |c| c.cadence_type.strength())
}

/// Melodic direction of a motive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contour {
    Ascending,
    Descending,
    Static,
}

/// How a motive relates to the motive before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MotiveRelationship {
    /// First statement of new material
    New,
    /// Near-exact restatement
    Repetition,
    /// Restatement shifted by a consistent interval
    Sequence {
        /// Transposition in semitones
        transposition: i32,
    },
    /// Same rhythm, different intervals
    Variation,
    /// Shortened restatement of the opening
    Fragmentation,
    /// Mirrored interval content
    Inversion,
}

/// Smallest recognisable melodic unit, typically 1-2 beats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motive {
    /// Position in the motive list
    pub index: usize,
    /// Measure the motive starts in
    pub measure: u32,
    /// Beat offset of the first note
    pub start_beat: f64,
    /// Notes making up the motive
    pub notes: Vec<Note>,
    /// Signed semitone intervals between consecutive pitched notes
    pub interval_pattern: Vec<i32>,
    /// Durations of the notes in beats
    pub rhythm_pattern: Vec<f64>,
    /// Melodic direction
    pub contour: Contour,
    /// Relationship to the preceding motive
    pub relationship: MotiveRelationship,
    /// Confidence of the relationship classification
    pub relationship_confidence: f64,
    /// Index of the motive this one develops, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_to: Option<usize>,
}

/// Roughly one-measure melodic unit between motive and phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPhrase {
    /// Position in the sub-phrase list
    pub index: usize,
    /// First measure covered
    pub start_measure: u32,
    /// Last measure covered
    pub end_measure: u32,
    /// Starting beat within the first measure
    pub start_beat: f64,
    /// Ending beat within the last measure
    pub end_beat: f64,
    /// Notes covered by the sub-phrase
    pub notes: Vec<Note>,
    /// Motives lying inside the sub-phrase
    pub motives: Vec<Motive>,
    /// Material label (a, a', av, b, ...)
    pub material: String,
    /// Index of the most similar earlier sub-phrase, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar_to: Option<usize>,
    /// Similarity to that sub-phrase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// Whether a unit ends with a conclusive cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Closure {
    Open,
    Closed,
}

/// How a phrase relates to the phrase before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseRelationship {
    /// Same opening, different close
    Parallel,
    /// Unrelated material
    Contrasting,
    /// Whole phrase restated
    Repetition,
    /// Reworking of earlier material
    Development,
    /// Transposed restatement
    Sequence,
}

/// A 2-12 measure unit closed by a cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    /// Position in the phrase list
    pub index: usize,
    /// First measure
    pub start_measure: u32,
    /// Last measure
    pub end_measure: u32,
    /// Cadence closing the phrase, if one was detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
    /// Notes covered by the phrase
    pub notes: Vec<Note>,
    /// Sub-phrases lying inside the phrase
    pub sub_phrases: Vec<SubPhrase>,
    /// Material label
    pub material: String,
    /// Open or closed ending
    pub closure: Closure,
    /// Relationship to the previous phrase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<PhraseRelationship>,
    /// Head similarity to the phrase used for the material label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_similarity: Option<f64>,
}

impl Phrase {
    /// Length in measures, inclusive
    pub fn length(&self) -> u32 {
        self.end_measure - self.start_measure + 1
    }

    /// First character of the material label
    pub fn base_letter(&self) -> char {
        self.material.chars().next().unwrap_or('a')
    }
}

/// Period categories by phrase relationships and count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Parallel,
    Contrasting,
    Sequential,
    ThreePhrase,
    FourPhrase,
    Compound,
}

/// Phrase-length proportion within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proportion {
    /// All phrases equal, length a power of two >= 4
    Square,
    /// All phrases equal, length not a power of two
    Regular,
    /// Unequal phrase lengths
    NonSquare,
}

/// Ordered group of phrases forming a musical paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Position in the period list
    pub index: usize,
    /// First measure
    pub start_measure: u32,
    /// Last measure
    pub end_measure: u32,
    /// Member phrases in order
    pub phrases: Vec<Phrase>,
    /// Number of member phrases
    pub phrase_count: usize,
    /// Period category
    #[serde(rename = "type")]
    pub period_type: PeriodType,
    /// Phrase-length proportion
    pub proportion: Proportion,
    /// Closure of the final phrase
    pub closure: Closure,
    /// Material label of the opening phrase
    pub material: String,
    /// Cadence of the final phrase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
}

impl Period {
    /// Length in measures, inclusive
    pub fn length(&self) -> u32 {
        self.end_measure - self.start_measure + 1
    }

    /// First character of the material label
    pub fn base_letter(&self) -> char {
        self.material.chars().next().unwrap_or('a')
    }

    /// All notes of the member phrases, in order
    pub fn notes(&self) -> Vec<Note> {
        self.phrases.iter().flat_map(|p| p.notes.iter().cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_strength_ordering() {
        assert!(CadenceType::PerfectAuthentic.strength() > CadenceType::ImperfectAuthentic.strength());
        assert!(CadenceType::ImperfectAuthentic.strength() > CadenceType::Plagal.strength());
        assert!(CadenceType::Half.strength() > CadenceType::Phrygian.strength());
        assert_eq!(cadence_strength(None), 0.3);
    }

    #[test]
    fn cadence_type_serializes_snake_case() {
        let json = serde_json::to_string(&CadenceType::PerfectAuthentic).unwrap();
        assert_eq!(json, "\"perfect_authentic\"");
    }
}
