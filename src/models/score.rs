//! Parsed score contract
//!
//! [`ParsedScore`] is the input handed over by the external score decoder.
//! The engine relies on a handful of structural invariants (sorted notes,
//! contiguous measures, sane key and time signatures); [`ParsedScore::validate`]
//! enforces them before any analysis runs.

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::models::note::Note;

/// Major or minor key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

/// Key signature as fifths on the circle plus a mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySignature {
    /// Position on the circle of fifths, -7 (7 flats) to 7 (7 sharps)
    pub fifths: i8,
    /// Major or minor
    pub mode: KeyMode,
}

impl Default for KeySignature {
    fn default() -> Self {
        Self { fifths: 0, mode: KeyMode::Major }
    }
}

/// Time signature as written
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    /// Beats per measure
    pub beats: u32,
    /// Note value of one beat (4 = quarter, 8 = eighth)
    pub beat_type: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, beat_type: 4 }
    }
}

/// One measure of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// 1-based measure number in appearance order
    pub number: u32,
}

/// A part (instrument or staff group) declared by the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Stable part identifier from the source file
    pub id: String,
    /// Display name
    pub name: String,
}

/// Complete symbolic score as produced by the external decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedScore {
    /// Measures in appearance order, numbered from 1
    pub measures: Vec<Measure>,
    /// All notes, sorted by (measure, beat, voice)
    pub notes: Vec<Note>,
    /// Global key signature
    pub key_signature: KeySignature,
    /// Global time signature
    pub time_signature: TimeSignature,
    /// Tempo in beats per minute
    pub tempo: f64,
    /// Declared parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl ParsedScore {
    /// Create a score with the default tempo of 120 BPM
    pub fn new(
        measures: Vec<Measure>,
        notes: Vec<Note>,
        key_signature: KeySignature,
        time_signature: TimeSignature,
    ) -> Self {
        Self { measures, notes, key_signature, time_signature, tempo: 120.0, parts: Vec::new() }
    }

    /// Number of measures in the score
    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    /// Beats per measure from the time signature
    pub fn beats_per_measure(&self) -> f64 {
        f64::from(self.time_signature.beats)
    }

    /// Highest measure number, or 0 for an empty score
    pub fn last_measure(&self) -> u32 {
        self.measures.last().map_or(0, |m| m.number)
    }

    /// Notes lying in the given measure, in score order
    pub fn notes_in_measure(&self, number: u32) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.measure == number)
    }

    /// Notes lying in the inclusive measure range, in score order
    pub fn notes_in_range(&self, start: u32, end: u32) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|n| n.measure >= start && n.measure <= end)
            .cloned()
            .collect()
    }

    /// Check the structural invariants the engine relies on
    ///
    /// - measures are contiguous and numbered from 1
    /// - every note references an existing measure
    /// - notes are sorted by (measure, beat, voice)
    /// - key signature fifths in -7..=7, time signature beats >= 1
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.key_signature.fifths < -7 || self.key_signature.fifths > 7 {
            return Err(ScoreError::KeyOutOfRange { fifths: self.key_signature.fifths });
        }
        if self.time_signature.beats < 1 {
            return Err(ScoreError::BadTimeSignature { beats: self.time_signature.beats });
        }
        for (i, measure) in self.measures.iter().enumerate() {
            let expected = i as u32 + 1;
            if measure.number != expected {
                return Err(ScoreError::NonContiguousMeasures {
                    expected,
                    found: measure.number,
                });
            }
        }
        let last = self.last_measure();
        for (index, note) in self.notes.iter().enumerate() {
            if note.measure < 1 || note.measure > last {
                return Err(ScoreError::NoteOutsideMeasures { index, measure: note.measure });
            }
            if index > 0 {
                let prev = &self.notes[index - 1];
                let prev_key = (prev.measure, prev.beat, prev.voice);
                let key = (note.measure, note.beat, note.voice);
                let ordered = prev_key.0 < key.0
                    || (prev_key.0 == key.0 && prev_key.1 < key.1)
                    || (prev_key.0 == key.0 && prev_key.1 == key.1 && prev_key.2 <= key.2);
                if !ordered {
                    return Err(ScoreError::UnsortedNotes { index });
                }
            }
        }
        Ok(())
    }
}
