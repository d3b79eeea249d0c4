//! Note and pitch-name representation
//!
//! The note stream is the primary input of every detector. A note with no
//! pitch is a rest; beats are expressed as floating-point offsets from the
//! start of the measure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven letter names of the musical alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Semitone offset of the natural step above C
    pub fn semitones(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    /// Letter name as written
    pub fn as_str(self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }
}

/// Chromatic alteration applied to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone offset contributed by the accidental
    pub fn semitones(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Conventional ASCII spelling ("bb", "b", "", "#", "##")
    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }
}

/// A spelled pitch: letter name, accidental, and octave
///
/// Octaves follow scientific pitch notation, so middle C is `C4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchName {
    /// Letter name
    pub step: Step,
    /// Chromatic alteration
    pub accidental: Accidental,
    /// Scientific octave number
    pub octave: i32,
}

impl PitchName {
    /// Create a pitch name
    pub fn new(step: Step, accidental: Accidental, octave: i32) -> Self {
        Self { step, accidental, octave }
    }

    /// Natural pitch shorthand
    pub fn natural(step: Step, octave: i32) -> Self {
        Self::new(step, Accidental::Natural, octave)
    }

    /// Pitch class in 0..=11 (C = 0)
    pub fn pitch_class(&self) -> u8 {
        (self.step.semitones() + self.accidental.semitones()).rem_euclid(12) as u8
    }

    /// MIDI note number: `pc + (octave + 1) * 12`
    ///
    /// Values are clamped into the 0..=127 MIDI range.
    pub fn to_midi(&self) -> u8 {
        let midi = i32::from(self.pitch_class()) + (self.octave + 1) * 12;
        midi.clamp(0, 127) as u8
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.step.as_str(), self.accidental.symbol(), self.octave)
    }
}

impl FromStr for PitchName {
    type Err = String;

    /// Parse spellings like `C4`, `F#3`, `Bb5`, `Abb2`, `C##6`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let step = match chars.next() {
            Some('C') => Step::C,
            Some('D') => Step::D,
            Some('E') => Step::E,
            Some('F') => Step::F,
            Some('G') => Step::G,
            Some('A') => Step::A,
            Some('B') => Step::B,
            other => return Err(format!("invalid step in pitch '{}': {:?}", s, other)),
        };
        let rest: String = chars.collect();
        let (accidental, octave_str) = if let Some(stripped) = rest.strip_prefix("##") {
            (Accidental::DoubleSharp, stripped)
        } else if let Some(stripped) = rest.strip_prefix('#') {
            (Accidental::Sharp, stripped)
        } else if let Some(stripped) = rest.strip_prefix("bb") {
            (Accidental::DoubleFlat, stripped)
        } else if let Some(stripped) = rest.strip_prefix('b') {
            (Accidental::Flat, stripped)
        } else {
            (Accidental::Natural, rest.as_str())
        };
        let octave: i32 = octave_str
            .parse()
            .map_err(|_| format!("invalid octave in pitch '{}'", s))?;
        Ok(PitchName::new(step, accidental, octave))
    }
}

/// Written dynamic marking attached to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicMark {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl DynamicMark {
    /// Rough loudness in [0, 1] used when classifying dynamics
    pub fn level(self) -> f64 {
        match self {
            DynamicMark::Ppp => 0.1,
            DynamicMark::Pp => 0.2,
            DynamicMark::P => 0.35,
            DynamicMark::Mp => 0.45,
            DynamicMark::Mf => 0.55,
            DynamicMark::F => 0.7,
            DynamicMark::Ff => 0.85,
            DynamicMark::Fff => 0.95,
        }
    }
}

/// A single note or rest in the parsed score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Spelled pitch; `None` represents a rest
    pub pitch: Option<PitchName>,
    /// Duration in beats
    pub duration: f64,
    /// 1-based measure number
    pub measure: u32,
    /// Beat offset from the start of the measure
    pub beat: f64,
    /// Voice index within the part
    pub voice: u32,
    /// Written dynamic, when the source carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<DynamicMark>,
}

impl Note {
    /// Create a pitched note
    pub fn pitched(pitch: PitchName, duration: f64, measure: u32, beat: f64, voice: u32) -> Self {
        Self { pitch: Some(pitch), duration, measure, beat, voice, dynamics: None }
    }

    /// Create a rest
    pub fn rest(duration: f64, measure: u32, beat: f64, voice: u32) -> Self {
        Self { pitch: None, duration, measure, beat, voice, dynamics: None }
    }

    /// Whether this note is a rest
    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    /// MIDI number of the pitch, if any
    pub fn midi(&self) -> Option<u8> {
        self.pitch.as_ref().map(PitchName::to_midi)
    }
}
