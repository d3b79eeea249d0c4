//! Pitch and key utilities
//!
//! Tonic resolution from the circle of fifths, scale-degree arithmetic, and
//! MIDI conversion. These are the shared primitives every harmonic detector
//! builds on.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::models::note::PitchName;
use crate::models::score::KeyMode;

/// Sharp-side major tonics indexed by fifths 0..=7
const SHARP_TONICS: [&str; 8] = ["C", "G", "D", "A", "E", "B", "F#", "C#"];

/// Flat-side major tonics indexed by -fifths 0..=7
const FLAT_TONICS: [&str; 8] = ["C", "F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];

/// Short spellings per pitch class, sharp-preferred
const PC_SPELLINGS: [&str; 12] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

lazy_static! {
    /// Spelled name -> pitch class, covering naturals, single and double
    /// alterations for all seven steps
    static ref PITCH_CLASS_MAP: HashMap<String, u8> = {
        let mut map = HashMap::new();
        let steps: [(&str, i32); 7] =
            [("C", 0), ("D", 2), ("E", 4), ("F", 5), ("G", 7), ("A", 9), ("B", 11)];
        let accidentals: [(&str, i32); 5] =
            [("bb", -2), ("b", -1), ("", 0), ("#", 1), ("##", 2)];
        for (step, base) in steps {
            for (symbol, offset) in accidentals {
                map.insert(format!("{}{}", step, symbol), (base + offset).rem_euclid(12) as u8);
            }
        }
        map
    };
}

/// Pitch class of a spelled name without octave ("F#", "Bb"), if known
pub fn pitch_class_of(name: &str) -> Option<u8> {
    PITCH_CLASS_MAP.get(name).copied()
}

/// Resolve the tonic spelling for a key signature
///
/// Sharp keys read from the sharp table, flat keys from the flat table.
/// Minor keys take the relative major tonic down a minor third and resolve
/// to the first short spelling for that pitch class.
pub fn tonic_from_key(fifths: i8, mode: KeyMode) -> &'static str {
    let index = fifths.unsigned_abs().min(7) as usize;
    let major = if fifths >= 0 { SHARP_TONICS[index] } else { FLAT_TONICS[index] };
    match mode {
        KeyMode::Major => major,
        KeyMode::Minor => {
            let major_pc = pitch_class_of(major).unwrap_or(0);
            let minor_pc = (u32::from(major_pc) + 9) % 12;
            PC_SPELLINGS[minor_pc as usize]
        }
    }
}

/// Pitch class of the tonic for a key signature
pub fn tonic_pitch_class(fifths: i8, mode: KeyMode) -> u8 {
    pitch_class_of(tonic_from_key(fifths, mode)).unwrap_or(0)
}

/// Diatonic scale degree of a pitch relative to a tonic pitch class
///
/// Returns 0..=6 for the seven diatonic semitone offsets, -1 for chromatic
/// tones. Degree 0 is the tonic, degree 4 the dominant.
pub fn scale_degree(pitch: &PitchName, tonic_pc: u8) -> i8 {
    let interval = (i32::from(pitch.pitch_class()) - i32::from(tonic_pc)).rem_euclid(12);
    match interval {
        0 => 0,
        2 => 1,
        4 => 2,
        5 => 3,
        7 => 4,
        9 => 5,
        11 => 6,
        _ => -1,
    }
}

/// MIDI number for a pitch spelling like "C4" or "F#3"
///
/// Unparseable input resolves to middle C (60).
pub fn pitch_to_midi(text: &str) -> u8 {
    text.parse::<PitchName>().map_or(60, |pitch| pitch.to_midi())
}

/// Sharp-preferred pitch name for a MIDI number
pub fn midi_to_pitch(midi: u8) -> PitchName {
    let pc = midi % 12;
    let octave = i32::from(midi / 12) - 1;
    let spelling = PC_SPELLINGS[pc as usize];
    // Spellings in the table are at most step + one sharp
    format!("{}{}", spelling, octave)
        .parse()
        .unwrap_or_else(|_| PitchName::natural(crate::models::note::Step::C, 4))
}
