//! Period detection
//!
//! Groups phrases into periods by greedy accumulation, classifies period
//! type and proportion, and merges consecutive statement/counter-statement
//! pairs into compound periods.

use crate::models::structure::{
    cadence_strength, Closure, Period, PeriodType, Phrase, PhraseRelationship, Proportion,
};
use crate::analysis::similarity::{
    detect_transposition, interval_pattern, interval_similarity, melodic_similarity,
};

/// Phrases accumulated before a period is forced closed
const MAX_PHRASES_PER_PERIOD: usize = 4;

/// Group phrases into periods
///
/// A period ends when a strong cadence arrives with at least two phrases
/// accumulated, when four phrases have accumulated, or when a strong cadence
/// is followed by a phrase opening clearly new material.
pub fn detect_periods(phrases: &[Phrase]) -> Vec<Period> {
    let mut periods: Vec<Period> = Vec::new();
    let mut current: Vec<Phrase> = Vec::new();

    for (i, phrase) in phrases.iter().enumerate() {
        current.push(phrase.clone());
        let strong = cadence_strength(phrase.cadence.as_ref()) > 0.7;
        let section_break = strong
            && phrases
                .get(i + 1)
                .map_or(false, |next| head_similarity(phrase, next) < 0.3);
        let full = current.len() >= MAX_PHRASES_PER_PERIOD;
        if (strong && current.len() >= 2) || full || section_break {
            periods.push(make_period(periods.len(), std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        periods.push(make_period(periods.len(), current));
    }

    merge_compound_periods(periods)
}

/// Head similarity between the openings of two phrases
pub fn head_similarity(a: &Phrase, b: &Phrase) -> f64 {
    let cap = |notes: &[crate::models::note::Note]| -> usize {
        (notes.len() / 2).clamp(1, 8).min(notes.len())
    };
    let ha = &a.notes[..cap(&a.notes).min(a.notes.len())];
    let hb = &b.notes[..cap(&b.notes).min(b.notes.len())];
    melodic_similarity(ha, hb)
}

/// Whether the second phrase is a transposed restatement of the first
fn is_sequential_relation(a: &Phrase, b: &Phrase) -> bool {
    let sim = interval_similarity(&interval_pattern(&a.notes), &interval_pattern(&b.notes));
    sim > 0.7 && detect_transposition(&a.notes, &b.notes) != 0
}

/// Build one period from accumulated phrases
fn make_period(index: usize, phrases: Vec<Phrase>) -> Period {
    let start_measure = phrases.first().map_or(1, |p| p.start_measure);
    let end_measure = phrases.last().map_or(start_measure, |p| p.end_measure);
    let period_type = classify_period_type(&phrases);
    let proportion = classify_proportion(&phrases);
    let closure = phrases.last().map_or(Closure::Open, |p| p.closure);
    let material = phrases.first().map_or_else(|| "a".to_string(), |p| p.material.clone());
    let cadence = phrases.last().and_then(|p| p.cadence.clone());
    let phrase_count = phrases.len();
    Period {
        index,
        start_measure,
        end_measure,
        phrases,
        phrase_count,
        period_type,
        proportion,
        closure,
        material,
        cadence,
    }
}

/// Classify the period by its phrase relationships and count
fn classify_period_type(phrases: &[Phrase]) -> PeriodType {
    match phrases.len() {
        0 | 1 => PeriodType::Parallel,
        2 => {
            let consequent = &phrases[1];
            let parallel = consequent.relationship == Some(PhraseRelationship::Parallel)
                || head_similarity(&phrases[0], consequent) > 0.7;
            if parallel {
                PeriodType::Parallel
            } else if is_sequential_relation(&phrases[0], consequent) {
                PeriodType::Sequential
            } else {
                PeriodType::Contrasting
            }
        }
        3 => PeriodType::ThreePhrase,
        4 => PeriodType::FourPhrase,
        _ => PeriodType::Compound,
    }
}

/// Classify phrase-length proportion
fn classify_proportion(phrases: &[Phrase]) -> Proportion {
    let lengths: Vec<u32> = phrases.iter().map(Phrase::length).collect();
    let Some(&first) = lengths.first() else {
        return Proportion::NonSquare;
    };
    if lengths.iter().all(|&l| l == first) {
        if first >= 4 && first.is_power_of_two() {
            Proportion::Square
        } else {
            Proportion::Regular
        }
    } else {
        Proportion::NonSquare
    }
}

/// Merge consecutive statement/counter-statement period pairs
///
/// When two adjacent periods open with the same head and the second closes
/// more strongly, they form one compound AA' period.
fn merge_compound_periods(periods: Vec<Period>) -> Vec<Period> {
    let mut merged: Vec<Period> = Vec::with_capacity(periods.len());
    let mut iter = periods.into_iter().peekable();
    while let Some(period) = iter.next() {
        let combine = iter.peek().map_or(false, |next| {
            let heads_match = match (period.phrases.first(), next.phrases.first()) {
                (Some(a), Some(b)) => head_similarity(a, b) > 0.7,
                _ => false,
            };
            heads_match
                && cadence_strength(next.cadence.as_ref())
                    > cadence_strength(period.cadence.as_ref())
        });
        if combine {
            if let Some(next) = iter.next() {
                let mut phrases = period.phrases.clone();
                phrases.extend(next.phrases.iter().cloned());
                let mut compound = make_period(merged.len(), phrases);
                compound.period_type = PeriodType::Compound;
                merged.push(compound);
            }
        } else {
            let mut period = period;
            period.index = merged.len();
            merged.push(period);
        }
    }
    merged
}
