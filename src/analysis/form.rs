//! Form classification
//!
//! Consumes the period list and emits the overall form: a prioritised
//! cascade tries variation, rondo, sonata, and compound ternary before
//! falling back, and a popular-form probe (verse-chorus, AABA) can replace
//! the winner when its confidence is higher. Auxiliary structures
//! (introduction, coda, transitions, extensions) are detected alongside.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::models::form::{
    AuxiliaryStructures, CodaInfo, CodaKind, ExtensionInfo, FormAnalysis, FormType, MeasureSpan,
    MiddleSectionType, RecapitulationType, Section, SectionFunction, SectionKind, SonataComponent,
    VariationKind,
};
use crate::models::structure::{Closure, Period, Phrase};
use crate::analysis::period::head_similarity;
use crate::analysis::similarity::melodic_similarity;

/// Typical phrase length in measures; phrases 1.5x longer are extensions
const TYPICAL_PHRASE_MEASURES: u32 = 4;

static VERSE_CHORUS_AB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ab)+a?$").expect("valid literal pattern"));
static VERSE_CHORUS_BA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ba)+b?$").expect("valid literal pattern"));

/// First-letter material pattern over the period list
#[derive(Debug, Clone)]
pub struct MaterialPattern {
    /// One letter per period
    pub pattern: String,
    /// Occurrences per letter
    pub counts: BTreeMap<char, usize>,
    /// Most frequent letter, ties resolved by first appearance
    pub main_material: char,
    /// Whether the piece opens and closes with the same material
    pub has_recapitulation: bool,
}

/// Build the material pattern for a period list
pub fn material_pattern(periods: &[Period]) -> MaterialPattern {
    let letters: Vec<char> = periods.iter().map(Period::base_letter).collect();
    let pattern: String = letters.iter().collect();
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for &letter in &letters {
        *counts.entry(letter).or_insert(0) += 1;
    }
    let main_material = letters
        .iter()
        .copied()
        .max_by_key(|letter| counts.get(letter).copied().unwrap_or(0))
        .unwrap_or('a');
    // max_by_key keeps the last maximum; scan again to prefer the first
    let max_count = counts.get(&main_material).copied().unwrap_or(0);
    let main_material = letters
        .iter()
        .copied()
        .find(|l| counts.get(l).copied().unwrap_or(0) == max_count)
        .unwrap_or(main_material);
    let has_recapitulation =
        letters.len() >= 3 && letters.first() == letters.last();
    MaterialPattern { pattern, counts, main_material, has_recapitulation }
}

/// Melodic similarity between two whole periods
pub fn period_similarity(a: &Period, b: &Period) -> f64 {
    melodic_similarity(&a.notes(), &b.notes())
}

/// Classify the overall form of a period list
pub fn classify_form(periods: &[Period]) -> FormAnalysis {
    let pattern = material_pattern(periods);
    let mut result = classify_cascade(periods, &pattern);
    if let Some(popular) = try_popular(periods, &pattern) {
        if popular.confidence > result.confidence {
            result = popular;
        }
    }
    result
}

/// The prioritised decision cascade, first hit wins
fn classify_cascade(periods: &[Period], pattern: &MaterialPattern) -> FormAnalysis {
    match periods.len() {
        0 => FormAnalysis {
            form_type: FormType::OnePart,
            sections: Vec::new(),
            confidence: 0.5,
            description: "No periods detected; treated as a single undivided part".to_string(),
        },
        1 => FormAnalysis {
            form_type: FormType::OnePart,
            sections: vec![section(
                0,
                "A",
                SectionKind::Main,
                SectionFunction::Statement,
                &[0],
                periods,
            )],
            confidence: 0.9,
            description: "Single period forming a one-part form".to_string(),
        },
        2 => classify_binary(periods),
        3 => classify_ternary(periods, pattern),
        _ => try_variation(periods)
            .or_else(|| try_rondo(periods, pattern))
            .or_else(|| try_sonata(periods))
            .or_else(|| try_ternary_compound(periods, pattern))
            .unwrap_or_else(|| fallback(periods)),
    }
}

/// Two periods: rounded when the close returns to the opening material
fn classify_binary(periods: &[Period]) -> FormAnalysis {
    let rounded = match (periods[0].phrases.first(), periods[1].phrases.last()) {
        (Some(opening), Some(closing)) => head_similarity(opening, closing) > 0.6,
        _ => false,
    };
    let (form_type, description) = if rounded {
        (
            FormType::BinaryRounded,
            "Two periods with the close returning to the opening material".to_string(),
        )
    } else {
        (
            FormType::BinaryParallel,
            "Two periods without a return to the opening material".to_string(),
        )
    };
    FormAnalysis {
        form_type,
        sections: vec![
            section(0, "A", SectionKind::Main, SectionFunction::Statement, &[0], periods),
            section(1, "B", SectionKind::Middle, SectionFunction::Contrast, &[1], periods),
        ],
        confidence: 0.8,
        description,
    }
}

/// Three periods: simple ternary on a recapitulation, otherwise A B C
fn classify_ternary(periods: &[Period], pattern: &MaterialPattern) -> FormAnalysis {
    if pattern.has_recapitulation {
        let middle_type = classify_middle_section(&periods[1], &periods[0]);
        let mut middle =
            section(1, "B", SectionKind::Middle, SectionFunction::Contrast, &[1], periods);
        middle.middle_type = Some(middle_type);
        let mut reprise =
            section(2, "A'", SectionKind::Return, SectionFunction::Restatement, &[2], periods);
        reprise.recapitulation =
            Some(recapitulation_type(period_similarity(&periods[0], &periods[2])));
        FormAnalysis {
            form_type: FormType::TernarySimple,
            sections: vec![
                section(0, "A", SectionKind::Main, SectionFunction::Statement, &[0], periods),
                middle,
                reprise,
            ],
            confidence: 0.8,
            description: "Three periods forming a simple ternary (A B A')".to_string(),
        }
    } else {
        FormAnalysis {
            form_type: FormType::TernaryParallel,
            sections: vec![
                section(0, "A", SectionKind::Main, SectionFunction::Statement, &[0], periods),
                section(1, "B", SectionKind::Middle, SectionFunction::Contrast, &[1], periods),
                section(2, "C", SectionKind::Middle, SectionFunction::Contrast, &[2], periods),
            ],
            confidence: 0.8,
            description: "Three periods of distinct material (A B C)".to_string(),
        }
    }
}

/// Ordered middle-section classification: trio, then development, then episode
pub fn classify_middle_section(middle: &Period, opening: &Period) -> MiddleSectionType {
    if middle.closure == Closure::Closed && middle.phrase_count >= 2 {
        MiddleSectionType::Trio
    } else if period_similarity(opening, middle) > 0.5 && middle.phrase_count < 2 {
        MiddleSectionType::Development
    } else {
        MiddleSectionType::Episode
    }
}

/// Variation form: most periods are recognisable transformations of the first
fn try_variation(periods: &[Period]) -> Option<FormAnalysis> {
    let theme = &periods[0];
    let rest = &periods[1..];
    if rest.is_empty() {
        return None;
    }
    let similarities: Vec<f64> = rest.iter().map(|p| period_similarity(theme, p)).collect();
    let varied = similarities.iter().filter(|&&s| s > 0.3 && s < 0.9).count();
    let ratio = varied as f64 / rest.len() as f64;
    if ratio < 0.6 {
        return None;
    }

    let mut sections = vec![section(
        0,
        "Theme",
        SectionKind::Main,
        SectionFunction::Statement,
        &[0],
        periods,
    )];
    for (i, similarity) in similarities.iter().enumerate() {
        let name = format!("Variation {}", i + 1);
        let mut var = section(
            i + 1,
            &name,
            SectionKind::Variation,
            SectionFunction::Development,
            &[i + 1],
            periods,
        );
        var.variation_type = Some(if *similarity >= 0.6 {
            VariationKind::Ornamental
        } else {
            VariationKind::Character
        });
        sections.push(var);
    }
    Some(FormAnalysis {
        form_type: FormType::Variation,
        sections,
        confidence: 0.7 + 0.2 * ratio,
        description: format!(
            "Theme with {} variations tracking the opening period",
            rest.len()
        ),
    })
}

/// Rondo: the main material returns at least three times between episodes
fn try_rondo(periods: &[Period], pattern: &MaterialPattern) -> Option<FormAnalysis> {
    if periods.len() < 5 {
        return None;
    }
    let main = pattern.main_material;
    let main_count = pattern.counts.get(&main).copied().unwrap_or(0);
    if main_count < 3 {
        return None;
    }
    let episode_count = pattern.counts.keys().filter(|&&l| l != main).count();
    if episode_count < 2 {
        return None;
    }

    let mut sections = Vec::with_capacity(periods.len());
    let mut refrain_seen = 0usize;
    let mut episode_letters: BTreeMap<char, usize> = BTreeMap::new();
    for (i, period) in periods.iter().enumerate() {
        if period.base_letter() == main {
            refrain_seen += 1;
            let name = format!("Refrain {}", refrain_seen);
            let mut refrain = section(
                i,
                &name,
                SectionKind::Refrain,
                if refrain_seen == 1 {
                    SectionFunction::Statement
                } else {
                    SectionFunction::Restatement
                },
                &[i],
                periods,
            );
            refrain.is_recurrence = Some(refrain_seen > 1);
            sections.push(refrain);
        } else {
            let ordinal = episode_letters.len() + 1;
            let number = *episode_letters.entry(period.base_letter()).or_insert(ordinal);
            let name = format!("Episode {}", number);
            sections.push(section(
                i,
                &name,
                SectionKind::Episode,
                SectionFunction::Contrast,
                &[i],
                periods,
            ));
        }
    }
    let confidence =
        (0.5 + 0.1 * main_count as f64 + 0.1 * episode_count as f64).min(0.9);
    Some(FormAnalysis {
        form_type: FormType::Rondo,
        sections,
        confidence,
        description: format!(
            "Rondo with {} refrain statements and {} episode materials",
            main_count, episode_count
        ),
    })
}

/// Sonata: the final third restates material from the opening
fn try_sonata(periods: &[Period]) -> Option<FormAnalysis> {
    let n = periods.len();
    if n < 3 {
        return None;
    }
    let third = (n / 3).max(1);
    let recap_start = n - third;
    let recap_similarities: Vec<f64> = periods[recap_start..]
        .iter()
        .map(|p| period_similarity(&periods[0], p))
        .collect();
    if !recap_similarities.iter().any(|&s| s > 0.5) {
        return None;
    }
    // A development that literally restates the opening is no development;
    // such pieces read as ternary or popular forms instead
    let development_restates = periods[third..recap_start]
        .iter()
        .any(|p| period_similarity(&periods[0], p) > 0.9);
    if development_restates {
        return None;
    }

    let expo_range: Vec<usize> = (0..third).collect();
    let dev_range: Vec<usize> = (third..recap_start).collect();
    let recap_range: Vec<usize> = (recap_start..n).collect();

    let mut exposition = section(
        0,
        "Exposition",
        SectionKind::Exposition,
        SectionFunction::Statement,
        &expo_range,
        periods,
    );
    exposition.components = Some(theme_components(&expo_range, periods, None));
    let development = section(
        1,
        "Development",
        SectionKind::Development,
        SectionFunction::Development,
        &dev_range,
        periods,
    );
    let mut recapitulation = section(
        2,
        "Recapitulation",
        SectionKind::Recapitulation,
        SectionFunction::Restatement,
        &recap_range,
        periods,
    );
    recapitulation.components =
        Some(theme_components(&recap_range, periods, Some(&recap_similarities)));

    let mut sections = vec![exposition];
    if !dev_range.is_empty() {
        sections.push(development);
    }
    sections.push(recapitulation);

    Some(FormAnalysis {
        form_type: FormType::Sonata,
        sections,
        confidence: 0.75,
        description: "Sonata outline with a recapitulated opening in the final third"
            .to_string(),
    })
}

/// Theme components for a sonata region; recap components carry varied flags
fn theme_components(
    range: &[usize],
    periods: &[Period],
    similarities: Option<&[f64]>,
) -> Vec<SonataComponent> {
    let labels = ["first theme", "second theme", "closing theme"];
    range
        .iter()
        .enumerate()
        .map(|(i, &period_index)| SonataComponent {
            label: labels.get(i).copied().unwrap_or("closing theme").to_string(),
            period_index,
            varied: similarities.and_then(|sims| sims.get(i)).map_or(false, |&s| s < 0.8),
        })
        .collect()
}

/// Compound ternary: leading and trailing main-material blocks around a middle
fn try_ternary_compound(periods: &[Period], pattern: &MaterialPattern) -> Option<FormAnalysis> {
    if periods.len() < 4 || !pattern.has_recapitulation {
        return None;
    }
    let letters: Vec<char> = periods.iter().map(Period::base_letter).collect();
    let main = letters[0];
    let a_len = letters.iter().take_while(|&&l| l == main).count();
    let reprise_len = letters.iter().rev().take_while(|&&l| l == main).count();
    if a_len + reprise_len >= periods.len() {
        return None;
    }
    let a_range: Vec<usize> = (0..a_len).collect();
    let b_range: Vec<usize> = (a_len..periods.len() - reprise_len).collect();
    let reprise_range: Vec<usize> = (periods.len() - reprise_len..periods.len()).collect();

    let mut middle = section(
        1,
        "B",
        SectionKind::Middle,
        SectionFunction::Contrast,
        &b_range,
        periods,
    );
    middle.middle_type = Some(classify_middle_section(&periods[b_range[0]], &periods[0]));
    let mut reprise = section(
        2,
        "A'",
        SectionKind::Return,
        SectionFunction::Restatement,
        &reprise_range,
        periods,
    );
    reprise.recapitulation = Some(recapitulation_type(period_similarity(
        &periods[0],
        &periods[reprise_range[0]],
    )));

    Some(FormAnalysis {
        form_type: FormType::TernaryCompound,
        sections: vec![
            section(0, "A", SectionKind::Main, SectionFunction::Statement, &a_range, periods),
            middle,
            reprise,
        ],
        confidence: 0.8,
        description: "Compound ternary with multi-period outer sections".to_string(),
    })
}

/// Popular-form probe over two-letter patterns; may replace the cascade winner
fn try_popular(periods: &[Period], pattern: &MaterialPattern) -> Option<FormAnalysis> {
    if pattern.counts.len() != 2 {
        return None;
    }
    if pattern.pattern == "aaba" {
        let sections = vec![
            section(0, "A", SectionKind::Verse, SectionFunction::Statement, &[0], periods),
            section(1, "A", SectionKind::Verse, SectionFunction::Restatement, &[1], periods),
            section(2, "B", SectionKind::Bridge, SectionFunction::Contrast, &[2], periods),
            section(3, "A", SectionKind::Verse, SectionFunction::Restatement, &[3], periods),
        ];
        return Some(FormAnalysis {
            form_type: FormType::Aaba,
            sections,
            confidence: 0.8,
            description: "Thirty-two-bar song form (AABA)".to_string(),
        });
    }
    if VERSE_CHORUS_AB.is_match(&pattern.pattern) || VERSE_CHORUS_BA.is_match(&pattern.pattern) {
        let sections: Vec<Section> = periods
            .iter()
            .enumerate()
            .map(|(i, period)| {
                let verse = period.base_letter() == pattern.pattern.chars().next().unwrap_or('a');
                section(
                    i,
                    if verse { "Verse" } else { "Chorus" },
                    if verse { SectionKind::Verse } else { SectionKind::Chorus },
                    if verse { SectionFunction::Statement } else { SectionFunction::Contrast },
                    &[i],
                    periods,
                )
            })
            .collect();
        return Some(FormAnalysis {
            form_type: FormType::VerseChorus,
            sections,
            confidence: 0.75,
            description: "Alternating verse-chorus pattern".to_string(),
        });
    }
    None
}

/// Fallback when no specialised form matches
fn fallback(periods: &[Period]) -> FormAnalysis {
    let all: Vec<usize> = (0..periods.len()).collect();
    FormAnalysis {
        form_type: FormType::OnePart,
        sections: vec![section(
            0,
            "A",
            SectionKind::Main,
            SectionFunction::Statement,
            &all,
            periods,
        )],
        confidence: 0.5,
        description: "Through-composed; no sectional pattern matched".to_string(),
    }
}

/// How completely a reprise restates the opening, by similarity
fn recapitulation_type(similarity: f64) -> RecapitulationType {
    if similarity >= 0.8 {
        RecapitulationType::Complete
    } else if similarity >= 0.5 {
        RecapitulationType::Varied
    } else {
        RecapitulationType::Partial
    }
}

/// Build a section over a set of period indices
fn section(
    index: usize,
    name: &str,
    kind: SectionKind,
    function: SectionFunction,
    period_indices: &[usize],
    periods: &[Period],
) -> Section {
    let start_measure = period_indices
        .first()
        .and_then(|&i| periods.get(i))
        .map_or(1, |p| p.start_measure);
    let end_measure = period_indices
        .last()
        .and_then(|&i| periods.get(i))
        .map_or(start_measure, |p| p.end_measure);
    Section {
        id: format!("section-{}", index),
        name: name.to_string(),
        kind,
        start_measure,
        end_measure,
        function,
        periods: period_indices.to_vec(),
        middle_type: None,
        components: None,
        variation_type: None,
        recapitulation: None,
        is_recurrence: None,
    }
}

/// Detect the framing material around and between the periods
pub fn detect_auxiliaries(
    periods: &[Period],
    phrases: &[Phrase],
    last_measure: u32,
) -> AuxiliaryStructures {
    let mut aux = AuxiliaryStructures::default();
    let Some(first) = periods.first() else {
        return aux;
    };
    let Some(last) = periods.last() else {
        return aux;
    };

    if first.start_measure > 1 {
        aux.introduction =
            Some(MeasureSpan { start_measure: 1, end_measure: first.start_measure - 1 });
    }
    if last.end_measure < last_measure {
        let span =
            MeasureSpan { start_measure: last.end_measure + 1, end_measure: last_measure };
        let kind = if span.length() > 4 { CodaKind::Coda } else { CodaKind::Codetta };
        aux.coda = Some(CodaInfo { span, kind });
    }
    for pair in periods.windows(2) {
        if pair[1].start_measure > pair[0].end_measure + 1 {
            aux.transitions.push(MeasureSpan {
                start_measure: pair[0].end_measure + 1,
                end_measure: pair[1].start_measure - 1,
            });
        }
    }
    for phrase in phrases {
        if phrase.length() as f64 > 1.5 * f64::from(TYPICAL_PHRASE_MEASURES) {
            aux.extensions
                .push(ExtensionInfo { phrase_index: phrase.index, length: phrase.length() });
        }
    }
    aux
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{Note, PitchName, Step};
    use crate::models::structure::{
        Cadence, CadenceStrength, CadenceType, PeriodType, Proportion,
    };

    fn note(step: Step, octave: i32, duration: f64, measure: u32, beat: f64) -> Note {
        Note::pitched(PitchName::natural(step, octave), duration, measure, beat, 0)
    }

    /// A one-phrase period over four measures with the given melody letter
    fn period(
        index: usize,
        start: u32,
        steps: &[Step],
        duration: f64,
        material: &str,
    ) -> Period {
        let notes: Vec<Note> = (0..4)
            .flat_map(|m| {
                steps.iter().enumerate().map(move |(i, &step)| (m, i, step))
            })
            .map(|(m, i, step)| note(step, 4, duration, start + m, i as f64))
            .collect();
        let phrase = Phrase {
            index,
            start_measure: start,
            end_measure: start + 3,
            cadence: Some(Cadence {
                measure: start + 3,
                beat: 0.0,
                cadence_type: CadenceType::PerfectAuthentic,
                strength: CadenceStrength::Strong,
                confidence: 0.9,
            }),
            notes: notes.clone(),
            sub_phrases: Vec::new(),
            material: material.to_string(),
            closure: Closure::Closed,
            relationship: None,
            head_similarity: None,
        };
        Period {
            index,
            start_measure: start,
            end_measure: start + 3,
            phrases: vec![phrase],
            phrase_count: 1,
            period_type: PeriodType::Parallel,
            proportion: Proportion::Square,
            closure: Closure::Closed,
            material: material.to_string(),
            cadence: None,
        }
    }

    const A_STEPS: [Step; 4] = [Step::C, Step::D, Step::E, Step::C];
    const B_STEPS: [Step; 4] = [Step::G, Step::B, Step::G, Step::D];
    const C_STEPS: [Step; 4] = [Step::A, Step::F, Step::A, Step::F];

    fn periods_for(letters: &str) -> Vec<Period> {
        letters
            .chars()
            .enumerate()
            .map(|(i, letter)| {
                // Contrasting materials differ in both pitch and rhythm
                let (steps, duration) = match letter {
                    'a' => (&A_STEPS, 1.0),
                    'b' => (&B_STEPS, 2.5),
                    // A loose variant of 'a': shared rhythm, reshaped melody
                    'v' => (&C_STEPS, 1.0),
                    _ => (&C_STEPS, 0.25),
                };
                period(i, i as u32 * 4 + 1, steps, duration, &letter.to_string())
            })
            .collect()
    }

    #[test]
    fn empty_input_is_one_part() {
        let analysis = classify_form(&[]);
        assert_eq!(analysis.form_type, FormType::OnePart);
        assert!((analysis.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_period_is_one_part_with_a_section() {
        let analysis = classify_form(&periods_for("a"));
        assert_eq!(analysis.form_type, FormType::OnePart);
        assert_eq!(analysis.sections.len(), 1);
        assert!((analysis.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn three_distinct_periods_are_parallel_ternary() {
        let analysis = classify_form(&periods_for("abc"));
        assert_eq!(analysis.form_type, FormType::TernaryParallel);
        assert_eq!(analysis.sections.len(), 3);
    }

    #[test]
    fn aba_is_simple_ternary_with_middle_classification() {
        let analysis = classify_form(&periods_for("aba"));
        assert_eq!(analysis.form_type, FormType::TernarySimple);
        assert!(analysis.sections[1].middle_type.is_some());
        assert_eq!(
            analysis.sections[2].recapitulation,
            Some(RecapitulationType::Complete)
        );
    }

    #[test]
    fn abaca_is_a_rondo_with_flagged_recurrences() {
        let analysis = classify_form(&periods_for("abaca"));
        assert_eq!(analysis.form_type, FormType::Rondo);
        assert_eq!(analysis.sections.len(), 5);
        assert_eq!(analysis.sections[0].is_recurrence, Some(false));
        assert_eq!(analysis.sections[2].is_recurrence, Some(true));
        assert_eq!(analysis.sections[4].is_recurrence, Some(true));
        assert!(analysis.confidence >= 0.7);
    }

    #[test]
    fn aaba_periods_form_a_compound_ternary() {
        // Exactly the pattern the popular probe also recognises; the
        // compound ternary ties on confidence and the probe only replaces
        // on a strictly higher score
        let analysis = classify_form(&periods_for("aaba"));
        assert_eq!(analysis.form_type, FormType::TernaryCompound);
        assert_eq!(analysis.sections.len(), 3);
        assert_eq!(analysis.sections[0].periods, vec![0, 1]);
        assert_eq!(analysis.sections[2].periods, vec![3]);
        assert_eq!(
            analysis.sections[2].recapitulation,
            Some(RecapitulationType::Complete)
        );
    }

    #[test]
    fn alternating_pattern_is_verse_chorus() {
        let analysis = classify_form(&periods_for("ababab"));
        assert_eq!(analysis.form_type, FormType::VerseChorus);
    }

    #[test]
    fn recognisable_transformations_form_a_variation_set() {
        let analysis = classify_form(&periods_for("avvv"));
        assert_eq!(analysis.form_type, FormType::Variation);
        assert_eq!(analysis.sections.len(), 4);
        assert_eq!(analysis.sections[0].name, "Theme");
        assert!(analysis.sections[1].variation_type.is_some());
        assert!((analysis.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn recapitulated_opening_after_contrast_reads_as_sonata() {
        let analysis = classify_form(&periods_for("abvcab"));
        assert_eq!(analysis.form_type, FormType::Sonata);
        assert_eq!(analysis.sections.len(), 3);
        let recap = &analysis.sections[2];
        let components = recap.components.as_ref().expect("recap components");
        assert!(!components[0].varied);
        assert!(components[1].varied);
    }

    #[test]
    fn auxiliaries_report_intro_coda_and_gaps() {
        let mut periods = periods_for("ab");
        periods[0].start_measure = 3;
        periods[1].start_measure = 9;
        periods[1].end_measure = 12;
        let aux = detect_auxiliaries(&periods, &[], 20);
        assert_eq!(
            aux.introduction,
            Some(MeasureSpan { start_measure: 1, end_measure: 2 })
        );
        assert_eq!(aux.transitions.len(), 1);
        let coda = aux.coda.expect("coda expected");
        assert_eq!(coda.kind, CodaKind::Coda);
    }
}
