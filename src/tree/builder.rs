//! Tree construction and confidence propagation
//!
//! Assembles the Section -> Period -> Phrase -> Sub-phrase -> Motive
//! hierarchy from the detector outputs, propagates confidence bottom-up,
//! relabels recurring material, and derives the visual style of every node.

use crate::models::form::FormAnalysis;
use crate::models::note::Note;
use crate::models::score::ParsedScore;
use crate::models::structure::{Motive, Period, Phrase, SubPhrase};
use crate::analysis::similarity::interval_pattern;
use crate::tree::{
    Features, NodeId, StructureNode, StructureTree, StructureType, TooltipData, VisualStyle,
    MODEL_VERSION,
};

/// Root detector confidence before propagation
const ROOT_CONFIDENCE: f64 = 0.8;
/// Detector confidence of a period node
const PERIOD_CONFIDENCE: f64 = 0.75;
/// Fallback detector confidence where no similarity backs a node
const DEFAULT_CONFIDENCE: f64 = 0.7;
/// Phrases at least this long split into two derived sub-phrase halves
const SPLIT_PHRASE_MEASURES: u32 = 4;

/// Incremental tree assembly state
struct TreeAssembler<'a> {
    motives: &'a [Motive],
    nodes: Vec<StructureNode>,
}

impl<'a> TreeAssembler<'a> {
    fn new(motives: &'a [Motive]) -> Self {
        Self { motives, nodes: Vec::new() }
    }

    fn push(
        &mut self,
        node_type: StructureType,
        start_measure: u32,
        end_measure: u32,
        parent: Option<NodeId>,
        material: String,
        detect_confidence: f64,
        features: Features,
        tooltip: TooltipData,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(StructureNode {
            id: format!("node-{:04}", id.0),
            node_type,
            start_measure,
            end_measure,
            parent,
            children: Vec::new(),
            material,
            confidence: detect_confidence,
            detect_confidence,
            features,
            visual_style: VisualStyle::for_confidence(detect_confidence),
            tooltip,
        });
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id.0) {
                parent_node.children.push(id);
            }
        }
        id
    }

    fn tooltip(
        &self,
        node_type: StructureType,
        start: u32,
        end: u32,
        similarity: Option<f64>,
        extra: Vec<String>,
    ) -> TooltipData {
        let used_features = match node_type {
            StructureType::Section | StructureType::Theme => {
                vec!["formType".to_string(), "function".to_string(), "measureRange".to_string()]
            }
            StructureType::Period => vec![
                "periodType".to_string(),
                "proportion".to_string(),
                "closure".to_string(),
                "cadence".to_string(),
            ],
            StructureType::Phrase => vec![
                "cadence".to_string(),
                "closure".to_string(),
                "relationship".to_string(),
                "material".to_string(),
            ],
            StructureType::SubPhrase => {
                vec!["material".to_string(), "similarity".to_string()]
            }
            StructureType::Motive => vec![
                "intervalPattern".to_string(),
                "rhythmPattern".to_string(),
                "contour".to_string(),
            ],
        };
        let mut details = vec![format!("measures {}-{}", start, end)];
        details.extend(extra);
        TooltipData {
            node_type: node_type.as_str().to_string(),
            used_features,
            similarity,
            details,
            model_version: MODEL_VERSION.to_string(),
        }
    }

    fn add_phrase(&mut self, phrase: &Phrase, parent: NodeId) {
        let features = Features {
            cadence: phrase.cadence.clone(),
            closure: Some(phrase.closure),
            relationship: phrase.relationship,
            ..Features::default()
        };
        let detect = phrase
            .cadence
            .as_ref()
            .map_or(DEFAULT_CONFIDENCE, |c| c.confidence);
        let extra = phrase
            .cadence
            .as_ref()
            .map(|c| format!("cadence at measure {}", c.measure))
            .into_iter()
            .collect();
        let tooltip = self.tooltip(
            StructureType::Phrase,
            phrase.start_measure,
            phrase.end_measure,
            phrase.head_similarity,
            extra,
        );
        let phrase_id = self.push(
            StructureType::Phrase,
            phrase.start_measure,
            phrase.end_measure,
            Some(parent),
            phrase.material.clone(),
            detect,
            features,
            tooltip,
        );

        if phrase.length() >= SPLIT_PHRASE_MEASURES {
            // Long phrases split into two derived halves
            let half = phrase.length() / 2;
            let first_end = phrase.start_measure + half - 1;
            let halves = [
                (phrase.start_measure, first_end, format!("{}\u{2081}", phrase.material)),
                (first_end + 1, phrase.end_measure, format!("{}\u{2082}", phrase.material)),
            ];
            for (start, end, material) in halves {
                let tooltip =
                    self.tooltip(StructureType::SubPhrase, start, end, None, Vec::new());
                let sub_id = self.push(
                    StructureType::SubPhrase,
                    start,
                    end,
                    Some(phrase_id),
                    material,
                    DEFAULT_CONFIDENCE,
                    Features::default(),
                    tooltip,
                );
                self.add_motives(sub_id);
            }
        } else {
            for sub in &phrase.sub_phrases {
                self.add_sub_phrase(sub, phrase_id);
            }
        }
    }

    fn add_sub_phrase(&mut self, sub: &SubPhrase, parent: NodeId) {
        let detect = sub.similarity.unwrap_or(DEFAULT_CONFIDENCE).max(0.5);
        let tooltip = self.tooltip(
            StructureType::SubPhrase,
            sub.start_measure,
            sub.end_measure,
            sub.similarity,
            Vec::new(),
        );
        let sub_id = self.push(
            StructureType::SubPhrase,
            sub.start_measure,
            sub.end_measure,
            Some(parent),
            sub.material.clone(),
            detect,
            Features::default(),
            tooltip,
        );
        self.add_motives(sub_id);
    }

    /// Derive motive nodes under a sub-phrase node
    ///
    /// Spans are one measure wide when the parent covers at most two
    /// measures, two measures otherwise.
    fn add_motives(&mut self, parent: NodeId) {
        let Some(parent_node) = self.nodes.get(parent.0) else {
            return;
        };
        let (start, end) = (parent_node.start_measure, parent_node.end_measure);
        let material = parent_node.material.clone();
        let stride = if end - start + 1 <= 2 { 1 } else { 2 };
        let mut span_start = start;
        while span_start <= end {
            let span_end = (span_start + stride - 1).min(end);
            let detected: Vec<&Motive> = self
                .motives
                .iter()
                .filter(|m| m.measure >= span_start && m.measure <= span_end)
                .collect();
            let detect = detected
                .iter()
                .map(|m| m.relationship_confidence)
                .fold(f64::NAN, f64::max);
            let detect = if detect.is_nan() { 0.6 } else { detect };
            let contour = detected.first().map(|m| m.contour);
            let features = Features { contour, ..Features::default() };
            let extra: Vec<String> = if detected.is_empty() {
                Vec::new()
            } else {
                vec![format!("{} detected motives", detected.len())]
            };
            let tooltip =
                self.tooltip(StructureType::Motive, span_start, span_end, None, extra);
            self.push(
                StructureType::Motive,
                span_start,
                span_end,
                Some(parent),
                material.clone(),
                detect,
                features,
                tooltip,
            );
            span_start = span_end + 1;
        }
    }
}

/// Build the full hierarchy from the detector outputs
pub fn build_hierarchy(
    score: &ParsedScore,
    form: &FormAnalysis,
    periods: &[Period],
    motives: &[Motive],
) -> StructureTree {
    let mut assembler = TreeAssembler::new(motives);
    let last_measure = score.last_measure().max(1);

    let root_material = periods.first().map_or_else(|| "a".to_string(), |p| {
        p.base_letter().to_string()
    });
    let root_features =
        Features { form_type: Some(form.form_type), ..Features::default() };
    let root_tooltip = assembler.tooltip(
        StructureType::Section,
        1,
        last_measure,
        None,
        vec![form.description.clone()],
    );
    let root = assembler.push(
        StructureType::Section,
        1,
        last_measure,
        None,
        root_material,
        ROOT_CONFIDENCE,
        root_features,
        root_tooltip,
    );

    for section in &form.sections {
        let features = Features {
            function: Some(section.function),
            middle_type: section.middle_type,
            ..Features::default()
        };
        let tooltip = assembler.tooltip(
            StructureType::Theme,
            section.start_measure,
            section.end_measure,
            None,
            Vec::new(),
        );
        let theme_id = assembler.push(
            StructureType::Theme,
            section.start_measure,
            section.end_measure,
            Some(root),
            section.name.clone(),
            form.confidence,
            features,
            tooltip,
        );

        for &period_index in &section.periods {
            let Some(period) = periods.get(period_index) else {
                continue;
            };
            let features = Features {
                period_type: Some(period.period_type),
                proportion: Some(period.proportion),
                closure: Some(period.closure),
                cadence: period.cadence.clone(),
                ..Features::default()
            };
            let tooltip = assembler.tooltip(
                StructureType::Period,
                period.start_measure,
                period.end_measure,
                None,
                vec![format!("{} phrases", period.phrase_count)],
            );
            let period_id = assembler.push(
                StructureType::Period,
                period.start_measure,
                period.end_measure,
                Some(theme_id),
                period.material.clone(),
                PERIOD_CONFIDENCE,
                features,
                tooltip,
            );
            for phrase in &period.phrases {
                assembler.add_phrase(phrase, period_id);
            }
        }
    }

    let mut nodes = assembler.nodes;
    propagate_confidence(&mut nodes);
    relabel_recurring_material(&mut nodes, score);
    for node in &mut nodes {
        node.visual_style = VisualStyle::for_confidence(node.confidence);
    }
    StructureTree::from_arena(nodes, root)
}

/// Post-order confidence propagation
///
/// Children are created after their parents, so a reverse arena sweep visits
/// every child before its parent.
fn propagate_confidence(nodes: &mut [StructureNode]) {
    for index in (0..nodes.len()).rev() {
        let child_confidences: Vec<f64> = nodes[index]
            .children
            .iter()
            .filter_map(|c| nodes.get(c.0))
            .map(|c| c.confidence)
            .collect();
        let node = &mut nodes[index];
        let mut confidence = if child_confidences.is_empty() {
            node.detect_confidence
        } else {
            let mean = child_confidences.iter().sum::<f64>() / child_confidences.len() as f64;
            (node.detect_confidence + mean) / 2.0
        };
        if node.features.cadence.is_some() {
            confidence += 0.1;
        }
        node.confidence = confidence.clamp(0.0, 1.0);
    }
}

/// Interval prefix used to re-identify recurring material
fn interval_prefix(notes: &[Note]) -> Vec<i32> {
    let mut intervals = interval_pattern(notes);
    intervals.truncate(4);
    intervals
}

/// Whether two interval prefixes match within tolerance
fn prefix_matches(a: &[i32], b: &[i32]) -> bool {
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    let close = a.iter().zip(b.iter()).filter(|(x, y)| (**x - **y).abs() <= 2).count();
    close as f64 / a.len() as f64 > 0.7
}

/// Append a prime to later nodes whose opening intervals recur
///
/// Matching is restricted to nodes of the same type; the first occurrence
/// registers the prefix, later occurrences are marked as variants.
fn relabel_recurring_material(nodes: &mut [StructureNode], score: &ParsedScore) {
    let mut registry: Vec<(StructureType, Vec<i32>)> = Vec::new();
    for node in nodes.iter_mut() {
        let notes = score.notes_in_range(node.start_measure, node.end_measure);
        let prefix = interval_prefix(&notes);
        if prefix.is_empty() {
            continue;
        }
        let recurring = registry
            .iter()
            .any(|(t, p)| *t == node.node_type && prefix_matches(p, &prefix));
        if recurring {
            if !node.material.ends_with('\'') {
                node.material.push('\'');
            }
        } else {
            registry.push((node.node_type, prefix));
        }
    }
}
