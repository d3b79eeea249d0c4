//! Visual mapping layer
//!
//! Emotion extraction, rule-based scheme generation, the session-scoped
//! preference learner, and the combined recommender that blends both.

pub mod emotion;
pub mod preference;
pub mod recommend;
pub mod scheme;

use crate::models::structure::{CadenceType, Closure, PeriodType};
use crate::tree::{StructureNode, StructureType};

/// The slice of a structure node the recommender cares about
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSummary {
    /// Node id the recommendation is for
    pub node_id: String,
    /// Node kind
    pub node_type: StructureType,
    /// First measure covered
    pub start_measure: u32,
    /// Last measure covered
    pub end_measure: u32,
    /// Material label
    pub material: String,
    /// Final node confidence
    pub confidence: f64,
    /// Cadence closing the node, if any
    pub cadence: Option<CadenceType>,
    /// Open or closed ending, if known
    pub closure: Option<Closure>,
    /// Period classification, for period nodes
    pub period_type: Option<PeriodType>,
}

impl NodeSummary {
    /// Capture the recommender-relevant slice of a node
    pub fn from_node(node: &StructureNode) -> Self {
        Self {
            node_id: node.id.clone(),
            node_type: node.node_type,
            start_measure: node.start_measure,
            end_measure: node.end_measure,
            material: node.material.clone(),
            confidence: node.confidence,
            cadence: node.features.cadence.as_ref().map(|c| c.cadence_type),
            closure: node.features.closure,
            period_type: node.features.period_type,
        }
    }

    /// Covered length in measures
    pub fn duration_measures(&self) -> u32 {
        self.end_measure - self.start_measure + 1
    }

    /// First character of the material label
    pub fn base_letter(&self) -> char {
        self.material.chars().next().unwrap_or('a')
    }

    /// Whether the material label marks a varied restatement
    pub fn has_prime(&self) -> bool {
        self.material.contains('\'')
    }
}
