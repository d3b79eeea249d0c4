//! Structure tree
//!
//! Arena-allocated hierarchy Section -> Period -> Phrase -> Sub-phrase ->
//! Motive. Nodes are addressed by index; parent links are non-owning
//! back-references. Serialization flattens the arena into an id-keyed map
//! and import rebuilds it in two passes.

pub mod builder;
pub mod edit;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::models::form::{FormType, MiddleSectionType, SectionFunction};
use crate::models::structure::{
    Cadence, Closure, Contour, PeriodType, PhraseRelationship, Proportion,
};

/// Version tag stamped into tooltips and exported state
pub const MODEL_VERSION: &str = "1.0.0";

/// Node kinds from coarsest to finest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    Section,
    Theme,
    Period,
    Phrase,
    SubPhrase,
    Motive,
}

impl StructureType {
    /// Index used by the preference feature encoding
    pub fn ordinal(self) -> usize {
        match self {
            StructureType::Section => 0,
            StructureType::Theme => 1,
            StructureType::Period => 2,
            StructureType::Phrase => 3,
            StructureType::SubPhrase => 4,
            StructureType::Motive => 5,
        }
    }

    /// Snake-case name for tooltips and serialized state
    pub fn as_str(self) -> &'static str {
        match self {
            StructureType::Section => "section",
            StructureType::Theme => "theme",
            StructureType::Period => "period",
            StructureType::Phrase => "phrase",
            StructureType::SubPhrase => "sub_phrase",
            StructureType::Motive => "motive",
        }
    }
}

/// Border line style by confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// Displayed uncertainty, ordered from certain to uncertain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Rendering hints derived from a node's confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualStyle {
    /// Border line style
    pub line_style: LineStyle,
    /// Fill opacity in [0, 1]
    pub opacity: f64,
    /// Border width in pixels
    pub border_width: u8,
    /// Displayed uncertainty level
    pub uncertainty_level: UncertaintyLevel,
}

impl VisualStyle {
    /// Style for a confidence value, monotone in every component
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self {
                line_style: LineStyle::Solid,
                opacity: 1.0,
                border_width: 2,
                uncertainty_level: UncertaintyLevel::Low,
            }
        } else if confidence >= 0.6 {
            Self {
                line_style: LineStyle::Solid,
                opacity: 0.85,
                border_width: 2,
                uncertainty_level: UncertaintyLevel::Medium,
            }
        } else if confidence >= 0.4 {
            Self {
                line_style: LineStyle::Dashed,
                opacity: 0.7,
                border_width: 1,
                uncertainty_level: UncertaintyLevel::High,
            }
        } else {
            Self {
                line_style: LineStyle::Dotted,
                opacity: 0.5,
                border_width: 1,
                uncertainty_level: UncertaintyLevel::VeryHigh,
            }
        }
    }
}

/// Role-relevant optional features of a node, never an untyped bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    /// Cadence closing the node's span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
    /// Period classification (period nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_type: Option<PeriodType>,
    /// Phrase-length proportion (period nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proportion: Option<Proportion>,
    /// Open or closed ending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closure: Option<Closure>,
    /// Formal function (section and theme nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<SectionFunction>,
    /// Middle-section kind (ternary middles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_type: Option<MiddleSectionType>,
    /// Overall form (root node)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<FormType>,
    /// Relationship to the preceding sibling (phrase nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<PhraseRelationship>,
    /// Melodic direction (motive nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contour: Option<Contour>,
}

/// Tooltip payload shown for a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipData {
    /// Node kind as displayed
    pub node_type: String,
    /// Features that drove the detection, per node type
    pub used_features: Vec<String>,
    /// Similarity score backing the material label, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Free-form detection details
    pub details: Vec<String>,
    /// Analysis model version
    pub model_version: String,
}

/// Index of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One node of the structure tree
#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
    /// Stable string id ("node-0", "node-1", ...)
    pub id: String,
    /// Node kind
    pub node_type: StructureType,
    /// First measure covered
    pub start_measure: u32,
    /// Last measure covered
    pub end_measure: u32,
    /// Parent arena index, `None` for the root
    pub parent: Option<NodeId>,
    /// Child arena indices in score order
    pub children: Vec<NodeId>,
    /// Material label
    pub material: String,
    /// Final confidence after propagation
    pub confidence: f64,
    /// Raw detector confidence before propagation
    pub detect_confidence: f64,
    /// Role-relevant features
    pub features: Features,
    /// Rendering hints
    pub visual_style: VisualStyle,
    /// Tooltip payload
    pub tooltip: TooltipData,
}

/// Arena-backed structure tree
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTree {
    nodes: Vec<StructureNode>,
    root: NodeId,
}

impl StructureTree {
    /// Create a tree from its arena; the first node is the root
    pub(crate) fn from_arena(nodes: Vec<StructureNode>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    /// Root node index
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node
    pub fn get(&self, id: NodeId) -> Option<&StructureNode> {
        self.nodes.get(id.0)
    }

    /// Mutably borrow a node
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut StructureNode> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &StructureNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Find a node by its string id
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id == id).map(NodeId)
    }

    /// Children of a node in score order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| &n.children)
    }

    /// Materials of the node's siblings, excluding the node itself
    pub fn sibling_materials(&self, id: NodeId) -> Vec<String> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let Some(parent) = node.parent.and_then(|p| self.get(p)) else {
            return Vec::new();
        };
        parent
            .children
            .iter()
            .filter(|&&child| child != id)
            .filter_map(|&child| self.get(child))
            .map(|sibling| sibling.material.clone())
            .collect()
    }

    /// Tooltips of every node keyed by string id
    pub fn tooltip_map(&self) -> BTreeMap<String, TooltipData> {
        self.nodes.iter().map(|n| (n.id.clone(), n.tooltip.clone())).collect()
    }

    /// The deepest node whose span contains the measure, preferring leaves
    pub fn node_at_measure(&self, measure: u32) -> Option<NodeId> {
        let mut current = self.root;
        if self
            .get(current)
            .map_or(true, |n| measure < n.start_measure || measure > n.end_measure)
        {
            return None;
        }
        loop {
            let node = self.get(current)?;
            let next = node.children.iter().copied().find(|&child| {
                self.get(child).map_or(false, |c| {
                    c.start_measure <= measure && measure <= c.end_measure
                })
            });
            match next {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }
}

/// Flat node form used by the persisted-state layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// Node kind
    #[serde(rename = "type")]
    pub node_type: StructureType,
    /// First measure covered
    pub start_measure: u32,
    /// Last measure covered
    pub end_measure: u32,
    /// Parent string id, `None` for the root
    pub parent: Option<String>,
    /// Child string ids in score order
    pub children: Vec<String>,
    /// Material label
    pub material: String,
    /// Final confidence
    pub confidence: f64,
    /// Raw detector confidence
    pub detect_confidence: f64,
    /// Role-relevant features
    pub features: Features,
    /// Rendering hints
    pub visual_style: VisualStyle,
    /// Tooltip payload
    pub tooltip_data: TooltipData,
}

/// Flat tree form used by the persisted-state layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTree {
    /// Root node id
    pub root: String,
    /// All nodes keyed by string id, deterministically ordered
    pub nodes: BTreeMap<String, SerializedNode>,
}

impl StructureTree {
    /// Flatten into the id-keyed serialized form
    pub fn to_serialized(&self) -> SerializedTree {
        let id_of = |node: Option<NodeId>| -> Option<String> {
            node.and_then(|n| self.get(n)).map(|n| n.id.clone())
        };
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    SerializedNode {
                        node_type: node.node_type,
                        start_measure: node.start_measure,
                        end_measure: node.end_measure,
                        parent: id_of(node.parent),
                        children: node
                            .children
                            .iter()
                            .filter_map(|&c| self.get(c))
                            .map(|c| c.id.clone())
                            .collect(),
                        material: node.material.clone(),
                        confidence: node.confidence,
                        detect_confidence: node.detect_confidence,
                        features: node.features.clone(),
                        visual_style: node.visual_style,
                        tooltip_data: node.tooltip.clone(),
                    },
                )
            })
            .collect();
        SerializedTree { root: self.get(self.root).map_or_else(String::new, |n| n.id.clone()), nodes }
    }

    /// Rebuild from the serialized form in two passes: create every node,
    /// then link parents and children by id
    pub fn from_serialized(serialized: &SerializedTree) -> Result<Self, String> {
        // Pass 1: create all nodes unlinked, in deterministic id order
        let ids: Vec<&String> = serialized.nodes.keys().collect();
        let index_of: BTreeMap<&str, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        let mut nodes: Vec<StructureNode> = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(entry) = serialized.nodes.get(*id) else {
                return Err(format!("node '{}' missing from serialized map", id));
            };
            nodes.push(StructureNode {
                id: (*id).clone(),
                node_type: entry.node_type,
                start_measure: entry.start_measure,
                end_measure: entry.end_measure,
                parent: None,
                children: Vec::new(),
                material: entry.material.clone(),
                confidence: entry.confidence,
                detect_confidence: entry.detect_confidence,
                features: entry.features.clone(),
                visual_style: entry.visual_style,
                tooltip: entry.tooltip_data.clone(),
            });
        }
        // Pass 2: link by id
        for (i, id) in ids.iter().enumerate() {
            let Some(entry) = serialized.nodes.get(*id) else {
                return Err(format!("node '{}' missing from serialized map", id));
            };
            if let Some(parent_id) = &entry.parent {
                let Some(&parent_index) = index_of.get(parent_id.as_str()) else {
                    return Err(format!("unknown parent id '{}'", parent_id));
                };
                nodes[i].parent = Some(NodeId(parent_index));
            }
            let mut children = Vec::with_capacity(entry.children.len());
            for child_id in &entry.children {
                let Some(&child_index) = index_of.get(child_id.as_str()) else {
                    return Err(format!("unknown child id '{}'", child_id));
                };
                children.push(NodeId(child_index));
            }
            nodes[i].children = children;
        }
        let Some(&root_index) = index_of.get(serialized.root.as_str()) else {
            return Err(format!("unknown root id '{}'", serialized.root));
        };
        Ok(Self { nodes, root: NodeId(root_index) })
    }
}

impl Serialize for StructureTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let serialized = self.to_serialized();
        let mut state = serializer.serialize_struct("StructureTree", 2)?;
        state.serialize_field("root", &serialized.root)?;
        state.serialize_field("nodes", &serialized.nodes)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for StructureTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let serialized = SerializedTree::deserialize(deserializer)?;
        StructureTree::from_serialized(&serialized).map_err(serde::de::Error::custom)
    }
}
