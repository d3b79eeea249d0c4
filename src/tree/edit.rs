//! User edits to the structure tree
//!
//! Boundary, type, and material edits never re-run detection; each edit
//! decrements the node's confidence by a fixed step, floored at 0.5, and
//! refreshes the visual style so uncertainty display stays monotone.

use crate::tree::{NodeId, StructureTree, StructureType, VisualStyle};

/// Confidence lost per user edit
const EDIT_PENALTY: f64 = 0.1;
/// Confidence never drops below this through edits
const EDIT_FLOOR: f64 = 0.5;

/// Apply the edit penalty and refresh the style
fn note_edited(tree: &mut StructureTree, id: NodeId) {
    if let Some(node) = tree.get_mut(id) {
        node.confidence = (node.confidence - EDIT_PENALTY).max(EDIT_FLOOR);
        node.visual_style = VisualStyle::for_confidence(node.confidence);
    }
}

/// Move a node's measure boundaries
///
/// Returns false when the node does not exist or the range is inverted.
pub fn update_boundaries(
    tree: &mut StructureTree,
    id: NodeId,
    start_measure: u32,
    end_measure: u32,
) -> bool {
    if start_measure > end_measure {
        return false;
    }
    let Some(node) = tree.get_mut(id) else {
        return false;
    };
    node.start_measure = start_measure;
    node.end_measure = end_measure;
    note_edited(tree, id);
    true
}

/// Change a node's structural type
pub fn update_type(tree: &mut StructureTree, id: NodeId, node_type: StructureType) -> bool {
    let Some(node) = tree.get_mut(id) else {
        return false;
    };
    node.node_type = node_type;
    node.tooltip.node_type = node_type.as_str().to_string();
    note_edited(tree, id);
    true
}

/// Change a node's material label; idempotent on the label itself
pub fn update_material(tree: &mut StructureTree, id: NodeId, material: &str) -> bool {
    let Some(node) = tree.get_mut(id) else {
        return false;
    };
    node.material = material.to_string();
    note_edited(tree, id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{
        Features, StructureNode, TooltipData, UncertaintyLevel, MODEL_VERSION,
    };

    fn single_node_tree(confidence: f64) -> StructureTree {
        let node = StructureNode {
            id: "node-0000".to_string(),
            node_type: StructureType::Phrase,
            start_measure: 1,
            end_measure: 4,
            parent: None,
            children: Vec::new(),
            material: "a".to_string(),
            confidence,
            detect_confidence: confidence,
            features: Features::default(),
            visual_style: VisualStyle::for_confidence(confidence),
            tooltip: TooltipData {
                node_type: "phrase".to_string(),
                used_features: Vec::new(),
                similarity: None,
                details: Vec::new(),
                model_version: MODEL_VERSION.to_string(),
            },
        };
        StructureTree::from_arena(vec![node], NodeId(0))
    }

    #[test]
    fn edits_decrement_confidence_by_a_tenth() {
        let mut tree = single_node_tree(0.9);
        assert!(update_material(&mut tree, NodeId(0), "b"));
        let node = tree.get(NodeId(0)).expect("node");
        assert!((node.confidence - 0.8).abs() < 1e-9);
        assert_eq!(node.material, "b");
    }

    #[test]
    fn confidence_never_drops_below_the_floor() {
        let mut tree = single_node_tree(0.55);
        assert!(update_type(&mut tree, NodeId(0), StructureType::Period));
        assert!(update_material(&mut tree, NodeId(0), "c"));
        let node = tree.get(NodeId(0)).expect("node");
        assert!((node.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn uncertainty_display_is_monotone_under_edits() {
        let mut tree = single_node_tree(0.85);
        let before = tree.get(NodeId(0)).expect("node").visual_style;
        update_boundaries(&mut tree, NodeId(0), 1, 5);
        let after = tree.get(NodeId(0)).expect("node").visual_style;
        assert!(after.uncertainty_level >= before.uncertainty_level);
        assert!(after.opacity <= before.opacity);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut tree = single_node_tree(0.9);
        assert!(!update_boundaries(&mut tree, NodeId(0), 6, 2));
        let node = tree.get(NodeId(0)).expect("node");
        assert!((node.confidence - 0.9).abs() < 1e-9);
    }
}
