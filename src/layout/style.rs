//! Visual encoding of nodes: color by type, radius by type, content and tags.
//!
//! The radius is also what the collision force uses, so the size encoding
//! directly shapes the layout.

use crate::graph::{EdgeType, GraphNode, NodeType};

const CONTENT_CHARS_PER_UNIT: f64 = 50.0;
const CONTENT_BONUS_CAP: f64 = 8.0;
const TAG_BONUS_PER_TAG: f64 = 1.5;
const TAG_BONUS_CAP: f64 = 6.0;

pub fn node_color(node_type: NodeType) -> &'static str {
	match node_type {
		NodeType::Subject => "#ff7f0e",
		NodeType::Chapter => "#1f77b4",
		NodeType::KnowledgePoint => "#2ca02c",
		NodeType::SubKnowledgePoint => "#17becf",
		NodeType::AiContent => "#9467bd",
	}
}

pub fn base_radius(node_type: NodeType) -> f64 {
	match node_type {
		NodeType::Subject => 22.0,
		NodeType::Chapter => 16.0,
		NodeType::KnowledgePoint => 11.0,
		NodeType::SubKnowledgePoint => 8.0,
		NodeType::AiContent => 12.0,
	}
}

pub fn node_radius(node: &GraphNode) -> f64 {
	let content = (node.content_len() as f64 / CONTENT_CHARS_PER_UNIT).min(CONTENT_BONUS_CAP);
	let tags = (node.tags.len() as f64 * TAG_BONUS_PER_TAG).min(TAG_BONUS_CAP);
	base_radius(node.node_type) + content + tags
}

pub fn edge_color(edge_type: EdgeType) -> &'static str {
	match edge_type {
		EdgeType::Hierarchy => "rgba(100, 180, 255, 0.7)",
		EdgeType::Relation => "rgba(180, 180, 180, 0.6)",
		EdgeType::Semantic => "rgba(214, 39, 40, 0.5)",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_colors_are_distinct_per_type() {
		let mut colors: Vec<_> = NodeType::ALL.iter().map(|t| node_color(*t)).collect();
		colors.sort();
		colors.dedup();
		assert_eq!(colors.len(), NodeType::ALL.len());
	}

	#[test]
	fn test_radius_grows_with_content_and_tags_but_is_capped() {
		let bare = GraphNode::new("a", "A", NodeType::AiContent);
		let rich = bare.clone().with_content("x".repeat(200)).with_tags(["a", "b"]);
		let huge = bare
			.clone()
			.with_content("x".repeat(100_000))
			.with_tags((0..50).map(|i| i.to_string()));

		assert!(node_radius(&rich) > node_radius(&bare));
		assert!(node_radius(&huge) >= node_radius(&rich));
		assert_eq!(
			node_radius(&huge),
			base_radius(NodeType::AiContent) + CONTENT_BONUS_CAP + TAG_BONUS_CAP
		);
	}
}
