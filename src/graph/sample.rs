//! Bundled illustrative star map, shown when the backend is unreachable so
//! the layout code stays exercisable offline.

use super::model::{EdgeType, GraphCategory, GraphEdge, GraphModel, GraphNode, NodeType};

const CHAPTERS: &[(&str, &[&str])] = &[
	("Functions", &["Domain and range", "Monotonicity", "Parity", "Periodicity"]),
	("Sequences", &["Arithmetic sequences", "Geometric sequences", "Summation"]),
	("Derivatives", &["Limits", "Differentiation rules", "Extrema", "Tangent lines"]),
	("Probability", &["Classical model", "Conditional probability", "Distributions"]),
	("Solid geometry", &["Spatial vectors", "Volumes", "Projections"]),
];

const RELATIONS: &[(&str, &str)] = &[
	("Limits", "Summation"),
	("Differentiation rules", "Monotonicity"),
	("Extrema", "Domain and range"),
	("Spatial vectors", "Tangent lines"),
	("Distributions", "Geometric sequences"),
];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn kp_id(name: &str) -> String {
	format!("kp_{}", name.to_lowercase().replace(' ', "_"))
}

pub fn illustrative_graph() -> GraphModel {
	let subject = GraphNode::new("subject_demo", "Mathematics", NodeType::Subject)
		.with_subject("demo", Some("Mathematics".into()));
	let mut nodes = vec![subject];
	let mut edges = Vec::new();
	let mut seed = 0;

	for (c, (chapter, points)) in CHAPTERS.iter().enumerate() {
		let chapter_id = format!("chapter_{}", c);
		nodes.push(GraphNode::new(chapter_id.clone(), *chapter, NodeType::Chapter));
		edges.push(GraphEdge::new("subject_demo", chapter_id.clone(), EdgeType::Hierarchy));

		for point in points.iter() {
			seed += 1;
			let mut node = GraphNode::new(kp_id(point), *point, NodeType::KnowledgePoint);
			node.difficulty = Some((rand_simple(seed) * 100.0).round());
			node.importance = Some((rand_simple(seed * 7) * 100.0).round());
			node.question_count = (rand_simple(seed * 13) * 20.0) as u32;
			nodes.push(node);
			edges.push(GraphEdge::new(chapter_id.clone(), kp_id(point), EdgeType::Hierarchy));
		}
	}

	for (a, b) in RELATIONS {
		edges.push(GraphEdge::new(kp_id(a), kp_id(b), EdgeType::Relation).with_strength(0.6));
	}

	for node in &mut nodes {
		node.category = GraphCategory::FullKnowledge;
	}
	GraphModel::from_parts(nodes, edges)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_illustrative_graph_is_a_single_rooted_tree_plus_relations() {
		let model = illustrative_graph();
		let points: usize = CHAPTERS.iter().map(|(_, p)| p.len()).sum();
		assert_eq!(model.len(), 1 + CHAPTERS.len() + points);
		assert_eq!(model.edges_of_type(EdgeType::Hierarchy).count(), CHAPTERS.len() + points);
		assert_eq!(model.edges_of_type(EdgeType::Relation).count(), RELATIONS.len());
	}
}
