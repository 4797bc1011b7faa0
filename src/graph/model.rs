//! Canonical node/edge model.
//!
//! Every data source is normalized into these types before layout. The model
//! holds no simulation state: positions and velocities live in the layout
//! engine's arena, indexed by the node's position in [`GraphModel::nodes`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

/// Kind of a knowledge-graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
	Subject,
	Chapter,
	KnowledgePoint,
	SubKnowledgePoint,
	AiContent,
}

impl NodeType {
	pub const ALL: [NodeType; 5] = [
		NodeType::Subject,
		NodeType::Chapter,
		NodeType::KnowledgePoint,
		NodeType::SubKnowledgePoint,
		NodeType::AiContent,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			NodeType::Subject => "subject",
			NodeType::Chapter => "chapter",
			NodeType::KnowledgePoint => "knowledge_point",
			NodeType::SubKnowledgePoint => "sub_knowledge_point",
			NodeType::AiContent => "ai_content",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL
			.into_iter()
			.find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
	}

	pub fn label(&self) -> &'static str {
		match self {
			NodeType::Subject => "Subject",
			NodeType::Chapter => "Chapter",
			NodeType::KnowledgePoint => "Knowledge point",
			NodeType::SubKnowledgePoint => "Sub knowledge point",
			NodeType::AiContent => "AI content",
		}
	}

	/// Hierarchy depth used when a source omits `level`.
	pub fn default_level(&self) -> u32 {
		match self {
			NodeType::Subject => 0,
			NodeType::Chapter | NodeType::AiContent => 1,
			NodeType::KnowledgePoint => 2,
			NodeType::SubKnowledgePoint => 3,
		}
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
	Hierarchy,
	Relation,
	Semantic,
}

impl EdgeType {
	pub fn as_str(&self) -> &'static str {
		match self {
			EdgeType::Hierarchy => "hierarchy",
			EdgeType::Relation => "relation",
			EdgeType::Semantic => "semantic",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"hierarchy" | "parent" | "contains" => Some(EdgeType::Hierarchy),
			"relation" | "related" => Some(EdgeType::Relation),
			"semantic" => Some(EdgeType::Semantic),
			_ => None,
		}
	}
}

/// Graph type filter. `All` merges every category into one namespaced view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphCategory {
	#[default]
	All,
	AiAssistant,
	ExamScope,
	FullKnowledge,
	MasteryLevel,
}

impl GraphCategory {
	pub const ALL: [GraphCategory; 5] = [
		GraphCategory::All,
		GraphCategory::AiAssistant,
		GraphCategory::ExamScope,
		GraphCategory::FullKnowledge,
		GraphCategory::MasteryLevel,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			GraphCategory::All => "all",
			GraphCategory::AiAssistant => "ai_assistant",
			GraphCategory::ExamScope => "exam_scope",
			GraphCategory::FullKnowledge => "full_knowledge",
			GraphCategory::MasteryLevel => "mastery_level",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|c| c.as_str() == value.trim())
	}

	pub fn label(&self) -> &'static str {
		match self {
			GraphCategory::All => "All types",
			GraphCategory::AiAssistant => "AI assistant",
			GraphCategory::ExamScope => "Exam scope",
			GraphCategory::FullKnowledge => "Full knowledge",
			GraphCategory::MasteryLevel => "Mastery level",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub name: String,
	pub node_type: NodeType,
	pub level: u32,
	pub content: Option<String>,
	/// Unique, first-seen order. Compare with [`GraphNode::has_same_tags`].
	pub tags: Vec<String>,
	pub difficulty: Option<f64>,
	pub importance: Option<f64>,
	pub mastery_level: Option<f64>,
	pub question_count: u32,
	pub subject_id: Option<String>,
	pub subject_name: Option<String>,
	pub created_at: Option<String>,
	/// Backend id of the document this node came from; `id` may be namespaced.
	pub record_id: Option<String>,
	pub category: GraphCategory,
}

impl GraphNode {
	pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			node_type,
			level: node_type.default_level(),
			content: None,
			tags: Vec::new(),
			difficulty: None,
			importance: None,
			mastery_level: None,
			question_count: 0,
			subject_id: None,
			subject_name: None,
			created_at: None,
			record_id: None,
			category: GraphCategory::All,
		}
	}

	pub fn with_level(mut self, level: u32) -> Self {
		self.level = level;
		self
	}

	pub fn with_content(mut self, content: impl Into<String>) -> Self {
		self.content = Some(content.into());
		self
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.tags = normalize_tags(tags);
		self
	}

	pub fn with_subject(mut self, id: impl Into<String>, name: Option<String>) -> Self {
		self.subject_id = Some(id.into());
		self.subject_name = name;
		self
	}

	pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
		self.record_id = Some(record_id.into());
		self
	}

	/// Only AI-generated content is writable through the collaborator API.
	pub fn is_editable(&self) -> bool {
		self.node_type == NodeType::AiContent
	}

	pub fn content_len(&self) -> usize {
		self.content.as_deref().map_or(0, |c| c.chars().count())
	}

	pub fn has_same_tags(&self, other: &GraphNode) -> bool {
		let mine: HashSet<&str> = self.tags.iter().map(String::as_str).collect();
		let theirs: HashSet<&str> = other.tags.iter().map(String::as_str).collect();
		mine == theirs
	}
}

/// Trims, drops blanks and collapses duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	tags.into_iter()
		.map(|t| t.as_ref().trim().to_string())
		.filter(|t| !t.is_empty() && seen.insert(t.clone()))
		.collect()
}

pub fn clamp_score(value: f64) -> f64 {
	if value.is_nan() {
		0.0
	} else {
		value.clamp(0.0, 100.0)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	pub edge_type: EdgeType,
	pub strength: f64,
	pub label: Option<String>,
}

impl GraphEdge {
	pub fn new(source: impl Into<String>, target: impl Into<String>, edge_type: EdgeType) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			edge_type,
			strength: 1.0,
			label: None,
		}
	}

	/// Non-positive and non-finite strengths fall back to 1.0.
	pub fn with_strength(mut self, strength: f64) -> Self {
		self.strength = if strength.is_finite() && strength > 0.0 {
			strength
		} else {
			1.0
		};
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// A normalized graph. Construct through [`GraphModel::from_parts`], which
/// enforces id uniqueness and edge resolvability.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<String, usize>,
}

impl GraphModel {
	pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
		let mut index = HashMap::with_capacity(nodes.len());
		let mut kept = Vec::with_capacity(nodes.len());
		for node in nodes {
			if index.contains_key(&node.id) {
				debug!("dropping duplicate node id {}", node.id);
				continue;
			}
			index.insert(node.id.clone(), kept.len());
			kept.push(node);
		}

		let edges = edges
			.into_iter()
			.filter(|edge| {
				let resolvable =
					index.contains_key(&edge.source) && index.contains_key(&edge.target);
				if !resolvable {
					debug!("dropping dangling edge {} -> {}", edge.source, edge.target);
				} else if edge.source == edge.target {
					debug!("dropping self loop on {}", edge.source);
					return false;
				}
				resolvable
			})
			.collect();

		Self {
			nodes: kept,
			edges,
			index,
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index_of(id).map(|idx| &self.nodes[idx])
	}

	/// Edges as `(source_idx, target_idx, edge)`. Always resolvable by construction.
	pub fn indexed_edges(&self) -> impl Iterator<Item = (usize, usize, &GraphEdge)> {
		self.edges
			.iter()
			.filter_map(|e| Some((self.index_of(&e.source)?, self.index_of(&e.target)?, e)))
	}

	pub fn neighbors(&self, idx: usize) -> HashSet<usize> {
		self.indexed_edges()
			.filter_map(|(s, t, _)| {
				if s == idx {
					Some(t)
				} else if t == idx {
					Some(s)
				} else {
					None
				}
			})
			.collect()
	}

	pub fn edges_of_type(&self, edge_type: EdgeType) -> impl Iterator<Item = &GraphEdge> {
		self.edges.iter().filter(move |e| e.edge_type == edge_type)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kp(id: &str) -> GraphNode {
		GraphNode::new(id, id.to_uppercase(), NodeType::KnowledgePoint)
	}

	#[test]
	fn test_dangling_edges_dropped() {
		let model = GraphModel::from_parts(
			vec![kp("a"), kp("b")],
			vec![
				GraphEdge::new("a", "b", EdgeType::Relation),
				GraphEdge::new("a", "missing", EdgeType::Relation),
				GraphEdge::new("ghost", "b", EdgeType::Hierarchy),
			],
		);
		assert_eq!(model.edges().len(), 1);
		assert_eq!(model.edges()[0].target, "b");
	}

	#[test]
	fn test_duplicate_ids_keep_first() {
		let first = kp("a").with_content("first");
		let second = kp("a").with_content("second");
		let model = GraphModel::from_parts(vec![first, second], vec![]);
		assert_eq!(model.len(), 1);
		assert_eq!(model.node("a").and_then(|n| n.content.as_deref()), Some("first"));
	}

	#[test]
	fn test_self_loops_dropped() {
		let model =
			GraphModel::from_parts(vec![kp("a")], vec![GraphEdge::new("a", "a", EdgeType::Relation)]);
		assert!(model.edges().is_empty());
	}

	#[test]
	fn test_normalize_tags() {
		let tags = normalize_tags([" algebra", "", "geometry", "algebra ", "  "]);
		assert_eq!(tags, vec!["algebra".to_string(), "geometry".to_string()]);
	}

	#[test]
	fn test_edge_strength_fallback() {
		assert_eq!(GraphEdge::new("a", "b", EdgeType::Relation).with_strength(-2.0).strength, 1.0);
		assert_eq!(GraphEdge::new("a", "b", EdgeType::Relation).with_strength(f64::NAN).strength, 1.0);
		assert_eq!(GraphEdge::new("a", "b", EdgeType::Relation).with_strength(0.5).strength, 0.5);
	}

	#[test]
	fn test_neighbors() {
		let model = GraphModel::from_parts(
			vec![kp("a"), kp("b"), kp("c")],
			vec![
				GraphEdge::new("a", "b", EdgeType::Relation),
				GraphEdge::new("c", "a", EdgeType::Hierarchy),
			],
		);
		let neighbors = model.neighbors(0);
		assert!(neighbors.contains(&1));
		assert!(neighbors.contains(&2));
		assert_eq!(neighbors.len(), 2);
	}

	#[test]
	fn test_type_parsing() {
		assert_eq!(NodeType::parse("ai_content"), Some(NodeType::AiContent));
		assert_eq!(NodeType::parse("Chapter"), Some(NodeType::Chapter));
		assert_eq!(NodeType::parse("unknown"), None);
		assert_eq!(EdgeType::parse("HIERARCHY"), Some(EdgeType::Hierarchy));
		assert_eq!(GraphCategory::parse("exam_scope"), Some(GraphCategory::ExamScope));
	}
}
