//! Normalizes raw source documents into a [`GraphModel`].
//!
//! Two shapes are understood: AI-assistant content records (one record per
//! generated item, grouped under synthetic subject nodes) and traditional
//! graph documents carrying their own `nodes`/`edges` arrays. Malformed input
//! is skipped and logged; this module never fails.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};
use serde_json::Value;

use super::model::{
	EdgeType, GraphCategory, GraphEdge, GraphModel, GraphNode, NodeType, clamp_score,
	normalize_tags,
};
use super::raw::{AiContentRecord, RawEdge, RawNode, Subject, TraditionalDocument};

pub const SEMANTIC_EDGE_STRENGTH: f64 = 0.5;
pub const UNASSIGNED_SUBJECT: &str = "unassigned";
const TITLE_FALLBACK_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
	/// Category the caller asked for. `All` turns on id namespacing.
	pub category: GraphCategory,
}

impl NormalizeOptions {
	pub fn new(category: GraphCategory) -> Self {
		Self { category }
	}

	fn namespaced(&self, doc_category: GraphCategory, id: &str) -> String {
		if self.category == GraphCategory::All {
			format!("{}:{}", doc_category.as_str(), id)
		} else {
			id.to_string()
		}
	}
}

enum SourceShape {
	AiContent,
	Traditional(GraphCategory),
}

fn classify(source: &Value, requested: GraphCategory) -> Option<SourceShape> {
	let object = source.as_object()?;
	let declared = object
		.get("graph_type")
		.and_then(Value::as_str)
		.and_then(GraphCategory::parse);
	Some(match declared {
		Some(GraphCategory::AiAssistant) => SourceShape::AiContent,
		Some(category) => SourceShape::Traditional(category),
		None if requested == GraphCategory::AiAssistant => SourceShape::AiContent,
		None if requested == GraphCategory::All && !object.contains_key("edges") => {
			SourceShape::AiContent
		}
		None => SourceShape::Traditional(requested),
	})
}

/// Builds the canonical graph from every source document.
pub fn normalize(sources: &[Value], subjects: &[Subject], options: &NormalizeOptions) -> GraphModel {
	let directory: HashMap<&str, &str> = subjects
		.iter()
		.map(|s| (s.id.as_str(), s.name.as_str()))
		.collect();

	let mut records = Vec::new();
	let mut nodes = Vec::new();
	let mut edges = Vec::new();

	for (i, source) in sources.iter().enumerate() {
		match classify(source, options.category) {
			Some(SourceShape::AiContent) => {
				match serde_json::from_value::<AiContentRecord>(source.clone()) {
					Ok(record) => records.push(record),
					Err(e) => warn!("skipping malformed AI content record #{}: {}", i, e),
				}
			}
			Some(SourceShape::Traditional(category)) => {
				match serde_json::from_value::<TraditionalDocument>(source.clone()) {
					Ok(doc) => {
						traditional_graph(&doc, category, &directory, options, &mut nodes, &mut edges)
					}
					Err(e) => warn!("skipping malformed graph document #{}: {}", i, e),
				}
			}
			None => warn!("skipping graph source #{}: not an object", i),
		}
	}

	let (ai_nodes, ai_edges) = ai_content_graph(&records, &directory, options);
	nodes.extend(ai_nodes);
	edges.extend(ai_edges);

	GraphModel::from_parts(nodes, edges)
}

/// Tag precedence for one record: explicit list, nested node with the derived
/// id, first nested node, then nothing.
pub fn extract_tags(record: &AiContentRecord) -> Vec<String> {
	if let Some(tags) = &record.tags {
		return normalize_tags(tags);
	}
	let derived = content_node_id(&record.id);
	record
		.nodes
		.iter()
		.find(|n| n.id.as_deref() == Some(derived.as_str()))
		.or_else(|| record.nodes.first())
		.map(|n| normalize_tags(&n.tags))
		.unwrap_or_default()
}

pub fn content_node_id(record_id: &str) -> String {
	format!("ai_{}", record_id)
}

pub fn subject_node_id(subject_id: &str) -> String {
	format!("subject_{}", subject_id)
}

fn content_title(record: &AiContentRecord) -> String {
	if let Some(title) = record.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
		return title.to_string();
	}
	match record.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
		Some(content) => content.chars().take(TITLE_FALLBACK_CHARS).collect(),
		None => format!("Content {}", record.id),
	}
}

fn ai_content_graph(
	records: &[AiContentRecord],
	directory: &HashMap<&str, &str>,
	options: &NormalizeOptions,
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
	let category = GraphCategory::AiAssistant;
	let mut nodes = Vec::new();
	let mut edges = Vec::new();
	let mut subject_nodes: HashMap<String, String> = HashMap::new();
	let mut emitted: HashSet<String> = HashSet::new();

	for record in records {
		let id = options.namespaced(category, &content_node_id(&record.id));
		if !emitted.insert(id.clone()) {
			warn!("skipping AI content record {}: id already seen", record.id);
			continue;
		}
		let subject_id = record
			.subject_id
			.clone()
			.unwrap_or_else(|| UNASSIGNED_SUBJECT.to_string());
		let subject_name = directory
			.get(subject_id.as_str())
			.map(|s| s.to_string())
			.or_else(|| record.subject_name.clone())
			.unwrap_or_else(|| format!("Subject {}", subject_id));

		let subject_node = match subject_nodes.get(&subject_id) {
			Some(id) => id.clone(),
			None => {
				let id = options.namespaced(category, &subject_node_id(&subject_id));
				let mut node = GraphNode::new(id.clone(), subject_name.clone(), NodeType::Subject)
					.with_subject(subject_id.clone(), Some(subject_name.clone()));
				node.category = category;
				nodes.push(node);
				subject_nodes.insert(subject_id.clone(), id.clone());
				id
			}
		};

		let mut node = GraphNode::new(id.clone(), content_title(record), NodeType::AiContent)
			.with_subject(subject_id, Some(subject_name))
			.with_record(record.id.clone());
		node.content = record.content.clone();
		node.tags = extract_tags(record);
		node.created_at = record.created_at.clone();
		node.category = category;
		nodes.push(node);

		edges.push(GraphEdge::new(subject_node, id, EdgeType::Hierarchy));
	}

	edges.extend(semantic_edges(&nodes));
	(nodes, edges)
}

/// One edge per unordered pair of distinct `ai_content` node ids sharing a
/// tag, per tag.
pub fn semantic_edges(nodes: &[GraphNode]) -> Vec<GraphEdge> {
	let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
	for node in nodes.iter().filter(|n| n.node_type == NodeType::AiContent) {
		for tag in &node.tags {
			let members = groups.entry(tag.as_str()).or_default();
			if !members.contains(&node.id.as_str()) {
				members.push(node.id.as_str());
			}
		}
	}

	let mut edges = Vec::new();
	for (tag, members) in groups.iter().filter(|(_, m)| m.len() >= 2) {
		for (i, source) in members.iter().enumerate() {
			for target in &members[i + 1..] {
				edges.push(
					GraphEdge::new(*source, *target, EdgeType::Semantic)
						.with_strength(SEMANTIC_EDGE_STRENGTH)
						.with_label(*tag),
				);
			}
		}
	}
	edges
}

fn traditional_graph(
	doc: &TraditionalDocument,
	category: GraphCategory,
	directory: &HashMap<&str, &str>,
	options: &NormalizeOptions,
	nodes: &mut Vec<GraphNode>,
	edges: &mut Vec<GraphEdge>,
) {
	for raw in &doc.nodes {
		nodes.push(traditional_node(raw, doc, category, directory, options));
	}
	for raw in &doc.edges {
		match traditional_edge(raw, category, options) {
			Some(edge) => edges.push(edge),
			None => debug!(
				"skipping edge without endpoints in document {}",
				doc.id.as_deref().unwrap_or("?")
			),
		}
	}
}

fn traditional_node(
	raw: &RawNode,
	doc: &TraditionalDocument,
	category: GraphCategory,
	directory: &HashMap<&str, &str>,
	options: &NormalizeOptions,
) -> GraphNode {
	let node_type = raw
		.node_type
		.as_deref()
		.and_then(NodeType::parse)
		.unwrap_or(NodeType::KnowledgePoint);
	let mut node = GraphNode::new(
		options.namespaced(category, &raw.id),
		raw.display_name(),
		node_type,
	);
	node.level = raw.level.unwrap_or_else(|| node_type.default_level());
	node.content = raw.content.clone();
	node.tags = raw.tags.as_deref().map(normalize_tags).unwrap_or_default();
	node.difficulty = raw.difficulty.map(clamp_score);
	node.importance = raw.importance.map(clamp_score);
	node.mastery_level = raw.mastery_level.map(clamp_score);
	node.question_count = raw.question_count.unwrap_or(0);
	node.subject_id = raw.subject_id.clone().or_else(|| doc.subject_id.clone());
	node.subject_name = node
		.subject_id
		.as_deref()
		.and_then(|id| directory.get(id))
		.map(|s| s.to_string())
		.or_else(|| doc.subject_name.clone());
	node.created_at = raw.created_at.clone();
	node.record_id = doc.id.clone();
	node.category = category;
	node
}

fn traditional_edge(
	raw: &RawEdge,
	category: GraphCategory,
	options: &NormalizeOptions,
) -> Option<GraphEdge> {
	let (source, target) = raw.endpoints()?;
	let edge_type = raw
		.edge_type
		.as_deref()
		.and_then(EdgeType::parse)
		.unwrap_or(EdgeType::Relation);
	let mut edge = GraphEdge::new(
		options.namespaced(category, source),
		options.namespaced(category, target),
		edge_type,
	)
	.with_strength(raw.resolved_strength().unwrap_or(1.0));
	edge.label = raw.label.clone();
	Some(edge)
}

/// Serializes a model back into the traditional document shape.
pub fn to_document(model: &GraphModel) -> TraditionalDocument {
	TraditionalDocument {
		nodes: model
			.nodes()
			.iter()
			.map(|n| RawNode {
				id: n.id.clone(),
				name: Some(n.name.clone()),
				node_type: Some(n.node_type.as_str().to_string()),
				level: Some(n.level),
				content: n.content.clone(),
				tags: Some(n.tags.clone()),
				difficulty: n.difficulty,
				importance: n.importance,
				mastery_level: n.mastery_level,
				question_count: Some(n.question_count),
				subject_id: n.subject_id.clone(),
				created_at: n.created_at.clone(),
				..RawNode::default()
			})
			.collect(),
		edges: model
			.edges()
			.iter()
			.map(|e| RawEdge {
				source: Some(e.source.clone()),
				target: Some(e.target.clone()),
				edge_type: Some(e.edge_type.as_str().to_string()),
				strength: Some(e.strength),
				label: e.label.clone(),
				..RawEdge::default()
			})
			.collect(),
		..TraditionalDocument::default()
	}
}
