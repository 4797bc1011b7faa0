//! Wire shapes accepted by the source adapter.
//!
//! Backends disagree on id types and field names, so these structs are
//! deliberately loose: ids may be strings or integers, and aliases such as
//! `label`/`name` or `from`/`source` are resolved by the adapter rather than
//! by serde (both may appear in one record). Descriptive fields of the wrong
//! type read as absent, and an unreadable element of a `nodes`/`edges` array
//! is dropped on its own without failing the document around it.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
	Text(String),
	Int(i64),
}

impl From<IdRepr> for String {
	fn from(id: IdRepr) -> Self {
		match id {
			IdRepr::Text(s) => s,
			IdRepr::Int(i) => i.to_string(),
		}
	}
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	IdRepr::deserialize(de).map(String::from)
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<IdRepr>::deserialize(de)?.map(String::from))
}

/// Reads an optional field, treating a value of the wrong type as absent.
fn de_lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Value::deserialize(de)?;
	if value.is_null() {
		return Ok(None);
	}
	match serde_json::from_value(value) {
		Ok(v) => Ok(Some(v)),
		Err(e) => {
			debug!("ignoring unreadable field: {}", e);
			Ok(None)
		}
	}
}

fn de_lenient_or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	Ok(de_lenient(de)?.unwrap_or_default())
}

/// Keeps the elements that fit `T`, logging the rest.
fn readable_elements<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
	items
		.into_iter()
		.enumerate()
		.filter_map(|(i, item)| match serde_json::from_value(item) {
			Ok(v) => Some(v),
			Err(e) => {
				warn!("skipping unreadable element #{}: {}", i, e);
				None
			}
		})
		.collect()
}

fn de_elements<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	Ok(readable_elements(Vec::<Value>::deserialize(de)?))
}

/// Like [`de_elements`], but anything other than an array reads as empty.
fn de_elements_or_default<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	match Value::deserialize(de)? {
		Value::Array(items) => Ok(readable_elements(items)),
		_ => Ok(Vec::new()),
	}
}

/// Subject directory entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
	#[serde(deserialize_with = "de_id")]
	pub id: String,
	pub name: String,
}

/// One AI-assistant content record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AiContentRecord {
	#[serde(deserialize_with = "de_id")]
	pub id: String,
	#[serde(default, deserialize_with = "de_opt_id")]
	pub subject_id: Option<String>,
	#[serde(default, deserialize_with = "de_lenient")]
	pub subject_name: Option<String>,
	#[serde(default, deserialize_with = "de_lenient")]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "de_lenient")]
	pub content: Option<String>,
	/// Explicit tags. `Some(vec![])` is an explicit empty list and still wins.
	#[serde(default, deserialize_with = "de_lenient")]
	pub tags: Option<Vec<String>>,
	#[serde(default, deserialize_with = "de_elements_or_default")]
	pub nodes: Vec<NestedNode>,
	#[serde(default, deserialize_with = "de_lenient")]
	pub created_at: Option<String>,
}

/// Node object embedded in an AI content record, consulted for tags only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NestedNode {
	#[serde(default, deserialize_with = "de_opt_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "de_lenient_or_default")]
	pub tags: Vec<String>,
}

/// A traditionally authored graph document. `nodes` and `edges` are required;
/// a document without them fails to parse and is skipped by the adapter.
/// Elements inside them are read one at a time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraditionalDocument {
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub graph_type: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub subject_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subject_name: Option<String>,
	#[serde(deserialize_with = "de_elements")]
	pub nodes: Vec<RawNode>,
	#[serde(deserialize_with = "de_elements")]
	pub edges: Vec<RawEdge>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawNode {
	#[serde(deserialize_with = "de_id")]
	pub id: String,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(rename = "type", default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub node_type: Option<String>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub level: Option<u32>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub difficulty: Option<f64>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub importance: Option<f64>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub mastery_level: Option<f64>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub question_count: Option<u32>,
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub subject_id: Option<String>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawEdge {
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub target: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	#[serde(rename = "type", default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub edge_type: Option<String>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub strength: Option<f64>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub weight: Option<f64>,
	#[serde(default, deserialize_with = "de_lenient", skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

impl RawNode {
	pub fn display_name(&self) -> String {
		self.name
			.clone()
			.or_else(|| self.label.clone())
			.unwrap_or_else(|| self.id.clone())
	}
}

impl RawEdge {
	pub fn endpoints(&self) -> Option<(&str, &str)> {
		let source = self.source.as_deref().or(self.from.as_deref())?;
		let target = self.target.as_deref().or(self.to.as_deref())?;
		Some((source, target))
	}

	pub fn resolved_strength(&self) -> Option<f64> {
		self.strength.or(self.weight)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_numeric_and_string_ids() {
		let node: RawNode = serde_json::from_value(json!({ "id": 42, "label": "Limits" })).unwrap();
		assert_eq!(node.id, "42");
		assert_eq!(node.display_name(), "Limits");

		let subject: Subject = serde_json::from_value(json!({ "id": "math", "name": "Math" })).unwrap();
		assert_eq!(subject.id, "math");
	}

	#[test]
	fn test_name_wins_over_label() {
		let node: RawNode =
			serde_json::from_value(json!({ "id": "n", "name": "Name", "label": "Label" })).unwrap();
		assert_eq!(node.display_name(), "Name");
	}

	#[test]
	fn test_edge_aliases() {
		let edge: RawEdge =
			serde_json::from_value(json!({ "from": 1, "to": "2", "weight": 0.7 })).unwrap();
		assert_eq!(edge.endpoints(), Some(("1", "2")));
		assert_eq!(edge.resolved_strength(), Some(0.7));

		let edge: RawEdge = serde_json::from_value(json!({ "source": "a", "from": "z", "target": "b" })).unwrap();
		assert_eq!(edge.endpoints(), Some(("a", "b")));

		let edge: RawEdge = serde_json::from_value(json!({ "source": "a" })).unwrap();
		assert_eq!(edge.endpoints(), None);
	}

	#[test]
	fn test_document_requires_arrays() {
		let missing = serde_json::from_value::<TraditionalDocument>(json!({ "id": 1, "nodes": [] }));
		assert!(missing.is_err());
		let ok = serde_json::from_value::<TraditionalDocument>(json!({ "nodes": [], "edges": [] }));
		assert!(ok.is_ok());
	}

	#[test]
	fn test_null_nested_tags_read_as_empty() {
		let record: AiContentRecord = serde_json::from_value(json!({
			"id": "a",
			"nodes": [{ "id": "ai_a", "tags": null }, { "id": "ai_b", "tags": "calculus" }]
		}))
		.unwrap();
		assert_eq!(record.nodes.len(), 2);
		assert!(record.nodes.iter().all(|n| n.tags.is_empty()));

		let record: AiContentRecord = serde_json::from_value(json!({ "id": "a", "nodes": null })).unwrap();
		assert!(record.nodes.is_empty());
	}

	#[test]
	fn test_bad_scalar_keeps_document() {
		let doc: TraditionalDocument = serde_json::from_value(json!({
			"nodes": [
				{ "id": "n1", "name": "Limits", "difficulty": "high", "level": "two" },
				{ "id": "n2", "difficulty": 0.4 },
				{ "name": "no id" }
			],
			"edges": [{ "source": "n1", "target": "n2", "strength": "strong" }, 5]
		}))
		.unwrap();
		assert_eq!(doc.nodes.len(), 2);
		assert_eq!(doc.nodes[0].display_name(), "Limits");
		assert_eq!(doc.nodes[0].difficulty, None);
		assert_eq!(doc.nodes[0].level, None);
		assert_eq!(doc.nodes[1].difficulty, Some(0.4));
		assert_eq!(doc.edges.len(), 1);
		assert_eq!(doc.edges[0].resolved_strength(), None);
	}

	#[test]
	fn test_explicit_empty_tags_preserved() {
		let record: AiContentRecord =
			serde_json::from_value(json!({ "id": "a", "tags": [] })).unwrap();
		assert_eq!(record.tags, Some(vec![]));
		let record: AiContentRecord = serde_json::from_value(json!({ "id": "a" })).unwrap();
		assert_eq!(record.tags, None);
	}
}
