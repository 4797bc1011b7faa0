//! Collaborator API for graph documents and subjects.
//!
//! [`GraphApi`] is the seam between the explorer and the backend. The browser
//! build talks to it through [`http::HttpGraphApi`]; tests drive the async
//! actions against an in-memory recorder.

pub mod http;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::graph::raw::{de_id, de_opt_id};
use crate::graph::{GraphCategory, Subject};

/// Query for `GET /graphs`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphFilter {
	pub subject_id: Option<String>,
	/// `None` and [`GraphCategory::All`] both request every category.
	pub graph_type: Option<GraphCategory>,
	/// Appended as `_t` so reads after a mutation bypass caches.
	pub cache_bust: Option<u64>,
}

impl GraphFilter {
	pub fn new(subject_id: Option<String>, graph_type: GraphCategory) -> Self {
		Self {
			subject_id,
			graph_type: Some(graph_type),
			cache_bust: None,
		}
	}

	pub fn with_cache_bust(mut self, token: u64) -> Self {
		self.cache_bust = Some(token);
		self
	}

	/// The category the adapter should normalize for.
	pub fn category(&self) -> GraphCategory {
		self.graph_type.unwrap_or_default()
	}

	/// Unencoded query pairs; empty subjects and the `All` category are omitted.
	pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();
		if let Some(subject) = self.subject_id.as_deref().filter(|s| !s.is_empty()) {
			pairs.push(("subject_id", subject.to_string()));
		}
		if let Some(category) = self.graph_type.filter(|c| *c != GraphCategory::All) {
			pairs.push(("graph_type", category.as_str().to_string()));
		}
		if let Some(token) = self.cache_bust {
			pairs.push(("_t", token.to_string()));
		}
		pairs
	}
}

/// Body of `POST /graphs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateGraph {
	pub subject_id: Option<String>,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub graph_type: GraphCategory,
	#[serde(default)]
	pub overwrite: bool,
}

/// Body of `PATCH /graphs/{id}`. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGraph {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subject_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
}

impl UpdateGraph {
	pub fn tags(tags: Vec<String>) -> Self {
		Self {
			tags: Some(tags),
			..Self::default()
		}
	}

	pub fn subject(subject_id: impl Into<String>) -> Self {
		Self {
			subject_id: Some(subject_id.into()),
			..Self::default()
		}
	}

	pub fn content(content: impl Into<String>) -> Self {
		Self {
			content: Some(content.into()),
			..Self::default()
		}
	}
}

/// A stored graph record as echoed back by create and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
	#[serde(deserialize_with = "de_id")]
	pub id: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id")]
	pub subject_id: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}

/// Backend operations the explorer depends on.
///
/// Futures are not `Send`: the explorer runs on the browser's main thread.
#[allow(async_fn_in_trait)]
pub trait GraphApi {
	/// Raw documents; shape is resolved by [`crate::graph::normalize`].
	async fn list_graphs(&self, filter: &GraphFilter) -> Result<Vec<Value>, ApiError>;

	/// Fails with [`ApiError::DuplicateTitle`] when the title is taken and
	/// `overwrite` is not set.
	async fn create_graph(&self, request: &CreateGraph) -> Result<GraphDocument, ApiError>;

	async fn update_graph(&self, id: &str, update: &UpdateGraph) -> Result<GraphDocument, ApiError>;

	async fn delete_graph(&self, id: &str) -> Result<(), ApiError>;

	async fn list_subjects(&self) -> Result<Vec<Subject>, ApiError>;
}

#[cfg(test)]
pub(crate) mod mock {
	use std::cell::RefCell;
	use std::collections::HashSet;

	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	pub enum Call {
		List(GraphFilter),
		Create(CreateGraph),
		Update(String, UpdateGraph),
		Delete(String),
		Subjects,
	}

	/// In-memory [`GraphApi`] that records every call in order.
	#[derive(Default)]
	pub struct RecordingApi {
		pub calls: RefCell<Vec<Call>>,
		pub documents: Vec<Value>,
		pub subjects: Vec<Subject>,
		pub taken_titles: HashSet<String>,
		pub fail_list: bool,
		pub fail_subjects: bool,
		pub fail_create: bool,
		pub fail_delete: HashSet<String>,
	}

	impl RecordingApi {
		pub fn calls(&self) -> Vec<Call> {
			self.calls.borrow().clone()
		}

		fn record(&self, call: Call) {
			self.calls.borrow_mut().push(call);
		}

		fn unavailable() -> ApiError {
			ApiError::Http {
				status: 503,
				message: "unavailable".into(),
			}
		}
	}

	impl GraphApi for RecordingApi {
		async fn list_graphs(&self, filter: &GraphFilter) -> Result<Vec<Value>, ApiError> {
			self.record(Call::List(filter.clone()));
			if self.fail_list {
				return Err(ApiError::Network("offline".into()));
			}
			Ok(self.documents.clone())
		}

		async fn create_graph(&self, request: &CreateGraph) -> Result<GraphDocument, ApiError> {
			self.record(Call::Create(request.clone()));
			if self.fail_create {
				return Err(Self::unavailable());
			}
			if !request.overwrite && self.taken_titles.contains(&request.title) {
				return Err(ApiError::DuplicateTitle {
					title: request.title.clone(),
				});
			}
			Ok(GraphDocument {
				id: "merged".into(),
				title: Some(request.title.clone()),
				subject_id: request.subject_id.clone(),
				tags: request.tags.clone(),
			})
		}

		async fn update_graph(&self, id: &str, update: &UpdateGraph) -> Result<GraphDocument, ApiError> {
			self.record(Call::Update(id.to_string(), update.clone()));
			Ok(GraphDocument {
				id: id.to_string(),
				title: None,
				subject_id: update.subject_id.clone(),
				tags: update.tags.clone().unwrap_or_default(),
			})
		}

		async fn delete_graph(&self, id: &str) -> Result<(), ApiError> {
			self.record(Call::Delete(id.to_string()));
			if self.fail_delete.contains(id) {
				return Err(Self::unavailable());
			}
			Ok(())
		}

		async fn list_subjects(&self) -> Result<Vec<Subject>, ApiError> {
			self.record(Call::Subjects);
			if self.fail_subjects {
				return Err(Self::unavailable());
			}
			Ok(self.subjects.clone())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_query_pairs_omit_defaults() {
		let filter = GraphFilter::new(None, GraphCategory::All);
		assert!(filter.query_pairs().is_empty());

		let filter = GraphFilter::new(Some("math".into()), GraphCategory::ExamScope).with_cache_bust(7);
		assert_eq!(
			filter.query_pairs(),
			vec![
				("subject_id", "math".to_string()),
				("graph_type", "exam_scope".to_string()),
				("_t", "7".to_string()),
			]
		);
	}

	#[test]
	fn test_update_skips_absent_fields() {
		let body = serde_json::to_value(UpdateGraph::subject("physics")).unwrap();
		assert_eq!(body, serde_json::json!({ "subject_id": "physics" }));
		let body = serde_json::to_value(UpdateGraph::content("notes")).unwrap();
		assert_eq!(body, serde_json::json!({ "content": "notes" }));
	}

	#[test]
	fn test_document_accepts_numeric_id() {
		let doc: GraphDocument = serde_json::from_value(serde_json::json!({ "id": 12 })).unwrap();
		assert_eq!(doc.id, "12");
		assert!(doc.tags.is_empty());
	}
}
