//! Structural edits sent to the backend.
//!
//! The controller produces an [`Intent`]; [`execute`] performs it against a
//! [`GraphApi`]. Nothing here retries or rolls back: the caller re-fetches
//! after every attempt so the canvas reflects the backend's actual state.

use log::{error, info};
use thiserror::Error;

use crate::api::{CreateGraph, GraphApi, UpdateGraph};
use crate::error::ApiError;
use crate::graph::adapter::UNASSIGNED_SUBJECT;
use crate::graph::model::normalize_tags;
use crate::graph::{GraphCategory, GraphModel, GraphNode};

pub const MERGE_TITLE_SEPARATOR: &str = " + ";
pub const MERGE_CONTENT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Error)]
pub enum ActionError {
	#[error("invalid selection: {0}")]
	InvalidSelection(String),

	#[error("node {0} cannot be modified")]
	NotEditable(String),

	#[error("{operation} failed for {target}: {source}")]
	Api {
		operation: &'static str,
		target: String,
		source: ApiError,
	},

	#[error("merge created {created_id} and deleted {deleted:?}, but deleting {failed_id} failed: {source}")]
	PartialMerge {
		created_id: String,
		deleted: Vec<String>,
		failed_id: String,
		source: ApiError,
	},

	#[error("a graph titled \"{title}\" already exists")]
	DuplicateTitle { title: String },
}

/// A node addressed both by its canvas id and its backend record id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
	pub node_id: String,
	pub record_id: String,
}

impl Target {
	/// Only AI content nodes with a backend record can be modified.
	pub fn resolve(model: &GraphModel, node_id: &str) -> Result<Self, ActionError> {
		let node = model
			.node(node_id)
			.ok_or_else(|| ActionError::InvalidSelection(format!("unknown node {}", node_id)))?;
		Self::of(node)
	}

	fn of(node: &GraphNode) -> Result<Self, ActionError> {
		match (&node.record_id, node.is_editable()) {
			(Some(record_id), true) => Ok(Self {
				node_id: node.id.clone(),
				record_id: record_id.clone(),
			}),
			_ => Err(ActionError::NotEditable(node.id.clone())),
		}
	}
}

/// Merged record to create, and the members it replaces in selection order.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeRequest {
	pub members: Vec<Target>,
	pub create: CreateGraph,
}

impl MergeRequest {
	/// Validates the selection without touching the network.
	pub fn from_selection(model: &GraphModel, selected: &[String]) -> Result<Self, ActionError> {
		if selected.len() < 2 {
			return Err(ActionError::InvalidSelection(
				"select at least two nodes to merge".into(),
			));
		}
		let nodes = selected
			.iter()
			.map(|id| {
				model
					.node(id)
					.ok_or_else(|| ActionError::InvalidSelection(format!("unknown node {}", id)))
			})
			.collect::<Result<Vec<_>, _>>()?;
		let members = nodes
			.iter()
			.map(|node| Target::of(node))
			.collect::<Result<Vec<_>, _>>()?;

		let title = nodes
			.iter()
			.map(|n| n.name.as_str())
			.collect::<Vec<_>>()
			.join(MERGE_TITLE_SEPARATOR);
		let content = nodes
			.iter()
			.map(|n| n.content.as_deref().unwrap_or(""))
			.collect::<Vec<_>>()
			.join(MERGE_CONTENT_SEPARATOR);
		let tags = normalize_tags(nodes.iter().flat_map(|n| n.tags.iter()));
		let subject_id = nodes[0]
			.subject_id
			.clone()
			.filter(|s| s != UNASSIGNED_SUBJECT);

		Ok(Self {
			members,
			create: CreateGraph {
				subject_id,
				title,
				content,
				tags,
				graph_type: GraphCategory::AiAssistant,
				overwrite: false,
			},
		})
	}

	pub fn title(&self) -> &str {
		&self.create.title
	}

	pub fn member_ids(&self) -> Vec<String> {
		self.members.iter().map(|m| m.node_id.clone()).collect()
	}

	pub fn with_overwrite(mut self) -> Self {
		self.create.overwrite = true;
		self
	}

	pub fn renamed(mut self, title: impl Into<String>) -> Self {
		self.create.title = title.into();
		self.create.overwrite = false;
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
	UpdateContent { target: Target, content: String },
	UpdateTags { target: Target, tags: Vec<String> },
	Move { target: Target, subject_id: String },
	Delete { target: Target },
	Merge(MergeRequest),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MutationOutcome {
	Edited { record_id: String },
	Updated { record_id: String },
	Moved { record_id: String, subject_id: String },
	Deleted { record_id: String },
	Merged { created_id: String, deleted: Vec<String> },
}

impl MutationOutcome {
	pub fn message(&self) -> String {
		match self {
			MutationOutcome::Edited { .. } => "Content saved".into(),
			MutationOutcome::Updated { .. } => "Tags saved".into(),
			MutationOutcome::Moved { subject_id, .. } => format!("Moved to {}", subject_id),
			MutationOutcome::Deleted { .. } => "Deleted".into(),
			MutationOutcome::Merged { deleted, .. } => format!("Merged {} items", deleted.len()),
		}
	}
}

pub async fn execute<A: GraphApi>(api: &A, intent: Intent) -> Result<MutationOutcome, ActionError> {
	match intent {
		Intent::UpdateContent { target, content } => {
			api.update_graph(&target.record_id, &UpdateGraph::content(content))
				.await
				.map_err(|e| api_error("update_graph", &target.record_id, e))?;
			info!("updated content of {}", target.record_id);
			Ok(MutationOutcome::Edited {
				record_id: target.record_id,
			})
		}
		Intent::UpdateTags { target, tags } => {
			api.update_graph(&target.record_id, &UpdateGraph::tags(tags))
				.await
				.map_err(|e| api_error("update_graph", &target.record_id, e))?;
			info!("updated tags of {}", target.record_id);
			Ok(MutationOutcome::Updated {
				record_id: target.record_id,
			})
		}
		Intent::Move { target, subject_id } => {
			api.update_graph(&target.record_id, &UpdateGraph::subject(subject_id.clone()))
				.await
				.map_err(|e| api_error("move_graph", &target.record_id, e))?;
			info!("moved {} to subject {}", target.record_id, subject_id);
			Ok(MutationOutcome::Moved {
				record_id: target.record_id,
				subject_id,
			})
		}
		Intent::Delete { target } => {
			api.delete_graph(&target.record_id)
				.await
				.map_err(|e| api_error("delete_graph", &target.record_id, e))?;
			info!("deleted {}", target.record_id);
			Ok(MutationOutcome::Deleted {
				record_id: target.record_id,
			})
		}
		Intent::Merge(request) => merge(api, &request).await,
	}
}

/// Creates the merged record, then deletes each member in order. Deletes only
/// start once creation succeeded; the first failing delete stops the merge.
pub async fn merge<A: GraphApi>(api: &A, request: &MergeRequest) -> Result<MutationOutcome, ActionError> {
	let created = match api.create_graph(&request.create).await {
		Ok(doc) => doc,
		Err(ApiError::DuplicateTitle { title }) => {
			info!("merge title \"{}\" already taken", title);
			return Err(ActionError::DuplicateTitle { title });
		}
		Err(e) => return Err(api_error("create_graph", request.title(), e)),
	};

	let mut deleted = Vec::with_capacity(request.members.len());
	for member in &request.members {
		if let Err(source) = api.delete_graph(&member.record_id).await {
			error!(
				"merge into {} stopped: delete_graph failed for {}: {}",
				created.id, member.record_id, source
			);
			return Err(ActionError::PartialMerge {
				created_id: created.id,
				deleted,
				failed_id: member.record_id.clone(),
				source,
			});
		}
		deleted.push(member.record_id.clone());
	}

	info!("merged {} records into {}", deleted.len(), created.id);
	Ok(MutationOutcome::Merged {
		created_id: created.id,
		deleted,
	})
}

fn api_error(operation: &'static str, target: &str, source: ApiError) -> ActionError {
	error!("{} failed for {}: {}", operation, target, source);
	ActionError::Api {
		operation,
		target: target.to_string(),
		source,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::mock::{Call, RecordingApi};
	use crate::graph::{GraphEdge, NodeType};
	use pollster::block_on;

	fn ai(id: &str, name: &str, content: &str, tags: &[&str]) -> GraphNode {
		GraphNode::new(format!("ai_{}", id), name, NodeType::AiContent)
			.with_content(content)
			.with_tags(tags.iter().copied())
			.with_subject("math", Some("Mathematics".into()))
			.with_record(id)
	}

	fn model() -> GraphModel {
		GraphModel::from_parts(
			vec![
				GraphNode::new("subject_math", "Mathematics", NodeType::Subject),
				ai("1", "Limits", "L", &["calculus"]),
				ai("2", "Series", "S", &["calculus", "sums"]),
				ai("3", "Proofs", "P", &["logic"]),
			],
			vec![GraphEdge::new("subject_math", "ai_1", crate::graph::EdgeType::Hierarchy)],
		)
	}

	fn selection(ids: &[&str]) -> Vec<String> {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_merge_request_composition() {
		let request = MergeRequest::from_selection(&model(), &selection(&["ai_2", "ai_1", "ai_3"])).unwrap();
		assert_eq!(request.create.title, "Series + Limits + Proofs");
		assert_eq!(request.create.content, "S\n\n---\n\nL\n\n---\n\nP");
		assert_eq!(request.create.tags, vec!["calculus", "sums", "logic"]);
		assert_eq!(request.create.subject_id.as_deref(), Some("math"));
		assert_eq!(request.member_ids(), selection(&["ai_2", "ai_1", "ai_3"]));
	}

	#[test]
	fn test_merge_rejects_bad_selections() {
		let model = model();
		assert!(matches!(
			MergeRequest::from_selection(&model, &selection(&["ai_1"])),
			Err(ActionError::InvalidSelection(_))
		));
		assert!(matches!(
			MergeRequest::from_selection(&model, &selection(&["ai_1", "subject_math"])),
			Err(ActionError::NotEditable(id)) if id == "subject_math"
		));
	}

	#[test]
	fn test_merge_creates_then_deletes_in_order() {
		let api = RecordingApi::default();
		let request = MergeRequest::from_selection(&model(), &selection(&["ai_1", "ai_2", "ai_3"])).unwrap();
		let outcome = block_on(execute(&api, Intent::Merge(request.clone()))).unwrap();

		assert_eq!(
			api.calls(),
			vec![
				Call::Create(request.create),
				Call::Delete("1".into()),
				Call::Delete("2".into()),
				Call::Delete("3".into()),
			]
		);
		assert_eq!(
			outcome,
			MutationOutcome::Merged {
				created_id: "merged".into(),
				deleted: selection(&["1", "2", "3"]),
			}
		);
	}

	#[test]
	fn test_failed_create_issues_no_deletes() {
		let api = RecordingApi {
			fail_create: true,
			..RecordingApi::default()
		};
		let request = MergeRequest::from_selection(&model(), &selection(&["ai_1", "ai_2", "ai_3"])).unwrap();
		let err = block_on(merge(&api, &request)).unwrap_err();
		assert!(matches!(err, ActionError::Api { operation: "create_graph", .. }));
		assert_eq!(api.calls().len(), 1);
	}

	#[test]
	fn test_partial_merge_reports_progress() {
		let api = RecordingApi {
			fail_delete: ["2".to_string()].into_iter().collect(),
			..RecordingApi::default()
		};
		let request = MergeRequest::from_selection(&model(), &selection(&["ai_1", "ai_2", "ai_3"])).unwrap();
		match block_on(merge(&api, &request)) {
			Err(ActionError::PartialMerge {
				created_id,
				deleted,
				failed_id,
				..
			}) => {
				assert_eq!(created_id, "merged");
				assert_eq!(deleted, selection(&["1"]));
				assert_eq!(failed_id, "2");
			}
			other => panic!("unexpected {:?}", other),
		}
		assert!(!api.calls().contains(&Call::Delete("3".into())));
	}

	#[test]
	fn test_duplicate_title_then_overwrite() {
		let api = RecordingApi {
			taken_titles: ["Limits + Series".to_string()].into_iter().collect(),
			..RecordingApi::default()
		};
		let request = MergeRequest::from_selection(&model(), &selection(&["ai_1", "ai_2"])).unwrap();
		let err = block_on(merge(&api, &request)).unwrap_err();
		assert!(matches!(err, ActionError::DuplicateTitle { ref title } if title == "Limits + Series"));
		assert_eq!(api.calls().len(), 1);

		assert!(block_on(merge(&api, &request.clone().with_overwrite())).is_ok());
		assert!(block_on(merge(&api, &request.renamed("Sequences"))).is_ok());
	}

	#[test]
	fn test_update_and_delete_use_record_ids() {
		let api = RecordingApi::default();
		let model = model();
		let target = Target::resolve(&model, "ai_1").unwrap();
		block_on(execute(
			&api,
			Intent::UpdateTags {
				target: target.clone(),
				tags: selection(&["a"]),
			},
		))
		.unwrap();
		let outcome = block_on(execute(
			&api,
			Intent::UpdateContent {
				target: target.clone(),
				content: "Revised notes".into(),
			},
		))
		.unwrap();
		assert_eq!(outcome.message(), "Content saved");
		block_on(execute(&api, Intent::Delete { target })).unwrap();
		assert_eq!(
			api.calls(),
			vec![
				Call::Update("1".into(), UpdateGraph::tags(selection(&["a"]))),
				Call::Update("1".into(), UpdateGraph::content("Revised notes")),
				Call::Delete("1".into()),
			]
		);
		assert!(matches!(
			Target::resolve(&model, "subject_math"),
			Err(ActionError::NotEditable(_))
		));
	}
}
