//! Loading the graph model and discarding stale results.
//!
//! The component starts a request by taking a [`RequestTicket`] from its
//! [`RequestTracker`]. A later request supersedes every older ticket, and
//! component cleanup cancels all of them, so a response that resolves after
//! the user changed filters (or left the page) is dropped untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{error, info, warn};

use crate::api::{GraphApi, GraphFilter};
use crate::error::ApiError;
use crate::graph::{GraphModel, NormalizeOptions, Subject, normalize, sample};

#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
	generation: Arc<AtomicU64>,
	cancelled: Arc<AtomicBool>,
}

#[derive(Clone, Debug)]
pub struct RequestTicket {
	generation: u64,
	tracker: RequestTracker,
}

impl RequestTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues a ticket that supersedes all earlier ones.
	pub fn begin(&self) -> RequestTicket {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		RequestTicket {
			generation,
			tracker: self.clone(),
		}
	}

	/// Invalidates every ticket, current and future.
	pub fn cancel_all(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}
}

impl RequestTicket {
	pub fn is_current(&self) -> bool {
		!self.tracker.is_cancelled()
			&& self.tracker.generation.load(Ordering::SeqCst) == self.generation
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}
}

/// A normalized graph together with the subject directory it was named from.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
	pub model: GraphModel,
	pub subjects: Vec<Subject>,
}

/// Fetches documents and subjects, then normalizes them for the filter's
/// category. A subject directory failure only costs display names.
pub async fn load_model<A: GraphApi>(api: &A, filter: &GraphFilter) -> Result<Snapshot, ApiError> {
	let documents = api.list_graphs(filter).await.inspect_err(|e| {
		error!("list_graphs failed for subject {:?}: {}", filter.subject_id, e);
	})?;
	let subjects = match api.list_subjects().await {
		Ok(subjects) => subjects,
		Err(e) => {
			warn!("subject directory unavailable: {}", e);
			Vec::new()
		}
	};

	let model = normalize(&documents, &subjects, &NormalizeOptions::new(filter.category()));
	info!(
		"loaded {} documents into {} nodes / {} edges",
		documents.len(),
		model.len(),
		model.edges().len()
	);
	Ok(Snapshot { model, subjects })
}

/// Result of a load that may substitute the bundled sample graph.
#[derive(Debug)]
pub enum Loaded {
	Live(Snapshot),
	Sample { snapshot: Snapshot, cause: ApiError },
}

impl Loaded {
	pub fn into_snapshot(self) -> Snapshot {
		match self {
			Loaded::Live(snapshot) | Loaded::Sample { snapshot, .. } => snapshot,
		}
	}
}

/// Like [`load_model`], but falls back to the sample graph when enabled.
pub async fn load_or_fallback<A: GraphApi>(
	api: &A,
	filter: &GraphFilter,
	offline_fallback: bool,
) -> Result<Loaded, ApiError> {
	match load_model(api, filter).await {
		Ok(snapshot) => Ok(Loaded::Live(snapshot)),
		Err(cause) if offline_fallback => {
			warn!("showing sample graph: {}", cause);
			Ok(Loaded::Sample {
				snapshot: Snapshot {
					model: sample::illustrative_graph(),
					subjects: Vec::new(),
				},
				cause,
			})
		}
		Err(e) => Err(e),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::mock::{Call, RecordingApi};
	use crate::graph::{GraphCategory, Subject};
	use pollster::block_on;
	use serde_json::json;

	fn api() -> RecordingApi {
		RecordingApi {
			documents: vec![json!({
				"id": 1,
				"subject_id": "math",
				"title": "Triangles",
				"content": "Angles sum to 180",
				"tags": ["geometry"],
			})],
			subjects: vec![Subject {
				id: "math".into(),
				name: "Mathematics".into(),
			}],
			..RecordingApi::default()
		}
	}

	#[test]
	fn test_superseded_ticket_rejected() {
		let tracker = RequestTracker::new();
		let first = tracker.begin();
		assert!(first.is_current());
		let second = tracker.begin();
		assert!(!first.is_current());
		assert!(second.is_current());
		assert!(second.generation() > first.generation());
	}

	#[test]
	fn test_cancel_all_rejects_everything() {
		let tracker = RequestTracker::new();
		let ticket = tracker.begin();
		let shared = tracker.clone();
		shared.cancel_all();
		assert!(!ticket.is_current());
		assert!(!tracker.begin().is_current());
	}

	#[test]
	fn test_load_model_normalizes_with_subject_names() {
		let api = api();
		let filter = GraphFilter::new(Some("math".into()), GraphCategory::AiAssistant);
		let snapshot = block_on(load_model(&api, &filter)).unwrap();
		assert_eq!(snapshot.model.len(), 2);
		assert_eq!(
			snapshot.model.node("subject_math").map(|n| n.name.as_str()),
			Some("Mathematics")
		);
		assert_eq!(snapshot.subjects.len(), 1);
		assert_eq!(api.calls(), vec![Call::List(filter), Call::Subjects]);
	}

	#[test]
	fn test_subject_failure_is_not_fatal() {
		let api = RecordingApi {
			fail_subjects: true,
			..api()
		};
		let filter = GraphFilter::new(None, GraphCategory::AiAssistant);
		let snapshot = block_on(load_model(&api, &filter)).unwrap();
		assert_eq!(snapshot.model.len(), 2);
		assert!(snapshot.subjects.is_empty());
	}

	#[test]
	fn test_list_failure_propagates_unless_fallback() {
		let api = RecordingApi {
			fail_list: true,
			..api()
		};
		let filter = GraphFilter::default();
		assert!(block_on(load_or_fallback(&api, &filter, false)).is_err());

		let loaded = block_on(load_or_fallback(&api, &filter, true)).unwrap();
		assert!(matches!(loaded, Loaded::Sample { .. }));
		assert!(!loaded.into_snapshot().model.is_empty());
	}
}
