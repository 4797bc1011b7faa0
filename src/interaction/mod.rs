//! Selection, menus and editing modes as one explicit state machine.
//!
//! Every transition is a method on [`InteractionController`]. Transitions
//! that need the backend return an [`Intent`] for [`actions::execute`];
//! the controller itself never performs I/O.

pub mod actions;
pub mod content;
pub mod tags;

use log::debug;

use crate::graph::{GraphModel, GraphNode};
use actions::{ActionError, Intent, MergeRequest, Target};
use content::ContentDraft;
use tags::TagDraft;

/// State restored when a drag or context menu ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Resume {
	#[default]
	Idle,
	MultiSelect(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
	ViewDetail,
	Edit,
	EditTags,
	Move,
	Delete,
}

impl MenuAction {
	pub fn label(&self) -> &'static str {
		match self {
			MenuAction::ViewDetail => "View details",
			MenuAction::Edit => "Edit content",
			MenuAction::EditTags => "Edit tags",
			MenuAction::Move => "Move to subject",
			MenuAction::Delete => "Delete",
		}
	}
}

/// Context menu entries for a node.
pub fn menu_actions(node: &GraphNode) -> Vec<MenuAction> {
	if node.is_editable() {
		vec![
			MenuAction::ViewDetail,
			MenuAction::Edit,
			MenuAction::EditTags,
			MenuAction::Move,
			MenuAction::Delete,
		]
	} else {
		vec![MenuAction::ViewDetail]
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
	#[default]
	Idle,
	NodeSelected {
		node_id: String,
	},
	/// Ordered, unique.
	MultiSelect {
		selected: Vec<String>,
	},
	ContextMenu {
		node_id: String,
		actions: Vec<MenuAction>,
		resume: Resume,
	},
	Dragging {
		node_id: String,
		resume: Resume,
	},
	ContentEditing {
		node_id: String,
		draft: ContentDraft,
	},
	TagEditing {
		node_id: String,
		draft: TagDraft,
	},
	ConfirmDelete {
		node_id: String,
	},
	Moving {
		node_id: String,
	},
	MergeConflict {
		pending: MergeRequest,
	},
}

/// How the user settles a duplicate merge title.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
	Overwrite,
	Rename(String),
	Cancel,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	state: InteractionState,
}

impl InteractionController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	/// Node the detail panel or an editor is about.
	pub fn focus(&self) -> Option<&str> {
		match &self.state {
			InteractionState::NodeSelected { node_id }
			| InteractionState::ContextMenu { node_id, .. }
			| InteractionState::Dragging { node_id, .. }
			| InteractionState::ContentEditing { node_id, .. }
			| InteractionState::TagEditing { node_id, .. }
			| InteractionState::ConfirmDelete { node_id }
			| InteractionState::Moving { node_id } => Some(node_id.as_str()),
			_ => None,
		}
	}

	/// Ids drawn as selected.
	pub fn selected(&self) -> Vec<&str> {
		match &self.state {
			InteractionState::MultiSelect { selected } => selected.iter().map(String::as_str).collect(),
			InteractionState::MergeConflict { pending } => {
				pending.members.iter().map(|m| m.node_id.as_str()).collect()
			}
			InteractionState::ContextMenu {
				resume: Resume::MultiSelect(selected),
				..
			}
			| InteractionState::Dragging {
				resume: Resume::MultiSelect(selected),
				..
			} => selected.iter().map(String::as_str).collect(),
			_ => self.focus().into_iter().collect(),
		}
	}

	pub fn is_multi_select(&self) -> bool {
		matches!(self.state, InteractionState::MultiSelect { .. })
	}

	/// Modal states ignore canvas gestures until resolved.
	pub fn is_modal(&self) -> bool {
		matches!(
			self.state,
			InteractionState::ContentEditing { .. }
				| InteractionState::TagEditing { .. }
				| InteractionState::ConfirmDelete { .. }
				| InteractionState::Moving { .. }
				| InteractionState::MergeConflict { .. }
		)
	}

	fn resume_state(&self) -> Resume {
		match &self.state {
			InteractionState::MultiSelect { selected } => Resume::MultiSelect(selected.clone()),
			InteractionState::ContextMenu { resume, .. } | InteractionState::Dragging { resume, .. } => {
				resume.clone()
			}
			_ => Resume::Idle,
		}
	}

	fn resume(&mut self, resume: Resume) {
		self.state = match resume {
			Resume::Idle => InteractionState::Idle,
			Resume::MultiSelect(selected) => InteractionState::MultiSelect { selected },
		};
	}

	fn transition(&mut self, next: InteractionState) {
		debug!("interaction {:?} -> {:?}", self.state, next);
		self.state = next;
	}

	pub fn click(&mut self, node_id: &str) {
		if self.is_modal() {
			return;
		}
		match &mut self.state {
			InteractionState::MultiSelect { selected } => {
				if let Some(pos) = selected.iter().position(|id| id == node_id) {
					selected.remove(pos);
				} else {
					selected.push(node_id.to_string());
				}
			}
			_ => self.transition(InteractionState::NodeSelected {
				node_id: node_id.to_string(),
			}),
		}
	}

	/// Closes menus and the detail view; a multi-selection survives.
	pub fn click_background(&mut self) {
		if self.is_modal() {
			return;
		}
		let resume = self.resume_state();
		self.resume(resume);
	}

	pub fn escape(&mut self) {
		match &self.state {
			InteractionState::ContentEditing { node_id, .. }
			| InteractionState::TagEditing { node_id, .. }
			| InteractionState::ConfirmDelete { node_id }
			| InteractionState::Moving { node_id } => {
				let node_id = node_id.clone();
				self.transition(InteractionState::NodeSelected { node_id });
			}
			_ => self.transition(InteractionState::Idle),
		}
	}

	pub fn toggle_multi_select(&mut self) {
		if self.is_modal() {
			return;
		}
		match &self.state {
			InteractionState::MultiSelect { .. } => self.transition(InteractionState::Idle),
			_ => self.transition(InteractionState::MultiSelect {
				selected: Vec::new(),
			}),
		}
	}

	pub fn context_menu(&mut self, node: &GraphNode) {
		if self.is_modal() {
			return;
		}
		let resume = self.resume_state();
		self.transition(InteractionState::ContextMenu {
			node_id: node.id.clone(),
			actions: menu_actions(node),
			resume,
		});
	}

	/// Applies a context menu entry. Entries the node does not offer are ignored.
	pub fn choose(&mut self, action: MenuAction, model: &GraphModel) {
		let InteractionState::ContextMenu { node_id, actions, .. } = &self.state else {
			return;
		};
		if !actions.contains(&action) {
			return;
		}
		let node_id = node_id.clone();
		let next = match action {
			MenuAction::ViewDetail => InteractionState::NodeSelected { node_id },
			MenuAction::Edit => match model.node(&node_id) {
				Some(node) => InteractionState::ContentEditing {
					draft: ContentDraft::new(node.content.as_deref()),
					node_id,
				},
				None => InteractionState::Idle,
			},
			MenuAction::EditTags => match model.node(&node_id) {
				Some(node) => InteractionState::TagEditing {
					draft: TagDraft::new(&node.tags),
					node_id,
				},
				None => InteractionState::Idle,
			},
			MenuAction::Move => InteractionState::Moving { node_id },
			MenuAction::Delete => InteractionState::ConfirmDelete { node_id },
		};
		self.transition(next);
	}

	/// Returns `false` when the gesture should not move the node.
	pub fn drag_start(&mut self, node_id: &str) -> bool {
		if self.is_modal() {
			return false;
		}
		let resume = self.resume_state();
		self.transition(InteractionState::Dragging {
			node_id: node_id.to_string(),
			resume,
		});
		true
	}

	pub fn drag_end(&mut self) {
		if let InteractionState::Dragging { resume, .. } = &self.state {
			let resume = resume.clone();
			self.resume(resume);
		}
	}

	pub fn content_draft(&self) -> Option<&ContentDraft> {
		match &self.state {
			InteractionState::ContentEditing { draft, .. } => Some(draft),
			_ => None,
		}
	}

	pub fn content_draft_mut(&mut self) -> Option<&mut ContentDraft> {
		match &mut self.state {
			InteractionState::ContentEditing { draft, .. } => Some(draft),
			_ => None,
		}
	}

	/// Leaves the editor; yields an update only when the text changed.
	pub fn save_content(&mut self, model: &GraphModel) -> Result<Option<Intent>, ActionError> {
		let InteractionState::ContentEditing { node_id, draft } = &self.state else {
			return Ok(None);
		};
		let node_id = node_id.clone();
		let intent = if draft.is_dirty() {
			Some(Intent::UpdateContent {
				target: Target::resolve(model, &node_id)?,
				content: draft.clone().into_text(),
			})
		} else {
			None
		};
		self.transition(InteractionState::NodeSelected { node_id });
		Ok(intent)
	}

	pub fn tag_draft(&self) -> Option<&TagDraft> {
		match &self.state {
			InteractionState::TagEditing { draft, .. } => Some(draft),
			_ => None,
		}
	}

	pub fn tag_draft_mut(&mut self) -> Option<&mut TagDraft> {
		match &mut self.state {
			InteractionState::TagEditing { draft, .. } => Some(draft),
			_ => None,
		}
	}

	/// Leaves the editor; yields an update only when tags changed.
	pub fn save_tags(&mut self, model: &GraphModel) -> Result<Option<Intent>, ActionError> {
		let InteractionState::TagEditing { node_id, draft } = &self.state else {
			return Ok(None);
		};
		let node_id = node_id.clone();
		let mut draft = draft.clone();
		draft.commit_input();
		let intent = if draft.is_dirty() {
			Some(Intent::UpdateTags {
				target: Target::resolve(model, &node_id)?,
				tags: draft.into_tags(),
			})
		} else {
			None
		};
		self.transition(InteractionState::NodeSelected { node_id });
		Ok(intent)
	}

	/// Backs out of the current editor or dialog without side effects.
	pub fn cancel(&mut self) {
		match &self.state {
			InteractionState::MergeConflict { pending } => {
				let selected = pending.member_ids();
				self.transition(InteractionState::MultiSelect { selected });
			}
			_ => self.escape(),
		}
	}

	pub fn confirm_delete(&mut self, model: &GraphModel) -> Result<Option<Intent>, ActionError> {
		let InteractionState::ConfirmDelete { node_id } = &self.state else {
			return Ok(None);
		};
		let target = Target::resolve(model, node_id)?;
		self.transition(InteractionState::Idle);
		Ok(Some(Intent::Delete { target }))
	}

	pub fn choose_subject(&mut self, subject_id: &str, model: &GraphModel) -> Result<Option<Intent>, ActionError> {
		let InteractionState::Moving { node_id } = &self.state else {
			return Ok(None);
		};
		let node_id = node_id.clone();
		let target = Target::resolve(model, &node_id)?;
		let unchanged = model
			.node(&node_id)
			.is_some_and(|n| n.subject_id.as_deref() == Some(subject_id));
		self.transition(InteractionState::NodeSelected { node_id });
		if unchanged {
			return Ok(None);
		}
		Ok(Some(Intent::Move {
			target,
			subject_id: subject_id.to_string(),
		}))
	}

	/// Validates the multi-selection as a merge; the state is unchanged.
	pub fn merge(&self, model: &GraphModel) -> Result<Intent, ActionError> {
		let InteractionState::MultiSelect { selected } = &self.state else {
			return Err(ActionError::InvalidSelection("multi-select is off".into()));
		};
		MergeRequest::from_selection(model, selected).map(Intent::Merge)
	}

	pub fn merge_conflict(&mut self, pending: MergeRequest) {
		self.transition(InteractionState::MergeConflict { pending });
	}

	pub fn resolve_conflict(&mut self, resolution: Resolution) -> Option<Intent> {
		let InteractionState::MergeConflict { pending } = &self.state else {
			return None;
		};
		let pending = pending.clone();
		match resolution {
			Resolution::Overwrite => Some(Intent::Merge(pending.with_overwrite())),
			Resolution::Rename(title) if !title.trim().is_empty() => {
				Some(Intent::Merge(pending.renamed(title.trim())))
			}
			Resolution::Rename(_) => None,
			Resolution::Cancel => {
				self.cancel();
				None
			}
		}
	}

	pub fn reset(&mut self) {
		self.transition(InteractionState::Idle);
	}

	/// Drops references to nodes missing from a freshly loaded model. A drag
	/// in progress ends, since the layout it moved is rebuilt.
	pub fn reconcile(&mut self, model: &GraphModel) {
		self.drag_end();
		match &mut self.state {
			InteractionState::MultiSelect { selected } => {
				selected.retain(|id| model.node(id).is_some());
			}
			InteractionState::MergeConflict { .. } => {}
			_ => {
				if self.focus().is_some_and(|id| model.node(id).is_none()) {
					self.transition(InteractionState::Idle);
				}
			}
		}
	}
}
