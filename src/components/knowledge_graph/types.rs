use crate::graph::GraphCategory;

/// Payload of the explorer's `on_filter_change` callback.
pub type FilterChange = (Option<String>, GraphCategory);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
	Info,
	Error,
}

/// A dismissible message shown under the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
	pub kind: StatusKind,
	pub text: String,
}

impl Status {
	pub fn info(text: impl Into<String>) -> Self {
		Self {
			kind: StatusKind::Info,
			text: text.into(),
		}
	}

	pub fn error(text: impl Into<String>) -> Self {
		Self {
			kind: StatusKind::Error,
			text: text.into(),
		}
	}

	pub fn class(&self) -> &'static str {
		match self.kind {
			StatusKind::Info => "status status-info",
			StatusKind::Error => "status status-error",
		}
	}
}
