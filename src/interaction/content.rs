//! Working copy for the content editor.

/// Text edits stay local until saved.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentDraft {
	original: String,
	text: String,
}

impl ContentDraft {
	pub fn new(content: Option<&str>) -> Self {
		let original = content.unwrap_or_default().to_string();
		Self {
			text: original.clone(),
			original,
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn set_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
	}

	/// Trailing whitespace alone does not count as an edit.
	pub fn is_dirty(&self) -> bool {
		self.text.trim_end() != self.original.trim_end()
	}

	pub fn revert(&mut self) {
		self.text = self.original.clone();
	}

	pub fn into_text(self) -> String {
		self.text
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_content_starts_empty() {
		let draft = ContentDraft::new(None);
		assert_eq!(draft.text(), "");
		assert!(!draft.is_dirty());
	}

	#[test]
	fn test_trailing_whitespace_is_not_an_edit() {
		let mut draft = ContentDraft::new(Some("Limits describe behaviour near a point."));
		draft.set_text("Limits describe behaviour near a point.\n\n");
		assert!(!draft.is_dirty());
		draft.set_text("Limits describe behaviour at infinity.");
		assert!(draft.is_dirty());
	}

	#[test]
	fn test_revert_restores_original() {
		let mut draft = ContentDraft::new(Some("derivative"));
		draft.set_text("integral");
		draft.revert();
		assert_eq!(draft.text(), "derivative");
		assert!(!draft.is_dirty());
		assert_eq!(draft.into_text(), "derivative");
	}
}
