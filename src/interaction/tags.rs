//! Working copy for the tag editor.

use crate::graph::model::normalize_tags;

/// Edits stay local until saved; cancelling restores the original tags.
#[derive(Clone, Debug, PartialEq)]
pub struct TagDraft {
	original: Vec<String>,
	tags: Vec<String>,
	input: String,
}

impl TagDraft {
	pub fn new(tags: &[String]) -> Self {
		let tags = normalize_tags(tags);
		Self {
			original: tags.clone(),
			tags,
			input: String::new(),
		}
	}

	pub fn tags(&self) -> &[String] {
		&self.tags
	}

	pub fn input(&self) -> &str {
		&self.input
	}

	pub fn set_input(&mut self, input: impl Into<String>) {
		self.input = input.into();
	}

	/// Returns `false` for blank or already present tags.
	pub fn add(&mut self, tag: &str) -> bool {
		let tag = tag.trim();
		if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
			return false;
		}
		self.tags.push(tag.to_string());
		true
	}

	/// Adds the pending input and clears it.
	pub fn commit_input(&mut self) -> bool {
		let input = std::mem::take(&mut self.input);
		self.add(&input)
	}

	pub fn remove(&mut self, tag: &str) -> bool {
		let before = self.tags.len();
		self.tags.retain(|t| t != tag);
		self.tags.len() != before
	}

	/// Order-insensitive comparison with the tags the draft started from.
	pub fn is_dirty(&self) -> bool {
		self.tags.len() != self.original.len() || self.tags.iter().any(|t| !self.original.contains(t))
	}

	/// Back to the tags the draft started from.
	pub fn revert(&mut self) {
		self.tags = self.original.clone();
		self.input.clear();
	}

	pub fn into_tags(self) -> Vec<String> {
		self.tags
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn draft() -> TagDraft {
		TagDraft::new(&["algebra".to_string(), "proof".to_string()])
	}

	#[test]
	fn test_add_and_remove() {
		let mut draft = draft();
		assert!(draft.add(" limits "));
		assert!(!draft.add("limits"));
		assert!(!draft.add("   "));
		assert!(draft.remove("algebra"));
		assert!(!draft.remove("algebra"));
		assert_eq!(draft.tags(), ["proof".to_string(), "limits".to_string()]);
		assert!(draft.is_dirty());
	}

	#[test]
	fn test_revert_discards_edits() {
		let mut draft = draft();
		draft.add("new");
		draft.set_input("half typed");
		draft.revert();
		assert!(!draft.is_dirty());
		assert_eq!(draft.input(), "");
		assert_eq!(draft.into_tags(), vec!["algebra".to_string(), "proof".to_string()]);
	}

	#[test]
	fn test_commit_input_clears_buffer() {
		let mut draft = draft();
		draft.set_input("calculus");
		assert!(draft.commit_input());
		assert_eq!(draft.input(), "");
		assert!(draft.tags().contains(&"calculus".to_string()));
	}

	#[test]
	fn test_reordering_is_not_dirty() {
		let mut draft = draft();
		draft.remove("algebra");
		draft.add("algebra");
		assert!(!draft.is_dirty());
	}
}
