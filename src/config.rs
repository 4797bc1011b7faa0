//! Explorer configuration, supplied by the hosting page as JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::GraphCategory;
use crate::layout::{LayoutMode, LayoutSettings};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
	/// Prefix for every collaborator endpoint, e.g. `/api`.
	pub api_base_url: String,
	pub category: GraphCategory,
	pub subject_id: Option<String>,
	pub layout_mode: LayoutMode,
	/// Show the bundled sample graph when the backend is unreachable.
	pub offline_fallback: bool,
	pub layout: LayoutSettings,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			api_base_url: "/api".into(),
			category: GraphCategory::All,
			subject_id: None,
			layout_mode: LayoutMode::Force,
			offline_fallback: false,
			layout: LayoutSettings::default(),
		}
	}
}

impl ExplorerConfig {
	/// Parses and validates; absent fields take their defaults.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.api_base_url.trim().is_empty() {
			return Err(ConfigError::EmptyBaseUrl);
		}
		Ok(())
	}

	/// Config for the subject star-map viewer, which falls back to sample data.
	pub fn star_map() -> Self {
		Self {
			category: GraphCategory::FullKnowledge,
			layout_mode: LayoutMode::Hierarchical,
			offline_fallback: true,
			..Self::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_json_uses_defaults() {
		let config = ExplorerConfig::from_json(
			r#"{ "category": "exam_scope", "layout": { "repulsion": -120.0 } }"#,
		)
		.unwrap();
		assert_eq!(config.category, GraphCategory::ExamScope);
		assert_eq!(config.api_base_url, "/api");
		assert_eq!(config.layout.repulsion, -120.0);
		assert_eq!(config.layout.hierarchy_distance, LayoutSettings::default().hierarchy_distance);
	}

	#[test]
	fn test_empty_base_url_rejected() {
		let err = ExplorerConfig::from_json(r#"{ "api_base_url": "  " }"#).unwrap_err();
		assert!(matches!(err, ConfigError::EmptyBaseUrl));
	}

	#[test]
	fn test_malformed_json_rejected() {
		assert!(matches!(
			ExplorerConfig::from_json("{ not json"),
			Err(ConfigError::Parse(_))
		));
	}
}
