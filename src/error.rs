//! Error types shared across the collaborator API and configuration.

use thiserror::Error;

/// Failure talking to the graph backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
	#[error("network error: {0}")]
	Network(String),

	#[error("HTTP {status}: {message}")]
	Http { status: u16, message: String },

	#[error("failed to decode response: {0}")]
	Decode(String),

	/// Creation rejected because a record with this title exists.
	#[error("a graph titled \"{title}\" already exists")]
	DuplicateTitle { title: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid explorer config: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("api_base_url must not be empty")]
	EmptyBaseUrl,
}
