//! [`GraphApi`] over the browser `fetch` API.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::{CreateGraph, GraphApi, GraphDocument, GraphFilter, UpdateGraph};
use crate::error::ApiError;
use crate::graph::Subject;

const CONFLICT: u16 = 409;

#[derive(Clone, Debug)]
pub struct HttpGraphApi {
	base_url: String,
}

impl HttpGraphApi {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn send(&self, method: &str, url: &str, body: Option<String>) -> Result<(u16, String), ApiError> {
		let opts = RequestInit::new();
		opts.set_method(method);
		opts.set_mode(RequestMode::Cors);
		if let Some(body) = body {
			let headers = Headers::new().map_err(js_error)?;
			headers
				.set("Content-Type", "application/json")
				.map_err(js_error)?;
			opts.set_headers(&headers);
			opts.set_body(&JsValue::from_str(&body));
		}

		let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;
		let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".into()))?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(js_error)?
			.dyn_into()
			.map_err(|_| ApiError::Network("response is not a Response".into()))?;

		let text = JsFuture::from(response.text().map_err(js_error)?)
			.await
			.map_err(js_error)?
			.as_string()
			.unwrap_or_default();
		Ok((response.status(), text))
	}

	async fn request<T: DeserializeOwned>(
		&self,
		method: &str,
		url: &str,
		body: Option<String>,
	) -> Result<T, ApiError> {
		let (status, text) = self.send(method, url, body).await?;
		if !(200..300).contains(&status) {
			return Err(ApiError::Http {
				status,
				message: error_message(&text),
			});
		}
		serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
	}
}

impl GraphApi for HttpGraphApi {
	async fn list_graphs(&self, filter: &GraphFilter) -> Result<Vec<Value>, ApiError> {
		let query = filter
			.query_pairs()
			.into_iter()
			.map(|(key, value)| format!("{}={}", key, encode(&value)))
			.collect::<Vec<_>>()
			.join("&");
		let url = if query.is_empty() {
			self.url("/graphs")
		} else {
			self.url(&format!("/graphs?{}", query))
		};
		let body: Value = self.request("GET", &url, None).await?;
		unwrap_list(body)
	}

	async fn create_graph(&self, request: &CreateGraph) -> Result<GraphDocument, ApiError> {
		let (status, text) = self
			.send("POST", &self.url("/graphs"), Some(to_json(request)?))
			.await?;
		match status {
			CONFLICT => Err(ApiError::DuplicateTitle {
				title: request.title.clone(),
			}),
			200..=299 => serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string())),
			_ => Err(ApiError::Http {
				status,
				message: error_message(&text),
			}),
		}
	}

	async fn update_graph(&self, id: &str, update: &UpdateGraph) -> Result<GraphDocument, ApiError> {
		let url = self.url(&format!("/graphs/{}", encode(id)));
		self.request("PATCH", &url, Some(to_json(update)?)).await
	}

	async fn delete_graph(&self, id: &str) -> Result<(), ApiError> {
		let url = self.url(&format!("/graphs/{}", encode(id)));
		let (status, text) = self.send("DELETE", &url, None).await?;
		if (200..300).contains(&status) {
			Ok(())
		} else {
			Err(ApiError::Http {
				status,
				message: error_message(&text),
			})
		}
	}

	async fn list_subjects(&self) -> Result<Vec<Subject>, ApiError> {
		let body: Value = self.request("GET", &self.url("/subjects"), None).await?;
		unwrap_list(body)?
			.into_iter()
			.map(|v| serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string())))
			.collect()
	}
}

fn encode(value: &str) -> String {
	String::from(js_sys::encode_uri_component(value))
}

fn to_json<T: Serialize>(body: &T) -> Result<String, ApiError> {
	serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn js_error(err: JsValue) -> ApiError {
	ApiError::Network(format!("{:?}", err))
}

/// Lists arrive either bare or wrapped as `{ "data": [...] }`.
fn unwrap_list(body: Value) -> Result<Vec<Value>, ApiError> {
	match body {
		Value::Array(items) => Ok(items),
		Value::Object(mut map) => match map.remove("data") {
			Some(Value::Array(items)) => Ok(items),
			_ => Err(ApiError::Decode("expected a list".into())),
		},
		_ => Err(ApiError::Decode("expected a list".into())),
	}
}

/// Prefers a `detail`/`message` field from a JSON error body.
fn error_message(text: &str) -> String {
	serde_json::from_str::<Value>(text)
		.ok()
		.and_then(|v| {
			["detail", "message", "error"]
				.iter()
				.find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_string))
		})
		.unwrap_or_else(|| text.trim().to_string())
}
