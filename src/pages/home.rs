use leptos::prelude::*;
use log::{info, warn};

use crate::components::knowledge_graph::{FilterChange, KnowledgeGraphExplorer};
use crate::config::ExplorerConfig;
use crate::error::ConfigError;

/// Element id of the optional JSON config block embedded by the hosting page.
const CONFIG_ELEMENT_ID: &str = "explorer-config";

/// Reads the embedded config; pages without one get the defaults.
fn page_config() -> Result<ExplorerConfig, ConfigError> {
	let text = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
		.and_then(|el| el.text_content());
	match text {
		Some(json) if !json.trim().is_empty() => ExplorerConfig::from_json(&json).inspect_err(|e| {
			warn!("rejected explorer config: {}", e);
		}),
		_ => Ok(ExplorerConfig::default()),
	}
}

fn log_filter(change: FilterChange) {
	let (subject, category) = change;
	info!(
		"filter changed: subject={} category={}",
		subject.as_deref().unwrap_or("all"),
		category.as_str()
	);
}

/// Fullscreen explorer with a title overlay; config errors land in the boundary.
#[component]
fn GraphPage(
	config: Result<ExplorerConfig, ConfigError>,
	title: &'static str,
	#[prop(optional)] subtitle: Option<&'static str>,
	#[prop(into)] on_filter_change: Callback<FilterChange>,
) -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="fullscreen-graph">
				{config
					.map(|config| {
						view! {
							<KnowledgeGraphExplorer
								config=config
								on_filter_change=on_filter_change
								fullscreen=true
							/>
						}
					})}
				<div class="graph-overlay">
					<h1>{title}</h1>
					{subtitle.map(|s| view! { <p class="subtitle">{s}</p> })}
				</div>
			</div>
		</ErrorBoundary>
	}
}

/// Knowledge graph explorer over the live backend.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<GraphPage
			config=page_config()
			title="Knowledge Graph"
			subtitle="Click a node for details, right-click to edit. Drag to reposition, scroll to zoom."
			on_filter_change=log_filter
		/>
	}
}

/// Subject star map; shows the bundled sample graph when offline.
#[component]
pub fn StarMap() -> impl IntoView {
	view! {
		<GraphPage
			config=Ok(ExplorerConfig::star_map())
			title="Subject Star Map"
			on_filter_change=log_filter
		/>
	}
}
