//! Toolbar, detail panel, menus and dialogs around the canvas.

use leptos::prelude::*;

use super::types::{FilterChange, Status};
use crate::graph::{GraphCategory, GraphModel, Subject};
use crate::interaction::{InteractionController, InteractionState, Resolution};
use crate::layout::LayoutMode;

#[component]
pub fn Toolbar(
	subjects: RwSignal<Vec<Subject>>,
	subject: RwSignal<Option<String>>,
	category: RwSignal<GraphCategory>,
	layout_mode: RwSignal<LayoutMode>,
	controller: RwSignal<InteractionController>,
	loading: RwSignal<bool>,
	#[prop(into)] on_filter_change: Callback<FilterChange>,
	#[prop(into)] on_refresh: Callback<()>,
	#[prop(into)] on_merge: Callback<()>,
	#[prop(into)] on_download: Callback<()>,
) -> impl IntoView {
	let selected_count = move || controller.with(|c| c.selected().len());

	view! {
		<div class="graph-toolbar">
			<select
				prop:disabled=move || loading.get()
				on:change=move |ev| {
					let value = event_target_value(&ev);
					let next = (!value.is_empty()).then_some(value);
					subject.set(next.clone());
					on_filter_change.run((next, category.get_untracked()));
				}
			>
				<option value="" selected=move || subject.with(Option::is_none)>
					"All subjects"
				</option>
				{move || {
					subjects
						.get()
						.into_iter()
						.map(|s| {
							let selected = subject.with(|cur| cur.as_deref() == Some(s.id.as_str()));
							view! { <option value=s.id.clone() selected=selected>{s.name}</option> }
						})
						.collect_view()
				}}
			</select>

			<select
				prop:disabled=move || loading.get()
				on:change=move |ev| {
					if let Some(next) = GraphCategory::parse(&event_target_value(&ev)) {
						category.set(next);
						on_filter_change.run((subject.get_untracked(), next));
					}
				}
			>
				{GraphCategory::ALL
					.into_iter()
					.map(|c| {
						view! {
							<option value=c.as_str() selected=move || category.get() == c>
								{c.label()}
							</option>
						}
					})
					.collect_view()}
			</select>

			<select on:change=move |ev| {
				if let Some(mode) = LayoutMode::parse(&event_target_value(&ev)) {
					layout_mode.set(mode);
				}
			}>
				{LayoutMode::ALL
					.into_iter()
					.map(|m| {
						view! {
							<option value=m.as_str() selected=move || layout_mode.get() == m>
								{m.label()}
							</option>
						}
					})
					.collect_view()}
			</select>

			<button
				class:active=move || controller.with(InteractionController::is_multi_select)
				on:click=move |_| controller.update(|c| c.toggle_multi_select())
			>
				"Multi-select"
			</button>
			<Show when=move || controller.with(InteractionController::is_multi_select)>
				<button
					disabled=move || selected_count() < 2
					on:click=move |_| on_merge.run(())
				>
					{move || format!("Merge ({})", selected_count())}
				</button>
			</Show>
			<button disabled=move || loading.get() on:click=move |_| on_refresh.run(())>
				"Refresh"
			</button>
			<button on:click=move |_| on_download.run(())>"Download PNG"</button>
		</div>
	}
}

#[component]
pub fn DetailPanel(model: RwSignal<GraphModel>, controller: RwSignal<InteractionController>) -> impl IntoView {
	let node = move || {
		let id = controller.with(|c| match c.state() {
			InteractionState::NodeSelected { node_id } => Some(node_id.clone()),
			_ => None,
		})?;
		model.with(|m| m.node(&id).cloned())
	};

	move || {
		node().map(|node| {
			let scores = [
				("Difficulty", node.difficulty),
				("Importance", node.importance),
				("Mastery", node.mastery_level),
			]
			.into_iter()
			.filter_map(|(label, score)| {
				score.map(|v| view! { <dt>{label}</dt><dd>{format!("{:.0}", v)}</dd> })
			})
			.collect_view();

			view! {
				<aside class="detail-panel">
					<header>
						<h3>{node.name.clone()}</h3>
						<button class="close" on:click=move |_| controller.update(|c| c.click_background())>
							"×"
						</button>
					</header>
					<dl>
						<dt>"Type"</dt>
						<dd>{node.node_type.label()}</dd>
						<dt>"Level"</dt>
						<dd>{node.level}</dd>
						{node.subject_name.clone().map(|s| view! { <dt>"Subject"</dt><dd>{s}</dd> })}
						{scores}
						{(node.question_count > 0)
							.then(|| view! { <dt>"Questions"</dt><dd>{node.question_count}</dd> })}
						{node.created_at.clone().map(|s| view! { <dt>"Created"</dt><dd>{s}</dd> })}
					</dl>
					<ul class="tags">
						{node.tags.iter().map(|t| view! { <li>{t.clone()}</li> }).collect_view()}
					</ul>
					{node.content.clone().map(|c| view! { <p class="content">{c}</p> })}
				</aside>
			}
		})
	}
}

#[component]
pub fn ContextMenu(
	model: RwSignal<GraphModel>,
	controller: RwSignal<InteractionController>,
	position: RwSignal<(f64, f64)>,
) -> impl IntoView {
	let actions = move || {
		controller.with(|c| match c.state() {
			InteractionState::ContextMenu { actions, .. } => Some(actions.clone()),
			_ => None,
		})
	};

	move || {
		actions().map(|actions| {
			let (x, y) = position.get_untracked();
			view! {
				<ul class="context-menu" style=format!("position: absolute; left: {}px; top: {}px;", x, y)>
					{actions
						.into_iter()
						.map(|action| {
							view! {
								<li>
									<button on:click=move |_| {
										controller.update(|c| model.with_untracked(|m| c.choose(action, m)))
									}>{action.label()}</button>
								</li>
							}
						})
						.collect_view()}
				</ul>
			}
		})
	}
}

#[component]
pub fn TagEditor(controller: RwSignal<InteractionController>, #[prop(into)] on_save: Callback<()>) -> impl IntoView {
	let draft_tags = move || {
		controller.with(|c| c.tag_draft().map(|d| d.tags().to_vec()).unwrap_or_default())
	};

	view! {
		<Show when=move || controller.with(|c| c.tag_draft().is_some())>
			<div class="dialog tag-editor">
				<h3>"Edit tags"</h3>
				<ul class="tags">
					{move || {
						draft_tags()
							.into_iter()
							.map(|tag| {
								let removed = tag.clone();
								view! {
									<li>
										{tag}
										<button on:click=move |_| {
											controller.update(|c| {
												if let Some(draft) = c.tag_draft_mut() {
													draft.remove(&removed);
												}
											})
										}>"×"</button>
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
				<input
					type="text"
					placeholder="Add tag"
					prop:value=move || {
						controller.with(|c| c.tag_draft().map(|d| d.input().to_string()).unwrap_or_default())
					}
					on:input=move |ev| {
						let value = event_target_value(&ev);
						controller.update(|c| {
							if let Some(draft) = c.tag_draft_mut() {
								draft.set_input(value);
							}
						})
					}
					on:keydown=move |ev| {
						if ev.key() == "Enter" {
							controller.update(|c| {
								if let Some(draft) = c.tag_draft_mut() {
									draft.commit_input();
								}
							})
						}
					}
				/>
				<div class="dialog-actions">
					<button on:click=move |_| on_save.run(())>"Save"</button>
					<button on:click=move |_| {
						controller.update(|c| {
							if let Some(draft) = c.tag_draft_mut() {
								draft.revert();
							}
						})
					}>"Revert"</button>
					<button on:click=move |_| controller.update(|c| c.cancel())>"Cancel"</button>
				</div>
			</div>
		</Show>
	}
}

#[component]
pub fn ContentEditor(
	controller: RwSignal<InteractionController>,
	#[prop(into)] on_save: Callback<()>,
) -> impl IntoView {
	view! {
		<Show when=move || controller.with(|c| c.content_draft().is_some())>
			<div class="dialog content-editor">
				<h3>"Edit content"</h3>
				<textarea
					rows="12"
					prop:value=move || {
						controller.with(|c| c.content_draft().map(|d| d.text().to_string()).unwrap_or_default())
					}
					on:input=move |ev| {
						let value = event_target_value(&ev);
						controller.update(|c| {
							if let Some(draft) = c.content_draft_mut() {
								draft.set_text(value);
							}
						})
					}
				/>
				<div class="dialog-actions">
					<button on:click=move |_| on_save.run(())>"Save"</button>
					<button on:click=move |_| {
						controller.update(|c| {
							if let Some(draft) = c.content_draft_mut() {
								draft.revert();
							}
						})
					}>"Revert"</button>
					<button on:click=move |_| controller.update(|c| c.cancel())>"Cancel"</button>
				</div>
			</div>
		</Show>
	}
}

#[component]
pub fn MoveDialog(
	controller: RwSignal<InteractionController>,
	subjects: RwSignal<Vec<Subject>>,
	#[prop(into)] on_choose: Callback<String>,
) -> impl IntoView {
	view! {
		<Show when=move || controller.with(|c| matches!(c.state(), InteractionState::Moving { .. }))>
			<div class="dialog move-dialog">
				<h3>"Move to subject"</h3>
				<Show
					when=move || subjects.with(|s| !s.is_empty())
					fallback=|| view! { <p>"No subjects available."</p> }
				>
					<ul>
						{move || {
							subjects
								.get()
								.into_iter()
								.map(|s| {
									let id = s.id.clone();
									view! {
										<li>
											<button on:click=move |_| on_choose.run(id.clone())>{s.name}</button>
										</li>
									}
								})
								.collect_view()
						}}
					</ul>
				</Show>
				<button on:click=move |_| controller.update(|c| c.cancel())>"Cancel"</button>
			</div>
		</Show>
	}
}

#[component]
pub fn ConfirmDelete(
	model: RwSignal<GraphModel>,
	controller: RwSignal<InteractionController>,
	#[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
	let target = move || {
		controller.with(|c| match c.state() {
			InteractionState::ConfirmDelete { node_id } => Some(node_id.clone()),
			_ => None,
		})
	};

	move || {
		target().map(|id| {
			let name = model.with(|m| m.node(&id).map(|n| n.name.clone())).unwrap_or(id);
			view! {
				<div class="dialog confirm-delete">
					<p>{format!("Delete \"{}\"? This cannot be undone.", name)}</p>
					<div class="dialog-actions">
						<button class="danger" on:click=move |_| on_confirm.run(())>"Delete"</button>
						<button on:click=move |_| controller.update(|c| c.cancel())>"Cancel"</button>
					</div>
				</div>
			}
		})
	}
}

#[component]
pub fn ConflictDialog(
	controller: RwSignal<InteractionController>,
	#[prop(into)] on_resolve: Callback<Resolution>,
) -> impl IntoView {
	let rename = RwSignal::new(String::new());
	let title = move || {
		controller.with(|c| match c.state() {
			InteractionState::MergeConflict { pending } => Some(pending.title().to_string()),
			_ => None,
		})
	};

	move || {
		title().map(|title| {
			view! {
				<div class="dialog merge-conflict">
					<p>{format!("A graph titled \"{}\" already exists.", title)}</p>
					<input
						type="text"
						placeholder="New title"
						prop:value=move || rename.get()
						on:input=move |ev| rename.set(event_target_value(&ev))
					/>
					<div class="dialog-actions">
						<button on:click=move |_| on_resolve.run(Resolution::Overwrite)>"Overwrite"</button>
						<button on:click=move |_| on_resolve.run(Resolution::Rename(rename.get_untracked()))>
							"Rename"
						</button>
						<button on:click=move |_| on_resolve.run(Resolution::Cancel)>"Cancel"</button>
					</div>
				</div>
			}
		})
	}
}

#[component]
pub fn StatusBar(
	status: RwSignal<Option<Status>>,
	loading: RwSignal<bool>,
	degraded: RwSignal<Option<String>>,
) -> impl IntoView {
	view! {
		<div class="graph-status">
			<Show when=move || loading.get()>
				<span class="loading">"Loading…"</span>
			</Show>
			{move || {
				degraded
					.get()
					.map(|reason| {
						view! {
							<span class="status status-info">
								{format!("Hierarchy unavailable, showing force layout: {}", reason)}
							</span>
						}
					})
			}}
			{move || {
				status
					.get()
					.map(|s| {
						view! {
							<span class=s.class()>
								{s.text.clone()}
								<button class="close" on:click=move |_| status.set(None)>"×"</button>
							</span>
						}
					})
			}}
		</div>
	}
}
