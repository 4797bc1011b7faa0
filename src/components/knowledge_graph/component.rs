use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
	Window,
};

use super::panels::{
	ConfirmDelete, ConflictDialog, ContentEditor, ContextMenu, DetailPanel, MoveDialog, StatusBar, TagEditor, Toolbar,
};
use super::render;
use super::scene::Scene;
use super::state::{ExplorerState, PointerState};
use super::types::{FilterChange, Status};
use crate::api::GraphFilter;
use crate::api::http::HttpGraphApi;
use crate::config::ExplorerConfig;
use crate::fetch::{Loaded, RequestTracker, load_or_fallback};
use crate::graph::{GraphModel, Subject};
use crate::interaction::actions::{self, ActionError, Intent, MutationOutcome};
use crate::interaction::{InteractionController, Resolution};
use crate::layout::LayoutOutcome;

const FRAME_DT: f64 = 0.016;
const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

#[component]
pub fn KnowledgeGraphExplorer(
	#[prop(default = ExplorerConfig::default())] config: ExplorerConfig,
	#[prop(optional, into)] on_filter_change: Option<Callback<FilterChange>>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let api = HttpGraphApi::new(&config.api_base_url);
	let offline_fallback = config.offline_fallback;
	let settings = config.layout.clone();

	let model = RwSignal::new(GraphModel::default());
	let subjects = RwSignal::new(Vec::<Subject>::new());
	let controller = RwSignal::new(InteractionController::new());
	let subject = RwSignal::new(config.subject_id.clone());
	let category = RwSignal::new(config.category);
	let layout_mode = RwSignal::new(config.layout_mode);
	let reload = RwSignal::new(0u64);
	let loading = RwSignal::new(false);
	let status = RwSignal::new(None::<Status>);
	let degraded = RwSignal::new(None::<String>);
	let menu_position = RwSignal::new((0.0, 0.0));

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ExplorerState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_handle: Arc<Mutex<Option<WindowListenerHandle>>> = Arc::new(Mutex::new(None));
	let (state_init, animate_init, resize_handle_init) = (state.clone(), animate.clone(), resize_handle.clone());

	let tracker = RequestTracker::new();
	let running = Arc::new(AtomicBool::new(true));
	{
		let (tracker, running) = (tracker.clone(), running.clone());
		on_cleanup(move || {
			tracker.cancel_all();
			running.store(false, Ordering::SeqCst);
			if let Some(handle) = resize_handle.lock().ok().and_then(|mut slot| slot.take()) {
				handle.remove();
			}
			debug!("knowledge graph explorer disposed");
		});
	}

	// (re)load whenever the filter changes or a mutation asks for fresh data
	let api_fetch = api.clone();
	Effect::new(move |_| {
		let mut filter = GraphFilter::new(subject.get(), category.get());
		let token = reload.get();
		if token > 0 {
			filter = filter.with_cache_bust(token);
		}
		let ticket = tracker.begin();
		loading.set(true);
		let api = api_fetch.clone();
		spawn_local(async move {
			let result = load_or_fallback(&api, &filter, offline_fallback).await;
			if !ticket.is_current() {
				debug!("dropping stale graph response #{}", ticket.generation());
				return;
			}
			let snapshot = match result {
				Ok(Loaded::Live(snapshot)) => snapshot,
				Ok(Loaded::Sample { snapshot, cause }) => {
					status.set(Some(Status::info(format!(
						"Backend unavailable ({}), showing sample graph",
						cause
					))));
					snapshot
				}
				Err(e) => {
					status.set(Some(Status::error(format!("Failed to load graph: {}", e))));
					Default::default()
				}
			};
			subjects.set(snapshot.subjects);
			controller.update(|c| c.reconcile(&snapshot.model));
			model.set(snapshot.model);
			loading.set(false);
		});
	});

	// re-run placement when the data or the layout mode changes
	let state_layout = state.clone();
	Effect::new(move |_| {
		let mode = layout_mode.get();
		model.with(|m| {
			if let Some(ref mut s) = *state_layout.borrow_mut() {
				// the rebuild drops the pointer, so a drag in flight must end here too
				if matches!(s.pointer, PointerState::Dragging { .. }) {
					controller.try_update(|c| c.drag_end());
				}
				degraded.set(degraded_reason(s.rebuild(m, mode)));
			}
		});
	});

	let running_anim = running.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			let parent = canvas.parent_element();
			(
				parent
					.as_ref()
					.map(|p| p.client_width() as f64)
					.filter(|w| *w > 0.0)
					.unwrap_or(DEFAULT_WIDTH),
				parent
					.as_ref()
					.map(|p| p.client_height() as f64)
					.filter(|h| *h > 0.0)
					.unwrap_or(DEFAULT_HEIGHT),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas 2d context unavailable");
			return;
		};

		let explorer = model.with_untracked(|m| {
			ExplorerState::new(m, layout_mode.get_untracked(), settings.clone(), w, h)
		});
		degraded.set(degraded_reason(explorer.engine.outcome()));
		*state_init.borrow_mut() = Some(explorer);
		info!("knowledge graph canvas ready ({}x{})", w, h);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			let handle = window_event_listener(leptos::ev::resize, move |_| {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			});
			if let Ok(mut slot) = resize_handle_init.lock() {
				*slot = Some(handle);
			}
		}

		let (state_anim, animate_inner, running) = (state_init.clone(), animate_init.clone(), running_anim.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !running.load(Ordering::SeqCst) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME_DT);
				let scene = model
					.try_with_untracked(|m| {
						controller.try_with_untracked(|c| Scene::build(m, &s.engine, c, &s.hover))
					})
					.flatten();
				if let Some(scene) = scene {
					if let Err(e) = render::render(&scene, &s.transform, s.flow_time, s.width, s.height, &ctx) {
						warn!("frame paint failed: {:?}", e);
					}
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let perform = Callback::new(move |intent: Intent| {
		let api = api.clone();
		spawn_local(async move {
			let pending = match &intent {
				Intent::Merge(request) => Some(request.clone()),
				_ => None,
			};
			match actions::execute(&api, intent).await {
				Ok(outcome) => {
					if matches!(outcome, MutationOutcome::Merged { .. }) {
						controller.try_update(|c| c.reset());
					}
					status.try_set(Some(Status::info(outcome.message())));
					reload.try_update(|r| *r += 1);
				}
				Err(ActionError::DuplicateTitle { title }) => {
					if let Some(request) = pending {
						controller.try_update(|c| c.merge_conflict(request));
					}
					status.try_set(Some(Status::error(format!("\"{}\" already exists", title))));
				}
				Err(e) => {
					let partial = matches!(e, ActionError::PartialMerge { .. });
					status.try_set(Some(Status::error(e.to_string())));
					if partial {
						controller.try_update(|c| c.reset());
						reload.try_update(|r| *r += 1);
					}
				}
			}
		});
	});

	// turns a controller transition that may yield an intent into a request
	let submit = move |result: Option<Result<Option<Intent>, ActionError>>| match result {
		Some(Ok(Some(intent))) => perform.run(intent),
		Some(Err(e)) => status.set(Some(Status::error(e.to_string()))),
		_ => {}
	};

	let on_merge = Callback::new(move |_: ()| {
		match model.with_untracked(|m| controller.with_untracked(|c| c.merge(m))) {
			Ok(intent) => perform.run(intent),
			Err(e) => status.set(Some(Status::error(e.to_string()))),
		}
	});
	let on_save_content = Callback::new(move |_: ()| {
		submit(controller.try_update(|c| model.with_untracked(|m| c.save_content(m))));
	});
	let on_save_tags = Callback::new(move |_: ()| {
		submit(controller.try_update(|c| model.with_untracked(|m| c.save_tags(m))));
	});
	let on_confirm_delete = Callback::new(move |_: ()| {
		submit(controller.try_update(|c| model.with_untracked(|m| c.confirm_delete(m))));
	});
	let on_choose_subject = Callback::new(move |subject_id: String| {
		submit(controller.try_update(|c| model.with_untracked(|m| c.choose_subject(&subject_id, m))));
	});
	let on_resolve = Callback::new(move |resolution: Resolution| {
		if let Some(Some(intent)) = controller.try_update(|c| c.resolve_conflict(resolution)) {
			perform.run(intent);
		}
	});
	let on_refresh = Callback::new(move |_: ()| reload.update(|r| *r += 1));
	let on_download = Callback::new(move |_: ()| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if let Err(e) = download_png(&canvas.into()) {
			error!("canvas export failed: {:?}", e);
			status.set(Some(Status::error("Could not export the canvas")));
		}
	});
	let on_filter = Callback::new(move |change: FilterChange| {
		if let Some(cb) = on_filter_change {
			cb.run(change);
		}
	});

	let pointer = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
	};
	let node_id = move |idx: usize| model.with_untracked(|m| m.nodes().get(idx).map(|n| n.id.clone()));

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at_position(x, y) {
				Some(idx) => s.press(idx, x, y),
				None => s.start_pan(x, y),
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if let Some(idx) = s.drag_threshold_crossed(x, y) {
				let allowed = node_id(idx)
					.and_then(|id| controller.try_update(|c| c.drag_start(&id)))
					.unwrap_or(false);
				if allowed {
					s.begin_drag(idx);
				} else {
					s.pointer = PointerState::Idle;
				}
			}

			if matches!(s.pointer, PointerState::Dragging { .. }) {
				s.drag_to(x, y);
			} else if s.pan.active {
				s.pan_to(x, y);
			} else {
				let hovered = s.node_at_position(x, y);
				model.with_untracked(|m| s.set_hover(hovered, m));
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			let background_click = s.end_pan();
			match s.release() {
				PointerState::Dragging { .. } => controller.update(|c| c.drag_end()),
				PointerState::Pressed { idx, .. } => {
					if let Some(id) = node_id(idx) {
						controller.update(|c| c.click(&id));
					}
				}
				PointerState::Idle if background_click => controller.update(|c| c.click_background()),
				PointerState::Idle => {}
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_pan();
			if matches!(s.release(), PointerState::Dragging { .. }) {
				controller.update(|c| c.drag_end());
			}
			model.with_untracked(|m| s.set_hover(None, m));
		}
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		let hit = state_cm.borrow().as_ref().and_then(|s| s.node_at_position(x, y));
		let Some(idx) = hit else {
			return;
		};
		let node = model.with_untracked(|m| m.nodes().get(idx).cloned());
		if let Some(node) = node {
			menu_position.set((x, y));
			controller.update(|c| c.context_menu(&node));
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Escape" {
			controller.update(|c| c.escape());
		}
	};

	let stage_style = if fullscreen {
		"position: relative; width: 100vw; height: 100vh;"
	} else {
		"position: relative; width: 100%; height: 100%;"
	};

	view! {
		<div class="knowledge-graph" tabindex="0" on:keydown=on_keydown>
			<Toolbar
				subjects=subjects
				subject=subject
				category=category
				layout_mode=layout_mode
				controller=controller
				loading=loading
				on_filter_change=on_filter
				on_refresh=on_refresh
				on_merge=on_merge
				on_download=on_download
			/>
			<div class="graph-stage" style=stage_style>
				<canvas
					node_ref=canvas_ref
					class="knowledge-graph-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:contextmenu=on_contextmenu
					on:wheel=on_wheel
					style="display: block; cursor: grab;"
				/>
				<ContextMenu model=model controller=controller position=menu_position />
				<DetailPanel model=model controller=controller />
				<ContentEditor controller=controller on_save=on_save_content />
				<TagEditor controller=controller on_save=on_save_tags />
				<MoveDialog controller=controller subjects=subjects on_choose=on_choose_subject />
				<ConfirmDelete model=model controller=controller on_confirm=on_confirm_delete />
				<ConflictDialog controller=controller on_resolve=on_resolve />
			</div>
			<StatusBar status=status loading=loading degraded=degraded />
		</div>
	}
}

fn degraded_reason(outcome: &LayoutOutcome) -> Option<String> {
	match outcome {
		LayoutOutcome::Planned => None,
		LayoutOutcome::Degraded { reason } => Some(reason.clone()),
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(DEFAULT_WIDTH),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(DEFAULT_HEIGHT),
	)
}

/// Saves the current frame through a temporary download link.
fn download_png(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
	let url = canvas.to_data_url_with_type("image/png")?;
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	anchor.set_href(&url);
	anchor.set_download("knowledge-graph.png");
	anchor.click();
	Ok(())
}
