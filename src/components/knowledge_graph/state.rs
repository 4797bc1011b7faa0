use std::collections::HashSet;

use crate::graph::GraphModel;
use crate::layout::{LayoutEngine, LayoutMode, LayoutOutcome, LayoutSettings, Viewport};

/// Extra hit radius around nodes, in screen pixels.
pub const HIT_SLACK: f64 = 4.0;
/// Pointer travel before a press on a node becomes a drag.
pub const DRAG_THRESHOLD: f64 = 4.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A mouse press on a node, not yet known to be a click or a drag.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerState {
	Idle,
	Pressed { idx: usize, start_x: f64, start_y: f64 },
	Dragging { idx: usize },
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	pub(super) delay_t: f64,
}

impl HoverState {
	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.node == Some(idx)
			|| self.neighbors.contains(&idx)
			|| self.prev_node == Some(idx)
			|| self.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.node == Some(idx) || self.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.node.is_some() || self.prev_node.is_some()
	}

	/// Eases the highlight in after a short delay and out on leave.
	pub fn advance(&mut self, dt: f64) {
		let (target, delay, speed) = if self.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.node.is_some() {
			self.delay_t = (self.delay_t + dt).min(delay);
			if self.delay_t >= delay {
				self.highlight_t += (target - self.highlight_t) * speed * dt;
			}
		} else {
			self.highlight_t += (target - self.highlight_t) * speed * dt;
			if self.highlight_t < 0.01 {
				self.highlight_t = 0.0;
				self.prev_node = None;
				self.prev_neighbors.clear();
			}
		}
	}
}

/// Per-canvas view state: the layout engine plus pan, zoom, pointer and hover.
pub struct ExplorerState {
	pub engine: LayoutEngine,
	pub settings: LayoutSettings,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub pointer: PointerState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
}

impl ExplorerState {
	pub fn new(model: &GraphModel, mode: LayoutMode, settings: LayoutSettings, width: f64, height: f64) -> Self {
		let engine = LayoutEngine::new(model, mode, Viewport::new(width, height), &settings);
		Self {
			engine,
			settings,
			transform: ViewTransform::default(),
			pan: PanState::default(),
			pointer: PointerState::Idle,
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
		}
	}

	/// Re-runs placement for a new model or mode; pan and zoom are kept.
	pub fn rebuild(&mut self, model: &GraphModel, mode: LayoutMode) -> &LayoutOutcome {
		self.engine = LayoutEngine::new(model, mode, self.viewport(), &self.settings);
		self.pointer = PointerState::Idle;
		self.hover = HoverState::default();
		self.engine.outcome()
	}

	pub fn viewport(&self) -> Viewport {
		Viewport::new(self.width, self.height)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.engine.hit_test(gx, gy, HIT_SLACK / self.transform.k)
	}

	pub fn set_hover(&mut self, node: Option<usize>, model: &GraphModel) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the previous focus around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover.neighbors = model.neighbors(idx);
		}
	}

	/// Press on a node; becomes a drag once the pointer travels far enough.
	pub fn press(&mut self, idx: usize, sx: f64, sy: f64) {
		self.pointer = PointerState::Pressed {
			idx,
			start_x: sx,
			start_y: sy,
		};
	}

	/// Returns the node index when a press just crossed the drag threshold.
	pub fn drag_threshold_crossed(&self, sx: f64, sy: f64) -> Option<usize> {
		match self.pointer {
			PointerState::Pressed { idx, start_x, start_y }
				if (sx - start_x).hypot(sy - start_y) >= DRAG_THRESHOLD =>
			{
				Some(idx)
			}
			_ => None,
		}
	}

	pub fn begin_drag(&mut self, idx: usize) {
		self.pointer = PointerState::Dragging { idx };
		self.engine.drag_start(idx);
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		if let PointerState::Dragging { idx } = self.pointer {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			self.engine.drag_to(idx, gx, gy);
		}
	}

	/// Ends any press; returns what the gesture was.
	pub fn release(&mut self) -> PointerState {
		let pointer = std::mem::replace(&mut self.pointer, PointerState::Idle);
		if let PointerState::Dragging { idx } = pointer {
			self.engine.drag_end(idx);
		}
		pointer
	}

	pub fn start_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if dx.hypot(dy) >= DRAG_THRESHOLD {
			self.pan.moved = true;
		}
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
	}

	/// Returns `true` when the background press was a click rather than a pan.
	pub fn end_pan(&mut self) -> bool {
		let clicked = self.pan.active && !self.pan.moved;
		self.pan.active = false;
		clicked
	}

	/// Zooms about the cursor.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// One animation frame: a physics step (skipped once settled) and hover easing.
	pub fn tick(&mut self, dt: f64) {
		self.engine.tick();
		self.flow_time += dt;
		self.hover.advance(dt);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.engine.set_viewport(self.viewport());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{EdgeType, GraphEdge, GraphNode, NodeType};

	fn model() -> GraphModel {
		GraphModel::from_parts(
			vec![
				GraphNode::new("a", "A", NodeType::KnowledgePoint),
				GraphNode::new("b", "B", NodeType::KnowledgePoint),
				GraphNode::new("c", "C", NodeType::KnowledgePoint),
			],
			vec![GraphEdge::new("a", "b", EdgeType::Relation)],
		)
	}

	fn state() -> ExplorerState {
		ExplorerState::new(&model(), LayoutMode::Circular, LayoutSettings::default(), 800.0, 600.0)
	}

	#[test]
	fn test_screen_to_graph_inverts_transform() {
		let mut state = state();
		state.transform = ViewTransform { x: 100.0, y: 50.0, k: 2.0 };
		assert_eq!(state.screen_to_graph(300.0, 250.0), (100.0, 100.0));
	}

	#[test]
	fn test_node_at_position_uses_layout() {
		let state = state();
		let (x, y) = state.engine.position(0).unwrap();
		assert_eq!(state.node_at_position(x, y), Some(0));
		assert_eq!(state.node_at_position(400.0, 300.0), None);
	}

	#[test]
	fn test_press_becomes_drag_past_threshold() {
		let mut state = state();
		state.press(1, 10.0, 10.0);
		assert_eq!(state.drag_threshold_crossed(11.0, 11.0), None);
		assert_eq!(state.drag_threshold_crossed(20.0, 10.0), Some(1));
		state.begin_drag(1);
		state.drag_to(123.0, 45.0);
		assert_eq!(state.engine.position(1), Some((123.0, 45.0)));
		assert_eq!(state.release(), PointerState::Dragging { idx: 1 });
		assert_eq!(state.pointer, PointerState::Idle);
	}

	#[test]
	fn test_rebuild_cancels_drag() {
		let mut state = state();
		state.press(0, 0.0, 0.0);
		state.begin_drag(0);
		state.rebuild(&model(), LayoutMode::Force);
		assert_eq!(state.pointer, PointerState::Idle);
		assert!(!state.engine.positions()[0].is_pinned());
		assert_eq!(state.release(), PointerState::Idle);
	}

	#[test]
	fn test_pan_versus_click() {
		let mut state = state();
		state.start_pan(0.0, 0.0);
		state.pan_to(1.0, 1.0);
		assert!(state.end_pan());
		assert_eq!(state.transform.x, 1.0);
		state.start_pan(0.0, 0.0);
		state.pan_to(40.0, 0.0);
		assert!(!state.end_pan());
		// each pan continues from where the last one left off
		assert_eq!(state.transform.x, 41.0);
	}

	#[test]
	fn test_zoom_keeps_cursor_fixed() {
		let mut state = state();
		let before = state.screen_to_graph(200.0, 100.0);
		state.zoom(200.0, 100.0, -1.0);
		let after = state.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		assert!(state.transform.k > 1.0);
	}

	#[test]
	fn test_hover_collects_neighbors_and_fades() {
		let model = model();
		let mut state = state();
		state.set_hover(Some(0), &model);
		assert!(state.hover.is_highlighted(1));
		assert!(!state.hover.is_highlighted(2));
		state.set_hover(None, &model);
		assert!(state.hover.has_active_highlight());
		for _ in 0..1_000 {
			state.hover.advance(0.016);
		}
		assert!(!state.hover.has_active_highlight());
	}
}
