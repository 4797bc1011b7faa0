//! Per-frame draw list. The painter only ever sees a [`Scene`].

use super::state::HoverState;
use crate::graph::{EdgeType, GraphModel, NodeType};
use crate::interaction::InteractionController;
use crate::layout::{LayoutEngine, style};

const MAX_LABEL_CHARS: usize = 24;

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub color: &'static str,
	pub label: String,
	pub node_type: NodeType,
	pub selected: bool,
	pub focused: bool,
	pub hovered: bool,
	pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub source_radius: f64,
	pub target_radius: f64,
	pub edge_type: EdgeType,
	pub color: &'static str,
	pub label: Option<String>,
	pub highlighted: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<SceneNode>,
	pub edges: Vec<SceneEdge>,
	/// Hover highlight progress, 0 to 1.
	pub highlight: f64,
	pub has_highlight: bool,
}

impl Scene {
	pub fn build(
		model: &GraphModel,
		engine: &LayoutEngine,
		interaction: &InteractionController,
		hover: &HoverState,
	) -> Self {
		let selected = interaction.selected();
		let focus = interaction.focus();

		let nodes: Vec<SceneNode> = model
			.nodes()
			.iter()
			.enumerate()
			.filter_map(|(i, node)| {
				let (x, y) = engine.position(i)?;
				Some(SceneNode {
					x,
					y,
					radius: engine.radius(i),
					color: style::node_color(node.node_type),
					label: truncate(&node.name),
					node_type: node.node_type,
					selected: selected.contains(&node.id.as_str()),
					focused: focus == Some(node.id.as_str()),
					hovered: hover.is_hovered(i),
					highlighted: hover.is_highlighted(i),
				})
			})
			.collect();

		let edges = model
			.indexed_edges()
			.filter_map(|(s, t, edge)| {
				let (x1, y1) = engine.position(s)?;
				let (x2, y2) = engine.position(t)?;
				Some(SceneEdge {
					x1,
					y1,
					x2,
					y2,
					source_radius: engine.radius(s),
					target_radius: engine.radius(t),
					edge_type: edge.edge_type,
					color: style::edge_color(edge.edge_type),
					label: edge.label.clone(),
					highlighted: hover.is_highlighted(s) && hover.is_highlighted(t),
				})
			})
			.collect();

		Self {
			nodes,
			edges,
			highlight: ease_out_cubic(hover.highlight_t),
			has_highlight: hover.has_active_highlight(),
		}
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn truncate(name: &str) -> String {
	if name.chars().count() <= MAX_LABEL_CHARS {
		return name.to_string();
	}
	let mut label: String = name.chars().take(MAX_LABEL_CHARS - 1).collect();
	label.push('…');
	label
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphEdge, GraphNode};
	use crate::layout::{LayoutMode, LayoutSettings, Viewport};

	fn model() -> GraphModel {
		GraphModel::from_parts(
			vec![
				GraphNode::new("s", "Mathematics", NodeType::Subject),
				GraphNode::new("a", "A rather long knowledge point name", NodeType::AiContent),
				GraphNode::new("b", "B", NodeType::AiContent),
			],
			vec![
				GraphEdge::new("s", "a", EdgeType::Hierarchy),
				GraphEdge::new("a", "b", EdgeType::Semantic).with_label("geometry"),
			],
		)
	}

	fn engine(model: &GraphModel) -> LayoutEngine {
		LayoutEngine::new(
			model,
			LayoutMode::Circular,
			Viewport::new(600.0, 600.0),
			&LayoutSettings::default(),
		)
	}

	#[test]
	fn test_scene_mirrors_layout() {
		let model = model();
		let engine = engine(&model);
		let scene = Scene::build(&model, &engine, &InteractionController::new(), &HoverState::default());

		assert_eq!(scene.nodes.len(), 3);
		assert_eq!(scene.edges.len(), 2);
		assert_eq!((scene.nodes[1].x, scene.nodes[1].y), engine.position(1).unwrap());
		assert_eq!(scene.nodes[0].color, style::node_color(NodeType::Subject));
		assert!(scene.nodes[1].label.ends_with('…'));
		assert_eq!(scene.nodes[1].label.chars().count(), MAX_LABEL_CHARS);
		assert_eq!(scene.edges[1].label.as_deref(), Some("geometry"));
		assert!(!scene.has_highlight);
	}

	#[test]
	fn test_selection_flags() {
		let model = model();
		let engine = engine(&model);
		let mut controller = InteractionController::new();
		controller.toggle_multi_select();
		controller.click("a");
		controller.click("b");
		let scene = Scene::build(&model, &engine, &controller, &HoverState::default());
		let selected: Vec<_> = scene.nodes.iter().map(|n| n.selected).collect();
		assert_eq!(selected, vec![false, true, true]);

		controller.toggle_multi_select();
		controller.click("s");
		let scene = Scene::build(&model, &engine, &controller, &HoverState::default());
		assert!(scene.nodes[0].focused && scene.nodes[0].selected);
		assert!(!scene.nodes[1].focused);
	}

	#[test]
	fn test_hover_highlights_incident_edges() {
		let model = model();
		let engine = engine(&model);
		let hover = HoverState {
			node: Some(0),
			neighbors: model.neighbors(0),
			highlight_t: 1.0,
			..HoverState::default()
		};
		let scene = Scene::build(&model, &engine, &InteractionController::new(), &hover);
		assert!(scene.has_highlight);
		assert_eq!(scene.highlight, 1.0);
		assert!(scene.nodes[0].hovered);
		assert!(scene.edges[0].highlighted);
		assert!(!scene.edges[1].highlighted);
	}
}
