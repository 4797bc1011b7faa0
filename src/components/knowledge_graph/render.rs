use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::{Scene, SceneEdge, SceneNode};
use super::state::ViewTransform;
use crate::graph::EdgeType;

const BACKGROUND: &str = "#1a1a2e";
const SELECTED_RING: &str = "#ffffff";
const FOCUS_RING: &str = "#ffd54f";

/// Paints one frame. Errors come from the canvas API and leave the next frame unaffected.
pub fn render(
	scene: &Scene,
	transform: &ViewTransform,
	flow_time: f64,
	width: f64,
	height: f64,
	ctx: &CanvasRenderingContext2d,
) -> Result<(), JsValue> {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let painted = ctx
		.translate(transform.x, transform.y)
		.and_then(|_| ctx.scale(transform.k, transform.k))
		.and_then(|_| draw_edges(scene, transform.k, flow_time, ctx))
		.and_then(|_| draw_nodes(scene, transform.k, ctx));
	ctx.restore();
	ctx.set_global_alpha(1.0);
	painted
}

fn draw_edges(scene: &Scene, k: f64, flow_time: f64, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(flow_time * 30.0) % (dash + gap);
	let t = scene.highlight;

	for edge in &scene.edges {
		let (dx, dy) = (edge.x2 - edge.x1, edge.y2 - edge.y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// highlighted edges brighten, the rest dim while a hover is active
		let (alpha, width) = if !scene.has_highlight {
			(1.0, line_width)
		} else if edge.highlighted {
			(1.0, line_width * (1.0 + 0.3 * t))
		} else {
			(1.0 - 0.75 * t, line_width * (1.0 - 0.3 * t))
		};
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(edge.color);
		ctx.set_line_width(width);

		if edge.edge_type == EdgeType::Semantic {
			ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			))?;
			ctx.set_line_dash_offset(dash_offset);
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let head = if edge.edge_type == EdgeType::Hierarchy {
			arrow_size
		} else {
			0.0
		};
		ctx.begin_path();
		ctx.move_to(edge.x1 + ux * edge.source_radius, edge.y1 + uy * edge.source_radius);
		ctx.line_to(
			edge.x2 - ux * (edge.target_radius + head),
			edge.y2 - uy * (edge.target_radius + head),
		);
		ctx.stroke();
		ctx.set_line_dash(&js_sys::Array::new())?;

		if edge.edge_type == EdgeType::Hierarchy {
			draw_arrow(edge, ux, uy, arrow_size, ctx);
		}
		if edge.highlighted && t > 0.5 {
			if let Some(label) = &edge.label {
				ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
				ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
				ctx.fill_text(label, (edge.x1 + edge.x2) / 2.0, (edge.y1 + edge.y2) / 2.0)?;
			}
		}
	}
	ctx.set_global_alpha(1.0);
	Ok(())
}

fn draw_arrow(edge: &SceneEdge, ux: f64, uy: f64, arrow_size: f64, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(edge.color);
	let (tip_x, tip_y) = (edge.x2 - ux * edge.target_radius, edge.y2 - uy * edge.target_radius);
	let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
	let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_nodes(scene: &Scene, k: f64, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
	let t = scene.highlight;

	// dimmed pass first so highlighted nodes paint on top
	for node in scene.nodes.iter().filter(|n| !(scene.has_highlight && n.highlighted)) {
		let alpha = if scene.has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		let radius = if scene.has_highlight {
			node.radius * (1.0 - 0.15 * t)
		} else {
			node.radius
		};
		draw_node(node, radius, alpha, k, ctx)?;
	}

	if !scene.has_highlight {
		return Ok(());
	}

	for node in scene.nodes.iter().filter(|n| n.highlighted) {
		let (radius, glow_radius) = if node.hovered {
			(node.radius * (1.0 + 0.35 * t), node.radius * (1.8 + 1.2 * t))
		} else {
			(node.radius * (1.0 + 0.2 * t), node.radius * (1.4 + 0.6 * t))
		};

		if t > 0.01 {
			let gradient = ctx.create_radial_gradient(node.x, node.y, radius * 0.3, node.x, node.y, glow_radius)?;
			let alpha = if node.hovered { 0.35 * t } else { 0.2 * t };
			gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha))?;
			gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3))?;
			gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)")?;
			ctx.begin_path();
			ctx.arc(node.x, node.y, glow_radius, 0.0, 2.0 * PI)?;
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
			ctx.fill();
		}

		draw_node(node, radius, 1.0, k, ctx)?;
	}
	Ok(())
}

fn draw_node(node: &SceneNode, radius: f64, alpha: f64, k: f64, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI)?;
	ctx.set_fill_style_str(node.color);
	ctx.fill();

	if node.selected || node.focused {
		ctx.begin_path();
		ctx.arc(node.x, node.y, radius + 3.0 / k, 0.0, 2.0 * PI)?;
		ctx.set_stroke_style_str(if node.focused { FOCUS_RING } else { SELECTED_RING });
		ctx.set_line_width(2.0 / k);
		ctx.stroke();
	}

	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.85));
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	ctx.fill_text(&node.label, node.x + radius + 3.0, node.y + 3.0)?;
	ctx.set_global_alpha(1.0);
	Ok(())
}
