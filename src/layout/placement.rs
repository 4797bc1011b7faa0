//! Deterministic seed placements: phyllotaxis, tidy tree, level bands and ring.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::PI;

use thiserror::Error;

use super::Viewport;
use crate::graph::{EdgeType, GraphModel};

pub const MIN_BAND_SPACING: f64 = 120.0;
pub const MIN_NODE_SPACING: f64 = 100.0;
/// Vertical gap between tree depths; deep trees grow past the viewport.
pub const MIN_DEPTH_SPACING: f64 = 120.0;
pub const LAYOUT_MARGIN: f64 = 60.0;
const MIN_RING_RADIUS: f64 = 50.0;
const PHYLLOTAXIS_RADIUS: f64 = 10.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
	#[error("graph has no hierarchy root")]
	NoRoot,
	#[error("{count} node(s) unreachable from root {root} (detached or cyclic parents)")]
	Unreachable { root: String, count: usize },
}

/// Nodes that parent at least one hierarchy edge and are the child of none.
pub fn find_roots(model: &GraphModel) -> Vec<usize> {
	let n = model.len();
	let mut has_parent = vec![false; n];
	let mut has_child = vec![false; n];
	for (s, t, edge) in model.indexed_edges() {
		if edge.edge_type == EdgeType::Hierarchy {
			has_child[s] = true;
			has_parent[t] = true;
		}
	}
	(0..n).filter(|&i| has_child[i] && !has_parent[i]).collect()
}

/// d3-style initial placement: a sunflower spiral around `(cx, cy)`.
pub fn phyllotaxis(n: usize, cx: f64, cy: f64) -> Vec<(f64, f64)> {
	let angle = PI * (3.0 - 5f64.sqrt());
	(0..n)
		.map(|i| {
			let radius = PHYLLOTAXIS_RADIUS * (0.5 + i as f64).sqrt();
			let theta = i as f64 * angle;
			(cx + radius * theta.cos(), cy + radius * theta.sin())
		})
		.collect()
}

/// Top-down tidy tree. The first hierarchy edge into a node names its parent;
/// every node must be reachable from `root`.
pub fn tree_layout(
	model: &GraphModel,
	root: usize,
	viewport: Viewport,
) -> Result<Vec<(f64, f64)>, HierarchyError> {
	let n = model.len();
	if root >= n {
		return Err(HierarchyError::NoRoot);
	}

	let mut parent: Vec<Option<usize>> = vec![None; n];
	let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
	for (s, t, edge) in model.indexed_edges() {
		if edge.edge_type == EdgeType::Hierarchy && t != root && parent[t].is_none() {
			parent[t] = Some(s);
			children[s].push(t);
		}
	}

	let mut depth = vec![usize::MAX; n];
	depth[root] = 0;
	let mut queue = VecDeque::from([root]);
	let mut reached = 1;
	while let Some(node) = queue.pop_front() {
		for &child in &children[node] {
			if depth[child] == usize::MAX {
				depth[child] = depth[node] + 1;
				reached += 1;
				queue.push_back(child);
			}
		}
	}
	if reached < n {
		return Err(HierarchyError::Unreachable {
			root: model.nodes()[root].id.clone(),
			count: n - reached,
		});
	}

	// post-order: leaves take consecutive slots, parents center over children
	let mut slot = vec![0.0_f64; n];
	let mut next_leaf = 0.0_f64;
	let mut stack = vec![(root, false)];
	while let Some((node, expanded)) = stack.pop() {
		if children[node].is_empty() {
			slot[node] = next_leaf;
			next_leaf += 1.0;
		} else if expanded {
			let first = slot[children[node][0]];
			let last = slot[children[node][children[node].len() - 1]];
			slot[node] = (first + last) / 2.0;
		} else {
			stack.push((node, true));
			for &child in children[node].iter().rev() {
				stack.push((child, false));
			}
		}
	}

	let leaves = next_leaf.max(1.0);
	let max_depth = depth.iter().copied().max().unwrap_or(0).max(1) as f64;
	let width = (viewport.width - 2.0 * LAYOUT_MARGIN).max(0.0);
	let height = (viewport.height - 2.0 * LAYOUT_MARGIN).max(0.0);
	let y_step = (height / max_depth).max(MIN_DEPTH_SPACING);
	let x_step = if leaves > 1.0 { width / (leaves - 1.0) } else { 0.0 };
	let origin_x = if leaves > 1.0 {
		LAYOUT_MARGIN
	} else {
		viewport.width / 2.0
	};

	Ok((0..n)
		.map(|i| {
			(
				origin_x + slot[i] * x_step,
				LAYOUT_MARGIN + depth[i] as f64 * y_step,
			)
		})
		.collect())
}

/// Grid seeded by level: one horizontal band per distinct level.
#[derive(Clone, Debug, PartialEq)]
pub struct BandLayout {
	pub positions: Vec<(f64, f64)>,
	/// Target `y` per node.
	pub band_y: Vec<f64>,
	pub band_spacing: f64,
}

pub fn band_layout(model: &GraphModel, viewport: Viewport) -> BandLayout {
	let mut bands: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
	for (i, node) in model.nodes().iter().enumerate() {
		bands.entry(node.level).or_default().push(i);
	}

	let (cx, cy) = viewport.center();
	let band_count = bands.len().max(1);
	let usable_height = (viewport.height - 2.0 * LAYOUT_MARGIN).max(0.0);
	let band_spacing = if band_count > 1 {
		(usable_height / (band_count - 1) as f64).max(MIN_BAND_SPACING)
	} else {
		MIN_BAND_SPACING
	};
	let top = cy - band_spacing * (band_count - 1) as f64 / 2.0;
	let usable_width = (viewport.width - 2.0 * LAYOUT_MARGIN).max(0.0);

	let mut positions = vec![(cx, cy); model.len()];
	let mut band_y = vec![cy; model.len()];
	for (band, members) in bands.values().enumerate() {
		let y = top + band as f64 * band_spacing;
		let k = members.len();
		let spacing = (usable_width / k as f64).max(MIN_NODE_SPACING);
		let start = cx - spacing * (k - 1) as f64 / 2.0;
		for (slot, &idx) in members.iter().enumerate() {
			positions[idx] = (start + slot as f64 * spacing, y);
			band_y[idx] = y;
		}
	}

	BandLayout {
		positions,
		band_y,
		band_spacing,
	}
}

/// Equal angular steps starting at twelve o'clock.
pub fn circular_layout(n: usize, viewport: Viewport) -> Vec<(f64, f64)> {
	let (cx, cy) = viewport.center();
	if n == 1 {
		return vec![(cx, cy)];
	}
	let radius = ring_radius(viewport);
	(0..n)
		.map(|i| {
			let angle = 2.0 * PI * i as f64 / n as f64 - PI / 2.0;
			(cx + radius * angle.cos(), cy + radius * angle.sin())
		})
		.collect()
}

pub fn ring_radius(viewport: Viewport) -> f64 {
	(viewport.width.min(viewport.height) / 2.0 - LAYOUT_MARGIN).max(MIN_RING_RADIUS)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphEdge, GraphNode, NodeType};

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0)
	}

	fn node(id: &str, level: u32) -> GraphNode {
		GraphNode::new(id, id, NodeType::KnowledgePoint).with_level(level)
	}

	fn tree() -> GraphModel {
		GraphModel::from_parts(
			vec![node("r", 0), node("a", 1), node("b", 1), node("a1", 2), node("a2", 2)],
			vec![
				GraphEdge::new("r", "a", EdgeType::Hierarchy),
				GraphEdge::new("r", "b", EdgeType::Hierarchy),
				GraphEdge::new("a", "a1", EdgeType::Hierarchy),
				GraphEdge::new("a", "a2", EdgeType::Hierarchy),
				GraphEdge::new("a1", "b", EdgeType::Relation),
			],
		)
	}

	#[test]
	fn test_find_roots_ignores_isolated_and_non_hierarchy() {
		let model = GraphModel::from_parts(
			vec![node("1", 0), node("2", 1), node("3", 1)],
			vec![GraphEdge::new("2", "3", EdgeType::Relation)],
		);
		assert!(find_roots(&model).is_empty());
		assert_eq!(find_roots(&tree()), vec![0]);
	}

	#[test]
	fn test_tree_layout_depth_and_centering() {
		let model = tree();
		let pos = tree_layout(&model, 0, viewport()).unwrap();
		// depth increases downward
		assert!(pos[0].1 < pos[1].1);
		assert_eq!(pos[1].1, pos[2].1);
		assert!(pos[1].1 < pos[3].1);
		// parent centered over its children
		assert!((pos[1].0 - (pos[3].0 + pos[4].0) / 2.0).abs() < 1e-9);
		// leaves in order, within the viewport
		assert!(pos[3].0 < pos[4].0 && pos[4].0 < pos[2].0);
		for (x, y) in pos {
			assert!((0.0..=800.0).contains(&x));
			assert!((0.0..=600.0).contains(&y));
		}
	}

	#[test]
	fn test_deep_tree_keeps_depth_spacing() {
		let nodes: Vec<GraphNode> = (0..10).map(|i| node(&format!("n{}", i), i)).collect();
		let edges: Vec<GraphEdge> = (1..10)
			.map(|i| GraphEdge::new(format!("n{}", i - 1), format!("n{}", i), EdgeType::Hierarchy))
			.collect();
		let model = GraphModel::from_parts(nodes, edges);
		let pos = tree_layout(&model, 0, viewport()).unwrap();
		for pair in pos.windows(2) {
			assert!(pair[1].1 - pair[0].1 >= MIN_DEPTH_SPACING - 1e-9);
		}
	}

	#[test]
	fn test_tree_layout_rejects_detached_cycle() {
		let model = GraphModel::from_parts(
			vec![node("r", 0), node("a", 1), node("x", 1), node("y", 1)],
			vec![
				GraphEdge::new("r", "a", EdgeType::Hierarchy),
				GraphEdge::new("x", "y", EdgeType::Hierarchy),
				GraphEdge::new("y", "x", EdgeType::Hierarchy),
			],
		);
		assert_eq!(find_roots(&model), vec![0]);
		assert_eq!(
			tree_layout(&model, 0, viewport()),
			Err(HierarchyError::Unreachable {
				root: "r".into(),
				count: 2
			})
		);
	}

	#[test]
	fn test_band_layout_orders_levels_and_spaces_nodes() {
		let model = GraphModel::from_parts(
			vec![node("a", 2), node("b", 0), node("c", 2), node("d", 5), node("e", 2)],
			vec![],
		);
		let bands = band_layout(&model, Viewport::new(200.0, 200.0));
		assert!(bands.band_spacing >= MIN_BAND_SPACING);
		assert!(bands.band_y[1] < bands.band_y[0]);
		assert!(bands.band_y[0] < bands.band_y[3]);
		assert_eq!(bands.band_y[0], bands.band_y[2]);
		assert!(bands.positions[2].0 - bands.positions[0].0 >= MIN_NODE_SPACING);
		// level-2 band is centered horizontally
		let mid = (bands.positions[0].0 + bands.positions[4].0) / 2.0;
		assert!((mid - 100.0).abs() < 1e-9);
	}

	#[test]
	fn test_circular_layout_on_ring() {
		let pos = circular_layout(6, viewport());
		let radius = ring_radius(viewport());
		for (x, y) in &pos {
			let d = ((x - 400.0).powi(2) + (y - 300.0).powi(2)).sqrt();
			assert!((d - radius).abs() < 1e-9);
		}
		assert!((pos[0].0 - 400.0).abs() < 1e-9);
		assert!(pos[0].1 < 300.0);
	}
}
