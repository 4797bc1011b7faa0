//! Layout engine: selects a placement strategy for a [`GraphModel`] and owns
//! the simulation that relaxes it.
//!
//! The engine is rebuilt whenever the model or the [`LayoutMode`] changes and
//! then ticked once per frame. Hierarchical layout needs exactly one root to
//! draw a tree; with several roots it falls back to level bands, and with none
//! (or on an inconsistent hierarchy) it degrades to the plain force layout.
//!
//! # Usage
//! ```ignore
//! let mut engine = LayoutEngine::new(&model, LayoutMode::Hierarchical, viewport, &settings);
//!
//! // Each frame:
//! engine.tick();
//! for (node, state) in model.nodes().iter().zip(engine.positions()) {
//!     draw_circle(state.x, state.y, style::node_radius(node));
//! }
//! ```

pub mod forces;
pub mod placement;
pub mod simulation;
pub mod style;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{EdgeType, GraphModel};
use forces::{Force, Link, Spring};
use placement::{HierarchyError, band_layout, circular_layout, find_roots, phyllotaxis, tree_layout};
use simulation::{BandConstraint, NodeLayoutState, Simulation, SimulationParams};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
	#[default]
	Force,
	Hierarchical,
	Circular,
}

impl LayoutMode {
	pub const ALL: [LayoutMode; 3] = [
		LayoutMode::Force,
		LayoutMode::Hierarchical,
		LayoutMode::Circular,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			LayoutMode::Force => "force",
			LayoutMode::Hierarchical => "hierarchical",
			LayoutMode::Circular => "circular",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.as_str() == value.trim())
	}

	pub fn label(&self) -> &'static str {
		match self {
			LayoutMode::Force => "Force",
			LayoutMode::Hierarchical => "Hierarchy",
			LayoutMode::Circular => "Circle",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

/// Tunables for the force layout. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
	pub repulsion: f64,
	pub hierarchy_distance: f64,
	pub relation_distance: f64,
	pub semantic_distance: f64,
	pub hierarchy_stiffness: f64,
	pub relation_stiffness: f64,
	pub semantic_stiffness: f64,
	pub center_strength: f64,
	pub collision_margin: f64,
	/// Alpha target while a node is dragged in force mode.
	pub drag_alpha_target: f64,
	pub simulation: SimulationParams,
}

impl Default for LayoutSettings {
	fn default() -> Self {
		Self {
			repulsion: -300.0,
			hierarchy_distance: 80.0,
			relation_distance: 110.0,
			semantic_distance: 160.0,
			hierarchy_stiffness: 1.0,
			relation_stiffness: 0.6,
			semantic_stiffness: 0.3,
			center_strength: 0.1,
			collision_margin: 6.0,
			drag_alpha_target: 0.3,
			simulation: SimulationParams::default(),
		}
	}
}

impl LayoutSettings {
	fn link_geometry(&self, edge_type: EdgeType) -> (f64, f64) {
		match edge_type {
			EdgeType::Hierarchy => (self.hierarchy_distance, self.hierarchy_stiffness),
			EdgeType::Relation => (self.relation_distance, self.relation_stiffness),
			EdgeType::Semantic => (self.semantic_distance, self.semantic_stiffness),
		}
	}
}

// single-root tree smoothing
const TREE_LINK_DISTANCE: f64 = 60.0;
const TREE_ALPHA_DECAY: f64 = 0.1;
// multi-root bands
const BAND_Y_STRENGTH: f64 = 0.9;
const BAND_X_STRENGTH: f64 = 0.05;
const BAND_LINK_STIFFNESS: f64 = 0.1;
const BAND_ALPHA_DECAY: f64 = 0.01;
const BAND_VELOCITY_DECAY: f64 = 0.6;
const BAND_TOLERANCE_FRACTION: f64 = 0.25;
// ring
const RING_ALPHA_DECAY: f64 = 0.1;

/// Which algorithm actually ran for the requested mode.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutOutcome {
	Planned,
	Degraded { reason: String },
}

pub struct LayoutEngine {
	requested: LayoutMode,
	effective: LayoutMode,
	outcome: LayoutOutcome,
	simulation: Simulation,
	radii: Vec<f64>,
	drag_alpha_target: f64,
}

impl LayoutEngine {
	pub fn new(
		model: &GraphModel,
		mode: LayoutMode,
		viewport: Viewport,
		settings: &LayoutSettings,
	) -> Self {
		let radii: Vec<f64> = model.nodes().iter().map(style::node_radius).collect();
		let (effective, outcome, simulation) = match mode {
			LayoutMode::Force => (
				LayoutMode::Force,
				LayoutOutcome::Planned,
				force_simulation(model, viewport, settings, &radii),
			),
			LayoutMode::Hierarchical => match hierarchical_simulation(model, viewport, settings, &radii) {
				Ok(simulation) => (LayoutMode::Hierarchical, LayoutOutcome::Planned, simulation),
				Err(e) => {
					warn!("hierarchical layout unavailable, using force layout: {}", e);
					(
						LayoutMode::Force,
						LayoutOutcome::Degraded {
							reason: e.to_string(),
						},
						force_simulation(model, viewport, settings, &radii),
					)
				}
			},
			LayoutMode::Circular => (
				LayoutMode::Circular,
				LayoutOutcome::Planned,
				circular_simulation(model, viewport, settings),
			),
		};
		info!(
			"layout {} over {} nodes / {} edges",
			effective.as_str(),
			model.len(),
			model.edges().len()
		);

		Self {
			requested: mode,
			effective,
			outcome,
			simulation,
			radii,
			drag_alpha_target: settings.drag_alpha_target,
		}
	}

	/// One bounded physics step; a no-op once settled.
	pub fn tick(&mut self) -> bool {
		self.simulation.tick()
	}

	pub fn is_settled(&self) -> bool {
		self.simulation.is_settled()
	}

	pub fn requested_mode(&self) -> LayoutMode {
		self.requested
	}

	pub fn effective_mode(&self) -> LayoutMode {
		self.effective
	}

	pub fn outcome(&self) -> &LayoutOutcome {
		&self.outcome
	}

	pub fn positions(&self) -> &[NodeLayoutState] {
		self.simulation.nodes()
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.simulation.nodes().get(idx).map(|n| (n.x, n.y))
	}

	pub fn radius(&self, idx: usize) -> f64 {
		self.radii.get(idx).copied().unwrap_or(0.0)
	}

	/// Topmost node whose circle contains the point (graph coordinates).
	pub fn hit_test(&self, x: f64, y: f64, slack: f64) -> Option<usize> {
		self.simulation
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(i, n)| {
				let r = self.radius(*i) + slack;
				let (dx, dy) = (n.x - x, n.y - y);
				dx * dx + dy * dy <= r * r
			})
			.map(|(i, _)| i)
	}

	/// Pins the node where it is; force layouts also wake up so neighbors react.
	pub fn drag_start(&mut self, idx: usize) {
		let Some(node) = self.simulation.node_mut(idx) else {
			return;
		};
		let (x, y) = (node.x, node.y);
		node.pin(x, y);
		if self.effective == LayoutMode::Force {
			self.simulation.reheat(self.drag_alpha_target);
		}
	}

	pub fn drag_to(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.simulation.node_mut(idx) {
			node.pin(x, y);
		}
	}

	/// Releases the pin in force layouts only; fixed layouts keep it.
	pub fn drag_end(&mut self, idx: usize) {
		if self.effective != LayoutMode::Force {
			return;
		}
		if let Some(node) = self.simulation.node_mut(idx) {
			node.unpin();
		}
		self.simulation.reheat(0.0);
	}

	pub fn set_viewport(&mut self, viewport: Viewport) {
		let (cx, cy) = viewport.center();
		for force in self.simulation.forces_mut() {
			force.recenter(cx, cy);
		}
	}
}

fn seeded(positions: &[(f64, f64)]) -> Vec<NodeLayoutState> {
	positions
		.iter()
		.map(|&(x, y)| NodeLayoutState::at(x, y))
		.collect()
}

fn pinned(positions: &[(f64, f64)]) -> Vec<NodeLayoutState> {
	positions
		.iter()
		.map(|&(x, y)| {
			let mut node = NodeLayoutState::default();
			node.pin(x, y);
			node
		})
		.collect()
}

fn typed_springs(model: &GraphModel, settings: &LayoutSettings) -> Vec<Spring> {
	model
		.indexed_edges()
		.map(|(s, t, edge)| {
			let (distance, stiffness) = settings.link_geometry(edge.edge_type);
			(s, t, distance, stiffness * edge.strength)
		})
		.collect()
}

fn collide(radii: &[f64], settings: &LayoutSettings) -> Force {
	Force::Collide {
		radii: radii.iter().map(|r| r + settings.collision_margin).collect(),
		strength: 0.7,
	}
}

fn many_body(settings: &LayoutSettings) -> Force {
	Force::ManyBody {
		strength: settings.repulsion,
		distance_min: 1.0,
		distance_max: f64::INFINITY,
	}
}

fn force_simulation(
	model: &GraphModel,
	viewport: Viewport,
	settings: &LayoutSettings,
	radii: &[f64],
) -> Simulation {
	let (cx, cy) = viewport.center();
	let nodes = seeded(&phyllotaxis(model.len(), cx, cy));
	let forces = vec![
		many_body(settings),
		Force::Links(Link::build(&typed_springs(model, settings), model.len())),
		Force::Center {
			x: cx,
			y: cy,
			strength: settings.center_strength,
		},
		collide(radii, settings),
	];
	Simulation::new(nodes, forces, settings.simulation)
}

fn hierarchical_simulation(
	model: &GraphModel,
	viewport: Viewport,
	settings: &LayoutSettings,
	radii: &[f64],
) -> Result<Simulation, HierarchyError> {
	let roots = find_roots(model);
	match roots.as_slice() {
		[] => Err(HierarchyError::NoRoot),
		[root] => {
			let positions = tree_layout(model, *root, viewport)?;
			let springs: Vec<Spring> = model
				.indexed_edges()
				.map(|(s, t, _)| (s, t, TREE_LINK_DISTANCE, 1.0))
				.collect();
			let forces = vec![
				Force::Links(Link::build(&springs, model.len())),
				collide(radii, settings),
			];
			let params = settings.simulation.with_alpha_decay(TREE_ALPHA_DECAY);
			Ok(Simulation::new(pinned(&positions), forces, params))
		}
		_ => {
			let bands = band_layout(model, viewport);
			let springs: Vec<Spring> = typed_springs(model, settings)
				.into_iter()
				.map(|(s, t, d, k)| (s, t, d, k * BAND_LINK_STIFFNESS))
				.collect();
			let forces = vec![
				many_body(settings),
				Force::Links(Link::build(&springs, model.len())),
				collide(radii, settings),
				Force::PositionX {
					targets: bands.positions.iter().map(|p| p.0).collect(),
					strength: BAND_X_STRENGTH,
				},
				Force::PositionY {
					targets: bands.band_y.clone(),
					strength: BAND_Y_STRENGTH,
				},
			];
			let params = settings
				.simulation
				.with_alpha_decay(BAND_ALPHA_DECAY)
				.with_velocity_decay(BAND_VELOCITY_DECAY);
			let band = BandConstraint {
				tolerance: bands.band_spacing * BAND_TOLERANCE_FRACTION,
				targets: bands.band_y,
			};
			Ok(Simulation::new(seeded(&bands.positions), forces, params).with_band(band))
		}
	}
}

fn circular_simulation(model: &GraphModel, viewport: Viewport, settings: &LayoutSettings) -> Simulation {
	let positions = circular_layout(model.len(), viewport);
	let forces = vec![Force::Links(Link::build(
		&typed_springs(model, settings),
		model.len(),
	))];
	let params = settings.simulation.with_alpha_decay(RING_ALPHA_DECAY);
	Simulation::new(pinned(&positions), forces, params)
}
