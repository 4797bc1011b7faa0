//! Alpha-cooled force simulation over a layout-state arena.
//!
//! Each tick decays `alpha` toward `alpha_target`, applies every force
//! scaled by alpha, then integrates velocities with friction. Pinned nodes
//! snap to their pin. Because alpha decays geometrically the number of
//! ticks before [`Simulation::is_settled`] is bounded.

use serde::{Deserialize, Serialize};

use super::forces::Force;

/// Ticks before the kinetic-energy criterion may declare the system settled.
const ENERGY_WARMUP_TICKS: u32 = 30;

/// Per-node simulation state, indexed like [`crate::graph::GraphModel::nodes`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeLayoutState {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl NodeLayoutState {
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			..Self::default()
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() && self.fy.is_some()
	}

	pub fn pin(&mut self, x: f64, y: f64) {
		self.fx = Some(x);
		self.fy = Some(y);
		self.x = x;
		self.y = y;
		self.vx = 0.0;
		self.vy = 0.0;
	}

	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}
}

/// Cooling and friction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
	pub energy_threshold: f64,
}

impl Default for SimulationParams {
	fn default() -> Self {
		Self {
			alpha_min: 0.001,
			// ~300 ticks from alpha 1 to alpha_min
			alpha_decay: 1.0 - 0.001f64.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			energy_threshold: 0.01,
		}
	}
}

impl SimulationParams {
	pub fn with_alpha_decay(mut self, alpha_decay: f64) -> Self {
		self.alpha_decay = alpha_decay;
		self
	}

	pub fn with_velocity_decay(mut self, velocity_decay: f64) -> Self {
		self.velocity_decay = velocity_decay;
		self
	}
}

/// Keeps each node's `y` within `tolerance` of its band after integration.
#[derive(Clone, Debug, PartialEq)]
pub struct BandConstraint {
	pub targets: Vec<f64>,
	pub tolerance: f64,
}

#[derive(Clone, Debug)]
pub struct Simulation {
	nodes: Vec<NodeLayoutState>,
	forces: Vec<Force>,
	band: Option<BandConstraint>,
	params: SimulationParams,
	alpha: f64,
	alpha_target: f64,
	ticks: u32,
	energy: f64,
}

impl Simulation {
	pub fn new(nodes: Vec<NodeLayoutState>, forces: Vec<Force>, params: SimulationParams) -> Self {
		Self {
			nodes,
			forces,
			band: None,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			ticks: 0,
			energy: f64::MAX,
		}
	}

	pub fn with_band(mut self, band: BandConstraint) -> Self {
		self.band = Some(band);
		self
	}

	/// Advances one step. Returns `false` once settled.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		for force in &self.forces {
			force.apply(&mut self.nodes, self.alpha);
		}

		let friction = 1.0 - self.params.velocity_decay;
		let mut energy = 0.0;
		for (i, node) in self.nodes.iter_mut().enumerate() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= friction;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= friction;
					node.y += node.vy;
					if let Some(band) = &self.band {
						if let Some(target) = band.targets.get(i) {
							node.y = node.y.clamp(target - band.tolerance, target + band.tolerance);
						}
					}
				}
			}
			energy += node.vx * node.vx + node.vy * node.vy;
		}

		self.energy = energy;
		self.ticks += 1;
		!self.is_settled()
	}

	pub fn is_settled(&self) -> bool {
		if self.alpha_target >= self.params.alpha_min {
			return false;
		}
		self.alpha < self.params.alpha_min
			|| (self.ticks >= ENERGY_WARMUP_TICKS && self.energy < self.params.energy_threshold)
	}

	/// Sets the value alpha converges to; a positive target keeps the system live.
	pub fn reheat(&mut self, target: f64) {
		self.alpha_target = target;
		if target > 0.0 && self.alpha < target {
			// restarts a settled simulation
			self.ticks = 0;
			self.energy = f64::MAX;
		}
	}

	pub fn nodes(&self) -> &[NodeLayoutState] {
		&self.nodes
	}

	pub fn node_mut(&mut self, idx: usize) -> Option<&mut NodeLayoutState> {
		self.nodes.get_mut(idx)
	}

	pub fn forces_mut(&mut self) -> &mut [Force] {
		&mut self.forces
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::forces::Link;

	/// Ticks until settled or `max_ticks` elapsed; returns ticks taken.
	fn run(sim: &mut Simulation, max_ticks: u32) -> u32 {
		let mut ticks = 0;
		while ticks < max_ticks && sim.tick() {
			ticks += 1;
		}
		ticks
	}

	fn pair() -> Simulation {
		Simulation::new(
			vec![NodeLayoutState::at(0.0, 0.0), NodeLayoutState::at(10.0, 0.0)],
			vec![Force::ManyBody {
				strength: -30.0,
				distance_min: 1.0,
				distance_max: f64::INFINITY,
			}],
			SimulationParams::default(),
		)
	}

	#[test]
	fn test_simulation_runs() {
		let mut sim = pair();
		let initial = sim.nodes()[1].x - sim.nodes()[0].x;
		for _ in 0..50 {
			sim.tick();
		}
		let after = sim.nodes()[1].x - sim.nodes()[0].x;
		assert!(after > initial);
	}

	#[test]
	fn test_simulation_terminates() {
		let mut sim = pair();
		let ticks = run(&mut sim, 10_000);
		assert!(sim.is_settled());
		assert!(ticks <= 400, "took {} ticks", ticks);
		assert!(!sim.tick());
	}

	#[test]
	fn test_pinned_nodes_stay_put() {
		let mut sim = pair();
		sim.node_mut(0).unwrap().pin(0.0, 0.0);
		run(&mut sim, 100);
		assert_eq!(sim.nodes()[0].x, 0.0);
		assert_eq!(sim.nodes()[0].y, 0.0);
	}

	#[test]
	fn test_positive_alpha_target_keeps_running() {
		let mut sim = pair();
		run(&mut sim, 10_000);
		assert!(sim.is_settled());
		sim.reheat(0.3);
		assert!(!sim.is_settled());
		for _ in 0..1_000 {
			sim.tick();
		}
		assert!(!sim.is_settled());
		assert!(sim.alpha > 0.2);

		sim.reheat(0.0);
		run(&mut sim, 10_000);
		assert!(sim.is_settled());
	}

	#[test]
	fn test_band_constraint_wins_over_springs() {
		let nodes = vec![NodeLayoutState::at(0.0, 0.0), NodeLayoutState::at(0.0, 300.0)];
		let links = Link::build(&[(0, 1, 10.0, 1.0)], 2);
		let mut sim = Simulation::new(nodes, vec![Force::Links(links)], SimulationParams::default())
			.with_band(BandConstraint {
				targets: vec![0.0, 300.0],
				tolerance: 30.0,
			});
		run(&mut sim, 1_000);
		assert!(sim.nodes()[0].y <= 30.0);
		assert!(sim.nodes()[1].y >= 270.0);
	}
}
