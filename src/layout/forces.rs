//! Forces applied by the simulation each tick.
//!
//! Forces write velocities (or, for centering, positions) and are scaled by
//! the current alpha so the whole system cools down together.

use super::simulation::NodeLayoutState;

/// Offset used when two points coincide, so directions stay defined.
const JIGGLE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	strength: f64,
	bias: f64,
}

/// A spring before degree normalization: `(source, target, distance, stiffness)`.
pub type Spring = (usize, usize, f64, f64);

impl Link {
	/// Builds links whose stiffness is divided by the smaller endpoint degree,
	/// and whose correction is split by relative degree.
	pub fn build(springs: &[Spring], node_count: usize) -> Vec<Link> {
		let mut degree = vec![0usize; node_count];
		for &(s, t, _, _) in springs {
			degree[s] += 1;
			degree[t] += 1;
		}
		springs
			.iter()
			.map(|&(source, target, distance, stiffness)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Link {
					source,
					target,
					distance,
					strength: stiffness / ds.min(dt).max(1.0),
					bias: ds / (ds + dt),
				}
			})
			.collect()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Force {
	/// Pairwise inverse-square charge; negative strength repels.
	ManyBody {
		strength: f64,
		distance_min: f64,
		distance_max: f64,
	},
	Links(Vec<Link>),
	/// Translates the unpinned mass center toward `(x, y)`.
	Center { x: f64, y: f64, strength: f64 },
	/// Resolves circle overlap; `radii` are indexed like the nodes.
	Collide { radii: Vec<f64>, strength: f64 },
	PositionX { targets: Vec<f64>, strength: f64 },
	PositionY { targets: Vec<f64>, strength: f64 },
}

impl Force {
	pub fn apply(&self, nodes: &mut [NodeLayoutState], alpha: f64) {
		match self {
			Force::ManyBody {
				strength,
				distance_min,
				distance_max,
			} => many_body(nodes, alpha, *strength, *distance_min, *distance_max),
			Force::Links(links) => apply_links(nodes, alpha, links),
			Force::Center { x, y, strength } => center(nodes, *x, *y, *strength),
			Force::Collide { radii, strength } => collide(nodes, radii, *strength),
			Force::PositionX { targets, strength } => {
				for (node, target) in nodes.iter_mut().zip(targets) {
					node.vx += (target - node.x) * strength * alpha;
				}
			}
			Force::PositionY { targets, strength } => {
				for (node, target) in nodes.iter_mut().zip(targets) {
					node.vy += (target - node.y) * strength * alpha;
				}
			}
		}
	}

	/// Retargets the centering force after a viewport change.
	pub fn recenter(&mut self, cx: f64, cy: f64) {
		if let Force::Center { x, y, .. } = self {
			*x = cx;
			*y = cy;
		}
	}
}

fn many_body(
	nodes: &mut [NodeLayoutState],
	alpha: f64,
	strength: f64,
	distance_min: f64,
	distance_max: f64,
) {
	let (min2, max2) = (distance_min * distance_min, distance_max * distance_max);
	let n = nodes.len();
	for i in 0..n {
		for j in (i + 1)..n {
			let mut dx = nodes[j].x - nodes[i].x;
			let mut dy = nodes[j].y - nodes[i].y;
			if dx == 0.0 && dy == 0.0 {
				dx = JIGGLE * (j - i) as f64;
				dy = JIGGLE;
			}
			let mut l = dx * dx + dy * dy;
			if l >= max2 {
				continue;
			}
			if l < min2 {
				l = (min2 * l).sqrt();
			}
			let w = strength * alpha / l;
			nodes[i].vx += dx * w;
			nodes[i].vy += dy * w;
			nodes[j].vx -= dx * w;
			nodes[j].vy -= dy * w;
		}
	}
}

fn apply_links(nodes: &mut [NodeLayoutState], alpha: f64, links: &[Link]) {
	for link in links {
		let (s, t) = (&nodes[link.source], &nodes[link.target]);
		let mut x = t.x + t.vx - s.x - s.vx;
		let mut y = t.y + t.vy - s.y - s.vy;
		if x == 0.0 && y == 0.0 {
			x = JIGGLE;
		}
		let mut l = (x * x + y * y).sqrt();
		l = (l - link.distance) / l * alpha * link.strength;
		x *= l;
		y *= l;

		let target = &mut nodes[link.target];
		target.vx -= x * link.bias;
		target.vy -= y * link.bias;
		let source = &mut nodes[link.source];
		source.vx += x * (1.0 - link.bias);
		source.vy += y * (1.0 - link.bias);
	}
}

fn center(nodes: &mut [NodeLayoutState], cx: f64, cy: f64, strength: f64) {
	let free: Vec<usize> = (0..nodes.len()).filter(|&i| !nodes[i].is_pinned()).collect();
	if free.is_empty() {
		return;
	}
	let count = free.len() as f64;
	let (sx, sy) = free
		.iter()
		.fold((0.0, 0.0), |(sx, sy), &i| (sx + nodes[i].x, sy + nodes[i].y));
	let shift_x = (sx / count - cx) * strength;
	let shift_y = (sy / count - cy) * strength;
	for i in free {
		nodes[i].x -= shift_x;
		nodes[i].y -= shift_y;
	}
}

fn collide(nodes: &mut [NodeLayoutState], radii: &[f64], strength: f64) {
	let n = nodes.len().min(radii.len());
	for i in 0..n {
		for j in (i + 1)..n {
			let r = radii[i] + radii[j];
			let mut dx = (nodes[i].x + nodes[i].vx) - (nodes[j].x + nodes[j].vx);
			let mut dy = (nodes[i].y + nodes[i].vy) - (nodes[j].y + nodes[j].vy);
			if dx == 0.0 && dy == 0.0 {
				dx = JIGGLE * (j - i) as f64;
				dy = JIGGLE;
			}
			let l2 = dx * dx + dy * dy;
			if l2 >= r * r {
				continue;
			}
			let l = l2.sqrt();
			let push = (r - l) / l * strength;
			dx *= push;
			dy *= push;
			let (ri2, rj2) = (radii[i] * radii[i], radii[j] * radii[j]);
			let share = rj2 / (ri2 + rj2);
			nodes[i].vx += dx * share;
			nodes[i].vy += dy * share;
			nodes[j].vx -= dx * (1.0 - share);
			nodes[j].vy -= dy * (1.0 - share);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(x: f64, y: f64) -> NodeLayoutState {
		NodeLayoutState::at(x, y)
	}

	#[test]
	fn test_many_body_repels() {
		let mut nodes = vec![at(0.0, 0.0), at(10.0, 0.0)];
		Force::ManyBody {
			strength: -30.0,
			distance_min: 1.0,
			distance_max: f64::INFINITY,
		}
		.apply(&mut nodes, 1.0);
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn test_link_pulls_stretched_nodes_together() {
		let mut nodes = vec![at(0.0, 0.0), at(200.0, 0.0)];
		let links = Link::build(&[(0, 1, 50.0, 1.0)], 2);
		Force::Links(links).apply(&mut nodes, 1.0);
		assert!(nodes[0].vx > 0.0);
		assert!(nodes[1].vx < 0.0);
	}

	#[test]
	fn test_link_strength_normalized_by_degree() {
		let links = Link::build(&[(0, 1, 30.0, 1.0), (0, 2, 30.0, 1.0)], 3);
		assert_eq!(links[0].strength, 1.0);
		assert!((links[0].bias - 2.0 / 3.0).abs() < 1e-9);
	}

	#[test]
	fn test_collide_separates_overlapping_circles() {
		let mut nodes = vec![at(0.0, 0.0), at(5.0, 0.0)];
		Force::Collide {
			radii: vec![10.0, 10.0],
			strength: 1.0,
		}
		.apply(&mut nodes, 1.0);
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn test_center_moves_free_nodes_only() {
		let mut nodes = vec![at(10.0, 10.0), at(30.0, 10.0), at(500.0, 500.0)];
		nodes[2].pin(500.0, 500.0);
		Force::Center {
			x: 0.0,
			y: 0.0,
			strength: 1.0,
		}
		.apply(&mut nodes, 1.0);
		assert!((nodes[0].x + 10.0).abs() < 1e-9);
		assert!((nodes[1].x - 10.0).abs() < 1e-9);
		assert_eq!(nodes[2].x, 500.0);
	}
}
