use std::collections::HashMap;

use super::Lcg;
use crate::layout::types::{Point, SimulationEdge, SimulationNode};

/// A force acting on node velocities (or positions) once per tick.
pub trait Force {
	/// Called whenever the node or edge mirror is replaced.
	fn initialize(&mut self, nodes: &[SimulationNode], edges: &[SimulationEdge], random: &mut Lcg);

	fn apply(&mut self, nodes: &mut [SimulationNode], alpha: f64, random: &mut Lcg);
}

#[derive(Clone, Copy, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Spring between linked nodes, pulling them toward `distance`.
#[derive(Clone, Debug)]
pub struct LinkForce {
	distance: f64,
	strength: Option<f64>,
	iterations: usize,
	links: Vec<Link>,
}

impl LinkForce {
	pub fn new() -> Self {
		Self {
			distance: 30.0,
			strength: None,
			iterations: 1,
			links: Vec::new(),
		}
	}

	pub fn distance(mut self, distance: f64) -> Self {
		self.distance = distance;
		self
	}

	/// Fixed strength for every link. By default a link is weakened by the degree of its
	/// busier endpoint.
	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = Some(strength);
		self
	}

	pub fn iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations.max(1);
		self
	}
}

impl Default for LinkForce {
	fn default() -> Self {
		Self::new()
	}
}

impl Force for LinkForce {
	fn initialize(&mut self, nodes: &[SimulationNode], edges: &[SimulationEdge], _random: &mut Lcg) {
		let by_id: HashMap<&str, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.as_str(), i))
			.collect();

		let mut resolved = Vec::with_capacity(edges.len());
		for edge in edges {
			// Dangling edges and self-loops exert no force.
			match (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str())) {
				(Some(&source), Some(&target)) if source != target => resolved.push((source, target)),
				_ => {}
			}
		}

		let mut count = vec![0_usize; nodes.len()];
		for &(source, target) in &resolved {
			count[source] += 1;
			count[target] += 1;
		}

		self.links = resolved
			.into_iter()
			.map(|(source, target)| {
				let (cs, ct) = (count[source] as f64, count[target] as f64);
				Link {
					source,
					target,
					strength: self.strength.unwrap_or(1.0 / cs.min(ct)),
					bias: cs / (cs + ct),
				}
			})
			.collect();
	}

	fn apply(&mut self, nodes: &mut [SimulationNode], alpha: f64, random: &mut Lcg) {
		for _ in 0..self.iterations {
			for link in &self.links {
				let (source, target) = (&nodes[link.source], &nodes[link.target]);
				let mut x = target.x + target.vx - source.x - source.vx;
				let mut y = target.y + target.vy - source.y - source.vy;
				if x == 0.0 {
					x = random.jiggle();
				}
				if y == 0.0 {
					y = random.jiggle();
				}
				let mut l = (x * x + y * y).sqrt();
				l = (l - self.distance) / l * alpha * link.strength;
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
	}
}

/// Mutual attraction (positive strength) or repulsion (negative strength) between all
/// node pairs, falling off with distance.
#[derive(Clone, Debug)]
pub struct ManyBodyForce {
	strength: f64,
	distance_min2: f64,
	distance_max2: f64,
}

impl ManyBodyForce {
	pub fn new() -> Self {
		Self {
			strength: -30.0,
			distance_min2: 1.0,
			distance_max2: f64::INFINITY,
		}
	}

	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	pub fn distance_min(mut self, distance: f64) -> Self {
		self.distance_min2 = distance * distance;
		self
	}

	pub fn distance_max(mut self, distance: f64) -> Self {
		self.distance_max2 = distance * distance;
		self
	}
}

impl Default for ManyBodyForce {
	fn default() -> Self {
		Self::new()
	}
}

impl Force for ManyBodyForce {
	fn initialize(&mut self, _nodes: &[SimulationNode], _edges: &[SimulationEdge], _random: &mut Lcg) {}

	fn apply(&mut self, nodes: &mut [SimulationNode], alpha: f64, random: &mut Lcg) {
		for i in 0..nodes.len() {
			let (xi, yi) = (nodes[i].x, nodes[i].y);
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for (j, other) in nodes.iter().enumerate() {
				if i == j {
					continue;
				}
				let mut x = other.x - xi;
				let mut y = other.y - yi;
				let mut l = x * x + y * y;
				if l >= self.distance_max2 {
					continue;
				}
				if x == 0.0 {
					x = random.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = random.jiggle();
					l += y * y;
				}
				if l < self.distance_min2 {
					l = (self.distance_min2 * l).sqrt();
				}
				let w = self.strength * alpha / l;
				dvx += x * w;
				dvy += y * w;
			}
			nodes[i].vx += dvx;
			nodes[i].vy += dvy;
		}
	}
}

/// Pushes apart nodes whose circles of `radius` overlap.
#[derive(Clone, Debug)]
pub struct CollideForce {
	radius: f64,
	strength: f64,
	iterations: usize,
}

impl CollideForce {
	pub fn new(radius: f64) -> Self {
		Self {
			radius,
			strength: 1.0,
			iterations: 1,
		}
	}

	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	pub fn iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations.max(1);
		self
	}
}

impl Force for CollideForce {
	fn initialize(&mut self, _nodes: &[SimulationNode], _edges: &[SimulationEdge], _random: &mut Lcg) {}

	fn apply(&mut self, nodes: &mut [SimulationNode], _alpha: f64, random: &mut Lcg) {
		let (ri, rj) = (self.radius, self.radius);
		let r = ri + rj;
		let share = rj * rj / (ri * ri + rj * rj);

		for _ in 0..self.iterations {
			for i in 0..nodes.len() {
				let xi = nodes[i].x + nodes[i].vx;
				let yi = nodes[i].y + nodes[i].vy;
				for j in i + 1..nodes.len() {
					let mut x = xi - nodes[j].x - nodes[j].vx;
					let mut y = yi - nodes[j].y - nodes[j].vy;
					let mut l = x * x + y * y;
					if l >= r * r {
						continue;
					}
					if x == 0.0 {
						x = random.jiggle();
						l += x * x;
					}
					if y == 0.0 {
						y = random.jiggle();
						l += y * y;
					}
					l = l.sqrt();
					l = (r - l) / l * self.strength;
					x *= l;
					y *= l;

					nodes[i].vx += x * share;
					nodes[i].vy += y * share;
					nodes[j].vx -= x * (1.0 - share);
					nodes[j].vy -= y * (1.0 - share);
				}
			}
		}
	}
}

/// Translates the whole layout so its mean position drifts toward `center`.
#[derive(Clone, Debug)]
pub struct CenterForce {
	center: Point,
	strength: f64,
}

impl CenterForce {
	pub fn new(center: Point) -> Self {
		Self {
			center,
			strength: 1.0,
		}
	}

	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}
}

impl Force for CenterForce {
	fn initialize(&mut self, _nodes: &[SimulationNode], _edges: &[SimulationEdge], _random: &mut Lcg) {}

	fn apply(&mut self, nodes: &mut [SimulationNode], _alpha: f64, _random: &mut Lcg) {
		if nodes.is_empty() {
			return;
		}
		let n = nodes.len() as f64;
		let (sx, sy) = nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let dx = (sx / n - self.center.x) * self.strength;
		let dy = (sy / n - self.center.y) * self.strength;
		for node in nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn edge(index: usize, source: &str, target: &str) -> SimulationEdge {
		SimulationEdge {
			index,
			source: source.into(),
			target: target.into(),
		}
	}

	#[test]
	fn link_weights_follow_endpoint_degree() {
		let nodes = vec![
			SimulationNode::new("hub", 0.0, 0.0),
			SimulationNode::new("a", 10.0, 0.0),
			SimulationNode::new("b", 0.0, 10.0),
		];
		let mut force = LinkForce::new();
		force.initialize(&nodes, &[edge(0, "hub", "a"), edge(1, "hub", "b")], &mut Lcg::new(1));

		assert_eq!(force.links.len(), 2);
		assert_eq!(force.links[0].strength, 1.0);
		assert!((force.links[0].bias - 2.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn link_skips_self_loops_and_unknown_ids() {
		let nodes = vec![SimulationNode::new("a", 0.0, 0.0)];
		let mut force = LinkForce::new();
		force.initialize(&nodes, &[edge(0, "a", "a"), edge(1, "a", "missing")], &mut Lcg::new(1));
		assert!(force.links.is_empty());
	}

	#[test]
	fn repulsion_pushes_nodes_apart() {
		let mut nodes = vec![SimulationNode::new("a", 0.0, 0.0), SimulationNode::new("b", 10.0, 0.0)];
		ManyBodyForce::new().apply(&mut nodes, 1.0, &mut Lcg::new(1));
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn collide_ignores_separated_nodes() {
		let mut nodes = vec![SimulationNode::new("a", 0.0, 0.0), SimulationNode::new("b", 150.0, 0.0)];
		CollideForce::new(50.0).apply(&mut nodes, 1.0, &mut Lcg::new(1));
		assert_eq!((nodes[0].vx, nodes[1].vx), (0.0, 0.0));

		nodes[1].x = 60.0;
		CollideForce::new(50.0).apply(&mut nodes, 1.0, &mut Lcg::new(1));
		assert!(nodes[0].vx < 0.0 && nodes[1].vx > 0.0);
	}

	#[test]
	fn center_moves_mean_toward_center() {
		let mut nodes = vec![SimulationNode::new("a", 10.0, 10.0), SimulationNode::new("b", 30.0, 10.0)];
		CenterForce::new(Point::ORIGIN).apply(&mut nodes, 1.0, &mut Lcg::new(1));
		assert_eq!(nodes[0].point(), Point::new(-10.0, 0.0));
		assert_eq!(nodes[1].point(), Point::new(10.0, 0.0));
	}
}
