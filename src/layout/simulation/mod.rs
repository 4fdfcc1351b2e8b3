//! Iterative force-directed solvers.
//!
//! [`ForceSimulation`] follows the usual velocity-Verlet scheme with a cooling
//! temperature ("alpha"): every tick the temperature decays towards zero, each force
//! nudges node velocities, velocities are damped and integrated into positions, and
//! the simulation halts once alpha drops below its floor.

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use super::types::{Point, SimulationEdge, SimulationNode};

mod forces;
pub mod spring;

pub use forces::{CenterForce, CollideForce, Force, LinkForce, ManyBodyForce};
pub use spring::{SpringSettings, SpringSimulation, spring_simulation};

/// Invoked after every tick with the current node mirror.
pub type TickCallback = Box<dyn FnMut(&[SimulationNode])>;

/// Error produced by a user supplied [`SimulationFactory`].
pub type FactoryError = Box<dyn std::error::Error>;

/// Builds the engine for a layout activation, replacing the default force composition.
pub type SimulationFactory =
	Rc<dyn Fn(Vec<SimulationNode>, Vec<SimulationEdge>) -> Result<Box<dyn Simulation>, FactoryError>>;

/// Engine handle contract shared by every solver.
pub trait Simulation {
	/// Registers the per-tick callback, replacing any previous one.
	fn on_tick(&mut self, callback: Option<TickCallback>);

	fn nodes(&self) -> &[SimulationNode];

	fn node_mut(&mut self, id: &str) -> Option<&mut SimulationNode>;

	/// Replaces the node mirror.
	fn set_nodes(&mut self, nodes: Vec<SimulationNode>);

	/// Replaces the edge mirror.
	fn set_edges(&mut self, edges: Vec<SimulationEdge>);

	/// Sets the temperature to `heat` and resumes stepping.
	fn restart(&mut self, heat: f64);

	/// Halts stepping until the next `restart`.
	fn stop(&mut self);

	/// Advances one tick if the simulation is running, then calls the tick callback.
	/// Returns whether a tick happened.
	fn step(&mut self) -> bool;

	fn alpha(&self) -> f64;

	fn is_running(&self) -> bool;
}

/// Parameters of the default force composition.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceSettings {
	pub link_distance: f64,
	pub charge_strength: f64,
	pub collide_radius: f64,
	pub collide_strength: f64,
	pub center: Point,
	pub center_strength: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
	pub seed: u32,
}

impl Default for ForceSettings {
	fn default() -> Self {
		Self {
			link_distance: 100.0,
			charge_strength: -30.0,
			collide_radius: 50.0,
			collide_strength: 0.2,
			center: Point::ORIGIN,
			center_strength: 0.05,
			alpha_min: 0.01,
			// Decay schedule of a 300-tick run towards 0.001, kept when the floor is raised.
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			seed: 1,
		}
	}
}

/// Linear congruential generator used to break ties between coincident nodes.
#[derive(Clone, Debug)]
pub struct Lcg {
	state: u32,
}

impl Lcg {
	pub fn new(seed: u32) -> Self {
		Self { state: seed }
	}

	/// Next value in `[0, 1)`.
	pub fn next_f64(&mut self) -> f64 {
		self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		self.state as f64 / 4_294_967_296.0
	}

	/// A tiny random offset.
	pub fn jiggle(&mut self) -> f64 {
		(self.next_f64() - 0.5) * 1e-6
	}
}

const INITIAL_RADIUS: f64 = 10.0;

/// Default solver: link, many-body, collision and centering forces.
pub struct ForceSimulation {
	nodes: Vec<SimulationNode>,
	edges: Vec<SimulationEdge>,
	forces: IndexMap<String, Box<dyn Force>>,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
	random: Lcg,
	running: bool,
	on_tick: Option<TickCallback>,
}

impl ForceSimulation {
	/// Creates a running simulation with the default force composition.
	pub fn new(nodes: Vec<SimulationNode>, edges: Vec<SimulationEdge>, settings: &ForceSettings) -> Self {
		Self::bare(nodes, edges, settings)
			.with_force(
				"link",
				LinkForce::new().distance(settings.link_distance),
			)
			.with_force(
				"charge",
				ManyBodyForce::new().strength(settings.charge_strength),
			)
			.with_force(
				"collide",
				CollideForce::new(settings.collide_radius).strength(settings.collide_strength),
			)
			.with_force(
				"center",
				CenterForce::new(settings.center).strength(settings.center_strength),
			)
	}

	/// Creates a running simulation without any force.
	pub fn bare(nodes: Vec<SimulationNode>, edges: Vec<SimulationEdge>, settings: &ForceSettings) -> Self {
		let mut simulation = Self {
			nodes: Vec::new(),
			edges,
			forces: IndexMap::new(),
			alpha: 1.0,
			alpha_min: settings.alpha_min,
			alpha_decay: settings.alpha_decay,
			alpha_target: 0.0,
			velocity_decay: 1.0 - settings.velocity_decay,
			random: Lcg::new(settings.seed),
			running: true,
			on_tick: None,
		};
		simulation.set_nodes(nodes);
		simulation
	}

	/// Adds or replaces the force registered under `name`.
	pub fn with_force(mut self, name: &str, force: impl Force + 'static) -> Self {
		self.insert_force(name, Box::new(force));
		self
	}

	pub fn insert_force(&mut self, name: &str, mut force: Box<dyn Force>) {
		force.initialize(&self.nodes, &self.edges, &mut self.random);
		self.forces.insert(name.to_string(), force);
	}

	pub fn remove_force(&mut self, name: &str) -> Option<Box<dyn Force>> {
		self.forces.shift_remove(name)
	}

	pub fn force_names(&self) -> impl Iterator<Item = &str> {
		self.forces.keys().map(String::as_str)
	}

	pub fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	/// Advances `iterations` ticks regardless of the running state, without calling the
	/// tick callback.
	pub fn tick(&mut self, iterations: usize) {
		for _ in 0..iterations {
			self.advance();
		}
	}

	fn advance(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;

		for force in self.forces.values_mut() {
			force.apply(&mut self.nodes, alpha, &mut self.random);
		}

		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= self.velocity_decay;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= self.velocity_decay;
					node.y += node.vy;
				}
			}
		}
	}

	fn initialize_nodes(&mut self) {
		for (i, node) in self.nodes.iter_mut().enumerate() {
			if let Some(fx) = node.fx {
				node.x = fx;
			}
			if let Some(fy) = node.fy {
				node.y = fy;
			}
			if !node.x.is_finite() || !node.y.is_finite() {
				// phyllotaxis spiral
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * PI * (3.0 - 5.0_f64.sqrt());
				node.x = radius * angle.cos();
				node.y = radius * angle.sin();
			}
			if !node.vx.is_finite() || !node.vy.is_finite() {
				node.vx = 0.0;
				node.vy = 0.0;
			}
		}
	}

	fn initialize_forces(&mut self) {
		for force in self.forces.values_mut() {
			force.initialize(&self.nodes, &self.edges, &mut self.random);
		}
	}
}

impl Simulation for ForceSimulation {
	fn on_tick(&mut self, callback: Option<TickCallback>) {
		self.on_tick = callback;
	}

	fn nodes(&self) -> &[SimulationNode] {
		&self.nodes
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut SimulationNode> {
		self.nodes.iter_mut().find(|node| node.id == id)
	}

	fn set_nodes(&mut self, nodes: Vec<SimulationNode>) {
		self.nodes = nodes;
		self.initialize_nodes();
		self.initialize_forces();
	}

	fn set_edges(&mut self, edges: Vec<SimulationEdge>) {
		self.edges = edges;
		self.initialize_forces();
	}

	fn restart(&mut self, heat: f64) {
		debug!("reheating simulation to alpha {heat}");
		self.alpha = heat;
		self.running = true;
	}

	fn stop(&mut self) {
		self.running = false;
	}

	fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.advance();
		if let Some(callback) = self.on_tick.as_mut() {
			callback(&self.nodes);
		}
		if self.alpha < self.alpha_min {
			debug!("simulation cooled down at alpha {}", self.alpha);
			self.running = false;
		}
		true
	}

	fn alpha(&self) -> f64 {
		self.alpha
	}

	fn is_running(&self) -> bool {
		self.running
	}
}

impl fmt::Debug for ForceSimulation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ForceSimulation")
			.field("nodes", &self.nodes.len())
			.field("edges", &self.edges.len())
			.field("forces", &self.forces.keys().collect::<Vec<_>>())
			.field("alpha", &self.alpha)
			.field("running", &self.running)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	fn edge(index: usize, source: &str, target: &str) -> SimulationEdge {
		SimulationEdge {
			index,
			source: source.into(),
			target: target.into(),
		}
	}

	fn run_to_rest(simulation: &mut ForceSimulation, limit: usize) -> usize {
		let mut steps = 0;
		while simulation.step() {
			steps += 1;
			assert!(steps <= limit, "simulation did not cool down within {limit} steps");
		}
		steps
	}

	#[test]
	fn coincident_nodes_spread_and_settle() {
		let nodes = (0..12).map(|i| SimulationNode::new(format!("n{i}"), 0.0, 0.0)).collect();
		let mut simulation = ForceSimulation::new(nodes, Vec::new(), &ForceSettings::default());

		let steps = run_to_rest(&mut simulation, 300);

		assert!(steps > 0);
		assert!(simulation.alpha() < simulation.alpha_min());
		assert!(!simulation.is_running());
		for node in simulation.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite(), "{node:?}");
		}
		let spread = simulation.nodes()[0].point().distance(simulation.nodes()[1].point());
		assert!(spread > 1.0, "nodes stayed stacked: {spread}");
	}

	#[test]
	fn same_seed_gives_same_layout() {
		let build = || {
			let nodes = (0..5).map(|i| SimulationNode::new(i.to_string(), 0.0, 0.0)).collect();
			let mut simulation = ForceSimulation::new(nodes, vec![edge(0, "0", "1")], &ForceSettings::default());
			simulation.tick(50);
			simulation.nodes().to_vec()
		};
		assert_eq!(build(), build());
	}

	#[test]
	fn linked_pair_rests_near_link_distance() {
		let nodes = vec![
			SimulationNode::new("a", 0.0, 0.0),
			SimulationNode::new("b", 10.0, 0.0),
		];
		let mut simulation = ForceSimulation::new(nodes, vec![edge(0, "a", "b")], &ForceSettings::default());
		run_to_rest(&mut simulation, 300);

		let distance = simulation.nodes()[0].point().distance(simulation.nodes()[1].point());
		assert!((85.0..=115.0).contains(&distance), "distance {distance}");
	}

	#[test]
	fn dangling_edges_are_inert() {
		let nodes = vec![SimulationNode::new("a", 0.0, 0.0), SimulationNode::new("b", 300.0, 0.0)];
		let edges = vec![edge(0, "a", "ghost"), edge(1, "ghost", "b")];
		let mut simulation = ForceSimulation::bare(nodes, edges, &ForceSettings::default())
			.with_force("link", LinkForce::new());
		simulation.tick(10);

		assert_eq!(simulation.nodes()[0].point(), Point::new(0.0, 0.0));
		assert_eq!(simulation.nodes()[1].point(), Point::new(300.0, 0.0));
	}

	#[test]
	fn pinned_nodes_hold_their_pin() {
		let mut pinned = SimulationNode::new("a", 0.0, 0.0);
		pinned.set_pin(Point::new(40.0, -20.0));
		let nodes = vec![pinned, SimulationNode::new("b", 41.0, -20.0)];
		let mut simulation = ForceSimulation::new(nodes, vec![edge(0, "a", "b")], &ForceSettings::default());
		simulation.tick(100);

		assert_eq!(simulation.nodes()[0].point(), Point::new(40.0, -20.0));
		assert_ne!(simulation.nodes()[1].point(), Point::new(41.0, -20.0));
	}

	#[test]
	fn restart_reheats_a_stopped_simulation() {
		let mut simulation = ForceSimulation::new(
			vec![SimulationNode::new("a", 0.0, 0.0)],
			Vec::new(),
			&ForceSettings::default(),
		);
		simulation.stop();
		assert!(!simulation.step());

		simulation.restart(0.1);
		assert!(simulation.is_running());
		assert!(simulation.step());
		assert!(simulation.alpha() < 0.1);
	}

	#[test]
	fn tick_callback_sees_every_step() {
		let calls = Rc::new(Cell::new(0));
		let seen = calls.clone();
		let mut simulation = ForceSimulation::new(
			vec![SimulationNode::new("a", 0.0, 0.0)],
			Vec::new(),
			&ForceSettings::default(),
		);
		simulation.on_tick(Some(Box::new(move |nodes| {
			assert_eq!(nodes.len(), 1);
			seen.set(seen.get() + 1);
		})));
		simulation.step();
		simulation.step();
		simulation.tick(3);

		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn forces_can_be_swapped() {
		let simulation = ForceSimulation::new(Vec::new(), Vec::new(), &ForceSettings::default());
		assert_eq!(
			simulation.force_names().collect::<Vec<_>>(),
			["link", "charge", "collide", "center"]
		);

		let mut simulation = simulation.with_force("charge", ManyBodyForce::new().strength(-120.0));
		simulation.remove_force("collide");
		assert_eq!(
			simulation.force_names().collect::<Vec<_>>(),
			["link", "charge", "center"]
		);
	}

	#[test]
	fn non_finite_positions_are_reseeded() {
		let nodes = vec![
			SimulationNode::new("a", f64::NAN, 0.0),
			SimulationNode::new("b", 0.0, f64::INFINITY),
		];
		let simulation = ForceSimulation::new(nodes, Vec::new(), &ForceSettings::default());
		for node in simulation.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
	}
}
