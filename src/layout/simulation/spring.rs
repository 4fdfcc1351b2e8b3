//! Spring-embedder engine backed by the `force_graph` crate.
//!
//! Plugged in through [`ForceLayoutConfig::with_simulation`](crate::layout::ForceLayoutConfig::with_simulation)
//! when a host prefers a charge/spring model over the default force composition. The
//! underlying graph has no notion of temperature, so a cooling alpha is tracked here
//! purely to decide when to stop stepping.

use std::collections::HashMap;
use std::rc::Rc;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::{FactoryError, Simulation, SimulationFactory, TickCallback};
use crate::layout::types::{NodeId, SimulationEdge, SimulationNode};

/// Tuning of a [`SpringSimulation`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpringSettings {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	pub node_mass: f32,
	/// Seconds advanced per step.
	pub time_step: f32,
	pub alpha_min: f64,
	pub alpha_decay: f64,
}

impl Default for SpringSettings {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
			time_step: 0.016,
			alpha_min: 0.01,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
		}
	}
}

impl SpringSettings {
	fn parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Factory installing a [`SpringSimulation`] as the layout engine.
pub fn spring_simulation(settings: SpringSettings) -> SimulationFactory {
	Rc::new(
		move |nodes: Vec<SimulationNode>, edges: Vec<SimulationEdge>| -> Result<Box<dyn Simulation>, FactoryError> {
			Ok(Box::new(SpringSimulation::new(nodes, edges, settings.clone())))
		},
	)
}

pub struct SpringSimulation {
	settings: SpringSettings,
	graph: ForceGraph<NodeId, ()>,
	nodes: Vec<SimulationNode>,
	edges: Vec<SimulationEdge>,
	indices: HashMap<NodeId, usize>,
	alpha: f64,
	running: bool,
	on_tick: Option<TickCallback>,
}

impl SpringSimulation {
	pub fn new(nodes: Vec<SimulationNode>, edges: Vec<SimulationEdge>, settings: SpringSettings) -> Self {
		let mut simulation = Self {
			graph: ForceGraph::new(settings.parameters()),
			settings,
			nodes,
			edges,
			indices: HashMap::new(),
			alpha: 1.0,
			running: true,
			on_tick: None,
		};
		simulation.rebuild();
		simulation
	}

	fn rebuild(&mut self) {
		let mut graph = ForceGraph::new(self.settings.parameters());
		let mut graph_indices: HashMap<&str, DefaultNodeIdx> = HashMap::new();
		self.indices.clear();

		for (i, node) in self.nodes.iter().enumerate() {
			let idx = graph.add_node(NodeData {
				x: node.fx.unwrap_or(node.x) as f32,
				y: node.fy.unwrap_or(node.y) as f32,
				mass: self.settings.node_mass,
				is_anchor: node.fx.is_some() || node.fy.is_some(),
				user_data: node.id.clone(),
			});
			graph_indices.insert(node.id.as_str(), idx);
			self.indices.insert(node.id.clone(), i);
		}

		for edge in &self.edges {
			match (
				graph_indices.get(edge.source.as_str()),
				graph_indices.get(edge.target.as_str()),
			) {
				(Some(&source), Some(&target)) if source != target => {
					graph.add_edge(source, target, EdgeData::default());
				}
				_ => {}
			}
		}

		self.graph = graph;
	}

	fn advance(&mut self) {
		self.alpha -= self.alpha * self.settings.alpha_decay;

		let (nodes, indices) = (&self.nodes, &self.indices);
		self.graph.visit_nodes_mut(|node| {
			let Some(sim) = indices.get(&node.data.user_data).map(|&i| &nodes[i]) else {
				return;
			};
			node.data.is_anchor = sim.fx.is_some() || sim.fy.is_some();
			if let Some(fx) = sim.fx {
				node.data.x = fx as f32;
			}
			if let Some(fy) = sim.fy {
				node.data.y = fy as f32;
			}
		});

		self.graph.update(self.settings.time_step);

		let (nodes, indices) = (&mut self.nodes, &self.indices);
		self.graph.visit_nodes(|node| {
			if let Some(&i) = indices.get(&node.data.user_data) {
				let sim = &mut nodes[i];
				sim.x = sim.fx.unwrap_or(node.x() as f64);
				sim.y = sim.fy.unwrap_or(node.y() as f64);
			}
		});
	}
}

impl Simulation for SpringSimulation {
	fn on_tick(&mut self, callback: Option<TickCallback>) {
		self.on_tick = callback;
	}

	fn nodes(&self) -> &[SimulationNode] {
		&self.nodes
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut SimulationNode> {
		let &i = self.indices.get(id)?;
		self.nodes.get_mut(i)
	}

	fn set_nodes(&mut self, nodes: Vec<SimulationNode>) {
		self.nodes = nodes;
		self.rebuild();
	}

	fn set_edges(&mut self, edges: Vec<SimulationEdge>) {
		self.edges = edges;
		self.rebuild();
	}

	fn restart(&mut self, heat: f64) {
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
		if self.alpha < self.settings.alpha_min {
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
