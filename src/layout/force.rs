use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use super::config::ForceLayoutConfig;
use super::error::{LayoutError, Result};
use super::gesture::{GestureEmitter, ModifierKey, Subscription};
use super::interaction;
use super::mirror::{self, GraphMirror};
use super::simulation::{ForceSimulation, Simulation, TickCallback};
use super::types::{NodeId, NodePosition, Point, PositionStore, Viewport};
use super::watcher::{GraphChanges, GraphSource, GraphWatcher};
use super::{LayoutContext, LayoutHandler};

/// State shared between the frame loop and the gesture handlers of one activation.
pub(crate) struct LayoutState {
	pub(crate) simulation: Box<dyn Simulation>,
	pub(crate) positions: PositionStore,
	pub(crate) pin_on_drag: bool,
	pub(crate) pin_on_click: bool,
	pub(crate) pin_modifier: ModifierKey,
	pub(crate) reheat_alpha: f64,
	pub(crate) active: bool,
	/// Pointer positions of the nodes currently being dragged. These pins live only in the
	/// solver until drag-end decides whether the store keeps them.
	pub(crate) dragging: IndexMap<NodeId, Point>,
}

impl LayoutState {
	pub(crate) fn reheat(&mut self) {
		self.simulation.restart(self.reheat_alpha);
	}

	/// Re-pins dragged nodes after the node mirror was replaced.
	fn reapply_drags(&mut self) {
		let LayoutState {
			simulation,
			dragging,
			..
		} = self;
		for (id, &point) in dragging.iter() {
			if let Some(node) = simulation.node_mut(id) {
				node.set_pin(point);
			}
		}
	}
}

struct Session {
	state: Rc<RefCell<LayoutState>>,
	graph: Rc<dyn GraphSource>,
	viewport: Rc<dyn Viewport>,
	gestures: GestureEmitter,
	subscriptions: Vec<Subscription>,
	watcher: GraphWatcher,
}

impl Session {
	fn sync(&mut self) -> GraphChanges {
		let changes = self.watcher.poll(&*self.graph);
		if !changes.any() {
			return changes;
		}

		let mut state = self.state.borrow_mut();
		if changes.nodes {
			mirror::place_new_nodes(
				self.watcher.node_ids(),
				&state.positions,
				self.viewport.visible_area_center(),
			);
			let GraphMirror { nodes, edges } =
				GraphMirror::build(self.watcher.node_ids(), self.watcher.edges(), &state.positions);
			debug!("node set changed, rebuilt mirror of {} nodes and {} edges", nodes.len(), edges.len());
			state.simulation.set_nodes(nodes);
			state.simulation.set_edges(edges);
			state.reapply_drags();
		} else {
			mirror::report_dangling_edges(self.watcher.node_ids(), self.watcher.edges());
			let edges = mirror::build_edges(self.watcher.edges());
			debug!("edge set changed, rebuilt {} edges", edges.len());
			state.simulation.set_edges(edges);
		}
		state.reheat();
		changes
	}
}

/// Copies every simulated coordinate into the store after each tick.
fn synchronizer(positions: PositionStore) -> TickCallback {
	Box::new(move |nodes| {
		positions.update(|map| {
			for node in nodes {
				match map.get_mut(&node.id) {
					Some(entry) => {
						entry.x = node.x;
						entry.y = node.y;
					}
					None => {
						map.insert(node.id.clone(), NodePosition::at(node.point()));
					}
				}
			}
		})
	})
}

/// Force-directed layout plug-in.
///
/// Between [`activate`](LayoutHandler::activate) and
/// [`deactivate`](LayoutHandler::deactivate) it owns a simulation whose every step is
/// mirrored into the host's [`PositionStore`], reacts to drag and click gestures, and
/// follows changes of the host graph. The host drives it by calling
/// [`tick`](LayoutHandler::tick) from its frame clock.
pub struct ForceLayout {
	config: ForceLayoutConfig,
	session: Option<Session>,
}

impl ForceLayout {
	pub fn new(config: ForceLayoutConfig) -> Self {
		Self {
			config,
			session: None,
		}
	}

	pub fn config(&self) -> &ForceLayoutConfig {
		&self.config
	}

	pub fn is_active(&self) -> bool {
		self.session.is_some()
	}

	/// Current temperature, while active.
	pub fn alpha(&self) -> Option<f64> {
		let session = self.session.as_ref()?;
		Some(session.state.borrow().simulation.alpha())
	}

	/// Whether the simulation is still stepping.
	pub fn is_running(&self) -> bool {
		self.session
			.as_ref()
			.is_some_and(|session| session.state.borrow().simulation.is_running())
	}

	/// Picks up node and edge changes of the host graph right away instead of waiting for
	/// the next tick. Does nothing while inactive.
	pub fn sync_graph(&mut self) -> GraphChanges {
		match self.session.as_mut() {
			Some(session) => session.sync(),
			None => GraphChanges::default(),
		}
	}

	fn create_simulation(&self, mirror: GraphMirror) -> Result<Box<dyn Simulation>> {
		match &self.config.create_simulation {
			Some(factory) => factory(mirror.nodes, mirror.edges).map_err(LayoutError::CreateSimulation),
			None => Ok(Box::new(ForceSimulation::new(mirror.nodes, mirror.edges, &self.config.forces))
				as Box<dyn Simulation>),
		}
	}
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self::new(ForceLayoutConfig::default())
	}
}

impl LayoutHandler for ForceLayout {
	fn activate(&mut self, context: LayoutContext) -> Result<()> {
		if self.session.is_some() {
			return Err(LayoutError::AlreadyActive);
		}
		let LayoutContext {
			positions,
			graph,
			gestures,
			viewport,
		} = context;

		let watcher = GraphWatcher::new(&*graph);
		mirror::place_new_nodes(watcher.node_ids(), &positions, viewport.visible_area_center());
		let mirror = GraphMirror::build(watcher.node_ids(), watcher.edges(), &positions);
		let (node_count, edge_count) = (mirror.nodes.len(), mirror.edges.len());

		let mut simulation = self.create_simulation(mirror)?;
		simulation.on_tick(Some(synchronizer(positions.clone())));

		let state = Rc::new(RefCell::new(LayoutState {
			simulation,
			positions,
			pin_on_drag: self.config.pin_on_drag,
			pin_on_click: self.config.pin_on_click_with_modifier,
			pin_modifier: self.config.pin_modifier,
			reheat_alpha: self.config.reheat_alpha,
			active: true,
			dragging: IndexMap::new(),
		}));
		let subscriptions = interaction::subscribe(&gestures, &state);

		info!("force layout activated with {node_count} nodes and {edge_count} edges");
		self.session = Some(Session {
			state,
			graph,
			viewport,
			gestures,
			subscriptions,
			watcher,
		});
		Ok(())
	}

	fn deactivate(&mut self) {
		let Some(session) = self.session.take() else {
			return;
		};
		for subscription in &session.subscriptions {
			session.gestures.unsubscribe(*subscription);
		}
		let mut state = session.state.borrow_mut();
		state.active = false;
		state.dragging.clear();
		state.simulation.stop();
		state.simulation.on_tick(None);
		info!("force layout deactivated");
	}

	fn tick(&mut self) -> bool {
		let Some(session) = self.session.as_mut() else {
			return false;
		};
		session.sync();
		session.state.borrow_mut().simulation.step()
	}
}

impl Drop for ForceLayout {
	fn drop(&mut self) {
		self.deactivate();
	}
}
