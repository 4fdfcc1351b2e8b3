//! Headless force-directed layout for interactive graph views.
//!
//! A host keeps node coordinates in a [`PositionStore`], hands it to a
//! [`ForceLayout`] together with read access to its graph, a gesture source and its
//! viewport, and calls [`LayoutHandler::tick`] once per frame. The layout keeps the store
//! up to date, follows graph edits and honours drags and pins, all on the host's thread.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use force_graph_layout::layout::{
//! 	Edge, ForceLayout, GestureEmitter, GraphSource, LayoutContext, LayoutHandler, NodeId,
//! 	PositionStore, Viewport, ViewportArea,
//! };
//!
//! struct Graph(Vec<NodeId>, Vec<Edge>);
//!
//! impl GraphSource for Graph {
//! 	fn node_ids(&self) -> Vec<NodeId> {
//! 		self.0.clone()
//! 	}
//!
//! 	fn edges(&self) -> Vec<Edge> {
//! 		self.1.clone()
//! 	}
//! }
//!
//! struct Screen;
//!
//! impl Viewport for Screen {
//! 	fn visible_area(&self) -> ViewportArea {
//! 		ViewportArea::default()
//! 	}
//! }
//!
//! let graph = Rc::new(RefCell::new(Graph(vec!["a".into(), "b".into()], vec![Edge::new("a", "b")])));
//! let positions = PositionStore::new();
//! let mut layout = ForceLayout::default();
//! layout
//! 	.activate(LayoutContext {
//! 		positions: positions.clone(),
//! 		graph: graph.clone(),
//! 		gestures: GestureEmitter::new(),
//! 		viewport: Rc::new(Screen),
//! 	})
//! 	.unwrap();
//!
//! while layout.tick() {}
//! assert!(positions.get("a").unwrap().x.is_finite());
//! layout.deactivate();
//! ```

use std::rc::Rc;

mod config;
mod error;
mod force;
mod gesture;
mod interaction;
mod mirror;
pub mod simulation;
mod types;
mod watcher;

pub use config::ForceLayoutConfig;
pub use error::{LayoutError, Result};
pub use force::ForceLayout;
pub use gesture::{
	ClickEvent, DragEvent, GestureEmitter, GestureEvent, GestureKind, ModifierKey, Modifiers, Subscription,
};
pub use mirror::{GraphMirror, build_edges, build_nodes, dangling_edges, place_new_nodes};
pub use simulation::{
	ForceSettings, ForceSimulation, Simulation, SimulationFactory, SpringSettings, spring_simulation,
};
pub use types::{
	Edge, NodeId, NodePosition, NodePositions, Point, PositionStore, SimulationEdge, SimulationNode, Viewport,
	ViewportArea,
};
pub use watcher::{GraphChanges, GraphSource, GraphWatcher};

/// Everything a layout needs from its host for one activation.
#[derive(Clone)]
pub struct LayoutContext {
	pub positions: PositionStore,
	pub graph: Rc<dyn GraphSource>,
	pub gestures: GestureEmitter,
	pub viewport: Rc<dyn Viewport>,
}

/// Plug-in contract between a host view and a layout strategy.
pub trait LayoutHandler {
	/// Starts laying out the host graph.
	fn activate(&mut self, context: LayoutContext) -> Result<()>;

	/// Stops all work and detaches from the host. Calling it again is a no-op.
	fn deactivate(&mut self);

	/// Advances the layout by one frame. Returns whether anything moved.
	fn tick(&mut self) -> bool {
		false
	}
}
