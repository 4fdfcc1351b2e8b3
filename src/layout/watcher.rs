//! Change detection on the externally owned graph.
//!
//! The watcher keeps plain snapshots of the node id list and the edge list and diffs
//! them by value, so edges mutated in place are noticed just like replaced ones.

use std::cell::RefCell;

use super::types::{Edge, NodeId};

/// Read access to the host's graph.
pub trait GraphSource {
	fn node_ids(&self) -> Vec<NodeId>;

	fn edges(&self) -> Vec<Edge>;
}

impl<T: GraphSource + ?Sized> GraphSource for RefCell<T> {
	fn node_ids(&self) -> Vec<NodeId> {
		self.borrow().node_ids()
	}

	fn edges(&self) -> Vec<Edge> {
		self.borrow().edges()
	}
}

/// Which parts of the graph changed since the previous poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphChanges {
	pub nodes: bool,
	pub edges: bool,
}

impl GraphChanges {
	pub fn any(&self) -> bool {
		self.nodes || self.edges
	}
}

#[derive(Clone, Debug, Default)]
pub struct GraphWatcher {
	node_ids: Vec<NodeId>,
	edges: Vec<Edge>,
}

impl GraphWatcher {
	pub fn new(source: &dyn GraphSource) -> Self {
		Self {
			node_ids: source.node_ids(),
			edges: source.edges(),
		}
	}

	/// Takes fresh snapshots and reports what differs from the last ones.
	pub fn poll(&mut self, source: &dyn GraphSource) -> GraphChanges {
		let node_ids = source.node_ids();
		let edges = source.edges();
		let changes = GraphChanges {
			nodes: node_ids != self.node_ids,
			edges: edges != self.edges,
		};
		if changes.nodes {
			self.node_ids = node_ids;
		}
		if changes.edges {
			self.edges = edges;
		}
		changes
	}

	pub fn node_ids(&self) -> &[NodeId] {
		&self.node_ids
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}
}
