use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

/// Opaque node identifier, unique within one graph snapshot.
pub type NodeId = String;

/// A 2-D coordinate in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(&self, other: Point) -> f64 {
		((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
	}
}

/// Externally visible layout record of one node.
///
/// `fx`/`fy` hold the coordinate the solver must keep the node at. `fixed` is the
/// persisted pin intent: when it is set, `fx`/`fy` carry the committed pin. Without
/// `fixed`, `fx`/`fy` only appear while a drag is in progress.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePosition {
	pub x: f64,
	pub y: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub fixed: bool,
}

impl NodePosition {
	pub fn at(point: Point) -> Self {
		Self {
			x: point.x,
			y: point.y,
			..Self::default()
		}
	}

	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn move_to(&mut self, point: Point) {
		self.x = point.x;
		self.y = point.y;
	}

	/// The pinned coordinate, if both axes are pinned.
	pub fn pin(&self) -> Option<Point> {
		Some(Point::new(self.fx?, self.fy?))
	}

	pub fn set_pin(&mut self, point: Point) {
		self.fx = Some(point.x);
		self.fy = Some(point.y);
	}

	pub fn clear_pin(&mut self) {
		self.fx = None;
		self.fy = None;
	}
}

/// Ordered node id to position mapping held by a [`PositionStore`].
pub type NodePositions = IndexMap<NodeId, NodePosition>;

/// Shared handle to the externally owned position mapping.
///
/// Cloning the handle shares the mapping. The layout adds missing entries and mutates
/// existing ones but never removes any; pruning belongs to the owner.
#[derive(Clone, Debug, Default)]
pub struct PositionStore(Rc<RefCell<NodePositions>>);

impl PositionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, id: &str) -> Option<NodePosition> {
		self.0.borrow().get(id).cloned()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.0.borrow().contains_key(id)
	}

	pub fn insert(&self, id: impl Into<NodeId>, position: NodePosition) -> Option<NodePosition> {
		self.0.borrow_mut().insert(id.into(), position)
	}

	pub fn remove(&self, id: &str) -> Option<NodePosition> {
		self.0.borrow_mut().shift_remove(id)
	}

	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	/// Copy of every entry, in insertion order.
	pub fn snapshot(&self) -> NodePositions {
		self.0.borrow().clone()
	}

	/// Read access to the mapping for the duration of `f`.
	pub fn with<R>(&self, f: impl FnOnce(&NodePositions) -> R) -> R {
		f(&self.0.borrow())
	}

	/// Mutable access to the mapping for the duration of `f`. All writes made inside one
	/// call become visible together.
	pub fn update<R>(&self, f: impl FnOnce(&mut NodePositions) -> R) -> R {
		f(&mut self.0.borrow_mut())
	}
}

impl FromIterator<(NodeId, NodePosition)> for PositionStore {
	fn from_iter<I: IntoIterator<Item = (NodeId, NodePosition)>>(iter: I) -> Self {
		Self(Rc::new(RefCell::new(iter.into_iter().collect())))
	}
}

/// An edge of the externally owned graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
	pub source: NodeId,
	pub target: NodeId,
}

impl Edge {
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Simulation-local mirror of one node. Velocity stays internal to the solvers.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationNode {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub(crate) vx: f64,
	pub(crate) vy: f64,
}

impl SimulationNode {
	pub fn new(id: impl Into<NodeId>, x: f64, y: f64) -> Self {
		Self {
			id: id.into(),
			x,
			y,
			fx: None,
			fy: None,
			vx: 0.0,
			vy: 0.0,
		}
	}

	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn pin(&self) -> Option<Point> {
		Some(Point::new(self.fx?, self.fy?))
	}

	pub fn set_pin(&mut self, point: Point) {
		self.fx = Some(point.x);
		self.fy = Some(point.y);
	}

	pub fn clear_pin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	/// Moves the node without pinning it.
	pub fn move_to(&mut self, point: Point) {
		self.x = point.x;
		self.y = point.y;
	}
}

/// Simulation-local edge record, keyed by plain node ids.
///
/// Deliberately not `Clone`: a record is built fresh for every mirror refresh and moved
/// into the engine, never shared with the graph owner or reused across refreshes.
#[derive(Debug, PartialEq, Eq)]
pub struct SimulationEdge {
	pub index: usize,
	pub source: NodeId,
	pub target: NodeId,
}

/// Visible part of the pan/zoom viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportArea {
	pub center: Point,
}

/// Read-only access to the host's pan/zoom viewport.
pub trait Viewport {
	fn visible_area(&self) -> ViewportArea;

	fn visible_area_center(&self) -> Point {
		self.visible_area().center
	}
}
