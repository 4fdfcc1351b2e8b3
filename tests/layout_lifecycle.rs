use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use force_graph_layout::layout::{
	ClickEvent, DragEvent, Edge, ForceLayout, ForceLayoutConfig, GestureEmitter, GestureEvent, GraphSource,
	LayoutContext, LayoutHandler, ModifierKey, Modifiers, NodeId, NodePosition, Point, PositionStore,
	SpringSettings, Viewport, ViewportArea, spring_simulation,
};

#[derive(Default)]
struct TestGraph {
	nodes: Vec<NodeId>,
	edges: Vec<Edge>,
}

impl GraphSource for TestGraph {
	fn node_ids(&self) -> Vec<NodeId> {
		self.nodes.clone()
	}

	fn edges(&self) -> Vec<Edge> {
		self.edges.clone()
	}
}

#[derive(Default)]
struct TestViewport {
	center: Cell<Point>,
}

impl Viewport for TestViewport {
	fn visible_area(&self) -> ViewportArea {
		ViewportArea {
			center: self.center.get(),
		}
	}
}

struct Harness {
	layout: ForceLayout,
	graph: Rc<RefCell<TestGraph>>,
	positions: PositionStore,
	gestures: GestureEmitter,
	viewport: Rc<TestViewport>,
}

impl Harness {
	fn new(nodes: &[&str], edges: &[(&str, &str)], config: ForceLayoutConfig) -> Self {
		Self::with_positions(nodes, edges, config, PositionStore::new())
	}

	fn with_positions(
		nodes: &[&str],
		edges: &[(&str, &str)],
		config: ForceLayoutConfig,
		positions: PositionStore,
	) -> Self {
		let graph = Rc::new(RefCell::new(TestGraph {
			nodes: nodes.iter().map(|n| n.to_string()).collect(),
			edges: edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
		}));
		let gestures = GestureEmitter::new();
		let viewport = Rc::new(TestViewport::default());
		let mut layout = ForceLayout::new(config);
		layout
			.activate(LayoutContext {
				positions: positions.clone(),
				graph: graph.clone(),
				gestures: gestures.clone(),
				viewport: viewport.clone(),
			})
			.expect("activate");
		Self {
			layout,
			graph,
			positions,
			gestures,
			viewport,
		}
	}

	fn run(&mut self, steps: usize) {
		for _ in 0..steps {
			self.layout.tick();
		}
	}

	/// Ticks until the simulation cools down, returning the number of steps taken.
	fn settle(&mut self, limit: usize) -> usize {
		let mut steps = 0;
		while self.layout.tick() {
			steps += 1;
			assert!(steps <= limit, "layout still running after {limit} steps");
		}
		steps
	}

	fn position(&self, id: &str) -> NodePosition {
		self.positions.get(id).expect("position entry")
	}

	fn start_drag(&self, id: &str, to: Point) {
		let event = DragEvent::single(id, to);
		self.gestures.emit(&GestureEvent::DragStart(event.clone()));
		self.gestures.emit(&GestureEvent::DragMove(event));
	}

	fn drag(&self, id: &str, to: Point) {
		let event = DragEvent::single(id, to);
		self.gestures.emit(&GestureEvent::DragStart(event.clone()));
		self.gestures.emit(&GestureEvent::DragMove(event.clone()));
		self.gestures.emit(&GestureEvent::DragEnd(event));
	}

	fn alt_click(&self, id: &str) {
		self.gestures.emit(&GestureEvent::Click(ClickEvent {
			node: id.into(),
			point: Point::ORIGIN,
			modifiers: Modifiers {
				alt: true,
				..Modifiers::default()
			},
		}));
	}
}

fn stacked(ids: &[&str]) -> PositionStore {
	ids.iter()
		.map(|id| (id.to_string(), NodePosition::at(Point::ORIGIN)))
		.collect()
}

#[test]
fn stacked_nodes_settle_to_finite_coordinates() {
	let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
	let mut h = Harness::with_positions(&ids, &[], ForceLayoutConfig::default(), stacked(&ids));

	let steps = h.settle(300);

	assert!(steps > 0);
	assert!(!h.layout.is_running());
	assert!(h.layout.alpha().expect("active") < 0.01);
	for id in ids {
		let p = h.position(id);
		assert!(p.x.is_finite() && p.y.is_finite(), "{id}: {p:?}");
	}
}

#[test]
fn linked_pair_settles_at_link_distance() {
	let positions: PositionStore = [
		("a".to_string(), NodePosition::at(Point::new(0.0, 0.0))),
		("b".to_string(), NodePosition::at(Point::new(10.0, 0.0))),
	]
	.into_iter()
	.collect();
	let mut h = Harness::with_positions(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default(), positions);

	h.settle(300);

	let distance = h.position("a").point().distance(h.position("b").point());
	assert!((85.0..=115.0).contains(&distance), "distance {distance}");
}

#[test]
fn node_added_while_running_starts_at_viewport_center() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(5);

	let center = Point::new(250.0, -40.0);
	h.viewport.center.set(center);
	h.graph.borrow_mut().nodes.push("c".into());
	h.graph.borrow_mut().edges.push(Edge::new("c", "a"));
	let changes = h.layout.sync_graph();

	assert!(changes.nodes && changes.edges);
	assert_eq!(h.position("c"), NodePosition::at(center));
	assert!(h.layout.is_running());

	assert!(h.layout.tick());
	assert_ne!(h.position("c").point(), center);
}

#[test]
fn graph_changes_are_picked_up_on_tick() {
	let mut h = Harness::new(&["a"], &[], ForceLayoutConfig::default());
	h.settle(300);

	h.graph.borrow_mut().nodes.push("b".into());
	assert!(h.layout.tick(), "a new node reheats the layout");
	assert!(h.positions.contains("b"));
}

#[test]
fn in_place_edge_edit_reheats_without_touching_nodes() {
	let mut h = Harness::new(&["a", "b", "c"], &[("a", "b")], ForceLayoutConfig::default());
	h.settle(300);
	let before = h.positions.snapshot();

	h.graph.borrow_mut().edges[0].target = "c".into();
	let changes = h.layout.sync_graph();

	assert!(changes.edges && !changes.nodes);
	assert_eq!(h.layout.alpha(), Some(0.1));
	assert_eq!(h.positions.snapshot(), before);
	assert!(h.layout.tick());
}

#[test]
fn drag_end_releases_node_by_default() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(10);

	let p = Point::new(42.0, -17.0);
	h.drag("a", p);

	let a = h.position("a");
	assert_eq!(a, NodePosition::at(p));
	assert!(!a.fixed && a.fx.is_none() && a.fy.is_none());
	assert!(h.layout.is_running());
}

#[test]
fn drag_end_pins_node_with_pin_on_drag() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default().with_pin_on_drag(true));
	h.run(10);

	let p = Point::new(42.0, -17.0);
	h.drag("a", p);
	let a = h.position("a");
	assert!(a.fixed);
	assert_eq!(a.pin(), Some(p));

	h.run(20);
	let a = h.position("a");
	assert_eq!(a.point(), p, "a pinned node does not drift");
	assert_eq!(a.pin(), Some(p));
}

#[test]
fn several_nodes_drag_together() {
	let mut h = Harness::new(&["a", "b", "c"], &[("a", "b"), ("b", "c")], ForceLayoutConfig::default());
	h.run(5);

	let (pa, pb) = (Point::new(10.0, 10.0), Point::new(-10.0, 5.0));
	let event = DragEvent {
		positions: IndexMap::from([("a".to_string(), pa), ("b".to_string(), pb)]),
		..DragEvent::default()
	};
	h.gestures.emit(&GestureEvent::DragStart(event.clone()));
	h.run(3);
	assert_eq!(h.position("a").point(), pa);
	assert_eq!(h.position("b").point(), pb);

	h.gestures.emit(&GestureEvent::DragEnd(event));
	assert_eq!(h.position("a"), NodePosition::at(pa));
	assert_eq!(h.position("b"), NodePosition::at(pb));

	h.run(5);
	assert_ne!(h.position("a").point(), pa, "released nodes move again");
	assert_ne!(h.position("b").point(), pb, "released nodes move again");
}

#[test]
fn dragged_node_stays_under_pointer_while_graph_changes() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(5);

	let p = Point::new(80.0, -60.0);
	h.start_drag("a", p);
	h.graph.borrow_mut().nodes.push("c".into());
	h.layout.sync_graph();
	h.run(3);

	let a = h.position("a");
	assert_eq!(a.point(), p);
	assert_eq!(a.pin(), None);
}

#[test]
fn teardown_mid_drag_leaves_no_pin_behind() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(5);

	h.start_drag("a", Point::new(300.0, 300.0));
	h.layout.deactivate();
	let a = h.position("a");
	assert!(!a.fixed && a.fx.is_none() && a.fy.is_none(), "{a:?}");

	h.layout
		.activate(LayoutContext {
			positions: h.positions.clone(),
			graph: h.graph.clone(),
			gestures: h.gestures.clone(),
			viewport: h.viewport.clone(),
		})
		.expect("reactivate");
	let before = h.position("a").point();
	h.run(50);

	let a = h.position("a");
	assert!(!a.fixed && a.fx.is_none() && a.fy.is_none(), "{a:?}");
	assert_ne!(a.point(), before, "the node is free to move");
}

#[test]
fn modifier_click_toggles_pin_and_unpins_in_place() {
	let config = ForceLayoutConfig::default().with_pin_on_click(true, ModifierKey::Alt);
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], config);
	h.run(15);

	let before = h.position("a").point();
	h.alt_click("a");
	let pinned = h.position("a");
	assert!(pinned.fixed);
	assert_eq!(pinned.pin(), Some(before));

	h.run(10);
	assert_eq!(h.position("a").point(), before);

	h.alt_click("a");
	let released = h.position("a");
	assert_eq!(released, NodePosition::at(before));
}

#[test]
fn click_without_option_or_modifier_does_nothing() {
	let mut h = Harness::new(&["a"], &[], ForceLayoutConfig::default());
	h.settle(300);
	h.alt_click("a");
	assert!(!h.position("a").fixed);
	assert!(!h.layout.is_running());

	let config = ForceLayoutConfig::default().with_pin_on_click(true, ModifierKey::Shift);
	let mut h = Harness::new(&["a"], &[], config);
	h.settle(300);
	h.alt_click("a");
	assert!(!h.position("a").fixed);
}

#[test]
fn deactivation_stops_all_writes() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(5);
	h.layout.deactivate();
	let frozen = h.positions.snapshot();

	h.graph.borrow_mut().nodes.push("c".into());
	h.graph.borrow_mut().edges.push(Edge::new("b", "c"));
	assert!(!h.layout.tick());
	assert_eq!(h.layout.sync_graph(), Default::default());
	h.drag("a", Point::new(500.0, 500.0));
	h.alt_click("b");
	h.run(20);

	assert_eq!(h.positions.snapshot(), frozen);
	assert_eq!(h.gestures.listener_count(), 0);
}

#[test]
fn deactivating_twice_is_harmless() {
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], ForceLayoutConfig::default());
	h.run(5);

	h.layout.deactivate();
	let once = h.positions.snapshot();
	h.layout.deactivate();

	assert_eq!(h.positions.snapshot(), once);
	assert!(!h.layout.is_active());
	assert_eq!(h.layout.alpha(), None);
	assert_eq!(h.gestures.listener_count(), 0);
}

#[test]
fn layout_can_be_reactivated_after_teardown() {
	let mut h = Harness::new(&["a"], &[], ForceLayoutConfig::default());
	h.layout.deactivate();

	h.layout
		.activate(LayoutContext {
			positions: h.positions.clone(),
			graph: h.graph.clone(),
			gestures: h.gestures.clone(),
			viewport: h.viewport.clone(),
		})
		.expect("reactivate");
	assert!(h.layout.tick());
	assert_eq!(h.gestures.listener_count(), 4);
}

#[test]
fn removed_then_readded_node_keeps_its_pin() {
	let config = ForceLayoutConfig::default().with_pin_on_click(true, ModifierKey::Alt);
	let mut h = Harness::new(&["a", "b"], &[("a", "b")], config);
	h.run(5);
	h.alt_click("b");
	let pin = h.position("b").pin().expect("pinned");

	h.graph.borrow_mut().nodes.retain(|n| n != "b");
	h.layout.sync_graph();
	h.run(5);
	assert!(h.positions.contains("b"), "entries outlive their node");

	h.graph.borrow_mut().nodes.push("b".into());
	h.layout.sync_graph();
	h.run(5);
	let b = h.position("b");
	assert!(b.fixed);
	assert_eq!(b.point(), pin);
}

#[test]
fn custom_engine_replaces_default_forces() {
	let config = ForceLayoutConfig::default()
		.with_pin_on_drag(true)
		.with_simulation(spring_simulation(SpringSettings::default()));
	let mut h = Harness::new(&["a", "b", "c"], &[("a", "b"), ("b", "c")], config);
	h.run(10);

	let p = Point::new(-30.0, 12.0);
	h.drag("c", p);
	h.run(10);

	assert_eq!(h.position("c").point(), p);
	for id in ["a", "b"] {
		let q = h.position(id);
		assert!(q.x.is_finite() && q.y.is_finite());
	}
}
