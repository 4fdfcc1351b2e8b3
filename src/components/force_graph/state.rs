use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::rc::Rc;

use crate::layout::{
	ClickEvent, DragEvent, ForceLayout, ForceLayoutConfig, GestureEmitter, GestureEvent, LayoutContext,
	LayoutHandler, Modifiers, NodeId, NodePosition, Point, PositionStore, Result, Viewport, ViewportArea,
};

use super::types::GraphData;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
/// Pointer travel (screen pixels) below which a press is a click rather than a drag.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: Option<String>,
	pub color: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

/// Pan/zoom state of the canvas, shared with the layout to place new nodes.
#[derive(Debug, Default)]
pub struct CanvasViewport {
	transform: Cell<ViewTransform>,
	size: Cell<(f64, f64)>,
}

impl CanvasViewport {
	pub fn transform(&self) -> ViewTransform {
		self.transform.get()
	}

	pub fn set_transform(&self, transform: ViewTransform) {
		self.transform.set(transform);
	}

	pub fn size(&self) -> (f64, f64) {
		self.size.get()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		let t = self.transform.get();
		Point::new((sx - t.x) / t.k, (sy - t.y) / t.k)
	}
}

impl Viewport for CanvasViewport {
	fn visible_area(&self) -> ViewportArea {
		let (w, h) = self.size.get();
		ViewportArea {
			center: self.screen_to_graph(w / 2.0, h / 2.0),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeId>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
	pub last: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<NodeId>,
	pub neighbors: HashSet<NodeId>,
	pub highlight_t: f64,
	pub prev_node: Option<NodeId>,
	pub prev_neighbors: HashSet<NodeId>,
	delay_t: f64,
}

pub struct ForceGraphState {
	pub layout: ForceLayout,
	pub graph: Rc<RefCell<GraphData>>,
	pub positions: PositionStore,
	pub gestures: GestureEmitter,
	pub viewport: Rc<CanvasViewport>,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub flow_time: f64,
	node_info: HashMap<NodeId, NodeInfo>,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64, config: ForceLayoutConfig) -> Result<Self> {
		let positions = PositionStore::new();
		// Seed a ring around the origin, which sits in the middle of the canvas.
		for (i, node) in data.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / data.nodes.len() as f64;
			positions.insert(
				node.id.clone(),
				NodePosition::at(Point::new(100.0 * angle.cos(), 100.0 * angle.sin())),
			);
		}

		let viewport = Rc::new(CanvasViewport::default());
		viewport.set_transform(ViewTransform {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		});
		viewport.size.set((width, height));

		let graph = Rc::new(RefCell::new(data.clone()));
		let gestures = GestureEmitter::new();
		let mut layout = ForceLayout::new(config);
		layout.activate(LayoutContext {
			positions: positions.clone(),
			graph: graph.clone(),
			gestures: gestures.clone(),
			viewport: viewport.clone(),
		})?;

		Ok(Self {
			layout,
			graph,
			positions,
			gestures,
			viewport,
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			flow_time: 0.0,
			node_info: node_info(data),
		})
	}

	/// Swaps in new graph data; the layout picks the change up on its next tick.
	pub fn set_data(&mut self, data: GraphData) {
		self.node_info = node_info(&data);
		*self.graph.borrow_mut() = data;
	}

	pub fn info(&self, id: &str) -> Option<&NodeInfo> {
		self.node_info.get(id)
	}

	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	pub fn width(&self) -> f64 {
		self.viewport.size().0
	}

	pub fn height(&self) -> f64 {
		self.viewport.size().1
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		self.viewport.screen_to_graph(sx, sy)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let pointer = self.screen_to_graph(sx, sy);
		let graph = self.graph.borrow();
		self.positions.with(|positions| {
			let mut found = None;
			for node in &graph.nodes {
				let Some(position) = positions.get(&node.id) else {
					continue;
				};
				// HIT_RADIUS is in world-space, scales with zoom like nodes
				if position.point().distance(pointer) < HIT_RADIUS {
					found = Some(node.id.clone());
				}
			}
			found
		})
	}

	/// Starts dragging the node under the pointer. Returns false when there is none.
	pub fn begin_drag(&mut self, sx: f64, sy: f64, modifiers: Modifiers) -> bool {
		let Some(id) = self.node_at_position(sx, sy) else {
			return false;
		};
		let node_start = self
			.positions
			.get(&id)
			.map(|p| p.pin().unwrap_or(p.point()))
			.unwrap_or_default();
		self.drag = DragState {
			active: true,
			node: Some(id.clone()),
			moved: false,
			start_x: sx,
			start_y: sy,
			node_start,
			last: node_start,
		};
		self.gestures.emit(&GestureEvent::DragStart(DragEvent {
			modifiers,
			..DragEvent::single(id, node_start)
		}));
		true
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64, modifiers: Modifiers) {
		let Some(id) = self.drag.node.clone() else {
			return;
		};
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
			return;
		}
		self.drag.moved = true;

		let k = self.transform().k;
		let point = Point::new(self.drag.node_start.x + dx / k, self.drag.node_start.y + dy / k);
		self.drag.last = point;
		self.gestures.emit(&GestureEvent::DragMove(DragEvent {
			modifiers,
			..DragEvent::single(id, point)
		}));
	}

	/// Finishes the press: a drop when the pointer moved, a click otherwise.
	pub fn end_drag(&mut self, modifiers: Modifiers) {
		let drag = std::mem::take(&mut self.drag);
		let Some(id) = drag.node else {
			return;
		};
		let drop = GestureEvent::DragEnd(DragEvent {
			modifiers,
			..DragEvent::single(id.clone(), drag.last)
		});
		self.gestures.emit(&drop);
		if !drag.moved {
			self.gestures.emit(&GestureEvent::Click(ClickEvent {
				node: id,
				point: drag.last,
				modifiers,
			}));
		}
	}

	pub fn set_hover(&mut self, node: Option<NodeId>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node.clone();
		self.hover.neighbors.clear();

		if let Some(id) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for link in &self.graph.borrow().links {
				if link.source == id {
					self.hover.neighbors.insert(link.target.clone());
				} else if link.target == id {
					self.hover.neighbors.insert(link.source.clone());
				}
			}
		}
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_node.as_deref() == Some(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.layout.tick();
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		let mut transform = self.transform();
		transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
		transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		self.viewport.set_transform(transform);
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let mut transform = self.transform();
		let new_k = (transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / transform.k;
		transform.x = sx - (sx - transform.x) * ratio;
		transform.y = sy - (sy - transform.y) * ratio;
		transform.k = new_k;
		self.viewport.set_transform(transform);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.size.set((width, height));
	}
}

fn node_info(data: &GraphData) -> HashMap<NodeId, NodeInfo> {
	data.nodes
		.iter()
		.map(|node| {
			let color = node.color.clone().unwrap_or_else(|| {
				node.group
					.map(|g| COLORS[g as usize % COLORS.len()].into())
					.unwrap_or(COLORS[0].into())
			});
			let info = NodeInfo {
				label: node.label.clone(),
				color,
			};
			(node.id.clone(), info)
		})
		.collect()
}
