//! Drag and click handling: turns gestures into pins on the simulation and the store.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{trace, warn};

use super::force::LayoutState;
use super::gesture::{ClickEvent, DragEvent, GestureEmitter, GestureEvent, GestureKind, Subscription};
use super::types::Point;

const GESTURES: [GestureKind; 4] = [
	GestureKind::DragStart,
	GestureKind::DragMove,
	GestureKind::DragEnd,
	GestureKind::Click,
];

/// Subscribes one handler per gesture kind. The handlers only hold a weak reference, so
/// they go inert once the layout state is dropped.
pub(crate) fn subscribe(gestures: &GestureEmitter, state: &Rc<RefCell<LayoutState>>) -> Vec<Subscription> {
	GESTURES
		.into_iter()
		.map(|kind| {
			let state = Rc::downgrade(state);
			gestures.subscribe(kind, move |event| dispatch(&state, event))
		})
		.collect()
}

fn dispatch(state: &Weak<RefCell<LayoutState>>, event: &GestureEvent) {
	let Some(cell) = state.upgrade() else {
		return;
	};
	let Ok(mut state) = cell.try_borrow_mut() else {
		warn!("dropping {:?} gesture delivered while the layout is busy", event.kind());
		return;
	};
	if !state.active {
		return;
	}
	match event {
		GestureEvent::DragStart(drag) | GestureEvent::DragMove(drag) => drag_to(&mut state, drag),
		GestureEvent::DragEnd(drag) => drop_at(&mut state, drag),
		GestureEvent::Click(click) => toggle_pin(&mut state, click),
	}
}

/// Holds every dragged node at the pointer. The pin is set on the solver only; the store
/// just gets an entry for nodes it does not know yet.
pub(crate) fn drag_to(state: &mut LayoutState, drag: &DragEvent) {
	let LayoutState {
		simulation,
		positions,
		dragging,
		..
	} = state;
	positions.update(|map| {
		for (id, &point) in &drag.positions {
			trace!("dragging {id} to ({}, {})", point.x, point.y);
			map.entry(id.clone()).or_default();
			dragging.insert(id.clone(), point);
			if let Some(node) = simulation.node_mut(id) {
				node.set_pin(point);
			}
		}
	});
	state.reheat();
}

/// Ends a drag: keeps the pin for fixed nodes (or always with `pin_on_drag`), otherwise
/// leaves the node free at the drop position.
pub(crate) fn drop_at(state: &mut LayoutState, drag: &DragEvent) {
	let pin_on_drag = state.pin_on_drag;
	let LayoutState {
		simulation,
		positions,
		dragging,
		..
	} = state;
	positions.update(|map| {
		for (id, &point) in &drag.positions {
			dragging.shift_remove(id);
			let entry = map.entry(id.clone()).or_default();
			let node = simulation.node_mut(id);
			entry.move_to(point);
			if entry.fixed || pin_on_drag {
				trace!("pinning {id} at drop position");
				entry.fixed = true;
				entry.set_pin(point);
				if let Some(node) = node {
					node.set_pin(point);
				}
			} else {
				entry.clear_pin();
				if let Some(node) = node {
					node.move_to(point);
					node.clear_pin();
				}
			}
		}
	});
	state.reheat();
}

/// Toggles the pin of the clicked node when the configured modifier is held.
pub(crate) fn toggle_pin(state: &mut LayoutState, click: &ClickEvent) {
	if !state.pin_on_click || !click.modifiers.held(state.pin_modifier) {
		return;
	}
	let LayoutState {
		simulation,
		positions,
		..
	} = state;
	positions.update(|map| {
		let entry = map.entry(click.node.clone()).or_default();
		let mut node = simulation.node_mut(&click.node);
		let current = node.as_deref().map_or(entry.point(), |n| n.point());

		if entry.fixed {
			let release: Point = node
				.as_deref()
				.and_then(|n| n.pin())
				.or(entry.pin())
				.unwrap_or(current);
			trace!("unpinning {} at ({}, {})", click.node, release.x, release.y);
			entry.fixed = false;
			entry.move_to(release);
			entry.clear_pin();
			if let Some(node) = node.as_deref_mut() {
				node.move_to(release);
				node.clear_pin();
			}
		} else {
			trace!("pinning {} at ({}, {})", click.node, current.x, current.y);
			entry.fixed = true;
			entry.move_to(current);
			entry.set_pin(current);
			if let Some(node) = node.as_deref_mut() {
				node.set_pin(current);
			}
		}
	});
	state.reheat();
}
