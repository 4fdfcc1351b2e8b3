//! Pointer gestures on nodes and the emitter that dispatches them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::types::{NodeId, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
	DragStart,
	DragMove,
	DragEnd,
	Click,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModifierKey {
	#[default]
	Alt,
	Ctrl,
	Shift,
	Meta,
}

/// Modifier keys held while a gesture happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	pub alt: bool,
	pub ctrl: bool,
	pub shift: bool,
	pub meta: bool,
}

impl Modifiers {
	pub fn held(&self, key: ModifierKey) -> bool {
		match key {
			ModifierKey::Alt => self.alt,
			ModifierKey::Ctrl => self.ctrl,
			ModifierKey::Shift => self.shift,
			ModifierKey::Meta => self.meta,
		}
	}
}

/// Pointer positions of every node taking part in a drag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DragEvent {
	pub positions: IndexMap<NodeId, Point>,
	/// Keys held by the user, for other subscribers. Drags ignore them; only clicks
	/// consult modifiers.
	pub modifiers: Modifiers,
}

impl DragEvent {
	pub fn single(node: impl Into<NodeId>, point: Point) -> Self {
		Self {
			positions: IndexMap::from([(node.into(), point)]),
			modifiers: Modifiers::default(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClickEvent {
	pub node: NodeId,
	pub point: Point,
	pub modifiers: Modifiers,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
	DragStart(DragEvent),
	DragMove(DragEvent),
	DragEnd(DragEvent),
	Click(ClickEvent),
}

impl GestureEvent {
	pub fn kind(&self) -> GestureKind {
		match self {
			GestureEvent::DragStart(_) => GestureKind::DragStart,
			GestureEvent::DragMove(_) => GestureKind::DragMove,
			GestureEvent::DragEnd(_) => GestureKind::DragEnd,
			GestureEvent::Click(_) => GestureKind::Click,
		}
	}
}

/// Handle returned by [`GestureEmitter::subscribe`]; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
	id: u64,
	kind: GestureKind,
}

impl Subscription {
	pub fn kind(&self) -> GestureKind {
		self.kind
	}
}

type Handler = Rc<dyn Fn(&GestureEvent)>;

#[derive(Default)]
struct Listeners {
	next_id: u64,
	handlers: Vec<(Subscription, Handler)>,
}

/// Single-threaded gesture event source. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct GestureEmitter {
	listeners: Rc<RefCell<Listeners>>,
}

impl GestureEmitter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&self, kind: GestureKind, handler: impl Fn(&GestureEvent) + 'static) -> Subscription {
		let mut listeners = self.listeners.borrow_mut();
		let subscription = Subscription {
			id: listeners.next_id,
			kind,
		};
		listeners.next_id += 1;
		listeners.handlers.push((subscription, Rc::new(handler)));
		subscription
	}

	/// Returns whether the subscription was still registered.
	pub fn unsubscribe(&self, subscription: Subscription) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let before = listeners.handlers.len();
		listeners.handlers.retain(|(s, _)| *s != subscription);
		listeners.handlers.len() != before
	}

	/// Dispatches `event` to the handlers subscribed to its kind, in subscription order.
	/// Returns how many handlers ran.
	pub fn emit(&self, event: &GestureEvent) -> usize {
		let kind = event.kind();
		// Handlers may subscribe or unsubscribe while running.
		let handlers: Vec<Handler> = self
			.listeners
			.borrow()
			.handlers
			.iter()
			.filter(|(s, _)| s.kind == kind)
			.map(|(_, h)| h.clone())
			.collect();
		for handler in &handlers {
			handler(event);
		}
		handlers.len()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().handlers.len()
	}
}

impl fmt::Debug for GestureEmitter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GestureEmitter")
			.field("listeners", &self.listener_count())
			.finish()
	}
}
