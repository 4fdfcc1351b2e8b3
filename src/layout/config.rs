use std::fmt;

use super::gesture::ModifierKey;
use super::simulation::{ForceSettings, SimulationFactory};

/// Options of a [`ForceLayout`](super::ForceLayout).
#[derive(Clone)]
pub struct ForceLayoutConfig {
	/// Every drag pins the node where it is dropped.
	pub pin_on_drag: bool,
	/// Clicking a node while holding `pin_modifier` toggles its pin.
	pub pin_on_click_with_modifier: bool,
	pub pin_modifier: ModifierKey,
	/// Temperature restored after a drag, click or graph change.
	pub reheat_alpha: f64,
	pub forces: ForceSettings,
	/// Replaces the default force composition entirely.
	pub create_simulation: Option<SimulationFactory>,
}

impl Default for ForceLayoutConfig {
	fn default() -> Self {
		Self {
			pin_on_drag: false,
			pin_on_click_with_modifier: false,
			pin_modifier: ModifierKey::Alt,
			reheat_alpha: 0.1,
			forces: ForceSettings::default(),
			create_simulation: None,
		}
	}
}

impl ForceLayoutConfig {
	pub fn with_pin_on_drag(mut self, enabled: bool) -> Self {
		self.pin_on_drag = enabled;
		self
	}

	pub fn with_pin_on_click(mut self, enabled: bool, modifier: ModifierKey) -> Self {
		self.pin_on_click_with_modifier = enabled;
		self.pin_modifier = modifier;
		self
	}

	pub fn with_reheat_alpha(mut self, alpha: f64) -> Self {
		self.reheat_alpha = alpha;
		self
	}

	pub fn with_forces(mut self, forces: ForceSettings) -> Self {
		self.forces = forces;
		self
	}

	pub fn with_simulation(mut self, factory: SimulationFactory) -> Self {
		self.create_simulation = Some(factory);
		self
	}
}

impl fmt::Debug for ForceLayoutConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ForceLayoutConfig")
			.field("pin_on_drag", &self.pin_on_drag)
			.field("pin_on_click_with_modifier", &self.pin_on_click_with_modifier)
			.field("pin_modifier", &self.pin_modifier)
			.field("reheat_alpha", &self.reheat_alpha)
			.field("forces", &self.forces)
			.field("create_simulation", &self.create_simulation.is_some())
			.finish()
	}
}
