use std::collections::HashMap;

use super::config::ViewConfig;
use super::scale::LogScale;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

#[derive(Clone, Debug, Default)]
struct Placement {
	x: Option<f64>,
	y: Option<f64>,
	size: Option<(u32, Size)>,
}

/// Layout-derived fields (x, y, width, height) for every service in the view.
#[derive(Clone, Debug)]
pub struct CoordinateStore {
	entries: HashMap<String, Placement>,
	width_scale: LogScale,
	height_scale: LogScale,
}

impl CoordinateStore {
	pub fn new(config: &ViewConfig) -> Self {
		Self {
			entries: HashMap::new(),
			width_scale: LogScale::new(config.node_width_range).clamped(true),
			height_scale: LogScale::new(config.node_height_range).clamped(true),
		}
	}

	/// Zero counts as unset, matching how positions arrive from the data source.
	pub fn has_position(&self, id: &str) -> bool {
		self.entries
			.get(id)
			.is_some_and(|p| matches!((p.x, p.y), (Some(x), Some(y)) if x != 0.0 && y != 0.0))
	}

	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		let p = self.entries.get(id)?;
		Some((p.x?, p.y?))
	}

	pub fn set_position(&mut self, id: &str, x: f64, y: f64) {
		let entry = self.entries.entry(id.to_string()).or_default();
		entry.x = Some(x);
		entry.y = Some(y);
	}

	pub fn translate(&mut self, id: &str, dx: f64, dy: f64) {
		if let Some((x, y)) = self.position(id) {
			self.set_position(id, x + dx, y + dy);
		}
	}

	/// Size for `unit_count`, recomputed only when the count changed since the last call.
	pub fn size(&mut self, id: &str, unit_count: u32) -> Size {
		let entry = self.entries.entry(id.to_string()).or_default();
		if let Some((count, size)) = entry.size {
			if count == unit_count {
				return size;
			}
		}
		let size = Size {
			width: self.width_scale.apply(unit_count as f64),
			height: self.height_scale.apply(unit_count as f64),
		};
		entry.size = Some((unit_count, size));
		size
	}

	pub fn cached_size(&self, id: &str) -> Size {
		self.entries
			.get(id)
			.and_then(|p| p.size.map(|(_, s)| s))
			.unwrap_or_default()
	}

	pub fn remove(&mut self, id: &str) {
		self.entries.remove(id);
	}
}
