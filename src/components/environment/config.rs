/// Tunables for the environment view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
	/// Extent the pack layout fills with unplaced services.
	pub layout_width: f64,
	pub layout_height: f64,
	pub layout_padding: f64,
	pub min_scale: f64,
	pub max_scale: f64,
	pub zoom_step: f64,
	/// Smallest canvas ever produced by `fit_viewport`.
	pub min_width: f64,
	pub min_height: f64,
	/// Chrome heights used when the page elements cannot be measured.
	pub tasks_bar_height: f64,
	pub navbar_height: f64,
	pub navbar_margin: f64,
	pub node_width_range: (f64, f64),
	pub node_height_range: (f64, f64),
	pub button_size: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			layout_width: 640.0,
			layout_height: 600.0,
			layout_padding: 200.0,
			min_scale: 0.25,
			max_scale: 1.75,
			zoom_step: 0.2,
			min_width: 800.0,
			min_height: 600.0,
			tasks_bar_height: 22.0,
			navbar_height: 70.0,
			navbar_margin: 18.0,
			node_width_range: (164.0, 200.0),
			node_height_range: (64.0, 100.0),
			button_size: 32.0,
		}
	}
}
