use super::config::ViewConfig;
use super::scale::LinearScale;

/// A pan/zoom update, either from a gesture or synthesized by the zoom buttons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomEvent {
	pub translate: (f64, f64),
	pub scale: f64,
}

/// Browser measurements feeding [`Viewport::fit_viewport`]. `None` means the
/// element was not attached or could not be measured.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportMetrics {
	pub container_width: Option<f64>,
	pub window_width: Option<f64>,
	pub window_height: Option<f64>,
	pub tasks_bar_height: Option<f64>,
	pub navbar_height: Option<f64>,
	pub navbar_margin: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Viewport {
	translate: (f64, f64),
	scale: f64,
	scale_extent: (f64, f64),
	min_size: (f64, f64),
	chrome: (f64, f64, f64),
	width: f64,
	height: f64,
	x_scale: LinearScale,
	y_scale: LinearScale,
}

impl Viewport {
	pub fn new(config: &ViewConfig) -> Self {
		let (w, h) = (config.layout_width, config.layout_height);
		Self {
			translate: (0.0, 0.0),
			scale: 1.0,
			scale_extent: (config.min_scale, config.max_scale),
			min_size: (config.min_width, config.min_height),
			chrome: (
				config.tasks_bar_height,
				config.navbar_height,
				config.navbar_margin,
			),
			width: config.min_width,
			height: config.min_height,
			x_scale: LinearScale::new((-w / 2.0, w / 2.0), (0.0, w)),
			y_scale: LinearScale::new((-h / 2.0, h / 2.0), (h, 0.0)),
		}
	}

	pub fn translate(&self) -> (f64, f64) {
		self.translate
	}

	pub fn scale(&self) -> f64 {
		self.scale
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn x_scale(&self) -> &LinearScale {
		&self.x_scale
	}

	pub fn y_scale(&self) -> &LinearScale {
		&self.y_scale
	}

	fn clamp_scale(&self, scale: f64) -> f64 {
		let (lo, hi) = self.scale_extent;
		if scale.is_finite() { scale.clamp(lo, hi) } else { self.scale }
	}

	/// Adopts the event's translate and scale, returning the scene transform.
	pub fn apply_zoom_event(&mut self, event: ZoomEvent) -> String {
		let (tx, ty) = event.translate;
		if tx.is_finite() && ty.is_finite() {
			self.translate = event.translate;
		}
		self.scale = self.clamp_scale(event.scale);
		self.transform()
	}

	/// Discrete zoom used by the +/- controls; keeps the current translate.
	pub fn step_zoom(&mut self, delta: f64) -> String {
		let event = ZoomEvent {
			translate: self.translate,
			scale: self.scale + delta,
		};
		self.apply_zoom_event(event)
	}

	pub fn transform(&self) -> String {
		let (tx, ty) = self.translate;
		format!("translate({tx},{ty}) scale({})", self.scale)
	}

	/// Zoom by `factor` keeping the scene point under `(sx, sy)` fixed.
	pub fn zoom_about(&self, sx: f64, sy: f64, factor: f64) -> ZoomEvent {
		let scale = self.clamp_scale(self.scale * factor);
		let ratio = scale / self.scale;
		let (tx, ty) = self.translate;
		ZoomEvent {
			translate: (sx - (sx - tx) * ratio, sy - (sy - ty) * ratio),
			scale,
		}
	}

	pub fn pan_from(&self, origin: (f64, f64), dx: f64, dy: f64) -> ZoomEvent {
		ZoomEvent {
			translate: (origin.0 + dx, origin.1 + dy),
			scale: self.scale,
		}
	}

	pub fn screen_to_scene(&self, sx: f64, sy: f64) -> (f64, f64) {
		let (tx, ty) = self.translate;
		((sx - tx) / self.scale, (sy - ty) / self.scale)
	}

	/// Resizes the canvas to the space left by the page chrome, never below
	/// the configured minimum, and rebuilds the axis scales to match.
	pub fn fit_viewport(&mut self, metrics: &ViewportMetrics) -> (f64, f64) {
		let (min_w, min_h) = self.min_size;
		let mut width = metrics
			.container_width
			.filter(|w| w.is_finite() && *w > 0.0)
			.unwrap_or(min_w);
		if metrics.window_width.is_some_and(|w| w < min_w) {
			width = min_w;
		}
		let height = match metrics.window_height {
			Some(win_h) if win_h.is_finite() => {
				let (tasks, navbar, margin) = self.chrome;
				win_h
					- metrics.tasks_bar_height.unwrap_or(tasks)
					- metrics.navbar_height.unwrap_or(navbar)
					- metrics.navbar_margin.unwrap_or(margin)
			}
			_ => min_h,
		};
		let (width, height) = (width.max(min_w), height.max(min_h));

		self.width = width;
		self.height = height;
		self.x_scale
			.set_domain(-width / 2.0, width / 2.0)
			.set_range(0.0, width);
		self.y_scale
			.set_domain(-height / 2.0, height / 2.0)
			.set_range(height, 0.0);
		(width, height)
	}
}
