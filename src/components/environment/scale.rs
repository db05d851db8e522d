//! Continuous scales mapping a numeric domain onto a pixel range.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
	domain: (f64, f64),
	range: (f64, f64),
}

impl LinearScale {
	pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
		Self { domain, range }
	}

	pub fn set_domain(&mut self, d0: f64, d1: f64) -> &mut Self {
		self.domain = (d0, d1);
		self
	}

	pub fn set_range(&mut self, r0: f64, r1: f64) -> &mut Self {
		self.range = (r0, r1);
		self
	}

	pub fn apply(&self, v: f64) -> f64 {
		let (d0, d1) = self.domain;
		let (r0, r1) = self.range;
		if d1 == d0 {
			return r0;
		}
		r0 + (v - d0) / (d1 - d0) * (r1 - r0)
	}

	pub fn invert(&self, v: f64) -> f64 {
		let (d0, d1) = self.domain;
		let (r0, r1) = self.range;
		if r1 == r0 {
			return d0;
		}
		d0 + (v - r0) / (r1 - r0) * (d1 - d0)
	}
}

/// Base-10 logarithmic scale. The domain defaults to `[1, 10]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogScale {
	domain: (f64, f64),
	range: (f64, f64),
	clamp: bool,
}

impl LogScale {
	pub fn new(range: (f64, f64)) -> Self {
		Self {
			domain: (1.0, 10.0),
			range,
			clamp: false,
		}
	}

	pub fn clamped(mut self, clamp: bool) -> Self {
		self.clamp = clamp;
		self
	}

	/// Non-positive inputs have no logarithm; they map to the lower domain bound.
	pub fn apply(&self, v: f64) -> f64 {
		let (d0, d1) = (self.domain.0.log10(), self.domain.1.log10());
		let (r0, r1) = self.range;
		let v = if v > 0.0 { v.log10() } else { d0 };
		let mut t = if d1 == d0 { 0.0 } else { (v - d0) / (d1 - d0) };
		if self.clamp {
			t = t.clamp(0.0, 1.0);
		}
		r0 + t * (r1 - r0)
	}
}
