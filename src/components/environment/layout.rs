//! Circle-packing placement for services that have no saved coordinates.
//!
//! Every service is a leaf circle of radius `sqrt(units)`. Circles are packed
//! with a front-chain algorithm, re-packed once with padded radii, then scaled
//! to fit the layout extent around its center. Services that already have a
//! position keep it; the pack pass still counts them as circles, so a freshly
//! placed service can land near a manually dragged one.

use log::debug;

use super::config::ViewConfig;
use super::coords::CoordinateStore;
use super::types::Service;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Circle {
	pub x: f64,
	pub y: f64,
	pub r: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackLayout {
	pub width: f64,
	pub height: f64,
	pub padding: f64,
}

impl PackLayout {
	pub fn new(config: &ViewConfig) -> Self {
		Self {
			width: config.layout_width,
			height: config.layout_height,
			padding: config.layout_padding,
		}
	}

	/// Assigns coordinates to every service without one and returns how many were placed.
	pub fn place(&self, store: &mut CoordinateStore, services: &[Service]) -> usize {
		if services.iter().all(|s| store.has_position(&s.id)) {
			return 0;
		}
		let values: Vec<f64> = services.iter().map(|s| s.unit_count.max(1) as f64).collect();
		let circles = self.pack(&values);

		let mut placed = 0;
		for (service, circle) in services.iter().zip(&circles) {
			if store.has_position(&service.id) {
				continue;
			}
			store.set_position(&service.id, circle.x, circle.y);
			placed += 1;
		}
		debug!("pack layout placed {placed} of {} services", services.len());
		placed
	}

	/// Packs one circle per value; the result is index-aligned with `values`.
	pub fn pack(&self, values: &[f64]) -> Vec<Circle> {
		let n = values.len();
		if n == 0 {
			return Vec::new();
		}
		let mut order: Vec<usize> = (0..n).collect();
		order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

		let mut circles: Vec<Circle> = order
			.iter()
			.map(|&i| Circle {
				r: values[i].max(0.0).sqrt(),
				..Circle::default()
			})
			.collect();

		let (w, h) = (self.width, self.height);
		let mut root_r = pack_siblings(&mut circles);
		let mut k = (2.0 * root_r / w).max(2.0 * root_r / h);
		if self.padding > 0.0 && k > 0.0 {
			let dr = self.padding * k / 2.0;
			circles.iter_mut().for_each(|c| c.r += dr);
			root_r = pack_siblings(&mut circles) - dr;
			circles.iter_mut().for_each(|c| c.r -= dr);
			k = (2.0 * root_r / w).max(2.0 * root_r / h);
		}
		let scale = if k > 0.0 && k.is_finite() { 1.0 / k } else { 1.0 };

		let mut out = vec![Circle::default(); n];
		for (slot, c) in order.into_iter().zip(circles) {
			out[slot] = Circle {
				x: w / 2.0 + c.x * scale,
				y: h / 2.0 + c.y * scale,
				r: c.r * scale,
			};
		}
		out
	}
}

fn intersects(a: &Circle, b: &Circle) -> bool {
	let (dx, dy, dr) = (b.x - a.x, b.y - a.y, a.r + b.r);
	0.999 * dr * dr > dx * dx + dy * dy
}

/// Moves `c` so it is tangent to both `a` and `b`.
fn place_tangent(a: Circle, b: Circle, c: &mut Circle) {
	let mut db = a.r + c.r;
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	if db != 0.0 && (dx != 0.0 || dy != 0.0) {
		let mut da = b.r + c.r;
		let dc = dx * dx + dy * dy;
		da *= da;
		db *= db;
		let x = 0.5 + (db - da) / (2.0 * dc);
		let db_dc = db - dc;
		let y = (2.0 * da * (db + dc) - db_dc * db_dc - da * da).max(0.0).sqrt() / (2.0 * dc);
		c.x = a.x + x * dx + y * dy;
		c.y = a.y + x * dy - y * dx;
	} else {
		c.x = a.x + db;
		c.y = a.y;
	}
}

struct Bounds {
	x_min: f64,
	x_max: f64,
	y_min: f64,
	y_max: f64,
}

impl Bounds {
	fn empty() -> Self {
		Self {
			x_min: f64::INFINITY,
			x_max: f64::NEG_INFINITY,
			y_min: f64::INFINITY,
			y_max: f64::NEG_INFINITY,
		}
	}

	fn add(&mut self, c: &Circle) {
		self.x_min = self.x_min.min(c.x - c.r);
		self.x_max = self.x_max.max(c.x + c.r);
		self.y_min = self.y_min.min(c.y - c.r);
		self.y_max = self.y_max.max(c.y + c.r);
	}
}

/// Front chain as a circular doubly linked list over circle indices.
struct Chain {
	next: Vec<usize>,
	prev: Vec<usize>,
}

impl Chain {
	fn new(n: usize) -> Self {
		Self {
			next: (0..n).collect(),
			prev: (0..n).collect(),
		}
	}

	fn insert(&mut self, a: usize, b: usize) {
		let c = self.next[a];
		self.next[a] = b;
		self.prev[b] = a;
		self.next[b] = c;
		self.prev[c] = b;
	}

	fn splice(&mut self, a: usize, b: usize) {
		self.next[a] = b;
		self.prev[b] = a;
	}
}

/// Packs circles in order around the origin and returns the enclosing radius.
fn pack_siblings(circles: &mut [Circle]) -> f64 {
	let n = circles.len();
	if n == 0 {
		return 0.0;
	}
	let mut chain = Chain::new(n);
	let mut bounds = Bounds::empty();

	circles[0].x = -circles[0].r;
	circles[0].y = 0.0;
	bounds.add(&circles[0]);

	if n > 1 {
		circles[1].x = circles[1].r;
		circles[1].y = 0.0;
		bounds.add(&circles[1]);
	}

	if n > 2 {
		let (mut a, mut b) = (0, 1);
		let (ca, cb) = (circles[a], circles[b]);
		place_tangent(ca, cb, &mut circles[2]);
		bounds.add(&circles[2]);
		chain.insert(a, 2);
		chain.prev[a] = 2;
		chain.insert(2, b);
		b = chain.next[a];

		// Each retry shrinks the front chain; cap them so degenerate radii cannot spin.
		let mut retries = n * n + 16;
		let mut i = 3;
		while i < n {
			let (ca, cb) = (circles[a], circles[b]);
			place_tangent(ca, cb, &mut circles[i]);
			let c = circles[i];

			let (mut s1, mut s2) = (1, 1);
			let mut hit = None;
			let mut j = chain.next[b];
			while j != b {
				if intersects(&circles[j], &c) {
					hit = Some(j);
					break;
				}
				j = chain.next[j];
				s1 += 1;
			}

			match hit {
				Some(j) if retries > 0 => {
					retries -= 1;
					let mut k = chain.prev[a];
					while k != chain.prev[j] {
						if intersects(&circles[k], &c) {
							break;
						}
						k = chain.prev[k];
						s2 += 1;
					}
					if s1 < s2 || (s1 == s2 && circles[b].r < circles[a].r) {
						b = j;
					} else {
						a = k;
					}
					chain.splice(a, b);
				}
				_ => {
					chain.insert(a, i);
					b = i;
					bounds.add(&c);
					i += 1;
				}
			}
		}
	}

	let (cx, cy) = (
		(bounds.x_min + bounds.x_max) / 2.0,
		(bounds.y_min + bounds.y_max) / 2.0,
	);
	let mut radius: f64 = 0.0;
	for c in circles.iter_mut() {
		c.x -= cx;
		c.y -= cy;
		radius = radius.max(c.r + (c.x * c.x + c.y * c.y).sqrt());
	}
	radius
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn services(counts: &[u32]) -> Vec<Service> {
		counts
			.iter()
			.enumerate()
			.map(|(i, &unit_count)| Service {
				id: format!("svc-{i}"),
				unit_count,
				..Service::default()
			})
			.collect()
	}

	fn layout() -> PackLayout {
		PackLayout::new(&ViewConfig::default())
	}

	#[test]
	fn single_service_lands_in_the_middle() {
		let circles = layout().pack(&[1.0]);
		assert_eq!(circles.len(), 1);
		assert!((circles[0].x - 320.0).abs() < 1e-9);
		assert!((circles[0].y - 300.0).abs() < 1e-9);
	}

	#[rstest]
	#[case(&[1, 1])]
	#[case(&[1, 2, 3])]
	#[case(&[0, 0, 0, 0])]
	#[case(&[5, 1, 8, 2, 1, 3, 1, 13, 2, 1, 4, 6])]
	fn every_service_gets_a_distinct_finite_spot(#[case] counts: &[u32]) {
		let svcs = services(counts);
		let mut store = CoordinateStore::new(&ViewConfig::default());
		assert_eq!(layout().place(&mut store, &svcs), svcs.len());

		let spots: Vec<(f64, f64)> = svcs
			.iter()
			.map(|s| store.position(&s.id).unwrap())
			.collect();
		for (i, a) in spots.iter().enumerate() {
			assert!(a.0.is_finite() && a.1.is_finite());
			for b in &spots[i + 1..] {
				assert!((a.0 - b.0).abs() > 1e-6 || (a.1 - b.1).abs() > 1e-6);
			}
		}
	}

	#[test]
	fn packed_circles_do_not_overlap() {
		let circles = layout().pack(&[1.0, 4.0, 9.0, 2.0, 2.0, 7.0]);
		for (i, a) in circles.iter().enumerate() {
			for b in &circles[i + 1..] {
				assert!(!intersects(a, b), "{a:?} overlaps {b:?}");
			}
		}
	}

	#[test]
	fn positioned_services_are_left_alone() {
		let svcs = services(&[1, 3, 2]);
		let mut store = CoordinateStore::new(&ViewConfig::default());
		store.set_position("svc-1", 77.0, 88.0);

		assert_eq!(layout().place(&mut store, &svcs), 2);
		assert_eq!(store.position("svc-1"), Some((77.0, 88.0)));

		let before: Vec<_> = svcs.iter().map(|s| store.position(&s.id)).collect();
		assert_eq!(layout().place(&mut store, &svcs), 0);
		let after: Vec<_> = svcs.iter().map(|s| store.position(&s.id)).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn empty_topology_is_a_no_op() {
		let mut store = CoordinateStore::new(&ViewConfig::default());
		assert_eq!(layout().place(&mut store, &[]), 0);
		assert!(layout().pack(&[]).is_empty());
	}
}
