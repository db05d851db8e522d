use std::collections::HashSet;

use log::{debug, info};

use super::config::ViewConfig;
use super::coords::CoordinateStore;
use super::geometry::{NodeBox, ResolvedRelation, draw_relation, resolve_relations};
use super::interaction::{Effect, HitTarget, InteractionSession, NodeFlags, PanelButton};
use super::layout::PackLayout;
use super::types::{Service, Topology};
use super::viewport::{Viewport, ViewportMetrics};

/// Screen pixels the pointer may travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;
pub const STATUS_CHART_CENTER: (f64, f64) = (30.0, 32.0);
pub const STATUS_CHART_OUTER: f64 = 25.0;
pub const STATUS_CHART_INNER: f64 = 10.0;

/// One relation line in its polyline point-list form.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub points: String,
	pub pending: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
	pub entered: usize,
	pub updated: usize,
	pub exited: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
	}

	pub fn center(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}
}

/// Everything the renderer needs for one service.
pub struct NodeView<'a> {
	pub service: &'a Service,
	pub rect: Rect,
	pub flags: NodeFlags,
	pub chart_hovered: bool,
}

/// In-flight pointer gesture. Each variant keeps its own bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Pan {
		origin: (f64, f64),
		translate_start: (f64, f64),
		moved: bool,
	},
	NodeDrag {
		id: String,
		origin: (f64, f64),
		last: (f64, f64),
		moved: bool,
	},
	RelateDrag {
		id: String,
		origin: (f64, f64),
		started: bool,
	},
	Press {
		hit: HitTarget,
	},
}

pub struct EnvironmentState {
	pub config: ViewConfig,
	pub services: Vec<Service>,
	pub relations: Vec<ResolvedRelation>,
	pub links: Vec<Link>,
	pub coords: CoordinateStore,
	pub layout: PackLayout,
	pub viewport: Viewport,
	pub session: InteractionSession,
	pub gesture: Gesture,
	pointer: Option<HitTarget>,
	chart_hover: Option<String>,
}

fn moved_past(origin: (f64, f64), x: f64, y: f64) -> bool {
	let (dx, dy) = (x - origin.0, y - origin.1);
	(dx * dx + dy * dy).sqrt() > DRAG_THRESHOLD
}

impl EnvironmentState {
	pub fn new(config: ViewConfig) -> Self {
		info!("View: Initialized: Env");
		Self {
			coords: CoordinateStore::new(&config),
			layout: PackLayout::new(&config),
			viewport: Viewport::new(&config),
			config,
			services: Vec::new(),
			relations: Vec::new(),
			links: Vec::new(),
			session: InteractionSession::new(),
			gesture: Gesture::Idle,
			pointer: None,
			chart_hover: None,
		}
	}

	pub fn service(&self, id: &str) -> Option<&Service> {
		self.services.iter().find(|s| s.id == id)
	}

	/// Enter/update/exit against a fresh topology, then place, resize and relink.
	pub fn reconcile(&mut self, topology: &Topology) -> ReconcileStats {
		let incoming: HashSet<&str> = topology.services.iter().map(|s| s.id.as_str()).collect();
		let current: HashSet<&str> = self.services.iter().map(|s| s.id.as_str()).collect();
		let mut stats = ReconcileStats::default();

		for gone in current.difference(&incoming) {
			self.coords.remove(gone);
			stats.exited += 1;
		}
		for service in &topology.services {
			if current.contains(service.id.as_str()) {
				stats.updated += 1;
			} else {
				stats.entered += 1;
				if let (Some(x), Some(y)) = (service.x, service.y) {
					self.coords.set_position(&service.id, x, y);
				}
			}
			self.coords.size(&service.id, service.unit_count);
		}
		self.services = topology.services.clone();
		self.layout.place(&mut self.coords, &self.services);

		self.relations = resolve_relations(&self.services, &topology.relations);
		self.session.sync_nodes(self.services.iter().map(|s| &s.id));
		self.session.reconcile_pending(&self.relations);
		if self
			.chart_hover
			.as_deref()
			.is_some_and(|id| !incoming.contains(id))
		{
			self.chart_hover = None;
		}
		self.rebuild_links();

		info!(
			"View: Render: Env ({} entered, {} updated, {} exited, {} relations)",
			stats.entered,
			stats.updated,
			stats.exited,
			self.relations.len()
		);
		stats
	}

	/// Links carry no identity; every call redraws them from current positions.
	pub fn rebuild_links(&mut self) {
		let coords = &self.coords;
		let line = |rel: &ResolvedRelation| {
			Some(draw_relation(
				NodeBox::from_store(coords, &rel.source)?,
				NodeBox::from_store(coords, &rel.target)?,
			))
		};
		let drawn = self.relations.iter().filter_map(|r| {
			line(r).map(|points| Link {
				points,
				pending: false,
			})
		});
		let pending = self.session.pending_relations().iter().filter_map(|r| {
			line(r).map(|points| Link {
				points,
				pending: true,
			})
		});
		self.links = drawn.chain(pending).collect();
	}

	pub fn node_rect(&self, id: &str) -> Option<Rect> {
		let (x, y) = self.coords.position(id)?;
		let size = self.coords.cached_size(id);
		Some(Rect {
			x,
			y,
			width: size.width,
			height: size.height,
		})
	}

	/// Control panel button placement around a node.
	pub fn button_rect(&self, node: Rect, button: PanelButton) -> Rect {
		let s = self.config.button_size;
		let (x, y) = match button {
			PanelButton::AddRelation => (node.width + 8.0, node.height / 2.0 - s / 2.0),
			PanelButton::View => (-40.0, node.height / 2.0 - s / 2.0),
			PanelButton::Destroy => (node.width / 2.0 - s / 2.0, -40.0),
		};
		Rect {
			x: node.x + x,
			y: node.y + y,
			width: s,
			height: s,
		}
	}

	pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> {
		self.services.iter().filter_map(|service| {
			Some(NodeView {
				service,
				rect: self.node_rect(&service.id)?,
				flags: self.session.flags(&service.id),
				chart_hovered: self.chart_hover.as_deref() == Some(service.id.as_str()),
			})
		})
	}

	/// Topmost thing under a screen point; open panel buttons win over node bodies.
	pub fn hit_test(&self, sx: f64, sy: f64) -> HitTarget {
		let (x, y) = self.viewport.screen_to_scene(sx, sy);
		for node in self.nodes().filter(|n| n.flags.panel_open) {
			for button in [PanelButton::AddRelation, PanelButton::View, PanelButton::Destroy] {
				if self.button_rect(node.rect, button).contains(x, y) {
					return HitTarget::Button(node.service.id.clone(), button);
				}
			}
		}
		let nodes: Vec<NodeView<'_>> = self.nodes().collect();
		nodes
			.iter()
			.rev()
			.find(|n| n.rect.contains(x, y))
			.map(|n| HitTarget::Node(n.service.id.clone()))
			.unwrap_or(HitTarget::Background)
	}

	fn chart_hit(&self, sx: f64, sy: f64) -> Option<String> {
		let (x, y) = self.viewport.screen_to_scene(sx, sy);
		self.nodes()
			.find(|n| {
				let (cx, cy) = (
					n.rect.x + STATUS_CHART_CENTER.0,
					n.rect.y + STATUS_CHART_CENTER.1,
				);
				(x - cx).hypot(y - cy) <= STATUS_CHART_OUTER
			})
			.map(|n| n.service.id.clone())
	}

	/// Emits over/out transitions between node borders. Only a move from the
	/// background or another border counts as a genuine arrival.
	fn track_hover(&mut self, hit: HitTarget) {
		let prev = self.pointer.take();
		let prev_node = match &prev {
			Some(HitTarget::Node(id)) => Some(id.clone()),
			_ => None,
		};
		let next_node = match &hit {
			HitTarget::Node(id) => Some(id.clone()),
			_ => None,
		};
		if prev_node != next_node {
			if let Some(id) = &prev_node {
				self.session.pointer_out(id);
			}
			if let Some(id) = &next_node {
				let genuine = matches!(prev, Some(HitTarget::Background | HitTarget::Node(_)));
				self.session.pointer_over(id, genuine);
			}
		}
		self.pointer = Some(hit);
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.gesture = match self.hit_test(sx, sy) {
			HitTarget::Button(id, PanelButton::AddRelation) => Gesture::RelateDrag {
				id,
				origin: (sx, sy),
				started: false,
			},
			HitTarget::Node(id) => Gesture::NodeDrag {
				id,
				origin: (sx, sy),
				last: (sx, sy),
				moved: false,
			},
			hit @ HitTarget::Button(..) => Gesture::Press { hit },
			HitTarget::Background => Gesture::Pan {
				origin: (sx, sy),
				translate_start: self.viewport.translate(),
				moved: false,
			},
		};
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		let hit = self.hit_test(sx, sy);
		self.track_hover(hit);
		self.chart_hover = self.chart_hit(sx, sy);

		let scale = self.viewport.scale();
		let mut gesture = std::mem::take(&mut self.gesture);
		let mut relink = false;
		match &mut gesture {
			Gesture::Idle | Gesture::Press { .. } => {}
			Gesture::Pan {
				origin,
				translate_start,
				moved,
			} => {
				*moved |= moved_past(*origin, sx, sy);
				let event = self
					.viewport
					.pan_from(*translate_start, sx - origin.0, sy - origin.1);
				self.viewport.apply_zoom_event(event);
			}
			Gesture::NodeDrag {
				id,
				origin,
				last,
				moved,
			} => {
				*moved |= moved_past(*origin, sx, sy);
				if *moved {
					let (dx, dy) = ((sx - last.0) / scale, (sy - last.1) / scale);
					self.coords.translate(id, dx, dy);
					*last = (sx, sy);
					relink = true;
				}
			}
			Gesture::RelateDrag {
				id,
				origin,
				started,
			} => {
				if !*started && moved_past(*origin, sx, sy) {
					*started = true;
					let anchor = self.relation_anchor(id);
					self.session.relation_drag_start(id, anchor);
				}
				if *started {
					let pointer = self.viewport.screen_to_scene(sx, sy);
					self.session.relation_drag(pointer);
				}
			}
		}
		self.gesture = gesture;
		if relink {
			self.rebuild_links();
		}
	}

	fn relation_anchor(&self, id: &str) -> (f64, f64) {
		self.node_rect(id)
			.map(|r| self.button_rect(r, PanelButton::AddRelation).center())
			.unwrap_or_default()
	}

	/// Ends the current gesture; a press that never moved counts as a click.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Vec<Effect> {
		let effects = match std::mem::take(&mut self.gesture) {
			Gesture::Idle => Vec::new(),
			Gesture::Pan { moved: false, .. } => self.session.click(&HitTarget::Background),
			Gesture::Pan { .. } => Vec::new(),
			Gesture::NodeDrag {
				id, moved: false, ..
			} => self.session.click(&HitTarget::Node(id)),
			Gesture::NodeDrag { id, .. } => {
				debug!("service {id} dragged to {:?}", self.coords.position(&id));
				Vec::new()
			}
			Gesture::RelateDrag { started: true, .. } => self.session.relation_drag_end(),
			Gesture::RelateDrag { id, .. } => self
				.session
				.click(&HitTarget::Button(id, PanelButton::AddRelation)),
			Gesture::Press { hit } => {
				if self.hit_test(sx, sy) == hit {
					self.session.click(&hit)
				} else {
					Vec::new()
				}
			}
		};
		self.rebuild_links();
		effects
	}

	pub fn pointer_leave(&mut self) -> Vec<Effect> {
		if let Some(HitTarget::Node(id)) = self.pointer.take() {
			self.session.pointer_out(&id);
		}
		self.chart_hover = None;
		let effects = match std::mem::take(&mut self.gesture) {
			Gesture::RelateDrag { started: true, .. } => self.session.relation_drag_end(),
			_ => Vec::new(),
		};
		self.rebuild_links();
		effects
	}

	pub fn double_click(&mut self, sx: f64, sy: f64) -> Vec<Effect> {
		match self.hit_test(sx, sy).service() {
			Some(id) => {
				let id = id.clone();
				self.session.double_click(&id)
			}
			None => Vec::new(),
		}
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let event = self.viewport.zoom_about(sx, sy, factor);
		self.viewport.apply_zoom_event(event);
	}

	pub fn zoom_in(&mut self) {
		self.viewport.step_zoom(self.config.zoom_step);
	}

	pub fn zoom_out(&mut self) {
		self.viewport.step_zoom(-self.config.zoom_step);
	}

	pub fn toggle_add_relation(&mut self) {
		self.session.toggle_add_relation();
	}

	pub fn fit_viewport(&mut self, metrics: &ViewportMetrics) -> (f64, f64) {
		self.viewport.fit_viewport(metrics)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::environment::interaction::Mode;
	use crate::components::environment::types::{Endpoint, Relation};

	fn topology(ids: &[(&str, f64, f64)], rels: &[&[&str]]) -> Topology {
		Topology {
			services: ids
				.iter()
				.map(|&(id, x, y)| Service {
					id: id.into(),
					unit_count: 1,
					x: (x != 0.0).then_some(x),
					y: (y != 0.0).then_some(y),
					..Service::default()
				})
				.collect(),
			relations: rels
				.iter()
				.map(|eps| Relation {
					endpoints: eps.iter().map(|id| Endpoint((*id).into(), "r".into())).collect(),
				})
				.collect(),
		}
	}

	/// Three nodes in a row, far enough apart for clean hit tests at scale 1.
	fn laid_out() -> EnvironmentState {
		let mut state = EnvironmentState::new(ViewConfig::default());
		state.reconcile(&topology(
			&[("a", 100.0, 100.0), ("b", 500.0, 100.0), ("c", 900.0, 100.0)],
			&[&["a", "b"], &["c"]],
		));
		state
	}

	fn center(state: &EnvironmentState, id: &str) -> (f64, f64) {
		state.node_rect(id).unwrap().center()
	}

	#[test]
	fn reconcile_reports_enter_update_exit() {
		let mut state = laid_out();
		let stats = state.reconcile(&topology(&[("a", 0.0, 0.0), ("d", 0.0, 0.0)], &[]));
		assert_eq!(stats, ReconcileStats { entered: 1, updated: 1, exited: 2 });
		assert_eq!(state.coords.position("a"), Some((100.0, 100.0)));
		assert!(state.coords.has_position("d"));
		assert!(state.node_rect("b").is_none());
	}

	#[test]
	fn peer_relation_is_not_drawn() {
		let state = laid_out();
		assert_eq!(state.links.len(), 1);
		assert_eq!(state.links[0].points, "182 100, 582 100");
	}

	#[test]
	fn dragging_a_node_moves_it_and_its_links() {
		let mut state = laid_out();
		let (cx, cy) = center(&state, "a");
		state.pointer_down(cx, cy);
		state.pointer_move(cx + 20.0, cy + 10.0);
		state.pointer_move(cx + 40.0, cy + 30.0);
		assert!(state.pointer_up(cx + 40.0, cy + 30.0).is_empty());
		assert_eq!(state.coords.position("a"), Some((140.0, 130.0)));
		assert_eq!(state.links[0].points, "222 130, 582 100");

		state.reconcile(&topology(&[("a", 0.0, 0.0), ("b", 0.0, 0.0)], &[]));
		assert_eq!(state.coords.position("a"), Some((140.0, 130.0)));
	}

	#[test]
	fn press_without_motion_is_a_click() {
		let mut state = laid_out();
		let (cx, cy) = center(&state, "b");
		state.pointer_down(cx, cy);
		state.pointer_move(cx + 1.0, cy);
		assert!(state.pointer_up(cx + 1.0, cy).is_empty());
		assert!(state.session.flags("b").panel_open);
		assert_eq!(state.coords.position("b"), Some((500.0, 100.0)));
	}

	#[test]
	fn fresh_view_reaches_panel_buttons_with_one_click() {
		let mut state = laid_out();
		assert_eq!(state.session.mode(), Mode::Showing);
		let (cx, cy) = center(&state, "a");
		state.pointer_down(cx, cy);
		assert!(state.pointer_up(cx, cy).is_empty());
		assert!(state.session.flags("a").panel_open);

		let rect = state.node_rect("a").unwrap();
		let (bx, by) = state.button_rect(rect, PanelButton::Destroy).center();
		assert_eq!(state.hit_test(bx, by), HitTarget::Button("a".into(), PanelButton::Destroy));
	}

	#[test]
	fn double_click_gesture_shows_once() {
		let mut state = laid_out();
		let (cx, cy) = center(&state, "b");
		let mut effects = Vec::new();
		for _ in 0..2 {
			state.pointer_down(cx, cy);
			effects.extend(state.pointer_up(cx, cy));
		}
		effects.extend(state.double_click(cx, cy));
		assert_eq!(effects, vec![Effect::ShowService("b".into())]);
	}

	#[test]
	fn background_drag_pans() {
		let mut state = laid_out();
		state.pointer_down(50.0, 400.0);
		state.pointer_move(80.0, 420.0);
		state.pointer_up(80.0, 420.0);
		assert_eq!(state.viewport.translate(), (30.0, 20.0));
		assert_eq!(state.hit_test(center(&state, "a").0, center(&state, "a").1), HitTarget::Node("a".into()));
	}

	#[test]
	fn control_mode_round_trip() {
		let mut state = laid_out();
		assert_eq!(state.session.mode(), Mode::Showing);
		state.toggle_add_relation();
		assert_eq!(state.session.mode(), Mode::RelatingPickStart);
		assert!(state.nodes().all(|n| n.flags.selectable));
		state.toggle_add_relation();
		assert_eq!(state.session.mode(), Mode::PanelToggling);
		assert!(state.nodes().all(|n| !n.flags.selectable));
	}

	#[test]
	fn open_panel_buttons_are_hit_before_nodes() {
		let mut state = laid_out();
		state.toggle_add_relation();
		state.toggle_add_relation();
		let (cx, cy) = center(&state, "a");
		state.pointer_down(cx, cy);
		state.pointer_up(cx, cy);
		assert!(state.session.flags("a").panel_open);

		let rect = state.node_rect("a").unwrap();
		let (bx, by) = state.button_rect(rect, PanelButton::Destroy).center();
		assert_eq!(state.hit_test(bx, by), HitTarget::Button("a".into(), PanelButton::Destroy));
		state.pointer_down(bx, by);
		assert_eq!(state.pointer_up(bx, by), vec![Effect::ConfirmDestroy("a".into())]);
		assert!(!state.session.flags("a").panel_open);
	}

	#[test]
	fn drag_to_relate_end_to_end() {
		let mut state = laid_out();
		state.toggle_add_relation();
		state.toggle_add_relation();
		let (ax, ay) = center(&state, "a");
		state.pointer_down(ax, ay);
		state.pointer_up(ax, ay);

		let rect = state.node_rect("a").unwrap();
		let (hx, hy) = state.button_rect(rect, PanelButton::AddRelation).center();
		state.pointer_move(hx, hy);
		state.pointer_down(hx, hy);
		state.pointer_move(hx + 40.0, hy);
		assert_eq!(state.session.mode(), Mode::RelatingPickEnd);
		assert_eq!(state.session.start().map(String::as_str), Some("a"));
		assert!(state.session.rubber_band().visible);

		let (bx, by) = center(&state, "b");
		state.pointer_move(bx - 150.0, by);
		state.pointer_move(bx, by);
		assert_eq!(state.session.drop_target().map(String::as_str), Some("b"));

		let effects = state.pointer_up(bx, by);
		assert_eq!(
			effects,
			vec![Effect::CreateRelation { source: "a".into(), target: "b".into() }]
		);
		assert!(!state.session.rubber_band().visible);
		assert_eq!(state.links.iter().filter(|l| l.pending).count(), 1);
	}

	#[test]
	fn relate_drag_released_on_background_cancels() {
		let mut state = laid_out();
		state.toggle_add_relation();
		state.toggle_add_relation();
		let (ax, ay) = center(&state, "a");
		state.pointer_down(ax, ay);
		state.pointer_up(ax, ay);

		let rect = state.node_rect("a").unwrap();
		let (hx, hy) = state.button_rect(rect, PanelButton::AddRelation).center();
		state.pointer_down(hx, hy);
		state.pointer_move(hx + 10.0, hy + 300.0);
		assert!(state.pointer_up(hx + 10.0, hy + 300.0).is_empty());
		assert_eq!(state.session.mode(), Mode::PanelToggling);
		assert!(state.session.start().is_none());
	}

	#[test]
	fn double_click_shows_in_any_mode() {
		let mut state = laid_out();
		state.toggle_add_relation();
		let (cx, cy) = center(&state, "c");
		assert_eq!(state.double_click(cx, cy), vec![Effect::ShowService("c".into())]);
		assert!(state.double_click(5.0, 580.0).is_empty());
	}

	#[test]
	fn zoom_buttons_clamp() {
		let mut state = laid_out();
		(0..10).for_each(|_| state.zoom_in());
		assert_eq!(state.viewport.scale(), 1.75);
		(0..10).for_each(|_| state.zoom_out());
		assert_eq!(state.viewport.scale(), 0.25);
	}
}
