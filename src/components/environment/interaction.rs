//! Click/drag semantics for service nodes.
//!
//! [`InteractionSession`] owns the current [`Mode`], the relation being built,
//! the hovered drop target and the per-node flags the renderer reads. Handlers
//! update the session and hand back [`Effect`]s for the caller to run against
//! the collaborators, so nothing here touches the browser.

use std::collections::BTreeMap;

use log::{debug, error};

use super::collaborators::EnvError;
use super::geometry::ResolvedRelation;
use super::types::ServiceId;

/// What a plain single click on a service node does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
	#[default]
	Showing,
	RelatingPickStart,
	RelatingPickEnd,
	PanelToggling,
}

impl Mode {
	/// Showing only differs from panel toggling in being the entry mode; both
	/// open the control panel, and showing a service takes a double-click or
	/// the panel's view button.
	pub fn click_action(self, service: ServiceId) -> ClickAction {
		match self {
			Mode::Showing | Mode::PanelToggling => ClickAction::ToggleControlPanel { service },
			Mode::RelatingPickStart => ClickAction::AddRelationStart { service },
			Mode::RelatingPickEnd => ClickAction::AddRelationEnd { target: service },
		}
	}

	fn is_relating(self) -> bool {
		matches!(self, Mode::RelatingPickStart | Mode::RelatingPickEnd)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
	Show { service: ServiceId },
	ToggleControlPanel { service: ServiceId },
	AddRelationStart { service: ServiceId },
	AddRelationEnd { target: ServiceId },
	DestroyConfirm { service: ServiceId },
	Destroy { service: ServiceId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelButton {
	View,
	Destroy,
	AddRelation,
}

/// What the pointer is over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitTarget {
	Background,
	Node(ServiceId),
	Button(ServiceId, PanelButton),
}

impl HitTarget {
	pub fn service(&self) -> Option<&ServiceId> {
		match self {
			HitTarget::Background => None,
			HitTarget::Node(id) | HitTarget::Button(id, _) => Some(id),
		}
	}
}

/// Work for the collaborators, produced by session handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
	ShowService(ServiceId),
	CreateRelation { source: ServiceId, target: ServiceId },
	ConfirmDestroy(ServiceId),
	DestroyService(ServiceId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
	pub selectable: bool,
	pub hover: bool,
	pub panel_open: bool,
}

/// Line tracking the pointer during drag-to-relate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RubberBand {
	pub from: (f64, f64),
	pub to: (f64, f64),
	pub visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionSession {
	mode: Mode,
	start: Option<ServiceId>,
	drop_target: Option<ServiceId>,
	rubber_band: RubberBand,
	control_active: bool,
	nodes: BTreeMap<ServiceId, NodeFlags>,
	pending: Vec<ResolvedRelation>,
}

impl InteractionSession {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn start(&self) -> Option<&ServiceId> {
		self.start.as_ref()
	}

	pub fn drop_target(&self) -> Option<&ServiceId> {
		self.drop_target.as_ref()
	}

	pub fn rubber_band(&self) -> RubberBand {
		self.rubber_band
	}

	/// Whether the add-relation control is shown as active.
	pub fn control_active(&self) -> bool {
		self.control_active
	}

	pub fn flags(&self, id: &str) -> NodeFlags {
		self.nodes.get(id).copied().unwrap_or_default()
	}

	pub fn pending_relations(&self) -> &[ResolvedRelation] {
		&self.pending
	}

	fn set_mode(&mut self, mode: Mode) {
		if self.mode != mode {
			debug!("interaction mode {:?} -> {:?}", self.mode, mode);
		}
		self.mode = mode;
		if !mode.is_relating() {
			self.start = None;
			self.drop_target = None;
			self.nodes.values_mut().for_each(|f| f.hover = false);
		}
	}

	fn set_all_selectable(&mut self, selectable: bool) {
		self.nodes.values_mut().for_each(|f| f.selectable = selectable);
	}

	/// Tracks the services currently rendered; flags of vanished ones are dropped.
	pub fn sync_nodes<'a>(&mut self, ids: impl IntoIterator<Item = &'a ServiceId>) {
		let relating = self.mode.is_relating();
		let mut next = BTreeMap::new();
		for id in ids {
			let flags = self.nodes.remove(id).unwrap_or(NodeFlags {
				selectable: relating && self.start.as_ref() != Some(id),
				..NodeFlags::default()
			});
			next.insert(id.clone(), flags);
		}
		self.nodes = next;

		if self.start.as_ref().is_some_and(|id| !self.nodes.contains_key(id)) {
			self.cancel_relation();
		}
		if self.drop_target.as_ref().is_some_and(|id| !self.nodes.contains_key(id)) {
			self.drop_target = None;
		}
	}

	/// Drops optimistic lines the topology now draws itself, or can no longer draw.
	pub fn reconcile_pending(&mut self, drawn: &[ResolvedRelation]) {
		let nodes = &self.nodes;
		self.pending.retain(|p| {
			nodes.contains_key(&p.source) && nodes.contains_key(&p.target) && !drawn.contains(p)
		});
	}

	/// The add-relation control toggles between picking and panel toggling.
	pub fn toggle_add_relation(&mut self) {
		if self.mode.is_relating() {
			self.set_all_selectable(false);
			self.control_active = false;
			self.set_mode(Mode::PanelToggling);
		} else {
			self.set_all_selectable(true);
			self.control_active = true;
			self.set_mode(Mode::RelatingPickStart);
		}
	}

	pub fn click(&mut self, hit: &HitTarget) -> Vec<Effect> {
		match hit {
			HitTarget::Background => {
				self.nodes.values_mut().for_each(|f| f.panel_open = false);
				Vec::new()
			}
			HitTarget::Node(id) => {
				let action = self.mode.click_action(id.clone());
				self.dispatch(action)
			}
			HitTarget::Button(id, button) => {
				let mut effects = self.dispatch(ClickAction::ToggleControlPanel {
					service: id.clone(),
				});
				let service = id.clone();
				effects.extend(self.dispatch(match button {
					PanelButton::View => ClickAction::Show { service },
					PanelButton::Destroy => ClickAction::DestroyConfirm { service },
					PanelButton::AddRelation => ClickAction::AddRelationStart { service },
				}));
				effects
			}
		}
	}

	/// Double-click shows the service whatever the mode.
	pub fn double_click(&mut self, id: &str) -> Vec<Effect> {
		self.dispatch(ClickAction::Show {
			service: id.to_string(),
		})
	}

	pub fn dispatch(&mut self, action: ClickAction) -> Vec<Effect> {
		match action {
			ClickAction::Show { service } => vec![Effect::ShowService(service)],
			ClickAction::ToggleControlPanel { service } => {
				let open = self.flags(&service).panel_open;
				if !open {
					self.nodes.values_mut().for_each(|f| f.panel_open = false);
				}
				if let Some(flags) = self.nodes.get_mut(&service) {
					flags.panel_open = !open;
				}
				Vec::new()
			}
			ClickAction::AddRelationStart { service } => {
				self.set_all_selectable(true);
				if let Some(flags) = self.nodes.get_mut(&service) {
					flags.selectable = false;
				}
				self.start = Some(service);
				self.set_mode(Mode::RelatingPickEnd);
				Vec::new()
			}
			ClickAction::AddRelationEnd { target } => {
				self.set_all_selectable(false);
				let source = self.start.take();
				self.set_mode(Mode::PanelToggling);
				match source {
					Some(source) if source != target => {
						self.pending.push(ResolvedRelation {
							source: source.clone(),
							target: target.clone(),
						});
						vec![Effect::CreateRelation { source, target }]
					}
					_ => Vec::new(),
				}
			}
			ClickAction::DestroyConfirm { service } => vec![Effect::ConfirmDestroy(service)],
			ClickAction::Destroy { service } => vec![Effect::DestroyService(service)],
		}
	}

	/// Abandons any relation in progress and returns to panel toggling.
	pub fn cancel_relation(&mut self) {
		self.set_all_selectable(false);
		self.control_active = false;
		self.rubber_band.to = self.rubber_band.from;
		self.rubber_band.visible = false;
		self.set_mode(Mode::PanelToggling);
	}

	pub fn relation_drag_start(&mut self, id: &str, anchor: (f64, f64)) {
		self.rubber_band = RubberBand {
			from: anchor,
			to: anchor,
			visible: true,
		};
		self.dispatch(ClickAction::AddRelationStart {
			service: id.to_string(),
		});
	}

	pub fn relation_drag(&mut self, pointer: (f64, f64)) {
		if self.rubber_band.visible {
			self.rubber_band.to = pointer;
		}
	}

	pub fn relation_drag_end(&mut self) -> Vec<Effect> {
		self.rubber_band.to = self.rubber_band.from;
		self.rubber_band.visible = false;
		match self.drop_target.take() {
			Some(target) => self.dispatch(ClickAction::AddRelationEnd { target }),
			None => {
				self.cancel_relation();
				Vec::new()
			}
		}
	}

	/// `genuine` is false when the pointer arrived from outside the scene.
	pub fn pointer_over(&mut self, id: &str, genuine: bool) {
		if !genuine {
			return;
		}
		let Some(flags) = self.nodes.get_mut(id) else {
			return;
		};
		if flags.selectable {
			flags.hover = true;
			self.drop_target = Some(id.to_string());
		}
	}

	pub fn pointer_out(&mut self, id: &str) {
		let Some(flags) = self.nodes.get_mut(id) else {
			return;
		};
		if flags.hover {
			flags.hover = false;
			if self.drop_target.as_deref() == Some(id) {
				self.drop_target = None;
			}
		}
	}

	/// Completion of a relation-create request.
	pub fn relation_created(&mut self, source: &str, target: &str, result: Result<(), EnvError>) {
		self.control_active = false;
		if let Err(err) = result {
			error!("Error adding relation {source} -> {target}: {err}");
			self.pending
				.retain(|p| !(p.source == source && p.target == target));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn session(ids: &[&str]) -> InteractionSession {
		let ids: Vec<ServiceId> = ids.iter().map(|s| s.to_string()).collect();
		let mut s = InteractionSession::new();
		s.sync_nodes(&ids);
		s
	}

	fn node(id: &str) -> HitTarget {
		HitTarget::Node(id.into())
	}

	#[test]
	fn add_relation_control_toggles_selectable() {
		let mut s = session(&["a", "b", "c"]);
		assert_eq!(s.mode(), Mode::Showing);

		s.toggle_add_relation();
		assert_eq!(s.mode(), Mode::RelatingPickStart);
		assert!(s.control_active());
		assert!(["a", "b", "c"].iter().all(|id| s.flags(id).selectable));

		s.toggle_add_relation();
		assert_eq!(s.mode(), Mode::PanelToggling);
		assert!(!s.control_active());
		assert!(["a", "b", "c"].iter().all(|id| !s.flags(id).selectable));

		s.toggle_add_relation();
		assert_eq!(s.mode(), Mode::RelatingPickStart);
	}

	#[test]
	fn click_flow_builds_a_relation() {
		let mut s = session(&["a", "b"]);
		s.toggle_add_relation();
		assert!(s.click(&node("a")).is_empty());
		assert_eq!(s.mode(), Mode::RelatingPickEnd);
		assert_eq!(s.start().map(String::as_str), Some("a"));
		assert!(!s.flags("a").selectable && s.flags("b").selectable);

		let effects = s.click(&node("b"));
		assert_eq!(
			effects,
			vec![Effect::CreateRelation { source: "a".into(), target: "b".into() }]
		);
		assert_eq!(s.mode(), Mode::PanelToggling);
		assert!(s.start().is_none());
		assert_eq!(s.pending_relations().len(), 1);
		assert!(!s.flags("b").selectable);
	}

	#[test]
	fn picking_the_start_again_creates_nothing() {
		let mut s = session(&["a", "b"]);
		s.toggle_add_relation();
		s.click(&node("a"));
		assert!(s.click(&node("a")).is_empty());
		assert_eq!(s.mode(), Mode::PanelToggling);
		assert!(s.pending_relations().is_empty());
	}

	#[test]
	fn showing_mode_click_opens_the_panel() {
		let mut s = session(&["a", "b"]);
		assert!(s.click(&node("a")).is_empty());
		assert_eq!(s.mode(), Mode::Showing);
		assert!(s.flags("a").panel_open);
		s.click(&node("b"));
		assert!(!s.flags("a").panel_open && s.flags("b").panel_open);
	}

	#[test]
	fn panel_toggling_keeps_one_panel_open() {
		let mut s = session(&["a", "b"]);
		s.toggle_add_relation();
		s.toggle_add_relation();

		s.click(&node("a"));
		assert!(s.flags("a").panel_open);
		s.click(&node("b"));
		assert!(!s.flags("a").panel_open && s.flags("b").panel_open);
		s.click(&node("b"));
		assert!(!s.flags("b").panel_open);

		s.click(&node("a"));
		s.click(&HitTarget::Background);
		assert!(!s.flags("a").panel_open);
	}

	#[test]
	fn double_click_ignores_mode() {
		let mut s = session(&["a", "b"]);
		s.toggle_add_relation();
		assert_eq!(s.double_click("b"), vec![Effect::ShowService("b".into())]);
		assert_eq!(s.mode(), Mode::RelatingPickStart);
	}

	#[test]
	fn panel_buttons_bypass_mode_dispatch() {
		let mut s = session(&["a"]);
		s.click(&node("a"));
		let effects = s.click(&HitTarget::Button("a".into(), PanelButton::Destroy));
		assert_eq!(effects, vec![Effect::ConfirmDestroy("a".into())]);

		let effects = s.click(&HitTarget::Button("a".into(), PanelButton::View));
		assert_eq!(effects, vec![Effect::ShowService("a".into())]);

		s.click(&HitTarget::Button("a".into(), PanelButton::AddRelation));
		assert_eq!(s.mode(), Mode::RelatingPickEnd);
	}

	#[test]
	fn drag_without_drop_target_cancels() {
		let mut s = session(&["a", "b"]);
		s.relation_drag_start("a", (10.0, 10.0));
		s.relation_drag((50.0, 60.0));
		assert_eq!(s.rubber_band().to, (50.0, 60.0));
		assert!(s.rubber_band().visible);

		assert!(s.relation_drag_end().is_empty());
		assert_eq!(s.mode(), Mode::PanelToggling);
		assert!(s.start().is_none() && s.drop_target().is_none());
		assert_eq!(s.rubber_band().from, (10.0, 10.0));
		assert_eq!(s.rubber_band().to, (10.0, 10.0));
		assert!(!s.rubber_band().visible);
		assert!(!s.flags("b").selectable);
	}

	#[test]
	fn cancelled_pick_collapses_band_onto_its_anchor() {
		let mut s = session(&["a", "b"]);
		s.relation_drag_start("a", (42.0, 17.0));
		s.relation_drag((300.0, 200.0));
		s.cancel_relation();
		let band = s.rubber_band();
		assert!(!band.visible);
		assert_eq!((band.from, band.to), ((42.0, 17.0), (42.0, 17.0)));
		assert!(!s.control_active());
	}

	#[test]
	fn drag_onto_hovered_node_relates() {
		let mut s = session(&["a", "b"]);
		s.relation_drag_start("a", (0.0, 0.0));
		s.pointer_over("b", true);
		assert_eq!(s.drop_target().map(String::as_str), Some("b"));
		assert_eq!(
			s.relation_drag_end(),
			vec![Effect::CreateRelation { source: "a".into(), target: "b".into() }]
		);
		assert!(s.drop_target().is_none());
		assert!(!s.flags("b").hover);
	}

	#[test]
	fn hover_requires_selectable_and_genuine_transition() {
		let mut s = session(&["a", "b"]);
		s.pointer_over("b", true);
		assert!(s.drop_target().is_none());

		s.relation_drag_start("a", (0.0, 0.0));
		s.pointer_over("b", false);
		assert!(s.drop_target().is_none());
		s.pointer_over("a", true);
		assert!(s.drop_target().is_none());

		s.pointer_over("b", true);
		s.pointer_out("a");
		assert_eq!(s.drop_target().map(String::as_str), Some("b"));
		s.pointer_out("b");
		assert!(s.drop_target().is_none());
	}

	#[test]
	fn failed_relation_retracts_optimistic_line() {
		let mut s = session(&["a", "b", "c"]);
		s.relation_drag_start("a", (0.0, 0.0));
		s.pointer_over("b", true);
		s.relation_drag_end();
		s.relation_drag_start("a", (0.0, 0.0));
		s.pointer_over("c", true);
		s.relation_drag_end();
		assert_eq!(s.pending_relations().len(), 2);

		s.relation_created("a", "b", Err(EnvError::RelationRejected("nope".into())));
		assert_eq!(
			s.pending_relations(),
			&[ResolvedRelation { source: "a".into(), target: "c".into() }]
		);
		s.relation_created("a", "c", Ok(()));
		assert_eq!(s.pending_relations().len(), 1);
		assert!(!s.control_active());
	}

	#[test]
	fn pending_lines_yield_to_drawn_relations() {
		let mut s = session(&["a", "b"]);
		s.toggle_add_relation();
		s.click(&node("a"));
		s.click(&node("b"));
		let drawn = vec![ResolvedRelation { source: "a".into(), target: "b".into() }];
		s.reconcile_pending(&drawn);
		assert!(s.pending_relations().is_empty());
	}

	#[test]
	fn removing_the_start_node_cancels_relating() {
		let mut s = session(&["a", "b"]);
		s.relation_drag_start("a", (0.0, 0.0));
		let remaining = vec!["b".to_string()];
		s.sync_nodes(&remaining);
		assert_eq!(s.mode(), Mode::PanelToggling);
		assert!(s.start().is_none());
		assert!(!s.flags("b").selectable);
	}

	#[test]
	fn new_nodes_join_an_active_pick() {
		let mut s = session(&["a"]);
		s.toggle_add_relation();
		let ids = vec!["a".to_string(), "b".to_string()];
		s.sync_nodes(&ids);
		assert!(s.flags("b").selectable);
	}
}
