//! Seams to the world outside the view: the environment RPCs, the
//! confirmation dialog and the "show service" event.

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info};
use thiserror::Error;

use super::interaction::{ClickAction, Effect};
use super::state::EnvironmentState;
use super::types::Service;

pub const DESTROY_MESSAGE: &str =
	"Are you sure you want to destroy the service? This cannot be undone.";
pub const DESTROY_ANCHOR: &str = "#destroy-modal-panel";
pub const DESTROY_LABEL: &str = "Destroy Service";

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EnvError {
	#[error("relation rejected: {0}")]
	RelationRejected(String),
	#[error("destroy rejected: {0}")]
	DestroyRejected(String),
	#[error("environment unavailable")]
	Unavailable,
}

pub type Response = Result<(), EnvError>;

/// Asynchronous environment mutations; `callback` runs once the call settles.
pub trait Environment {
	fn add_relation(&self, source: &str, target: &str, callback: Box<dyn FnOnce(Response)>);
	fn destroy_service(&self, service: &str, callback: Box<dyn FnOnce(Response)>);
}

/// Passed to the confirm handler, which must prevent the dialog's default action.
#[derive(Debug, Default)]
pub struct ConfirmEvent {
	default_prevented: bool,
}

impl ConfirmEvent {
	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
	}

	pub fn default_prevented(&self) -> bool {
		self.default_prevented
	}
}

pub trait ConfirmDialog {
	fn show(
		&self,
		message: &str,
		anchor: &str,
		confirm_label: &str,
		on_confirm: Box<dyn FnOnce(&mut ConfirmEvent)>,
	);
	fn hide(&self);
}

/// Executes session effects. Never holds a borrow of the state while calling out.
#[derive(Clone)]
pub struct Collaborators {
	pub env: Rc<dyn Environment>,
	pub dialog: Rc<dyn ConfirmDialog>,
	pub on_show: Rc<dyn Fn(Service)>,
}

impl Collaborators {
	pub fn run(&self, state: &Rc<RefCell<EnvironmentState>>, effects: Vec<Effect>) {
		for effect in effects {
			match effect {
				Effect::ShowService(id) => {
					let service = state.borrow().service(&id).cloned();
					match service {
						Some(service) => (self.on_show)(service),
						None => error!("show requested for unknown service {id}"),
					}
				}
				Effect::CreateRelation { source, target } => {
					info!("adding relation {source} -> {target}");
					let state = Rc::clone(state);
					let (s, t) = (source.clone(), target.clone());
					self.env.add_relation(
						&source,
						&target,
						Box::new(move |resp: Response| {
							let mut st = state.borrow_mut();
							st.session.relation_created(&s, &t, resp);
							st.rebuild_links();
						}),
					);
				}
				Effect::ConfirmDestroy(id) => {
					let (collab, state) = (self.clone(), Rc::clone(state));
					self.dialog.show(
						DESTROY_MESSAGE,
						DESTROY_ANCHOR,
						DESTROY_LABEL,
						Box::new(move |ev: &mut ConfirmEvent| {
							ev.prevent_default();
							let effects = state
								.borrow_mut()
								.session
								.dispatch(ClickAction::Destroy { service: id });
							collab.run(&state, effects);
						}),
					);
				}
				Effect::DestroyService(id) => {
					info!("destroying service {id}");
					let dialog = Rc::clone(&self.dialog);
					self.env.destroy_service(
						&id,
						Box::new(move |resp: Response| {
							if let Err(err) = resp {
								error!("Error destroying service: {err}");
							}
							dialog.hide();
						}),
					);
				}
			}
		}
	}
}
