use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use log::{debug, warn};

use crate::components::environment::{
	ConfirmDialog, ConfirmEvent, EnvError, Endpoint, Environment, EnvironmentCanvas, Relation,
	Response, Service, Topology,
};

const SAMPLE_TOPOLOGY: &str = include_str!("../../assets/sample_topology.json");

/// Round trip to the (simulated) environment.
const LATENCY: Duration = Duration::from_millis(350);

/// In-browser stand-in for the environment: mutations land in the topology
/// signal after a short delay, the way a real round trip would.
struct LocalEnvironment {
	topology: RwSignal<Topology>,
}

impl Environment for LocalEnvironment {
	fn add_relation(&self, source: &str, target: &str, callback: Box<dyn FnOnce(Response)>) {
		let topology = self.topology;
		let (source, target) = (source.to_string(), target.to_string());
		set_timeout(
			move || {
				let known = topology
					.with_untracked(|t| t.service(&source).is_some() && t.service(&target).is_some());
				if !known {
					callback(Err(EnvError::RelationRejected(format!(
						"{source} or {target} no longer exists"
					))));
					return;
				}
				topology.update(|t| {
					t.relations.push(Relation {
						endpoints: vec![
							Endpoint(source, "client".into()),
							Endpoint(target, "server".into()),
						],
					})
				});
				callback(Ok(()));
			},
			LATENCY,
		);
	}

	fn destroy_service(&self, service: &str, callback: Box<dyn FnOnce(Response)>) {
		let topology = self.topology;
		let service = service.to_string();
		set_timeout(
			move || {
				topology.update(|t| {
					t.services.retain(|s| s.id != service);
					t.relations
						.retain(|r| r.endpoints.iter().all(|ep| ep.0 != service));
				});
				callback(Ok(()));
			},
			LATENCY,
		);
	}
}

/// Confirmation through the browser's native `confirm()` prompt.
struct BrowserConfirm;

impl ConfirmDialog for BrowserConfirm {
	fn show(
		&self,
		message: &str,
		_anchor: &str,
		confirm_label: &str,
		on_confirm: Box<dyn FnOnce(&mut ConfirmEvent)>,
	) {
		let prompt = format!("{message}\n\nOK to {}.", confirm_label.to_lowercase());
		let confirmed = web_sys::window()
			.and_then(|w| w.confirm_with_message(&prompt).ok())
			.unwrap_or(false);
		if confirmed {
			let mut ev = ConfirmEvent::default();
			on_confirm(&mut ev);
			if !ev.default_prevented() {
				warn!("confirm handler left the default action in place");
			}
		}
	}

	fn hide(&self) {
		debug!("destroy dialog dismissed");
	}
}

fn environment_page(topology: Topology) -> impl IntoView {
	let topology = RwSignal::new(topology);
	let selected = RwSignal::new(None::<Service>);
	let env: Rc<dyn Environment> = Rc::new(LocalEnvironment { topology });
	let dialog: Rc<dyn ConfirmDialog> = Rc::new(BrowserConfirm);

	view! {
		<div class="fullscreen-graph">
			<EnvironmentCanvas
				data=topology
				env=env
				dialog=dialog
				on_show_service=Callback::new(move |service: Service| selected.set(Some(service)))
			/>
			<div class="graph-overlay">
				<h1>"Environment"</h1>
				<p class="subtitle">
					"Click a service for its controls. Drag the relation handle onto another service to relate them. Double-click to view."
				</p>
				{move || {
					selected
						.get()
						.map(|s| {
							view! {
								<p class="selected-service">
									"Viewing " <strong>{s.id}</strong> " (" {s.charm} ", "
									{s.unit_count} " units)"
								</p>
							}
						})
				}}
			</div>
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let page = Topology::from_json(SAMPLE_TOPOLOGY).map(|topology| environment_page(topology).into_any());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>{page}</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bundled_topology_decodes() {
		let topology = Topology::from_json(SAMPLE_TOPOLOGY).unwrap();
		assert!(topology.service("wordpress").is_some_and(|s| s.exposed));
		assert!(topology.relations.iter().any(|r| r.endpoints.len() == 1));
		assert!(
			topology
				.relations
				.iter()
				.flat_map(|r| &r.endpoints)
				.all(|ep| topology.service(&ep.0).is_some())
		);
	}
}
