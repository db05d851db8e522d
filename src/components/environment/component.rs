use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::collaborators::{Collaborators, ConfirmDialog, Environment};
use super::config::ViewConfig;
use super::render;
use super::state::EnvironmentState;
use super::types::{Service, Topology};
use super::viewport::ViewportMetrics;

fn px(value: &str) -> Option<f64> {
	value.trim().trim_end_matches("px").parse().ok()
}

fn measure(window: &Window, canvas: &HtmlCanvasElement) -> ViewportMetrics {
	let document = window.document();
	let element = |selector: &str| document.as_ref()?.query_selector(selector).ok()?;
	let style = |el: &web_sys::Element, prop: &str| {
		window
			.get_computed_style(el)
			.ok()??
			.get_property_value(prop)
			.ok()
			.and_then(|v| px(&v))
	};
	let container_width = canvas.parent_element().and_then(|p| {
		style(&p, "width").or_else(|| Some(p.client_width() as f64).filter(|w| *w > 0.0))
	});
	let navbar = element(".navbar");

	ViewportMetrics {
		container_width,
		window_width: window.inner_width().ok().and_then(|v| v.as_f64()),
		window_height: window.inner_height().ok().and_then(|v| v.as_f64()),
		tasks_bar_height: element("#overview-tasks")
			.map(|el| el.get_bounding_client_rect().height()),
		navbar_height: navbar.as_ref().map(|el| el.get_bounding_client_rect().height()),
		navbar_margin: navbar.as_ref().and_then(|el| style(el, "margin-bottom")),
	}
}

fn fit(state: &RefCell<EnvironmentState>, window: &Window, canvas: &HtmlCanvasElement) {
	let (w, h) = state
		.borrow_mut()
		.fit_viewport(&measure(window, canvas));
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
}

/// Interactive service topology drawn on a canvas.
#[component]
pub fn EnvironmentCanvas(
	#[prop(into)] data: Signal<Topology>,
	env: Rc<dyn Environment>,
	dialog: Rc<dyn ConfirmDialog>,
	#[prop(optional)] on_show_service: Option<Callback<Service>>,
	#[prop(optional)] config: Option<ViewConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = Rc::new(RefCell::new(EnvironmentState::new(
		config.unwrap_or_default(),
	)));
	let collab = Collaborators {
		env,
		dialog,
		on_show: Rc::new(move |service: Service| {
			if let Some(cb) = on_show_service {
				cb.run(service);
			}
		}),
	};
	let control_active = RwSignal::new(false);
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let state_data = state.clone();
	Effect::new(move |_| {
		let topology = data.get();
		state_data.borrow_mut().reconcile(&topology);
	});

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window; environment view stays inert");
			return;
		};
		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			warn!("canvas 2d context unavailable");
			return;
		};
		fit(&state_init, &window, &canvas);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(win) = web_sys::window() {
				fit(&state_resize, &win, &canvas_resize);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			{
				let s = state_anim.borrow();
				render::render(&s, &ctx);
				let active = s.session.control_active();
				if control_active.get_untracked() != active {
					control_active.set(active);
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let local = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local(&ev) {
			state_md.borrow_mut().pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local(&ev) {
			state_mm.borrow_mut().pointer_move(x, y);
		}
	};

	let (state_mu, collab_mu) = (state.clone(), collab.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = local(&ev) else {
			return;
		};
		let effects = state_mu.borrow_mut().pointer_up(x, y);
		collab_mu.run(&state_mu, effects);
	};

	let (state_ml, collab_ml) = (state.clone(), collab.clone());
	let on_mouseleave = move |_: MouseEvent| {
		let effects = state_ml.borrow_mut().pointer_leave();
		collab_ml.run(&state_ml, effects);
	};

	let (state_dc, collab_dc) = (state.clone(), collab.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = local(&ev) else {
			return;
		};
		let effects = state_dc.borrow_mut().double_click(x, y);
		collab_dc.run(&state_dc, effects);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local(ev.as_ref()) {
			state_wh.borrow_mut().wheel(x, y, ev.delta_y());
		}
	};

	let state_ar = state.clone();
	let on_add_relation = move |_: MouseEvent| {
		let mut s = state_ar.borrow_mut();
		s.toggle_add_relation();
		control_active.set(s.session.control_active());
	};
	let state_zi = state.clone();
	let on_zoom_in = move |_: MouseEvent| state_zi.borrow_mut().zoom_in();
	let state_zo = state.clone();
	let on_zoom_out = move |_: MouseEvent| state_zo.borrow_mut().zoom_out();

	view! {
		<div class="environment-view" style="position: relative;">
			<div id="overview-tasks" class="environment-controls">
				<button
					id="add-relation-btn"
					class=move || if control_active.get() { "active" } else { "" }
					on:click=on_add_relation
				>
					"Add relation"
				</button>
				<button id="zoom-out-btn" on:click=on_zoom_out>"-"</button>
				<button id="zoom-in-btn" on:click=on_zoom_in>"+"</button>
			</div>
			<canvas
				node_ref=canvas_ref
				id="canvas"
				class="environment-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
				style="display: block; cursor: default;"
			/>
		</div>
	}
}
