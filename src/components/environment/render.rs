use std::f64::consts::{FRAC_PI_2, PI};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::{parse_points, pie_slices};
use super::interaction::PanelButton;
use super::state::{
	EnvironmentState, NodeView, STATUS_CHART_CENTER, STATUS_CHART_INNER, STATUS_CHART_OUTER,
};

const GRID_STEP: f64 = 100.0;

fn status_color(name: &str) -> &'static str {
	match name {
		"running" | "started" => "#38b44a",
		"pending" | "installed" => "#f4a41d",
		"error" | "install-error" | "start-error" | "stop-error" => "#df382c",
		"dying" | "stopped" => "#aea79f",
		_ => "#772953",
	}
}

/// Short unit count for the status chart label.
pub fn humanize_number(n: u32) -> String {
	let trim = |v: f64, suffix: &str| {
		let s = format!("{v:.1}");
		format!("{}{suffix}", s.trim_end_matches(".0"))
	};
	// Rounded to one decimal before picking the suffix, so 999_950 reads 1M.
	let tenths = |divisor: f64| (n as f64 / (divisor / 10.0)).round() / 10.0;
	match n {
		0..=999 => n.to_string(),
		_ if tenths(1_000.0) < 1_000.0 => trim(tenths(1_000.0), "k"),
		_ => trim(tenths(1_000_000.0), "M"),
	}
}

pub fn render(state: &EnvironmentState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.size();
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, width, height);
	draw_grid(state, ctx);

	let (tx, ty) = state.viewport.translate();
	let k = state.viewport.scale();
	ctx.save();
	let _ = ctx.translate(tx, ty);
	let _ = ctx.scale(k, k);
	draw_links(state, ctx);
	for node in state.nodes() {
		draw_node(state, &node, ctx);
	}
	draw_rubber_band(state, ctx);
	ctx.restore();
}

/// Faint lines at round data-space coordinates, read through the axis scales.
fn draw_grid(state: &EnvironmentState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.size();
	let (xs, ys) = (state.viewport.x_scale(), state.viewport.y_scale());
	ctx.set_stroke_style_str("rgba(0, 0, 0, 0.04)");
	ctx.set_line_width(1.0);
	ctx.begin_path();
	let (x0, x1) = (xs.invert(0.0), xs.invert(width));
	let mut v = (x0 / GRID_STEP).ceil() * GRID_STEP;
	while v <= x1 {
		let px = xs.apply(v);
		ctx.move_to(px, 0.0);
		ctx.line_to(px, height);
		v += GRID_STEP;
	}
	let (y0, y1) = (ys.invert(height), ys.invert(0.0));
	let mut v = (y0 / GRID_STEP).ceil() * GRID_STEP;
	while v <= y1 {
		let py = ys.apply(v);
		ctx.move_to(0.0, py);
		ctx.line_to(width, py);
		v += GRID_STEP;
	}
	ctx.stroke();
}

fn draw_links(state: &EnvironmentState, ctx: &CanvasRenderingContext2d) {
	for link in &state.links {
		let points = parse_points(&link.points);
		let Some((&(x0, y0), rest)) = points.split_first() else {
			continue;
		};
		if link.pending {
			ctx.set_stroke_style_str("rgba(119, 41, 83, 0.6)");
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(6.0),
				&JsValue::from_f64(4.0),
			));
		} else {
			ctx.set_stroke_style_str("#aea79f");
		}
		ctx.set_line_width(2.0);
		ctx.begin_path();
		ctx.move_to(x0, y0);
		for &(x, y) in rest {
			ctx.line_to(x, y);
		}
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}
}

fn draw_node(state: &EnvironmentState, node: &NodeView<'_>, ctx: &CanvasRenderingContext2d) {
	let r = node.rect;
	let service = node.service;

	ctx.set_fill_style_str("#f7f6f5");
	ctx.fill_rect(r.x, r.y, r.width, r.height);
	let (stroke, width) = match (node.flags.hover, node.flags.selectable) {
		(true, _) => ("#38b44a", 4.0),
		(false, true) => ("#f4a41d", 3.0),
		_ => ("#aea79f", 1.5),
	};
	ctx.set_stroke_style_str(stroke);
	ctx.set_line_width(width);
	ctx.stroke_rect(r.x, r.y, r.width, r.height);

	ctx.set_fill_style_str("#333333");
	ctx.set_font("bold 14px sans-serif");
	let _ = ctx.fill_text(&service.id, r.x + 54.0, r.y + 18.0);
	ctx.set_fill_style_str("#888888");
	ctx.set_font("11px sans-serif");
	let _ = ctx.fill_text(&service.charm, r.x + 54.0, r.y + 40.0);

	if service.exposed {
		ctx.begin_path();
		let _ = ctx.arc(r.x, r.y + 10.0, 5.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("#38b44a");
		ctx.fill();
	}

	let (cx, cy) = (r.x + STATUS_CHART_CENTER.0, r.y + STATUS_CHART_CENTER.1);
	for slice in pie_slices(&service.aggregated_status) {
		// Slices start at twelve o'clock; canvas angles start at three.
		let (a0, a1) = (slice.start_angle - FRAC_PI_2, slice.end_angle - FRAC_PI_2);
		ctx.begin_path();
		let _ = ctx.arc(cx, cy, STATUS_CHART_OUTER, a0, a1);
		let _ = ctx.arc_with_anticlockwise(cx, cy, STATUS_CHART_INNER, a1, a0, true);
		ctx.close_path();
		ctx.set_fill_style_str(status_color(&slice.name));
		ctx.fill();
	}
	if node.chart_hovered {
		ctx.set_fill_style_str("#333333");
		ctx.set_font("bold 11px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&humanize_number(service.unit_count), cx, cy + 4.0);
		ctx.set_text_align("start");
	}

	if node.flags.panel_open {
		draw_control_panel(state, node, ctx);
	}
}

fn draw_control_panel(state: &EnvironmentState, node: &NodeView<'_>, ctx: &CanvasRenderingContext2d) {
	let active = state.session.control_active();
	for button in [PanelButton::View, PanelButton::Destroy, PanelButton::AddRelation] {
		let b = state.button_rect(node.rect, button);
		let (cx, cy) = b.center();
		let (fill, glyph) = match button {
			PanelButton::View => ("#19b6ee", "\u{1F441}"),
			PanelButton::Destroy => ("#df382c", "\u{2715}"),
			PanelButton::AddRelation if active => ("#38b44a", "\u{21C4}"),
			PanelButton::AddRelation => ("#772953", "\u{21C4}"),
		};
		ctx.begin_path();
		let _ = ctx.arc(cx, cy, b.width / 2.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.set_fill_style_str("#ffffff");
		ctx.set_font("16px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(glyph, cx, cy + 6.0);
	}
	ctx.set_text_align("start");
}

fn draw_rubber_band(state: &EnvironmentState, ctx: &CanvasRenderingContext2d) {
	let band = state.session.rubber_band();
	if !band.visible {
		return;
	}
	ctx.set_stroke_style_str("rgba(119, 41, 83, 0.8)");
	ctx.set_line_width(2.0 / state.viewport.scale());
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(6.0),
		&JsValue::from_f64(4.0),
	));
	ctx.begin_path();
	ctx.move_to(band.from.0, band.from.1);
	ctx.line_to(band.to.0, band.to.1);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}
