use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scene::{Placement, Primitive, Scene, Shape};
use super::state::TopologyState;

const BACKGROUND: &str = "#1a1a2e";
const STROKE: &str = "#fff";

pub fn render(state: &TopologyState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.scene.viewport();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let primitives: Vec<&Primitive> = state.scene.primitives().collect();
	// Links under nodes, labels on top.
	draw_lines(&primitives, ctx, state.transform.k);
	draw_circles(&primitives, ctx, state.transform.k);
	draw_labels(&primitives, ctx, state.transform.k);
	ctx.restore();
}

fn draw_lines(primitives: &[&Primitive], ctx: &CanvasRenderingContext2d, k: f64) {
	ctx.set_stroke_style_str(STROKE);
	ctx.set_line_width(1.5 / k);
	for primitive in primitives {
		let (Shape::Line, Placement::Segment { x1, y1, x2, y2 }) =
			(&primitive.shape, primitive.placement)
		else {
			continue;
		};
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	}
}

fn draw_circles(primitives: &[&Primitive], ctx: &CanvasRenderingContext2d, k: f64) {
	ctx.set_stroke_style_str(STROKE);
	ctx.set_line_width(1.5 / k);
	for primitive in primitives {
		let (Shape::Circle { radius, fill }, Placement::Point { x, y }) =
			(&primitive.shape, primitive.placement)
		else {
			continue;
		};
		ctx.begin_path();
		let _ = ctx.arc(x, y, *radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.stroke();
	}
}

fn draw_labels(primitives: &[&Primitive], ctx: &CanvasRenderingContext2d, k: f64) {
	ctx.set_fill_style_str(STROKE);
	ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
	for primitive in primitives {
		let (Shape::Label { text }, Placement::Point { x, y }) =
			(&primitive.shape, primitive.placement)
		else {
			continue;
		};
		let _ = ctx.fill_text(text, x, y);
	}
}
