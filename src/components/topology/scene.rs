//! Retained-mode scene of circles, labels and lines.

use std::fmt;

use super::graph::Role;

/// Margin between a node's center and its label.
pub const LABEL_OFFSET: (f64, f64) = (15.0, 15.0);

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
	Circle { radius: f64, fill: &'static str },
	Label { text: String },
	Line,
}

/// Where a primitive is drawn, in graph coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Placement {
	/// Not yet positioned; not drawn.
	#[default]
	Hidden,
	Point {
		x: f64,
		y: f64,
	},
	Segment {
		x1: f64,
		y1: f64,
		x2: f64,
		y2: f64,
	},
}

/// A drawing surface that owns its primitives and hands out handles.
pub trait Scene {
	type Handle: Copy + Eq + fmt::Debug;

	fn create(&mut self, shape: Shape) -> Self::Handle;
	fn restyle(&mut self, handle: Self::Handle, shape: Shape);
	fn destroy(&mut self, handle: Self::Handle);
	fn place(&mut self, handle: Self::Handle, placement: Placement);
	/// Width and height of the visible area.
	fn viewport(&self) -> (f64, f64);
}

/// Circle treatment for each node role.
pub fn node_shape(role: Role) -> Shape {
	let (radius, fill) = match role {
		Role::Root => (15.0, "brown"),
		Role::Host => (15.0, "orange"),
		Role::Workload => (10.0, "yellow"),
	};
	Shape::Circle { radius, fill }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
	pub shape: Shape,
	pub placement: Placement,
}

/// In-memory [`Scene`] painted onto the canvas each frame.
#[derive(Clone, Debug, Default)]
pub struct RetainedScene {
	slots: Vec<Option<Primitive>>,
	free: Vec<usize>,
	width: f64,
	height: f64,
}

impl RetainedScene {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			..Self::default()
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	#[cfg(test)]
	pub fn get(&self, handle: usize) -> Option<&Primitive> {
		self.slots.get(handle).and_then(Option::as_ref)
	}

	pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
		self.slots.iter().flatten()
	}

	pub fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}
}

impl Scene for RetainedScene {
	type Handle = usize;

	fn create(&mut self, shape: Shape) -> usize {
		let primitive = Some(Primitive {
			shape,
			placement: Placement::Hidden,
		});
		match self.free.pop() {
			Some(handle) => {
				self.slots[handle] = primitive;
				handle
			}
			None => {
				self.slots.push(primitive);
				self.slots.len() - 1
			}
		}
	}

	fn restyle(&mut self, handle: usize, shape: Shape) {
		if let Some(Some(primitive)) = self.slots.get_mut(handle) {
			primitive.shape = shape;
		}
	}

	fn destroy(&mut self, handle: usize) {
		if let Some(slot) = self.slots.get_mut(handle) {
			if slot.take().is_some() {
				self.free.push(handle);
			}
		}
	}

	fn place(&mut self, handle: usize, placement: Placement) {
		if let Some(Some(primitive)) = self.slots.get_mut(handle) {
			primitive.placement = placement;
		}
	}

	fn viewport(&self) -> (f64, f64) {
		(self.width, self.height)
	}
}
