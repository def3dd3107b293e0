//! Identity-keyed binding from the graph store to scene primitives.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::graph::{GraphStore, LinkId, NodeId};
use super::scene::{LABEL_OFFSET, Placement, Scene, Shape, node_shape};

/// How many primitives a rebind created, kept and destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindStats {
	pub entered: usize,
	pub updated: usize,
	pub exited: usize,
}

impl std::ops::AddAssign for BindStats {
	fn add_assign(&mut self, other: Self) {
		self.entered += other.entered;
		self.updated += other.updated;
		self.exited += other.exited;
	}
}

pub struct RenderSync<H> {
	circles: HashMap<NodeId, H>,
	labels: HashMap<NodeId, H>,
	lines: HashMap<LinkId, H>,
}

impl<H> Default for RenderSync<H> {
	fn default() -> Self {
		Self {
			circles: HashMap::new(),
			labels: HashMap::new(),
			lines: HashMap::new(),
		}
	}
}

impl<H: Copy> RenderSync<H> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn circle(&self, id: &str) -> Option<H> {
		self.circles.get(id).copied()
	}

	pub fn label(&self, id: &str) -> Option<H> {
		self.labels.get(id).copied()
	}

	pub fn line(&self, id: &LinkId) -> Option<H> {
		self.lines.get(id).copied()
	}

	/// Matches the three primitive collections to the store's current nodes
	/// and links.
	pub fn rebind<S>(&mut self, store: &GraphStore, scene: &mut S) -> BindStats
	where
		S: Scene<Handle = H>,
	{
		let mut stats = bind(
			&mut self.circles,
			store.nodes().map(|n| (n.id().clone(), node_shape(n.role()))),
			scene,
		);
		stats += bind(
			&mut self.labels,
			store.nodes().map(|n| {
				let text = n.label().to_owned();
				(n.id().clone(), Shape::Label { text })
			}),
			scene,
		);
		stats += bind(
			&mut self.lines,
			store.links().map(|l| (l.id().clone(), Shape::Line)),
			scene,
		);
		stats
	}

	/// Copies current positions onto the bound primitives.
	pub fn project<S>(&self, store: &GraphStore, scene: &mut S)
	where
		S: Scene<Handle = H>,
	{
		for node in store.nodes() {
			let Some((x, y)) = node.position() else {
				continue;
			};
			let id = node.id().as_str();
			if let Some(circle) = self.circle(id) {
				scene.place(circle, Placement::Point { x, y });
			}
			if let Some(label) = self.label(id) {
				let (dx, dy) = LABEL_OFFSET;
				scene.place(label, Placement::Point { x: x + dx, y: y + dy });
			}
		}

		for link in store.links() {
			let Some(line) = self.line(link.id()) else {
				continue;
			};
			let source = store.node(link.source().as_str()).and_then(|n| n.position());
			let target = store.node(link.target().as_str()).and_then(|n| n.position());
			let placement = match (source, target) {
				(Some((x1, y1)), Some((x2, y2))) => Placement::Segment { x1, y1, x2, y2 },
				_ => Placement::Hidden,
			};
			scene.place(line, placement);
		}
	}
}

/// Enter, update and exit for one keyed collection.
fn bind<K, S>(
	visuals: &mut HashMap<K, S::Handle>,
	wanted: impl Iterator<Item = (K, Shape)>,
	scene: &mut S,
) -> BindStats
where
	K: Clone + Eq + Hash,
	S: Scene,
{
	let wanted: Vec<(K, Shape)> = wanted.collect();
	let present: HashSet<K> = wanted.iter().map(|(key, _)| key.clone()).collect();
	let mut stats = BindStats::default();

	visuals.retain(|key, handle| {
		let keep = present.contains(key);
		if !keep {
			scene.destroy(*handle);
			stats.exited += 1;
		}
		keep
	});

	for (key, shape) in wanted {
		match visuals.get(&key) {
			Some(&handle) => {
				scene.restyle(handle, shape);
				stats.updated += 1;
			}
			None => {
				visuals.insert(key, scene.create(shape));
				stats.entered += 1;
			}
		}
	}
	stats
}
