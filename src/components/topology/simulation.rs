//! Continuous force-directed layout over the graph store.
//!
//! Each step applies, in order: many-body repulsion between every pair of
//! nodes, spring attraction along links toward a target distance, and a
//! weak pull toward the origin on each axis. Forces are scaled by the
//! simulation energy `alpha`, which is reset on [`Simulation::restart`] and
//! otherwise decays toward `alpha_target`. The simulation never stops
//! stepping.

use std::f64::consts::PI;

use super::graph::{Body, GraphStore};

/// Tuning for the layout forces.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Repulsion applied between every node pair. Negative repels.
	pub charge: f64,
	/// Separation links pull their endpoints toward.
	pub link_distance: f64,
	/// Link strength that maps to full spring stiffness.
	pub reference_strength: f64,
	/// Pull toward the origin, per axis.
	pub center_strength: f64,
	/// Fraction of velocity lost per step.
	pub velocity_decay: f64,
	/// Rate at which `alpha` approaches `alpha_target`.
	pub alpha_decay: f64,
	/// Energy level the simulation settles at between restarts.
	pub alpha_target: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			charge: -1000.0,
			link_distance: 200.0,
			reference_strength: 50.0,
			center_strength: 0.1,
			velocity_decay: 0.4,
			// Cools from 1 to 0.001 over ~300 steps.
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			alpha_target: 0.0,
		}
	}
}

/// Radius step of the initial spiral placement.
const INITIAL_RADIUS: f64 = 10.0;

pub struct Simulation {
	pub config: LayoutConfig,
	alpha: f64,
}

impl Default for Simulation {
	fn default() -> Self {
		Self::new(LayoutConfig::default())
	}
}

impl Simulation {
	pub fn new(config: LayoutConfig) -> Self {
		Self { config, alpha: 1.0 }
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Resets the energy to its maximum.
	pub fn restart(&mut self) {
		self.alpha = 1.0;
	}

	/// Advances the layout by one step. Only node bodies are written.
	pub fn step(&mut self, store: &mut GraphStore) {
		self.alpha += (self.config.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		let mut bodies: Vec<Body> = store
			.nodes()
			.enumerate()
			.map(|(i, node)| node.body.unwrap_or_else(|| seed(i)))
			.collect();
		let edges: Vec<(usize, usize, f64)> = store
			.links()
			.filter_map(|link| {
				Some((
					store.index_of(link.source().as_str())?,
					store.index_of(link.target().as_str())?,
					link.strength(),
				))
			})
			.collect();

		self.apply_charge(&mut bodies, alpha);
		self.apply_links(&mut bodies, &edges, alpha);
		self.apply_centering(&mut bodies, alpha);

		let keep = 1.0 - self.config.velocity_decay;
		for (slot, mut body) in store.bodies_mut().zip(bodies) {
			body.vx *= keep;
			body.vy *= keep;
			body.x += body.vx;
			body.y += body.vy;
			*slot = Some(body);
		}
	}

	fn apply_charge(&self, bodies: &mut [Body], alpha: f64) {
		let strength = self.config.charge * alpha;
		for i in 0..bodies.len() {
			let (mut vx, mut vy) = (0.0, 0.0);
			for j in 0..bodies.len() {
				if i == j {
					continue;
				}
				let (mut dx, mut dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
				let mut l = dx * dx + dy * dy;
				if l == 0.0 {
					(dx, dy) = jiggle(i, j);
					l = dx * dx + dy * dy;
				}
				// Soften the singularity below unit distance.
				if l < 1.0 {
					l = l.sqrt();
				}
				let w = strength / l;
				vx += dx * w;
				vy += dy * w;
			}
			bodies[i].vx += vx;
			bodies[i].vy += vy;
		}
	}

	fn apply_links(&self, bodies: &mut [Body], edges: &[(usize, usize, f64)], alpha: f64) {
		let mut degree = vec![0usize; bodies.len()];
		for &(s, t, _) in edges {
			degree[s] += 1;
			degree[t] += 1;
		}

		for &(s, t, strength) in edges {
			if s == t {
				continue;
			}
			let (source, target) = (bodies[s], bodies[t]);
			let mut dx = target.x + target.vx - source.x - source.vx;
			let mut dy = target.y + target.vy - source.y - source.vy;
			if dx == 0.0 && dy == 0.0 {
				(dx, dy) = jiggle(s, t);
			}
			let l = (dx * dx + dy * dy).sqrt();
			let stiffness = (strength / self.config.reference_strength).clamp(0.0, 1.0)
				/ degree[s].min(degree[t]) as f64;
			let k = (l - self.config.link_distance) / l * alpha * stiffness;
			let (fx, fy) = (dx * k, dy * k);
			// Heavier-connected endpoints move less.
			let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;
			bodies[t].vx -= fx * bias;
			bodies[t].vy -= fy * bias;
			bodies[s].vx += fx * (1.0 - bias);
			bodies[s].vy += fy * (1.0 - bias);
		}
	}

	fn apply_centering(&self, bodies: &mut [Body], alpha: f64) {
		let k = self.config.center_strength * alpha;
		for body in bodies {
			body.vx -= body.x * k;
			body.vy -= body.y * k;
		}
	}
}

/// Phyllotaxis placement for the `index`-th node.
fn seed(index: usize) -> Body {
	let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
	let angle = index as f64 * PI * (3.0 - 5.0_f64.sqrt());
	Body {
		x: radius * angle.cos(),
		y: radius * angle.sin(),
		..Body::default()
	}
}

/// Tiny deterministic offset separating coincident nodes.
fn jiggle(a: usize, b: usize) -> (f64, f64) {
	let angle = (a as f64 * 0.618_034 + b as f64 * 0.414_214) * 2.0 * PI;
	(angle.cos() * 1e-6, angle.sin() * 1e-6)
}

#[cfg(test)]
mod tests {
	use super::super::graph::{HOST_LINK_STRENGTH, Link, Node, Payload, ROOT_ID};
	use super::super::types::HostRecord;
	use super::*;

	fn host(id: &str) -> Node {
		Node::new(
			id,
			id,
			Payload::Host(HostRecord {
				id: id.into(),
				hostname: id.into(),
				containers: Vec::new(),
			}),
		)
	}

	fn place(store: &mut GraphStore, positions: &[(f64, f64)]) {
		for (slot, &(x, y)) in store.bodies_mut().zip(positions) {
			*slot = Some(Body {
				x,
				y,
				..Body::default()
			});
		}
	}

	fn distance(store: &GraphStore, a: &str, b: &str) -> f64 {
		let (ax, ay) = store.node(a).and_then(Node::position).unwrap();
		let (bx, by) = store.node(b).and_then(Node::position).unwrap();
		((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
	}

	#[test]
	fn first_step_places_every_node() {
		let mut store = GraphStore::new();
		store.insert_node(host("h1"));
		store.insert_node(host("h2"));
		assert!(store.nodes().all(|n| n.position().is_none()));

		Simulation::default().step(&mut store);
		for node in store.nodes() {
			let (x, y) = node.position().unwrap();
			assert!(x.is_finite() && y.is_finite());
		}
	}

	#[test]
	fn seeds_are_distinct() {
		let seeds: Vec<Body> = (0..16).map(seed).collect();
		for (i, a) in seeds.iter().enumerate() {
			for b in &seeds[i + 1..] {
				assert!((a.x - b.x).abs() + (a.y - b.y).abs() > 1e-3);
			}
		}
	}

	#[test]
	fn unlinked_nodes_repel() {
		let mut store = GraphStore::new();
		store.insert_node(host("h1"));
		place(&mut store, &[(-5.0, 0.0), (5.0, 0.0)]);

		Simulation::default().step(&mut store);
		assert!(distance(&store, ROOT_ID, "h1") > 10.0);
	}

	#[test]
	fn stretched_link_contracts() {
		let mut store = GraphStore::new();
		store.insert_node(host("h1"));
		store.insert_link(Link::new(ROOT_ID, "h1", HOST_LINK_STRENGTH));
		place(&mut store, &[(-500.0, 0.0), (500.0, 0.0)]);

		Simulation::default().step(&mut store);
		assert!(distance(&store, ROOT_ID, "h1") < 1000.0);
	}

	#[test]
	fn centering_pulls_a_lone_node_toward_origin() {
		let mut store = GraphStore::new();
		place(&mut store, &[(300.0, -300.0)]);

		Simulation::default().step(&mut store);
		let (x, y) = store.node(ROOT_ID).and_then(Node::position).unwrap();
		assert!(x < 300.0 && x > 0.0);
		assert!(y > -300.0 && y < 0.0);
	}

	#[test]
	fn energy_decays_and_restarts() {
		let mut store = GraphStore::new();
		let mut simulation = Simulation::default();
		for _ in 0..100 {
			simulation.step(&mut store);
		}
		let cooled = simulation.alpha();
		assert!(cooled < 1.0 && cooled > 0.0);

		simulation.step(&mut store);
		assert!(simulation.alpha() < cooled);

		simulation.restart();
		assert_eq!(simulation.alpha(), 1.0);
	}

	#[test]
	fn keeps_stepping_after_cooling() {
		let mut store = GraphStore::new();
		store.insert_node(host("h1"));
		let mut simulation = Simulation::default();
		for _ in 0..2000 {
			simulation.step(&mut store);
		}
		assert!(store.nodes().all(|n| n.position().is_some_and(|(x, y)| x.is_finite() && y.is_finite())));
	}

	#[test]
	fn step_changes_nothing_but_bodies() {
		let mut store = GraphStore::new();
		store.insert_node(host("h1"));
		store.insert_node(host("h2"));
		store.insert_link(Link::new(ROOT_ID, "h1", HOST_LINK_STRENGTH));
		let ids: Vec<_> = store.node_ids().cloned().collect();
		let links: Vec<_> = store.links().cloned().collect();

		let mut simulation = Simulation::default();
		for _ in 0..10 {
			simulation.step(&mut store);
		}
		assert_eq!(store.node_ids().cloned().collect::<Vec<_>>(), ids);
		assert_eq!(store.links().cloned().collect::<Vec<_>>(), links);
		assert_eq!(store.node("h1").map(Node::label), Some("h1"));
	}
}
