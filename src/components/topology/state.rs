use log::{debug, error, info};

use super::diff::{diff, flatten};
use super::graph::GraphStore;
use super::poll::FetchError;
use super::reconcile::{ReconcileReport, reconcile};
use super::scene::{RetainedScene, Scene};
use super::simulation::Simulation;
use super::sync::RenderSync;
use super::types::Snapshot;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything the canvas component drives: the graph, its layout and the
/// primitives drawn for it.
pub struct TopologyState {
	pub store: GraphStore,
	pub simulation: Simulation,
	pub sync: RenderSync<usize>,
	pub scene: RetainedScene,
	pub transform: ViewTransform,
	pub pan: PanState,
}

impl TopologyState {
	pub fn new(width: f64, height: f64) -> Self {
		let store = GraphStore::new();
		let mut scene = RetainedScene::new(width, height);
		let mut sync = RenderSync::new();
		sync.rebind(&store, &mut scene);

		let mut state = Self {
			store,
			simulation: Simulation::default(),
			sync,
			scene,
			transform: ViewTransform::default(),
			pan: PanState::default(),
		};
		state.center();
		state
	}

	/// Puts the layout origin in the middle of the viewport at unit zoom.
	pub fn center(&mut self) {
		let (width, height) = self.scene.viewport();
		self.transform = ViewTransform {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		};
	}

	/// Reconciles the graph with `snapshot`. An empty diff changes nothing:
	/// no rebind and no simulation restart.
	pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Option<ReconcileReport> {
		let diff = diff(&self.store, flatten(snapshot));
		if diff.is_empty() {
			debug!(
				"snapshot unchanged ({} nodes, {} links)",
				self.store.node_count(),
				self.store.link_count()
			);
			return None;
		}

		let report = reconcile(&mut self.store, diff);
		let bound = self.sync.rebind(&self.store, &mut self.scene);
		self.simulation.restart();
		info!(
			"reconciled: +{} -{} nodes, +{} -{} links, {} orphaned, primitives {} entered, {} updated, {} exited, {} live",
			report.added_nodes,
			report.removed_nodes,
			report.added_links,
			report.removed_links,
			report.orphans,
			bound.entered,
			bound.updated,
			bound.exited,
			self.scene.len(),
		);
		Some(report)
	}

	/// Handles one resolved fetch. Failures are logged and leave the graph
	/// untouched.
	pub fn on_fetch(&mut self, result: Result<Snapshot, FetchError>) -> Option<ReconcileReport> {
		match result {
			Ok(snapshot) => self.apply_snapshot(&snapshot),
			Err(err) => {
				error!("snapshot fetch failed, retrying: {err}");
				None
			}
		}
	}

	/// One animation frame: integrate the layout and project it.
	pub fn tick(&mut self) {
		self.simulation.step(&mut self.store);
		self.sync.project(&self.store, &mut self.scene);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.scene.resize(width, height);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, x: f64, y: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zooms around the screen point `(x, y)`, keeping it fixed.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let (gx, gy) = self.screen_to_graph(x, y);
		self.transform.x = x - gx * new_k;
		self.transform.y = y - gy * new_k;
		self.transform.k = new_k;
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::super::graph::{LinkId, NodeId, ROOT_ID};
	use super::super::scene::Placement;
	use super::super::types::{HostRecord, WorkloadRecord};
	use super::*;

	fn snapshot() -> Snapshot {
		Snapshot {
			nodes: vec![HostRecord {
				id: "h1".into(),
				hostname: "alpha".into(),
				containers: vec![WorkloadRecord {
					id: "w1".into(),
					name: "web.1".into(),
					node_id: "h1".into(),
				}],
			}],
		}
	}

	fn shape(state: &TopologyState) -> (Vec<NodeId>, Vec<LinkId>) {
		(
			state.store.node_ids().cloned().collect(),
			state.store.links().map(|l| l.id().clone()).collect(),
		)
	}

	#[test]
	fn starts_with_root_centered_in_viewport() {
		let state = TopologyState::new(800.0, 600.0);
		assert_eq!(state.store.node_count(), 1);
		assert_eq!(
			state.transform,
			ViewTransform {
				x: 400.0,
				y: 300.0,
				k: 1.0
			}
		);
		assert_eq!(state.scene.len(), 2);
		assert_eq!(state.screen_to_graph(400.0, 300.0), (0.0, 0.0));
	}

	#[test]
	fn identical_snapshot_neither_mutates_nor_restarts() {
		let mut state = TopologyState::new(800.0, 600.0);
		assert!(state.apply_snapshot(&snapshot()).is_some());
		for _ in 0..50 {
			state.tick();
		}
		let cooled = state.simulation.alpha();
		let before = shape(&state);
		let primitives = state.scene.len();

		assert_eq!(state.apply_snapshot(&snapshot()), None);
		assert_eq!(state.simulation.alpha(), cooled);
		assert_eq!(shape(&state), before);
		assert_eq!(state.scene.len(), primitives);
	}

	#[test]
	fn non_empty_reconciliation_restarts_the_layout() {
		let mut state = TopologyState::new(800.0, 600.0);
		for _ in 0..50 {
			state.tick();
		}
		assert!(state.simulation.alpha() < 1.0);

		state.apply_snapshot(&snapshot());
		assert_eq!(state.simulation.alpha(), 1.0);
		assert_eq!(state.scene.len(), 3 + 3 + 2);
	}

	#[test]
	fn failures_cause_no_drift() {
		let mut retried = TopologyState::new(800.0, 600.0);
		assert_eq!(retried.on_fetch(Err(FetchError::Status(502))), None);
		assert_eq!(
			retried.on_fetch(Err(FetchError::Transport("offline".into()))),
			None
		);
		assert_eq!(shape(&retried), (vec![NodeId::new(ROOT_ID)], vec![]));
		retried.on_fetch(Ok(snapshot()));

		let mut direct = TopologyState::new(800.0, 600.0);
		direct.on_fetch(Ok(snapshot()));

		assert_eq!(shape(&retried), shape(&direct));
	}

	#[test]
	fn malformed_snapshot_is_a_failed_fetch() {
		let mut state = TopologyState::new(800.0, 600.0);
		let err = serde_json::from_str::<Snapshot>("not json").unwrap_err();
		assert_eq!(state.on_fetch(Err(err.into())), None);
		assert_eq!(state.store.node_count(), 1);
	}

	#[test]
	fn tick_positions_primitives() {
		let mut state = TopologyState::new(800.0, 600.0);
		state.apply_snapshot(&snapshot());
		state.tick();
		assert!(
			state
				.scene
				.primitives()
				.all(|p| p.placement != Placement::Hidden)
		);
	}

	#[test]
	fn pan_and_zoom_move_the_view() {
		let mut state = TopologyState::new(800.0, 600.0);
		state.begin_pan(10.0, 10.0);
		state.pan_to(30.0, 5.0);
		state.end_pan();
		state.pan_to(100.0, 100.0);
		assert_eq!((state.transform.x, state.transform.y), (420.0, 295.0));

		let anchor = state.screen_to_graph(100.0, 100.0);
		state.zoom_at(100.0, 100.0, -1.0);
		assert!((state.transform.k - 1.1).abs() < 1e-9);
		let (gx, gy) = state.screen_to_graph(100.0, 100.0);
		assert!((gx - anchor.0).abs() < 1e-9 && (gy - anchor.1).abs() < 1e-9);

		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 1.0);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
	}
}
