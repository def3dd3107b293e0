//! Snapshot flattening and the node-level diff against the graph store.

use std::collections::HashSet;

use log::debug;

use super::graph::{GraphStore, Node, NodeId, Payload, ROOT_ID, Role};
use super::types::Snapshot;

/// A node the snapshot wants in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
	pub id: NodeId,
	pub label: String,
	pub payload: Payload,
}

impl Candidate {
	pub fn role(&self) -> Role {
		self.payload.role()
	}

	pub fn into_node(self) -> Node {
		Node::new(self.id, self.label, self.payload)
	}
}

/// Nodes to drop from the store and candidates to insert into it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff {
	pub removed: Vec<NodeId>,
	pub added: Vec<Candidate>,
}

impl Diff {
	pub fn is_empty(&self) -> bool {
		self.removed.is_empty() && self.added.is_empty()
	}
}

/// One candidate per host followed by one per container on it.
///
/// Empty ids, the reserved root id and repeated ids are skipped so the
/// candidate list never carries two entries with the same identity.
pub fn flatten(snapshot: &Snapshot) -> Vec<Candidate> {
	let mut seen = HashSet::new();
	let mut candidates = Vec::new();
	let mut push = |candidate: Candidate| {
		let id = candidate.id.as_str();
		if id.is_empty() || id == ROOT_ID {
			debug!("skipping {:?} with reserved id {:?}", candidate.role(), id);
		} else if !seen.insert(candidate.id.clone()) {
			debug!("skipping duplicate id {}", id);
		} else {
			candidates.push(candidate);
		}
	};

	for host in &snapshot.nodes {
		push(Candidate {
			id: NodeId::new(host.id.as_str()),
			label: host.hostname.clone(),
			payload: Payload::Host(host.detached()),
		});
		for workload in &host.containers {
			push(Candidate {
				id: NodeId::new(workload.id.as_str()),
				label: workload.name.clone(),
				payload: Payload::Workload(workload.clone()),
			});
		}
	}
	candidates
}

/// Compares the store's node ids with `candidates`.
///
/// Nodes already present are left alone even if their payload changed.
pub fn diff(store: &GraphStore, candidates: Vec<Candidate>) -> Diff {
	let wanted: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
	let removed = store
		.node_ids()
		.filter(|id| id.as_str() != ROOT_ID && !wanted.contains(id.as_str()))
		.cloned()
		.collect();
	let added = candidates
		.into_iter()
		.filter(|c| !store.contains(c.id.as_str()))
		.collect();
	Diff { removed, added }
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::super::reconcile::reconcile;
	use super::super::types::{HostRecord, WorkloadRecord};
	use super::*;

	fn host(id: &str, workloads: &[&str]) -> HostRecord {
		HostRecord {
			id: id.into(),
			hostname: format!("{id}.local"),
			containers: workloads
				.iter()
				.map(|w| WorkloadRecord {
					id: (*w).into(),
					name: format!("{w}.1"),
					node_id: id.into(),
				})
				.collect(),
		}
	}

	fn ids(candidates: &[Candidate]) -> Vec<&str> {
		candidates.iter().map(|c| c.id.as_str()).collect()
	}

	#[test]
	fn flatten_orders_host_then_its_workloads() {
		let snapshot = Snapshot {
			nodes: vec![host("h1", &["w1", "w2"]), host("h2", &["w3"])],
		};
		let candidates = flatten(&snapshot);
		assert_eq!(ids(&candidates), vec!["h1", "w1", "w2", "h2", "w3"]);
		assert_eq!(candidates[0].role(), Role::Host);
		assert_eq!(candidates[0].label, "h1.local");
		assert_eq!(candidates[1].role(), Role::Workload);
		assert_eq!(candidates[1].payload.owner(), Some("h1"));
	}

	#[test]
	fn flatten_skips_empty_reserved_and_duplicate_ids() {
		let snapshot = Snapshot {
			nodes: vec![
				host("h1", &["", "w1", "w1"]),
				host(ROOT_ID, &[]),
				host("h1", &[]),
			],
		};
		assert_eq!(ids(&flatten(&snapshot)), vec!["h1", "w1"]);
	}

	#[test]
	fn diff_against_root_only_store_adds_everything() {
		let store = GraphStore::new();
		let result = diff(&store, flatten(&Snapshot { nodes: vec![host("h1", &[])] }));
		assert!(result.removed.is_empty());
		assert_eq!(ids(&result.added), vec!["h1"]);
	}

	#[test]
	fn diff_never_removes_root() {
		let store = GraphStore::new();
		let result = diff(&store, Vec::new());
		assert!(result.is_empty());
	}

	#[test]
	fn diff_reports_replaced_host() {
		let mut store = GraphStore::new();
		let first = diff(&store, flatten(&Snapshot { nodes: vec![host("h1", &[])] }));
		reconcile(&mut store, first);

		let result = diff(&store, flatten(&Snapshot { nodes: vec![host("h2", &[])] }));
		assert_eq!(result.removed, vec![NodeId::new("h1")]);
		assert_eq!(ids(&result.added), vec!["h2"]);
	}

	#[test]
	fn identical_snapshot_yields_empty_diff() {
		let snapshot = Snapshot {
			nodes: vec![host("h1", &["w1"]), host("h2", &[])],
		};
		let mut store = GraphStore::new();
		let first = diff(&store, flatten(&snapshot));
		reconcile(&mut store, first);
		assert!(diff(&store, flatten(&snapshot)).is_empty());
	}

	#[test]
	fn changed_payload_is_not_an_update() {
		let mut store = GraphStore::new();
		let first = diff(&store, flatten(&Snapshot { nodes: vec![host("h1", &[])] }));
		reconcile(&mut store, first);

		let mut renamed = host("h1", &[]);
		renamed.hostname = "renamed".into();
		let result = diff(&store, flatten(&Snapshot { nodes: vec![renamed] }));
		assert!(result.is_empty());
		assert_eq!(store.node("h1").map(Node::label), Some("h1.local"));
	}

	#[test]
	fn nothing_is_both_added_and_removed() {
		let mut store = GraphStore::new();
		let first = diff(&store, flatten(&Snapshot { nodes: vec![host("h1", &["w1"])] }));
		reconcile(&mut store, first);
		let result = diff(
			&store,
			flatten(&Snapshot {
				nodes: vec![host("h2", &["w1", "w2"])],
			}),
		);
		for removed in &result.removed {
			assert!(result.added.iter().all(|c| &c.id != removed));
		}
		assert_eq!(result.removed, vec![NodeId::new("h1")]);
		assert_eq!(ids(&result.added), vec!["h2", "w2"]);
	}

	#[test]
	fn large_diff_stays_linear() {
		let hosts = |range: std::ops::Range<usize>| {
			range
				.map(|i| {
					let workloads: Vec<String> = (0..9).map(|w| format!("w{i}-{w}")).collect();
					let refs: Vec<&str> = workloads.iter().map(String::as_str).collect();
					host(&format!("h{i}"), &refs)
				})
				.collect::<Vec<_>>()
		};
		let mut store = GraphStore::new();
		let first = diff(&store, flatten(&Snapshot { nodes: hosts(0..1000) }));
		reconcile(&mut store, first);
		assert_eq!(store.node_count(), 10_001);

		// Half the hosts replaced: 10k existing nodes against 10k candidates.
		let started = std::time::Instant::now();
		let result = diff(&store, flatten(&Snapshot { nodes: hosts(500..1500) }));
		let elapsed = started.elapsed();

		assert_eq!(result.removed.len(), 5_000);
		assert_eq!(result.added.len(), 5_000);
		// A pairwise scan is ~10^8 comparisons; hashed lookups finish far sooner.
		assert!(elapsed < std::time::Duration::from_secs(2), "{elapsed:?}");
	}
}
