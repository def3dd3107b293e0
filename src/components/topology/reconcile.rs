//! Applies a [`Diff`] to the graph store and derives links for new nodes.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::diff::Diff;
use super::graph::{
	GraphStore, HOST_LINK_STRENGTH, Link, Node, NodeId, Payload, ROOT_ID, Role,
	WORKLOAD_LINK_STRENGTH,
};

/// What a reconciliation changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	pub removed_nodes: usize,
	pub removed_links: usize,
	pub added_nodes: usize,
	pub added_links: usize,
	/// Added workloads whose owning host is not in the store.
	pub orphans: usize,
}

/// Removes, then inserts, then links.
///
/// Removal runs first so link derivation never sees a node that is about to
/// go away. A workload links to its owning host only if a host with that id
/// is present after insertion; otherwise it stays unlinked until the host is
/// added, at which point the host adopts it.
pub fn reconcile(store: &mut GraphStore, diff: Diff) -> ReconcileReport {
	let mut report = ReconcileReport::default();

	for id in &diff.removed {
		if let Some(links) = store.remove_node(id.as_str()) {
			report.removed_nodes += 1;
			report.removed_links += links;
		}
	}

	let mut added = Vec::with_capacity(diff.added.len());
	for candidate in diff.added {
		let id = candidate.id.clone();
		let payload = candidate.payload.clone();
		if store.insert_node(candidate.into_node()) {
			report.added_nodes += 1;
			added.push((id, payload));
		}
	}

	let mut waiting = unlinked_workloads(store, &added);
	for (id, payload) in &added {
		match payload {
			Payload::Workload(workload) => {
				let owner = workload.node_id.as_str();
				if is_host(store, owner) {
					report.added_links += link(store, owner, id, WORKLOAD_LINK_STRENGTH);
				} else {
					report.orphans += 1;
				}
			}
			Payload::Host(host) => {
				report.added_links += link(store, ROOT_ID, id, HOST_LINK_STRENGTH);
				let adopted = waiting.remove(id.as_str()).unwrap_or_default();
				if !adopted.is_empty() {
					debug!("host {} ({}) adopts {} workloads", id, host.hostname, adopted.len());
				}
				for workload in adopted {
					report.added_links += link(store, id.as_str(), &workload, WORKLOAD_LINK_STRENGTH);
				}
			}
			Payload::Root => {}
		}
	}

	report
}

fn is_host(store: &GraphStore, id: &str) -> bool {
	store.node(id).map(Node::role) == Some(Role::Host)
}

fn link(store: &mut GraphStore, source: &str, target: &NodeId, strength: f64) -> usize {
	usize::from(store.insert_link(Link::new(source, target.clone(), strength)))
}

/// Workloads from earlier cycles that have no link yet, grouped by the host
/// they declare as owner.
fn unlinked_workloads(
	store: &GraphStore,
	added: &[(NodeId, Payload)],
) -> HashMap<String, Vec<NodeId>> {
	let fresh: HashSet<&NodeId> = added.iter().map(|(id, _)| id).collect();
	let linked: HashSet<&NodeId> = store.links().map(|link| link.target()).collect();
	let mut waiting: HashMap<String, Vec<NodeId>> = HashMap::new();
	for node in store.nodes() {
		let Some(owner) = node.payload().owner() else {
			continue;
		};
		if !fresh.contains(node.id()) && !linked.contains(node.id()) {
			waiting
				.entry(owner.to_owned())
				.or_default()
				.push(node.id().clone());
		}
	}
	waiting
}
