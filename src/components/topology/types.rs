//! Snapshot records as served by the swarm aggregate endpoint.

use serde::Deserialize;

/// One polled view of the swarm: every worker node with the containers
/// scheduled on it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Snapshot {
	/// Worker nodes. The backend omits the field when the swarm is empty.
	#[serde(default)]
	pub nodes: Vec<HostRecord>,
}

/// A machine participating in the swarm.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HostRecord {
	/// Swarm node id, globally unique.
	pub id: String,
	/// Display name.
	pub hostname: String,
	/// Containers placed on this host. Omitted when there are none.
	#[serde(default)]
	pub containers: Vec<WorkloadRecord>,
}

/// A container running on a host.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WorkloadRecord {
	/// Container id. Empty while the task has not started a container yet.
	pub id: String,
	/// Display name, `<service alias>.<slot>`.
	pub name: String,
	/// Id of the host this container is scheduled on.
	#[serde(rename = "nodeId")]
	pub node_id: String,
}

impl HostRecord {
	/// Copy of the record without its nested containers, kept as a node
	/// payload.
	pub fn detached(&self) -> Self {
		Self {
			id: self.id.clone(),
			hostname: self.hostname.clone(),
			containers: Vec::new(),
		}
	}
}
