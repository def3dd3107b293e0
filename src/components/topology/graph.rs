//! Identity keying and the graph store shared by the reconciler, the layout
//! simulation and the renderer.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;

use super::types::{HostRecord, WorkloadRecord};

/// Identity of the swarm root node.
pub const ROOT_ID: &str = "swarm";
/// Display label of the swarm root node.
pub const ROOT_LABEL: &str = "Swarm";
/// Spring strength of root → host links.
pub const HOST_LINK_STRENGTH: f64 = 50.0;
/// Spring strength of host → workload links.
pub const WORKLOAD_LINK_STRENGTH: f64 = 25.0;

/// Stable identity of a node, taken verbatim from the record it was
/// derived from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for NodeId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identity of a directed link: the ordered pair of its endpoint ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkId {
	pub source: NodeId,
	pub target: NodeId,
}

impl LinkId {
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source.as_str() == id || self.target.as_str() == id
	}
}

impl fmt::Display for LinkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.source, self.target)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
	Root,
	Host,
	Workload,
}

/// The raw record a node was derived from. Only consulted to re-derive
/// topology, never for identity comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	Root,
	Host(HostRecord),
	Workload(WorkloadRecord),
}

impl Payload {
	pub fn role(&self) -> Role {
		match self {
			Payload::Root => Role::Root,
			Payload::Host(_) => Role::Host,
			Payload::Workload(_) => Role::Workload,
		}
	}

	/// Declared owning host of a workload.
	pub fn owner(&self) -> Option<&str> {
		match self {
			Payload::Workload(workload) => Some(&workload.node_id),
			_ => None,
		}
	}
}

/// Position and velocity integrated by the layout simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
}

#[derive(Clone, Debug)]
pub struct Node {
	id: NodeId,
	label: String,
	payload: Payload,
	/// `None` until the simulation places the node.
	pub(crate) body: Option<Body>,
}

impl Node {
	pub fn new(id: impl Into<NodeId>, label: impl Into<String>, payload: Payload) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			payload,
			body: None,
		}
	}

	pub fn root() -> Self {
		Self::new(ROOT_ID, ROOT_LABEL, Payload::Root)
	}

	pub fn id(&self) -> &NodeId {
		&self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn role(&self) -> Role {
		self.payload.role()
	}

	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	pub fn body(&self) -> Option<&Body> {
		self.body.as_ref()
	}

	pub fn position(&self) -> Option<(f64, f64)> {
		self.body().map(|b| (b.x, b.y))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	id: LinkId,
	strength: f64,
}

impl Link {
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, strength: f64) -> Self {
		Self {
			id: LinkId::new(source, target),
			strength,
		}
	}

	pub fn id(&self) -> &LinkId {
		&self.id
	}

	pub fn source(&self) -> &NodeId {
		&self.id.source
	}

	pub fn target(&self) -> &NodeId {
		&self.id.target
	}

	pub fn strength(&self) -> f64 {
		self.strength
	}
}

/// Current nodes and links, in insertion order.
///
/// Node ids are unique, every link endpoint is a node in the store, and the
/// root node is always present. Mutation is crate-private so only the
/// reconciler and the simulation can change the store.
#[derive(Clone, Debug)]
pub struct GraphStore {
	nodes: IndexMap<NodeId, Node>,
	links: IndexMap<LinkId, Link>,
}

impl Default for GraphStore {
	fn default() -> Self {
		Self::new()
	}
}

impl GraphStore {
	/// A store holding only the root node.
	pub fn new() -> Self {
		let mut nodes = IndexMap::new();
		let root = Node::root();
		nodes.insert(root.id.clone(), root);
		Self {
			nodes,
			links: IndexMap::new(),
		}
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.nodes.get_index_of(id)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
		self.nodes.keys()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn link(&self, id: &LinkId) -> Option<&Link> {
		self.links.get(id)
	}

	pub fn links(&self) -> impl Iterator<Item = &Link> {
		self.links.values()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Inserts `node` unless its id is already taken.
	pub(crate) fn insert_node(&mut self, node: Node) -> bool {
		if self.nodes.contains_key(node.id.as_str()) {
			return false;
		}
		self.nodes.insert(node.id.clone(), node);
		true
	}

	/// Removes a node together with every link touching it. Returns the
	/// number of links removed, or `None` if nothing was removed. The root
	/// is never removed.
	pub(crate) fn remove_node(&mut self, id: &str) -> Option<usize> {
		if id == ROOT_ID {
			return None;
		}
		self.nodes.shift_remove(id)?;
		let before = self.links.len();
		self.links.retain(|link, _| !link.touches(id));
		Some(before - self.links.len())
	}

	/// Inserts `link` if both endpoints exist and the id is not taken.
	pub(crate) fn insert_link(&mut self, link: Link) -> bool {
		if self.link(&link.id).is_some()
			|| !self.contains(link.source().as_str())
			|| !self.contains(link.target().as_str())
		{
			return false;
		}
		self.links.insert(link.id.clone(), link);
		true
	}

	pub(crate) fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Option<Body>> {
		self.nodes.values_mut().map(|node| &mut node.body)
	}
}
