//! Live swarm topology rendered as a force-directed graph.
//!
//! Snapshots polled from the backend are flattened into candidate nodes,
//! diffed against the `GraphStore` and reconciled into it. A continuous
//! `Simulation` lays the store out, and `RenderSync` keeps one circle,
//! one label and one line primitive per node and link in a retained
//! `RetainedScene` that is painted onto the canvas every frame.
//!
//! # Example
//!
//! ```ignore
//! use crate::components::topology::TopologyCanvas;
//!
//! view! { <TopologyCanvas endpoint="/api/aggregate/" fullscreen=true /> }
//! ```

mod component;
mod diff;
mod graph;
mod poll;
mod reconcile;
mod render;
mod scene;
mod simulation;
mod state;
mod sync;
mod types;

pub use component::TopologyCanvas;
