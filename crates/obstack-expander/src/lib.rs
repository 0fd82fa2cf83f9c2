//! Expansion of stack documents into releases, objects, and usage edges.
//!
//! This crate handles:
//! - Chart default values
//! - Values materialization and override precedence
//! - Grafana instance and datasource objects
//! - Usage edges and deletion ordering

mod expander;
mod graph;
mod merge;
mod objects;
mod registry;

pub use expander::{deletion_order, Expander};
pub use graph::{build_usage_edges, usage_graph, StackNode, UsageEdge, UsageGraph, USAGE_EDGES};
pub use merge::{materialize, resolve_components, ResolvedComponent};
pub use objects::{object_name, render_objects};
pub use registry::{ChartDefaults, ChartRegistry};

use obstack_core::{Expansion, StackError, StackSpec};

/// Expand a stack document using the built-in chart registry.
pub fn expand(spec: &StackSpec) -> Result<Expansion, StackError> {
    Expander::default().expand(spec)
}
