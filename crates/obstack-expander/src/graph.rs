//! Usage edges between emitted resources.
//!
//! The edge set is a static template over [`StackNode`]s. Nodes are bound to
//! concrete resource names at expansion time, so a renamed release moves its
//! edges with it.

use indexmap::{IndexMap, IndexSet};
use obstack_core::{
    ComponentKind, ComponentSet, DatasourceKind, GraphError, ObjectMeta, ResourceRef,
    StackObject, UsageProtection,
};

use crate::merge::ResolvedComponent;
use crate::objects::object_name;

/// A node of the usage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackNode {
    Release(ComponentKind),
    Object(StackObject),
}

/// `by` keeps `of` from being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageEdge {
    pub of: StackNode,
    pub by: StackNode,
}

const fn uses(by: StackNode, of: StackNode) -> UsageEdge {
    UsageEdge { of, by }
}

const GRAFANA: StackNode = StackNode::Object(StackObject::GrafanaInstance);

/// Every usage edge of a stack.
pub const USAGE_EDGES: [UsageEdge; 8] = [
    uses(StackNode::Object(StackObject::Datasource(DatasourceKind::Prometheus)), GRAFANA),
    uses(StackNode::Object(StackObject::Datasource(DatasourceKind::Loki)), GRAFANA),
    uses(StackNode::Object(StackObject::Datasource(DatasourceKind::Tempo)), GRAFANA),
    uses(GRAFANA, StackNode::Release(ComponentKind::GrafanaOperator)),
    uses(
        StackNode::Release(ComponentKind::GrafanaOperator),
        StackNode::Release(ComponentKind::KubePrometheusStack),
    ),
    uses(
        StackNode::Release(ComponentKind::K8sMonitoring),
        StackNode::Release(ComponentKind::KubePrometheusStack),
    ),
    uses(
        StackNode::Release(ComponentKind::K8sMonitoring),
        StackNode::Release(ComponentKind::Loki),
    ),
    uses(
        StackNode::Release(ComponentKind::K8sMonitoring),
        StackNode::Release(ComponentKind::Tempo),
    ),
];

/// Directed graph of usage edges, `by -> of`.
#[derive(Debug, Clone, Default)]
pub struct UsageGraph {
    /// Outgoing edges per node, in insertion order.
    edges: IndexMap<ResourceRef, Vec<ResourceRef>>,
}

impl UsageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: ResourceRef) {
        self.edges.entry(node).or_default();
    }

    pub fn add_edge(&mut self, by: ResourceRef, of: ResourceRef) {
        self.edges.entry(by).or_default().push(of.clone());
        self.add_node(of);
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Fail with the first cycle found.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut done = IndexSet::new();
        let mut stack = Vec::new();
        for node in self.edges.keys() {
            self.visit(node, &mut stack, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        node: &'a ResourceRef,
        stack: &mut Vec<&'a ResourceRef>,
        done: &mut IndexSet<&'a ResourceRef>,
    ) -> Result<(), GraphError> {
        if done.contains(node) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.name.clone()).collect();
            cycle.push(node.name.clone());
            return Err(GraphError::Cycle { cycle });
        }

        stack.push(node);
        for next in self.edges.get(node).into_iter().flatten() {
            self.visit(next, stack, done)?;
        }
        stack.pop();
        done.insert(node);
        Ok(())
    }

    /// Order in which resources can be deleted: every `by` comes before
    /// each of its `of` targets.
    pub fn deletion_order(&self) -> Result<Vec<ResourceRef>, GraphError> {
        self.check_acyclic()?;

        let mut incoming: IndexMap<&ResourceRef, usize> =
            self.edges.keys().map(|node| (node, 0)).collect();
        for targets in self.edges.values() {
            for of in targets {
                if let Some(count) = incoming.get_mut(of) {
                    *count += 1;
                }
            }
        }

        let mut ready: Vec<&ResourceRef> = incoming
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();
        ready.reverse();

        let mut order = Vec::with_capacity(self.edges.len());
        while let Some(node) = ready.pop() {
            order.push(node.clone());
            let mut released = Vec::new();
            for of in self.edges.get(node).into_iter().flatten() {
                if let Some(count) = incoming.get_mut(of) {
                    *count -= 1;
                    if *count == 0 {
                        released.push(of);
                    }
                }
            }
            released.reverse();
            ready.extend(released);
        }
        Ok(order)
    }
}

/// Bind [`USAGE_EDGES`] to the resolved resource names.
pub fn build_usage_edges(
    cluster_name: &str,
    components: &ComponentSet<ResolvedComponent>,
    labels: &IndexMap<String, String>,
) -> Result<Vec<UsageProtection>, GraphError> {
    let resolve = |node: StackNode| match node {
        StackNode::Release(kind) => ResourceRef::release(&components.get(kind).identity.name),
        StackNode::Object(object) => ResourceRef::object(object_name(cluster_name, object)),
    };

    let mut graph = UsageGraph::new();
    let mut usages = Vec::with_capacity(USAGE_EDGES.len());
    for edge in USAGE_EDGES {
        let of = resolve(edge.of);
        let by = resolve(edge.by);
        graph.add_edge(by.clone(), of.clone());
        usages.push(UsageProtection {
            metadata: ObjectMeta {
                name: format!("{}-uses-{}", by.name, of.name),
                labels: labels.clone(),
            },
            of,
            by,
            replay_deletion: true,
        });
    }
    graph.check_acyclic()?;

    Ok(usages)
}

/// Build a graph from emitted usages, checking that every endpoint exists.
pub fn usage_graph<'a>(
    resources: impl IntoIterator<Item = ResourceRef>,
    usages: impl IntoIterator<Item = &'a UsageProtection>,
) -> Result<UsageGraph, GraphError> {
    let mut graph = UsageGraph::new();
    let known: IndexSet<ResourceRef> = resources.into_iter().collect();
    for node in &known {
        graph.add_node(node.clone());
    }
    for usage in usages {
        for endpoint in [&usage.of, &usage.by] {
            if !known.contains(endpoint) {
                return Err(GraphError::UnknownResource {
                    name: endpoint.name.clone(),
                });
            }
        }
        graph.add_edge(usage.by.clone(), usage.of.clone());
    }
    Ok(graph)
}
