//! Expansion pipeline.
//!
//! Runs the stages in order:
//! 1. Defaulting and validation
//! 2. Wiring resolution
//! 3. Values materialization per release
//! 4. Grafana object rendering
//! 5. Usage edge binding and graph checks
//!
//! Any error aborts the whole expansion; there is no partial output.

use obstack_core::{
    Expansion, GraphError, HelmRelease, ObjectMeta, OutputResource, ResourceRef, StackError,
    StackSpec,
};
use tracing::{debug, info, instrument};

use crate::graph::{build_usage_edges, usage_graph};
use crate::merge::resolve_components;
use crate::objects::render_objects;
use crate::ChartRegistry;

/// Expands stack documents against a chart registry.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    registry: ChartRegistry,
}

impl Expander {
    pub fn new(registry: ChartRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Expand a stack document into its full resource set.
    #[instrument(skip_all, fields(cluster = spec.cluster_name.as_deref().unwrap_or("")))]
    pub fn expand(&self, spec: &StackSpec) -> Result<Expansion, StackError> {
        let stack = obstack_resolver::resolve(spec)?;
        let components = resolve_components(&stack, &self.registry)?;
        let defaulted = &stack.spec;

        let mut resources = Vec::new();

        for (_, component) in components.iter() {
            resources.push(OutputResource::HelmRelease(HelmRelease {
                component: component.identity.kind,
                metadata: ObjectMeta {
                    name: component.identity.name.clone(),
                    labels: defaulted.labels.clone(),
                },
                chart: component.chart,
                namespace: component.identity.namespace.clone(),
                values: component.values.clone(),
                provider_config_ref: defaulted.helm_provider_config_ref.clone(),
                management_policies: defaulted.management_policies.clone(),
            }));
        }

        resources.extend(
            render_objects(defaulted, &stack.wiring)
                .into_iter()
                .map(OutputResource::KubernetesObject),
        );

        let usages = build_usage_edges(&defaulted.cluster_name, &components, &defaulted.labels)?;
        // acyclicity is checked by build_usage_edges; this checks the endpoints
        let graph = usage_graph(resources.iter().map(OutputResource::resource_ref), &usages)?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "bound usage graph"
        );

        resources.extend(usages.into_iter().map(OutputResource::UsageProtection));

        let expansion = Expansion { resources };
        info!(
            releases = expansion.releases().count(),
            objects = expansion.objects().count(),
            usages = expansion.usages().count(),
            "expanded stack"
        );
        Ok(expansion)
    }
}

/// Deletion order of the resources in an expansion, dependents first.
pub fn deletion_order(expansion: &Expansion) -> Result<Vec<ResourceRef>, GraphError> {
    let nodes = expansion
        .iter()
        .filter(|r| !matches!(r, OutputResource::UsageProtection(_)))
        .map(OutputResource::resource_ref);
    usage_graph(nodes, expansion.usages())?.deletion_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use obstack_core::{lookup, ComponentKind, Mapping, StackObject, ValidationError, Value};

    #[test]
    fn test_expand_minimal_spec() {
        let expansion = Expander::default().expand(&StackSpec::for_cluster("prod")).unwrap();

        assert_eq!(expansion.releases().count(), 5);
        assert_eq!(expansion.objects().count(), 4);
        assert_eq!(expansion.usages().count(), 8);
        assert_eq!(expansion.len(), 17);
    }

    #[test]
    fn test_emission_order() {
        let expansion = Expander::default().expand(&StackSpec::for_cluster("prod")).unwrap();
        let kinds: Vec<_> = expansion.releases().map(|r| r.component).collect();
        assert_eq!(kinds, ComponentKind::ALL);
        assert!(matches!(expansion.resources[5], OutputResource::KubernetesObject(_)));
        assert!(matches!(expansion.resources[9], OutputResource::UsageProtection(_)));
    }

    #[test]
    fn test_validation_error_aborts() {
        let result = Expander::default().expand(&StackSpec::default());
        assert!(matches!(
            result,
            Err(StackError::Validation(ValidationError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_merge_error_aborts() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.component_mut(ComponentKind::Loki)
            .values
            .insert("singleBinary".to_string(), Value::Int(3));

        let result = Expander::default().expand(&spec);
        assert!(matches!(result, Err(StackError::Merge(_))));
    }

    #[test]
    fn test_custom_registry() {
        let registry = ChartRegistry::empty();
        let expansion = Expander::new(registry).expand(&StackSpec::for_cluster("prod")).unwrap();

        // Only wiring remains without chart defaults.
        let operator = expansion.release(ComponentKind::GrafanaOperator).unwrap();
        assert_eq!(operator.values, Mapping::new());
        let loki = expansion.release(ComponentKind::Loki).unwrap();
        assert_eq!(loki.values.len(), 1);
    }

    #[test]
    fn test_labels_and_provider_refs() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.labels.insert("team".to_string(), "platform".to_string());

        let expansion = Expander::default().expand(&spec).unwrap();
        for resource in expansion.iter() {
            assert_eq!(resource.metadata().labels["team"], "platform");
        }
        let release = expansion.release(ComponentKind::Tempo).unwrap();
        assert_eq!(release.provider_config_ref.name, "prod");
        let object = expansion.object(StackObject::GrafanaInstance).unwrap();
        assert_eq!(object.management_policies, vec!["*".to_string()]);
    }

    #[test]
    fn test_deletion_order_covers_releases_and_objects() {
        let expansion = Expander::default().expand(&StackSpec::for_cluster("prod")).unwrap();
        let order = deletion_order(&expansion).unwrap();
        assert_eq!(order.len(), 9);
        assert_eq!(order.last().map(|r| r.kind.as_str()), Some("Release"));
    }

    #[test]
    fn test_usages_bind_to_emitted_resources() {
        let expansion = Expander::default().expand(&StackSpec::for_cluster("prod")).unwrap();
        let nodes = expansion
            .iter()
            .filter(|r| !matches!(r, OutputResource::UsageProtection(_)))
            .map(OutputResource::resource_ref);

        let graph = usage_graph(nodes, expansion.usages()).unwrap();
        assert_eq!(graph.node_count(), 9);
        assert_eq!(graph.edge_count(), 8);
        assert!(graph.check_acyclic().is_ok());
    }

    #[test]
    fn test_release_manifest_carries_values() {
        let expansion = Expander::default().expand(&StackSpec::for_cluster("prod")).unwrap();
        let manifest = expansion.resources[2].to_manifest();
        assert_eq!(
            manifest.pointer("spec.forProvider.values.fullnameOverride"),
            Some(&Value::from("tempo"))
        );
        let tempo = expansion.release(ComponentKind::Tempo).unwrap();
        assert!(lookup(&tempo.values, "tempo.metricsGenerator.enabled").is_some());
    }
}
