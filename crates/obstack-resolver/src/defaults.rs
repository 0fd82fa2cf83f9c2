//! Default application.
//!
//! Fills every optional field of a [`StackSpec`] and validates the names
//! that end up inside DNS hosts.

use obstack_core::{
    constants::{DEFAULT_MANAGEMENT_POLICY, DEFAULT_NAMESPACE},
    ComponentIdentity, ComponentKind, ComponentSet, DefaultedComponent, DefaultedSpec,
    ProviderConfigRefSpec, ProviderRef, StackSpec, ValidationError,
};
use tracing::debug;

/// Maximum length of an RFC 1123 label.
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of an RFC 1123 subdomain.
const MAX_SUBDOMAIN_LEN: usize = 253;

/// Helm rejects longer release names.
const MAX_RELEASE_NAME_LEN: usize = 53;

/// kube-prometheus-stack truncates its fullname to this length, and the
/// Prometheus service is `{name}-prometheus`.
const MAX_PROMETHEUS_STACK_NAME_LEN: usize = 26;

/// Longest cluster name that keeps every derived usage name within a
/// subdomain. The longest is
/// `{cluster}-datasource-prometheus-uses-{cluster}-grafana-instance`.
const MAX_CLUSTER_NAME_LEN: usize = (MAX_SUBDOMAIN_LEN
    - "-datasource-prometheus-uses-".len()
    - "-grafana-instance".len())
    / 2;

/// Apply defaults to a stack document.
pub fn apply_defaults(spec: &StackSpec) -> Result<DefaultedSpec, ValidationError> {
    let cluster_name = match spec.cluster_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(ValidationError::MissingField { field: "clusterName" }),
    };
    validate_subdomain("clusterName", &cluster_name)?;
    if cluster_name.len() > MAX_CLUSTER_NAME_LEN {
        return Err(ValidationError::InvalidName {
            field: "clusterName".to_string(),
            value: cluster_name,
            reason: "must be at most 104 characters",
        });
    }

    let namespace = spec
        .namespace
        .clone()
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    validate_label("namespace", &namespace)?;

    let management_policies = spec
        .management_policies
        .clone()
        .unwrap_or_else(|| vec![DEFAULT_MANAGEMENT_POLICY.to_string()]);

    let helm_provider_config_ref =
        default_provider_ref(spec.helm_provider_config_ref.as_ref(), &cluster_name);
    let kubernetes_provider_config_ref =
        default_provider_ref(spec.kubernetes_provider_config_ref.as_ref(), &cluster_name);

    let components = spec.components.try_map(|kind, component| -> Result<_, ValidationError> {
        let name = component
            .name
            .clone()
            .unwrap_or_else(|| kind.default_name().to_string());
        validate_release_name(kind, &name)?;

        let component_namespace = component
            .namespace
            .clone()
            .unwrap_or_else(|| namespace.clone());
        validate_label(&format!("{kind}.namespace"), &component_namespace)?;

        debug!(component = %kind, %name, namespace = %component_namespace, "defaulted component");

        Ok(DefaultedComponent {
            identity: ComponentIdentity {
                kind,
                name,
                namespace: component_namespace,
            },
            values: component.values.clone(),
            override_all_values: component.override_all_values.clone(),
        })
    })?;

    check_unique_release_names(&components)?;

    Ok(DefaultedSpec {
        cluster_name,
        namespace,
        labels: spec.labels.clone(),
        management_policies,
        helm_provider_config_ref,
        kubernetes_provider_config_ref,
        components,
    })
}

fn default_provider_ref(spec: Option<&ProviderConfigRefSpec>, cluster_name: &str) -> ProviderRef {
    ProviderRef {
        name: spec
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| cluster_name.to_string()),
        kind: spec.and_then(|s| s.kind).unwrap_or_default(),
    }
}

/// Releases are cluster-scoped, so release names must not collide.
fn check_unique_release_names(
    components: &ComponentSet<DefaultedComponent>,
) -> Result<(), ValidationError> {
    let all: Vec<_> = components.iter().collect();
    for (i, (first, a)) in all.iter().enumerate() {
        for (second, b) in &all[i + 1..] {
            if a.identity.name == b.identity.name {
                return Err(ValidationError::DuplicateRelease {
                    first: first.to_string(),
                    second: second.to_string(),
                    name: a.identity.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_release_name(kind: ComponentKind, name: &str) -> Result<(), ValidationError> {
    let field = format!("{kind}.name");
    validate_label(&field, name)?;

    let (max, reason) = match kind {
        ComponentKind::KubePrometheusStack => (
            MAX_PROMETHEUS_STACK_NAME_LEN,
            "must be at most 26 characters for kube-prometheus-stack",
        ),
        _ => (MAX_RELEASE_NAME_LEN, "must be at most 53 characters"),
    };
    if name.len() > max {
        return Err(ValidationError::InvalidName {
            field,
            value: name.to_string(),
            reason,
        });
    }
    Ok(())
}

fn validate_label(field: &str, value: &str) -> Result<(), ValidationError> {
    if let Some(reason) = label_violation(value) {
        return Err(ValidationError::InvalidName {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        });
    }
    Ok(())
}

fn validate_subdomain(field: &str, value: &str) -> Result<(), ValidationError> {
    let reason = if value.len() > MAX_SUBDOMAIN_LEN {
        Some("must be at most 253 characters")
    } else {
        value.split('.').find_map(label_violation)
    };
    match reason {
        Some(reason) => Err(ValidationError::InvalidName {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn label_violation(value: &str) -> Option<&'static str> {
    let bytes = value.as_bytes();
    if bytes.is_empty() {
        return Some("must not be empty");
    }
    if bytes.len() > MAX_LABEL_LEN {
        return Some("must be at most 63 characters");
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    {
        return Some("must consist of lowercase alphanumerics and '-'");
    }
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return Some("must start and end with an alphanumeric character");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use obstack_core::ProviderConfigKind;

    #[test]
    fn test_minimal_spec_defaults() {
        let defaulted = apply_defaults(&StackSpec::for_cluster("prod")).unwrap();

        assert_eq!(defaulted.namespace, "monitoring");
        assert_eq!(defaulted.management_policies, vec!["*".to_string()]);
        assert_eq!(defaulted.helm_provider_config_ref.name, "prod");
        assert_eq!(
            defaulted.helm_provider_config_ref.kind,
            ProviderConfigKind::ProviderConfig
        );
        assert_eq!(defaulted.kubernetes_provider_config_ref.name, "prod");

        for (kind, component) in defaulted.components.iter() {
            assert_eq!(component.identity.kind, kind);
            assert_eq!(component.identity.name, kind.default_name());
            assert_eq!(component.identity.namespace, "monitoring");
        }
    }

    #[test]
    fn test_explicit_fields_untouched() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.namespace = Some("observability".to_string());
        spec.management_policies = Some(vec!["Observe".to_string()]);
        spec.kubernetes_provider_config_ref = Some(ProviderConfigRefSpec {
            name: Some("in-cluster".to_string()),
            kind: Some(ProviderConfigKind::ClusterProviderConfig),
        });
        spec.component_mut(ComponentKind::Loki).name = Some("logs".to_string());
        spec.component_mut(ComponentKind::Tempo).namespace = Some("tracing".to_string());

        let defaulted = apply_defaults(&spec).unwrap();

        assert_eq!(defaulted.management_policies, vec!["Observe".to_string()]);
        assert_eq!(defaulted.kubernetes_provider_config_ref.name, "in-cluster");
        assert_eq!(
            defaulted.kubernetes_provider_config_ref.kind,
            ProviderConfigKind::ClusterProviderConfig
        );
        assert_eq!(defaulted.helm_provider_config_ref.name, "prod");
        assert_eq!(defaulted.identity(ComponentKind::Loki).name, "logs");
        assert_eq!(defaulted.identity(ComponentKind::Loki).namespace, "observability");
        assert_eq!(defaulted.identity(ComponentKind::Tempo).namespace, "tracing");
    }

    #[test]
    fn test_provider_ref_kind_only_defaults_name() {
        let mut spec = StackSpec::for_cluster("edge-1");
        spec.helm_provider_config_ref = Some(ProviderConfigRefSpec {
            name: None,
            kind: Some(ProviderConfigKind::ClusterProviderConfig),
        });

        let defaulted = apply_defaults(&spec).unwrap();
        assert_eq!(defaulted.helm_provider_config_ref.name, "edge-1");
    }

    #[test]
    fn test_missing_cluster_name() {
        let result = apply_defaults(&StackSpec::default());
        assert!(matches!(
            result,
            Err(ValidationError::MissingField { field: "clusterName" })
        ));
    }

    #[test]
    fn test_empty_cluster_name() {
        let result = apply_defaults(&StackSpec::for_cluster(""));
        assert!(matches!(result, Err(ValidationError::MissingField { .. })));
    }

    #[test]
    fn test_invalid_component_name() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.component_mut(ComponentKind::KubePrometheusStack).name = Some("My_Prom".to_string());

        match apply_defaults(&spec) {
            Err(ValidationError::InvalidName { field, value, .. }) => {
                assert_eq!(field, "kubePrometheusStack.name");
                assert_eq!(value, "My_Prom");
            }
            other => panic!("Expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_namespace() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.namespace = Some("-monitoring".to_string());
        assert!(matches!(
            apply_defaults(&spec),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_cluster_name_may_contain_dots() {
        assert!(apply_defaults(&StackSpec::for_cluster("eu-west.prod")).is_ok());
        assert!(apply_defaults(&StackSpec::for_cluster("eu-west..prod")).is_err());
    }

    #[test]
    fn test_duplicate_release_names() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.component_mut(ComponentKind::Tempo).name = Some("loki".to_string());

        match apply_defaults(&spec) {
            Err(ValidationError::DuplicateRelease { first, second, name }) => {
                assert_eq!(first, "loki");
                assert_eq!(second, "tempo");
                assert_eq!(name, "loki");
            }
            other => panic!("Expected DuplicateRelease, got {other:?}"),
        }
    }

    #[test]
    fn test_release_name_length() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.component_mut(ComponentKind::Loki).name = Some("l".repeat(53));
        assert!(apply_defaults(&spec).is_ok());

        spec.component_mut(ComponentKind::Loki).name = Some("l".repeat(54));
        match apply_defaults(&spec) {
            Err(ValidationError::InvalidName { field, .. }) => assert_eq!(field, "loki.name"),
            other => panic!("Expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn test_prometheus_stack_name_length() {
        let mut spec = StackSpec::for_cluster("prod");
        spec.component_mut(ComponentKind::KubePrometheusStack).name = Some("p".repeat(26));
        assert!(apply_defaults(&spec).is_ok());

        spec.component_mut(ComponentKind::KubePrometheusStack).name = Some("p".repeat(27));
        match apply_defaults(&spec) {
            Err(ValidationError::InvalidName { field, .. }) => {
                assert_eq!(field, "kubePrometheusStack.name")
            }
            other => panic!("Expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn test_cluster_name_length() {
        assert_eq!(MAX_CLUSTER_NAME_LEN, 104);

        let longest = format!("{}.{}", "a".repeat(63), "b".repeat(40));
        assert_eq!(longest.len(), MAX_CLUSTER_NAME_LEN);
        assert!(apply_defaults(&StackSpec::for_cluster(longest.as_str())).is_ok());

        let too_long = format!("{}.{}", "a".repeat(63), "b".repeat(41));
        assert!(matches!(
            apply_defaults(&StackSpec::for_cluster(too_long)),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_label_rules() {
        assert!(label_violation("kube-prometheus-stack").is_none());
        assert!(label_violation("a").is_none());
        assert!(label_violation("").is_some());
        assert!(label_violation("ends-").is_some());
        assert!(label_violation("UPPER").is_some());
        assert!(label_violation(&"a".repeat(64)).is_some());
    }
}
