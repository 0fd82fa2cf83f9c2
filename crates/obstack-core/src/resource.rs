//! Output resources emitted by an expansion.

use indexmap::IndexMap;
use serde_json::json;

use crate::component::{ChartRef, ComponentKind};
use crate::constants::{
    HELM_RELEASE_API_VERSION, HELM_RELEASE_KIND, KUBERNETES_OBJECT_API_VERSION,
    KUBERNETES_OBJECT_KIND, USAGE_API_VERSION, USAGE_KIND,
};
use crate::spec::ProviderRef;
use crate::value::{Mapping, Value};

/// Reference to another emitted resource by kind and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl ResourceRef {
    pub fn release(name: impl Into<String>) -> Self {
        Self {
            api_version: HELM_RELEASE_API_VERSION.to_string(),
            kind: HELM_RELEASE_KIND.to_string(),
            name: name.into(),
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            api_version: KUBERNETES_OBJECT_API_VERSION.to_string(),
            kind: KUBERNETES_OBJECT_KIND.to_string(),
            name: name.into(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "apiVersion": self.api_version,
            "kind": self.kind,
            "resourceRef": { "name": self.name },
        })
    }
}

/// Metadata stamped on every emitted resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub name: String,
    pub labels: IndexMap<String, String>,
}

/// A Grafana datasource registered by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasourceKind {
    Prometheus,
    Loki,
    Tempo,
}

impl DatasourceKind {
    pub const ALL: [DatasourceKind; 3] = [
        DatasourceKind::Prometheus,
        DatasourceKind::Loki,
        DatasourceKind::Tempo,
    ];

    /// Datasource uid, also used by correlation blocks of other datasources.
    pub fn uid(self) -> &'static str {
        match self {
            DatasourceKind::Prometheus => "prometheus",
            DatasourceKind::Loki => "loki",
            DatasourceKind::Tempo => "tempo",
        }
    }

    /// Display name shown in Grafana.
    pub fn display_name(self) -> &'static str {
        match self {
            DatasourceKind::Prometheus => "Prometheus",
            DatasourceKind::Loki => "Loki",
            DatasourceKind::Tempo => "Tempo",
        }
    }

    /// Release backing this datasource.
    pub fn component(self) -> ComponentKind {
        match self {
            DatasourceKind::Prometheus => ComponentKind::KubePrometheusStack,
            DatasourceKind::Loki => ComponentKind::Loki,
            DatasourceKind::Tempo => ComponentKind::Tempo,
        }
    }
}

/// Which embedded object a [`KubernetesObject`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackObject {
    GrafanaInstance,
    Datasource(DatasourceKind),
}

/// A chart release.
#[derive(Debug, Clone, PartialEq)]
pub struct HelmRelease {
    pub component: ComponentKind,
    pub metadata: ObjectMeta,
    pub chart: ChartRef,
    /// Namespace the chart is installed into.
    pub namespace: String,
    pub values: Mapping,
    pub provider_config_ref: ProviderRef,
    pub management_policies: Vec<String>,
}

/// An embedded Kubernetes manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct KubernetesObject {
    pub object: StackObject,
    pub metadata: ObjectMeta,
    pub manifest: Mapping,
    pub provider_config_ref: ProviderRef,
    pub management_policies: Vec<String>,
}

/// `of` must not be deleted while `by` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageProtection {
    pub metadata: ObjectMeta,
    pub of: ResourceRef,
    pub by: ResourceRef,
    pub replay_deletion: bool,
}

/// One emitted resource.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputResource {
    HelmRelease(HelmRelease),
    KubernetesObject(KubernetesObject),
    UsageProtection(UsageProtection),
}

impl OutputResource {
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            OutputResource::HelmRelease(r) => &r.metadata,
            OutputResource::KubernetesObject(o) => &o.metadata,
            OutputResource::UsageProtection(u) => &u.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Reference to this resource, as a usage edge would name it.
    pub fn resource_ref(&self) -> ResourceRef {
        match self {
            OutputResource::HelmRelease(r) => ResourceRef::release(&r.metadata.name),
            OutputResource::KubernetesObject(o) => ResourceRef::object(&o.metadata.name),
            OutputResource::UsageProtection(u) => ResourceRef {
                api_version: USAGE_API_VERSION.to_string(),
                kind: USAGE_KIND.to_string(),
                name: u.metadata.name.clone(),
            },
        }
    }

    /// Render as a Kubernetes-style manifest.
    pub fn to_manifest(&self) -> Value {
        let manifest = match self {
            OutputResource::HelmRelease(r) => json!({
                "apiVersion": HELM_RELEASE_API_VERSION,
                "kind": HELM_RELEASE_KIND,
                "metadata": metadata_json(&r.metadata),
                "spec": {
                    "managementPolicies": r.management_policies,
                    "providerConfigRef": provider_ref_json(&r.provider_config_ref),
                    "forProvider": {
                        "chart": {
                            "name": r.chart.name,
                            "repository": r.chart.repository,
                            "version": r.chart.version,
                        },
                        "namespace": r.namespace,
                        "values": r.values,
                    },
                },
            }),
            OutputResource::KubernetesObject(o) => json!({
                "apiVersion": KUBERNETES_OBJECT_API_VERSION,
                "kind": KUBERNETES_OBJECT_KIND,
                "metadata": metadata_json(&o.metadata),
                "spec": {
                    "managementPolicies": o.management_policies,
                    "providerConfigRef": provider_ref_json(&o.provider_config_ref),
                    "forProvider": {
                        "manifest": o.manifest,
                    },
                },
            }),
            OutputResource::UsageProtection(u) => json!({
                "apiVersion": USAGE_API_VERSION,
                "kind": USAGE_KIND,
                "metadata": metadata_json(&u.metadata),
                "spec": {
                    "of": u.of.to_json(),
                    "by": u.by.to_json(),
                    "replayDeletion": u.replay_deletion,
                },
            }),
        };
        Value::from(manifest)
    }
}

fn metadata_json(meta: &ObjectMeta) -> serde_json::Value {
    if meta.labels.is_empty() {
        json!({ "name": meta.name })
    } else {
        json!({ "name": meta.name, "labels": meta.labels })
    }
}

fn provider_ref_json(provider: &ProviderRef) -> serde_json::Value {
    json!({ "name": provider.name, "kind": provider.kind.as_str() })
}

/// The complete output of one expansion, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub resources: Vec<OutputResource>,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputResource> {
        self.resources.iter()
    }

    pub fn releases(&self) -> impl Iterator<Item = &HelmRelease> {
        self.resources.iter().filter_map(|r| match r {
            OutputResource::HelmRelease(release) => Some(release),
            _ => None,
        })
    }

    pub fn objects(&self) -> impl Iterator<Item = &KubernetesObject> {
        self.resources.iter().filter_map(|r| match r {
            OutputResource::KubernetesObject(object) => Some(object),
            _ => None,
        })
    }

    pub fn usages(&self) -> impl Iterator<Item = &UsageProtection> {
        self.resources.iter().filter_map(|r| match r {
            OutputResource::UsageProtection(usage) => Some(usage),
            _ => None,
        })
    }

    pub fn release(&self, component: ComponentKind) -> Option<&HelmRelease> {
        self.releases().find(|r| r.component == component)
    }

    pub fn object(&self, object: StackObject) -> Option<&KubernetesObject> {
        self.objects().find(|o| o.object == object)
    }

    /// Render every resource, in emission order.
    pub fn manifests(&self) -> Vec<Value> {
        self.resources.iter().map(OutputResource::to_manifest).collect()
    }
}
