//! Input document model and its defaulted form.
//!
//! [`StackSpec`] mirrors the user-facing document: almost every field is
//! optional. [`DefaultedSpec`] is what the resolver hands to the expander,
//! with every default filled in, so nothing downstream has to re-check
//! optionality.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::component::{ComponentKind, ComponentSet};
use crate::value::{Mapping, Value};

/// Top-level fields of a stack document other than the components.
const STACK_FIELDS: [&str; 6] = [
    "clusterName",
    "namespace",
    "labels",
    "managementPolicies",
    "helmProviderConfigRef",
    "kubernetesProviderConfigRef",
];

/// Kind of provider configuration a managed resource points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderConfigKind {
    #[default]
    ProviderConfig,
    ClusterProviderConfig,
}

impl ProviderConfigKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderConfigKind::ProviderConfig => "ProviderConfig",
            ProviderConfigKind::ClusterProviderConfig => "ClusterProviderConfig",
        }
    }
}

/// Provider config reference as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigRefSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderConfigKind>,
}

/// Per-component settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Release name. Defaults to the chart name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Release namespace. Defaults to the stack namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Values merged on top of the computed defaults.
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub values: Mapping,
    /// Values that replace the computed defaults entirely when non-empty.
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub override_all_values: Mapping,
}

/// The stack document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_policies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_provider_config_ref: Option<ProviderConfigRefSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_provider_config_ref: Option<ProviderConfigRefSpec>,
    #[serde(flatten)]
    pub components: ComponentSet<ComponentSpec>,
}

impl StackSpec {
    /// A spec with only the cluster name set.
    pub fn for_cluster(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: Some(cluster_name.into()),
            ..Self::default()
        }
    }

    pub fn component(&self, kind: ComponentKind) -> &ComponentSpec {
        self.components.get(kind)
    }

    pub fn component_mut(&mut self, kind: ComponentKind) -> &mut ComponentSpec {
        self.components.get_mut(kind)
    }

    /// Build a spec from a parsed document.
    ///
    /// Documents wrapped in a resource envelope (`apiVersion`, `kind`,
    /// `metadata`, `spec`) are unwrapped to their `spec`.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        let inner = match document {
            Value::Mapping(mut mapping) if mapping.contains_key("apiVersion") => {
                mapping.shift_remove("spec").unwrap_or_default()
            }
            other => other,
        };
        if let Value::Mapping(fields) = &inner {
            for key in unrecognized_fields(fields) {
                warn!(field = key, "ignoring unrecognized stack field");
            }
        }
        let json = serde_json::to_value(inner)?;
        serde_json::from_value(json)
    }
}

/// Keys of a stack document that no field or component picks up.
pub fn unrecognized_fields(document: &Mapping) -> Vec<&str> {
    document
        .keys()
        .map(String::as_str)
        .filter(|key| {
            !STACK_FIELDS.contains(key)
                && !ComponentKind::ALL.iter().any(|kind| kind.field_name() == *key)
        })
        .collect()
}

/// Provider config reference with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRef {
    pub name: String,
    pub kind: ProviderConfigKind,
}

/// Release identity of a component after defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentIdentity {
    pub kind: ComponentKind,
    pub name: String,
    pub namespace: String,
}

impl ComponentIdentity {
    /// In-cluster DNS host of the service named after the release.
    pub fn host(&self) -> String {
        format!("{}.{}", self.name, self.namespace)
    }
}

/// A component after defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultedComponent {
    pub identity: ComponentIdentity,
    pub values: Mapping,
    pub override_all_values: Mapping,
}

impl DefaultedComponent {
    /// Whether the user replaced the computed values entirely.
    pub fn is_overridden(&self) -> bool {
        !self.override_all_values.is_empty()
    }
}

/// A stack spec with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultedSpec {
    pub cluster_name: String,
    pub namespace: String,
    pub labels: IndexMap<String, String>,
    pub management_policies: Vec<String>,
    pub helm_provider_config_ref: ProviderRef,
    pub kubernetes_provider_config_ref: ProviderRef,
    pub components: ComponentSet<DefaultedComponent>,
}

impl DefaultedSpec {
    pub fn component(&self, kind: ComponentKind) -> &DefaultedComponent {
        self.components.get(kind)
    }

    pub fn identity(&self, kind: ComponentKind) -> &ComponentIdentity {
        &self.components.get(kind).identity
    }
}
