//! Grafana instance and datasource manifests.
//!
//! Both are created in the grafana-operator namespace and reconciled by the
//! operator.

use obstack_core::{
    constants::{GRAFANA_API_VERSION, GRAFANA_INSTANCE_LABEL, GRAFANA_INSTANCE_NAME},
    mapping_from_json, ComponentKind, DatasourceKind, DefaultedSpec, KubernetesObject, ObjectMeta,
    StackObject,
};
use obstack_resolver::{DatasourceWiring, Wiring};
use serde_json::json;

/// Name of the managed object wrapping a stack object.
pub fn object_name(cluster_name: &str, object: StackObject) -> String {
    match object {
        StackObject::GrafanaInstance => format!("{cluster_name}-grafana-instance"),
        StackObject::Datasource(kind) => format!("{cluster_name}-datasource-{}", kind.uid()),
    }
}

/// Render the Grafana instance followed by one object per datasource.
pub fn render_objects(spec: &DefaultedSpec, wiring: &Wiring) -> Vec<KubernetesObject> {
    let namespace = &spec.identity(ComponentKind::GrafanaOperator).namespace;

    let mut objects = Vec::with_capacity(1 + DatasourceKind::ALL.len());
    objects.push(wrap(spec, StackObject::GrafanaInstance, grafana_manifest(namespace)));
    for kind in DatasourceKind::ALL {
        let manifest = datasource_manifest(namespace, wiring.datasource(kind));
        objects.push(wrap(spec, StackObject::Datasource(kind), manifest));
    }
    objects
}

fn wrap(spec: &DefaultedSpec, object: StackObject, manifest: serde_json::Value) -> KubernetesObject {
    KubernetesObject {
        object,
        metadata: ObjectMeta {
            name: object_name(&spec.cluster_name, object),
            labels: spec.labels.clone(),
        },
        manifest: mapping_from_json(manifest),
        provider_config_ref: spec.kubernetes_provider_config_ref.clone(),
        management_policies: spec.management_policies.clone(),
    }
}

fn grafana_manifest(namespace: &str) -> serde_json::Value {
    let (label_key, label_value) = GRAFANA_INSTANCE_LABEL;
    json!({
        "apiVersion": GRAFANA_API_VERSION,
        "kind": "Grafana",
        "metadata": {
            "name": GRAFANA_INSTANCE_NAME,
            "namespace": namespace,
            "labels": { label_key: label_value },
        },
        "spec": {
            "config": {
                "log": { "mode": "console" },
                "auth": { "disable_login_form": "false" },
            },
        },
    })
}

fn datasource_manifest(namespace: &str, datasource: &DatasourceWiring) -> serde_json::Value {
    let (label_key, label_value) = GRAFANA_INSTANCE_LABEL;
    json!({
        "apiVersion": GRAFANA_API_VERSION,
        "kind": "GrafanaDatasource",
        "metadata": {
            "name": datasource.kind.uid(),
            "namespace": namespace,
        },
        "spec": {
            "instanceSelector": {
                "matchLabels": { label_key: label_value },
            },
            "datasource": {
                "name": datasource.kind.display_name(),
                "type": datasource.kind.uid(),
                "uid": datasource.kind.uid(),
                "access": "proxy",
                "url": datasource.url,
                "isDefault": datasource.is_default,
                "jsonData": datasource.json_data,
            },
        },
    })
}
