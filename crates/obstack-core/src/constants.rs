//! Fixed identifiers shared by every expansion.
//!
//! Chart coordinates and ports are part of the interop contract with the
//! charts themselves and must not drift.

use crate::component::ChartRef;

/// Namespace used when neither the stack nor the component sets one.
pub const DEFAULT_NAMESPACE: &str = "monitoring";

/// Management policy applied when none is given.
pub const DEFAULT_MANAGEMENT_POLICY: &str = "*";

// Chart coordinates

pub const KUBE_PROMETHEUS_STACK_CHART: ChartRef = ChartRef {
    name: "kube-prometheus-stack",
    repository: "https://prometheus-community.github.io/helm-charts",
    version: "82.2.0",
};

pub const LOKI_CHART: ChartRef = ChartRef {
    name: "loki",
    repository: "https://grafana.github.io/helm-charts",
    version: "6.53.0",
};

pub const TEMPO_CHART: ChartRef = ChartRef {
    name: "tempo",
    repository: "https://grafana.github.io/helm-charts",
    version: "1.24.4",
};

pub const K8S_MONITORING_CHART: ChartRef = ChartRef {
    name: "k8s-monitoring",
    repository: "https://grafana.github.io/helm-charts",
    version: "3.8.0",
};

pub const GRAFANA_OPERATOR_CHART: ChartRef = ChartRef {
    name: "grafana-operator",
    repository: "oci://ghcr.io/grafana/helm-charts",
    version: "5.21.4",
};

// Ports

pub const PROMETHEUS_PORT: u16 = 9090;
pub const OTLP_GRPC_PORT: u16 = 4317;
pub const OTLP_HTTP_PORT: u16 = 4318;
pub const JAEGER_GRPC_PORT: u16 = 14250;
pub const ZIPKIN_PORT: u16 = 9411;
/// HTTP port of the Loki service, serving both queries and pushes.
pub const LOKI_HTTP_PORT: u16 = 3100;
/// HTTP port of the Tempo query frontend.
pub const TEMPO_QUERY_PORT: u16 = 3200;

// Paths

pub const PROMETHEUS_REMOTE_WRITE_PATH: &str = "/api/v1/write";
pub const LOKI_PUSH_PATH: &str = "/loki/api/v1/push";

// API groups of emitted resources

pub const HELM_RELEASE_API_VERSION: &str = "helm.crossplane.io/v1beta1";
pub const HELM_RELEASE_KIND: &str = "Release";
pub const KUBERNETES_OBJECT_API_VERSION: &str = "kubernetes.crossplane.io/v1alpha2";
pub const KUBERNETES_OBJECT_KIND: &str = "Object";
pub const USAGE_API_VERSION: &str = "apiextensions.crossplane.io/v1beta1";
pub const USAGE_KIND: &str = "Usage";
pub const GRAFANA_API_VERSION: &str = "grafana.integreatly.org/v1beta1";

/// Label the Grafana instance carries and datasources select on.
pub const GRAFANA_INSTANCE_LABEL: (&str, &str) = ("dashboards", "grafana");

/// Name of the Grafana CR inside the operator namespace.
pub const GRAFANA_INSTANCE_NAME: &str = "grafana";
