//! Chart registry holding the default values of each release.

use obstack_core::{
    constants::{
        JAEGER_GRPC_PORT, LOKI_HTTP_PORT, OTLP_GRPC_PORT, OTLP_HTTP_PORT, TEMPO_QUERY_PORT,
        ZIPKIN_PORT,
    },
    mapping_from_json, ChartRef, ComponentKind, ComponentSet, Mapping,
};
use serde_json::json;

/// Chart coordinates plus the lowest-precedence values layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDefaults {
    pub chart: ChartRef,
    pub values: Mapping,
}

/// The chart of every component, with its default values.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRegistry {
    charts: ComponentSet<ChartDefaults>,
}

impl Default for ChartRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChartRegistry {
    /// Registry with the built-in defaults for every chart.
    pub fn builtin() -> Self {
        Self {
            charts: ComponentSet::from_fn(|kind| ChartDefaults {
                chart: kind.chart(),
                values: builtin_values(kind),
            }),
        }
    }

    /// Registry where every chart has empty default values.
    pub fn empty() -> Self {
        Self {
            charts: ComponentSet::from_fn(|kind| ChartDefaults {
                chart: kind.chart(),
                values: Mapping::new(),
            }),
        }
    }

    /// Get the defaults of a component's chart.
    pub fn get(&self, kind: ComponentKind) -> &ChartDefaults {
        self.charts.get(kind)
    }

    /// Iterate over every chart in component order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &ChartDefaults)> {
        self.charts.iter()
    }
}

fn builtin_values(kind: ComponentKind) -> Mapping {
    let values = match kind {
        ComponentKind::KubePrometheusStack => json!({
            // Grafana is run by the operator instead.
            "grafana": { "enabled": false },
            "prometheus": {
                "prometheusSpec": {
                    "enableRemoteWriteReceiver": true,
                    "enableFeatures": ["exemplar-storage"],
                    "serviceMonitorSelectorNilUsesHelmValues": false,
                    "podMonitorSelectorNilUsesHelmValues": false,
                    "ruleSelectorNilUsesHelmValues": false,
                    "retention": "10d",
                },
            },
        }),
        ComponentKind::Loki => json!({
            "deploymentMode": "SingleBinary",
            "loki": {
                "auth_enabled": false,
                "commonConfig": { "replication_factor": 1 },
                "storage": { "type": "filesystem" },
                "useTestSchema": true,
                "server": { "http_listen_port": LOKI_HTTP_PORT },
            },
            "singleBinary": { "replicas": 1 },
            "backend": { "replicas": 0 },
            "read": { "replicas": 0 },
            "write": { "replicas": 0 },
            "gateway": { "enabled": false },
            "chunksCache": { "enabled": false },
            "resultsCache": { "enabled": false },
            "lokiCanary": { "enabled": false },
            "test": { "enabled": false },
        }),
        ComponentKind::Tempo => json!({
            "tempo": {
                "reportingEnabled": false,
                "server": { "http_listen_port": TEMPO_QUERY_PORT },
                "receivers": {
                    "otlp": {
                        "protocols": {
                            "grpc": { "endpoint": format!("0.0.0.0:{OTLP_GRPC_PORT}") },
                            "http": { "endpoint": format!("0.0.0.0:{OTLP_HTTP_PORT}") },
                        },
                    },
                    "jaeger": {
                        "protocols": {
                            "grpc": { "endpoint": format!("0.0.0.0:{JAEGER_GRPC_PORT}") },
                        },
                    },
                    "zipkin": { "endpoint": format!("0.0.0.0:{ZIPKIN_PORT}") },
                },
            },
            "persistence": { "enabled": false },
        }),
        ComponentKind::K8sMonitoring => json!({
            "clusterMetrics": {
                "enabled": true,
                "opencost": { "enabled": true, "metricsSource": "prometheus" },
                "kepler": { "enabled": false },
            },
            "clusterEvents": { "enabled": true },
            "podLogs": { "enabled": true },
            "applicationObservability": {
                "enabled": true,
                "receivers": {
                    "otlp": {
                        "grpc": { "enabled": true, "port": OTLP_GRPC_PORT },
                        "http": { "enabled": true, "port": OTLP_HTTP_PORT },
                    },
                    "jaeger": { "grpc": { "enabled": true, "port": JAEGER_GRPC_PORT } },
                    "zipkin": { "enabled": true, "port": ZIPKIN_PORT },
                },
            },
            "alloy-metrics": { "enabled": true },
            "alloy-singleton": { "enabled": true },
            "alloy-logs": { "enabled": true },
            "alloy-receiver": {
                "enabled": true,
                "alloy": {
                    "extraPorts": [
                        receiver_port("otlp-grpc", OTLP_GRPC_PORT),
                        receiver_port("otlp-http", OTLP_HTTP_PORT),
                        receiver_port("jaeger-grpc", JAEGER_GRPC_PORT),
                        receiver_port("zipkin", ZIPKIN_PORT),
                    ],
                },
            },
        }),
        ComponentKind::GrafanaOperator => json!({
            "serviceMonitor": { "enabled": true },
        }),
    };

    mapping_from_json(values)
}

fn receiver_port(name: &str, port: u16) -> serde_json::Value {
    json!({ "name": name, "port": port, "targetPort": port, "protocol": "TCP" })
}
