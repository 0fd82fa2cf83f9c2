//! Cross-component wiring.
//!
//! Every URL here is a pure function of the release names and namespaces in
//! a [`DefaultedSpec`]. Renaming a release moves every endpoint that points
//! at it.

use obstack_core::{
    constants::{
        LOKI_HTTP_PORT, LOKI_PUSH_PATH, OTLP_GRPC_PORT, OTLP_HTTP_PORT, PROMETHEUS_PORT,
        PROMETHEUS_REMOTE_WRITE_PATH, TEMPO_QUERY_PORT,
    },
    mapping_from_json, ComponentKind, ComponentSet, DatasourceKind, DefaultedSpec, Mapping,
};
use serde_json::json;

/// Regex Grafana uses to pull a trace id out of a log line.
pub const TRACE_ID_PATTERN: &str = r#"(?:traceID|trace_id|traceId)[=:"\s]+(\w+)"#;

/// In-cluster endpoints of the stack's backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Prometheus query base URL. Consumers append their own query paths.
    pub prometheus: String,
    pub prometheus_remote_write: String,
    pub loki: String,
    pub loki_push: String,
    pub tempo_query: String,
    pub tempo_otlp_grpc: String,
    pub tempo_otlp_http: String,
}

impl Endpoints {
    pub fn from_spec(spec: &DefaultedSpec) -> Self {
        let prom = spec.identity(ComponentKind::KubePrometheusStack);
        let loki = spec.identity(ComponentKind::Loki);
        let tempo = spec.identity(ComponentKind::Tempo);

        let prometheus = format!(
            "http://{}-prometheus.{}:{}",
            prom.name, prom.namespace, PROMETHEUS_PORT
        );
        let loki_url = format!("http://{}:{}", loki.host(), LOKI_HTTP_PORT);

        Self {
            prometheus_remote_write: format!("{prometheus}{PROMETHEUS_REMOTE_WRITE_PATH}"),
            prometheus,
            loki_push: format!("{loki_url}{LOKI_PUSH_PATH}"),
            loki: loki_url,
            tempo_query: format!("http://{}:{}", tempo.host(), TEMPO_QUERY_PORT),
            tempo_otlp_grpc: format!("http://{}:{}", tempo.host(), OTLP_GRPC_PORT),
            tempo_otlp_http: format!("http://{}:{}", tempo.host(), OTLP_HTTP_PORT),
        }
    }
}

/// Wiring for one Grafana datasource.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasourceWiring {
    pub kind: DatasourceKind,
    pub url: String,
    pub is_default: bool,
    pub json_data: Mapping,
}

/// All derived values of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Wiring {
    pub endpoints: Endpoints,
    /// Wiring layer of each release's values.
    pub releases: ComponentSet<Mapping>,
    /// Datasources in [`DatasourceKind::ALL`] order.
    pub datasources: [DatasourceWiring; 3],
}

impl Wiring {
    pub fn release(&self, kind: ComponentKind) -> &Mapping {
        self.releases.get(kind)
    }

    pub fn datasource(&self, kind: DatasourceKind) -> &DatasourceWiring {
        match kind {
            DatasourceKind::Prometheus => &self.datasources[0],
            DatasourceKind::Loki => &self.datasources[1],
            DatasourceKind::Tempo => &self.datasources[2],
        }
    }
}

/// Derive every cross-component value for a defaulted spec.
pub fn resolve_wiring(spec: &DefaultedSpec) -> Wiring {
    let endpoints = Endpoints::from_spec(spec);
    let releases = ComponentSet::from_fn(|kind| release_wiring(kind, spec, &endpoints));
    let datasources = DatasourceKind::ALL.map(|kind| datasource_wiring(kind, &endpoints));

    Wiring {
        endpoints,
        releases,
        datasources,
    }
}

fn release_wiring(kind: ComponentKind, spec: &DefaultedSpec, endpoints: &Endpoints) -> Mapping {
    let name = &spec.identity(kind).name;

    let wiring = match kind {
        // Service names derive from the fullname.
        ComponentKind::KubePrometheusStack | ComponentKind::Loki => json!({
            "fullnameOverride": name,
        }),
        ComponentKind::Tempo => json!({
            "fullnameOverride": name,
            "tempo": {
                "metricsGenerator": {
                    "enabled": true,
                    "remoteWriteUrl": endpoints.prometheus_remote_write,
                },
            },
        }),
        ComponentKind::K8sMonitoring => json!({
            "cluster": { "name": spec.cluster_name },
            "destinations": [
                {
                    "name": "prometheus",
                    "type": "prometheus",
                    "url": endpoints.prometheus_remote_write,
                },
                {
                    "name": "loki",
                    "type": "loki",
                    "url": endpoints.loki_push,
                },
                {
                    "name": "tempo",
                    "type": "otlp",
                    "url": endpoints.tempo_otlp_grpc,
                    "protocol": "grpc",
                    "tls": { "insecure": true },
                    "metrics": { "enabled": false },
                    "logs": { "enabled": false },
                    "traces": { "enabled": true },
                },
            ],
            "clusterMetrics": {
                "opencost": {
                    "opencost": {
                        "exporter": { "defaultClusterId": spec.cluster_name },
                        "prometheus": {
                            "external": { "url": endpoints.prometheus },
                        },
                    },
                },
            },
        }),
        ComponentKind::GrafanaOperator => json!({}),
    };

    mapping_from_json(wiring)
}

fn datasource_wiring(kind: DatasourceKind, endpoints: &Endpoints) -> DatasourceWiring {
    let (url, is_default, json_data) = match kind {
        DatasourceKind::Prometheus => (
            &endpoints.prometheus,
            true,
            json!({
                "httpMethod": "POST",
                "exemplarTraceIdDestinations": [
                    { "name": "trace_id", "datasourceUid": DatasourceKind::Tempo.uid() },
                ],
            }),
        ),
        DatasourceKind::Loki => (
            &endpoints.loki,
            false,
            json!({
                "derivedFields": [
                    {
                        "name": "TraceID",
                        "matcherRegex": TRACE_ID_PATTERN,
                        "datasourceUid": DatasourceKind::Tempo.uid(),
                        "url": "${__value.raw}",
                        "urlDisplayLabel": "View trace",
                    },
                ],
            }),
        ),
        DatasourceKind::Tempo => (
            &endpoints.tempo_query,
            false,
            json!({
                "tracesToLogsV2": {
                    "datasourceUid": DatasourceKind::Loki.uid(),
                    "spanStartTimeShift": "-1h",
                    "spanEndTimeShift": "1h",
                    "filterByTraceID": true,
                    "filterBySpanID": false,
                },
                "tracesToMetrics": { "datasourceUid": DatasourceKind::Prometheus.uid() },
                "serviceMap": { "datasourceUid": DatasourceKind::Prometheus.uid() },
                "nodeGraph": { "enabled": true },
                "lokiSearch": { "datasourceUid": DatasourceKind::Loki.uid() },
            }),
        ),
    };

    DatasourceWiring {
        kind,
        url: url.clone(),
        is_default,
        json_data: mapping_from_json(json_data),
    }
}
