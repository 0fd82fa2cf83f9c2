//! The fixed set of stack components.

use serde::{Deserialize, Serialize};

use crate::constants::{
    GRAFANA_OPERATOR_CHART, K8S_MONITORING_CHART, KUBE_PROMETHEUS_STACK_CHART, LOKI_CHART,
    TEMPO_CHART,
};

/// Coordinates of a published chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartRef {
    pub name: &'static str,
    pub repository: &'static str,
    pub version: &'static str,
}

/// One of the five charts that make up a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    KubePrometheusStack,
    Loki,
    Tempo,
    K8sMonitoring,
    GrafanaOperator,
}

impl ComponentKind {
    /// Every component, in output order.
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::KubePrometheusStack,
        ComponentKind::Loki,
        ComponentKind::Tempo,
        ComponentKind::K8sMonitoring,
        ComponentKind::GrafanaOperator,
    ];

    /// Field name of the component in the input document.
    pub fn field_name(self) -> &'static str {
        match self {
            ComponentKind::KubePrometheusStack => "kubePrometheusStack",
            ComponentKind::Loki => "loki",
            ComponentKind::Tempo => "tempo",
            ComponentKind::K8sMonitoring => "k8sMonitoring",
            ComponentKind::GrafanaOperator => "grafanaOperator",
        }
    }

    pub fn chart(self) -> ChartRef {
        match self {
            ComponentKind::KubePrometheusStack => KUBE_PROMETHEUS_STACK_CHART,
            ComponentKind::Loki => LOKI_CHART,
            ComponentKind::Tempo => TEMPO_CHART,
            ComponentKind::K8sMonitoring => K8S_MONITORING_CHART,
            ComponentKind::GrafanaOperator => GRAFANA_OPERATOR_CHART,
        }
    }

    /// Release name used when the component does not set one.
    pub fn default_name(self) -> &'static str {
        self.chart().name
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One `T` per component.
///
/// The set is a struct rather than a map so that a missing or extra
/// component is a type error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSet<T> {
    #[serde(default)]
    pub kube_prometheus_stack: T,
    #[serde(default)]
    pub loki: T,
    #[serde(default)]
    pub tempo: T,
    #[serde(default)]
    pub k8s_monitoring: T,
    #[serde(default)]
    pub grafana_operator: T,
}

impl<T> ComponentSet<T> {
    pub fn from_fn(mut f: impl FnMut(ComponentKind) -> T) -> Self {
        Self {
            kube_prometheus_stack: f(ComponentKind::KubePrometheusStack),
            loki: f(ComponentKind::Loki),
            tempo: f(ComponentKind::Tempo),
            k8s_monitoring: f(ComponentKind::K8sMonitoring),
            grafana_operator: f(ComponentKind::GrafanaOperator),
        }
    }

    pub fn try_from_fn<E>(mut f: impl FnMut(ComponentKind) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            kube_prometheus_stack: f(ComponentKind::KubePrometheusStack)?,
            loki: f(ComponentKind::Loki)?,
            tempo: f(ComponentKind::Tempo)?,
            k8s_monitoring: f(ComponentKind::K8sMonitoring)?,
            grafana_operator: f(ComponentKind::GrafanaOperator)?,
        })
    }

    pub fn get(&self, kind: ComponentKind) -> &T {
        match kind {
            ComponentKind::KubePrometheusStack => &self.kube_prometheus_stack,
            ComponentKind::Loki => &self.loki,
            ComponentKind::Tempo => &self.tempo,
            ComponentKind::K8sMonitoring => &self.k8s_monitoring,
            ComponentKind::GrafanaOperator => &self.grafana_operator,
        }
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> &mut T {
        match kind {
            ComponentKind::KubePrometheusStack => &mut self.kube_prometheus_stack,
            ComponentKind::Loki => &mut self.loki,
            ComponentKind::Tempo => &mut self.tempo,
            ComponentKind::K8sMonitoring => &mut self.k8s_monitoring,
            ComponentKind::GrafanaOperator => &mut self.grafana_operator,
        }
    }

    /// Iterate in [`ComponentKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &T)> {
        ComponentKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(ComponentKind, &T) -> U) -> ComponentSet<U> {
        ComponentSet::from_fn(|kind| f(kind, self.get(kind)))
    }

    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(ComponentKind, &T) -> Result<U, E>,
    ) -> Result<ComponentSet<U>, E> {
        ComponentSet::try_from_fn(|kind| f(kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_components_distinct() {
        let mut names: Vec<_> = ComponentKind::ALL.iter().map(|k| k.default_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_chart_versions() {
        assert_eq!(ComponentKind::KubePrometheusStack.chart().version, "82.2.0");
        assert_eq!(ComponentKind::Loki.chart().version, "6.53.0");
        assert_eq!(ComponentKind::Tempo.chart().version, "1.24.4");
        assert_eq!(ComponentKind::K8sMonitoring.chart().version, "3.8.0");
        assert_eq!(ComponentKind::GrafanaOperator.chart().version, "5.21.4");
    }

    #[test]
    fn test_component_set_iter_order() {
        let set = ComponentSet::from_fn(|kind| kind.field_name());
        let order: Vec<_> = set.iter().map(|(_, name)| *name).collect();
        assert_eq!(
            order,
            ["kubePrometheusStack", "loki", "tempo", "k8sMonitoring", "grafanaOperator"]
        );
    }

    #[test]
    fn test_component_set_try_map_short_circuits() {
        let set = ComponentSet::from_fn(|kind| kind);
        let result: Result<ComponentSet<()>, ComponentKind> = set.try_map(|kind, _| {
            if kind == ComponentKind::Tempo {
                Err(kind)
            } else {
                Ok(())
            }
        });
        assert_eq!(result.unwrap_err(), ComponentKind::Tempo);
    }
}
