//! Values materialization for each release.
//!
//! Precedence, lowest first: chart defaults, wiring, user `values`. A
//! non-empty `overrideAllValues` skips all three and is used verbatim.

use obstack_core::{
    merge_layers, ChartRef, ComponentIdentity, ComponentSet, DefaultedComponent, Mapping,
    MergeError,
};
use obstack_resolver::ResolvedStack;
use tracing::debug;

use crate::ChartRegistry;

/// A component with its final values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    pub identity: ComponentIdentity,
    pub chart: ChartRef,
    pub values: Mapping,
    /// The values came from `overrideAllValues`.
    pub overridden: bool,
}

/// Compute the values of one release.
pub fn materialize(
    component: &DefaultedComponent,
    chart_defaults: &Mapping,
    wiring: &Mapping,
) -> Result<Mapping, MergeError> {
    if component.is_overridden() {
        return Ok(component.override_all_values.clone());
    }
    merge_layers([chart_defaults, wiring, &component.values])
}

/// Materialize every component of a resolved stack.
pub fn resolve_components(
    stack: &ResolvedStack,
    registry: &ChartRegistry,
) -> Result<ComponentSet<ResolvedComponent>, MergeError> {
    stack.spec.components.try_map(|kind, component| -> Result<_, MergeError> {
        let defaults = registry.get(kind);
        let values = materialize(component, &defaults.values, stack.wiring.release(kind))?;

        debug!(
            component = %kind,
            release = %component.identity.name,
            overridden = component.is_overridden(),
            keys = values.len(),
            "materialized values"
        );

        Ok(ResolvedComponent {
            identity: component.identity.clone(),
            chart: defaults.chart,
            values,
            overridden: component.is_overridden(),
        })
    })
}
