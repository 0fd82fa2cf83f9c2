//! Defaulting and wiring resolution for stack documents.
//!
//! This crate resolves:
//! - Defaults (namespaces, release names, provider config refs)
//! - Name validation
//! - Cross-component wiring (datasource URLs, push endpoints)

mod defaults;
mod wiring;

pub use defaults::apply_defaults;
pub use wiring::{resolve_wiring, DatasourceWiring, Endpoints, Wiring, TRACE_ID_PATTERN};

use obstack_core::{DefaultedSpec, StackSpec, ValidationError};

/// A defaulted spec together with the wiring derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStack {
    pub spec: DefaultedSpec,
    pub wiring: Wiring,
}

/// Apply defaults and derive wiring for a stack document.
pub fn resolve(spec: &StackSpec) -> Result<ResolvedStack, ValidationError> {
    let spec = apply_defaults(spec)?;
    let wiring = resolve_wiring(&spec);
    Ok(ResolvedStack { spec, wiring })
}
