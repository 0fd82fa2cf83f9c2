//! Manifest rendering.

use anyhow::Result;
use obstack_core::{Expansion, ResourceRef};

use crate::config::OutputFormat;

/// Render an expansion as a YAML stream or a JSON array.
pub fn render_expansion(expansion: &Expansion, format: OutputFormat) -> Result<String> {
    let manifests = expansion.manifests();
    match format {
        OutputFormat::Yaml => {
            let mut out = String::new();
            for manifest in &manifests {
                out.push_str("---\n");
                out.push_str(&serde_yaml::to_string(manifest)?);
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&manifests)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// One `kind/name` line per resource.
pub fn render_order(order: &[ResourceRef]) -> String {
    order
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{:>2}. {}/{}\n", i + 1, r.kind, r.name))
        .collect()
}
