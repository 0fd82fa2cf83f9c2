//! Expansion benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use obstack_core::{StackSpec, Value};
use obstack_expander::{expand, Expander};

const FULL_DOC: &str = r#"
clusterName: bench
labels:
  team: platform
kubePrometheusStack:
  name: prom
  values:
    prometheus:
      prometheusSpec:
        retention: 30d
        resources:
          requests:
            cpu: 500m
            memory: 2Gi
loki:
  namespace: logs
  values:
    singleBinary:
      replicas: 2
"#;

fn expand_minimal(c: &mut Criterion) {
    let spec = StackSpec::for_cluster("bench");
    c.bench_function("expand_minimal", |b| b.iter(|| expand(black_box(&spec))));
}

fn expand_full(c: &mut Criterion) {
    let document: Value = serde_yaml::from_str(FULL_DOC).unwrap();
    let spec = StackSpec::from_document(document).unwrap();
    let expander = Expander::default();
    c.bench_function("expand_full", |b| b.iter(|| expander.expand(black_box(&spec))));
}

fn render_manifests(c: &mut Criterion) {
    let expansion = expand(&StackSpec::for_cluster("bench")).unwrap();
    c.bench_function("render_manifests", |b| b.iter(|| black_box(&expansion).manifests()));
}

criterion_group!(benches, expand_minimal, expand_full, render_manifests);
criterion_main!(benches);
