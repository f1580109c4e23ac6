//! # Session Benchmarks
//!
//! Performance benchmarks for procedure selection and session stepping.
//!
//! Run with: `cargo bench -p remedy-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use remedy_core::{
    CategoryData, FaultData, MatchRule, Procedure, ProcedureCatalog, ProcedureSelector, RuleSet,
    Session, TaxonomyStore,
};
use std::hint::black_box;
use std::sync::Arc;

/// A single-fault store.
fn store(name: &str) -> TaxonomyStore {
    TaxonomyStore::from_data(vec![CategoryData {
        name: "Blood Circuit Errors".into(),
        faults: vec![FaultData::with_steps(name, vec![])],
    }])
    .expect("store")
}

/// A rule set with N keyword rules, half of which match "Venous Pressure Alarm".
fn wide_rules(size: usize) -> RuleSet {
    let rules = (0..size)
        .map(|i| {
            let keyword = if i % 2 == 0 { "pressure" } else { "nomatch" };
            MatchRule::for_keywords(&[keyword], &["pressure_test", "fluid_system"])
        })
        .collect();
    RuleSet {
        rules,
        fallback: Default::default(),
    }
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let catalog = ProcedureCatalog::hemodialysis();
    let taxonomy = store("Venous Pressure Alarm");
    let fault = taxonomy
        .get_fault("Blood Circuit Errors", "Venous Pressure Alarm")
        .expect("fault");

    for size in [4, 64, 512].iter() {
        let selector =
            ProcedureSelector::with_default_safety(wide_rules(*size), &catalog).expect("selector");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(selector.select(&catalog, fault).expect("select")));
        });
    }

    group.finish();
}

fn bench_stepping(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_stepping");
    let taxonomy = store("Air Detector Alarm");
    let fault = Arc::clone(
        taxonomy
            .fault_arc("Blood Circuit Errors", "Air Detector Alarm")
            .expect("fault"),
    );

    for size in [4, 16, 64].iter() {
        let procedures: Vec<Arc<Procedure>> = (0..*size)
            .map(|p| {
                Arc::new(Procedure {
                    id: format!("proc_{}", p).as_str().into(),
                    title: format!("Procedure {}", p),
                    steps: (0..6).map(|s| format!("step {}", s)).collect(),
                })
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut session = Session::new(Arc::clone(&fault), procedures.clone());
                for i in 0..session.total() {
                    let _ = session.complete_step(i);
                }
                black_box(session.view())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_selection, bench_stepping);
criterion_main!(benches);
