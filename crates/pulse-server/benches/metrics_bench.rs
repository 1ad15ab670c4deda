use std::sync::Arc;

use axum::http::{Method, StatusCode};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pulse_server::init_metrics;
use pulse_server::metrics::http::RouteLabels;
use pulse_server::settings::MetricsSettings;

/// Settings sin collector de proceso para medir solo las metricas HTTP
fn settings() -> MetricsSettings {
    MetricsSettings {
        process_metrics: false,
        ..MetricsSettings::default()
    }
}

fn bench_request_cycle(c: &mut Criterion) {
    let (_registry, http) = init_metrics(&settings()).unwrap();
    let http = Arc::new(http);
    let route = RouteLabels::new(Method::GET, "/dummy");

    c.bench_function("request_enter_and_finish", |b| {
        b.iter(|| {
            let mut in_flight = http.enter(route.clone());
            in_flight.set_status(StatusCode::OK);
            in_flight.finish();
        })
    });
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for routes in [1usize, 10, 100] {
        let (registry, http) = init_metrics(&settings()).unwrap();
        let http = Arc::new(http);

        for i in 0..routes {
            let mut in_flight = http.enter(RouteLabels::new(Method::GET, format!("/route-{}", i)));
            in_flight.set_status(StatusCode::OK);
            in_flight.finish();
        }

        group.bench_with_input(BenchmarkId::from_parameter(routes), &registry, |b, registry| {
            b.iter(|| registry.serialize().unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_request_cycle, bench_serialize);
criterion_main!(benches);
