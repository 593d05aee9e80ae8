//! End-to-end planning run over the in-memory store: forecast every product,
//! then derive recommendations.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use restock_ai::AdditiveModel;
use restock_core::ProductId;
use restock_infra::{ForecastEngine, ForecastSettings, InMemoryStore, RecommendationEngine, Store};
use restock_products::{Product, ProductType};
use restock_replenishment::ReorderPolicy;
use restock_sales::SalesObservation;

fn seeded_store(products: usize, days: u64) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut catalog = Vec::with_capacity(products);
    let mut sales = Vec::with_capacity(products * days as usize);
    for p in 0..products {
        let id = ProductId::parse(format!("SKU_{p:04}")).unwrap();
        catalog.push(Product {
            product_id: id.clone(),
            name: format!("Product {p}"),
            category: "Bench".to_string(),
            product_type: ProductType::NonPerishable,
            shelf_life_days: 365,
            lead_time_days: Some((p % 10) as u32),
            supplier: "Bench Supply".to_string(),
        });
        for d in 0..days {
            let qty = 10.0 + (p % 7) as f64 + if d % 7 >= 5 { 4.0 } else { 0.0 };
            sales.push(SalesObservation::new(id.clone(), start + Days::new(d), qty));
        }
    }

    {
        let mut session = store.open().unwrap();
        session.insert_products(catalog).unwrap();
        session.append_sales(sales).unwrap();
        session.commit().unwrap();
    }
    store
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning_run");
    group.sample_size(10);

    for products in [10usize, 100] {
        group.throughput(Throughput::Elements(products as u64));
        group.bench_with_input(BenchmarkId::from_parameter(products), &products, |b, &n| {
            b.iter_batched(
                || seeded_store(n, 90),
                |store| {
                    let forecast = ForecastEngine::new(
                        store.clone(),
                        Arc::new(AdditiveModel::default()),
                        ForecastSettings::default(),
                    )
                    .unwrap();
                    forecast.run_forecast(14).unwrap();
                    RecommendationEngine::new(store, ReorderPolicy::default())
                        .unwrap()
                        .run_recommendations()
                        .unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
