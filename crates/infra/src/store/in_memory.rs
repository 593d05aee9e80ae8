use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use restock_core::ProductId;
use restock_products::Product;
use restock_replenishment::{ForecastRecord, RecommendationRecord};
use restock_sales::SalesObservation;

use super::{
    ForecastRepository, ProductRepository, RecommendationRepository, SalesRepository, Session,
    Store, StoreError,
};

#[derive(Debug, Default, Clone)]
struct Tables {
    sales: Vec<SalesObservation>,
    products: BTreeMap<ProductId, Product>,
    forecasts: Vec<ForecastRecord>,
    recommendations: Vec<RecommendationRecord>,
}

/// In-memory store with transactional sessions.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failing_commits: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail (staged writes are dropped), to exercise
    /// rollback paths.
    pub fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Committed row counts: (sales, products, forecasts, recommendations).
    pub fn row_counts(&self) -> Result<(usize, usize, usize, usize), StoreError> {
        let t = self.read()?;
        Ok((
            t.sales.len(),
            t.products.len(),
            t.forecasts.len(),
            t.recommendations.len(),
        ))
    }
}

impl Store for InMemoryStore {
    fn open(&self) -> Result<Box<dyn Session + '_>, StoreError> {
        Ok(Box::new(InMemorySession {
            store: self,
            staged: Tables::default(),
        }))
    }
}

/// Session over an [`InMemoryStore`]; staged writes live in `staged` until commit.
#[derive(Debug)]
pub struct InMemorySession<'a> {
    store: &'a InMemoryStore,
    staged: Tables,
}

impl SalesRepository for InMemorySession<'_> {
    fn all_sales(&mut self) -> Result<Vec<SalesObservation>, StoreError> {
        let committed = self.store.read()?;
        Ok(committed
            .sales
            .iter()
            .chain(self.staged.sales.iter())
            .cloned()
            .collect())
    }

    fn append_sales(&mut self, records: Vec<SalesObservation>) -> Result<usize, StoreError> {
        let n = records.len();
        self.staged.sales.extend(records);
        Ok(n)
    }
}

impl ProductRepository for InMemorySession<'_> {
    fn all_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let committed = self.store.read()?;
        let mut merged = committed.products.clone();
        merged.extend(
            self.staged
                .products
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(merged.into_values().collect())
    }

    fn insert_products(&mut self, products: Vec<Product>) -> Result<usize, StoreError> {
        let committed = self.store.read()?;
        let n = products.len();
        for p in products {
            let id = p.product_id.clone();
            if committed.products.contains_key(&id) || self.staged.products.contains_key(&id) {
                return Err(StoreError::Conflict(format!("product {id} already exists")));
            }
            self.staged.products.insert(id, p);
        }
        Ok(n)
    }
}

impl ForecastRepository for InMemorySession<'_> {
    fn forecasts_for(&mut self, product_id: &ProductId) -> Result<Vec<ForecastRecord>, StoreError> {
        let committed = self.store.read()?;
        Ok(committed
            .forecasts
            .iter()
            .chain(self.staged.forecasts.iter())
            .filter(|f| &f.product_id == product_id)
            .cloned()
            .collect())
    }

    fn append_forecast(&mut self, record: ForecastRecord) -> Result<(), StoreError> {
        self.staged.forecasts.push(record);
        Ok(())
    }
}

impl RecommendationRepository for InMemorySession<'_> {
    fn append_recommendation(&mut self, record: RecommendationRecord) -> Result<(), StoreError> {
        self.staged.recommendations.push(record);
        Ok(())
    }

    fn all_recommendations(&mut self) -> Result<Vec<RecommendationRecord>, StoreError> {
        let committed = self.store.read()?;
        Ok(committed
            .recommendations
            .iter()
            .chain(self.staged.recommendations.iter())
            .cloned()
            .collect())
    }
}

impl Session for InMemorySession<'_> {
    fn commit(&mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);

        if self.store.take_commit_failure() {
            return Err(StoreError::Commit("injected commit failure".to_string()));
        }

        let mut tables = self
            .store
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Products may have been seeded by another session since staging.
        if let Some(id) = staged
            .products
            .keys()
            .find(|id| tables.products.contains_key(*id))
        {
            return Err(StoreError::Conflict(format!("product {id} already exists")));
        }

        tables.sales.extend(staged.sales);
        tables.products.extend(staged.products);
        tables.forecasts.extend(staged.forecasts);
        tables.recommendations.extend(staged.recommendations);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.staged = Tables::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use restock_products::ProductType;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn forecast(id: &str) -> ForecastRecord {
        ForecastRecord {
            product_id: pid(id),
            forecast_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            predicted_demand: 1.0,
            confidence: 0.5,
            model_used: "additive".to_string(),
            created_at: Utc::now(),
        }
    }

    fn product(id: &str) -> Product {
        Product {
            product_id: pid(id),
            name: id.to_string(),
            category: "Grocery".to_string(),
            product_type: ProductType::NonPerishable,
            shelf_life_days: 30,
            lead_time_days: None,
            supplier: "Acme".to_string(),
        }
    }

    #[test]
    fn staged_writes_are_invisible_to_other_sessions_until_commit() {
        let store = InMemoryStore::new();
        let mut writer = store.open().unwrap();
        writer.append_forecast(forecast("A")).unwrap();

        // Own writes are visible.
        assert_eq!(writer.forecasts_for(&pid("A")).unwrap().len(), 1);

        let mut reader = store.open().unwrap();
        assert!(reader.forecasts_for(&pid("A")).unwrap().is_empty());

        writer.commit().unwrap();
        assert_eq!(reader.forecasts_for(&pid("A")).unwrap().len(), 1);
    }

    #[test]
    fn dropping_a_session_discards_staged_writes() {
        let store = InMemoryStore::new();
        {
            let mut s = store.open().unwrap();
            s.append_forecast(forecast("A")).unwrap();
        }
        assert_eq!(store.row_counts().unwrap().2, 0);
    }

    #[test]
    fn rollback_discards_staged_writes() {
        let store = InMemoryStore::new();
        let mut s = store.open().unwrap();
        s.append_forecast(forecast("A")).unwrap();
        s.rollback().unwrap();
        s.commit().unwrap();
        assert_eq!(store.row_counts().unwrap().2, 0);
    }

    #[test]
    fn injected_commit_failure_drops_staged_writes() {
        let store = InMemoryStore::new();
        store.fail_next_commits(1);

        let mut s = store.open().unwrap();
        s.append_forecast(forecast("A")).unwrap();
        assert!(matches!(s.commit(), Err(StoreError::Commit(_))));
        assert_eq!(store.row_counts().unwrap().2, 0);

        // Only one failure was requested.
        s.append_forecast(forecast("A")).unwrap();
        s.commit().unwrap();
        assert_eq!(store.row_counts().unwrap().2, 1);
    }

    #[test]
    fn duplicate_products_conflict() {
        let store = InMemoryStore::new();
        let mut s = store.open().unwrap();
        s.insert_products(vec![product("B"), product("A")]).unwrap();
        s.commit().unwrap();

        let all = s.all_products().unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let err = s.insert_products(vec![product("A")]).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
