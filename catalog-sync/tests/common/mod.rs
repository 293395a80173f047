//! In-memory collaborators for integration tests.
//!
//! `InMemorySearch` stores documents by id and evaluates the subset of the
//! query DSL that `ProductSearchRepository` generates. `InMemoryCatalog`
//! holds products, categories and the outbox, and appends a change record on
//! every write the way a transactional catalog writer does.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use catalog_sync::{CatalogError, CatalogStore, ChangeLog};
use catalog_sync_repository::{
    BatchOperationResult, BatchOperationSummary, CategorySource, SearchIndexError,
    SearchIndexProvider,
};
use catalog_sync_shared::{
    Category, ChangeAction, ChangeRecord, Product, ProductDocument, PRODUCT_ENTITY_TYPE,
};
use chrono::Utc;
use serde_json::{json, Value};

/// Write operations seen by the search engine, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOp {
    Index(i32),
    Delete(i32),
    DeleteIndex,
}

#[derive(Default)]
pub struct InMemorySearch {
    documents: Mutex<BTreeMap<i32, ProductDocument>>,
    ops: Mutex<Vec<SearchOp>>,
    /// Remaining failures per product id for single-document writes.
    failures: Mutex<HashMap<i32, usize>>,
    pub refreshes: AtomicUsize,
    pub bulk_requests: AtomicUsize,
}

impl InMemorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed documents without recording write operations.
    pub fn with_documents(documents: Vec<ProductDocument>) -> Self {
        let search = Self::default();
        {
            let mut stored = search.documents.lock().unwrap();
            for document in documents {
                stored.insert(document.id, document);
            }
        }
        search
    }

    /// Fail the next `times` single-document writes for `product_id`.
    pub fn fail_writes_for(&self, product_id: i32, times: usize) {
        self.failures.lock().unwrap().insert(product_id, times);
    }

    pub fn document(&self, product_id: i32) -> Option<ProductDocument> {
        self.documents.lock().unwrap().get(&product_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn ops(&self) -> Vec<SearchOp> {
        self.ops.lock().unwrap().clone()
    }

    fn take_failure(&self, product_id: i32) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&product_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearch {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        if self.take_failure(document.id) {
            return Err(SearchIndexError::index("injected failure"));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        self.ops.lock().unwrap().push(SearchOp::Index(document.id));
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.bulk_requests.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.documents.lock().unwrap();
        let mut ops = self.ops.lock().unwrap();
        let results = documents
            .iter()
            .map(|document| {
                stored.insert(document.id, document.clone());
                ops.push(SearchOp::Index(document.id));
                BatchOperationResult::succeeded(document.document_id())
            })
            .collect();
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn delete_document(&self, product_id: i32) -> Result<(), SearchIndexError> {
        if self.take_failure(product_id) {
            return Err(SearchIndexError::delete("injected failure"));
        }
        self.documents.lock().unwrap().remove(&product_id);
        self.ops.lock().unwrap().push(SearchOp::Delete(product_id));
        Ok(())
    }

    async fn search(&self, request: &Value) -> Result<Value, SearchIndexError> {
        let documents: Vec<ProductDocument> =
            self.documents.lock().unwrap().values().cloned().collect();
        Ok(evaluate(request, &documents))
    }

    async fn count_documents(&self) -> Result<u64, SearchIndexError> {
        Ok(self.len() as u64)
    }

    async fn refresh(&self) -> Result<(), SearchIndexError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_index(&self) -> Result<(), SearchIndexError> {
        self.documents.lock().unwrap().clear();
        self.ops.lock().unwrap().push(SearchOp::DeleteIndex);
        Ok(())
    }
}

/// Evaluate a generated search request against `documents`.
///
/// Scoring is flat, so hits come back in id order. Aggregations are computed
/// over the query matches; the post filter narrows only the hits.
fn evaluate(request: &Value, documents: &[ProductDocument]) -> Value {
    let bool_query = &request["query"]["bool"];

    let matched: Vec<&ProductDocument> = documents
        .iter()
        .filter(|doc| matches_must(&bool_query["must"], doc))
        .filter(|doc| matches_filters(&bool_query["filter"], doc))
        .collect();

    let mut category_counts: BTreeMap<i32, u64> = BTreeMap::new();
    let mut vendor_counts: BTreeMap<String, u64> = BTreeMap::new();
    for doc in &matched {
        for id in &doc.category_path {
            *category_counts.entry(*id).or_insert(0) += 1;
        }
        if !doc.vendor.is_empty() {
            *vendor_counts.entry(doc.vendor.clone()).or_insert(0) += 1;
        }
    }
    let prices: Vec<f64> = matched.iter().map(|doc| doc.price).collect();
    let price_stats = if prices.is_empty() {
        json!({ "count": 0, "min": null, "max": null })
    } else {
        json!({
            "count": prices.len(),
            "min": prices.iter().cloned().fold(f64::INFINITY, f64::min),
            "max": prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    };

    let hits: Vec<&ProductDocument> = matched
        .into_iter()
        .filter(|doc| matches_filters(&request["post_filter"]["bool"]["filter"], doc))
        .collect();
    let total = hits.len();

    let from = request["from"].as_u64().unwrap_or(0) as usize;
    let size = request["size"].as_u64().unwrap_or(10) as usize;
    let page: Vec<Value> = hits
        .into_iter()
        .skip(from)
        .take(size)
        .map(|doc| json!({ "_id": doc.document_id(), "_source": doc }))
        .collect();

    json!({
        "hits": { "total": { "value": total, "relation": "eq" }, "hits": page },
        "aggregations": {
            "categories": {
                "buckets": category_counts
                    .into_iter()
                    .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
                    .collect::<Vec<_>>()
            },
            "vendors": {
                "buckets": vendor_counts
                    .into_iter()
                    .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
                    .collect::<Vec<_>>()
            },
            "price_stats": price_stats
        }
    })
}

fn matches_must(must: &Value, doc: &ProductDocument) -> bool {
    let Some(clauses) = must.as_array() else {
        return true;
    };
    clauses.iter().all(|clause| {
        if clause.get("match_all").is_some() {
            return true;
        }
        let Some(text) = clause["multi_match"]["query"].as_str() else {
            return false;
        };
        let haystack =
            format!("{} {} {}", doc.name, doc.description, doc.vendor).to_lowercase();
        text.split_whitespace()
            .all(|term| haystack.contains(&term.to_lowercase()))
    })
}

fn matches_filters(filters: &Value, doc: &ProductDocument) -> bool {
    let Some(clauses) = filters.as_array() else {
        return true;
    };
    clauses.iter().all(|clause| {
        if let Some(range) = clause["range"].get("price") {
            let above = range["gte"].as_f64().map_or(true, |min| doc.price >= min);
            let below = range["lte"].as_f64().map_or(true, |max| doc.price <= max);
            return above && below;
        }
        if let Some(vendors) = clause["terms"]["vendor.keyword"].as_array() {
            return vendors.iter().any(|v| v.as_str() == Some(doc.vendor.as_str()));
        }
        if let Some(ids) = clause["terms"]["category_path"].as_array() {
            return ids.iter().any(|id| {
                id.as_i64()
                    .map_or(false, |id| doc.category_path.contains(&(id as i32)))
            });
        }
        if let Some(available) = clause["term"]["available"].as_bool() {
            return doc.available == available;
        }
        false
    })
}

#[derive(Default)]
struct CatalogState {
    products: BTreeMap<i32, Product>,
    categories: Vec<Category>,
    outbox: Vec<ChangeRecord>,
    next_id: i64,
}

/// Catalog, category source and change log held in memory.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        let catalog = Self::default();
        catalog.state.lock().unwrap().categories = categories;
        catalog
    }

    /// Seed products without writing change records.
    pub fn seed(&self, products: Vec<Product>) {
        let mut state = self.state.lock().unwrap();
        for product in products {
            state.products.insert(product.id, product);
        }
    }

    /// Write a product and log a Create or Update carrying its snapshot.
    pub fn save_product(&self, product: Product) -> i64 {
        let mut state = self.state.lock().unwrap();
        let action = if state.products.contains_key(&product.id) {
            ChangeAction::Update
        } else {
            ChangeAction::Create
        };
        let payload = serde_json::to_value(&product).unwrap();
        let entity_id = product.id;
        state.products.insert(product.id, product);
        push_record(&mut state, PRODUCT_ENTITY_TYPE, entity_id, action, Some(payload))
    }

    /// Remove a product and log a Delete.
    pub fn remove_product(&self, id: i32) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.products.remove(&id);
        push_record(&mut state, PRODUCT_ENTITY_TYPE, id, ChangeAction::Delete, None)
    }

    /// Log a raw record without touching catalog rows.
    pub fn log_raw(
        &self,
        entity_type: &str,
        entity_id: i32,
        action: ChangeAction,
        payload: Option<Value>,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        push_record(&mut state, entity_type, entity_id, action, payload)
    }

    pub fn pending_ids(&self) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .outbox
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.id)
            .collect()
    }

    pub fn outbox_len(&self) -> usize {
        self.state.lock().unwrap().outbox.len()
    }

    /// Move every processed timestamp back by `age`.
    pub fn age_processed(&self, age: Duration) {
        let age = chrono::Duration::from_std(age).unwrap();
        let mut state = self.state.lock().unwrap();
        for record in state.outbox.iter_mut() {
            if let Some(processed_at) = record.processed_at {
                record.processed_at = Some(processed_at - age);
            }
        }
    }
}

fn push_record(
    state: &mut CatalogState,
    entity_type: &str,
    entity_id: i32,
    action: ChangeAction,
    payload: Option<Value>,
) -> i64 {
    state.next_id += 1;
    let mut record = ChangeRecord::product(state.next_id, entity_id, action, payload);
    record.entity_type = entity_type.to_string();
    state.outbox.push(record);
    state.next_id
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.state.lock().unwrap().products.values().cloned().collect())
    }

    async fn fetch_product(&self, id: i32) -> Result<Option<Product>, CatalogError> {
        Ok(self.state.lock().unwrap().products.get(&id).cloned())
    }
}

#[async_trait]
impl CategorySource for InMemoryCatalog {
    async fn fetch_categories(&self) -> Result<Vec<Category>, SearchIndexError> {
        Ok(self.state.lock().unwrap().categories.clone())
    }
}

#[async_trait]
impl ChangeLog for InMemoryCatalog {
    async fn append(
        &self,
        entity_type: &str,
        entity_id: i32,
        action: ChangeAction,
        payload: Option<&Value>,
    ) -> Result<i64, CatalogError> {
        let mut state = self.state.lock().unwrap();
        Ok(push_record(
            &mut state,
            entity_type,
            entity_id,
            action,
            payload.cloned(),
        ))
    }

    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ChangeRecord>, CatalogError> {
        let state = self.state.lock().unwrap();
        let mut pending: Vec<ChangeRecord> = state
            .outbox
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_processed(&self, ids: &[i64]) -> Result<(), CatalogError> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        for record in state.outbox.iter_mut() {
            if record.is_pending() && ids.contains(&record.id) {
                record.processed_at = Some(now);
            }
        }
        Ok(())
    }

    async fn purge_processed(&self, older_than: Duration) -> Result<u64, CatalogError> {
        let retention = chrono::Duration::from_std(older_than)
            .map_err(|e| CatalogError::invalid_input(e.to_string()))?;
        let cutoff = Utc::now() - retention;
        let mut state = self.state.lock().unwrap();
        let before = state.outbox.len();
        state
            .outbox
            .retain(|r| r.processed_at.map_or(true, |at| at >= cutoff));
        Ok((before - state.outbox.len()) as u64)
    }
}

/// Root 1 with children 7 and 8; 9 sits under 7.
pub fn category_tree() -> Vec<Category> {
    vec![
        Category::new(1, None, "Catalog"),
        Category::new(7, Some(1), "Kitchen"),
        Category::new(8, Some(1), "Garden"),
        Category::new(9, Some(7), "Kettles"),
    ]
}

pub fn product(id: i32, category_id: i32, name: &str, vendor: &str, price: f64) -> Product {
    let mut product = Product::new(id, category_id, name);
    product.vendor = vendor.to_string();
    product.price = price;
    product.available = true;
    product
}
