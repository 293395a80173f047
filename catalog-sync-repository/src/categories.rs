//! In-memory category hierarchy.
//!
//! `CategoryPathResolver` loads the whole category forest once and answers
//! root-to-node path, name and parent lookups without touching the catalog.
//! Every load builds a fresh immutable snapshot outside the lock; the lock is
//! held only to swap the `Arc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use catalog_sync_shared::{Category, Product, ProductDocument};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::errors::SearchIndexError;
use crate::interfaces::CategorySource;

/// Immutable view of one loaded category forest.
#[derive(Debug, Default)]
struct CategorySnapshot {
    parents: HashMap<i32, Option<i32>>,
    names: HashMap<i32, String>,
    paths: HashMap<i32, Vec<i32>>,
}

impl CategorySnapshot {
    fn build(categories: Vec<Category>) -> Self {
        let mut parents = HashMap::with_capacity(categories.len());
        let mut names = HashMap::with_capacity(categories.len());
        for category in categories {
            parents.insert(category.id, category.parent_id);
            names.insert(category.id, category.name);
        }

        let mut paths = HashMap::with_capacity(parents.len());
        for &id in parents.keys() {
            paths.insert(id, Self::walk(&parents, id));
        }

        // A parent pointing outside the loaded set is a root, not a dangling edge.
        let parents = parents
            .iter()
            .map(|(&id, parent)| (id, parent.filter(|p| parents.contains_key(p))))
            .collect();

        Self {
            parents,
            names,
            paths,
        }
    }

    /// Walk parent pointers from `id` up to a root.
    ///
    /// Stops at a node without a parent, at a parent that is not loaded, or
    /// when the chain revisits a node.
    fn walk(parents: &HashMap<i32, Option<i32>>, id: i32) -> Vec<i32> {
        let mut path = vec![id];
        let mut seen = HashSet::from([id]);
        let mut current = id;

        while let Some(Some(parent)) = parents.get(&current) {
            if !parents.contains_key(parent) {
                break;
            }
            if !seen.insert(*parent) {
                warn!(category_id = id, parent_id = parent, "Category cycle detected");
                break;
            }
            path.push(*parent);
            current = *parent;
        }

        path.reverse();
        path
    }
}

/// Resolves category ids to their root-to-node path and display name.
///
/// Reads never block on a reload for longer than a pointer swap, and always
/// observe either the previous or the new forest, never a mix.
pub struct CategoryPathResolver {
    source: Arc<dyn CategorySource>,
    snapshot: RwLock<Arc<CategorySnapshot>>,
}

impl CategoryPathResolver {
    /// Create an empty resolver. Call [`load`](Self::load) before use.
    pub fn new(source: Arc<dyn CategorySource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(CategorySnapshot::default())),
        }
    }

    /// Create a resolver already populated with a fixed category set.
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let snapshot = CategorySnapshot::build(categories.clone());
        Self {
            source: Arc::new(categories),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Fetch every category from the source and replace the loaded forest.
    ///
    /// On error the previous forest stays in place.
    pub async fn load(&self) -> Result<(), SearchIndexError> {
        let categories = self.source.fetch_categories().await?;
        let count = categories.len();
        self.replace(categories);
        info!(categories = count, "Category hierarchy loaded");
        Ok(())
    }

    /// Replace the loaded forest with `categories`.
    pub fn replace(&self, categories: Vec<Category>) {
        let snapshot = Arc::new(CategorySnapshot::build(categories));
        *self.snapshot.write() = snapshot;
    }

    fn current(&self) -> Arc<CategorySnapshot> {
        Arc::clone(&*self.snapshot.read())
    }

    /// Root-to-node id path, or `[id]` for an unknown category.
    pub fn get_path(&self, category_id: i32) -> Vec<i32> {
        match self.current().paths.get(&category_id) {
            Some(path) => path.clone(),
            None => {
                debug!(category_id, "Unknown category, using single-element path");
                vec![category_id]
            }
        }
    }

    /// Display name, or an empty string for an unknown category.
    pub fn get_name(&self, category_id: i32) -> String {
        self.current()
            .names
            .get(&category_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Parent id, or `None` for roots and unknown categories.
    pub fn get_parent_id(&self, category_id: i32) -> Option<i32> {
        self.current().parents.get(&category_id).copied().flatten()
    }

    /// Number of loaded categories.
    pub fn len(&self) -> usize {
        self.current().paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Denormalize a catalog product into its search document.
    pub fn document_for(&self, product: &Product) -> ProductDocument {
        let snapshot = self.current();
        let path = snapshot
            .paths
            .get(&product.category_id)
            .cloned()
            .unwrap_or_else(|| vec![product.category_id]);
        let name = snapshot
            .names
            .get(&product.category_id)
            .cloned()
            .unwrap_or_default();
        ProductDocument::from_product(product, path, name)
    }
}
