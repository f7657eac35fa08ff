//! In-process document store.
//!
//! Keeps every collection in memory behind a single tokio `RwLock`. Used
//! when `BACKOFFICE_STORE=memory` and by the test suites. Nothing survives
//! a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use backoffice_core::{Product, ProductId, User, UserId};

use super::{
    GatewayError, PageRequest, ProductGateway, StoreHealth, UserGateway, new_document_id,
};

/// Documents of one collection in insertion order.
struct Collection<T> {
    by_seq: BTreeMap<u64, T>,
    seq_by_id: HashMap<String, u64>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            by_seq: BTreeMap::new(),
            seq_by_id: HashMap::new(),
        }
    }
}

impl<T: Clone> Collection<T> {
    fn get(&self, id: &str) -> Option<&T> {
        self.seq_by_id.get(id).and_then(|seq| self.by_seq.get(seq))
    }

    /// Replace in place when the id exists, otherwise append under `next_seq`.
    fn upsert(&mut self, id: String, doc: T, next_seq: &mut u64) {
        if let Some(seq) = self.seq_by_id.get(&id) {
            self.by_seq.insert(*seq, doc);
            return;
        }
        *next_seq += 1;
        self.seq_by_id.insert(id, *next_seq);
        self.by_seq.insert(*next_seq, doc);
    }

    fn remove(&mut self, id: &str) {
        if let Some(seq) = self.seq_by_id.remove(id) {
            self.by_seq.remove(&seq);
        }
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.by_seq.values().filter(|doc| predicate(doc)).cloned().collect()
    }
}

#[derive(Default)]
struct Collections {
    next_seq: u64,
    products: Collection<Product>,
    users: Collection<User>,
}

/// Document store held entirely in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductGateway for MemoryDocumentStore {
    async fn save(&self, mut product: Product) -> Result<Product, GatewayError> {
        let mut guard = self.inner.write().await;
        let collections = &mut *guard;

        let id = product
            .id()
            .map_or_else(new_document_id, |id| id.as_str().to_owned());
        if let Some(existing) = collections.products.get(&id) {
            product.keep_created_at(existing.created_at());
        }
        product.set_id(ProductId::new(id.clone()));

        collections
            .products
            .upsert(id, product.clone(), &mut collections.next_seq);
        Ok(product)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        let guard = self.inner.read().await;
        Ok(guard.products.get(id.as_str()).cloned())
    }

    async fn find_page(&self, page: PageRequest) -> Result<Vec<Product>, GatewayError> {
        let guard = self.inner.read().await;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.size).unwrap_or(usize::MAX);
        Ok(guard
            .products
            .by_seq
            .values()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<(), GatewayError> {
        self.inner.write().await.products.remove(id.as_str());
        Ok(())
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, GatewayError> {
        let guard = self.inner.read().await;
        Ok(guard.products.filter(|p| p.category() == category))
    }

    async fn find_by_price_between(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, GatewayError> {
        let guard = self.inner.read().await;
        Ok(guard.products.filter(|p| {
            let price = p.price().amount();
            price >= min && price <= max
        }))
    }
}

#[async_trait]
impl UserGateway for MemoryDocumentStore {
    async fn save(&self, mut user: User) -> Result<User, GatewayError> {
        let mut guard = self.inner.write().await;
        let collections = &mut *guard;

        let id = user
            .id
            .get_or_insert_with(|| UserId::new(new_document_id()))
            .as_str()
            .to_owned();

        collections
            .users
            .upsert(id, user.clone(), &mut collections.next_seq);
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, GatewayError> {
        let guard = self.inner.read().await;
        Ok(guard
            .users
            .by_seq
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryDocumentStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
