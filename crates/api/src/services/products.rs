//! Product service.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use backoffice_core::{Product, ProductId};

use super::ServiceError;
use crate::db::{PageRequest, ProductGateway};

/// Product catalog operations.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductGateway>,
}

impl ProductService {
    /// Create a new product service.
    #[must_use]
    pub fn new(products: Arc<dyn ProductGateway>) -> Self {
        Self { products }
    }

    /// One zero-based page of products in insertion order.
    ///
    /// No total count is returned; a page past the end is empty.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::BadRequest` if `size` is 0.
    pub async fn find_all_paginated(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Vec<Product>, ServiceError> {
        if size == 0 {
            return Err(ServiceError::BadRequest(
                "page size must be at least 1".to_owned(),
            ));
        }
        Ok(self.products.find_page(PageRequest { page, size }).await?)
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ServiceError> {
        Ok(self.products.find_by_id(id).await?)
    }

    /// Create or update a product.
    ///
    /// A product that already carries an id is an update, so its
    /// `updatedAt` is refreshed before it is written.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn save(&self, mut product: Product) -> Result<Product, ServiceError> {
        if product.id().is_some() {
            product.touch(Utc::now());
        }
        Ok(self.products.save(product).await?)
    }

    /// Delete a product. Missing ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn delete_by_id(&self, id: &ProductId) -> Result<(), ServiceError> {
        Ok(self.products.delete_by_id(id).await?)
    }

    /// Products in exactly this category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, ServiceError> {
        Ok(self.products.find_by_category(category).await?)
    }

    /// Products priced within `[min, max]`. An inverted range matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn find_by_price_between(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, ServiceError> {
        if min > max {
            return Ok(Vec::new());
        }
        Ok(self.products.find_by_price_between(min, max).await?)
    }
}
