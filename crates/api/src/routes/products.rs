//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use backoffice_core::{Product, ProductDraft, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameters of the paged list.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters of the price filter.
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// List one page of products.
pub async fn list(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Product>>> {
    tracing::info!(page = query.page, size = query.size, "Listing products");
    let products = state
        .products()
        .find_all_paginated(query.page, query.size)
        .await?;
    Ok(Json(products))
}

/// Create a product.
///
/// A body carrying an id replaces that product instead. Both cases answer
/// 200 with the stored document.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    let product = draft.into_product(Utc::now())?;
    let saved = state.products().save(product).await?;
    tracing::info!(
        product_id = ?saved.id(),
        username = %admin.username,
        "Product saved"
    );
    Ok(Json(saved))
}

/// Fetch one product.
pub async fn show(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    state
        .products()
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(id.into_inner()))
}

/// Replace a product. The path id overrides any id in the body.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    draft.id = Some(ProductId::new(id));
    let product = draft.into_product(Utc::now())?;
    let saved = state.products().save(product).await?;
    tracing::info!(
        product_id = ?saved.id(),
        username = %admin.username,
        "Product updated"
    );
    Ok(Json(saved))
}

/// Delete a product. Succeeds whether or not it existed.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    state.products().delete_by_id(&id).await?;
    tracing::info!(product_id = %id, username = %admin.username, "Product deleted");
    Ok(StatusCode::OK)
}

/// Products in one category.
pub async fn by_category(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = state.products().find_by_category(&category).await?;
    tracing::info!(%category, count = products.len(), "Products by category");
    Ok(Json(products))
}

/// Products within a price range, bounds inclusive.
pub async fn by_price(
    RequireUser(_user): RequireUser,
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<Vec<Product>>> {
    let (Some(min), Some(max)) = (query.min, query.max) else {
        return Err(AppError::BadRequest(
            "both min and max are required".to_owned(),
        ));
    };

    let products = state.products().find_by_price_between(min, max).await?;
    tracing::info!(%min, %max, count = products.len(), "Products by price");
    Ok(Json(products))
}
