//! `PostgreSQL` used as a document store.
//!
//! Every collection lives in the `documents` table as a JSONB `body` keyed
//! by `(collection, id)`. Field predicates run directly over the JSON
//! (`body->>'category'`, `(body->>'price')::numeric`). Queries are built at
//! runtime since the document shape is owned by `backoffice-core`, not by a
//! table schema.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;

use backoffice_core::{Product, ProductId, User, UserId};

use super::{
    GatewayError, PRODUCTS, PageRequest, ProductGateway, StoreHealth, USERS, UserGateway,
    new_document_id,
};

/// Replacing a product keeps the `createdAt` of the stored document.
const UPSERT_PRODUCT: &str = r"
    INSERT INTO documents (collection, id, body)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, id) DO UPDATE
    SET body = EXCLUDED.body || jsonb_build_object(
        'createdAt',
        COALESCE(documents.body->'createdAt', EXCLUDED.body->'createdAt')
    )
    RETURNING body
";

const UPSERT_DOCUMENT: &str = r"
    INSERT INTO documents (collection, id, body)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, id) DO UPDATE
    SET body = EXCLUDED.body
    RETURNING body
";

/// Gateway backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn upsert<T>(
        &self,
        sql: &str,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<T, GatewayError>
    where
        T: Serialize + DeserializeOwned,
    {
        let body = serde_json::to_value(doc)?;
        let stored: Value = sqlx::query_scalar(sql)
            .bind(collection)
            .bind(id)
            .bind(body)
            .fetch_one(&self.pool)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }
}

/// Decode a list of document bodies, failing on the first corrupt one.
fn decode_all<T: DeserializeOwned>(bodies: Vec<Value>) -> Result<Vec<T>, GatewayError> {
    bodies
        .into_iter()
        .map(|body| serde_json::from_value(body).map_err(GatewayError::from))
        .collect()
}

#[async_trait]
impl ProductGateway for PgDocumentStore {
    async fn save(&self, mut product: Product) -> Result<Product, GatewayError> {
        let id = product
            .id()
            .map_or_else(new_document_id, |id| id.as_str().to_owned());
        product.set_id(ProductId::new(id.clone()));

        self.upsert(UPSERT_PRODUCT, PRODUCTS, &id, &product).await
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        let body: Option<Value> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(PRODUCTS)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        body.map(serde_json::from_value)
            .transpose()
            .map_err(GatewayError::from)
    }

    async fn find_page(&self, page: PageRequest) -> Result<Vec<Product>, GatewayError> {
        let limit = i64::from(page.size);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let bodies: Vec<Value> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY seq LIMIT $2 OFFSET $3",
        )
        .bind(PRODUCTS)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        decode_all(bodies)
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(PRODUCTS)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, GatewayError> {
        let bodies: Vec<Value> = sqlx::query_scalar(
            "SELECT body FROM documents
             WHERE collection = $1 AND body->>'category' = $2
             ORDER BY seq",
        )
        .bind(PRODUCTS)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        decode_all(bodies)
    }

    async fn find_by_price_between(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, GatewayError> {
        let bodies: Vec<Value> = sqlx::query_scalar(
            "SELECT body FROM documents
             WHERE collection = $1 AND (body->>'price')::numeric BETWEEN $2 AND $3
             ORDER BY seq",
        )
        .bind(PRODUCTS)
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        decode_all(bodies)
    }
}

#[async_trait]
impl UserGateway for PgDocumentStore {
    async fn save(&self, mut user: User) -> Result<User, GatewayError> {
        let id = user
            .id
            .get_or_insert_with(|| UserId::new(new_document_id()))
            .as_str()
            .to_owned();

        self.upsert(UPSERT_DOCUMENT, USERS, &id, &user).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, GatewayError> {
        let body: Option<Value> = sqlx::query_scalar(
            "SELECT body FROM documents
             WHERE collection = $1 AND body->>'username' = $2
             ORDER BY seq
             LIMIT 1",
        )
        .bind(USERS)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        body.map(serde_json::from_value)
            .transpose()
            .map_err(GatewayError::from)
    }
}

#[async_trait]
impl StoreHealth for PgDocumentStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
