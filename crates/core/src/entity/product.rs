//! Product document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{Price, PriceError, ProductId};

/// Errors raised when a product would violate its field constraints.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// A required field was not supplied.
    #[error("{0} is mandatory")]
    Missing(&'static str),

    /// A required text field was empty or whitespace.
    #[error("{0} must not be blank")]
    Blank(&'static str),

    /// The price is zero or negative.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// The stock level is below zero.
    #[error("stock cannot be negative (got {0})")]
    NegativeStock(i64),

    /// The stock level does not fit the stored integer.
    #[error("stock is too large (got {0})")]
    StockOutOfRange(i64),
}

/// A catalog product.
///
/// Fields are private so the invariants hold after construction:
/// the name and category are never blank, the price is always positive and
/// the stock is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ProductId>,
    name: String,
    price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    stock: u32,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new, unsaved product stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns a `ProductError` if any field violates its constraint.
    pub fn new(
        name: &str,
        price: Decimal,
        description: Option<String>,
        stock: i64,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ProductError> {
        Ok(Self {
            id: None,
            name: non_blank(name, "name")?,
            price: Price::new(price)?,
            description: description.filter(|d| !d.trim().is_empty()),
            stock: checked_stock(stock)?,
            category: non_blank(category, "category")?,
            created_at: now,
            updated_at: now,
        })
    }

    /// The store-assigned id, if this product has been saved.
    #[must_use]
    pub const fn id(&self) -> Option<&ProductId> {
        self.id.as_ref()
    }

    /// Product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Optional free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Units in stock.
    #[must_use]
    pub const fn stock(&self) -> u32 {
        self.stock
    }

    /// Category used by the category filter.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// When the product was first created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the product was last saved.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Assign the document id. The path id of an update always wins over
    /// whatever id the request body carried.
    pub fn set_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    /// Rename the product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Blank` if the name is blank.
    pub fn set_name(&mut self, name: &str) -> Result<(), ProductError> {
        self.name = non_blank(name, "name")?;
        Ok(())
    }

    /// Change the price.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Price` if the price is zero or negative; the
    /// current price is left untouched.
    pub fn set_price(&mut self, price: Decimal) -> Result<(), ProductError> {
        self.price = Price::new(price)?;
        Ok(())
    }

    /// Change the stock level.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NegativeStock` if the level is below zero.
    pub fn set_stock(&mut self, stock: i64) -> Result<(), ProductError> {
        self.stock = checked_stock(stock)?;
        Ok(())
    }

    /// Change the category.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Blank` if the category is blank.
    pub fn set_category(&mut self, category: &str) -> Result<(), ProductError> {
        self.category = non_blank(category, "category")?;
        Ok(())
    }

    /// Replace the description. Blank text clears it.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
    }

    /// Refresh the last-modified timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Carry over the creation timestamp of the stored document this
    /// product replaces.
    pub fn keep_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
    }
}

/// Loosely-typed product body as sent by clients.
///
/// Every field is optional so that a missing field turns into a
/// `ProductError` (a 400) instead of a JSON decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, serialize_with = "serialize_amount")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductDraft {
    /// Validate the draft into a product stamped with `now`.
    ///
    /// An id in the draft is kept, which turns the save into an update.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Missing` for absent fields, or the constraint
    /// error of the first invalid field.
    pub fn into_product(self, now: DateTime<Utc>) -> Result<Product, ProductError> {
        let name = self.name.ok_or(ProductError::Missing("name"))?;
        let price = self.price.ok_or(ProductError::Missing("price"))?;
        let stock = self.stock.ok_or(ProductError::Missing("stock"))?;
        let category = self.category.ok_or(ProductError::Missing("category"))?;

        let mut product = Product::new(&name, price, self.description, stock, &category, now)?;
        if let Some(id) = self.id {
            product.set_id(id);
        }
        Ok(product)
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: Some(product.name.clone()),
            price: Some(product.price.amount()),
            description: product.description.clone(),
            stock: Some(i64::from(product.stock)),
            category: Some(product.category.clone()),
        }
    }
}

/// Write draft prices as JSON numbers, like stored products.
#[allow(clippy::ref_option)]
fn serialize_amount<S: serde::Serializer>(
    amount: &Option<Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match amount.and_then(|a| a.to_f64()) {
        Some(value) => serializer.serialize_some(&value),
        None => serializer.serialize_none(),
    }
}

fn non_blank(value: &str, field: &'static str) -> Result<String, ProductError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductError::Blank(field));
    }
    Ok(trimmed.to_owned())
}

fn checked_stock(stock: i64) -> Result<u32, ProductError> {
    if stock < 0 {
        return Err(ProductError::NegativeStock(stock));
    }
    u32::try_from(stock).map_err(|_| ProductError::StockOutOfRange(stock))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lamp() -> Product {
        Product::new(
            "Desk lamp",
            Decimal::new(2450, 2),
            Some("Warm light".to_owned()),
            12,
            "lighting",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_sets_both_timestamps() {
        let product = lamp();
        assert_eq!(product.created_at(), product.updated_at());
        assert!(product.id().is_none());
    }

    #[test]
    fn test_new_rejects_non_positive_price() {
        let err = Product::new("x", Decimal::ZERO, None, 1, "c", Utc::now()).unwrap_err();
        assert!(matches!(err, ProductError::Price(_)));

        let err = Product::new("x", Decimal::new(-1, 0), None, 1, "c", Utc::now()).unwrap_err();
        assert!(matches!(err, ProductError::Price(_)));
    }

    #[test]
    fn test_new_rejects_negative_stock_and_blank_fields() {
        assert_eq!(
            Product::new("x", Decimal::ONE, None, -1, "c", Utc::now()).unwrap_err(),
            ProductError::NegativeStock(-1)
        );
        assert_eq!(
            Product::new("  ", Decimal::ONE, None, 1, "c", Utc::now()).unwrap_err(),
            ProductError::Blank("name")
        );
        assert_eq!(
            Product::new("x", Decimal::ONE, None, 1, "", Utc::now()).unwrap_err(),
            ProductError::Blank("category")
        );
    }

    #[test]
    fn test_set_price_keeps_old_value_on_error() {
        let mut product = lamp();
        assert!(product.set_price(Decimal::new(-250, 2)).is_err());
        assert_eq!(product.price().amount(), Decimal::new(2450, 2));

        product.set_price(Decimal::new(1999, 2)).unwrap();
        assert_eq!(product.price().amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_draft_reports_missing_fields() {
        let draft = ProductDraft {
            name: Some("Mug".to_owned()),
            price: Some(Decimal::ONE),
            stock: None,
            category: Some("kitchen".to_owned()),
            ..ProductDraft::default()
        };
        assert_eq!(
            draft.into_product(Utc::now()).unwrap_err(),
            ProductError::Missing("stock")
        );
    }

    #[test]
    fn test_draft_from_json_body() {
        let draft: ProductDraft = serde_json::from_str(
            r#"{"name":"Mug","price":8.5,"stock":3,"category":"kitchen","description":""}"#,
        )
        .unwrap();
        let product = draft.into_product(Utc::now()).unwrap();
        assert_eq!(product.price().amount(), Decimal::new(85, 1));
        assert_eq!(product.description(), None);
    }

    #[test]
    fn test_draft_sends_price_as_number() {
        let draft = ProductDraft::from(&lamp());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["price"], serde_json::json!(24.5));
        assert_eq!(json["stock"], serde_json::json!(12));
    }

    #[test]
    fn test_json_uses_camel_case_and_omits_missing_id() {
        let json = serde_json::to_value(lamp()).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["price"], serde_json::json!(24.5));
    }
}
