use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Meta;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// One entry of a product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
}

/// Listing row carrying the window count of the whole result set
#[derive(Debug, Clone, FromRow)]
pub struct ProductItemRow {
    pub total_data: i64,
    #[sqlx(flatten)]
    pub item: ProductItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductList {
    pub items: Vec<ProductItem>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

/// Product joined with its category. Category fields are empty when the
/// product has no category or points at one that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category: CategoryRef,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductDetailRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category: CategoryRef {
                id: row.category_id,
                name: row.category_name,
            },
        }
    }
}

/// Ownership chain of a live product: product -> shop -> user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductOwnership {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub shop_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductId {
    pub id: Uuid,
}

pub type FieldErrors = HashMap<String, String>;

impl NewProduct {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        into_result(validate_fields(&self.name, &self.description, self.price, self.stock))
    }
}

impl ProductChanges {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        into_result(validate_fields(&self.name, &self.description, self.price, self.stock))
    }
}

fn validate_fields(name: &str, description: &str, price: i64, stock: i32) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if name.trim().is_empty() {
        errors.insert("name".to_string(), "This field is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.insert("name".to_string(), format!("Must be at most {} characters", MAX_NAME_LEN));
    }

    if description.trim().is_empty() {
        errors.insert("description".to_string(), "This field is required".to_string());
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.insert("description".to_string(), format!("Must be at most {} characters", MAX_DESCRIPTION_LEN));
    }

    if price < 0 {
        errors.insert("price".to_string(), "Must be greater than or equal to 0".to_string());
    }
    if stock < 0 {
        errors.insert("stock".to_string(), "Must be greater than or equal to 0".to_string());
    }

    errors
}

fn into_result(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
