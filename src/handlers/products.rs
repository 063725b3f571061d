use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{FieldErrors, NewProduct, ProductChanges, ProductDetail, ProductId, ProductList};
use crate::error::ApiError;
use crate::filter::{FilterParams, ProductFilter};
use crate::middleware::{ActorId, ApiResponse, ApiResult};
use crate::services::{ListRequest, ServiceError};

/// Listing query string. `paginate` is the page size.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub paginate: Option<i64>,
    pub category_ids: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub keyword: Option<String>,
}

impl ListQuery {
    fn into_request(self) -> Result<ListRequest, ServiceError> {
        let filter = ProductFilter::parse(FilterParams {
            category_ids: self.category_ids.as_deref(),
            min_price: self.min_price,
            max_price: self.max_price,
            keyword: self.keyword.as_deref(),
        })?;

        Ok(ListRequest {
            page: self.page,
            page_size: self.paginate,
            filter,
        })
    }
}

/// POST /products body. Fields are optional here so that absent ones are
/// reported per field instead of as a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub shop_id: Option<String>,
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
}

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, ServiceError> {
        let mut errors = FieldErrors::new();
        let shop_id = uuid_field(self.shop_id, "shop_id", &mut errors);
        let category_id = uuid_field(self.category_id, "category_id", &mut errors);
        let name = required(self.name, "name", &mut errors);
        let description = required(self.description, "description", &mut errors);
        let price = required(self.price, "price", &mut errors);
        let stock = stock_field(self.stock, &mut errors);

        match (shop_id, category_id, name, description, price, stock) {
            (Some(shop_id), Some(category_id), Some(name), Some(description), Some(price), Some(stock))
                if errors.is_empty() =>
            {
                Ok(NewProduct { shop_id, category_id, name, description, price, stock })
            }
            _ => Err(ServiceError::validation("Invalid product", errors)),
        }
    }
}

/// PATCH /products/:id body
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
}

impl UpdateProductRequest {
    fn into_changes(self) -> Result<ProductChanges, ServiceError> {
        let mut errors = FieldErrors::new();
        let category_id = uuid_field(self.category_id, "category_id", &mut errors);
        let name = required(self.name, "name", &mut errors);
        let description = required(self.description, "description", &mut errors);
        let price = required(self.price, "price", &mut errors);
        let stock = stock_field(self.stock, &mut errors);

        match (category_id, name, description, price, stock) {
            (Some(category_id), Some(name), Some(description), Some(price), Some(stock)) if errors.is_empty() => {
                Ok(ProductChanges { category_id, name, description, price, stock })
            }
            _ => Err(ServiceError::validation("Invalid product", errors)),
        }
    }
}

fn required<T>(value: Option<T>, field: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() {
        errors.insert(field.to_string(), "This field is required".to_string());
    }
    value
}

fn uuid_field(value: Option<String>, field: &str, errors: &mut FieldErrors) -> Option<Uuid> {
    let raw = required(value, field, errors)?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.insert(field.to_string(), "Must be a valid UUID".to_string());
            None
        }
    }
}

fn stock_field(value: Option<i64>, errors: &mut FieldErrors) -> Option<i32> {
    let raw = required(value, "stock", errors)?;
    match i32::try_from(raw) {
        Ok(stock) => Some(stock),
        Err(_) => {
            errors.insert("stock".to_string(), "Out of range".to_string());
            None
        }
    }
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ProductList> {
    let req = list_request(query, "list_products")?;
    let list = state.services.queries.list(req).await?;
    Ok(ApiResponse::success(list))
}

/// GET /shops/:shop_id/products
pub async fn list_shop_products(
    State(state): State<AppState>,
    shop_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ProductList> {
    let shop_id = path_id(shop_id, "shop_id")?;
    let req = list_request(query, "list_shop_products")?;
    let list = state.services.queries.list_by_shop(shop_id, req).await?;
    Ok(ApiResponse::success(list))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ProductDetail> {
    let id = path_id(id, "id")?;
    let product = state.services.queries.get(id).await?;
    Ok(ApiResponse::success(product))
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<ProductId> {
    let product = json_body(body, "create_product")?.into_new_product()?;
    let created = state.services.mutations.create(actor, product).await?;
    Ok(ApiResponse::created(created))
}

/// PATCH /products/:id
pub async fn update_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<ProductId> {
    let id = path_id(id, "id")?;
    let changes = json_body(body, "update_product")?.into_changes()?;
    let updated = state.services.mutations.update(id, actor, changes).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let id = path_id(id, "id")?;
    state.services.mutations.delete(id, actor).await?;
    Ok(ApiResponse::success(()))
}

fn list_request(query: Result<Query<ListQuery>, QueryRejection>, handler: &str) -> Result<ListRequest, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::warn!("handler::{} - parse request query: {}", handler, rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;
    Ok(query.into_request()?)
}

fn path_id(path: Result<Path<Uuid>, PathRejection>, field: &str) -> Result<Uuid, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::warn!("handler - invalid {} path segment: {}", field, rejection.body_text());
            let mut field_errors = HashMap::new();
            field_errors.insert(field.to_string(), "must be a valid UUID".to_string());
            Err(ApiError::validation_error("Invalid path parameter", Some(field_errors)))
        }
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>, handler: &str) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::warn!("handler::{} - parse request body: {}", handler, rejection.body_text());
            Err(ApiError::invalid_json(rejection.body_text()))
        }
    }
}
