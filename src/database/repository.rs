use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    NewProduct, ProductChanges, ProductDetail, ProductDetailRow, ProductItem, ProductItemRow, ProductOwnership,
};
use crate::database::query_builder::{QueryBuilder, QueryLog};
use crate::filter::{FilterWhere, ProductFilter};
use crate::types::PageRequest;

/// One page of listing rows plus the window count of the whole match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    pub items: Vec<ProductItem>,
    pub total_data: i64,
}

/// Storage operations the product services depend on.
///
/// Lookups return `Ok(None)` when no live row matches; classifying that as
/// not-found is the caller's job.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(
        &self,
        shop_id: Option<Uuid>,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ProductPage, DatabaseError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetail>, DatabaseError>;

    async fn find_ownership(&self, id: Uuid) -> Result<Option<ProductOwnership>, DatabaseError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<Uuid, DatabaseError>;

    /// Applies `changes` only while `owner_id` still owns the live product
    async fn update_product(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Uuid>, DatabaseError>;

    /// Sets `deleted_at` only while `owner_id` still owns the live product.
    /// Returns the number of rows affected.
    async fn soft_delete_product(&self, id: Uuid, owner_id: Uuid) -> Result<u64, DatabaseError>;

    /// Physically removes every soft-deleted product
    async fn purge_deleted_products(&self) -> Result<u64, DatabaseError>;
}

pub type DynProductRepository = Arc<dyn ProductRepository>;

const LIST_PROJECTION: &str = r#"
    SELECT
        COUNT(p.id) OVER() AS total_data,
        p.id,
        p.name,
        p.price,
        p.stock
    FROM products p
"#;

pub struct PgProductRepository {
    pool: PgPool,
    log: QueryLog,
}

impl PgProductRepository {
    pub fn new(pool: PgPool, log: QueryLog) -> Self {
        Self { pool, log }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_products(
        &self,
        shop_id: Option<Uuid>,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ProductPage, DatabaseError> {
        let label = if shop_id.is_some() { "repository::list_products_by_shop" } else { "repository::list_products" };
        let query = QueryBuilder::<ProductItemRow>::new(LIST_PROJECTION, FilterWhere::generate(shop_id, filter, page));
        self.log.statement(label, query.sql(), query.params());

        let started = Instant::now();
        let rows = query.select_all(&self.pool).await.map_err(|e| {
            tracing::error!("{} - failed to list products: {}", label, e);
            e
        })?;
        self.log.finished(label, started);

        let total_data = rows.first().map(|r| r.total_data).unwrap_or(0);
        Ok(ProductPage {
            items: rows.into_iter().map(|r| r.item).collect(),
            total_data,
        })
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetail>, DatabaseError> {
        let sql = r#"
            SELECT
                p.id,
                p.shop_id,
                p.name,
                p.description,
                p.price,
                p.stock,
                p.category_id,
                c.name AS category_name
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.id
            WHERE
                p.deleted_at IS NULL
                AND p.id = $1
        "#;
        self.log.statement("repository::find_product", sql, &[]);

        let started = Instant::now();
        let row = sqlx::query_as::<_, ProductDetailRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("repository::find_product - failed to get product {}: {}", id, e);
                DatabaseError::from(e)
            })?;
        self.log.finished("repository::find_product", started);

        Ok(row.map(ProductDetail::from))
    }

    async fn find_ownership(&self, id: Uuid) -> Result<Option<ProductOwnership>, DatabaseError> {
        // Inner join: a product whose shop is missing or soft-deleted has no
        // valid owner and is treated as absent.
        let sql = r#"
            SELECT
                p.id,
                p.shop_id,
                s.user_id
            FROM products p
            INNER JOIN shops s ON p.shop_id = s.id
            WHERE
                p.deleted_at IS NULL
                AND s.deleted_at IS NULL
                AND p.id = $1
        "#;
        self.log.statement("repository::find_ownership", sql, &[]);

        let started = Instant::now();
        let row = sqlx::query_as::<_, ProductOwnership>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("repository::find_ownership - failed to verify product {}: {}", id, e);
                DatabaseError::from(e)
            })?;
        self.log.finished("repository::find_ownership", started);

        Ok(row)
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Uuid, DatabaseError> {
        let sql = r#"
            INSERT INTO products (shop_id, category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#;
        self.log.statement("repository::insert_product", sql, &[]);

        let started = Instant::now();
        let (id,): (Uuid,) = sqlx::query_as(sql)
            .bind(product.shop_id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("repository::insert_product - failed to create product {:?}: {}", product, e);
                DatabaseError::classify(e)
            })?;
        self.log.finished("repository::insert_product", started);

        Ok(id)
    }

    async fn update_product(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Uuid>, DatabaseError> {
        let sql = r#"
            UPDATE products p
            SET
                name = $1,
                description = $2,
                price = $3,
                stock = $4,
                category_id = $5,
                updated_at = NOW()
            FROM shops s
            WHERE
                p.shop_id = s.id
                AND s.user_id = $6
                AND s.deleted_at IS NULL
                AND p.deleted_at IS NULL
                AND p.id = $7
            RETURNING p.id
        "#;
        self.log.statement("repository::update_product", sql, &[]);

        let started = Instant::now();
        let row: Option<(Uuid,)> = sqlx::query_as(sql)
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(changes.price)
            .bind(changes.stock)
            .bind(changes.category_id)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("repository::update_product - failed to update product {}: {}", id, e);
                DatabaseError::classify(e)
            })?;
        self.log.finished("repository::update_product", started);

        Ok(row.map(|(id,)| id))
    }

    async fn soft_delete_product(&self, id: Uuid, owner_id: Uuid) -> Result<u64, DatabaseError> {
        let sql = r#"
            UPDATE products p
            SET deleted_at = NOW()
            FROM shops s
            WHERE
                p.shop_id = s.id
                AND s.user_id = $1
                AND s.deleted_at IS NULL
                AND p.deleted_at IS NULL
                AND p.id = $2
        "#;
        self.log.statement("repository::soft_delete_product", sql, &[]);

        let started = Instant::now();
        let result = sqlx::query(sql)
            .bind(owner_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("repository::soft_delete_product - failed to delete product {}: {}", id, e);
                DatabaseError::from(e)
            })?;
        self.log.finished("repository::soft_delete_product", started);

        Ok(result.rows_affected())
    }

    async fn purge_deleted_products(&self) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM products WHERE deleted_at IS NOT NULL")
            .execute(&mut *tx)
            .await;

        match result {
            Ok(done) => {
                tx.commit().await?;
                tracing::info!("repository::purge_deleted_products - removed {} products", done.rows_affected());
                Ok(done.rows_affected())
            }
            Err(e) => {
                tracing::error!("repository::purge_deleted_products - failed, rolling back: {}", e);
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }
}
