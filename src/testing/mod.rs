//! In-memory storage for service and handler tests. Mirrors the predicates
//! of the Postgres repository so listing semantics can be checked without a
//! database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::database::models::{
    CategoryRef, NewProduct, ProductChanges, ProductDetail, ProductItem, ProductOwnership,
};
use crate::database::{DatabaseError, DynProductRepository, ProductPage, ProductRepository};
use crate::filter::ProductFilter;
use crate::services::ProductServices;
use crate::types::PageRequest;

/// Full product row as the in-memory tables store it
#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ShopRow {
    user_id: Uuid,
    deleted: bool,
}

#[derive(Default)]
struct Tables {
    shops: HashMap<Uuid, ShopRow>,
    categories: HashMap<Uuid, String>,
    // insertion order; listings return newest first
    products: Vec<Product>,
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    tables: Mutex<Tables>,
    fail: AtomicBool,
    ownership_lookups: AtomicUsize,
}

impl InMemoryProductRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_shop(&self, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().shops.insert(id, ShopRow { user_id, deleted: false });
        id
    }

    pub fn delete_shop(&self, shop_id: Uuid) {
        if let Some(shop) = self.lock().shops.get_mut(&shop_id) {
            shop.deleted = true;
        }
    }

    pub fn transfer_shop(&self, shop_id: Uuid, user_id: Uuid) {
        if let Some(shop) = self.lock().shops.get_mut(&shop_id) {
            shop.user_id = user_id;
        }
    }

    pub fn add_category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().categories.insert(id, name.to_string());
        id
    }

    pub fn remove_category(&self, category_id: Uuid) {
        self.lock().categories.remove(&category_id);
    }

    /// Seeds a product directly, bypassing validation
    pub fn add_product(&self, shop_id: Uuid, category_id: Option<Uuid>, name: &str, description: &str, price: i64, stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.lock().products.push(Product {
            id,
            shop_id,
            category_id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            stock,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        id
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.lock().products.iter().find(|p| p.id == id).cloned()
    }

    /// Makes every following call fail with a storage error
    pub fn fail_with_storage_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn ownership_lookups(&self) -> usize {
        self.ownership_lookups.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn matches(product: &Product, shop_id: Option<Uuid>, filter: &ProductFilter) -> bool {
        if product.deleted_at.is_some() {
            return false;
        }
        if let Some(shop_id) = shop_id {
            if product.shop_id != shop_id {
                return false;
            }
        }
        if !filter.category_ids.is_empty() {
            match product.category_id {
                Some(c) if filter.category_ids.contains(&c) => {}
                _ => return false,
            }
        }
        let min = filter.min_price_or_zero();
        if min > 0 && product.price < min {
            return false;
        }
        if let Some(max) = filter.max_price {
            if max > min && !(min..=max).contains(&product.price) {
                return false;
            }
        }
        if let Some(keyword) = filter.keyword() {
            let pattern = format!("%{}%", keyword);
            if !ilike(&product.name, &pattern) && !ilike(&product.description, &pattern) {
                return false;
            }
        }
        true
    }

    fn owns(tables: &Tables, product: &Product, owner_id: Uuid) -> bool {
        product.deleted_at.is_none()
            && tables
                .shops
                .get(&product.shop_id)
                .map(|s| !s.deleted && s.user_id == owner_id)
                .unwrap_or(false)
    }

    fn check_references(tables: &Tables, shop_id: Option<Uuid>, category_id: Uuid) -> Result<(), DatabaseError> {
        if let Some(shop_id) = shop_id {
            if !tables.shops.contains_key(&shop_id) {
                return Err(DatabaseError::ForeignKeyViolation("products_shop_id_fkey".to_string()));
            }
        }
        if !tables.categories.contains_key(&category_id) {
            return Err(DatabaseError::ForeignKeyViolation("products_category_id_fkey".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(
        &self,
        shop_id: Option<Uuid>,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ProductPage, DatabaseError> {
        self.check()?;
        let tables = self.lock();
        let matched: Vec<&Product> = tables
            .products
            .iter()
            .rev()
            .filter(|p| Self::matches(p, shop_id, filter))
            .collect();

        let items = matched
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|p| ProductItem { id: p.id, name: p.name.clone(), price: p.price, stock: p.stock })
            .collect::<Vec<_>>();

        // the window count is only observable through a returned row
        let total_data = if items.is_empty() { 0 } else { matched.len() as i64 };
        Ok(ProductPage { items, total_data })
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetail>, DatabaseError> {
        self.check()?;
        let tables = self.lock();
        Ok(tables
            .products
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .map(|p| ProductDetail {
                id: p.id,
                shop_id: p.shop_id,
                name: p.name.clone(),
                description: p.description.clone(),
                price: p.price,
                stock: p.stock,
                category: CategoryRef {
                    id: p.category_id,
                    name: p.category_id.and_then(|c| tables.categories.get(&c).cloned()),
                },
            }))
    }

    async fn find_ownership(&self, id: Uuid) -> Result<Option<ProductOwnership>, DatabaseError> {
        self.ownership_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let tables = self.lock();
        let product = match tables.products.iter().find(|p| p.id == id && p.deleted_at.is_none()) {
            Some(p) => p,
            None => return Ok(None),
        };
        Ok(tables
            .shops
            .get(&product.shop_id)
            .filter(|s| !s.deleted)
            .map(|s| ProductOwnership { id: product.id, shop_id: product.shop_id, user_id: s.user_id }))
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Uuid, DatabaseError> {
        self.check()?;
        {
            let tables = self.lock();
            Self::check_references(&tables, Some(product.shop_id), product.category_id)?;
        }
        Ok(self.add_product(
            product.shop_id,
            Some(product.category_id),
            &product.name,
            &product.description,
            product.price,
            product.stock,
        ))
    }

    async fn update_product(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Uuid>, DatabaseError> {
        self.check()?;
        let mut tables = self.lock();
        Self::check_references(&tables, None, changes.category_id)?;

        let owned = match tables.products.iter().find(|p| p.id == id) {
            Some(p) => Self::owns(&tables, p, owner_id),
            None => false,
        };
        if !owned {
            return Ok(None);
        }

        let product = tables.products.iter_mut().find(|p| p.id == id);
        Ok(product.map(|p| {
            p.name = changes.name.clone();
            p.description = changes.description.clone();
            p.price = changes.price;
            p.stock = changes.stock;
            p.category_id = Some(changes.category_id);
            p.updated_at = Utc::now();
            p.id
        }))
    }

    async fn soft_delete_product(&self, id: Uuid, owner_id: Uuid) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut tables = self.lock();
        let owned = match tables.products.iter().find(|p| p.id == id) {
            Some(p) => Self::owns(&tables, p, owner_id),
            None => false,
        };
        if !owned {
            return Ok(0);
        }
        match tables.products.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.deleted_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn purge_deleted_products(&self) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut tables = self.lock();
        let before = tables.products.len();
        tables.products.retain(|p| p.deleted_at.is_none());
        Ok((before - tables.products.len()) as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    Many,
    One,
    Char(char),
}

/// Case-insensitive LIKE match: `%` is any run, `_` is one character,
/// backslash escapes the next character.
fn ilike(value: &str, pattern: &str) -> bool {
    let mut tokens = vec![];
    let mut chars = pattern.chars().flat_map(char::to_lowercase);
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Many,
            '_' => LikeToken::One,
            '\\' => match chars.next() {
                Some(escaped) => LikeToken::Char(escaped),
                None => LikeToken::Char('\\'),
            },
            other => LikeToken::Char(other),
        });
    }
    let text: Vec<char> = value.chars().flat_map(char::to_lowercase).collect();

    // greedy match with backtracking to the last `%`
    let (mut t, mut p) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::Many) => {
                resume = Some((p, t));
                p += 1;
            }
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match resume {
                Some((star, from)) => {
                    p = star + 1;
                    t = from + 1;
                    resume = Some((star, from + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| *token == LikeToken::Many)
}

/// Services wired over a fresh in-memory repository
pub fn services() -> (Arc<InMemoryProductRepository>, ProductServices) {
    let repo = InMemoryProductRepository::new();
    let dyn_repo: DynProductRepository = repo.clone();
    let pagination = PaginationConfig { default_page_size: 10, max_page_size: Some(100) };
    (repo, ProductServices::new(dyn_repo, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilike_follows_postgres_wildcards() {
        assert!(ilike("Blue Pen", "%pen%"));
        assert!(ilike("Pen", "%p_n%"));
        assert!(ilike("100% cotton", "%0\\%%"));
        assert!(!ilike("100 cotton", "%0\\%%"));
        assert!(ilike("a_b", "%\\_%"));
        assert!(!ilike("ab", "%\\_%"));
        assert!(ilike("anything", "%%"));
        assert!(!ilike("Marker", "%pen%"));
    }

    #[tokio::test]
    async fn keyword_wildcards_match_like_postgres() {
        let (repo, services) = services();
        let shop = repo.add_shop(Uuid::new_v4());
        repo.add_product(shop, None, "Pen", "blue", 100, 1);
        repo.add_product(shop, None, "Pan", "steel", 100, 1);
        repo.add_product(shop, None, "Pencil", "grey", 100, 1);

        let filter = ProductFilter { keyword: Some("p_n".to_string()), ..Default::default() };
        let list = services
            .queries
            .list(crate::services::ListRequest { filter, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(list.meta.total_data, 3);
    }
}
