use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::database::models::{ProductDetail, ProductList, ProductOwnership};
use crate::database::DynProductRepository;
use crate::filter::ProductFilter;
use crate::types::{Meta, PageRequest};

use super::error::ServiceError;

/// Listing input before page normalization
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub filter: ProductFilter,
}

/// Read side of the product module
#[derive(Clone)]
pub struct ProductQueryService {
    repo: DynProductRepository,
    pagination: PaginationConfig,
}

impl ProductQueryService {
    pub fn new(repo: DynProductRepository, pagination: PaginationConfig) -> Self {
        Self { repo, pagination }
    }

    pub async fn list(&self, req: ListRequest) -> Result<ProductList, ServiceError> {
        self.list_scoped(None, req).await
    }

    pub async fn list_by_shop(&self, shop_id: Uuid, req: ListRequest) -> Result<ProductList, ServiceError> {
        self.list_scoped(Some(shop_id), req).await
    }

    async fn list_scoped(&self, shop_id: Option<Uuid>, req: ListRequest) -> Result<ProductList, ServiceError> {
        let page = self.page_request(req.page, req.page_size);
        if !req.filter.is_empty() {
            tracing::debug!("service::list - filter {:?} page {:?}", req.filter, page);
        }
        let result = self.repo.list_products(shop_id, &req.filter, page).await?;

        Ok(ProductList {
            meta: Meta::new(page, result.total_data),
            items: result.items,
        })
    }

    pub fn page_request(&self, page: Option<i64>, page_size: Option<i64>) -> PageRequest {
        PageRequest::normalize(page, page_size, self.pagination.default_page_size, self.pagination.max_page_size)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        match self.repo.find_product(id).await? {
            Some(product) => Ok(product),
            None => {
                tracing::warn!("service::get - product {} not found", id);
                Err(ServiceError::product_not_found())
            }
        }
    }

    /// Resolves a live product to its shop and the shop's owner. Absent when
    /// either the product or its shop is soft-deleted.
    pub async fn verify_exists(&self, id: Uuid) -> Result<ProductOwnership, ServiceError> {
        match self.repo.find_ownership(id).await? {
            Some(ownership) => Ok(ownership),
            None => {
                tracing::warn!("service::verify_exists - product {} not found", id);
                Err(ServiceError::product_not_found())
            }
        }
    }
}
