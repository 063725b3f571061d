use uuid::Uuid;

use crate::database::models::{NewProduct, ProductChanges, ProductId};
use crate::database::DynProductRepository;

use super::error::ServiceError;
use super::ownership::OwnershipGuard;

/// Write side of the product module. Update and delete always pass through
/// the ownership guard first; the repository re-checks ownership in the
/// statement itself.
#[derive(Clone)]
pub struct ProductMutationService {
    repo: DynProductRepository,
    guard: OwnershipGuard,
}

impl ProductMutationService {
    pub fn new(repo: DynProductRepository, guard: OwnershipGuard) -> Self {
        Self { repo, guard }
    }

    pub async fn create(&self, actor_id: Uuid, product: NewProduct) -> Result<ProductId, ServiceError> {
        product
            .validate()
            .map_err(|errors| ServiceError::validation("Invalid product", errors))?;

        let id = self.repo.insert_product(&product).await?;
        tracing::info!("service::create - user {} created product {} in shop {}", actor_id, id, product.shop_id);
        Ok(ProductId { id })
    }

    pub async fn update(&self, id: Uuid, actor_id: Uuid, changes: ProductChanges) -> Result<ProductId, ServiceError> {
        changes
            .validate()
            .map_err(|errors| ServiceError::validation("Invalid product", errors))?;

        self.guard.authorize(id, actor_id).await?;

        match self.repo.update_product(id, actor_id, &changes).await? {
            Some(id) => Ok(ProductId { id }),
            None => {
                // deleted or transferred between the guard and the write
                tracing::warn!("service::update - product {} vanished before update", id);
                Err(ServiceError::product_not_found())
            }
        }
    }

    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), ServiceError> {
        self.guard.authorize(id, actor_id).await?;

        let affected = self.repo.soft_delete_product(id, actor_id).await?;
        if affected == 0 {
            tracing::warn!("service::delete - product {} vanished before delete", id);
            return Err(ServiceError::product_not_found());
        }

        tracing::info!("service::delete - user {} deleted product {}", actor_id, id);
        Ok(())
    }

    /// Administrative: physically removes soft-deleted products
    pub async fn purge_deleted(&self) -> Result<u64, ServiceError> {
        Ok(self.repo.purge_deleted_products().await?)
    }
}
