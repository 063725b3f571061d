use uuid::Uuid;

use crate::database::models::ProductOwnership;

use super::error::ServiceError;
use super::product_query::ProductQueryService;

/// Gate in front of every product mutation. Each call is a fresh lookup;
/// nothing is cached between calls.
#[derive(Clone)]
pub struct OwnershipGuard {
    queries: ProductQueryService,
}

impl OwnershipGuard {
    pub fn new(queries: ProductQueryService) -> Self {
        Self { queries }
    }

    /// NotFound when the product (or its shop) is gone, Forbidden when the
    /// actor does not own the shop.
    pub async fn authorize(&self, product_id: Uuid, actor_id: Uuid) -> Result<ProductOwnership, ServiceError> {
        let ownership = self.queries.verify_exists(product_id).await?;

        if ownership.user_id != actor_id {
            tracing::warn!(
                "ownership::authorize - user {} may not modify product {} (shop {})",
                actor_id,
                product_id,
                ownership.shop_id
            );
            return Err(ServiceError::forbidden());
        }

        Ok(ownership)
    }
}
