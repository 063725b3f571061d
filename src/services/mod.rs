pub mod error;
pub mod ownership;
pub mod product_mutation;
pub mod product_query;

pub use error::ServiceError;
pub use ownership::OwnershipGuard;
pub use product_mutation::ProductMutationService;
pub use product_query::{ListRequest, ProductQueryService};

use crate::config::PaginationConfig;
use crate::database::DynProductRepository;

/// Product services wired over one shared repository handle
#[derive(Clone)]
pub struct ProductServices {
    pub queries: ProductQueryService,
    pub mutations: ProductMutationService,
}

impl ProductServices {
    pub fn new(repo: DynProductRepository, pagination: PaginationConfig) -> Self {
        let queries = ProductQueryService::new(repo.clone(), pagination);
        let guard = OwnershipGuard::new(queries.clone());
        let mutations = ProductMutationService::new(repo, guard);
        Self { queries, mutations }
    }
}
