pub mod actor;
pub mod response;

pub use actor::ActorId;
pub use response::{ApiResponse, ApiResult};
