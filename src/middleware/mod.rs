pub mod auth;
pub mod context;
pub mod response;

pub use auth::{extract_bearer, AuthGuard};
pub use context::RequestContext;
pub use response::{ApiResponse, MessageResponse, Pagination};
