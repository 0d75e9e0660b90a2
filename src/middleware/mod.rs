pub mod auth;
pub mod chain;
pub mod rate_limit;
pub mod response;

pub use auth::{AuthUser, AuthenticationGuard};
pub use chain::{run_chain, Flow, MiddlewareChain, Stage};
pub use rate_limit::{RateLimiter, TokenBucket};
pub use response::{ApiResponse, ApiResult};
