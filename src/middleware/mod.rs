/// Middleware module
///
/// Custom middleware for authentication.

mod token_middleware;

pub use token_middleware::{AuthenticatedIdentity, TokenMiddleware};
