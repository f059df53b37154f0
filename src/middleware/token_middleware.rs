/// Token Authentication Middleware
///
/// Validates the auth token from the `Authorization: Bearer` header or the
/// auth cookie and injects the identity into request extensions for use by
/// route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::TokenAuthority;
use crate::error::{AppError, AuthError};

/// Identity asserted by a validated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity(pub String);

/// Token middleware for protecting routes
///
/// Must be applied to routes that require authentication.
pub struct TokenMiddleware {
    authority: Arc<TokenAuthority>,
    cookie_name: String,
}

impl TokenMiddleware {
    pub fn new(authority: Arc<TokenAuthority>, cookie_name: impl Into<String>) -> Self {
        Self {
            authority,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(TokenMiddlewareService {
            service: Rc::new(service),
            authority: self.authority.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct TokenMiddlewareService<S> {
    service: Rc<S>,
    authority: Arc<TokenAuthority>,
    cookie_name: String,
}

impl<S> TokenMiddlewareService<S> {
    /// Bearer header wins over the cookie
    fn extract_token(&self, req: &ServiceRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());

        bearer.or_else(|| {
            req.request()
                .cookie(&self.cookie_name)
                .map(|c| c.value().to_string())
        })
    }
}

impl<S, B> Service<ServiceRequest> for TokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match self.extract_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!(path = %req.path(), "Missing auth token");
                let err = AppError::from(AuthError::MissingToken);
                return Box::pin(async move { Err(err.into()) });
            }
        };

        match self.authority.validate(&token) {
            Ok(identity) => {
                tracing::debug!(identity = %identity, "Token validated successfully");
                req.extensions_mut().insert(AuthenticatedIdentity(identity));

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(code = e.code(), path = %req.path(), "Token validation failed");
                let err = AppError::from(e);
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}
