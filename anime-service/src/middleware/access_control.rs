//! Basic authentication and role checks
//!
//! Applied with `axum::middleware::from_fn_with_state` over the whole router
//! (fallback included) so unknown paths are also protected.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::Error;
use crate::security::{AccessPolicy, Authenticator, BasicCredentials, Principal, Requirement};

/// Message of the 401 raised when no credentials were sent
pub const AUTHENTICATION_REQUIRED: &str =
    "Full authentication is required to access this resource";

/// Message of the 403 raised when the principal lacks a required role
pub const ACCESS_DENIED: &str = "Access Denied";

/// Access control middleware state
#[derive(Clone)]
pub struct AccessControl {
    policy: Arc<AccessPolicy>,
    authenticator: Authenticator,
    realm: Arc<str>,
}

impl AccessControl {
    pub fn new(policy: AccessPolicy, authenticator: Authenticator, realm: impl Into<String>) -> Self {
        Self {
            policy: Arc::new(policy),
            authenticator,
            realm: Arc::from(realm.into()),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Middleware function to authenticate the caller and enforce the policy
    ///
    /// On success the [`Principal`] is inserted into request extensions.
    pub async fn middleware(
        State(access): State<Self>,
        mut request: Request<Body>,
        next: Next,
    ) -> Response {
        let requirement = access
            .policy
            .requirement(request.method(), request.uri().path());
        if !requirement.requires_authentication() {
            return next.run(request).await;
        }

        match access.authorize(request.headers(), requirement).await {
            Ok(principal) => {
                tracing::debug!(
                    username = %principal.username,
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Access granted"
                );
                request.extensions_mut().insert(principal);
                next.run(request).await
            }
            Err(err) => access.reject(err),
        }
    }

    async fn authorize(
        &self,
        headers: &HeaderMap,
        requirement: &Requirement,
    ) -> Result<Principal, Error> {
        let credentials = BasicCredentials::from_headers(headers)
            .ok_or_else(|| Error::Unauthorized(AUTHENTICATION_REQUIRED.to_string()))?;
        let principal = self.authenticator.authenticate(&credentials).await?;
        if !requirement.is_satisfied_by(&principal) {
            tracing::warn!(
                username = %principal.username,
                roles = ?principal.roles,
                "Access denied"
            );
            return Err(Error::Forbidden(ACCESS_DENIED.to_string()));
        }
        Ok(principal)
    }

    fn reject(&self, err: Error) -> Response {
        let challenge = matches!(err, Error::Unauthorized(_));
        let mut response = err.into_response();
        if challenge {
            if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", self.realm)) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{InMemoryUserDirectory, PasswordEncoder, Role, UserAccount};
    use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        let directory = InMemoryUserDirectory::new([
            UserAccount::new("mario", "{noop}academy", vec![Role::User]),
            UserAccount::new("pehenmo", "{noop}academy", vec![Role::Admin]),
        ]);
        let access = AccessControl::new(
            AccessPolicy::anime_defaults().unwrap(),
            Authenticator::new(Arc::new(directory), PasswordEncoder::default()),
            "test-realm",
        );
        Router::new()
            .route("/health", get(|| async { "up" }))
            .route(
                "/animes",
                get(|Extension(principal): Extension<Principal>| async move {
                    principal.username
                })
                .post(|| async { StatusCode::CREATED }),
            )
            .layer(middleware::from_fn_with_state(access, AccessControl::middleware))
    }

    async fn send(method: &str, uri: &str, auth: Option<(&str, &str)>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = auth {
            let creds = BasicCredentials {
                username: username.into(),
                password: password.into(),
            };
            builder = builder.header(header::AUTHORIZATION, creds.to_header_value());
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_permit_all_skips_authentication() {
        let response = send("GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_credentials_challenge() {
        let response = send("GET", "/animes", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"test-realm\""
        );
    }

    #[tokio::test]
    async fn test_bad_password_is_unauthorized() {
        let response = send("GET", "/animes", Some(("mario", "wrong"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_forbidden_on_write() {
        let response = send("POST", "/animes", Some(("mario", "academy"))).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_principal_reaches_handler() {
        let response = send("GET", "/animes", Some(("mario", "academy"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send("POST", "/animes", Some(("pehenmo", "academy"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_path_requires_authentication() {
        let response = send("GET", "/elsewhere", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send("GET", "/elsewhere", Some(("mario", "academy"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
