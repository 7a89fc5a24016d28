//! Bearer authentication extractor.
//!
//! The credential is taken from `Authorization: Bearer <token>` or, for
//! WebSocket and EventSource clients that cannot set headers, from the
//! `token` query parameter.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::{header, request::Parts};
use serde::Deserialize;

use dadaba_core::Identity;
use dadaba_notify::extract_bearer_token;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The verified caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

/// Credential carried by the request, if any.
pub fn request_credential(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty())
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = request_credential(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        let identity = state.gateway.authenticate(&credential).await?;
        Ok(AuthUser(identity))
    }
}
