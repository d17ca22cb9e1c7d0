// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller identity resolution. Every route under `/api/v1` other than
//! `/health` and the deploy-publish route is documented as "authenticated",
//! but real end-user authentication is out of scope here — `CallerIdentity`
//! is a stub extractor that always resolves to a fixed identity, leaving the
//! seam in place for a real auth layer to replace it later.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// The caller a request is attributed to, used for `triggered_by`,
/// `canceled_by`, audit fields and the like.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub subject: String,
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self {
            subject: "system".to_string(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CallerIdentity::default())
    }
}

/// Checks the `x-deploy-token` header against the configured token, for the
/// CI deploy-publish route.
pub fn deploy_token_matches(header_value: Option<&str>, expected: &str) -> bool {
    match header_value {
        Some(actual) => actual == expected,
        None => false,
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
