// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small parsing helpers shared by the route handlers.

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path segment into an id type, mapping a malformed value to a
/// `VALIDATION_ERROR` rather than a panic.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("malformed {what}: {raw}")))
}
