// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_codes_match_taxonomy() {
    assert_eq!(HubError::validation("x").status_code(), 400);
    assert_eq!(HubError::Authorization("x".into()).status_code(), 401);
    assert_eq!(HubError::not_found("x").status_code(), 404);
    assert_eq!(HubError::conflict("x").status_code(), 409);
    assert_eq!(HubError::precondition_failed("x").status_code(), 422);
    assert_eq!(HubError::transient("x").status_code(), 503);
    assert_eq!(HubError::fatal("x").status_code(), 500);
}
