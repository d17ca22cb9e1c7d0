// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn not_found_maps_to_404() {
    let err = ApiError::from(HubError::not_found("robot abc"));
    assert_eq!(err.code, "NOT_FOUND");
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
fn validation_maps_to_400() {
    let err = ApiError::from(HubError::validation("missing field"));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn fatal_maps_to_500() {
    let err = ApiError::from(HubError::fatal("store corrupted"));
    assert_eq!(err.code, "INTERNAL_ERROR");
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn transient_maps_to_503() {
    let err = ApiError::from(HubError::transient("queue full"));
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
}
