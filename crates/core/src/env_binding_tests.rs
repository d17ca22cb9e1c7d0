// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn secret_bindings_redact_plaintext() {
    let binding = RobotEnvBinding {
        robot_id: RobotId::new(),
        env_name: EnvName::Prod,
        key: "API_KEY".into(),
        value: "ciphertext-blob".into(),
        is_secret: true,
    };
    let redacted = RedactedEnvBinding::from(&binding);
    assert_eq!(redacted.value, None);
    assert!(redacted.is_set);
}

#[test]
fn plain_bindings_pass_value_through() {
    let binding = RobotEnvBinding {
        robot_id: RobotId::new(),
        env_name: EnvName::Test,
        key: "LOG_LEVEL".into(),
        value: "debug".into(),
        is_secret: false,
    };
    let redacted = RedactedEnvBinding::from(&binding);
    assert_eq!(redacted.value.as_deref(), Some("debug"));
}
