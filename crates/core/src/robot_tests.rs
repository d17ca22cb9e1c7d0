// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn version(required: &[&str]) -> RobotVersion {
    RobotVersion {
        id: RobotVersionId::new(),
        robot_id: RobotId::new(),
        version: "1.0.0".into(),
        channel: Channel::Stable,
        changelog: String::new(),
        artifact_kind: ArtifactKind::Zip,
        artifact_digest: "deadbeef".into(),
        entrypoint_kind: EntrypointKind::Script,
        entrypoint_path: "main.py".into(),
        default_arguments: vec!["--flag".into()],
        default_env: BTreeMap::new(),
        working_dir: None,
        required_env_keys: required.iter().map(|s| s.to_string()).collect(),
        source_meta: SourceMeta::user(),
        is_active: true,
        created_at: Utc::now(),
    }
}

#[test]
fn assemble_arguments_appends_runtime_after_defaults() {
    let v = version(&[]);
    let args = v.assemble_arguments(&["--extra".to_string()]);
    assert_eq!(args, vec!["--flag".to_string(), "--extra".to_string()]);
}

#[test]
fn missing_required_env_reports_absent_keys_only() {
    let v = version(&["API_KEY", "DB_URL"]);
    let mut env = BTreeMap::new();
    env.insert("API_KEY".to_string(), "x".to_string());
    let missing = v.missing_required_env(&env);
    assert_eq!(missing, vec!["DB_URL".to_string()]);
}

#[test]
fn missing_required_env_empty_when_satisfied() {
    let v = version(&["API_KEY"]);
    let mut env = BTreeMap::new();
    env.insert("API_KEY".to_string(), "x".to_string());
    assert!(v.missing_required_env(&env).is_empty());
}
