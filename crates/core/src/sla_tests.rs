// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_severities_match_taxonomy() {
    assert_eq!(AlertType::Late.default_severity(), Severity::Warn);
    assert_eq!(AlertType::FailureStreak.default_severity(), Severity::Critical);
    assert_eq!(AlertType::WorkerDown.default_severity(), Severity::Critical);
    assert_eq!(AlertType::QueueBacklog.default_severity(), Severity::Warn);
}

#[test]
fn alert_is_open_until_resolved() {
    let mut alert = AlertEvent {
        id: AlertId::new(),
        robot_id: RobotId::new(),
        run_id: None,
        alert_type: AlertType::Late,
        severity: Severity::Warn,
        message: "late".into(),
        metadata: BTreeMap::new(),
        created_at: Utc::now(),
        resolved_at: None,
    };
    assert!(alert.is_open());
    alert.resolved_at = Some(Utc::now());
    assert!(!alert.is_open());
}
