// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{Bot, BotStatus, ComputedStatus, HealthStatus};
use chrono::{Duration, Utc};

fn bot(status: BotStatus) -> Bot {
    Bot {
        id: "bot-1".to_string(),
        status,
        current_job_id: None,
        assigned_operation: None,
        last_heartbeat_at: Utc::now().into(),
        created_at: Utc::now().into(),
        deleted_at: None,
        health_status: HealthStatus::Normal,
        stuck_job_id: None,
        health_checked_at: None,
    }
}

#[test]
fn test_computed_status_reflects_stored_status_when_alive() {
    let now = Utc::now();
    let threshold = Duration::seconds(120);

    assert_eq!(
        bot(BotStatus::Idle).computed_status(now, threshold),
        ComputedStatus::Idle
    );
    assert_eq!(
        bot(BotStatus::Busy).computed_status(now, threshold),
        ComputedStatus::Busy
    );
}

#[test]
fn test_computed_status_down_after_stale_heartbeat() {
    let now = Utc::now();
    let mut stale = bot(BotStatus::Busy);
    stale.last_heartbeat_at = (now - Duration::seconds(121)).into();

    assert_eq!(
        stale.computed_status(now, Duration::seconds(120)),
        ComputedStatus::Down
    );
}

#[test]
fn test_computed_status_deleted_wins_over_everything() {
    let now = Utc::now();
    let mut deleted = bot(BotStatus::Busy);
    deleted.deleted_at = Some(now.into());
    deleted.last_heartbeat_at = (now - Duration::hours(1)).into();

    assert_eq!(
        deleted.computed_status(now, Duration::seconds(120)),
        ComputedStatus::Deleted
    );
}
