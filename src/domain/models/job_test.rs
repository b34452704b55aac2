// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{Job, JobStatus};
use std::str::FromStr;

#[test]
fn test_new_job_is_pending_and_unclaimed() {
    let job = Job::new(2, 3, "sum".to_string());

    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.claimed_by.is_none());
    assert!(job.claimed_at.is_none());
    assert!(job.started_at.is_none());
    assert!(job.finished_at.is_none());
    assert_eq!(job.attempts, 0);
    assert_eq!(job.version, 1);
}

#[test]
fn test_status_priority_orders_actionable_before_terminal() {
    let ordered = [
        JobStatus::Pending,
        JobStatus::Claimed,
        JobStatus::Processing,
        JobStatus::Succeeded,
        JobStatus::Failed,
    ];

    for pair in ordered.windows(2) {
        assert!(pair[0].priority() < pair[1].priority());
    }
}

#[test]
fn test_terminal_states() {
    assert!(JobStatus::Succeeded.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Claimed.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
}

#[test]
fn test_status_round_trips_through_strings() {
    for status in [
        JobStatus::Pending,
        JobStatus::Claimed,
        JobStatus::Processing,
        JobStatus::Succeeded,
        JobStatus::Failed,
    ] {
        assert_eq!(JobStatus::from_str(&status.to_string()), Ok(status));
    }
    assert!(JobStatus::from_str("cancelled").is_err());
}
