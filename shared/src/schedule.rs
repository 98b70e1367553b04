//! Trigger-time computation for scheduled jobs
//!
//! The fire-time math is kept separate from the tokio loops so job schedules
//! are testable without a runtime: the backend computes the next wall-clock
//! fire time here, sleeps until it, runs the job body, and repeats.

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Next occurrence of `at` strictly after `now`.
///
/// If today's `at` has not passed yet it fires today, otherwise tomorrow.
/// A job waking up exactly at `at` re-fires the next day, not immediately.
pub fn next_daily_fire(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
