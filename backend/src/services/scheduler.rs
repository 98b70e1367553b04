//! Background job scheduling
//!
//! Spawns one tokio task per scheduled transition. Daily jobs sleep until
//! their configured wall-clock fire time (computed in `shared::schedule`),
//! run, and repeat the next day; the spoilage scan runs on a fixed interval.
//! A failing run is logged and the job waits for its next trigger; jobs
//! never crash the process.

use std::time::Duration;

use chrono::{Local, NaiveTime};

use shared::next_daily_fire;

use crate::config::SchedulerConfig;
use crate::services::transfer::TransferService;
use crate::AppState;

/// Spawn every scheduled job. Invalid configuration disables the affected
/// job with an error log instead of taking the server down.
pub fn spawn_jobs(state: AppState) {
    let scheduler = state.config.scheduler.clone();

    match SchedulerConfig::parse_fire_time(&scheduler.surplus_to_today_at) {
        Ok(at) => {
            let state = state.clone();
            tokio::spawn(async move {
                daily_loop(state, at, "surplus_to_today").await;
            });
        }
        Err(e) => tracing::error!(error = %e, "surplus_to_today schedule disabled"),
    }

    match SchedulerConfig::parse_fire_time(&scheduler.today_to_surplus_at) {
        Ok(at) => {
            let state = state.clone();
            tokio::spawn(async move {
                daily_loop(state, at, "today_to_surplus").await;
            });
        }
        Err(e) => tracing::error!(error = %e, "today_to_surplus schedule disabled"),
    }

    let every = Duration::from_secs(scheduler.spoilage_scan_interval_secs.max(1));
    tokio::spawn(async move {
        interval_loop(state, every).await;
    });
}

async fn daily_loop(state: AppState, at: NaiveTime, job: &'static str) {
    loop {
        let now = Local::now().naive_local();
        let next = next_daily_fire(now, at);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(job, next_fire = %next, "job scheduled");
        tokio::time::sleep(wait).await;

        let service = TransferService::from_state(&state);
        let result = match job {
            "surplus_to_today" => service.surplus_to_today().await,
            _ => service.today_to_surplus().await,
        };
        if let Err(e) = result {
            tracing::error!(job, error = %e, "scheduled run failed; waiting for next trigger");
        }
    }
}

async fn interval_loop(state: AppState, every: Duration) {
    let job = "expired_to_spoilage";
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so the scan starts one
    // full interval after boot.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let service = TransferService::from_state(&state);
        if let Err(e) = service.expired_to_spoilage().await {
            tracing::error!(job, error = %e, "scheduled run failed; waiting for next trigger");
        }
    }
}
