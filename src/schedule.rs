//! Unattended runs: every Monday and on the first day of each month.

use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Weekday};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Local time of day at which scheduled jobs fire
pub const RUN_HOUR: u32 = 2;

/// First run time strictly after `now`
pub fn next_run_after(now: NaiveDateTime) -> NaiveDateTime {
    let run_time = NaiveTime::from_hms_opt(RUN_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);

    now.date()
        .iter_days()
        .map(|date| date.and_time(run_time))
        .find(|candidate| {
            *candidate > now && (candidate.weekday() == Weekday::Mon || candidate.day() == 1)
        })
        // A Monday always falls within the next eight days
        .unwrap_or(now)
}

/// Sleep until each scheduled time and run `job`, forever.
pub async fn run_forever<F, Fut>(mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

        info!(next_run = %next, "Waiting for next scheduled run");
        tokio::time::sleep(wait).await;

        job().await;
    }
}
