//! Daily booking archive run pinned to a local time of day.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use seatkeep_core::BookingArchiver;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid run time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    timezone: Tz,
    run_at: NaiveTime,
}

impl DailySchedule {
    pub fn parse(timezone: &str, run_at: &str) -> Result<Self, ScheduleError> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))?;
        let run_at = NaiveTime::parse_from_str(run_at.trim(), "%H:%M")
            .map_err(|_| ScheduleError::InvalidTime(run_at.to_string()))?;
        Ok(Self { timezone, run_at })
    }

    /// First run strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.timezone).date_naive();

        // Two days ahead always covers a run time skipped by a DST gap.
        for _ in 0..3 {
            let candidate = self
                .timezone
                .from_local_datetime(&date.and_time(self.run_at))
                .earliest()
                .map(|local| local.with_timezone(&Utc));
            if let Some(candidate) = candidate.filter(|c| *c > now) {
                return candidate;
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        now + chrono::Duration::hours(24)
    }
}

/// Runs the archiver once a day, forever. Failures are logged and the next
/// day's run goes ahead as usual.
pub fn spawn_archive_schedule(archiver: BookingArchiver, schedule: DailySchedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "Next booking archive run scheduled");

            tokio::time::sleep(wait).await;

            match archiver.archive_old_bookings(Utc::now()).await {
                Ok(report) => info!(
                    archived = report.archived_count(),
                    scanned = report.scanned,
                    "Scheduled booking archive finished"
                ),
                Err(e) => error!(error = %e, "Scheduled booking archive failed"),
            }
        }
    })
}
