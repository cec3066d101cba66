//! Wall-clock aligned refresh schedule
//!
//! Refreshes fire at the minutes `offset, offset + interval, ...` (below 60)
//! of every UTC hour, at a fixed second. Offset and second come from the
//! process start time, so different installations spread their load while a
//! restarted process keeps landing on the same grid.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    interval_minutes: u32,
    minute_offset: u32,
    second: u32,
}

impl RefreshSchedule {
    /// Build the schedule anchored at `started_at`. The interval is clamped
    /// to 1..=60 minutes.
    pub fn aligned_to(started_at: DateTime<Utc>, interval_minutes: u32) -> Self {
        let interval_minutes = interval_minutes.clamp(1, 60);
        Self {
            interval_minutes,
            minute_offset: started_at.minute() % interval_minutes,
            second: started_at.second(),
        }
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn minute_offset(&self) -> u32 {
        self.minute_offset
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// Minutes of the hour at which a refresh fires
    pub fn minutes(&self) -> impl Iterator<Item = u32> + '_ {
        (self.minute_offset..60).step_by(self.interval_minutes as usize)
    }

    /// First firing instant strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let into_hour = TimeDelta::seconds(i64::from(now.minute() * 60 + now.second()))
            + TimeDelta::nanoseconds(i64::from(now.nanosecond()));
        let hour_start = now - into_hour;

        for hour in 0..2 {
            for minute in self.minutes() {
                let secs = hour * 3600 + i64::from(minute * 60 + self.second);
                let candidate = hour_start + TimeDelta::seconds(secs);
                if candidate > now {
                    return candidate;
                }
            }
        }

        // Unreachable for offset < interval <= 60; keep a sane fallback
        now + TimeDelta::minutes(i64::from(self.interval_minutes))
    }
}

/// Sleeps until successive schedule instants.
///
/// The ticker reads wall time as its anchor plus the Tokio clock elapsed
/// since, so a wall clock step never makes it fire twice or skip ahead.
/// Cancel by dropping the [`tick`](RefreshTicker::tick) future, e.g. from the
/// other arm of a `tokio::select!`.
#[derive(Debug)]
pub struct RefreshTicker {
    schedule: RefreshSchedule,
    last_fired: Option<DateTime<Utc>>,
    anchor_wall: DateTime<Utc>,
    anchor_instant: Instant,
}

impl RefreshTicker {
    pub fn new(schedule: RefreshSchedule) -> Self {
        Self::anchored(schedule, Utc::now())
    }

    /// Ticker whose clock reads `wall_now` at this moment
    pub fn anchored(schedule: RefreshSchedule, wall_now: DateTime<Utc>) -> Self {
        Self {
            schedule,
            last_fired: None,
            anchor_wall: wall_now,
            anchor_instant: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.anchor_instant.elapsed())
            .unwrap_or_else(|_| TimeDelta::zero());
        self.anchor_wall + elapsed
    }

    pub fn schedule(&self) -> &RefreshSchedule {
        &self.schedule
    }

    /// Next instant this ticker will fire at
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        // Timer rounding may wake us a hair before the instant just fired
        let reference = match self.last_fired {
            Some(last) if last > now => last,
            _ => now,
        };
        self.schedule.next_after(reference)
    }

    /// Wait for the next instant and return it
    pub async fn tick(&mut self) -> DateTime<Utc> {
        let now = self.now();
        let target = self.next_fire(now);
        let delay = (target - now).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(delay).await;
        self.last_fired = Some(target);
        target
    }
}
