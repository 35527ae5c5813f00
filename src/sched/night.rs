use crate::config::ScheduleConfig;
use crate::util::jitter_minute;
use chrono::{Days, NaiveDateTime, NaiveTime};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// One nightly offline interval, start inclusive and end exclusive.
///
/// The window is redrawn from the configured anchors and jitter ranges on
/// every scheduler cycle, so the exact minute drifts from day to day (and
/// even within one night across cycles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl NightWindow {
    pub fn draw(cfg: &ScheduleConfig, rng: &mut impl Rng) -> Self {
        let start_minute = jitter_minute(cfg.night_jitter_min, cfg.night_jitter_max, rng);
        let end_minute = jitter_minute(cfg.morning_jitter_min, cfg.morning_jitter_max, rng);
        Self::at(cfg.night_hour, start_minute, cfg.morning_hour, end_minute)
    }

    /// Window at explicit clock positions. Out-of-range values clamp to
    /// midnight; config validation keeps real inputs in range.
    pub fn at(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start_hour, start_minute, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end_hour, end_minute, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.start && t < self.end
    }

    /// Time until the window opens (next occurrence of the start minute).
    pub fn until_start(&self, now: NaiveDateTime) -> Duration {
        span_until(now, self.start)
    }

    /// Time until the window closes (next occurrence of the end minute).
    pub fn until_end(&self, now: NaiveDateTime) -> Duration {
        span_until(now, self.end)
    }
}

impl fmt::Display for NightWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

fn span_until(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today = now.date().and_time(at);
    let target = if today > now {
        today
    } else {
        today + Days::new(1)
    };
    (target - now).to_std().unwrap_or_default()
}
