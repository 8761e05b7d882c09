//! Daily time window for scheduled runs.

use chrono::{Local, NaiveTime};

use crate::config::ScheduleConfig;

/// A daily window in local time, possibly wrapping midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Parse a window from "HH:MM" strings.
    ///
    /// Returns `None` for empty or unparsable bounds; the caller treats
    /// that as an unbounded window so a bad config cannot silently stop
    /// all runs.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        if start.is_empty() || end.is_empty() {
            return None;
        }
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
        Some(Self { start, end })
    }

    pub fn from_config(cfg: &ScheduleConfig) -> Option<Self> {
        Self::parse(&cfg.start_time, &cfg.end_time)
    }

    /// Whether `time` falls inside the window. A window like
    /// 23:00 - 06:00 wraps midnight.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }

    /// Whether the local clock is currently inside the window.
    pub fn contains_now(&self) -> bool {
        self.contains(Local::now().time())
    }
}
