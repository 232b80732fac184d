use std::fmt;

use serde::{Deserialize, Serialize};

/// Days in one standard cycle.
pub const DAYS_PER_CYCLE: i64 = 360;

/// An in-world date: a cycle number and a 1-based day within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarDate {
    /// Cycle number. May be negative for dates before the epoch.
    pub cycle: i64,
    /// Day of the cycle, `1..=DAYS_PER_CYCLE`.
    pub day: u32,
}

impl StarDate {
    /// First day of the given cycle.
    pub fn new(cycle: i64) -> Self {
        Self { cycle, day: 1 }
    }

    /// A specific day, wrapped into range.
    pub fn on_day(cycle: i64, day: u32) -> Self {
        Self::from_days(cycle * DAYS_PER_CYCLE + i64::from(day.max(1)) - 1)
    }

    fn to_days(self) -> i64 {
        self.cycle * DAYS_PER_CYCLE + i64::from(self.day) - 1
    }

    fn from_days(days: i64) -> Self {
        Self {
            cycle: days.div_euclid(DAYS_PER_CYCLE),
            day: days.rem_euclid(DAYS_PER_CYCLE) as u32 + 1,
        }
    }
}

impl Default for StarDate {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for StarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.cycle, self.day)
    }
}

/// Tracks simulation time: a monotonic tick counter and an in-world date.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    start_date: StarDate,
    hours_per_tick: f64,
    accumulated_hours: f64,
}

impl SimClock {
    /// Create a clock at tick 0 with the given start date and tick duration.
    pub fn new(start_date: StarDate, hours_per_tick: f64) -> Self {
        Self {
            tick: 0,
            start_date,
            hours_per_tick,
            accumulated_hours: 0.0,
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.accumulated_hours += self.hours_per_tick;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current in-world date derived from start date + accumulated hours.
    pub fn current_date(&self) -> StarDate {
        let elapsed_days = (self.accumulated_hours / 24.0).floor() as i64;
        StarDate::from_days(self.start_date.to_days() + elapsed_days)
    }

    /// Current hour of the day (0.0..24.0).
    pub fn hour_of_day(&self) -> f64 {
        self.accumulated_hours % 24.0
    }

    /// Total elapsed in-world hours since simulation start.
    pub fn elapsed_hours(&self) -> f64 {
        self.accumulated_hours
    }

    /// In-world days elapsed since simulation start.
    pub fn elapsed_days(&self) -> f64 {
        self.accumulated_hours / 24.0
    }

    /// Change the tick length. Hours already elapsed are kept; later ticks
    /// use the new length.
    pub fn set_hours_per_tick(&mut self, hours: f64) {
        self.hours_per_tick = hours;
    }

    /// Return the configured number of in-world hours per tick.
    pub fn hours_per_tick(&self) -> f64 {
        self.hours_per_tick
    }
}
