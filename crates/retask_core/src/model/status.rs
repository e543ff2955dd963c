use serde::Serialize;

/// Display units, ordered from largest to smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnitGranularity {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnitGranularity {
    pub const ALL: [TimeUnitGranularity; 6] = [
        Self::Years,
        Self::Months,
        Self::Days,
        Self::Hours,
        Self::Minutes,
        Self::Seconds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Years => "years",
            Self::Months => "months",
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }
}

/// A duration split into approximate calendar parts.
///
/// Months are 30 days and years 365 days; see [`crate::status::decompose`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeComponents {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeComponents {
    pub fn is_due_now(&self) -> bool {
        self.units().iter().all(|(_, value)| *value == 0)
    }

    pub fn get(&self, unit: TimeUnitGranularity) -> u64 {
        match unit {
            TimeUnitGranularity::Years => self.years,
            TimeUnitGranularity::Months => self.months,
            TimeUnitGranularity::Days => self.days,
            TimeUnitGranularity::Hours => self.hours,
            TimeUnitGranularity::Minutes => self.minutes,
            TimeUnitGranularity::Seconds => self.seconds,
        }
    }

    /// Every unit paired with its value, largest unit first.
    pub fn units(&self) -> [(TimeUnitGranularity, u64); 6] {
        TimeUnitGranularity::ALL.map(|unit| (unit, self.get(unit)))
    }
}

/// Time left until (or past) the max interval, bucketed by display precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "components", rename_all = "snake_case")]
pub enum TaskTimeStatus {
    NeverExecuted,
    Overdue(TimeComponents),
    DueInLessThanMinute(TimeComponents),
    DueInLessThanHour(TimeComponents),
    DueInLessThanDay(TimeComponents),
    DueInLessThanMonth(TimeComponents),
    DueInLessThanYear(TimeComponents),
    DueInMoreThanYear(TimeComponents),
}

impl TaskTimeStatus {
    pub fn components(&self) -> Option<&TimeComponents> {
        match self {
            Self::NeverExecuted => None,
            Self::Overdue(components)
            | Self::DueInLessThanMinute(components)
            | Self::DueInLessThanHour(components)
            | Self::DueInLessThanDay(components)
            | Self::DueInLessThanMonth(components)
            | Self::DueInLessThanYear(components)
            | Self::DueInMoreThanYear(components) => Some(components),
        }
    }
}

/// Three-level urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusColor {
    /// Still inside the min interval.
    Green,
    /// Past the min interval; may be executed.
    Orange,
    /// Past the max interval; must be executed.
    Red,
}

impl TaskStatusColor {
    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}
