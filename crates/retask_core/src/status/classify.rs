use crate::model::{TaskStatusColor, TaskTimeStatus};
use crate::status::duration::{DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, YEAR_MS, decompose_unsigned};

/// Urgency colour at `now`. Both thresholds are inclusive, so a tie goes to
/// the more urgent colour.
pub fn classify_color(
    now: i64,
    last_executed: i64,
    min_interval_ms: i64,
    max_interval_ms: i64,
) -> TaskStatusColor {
    let min_execute_time = last_executed.saturating_add(min_interval_ms);
    let max_execute_time = last_executed.saturating_add(max_interval_ms);

    if now >= max_execute_time {
        TaskStatusColor::Red
    } else if now >= min_execute_time {
        TaskStatusColor::Orange
    } else {
        TaskStatusColor::Green
    }
}

/// Time left until `last_executed + max_interval`, bucketed by precision.
///
/// Buckets are checked from the smallest upwards and each upper bound is
/// inclusive: exactly one minute left is still `DueInLessThanMinute`.
pub fn classify_time_status(
    last_executed: Option<i64>,
    max_interval_ms: i64,
    now: i64,
) -> TaskTimeStatus {
    let Some(last_executed) = last_executed else {
        return TaskTimeStatus::NeverExecuted;
    };

    let due_at = last_executed.saturating_add(max_interval_ms);
    let delta = due_at.saturating_sub(now);
    let components = decompose_unsigned(delta.unsigned_abs());

    if delta <= 0 {
        TaskTimeStatus::Overdue(components)
    } else if delta <= MINUTE_MS {
        TaskTimeStatus::DueInLessThanMinute(components)
    } else if delta <= HOUR_MS {
        TaskTimeStatus::DueInLessThanHour(components)
    } else if delta <= DAY_MS {
        TaskTimeStatus::DueInLessThanDay(components)
    } else if delta <= MONTH_MS {
        TaskTimeStatus::DueInLessThanMonth(components)
    } else if delta <= YEAR_MS {
        TaskTimeStatus::DueInLessThanYear(components)
    } else {
        TaskTimeStatus::DueInMoreThanYear(components)
    }
}
