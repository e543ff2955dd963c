use crate::error::AppError;
use crate::model::Task;
use crate::status::{DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, YEAR_MS};
use crate::task_api::rfc3339_from_millis;

/// Example tasks spread over every urgency state, positioned relative to `reference`.
pub fn default_tasks(reference: i64) -> Result<Vec<Task>, AppError> {
    let created_at = rfc3339_from_millis(reference)?;
    let task = |id: &str,
                name: &str,
                description: &str,
                min_interval_ms: i64,
                max_interval_ms: i64,
                points: u32,
                executed_ago: &[i64]| Task {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        min_interval_ms,
        max_interval_ms,
        points,
        created_at: created_at.clone(),
        execution_timestamps_ms: executed_ago.iter().map(|ago| reference - ago).collect(),
    };

    Ok(vec![
        task(
            "task-1",
            "Weekly data backup",
            "Back up work and personal files to the external drive and verify the backup.",
            5 * DAY_MS,
            7 * DAY_MS,
            25,
            &[2 * DAY_MS + 8 * HOUR_MS],
        ),
        task(
            "task-2",
            "Clean the bathroom",
            "Sink, shower, toilet and floor. Refill soap and toilet paper.",
            3 * DAY_MS,
            5 * DAY_MS,
            15,
            &[4 * DAY_MS + 2 * HOUR_MS],
        ),
        task(
            "task-3",
            "Annual boiler service",
            "Book a certified technician for the yearly boiler inspection.",
            11 * MONTH_MS,
            12 * MONTH_MS,
            50,
            &[13 * MONTH_MS + 7 * DAY_MS],
        ),
        task(
            "task-4",
            "Check fire extinguishers",
            "Check pressure and expiry dates of the extinguishers in the house and garage.",
            6 * MONTH_MS,
            YEAR_MS,
            30,
            &[],
        ),
        task(
            "task-5",
            "Clean the coffee machine",
            "Empty and rinse the water tank and the grounds container.",
            6 * HOUR_MS,
            12 * HOUR_MS,
            5,
            &[DAY_MS, 18 * HOUR_MS, 3 * HOUR_MS + 20 * MINUTE_MS],
        ),
    ])
}
