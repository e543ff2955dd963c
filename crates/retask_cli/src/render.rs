use retask_core::config::Palette;
use retask_core::error::AppError;
use retask_core::format::{StringProvider, format_time_status};
use retask_core::model::{Task, TaskDetail, TaskItem};
use retask_core::status::SECOND_MS;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "TASK")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

pub fn tasks_table<S: StringProvider + ?Sized>(
    items: &[TaskItem],
    strings: &S,
    palette: &Palette,
) -> String {
    if items.is_empty() {
        return "No tasks.".to_string();
    }

    let rows = items.iter().map(|item| TaskRow {
        id: item.id.clone(),
        name: item.name.clone(),
        status: palette.paint(item.color, &format_time_status(&item.time_status, strings)),
    });

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

pub fn tasks_json<S: StringProvider + ?Sized>(items: &[TaskItem], strings: &S) -> String {
    let payload: Vec<serde_json::Value> = items
        .iter()
        .map(|item| {
            serde_json::json!({
                "id": item.id,
                "name": item.name,
                "color": item.color.label(),
                "time_status": item.time_status,
                "status_text": format_time_status(&item.time_status, strings),
            })
        })
        .collect();
    serde_json::Value::Array(payload).to_string()
}

pub fn task_json(task: &Task) -> String {
    serde_json::json!({
        "id": task.id,
        "name": task.name,
        "description": task.description,
        "min_interval_ms": task.min_interval_ms,
        "max_interval_ms": task.max_interval_ms,
        "points": task.points,
        "created_at": task.created_at,
        "last_executed": task.last_executed(),
    })
    .to_string()
}

pub fn detail_json(detail: &TaskDetail) -> Result<String, AppError> {
    serde_json::to_string(detail).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn detail_text(detail: &TaskDetail, offset: UtcOffset) -> Result<String, AppError> {
    let last_executed = match detail.last_executed {
        Some(millis) => local_timestamp(millis, offset)?,
        None => "-".to_string(),
    };
    let description = if detail.description.is_empty() {
        "-"
    } else {
        detail.description.as_str()
    };

    Ok([
        format!("ID: {}", detail.id),
        format!("Name: {}", detail.name),
        format!("Description: {description}"),
        format!("Points: {}", detail.points),
        format!("Min interval: {}", interval_text(detail.min_interval_ms)),
        format!("Max interval: {}", interval_text(detail.max_interval_ms)),
        format!("Executions: {}", detail.number_of_executions),
        format!("Last executed: {last_executed}"),
        format!(
            "Can execute: {}",
            if detail.can_execute { "yes" } else { "no" }
        ),
    ]
    .join("\n"))
}

fn local_timestamp(millis: i64, offset: UtcOffset) -> Result<String, AppError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|err| AppError::invalid_data(err.to_string()))?
        .to_offset(offset)
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Compact interval text like `2d 4h` or `1s 500ms`, largest units first.
fn interval_text(millis: i64) -> String {
    let Ok(components) = retask_core::status::decompose(millis) else {
        return format!("{millis}ms");
    };

    let mut parts: Vec<String> = components
        .units()
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .map(|(unit, value)| format!("{value}{}", unit_suffix(unit)))
        .collect();

    // decompose stops at whole seconds
    let leftover_ms = millis % SECOND_MS;
    if leftover_ms > 0 || parts.is_empty() {
        parts.push(format!("{leftover_ms}ms"));
    }

    parts.join(" ")
}

fn unit_suffix(unit: retask_core::model::TimeUnitGranularity) -> &'static str {
    use retask_core::model::TimeUnitGranularity as Unit;
    match unit {
        Unit::Years => "y",
        Unit::Months => "mo",
        Unit::Days => "d",
        Unit::Hours => "h",
        Unit::Minutes => "m",
        Unit::Seconds => "s",
    }
}
