use crate::format::strings::{StringProvider, TextKey};
use crate::model::{TaskTimeStatus, TimeComponents, TimeUnitGranularity};

/// Units a time-status bucket may display, plus how many of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatWindow {
    pub max_unit: TimeUnitGranularity,
    pub min_unit: TimeUnitGranularity,
    pub max_parts: usize,
}

impl FormatWindow {
    const fn new(max_unit: TimeUnitGranularity, min_unit: TimeUnitGranularity, max_parts: usize) -> Self {
        Self {
            max_unit,
            min_unit,
            max_parts,
        }
    }

    pub fn contains(&self, unit: TimeUnitGranularity) -> bool {
        unit >= self.max_unit && unit <= self.min_unit
    }

    /// Window for the "due in" buckets; `None` for statuses rendered as a fixed label.
    pub fn for_status(status: &TaskTimeStatus) -> Option<Self> {
        use TimeUnitGranularity::*;

        match status {
            TaskTimeStatus::NeverExecuted | TaskTimeStatus::Overdue(_) => None,
            TaskTimeStatus::DueInLessThanMinute(_) => Some(Self::new(Seconds, Seconds, 1)),
            TaskTimeStatus::DueInLessThanHour(_) => Some(Self::new(Minutes, Seconds, 2)),
            TaskTimeStatus::DueInLessThanDay(_) => Some(Self::new(Hours, Minutes, 2)),
            TaskTimeStatus::DueInLessThanMonth(_) => Some(Self::new(Days, Hours, 2)),
            TaskTimeStatus::DueInLessThanYear(_) => Some(Self::new(Months, Days, 2)),
            TaskTimeStatus::DueInMoreThanYear(_) => Some(Self::new(Years, Months, 2)),
        }
    }
}

/// Render a time status for display.
///
/// Overdue statuses get a generic label; the overdue magnitude is not shown.
pub fn format_time_status<S: StringProvider + ?Sized>(status: &TaskTimeStatus, strings: &S) -> String {
    match status {
        TaskTimeStatus::NeverExecuted => strings.text(TextKey::NeverExecuted),
        TaskTimeStatus::Overdue(components) => {
            if components.is_due_now() {
                strings.text(TextKey::DueNow)
            } else {
                strings.text(TextKey::Overdue)
            }
        }
        TaskTimeStatus::DueInLessThanMinute(components)
        | TaskTimeStatus::DueInLessThanHour(components)
        | TaskTimeStatus::DueInLessThanDay(components)
        | TaskTimeStatus::DueInLessThanMonth(components)
        | TaskTimeStatus::DueInLessThanYear(components)
        | TaskTimeStatus::DueInMoreThanYear(components) => {
            let formatted = match FormatWindow::for_status(status) {
                Some(window) => format_components(components, window, strings),
                None => String::new(),
            };
            // No positive unit inside the window leaves a bare "due in " label.
            format!("{} {}", strings.text(TextKey::DueIn), formatted)
        }
    }
}

/// Join the positive units inside `window`, largest first, capped at `window.max_parts`.
pub fn format_components<S: StringProvider + ?Sized>(
    components: &TimeComponents,
    window: FormatWindow,
    strings: &S,
) -> String {
    let parts: Vec<String> = components
        .units()
        .into_iter()
        .filter(|(unit, value)| *value > 0 && window.contains(*unit))
        .take(window.max_parts)
        .map(|(unit, value)| strings.plural(unit, value))
        .collect();

    match parts.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second, ..] => format!(
            "{} {} {}",
            first,
            strings.text(TextKey::AndSeparator),
            second
        ),
    }
}
