use crate::model::TimeUnitGranularity;
use std::collections::HashMap;

/// Fixed labels used when rendering a time status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    DueIn,
    Overdue,
    DueNow,
    NeverExecuted,
    AndSeparator,
}

impl TextKey {
    pub const ALL: [TextKey; 5] = [
        Self::DueIn,
        Self::Overdue,
        Self::DueNow,
        Self::NeverExecuted,
        Self::AndSeparator,
    ];

    /// Key under which the label can be overridden in the config `labels` map.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::DueIn => "due_in",
            Self::Overdue => "overdue",
            Self::DueNow => "due_now",
            Self::NeverExecuted => "never_executed",
            Self::AndSeparator => "and",
        }
    }

    pub fn from_config_key(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.config_key() == key)
    }
}

/// Resolves display strings, including quantity-aware unit names.
pub trait StringProvider {
    fn text(&self, key: TextKey) -> String;

    /// Render `quantity` together with its unit noun, e.g. `"1 day"` or `"3 days"`.
    fn plural(&self, unit: TimeUnitGranularity, quantity: u64) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishStrings;

impl StringProvider for EnglishStrings {
    fn text(&self, key: TextKey) -> String {
        match key {
            TextKey::DueIn => "due in",
            TextKey::Overdue => "overdue",
            TextKey::DueNow => "due now",
            TextKey::NeverExecuted => "never executed",
            TextKey::AndSeparator => "and",
        }
        .to_string()
    }

    fn plural(&self, unit: TimeUnitGranularity, quantity: u64) -> String {
        let (one, many) = match unit {
            TimeUnitGranularity::Years => ("year", "years"),
            TimeUnitGranularity::Months => ("month", "months"),
            TimeUnitGranularity::Days => ("day", "days"),
            TimeUnitGranularity::Hours => ("hour", "hours"),
            TimeUnitGranularity::Minutes => ("minute", "minutes"),
            TimeUnitGranularity::Seconds => ("second", "seconds"),
        };
        let noun = if quantity == 1 { one } else { many };
        format!("{quantity} {noun}")
    }
}

/// English strings with fixed labels replaced from configuration.
#[derive(Debug, Default, Clone)]
pub struct ConfiguredStrings {
    labels: HashMap<TextKey, String>,
}

impl ConfiguredStrings {
    /// Unknown keys are skipped; config loading validates them separately.
    pub fn from_labels(labels: &HashMap<String, String>) -> Self {
        let labels = labels
            .iter()
            .filter_map(|(key, value)| TextKey::from_config_key(key).map(|key| (key, value.clone())))
            .collect();
        Self { labels }
    }
}

impl StringProvider for ConfiguredStrings {
    fn text(&self, key: TextKey) -> String {
        match self.labels.get(&key) {
            Some(label) => label.clone(),
            None => EnglishStrings.text(key),
        }
    }

    fn plural(&self, unit: TimeUnitGranularity, quantity: u64) -> String {
        EnglishStrings.plural(unit, quantity)
    }
}
