use clap::{Parser, Subcommand};
use retask_core::config::ConfigOverrides;
use retask_core::error::AppError;
use retask_core::format::TextKey;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a recurring task
    ///
    /// Intervals accept s, m, h, d, mo and y units and can be combined.
    ///
    /// Example: retask add "Water plants" --min 2d --max 4d
    /// Example: retask add "Backup" --min 5d --max 7d --points 25
    Add {
        name: String,
        /// Earliest moment the task may be executed again after the last execution
        #[arg(long = "min", value_name = "INTERVAL")]
        min_interval: String,
        /// Moment after the last execution at which the task becomes overdue
        #[arg(long = "max", value_name = "INTERVAL")]
        max_interval: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        points: u32,
    },
    /// List tasks by urgency
    ///
    /// Example: retask list
    /// Example: retask list --watch
    List {
        /// Keep refreshing the list until interrupted
        #[arg(long)]
        watch: bool,
        /// Stop watching after this many refreshes
        #[arg(long, value_name = "N", requires = "watch")]
        ticks: Option<u64>,
    },
    /// Show details of a task
    ///
    /// Example: retask show task-1
    Show { id: String },
    /// Record an execution of a task now
    ///
    /// Example: retask execute task-1
    #[command(visible_alias = "done")]
    Execute { id: String },
    /// Delete a task
    ///
    /// Example: retask delete task-1
    Delete { id: String },
    /// Fill an empty store with example tasks
    ///
    /// Example: retask seed
    Seed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    RefreshIntervalMs(u64),
    Label(TextKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    match canonical_field.as_str() {
        "theme" | "refresh_interval_ms" if remainder.is_some() => Err(format!(
            "{canonical_field} override cannot have subfields"
        )),
        "theme" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::Theme,
            value,
        }),
        "refresh_interval_ms" => {
            let millis = value
                .parse::<u64>()
                .map_err(|_| format!("refresh_interval_ms must be a whole number, got '{value}'"))?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::RefreshIntervalMs(millis),
                value,
            })
        }
        "labels" | "label" => {
            let label_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "labels override requires a label name".to_string())?;
            let key = TextKey::from_config_key(label_name)
                .ok_or_else(|| format!("unknown label '{label_name}'"))?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Label(key),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Fold every `--config-override` argument into one set of overrides.
/// Later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::RefreshIntervalMs(millis) => {
                overrides.refresh_interval_ms = Some(millis);
            }
            ConfigOverrideTarget::Label(key) => {
                overrides
                    .labels
                    .insert(key.config_key().to_string(), parsed.value);
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
