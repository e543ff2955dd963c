use crate::error::AppError;
use crate::format::{ConfiguredStrings, TextKey};
use crate::model::TaskStatusColor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "RETASK_CONFIG_PATH";

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1_000;
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Palette {
    pub green: &'static str,
    pub orange: &'static str,
    pub red: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn paint(&self, color: TaskStatusColor, text: &str) -> String {
        let code = match color {
            TaskStatusColor::Green => self.green,
            TaskStatusColor::Orange => self.orange,
            TaskStatusColor::Red => self.red,
        };
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("vivid") => Palette {
            green: "\x1b[32m",
            orange: "\x1b[38;5;208m",
            red: "\x1b[31m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            green: "\x1b[38;5;64m",
            orange: "\x1b[38;5;166m",
            red: "\x1b[38;5;160m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            green: "",
            orange: "",
            red: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
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
        return Some("plain".into());
    }

    match trimmed {
        "default" | "none" | "mono" | "no_color" => Some("plain".to_string()),
        "color" | "colour" | "ansi" | "traffic_light" => Some("vivid".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub refresh_interval_ms: Option<u64>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        let millis = self
            .refresh_interval_ms
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
            .max(MIN_REFRESH_INTERVAL_MS);
        Duration::from_millis(millis)
    }

    pub fn strings(&self) -> ConfiguredStrings {
        ConfiguredStrings::from_labels(&self.labels)
    }

    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub refresh_interval_ms: Option<u64>,
    pub labels: HashMap<String, String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("retask").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("retask")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    normalize_config(config)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err.message())))
}

fn normalize_config(mut config: Config) -> Result<Config, AppError> {
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config.labels = normalize_labels(config.labels)?;
    Ok(config)
}

fn normalize_labels(labels: HashMap<String, String>) -> Result<HashMap<String, String>, AppError> {
    labels
        .into_iter()
        .map(|(key, value)| match TextKey::from_config_key(&key) {
            Some(text_key) => Ok((text_key.config_key().to_string(), value)),
            None => Err(AppError::invalid_data(format!("unknown label '{key}'"))),
        })
        .collect()
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    if let Some(refresh_interval_ms) = overrides.refresh_interval_ms {
        merged.refresh_interval_ms = Some(refresh_interval_ms);
    }

    for (key, value) in overrides.labels.iter() {
        if let Some(text_key) = TextKey::from_config_key(key) {
            merged
                .labels
                .insert(text_key.config_key().to_string(), value.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
    };
    use crate::format::{StringProvider, TextKey};
    use crate::model::TaskStatusColor;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("retask-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_some());
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Traffic Light",
            "refresh_interval_ms": 250,
            "labels": {
                "Due-In": "in"
            }
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("vivid"));
        assert_eq!(loaded.refresh_interval(), Duration::from_millis(250));
        assert_eq!(loaded.labels.get("due_in").map(String::as_str), Some("in"));
        assert_eq!(loaded.strings().text(TextKey::DueIn), "in");
    }

    #[test]
    fn load_config_rejects_unknown_label() {
        let path = temp_path("unknown-label.json");
        let content = serde_json::json!({ "labels": { "later": "soon" } });
        fs::write(&path, content.to_string()).unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
        assert!(err.message().contains("later"));
    }

    #[test]
    fn refresh_interval_defaults_and_clamps() {
        assert_eq!(Config::default().refresh_interval(), Duration::from_secs(1));

        let config = Config {
            refresh_interval_ms: Some(5),
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_millis(100));
    }

    #[test]
    fn merge_overrides_updates_fields() {
        let base = Config {
            theme: Some("plain".into()),
            refresh_interval_ms: Some(2_000),
            labels: [("overdue".into(), "late".into())].into_iter().collect(),
        };

        let overrides = ConfigOverrides {
            theme: Some("Solarized".into()),
            refresh_interval_ms: Some(500),
            labels: [
                ("overdue".into(), "LATE".into()),
                ("never-executed".into(), "new".into()),
                ("unknown".into(), "skipped".into()),
            ]
            .into_iter()
            .collect(),
        };

        let merged = merge_overrides(&base, &overrides);
        assert_eq!(merged.theme.as_deref(), Some("solarized"));
        assert_eq!(merged.refresh_interval_ms, Some(500));
        assert_eq!(merged.labels.get("overdue").map(String::as_str), Some("LATE"));
        assert_eq!(
            merged.labels.get("never_executed").map(String::as_str),
            Some("new")
        );
        assert!(!merged.labels.contains_key("unknown"));

        assert_eq!(base.theme.as_deref(), Some("plain"));
        assert_eq!(base.labels.get("overdue").map(String::as_str), Some("late"));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("vivid".into()),
            refresh_interval_ms: None,
            labels: Default::default(),
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Default"), Some("plain".into()));
        assert_eq!(canonical_theme_name("no-color"), Some("plain".into()));
        assert_eq!(canonical_theme_name("Colour"), Some("vivid".into()));
        assert_eq!(canonical_theme_name("Solarized"), Some("solarized".into()));
        assert_eq!(canonical_theme_name("  "), Some("plain".into()));
    }

    #[test]
    fn palette_paints_by_urgency() {
        let plain = palette_for_theme(Some("plain"));
        assert_eq!(plain.paint(TaskStatusColor::Red, "overdue"), "overdue");

        let vivid = palette_for_theme(Some("ansi"));
        assert_eq!(
            vivid.paint(TaskStatusColor::Red, "overdue"),
            "\x1b[31moverdue\x1b[0m"
        );
        assert_eq!(
            vivid.paint(TaskStatusColor::Orange, "x"),
            "\x1b[38;5;208mx\x1b[0m"
        );

        let unknown = palette_for_theme(Some("oceanic"));
        assert_eq!(unknown.paint(TaskStatusColor::Green, "ok"), "ok");
    }
}
