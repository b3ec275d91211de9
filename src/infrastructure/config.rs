use crate::domain::layout::LayoutSettings;
use crate::infrastructure::error::EngineError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const APP_JSON: &str = "app.json";
const DISPLAY_JSON: &str = "display.json";
const SOURCES_JSON: &str = "sources.json";
const SUPPORTED_SCHEMA: u64 = 1;

pub const DEFAULT_TIMEZONE: &str = "US/Eastern";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u64,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub schema: u64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub grid_width_ratio: f64,
    pub base_row_height: u32,
    pub gutter_padding: u32,
    pub header_height: u32,
    pub wrap_char_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TickTickEntry {
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourcesConfig {
    pub schema: u64,
    pub calendars: Vec<CalendarEntry>,
    pub ticktick: Option<TickTickEntry>,
    pub fetch_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ConfigBundle {
    pub app: AppConfig,
    pub display: DisplayConfig,
    pub sources: SourcesConfig,
}

impl AppConfig {
    pub fn display_timezone(&self) -> Result<Tz, EngineError> {
        Tz::from_str(&self.timezone).map_err(|_| {
            EngineError::InvalidConfig(format!("unknown timezone '{}'", self.timezone))
        })
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.grid_width_ratio > 0.0 && self.grid_width_ratio <= 1.0) {
            return Err(EngineError::InvalidConfig(
                "gridWidthRatio must be within (0, 1]".to_string(),
            ));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(EngineError::InvalidConfig(
                "canvas dimensions must be positive".to_string(),
            ));
        }
        if self.base_row_height == 0 {
            return Err(EngineError::InvalidConfig(
                "baseRowHeight must be positive".to_string(),
            ));
        }
        if self.wrap_char_width == 0 {
            return Err(EngineError::InvalidConfig(
                "wrapCharWidth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            grid_width_ratio: self.grid_width_ratio,
            base_row_height: self.base_row_height,
            gutter: self.gutter_padding,
            header_height: self.header_height,
            wrap_char_width: self.wrap_char_width,
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "timezone": DEFAULT_TIMEZONE,
            }),
        ),
        (
            DISPLAY_JSON,
            serde_json::json!({
                "schema": 1,
                "canvasWidth": 1200,
                "canvasHeight": 800,
                "gridWidthRatio": 0.85,
                "baseRowHeight": 30,
                "gutterPadding": 5,
                "headerHeight": 60,
                "wrapCharWidth": 8,
            }),
        ),
        (
            SOURCES_JSON,
            serde_json::json!({
                "schema": 1,
                "calendars": [{"name": "primary", "id": "primary"}],
                "ticktick": null,
                "fetchTimeoutSeconds": 20,
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(config_dir)?;
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| EngineError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SUPPORTED_SCHEMA {
        return Err(EngineError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(serde_json::from_value(parsed)?)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, EngineError> {
    let app: AppConfig = read_config(&config_dir.join(APP_JSON))?;
    let display: DisplayConfig = read_config(&config_dir.join(DISPLAY_JSON))?;
    let sources: SourcesConfig = read_config(&config_dir.join(SOURCES_JSON))?;

    app.display_timezone()?;
    display.validate()?;

    Ok(ConfigBundle {
        app,
        display,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_CONFIG: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_CONFIG.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "inkweek-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp config dir");
            Self { path }
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn defaults_are_written_once_and_load_cleanly() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        let bundle = load_configs(&dir.path).expect("load configs");

        assert_eq!(bundle.app.timezone, DEFAULT_TIMEZONE);
        assert_eq!(bundle.display.canvas_width, 1200);
        assert_eq!(bundle.display.grid_width_ratio, 0.85);
        assert_eq!(bundle.sources.calendars.len(), 1);
        assert!(bundle.sources.ticktick.is_none());
        assert_eq!(bundle.sources.fetch_timeout_seconds, 20);
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = TempConfigDir::new();
        let app_path = dir.path.join(APP_JSON);
        fs::write(
            &app_path,
            "{\"schema\": 1, \"timezone\": \"Asia/Tokyo\"}\n",
        )
        .expect("seed app config");

        ensure_default_configs(&dir.path).expect("write defaults");
        let bundle = load_configs(&dir.path).expect("load configs");
        assert_eq!(bundle.app.timezone, "Asia/Tokyo");
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        fs::write(
            dir.path.join(APP_JSON),
            "{\"schema\": 2, \"timezone\": \"UTC\"}\n",
        )
        .expect("overwrite app config");

        assert!(matches!(
            load_configs(&dir.path),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        fs::write(
            dir.path.join(APP_JSON),
            "{\"schema\": 1, \"timezone\": \"Mars/Olympus\"}\n",
        )
        .expect("overwrite app config");

        assert!(matches!(
            load_configs(&dir.path),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn display_validation_rejects_bad_ratio() {
        let display = DisplayConfig {
            schema: 1,
            canvas_width: 1200,
            canvas_height: 800,
            grid_width_ratio: 1.5,
            base_row_height: 30,
            gutter_padding: 5,
            header_height: 60,
            wrap_char_width: 8,
        };
        assert!(display.validate().is_err());
    }
}
