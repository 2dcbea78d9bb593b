use crate::error::{EngineError, EngineResult};
use crate::models::score::ScoreBands;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub critical_overdue_ratio: f64,
    pub score_bands: ScoreBands,
    pub date_format: String,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            critical_overdue_ratio: 0.2,
            score_bands: ScoreBands::default(),
            date_format: DATE_FORMATS[0].to_string(),
        }
    }
}

pub async fn get_settings(data_dir: String) -> EngineResult<Value> {
    load_settings_from_disk(&data_dir)
}

pub async fn save_settings(data_dir: String, settings: Value) -> EngineResult<Value> {
    save_settings_to_disk(&data_dir, settings)
}

pub fn load_effective_settings(data_dir: &str) -> EngineResult<EffectiveSettings> {
    let settings = load_settings_from_disk(data_dir)?;
    Ok(effective_from_value(&settings))
}

fn effective_from_value(settings: &Value) -> EffectiveSettings {
    let defaults = EffectiveSettings::default();
    let bands = settings.get("scoreBands");
    let band = |key: &str, default: f64| {
        bands
            .and_then(|b| b.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(default)
    };

    EffectiveSettings {
        critical_overdue_ratio: settings
            .get("criticalOverdueRatio")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.critical_overdue_ratio),
        score_bands: ScoreBands {
            attention: band("attention", defaults.score_bands.attention),
            high: band("high", defaults.score_bands.high),
            critical: band("critical", defaults.score_bands.critical),
        },
        date_format: settings
            .get("dateFormat")
            .and_then(Value::as_str)
            .unwrap_or(defaults.date_format.as_str())
            .to_string(),
    }
}

pub fn load_settings_from_disk(data_dir: &str) -> EngineResult<Value> {
    let path = settings_path(data_dir);
    ensure_settings_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| EngineError::Settings(format!("failed to read settings.json: {e}")))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON ({e}); using defaults");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &str, settings: Value) -> EngineResult<Value> {
    let path = settings_path(data_dir);
    ensure_settings_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("saved settings to {}", path.display());
    Ok(migrated)
}

fn settings_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(".issuerank").join("settings.json")
}

fn ensure_settings_dir(data_dir: &str) -> EngineResult<()> {
    let dir = Path::new(data_dir).join(".issuerank");
    fs::create_dir_all(&dir)
        .map_err(|e| EngineError::Settings(format!("failed to create .issuerank directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> EngineResult<()> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| EngineError::Settings(format!("failed to serialize settings: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| EngineError::Settings(format!("failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if version > SETTINGS_SCHEMA_VERSION {
        log::warn!("settings schema version {version} is newer than supported {SETTINGS_SCHEMA_VERSION}");
    }

    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    let defaults = EffectiveSettings::default();
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "criticalOverdueRatio": defaults.critical_overdue_ratio,
        "scoreBands": {
            "attention": defaults.score_bands.attention,
            "high": defaults.score_bands.high,
            "critical": defaults.score_bands.critical
        },
        "dateFormat": defaults.date_format
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let defaults = EffectiveSettings::default();

    clamp_f64(obj, "criticalOverdueRatio", 0.0, 1.0, defaults.critical_overdue_ratio);
    sanitize_enum(obj, "dateFormat", &DATE_FORMATS, DATE_FORMATS[0]);

    // Bands must be non-negative and non-decreasing.
    let bands = obj
        .entry("scoreBands".to_string())
        .or_insert_with(|| json!({}));
    if !bands.is_object() {
        *bands = json!({});
    }
    if let Some(band_obj) = bands.as_object_mut() {
        let attention = read_f64(band_obj, "attention", defaults.score_bands.attention).max(0.0);
        let high = read_f64(band_obj, "high", defaults.score_bands.high).max(attention);
        let critical = read_f64(band_obj, "critical", defaults.score_bands.critical).max(high);
        band_obj.insert("attention".to_string(), json!(attention));
        band_obj.insert("high".to_string(), json!(high));
        band_obj.insert("critical".to_string(), json!(critical));
    }
}

fn read_f64(map: &Map<String, Value>, key: &str, default: f64) -> f64 {
    map.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn clamp_f64(map: &mut Map<String, Value>, key: &str, min: f64, max: f64, default: f64) {
    let raw = read_f64(map, key, default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}
