use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMeta {
    pub input_format: String,
    pub output_format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub output: String,
    pub meta: ConversionMeta,
}

/// In-process conversion library. Errors are user-facing messages.
pub trait Transform: Send + Sync {
    fn convert(&self, input: &str, settings_text: &str) -> Result<TransformOutput, String>;
}

/// Best-guess format name for raw input text.
pub trait DetectFormat: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

pub fn detect_format(content: &str) -> Option<&'static str> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return None;
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<Value>(trimmed).is_ok()
    {
        return Some("json");
    }

    if trimmed.starts_with('<') {
        return Some("xml");
    }

    let mut lines = trimmed.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next().unwrap_or_default();

    if trimmed.starts_with("---") || first.starts_with("- ") || looks_like_yaml_mapping(first) {
        return Some("yaml");
    }

    let columns = first.matches(',').count();
    if columns > 0 {
        let rows: Vec<&str> = lines.collect();
        if !rows.is_empty() && rows.iter().all(|row| row.matches(',').count() == columns) {
            return Some("csv");
        }
    }

    None
}

fn looks_like_yaml_mapping(line: &str) -> bool {
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.trim().is_empty()
                && !key.contains(',')
                && !key.contains('"')
                && (rest.is_empty() || rest.starts_with(' '))
        }
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDetector;

impl DetectFormat for BuiltinDetector {
    fn detect(&self, text: &str) -> Option<String> {
        detect_format(text).map(str::to_string)
    }
}

/// Minimal stand-in for the external conversion library: JSON to JSON only,
/// honouring the `align` and `case` hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTransform;

impl Transform for BuiltinTransform {
    fn convert(&self, input: &str, settings_text: &str) -> Result<TransformOutput, String> {
        let settings = Settings::parse(settings_text);

        let declared = settings
            .input_format
            .as_deref()
            .map(str::to_lowercase)
            .filter(|f| f != "auto");

        let input_format = match declared {
            Some(format) => format,
            None => detect_format(input)
                .map(str::to_string)
                .ok_or_else(|| "Could not detect input format".to_string())?,
        };

        let output_format = settings
            .output_format
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| input_format.clone());

        let output = match (input_format.as_str(), output_format.as_str()) {
            ("json", "json") => {
                let value: Value = serde_json::from_str(input.trim_start_matches('\u{feff}'))
                    .map_err(|e| format!("Invalid JSON: {}", e))?;
                let value = rename_keys(value, settings.hint("case"));

                let pretty = settings
                    .hint("align")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"));
                let serialized = if pretty {
                    serde_json::to_string_pretty(&value)
                } else {
                    serde_json::to_string(&value)
                };
                serialized.map_err(|e| format!("Failed to serialize JSON: {}", e))?
            }
            (from, to) => return Err(format!("Unsupported conversion: {} -> {}", from, to)),
        };

        Ok(TransformOutput {
            output,
            meta: ConversionMeta {
                input_format,
                output_format,
            },
        })
    }
}

fn rename_keys(value: Value, case: Option<&str>) -> Value {
    let rename: fn(&str) -> String = match case.map(str::to_lowercase).as_deref() {
        Some("upper") => str::to_uppercase,
        Some("lower") => str::to_lowercase,
        _ => return value,
    };
    apply_case(value, rename)
}

fn apply_case(value: Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), apply_case(v, rename)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| apply_case(v, rename)).collect()),
        other => other,
    }
}
