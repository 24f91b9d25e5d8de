use std::collections::{BTreeMap, HashMap};

use nom::{
    bytes::complete::take_till1,
    character::complete::char,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};
use serde::Serialize;

pub const INPUT_FORMAT: &str = "inputformat";
pub const OUTPUT_FORMAT: &str = "outputformat";
pub const ENGINE: &str = "engine";
pub const SAVE_TO_HISTORY: &str = "savetohistory";

/// Case-insensitive view of a settings text. Keys are lower-cased, values
/// trimmed, and the last occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsMap {
    entries: HashMap<String, String>,
}

impl SettingsMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn key_value(line: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c| c == '='), char('='), rest)(line)
}

/// Splits one trimmed line into `(key, value)`. Blank lines, `#` comments,
/// lines without `=` and lines with an empty key yield nothing.
fn split_line(trimmed: &str) -> Option<(String, &str)> {
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (_, (key, value)) = key_value(trimmed).ok()?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key.to_lowercase(), value.trim()))
}

/// Parse free-form `key=value` settings text. Never fails: anything that is
/// not a setting line is dropped.
pub fn parse(text: &str) -> SettingsMap {
    let mut entries = HashMap::new();

    for line in text.split('\n') {
        if let Some((key, value)) = split_line(line.trim()) {
            entries.insert(key, value.to_string());
        }
    }

    SettingsMap { entries }
}

pub fn lookup<'a>(map: &'a SettingsMap, key: &str) -> Option<&'a str> {
    map.get(key)
}

/// Reproduce `text` minus every line whose key matches `key`
/// (case-insensitive). All other lines are kept verbatim and in order.
pub fn without_key(text: &str, key: &str) -> String {
    let key = key.trim().to_lowercase();

    text.split('\n')
        .filter(|line| match split_line(line.trim()) {
            Some((line_key, _)) => line_key != key,
            None => true,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Local,
    Rpc,
}

impl Engine {
    /// `rpc` selects the remote engine; anything else stays in-process.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "rpc" => Engine::Rpc,
            Some(v) if v == "local" || v.is_empty() => Engine::Local,
            None => Engine::Local,
            Some(other) => {
                tracing::warn!("[SETTINGS] Unknown engine '{}', using local", other);
                Engine::Local
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Local => "local",
            Engine::Rpc => "rpc",
        }
    }
}

/// Typed settings, built once from a [`SettingsMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub engine: Engine,
    pub save_to_history: bool,
    /// Everything else (`align`, `case`, ...), forwarded untouched.
    pub hints: BTreeMap<String, String>,
}

impl Settings {
    pub fn parse(text: &str) -> Self {
        Self::from_map(&parse(text))
    }

    pub fn from_map(map: &SettingsMap) -> Self {
        let non_empty = |key: &str| {
            map.get(key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let hints = map
            .iter()
            .filter(|(k, _)| ![INPUT_FORMAT, OUTPUT_FORMAT, ENGINE, SAVE_TO_HISTORY].contains(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Settings {
            input_format: non_empty(INPUT_FORMAT),
            output_format: non_empty(OUTPUT_FORMAT),
            engine: Engine::from_setting(map.get(ENGINE)),
            save_to_history: map
                .get(SAVE_TO_HISTORY)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            hints,
        }
    }

    pub fn hint(&self, key: &str) -> Option<&str> {
        self.hints.get(&key.to_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_line_rejects_empty_key() {
        assert_eq!(split_line("=json"), None);
        assert_eq!(split_line("# inputformat=json"), None);
        assert_eq!(split_line("noequals"), None);
    }

    #[test]
    fn split_line_keeps_equals_in_value() {
        assert_eq!(
            split_line("Case = a=b"),
            Some(("case".to_string(), "a=b"))
        );
    }

    #[test]
    fn engine_defaults_to_local() {
        assert_eq!(Engine::from_setting(None), Engine::Local);
        assert_eq!(Engine::from_setting(Some("RPC")), Engine::Rpc);
        assert_eq!(Engine::from_setting(Some("grpc")), Engine::Local);
    }

    #[test]
    fn settings_split_known_keys_from_hints() {
        let settings = Settings::parse("inputformat=json\nALIGN=true\ncase=upper\nsavetohistory=TRUE");
        assert_eq!(settings.input_format.as_deref(), Some("json"));
        assert_eq!(settings.output_format, None);
        assert!(settings.save_to_history);
        assert_eq!(settings.hint("align"), Some("true"));
        assert_eq!(settings.hints.len(), 2);
    }
}
