use crate::settings::{SettingsMap, INPUT_FORMAT};
use crate::transform::DetectFormat;

pub const AUTO: &str = "auto";

fn normalized(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

/// Pick the format a validation request targets: an explicit selection,
/// then a manual `inputformat` other than `auto`, then detection. `None`
/// means the caller must not validate.
pub fn resolve(
    explicit: Option<&str>,
    manual: &SettingsMap,
    input: &str,
    detector: &dyn DetectFormat,
) -> Option<String> {
    if let Some(format) = explicit.and_then(normalized) {
        return Some(format);
    }

    if let Some(format) = manual.get(INPUT_FORMAT).and_then(normalized) {
        if format != AUTO {
            return Some(format);
        }
    }

    detector.detect(input).as_deref().and_then(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::parse;
    use crate::transform::BuiltinDetector;

    struct Never;

    impl DetectFormat for Never {
        fn detect(&self, _text: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn explicit_beats_everything() {
        let manual = parse("inputformat=json");
        assert_eq!(resolve(Some("YAML "), &manual, "<a/>", &BuiltinDetector).as_deref(), Some("yaml"));
    }

    #[test]
    fn blank_explicit_falls_through() {
        let manual = parse("inputformat=XML");
        assert_eq!(resolve(Some("  "), &manual, "{}", &BuiltinDetector).as_deref(), Some("xml"));
    }

    #[test]
    fn auto_defers_to_detection() {
        let manual = parse("inputformat=auto");
        assert_eq!(resolve(None, &manual, "<a/>", &BuiltinDetector).as_deref(), Some("xml"));
        assert_eq!(resolve(None, &manual, "<a/>", &Never), None);
    }
}
