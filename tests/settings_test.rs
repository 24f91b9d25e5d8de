use formatbridge::settings::{self, lookup, parse, without_key, Engine, Settings};

#[test]
fn test_last_occurrence_wins_case_insensitively() {
    println!("=== Settings: last matching line wins ===");

    let map = parse("inputformat=json\nInputFormat = xml\nINPUTFORMAT=  csv  ");

    assert_eq!(lookup(&map, "inputformat"), Some("csv"));
    assert_eq!(lookup(&map, "INPUTFORMAT"), Some("csv"), "Lookup should ignore key case");
    assert_eq!(map.len(), 1, "Duplicates collapse into one entry");

    println!("✓ Last occurrence wins\n");
}

#[test]
fn test_blank_comment_and_malformed_lines_are_dropped() {
    println!("=== Settings: non-setting lines are ignored ===");

    let text = "\n   \n# engine=rpc\n  #outputformat=xml\nnot a setting\n=orphan\naccent=grave\n";
    let map = parse(text);

    assert_eq!(lookup(&map, "engine"), None, "Commented engine must not count");
    assert_eq!(lookup(&map, "outputformat"), None);
    assert_eq!(lookup(&map, "accent"), Some("grave"));
    assert_eq!(map.len(), 1, "Only the real setting should survive");

    println!("✓ Only key=value lines produce entries\n");
}

#[test]
fn test_values_keep_inner_equals_and_windows_endings() {
    let map = parse("case=a=b\r\noutputformat=yaml\r\n");

    assert_eq!(lookup(&map, "case"), Some("a=b"));
    assert_eq!(lookup(&map, "outputformat"), Some("yaml"), "Trailing \\r is trimmed away");
}

#[test]
fn test_without_engine_preserves_every_other_line() {
    println!("=== Settings: stripping engine ===");

    let text = "inputformat=json\n  Engine = rpc\n# engine=local stays, it is a comment\n\nalign=true\nENGINE=local\ncase=none";
    let stripped = without_key(text, "engine");

    assert_eq!(
        stripped,
        "inputformat=json\n# engine=local stays, it is a comment\n\nalign=true\ncase=none"
    );

    for line in stripped.lines() {
        let key = line.split('=').next().unwrap_or("").trim().to_lowercase();
        assert!(key != "engine", "Stripped text still has an engine line: {:?}", line);
    }

    println!("✓ Engine removed, everything else verbatim\n");
}

#[test]
fn test_without_key_on_end_to_end_settings() {
    let text = "inputformat=json\noutputformat=yaml\nengine=rpc\nsavetohistory=true";

    assert_eq!(
        without_key(text, "engine"),
        "inputformat=json\noutputformat=yaml\nsavetohistory=true"
    );
    assert_eq!(without_key(text, "missing"), text, "Unknown key leaves text untouched");
}

#[test]
fn test_typed_settings_defaults() {
    let settings = Settings::parse("");

    assert_eq!(settings.engine, Engine::Local);
    assert!(!settings.save_to_history);
    assert_eq!(settings.input_format, None);
    assert_eq!(settings.output_format, None);
    assert!(settings.hints.is_empty());
}

#[test]
fn test_typed_settings_from_default_text() {
    let text = "inputformat=json\noutputformat=yaml\nengine=local\nsavetohistory=false\nalign=true\ncase=none";
    let settings = Settings::from_map(&settings::parse(text));

    assert_eq!(settings.input_format.as_deref(), Some("json"));
    assert_eq!(settings.output_format.as_deref(), Some("yaml"));
    assert_eq!(settings.engine, Engine::Local);
    assert!(!settings.save_to_history);
    assert_eq!(settings.hint("align"), Some("true"));
    assert_eq!(settings.hint("CASE"), Some("none"));
    assert!(settings.hint("engine").is_none(), "engine is not a pass-through hint");
}
