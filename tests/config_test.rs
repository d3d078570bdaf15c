use prominv::config::{CollisionPolicy, Config, ConfigError, LabelSources};

fn parse(yaml: &str) -> Config {
    serde_yaml::from_str(yaml).expect("config should parse")
}

#[test]
fn minimal_spec_gets_defaults() {
    let config = parse(
        r#"
map:
  - metric: up
    labels:
      model: m
"#,
    );

    let spec = &config.map[0];
    assert_eq!(spec.metric, "up");
    assert_eq!(spec.kind, "unknown");
    assert_eq!(spec.name, None);
    assert_eq!(spec.collisions, CollisionPolicy::Override);
    assert!(spec.labels.extra.is_empty());
    assert!(spec.regexp.is_empty());
    assert!(spec.statics.is_empty());
    assert!(spec.ignore_regexp.is_empty());
    assert!(spec.join.is_empty());
}

#[test]
fn label_sources_accept_scalar_and_list() {
    let config = parse(
        r#"
map:
  - metric: up
    labels:
      model: m
      location: [a, b]
      extra: [speed]
"#,
    );

    let labels = &config.map[0].labels;
    assert!(matches!(labels.fields["model"], LabelSources::One(_)));
    assert!(labels.fields["model"].matches("m"));
    assert!(!labels.fields["model"].matches("x"));
    assert!(labels.fields["location"].matches("a"));
    assert!(labels.fields["location"].matches("b"));
    assert_eq!(labels.extra, vec!["speed"]);
    // The reserved key never lands in the open field map
    assert!(!labels.fields.contains_key("extra"));
}

#[test]
fn join_specs_carry_index_and_nested_spec() {
    let config = parse(
        r#"
map:
  - metric: ifInfo
    type: switch
    labels:
      brand: brand
    join:
      - metric: entPhys
        index: [host, idx]
        labels:
          brand: entPhysicalMfgName
        static:
          location: dc1
"#,
    );

    let join = &config.map[0].join[0];
    assert_eq!(join.index, vec!["host", "idx"]);
    assert_eq!(join.spec.metric, "entPhys");
    assert_eq!(join.spec.kind, "unknown");
    assert_eq!(join.spec.statics["location"], "dc1");
}

#[test]
fn missing_labels_fails_to_load() {
    let result: Result<Config, _> = serde_yaml::from_str(
        r#"
map:
  - metric: up
    type: server
"#,
    );
    assert!(result.is_err());
}

#[test]
fn unknown_collision_policy_fails_to_load() {
    let result: Result<Config, _> = serde_yaml::from_str(
        r#"
map:
  - metric: up
    collisions: merge
    labels:
      model: m
"#,
    );
    assert!(result.is_err());
}

#[test]
fn invalid_extraction_pattern_fails_validation() {
    let config = parse(
        r#"
map:
  - metric: up
    labels:
      model: m
    regexp:
      m: '('
"#,
    );
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidPattern { .. })
    ));
}

#[test]
fn invalid_join_pattern_fails_validation() {
    let config = parse(
        r#"
map:
  - metric: up
    labels:
      brand: brand
    join:
      - metric: other
        index: [host]
        labels:
          brand: mfg
        ignore_regexp:
          - state: '[unclosed'
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn empty_ignore_pattern_is_valid() {
    // Empty pattern means "match when the label is absent"
    let config = parse(
        r#"
map:
  - metric: up
    labels:
      model: m
    ignore_regexp:
      - serial: ''
"#,
    );
    assert!(config.validate().is_ok());
}

#[test]
fn load_reads_and_validates_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.yaml");
    std::fs::write(
        &path,
        r#"
map:
  - name: switches
    metric: ifInfo
    type: switch
    labels:
      model: swModel
"#,
    )
    .unwrap();

    let config = Config::load(&path).expect("load failed");
    assert_eq!(config.map.len(), 1);
    assert_eq!(config.map[0].name.as_deref(), Some("switches"));
}

#[test]
fn load_rejects_malformed_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.yaml");
    std::fs::write(&path, "map: 'not a list'").unwrap();
    assert!(Config::load(&path).is_err());

    assert!(Config::load(&dir.path().join("absent.yaml")).is_err());
}
