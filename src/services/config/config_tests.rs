use super::*;
use crate::model::{FieldKind, Value};
use std::path::Path;

const SAMPLE: &str = r#"
title: Staff
open: Person
exclude: [notes]
models:
  - name: Person
    display: name
    fields:
      - { name: name, kind: char, label: Full name }
      - { name: birthdate, kind: date }
      - { name: active, kind: boolean }
      - { name: manager, kind: foreign_key, to: Person }
      - { name: notes, kind: text }
seed:
  Person:
    - { name: Grace, birthdate: 1906-12-09, active: true }
"#;

#[test]
fn parse_config_reads_models_and_seed() {
    let cfg = parse_config(SAMPLE).unwrap();
    assert_eq!(cfg.title.as_deref(), Some("Staff"));
    assert_eq!(cfg.exclude, vec!["notes".to_string()]);
    let person = cfg.model("Person").unwrap();
    assert_eq!(person.fields.len(), 5);
    assert_eq!(person.fields[3].kind, FieldKind::ForeignKey);
    assert_eq!(person.fields[0].label.as_deref(), Some("Full name"));
    let seed = &cfg.seed["Person"][0];
    assert_eq!(seed["active"], Value::Bool(true));
}

#[test]
fn parse_config_surfaces_validation_errors() {
    let bad = SAMPLE.replace("to: Person", "to: Team");
    let err = parse_config(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("unknown model 'Team'"));
}

#[test]
fn candidates_walk_up_ancestors() {
    let paths = candidate_paths(Path::new("/a/b"));
    assert_eq!(paths[0], Path::new("/a/b/forms.yaml"));
    assert_eq!(paths[1], Path::new("/a/b/.forms/forms.yaml"));
    assert_eq!(paths[2], Path::new("/a/.forms/forms.yaml"));
    assert_eq!(paths[3], Path::new("/.forms/forms.yaml"));
    assert_eq!(paths.len(), 4);
}
