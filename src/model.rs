use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Attribute value stored on a model instance.
///
/// Untagged so seed rows in YAML read naturally: `true`, `42`, `1906-12-09`
/// and `"Ada"` land in `Bool`, `Int`, `Date` and `Text` respectively.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Loose truthiness used by checkbox-style controls.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Date(_) => true,
            Value::Text(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("{model} has no field '{field}'")]
    UnknownField { model: String, field: String },
    #[error("{model}.{field} is not a relation")]
    NotRelation { model: String, field: String },
    #[error("{model}.{field} is a relation; assign an instance instead")]
    IsRelation { model: String, field: String },
    #[error("save failed: {0}")]
    Save(String),
    #[error("{0} instance outlived its store")]
    Detached(String),
}

/// Capability surface a model instance exposes to the form layer.
///
/// Attributes are addressed by name; relations are read and written through
/// their own pair of methods so a related instance is never flattened into a
/// [`Value`].
pub trait Model: fmt::Display {
    fn model_name(&self) -> &str;
    /// Primary key, once the instance has been persisted.
    fn pk(&self) -> Option<i64>;
    fn get(&self, field: &str) -> Result<Value, ModelError>;
    fn set(&mut self, field: &str, value: Value) -> Result<(), ModelError>;
    fn related(&self, field: &str) -> Result<Option<ModelHandle>, ModelError>;
    fn assign_related(
        &mut self,
        field: &str,
        related: Option<ModelHandle>,
    ) -> Result<(), ModelError>;
    fn save(&mut self) -> Result<(), ModelError>;
}

pub type ModelHandle = Rc<RefCell<dyn Model>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Char,
    Text,
    Email,
    Slug,
    Url,
    Date,
    Boolean,
    Integer,
    Decimal,
    ForeignKey,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldMeta {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    // Related model name (foreign_key only)
    #[serde(default)]
    pub to: Option<String>,
}

impl FieldMeta {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            label: None,
            to: None,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn to(mut self, model: &str) -> Self {
        self.to = Some(model.to_string());
        self
    }

    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::ForeignKey
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelMeta {
    pub name: String,
    // Field whose value is used when an instance is shown as an option
    #[serde(default)]
    pub display: Option<String>,
    pub fields: Vec<FieldMeta>,
}

impl ModelMeta {
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub type SeedRow = HashMap<String, Value>;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub title: Option<String>,
    // Model opened by the binary; defaults to the first declared model
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub models: Vec<ModelMeta>,
    #[serde(default)]
    pub seed: HashMap<String, Vec<SeedRow>>,
}

impl AppConfig {
    pub fn model(&self, name: &str) -> Option<&ModelMeta> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn open_model(&self) -> Option<&str> {
        self.open
            .as_deref()
            .or_else(|| self.models.first().map(|m| m.name.as_str()))
    }
}

pub fn validate_config(cfg: &AppConfig) -> Result<(), String> {
    use std::collections::HashSet;
    if cfg.models.is_empty() {
        return Err("config declares no models".into());
    }
    let mut names = HashSet::new();
    for (i, m) in cfg.models.iter().enumerate() {
        if !names.insert(m.name.as_str()) {
            return Err(format!("duplicate model name: '{}' at index {}", m.name, i));
        }
    }
    for m in &cfg.models {
        let mut fields = HashSet::new();
        for f in &m.fields {
            if f.name == "id" {
                return Err(format!("model '{}' must not declare 'id'", m.name));
            }
            if !fields.insert(f.name.as_str()) {
                return Err(format!("duplicate field '{}' in model '{}'", f.name, m.name));
            }
            if f.is_relation() {
                match f.to.as_deref() {
                    None | Some("") => {
                        return Err(format!(
                            "field '{}.{}' is a foreign_key without 'to'",
                            m.name, f.name
                        ));
                    }
                    Some(to) if !names.contains(to) => {
                        return Err(format!(
                            "field '{}.{}' refers to unknown model '{}'",
                            m.name, f.name, to
                        ));
                    }
                    _ => {}
                }
            }
        }
        if let Some(d) = &m.display {
            if m.field(d).is_none() {
                return Err(format!("model '{}' display field '{}' not declared", m.name, d));
            }
        }
    }
    if let Some(open) = &cfg.open {
        if !names.contains(open.as_str()) {
            return Err(format!("'open' refers to unknown model '{open}'"));
        }
    }
    for (model, rows) in &cfg.seed {
        let Some(meta) = cfg.model(model) else {
            return Err(format!("seed rows for unknown model '{model}'"));
        };
        for row in rows {
            for key in row.keys() {
                if meta.field(key).is_none() {
                    return Err(format!("seed row for '{model}' sets unknown field '{key}'"));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ModelMeta {
        ModelMeta {
            name: "Person".into(),
            display: Some("name".into()),
            fields: vec![
                FieldMeta::new("name", FieldKind::Char),
                FieldMeta::new("manager", FieldKind::ForeignKey).to("Person"),
            ],
        }
    }

    #[test]
    fn value_display_and_truthiness() {
        assert_eq!(Value::Null.to_string(), "");
        let d = NaiveDate::from_ymd_opt(1815, 12, 10).unwrap();
        assert_eq!(Value::Date(d).to_string(), "1815-12-10");
        assert!(Value::from("yes").is_truthy());
        assert!(!Value::from("False").is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }

    #[test]
    fn seed_values_deserialize_untagged() {
        let row: SeedRow =
            serde_yaml::from_str("{ name: Grace, born: 1906-12-09, active: true, n: 3, x: ~ }")
                .unwrap();
        assert_eq!(row["name"], Value::Text("Grace".into()));
        assert_eq!(
            row["born"],
            Value::Date(NaiveDate::from_ymd_opt(1906, 12, 9).unwrap())
        );
        assert_eq!(row["active"], Value::Bool(true));
        assert_eq!(row["n"], Value::Int(3));
        assert_eq!(row["x"], Value::Null);
    }

    #[test]
    fn validate_detects_duplicate_models() {
        let cfg = AppConfig {
            models: vec![person(), person()],
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.contains("duplicate model name"));
    }

    #[test]
    fn validate_foreign_key_requires_known_target() {
        let mut m = person();
        m.fields[1].to = Some("Team".into());
        let cfg = AppConfig {
            models: vec![m],
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.contains("unknown model 'Team'"));
    }

    #[test]
    fn validate_rejects_seed_for_unknown_field() {
        let mut seed = HashMap::new();
        let mut row = SeedRow::new();
        row.insert("age".into(), Value::Int(3));
        seed.insert("Person".into(), vec![row]);
        let cfg = AppConfig {
            models: vec![person()],
            seed,
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.contains("unknown field 'age'"));
        assert_eq!(cfg.open_model(), Some("Person"));
    }
}
