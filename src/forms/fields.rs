//! Form field classes and the per-field descriptor.
//!
//! Field classes form a single-inheritance tree. Adapter selection walks a
//! class's ancestry from the class itself up to the root, so a subclass
//! without its own registration inherits its parent's adapter.

use std::fmt;

#[derive(Debug)]
pub struct FieldClass {
    pub name: &'static str,
    pub parent: Option<&'static FieldClass>,
}

impl FieldClass {
    pub const fn new(name: &'static str, parent: Option<&'static FieldClass>) -> Self {
        Self { name, parent }
    }

    /// The class itself, then each ancestor up to the root.
    pub fn ancestry(&'static self) -> Ancestry {
        Ancestry { next: Some(self) }
    }

    pub fn is_a(&'static self, other: &FieldClass) -> bool {
        self.ancestry().any(|c| c.name == other.name)
    }
}

impl fmt::Display for FieldClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub struct Ancestry {
    next: Option<&'static FieldClass>,
}

impl Iterator for Ancestry {
    type Item = &'static FieldClass;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = cur.parent;
        Some(cur)
    }
}

pub static FIELD: FieldClass = FieldClass::new("Field", None);
pub static CHAR_FIELD: FieldClass = FieldClass::new("CharField", Some(&FIELD));
pub static EMAIL_FIELD: FieldClass = FieldClass::new("EmailField", Some(&CHAR_FIELD));
pub static SLUG_FIELD: FieldClass = FieldClass::new("SlugField", Some(&CHAR_FIELD));
pub static URL_FIELD: FieldClass = FieldClass::new("UrlField", Some(&CHAR_FIELD));
pub static REGEX_FIELD: FieldClass = FieldClass::new("RegexField", Some(&CHAR_FIELD));
pub static DATE_FIELD: FieldClass = FieldClass::new("DateField", Some(&FIELD));
pub static BOOLEAN_FIELD: FieldClass = FieldClass::new("BooleanField", Some(&FIELD));
pub static NULL_BOOLEAN_FIELD: FieldClass =
    FieldClass::new("NullBooleanField", Some(&BOOLEAN_FIELD));
pub static INTEGER_FIELD: FieldClass = FieldClass::new("IntegerField", Some(&FIELD));
pub static DECIMAL_FIELD: FieldClass = FieldClass::new("DecimalField", Some(&FIELD));
pub static CHOICE_FIELD: FieldClass = FieldClass::new("ChoiceField", Some(&FIELD));
pub static MODEL_CHOICE_FIELD: FieldClass =
    FieldClass::new("ModelChoiceField", Some(&CHOICE_FIELD));

/// Descriptor for one form field. Only `class` influences which adapter is
/// built; `related` names the target model of a relation field.
#[derive(Clone, Debug)]
pub struct FormField {
    pub name: String,
    pub label: Option<String>,
    pub class: &'static FieldClass,
    pub related: Option<String>,
}

impl FormField {
    pub fn new(name: &str, class: &'static FieldClass) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            class,
            related: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_related(mut self, model: &str) -> Self {
        self.related = Some(model.to_string());
        self
    }

    /// Declared label, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}
