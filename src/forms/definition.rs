use crate::forms::fields::{self, FieldClass, FormField};
use crate::model::{FieldKind, FieldMeta, ModelMeta};

/// Ordered field descriptors for one model; order is on-screen row order.
#[derive(Clone, Debug, Default)]
pub struct FormDefinition {
    fields: Vec<FormField>,
}

pub fn class_for_kind(kind: FieldKind) -> &'static FieldClass {
    match kind {
        FieldKind::Char | FieldKind::Text => &fields::CHAR_FIELD,
        FieldKind::Email => &fields::EMAIL_FIELD,
        FieldKind::Slug => &fields::SLUG_FIELD,
        FieldKind::Url => &fields::URL_FIELD,
        FieldKind::Date => &fields::DATE_FIELD,
        FieldKind::Boolean => &fields::BOOLEAN_FIELD,
        FieldKind::Integer => &fields::INTEGER_FIELD,
        FieldKind::Decimal => &fields::DECIMAL_FIELD,
        FieldKind::ForeignKey => &fields::MODEL_CHOICE_FIELD,
    }
}

fn form_field(meta: &FieldMeta) -> FormField {
    FormField {
        name: meta.name.clone(),
        label: meta.label.clone(),
        class: class_for_kind(meta.kind),
        related: meta.to.clone(),
    }
}

impl FormDefinition {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    /// Derive a definition from model metadata, one field per declared
    /// model field, in declaration order.
    pub fn for_model(meta: &ModelMeta) -> Self {
        Self {
            fields: meta.fields.iter().map(form_field).collect(),
        }
    }

    /// Append `field`, or replace the existing field of the same name in place.
    pub fn with_field(mut self, field: FormField) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.retain(|f| f.name != name);
        self
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
