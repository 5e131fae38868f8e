use crate::forms::fields::{self, FieldClass, FormField};
use crate::model::{ModelError, ModelHandle};
use crate::services::store::StorageHandle;
use crate::widgets::adapters::{BooleanAdapter, DateAdapter, RelationAdapter, TextAdapter};
use crate::widgets::Adapter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterKind {
    Text,
    Date,
    Boolean,
    Relation,
}

impl AdapterKind {
    /// Instantiate the adapter for `field` on `instance`. The control is
    /// initialized from the instance's current value before returning.
    pub fn build(
        self,
        field: &FormField,
        instance: ModelHandle,
        storage: StorageHandle,
    ) -> Result<Box<dyn Adapter>, ModelError> {
        Ok(match self {
            AdapterKind::Text => Box::new(TextAdapter::new(&field.name, instance)?),
            AdapterKind::Date => Box::new(DateAdapter::new(&field.name, instance)?),
            AdapterKind::Boolean => Box::new(BooleanAdapter::new(&field.name, instance)?),
            AdapterKind::Relation => {
                let target = match &field.related {
                    Some(m) => m.clone(),
                    None => related_model(&field.name, &instance, &storage)?,
                };
                Box::new(RelationAdapter::new(&field.name, &target, instance, storage)?)
            }
        })
    }
}

// Relation target taken from the model's own metadata when the form
// definition does not name one.
fn related_model(
    field: &str,
    instance: &ModelHandle,
    storage: &StorageHandle,
) -> Result<String, ModelError> {
    let model = instance.borrow().model_name().to_string();
    let meta = storage.meta(&model)?;
    meta.field(field)
        .and_then(|f| f.to.clone())
        .ok_or(ModelError::NotRelation {
            model,
            field: field.to_string(),
        })
}

/// Ordered field class → adapter table.
#[derive(Clone, Debug)]
pub struct AdapterRegistry {
    entries: Vec<(&'static str, AdapterKind)>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                (fields::CHAR_FIELD.name, AdapterKind::Text),
                (fields::DATE_FIELD.name, AdapterKind::Date),
                (fields::BOOLEAN_FIELD.name, AdapterKind::Boolean),
                (fields::MODEL_CHOICE_FIELD.name, AdapterKind::Relation),
            ],
        }
    }
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `kind` for `class`, replacing an existing registration.
    pub fn register(&mut self, class: &'static FieldClass, kind: AdapterKind) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| *n == class.name) {
            Some(slot) => slot.1 = kind,
            None => self.entries.push((class.name, kind)),
        }
        self
    }

    /// Kind registered for exactly `class`, ignoring ancestors.
    pub fn registered(&self, class: &FieldClass) -> Option<AdapterKind> {
        self.entries
            .iter()
            .find(|(n, _)| *n == class.name)
            .map(|(_, k)| *k)
    }

    /// Adapter kind for `field`: the first registered class in its ancestry,
    /// most specific first. Unregistered classes get a text entry.
    pub fn select(&self, field: &FormField) -> AdapterKind {
        for class in field.class.ancestry() {
            if let Some(kind) = self.registered(class) {
                return kind;
            }
        }
        tracing::info!(
            field = %field.name,
            class = %field.class,
            "using default text adapter"
        );
        AdapterKind::Text
    }
}
