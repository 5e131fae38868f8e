//! Per-field adapters binding a model attribute to its control.

use crate::app::Effect;
use crate::model::{ModelError, ModelHandle, Value};
use crate::services::store::StorageHandle;
use crate::widgets::controls::{Button, CheckBox, Choice, DatePicker, TextEntry};
use crate::widgets::{Adapter, Display};
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use std::rc::Rc;

/// Default adapter: a text entry. Values are written back as raw text.
pub struct TextAdapter {
    field: String,
    instance: ModelHandle,
    entry: TextEntry,
}

impl TextAdapter {
    pub fn new(field: &str, instance: ModelHandle) -> Result<Self, ModelError> {
        let mut a = Self {
            field: field.to_string(),
            instance,
            entry: TextEntry::default(),
        };
        a.initialize_display()?;
        Ok(a)
    }

    pub fn entry_mut(&mut self) -> &mut TextEntry {
        &mut self.entry
    }
}

impl Adapter for TextAdapter {
    fn field(&self) -> &str {
        &self.field
    }

    fn initialize_display(&mut self) -> Result<(), ModelError> {
        let current = self.instance.borrow().get(&self.field)?;
        self.entry.set_value(&current.to_string());
        Ok(())
    }

    fn display(&self) -> Display<'_> {
        Display::Single(&self.entry)
    }

    fn extract_value(&mut self) -> Result<Value, ModelError> {
        let data = Value::Text(self.entry.value());
        self.instance.borrow_mut().set(&self.field, data.clone())?;
        Ok(data)
    }

    fn on_key(&mut self, _stop: usize, key: KeyCode) -> Vec<Effect> {
        self.entry.on_key(key);
        Vec::new()
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Starting date for a picker: the stored date, an ISO string, or today.
pub(crate) fn initial_date(value: &Value) -> NaiveDate {
    match value {
        Value::Date(d) => *d,
        Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").unwrap_or_else(|_| today()),
        _ => today(),
    }
}

/// Date picker; extraction writes the ISO date string.
pub struct DateAdapter {
    field: String,
    instance: ModelHandle,
    picker: DatePicker,
}

impl DateAdapter {
    pub fn new(field: &str, instance: ModelHandle) -> Result<Self, ModelError> {
        let mut a = Self {
            field: field.to_string(),
            instance,
            picker: DatePicker::new(today()),
        };
        a.initialize_display()?;
        Ok(a)
    }

    pub fn picker_mut(&mut self) -> &mut DatePicker {
        &mut self.picker
    }
}

impl Adapter for DateAdapter {
    fn field(&self) -> &str {
        &self.field
    }

    fn initialize_display(&mut self) -> Result<(), ModelError> {
        let current = self.instance.borrow().get(&self.field)?;
        self.picker.set_date(initial_date(&current));
        Ok(())
    }

    fn display(&self) -> Display<'_> {
        Display::Single(&self.picker)
    }

    fn extract_value(&mut self) -> Result<Value, ModelError> {
        let data = Value::Text(self.picker.iso());
        self.instance.borrow_mut().set(&self.field, data.clone())?;
        Ok(data)
    }

    fn on_key(&mut self, _stop: usize, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Left | KeyCode::Char('-') => self.picker.shift_days(-1),
            KeyCode::Right | KeyCode::Char('+') => self.picker.shift_days(1),
            KeyCode::PageUp => self.picker.shift_months(-1),
            KeyCode::PageDown => self.picker.shift_months(1),
            KeyCode::Char('t') => self.picker.set_date(today()),
            _ => {}
        }
        Vec::new()
    }
}

/// Checkbox; extraction writes a boolean.
pub struct BooleanAdapter {
    field: String,
    instance: ModelHandle,
    check: CheckBox,
}

impl BooleanAdapter {
    pub fn new(field: &str, instance: ModelHandle) -> Result<Self, ModelError> {
        let mut a = Self {
            field: field.to_string(),
            instance,
            check: CheckBox::default(),
        };
        a.initialize_display()?;
        Ok(a)
    }

    pub fn check_mut(&mut self) -> &mut CheckBox {
        &mut self.check
    }
}

impl Adapter for BooleanAdapter {
    fn field(&self) -> &str {
        &self.field
    }

    fn initialize_display(&mut self) -> Result<(), ModelError> {
        let current = self.instance.borrow().get(&self.field)?;
        self.check.set_checked(current.is_truthy());
        Ok(())
    }

    fn display(&self) -> Display<'_> {
        Display::Single(&self.check)
    }

    fn extract_value(&mut self) -> Result<Value, ModelError> {
        let data = Value::Bool(self.check.is_checked());
        self.instance.borrow_mut().set(&self.field, data.clone())?;
        Ok(data)
    }

    fn on_key(&mut self, _stop: usize, key: KeyCode) -> Vec<Effect> {
        if matches!(key, KeyCode::Char(' ') | KeyCode::Char('x')) {
            self.check.toggle();
        }
        Vec::new()
    }
}

const CHOICE_STOP: usize = 0;
const ADD_STOP: usize = 1;

/// Choice over every row of the related model, plus an "Add" button that
/// opens a nested dialog for a new related instance.
pub struct RelationAdapter {
    field: String,
    related_model: String,
    instance: ModelHandle,
    storage: StorageHandle,
    choice: Choice<ModelHandle>,
    add: Button,
}

impl RelationAdapter {
    pub fn new(
        field: &str,
        related_model: &str,
        instance: ModelHandle,
        storage: StorageHandle,
    ) -> Result<Self, ModelError> {
        let mut a = Self {
            field: field.to_string(),
            related_model: related_model.to_string(),
            instance,
            storage,
            choice: Choice::default(),
            add: Button::new("Add"),
        };
        a.initialize_display()?;
        Ok(a)
    }

    pub fn related_model(&self) -> &str {
        &self.related_model
    }

    pub fn choice(&self) -> &Choice<ModelHandle> {
        &self.choice
    }

    pub fn choice_mut(&mut self) -> &mut Choice<ModelHandle> {
        &mut self.choice
    }

    /// Re-enumerate the related table, keeping the current selection when
    /// its instance is still present.
    pub fn reload(&mut self) -> Result<(), ModelError> {
        let keep = self
            .choice
            .selection()
            .and_then(|i| self.choice.client_data(i).cloned());
        self.load_options()?;
        if let Some(h) = keep {
            self.select_instance(&h);
        }
        Ok(())
    }

    fn load_options(&mut self) -> Result<(), ModelError> {
        self.choice.clear();
        for obj in self.storage.all(&self.related_model)? {
            let label = obj.borrow().to_string();
            self.choice.append(label, obj);
        }
        Ok(())
    }

    fn select_instance(&mut self, target: &ModelHandle) {
        let idx = (0..self.choice.len()).find(|i| {
            self.choice
                .client_data(*i)
                .map(|h| Rc::ptr_eq(h, target))
                .unwrap_or(false)
        });
        self.choice.set_selection(idx);
    }
}

impl Adapter for RelationAdapter {
    fn field(&self) -> &str {
        &self.field
    }

    fn initialize_display(&mut self) -> Result<(), ModelError> {
        self.load_options()?;
        let current = self.instance.borrow().related(&self.field)?;
        if let Some(h) = current {
            self.select_instance(&h);
        }
        Ok(())
    }

    fn display(&self) -> Display<'_> {
        Display::Row(vec![&self.choice, &self.add])
    }

    // Writes the selected instance but returns its label.
    fn extract_value(&mut self) -> Result<Value, ModelError> {
        let (label, obj) = match self.choice.selection() {
            Some(i) => (
                self.choice.string(i).unwrap_or_default().to_string(),
                self.choice.client_data(i).cloned(),
            ),
            None => (String::new(), None),
        };
        self.instance
            .borrow_mut()
            .assign_related(&self.field, obj)?;
        Ok(Value::Text(label))
    }

    fn on_key(&mut self, stop: usize, key: KeyCode) -> Vec<Effect> {
        match (stop, key) {
            (CHOICE_STOP, KeyCode::Left) => self.choice.select_prev(),
            (CHOICE_STOP, KeyCode::Right) | (CHOICE_STOP, KeyCode::Char(' ')) => {
                self.choice.select_next()
            }
            (CHOICE_STOP, KeyCode::Char('r')) => {
                if let Err(e) = self.reload() {
                    tracing::warn!(field = %self.field, "reload failed: {e}");
                }
            }
            (ADD_STOP, KeyCode::Enter) | (ADD_STOP, KeyCode::Char(' ')) => {
                return vec![Effect::OpenRelated {
                    model: self.related_model.clone(),
                }];
            }
            _ => {}
        }
        Vec::new()
    }

    fn focus_stops(&self) -> usize {
        2
    }
}
