use crate::model::{
    AppConfig, FieldKind, Model, ModelError, ModelHandle, ModelMeta, SeedRow, Value,
};
use serde_json::{json, Map, Value as JsonValue};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Storage collaborator: model metadata, table scans and fresh instances.
pub trait Storage {
    fn meta(&self, model: &str) -> Result<Rc<ModelMeta>, ModelError>;
    /// Every persisted instance of `model`, in insertion order.
    fn all(&self, model: &str) -> Result<Vec<ModelHandle>, ModelError>;
    /// A new, empty, not yet persisted instance of `model`.
    fn create(&self, model: &str) -> Result<ModelHandle, ModelError>;
}

pub type StorageHandle = Rc<dyn Storage>;

#[derive(Default)]
struct Ledger {
    next_id: Cell<i64>,
    saves: Cell<usize>,
    read_only: Cell<bool>,
}

impl Ledger {
    fn allocate_id(&self) -> i64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

type Rows = Rc<RefCell<Vec<Rc<RefCell<Record>>>>>;

pub struct Record {
    meta: Rc<ModelMeta>,
    ledger: Rc<Ledger>,
    // Attached to `table` on first save
    this: Weak<RefCell<Record>>,
    table: Weak<RefCell<Vec<Rc<RefCell<Record>>>>>,
    id: Option<i64>,
    values: HashMap<String, Value>,
    relations: HashMap<String, Option<ModelHandle>>,
}

impl Record {
    fn new(
        meta: Rc<ModelMeta>,
        ledger: Rc<Ledger>,
        this: Weak<RefCell<Record>>,
        table: &Rows,
    ) -> Self {
        let mut values = HashMap::new();
        let mut relations = HashMap::new();
        for f in &meta.fields {
            if f.is_relation() {
                relations.insert(f.name.clone(), None);
            } else {
                values.insert(f.name.clone(), Value::Null);
            }
        }
        Self {
            meta,
            ledger,
            this,
            table: Rc::downgrade(table),
            id: None,
            values,
            relations,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    fn unknown(&self, field: &str) -> ModelError {
        ModelError::UnknownField {
            model: self.meta.name.clone(),
            field: field.to_string(),
        }
    }

    fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("id".into(), json!(self.id));
        for f in &self.meta.fields {
            let v = if f.is_relation() {
                let pk = self
                    .relations
                    .get(&f.name)
                    .and_then(|r| r.as_ref())
                    .and_then(|h| h.try_borrow().ok().and_then(|m| m.pk()));
                json!(pk)
            } else {
                serde_json::to_value(self.values.get(&f.name).unwrap_or(&Value::Null))
                    .unwrap_or(JsonValue::Null)
            };
            obj.insert(f.name.clone(), v);
        }
        JsonValue::Object(obj)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.meta.display.as_ref().and_then(|d| self.values.get(d)) {
            if !v.is_null() {
                return write!(f, "{v}");
            }
        }
        match self.id {
            Some(id) => write!(f, "{} #{id}", self.meta.name),
            None => write!(f, "{} (unsaved)", self.meta.name),
        }
    }
}

impl Model for Record {
    fn model_name(&self) -> &str {
        &self.meta.name
    }

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn get(&self, field: &str) -> Result<Value, ModelError> {
        if field == "id" {
            return Ok(self.id.map(Value::Int).unwrap_or_default());
        }
        if let Some(v) = self.values.get(field) {
            return Ok(v.clone());
        }
        match self.relations.get(field) {
            Some(rel) => Ok(rel
                .as_ref()
                .and_then(|h| h.try_borrow().ok().and_then(|m| m.pk()))
                .map(Value::Int)
                .unwrap_or_default()),
            None => Err(self.unknown(field)),
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ModelError> {
        if self.relations.contains_key(field) {
            return Err(ModelError::IsRelation {
                model: self.meta.name.clone(),
                field: field.to_string(),
            });
        }
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.unknown(field)),
        }
    }

    fn related(&self, field: &str) -> Result<Option<ModelHandle>, ModelError> {
        match self.relations.get(field) {
            Some(rel) => Ok(rel.clone()),
            None if self.values.contains_key(field) => Err(ModelError::NotRelation {
                model: self.meta.name.clone(),
                field: field.to_string(),
            }),
            None => Err(self.unknown(field)),
        }
    }

    fn assign_related(
        &mut self,
        field: &str,
        related: Option<ModelHandle>,
    ) -> Result<(), ModelError> {
        if self.values.contains_key(field) {
            return Err(ModelError::NotRelation {
                model: self.meta.name.clone(),
                field: field.to_string(),
            });
        }
        match self.relations.get_mut(field) {
            Some(slot) => {
                *slot = related;
                Ok(())
            }
            None => Err(self.unknown(field)),
        }
    }

    fn save(&mut self) -> Result<(), ModelError> {
        if self.ledger.read_only.get() {
            return Err(ModelError::Save(format!(
                "store is read-only, {} not written",
                self.meta.name
            )));
        }
        if self.id.is_none() {
            let detached = || ModelError::Detached(self.meta.name.clone());
            let table = self.table.upgrade().ok_or_else(detached)?;
            let this = self.this.upgrade().ok_or_else(detached)?;
            self.id = Some(self.ledger.allocate_id());
            table.borrow_mut().push(this);
        }
        self.ledger.saves.set(self.ledger.saves.get() + 1);
        tracing::info!(model = %self.meta.name, id = ?self.id, "record saved");
        Ok(())
    }
}

struct Table {
    meta: Rc<ModelMeta>,
    /// Persisted records only, in save order.
    records: Rows,
}

/// Single-threaded in-memory storage. Cloning shares the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Rc<RefCell<Vec<Table>>>,
    ledger: Rc<Ledger>,
}

impl MemoryStore {
    pub fn new(models: Vec<ModelMeta>) -> Self {
        let tables = models
            .into_iter()
            .map(|m| Table {
                meta: Rc::new(m),
                records: Rows::default(),
            })
            .collect();
        Self {
            tables: Rc::new(RefCell::new(tables)),
            ledger: Rc::new(Ledger::default()),
        }
    }

    /// Build a store from config and load its seed rows, model by model in
    /// declaration order. Foreign keys in seed rows are given as the id of an
    /// already seeded row.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ModelError> {
        let store = Self::new(cfg.models.clone());
        for m in &cfg.models {
            for row in cfg.seed.get(&m.name).into_iter().flatten() {
                store.insert(&m.name, row.clone())?;
            }
        }
        Ok(store)
    }

    fn table_index(&self, model: &str) -> Result<usize, ModelError> {
        self.tables
            .borrow()
            .iter()
            .position(|t| t.meta.name == model)
            .ok_or_else(|| ModelError::UnknownModel(model.to_string()))
    }

    /// A detached record; it joins its table on first save.
    fn new_record(&self, model: &str) -> Result<(Rc<RefCell<Record>>, Rows), ModelError> {
        let idx = self.table_index(model)?;
        let tables = self.tables.borrow();
        let table = &tables[idx];
        let rec = Rc::new_cyclic(|this| {
            RefCell::new(Record::new(
                table.meta.clone(),
                self.ledger.clone(),
                this.clone(),
                &table.records,
            ))
        });
        Ok((rec, table.records.clone()))
    }

    fn find(&self, model: &str, id: i64) -> Option<Rc<RefCell<Record>>> {
        let tables = self.tables.borrow();
        let table = tables.iter().find(|t| t.meta.name == model)?;
        let records = table.records.borrow();
        let found = records
            .iter()
            .find(|r| r.try_borrow().map(|r| r.id == Some(id)).unwrap_or(false))
            .cloned();
        found
    }

    /// Insert an already persisted row without counting it as a save.
    pub fn insert(&self, model: &str, row: SeedRow) -> Result<ModelHandle, ModelError> {
        let (rec, rows) = self.new_record(model)?;
        {
            let mut r = rec.borrow_mut();
            let meta = r.meta.clone();
            for (key, value) in row {
                let Some(field) = meta.field(&key) else {
                    return Err(r.unknown(&key));
                };
                if field.kind == FieldKind::ForeignKey {
                    let target = match (&value, field.to.as_deref()) {
                        (Value::Int(id), Some(to)) => Some(
                            self.find(to, *id)
                                .ok_or_else(|| ModelError::UnknownModel(format!("{to} #{id}")))?
                                as ModelHandle,
                        ),
                        _ => None,
                    };
                    r.assign_related(&key, target)?;
                } else {
                    r.set(&key, value)?;
                }
            }
            r.id = Some(self.ledger.allocate_id());
        }
        rows.borrow_mut().push(rec.clone());
        let handle: ModelHandle = rec;
        Ok(handle)
    }

    /// Persisted rows of `model`.
    pub fn rows(&self, model: &str) -> Vec<ModelHandle> {
        self.all(model).unwrap_or_default()
    }

    /// Number of `save()` calls that reached storage.
    pub fn save_count(&self) -> usize {
        self.ledger.saves.get()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.ledger.read_only.set(read_only);
    }

    /// All persisted rows as JSON, keyed by model name.
    pub fn dump(&self) -> JsonValue {
        let tables = self.tables.borrow();
        let mut out = Map::new();
        for t in tables.iter() {
            let rows: Vec<JsonValue> = t
                .records
                .borrow()
                .iter()
                .filter_map(|r| r.try_borrow().ok())
                .map(|r| r.to_json())
                .collect();
            out.insert(t.meta.name.clone(), JsonValue::Array(rows));
        }
        JsonValue::Object(out)
    }
}

impl Storage for MemoryStore {
    fn meta(&self, model: &str) -> Result<Rc<ModelMeta>, ModelError> {
        let idx = self.table_index(model)?;
        Ok(self.tables.borrow()[idx].meta.clone())
    }

    fn all(&self, model: &str) -> Result<Vec<ModelHandle>, ModelError> {
        let idx = self.table_index(model)?;
        let tables = self.tables.borrow();
        let records = tables[idx].records.borrow();
        let handles = records.iter().map(|r| r.clone() as ModelHandle).collect();
        Ok(handles)
    }

    fn create(&self, model: &str) -> Result<ModelHandle, ModelError> {
        let (rec, _) = self.new_record(model)?;
        let handle: ModelHandle = rec;
        Ok(handle)
    }
}
