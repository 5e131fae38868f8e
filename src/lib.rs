//! Terminal edit dialogs generated from model field definitions.
//!
//! A [`widgets::form::FormDialog`] asks a form definition for the ordered
//! fields of a model instance, picks an adapter per field through the
//! [`form_core::registry::AdapterRegistry`], and on confirmation writes every
//! control back into the instance before saving it once.

pub mod app;
pub mod form_core;
pub mod forms;
pub mod model;
pub mod services;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{ModalHost, ModalOutcome, ScriptedHost, Step};
pub use form_core::registry::{AdapterKind, AdapterRegistry};
pub use forms::{FormDefinition, FormField};
pub use model::{Model, ModelError, ModelHandle, Value};
pub use services::store::{MemoryStore, Storage, StorageHandle};
pub use widgets::form::{DialogOptions, DialogPhase, FormDialog};
