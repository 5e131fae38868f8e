use crate::app::{Effect, ModalHost, ModalOutcome};
use crate::form_core::focus::{FocusRing, FocusStop};
use crate::form_core::registry::AdapterRegistry;
use crate::forms::FormDefinition;
use crate::model::{ModelHandle, Value};
use crate::services::store::StorageHandle;
use crate::widgets::chrome::{centered_fixed, panel_block};
use crate::widgets::controls::Button;
use crate::widgets::{cells, Adapter, Control};
use anyhow::{bail, Context, Result};
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};
use std::collections::HashSet;

const COLUMN_GAP: u16 = 2;
// Border plus one cell of padding on each side
const FRAME_PAD: u16 = 2;

pub struct InterfaceEntry {
    pub label: String,
    pub adapter: Box<dyn Adapter>,
}

/// Visible fields in on-screen order, each with its label and adapter.
#[derive(Default)]
pub struct InterfaceMap {
    entries: Vec<(String, InterfaceEntry)>,
}

impl InterfaceMap {
    fn push(&mut self, name: String, entry: InterfaceEntry) {
        self.entries.push((name, entry));
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&InterfaceEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut InterfaceEntry)> {
        self.entries.iter_mut().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
pub struct DialogOptions {
    /// Explicit form; derived from the instance's model metadata when absent.
    pub form: Option<FormDefinition>,
    pub exclude: HashSet<String>,
    /// Defaults to the instance's model name.
    pub title: Option<String>,
    pub registry: Option<AdapterRegistry>,
}

impl DialogOptions {
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn form(mut self, form: FormDefinition) -> Self {
        self.form = Some(form);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogPhase {
    Constructed,
    Showing,
    Confirmed,
    Saved,
    Cancelled,
}

pub struct FormDialog {
    title: String,
    instance: ModelHandle,
    storage: StorageHandle,
    registry: AdapterRegistry,
    interface: InterfaceMap,
    focus: FocusRing,
    ok: Button,
    cancel: Button,
    phase: DialogPhase,
}

impl FormDialog {
    pub fn new(
        instance: ModelHandle,
        storage: StorageHandle,
        options: DialogOptions,
    ) -> Result<Self> {
        let model_name = instance.borrow().model_name().to_string();
        let form = match options.form {
            Some(f) => f,
            None => {
                let meta = storage
                    .meta(&model_name)
                    .with_context(|| format!("deriving form for {model_name}"))?;
                FormDefinition::for_model(&*meta)
            }
        };
        let registry = options.registry.unwrap_or_default();
        let interface = build_interface(&form, &options.exclude, &instance, &storage, &registry)?;
        let stops: Vec<usize> = interface
            .iter()
            .map(|(_, e)| e.adapter.focus_stops())
            .collect();
        tracing::debug!(model = %model_name, fields = ?interface.names(), "dialog built");
        Ok(Self {
            title: options.title.unwrap_or(model_name),
            instance,
            storage,
            registry,
            interface,
            focus: FocusRing::new(&stops),
            ok: Button::new("OK"),
            cancel: Button::new("Cancel"),
            phase: DialogPhase::Constructed,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn interface(&self) -> &InterfaceMap {
        &self.interface
    }

    pub fn instance(&self) -> &ModelHandle {
        &self.instance
    }

    pub fn focus(&self) -> FocusStop {
        self.focus.current()
    }

    /// Move focus to the first control of field `name`.
    pub fn focus_field(&mut self, name: &str) -> bool {
        match self.interface.names().iter().position(|n| *n == name) {
            Some(row) => self.focus.focus(FocusStop::Field { row, stop: 0 }),
            None => false,
        }
    }

    /// Pull every adapter's value into the instance, in Interface Map order,
    /// then save the instance once.
    pub fn save_model(&mut self) -> Result<Vec<(String, Value)>> {
        let mut written = Vec::with_capacity(self.interface.len());
        for (name, entry) in self.interface.iter_mut() {
            let v = entry
                .adapter
                .extract_value()
                .with_context(|| format!("reading field '{name}'"))?;
            written.push((name.to_string(), v));
        }
        self.instance.borrow_mut().save()?;
        tracing::info!(dialog = %self.title, fields = written.len(), "dialog saved");
        Ok(written)
    }

    /// Show modally through `host`; on OK extract and save, on Cancel leave
    /// the instance untouched. A dialog runs at most once.
    pub fn run_modal_and_save(&mut self, host: &mut dyn ModalHost) -> Result<DialogPhase> {
        if self.phase != DialogPhase::Constructed {
            bail!("dialog '{}' has already been shown", self.title);
        }
        self.phase = DialogPhase::Showing;
        tracing::debug!(dialog = %self.title, "showing");
        match host.show_modal(self)? {
            ModalOutcome::Ok => {
                self.phase = DialogPhase::Confirmed;
                self.save_model()?;
                self.phase = DialogPhase::Saved;
            }
            ModalOutcome::Cancel => {
                self.phase = DialogPhase::Cancelled;
                tracing::debug!(dialog = %self.title, "cancelled");
            }
        }
        Ok(self.phase)
    }

    /// Run a nested dialog over a new, empty instance of `model`.
    pub fn open_related(&self, model: &str, host: &mut dyn ModalHost) -> Result<DialogPhase> {
        let fresh = self
            .storage
            .create(model)
            .with_context(|| format!("creating {model}"))?;
        let options = DialogOptions {
            registry: Some(self.registry.clone()),
            ..Default::default()
        };
        let mut nested = FormDialog::new(fresh, self.storage.clone(), options)?;
        nested.run_modal_and_save(host)
    }

    pub fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Esc => return vec![Effect::Cancel],
            KeyCode::Tab | KeyCode::Down => {
                self.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus.prev();
                return Vec::new();
            }
            _ => {}
        }
        match self.focus.current() {
            FocusStop::Ok => match key {
                KeyCode::Enter | KeyCode::Char(' ') => vec![Effect::Confirm],
                _ => Vec::new(),
            },
            FocusStop::Cancel => match key {
                KeyCode::Enter | KeyCode::Char(' ') => vec![Effect::Cancel],
                _ => Vec::new(),
            },
            FocusStop::Field { row, stop } => {
                let Some((_, entry)) = self.interface.iter_mut().nth(row) else {
                    return Vec::new();
                };
                let effects = entry.adapter.on_key(stop, key);
                // Enter on a plain control acts as the default button
                if effects.is_empty() && key == KeyCode::Enter {
                    vec![Effect::Confirm]
                } else {
                    effects
                }
            }
        }
    }

    fn label_width(&self) -> u16 {
        self.interface
            .iter()
            .map(|(_, e)| cells(e.label.chars().count()))
            .max()
            .unwrap_or(0)
    }

    /// Outer size of the dialog, borders included.
    pub fn preferred_size(&self) -> (u16, u16) {
        let controls = self
            .interface
            .iter()
            .map(|(_, e)| e.adapter.display().width())
            .max()
            .unwrap_or(0);
        let buttons = self
            .ok
            .width()
            .saturating_add(1)
            .saturating_add(self.cancel.width());
        let body = self
            .label_width()
            .saturating_add(COLUMN_GAP)
            .saturating_add(controls)
            .max(buttons);
        let title = cells(self.title.chars().count()).saturating_add(2);
        let width = body.max(title).saturating_add(FRAME_PAD * 2);
        // rows, blank, separator, buttons
        let height = cells(self.interface.len()).saturating_add(3 + FRAME_PAD);
        (width, height)
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let (w, h) = self.preferred_size();
        let rect = centered_fixed(w, h, area);
        f.render_widget(Clear, rect);
        let block = panel_block(&self.title);
        let inner = block.inner(rect);
        f.render_widget(block, rect);
        let inner = Rect {
            x: inner.x.saturating_add(1),
            width: inner.width.saturating_sub(2),
            ..inner
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let label_w = self.label_width().min(inner.width);
        let control_x = inner
            .x
            .saturating_add(label_w)
            .saturating_add(COLUMN_GAP);
        let control_w = inner.right().saturating_sub(control_x);
        let mut y = inner.y;
        for (row, (_, entry)) in self.interface.iter().enumerate() {
            if y >= inner.bottom() {
                break;
            }
            f.render_widget(
                Paragraph::new(entry.label.as_str()).alignment(Alignment::Right),
                Rect::new(inner.x, y, label_w, 1),
            );
            let focused = self.focus.stop_on_row(row);
            let mut x = control_x;
            for (i, c) in entry.adapter.display().controls().iter().enumerate() {
                let right = control_x.saturating_add(control_w);
                if x >= right {
                    break;
                }
                let cw = c.width().min(right - x);
                c.render(f, Rect::new(x, y, cw, 1), focused == Some(i));
                x = x.saturating_add(cw).saturating_add(1);
            }
            y += 1;
        }

        // Separator and button pair pinned to the bottom
        if inner.height >= 2 {
            let sep_y = inner.bottom() - 2;
            let line = "─".repeat(inner.width as usize);
            f.render_widget(
                Paragraph::new(Span::styled(line, crate::theme::text_muted())),
                Rect::new(inner.x, sep_y, inner.width, 1),
            );
        }
        let btn_y = inner.bottom() - 1;
        let cancel_w = self.cancel.width().min(inner.width);
        let cancel_x = inner.right() - cancel_w;
        self.cancel.render(
            f,
            Rect::new(cancel_x, btn_y, cancel_w, 1),
            self.focus.current() == FocusStop::Cancel,
        );
        let ok_w = self.ok.width();
        if cancel_x >= inner.x.saturating_add(ok_w).saturating_add(1) {
            self.ok.render(
                f,
                Rect::new(cancel_x - ok_w - 1, btn_y, ok_w, 1),
                self.focus.current() == FocusStop::Ok,
            );
        }
    }
}

fn build_interface(
    form: &FormDefinition,
    exclude: &HashSet<String>,
    instance: &ModelHandle,
    storage: &StorageHandle,
    registry: &AdapterRegistry,
) -> Result<InterfaceMap> {
    let mut interface = InterfaceMap::default();
    for field in form.fields() {
        if exclude.contains(&field.name) {
            continue;
        }
        let kind = registry.select(field);
        let adapter = kind
            .build(field, instance.clone(), storage.clone())
            .with_context(|| format!("building {kind:?} adapter for '{}'", field.name))?;
        interface.push(
            field.name.clone(),
            InterfaceEntry {
                label: field.display_label().to_string(),
                adapter,
            },
        );
    }
    Ok(interface)
}
