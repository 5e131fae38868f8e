pub mod adapters;
pub mod chrome;
pub mod controls;
pub mod form;

use crate::app::Effect;
use crate::model::{ModelError, Value};
use crossterm::event::KeyCode;
use ratatui::prelude::*;

/// Cell count for `n` characters, clamped to the terminal coordinate range.
pub(crate) fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// A single input control the dialog can lay out and draw.
pub trait Control {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool);
    /// Preferred width in cells.
    fn width(&self) -> u16;
}

/// What an adapter puts in the control column of its row.
pub enum Display<'a> {
    Single(&'a dyn Control),
    Row(Vec<&'a dyn Control>),
}

impl<'a> Display<'a> {
    pub fn controls(&self) -> Vec<&'a dyn Control> {
        match self {
            Display::Single(c) => vec![*c],
            Display::Row(cs) => cs.clone(),
        }
    }

    /// Total width with one cell between controls.
    pub fn width(&self) -> u16 {
        let cs = self.controls();
        let gaps = cells(cs.len().saturating_sub(1));
        cs.iter().fold(gaps, |acc, c| acc.saturating_add(c.width()))
    }
}

/// Binds one model attribute to one control (or a row of controls).
pub trait Adapter {
    fn field(&self) -> &str;
    /// Populate the control(s) from the instance's current value.
    fn initialize_display(&mut self) -> Result<(), ModelError>;
    fn display(&self) -> Display<'_>;
    /// Write the control's value into the instance and return it.
    fn extract_value(&mut self) -> Result<Value, ModelError>;
    /// Handle a key for control `stop` of this adapter's display.
    fn on_key(&mut self, stop: usize, key: KeyCode) -> Vec<Effect> {
        let _ = (stop, key);
        Vec::new()
    }
    fn focus_stops(&self) -> usize {
        1
    }
}
