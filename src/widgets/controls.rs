//! Input controls drawn with ratatui: text entry, checkbox, date picker,
//! choice list and push button.

use crate::widgets::{cells, Control};
use chrono::{Months, NaiveDate, TimeDelta};
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tui_textarea::{CursorMove, Input, Key, TextArea};

const ENTRY_MIN_WIDTH: u16 = 24;

fn control_style(focused: bool) -> Style {
    if focused {
        crate::theme::text_editing_bold()
    } else {
        crate::theme::text_active_bold()
    }
}

/// Single-line text entry.
pub struct TextEntry {
    ta: TextArea<'static>,
}

impl Default for TextEntry {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextEntry {
    pub fn new(value: &str) -> Self {
        let mut entry = Self {
            ta: TextArea::default(),
        };
        entry.set_value(value);
        entry
    }

    pub fn set_value(&mut self, value: &str) {
        // Single line: embedded newlines are folded into spaces
        let line = value.replace(['\r', '\n'], " ");
        let mut ta = TextArea::new(vec![line]);
        ta.set_cursor_line_style(Style::default());
        ta.move_cursor(CursorMove::End);
        self.ta = ta;
    }

    pub fn value(&self) -> String {
        self.ta.lines().join("")
    }

    /// Route an editing key; returns false when the key is not for us.
    pub fn on_key(&mut self, key: KeyCode) -> bool {
        let key = match key {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            _ => return false,
        };
        self.ta.input(Input {
            key,
            ..Input::default()
        });
        true
    }
}

impl Control for TextEntry {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        if focused {
            f.render_widget(&self.ta, area);
        } else {
            f.render_widget(Paragraph::new(self.value()), area);
        }
    }

    fn width(&self) -> u16 {
        cells(self.value().chars().count())
            .saturating_add(1)
            .max(ENTRY_MIN_WIDTH)
    }
}

#[derive(Default)]
pub struct CheckBox {
    checked: bool,
}

impl CheckBox {
    pub fn new(checked: bool) -> Self {
        Self { checked }
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub fn toggle(&mut self) {
        self.checked = !self.checked;
    }
}

impl Control for CheckBox {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let mark = if self.checked { "[x]" } else { "[ ]" };
        f.render_widget(
            Paragraph::new(Span::styled(mark, control_style(focused))),
            area,
        );
    }

    fn width(&self) -> u16 {
        3
    }
}

/// Calendar date stepped with the arrow and page keys.
pub struct DatePicker {
    date: NaiveDate,
}

impl DatePicker {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn shift_days(&mut self, days: i64) {
        if let Some(d) = self.date.checked_add_signed(TimeDelta::days(days)) {
            self.date = d;
        }
    }

    pub fn shift_months(&mut self, months: i32) {
        let step = Months::new(months.unsigned_abs());
        let next = if months >= 0 {
            self.date.checked_add_months(step)
        } else {
            self.date.checked_sub_months(step)
        };
        if let Some(d) = next {
            self.date = d;
        }
    }

    /// ISO calendar date, `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl Control for DatePicker {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let text = format!("◂ {} ▸", self.iso());
        f.render_widget(
            Paragraph::new(Span::styled(text, control_style(focused))),
            area,
        );
    }

    fn width(&self) -> u16 {
        14
    }
}

/// Drop-down style choice; each option carries client data.
pub struct Choice<T> {
    options: Vec<(String, T)>,
    selected: Option<usize>,
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            selected: None,
        }
    }
}

impl<T> Choice<T> {
    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    pub fn append(&mut self, label: String, data: T) {
        self.options.push((label, data));
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_selection(&mut self, idx: Option<usize>) {
        self.selected = idx.filter(|i| *i < self.options.len());
    }

    pub fn string(&self, idx: usize) -> Option<&str> {
        self.options.get(idx).map(|(s, _)| s.as_str())
    }

    pub fn client_data(&self, idx: usize) -> Option<&T> {
        self.options.get(idx).map(|(_, d)| d)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn select_next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % self.options.len(),
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let n = self.options.len();
        self.selected = Some(match self.selected {
            Some(i) => (i + n - 1) % n,
            None => n - 1,
        });
    }
}

impl<T> Control for Choice<T> {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let label = self
            .selected
            .and_then(|i| self.string(i))
            .unwrap_or("(none)");
        let text = format!("◂ {label} ▸");
        f.render_widget(
            Paragraph::new(Span::styled(text, control_style(focused))),
            area,
        );
    }

    fn width(&self) -> u16 {
        let widest = self
            .options
            .iter()
            .map(|(s, _)| s.chars().count())
            .max()
            .unwrap_or(0)
            .max("(none)".len());
        cells(widest).saturating_add(4)
    }
}

pub struct Button {
    label: String,
}

impl Button {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Control for Button {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("[ {} ]", self.label),
                crate::theme::button_style(focused),
            )),
            area,
        );
    }

    fn width(&self) -> u16 {
        cells(self.label.chars().count()).saturating_add(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_entry_edits_at_end() {
        let mut e = TextEntry::new("Ad");
        assert!(e.on_key(KeyCode::Char('a')));
        assert_eq!(e.value(), "Ada");
        assert!(e.on_key(KeyCode::Backspace));
        assert!(e.on_key(KeyCode::Backspace));
        assert_eq!(e.value(), "A");
        assert!(!e.on_key(KeyCode::Tab));
        e.set_value("two\nlines");
        assert_eq!(e.value(), "two lines");
    }

    #[test]
    fn date_picker_steps_days_and_months() {
        let mut d = DatePicker::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        d.shift_days(1);
        assert_eq!(d.iso(), "2024-02-01");
        d.shift_months(-1);
        assert_eq!(d.iso(), "2024-01-01");
        d.shift_months(2);
        assert_eq!(d.iso(), "2024-03-01");
    }

    #[test]
    fn choice_cycles_and_keeps_client_data() {
        let mut c: Choice<u32> = Choice::default();
        c.select_next();
        assert_eq!(c.selection(), None);
        c.append("a".into(), 1);
        c.append("b".into(), 2);
        c.select_prev();
        assert_eq!(c.selection(), Some(1));
        c.select_next();
        assert_eq!(c.selection(), Some(0));
        assert_eq!(c.client_data(0), Some(&1));
        assert_eq!(c.string(1), Some("b"));
        c.set_selection(Some(5));
        assert_eq!(c.selection(), None);
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn widths_saturate_on_oversized_values() {
        let e = TextEntry::new(&"x".repeat(70_000));
        assert_eq!(e.width(), u16::MAX);
        let mut c: Choice<()> = Choice::default();
        c.append("y".repeat(70_000), ());
        assert_eq!(c.width(), u16::MAX);
        let row = crate::widgets::Display::Row(vec![&e as &dyn Control, &c]);
        assert_eq!(row.width(), u16::MAX);
        assert_eq!(Button::new("OK").width(), 6);
    }
}
