use crate::widgets::form::FormDialog;
use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Confirm,
    Cancel,
    /// Run a nested dialog for a new instance of `model`.
    OpenRelated {
        model: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalOutcome {
    Ok,
    Cancel,
}

/// Shows a dialog and blocks until the user dismisses it.
pub trait ModalHost {
    fn show_modal(&mut self, dialog: &mut FormDialog) -> Result<ModalOutcome>;
}

/// Apply effects produced by a key press. Nested dialogs run to completion
/// here, re-entering `host`; returns the outcome once the dialog is dismissed.
pub fn run_effects(
    host: &mut dyn ModalHost,
    dialog: &mut FormDialog,
    effects: Vec<Effect>,
) -> Result<Option<ModalOutcome>> {
    for eff in effects {
        match eff {
            Effect::Confirm => return Ok(Some(ModalOutcome::Ok)),
            Effect::Cancel => return Ok(Some(ModalOutcome::Cancel)),
            Effect::OpenRelated { model } => {
                let phase = dialog.open_related(&model, host)?;
                tracing::debug!(model = %model, ?phase, "nested dialog closed");
            }
        }
    }
    Ok(None)
}

/// One scripted input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Key(KeyCode),
    /// Type each character as a key press.
    Type(String),
}

impl Step {
    /// Parse whitespace-separated tokens: `tab`, `backtab`, `enter`, `esc`,
    /// `space`, `left`, `right`, `up`, `down`, `pgup`, `pgdn`, `bksp`, or
    /// `text:<chars>`.
    pub fn parse_script(s: &str) -> Result<Vec<Step>> {
        s.split_whitespace()
            .map(|tok| {
                if let Some(text) = tok.strip_prefix("text:") {
                    return Ok(Step::Type(text.to_string()));
                }
                let key = match tok.to_ascii_lowercase().as_str() {
                    "tab" => KeyCode::Tab,
                    "backtab" => KeyCode::BackTab,
                    "enter" => KeyCode::Enter,
                    "esc" => KeyCode::Esc,
                    "space" => KeyCode::Char(' '),
                    "left" => KeyCode::Left,
                    "right" => KeyCode::Right,
                    "up" => KeyCode::Up,
                    "down" => KeyCode::Down,
                    "pgup" => KeyCode::PageUp,
                    "pgdn" => KeyCode::PageDown,
                    "bksp" => KeyCode::Backspace,
                    other => return Err(anyhow!("unknown key token: '{other}'")),
                };
                Ok(Step::Key(key))
            })
            .collect()
    }
}

/// Drives dialogs from a fixed script, drawing each frame into an
/// off-screen buffer. When the script runs out the open dialog is cancelled.
pub struct ScriptedHost {
    script: VecDeque<Step>,
    terminal: Terminal<TestBackend>,
    depth: usize,
    max_depth: usize,
    shown: usize,
    last_frame: Vec<String>,
}

impl ScriptedHost {
    pub fn new(script: Vec<Step>) -> Result<Self> {
        Ok(Self {
            script: script.into(),
            terminal: Terminal::new(TestBackend::new(80, 24))?,
            depth: 0,
            max_depth: 0,
            shown: 0,
            last_frame: Vec::new(),
        })
    }

    pub fn keys(keys: &[KeyCode]) -> Result<Self> {
        Self::new(keys.iter().map(|k| Step::Key(*k)).collect())
    }

    /// Dialogs shown so far, nested ones included.
    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Text of the most recently drawn frame, one string per row.
    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }

    fn draw(&mut self, dialog: &FormDialog) -> Result<()> {
        self.terminal.draw(|f| dialog.draw(f, f.area()))?;
        let buf = self.terminal.backend().buffer();
        self.last_frame = (0..buf.area.height)
            .map(|y| {
                let mut line = String::new();
                for x in 0..buf.area.width {
                    line.push_str(buf[(x, y)].symbol());
                }
                line.trim_end().to_string()
            })
            .collect();
        Ok(())
    }

    fn drive(&mut self, dialog: &mut FormDialog) -> Result<ModalOutcome> {
        loop {
            self.draw(dialog)?;
            let keys: Vec<KeyCode> = match self.script.pop_front() {
                None => return Ok(ModalOutcome::Cancel),
                Some(Step::Key(k)) => vec![k],
                Some(Step::Type(s)) => s.chars().map(KeyCode::Char).collect(),
            };
            for key in keys {
                let effects = dialog.on_key(key);
                if let Some(outcome) = run_effects(self, dialog, effects)? {
                    return Ok(outcome);
                }
            }
        }
    }
}

impl ModalHost for ScriptedHost {
    fn show_modal(&mut self, dialog: &mut FormDialog) -> Result<ModalOutcome> {
        self.shown += 1;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        let outcome = self.drive(dialog);
        self.depth -= 1;
        outcome
    }
}

#[cfg(test)]
mod tests;
