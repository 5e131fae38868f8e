use crate::app::{run_effects, ModalHost, ModalOutcome, ScriptedHost, Step};
use crate::services::config::{env_flag, load_config};
use crate::services::store::{MemoryStore, StorageHandle};
use crate::widgets::form::{DialogOptions, DialogPhase, FormDialog};
use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(200);

/// Modal host on the real terminal: raw mode, alternate screen, blocking
/// key loop. The terminal is restored on drop.
pub struct TerminalHost {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalHost {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl ModalHost for TerminalHost {
    fn show_modal(&mut self, dialog: &mut FormDialog) -> Result<ModalOutcome> {
        loop {
            self.terminal.draw(|f| dialog.draw(f, f.area()))?;
            if !event::poll(TICK)? {
                continue;
            }
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let effects = dialog.on_key(k.code);
                if let Some(outcome) = run_effects(self, dialog, effects)? {
                    // Nested dialogs leave their frame behind
                    self.terminal.clear()?;
                    return Ok(outcome);
                }
            }
        }
    }
}

/// Install the tracing subscriber. Output goes to `MODEL_FORMS_LOG` when set;
/// otherwise only headless runs log, to stderr.
fn init_tracing(headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Ok(path) = std::env::var("MODEL_FORMS_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {path}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let headless = env_flag("MODEL_FORMS_HEADLESS");
    init_tracing(headless)?;

    let cfg = load_config()?;
    let store = MemoryStore::from_config(&cfg).context("seeding store")?;
    let model = cfg
        .open_model()
        .ok_or_else(|| anyhow!("config declares no models"))?
        .to_string();
    let storage: StorageHandle = Rc::new(store.clone());
    let instance = storage.create(&model)?;
    let mut options = DialogOptions::default().exclude(cfg.exclude.iter().cloned());
    options.title = cfg.title.clone();
    let mut dialog = FormDialog::new(instance, storage, options)?;

    let phase = if headless {
        let script = std::env::var("MODEL_FORMS_KEYS").unwrap_or_default();
        let mut host = ScriptedHost::new(Step::parse_script(&script)?)?;
        let phase = dialog.run_modal_and_save(&mut host)?;
        for line in host.last_frame() {
            eprintln!("{line}");
        }
        phase
    } else {
        let mut host = TerminalHost::enter()?;
        dialog.run_modal_and_save(&mut host)?
    };

    match phase {
        DialogPhase::Saved => {
            println!("{}", serde_json::to_string_pretty(&store.dump())?);
        }
        _ => println!("cancelled"),
    }
    Ok(())
}
