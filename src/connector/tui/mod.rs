//! Terminal front end: event plumbing, state, and rendering.

mod app;
mod highlight;
mod render;

use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::info;

use crate::application::{TurnOrchestrator, UpdateApiKeyUseCase};
use crate::domain::DomainError;

pub use app::{ChatApp, TextInput};
pub use highlight::highlight_code;
pub use render::{assistant_lines, conversation_lines, render, role_style, wrapped_height};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

const TICK_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    /// Outcome of a completion call started by the UI.
    Completion(Result<String, DomainError>),
}

/// Merges terminal input, a spinner tick, and completion results into one
/// channel consumed by the UI loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only key presses, not releases
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(AppEvent::Key(key))
                    }
                    Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                    _ => None,
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;

    let terminal = or_else_cleanup(
        execute!(io::stderr(), EnterAlternateScreen)
            .and_then(|_| Terminal::new(CrosstermBackend::new(io::stderr()))),
        || {
            let _ = restore();
        },
    )?;

    Ok(terminal)
}

/// Run `cleanup` when `result` is an error, then pass the result through.
fn or_else_cleanup<T>(result: io::Result<T>, cleanup: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        cleanup();
    }
    result
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

/// Run the chat screen until the user quits.
pub async fn run(orchestrator: TurnOrchestrator, settings: UpdateApiKeyUseCase) -> Result<()> {
    install_panic_hook();
    let mut terminal = init()?;

    let mut events = EventHandler::new();
    let sender = events.sender();
    let mut app = ChatApp::new(orchestrator, settings);
    info!("Chat session started");

    let result = async {
        while !app.should_quit() {
            terminal.draw(|frame| render(&app, frame))?;
            let Some(event) = events.next().await else {
                break;
            };
            app.handle_event(event, &sender).await;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    restore()?;
    info!(
        "Chat session ended after {} turns",
        app.conversation().len()
    );
    result
}
