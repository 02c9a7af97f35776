use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::application::{TurnOrchestrator, UpdateApiKeyUseCase};
use crate::connector::tui::AppEvent;
use crate::domain::{Conversation, DomainError};

const SCROLL_STEP: u16 = 5;

/// Convert a character index to a byte index for UTF-8 safe editing.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a character cursor.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The text left of the cursor.
    pub fn before_cursor(&self) -> &str {
        &self.value[..char_to_byte_index(&self.value, self.cursor)]
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    fn edit(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            _ => return false,
        }
        true
    }
}

/// State of the terminal chat screen.
pub struct ChatApp {
    orchestrator: TurnOrchestrator,
    settings: UpdateApiKeyUseCase,
    input: TextInput,
    /// Open while the API key popup is shown.
    key_input: Option<TextInput>,
    status: Option<String>,
    /// Lines scrolled up from the bottom of the conversation.
    scroll_back: u16,
    spinner_frame: usize,
    should_quit: bool,
}

impl ChatApp {
    pub fn new(orchestrator: TurnOrchestrator, settings: UpdateApiKeyUseCase) -> Self {
        Self {
            orchestrator,
            settings,
            input: TextInput::default(),
            key_input: None,
            status: None,
            scroll_back: 0,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        self.orchestrator.conversation()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.orchestrator.is_awaiting_response()
    }

    pub fn model_name(&self) -> String {
        self.orchestrator.client().model_name().to_string()
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn key_input(&self) -> Option<&TextInput> {
        self.key_input.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn handle_event(&mut self, event: AppEvent, events: &UnboundedSender<AppEvent>) {
        match event {
            AppEvent::Key(key) => self.handle_key(key, events).await,
            AppEvent::Resize(_, _) => {}
            AppEvent::Tick => {
                if self.is_awaiting_response() {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
            AppEvent::Completion(result) => {
                self.orchestrator.resolve(result);
                self.scroll_back = 0;
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent, events: &UnboundedSender<AppEvent>) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.key_input.is_some() {
            self.handle_key_popup(key).await;
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(events),
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.key_input = Some(TextInput::default());
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_back = 0;
            }
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP);
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP);
            }
            _ if key.modifiers.contains(KeyModifiers::CONTROL) => {}
            _ => {
                if self.input.edit(&key) {
                    self.status = None;
                }
            }
        }
    }

    async fn handle_key_popup(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.key_input = None;
            }
            KeyCode::Enter => {
                let raw = self
                    .key_input
                    .take()
                    .map(|input| input.value)
                    .unwrap_or_default();
                self.status = Some(match self.settings.execute(&raw).await {
                    Ok(()) => "API key saved".to_string(),
                    Err(e) => {
                        warn!("Failed to update API key: {}", e);
                        e.to_string()
                    }
                });
            }
            _ => {
                if let Some(input) = self.key_input.as_mut() {
                    input.edit(&key);
                }
            }
        }
    }

    /// Start a turn for the current input and run its completion on a task
    /// that reports back through `events`.
    fn submit(&mut self, events: &UnboundedSender<AppEvent>) {
        match self.orchestrator.begin_turn(self.input.value()) {
            Ok(Some(pending)) => {
                self.input.clear();
                self.status = None;
                self.scroll_back = 0;

                let client = self.orchestrator.client();
                let events = events.clone();
                tokio::spawn(async move {
                    let result = pending.send(client.as_ref()).await;
                    if events.send(AppEvent::Completion(result)).is_err() {
                        warn!("Completion finished after the UI closed");
                    }
                });
            }
            Ok(None) => {}
            Err(DomainError::Busy) => {
                self.status = Some("Still waiting for the previous reply".to_string());
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }
}
