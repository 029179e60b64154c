use std::sync::Arc;

use arsyad_core::{Config, Conversation, PendingSend, ResponseError, ResponseSource};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input box
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Conversation
    pub conversation: Conversation,
    pub pending: Option<PendingSend>,
    pub bot_name: String,
    pub backend_label: String,
    backend: Arc<dyn ResponseSource>,
    events: mpsc::UnboundedSender<AppEvent>,

    // Chat scroll state (updated during render)
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub follow_tail: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for typing dots
}

impl App {
    pub fn new(
        config: &Config,
        backend: Arc<dyn ResponseSource>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            input_cursor: 0,

            conversation: Conversation::with_fallback(
                config.welcome_message(),
                config.fallback_message(),
            ),
            pending: None,
            bot_name: config.bot_name().to_string(),
            backend_label: backend.describe(),
            backend,
            events,

            chat_scroll: 0,
            chat_max_scroll: 0,
            follow_tail: true,
            chat_area: None,

            animation_frame: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    /// Send the input box contents. Returns false when nothing was sent
    /// (blank input or a reply is still pending).
    pub fn submit_input(&mut self) -> bool {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return false;
        }

        let pending = match self.conversation.begin_send(text) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!("input not sent: {e}");
                return false;
            }
        };

        // Spawn background task to query the backend
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let prompt = pending.prompt().to_string();
        tokio::spawn(async move {
            let outcome = backend.get_response(&prompt).await;
            if events.send(AppEvent::Reply(outcome)).is_err() {
                tracing::debug!("reply dropped, event loop has shut down");
            }
        });

        self.pending = Some(pending);
        self.input.clear();
        self.input_cursor = 0;
        self.animation_frame = 0;
        self.scroll_to_bottom();
        true
    }

    /// Apply the outcome of the in-flight send.
    pub fn apply_reply(&mut self, outcome: Result<String, ResponseError>) {
        match self.pending.take() {
            Some(pending) => {
                self.conversation.finish_send(pending, outcome);
                self.scroll_to_bottom();
            }
            None => tracing::warn!("reply arrived with no send in flight, ignoring"),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.chat_scroll >= self.chat_max_scroll {
            self.follow_tail = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.follow_tail = false;
        self.chat_scroll = 0;
    }

    /// Keep the newest message (or the typing indicator) in view.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
        self.chat_scroll = self.chat_max_scroll;
    }

    /// Recompute scroll bounds from the wrapped transcript height and the
    /// viewport height, both as measured by the renderer.
    pub fn update_chat_viewport(&mut self, total_lines: usize, height: u16) {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.chat_max_scroll = total.saturating_sub(height);
        if self.follow_tail || self.chat_scroll > self.chat_max_scroll {
            self.chat_scroll = self.chat_max_scroll;
        }
    }
}
