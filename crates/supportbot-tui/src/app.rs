use supportbot_core::{stream_reply, ChatClient, ChatSession, ReplyEvent};
use tokio::sync::mpsc;
use tracing::debug;

use crate::markdown::char_to_byte_index;
use crate::tui::AppEvent;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,
    pub server_url: String,

    // Input state
    pub cursor: usize, // cursor position in the draft, in chars

    // Chat scroll state (height and line count are refreshed on every render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub total_chat_lines: u16,
    pub follow_tail: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: ChatClient,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(server_url: &str, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            server_url: server_url.to_string(),

            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            total_chat_lines: 0,
            follow_tail: true,

            animation_frame: 0,

            client: ChatClient::new(server_url),
            events,
        }
    }

    pub fn draft(&self) -> &str {
        self.session.draft()
    }

    /// Input is frozen while a reply is streaming
    pub fn input_enabled(&self) -> bool {
        !self.session.is_awaiting()
    }

    pub fn send_label(&self) -> &'static str {
        if self.session.is_awaiting() {
            "Sending..."
        } else {
            "Send"
        }
    }

    /// Submit the draft and stream the reply in the background.
    ///
    /// Does nothing for a blank draft or while a reply is in flight.
    pub fn send_message(&mut self) {
        let Some(history) = self.session.begin_send() else {
            return;
        };
        self.cursor = 0;
        self.animation_frame = 0;
        self.scroll_to_bottom();

        debug!(turns = history.len(), "submitting chat turn");

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            stream_reply(&client, history, |event| {
                // The UI loop is gone once the receiver drops; nothing left to update
                let _ = events.send(AppEvent::Reply(event));
            })
            .await;
        });
    }

    /// Every transcript change brings the newest message back into view
    pub fn apply_reply(&mut self, event: ReplyEvent) {
        self.session.apply(event);
        self.scroll_to_bottom();
    }

    // Draft editing
    pub fn insert_char(&mut self, c: char) {
        if !self.input_enabled() {
            return;
        }
        let mut draft = self.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.session.set_draft(draft);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if !self.input_enabled() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let mut draft = self.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.remove(byte_pos);
        self.session.set_draft(draft);
    }

    pub fn delete(&mut self) {
        if !self.input_enabled() || self.cursor >= self.draft().chars().count() {
            return;
        }
        let mut draft = self.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.remove(byte_pos);
        self.session.set_draft(draft);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft().chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft().chars().count();
    }

    // Chat scrolling
    fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Pin the view to the newest message; the next render settles the offset
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
        self.chat_scroll = self.max_scroll();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
