use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Reply(reply) => app.apply_reply(reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any state
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        _ => {}
    }

    match key.code {
        // Shift+Enter needs keyboard enhancement; Alt+Enter works everywhere
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_newline();
        }
        KeyCode::Enter => app.send_message(),

        // Chat scrolling
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),
        KeyCode::Char('u') if ctrl => app.scroll_up(app.half_page()),
        KeyCode::Char('d') if ctrl => app.scroll_down(app.half_page()),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::End if ctrl => app.scroll_to_bottom(),

        // Draft editing
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supportbot_core::prompt::{FALLBACK_REPLY, GREETING};
    use supportbot_core::{ChatMessage, ReplyEvent};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // Discard port, nothing listens there
        (App::new("http://127.0.0.1:9", tx), rx)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(app.should_quit);
    }

    #[test]
    fn test_modified_enter_inserts_newline() {
        let (mut app, _rx) = test_app();
        type_text(&mut app, "line one");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "two");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::ALT));

        assert_eq!(app.draft(), "line one\ntwo\n");
        assert!(app.input_enabled());
        assert_eq!(app.session.transcript().len(), 1);
    }

    #[test]
    fn test_control_chars_are_not_typed() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::Char('u'), KeyModifiers::CONTROL));
        handle_event(&mut app, key(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(app.draft(), "");
    }

    #[test]
    fn test_mouse_wheel_scrolls_chat() {
        let (mut app, _rx) = test_app();
        app.chat_height = 5;
        app.total_chat_lines = 20;
        app.scroll_to_bottom();

        let wheel = |kind| {
            AppEvent::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };
        handle_event(&mut app, wheel(MouseEventKind::ScrollUp));
        assert_eq!(app.chat_scroll, 15 - WHEEL_LINES);
        assert!(!app.follow_tail);

        handle_event(&mut app, wheel(MouseEventKind::ScrollDown));
        assert_eq!(app.chat_scroll, 15);
        assert!(app.follow_tail);
    }

    #[test]
    fn test_reply_events_update_transcript() {
        let (mut app, _rx) = test_app();
        app.session.set_draft("hello");
        app.session.begin_send();

        handle_event(&mut app, AppEvent::Reply(ReplyEvent::Chunk("Hi ".into())));
        handle_event(&mut app, AppEvent::Reply(ReplyEvent::Chunk("there".into())));
        handle_event(&mut app, AppEvent::Reply(ReplyEvent::Finished));

        assert_eq!(
            app.session.transcript().last(),
            Some(&ChatMessage::assistant("Hi there"))
        );
        assert!(app.input_enabled());
    }

    #[tokio::test]
    async fn test_enter_against_dead_relay_ends_with_apology() {
        let (mut app, mut rx) = test_app();
        type_text(&mut app, "help");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.send_label(), "Sending...");

        // Enter again while awaiting does nothing
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE));

        while let Some(event) = rx.recv().await {
            let done = matches!(
                event,
                AppEvent::Reply(ReplyEvent::Finished) | AppEvent::Reply(ReplyEvent::Failed(_))
            );
            handle_event(&mut app, event);
            if done {
                break;
            }
        }

        assert_eq!(
            app.session.transcript(),
            &[
                ChatMessage::assistant(GREETING),
                ChatMessage::user("help"),
                ChatMessage::assistant(FALLBACK_REPLY),
            ]
        );
        assert_eq!(app.send_label(), "Send");
    }
}
