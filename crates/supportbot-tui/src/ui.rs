use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use supportbot_core::{ChatMessage, ChatRole};
use crate::app::App;
use crate::markdown::{render_markdown, wrap_line};

const SUPPORT_FG: Color = Color::Rgb(0x23, 0x19, 0x42);
const SUPPORT_BG: Color = Color::Rgb(0xFA, 0xFA, 0xFF);
const USER_FG: Color = Color::Rgb(0xFA, 0xFA, 0xFF);
const USER_BG: Color = Color::Rgb(0x5E, 0x54, 0x8E);

/// Narrowest bubble we lay out, even in a tiny terminal
const MIN_BUBBLE_WIDTH: usize = 12;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input row, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Headstarter Support ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.server_url.as_str(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let inner = block.inner(area);
    let inner_width = inner.width as usize;
    // Bubbles take at most three quarters of the row
    let bubble_width = (inner_width * 3 / 4).max(MIN_BUBBLE_WIDTH).min(inner_width);

    let awaiting = app.session.is_awaiting();
    let transcript = app.session.transcript();
    let mut lines: Vec<Line<'static>> = Vec::new();

    for (idx, msg) in transcript.iter().enumerate() {
        if msg.role == ChatRole::System {
            continue;
        }
        let pending = awaiting && idx + 1 == transcript.len() && msg.content.is_empty();
        lines.extend(message_lines(msg, pending, app.animation_frame, bubble_width));
        lines.push(Line::default());
    }

    // Store chat area dimensions for scroll calculations
    app.chat_height = inner.height;
    app.total_chat_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_scroll = app.total_chat_lines.saturating_sub(app.chat_height);
    if app.follow_tail || app.chat_scroll > max_scroll {
        app.chat_scroll = max_scroll;
    }

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Label plus padded bubble for one message; support on the left, user on the right
fn message_lines(
    msg: &ChatMessage,
    pending: bool,
    animation_frame: u8,
    bubble_width: usize,
) -> Vec<Line<'static>> {
    let (label, style, alignment) = match msg.role {
        ChatRole::User => (
            "You",
            Style::default().fg(USER_FG).bg(USER_BG),
            Alignment::Right,
        ),
        _ => (
            "Support",
            Style::default().fg(SUPPORT_FG).bg(SUPPORT_BG),
            Alignment::Left,
        ),
    };

    let text_width = bubble_width.saturating_sub(2).max(1);
    let body: Vec<Line<'static>> = if pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        vec![Line::from(Span::styled(
            format!("Typing{:<3}", dots),
            style.add_modifier(Modifier::ITALIC),
        ))]
    } else {
        render_markdown(&msg.content, style)
            .into_iter()
            .flat_map(|line| wrap_line(line, text_width))
            .collect()
    };

    let content_width = body.iter().map(|l| l.width()).max().unwrap_or(0);

    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    ))
    .alignment(alignment)];

    for line in body {
        let fill = content_width.saturating_sub(line.width());
        let mut spans = vec![Span::styled(" ", style)];
        spans.extend(line.spans);
        spans.push(Span::styled(" ".repeat(fill + 1), style));
        lines.push(Line::from(spans).alignment(alignment));
    }

    lines
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(14),
    ])
    .areas(area);

    let enabled = app.input_enabled();
    let input_border_color = if enabled { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Newlines are kept in the draft but shown inline as one glyph
    let visible_text: String = app
        .draft()
        .chars()
        .map(|c| if c == '\n' { '↵' } else { c })
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = if app.draft().is_empty() && enabled {
        Paragraph::new(Span::styled(
            "Type a message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let text_style = if enabled {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Paragraph::new(visible_text).style(text_style)
    };

    frame.render_widget(input.block(input_block), input_area);

    if enabled {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    let can_send = enabled && !app.draft().trim().is_empty();
    let button_style = if can_send {
        Style::default().fg(Color::White).bg(USER_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let button = Paragraph::new(app.send_label())
        .alignment(Alignment::Center)
        .style(button_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(input_border_color)),
        );

    frame.render_widget(button, button_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_awaiting() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Shift/Alt+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
    ];
    if !app.follow_tail {
        hints.extend(vec![
            Span::styled(" Ctrl+End ", key_style),
            Span::styled(" latest ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
