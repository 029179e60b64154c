use arsyad_core::{Message, Role};
use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use crate::app::{App, InputMode};

const CREDITS: &str = "Dibuat oleh Arsyad • Support Kiki ❤️";

/// Style `**bold**`, `*italic*` and `` `code` `` spans in one line of a reply.
///
/// Unclosed markers are kept as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let marker = if rest.starts_with("**") {
            Some(("**", Style::default().add_modifier(Modifier::BOLD)))
        } else if rest.starts_with('*') {
            Some(("*", Style::default().add_modifier(Modifier::ITALIC)))
        } else if rest.starts_with('`') {
            Some(("`", Style::default().fg(Color::LightGreen)))
        } else {
            None
        };

        if let Some((open, style)) = marker {
            let body = &rest[open.len()..];
            if let Some(end) = body.find(open).filter(|&end| end > 0) {
                if !plain.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut plain)));
                }
                spans.push(Span::styled(body[..end].to_string(), style));
                rest = &body[end + open.len()..];
                continue;
            }
            plain.push_str(open);
            rest = body;
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            plain.push(c);
        }
        rest = chars.as_str();
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = if app.conversation.last_error().is_some() { 3 } else { 0 };

    // Main layout: header, chat, error banner, input, footer
    let [header_area, chat_area, banner_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(banner_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if banner_height > 0 {
        render_error_banner(app, frame, banner_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let [title_area, status_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(28),
    ])
    .areas(area);

    let initial = app.bot_name.chars().next().unwrap_or('A').to_uppercase().to_string();
    let title = Line::from(vec![
        Span::styled(format!(" {} ", initial), Style::default().bg(Color::Blue).fg(Color::White).bold()),
        Span::styled(format!(" {} ", app.bot_name), Style::default().fg(Color::White).bold()),
        Span::styled(format!("{} ", app.backend_label), Style::default().fg(Color::Gray)),
    ]);

    let status = if app.is_loading() {
        Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Yellow)),
            Span::styled("Mengetik ", Style::default().fg(Color::Gray)),
        ])
    } else {
        Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Green)),
            Span::styled("Online ", Style::default().fg(Color::Gray)),
        ])
    };

    let style = Style::default().bg(Color::DarkGray);
    frame.render_widget(Paragraph::new(title).style(style), title_area);
    frame.render_widget(
        Paragraph::new(status).style(style).alignment(Alignment::Right),
        status_area,
    );
}

fn sender_line(name: &str, msg: Option<&Message>, color: Color, alignment: Alignment) -> Line<'static> {
    let mut spans = vec![Span::styled(
        name.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(msg) = msg {
        let time = msg.timestamp().with_timezone(&Local).format("%H:%M");
        spans.push(Span::styled(format!(" · {}", time), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans).alignment(alignment)
}

/// Chat transcript as display lines, one block per message.
pub fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role() {
            Role::User => {
                lines.push(sender_line("You", Some(msg), Color::Cyan, Alignment::Right));
                for line in msg.text().lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
            }
            Role::Bot => {
                lines.push(sender_line(&app.bot_name, Some(msg), Color::Yellow, Alignment::Left));
                for line in msg.text().lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        if msg.text().is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(sender_line(&app.bot_name, None, Color::Yellow, Alignment::Left));
        // Animated dots: cycles through ".", "..", "..."
        let dots = ".".repeat(usize::from(app.animation_frame) + 1);
        lines.push(Line::from(Span::styled(
            format!("sedang mengetik{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    // Measure with the same word wrapping the widget renders with
    let transcript = Paragraph::new(Text::from(chat_lines(app))).wrap(Wrap { trim: false });
    app.update_chat_viewport(transcript.line_count(inner_width), inner_height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let chat = transcript.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    if app.chat_max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(usize::from(app.chat_max_scroll))
            .position(usize::from(app.chat_scroll));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_error_banner(app: &App, frame: &mut Frame, area: Rect) {
    let Some(error) = app.conversation.last_error() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error (x to dismiss) ");

    let banner = Paragraph::new(error.to_string())
        .style(Style::default().fg(Color::LightRed))
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(banner, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let (title, border_color) = if app.is_loading() {
        (" Menunggu balasan... ", Color::DarkGray)
    } else if editing {
        (" Ketik pesan (Enter to send) ", Color::Yellow)
    } else {
        (" Ketik pesan (i to type) ", Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = usize::from(area.width.saturating_sub(2));
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if app.is_loading() { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    if editing && !app.is_loading() {
        let cursor_x = u16::try_from(cursor_pos - scroll_offset).unwrap_or(0);
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
        InputMode::Normal => &[(" i ", " type "), (" j/k ", " scroll "), (" x ", " dismiss "), (" q ", " quit ")],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let [hints_area, credits_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(u16::try_from(CREDITS.chars().count() + 1).unwrap_or(0)),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), hints_area);
    frame.render_widget(
        Paragraph::new(CREDITS).style(Style::default().fg(Color::DarkGray)).alignment(Alignment::Right),
        credits_area,
    );
}
