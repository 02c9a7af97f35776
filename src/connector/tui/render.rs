use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::connector::tui::app::{ChatApp, TextInput};
use crate::connector::tui::highlight::highlight_code;
use crate::domain::{split_segments, Conversation, Role, Segment};

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
        Role::System => Style::default().fg(Color::Yellow),
    }
}

fn frame_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn plain_lines(text: &str) -> impl Iterator<Item = Line<'static>> + '_ {
    text.lines().map(|line| Line::raw(line.to_string()))
}

/// Lines for one assistant reply: plain text as-is, fenced blocks framed and
/// syntax-coloured by their language tag.
pub fn assistant_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for segment in split_segments(content) {
        match segment {
            Segment::Plain(text) => lines.extend(plain_lines(text.trim_matches('\n'))),
            Segment::Code(span) => {
                let label = span.language().unwrap_or("code").to_string();
                lines.push(Line::from(Span::styled(format!("┌─ {label}"), frame_style())));
                for code_line in highlight_code(&span.code, &span.language) {
                    let mut spans = vec![Span::styled("│ ", frame_style())];
                    spans.extend(code_line.spans);
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(Span::styled("└─", frame_style())));
            }
        }
    }

    lines
}

/// Every turn as a role header followed by its content and a blank line.
pub fn conversation_lines(conversation: &Conversation) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for turn in conversation {
        lines.push(Line::from(Span::styled(
            format!("{}:", turn.role().display_name()),
            role_style(turn.role()).add_modifier(Modifier::BOLD),
        )));
        match turn.role() {
            Role::Assistant => lines.extend(assistant_lines(turn.content())),
            Role::User | Role::System => lines.extend(plain_lines(turn.content())),
        }
        lines.push(Line::default());
    }

    lines
}

/// Rows `lines` occupy once word-wrapped at `width` columns, counted the way
/// the conversation pane wraps them.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    if width == 0 {
        return lines.len().min(u16::MAX as usize) as u16;
    }
    let rows = Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width);
    rows.min(u16::MAX as usize) as u16
}

/// Horizontal scroll and cursor column for a one-line field `width` columns
/// wide. Both are display columns, so wide characters count double.
fn input_view(before_cursor: &str, width: u16) -> (u16, u16) {
    let cursor = Line::raw(before_cursor).width().min(u16::MAX as usize) as u16;
    let scroll = cursor.saturating_sub(width.saturating_sub(1));
    (scroll, cursor - scroll)
}

pub fn render(app: &ChatApp, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_conversation(app, frame, body_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if let Some(key_input) = app.key_input() {
        render_key_popup(key_input, frame, area);
    }
}

fn render_header(app: &ChatApp, frame: &mut Frame, area: Rect) {
    let state = if app.is_awaiting_response() {
        Span::styled(" waiting ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" idle ", Style::default().fg(Color::DarkGray))
    };

    let title = Line::from(vec![
        Span::styled(" ChattyIO ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.model_name(), Style::default().fg(Color::White)),
        state,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_conversation(app: &ChatApp, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(frame_style())
        .title(" Conversation ");
    let inner = block.inner(area);

    let mut lines = conversation_lines(app.conversation());
    if app.is_awaiting_response() {
        let frame_idx = app.spinner_frame() % SPINNER.len();
        lines.push(Line::from(Span::styled(
            format!("{} Waiting for response...", SPINNER[frame_idx]),
            Style::default().fg(Color::Yellow),
        )));
    }

    let total = wrapped_height(&lines, inner.width);
    let max_scroll = total.saturating_sub(inner.height);
    let scroll = max_scroll.saturating_sub(app.scroll_back());

    frame.render_widget(block, area);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn render_input(app: &ChatApp, frame: &mut Frame, area: Rect) {
    let border = if app.is_awaiting_response() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" Message ");
    let inner = block.inner(area);

    let (scroll, column) = input_view(app.input().before_cursor(), inner.width);

    let paragraph = Paragraph::new(app.input().value())
        .block(block)
        .scroll((0, scroll));
    frame.render_widget(paragraph, area);

    if app.key_input().is_none() && inner.width > 0 {
        frame.set_cursor_position((inner.x + column, inner.y));
    }
}

fn render_footer(app: &ChatApp, frame: &mut Frame, area: Rect) {
    if let Some(status) = app.status() {
        let line = Line::from(Span::styled(
            format!(" {status} "),
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = Line::from(vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl-K ", key_style),
        Span::styled(" API key ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_key_popup(key_input: &TextInput, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, area.width.min(60), 4);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" API Key ");
    let inner = block.inner(popup);

    // One mask column per character, so the scroll is a character count.
    let (scroll, column) = input_view(&"•".repeat(key_input.cursor()), inner.width);
    let masked = "•".repeat(
        key_input
            .value()
            .chars()
            .count()
            .saturating_sub(scroll as usize),
    );
    let body = vec![
        Line::raw(masked),
        Line::from(Span::styled(
            "Enter save · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(body).block(block), popup);

    if inner.width > 0 {
        frame.set_cursor_position((inner.x + column, inner.y));
    }
}
