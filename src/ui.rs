use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, DialogField, Sender};
use crate::theme;

/// Parse a line of AI output, converting `**bold**`, `*italic*`,
/// `` `code` `` and `- ` list markers into styled spans.
fn parse_markdown_line(text: &str) -> Line<'static> {
    // List markers keep their indentation, the marker becomes a bullet
    let trimmed = text.trim_start();
    let indent = &text[..text.len() - trimmed.len()];
    if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
        let mut spans = vec![
            Span::raw(indent.to_string()),
            Span::styled("• ", Style::default().fg(theme::AI_ACCENT)),
        ];
        spans.extend(parse_inline(rest));
        return Line::from(spans);
    }

    let spans = parse_inline(text);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn parse_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Bold: scan for the closing **
            chars.next();

            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '*' {
            // Italic: scan for the closing single *
            let mut italic_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' {
                    found_close = true;
                    break;
                }
                italic_text.push(c);
            }

            if found_close && !italic_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    italic_text,
                    Style::default().add_modifier(Modifier::ITALIC),
                ));
            } else {
                current_text.push('*');
                current_text.push_str(&italic_text);
            }
        } else if c == '`' {
            // Inline code span
            let mut code_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '`' {
                    found_close = true;
                    break;
                }
                code_text.push(c);
            }

            if found_close && !code_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    code_text,
                    Style::default().fg(Color::LightYellow).bg(Color::DarkGray),
                ));
            } else {
                current_text.push('`');
                current_text.push_str(&code_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    spans
}

/// Project the message log (and the busy indicator) into display lines.
/// User bubbles are right-aligned plain text; AI bubbles are left-aligned
/// and markdown-formatted.
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in &app.messages {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled("Anda:", theme::user_label()))
                    .alignment(Alignment::Right));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
                lines.push(Line::default());
            }
            Sender::Ai => {
                lines.push(Line::from(Span::styled("AI:", theme::ai_label())));
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.is_pending() {
        lines.push(Line::from(Span::styled("AI:", theme::ai_label())));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Sedang berpikir{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_repo_dialog {
        render_repo_dialog(app, frame, area);
    }
    // The alert draws over everything, including the dialog
    if let Some(message) = app.alert.clone() {
        render_alert(&message, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " AI Chatbot dengan Analisis GitHub ",
            Style::default().fg(Color::White).bg(theme::PRIMARY).bold(),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::DIVIDER));

    // Store chat area dimensions for scroll calculations (inner size minus
    // borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_text = if app.messages.is_empty() && !app.is_pending() {
        Text::from(Span::styled(
            "Kirim pesan untuk memulai percakapan...",
            theme::dim(),
        ))
    } else {
        Text::from(chat_lines(app))
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Visible slice of an input with horizontal scrolling that keeps the
/// cursor in view. Returns the slice and the cursor column inside it.
fn visible_input_slice(text: &str, cursor: usize, inner_width: usize) -> (String, u16) {
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible: String = text.chars().skip(scroll_offset).take(inner_width).collect();
    let cursor_x = (cursor - scroll_offset).min(inner_width) as u16;
    (visible, cursor_x)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.is_pending();

    let border_color = if pending || app.show_repo_dialog {
        theme::DIVIDER
    } else {
        theme::ACTIVE_BORDER
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Pesan ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input_slice(&app.input, app.input_cursor, inner_width);

    let input = if app.input.is_empty() {
        let placeholder = if pending {
            "Menunggu balasan..."
        } else {
            "Ketik pesan Anda..."
        };
        Paragraph::new(placeholder).style(theme::dim()).block(block)
    } else {
        Paragraph::new(visible_text)
            .style(Style::default().fg(theme::USER_ACCENT))
            .block(block)
    };

    frame.render_widget(input, area);

    // The cursor only shows where typing would land
    if !pending && !app.show_repo_dialog && app.alert.is_none() {
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_repo_dialog {
        vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" ganti kolom ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" analisis ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" batal ", label_style),
        ]
    } else if app.is_pending() {
        vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" gulir ", label_style),
            Span::styled(" menunggu balasan... ", Style::default().fg(Color::DarkGray)),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" kirim ", label_style),
            Span::styled(" Ctrl+G ", key_style),
            Span::styled(" analisis repo ", label_style),
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" gulir ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" keluar ", label_style),
        ]
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_repo_dialog(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 62.min(area.width.saturating_sub(4));
    let popup_height = 10.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::PRIMARY))
        .title(" Analisis Repositori GitHub ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [url_area, question_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    render_dialog_field(
        frame,
        url_area,
        " URL Repositori GitHub ",
        "misal: https://github.com/owner/repo",
        &app.repo_url_input,
        app.repo_url_cursor,
        app.dialog_field == DialogField::RepoUrl,
        app.alert.is_none(),
    );
    render_dialog_field(
        frame,
        question_area,
        " Pertanyaan Anda ",
        "misal: Apa tujuan proyek ini dan teknologi utamanya?",
        &app.question_input,
        app.question_cursor,
        app.dialog_field == DialogField::Question,
        app.alert.is_none(),
    );

    let hint = Paragraph::new("Enter: analisis   Tab: ganti kolom   Esc: batal")
        .style(theme::dim())
        .alignment(Alignment::Center);
    frame.render_widget(hint, hint_area);
}

#[allow(clippy::too_many_arguments)]
fn render_dialog_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    placeholder: &str,
    text: &str,
    cursor: usize,
    focused: bool,
    show_cursor: bool,
) {
    let border_color = if focused { theme::ACTIVE_BORDER } else { theme::DIVIDER };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input_slice(text, cursor, inner_width);

    let field = if text.is_empty() {
        Paragraph::new(placeholder.to_string()).style(theme::dim()).block(block)
    } else {
        Paragraph::new(visible_text).block(block)
    };

    frame.render_widget(field, area);

    if focused && show_cursor {
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACTIVE_BORDER))
        .title(" Perhatian ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [text_area, hint_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let text = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    frame.render_widget(text, text_area);

    let hint = Paragraph::new("tekan tombol apa saja")
        .style(theme::dim())
        .alignment(Alignment::Center);
    frame.render_widget(hint, hint_area);
}
