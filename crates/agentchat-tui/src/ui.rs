use agentchat_core::{EndpointMode, Role};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
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
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let error_height = if app.conversation.error().is_some() { 3 } else { 0 };
    let suggestions_height = if app.conversation.suggestions_visible() && !app.checking_auth {
        app.conversation.suggestions().len() as u16 + 2
    } else {
        0
    };

    let [header_area, error_area, chat_area, suggestions_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(error_height),
            Constraint::Min(0),
            Constraint::Length(suggestions_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    if error_height > 0 {
        render_error(app, frame, error_area);
    }
    render_chat(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(app, frame, suggestions_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_sign_in {
        render_sign_in(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.mode {
        EndpointMode::Local => " Agent Chat (Local Dev) ",
        EndpointMode::Production => " Agent Chat ",
    };

    let [left, right] = Layout::horizontal([Constraint::Min(0), Constraint::Length(40)]).areas(area);

    let title_line = Line::from(vec![
        Span::styled(title, Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(title_line).style(Style::default().bg(Color::DarkGray)),
        left,
    );

    let user = Paragraph::new(format!("{} ", app.user_label()))
        .alignment(ratatui::layout::Alignment::Right)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(user, right);
}

fn render_error(app: &App, frame: &mut Frame, area: Rect) {
    let message = app.conversation.error().unwrap_or_default();
    let banner = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error (x to dismiss) "),
        );
    frame.render_widget(banner, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(" Chat ");

    let placeholder = |text: &'static str| {
        Text::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
    };

    let chat_text = if app.checking_auth {
        placeholder("Loading...")
    } else if app.conversation.messages().is_empty() && !app.conversation.is_sending() {
        placeholder("Start a conversation with the generative AI assistant by typing a message below")
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for (index, msg) in app.conversation.messages().iter().enumerate() {
            let time = Span::styled(
                format!(" {}", msg.timestamp.format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            );

            match msg.role {
                Role::User => {
                    lines.push(Line::from(vec![
                        Span::styled("You:", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                        time,
                    ]));
                    for line in msg.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Role::Agent => {
                    let selected = app.selected_message == Some(index);
                    let marker = if selected { "> " } else { "" };
                    let mut label_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
                    if selected {
                        label_style = label_style.add_modifier(Modifier::REVERSED);
                    }
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}Agent:", marker), label_style),
                        time,
                    ]));
                    for line in msg.text.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                    if let Some(status) = app.message_status(index) {
                        lines.push(Line::from(Span::styled(
                            status,
                            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
                        )));
                    }
                }
            }
            lines.push(Line::default());
        }

        if app.conversation.is_sending() {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Generating a response{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_suggestions(app: &App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .conversation
        .suggestions()
        .iter()
        .enumerate()
        .map(|(i, prompt)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::raw(format!(" {}", prompt.text)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Suggested prompts "),
    );
    frame.render_widget(list, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let sending = app.conversation.is_sending();
    let editing = app.input_mode == InputMode::Editing && !sending;

    let border_color = if sending {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::White
    };

    let title = if sending {
        " Waiting for the agent... "
    } else {
        " Ask a question "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = app.conversation.input();
    let paragraph = if input.is_empty() && !editing {
        Paragraph::new("Ask a question...").style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = input.chars().skip(scroll_offset).take(inner_width).collect();
        let color = if sending { Color::DarkGray } else { Color::Cyan };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(paragraph.block(block), area);

    if editing && !app.show_sign_in {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    if app.show_sign_in {
        hints.extend(hint(" Enter ", " sign in "));
        hints.extend(hint(" Esc ", " cancel "));
    } else {
        match app.input_mode {
            InputMode::Editing => {
                hints.extend(hint(" Enter ", " send "));
                if app.conversation.suggestions_visible() && app.conversation.input().is_empty() {
                    hints.extend(hint(" Tab ", " suggestion "));
                }
                hints.extend(hint(" Esc ", " stop typing "));
            }
            InputMode::Normal => {
                hints.extend(hint(" j/k ", " select "));
                if app.selected_message.is_some() {
                    hints.extend(hint(" + ", " helpful "));
                    hints.extend(hint(" - ", " not helpful "));
                    hints.extend(hint(" y ", " copy "));
                }
                if app.conversation.suggestions_visible() {
                    hints.extend(hint(" 1-4 ", " suggest "));
                }
                if app.conversation.error().is_some() {
                    hints.extend(hint(" x ", " dismiss "));
                }
                if app.mode == EndpointMode::Production {
                    let label = if app.conversation.user().is_some() { " sign out " } else { " sign in " };
                    hints.push(Span::styled(" s ", key_style));
                    hints.push(Span::styled(label, label_style));
                }
                hints.extend(hint(" i ", " type "));
                hints.extend(hint(" q ", " quit "));
            }
        }
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Mask a token, keeping the last 4 chars visible
fn masked_token(token: &str) -> String {
    let char_count = token.chars().count();
    if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let masked_len = char_count - 4;
        let last_four: String = token.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    }
}

/// One-line row `offset` lines into `inner`, if it fits on screen
fn popup_row(inner: Rect, offset: u16) -> Option<Rect> {
    if offset >= inner.height {
        return None;
    }
    Some(Rect::new(inner.x, inner.y + offset, inner.width, 1))
}

fn render_sign_in(app: &App, frame: &mut Frame, area: Rect) {
    // Centered popup, clipped to the frame on small terminals
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height).intersection(area);
    if popup_area.is_empty() {
        return;
    }

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Sign In ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if let Some(row) = popup_row(inner, 0) {
        let instructions = Paragraph::new("Paste your access token. Enter to sign in, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(instructions, row);
    }

    let display_text = masked_token(&app.sign_in_input);
    if let Some(input_row) = popup_row(inner, 2) {
        // Typing always appends, so the cursor sits after the masked text
        let cursor_x = (display_text.chars().count() as u16).min(input_row.width.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(display_text).style(Style::default().fg(Color::Cyan)),
            input_row,
        );
        frame.set_cursor_position((input_row.x + cursor_x, input_row.y));
    }

    if let Some(row) = popup_row(inner, 4) {
        let (status, color) = match &app.sign_in_error {
            Some(e) => (e.clone(), Color::Red),
            None => (
                format!("{} characters", app.sign_in_input.chars().count()),
                Color::DarkGray,
            ),
        };
        frame.render_widget(Paragraph::new(status).style(Style::default().fg(color)), row);
    }
}
