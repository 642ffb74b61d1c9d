use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
        Block, Borders, Paragraph, Wrap,
    },
};
use studio_core::format::Block as MessageBlock;
use studio_core::layout::{GraphNode, Point};
use studio_core::{format_message, ChatMessage, ChatRole, Feedback};

use crate::app::{App, FocusPane, InputMode};

/// Samples per edge curve.
const CURVE_SEGMENTS: usize = 24;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Chat on the left, flow canvas on the right
    let [chat_column, canvas_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_chat(app, frame, chat_column);
    render_canvas(app, frame, canvas_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title_text = app
        .proposal
        .as_ref()
        .map(|p| p.title.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!(" {} ", t))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(" AI Project Studio ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(title_text, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => " EDIT ",
        (InputMode::Normal, FocusPane::Canvas) => " CANVAS ",
        (InputMode::Normal, _) => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = Vec::new();
    match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => {
            hints.extend(hint("Enter", "send"));
            hints.extend(hint("Esc", "done"));
        }
        (InputMode::Normal, FocusPane::Canvas) => {
            hints.extend(hint("+/-", "zoom"));
            hints.extend(hint("f", "fit"));
            hints.extend(hint("r", "reset"));
            hints.extend(hint("e", "export"));
            hints.extend(hint("Tab", "focus"));
            hints.extend(hint("q", "quit"));
        }
        (InputMode::Normal, _) => {
            hints.extend(hint("i", "type"));
            hints.extend(hint("j/k", "scroll"));
            if last_message_actionable(app) {
                hints.extend(hint("c", "copy"));
                hints.extend(hint("y/n", "rate"));
            }
            hints.extend(hint("Tab", "focus"));
            hints.extend(hint("q", "quit"));
        }
    }

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    spans.extend(hints);
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Green),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn last_message_actionable(app: &App) -> bool {
    app.last_assistant_index()
        .is_some_and(|i| app.messages[i].accepts_actions())
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);
    app.input_area = Some(input_area);

    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;
    let border_color = if chat_focused { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.generator.effective_provider().display_name()));

    let chat_text = if app.messages.is_empty() && !app.is_generating() {
        Text::from(Span::styled(
            app.t("chat.placeholder"),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let last_assistant = app.last_assistant_index();
        let mut lines: Vec<Line> = Vec::new();

        for (idx, msg) in app.messages.iter().enumerate() {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        format!("{}:", app.t("chat.you")),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.clone()));
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        format!("{}:", app.t("chat.assistant")),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(message_lines(msg));
                    if Some(idx) == last_assistant && msg.accepts_actions() {
                        lines.push(feedback_line(msg));
                    }
                }
            }
            lines.push(Line::default());
        }

        if app.is_generating() {
            lines.push(Line::from(Span::styled(
                format!("{}:", app.t("chat.assistant")),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("{}{}", app.t("chat.thinking"), dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

/// Styled lines for an assistant message. Each streamed prefix goes through
/// the formatter too, with a cursor after the last word.
fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = format_message(&msg.content)
        .into_iter()
        .map(block_line)
        .collect();
    if msg.is_streaming {
        let cursor = Span::styled("▌", Style::default().fg(Color::DarkGray));
        match lines.last_mut() {
            Some(last) => last.push_span(cursor),
            None => lines.push(Line::from(cursor)),
        }
    }
    lines
}

fn block_line(block: MessageBlock) -> Line<'static> {
    match block {
        MessageBlock::Card {
            title,
            duration,
            detail,
        } => {
            let mut spans = vec![Span::styled("▍", Style::default().fg(Color::LightGreen))];
            if let Some(title) = title {
                spans.push(Span::styled(
                    format!("{} ", title),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::styled(
                format!("[{}]", duration),
                Style::default().fg(Color::Black).bg(Color::LightGreen),
            ));
            spans.push(Span::raw(format!(" {}", detail)));
            Line::from(spans)
        }
        MessageBlock::Heading { text, neutral } => {
            let color = if neutral { Color::White } else { Color::LightGreen };
            Line::from(Span::styled(
                text,
                Style::default()
                    .fg(color)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ))
        }
        MessageBlock::Bullet { text } => Line::from(vec![
            Span::styled("• ", Style::default().fg(Color::LightGreen)),
            Span::raw(text),
        ]),
        MessageBlock::Rich { segments } => Line::from(
            segments
                .into_iter()
                .map(|s| {
                    if s.bold {
                        Span::styled(s.text, Style::default().add_modifier(Modifier::BOLD))
                    } else {
                        Span::raw(s.text)
                    }
                })
                .collect::<Vec<_>>(),
        ),
        MessageBlock::Paragraph { text } => Line::from(text),
    }
}

fn feedback_line(msg: &ChatMessage) -> Line<'static> {
    let style_for = |rating: Feedback| {
        if msg.feedback == Some(rating) {
            Style::default().fg(Color::Black).bg(Color::LightGreen)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    Line::from(vec![
        Span::styled("[c] copy ", Style::default().fg(Color::DarkGray)),
        Span::styled("[y] 👍", style_for(Feedback::Up)),
        Span::raw(" "),
        Span::styled("[n] 👎", style_for(Feedback::Down)),
    ])
}

fn render_input(app: &App, frame: &mut Frame, input_area: Rect) {
    let input_focused = app.focus == FocusPane::Input;
    let border_color = if input_focused || app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && app.input_mode != InputMode::Editing {
        Paragraph::new(Span::styled(
            app.t("chat.placeholder"),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_canvas(app: &mut App, frame: &mut Frame, area: Rect) {
    let canvas_focused = app.focus == FocusPane::Canvas;
    let border_color = if canvas_focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Flow {:.0}% ", app.viewport.scale() * 100.0));

    let inner = block.inner(area);
    app.set_canvas_area(inner);

    if app.viewport.live_nodes().is_empty() {
        let empty = Paragraph::new(Span::styled(
            app.t("flow.empty"),
            Style::default().fg(Color::DarkGray),
        ))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    // Canvas y grows upwards; surface y grows downwards.
    let visible = app.viewport.surface_transform().visible_region();
    let viewport = &app.viewport;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(Color::Reset)
        .x_bounds([visible.min_x, visible.max_x])
        .y_bounds([-visible.max_y, -visible.min_y])
        .paint(|ctx| {
            let state = viewport.state();

            for (_, curve) in viewport.edge_curves() {
                let points: Vec<Point> = curve
                    .sample(CURVE_SEGMENTS)
                    .into_iter()
                    .map(|p| state.to_surface(p))
                    .collect();
                for pair in points.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].x,
                        y1: -pair[0].y,
                        x2: pair[1].x,
                        y2: -pair[1].y,
                        color: Color::Gray,
                    });
                }
            }

            ctx.layer();
            let config = viewport.config();
            for node in viewport.live_nodes() {
                paint_node(ctx, node, state, config.node_width, config.node_height);
            }
        });

    frame.render_widget(canvas, area);
}

fn paint_node(
    ctx: &mut Context,
    node: &GraphNode,
    state: studio_core::ViewportState,
    width: f64,
    height: f64,
) {
    let (r, g, b) = node.color.rgb();
    let color = Color::Rgb(r, g, b);
    let top_left = state.to_surface(Point::new(node.x - width / 2.0, node.y - height / 2.0));
    let w = width * state.scale;
    let h = height * state.scale;

    ctx.draw(&Rectangle {
        x: top_left.x,
        y: -(top_left.y + h),
        width: w,
        height: h,
        color,
    });

    // Labels sit inside the card, one terminal row apart at the current zoom.
    let pad = 12.0 * state.scale;
    let row = 24.0 * state.scale;
    ctx.print(
        top_left.x + pad,
        -(top_left.y + pad),
        Line::from(Span::styled(
            node.title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    );
    let max_lines = ((h - pad - row) / row).floor().max(0.0) as usize;
    for (i, line) in node.subtitle_lines.iter().take(max_lines).enumerate() {
        ctx.print(
            top_left.x + pad,
            -(top_left.y + pad + row * (i + 1) as f64),
            Line::from(Span::styled(line.clone(), Style::default().fg(Color::Gray))),
        );
    }
}
