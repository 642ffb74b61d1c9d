use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use studio_core::{Feedback, PointerInput, ViewportCommand};
use tracing::warn;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Stream(update) => app.apply_stream_update(update),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Any key clears a one-shot status message
    app.status = None;

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn cycle_focus(app: &mut App) {
    app.focus = match app.focus {
        FocusPane::Input => FocusPane::Chat,
        FocusPane::Chat => FocusPane::Canvas,
        FocusPane::Canvas => FocusPane::Input,
    };
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => cycle_focus(app),
        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter if app.focus == FocusPane::Input => {
            app.input_mode = InputMode::Editing;
        }
        _ => match app.focus {
            FocusPane::Canvas => handle_canvas_key(app, key),
            FocusPane::Chat | FocusPane::Input => handle_chat_key(app, key),
        },
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(1)),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('c') => app.copy_last_message(),
        KeyCode::Char('y') => app.rate_last_message(Feedback::Up),
        KeyCode::Char('n') => app.rate_last_message(Feedback::Down),
        _ => {}
    }
}

fn handle_canvas_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('+') | KeyCode::Char('=') => app.canvas_command(ViewportCommand::ZoomIn),
        KeyCode::Char('-') => app.canvas_command(ViewportCommand::ZoomOut),
        KeyCode::Char('f') => app.canvas_command(ViewportCommand::FitToView),
        KeyCode::Char('r') => app.canvas_command(ViewportCommand::ResetView),
        KeyCode::Char('e') => {
            if let Err(e) = app.export() {
                warn!(error = %e, "export failed");
                app.status = Some(format!("Export failed: {}", e));
            }
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            cycle_focus(app);
        }
        KeyCode::Enter => app.send_message(),
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // A gesture in progress owns every move and release, wherever the
    // pointer is.
    if app.viewport.is_capturing() {
        match mouse.kind {
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                if let Some(p) = app.canvas_point(x, y) {
                    app.canvas_input(PointerInput::Move(p));
                }
                return;
            }
            MouseEventKind::Up(MouseButton::Left) => {
                app.canvas_input(PointerInput::Up);
                return;
            }
            _ => {}
        }
    }

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_canvas = app.canvas_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_input = app.input_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if in_canvas {
                app.focus = FocusPane::Canvas;
                app.input_mode = InputMode::Normal;
                if let Some(p) = app.canvas_point(x, y) {
                    app.canvas_input(PointerInput::Down(p));
                }
            } else if in_input {
                app.focus = FocusPane::Input;
                app.input_mode = InputMode::Editing;
            } else if in_chat {
                app.focus = FocusPane::Chat;
                app.input_mode = InputMode::Normal;
            }
        }
        MouseEventKind::ScrollDown => {
            if in_canvas {
                app.canvas_input(PointerInput::Wheel { delta_y: 1.0 });
            } else if in_chat {
                app.scroll_chat_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_canvas {
                app.canvas_input(PointerInput::Wheel { delta_y: -1.0 });
            } else if in_chat {
                app.scroll_chat_up(3);
            }
        }
        _ => {}
    }
}
