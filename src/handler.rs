use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, DialogField};
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
        AppEvent::Resize => {}
        AppEvent::Tick => {
            // The tick both animates the busy indicator and polls the
            // in-flight request for completion
            if app.has_settled_request() {
                app.settle_pending().await;
            }
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // An open alert swallows the next key press
    if app.alert.is_some() {
        app.alert = None;
        return;
    }

    if app.show_repo_dialog {
        handle_dialog_key(app, key);
    } else {
        handle_chat_key(app, key);
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,

        KeyCode::Enter => app.submit_chat_message(),

        // Open the repository analysis dialog
        KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.open_repo_dialog();
        }

        // Log scrolling stays live even while a request is in flight
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),

        // Everything else edits the input, which is disabled while pending
        _ => {
            if !app.is_pending() {
                edit_field(&mut app.input, &mut app.input_cursor, key);
            }
        }
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_repo_dialog(),

        KeyCode::Tab | KeyCode::BackTab => app.toggle_dialog_field(),

        KeyCode::Enter => app.submit_repo_analysis(),

        _ => {
            let (text, cursor) = match app.dialog_field {
                DialogField::RepoUrl => (&mut app.repo_url_input, &mut app.repo_url_cursor),
                DialogField::Question => (&mut app.question_input, &mut app.question_cursor),
            };
            edit_field(text, cursor, key);
        }
    }
}

/// Cursor-aware editing shared by the chat input and both dialog fields.
/// The cursor is a character index; byte positions are resolved per edit.
fn edit_field(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(text.chars().count());
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = text.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}
