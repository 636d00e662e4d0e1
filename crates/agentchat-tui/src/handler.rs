use anyhow::Result;
use agentchat_core::Feedback;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode};
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
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::ScrollUp => app.scroll_up(3),
        AppEvent::ScrollDown => app.scroll_down(3),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::AgentReply { generation, result } => app.on_agent_reply(generation, result),
        AppEvent::FeedbackRecorded {
            index,
            feedback,
            result,
        } => app.on_feedback_recorded(index, feedback, result),
        AppEvent::CopyExpired(index) => app.on_copy_expired(index),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_sign_in {
        handle_sign_in(app, key).await;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await,
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the prompt
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        // Message selection
        KeyCode::Char('j') | KeyCode::Down => app.select_next_message(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_message(),

        // Scrolling
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(2) / 2),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(2) / 2),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height.max(2) / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height.max(2) / 2);
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.chat_scroll = 0,

        // Actions on the selected agent message
        KeyCode::Char('+') => app.rate_selected(Feedback::Helpful),
        KeyCode::Char('-') => app.rate_selected(Feedback::NotHelpful),
        KeyCode::Char('y') | KeyCode::Char('c') => app.copy_selected(),

        // Suggested prompts
        KeyCode::Char(c @ '1'..='4') => {
            let n = c as usize - '1' as usize;
            app.pick_suggestion(n);
        }

        // Error banner and session
        KeyCode::Char('x') => app.conversation.dismiss_error(),
        KeyCode::Char('s') => app.toggle_session().await,

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            // Jump straight to the first suggestion from the prompt
            if app.conversation.input().is_empty() {
                app.pick_suggestion(0);
            }
        }
        _ if app.conversation.is_sending() => {
            // Input is disabled while a reply is pending
        }
        KeyCode::Enter => {
            app.submit();
            if app.conversation.is_sending() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.conversation.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let input = app.conversation.input_mut();
            if app.input_cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.conversation.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.conversation.input().chars().count();
        }
        KeyCode::Char(c) => {
            let input = app.conversation.input_mut();
            let byte_pos = char_to_byte_index(input, app.input_cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

async fn handle_sign_in(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_sign_in(),
        KeyCode::Enter => {
            if !app.sign_in_input.trim().is_empty() {
                app.submit_sign_in().await;
            }
        }
        // The token is masked, so editing only happens at the end
        KeyCode::Backspace => {
            app.sign_in_input.pop();
        }
        KeyCode::Char(c) => app.sign_in_input.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_ascii() {
        assert_eq!(char_to_byte_index("hello", 2), 2);
        assert_eq!(char_to_byte_index("hello", 9), 5);
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("72°F", 3), 4);
    }
}
