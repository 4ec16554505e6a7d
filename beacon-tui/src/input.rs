//! Keyboard input handling with vim-style bindings

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppResult};

/// Handle a key event
pub fn handle_key(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return AppResult::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return AppResult::Quit;
        }

        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char('g') | KeyCode::Home => app.cursor_top(),
        KeyCode::Char('G') | KeyCode::End => app.cursor_bottom(),

        _ => {}
    }

    AppResult::Continue
}
