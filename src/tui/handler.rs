use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    NextView,
    PrevView,
    ToggleFavorite,
    OpenInBrowser,
    AddBookmark,
    AddCategory,
    AddCollection,
    AddTag,
    DeleteCollection,
    Summarize,
    ShowSuggestions,
    CloseOverlay,
    Reload,
    Logout,
    ShowHelp,
    HideHelp,
    // Text input actions (login form and prompts)
    InputChar(char),
    InputBackspace,
    InputNextField,
    InputConfirm,
    InputCancel,
    ToggleRegister,
}

/// What the keyboard is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
    Overlay,
    Text,
}

pub fn handle_key_event(key: KeyEvent, mode: InputMode) -> Option<AppAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppAction::Quit);
    }

    match mode {
        // If help is showing, any key closes it
        InputMode::Help => Some(AppAction::HideHelp),
        InputMode::Overlay => Some(AppAction::CloseOverlay),
        InputMode::Text => match (key.code, key.modifiers) {
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => Some(AppAction::ToggleRegister),
            (KeyCode::Enter, _) => Some(AppAction::InputConfirm),
            (KeyCode::Esc, _) => Some(AppAction::InputCancel),
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => Some(AppAction::InputNextField),
            (KeyCode::Backspace, _) => Some(AppAction::InputBackspace),
            (KeyCode::Char(c), _) => Some(AppAction::InputChar(c)),
            _ => None,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),

            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char('<') | KeyCode::Home => Some(AppAction::MoveToTop),
            KeyCode::Char('>') | KeyCode::End => Some(AppAction::MoveToBottom),
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => Some(AppAction::NextView),
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => Some(AppAction::PrevView),

            KeyCode::Char('f') => Some(AppAction::ToggleFavorite),
            KeyCode::Char('o') | KeyCode::Enter => Some(AppAction::OpenInBrowser),
            KeyCode::Char('a') => Some(AppAction::AddBookmark),
            KeyCode::Char('c') => Some(AppAction::AddCategory),
            KeyCode::Char('n') => Some(AppAction::AddCollection),
            KeyCode::Char('t') => Some(AppAction::AddTag),
            KeyCode::Char('D') => Some(AppAction::DeleteCollection),
            KeyCode::Char('s') => Some(AppAction::Summarize),
            KeyCode::Char('S') => Some(AppAction::ShowSuggestions),
            KeyCode::Char('r') => Some(AppAction::Reload),
            KeyCode::Char('L') => Some(AppAction::Logout),

            KeyCode::Char('?') => Some(AppAction::ShowHelp),

            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_help_swallows_any_key() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), InputMode::Help),
            Some(AppAction::HideHelp)
        );
    }

    #[test]
    fn test_text_mode_types_letters() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('f')), InputMode::Text),
            Some(AppAction::InputChar('f'))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), InputMode::Text),
            Some(AppAction::InputConfirm)
        );
    }

    #[test]
    fn test_normal_mode_bindings() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('f')), InputMode::Normal),
            Some(AppAction::ToggleFavorite)
        );
        assert_eq!(
            handle_key_event(KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT), InputMode::Normal),
            Some(AppAction::DeleteCollection)
        );
        assert_eq!(handle_key_event(key(KeyCode::F(5)), InputMode::Normal), None);
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c, InputMode::Text), Some(AppAction::Quit));
    }
}
