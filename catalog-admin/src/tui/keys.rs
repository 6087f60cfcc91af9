use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    MoveDown,
    MoveUp,
    PageDown,
    PageUp,
    JumpFirst,
    JumpLast,
    Activate,
    Toggle,
    StartSearch,
    ToggleSort,
    UnselectAll,
    OpenImages,
    OpenLocations,
    Retry,
    Save,
    NavigateBack,
    InputChar(char),
    Backspace,
    CursorLeft,
    CursorRight,
    CursorStart,
    CursorEnd,
    KillToEnd,
    ToggleHelp,
    Dismiss,
    Noop,
}

pub fn map_key_with_input_mode(key: KeyEvent, input_mode_active: bool) -> KeyAction {
    if input_mode_active {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('a') {
            return KeyAction::CursorStart;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('e') {
            return KeyAction::CursorEnd;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('k') {
            return KeyAction::KillToEnd;
        }
        return match key.code {
            KeyCode::Enter => KeyAction::Activate,
            KeyCode::Esc => KeyAction::Dismiss,
            KeyCode::Backspace => KeyAction::Backspace,
            KeyCode::Left => KeyAction::CursorLeft,
            KeyCode::Right => KeyAction::CursorRight,
            KeyCode::Home => KeyAction::CursorStart,
            KeyCode::End => KeyAction::CursorEnd,
            KeyCode::Char(c) if !c.is_control() => KeyAction::InputChar(c),
            _ => KeyAction::Noop,
        };
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyAction::Quit,
            KeyCode::Char('s') => KeyAction::Save,
            KeyCode::Char('d') => KeyAction::PageDown,
            KeyCode::Char('u') => KeyAction::PageUp,
            _ => KeyAction::Noop,
        };
    }
    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('/') => KeyAction::StartSearch,
        KeyCode::Enter => KeyAction::Activate,
        KeyCode::Char(' ') => KeyAction::Toggle,
        KeyCode::Char('b') => KeyAction::NavigateBack,
        KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::Char('g') | KeyCode::Home => KeyAction::JumpFirst,
        KeyCode::Char('G') | KeyCode::End => KeyAction::JumpLast,
        KeyCode::Char('s') => KeyAction::ToggleSort,
        KeyCode::Char('u') => KeyAction::UnselectAll,
        KeyCode::Char('i') => KeyAction::OpenImages,
        KeyCode::Char('l') => KeyAction::OpenLocations,
        KeyCode::Char('r') => KeyAction::Retry,
        KeyCode::Char('?') => KeyAction::ToggleHelp,
        KeyCode::Esc => KeyAction::Dismiss,
        _ => KeyAction::Noop,
    }
}
