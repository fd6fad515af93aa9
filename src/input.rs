use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    Toggle,
    Collapse,
    Refresh,
    OpenBrowser,
    ShowToolArgs,
    CycleFilter,
    QuickSelect(usize),
    CloseOverlay,
    None,
}

/// Which overlay (if any) is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    ToolArgs,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
    pub overlay: OverlayMode,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // Tool-args modal: blocking, any close key dismisses it
    if ctx.overlay == OverlayMode::ToolArgs {
        return match key.code {
            KeyCode::Char('q' | 'a') | KeyCode::Esc | KeyCode::Enter => Action::CloseOverlay,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Right | KeyCode::Char('l' | ' ') | KeyCode::Enter => Action::Toggle,
        KeyCode::Left | KeyCode::Char('h') => Action::Collapse,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Char('o') => Action::OpenBrowser,
        KeyCode::Char('a') => Action::ShowToolArgs,
        KeyCode::Char('f') => Action::CycleFilter,
        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
            Action::QuickSelect((c as u8 - b'0') as usize)
        }
        _ => Action::None,
    }
}
