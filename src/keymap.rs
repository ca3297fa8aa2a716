use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::GanttAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeymapProfile {
    #[default]
    Default,
    Vim,
    Arrows,
}

#[derive(Clone, Copy, Debug)]
pub struct GanttKeyBindings {
    profile: KeymapProfile,
}

impl Default for GanttKeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl GanttKeyBindings {
    pub const fn new() -> Self {
        Self {
            profile: KeymapProfile::Default,
        }
    }

    pub const fn with_profile(profile: KeymapProfile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> KeymapProfile {
        self.profile
    }

    pub const fn set_profile(&mut self, profile: KeymapProfile) {
        self.profile = profile;
    }

    pub fn resolve<C>(&self, key: KeyEvent) -> Option<GanttAction<C>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('u') => return Some(GanttAction::PageUp),
                KeyCode::Char('d') => return Some(GanttAction::PageDown),
                _ => {}
            }
        }

        let scroll_action = match self.profile {
            KeymapProfile::Default => Self::resolve_default_scroll(key),
            KeymapProfile::Vim => Self::resolve_vim_scroll(key),
            KeymapProfile::Arrows => Self::resolve_arrow_scroll(key),
        };
        if scroll_action.is_some() {
            return scroll_action;
        }

        Self::resolve_common(key)
    }

    pub fn resolve_with<C, F>(&self, key: KeyEvent, custom: F) -> Option<GanttAction<C>>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        if let Some(action) = custom(key) {
            return Some(GanttAction::Custom(action));
        }

        self.resolve(key)
    }

    const fn resolve_default_scroll<C>(key: KeyEvent) -> Option<GanttAction<C>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(GanttAction::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(GanttAction::ScrollDown),
            _ => None,
        }
    }

    const fn resolve_vim_scroll<C>(key: KeyEvent) -> Option<GanttAction<C>> {
        match key.code {
            KeyCode::Char('k') => Some(GanttAction::ScrollUp),
            KeyCode::Char('j') => Some(GanttAction::ScrollDown),
            KeyCode::Char('g') => Some(GanttAction::ScrollToStart),
            KeyCode::Char('G') => Some(GanttAction::ScrollToEnd),
            _ => None,
        }
    }

    const fn resolve_arrow_scroll<C>(key: KeyEvent) -> Option<GanttAction<C>> {
        match key.code {
            KeyCode::Up => Some(GanttAction::ScrollUp),
            KeyCode::Down => Some(GanttAction::ScrollDown),
            _ => None,
        }
    }

    const fn resolve_common<C>(key: KeyEvent) -> Option<GanttAction<C>> {
        match key.code {
            KeyCode::PageUp => Some(GanttAction::PageUp),
            KeyCode::PageDown | KeyCode::Char(' ') => Some(GanttAction::PageDown),
            KeyCode::Home => Some(GanttAction::ScrollToStart),
            KeyCode::End => Some(GanttAction::ScrollToEnd),
            KeyCode::Char('-') => Some(GanttAction::CollapseAll),
            KeyCode::Char('+' | '=') => Some(GanttAction::ExpandAll),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn profiles_differ_on_letter_keys() {
        let default = GanttKeyBindings::new();
        let arrows = GanttKeyBindings::with_profile(KeymapProfile::Arrows);
        let vim = GanttKeyBindings::with_profile(KeymapProfile::Vim);

        assert_eq!(default.resolve::<()>(key(KeyCode::Char('j'))), Some(GanttAction::ScrollDown));
        assert_eq!(arrows.resolve::<()>(key(KeyCode::Char('j'))), None);
        assert_eq!(vim.resolve::<()>(key(KeyCode::Down)), None);
        assert_eq!(vim.resolve::<()>(key(KeyCode::Char('G'))), Some(GanttAction::ScrollToEnd));
    }

    #[test]
    fn control_chords_page() {
        let bindings = GanttKeyBindings::new();
        let chord = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(bindings.resolve::<()>(chord), Some(GanttAction::PageDown));
    }

    #[test]
    fn custom_mapping_takes_precedence() {
        let bindings = GanttKeyBindings::new();
        let action = bindings.resolve_with(key(KeyCode::Char('j')), |event| {
            (event.code == KeyCode::Char('j')).then_some("jump")
        });
        assert_eq!(action, Some(GanttAction::Custom("jump")));
    }
}
