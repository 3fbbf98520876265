use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: String,
    pub action: String,
}

impl KeyHint {
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Converts a list of key hints into styled spans for rendering.
pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            hint.key.clone(),
            Style::default().fg(theme.accent),
        ));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

/// Hint groups per screen and mode.
pub mod common {
    use super::KeyHint;

    pub fn grid() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Enter", "edit"),
            KeyHint::new("^Z", "undo"),
            KeyHint::new("s", "sort"),
            KeyHint::new("Space", "select"),
            KeyHint::new("a", "all"),
            KeyHint::new("b", "bulk"),
            KeyHint::new("D", "delete sel."),
            KeyHint::new("x", "delete"),
            KeyHint::new("n", "new"),
            KeyHint::new("/", "search"),
            KeyHint::new("[ ]", "month"),
            KeyHint::new("p", "payoff"),
            KeyHint::new("q", "quit"),
        ]
    }

    pub fn payoff() -> Vec<KeyHint> {
        vec![
            KeyHint::new("↑↓", "select"),
            KeyHint::new("e", "exclude"),
            KeyHint::new("m", "mark paid"),
            KeyHint::new("c", "card"),
            KeyHint::new("^Z", "undo"),
            KeyHint::new("p", "grid"),
            KeyHint::new("q", "quit"),
        ]
    }

    /// Hints for the cell and search edit line.
    pub fn line_editing() -> Vec<KeyHint> {
        vec![KeyHint::new("Enter", "apply"), KeyHint::new("Esc", "cancel")]
    }

    /// Hints for form editing.
    pub fn form_editing() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Tab", "next"),
            KeyHint::new("Space", "toggle"),
            KeyHint::new("Enter", "save"),
            KeyHint::new("Esc", "cancel"),
        ]
    }
}
