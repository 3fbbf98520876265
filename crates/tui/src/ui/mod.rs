pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::app::{AppState, Mode, Screen};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::default();
    frame.render_widget(Block::default().style(Style::default().bg(theme.background)), area);

    // Info bar, page error, content, input line, bottom bar
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    render_page_error(frame, layout[1], state, &theme);

    match state.screen {
        Screen::Grid => screens::grid::render(frame, layout[2], state, &theme),
        Screen::Payoff => screens::payoff::render(frame, layout[2], state, &theme),
    }

    render_input_line(frame, layout[3], state, &theme);
    render_bottom_bar(frame, layout[4], state, &theme);

    if let Mode::Form(form) = &state.mode {
        components::dialog::render_form(frame, area, form, &theme);
    }
    if let Some((key, conflict)) = state.editor().conflicts().next() {
        let reference = state.editor().reference();
        components::dialog::render_conflict(frame, area, key, conflict, reference, &theme);
    }
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let editor = state.editor();
    let view = match state.screen {
        Screen::Grid => editor
            .filter()
            .period
            .map(|period| period.to_string())
            .unwrap_or_else(|| "all".to_string()),
        Screen::Payoff => "payoff".to_string(),
    };
    let status = if editor.is_loading() {
        Span::styled("loading", Style::default().fg(theme.warning))
    } else {
        Span::styled("ready", Style::default().fg(theme.positive))
    };

    let mut line = vec![
        Span::styled(
            "Tally",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("View", Style::default().fg(theme.dim)),
        Span::raw(format!(": {view}  ")),
        Span::styled("Source", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.source)),
    ];
    if !editor.filter().search.is_empty() {
        line.push(Span::styled("Search", Style::default().fg(theme.dim)));
        line.push(Span::raw(format!(": {}  ", editor.filter().search)));
    }
    line.push(status);

    frame.render_widget(Paragraph::new(Line::from(line)), area);
}

fn render_page_error(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(error) = state.editor().page_error() else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(error.to_string(), Style::default().fg(theme.error)),
        Span::styled("  (Esc to dismiss)", Style::default().fg(theme.dim)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input_line(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let line = match &state.mode {
        Mode::EditCell { key, input } => Line::from(vec![
            Span::styled(format!("{} ", key.field), Style::default().fg(theme.accent)),
            Span::raw(format!("{input}_")),
        ]),
        Mode::Search { input } => Line::from(vec![
            Span::styled("/", Style::default().fg(theme.accent)),
            Span::raw(format!("{input}_")),
        ]),
        Mode::Normal | Mode::Form(_) => {
            let error = state
                .current_cell()
                .and_then(|key| state.editor().cell_error(key));
            match error {
                Some(error) => Line::from(Span::styled(
                    error.to_string(),
                    Style::default().fg(theme.error),
                )),
                None => Line::default(),
            }
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    use components::hints::common;

    let hints = match (&state.mode, state.screen) {
        (Mode::EditCell { .. } | Mode::Search { .. }, _) => common::line_editing(),
        (Mode::Form(_), _) => common::form_editing(),
        (Mode::Normal, Screen::Grid) => common::grid(),
        (Mode::Normal, Screen::Payoff) => common::payoff(),
    };
    let parts = components::hints::hints_to_spans(&hints, theme);
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

/// A rectangle of at most `width` x `height` centered in `area`.
pub(crate) fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
