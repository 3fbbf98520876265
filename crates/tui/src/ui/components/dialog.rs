use engine::{CellKey, PendingConflict, ReferenceData, apply_update};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::{
    app::{FieldInput, FormDialog, cell_text},
    ui::{centered_rect, theme::Theme},
};

pub fn render_form(frame: &mut Frame<'_>, area: Rect, form: &FormDialog, theme: &Theme) {
    let height = form.fields.len() as u16 + 4;
    let rect = centered_rect(area, 56, height);

    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let focused = index == form.focus;
            let label_style = if focused {
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.dim)
            };
            let value = match &field.input {
                FieldInput::Text(text) if focused => format!("{text}_"),
                FieldInput::Text(text) => text.clone(),
                FieldInput::Toggle(true) => "[x]".to_string(),
                FieldInput::Toggle(false) => "[ ]".to_string(),
            };
            Line::from(vec![
                Span::styled(format!("{:<24}", field.label), label_style),
                Span::styled(value, Style::default().fg(theme.text)),
            ])
        })
        .collect();

    lines.push(Line::default());
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(theme.error),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(form.title())
        .style(Style::default().bg(theme.panel));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// The server's value next to the rejected local value of one cell.
pub fn render_conflict(
    frame: &mut Frame<'_>,
    area: Rect,
    key: CellKey,
    conflict: &PendingConflict,
    reference: &ReferenceData,
    theme: &Theme,
) {
    let theirs = cell_text(&conflict.current, key.field, reference);
    let mut intended = conflict.current.clone();
    let yours = match apply_update(&mut intended, &conflict.attempted) {
        Ok(()) => cell_text(&intended, key.field, reference),
        Err(err) => err.to_string(),
    };

    let lines = vec![
        Line::from(format!(
            "\"{}\" was changed by someone else.",
            conflict.current.description
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{:<8}", "Yours"), Style::default().fg(theme.dim)),
            Span::styled(yours, Style::default().fg(theme.warning)),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<8}", "Theirs"), Style::default().fg(theme.dim)),
            Span::styled(theirs, Style::default().fg(theme.text)),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("o", Style::default().fg(theme.accent)),
            Span::raw(" overwrite  "),
            Span::styled("d", Style::default().fg(theme.accent)),
            Span::raw(" discard"),
        ]),
    ];

    let rect = centered_rect(area, 56, lines.len() as u16 + 2);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Conflict on {}", key.field))
        .border_style(Style::default().fg(theme.warning))
        .style(Style::default().bg(theme.panel));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}
