use engine::MoneyCents;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::{app::AppState, ui::theme::Theme};

const WIDTHS: [Constraint; 4] = [
    Constraint::Length(3),
    Constraint::Length(12),
    Constraint::Min(20),
    Constraint::Length(13),
];

/// Unpaid charges of one payment method and the amount owed on them.
pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    render_summary(frame, layout[0], state, theme);
    render_charges(frame, layout[1], state, theme);
}

fn render_summary(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let payoff = &state.payoff;
    let method = payoff
        .payment_method()
        .and_then(|id| payoff.editor().reference().payment_method_name(id))
        .unwrap_or("all methods");

    let line = Line::from(vec![
        Span::styled("Card", Style::default().fg(theme.dim)),
        Span::raw(format!(": {method}   ")),
        Span::styled("Amount owed", Style::default().fg(theme.dim)),
        Span::raw(": "),
        Span::styled(
            payoff.amount_owed().format_usd(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_charges(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let payoff = &state.payoff;
    let rows: Vec<Row> = payoff
        .editor()
        .visible()
        .into_iter()
        .map(|expense| {
            let excluded = payoff.is_excluded(expense.id);
            let (mark, style) = if excluded {
                (
                    "-",
                    Style::default()
                        .fg(theme.dim)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                ("", Style::default().fg(theme.text))
            };
            let amount = Line::from(MoneyCents::new(expense.amount_minor).format_usd())
                .alignment(Alignment::Right);
            Row::new(vec![
                Cell::from(mark),
                Cell::from(expense.date.format("%Y-%m-%d").to_string()),
                Cell::from(expense.description.clone()),
                Cell::from(amount),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, WIDTHS)
        .header(
            Row::new(vec!["", "Date", "Description", "Amount"]).style(
                Style::default()
                    .fg(theme.dim)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(Block::default().borders(Borders::ALL).title("Unpaid"))
        .row_highlight_style(Style::default().bg(theme.selected));

    let mut table_state = TableState::default().with_selected(Some(state.payoff_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}
