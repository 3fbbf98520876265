use api_types::expense::{Expense, Field};
use engine::{CellKey, CellStatus, MoneyCents, SortDirection};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::{
    app::{AppState, cell_text},
    ui::theme::Theme,
};

const WIDTHS: [Constraint; 7] = [
    Constraint::Length(2),
    Constraint::Length(12),
    Constraint::Min(20),
    Constraint::Length(13),
    Constraint::Length(16),
    Constraint::Length(15),
    Constraint::Length(12),
];

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_table(frame, layout[0], state, theme);
    render_footer(frame, layout[1], state, theme);
}

fn column_title(field: Field) -> &'static str {
    match field {
        Field::Date => "Date",
        Field::Description => "Description",
        Field::Amount => "Amount",
        Field::Category => "Category",
        Field::PaymentMethod => "Payment",
        Field::DatePaid => "Paid",
    }
}

fn render_table(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let editor = &state.grid;
    let sort = editor.sort();

    let mut header = vec![Cell::from("")];
    header.extend(Field::ALL.iter().map(|field| {
        let arrow = match sort.direction_of(*field) {
            Some(SortDirection::Ascending) => " ▲",
            Some(SortDirection::Descending) => " ▼",
            None => "",
        };
        Cell::from(format!("{}{arrow}", column_title(*field)))
    }));
    let header = Row::new(header).style(
        Style::default()
            .fg(theme.dim)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = editor
        .visible()
        .into_iter()
        .enumerate()
        .map(|(index, expense)| render_row(state, index, expense, theme))
        .collect();

    let period = editor
        .filter()
        .period
        .map(|period| period.to_string())
        .unwrap_or_default();
    let table = Table::new(rows, WIDTHS)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Expenses {period}")),
        )
        .row_highlight_style(Style::default().bg(theme.selected));

    let mut table_state = TableState::default().with_selected(Some(state.cursor.row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_row(state: &AppState, index: usize, expense: &Expense, theme: &Theme) -> Row<'static> {
    let editor = &state.grid;
    let mark = if editor.selection().contains(expense.id) {
        "*"
    } else {
        ""
    };

    let mut cells = vec![Cell::from(Span::styled(mark, Style::default().fg(theme.accent)))];
    for (column, field) in Field::ALL.iter().enumerate() {
        let key = CellKey::new(expense.id, *field);
        let text = match field {
            Field::Amount => MoneyCents::new(expense.amount_minor).format_usd(),
            _ => cell_text(expense, *field, editor.reference()),
        };
        let (badge, badge_style) = match editor.cell_status(key) {
            CellStatus::Clean => ("", Style::default()),
            CellStatus::Dirty => (" !", Style::default().fg(theme.warning)),
            CellStatus::Error => (" x", Style::default().fg(theme.error)),
        };

        let mut style = Style::default().fg(theme.text);
        if *field == Field::Amount && expense.amount_minor < 0 {
            style = style.fg(theme.positive);
        }
        if expense.id < 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if index == state.cursor.row && column == state.cursor.column {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let mut line = Line::from(vec![
            Span::styled(text, style),
            Span::styled(badge, badge_style),
        ]);
        if *field == Field::Amount {
            line = line.alignment(Alignment::Right);
        }
        cells.push(Cell::from(line));
    }

    Row::new(cells)
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let editor = &state.grid;
    let total: MoneyCents = editor
        .records()
        .iter()
        .map(|expense| MoneyCents::new(expense.amount_minor))
        .sum();

    let mut line = vec![
        Span::styled("Rows", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", editor.records().len())),
        Span::styled("Total", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", total.format_usd())),
    ];
    if !editor.selection().is_empty() {
        line.push(Span::styled("Selected", Style::default().fg(theme.dim)));
        line.push(Span::raw(format!(
            ": {} ({})  ",
            editor.selection().len(),
            editor.selected_total().format_usd()
        )));
    }
    if editor.conflicts().next().is_some() {
        line.push(Span::styled(
            "conflict pending",
            Style::default().fg(theme.warning),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(line)), area);
}
