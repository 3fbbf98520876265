use std::time::Duration;

use api_types::expense::Field;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::{CellKey, Editor, EngineError, ExpenseFilter, PayoffView, Resolution};
use tracing::{debug, info};

use crate::{
    client::Backend,
    config::{self, AppConfig},
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

mod form;
mod input;
mod state;

pub use form::{FieldInput, FormDialog, FormKind};
pub use input::cell_text;
use input::parse_cell_input;
pub use state::{AppState, Mode, Screen, ToastLevel, ToastState};

pub struct App {
    config: AppConfig,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = Backend::from_config(&config)?;
        let timezone = config.timezone()?;
        let period = config.period(config::today(timezone))?;
        let options = config.editor_options();

        let grid = Editor::builder(backend.clone())
            .options(options.clone())
            .filter(ExpenseFilter::for_period(period))
            .build();
        let payoff = PayoffView::new(Editor::builder(backend.clone()).options(options).build());
        let state = AppState::new(grid, payoff, backend.label(), timezone);

        Ok(Self {
            config,
            state,
            should_quit: false,
        })
    }

    /// Loads reference data and the first views.
    pub async fn open(&mut self) -> Result<()> {
        self.state.grid.load_reference().await?;
        self.state.payoff.open().await?;
        self.state.grid.load();
        info!(source = self.state.source, base_url = %self.config.base_url, "opened");
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        self.open().await?;
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(100);

        while !self.should_quit {
            self.state.pump();
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key);
        self.handle_action(action);
    }

    pub fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        let mode = std::mem::replace(&mut self.state.mode, Mode::Normal);
        self.state.mode = match mode {
            Mode::Normal => {
                self.handle_normal(action);
                return;
            }
            Mode::EditCell { key, input } => self.handle_edit(key, input, action),
            Mode::Search { input } => self.handle_search(input, action),
            Mode::Form(form) => self.handle_form(form, action),
        };
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn handle_normal(&mut self, action: AppAction) {
        match action {
            AppAction::Undo => {
                if !self.state.editor_mut().undo() {
                    self.state.notify(ToastLevel::Info, "Nothing to undo");
                }
            }
            AppAction::Cancel => self.state.editor_mut().dismiss_page_error(),
            AppAction::Up | AppAction::Down | AppAction::Left | AppAction::Right => {
                self.move_cursor(action);
            }
            AppAction::Input(ch) => match self.state.screen {
                Screen::Grid => self.grid_command(ch),
                Screen::Payoff => self.payoff_command(ch),
            },
            AppAction::Submit if self.state.screen == Screen::Grid => self.open_cell_editor(),
            _ => {}
        }
    }

    fn move_cursor(&mut self, action: AppAction) {
        let last_row = self.state.editor().records().len().saturating_sub(1);
        let last_column = Field::ALL.len() - 1;
        let state = &mut self.state;
        let row = match state.screen {
            Screen::Grid => &mut state.cursor.row,
            Screen::Payoff => &mut state.payoff_row,
        };
        match action {
            AppAction::Up => *row = row.saturating_sub(1),
            AppAction::Down => *row = (*row + 1).min(last_row),
            AppAction::Left => state.cursor.column = state.cursor.column.saturating_sub(1),
            AppAction::Right => state.cursor.column = (state.cursor.column + 1).min(last_column),
            _ => {}
        }
    }

    fn grid_command(&mut self, ch: char) {
        if self.resolve_conflict(ch) {
            return;
        }

        let current = self.state.current_id();
        match ch {
            'q' => self.should_quit = true,
            's' => {
                let field = self.state.cursor.field();
                self.state.grid.toggle_sort(field);
            }
            ' ' => {
                if let Some(id) = current {
                    self.state.grid.toggle_selected(id);
                }
            }
            'a' => self.state.grid.toggle_select_all(),
            'b' => {
                if self.state.grid.selection().is_empty() {
                    self.state.notify(ToastLevel::Info, "Select rows first");
                } else {
                    self.state.mode = Mode::Form(FormDialog::bulk());
                }
            }
            'D' => {
                let count = self.state.grid.selection().len();
                match self.state.grid.bulk_delete() {
                    Ok(()) => self
                        .state
                        .notify(ToastLevel::Info, format!("Deleting {count} expense(s)")),
                    Err(err) => self.report(err),
                }
            }
            'x' => {
                if let Some(id) = current {
                    if let Err(err) = self.state.grid.delete(id) {
                        self.report(err);
                    }
                }
            }
            'n' => self.state.mode = Mode::Form(FormDialog::draft()),
            '/' => {
                let input = self.state.grid.filter().search.clone();
                self.state.mode = Mode::Search { input };
            }
            '[' | ']' => self.step_period(ch == ']'),
            'r' => self.state.grid.load(),
            'p' => {
                self.state.screen = Screen::Payoff;
                self.state.payoff.editor_mut().load();
            }
            _ => {}
        }
    }

    fn payoff_command(&mut self, ch: char) {
        if self.resolve_conflict(ch) {
            return;
        }

        match ch {
            'q' => self.should_quit = true,
            'e' => {
                if let Some(id) = self.state.current_id() {
                    self.state.payoff.toggle_excluded(id);
                }
            }
            'm' => {
                let today = config::today(self.state.timezone);
                if let Err(err) = self.state.payoff.mark_as_paid(today) {
                    self.report(err);
                }
            }
            'c' => self.cycle_payment_method(),
            'r' => self.state.payoff.editor_mut().load(),
            'p' => {
                self.state.screen = Screen::Grid;
                self.state.grid.load();
            }
            _ => {}
        }
    }

    /// `o` / `d` act on the oldest open conflict of the active screen.
    fn resolve_conflict(&mut self, ch: char) -> bool {
        let resolution = match ch {
            'o' => Resolution::Overwrite,
            'd' => Resolution::Discard,
            _ => return false,
        };
        let editor = self.state.editor_mut();
        let Some(key) = editor.conflicts().next().map(|(key, _)| key) else {
            return false;
        };
        debug!(%key, ?resolution, "resolving conflict");
        if let Err(err) = editor.resolve_conflict(key, resolution) {
            self.report(err);
        }
        true
    }

    fn step_period(&mut self, forward: bool) {
        let Some(period) = self.state.grid.filter().period else {
            return;
        };
        let period = if forward { period.next() } else { period.prev() };
        self.state.grid.set_period(period);
        self.state.cursor.row = 0;
    }

    fn cycle_payment_method(&mut self) {
        let methods: Vec<i64> = self
            .state
            .payoff
            .editor()
            .reference()
            .payment_methods
            .iter()
            .map(|method| method.id)
            .collect();
        if methods.is_empty() {
            return;
        }
        let next = match self.state.payoff.payment_method() {
            Some(current) => methods
                .iter()
                .position(|id| *id == current)
                .map(|index| methods[(index + 1) % methods.len()])
                .unwrap_or(methods[0]),
            None => methods[0],
        };
        self.state.payoff.select_method(Some(next));
        self.state.payoff_row = 0;
    }

    fn open_cell_editor(&mut self) {
        let Some(key) = self.state.current_cell() else {
            return;
        };
        let Some(expense) = self.state.grid.record(key.id) else {
            return;
        };
        let input = cell_text(expense, key.field, self.state.grid.reference());
        self.state.mode = Mode::EditCell { key, input };
    }

    fn handle_edit(&mut self, key: CellKey, mut input: String, action: AppAction) -> Mode {
        match action {
            AppAction::Cancel => return Mode::Normal,
            AppAction::Backspace => {
                input.pop();
            }
            AppAction::Input(ch) => input.push(ch),
            AppAction::Submit => {
                let reference = self.state.grid.reference();
                match parse_cell_input(key.field, &input, reference) {
                    Ok(update) => {
                        if let Err(err) = self.state.grid.apply_edit(key.id, update) {
                            self.report(err);
                        }
                        return Mode::Normal;
                    }
                    Err(message) => self.state.notify(ToastLevel::Error, message),
                }
            }
            _ => {}
        }
        Mode::EditCell { key, input }
    }

    fn handle_search(&mut self, mut input: String, action: AppAction) -> Mode {
        match action {
            AppAction::Cancel | AppAction::Submit => return Mode::Normal,
            AppAction::Backspace => {
                input.pop();
            }
            AppAction::Input(ch) => input.push(ch),
            _ => return Mode::Search { input },
        }
        self.state.grid.set_search(input.clone());
        self.state.cursor.row = 0;
        Mode::Search { input }
    }

    fn handle_form(&mut self, mut form: FormDialog, action: AppAction) -> Mode {
        match action {
            AppAction::Cancel => return Mode::Normal,
            AppAction::NextField | AppAction::Down => form.next_field(),
            AppAction::PrevField | AppAction::Up => form.prev_field(),
            AppAction::Backspace => form.backspace(),
            AppAction::Input(ch) => form.push(ch),
            AppAction::Submit => match self.submit_form(&form) {
                Ok(()) => return Mode::Normal,
                Err(message) => form.error = Some(message),
            },
            _ => {}
        }
        Mode::Form(form)
    }

    fn submit_form(&mut self, form: &FormDialog) -> std::result::Result<(), String> {
        let reference = self.state.grid.reference();
        match form.kind {
            FormKind::Bulk => {
                let bulk = form.to_bulk_form(reference)?;
                self.state
                    .grid
                    .bulk_update(&bulk)
                    .map_err(|err| err.to_string())
            }
            FormKind::Draft => {
                let draft = form.to_draft(reference)?;
                *self.state.grid.draft_mut() = draft;
                match self.state.grid.commit_draft() {
                    Some(_) => Ok(()),
                    None => Err("Type a description, an amount or a date".to_string()),
                }
            }
        }
    }

    fn report(&mut self, err: EngineError) {
        debug!("rejected: {err}");
        self.state.notify(ToastLevel::Error, err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use engine::CellStatus;

    use super::*;
    use crate::config::Source;

    async fn january() -> App {
        let config = AppConfig {
            source: Source::Memory,
            period: Some("2026-01".to_string()),
            ..Default::default()
        };
        let mut app = App::new(config).unwrap();
        app.open().await.unwrap();
        app.state.grid.settle().await;
        app.state.payoff.settle().await;
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_action(AppAction::Input(ch));
        }
    }

    fn backend(app: &App) -> engine::MemoryService {
        match app.state.grid.service() {
            Backend::Memory(service) => service.clone(),
            Backend::Http(_) => unreachable!("tests run on sample data"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn editing_a_cell_saves_the_normalized_amount() {
        let mut app = january().await;
        let row = app
            .state
            .grid
            .visible()
            .iter()
            .position(|e| e.id == 4)
            .unwrap();
        app.state.cursor = state::Cursor { row, column: 2 };

        app.handle_action(AppAction::Submit);
        assert!(matches!(app.state.mode, Mode::EditCell { ref input, .. } if input == "45.00"));
        for _ in 0..5 {
            app.handle_action(AppAction::Backspace);
        }
        type_text(&mut app, "45-");
        app.handle_action(AppAction::Submit);

        let key = CellKey::new(4, Field::Amount);
        assert!(matches!(app.state.mode, Mode::Normal));
        assert_eq!(app.state.grid.cell_status(key), CellStatus::Dirty);

        app.state.grid.settle().await;
        assert_eq!(app.state.grid.cell_status(key), CellStatus::Clean);
        assert_eq!(backend(&app).peek(4).await.unwrap().amount_minor, -4500);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_keeps_the_edit_line_open() {
        let mut app = january().await;
        app.state.cursor = state::Cursor { row: 0, column: 0 };
        app.handle_action(AppAction::Submit);
        app.handle_action(AppAction::Input('x'));
        app.handle_action(AppAction::Submit);

        assert!(matches!(app.state.mode, Mode::EditCell { .. }));
        assert_eq!(
            app.state.toast.as_ref().map(|toast| toast.level),
            Some(ToastLevel::Error)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn period_keys_step_months() {
        let mut app = january().await;
        app.handle_action(AppAction::Input('['));
        app.state.grid.settle().await;

        let ids: Vec<i64> = app.state.grid.records().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![14]);
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_dialog_needs_a_selection() {
        let mut app = january().await;
        app.handle_action(AppAction::Input('b'));
        assert!(matches!(app.state.mode, Mode::Normal));

        app.handle_action(AppAction::Input(' '));
        app.handle_action(AppAction::Input('b'));
        assert!(matches!(app.state.mode, Mode::Form(ref form) if form.kind == FormKind::Bulk));

        app.handle_action(AppAction::Submit);
        let Mode::Form(form) = &app.state.mode else {
            panic!("dialog closed on an empty patch");
        };
        assert!(form.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn payoff_marks_unexcluded_rows_as_paid() {
        let mut app = january().await;
        app.handle_action(AppAction::Input('p'));
        app.state.payoff.settle().await;
        assert_eq!(app.state.screen, Screen::Payoff);
        assert_eq!(app.state.payoff.editor().records().len(), 10);

        app.handle_action(AppAction::Input('e'));
        let excluded = app.state.current_id().unwrap();
        app.handle_action(AppAction::Input('m'));
        app.state.payoff.settle().await;
        app.state.pump();

        let remaining: Vec<i64> = app
            .state
            .payoff
            .editor()
            .records()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(remaining, vec![excluded]);
        assert_eq!(
            app.state.toast.as_ref().map(|toast| toast.level),
            Some(ToastLevel::Success)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn payoff_with_every_row_excluded_only_informs() {
        let mut app = january().await;
        app.handle_action(AppAction::Input('p'));
        app.state.payoff.settle().await;
        let ids: Vec<i64> = app
            .state
            .payoff
            .editor()
            .records()
            .iter()
            .map(|e| e.id)
            .collect();
        for id in ids {
            app.state.payoff.toggle_excluded(id);
        }

        app.handle_action(AppAction::Input('m'));
        app.state.pump();

        let toast = app.state.toast.as_ref().unwrap();
        assert_eq!(toast.level, ToastLevel::Info);
        assert_eq!(toast.message, "Nothing to mark as paid");
    }

    #[tokio::test(start_paused = true)]
    async fn quit_key_stops_the_loop() {
        let mut app = january().await;
        app.handle_action(AppAction::Input('q'));
        assert!(app.should_quit());
    }
}
