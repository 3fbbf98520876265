use std::time::{Duration, Instant};

use api_types::expense::Field;
use chrono_tz::Tz;
use engine::{CellKey, Editor, Handled, PayoffNotice, PayoffView};

use super::form::FormDialog;
use crate::client::Backend;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Grid,
    Payoff,
}

#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    /// Edit line open on one cell.
    EditCell { key: CellKey, input: String },
    Search { input: String },
    Form(FormDialog),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

/// Row and column of the highlighted grid cell, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub column: usize,
}

impl Cursor {
    pub fn field(self) -> Field {
        Field::ALL[self.column.min(Field::ALL.len() - 1)]
    }
}

pub struct AppState {
    pub screen: Screen,
    pub mode: Mode,
    pub grid: Editor<Backend>,
    pub payoff: PayoffView<Backend>,
    pub cursor: Cursor,
    pub payoff_row: usize,
    pub toast: Option<ToastState>,
    pub source: &'static str,
    pub timezone: Tz,
}

impl AppState {
    pub fn new(
        grid: Editor<Backend>,
        payoff: PayoffView<Backend>,
        source: &'static str,
        timezone: Tz,
    ) -> Self {
        Self {
            screen: Screen::Grid,
            mode: Mode::Normal,
            grid,
            payoff,
            cursor: Cursor::default(),
            payoff_row: 0,
            toast: None,
            source,
            timezone,
        }
    }

    /// Editor behind the active screen.
    pub fn editor(&self) -> &Editor<Backend> {
        match self.screen {
            Screen::Grid => &self.grid,
            Screen::Payoff => self.payoff.editor(),
        }
    }

    pub fn editor_mut(&mut self) -> &mut Editor<Backend> {
        match self.screen {
            Screen::Grid => &mut self.grid,
            Screen::Payoff => self.payoff.editor_mut(),
        }
    }

    /// Id of the row under the cursor of the active screen.
    pub fn current_id(&self) -> Option<i64> {
        let row = match self.screen {
            Screen::Grid => self.cursor.row,
            Screen::Payoff => self.payoff_row,
        };
        self.editor().visible().get(row).map(|expense| expense.id)
    }

    pub fn current_cell(&self) -> Option<CellKey> {
        self.current_id()
            .map(|id| CellKey::new(id, self.cursor.field()))
    }

    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// Feeds queued editor events and housekeeping. Called once per tick.
    pub fn pump(&mut self) {
        let grid = self.grid.process_ready();
        let payoff = self.payoff.process_ready();
        if grid.contains(&Handled::Reloaded) || payoff.contains(&Handled::Reloaded) {
            self.clamp_cursors();
        }

        if let Some(notice) = self.payoff.take_notice() {
            let level = match notice {
                PayoffNotice::NothingToPay => ToastLevel::Info,
                PayoffNotice::MarkedPaid(_) => ToastLevel::Success,
            };
            self.notify(level, notice.to_string());
        }
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= Instant::now())
        {
            self.toast = None;
        }
    }

    pub fn clamp_cursors(&mut self) {
        let rows = self.grid.records().len();
        self.cursor.row = self.cursor.row.min(rows.saturating_sub(1));
        let rows = self.payoff.editor().records().len();
        self.payoff_row = self.payoff_row.min(rows.saturating_sub(1));
    }
}
