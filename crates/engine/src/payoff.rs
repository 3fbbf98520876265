//! Credit card payoff: unpaid expenses of one payment method, with rows that
//! can be left out of the payment.
use std::{collections::BTreeSet, fmt};

use api_types::expense::{FieldUpdate, FieldValue};
use chrono::NaiveDate;
use tracing::info;

use crate::{
    Editor, EditorEvent, EngineError, ExpenseFilter, ExpenseService, Handled, MoneyCents,
    service::ServiceResult,
};

/// Outcome of the last `mark_as_paid`, shown once by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayoffNotice {
    NothingToPay,
    MarkedPaid(usize),
}

impl fmt::Display for PayoffNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToPay => f.write_str("Nothing to mark as paid"),
            Self::MarkedPaid(count) => write!(f, "Marked {count} expense(s) as paid"),
        }
    }
}

pub struct PayoffView<S> {
    editor: Editor<S>,
    excluded: BTreeSet<i64>,
    notice: Option<PayoffNotice>,
}

impl<S> PayoffView<S>
where
    S: ExpenseService + Clone,
{
    pub fn new(editor: Editor<S>) -> Self {
        Self {
            editor,
            excluded: BTreeSet::new(),
            notice: None,
        }
    }

    /// Loads reference data and starts loading the default payment method,
    /// "Discover" when it exists.
    pub async fn open(&mut self) -> ServiceResult<()> {
        self.editor.load_reference().await?;
        let method = self.editor.reference().default_payoff_method();
        self.select_method(method);
        Ok(())
    }

    pub fn editor(&self) -> &Editor<S> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor<S> {
        &mut self.editor
    }

    pub fn payment_method(&self) -> Option<i64> {
        self.editor.filter().payment_method
    }

    pub fn select_method(&mut self, payment_method: Option<i64>) {
        let filter = match payment_method {
            Some(id) => ExpenseFilter::unpaid_for_method(id),
            None => ExpenseFilter {
                unpaid_only: true,
                ..Default::default()
            },
        };
        self.editor.set_filter(filter);
    }

    pub fn is_excluded(&self, id: i64) -> bool {
        self.excluded.contains(&id)
    }

    pub fn toggle_excluded(&mut self, id: i64) {
        if !self.excluded.remove(&id) {
            self.excluded.insert(id);
        }
    }

    /// Sum over the rows that will be paid, read from current data.
    pub fn amount_owed(&self) -> MoneyCents {
        self.editor
            .records()
            .iter()
            .filter(|e| !self.excluded.contains(&e.id))
            .map(|e| MoneyCents::new(e.amount_minor))
            .sum()
    }

    pub fn notice(&self) -> Option<PayoffNotice> {
        self.notice
    }

    /// Hands the notice over to the caller, who shows it once.
    pub fn take_notice(&mut self) -> Option<PayoffNotice> {
        self.notice.take()
    }

    /// Sets the paid date of every row that is not excluded, through the
    /// regular cell edit path, then schedules a reload. Returns the number of
    /// rows marked.
    pub fn mark_as_paid(&mut self, today: NaiveDate) -> Result<usize, EngineError> {
        let ids: Vec<i64> = self
            .editor
            .records()
            .iter()
            .map(|e| e.id)
            .filter(|id| !self.excluded.contains(id))
            .collect();
        if ids.is_empty() {
            self.notice = Some(PayoffNotice::NothingToPay);
            return Ok(0);
        }

        for id in &ids {
            self.editor
                .apply_edit(*id, FieldUpdate::Set(FieldValue::DatePaid(today)))?;
        }
        info!(count = ids.len(), %today, "marked as paid");
        self.notice = Some(PayoffNotice::MarkedPaid(ids.len()));
        self.editor.schedule_reload();
        Ok(ids.len())
    }

    pub fn handle(&mut self, event: EditorEvent) -> Handled {
        let handled = self.editor.handle(event);
        if handled == Handled::Reloaded {
            self.excluded.clear();
        }
        handled
    }

    pub fn process_ready(&mut self) -> Vec<Handled> {
        let handled = self.editor.process_ready();
        if handled.contains(&Handled::Reloaded) {
            self.excluded.clear();
        }
        handled
    }

    pub async fn settle(&mut self) -> Vec<Handled> {
        let mut handled = Vec::new();
        while !self.editor.is_idle() {
            match self.editor.next_event().await {
                Some(event) => handled.push(self.handle(event)),
                None => break,
            }
        }
        handled
    }
}
