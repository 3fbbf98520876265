//! The inline grid editor.
//!
//! [`Editor`] owns the record list of the current view and every piece of
//! client state around it: cell status, undo snapshots, selection, sort,
//! draft row and pending conflicts. Mutations are synchronous and optimistic.
//! Remote calls and timers run as tokio tasks that post an [`EditorEvent`]
//! back to the editor, which the owner feeds to [`Editor::handle`]. Nothing
//! but the owner touches the state, so mutations never interleave.
use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
    time::Duration,
};

use api_types::expense::{Expense, Field, FieldUpdate};
use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::{
    CellKey, CellStatus, DraftRow, ExpenseFilter, ExpenseService, MoneyCents, Period,
    ReferenceData, ServiceError, SortState,
    cells::CellTracker,
    expense::apply_update,
    selection::Selection,
    service::ServiceResult,
    sort::sorted_indices,
    undo::{DEFAULT_UNDO_DEPTH, UndoStack},
};

mod bulk;
mod queue;

pub use queue::{PendingConflict, Resolution};

/// Timing and history knobs of the editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorOptions {
    /// Quiet period after the last edit of a cell before it is saved.
    pub edit_quiet_period: Duration,
    /// Quiet period after the last search keystroke before reloading.
    pub search_quiet_period: Duration,
    /// Delay of reloads scheduled after a batch of writes.
    pub reload_delay: Duration,
    pub undo_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            edit_quiet_period: Duration::from_millis(500),
            search_quiet_period: Duration::from_millis(1000),
            reload_delay: Duration::from_millis(1000),
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

/// Completion of a timer or a remote call started by the editor.
#[derive(Debug)]
pub enum EditorEvent {
    SearchSettled {
        seq: u64,
    },
    Loaded {
        seq: u64,
        result: ServiceResult<Vec<Expense>>,
    },
    FlushDue {
        key: CellKey,
        seq: u64,
    },
    Persisted {
        key: CellKey,
        seq: u64,
        generation: u64,
        update: FieldUpdate,
        result: ServiceResult<Expense>,
    },
    Created {
        temp_id: i64,
        result: ServiceResult<Expense>,
    },
    Deleted {
        ids: Vec<i64>,
        result: ServiceResult<()>,
    },
    BulkUpdated {
        ids: Vec<i64>,
        fields: Vec<Field>,
        result: ServiceResult<()>,
    },
    ReloadDue,
}

/// What handling an event did to the visible state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handled {
    /// A load replaced the record list.
    Reloaded,
    Changed,
    /// Stale or superseded; nothing changed.
    Ignored,
}

pub struct Editor<S> {
    service: S,
    options: EditorOptions,
    events_tx: UnboundedSender<EditorEvent>,
    events_rx: UnboundedReceiver<EditorEvent>,
    /// Spawned tasks whose event has not been handled yet.
    outstanding: usize,

    filter: ExpenseFilter,
    reference: ReferenceData,
    records: Vec<Expense>,
    cells: CellTracker,
    undo: UndoStack<Vec<Expense>>,
    generation: u64,
    selection: Selection,
    sort: SortState,
    draft: DraftRow,
    next_temp_id: i64,
    /// Temp ids already replaced by a server id.
    remapped: BTreeMap<i64, i64>,

    edits: BTreeMap<CellKey, queue::PendingEdit>,
    edit_seq: u64,
    /// Records with an update call in flight.
    in_flight: BTreeSet<i64>,
    conflicts: BTreeMap<CellKey, PendingConflict>,

    load_seq: u64,
    loading: bool,
    search_seq: u64,
    page_error: Option<String>,
}

impl<S> Editor<S>
where
    S: ExpenseService + Clone,
{
    /// Return a builder for `Editor`.
    pub fn builder(service: S) -> EditorBuilder<S> {
        EditorBuilder {
            service,
            options: EditorOptions::default(),
            filter: ExpenseFilter::default(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Loads categories and payment methods. Awaited directly since it runs
    /// once before the first render.
    pub async fn load_reference(&mut self) -> ServiceResult<()> {
        let categories = self.service.list_categories().await?;
        let payment_methods = self.service.list_payment_methods().await?;
        self.reference = ReferenceData {
            categories,
            payment_methods,
        };
        Ok(())
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    /// Records in load order.
    pub fn records(&self) -> &[Expense] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&Expense> {
        self.records.iter().find(|e| e.id == id)
    }

    /// Records in display order.
    pub fn visible(&self) -> Vec<&Expense> {
        sorted_indices(&self.records, &self.sort, &self.reference)
            .into_iter()
            .map(|index| &self.records[index])
            .collect()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn toggle_sort(&mut self, field: Field) {
        self.sort.toggle(field);
    }

    pub fn cell_status(&self, key: CellKey) -> CellStatus {
        self.cells.status(key)
    }

    pub fn cell_error(&self, key: CellKey) -> Option<&str> {
        self.cells.error(key)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_selected(&mut self, id: i64) {
        self.selection.toggle(id);
    }

    pub fn toggle_select_all(&mut self) {
        let visible: Vec<i64> = self.records.iter().map(|e| e.id).collect();
        self.selection.toggle_all(visible);
    }

    pub fn selected_total(&self) -> MoneyCents {
        self.selection.total(&self.records)
    }

    pub fn page_error(&self) -> Option<&str> {
        self.page_error.as_deref()
    }

    pub fn dismiss_page_error(&mut self) {
        self.page_error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns `true` when no timer or remote call is outstanding.
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    pub fn set_filter(&mut self, filter: ExpenseFilter) {
        self.filter = filter;
        self.load();
    }

    pub fn set_period(&mut self, period: Period) {
        self.filter.period = Some(period);
        self.load();
    }

    pub fn set_payment_method(&mut self, payment_method: Option<i64>) {
        self.filter.payment_method = payment_method;
        self.load();
    }

    pub fn set_unpaid_only(&mut self, unpaid_only: bool) {
        self.filter.unpaid_only = unpaid_only;
        self.load();
    }

    /// Updates the search term. The load starts once the term has been stable
    /// for the search quiet period.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.search_seq += 1;
        let seq = self.search_seq;
        let quiet = self.options.search_quiet_period;
        self.spawn(async move {
            tokio::time::sleep(quiet).await;
            EditorEvent::SearchSettled { seq }
        });
    }

    /// Starts a load with the current filter. Responses of earlier loads are
    /// discarded once this one is issued.
    pub fn load(&mut self) {
        self.load_seq += 1;
        self.loading = true;
        let seq = self.load_seq;
        let service = self.service.clone();
        let filter = self.filter.clone();
        debug!(seq, ?filter, "loading expenses");
        self.spawn(async move {
            let result = service.list(&filter).await;
            EditorEvent::Loaded { seq, result }
        });
    }

    /// Starts a load after the reload delay.
    pub fn schedule_reload(&mut self) {
        let delay = self.options.reload_delay;
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            EditorEvent::ReloadDue
        });
    }

    /// Waits for the next event. Never returns `None` while the editor is
    /// alive since it keeps a sender.
    pub async fn next_event(&mut self) -> Option<EditorEvent> {
        self.events_rx.recv().await
    }

    /// Handles every event that is already queued, without waiting.
    pub fn process_ready(&mut self) -> Vec<Handled> {
        let mut handled = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            handled.push(self.handle(event));
        }
        handled
    }

    /// Handles events until no timer or call is outstanding.
    pub async fn settle(&mut self) -> Vec<Handled> {
        let mut handled = Vec::new();
        while self.outstanding > 0 {
            match self.next_event().await {
                Some(event) => handled.push(self.handle(event)),
                None => break,
            }
        }
        handled
    }

    pub fn handle(&mut self, event: EditorEvent) -> Handled {
        self.outstanding = self.outstanding.saturating_sub(1);
        match event {
            EditorEvent::SearchSettled { seq } => {
                if seq != self.search_seq {
                    return Handled::Ignored;
                }
                self.load();
                Handled::Changed
            }
            EditorEvent::Loaded { seq, result } => self.on_loaded(seq, result),
            EditorEvent::FlushDue { key, seq } => self.on_flush_due(key, seq),
            EditorEvent::Persisted {
                key,
                seq,
                generation,
                update,
                result,
            } => self.on_persisted(key, seq, generation, update, result),
            EditorEvent::Created { temp_id, result } => self.on_created(temp_id, result),
            EditorEvent::Deleted { ids, result } => self.on_deleted(ids, result),
            EditorEvent::BulkUpdated {
                ids,
                fields,
                result,
            } => self.on_bulk_updated(ids, fields, result),
            EditorEvent::ReloadDue => {
                self.load();
                Handled::Changed
            }
        }
    }

    fn on_loaded(&mut self, seq: u64, result: ServiceResult<Vec<Expense>>) -> Handled {
        if seq != self.load_seq {
            debug!(seq, latest = self.load_seq, "dropping superseded load");
            return Handled::Ignored;
        }
        self.loading = false;

        let mut loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!("load failed: {err}");
                self.page_error = Some(format!("Could not load expenses: {err}"));
                return Handled::Changed;
            }
        };

        // Drafts waiting for their create call are not on the server yet.
        loaded.extend(self.records.drain(..).filter(|e| e.id < 0));
        self.records = loaded;

        // Rejected values stay, with their error, while their row is shown.
        // Only a new edit or undo clears them.
        let present: BTreeSet<i64> = self.records.iter().map(|e| e.id).collect();
        self.edits.retain(|key, edit| {
            edit.state != queue::EditState::Failed || present.contains(&key.id)
        });
        self.conflicts.retain(|key, _| present.contains(&key.id));

        let failed: Vec<(CellKey, String)> = self
            .edits
            .iter()
            .filter(|(_, edit)| edit.state == queue::EditState::Failed)
            .map(|(key, _)| (*key, self.cells.error(*key).unwrap_or_default().to_string()))
            .collect();
        self.cells.clear_all();
        let pending: Vec<CellKey> = self
            .edits
            .keys()
            .chain(self.conflicts.keys())
            .copied()
            .collect();
        for key in pending {
            self.cells.mark_dirty(key);
        }
        for (key, message) in failed {
            self.cells.mark_error(key, message);
        }
        let ids: BTreeSet<i64> = self.edits.keys().map(|key| key.id).collect();
        for id in ids {
            self.overlay_pending(id);
        }

        self.selection.clear();
        self.undo.clear();
        Handled::Reloaded
    }

    /// Re-applies unacknowledged local values of record `id` on top of the
    /// copy currently held.
    fn overlay_pending(&mut self, id: i64) {
        let generation = self.generation;
        let Some(index) = self.index_of(id) else {
            return;
        };
        for (key, edit) in &self.edits {
            if key.id == id && edit.generation == generation {
                if let Err(err) = apply_update(&mut self.records[index], &edit.update) {
                    warn!(id, "pending value no longer applies: {err}");
                }
            }
        }
    }

    fn index_of(&self, id: i64) -> Option<usize> {
        self.records.iter().position(|e| e.id == id)
    }

    fn snapshot(&mut self) {
        self.undo.push(self.records.clone());
    }

    fn default_date(&self) -> NaiveDate {
        self.filter
            .period
            .unwrap_or_else(|| Period::containing(Utc::now().date_naive()))
            .first_day()
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = EditorEvent> + Send + 'static,
    {
        self.outstanding += 1;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = task.await;
            // The receiver is gone only when the editor was dropped.
            let _ = events.send(event);
        });
    }

    fn report(&mut self, context: &str, err: &ServiceError) {
        warn!("{context}: {err}");
        self.page_error = Some(format!("{context}: {err}"));
    }
}

pub struct EditorBuilder<S> {
    service: S,
    options: EditorOptions,
    filter: ExpenseFilter,
}

impl<S> EditorBuilder<S>
where
    S: ExpenseService + Clone,
{
    pub fn options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn filter(mut self, filter: ExpenseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Construct `Editor`. No load is started.
    pub fn build(self) -> Editor<S> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let undo = UndoStack::new(self.options.undo_depth);
        Editor {
            service: self.service,
            options: self.options,
            events_tx,
            events_rx,
            outstanding: 0,
            filter: self.filter,
            reference: ReferenceData::default(),
            records: Vec::new(),
            cells: CellTracker::default(),
            undo,
            generation: 0,
            selection: Selection::default(),
            sort: SortState::default(),
            draft: DraftRow::default(),
            next_temp_id: -1,
            remapped: BTreeMap::new(),
            edits: BTreeMap::new(),
            edit_seq: 0,
            in_flight: BTreeSet::new(),
            conflicts: BTreeMap::new(),
            load_seq: 0,
            loading: false,
            search_seq: 0,
            page_error: None,
        }
    }
}
