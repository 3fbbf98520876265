//! Optimistic cell edits, the debounced persistence queue, conflicts and undo.
use api_types::expense::{Expense, FieldUpdate, FieldValue};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{Editor, EditorEvent, Handled};
use crate::{
    CellKey, EngineError, ExpenseService, ServiceError, expense::apply_update,
    money::normalize_amount_input, service::ServiceResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EditState {
    /// Debounce timer running.
    Waiting,
    /// Quiet period over; waiting for the record's in-flight call or for the
    /// record to get a server id.
    Ready,
    InFlight,
    /// Rejected by the service. Kept so the local value survives record
    /// refreshes.
    Failed,
}

#[derive(Clone, Debug)]
pub(super) struct PendingEdit {
    pub(super) update: FieldUpdate,
    pub(super) seq: u64,
    pub(super) generation: u64,
    pub(super) state: EditState,
    /// Last version of the record seen by the editor. Used when the record
    /// has left the current view before the save went out.
    pub(super) modified_at: Option<DateTime<Utc>>,
}

/// A save rejected because someone else changed the record first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConflict {
    /// The update that was rejected.
    pub attempted: FieldUpdate,
    /// The server's record at the time of the rejection.
    pub current: Expense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Resend the rejected update against the server's current version.
    Overwrite,
    /// Drop the local edit and take the server's record.
    Discard,
}

impl<S> Editor<S>
where
    S: ExpenseService + Clone,
{
    /// Applies `update` to record `id` immediately and queues its save.
    ///
    /// Saves are debounced per cell: edits of the same cell within the quiet
    /// period produce one call carrying the last value.
    pub fn apply_edit(&mut self, id: i64, update: FieldUpdate) -> Result<(), EngineError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))?;
        let mut edited = self.records[index].clone();
        apply_update(&mut edited, &update)?;

        self.snapshot();
        let modified_at = edited.modified_at;
        self.records[index] = edited;

        let key = CellKey::new(id, update.field());
        self.cells.mark_dirty(key);
        self.conflicts.remove(&key);
        self.enqueue(key, update, modified_at);
        Ok(())
    }

    /// Parses raw amount input and applies it to record `id`.
    pub fn edit_amount(&mut self, id: i64, input: &str) -> Result<(), EngineError> {
        let amount = normalize_amount_input(input);
        self.apply_edit(id, FieldUpdate::Set(FieldValue::Amount(amount.cents())))
    }

    /// Restores the record list saved before the latest mutation.
    ///
    /// Saves already queued still go out, but their results are discarded
    /// since they belong to an older generation.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        self.records = snapshot;
        self.generation += 1;

        let failed: Vec<CellKey> = self
            .edits
            .iter()
            .filter(|(_, edit)| edit.state == EditState::Failed)
            .map(|(key, _)| *key)
            .collect();
        for key in failed {
            self.edits.remove(&key);
            self.cells.clear(key);
        }
        debug!(generation = self.generation, "undo applied");
        true
    }

    pub fn conflicts(&self) -> impl Iterator<Item = (CellKey, &PendingConflict)> {
        self.conflicts.iter().map(|(key, conflict)| (*key, conflict))
    }

    pub fn conflict(&self, key: CellKey) -> Option<&PendingConflict> {
        self.conflicts.get(&key)
    }

    pub fn resolve_conflict(
        &mut self,
        key: CellKey,
        resolution: Resolution,
    ) -> Result<(), EngineError> {
        let conflict = self
            .conflicts
            .remove(&key)
            .ok_or_else(|| EngineError::NoConflict(key.to_string()))?;

        match resolution {
            Resolution::Overwrite => {
                if let Some(index) = self.index_of(key.id) {
                    self.records[index].modified_at = conflict.current.modified_at;
                    if let Err(err) = apply_update(&mut self.records[index], &conflict.attempted)
                    {
                        warn!(%key, "attempted value no longer applies: {err}");
                    }
                }
                self.cells.mark_dirty(key);
                self.edit_seq += 1;
                self.edits.insert(
                    key,
                    PendingEdit {
                        update: conflict.attempted,
                        seq: self.edit_seq,
                        generation: self.generation,
                        state: EditState::Ready,
                        modified_at: conflict.current.modified_at,
                    },
                );
                info!(%key, "overwriting concurrent change");
                self.dispatch(key.id);
            }
            Resolution::Discard => {
                self.edits.remove(&key);
                self.cells.clear(key);
                if let Some(index) = self.index_of(key.id) {
                    self.records[index] = conflict.current;
                    self.overlay_pending(key.id);
                }
                info!(%key, "discarded local change");
            }
        }
        Ok(())
    }

    pub(super) fn enqueue(
        &mut self,
        key: CellKey,
        update: FieldUpdate,
        modified_at: Option<DateTime<Utc>>,
    ) {
        self.edit_seq += 1;
        let seq = self.edit_seq;
        self.edits.insert(
            key,
            PendingEdit {
                update,
                seq,
                generation: self.generation,
                state: EditState::Waiting,
                modified_at,
            },
        );

        let quiet = self.options.edit_quiet_period;
        self.spawn(async move {
            tokio::time::sleep(quiet).await;
            EditorEvent::FlushDue { key, seq }
        });
    }

    pub(super) fn on_flush_due(&mut self, key: CellKey, seq: u64) -> Handled {
        let key = match self.remapped.get(&key.id) {
            Some(id) => CellKey::new(*id, key.field),
            None => key,
        };
        match self.edits.get_mut(&key) {
            Some(edit) if edit.seq == seq && edit.state == EditState::Waiting => {
                edit.state = EditState::Ready;
            }
            _ => return Handled::Ignored,
        }
        self.dispatch(key.id);
        Handled::Changed
    }

    /// Sends the next ready edit of record `id` unless a call for it is in
    /// flight. One call per record at a time keeps `modified_at` fresh
    /// between consecutive saves of different cells. The record does not
    /// have to be in the current view.
    pub(super) fn dispatch(&mut self, id: i64) {
        if id < 0 || self.in_flight.contains(&id) {
            return;
        }
        let held = self.record(id).map(|e| e.modified_at);
        let Some((key, edit)) = self
            .edits
            .iter_mut()
            .find(|(key, edit)| key.id == id && edit.state == EditState::Ready)
        else {
            return;
        };

        edit.state = EditState::InFlight;
        let key = *key;
        let seq = edit.seq;
        let generation = edit.generation;
        let update = edit.update.clone();
        let expected_modified_at = held.unwrap_or(edit.modified_at);
        self.in_flight.insert(id);

        let service = self.service.clone();
        debug!(%key, seq, "saving cell");
        self.spawn(async move {
            let result = service
                .update(id, std::slice::from_ref(&update), expected_modified_at)
                .await;
            EditorEvent::Persisted {
                key,
                seq,
                generation,
                update,
                result,
            }
        });
    }

    pub(super) fn on_persisted(
        &mut self,
        key: CellKey,
        seq: u64,
        generation: u64,
        update: FieldUpdate,
        result: ServiceResult<Expense>,
    ) -> Handled {
        self.in_flight.remove(&key.id);
        let latest = self.edits.get(&key).is_some_and(|edit| edit.seq == seq);

        let handled = if generation != self.generation {
            warn!(%key, "save finished after undo, result dropped");
            if latest {
                self.edits.remove(&key);
                self.cells.clear(key);
            }
            Handled::Ignored
        } else {
            match result {
                Ok(saved) => {
                    if latest {
                        self.edits.remove(&key);
                        self.cells.clear(key);
                    }
                    for (_, edit) in self.edits.iter_mut().filter(|(k, _)| k.id == key.id) {
                        edit.modified_at = saved.modified_at;
                    }
                    if let Some(index) = self.index_of(key.id) {
                        self.records[index] = saved;
                        self.overlay_pending(key.id);
                    }
                    Handled::Changed
                }
                Err(ServiceError::Conflict(current)) if latest => {
                    warn!(%key, "save rejected, record changed remotely");
                    self.edits.remove(&key);
                    self.conflicts.insert(
                        key,
                        PendingConflict {
                            attempted: update,
                            current: *current,
                        },
                    );
                    Handled::Changed
                }
                Err(err) if latest => {
                    warn!(%key, "save failed: {err}");
                    if let Some(edit) = self.edits.get_mut(&key) {
                        edit.state = EditState::Failed;
                    }
                    self.cells.mark_error(key, err.to_string());
                    Handled::Changed
                }
                // A newer edit of the cell is queued and will be judged on
                // its own.
                Err(_) => Handled::Ignored,
            }
        };

        self.dispatch(key.id);
        handled
    }
}
