//! Row level operations: deletes, bulk update and the draft row.
use api_types::expense::{Expense, Field};
use tracing::{debug, info};

use super::{Editor, EditorEvent, Handled, queue::EditState, queue::PendingEdit};
use crate::{
    BulkForm, CellKey, DraftRow, EngineError, ExpenseService, ServiceError,
    expense::apply_updates, service::ServiceResult,
};

impl<S> Editor<S>
where
    S: ExpenseService + Clone,
{
    /// Removes record `id` locally and deletes it remotely. A failed delete
    /// triggers a reload.
    pub fn delete(&mut self, id: i64) -> Result<(), EngineError> {
        if self.index_of(id).is_none() {
            return Err(EngineError::KeyNotFound(format!("expense {id}")));
        }
        self.forget(&[id]);
        if id < 0 {
            return Ok(());
        }

        let service = self.service.clone();
        self.spawn(async move {
            let result = service.delete(id).await;
            EditorEvent::Deleted {
                ids: vec![id],
                result,
            }
        });
        Ok(())
    }

    /// Deletes every selected record.
    pub fn bulk_delete(&mut self) -> Result<(), EngineError> {
        if self.selection.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        let ids = self.selection.ids();
        self.forget(&ids);
        self.selection.clear();

        let ids: Vec<i64> = ids.into_iter().filter(|id| *id >= 0).collect();
        if ids.is_empty() {
            return Ok(());
        }
        let service = self.service.clone();
        self.spawn(async move {
            let result = service.bulk_delete(&ids).await;
            EditorEvent::Deleted { ids, result }
        });
        Ok(())
    }

    /// Applies the bulk form to every selected record, locally at once and
    /// remotely in one call.
    pub fn bulk_update(&mut self, form: &BulkForm) -> Result<(), EngineError> {
        let changes = form.changes()?;
        if self.selection.is_empty() {
            return Err(EngineError::EmptySelection);
        }

        let mut records = self.records.clone();
        let mut ids = Vec::new();
        for record in records
            .iter_mut()
            .filter(|e| self.selection.contains(e.id))
        {
            apply_updates(record, &changes)?;
            ids.push(record.id);
        }
        if ids.is_empty() {
            return Err(EngineError::EmptySelection);
        }

        self.snapshot();
        self.records = records;

        let fields: Vec<Field> = changes.iter().map(|change| change.field()).collect();
        for id in &ids {
            for change in &changes {
                let key = CellKey::new(*id, change.field());
                self.cells.mark_dirty(key);
                self.conflicts.remove(&key);
                if *id < 0 {
                    // Sent with the server id once the create call returns.
                    self.edit_seq += 1;
                    self.edits.insert(
                        key,
                        PendingEdit {
                            update: change.clone(),
                            seq: self.edit_seq,
                            generation: self.generation,
                            state: EditState::Ready,
                            modified_at: None,
                        },
                    );
                } else {
                    self.edits.remove(&key);
                }
            }
        }

        let persisted: Vec<i64> = ids.into_iter().filter(|id| *id >= 0).collect();
        if persisted.is_empty() {
            self.selection.clear();
            return Ok(());
        }
        info!(count = persisted.len(), ?fields, "bulk update");
        let service = self.service.clone();
        self.spawn(async move {
            let result = service.bulk_update(&persisted, &changes).await;
            EditorEvent::BulkUpdated {
                ids: persisted,
                fields,
                result,
            }
        });
        Ok(())
    }

    pub fn draft(&self) -> &DraftRow {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftRow {
        &mut self.draft
    }

    /// Promotes the draft row to a record with a temp id and creates it
    /// remotely. Returns the temp id, or `None` when the draft is blank.
    pub fn commit_draft(&mut self) -> Option<i64> {
        if !self.draft.has_content() {
            return None;
        }
        let new = std::mem::take(&mut self.draft).into_new(self.default_date());
        let temp_id = self.next_temp_id;
        self.next_temp_id -= 1;

        self.snapshot();
        self.records.push(Expense {
            id: temp_id,
            date: new.date,
            description: new.description.clone(),
            amount_minor: new.amount_minor,
            category_id: new.category_id,
            payment_method_id: new.payment_method_id,
            date_paid: new.date_paid,
            created_at: None,
            modified_at: None,
        });

        let service = self.service.clone();
        debug!(temp_id, "creating expense");
        self.spawn(async move {
            let result = service.create(&new).await;
            EditorEvent::Created { temp_id, result }
        });
        Some(temp_id)
    }

    pub(super) fn on_created(&mut self, temp_id: i64, result: ServiceResult<Expense>) -> Handled {
        let created = match result {
            Ok(created) => created,
            Err(err) => {
                self.report("Could not save the new expense", &err);
                self.edits.retain(|key, _| key.id != temp_id);
                self.cells
                    .mark_error(CellKey::new(temp_id, Field::Description), err.to_string());
                return Handled::Changed;
            }
        };
        let id = created.id;

        let Some(index) = self.index_of(temp_id) else {
            // The row was deleted or undone before the server answered.
            info!(temp_id, id, "draft gone, deleting created expense");
            self.edits.retain(|key, _| key.id != temp_id);
            self.cells.clear_record(temp_id);
            for snapshot in self.undo.iter_mut() {
                snapshot.retain(|e| e.id != temp_id);
            }
            let service = self.service.clone();
            self.spawn(async move {
                let result = service.delete(id).await;
                EditorEvent::Deleted {
                    ids: vec![id],
                    result,
                }
            });
            return Handled::Ignored;
        };

        self.records[index] = created;
        self.remapped.insert(temp_id, id);
        self.cells.remap(temp_id, id);
        self.selection.remap(temp_id, id);
        let moved: Vec<CellKey> = self
            .edits
            .keys()
            .filter(|key| key.id == temp_id)
            .copied()
            .collect();
        for key in moved {
            if let Some(mut edit) = self.edits.remove(&key) {
                edit.modified_at = self.records[index].modified_at;
                self.edits.insert(CellKey::new(id, key.field), edit);
            }
        }
        for snapshot in self.undo.iter_mut() {
            for record in snapshot.iter_mut().filter(|e| e.id == temp_id) {
                record.id = id;
            }
        }
        self.overlay_pending(id);
        self.dispatch(id);
        Handled::Changed
    }

    pub(super) fn on_deleted(&mut self, ids: Vec<i64>, result: ServiceResult<()>) -> Handled {
        match result {
            Ok(()) | Err(ServiceError::NotFound(_)) => Handled::Ignored,
            Err(err) => {
                self.report(&format!("Could not delete {} expense(s)", ids.len()), &err);
                self.load();
                Handled::Changed
            }
        }
    }

    pub(super) fn on_bulk_updated(
        &mut self,
        ids: Vec<i64>,
        fields: Vec<Field>,
        result: ServiceResult<()>,
    ) -> Handled {
        match result {
            Ok(()) => {
                for id in &ids {
                    for field in &fields {
                        let key = CellKey::new(*id, *field);
                        if !self.edits.contains_key(&key) {
                            self.cells.clear(key);
                        }
                    }
                }
                self.selection.clear();
                self.load();
            }
            Err(err) => {
                self.report("Bulk update failed", &err);
                for id in &ids {
                    for field in &fields {
                        self.cells.mark_error(CellKey::new(*id, *field), err.to_string());
                    }
                }
            }
        }
        Handled::Changed
    }

    /// Drops every trace of `ids`, including undo snapshots: a deleted row
    /// must not come back through undo since it no longer exists remotely.
    fn forget(&mut self, ids: &[i64]) {
        self.records.retain(|e| !ids.contains(&e.id));
        for id in ids {
            self.selection.remove(*id);
            self.cells.clear_record(*id);
        }
        self.edits.retain(|key, _| !ids.contains(&key.id));
        self.conflicts.retain(|key, _| !ids.contains(&key.id));
        for snapshot in self.undo.iter_mut() {
            snapshot.retain(|e| !ids.contains(&e.id));
        }
    }
}
