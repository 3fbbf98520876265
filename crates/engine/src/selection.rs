use std::collections::BTreeSet;

use api_types::expense::Expense;

use crate::MoneyCents;

/// Ids of the rows picked for bulk actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<i64>,
}

impl Selection {
    pub fn toggle(&mut self, id: i64) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Selects every visible id, or clears the selection when all of them are
    /// already selected.
    pub fn toggle_all(&mut self, visible: impl IntoIterator<Item = i64>) {
        let visible: BTreeSet<i64> = visible.into_iter().collect();
        if !visible.is_empty() && visible.is_subset(&self.ids) {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn remove(&mut self, id: i64) {
        self.ids.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.ids.iter().copied().collect()
    }

    pub fn remap(&mut self, from: i64, to: i64) {
        if self.ids.remove(&from) {
            self.ids.insert(to);
        }
    }

    /// Sum of the selected amounts, read from `records` on every call.
    pub fn total(&self, records: &[Expense]) -> MoneyCents {
        records
            .iter()
            .filter(|e| self.ids.contains(&e.id))
            .map(|e| MoneyCents::new(e.amount_minor))
            .sum()
    }
}
