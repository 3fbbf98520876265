use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use api_types::expense::Field;

/// One editable cell of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub id: i64,
    pub field: Field,
}

impl CellKey {
    pub fn new(id: i64, field: Field) -> Self {
        Self { id, field }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id, self.field)
    }
}

/// Save state shown for a cell. An error wins over dirty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellStatus {
    #[default]
    Clean,
    Dirty,
    Error,
}

/// Dirty and error marks per cell.
#[derive(Clone, Debug, Default)]
pub struct CellTracker {
    dirty: BTreeSet<CellKey>,
    errors: BTreeMap<CellKey, String>,
}

impl CellTracker {
    /// Marks `key` as having an unsaved value. A fresh edit supersedes an
    /// earlier failure.
    pub fn mark_dirty(&mut self, key: CellKey) {
        self.errors.remove(&key);
        self.dirty.insert(key);
    }

    pub fn mark_error(&mut self, key: CellKey, message: impl Into<String>) {
        self.errors.insert(key, message.into());
    }

    pub fn clear(&mut self, key: CellKey) {
        self.dirty.remove(&key);
        self.errors.remove(&key);
    }

    pub fn clear_record(&mut self, id: i64) {
        self.dirty.retain(|key| key.id != id);
        self.errors.retain(|key, _| key.id != id);
    }

    pub fn clear_all(&mut self) {
        self.dirty.clear();
        self.errors.clear();
    }

    pub fn status(&self, key: CellKey) -> CellStatus {
        if self.errors.contains_key(&key) {
            CellStatus::Error
        } else if self.dirty.contains(&key) {
            CellStatus::Dirty
        } else {
            CellStatus::Clean
        }
    }

    pub fn error(&self, key: CellKey) -> Option<&str> {
        self.errors.get(&key).map(String::as_str)
    }

    pub fn is_dirty(&self, key: CellKey) -> bool {
        self.dirty.contains(&key)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Moves every mark of record `from` to record `to`.
    pub fn remap(&mut self, from: i64, to: i64) {
        let moved: Vec<CellKey> = self.dirty.iter().filter(|k| k.id == from).copied().collect();
        for key in moved {
            self.dirty.remove(&key);
            self.dirty.insert(CellKey::new(to, key.field));
        }
        let moved: Vec<(CellKey, String)> = self
            .errors
            .iter()
            .filter(|(k, _)| k.id == from)
            .map(|(k, m)| (*k, m.clone()))
            .collect();
        for (key, message) in moved {
            self.errors.remove(&key);
            self.errors.insert(CellKey::new(to, key.field), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_displays_as_id_and_field() {
        assert_eq!(CellKey::new(4, Field::Amount).to_string(), "4-amount");
        assert_eq!(CellKey::new(-1, Field::DatePaid).to_string(), "-1-date_paid");
    }

    #[test]
    fn error_takes_precedence_over_dirty() {
        let key = CellKey::new(1, Field::Description);
        let mut cells = CellTracker::default();
        cells.mark_dirty(key);
        assert_eq!(cells.status(key), CellStatus::Dirty);
        cells.mark_error(key, "offline");
        assert_eq!(cells.status(key), CellStatus::Error);

        cells.mark_dirty(key);
        assert_eq!(cells.status(key), CellStatus::Dirty);
        assert_eq!(cells.error(key), None);
    }

    #[test]
    fn remap_moves_marks_to_the_new_id() {
        let mut cells = CellTracker::default();
        cells.mark_dirty(CellKey::new(-1, Field::Amount));
        cells.mark_error(CellKey::new(-1, Field::Date), "bad date");
        cells.remap(-1, 15);
        assert_eq!(cells.status(CellKey::new(-1, Field::Amount)), CellStatus::Clean);
        assert_eq!(cells.status(CellKey::new(15, Field::Amount)), CellStatus::Dirty);
        assert_eq!(cells.status(CellKey::new(15, Field::Date)), CellStatus::Error);
    }
}
