//! Client side edit reconciliation for the expense grid.
//!
//! The [`Editor`] keeps a month of expenses in memory and applies edits
//! optimistically, saving them through an [`ExpenseService`] after a per-cell
//! quiet period. [`MemoryService`] implements the service in memory and backs
//! both the tests and the development server.
pub use bulk::BulkForm;
pub use cells::{CellKey, CellStatus};
pub use draft::DraftRow;
pub use editor::{
    Editor, EditorBuilder, EditorEvent, EditorOptions, Handled, PendingConflict, Resolution,
};
pub use error::EngineError;
pub use expense::{ExpenseFilter, apply_update, apply_updates};
pub use memory::{MemoryService, Operation, RecordedCall};
pub use money::{MoneyCents, normalize_amount_input};
pub use payoff::{PayoffNotice, PayoffView};
pub use period::Period;
pub use reference::ReferenceData;
pub use selection::Selection;
pub use service::{ExpenseService, ServiceError, ServiceResult};
pub use sort::{SortDirection, SortState, sorted_indices};

mod bulk;
mod cells;
mod draft;
mod editor;
mod error;
mod expense;
mod memory;
mod money;
mod payoff;
mod period;
mod reference;
mod selection;
mod service;
mod sort;
mod undo;
