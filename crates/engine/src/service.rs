//! The collaborator contract of the editor: a CRUD data service for expenses
//! plus the reference lookups.
use std::future::Future;

use api_types::{
    expense::{Expense, ExpenseNew, FieldUpdate},
    reference::{Category, PaymentMethod},
};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{EngineError, ExpenseFilter};

/// Failures reported by an [`ExpenseService`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("\"{0}\" not found")]
    NotFound(String),
    /// The record changed since the client read it. Carries the server's
    /// current version.
    #[error("expense {} was modified by someone else", .0.id)]
    Conflict(Box<Expense>),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::KeyNotFound(key) => Self::NotFound(key),
            other => Self::Validation(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Remote expense collection.
///
/// Implemented by the in-memory fixture ([`MemoryService`](crate::MemoryService))
/// and by the HTTP client of the terminal front end. Futures must be `Send`
/// because the editor runs every call on its own task.
pub trait ExpenseService: Send + Sync + 'static {
    fn list(&self, filter: &ExpenseFilter)
    -> impl Future<Output = ServiceResult<Vec<Expense>>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = ServiceResult<Expense>> + Send;

    /// Applies `changes` when `expected_modified_at` still matches the stored
    /// record, otherwise fails with [`ServiceError::Conflict`].
    fn update(
        &self,
        id: i64,
        changes: &[FieldUpdate],
        expected_modified_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = ServiceResult<Expense>> + Send;

    fn create(&self, expense: &ExpenseNew) -> impl Future<Output = ServiceResult<Expense>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = ServiceResult<()>> + Send;

    fn bulk_update(
        &self,
        ids: &[i64],
        changes: &[FieldUpdate],
    ) -> impl Future<Output = ServiceResult<()>> + Send;

    fn bulk_delete(&self, ids: &[i64]) -> impl Future<Output = ServiceResult<()>> + Send;

    fn list_categories(&self) -> impl Future<Output = ServiceResult<Vec<Category>>> + Send;

    fn list_payment_methods(&self)
    -> impl Future<Output = ServiceResult<Vec<PaymentMethod>>> + Send;
}
