//! In-memory implementation of [`ExpenseService`].
//!
//! Used for local development (the development server serves it over HTTP)
//! and as the test fixture of the editor. Every instance owns its own store,
//! so tests never share state. Behaviour that only a test needs, such as a
//! concurrent edit by another client or a failing call, is injected per
//! instance instead of being hard-coded.
use std::{collections::HashMap, sync::Arc, time::Duration};

use api_types::{
    expense::{Expense, ExpenseNew, FieldUpdate},
    reference::{Category, PaymentMethod},
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use crate::{
    ExpenseFilter, ExpenseService, ReferenceData, ServiceError,
    expense::apply_updates,
    service::ServiceResult,
};

/// Operations of the data service, used to target injected behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Update,
    Create,
    Delete,
    BulkUpdate,
    BulkDelete,
    Categories,
    PaymentMethods,
}

/// A call received by the fixture, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    List(ExpenseFilter),
    Get(i64),
    Update {
        id: i64,
        changes: Vec<FieldUpdate>,
        expected_modified_at: Option<DateTime<Utc>>,
    },
    Create(ExpenseNew),
    Delete(i64),
    BulkUpdate {
        ids: Vec<i64>,
        changes: Vec<FieldUpdate>,
    },
    BulkDelete(Vec<i64>),
}

#[derive(Debug)]
struct MemoryStore {
    expenses: Vec<Expense>,
    reference: ReferenceData,
    next_id: i64,
    clock: DateTime<Utc>,
    failures: HashMap<Operation, ServiceError>,
    delays: HashMap<Operation, Duration>,
    calls: Vec<RecordedCall>,
}

impl MemoryStore {
    fn new(expenses: Vec<Expense>, reference: ReferenceData) -> Self {
        let next_id = expenses.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            expenses,
            reference,
            next_id,
            clock: seed_clock(),
            failures: HashMap::new(),
            delays: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Advances the logical clock so every write gets a distinct timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += chrono::Duration::seconds(1);
        self.clock
    }

    fn position(&self, id: i64) -> ServiceResult<usize> {
        self.expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("expense {id}")))
    }
}

#[derive(Clone, Debug)]
pub struct MemoryService {
    store: Arc<Mutex<MemoryStore>>,
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new(Vec::new(), ReferenceData::default())
    }
}

impl MemoryService {
    pub fn new(expenses: Vec<Expense>, reference: ReferenceData) -> Self {
        Self {
            store: Arc::new(Mutex::new(MemoryStore::new(expenses, reference))),
        }
    }

    /// A store preloaded with the January 2026 sample month.
    pub fn seeded() -> Self {
        Self::new(seed_expenses(), seed_reference())
    }

    /// Makes the next call of `operation` fail with `error`.
    pub async fn fail_next(&self, operation: Operation, error: ServiceError) {
        self.store.lock().await.failures.insert(operation, error);
    }

    /// Makes the next call of `operation` answer only after `delay`.
    pub async fn delay_next(&self, operation: Operation, delay: Duration) {
        self.store.lock().await.delays.insert(operation, delay);
    }

    /// Applies `changes` as if another client had saved them, bumping
    /// `modified_at` so the next update based on the old version conflicts.
    pub async fn simulate_concurrent_edit(
        &self,
        id: i64,
        changes: &[FieldUpdate],
    ) -> ServiceResult<Expense> {
        let mut store = self.store.lock().await;
        let index = store.position(id)?;
        let mut expense = store.expenses[index].clone();
        apply_updates(&mut expense, changes)?;
        expense.modified_at = Some(store.tick());
        store.expenses[index] = expense.clone();
        Ok(expense)
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.store.lock().await.calls.clone()
    }

    /// Reads a stored expense without recording a call.
    pub async fn peek(&self, id: i64) -> Option<Expense> {
        let store = self.store.lock().await;
        store.expenses.iter().find(|e| e.id == id).cloned()
    }

    async fn begin(&self, operation: Operation, call: Option<RecordedCall>) -> ServiceResult<()> {
        let delay = {
            let mut store = self.store.lock().await;
            if let Some(call) = call {
                store.calls.push(call);
            }
            store.delays.remove(&operation)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store.lock().await;
        match store.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ExpenseService for MemoryService {
    async fn list(&self, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>> {
        self.begin(Operation::List, Some(RecordedCall::List(filter.clone())))
            .await?;
        let store = self.store.lock().await;
        Ok(store
            .expenses
            .iter()
            .filter(|e| filter.matches(e, &store.reference))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> ServiceResult<Expense> {
        self.begin(Operation::Get, Some(RecordedCall::Get(id))).await?;
        let store = self.store.lock().await;
        let index = store.position(id)?;
        Ok(store.expenses[index].clone())
    }

    async fn update(
        &self,
        id: i64,
        changes: &[FieldUpdate],
        expected_modified_at: Option<DateTime<Utc>>,
    ) -> ServiceResult<Expense> {
        let call = RecordedCall::Update {
            id,
            changes: changes.to_vec(),
            expected_modified_at,
        };
        self.begin(Operation::Update, Some(call)).await?;

        let mut store = self.store.lock().await;
        let index = store.position(id)?;
        let current = &store.expenses[index];
        if current.modified_at != expected_modified_at {
            return Err(ServiceError::Conflict(Box::new(current.clone())));
        }

        let mut expense = current.clone();
        apply_updates(&mut expense, changes)?;
        expense.modified_at = Some(store.tick());
        store.expenses[index] = expense.clone();
        Ok(expense)
    }

    async fn create(&self, new: &ExpenseNew) -> ServiceResult<Expense> {
        self.begin(Operation::Create, Some(RecordedCall::Create(new.clone())))
            .await?;

        let mut store = self.store.lock().await;
        let id = store.next_id;
        store.next_id += 1;
        let now = store.tick();
        let expense = Expense {
            id,
            date: new.date,
            description: new.description.clone(),
            amount_minor: new.amount_minor,
            category_id: new.category_id,
            payment_method_id: new.payment_method_id,
            date_paid: new.date_paid,
            created_at: Some(now),
            modified_at: Some(now),
        };
        store.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.begin(Operation::Delete, Some(RecordedCall::Delete(id)))
            .await?;
        let mut store = self.store.lock().await;
        let index = store.position(id)?;
        store.expenses.remove(index);
        Ok(())
    }

    async fn bulk_update(&self, ids: &[i64], changes: &[FieldUpdate]) -> ServiceResult<()> {
        let call = RecordedCall::BulkUpdate {
            ids: ids.to_vec(),
            changes: changes.to_vec(),
        };
        self.begin(Operation::BulkUpdate, Some(call)).await?;

        let mut store = self.store.lock().await;
        let now = store.tick();
        for expense in store.expenses.iter_mut().filter(|e| ids.contains(&e.id)) {
            apply_updates(expense, changes)?;
            expense.modified_at = Some(now);
        }
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[i64]) -> ServiceResult<()> {
        self.begin(Operation::BulkDelete, Some(RecordedCall::BulkDelete(ids.to_vec())))
            .await?;
        let mut store = self.store.lock().await;
        store.expenses.retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        self.begin(Operation::Categories, None).await?;
        Ok(self.store.lock().await.reference.categories.clone())
    }

    async fn list_payment_methods(&self) -> ServiceResult<Vec<PaymentMethod>> {
        self.begin(Operation::PaymentMethods, None).await?;
        Ok(self.store.lock().await.reference.payment_methods.clone())
    }
}

fn seed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn seed_reference() -> ReferenceData {
    let categories = [
        "Other Expenses (Pare)",
        "Dining/Eating Out",
        "Special Occasions (P)",
        "Gas - Auto",
        "Health",
        "Groceries (Parent)",
        "Outdoors (Parent)",
        "Gifts (Parent)",
        "Transportation",
        "Entertainment",
        "Utilities",
        "Healthcare",
        "Shopping",
        "Health & Fitness",
        "Housing",
        "Education",
        "Food",
    ];
    let payment_methods = [
        "Discover",
        "Visa",
        "Mastercard",
        "American Express",
        "Debit Card",
        "Cash",
        "Bank Transfer",
        "PayPal",
    ];

    ReferenceData {
        categories: (1..)
            .zip(categories)
            .map(|(id, name)| Category {
                id,
                name: name.to_string(),
            })
            .collect(),
        payment_methods: (1..)
            .zip(payment_methods)
            .map(|(id, name)| PaymentMethod {
                id,
                name: name.to_string(),
            })
            .collect(),
    }
}

fn seed_expenses() -> Vec<Expense> {
    let modified_at = Some(seed_clock());
    let rows: [(i64, NaiveDate, &str, i64, i64, i64, Option<NaiveDate>); 14] = [
        (1, day(2026, 1, 19), "COPA AIRLINES PANAMA PAN", 12634, 1, 1, None),
        (2, day(2026, 1, 22), "Freddy's - custard", 551, 1, 2, None),
        (3, day(2026, 1, 22), "WALMART.COM - birthday present - couch", 8330, 1, 3, None),
        (4, day(2026, 1, 23), "Gas Station", 4500, 1, 4, None),
        (5, day(2026, 1, 24), "Ross - return shoes", -2179, 1, 1, None),
        (6, day(2026, 1, 25), "AMAZON - Christmas gift", 1599, 1, 8, None),
        (7, day(2026, 1, 26), "Pharmacy - Prescription", 3250, 1, 5, None),
        (8, day(2026, 1, 27), "Groceries - Whole Foods", 12550, 1, 6, None),
        (9, day(2026, 1, 28), "Outdoor Equipment", 8925, 1, 7, None),
        (10, day(2026, 1, 10), "Netflix Subscription", 1599, 2, 10, Some(day(2026, 1, 10))),
        (11, day(2026, 1, 12), "Electric Bill", 8925, 7, 11, Some(day(2026, 1, 15))),
        (12, day(2026, 1, 25), "Coffee Shop", 1250, 5, 17, Some(day(2026, 1, 25))),
        (13, day(2026, 1, 28), "Parking Fee", 800, 6, 9, Some(day(2026, 1, 28))),
        (14, day(2025, 12, 30), "Holiday flights", 41200, 1, 9, None),
    ];

    rows.into_iter()
        .map(
            |(id, date, description, amount_minor, method, category, date_paid)| Expense {
                id,
                date,
                description: description.to_string(),
                amount_minor,
                category_id: Some(category),
                payment_method_id: Some(method),
                date_paid,
                created_at: modified_at,
                modified_at,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use api_types::expense::{Field, FieldValue};

    use super::*;

    #[tokio::test]
    async fn january_lists_only_january() {
        let service = MemoryService::seeded();
        let filter = ExpenseFilter::for_period("2026-01".parse().unwrap());
        let expenses = service.list(&filter).await.unwrap();
        assert_eq!(expenses.len(), 13);
        assert!(expenses.iter().all(|e| e.date.format("%Y-%m").to_string() == "2026-01"));
    }

    #[tokio::test]
    async fn stale_version_conflicts_with_current_record() {
        let service = MemoryService::seeded();
        let original = service.peek(4).await.unwrap();
        let theirs = service
            .simulate_concurrent_edit(4, &[FieldUpdate::Set(FieldValue::Amount(5000))])
            .await
            .unwrap();

        let err = service
            .update(
                4,
                &[FieldUpdate::Set(FieldValue::Amount(-4500))],
                original.modified_at,
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict(Box::new(theirs.clone())));

        let saved = service
            .update(
                4,
                &[FieldUpdate::Set(FieldValue::Amount(-4500))],
                theirs.modified_at,
            )
            .await
            .unwrap();
        assert_eq!(saved.amount_minor, -4500);
        assert!(saved.modified_at > theirs.modified_at);
    }

    #[tokio::test]
    async fn injected_failure_hits_only_the_next_call() {
        let service = MemoryService::seeded();
        service
            .fail_next(
                Operation::Delete,
                ServiceError::Unavailable("offline".to_string()),
            )
            .await;
        assert!(service.delete(1).await.is_err());
        service.delete(1).await.unwrap();
        assert_eq!(
            service.delete(1).await,
            Err(ServiceError::NotFound("expense 1".to_string()))
        );
    }

    #[tokio::test]
    async fn create_assigns_next_id_and_timestamps() {
        let service = MemoryService::seeded();
        let created = service
            .create(&ExpenseNew {
                date: day(2026, 1, 30),
                description: "Bakery".to_string(),
                amount_minor: 725,
                category_id: Some(17),
                payment_method_id: None,
                date_paid: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 15);
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.modified_at);
    }

    #[tokio::test]
    async fn bulk_update_clears_paid_date_of_listed_ids() {
        let service = MemoryService::seeded();
        service
            .bulk_update(&[10, 11], &[FieldUpdate::Clear(Field::DatePaid)])
            .await
            .unwrap();
        assert_eq!(service.peek(10).await.unwrap().date_paid, None);
        assert_eq!(service.peek(11).await.unwrap().date_paid, None);
        assert!(service.peek(12).await.unwrap().date_paid.is_some());
    }
}
