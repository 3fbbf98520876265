//! Field level helpers over the wire [`Expense`] record and the load filter.
use api_types::expense::{Expense, ExpenseListQuery, Field, FieldUpdate, FieldValue};

use crate::{EngineError, MoneyCents, Period, ReferenceData};

/// Applies one field update to `expense` in place.
///
/// Clearing is only allowed on nullable fields; the record is left untouched
/// when the update is rejected.
pub fn apply_update(expense: &mut Expense, update: &FieldUpdate) -> Result<(), EngineError> {
    match update {
        FieldUpdate::Set(value) => {
            match value {
                FieldValue::Date(date) => expense.date = *date,
                FieldValue::Description(text) => expense.description = text.clone(),
                FieldValue::Amount(amount) => expense.amount_minor = *amount,
                FieldValue::Category(id) => expense.category_id = Some(*id),
                FieldValue::PaymentMethod(id) => expense.payment_method_id = Some(*id),
                FieldValue::DatePaid(date) => expense.date_paid = Some(*date),
            }
            Ok(())
        }
        FieldUpdate::Clear(field) => match field {
            Field::Category => {
                expense.category_id = None;
                Ok(())
            }
            Field::PaymentMethod => {
                expense.payment_method_id = None;
                Ok(())
            }
            Field::DatePaid => {
                expense.date_paid = None;
                Ok(())
            }
            Field::Date | Field::Description | Field::Amount => Err(EngineError::InvalidUpdate(
                format!("{field} cannot be cleared"),
            )),
        },
    }
}

/// Applies every update or none of them.
pub fn apply_updates(expense: &mut Expense, updates: &[FieldUpdate]) -> Result<(), EngineError> {
    let mut patched = expense.clone();
    for update in updates {
        apply_update(&mut patched, update)?;
    }
    *expense = patched;
    Ok(())
}

/// Filter for the expense list: month, free text, payment method, unpaid only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub period: Option<Period>,
    pub search: String,
    pub payment_method: Option<i64>,
    pub unpaid_only: bool,
}

impl ExpenseFilter {
    pub fn for_period(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }

    /// Unpaid expenses charged to one payment method, across all months.
    pub fn unpaid_for_method(payment_method: i64) -> Self {
        Self {
            payment_method: Some(payment_method),
            unpaid_only: true,
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> ExpenseListQuery {
        let search = self.search.trim();
        ExpenseListQuery {
            period: self.period.map(|p| p.to_string()),
            search: (!search.is_empty()).then(|| search.to_string()),
            payment_method: self.payment_method,
            unpaid_only: self.unpaid_only.then_some(true),
        }
    }

    pub fn from_query(query: &ExpenseListQuery) -> Result<Self, EngineError> {
        let period = query
            .period
            .as_deref()
            .map(str::parse::<Period>)
            .transpose()?;
        Ok(Self {
            period,
            search: query.search.clone().unwrap_or_default(),
            payment_method: query.payment_method,
            unpaid_only: query.unpaid_only.unwrap_or(false),
        })
    }

    /// Returns `true` when `expense` belongs in the filtered list.
    ///
    /// The search term matches, case-insensitively, the description, the
    /// category name or the decimal amount.
    pub fn matches(&self, expense: &Expense, reference: &ReferenceData) -> bool {
        if let Some(period) = self.period {
            if !period.contains(expense.date) {
                return false;
            }
        }
        if let Some(method) = self.payment_method {
            if expense.payment_method_id != Some(method) {
                return false;
            }
        }
        if self.unpaid_only && expense.date_paid.is_some() {
            return false;
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let category = expense
            .category_id
            .and_then(|id| reference.category_name(id))
            .unwrap_or_default()
            .to_lowercase();
        expense.description.to_lowercase().contains(&term)
            || category.contains(&term)
            || MoneyCents::new(expense.amount_minor)
                .to_string()
                .contains(&term)
    }
}
