use api_types::expense::{Field, FieldUpdate, FieldValue};
use chrono::NaiveDate;

use crate::EngineError;

/// Values of the bulk update dialog. Only fields the user set are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkForm {
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub date_paid: Option<NaiveDate>,
    /// "Set date paid to null". Wins over `date_paid`.
    pub clear_date_paid: bool,
}

impl BulkForm {
    /// The sparse patch described by the form.
    pub fn changes(&self) -> Result<Vec<FieldUpdate>, EngineError> {
        let mut changes = Vec::new();
        if let Some(date) = self.date {
            changes.push(FieldUpdate::Set(FieldValue::Date(date)));
        }
        if let Some(id) = self.category_id {
            changes.push(FieldUpdate::Set(FieldValue::Category(id)));
        }
        if let Some(id) = self.payment_method_id {
            changes.push(FieldUpdate::Set(FieldValue::PaymentMethod(id)));
        }
        if self.clear_date_paid {
            changes.push(FieldUpdate::Clear(Field::DatePaid));
        } else if let Some(date) = self.date_paid {
            changes.push(FieldUpdate::Set(FieldValue::DatePaid(date)));
        }

        if changes.is_empty() {
            return Err(EngineError::InvalidUpdate(
                "bulk update sets no field".to_string(),
            ));
        }
        Ok(changes)
    }
}
