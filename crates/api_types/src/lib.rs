use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Error body returned by the API on every non-2xx reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod reference {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PaymentMethod {
        pub id: i64,
        pub name: String,
    }
}

pub mod expense {
    use std::fmt;

    use super::*;

    /// A single expense as served by the API.
    ///
    /// Ids are positive once the server has assigned them. Negative ids only
    /// ever exist on the client for rows that were not created yet.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Expense {
        pub id: i64,
        pub date: NaiveDate,
        pub description: String,
        /// Signed amount in cents, negative for refunds.
        pub amount_minor: i64,
        pub category_id: Option<i64>,
        pub payment_method_id: Option<i64>,
        pub date_paid: Option<NaiveDate>,
        pub created_at: Option<DateTime<Utc>>,
        pub modified_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub date: NaiveDate,
        pub description: String,
        pub amount_minor: i64,
        pub category_id: Option<i64>,
        pub payment_method_id: Option<i64>,
        pub date_paid: Option<NaiveDate>,
    }

    /// Editable columns of an expense.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Field {
        Date,
        Description,
        Amount,
        Category,
        PaymentMethod,
        DatePaid,
    }

    impl Field {
        pub const ALL: [Field; 6] = [
            Field::Date,
            Field::Description,
            Field::Amount,
            Field::Category,
            Field::PaymentMethod,
            Field::DatePaid,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Date => "date",
                Self::Description => "description",
                Self::Amount => "amount",
                Self::Category => "category",
                Self::PaymentMethod => "payment_method",
                Self::DatePaid => "date_paid",
            }
        }

        /// Returns `true` when the field may be cleared to null.
        pub fn is_nullable(self) -> bool {
            matches!(self, Self::Category | Self::PaymentMethod | Self::DatePaid)
        }
    }

    impl fmt::Display for Field {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// A new value for one field.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "field", content = "value", rename_all = "snake_case")]
    pub enum FieldValue {
        Date(NaiveDate),
        Description(String),
        Amount(i64),
        Category(i64),
        PaymentMethod(i64),
        DatePaid(NaiveDate),
    }

    impl FieldValue {
        pub fn field(&self) -> Field {
            match self {
                Self::Date(_) => Field::Date,
                Self::Description(_) => Field::Description,
                Self::Amount(_) => Field::Amount,
                Self::Category(_) => Field::Category,
                Self::PaymentMethod(_) => Field::PaymentMethod,
                Self::DatePaid(_) => Field::DatePaid,
            }
        }
    }

    /// One entry of a partial update: either set a field or clear it to null.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FieldUpdate {
        Set(FieldValue),
        Clear(Field),
    }

    impl FieldUpdate {
        pub fn field(&self) -> Field {
            match self {
                Self::Set(value) => value.field(),
                Self::Clear(field) => *field,
            }
        }
    }

    /// Body of `PATCH /expenses/{id}`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub changes: Vec<FieldUpdate>,
        /// Last `modified_at` the client has seen, compared by the server
        /// before applying `changes`.
        pub expected_modified_at: Option<DateTime<Utc>>,
    }

    /// Query string of `GET /expenses`.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        /// Month in `YYYY-MM` form.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub period: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub payment_method: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub unpaid_only: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkUpdate {
        pub ids: Vec<i64>,
        pub changes: Vec<FieldUpdate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkDelete {
        pub ids: Vec<i64>,
    }

    /// Body of a `409 Conflict` reply to an update.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConflictResponse {
        pub error: String,
        pub current: Expense,
    }
}

#[cfg(test)]
mod tests {
    use super::expense::*;

    #[test]
    fn field_update_wire_shape() {
        let set = FieldUpdate::Set(FieldValue::Amount(-4500));
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"set":{"field":"amount","value":-4500}}"#
        );

        let clear = FieldUpdate::Clear(Field::DatePaid);
        assert_eq!(
            serde_json::to_string(&clear).unwrap(),
            r#"{"clear":"date_paid"}"#
        );
    }

    #[test]
    fn empty_query_serializes_without_keys() {
        let query = ExpenseListQuery::default();
        assert_eq!(serde_json::to_string(&query).unwrap(), "{}");
    }

    #[test]
    fn only_reference_columns_and_paid_date_are_nullable() {
        let nullable: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|field| field.is_nullable())
            .collect();
        assert_eq!(
            nullable,
            vec![Field::Category, Field::PaymentMethod, Field::DatePaid]
        );
    }
}
