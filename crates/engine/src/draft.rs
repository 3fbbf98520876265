use api_types::expense::ExpenseNew;
use chrono::NaiveDate;

/// The "add a row" line of the grid. Lives only on the client until it is
/// committed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftRow {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub amount_minor: i64,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
}

impl DraftRow {
    /// A draft is worth committing once it has a description, an amount or an
    /// explicit date.
    pub fn has_content(&self) -> bool {
        !self.description.trim().is_empty() || self.amount_minor != 0 || self.date.is_some()
    }

    pub fn into_new(self, default_date: NaiveDate) -> ExpenseNew {
        ExpenseNew {
            date: self.date.unwrap_or(default_date),
            description: self.description.trim().to_string(),
            amount_minor: self.amount_minor,
            category_id: self.category_id,
            payment_method_id: self.payment_method_id,
            date_paid: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_draft_has_no_content() {
        let mut draft = DraftRow {
            description: "   ".to_string(),
            category_id: Some(3),
            ..Default::default()
        };
        assert!(!draft.has_content());
        draft.amount_minor = -100;
        assert!(draft.has_content());
    }

    #[test]
    fn missing_date_falls_back_to_default() {
        let first = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let new = DraftRow {
            description: " Bakery ".to_string(),
            ..Default::default()
        }
        .into_new(first);
        assert_eq!(new.date, first);
        assert_eq!(new.description, "Bakery");
    }
}
