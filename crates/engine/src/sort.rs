use std::cmp::Ordering;

use api_types::expense::{Expense, Field};

use crate::ReferenceData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Column sort of the grid view. `None` keeps load order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<(Field, SortDirection)>,
}

impl SortState {
    /// Header click: the same column cycles ascending, descending, unsorted;
    /// another column starts ascending.
    pub fn toggle(&mut self, field: Field) {
        self.column = match self.column {
            Some((current, SortDirection::Ascending)) if current == field => {
                Some((field, SortDirection::Descending))
            }
            Some((current, SortDirection::Descending)) if current == field => None,
            _ => Some((field, SortDirection::Ascending)),
        };
    }

    pub fn direction_of(&self, field: Field) -> Option<SortDirection> {
        self.column
            .and_then(|(current, direction)| (current == field).then_some(direction))
    }
}

/// Display order of `records` as indices into the slice. The slice itself is
/// never reordered.
pub fn sorted_indices(
    records: &[Expense],
    sort: &SortState,
    reference: &ReferenceData,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..records.len()).collect();
    let Some((field, direction)) = sort.column else {
        return indices;
    };

    indices.sort_by(|&a, &b| {
        let ordering = compare(&records[a], &records[b], field, reference);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    indices
}

fn compare(a: &Expense, b: &Expense, field: Field, reference: &ReferenceData) -> Ordering {
    match field {
        Field::Date => a.date.cmp(&b.date),
        // None sorts before any date.
        Field::DatePaid => a.date_paid.cmp(&b.date_paid),
        Field::Amount => a.amount_minor.cmp(&b.amount_minor),
        Field::PaymentMethod => a
            .payment_method_id
            .unwrap_or(0)
            .cmp(&b.payment_method_id.unwrap_or(0)),
        Field::Description => a
            .description
            .to_lowercase()
            .cmp(&b.description.to_lowercase()),
        Field::Category => category_key(a, reference).cmp(&category_key(b, reference)),
    }
}

fn category_key(expense: &Expense, reference: &ReferenceData) -> String {
    expense
        .category_id
        .and_then(|id| reference.category_name(id))
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use api_types::reference::Category;
    use chrono::NaiveDate;

    use super::*;

    fn expense(id: i64, description: &str, amount_minor: i64, category_id: Option<i64>) -> Expense {
        Expense {
            id,
            date: NaiveDate::from_ymd_opt(2026, 1, id as u32).unwrap(),
            description: description.to_string(),
            amount_minor,
            category_id,
            payment_method_id: None,
            date_paid: None,
            created_at: None,
            modified_at: None,
        }
    }

    fn records() -> Vec<Expense> {
        vec![
            expense(1, "copa", 12634, Some(2)),
            expense(2, "Freddy's", 551, None),
            expense(3, "ross", -2179, Some(1)),
        ]
    }

    #[test]
    fn header_clicks_cycle_through_three_states() {
        let mut sort = SortState::default();
        sort.toggle(Field::Amount);
        assert_eq!(sort.direction_of(Field::Amount), Some(SortDirection::Ascending));
        sort.toggle(Field::Amount);
        assert_eq!(sort.direction_of(Field::Amount), Some(SortDirection::Descending));
        sort.toggle(Field::Amount);
        assert_eq!(sort, SortState::default());

        sort.toggle(Field::Amount);
        sort.toggle(Field::Date);
        assert_eq!(sort.direction_of(Field::Date), Some(SortDirection::Ascending));
        assert_eq!(sort.direction_of(Field::Amount), None);
    }

    #[test]
    fn amount_descending_reverses_ascending() {
        let records = records();
        let reference = ReferenceData::default();
        let mut sort = SortState::default();

        sort.toggle(Field::Amount);
        let ascending = sorted_indices(&records, &sort, &reference);
        assert_eq!(ascending, vec![2, 1, 0]);

        sort.toggle(Field::Amount);
        let mut descending = sorted_indices(&records, &sort, &reference);
        descending.reverse();
        assert_eq!(descending, ascending);

        sort.toggle(Field::Amount);
        assert_eq!(sorted_indices(&records, &sort, &reference), vec![0, 1, 2]);
    }

    #[test]
    fn text_columns_ignore_case_and_treat_missing_as_empty() {
        let records = records();
        let reference = ReferenceData {
            categories: vec![
                Category {
                    id: 1,
                    name: "groceries".to_string(),
                },
                Category {
                    id: 2,
                    name: "Dining".to_string(),
                },
            ],
            payment_methods: Vec::new(),
        };

        let mut sort = SortState::default();
        sort.toggle(Field::Description);
        assert_eq!(sorted_indices(&records, &sort, &reference), vec![0, 1, 2]);

        sort.toggle(Field::Category);
        assert_eq!(sorted_indices(&records, &sort, &reference), vec![1, 0, 2]);
    }

    #[test]
    fn missing_paid_dates_sort_first() {
        let mut records = records();
        records[0].date_paid = NaiveDate::from_ymd_opt(2026, 1, 20);
        records[2].date_paid = NaiveDate::from_ymd_opt(2026, 1, 5);

        let mut sort = SortState::default();
        sort.toggle(Field::DatePaid);
        let order = sorted_indices(&records, &sort, &ReferenceData::default());
        assert_eq!(order, vec![1, 2, 0]);
    }
}
