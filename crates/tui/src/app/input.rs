//! Text <-> cell value conversions for inline editing and dialogs.
use api_types::expense::{Expense, Field, FieldUpdate, FieldValue};
use chrono::NaiveDate;
use engine::{MoneyCents, ReferenceData, normalize_amount_input};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Text shown in the edit line when a cell is opened.
pub fn cell_text(expense: &Expense, field: Field, reference: &ReferenceData) -> String {
    match field {
        Field::Date => expense.date.format(DATE_FORMAT).to_string(),
        Field::Description => expense.description.clone(),
        Field::Amount => MoneyCents::new(expense.amount_minor).to_string(),
        Field::Category => expense
            .category_id
            .and_then(|id| reference.category_name(id))
            .unwrap_or_default()
            .to_string(),
        Field::PaymentMethod => expense
            .payment_method_id
            .and_then(|id| reference.payment_method_name(id))
            .unwrap_or_default()
            .to_string(),
        Field::DatePaid => expense
            .date_paid
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
    }
}

/// Parses the edit line of `field`. Blank input clears nullable fields.
pub fn parse_cell_input(
    field: Field,
    input: &str,
    reference: &ReferenceData,
) -> Result<FieldUpdate, String> {
    let input = input.trim();
    if input.is_empty() && field.is_nullable() {
        return Ok(FieldUpdate::Clear(field));
    }

    let value = match field {
        Field::Date => FieldValue::Date(parse_date(input)?),
        Field::Description => FieldValue::Description(input.to_string()),
        Field::Amount => FieldValue::Amount(normalize_amount_input(input).cents()),
        Field::Category => FieldValue::Category(category_id(input, reference)?),
        Field::PaymentMethod => FieldValue::PaymentMethod(payment_method_id(input, reference)?),
        Field::DatePaid => FieldValue::DatePaid(parse_date(input)?),
    };
    Ok(FieldUpdate::Set(value))
}

pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| format!("\"{}\" is not a date (YYYY-MM-DD)", input.trim()))
}

/// Blank input means "not set".
pub fn optional_date(input: &str) -> Result<Option<NaiveDate>, String> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_date(input).map(Some)
}

pub fn category_id(input: &str, reference: &ReferenceData) -> Result<i64, String> {
    lookup(
        input,
        reference.categories.iter().map(|c| (c.id, c.name.as_str())),
    )
    .ok_or_else(|| format!("unknown category \"{}\"", input.trim()))
}

pub fn payment_method_id(input: &str, reference: &ReferenceData) -> Result<i64, String> {
    lookup(
        input,
        reference
            .payment_methods
            .iter()
            .map(|m| (m.id, m.name.as_str())),
    )
    .ok_or_else(|| format!("unknown payment method \"{}\"", input.trim()))
}

/// Resolves a name typed by the user: an id, an exact name or an unambiguous
/// prefix, all case-insensitive.
fn lookup<'a>(input: &str, items: impl Iterator<Item = (i64, &'a str)>) -> Option<i64> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let items: Vec<(i64, &str)> = items.collect();

    if let Ok(id) = needle.parse::<i64>() {
        return items.iter().find(|(item, _)| *item == id).map(|(id, _)| *id);
    }
    if let Some((id, _)) = items
        .iter()
        .find(|(_, name)| name.to_lowercase() == needle)
    {
        return Some(*id);
    }

    let mut prefixed = items
        .iter()
        .filter(|(_, name)| name.to_lowercase().starts_with(&needle));
    match (prefixed.next(), prefixed.next()) {
        (Some((id, _)), None) => Some(*id),
        _ => None,
    }
}
