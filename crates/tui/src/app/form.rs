use engine::{BulkForm, DraftRow, ReferenceData, normalize_amount_input};

use super::input::{category_id, optional_date, payment_method_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Patch applied to every selected row.
    Bulk,
    /// New row appended to the grid.
    Draft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Toggle(bool),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn text(label: &'static str) -> Self {
        Self {
            label,
            input: FieldInput::Text(String::new()),
        }
    }

    fn toggle(label: &'static str) -> Self {
        Self {
            label,
            input: FieldInput::Toggle(false),
        }
    }
}

/// A small modal form. Blank text fields mean "leave unset".
#[derive(Debug, Clone)]
pub struct FormDialog {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

const BULK_DATE: usize = 0;
const BULK_CATEGORY: usize = 1;
const BULK_METHOD: usize = 2;
const BULK_DATE_PAID: usize = 3;
const BULK_CLEAR_PAID: usize = 4;

const DRAFT_DATE: usize = 0;
const DRAFT_DESCRIPTION: usize = 1;
const DRAFT_AMOUNT: usize = 2;
const DRAFT_CATEGORY: usize = 3;
const DRAFT_METHOD: usize = 4;

impl FormDialog {
    pub fn bulk() -> Self {
        Self {
            kind: FormKind::Bulk,
            fields: vec![
                FormField::text("Date"),
                FormField::text("Category"),
                FormField::text("Payment method"),
                FormField::text("Date paid"),
                FormField::toggle("Set date paid to null"),
            ],
            focus: 0,
            error: None,
        }
    }

    pub fn draft() -> Self {
        Self {
            kind: FormKind::Draft,
            fields: vec![
                FormField::text("Date"),
                FormField::text("Description"),
                FormField::text("Amount"),
                FormField::text("Category"),
                FormField::text("Payment method"),
            ],
            focus: DRAFT_DESCRIPTION,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Bulk => "Bulk update",
            FormKind::Draft => "New expense",
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Types into the focused field. Space flips toggles.
    pub fn push(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            match &mut field.input {
                FieldInput::Text(text) => text.push(ch),
                FieldInput::Toggle(on) if ch == ' ' => *on = !*on,
                FieldInput::Toggle(_) => {}
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(FormField {
            input: FieldInput::Text(text),
            ..
        }) = self.fields.get_mut(self.focus)
        {
            text.pop();
        }
    }

    fn text(&self, index: usize) -> &str {
        match self.fields.get(index).map(|field| &field.input) {
            Some(FieldInput::Text(text)) => text.trim(),
            _ => "",
        }
    }

    fn toggled(&self, index: usize) -> bool {
        matches!(
            self.fields.get(index).map(|field| &field.input),
            Some(FieldInput::Toggle(true))
        )
    }

    pub fn to_bulk_form(&self, reference: &ReferenceData) -> Result<BulkForm, String> {
        let category = self.text(BULK_CATEGORY);
        let method = self.text(BULK_METHOD);
        Ok(BulkForm {
            date: optional_date(self.text(BULK_DATE))?,
            category_id: (!category.is_empty())
                .then(|| category_id(category, reference))
                .transpose()?,
            payment_method_id: (!method.is_empty())
                .then(|| payment_method_id(method, reference))
                .transpose()?,
            date_paid: optional_date(self.text(BULK_DATE_PAID))?,
            clear_date_paid: self.toggled(BULK_CLEAR_PAID),
        })
    }

    pub fn to_draft(&self, reference: &ReferenceData) -> Result<DraftRow, String> {
        let category = self.text(DRAFT_CATEGORY);
        let method = self.text(DRAFT_METHOD);
        Ok(DraftRow {
            date: optional_date(self.text(DRAFT_DATE))?,
            description: self.text(DRAFT_DESCRIPTION).to_string(),
            amount_minor: normalize_amount_input(self.text(DRAFT_AMOUNT)).cents(),
            category_id: (!category.is_empty())
                .then(|| category_id(category, reference))
                .transpose()?,
            payment_method_id: (!method.is_empty())
                .then(|| payment_method_id(method, reference))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use api_types::{
        expense::{Field, FieldUpdate},
        reference::PaymentMethod,
    };
    use chrono::NaiveDate;

    use super::*;

    fn type_text(form: &mut FormDialog, text: &str) {
        for ch in text.chars() {
            form.push(ch);
        }
    }

    #[test]
    fn clear_toggle_wins_over_typed_date_paid() {
        let mut form = FormDialog::bulk();
        form.focus = BULK_DATE_PAID;
        type_text(&mut form, "2026-02-01");
        form.next_field();
        form.push(' ');

        let bulk = form.to_bulk_form(&ReferenceData::default()).unwrap();
        assert!(bulk.clear_date_paid);
        assert_eq!(
            bulk.changes().unwrap(),
            vec![FieldUpdate::Clear(Field::DatePaid)]
        );
    }

    #[test]
    fn bulk_form_reports_unknown_names() {
        let mut form = FormDialog::bulk();
        form.focus = BULK_METHOD;
        type_text(&mut form, "Amex");
        assert!(form.to_bulk_form(&ReferenceData::default()).is_err());
    }

    #[test]
    fn draft_form_builds_a_draft_row() {
        let reference = ReferenceData {
            categories: Vec::new(),
            payment_methods: vec![PaymentMethod {
                id: 2,
                name: "Visa".to_string(),
            }],
        };
        let mut form = FormDialog::draft();
        type_text(&mut form, "Bakery");
        form.next_field();
        type_text(&mut form, "8.25");
        form.focus = DRAFT_METHOD;
        type_text(&mut form, "visa");
        form.prev_field();
        form.prev_field();
        form.prev_field();
        form.prev_field();
        type_text(&mut form, "2026-01-15x");
        form.backspace();

        let draft = form.to_draft(&reference).unwrap();
        assert_eq!(draft.description, "Bakery");
        assert_eq!(draft.amount_minor, 825);
        assert_eq!(draft.payment_method_id, Some(2));
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2026, 1, 15));
    }
}
