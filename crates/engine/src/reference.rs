use api_types::reference::{Category, PaymentMethod};

/// Payment method picked by default in the payoff view.
const DEFAULT_PAYOFF_METHOD: &str = "discover";

/// Categories and payment methods, loaded once and used for display, search
/// and text sorting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub categories: Vec<Category>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl ReferenceData {
    pub fn category_name(&self, id: i64) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.as_str())
    }

    pub fn payment_method_name(&self, id: i64) -> Option<&str> {
        self.payment_methods
            .iter()
            .find(|method| method.id == id)
            .map(|method| method.name.as_str())
    }

    /// "Discover" when present, otherwise the first payment method.
    pub fn default_payoff_method(&self) -> Option<i64> {
        self.payment_methods
            .iter()
            .find(|method| method.name.eq_ignore_ascii_case(DEFAULT_PAYOFF_METHOD))
            .or_else(|| self.payment_methods.first())
            .map(|method| method.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(id: i64, name: &str) -> PaymentMethod {
        PaymentMethod {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn payoff_defaults_to_discover() {
        let reference = ReferenceData {
            categories: Vec::new(),
            payment_methods: vec![method(2, "Visa"), method(7, "DISCOVER")],
        };
        assert_eq!(reference.default_payoff_method(), Some(7));
    }

    #[test]
    fn payoff_falls_back_to_first_method() {
        let reference = ReferenceData {
            categories: Vec::new(),
            payment_methods: vec![method(2, "Visa"), method(3, "Cash")],
        };
        assert_eq!(reference.default_payoff_method(), Some(2));
        assert_eq!(ReferenceData::default().default_payoff_method(), None);
    }
}
