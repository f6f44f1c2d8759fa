use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchase charged to a card on behalf of a person.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Filled in from the table key when loading purchases.toml
    #[serde(skip)]
    pub id: String,
    pub person: String,
    pub card: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub items: Option<String>,
    pub total_amount: Decimal,
    pub installments: u32,
    pub purchase_date: NaiveDate,
}
