use serde::{Deserialize, Serialize};

/// A credit card and its billing-cycle rule.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Card {
    /// Filled in from the table key when loading cards.toml
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub closing_day: u32,
    pub due_day: u32,
}
