use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Config directory not found at {0}. Run 'cardsplit init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Purchase '{0}' not found in purchases.toml")]
    PurchaseNotFound(String),

    #[error("Person '{0}' not found in people.toml")]
    PersonNotFound(String),

    #[error("Card '{card}' referenced by purchase '{purchase}' not found in cards.toml")]
    CardNotFound { purchase: String, card: String },

    #[error("Card '{card}' has invalid {field} {day} (must be between 1 and 31)")]
    InvalidCardDay {
        card: String,
        field: &'static str,
        day: u32,
    },

    #[error("Purchase '{purchase}' has invalid installment count {count} (must be at least 1)")]
    InvalidInstallmentCount { purchase: String, count: u32 },

    #[error("Purchase '{purchase}' has invalid total amount {amount} (must be greater than zero)")]
    InvalidAmount { purchase: String, amount: Decimal },

    #[error("Due dates for purchase '{0}' fall outside the supported calendar range")]
    DateOutOfRange(String),

    #[error("Invalid installment {number} for {purchase} (it has {count} installment(s))")]
    InvalidInstallmentNumber {
        purchase: String,
        number: u32,
        count: u32,
    },

    #[error("Invalid month '{0}'. Expected YYYY-MM (e.g., 2026-03)")]
    InvalidMonth(String),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
