pub mod config;
pub mod error;
pub mod schedule;

pub use config::{Card, Config, Person, Purchase, State};
pub use error::{LedgerError, Result};
pub use schedule::{project_installments, Installment, RemainderPolicy, Split, TrackedInstallment};
