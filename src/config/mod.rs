mod card;
mod person;
mod purchase;
mod settings;
pub mod state;

pub use card::Card;
pub use person::Person;
pub use purchase::Purchase;
pub use settings::{Config, DisplaySettings, InstallmentSettings};
pub use state::State;

use crate::error::{LedgerError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the config directory path (XDG config dir, or ~/.cardsplit/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "cardsplit") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".cardsplit"))
}

fn load_toml<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    debug!(path = %path.display(), "loading");
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    load_toml(config_dir.join("config.toml"))
}

/// Load people.toml keyed by person id
pub fn load_people(config_dir: &Path) -> Result<HashMap<String, Person>> {
    let people: HashMap<String, Person> = load_toml(config_dir.join("people.toml"))?;
    Ok(people
        .into_iter()
        .map(|(id, mut person)| {
            person.id = id.clone();
            (id, person)
        })
        .collect())
}

/// Load cards.toml keyed by card id
pub fn load_cards(config_dir: &Path) -> Result<HashMap<String, Card>> {
    let cards: HashMap<String, Card> = load_toml(config_dir.join("cards.toml"))?;
    Ok(cards
        .into_iter()
        .map(|(id, mut card)| {
            card.id = id.clone();
            (id, card)
        })
        .collect())
}

/// Load purchases.toml keyed by purchase id
pub fn load_purchases(config_dir: &Path) -> Result<HashMap<String, Purchase>> {
    let purchases: HashMap<String, Purchase> = load_toml(config_dir.join("purchases.toml"))?;
    Ok(purchases
        .into_iter()
        .map(|(id, mut purchase)| {
            purchase.id = id.clone();
            (id, purchase)
        })
        .collect())
}

/// Load state.toml (empty paid set if missing)
pub fn load_state(config_dir: &Path) -> Result<State> {
    let path = config_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    load_toml(path)
}

/// Save state.toml
pub fn save_state(config_dir: &Path, state: &State) -> Result<()> {
    let path = config_dir.join("state.toml");
    let content = toml::to_string_pretty(state).map_err(|e| LedgerError::ConfigWrite {
        path: path.clone(),
        source: e,
    })?;
    fs::write(&path, content)?;
    debug!(path = %path.display(), "saved paid state");
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[display]
currency_symbol = "$"

[installments]
# Where rounding cents go when a total does not split evenly:
#   "last"  - shares are rounded, the remainder lands on the final installment
#   "first" - shares are rounded, the remainder lands on the first installment
#   "none"  - every share is the exact quotient, no rounding
remainder = "last"
scale = 2  # decimal places used when rounding shares
"#;

/// Template content for people.toml
pub const PEOPLE_TEMPLATE: &str = r#"# People who share your cards. The table name (e.g., [ana]) is the
# person identifier referenced from purchases.toml.

[ana]
name = "Ana Souza"
phone = "11 98765-4321"   # optional

[bruno]
name = "Bruno Lima"
"#;

/// Template content for cards.toml
pub const CARDS_TEMPLATE: &str = r#"# Your credit cards. The table name (e.g., [nubank]) is the card
# identifier referenced from purchases.toml.
#
# closing_day: day of month the statement closes
# due_day:     day of month the bill is due

[nubank]
name = "Nubank Roxinho"
brand = "Mastercard"
closing_day = 10
due_day = 17
"#;

/// Template content for purchases.toml
pub const PURCHASES_TEMPLATE: &str = r#"# Purchases made on your cards. The table name (e.g., [ana-tv]) is the
# purchase identifier used by the schedule, pay and unpay commands.
#
# Example:
#   cardsplit schedule ana-tv

[ana-tv]
person = "ana"
card = "nubank"
store = "Magazine Online"
items = "Smart TV"   # optional
total_amount = "2400.00"
installments = 10
purchase_date = "2026-01-15"
"#;
