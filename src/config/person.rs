use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Person {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}
