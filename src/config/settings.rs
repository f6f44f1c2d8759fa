use serde::{Deserialize, Serialize};

use crate::schedule::RemainderPolicy;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub installments: InstallmentSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplaySettings {
    pub currency_symbol: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InstallmentSettings {
    #[serde(default)]
    pub remainder: RemainderPolicy,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

fn default_scale() -> u32 {
    2
}

impl Default for InstallmentSettings {
    fn default() -> Self {
        Self {
            remainder: RemainderPolicy::default(),
            scale: default_scale(),
        }
    }
}

impl InstallmentSettings {
    /// The split policy applied when projecting installments
    pub fn split(&self) -> crate::schedule::Split {
        crate::schedule::Split {
            remainder: self.remainder,
            scale: self.scale,
        }
    }
}
