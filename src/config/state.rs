use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Paid installment numbers, per purchase id.
///
/// Installments themselves are never stored; this is the only thing the
/// tool writes back to disk.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct State {
    #[serde(default)]
    pub paid: BTreeMap<String, BTreeSet<u32>>,
}

impl State {
    pub fn is_paid(&self, purchase_id: &str, installment_number: u32) -> bool {
        self.paid
            .get(purchase_id)
            .is_some_and(|numbers| numbers.contains(&installment_number))
    }

    /// Returns false if the installment was already paid
    pub fn mark_paid(&mut self, purchase_id: &str, installment_number: u32) -> bool {
        self.paid
            .entry(purchase_id.to_string())
            .or_default()
            .insert(installment_number)
    }

    /// Returns false if the installment was not paid
    pub fn mark_unpaid(&mut self, purchase_id: &str, installment_number: u32) -> bool {
        let Some(numbers) = self.paid.get_mut(purchase_id) else {
            return false;
        };
        let removed = numbers.remove(&installment_number);
        if numbers.is_empty() {
            self.paid.remove(purchase_id);
        }
        removed
    }

    pub fn paid_count(&self, purchase_id: &str) -> usize {
        self.paid.get(purchase_id).map_or(0, |numbers| numbers.len())
    }
}
