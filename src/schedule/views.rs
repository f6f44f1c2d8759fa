use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use super::projector::{project_installments, Installment, Split};
use crate::config::{Card, Purchase, State};
use crate::error::Result;

/// An installment joined with its paid status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedInstallment {
    #[serde(flatten)]
    pub installment: Installment,
    pub is_paid: bool,
}

/// Amounts attributed to one person across all purchases
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonTotals {
    pub person_id: String,
    pub total: Decimal,
    pub outstanding: Decimal,
}

/// Project every purchase and join the paid set.
///
/// Purchases whose card is missing contribute no installments. Purchases
/// are visited in id order so the output is stable.
pub fn project_all(
    cards: &HashMap<String, Card>,
    purchases: &HashMap<String, Purchase>,
    state: &State,
    split: Split,
) -> Result<Vec<TrackedInstallment>> {
    let mut sorted: Vec<_> = purchases.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut all = Vec::new();
    for purchase in sorted {
        let Some(card) = cards.get(&purchase.card) else {
            warn!(
                purchase = %purchase.id,
                card = %purchase.card,
                "card not found, skipping purchase"
            );
            continue;
        };

        all.extend(
            project_installments(purchase, card, split)?
                .into_iter()
                .map(|installment| TrackedInstallment {
                    is_paid: state.is_paid(&installment.purchase_id, installment.installment_number),
                    installment,
                }),
        );
    }

    Ok(all)
}

/// Sum of every installment, paid or not
pub fn total_scheduled(installments: &[TrackedInstallment]) -> Decimal {
    installments.iter().map(|i| i.installment.amount).sum()
}

/// Sum of the installments not yet paid
pub fn total_owed(installments: &[TrackedInstallment]) -> Decimal {
    installments
        .iter()
        .filter(|i| !i.is_paid)
        .map(|i| i.installment.amount)
        .sum()
}

/// Installments due in the given month, unpaid first, then by due date
pub fn due_in(installments: &[TrackedInstallment], year: i32, month: u32) -> Vec<TrackedInstallment> {
    let mut due: Vec<_> = installments
        .iter()
        .filter(|i| i.installment.due_date.year() == year && i.installment.due_date.month() == month)
        .cloned()
        .collect();

    due.sort_by(|a, b| {
        a.is_paid
            .cmp(&b.is_paid)
            .then(a.installment.due_date.cmp(&b.installment.due_date))
            .then_with(|| a.installment.id.cmp(&b.installment.id))
    });
    due
}

/// A person's installments ordered by due date
pub fn person_schedule(installments: &[TrackedInstallment], person_id: &str) -> Vec<TrackedInstallment> {
    let mut schedule: Vec<_> = installments
        .iter()
        .filter(|i| i.installment.person_id == person_id)
        .cloned()
        .collect();

    schedule.sort_by(|a, b| {
        a.installment
            .due_date
            .cmp(&b.installment.due_date)
            .then_with(|| a.installment.id.cmp(&b.installment.id))
    });
    schedule
}

/// Per-person totals, skipping people with nothing scheduled
pub fn person_totals(installments: &[TrackedInstallment]) -> Vec<PersonTotals> {
    let mut by_person: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for i in installments {
        let entry = by_person.entry(&i.installment.person_id).or_default();
        entry.0 += i.installment.amount;
        if !i.is_paid {
            entry.1 += i.installment.amount;
        }
    }

    by_person
        .into_iter()
        .filter(|(_, (total, _))| !total.is_zero())
        .map(|(person_id, (total, outstanding))| PersonTotals {
            person_id: person_id.to_string(),
            total,
            outstanding,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cards() -> HashMap<String, Card> {
        let mut cards = HashMap::new();
        cards.insert(
            "visa".to_string(),
            Card {
                id: "visa".to_string(),
                name: "Visa".to_string(),
                brand: None,
                closing_day: 10,
                due_day: 5,
            },
        );
        cards
    }

    fn purchase(id: &str, person: &str, card: &str, total: Decimal, n: u32, on: NaiveDate) -> Purchase {
        Purchase {
            id: id.to_string(),
            person: person.to_string(),
            card: card.to_string(),
            store: "Loja".to_string(),
            items: None,
            total_amount: total,
            installments: n,
            purchase_date: on,
        }
    }

    fn purchases() -> HashMap<String, Purchase> {
        [
            // due 2026-05-05, 06-05, 07-05
            purchase("tv", "ana", "visa", dec!(300), 3, date(2026, 3, 15)),
            // due 2026-04-05, 05-05
            purchase("shoes", "bruno", "visa", dec!(100), 2, date(2026, 3, 1)),
            // card missing
            purchase("ghost", "ana", "amex", dec!(999), 1, date(2026, 3, 1)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect()
    }

    #[test]
    fn test_missing_card_contributes_nothing() {
        let all = project_all(&cards(), &purchases(), &State::default(), Split::default()).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|i| i.installment.purchase_id != "ghost"));
        assert_eq!(total_scheduled(&all), dec!(400));
    }

    #[test]
    fn test_total_owed_skips_paid() {
        let mut state = State::default();
        state.mark_paid("tv", 1);
        state.mark_paid("shoes", 2);

        let all = project_all(&cards(), &purchases(), &state, Split::default()).unwrap();
        assert_eq!(total_owed(&all), dec!(250));
        assert_eq!(total_scheduled(&all), dec!(400));
    }

    #[test]
    fn test_due_in_sorts_paid_last() {
        let mut state = State::default();
        state.mark_paid("shoes", 2);

        let all = project_all(&cards(), &purchases(), &state, Split::default()).unwrap();
        let may = due_in(&all, 2026, 5);
        let ids: Vec<_> = may.iter().map(|i| i.installment.id.as_str()).collect();
        assert_eq!(ids, vec!["tv-1", "shoes-2"]);
        assert!(!may[0].is_paid);
        assert!(may[1].is_paid);

        assert!(due_in(&all, 2027, 5).is_empty());
    }

    #[test]
    fn test_person_schedule_sorted_by_due_date() {
        let all = project_all(&cards(), &purchases(), &State::default(), Split::default()).unwrap();
        let ana = person_schedule(&all, "ana");
        assert_eq!(ana.len(), 3);
        assert!(ana.windows(2).all(|w| w[0].installment.due_date < w[1].installment.due_date));
        assert!(person_schedule(&all, "nobody").is_empty());
    }

    #[test]
    fn test_person_totals() {
        let mut state = State::default();
        state.mark_paid("tv", 1);

        let all = project_all(&cards(), &purchases(), &state, Split::default()).unwrap();
        let totals = person_totals(&all);
        assert_eq!(
            totals,
            vec![
                PersonTotals {
                    person_id: "ana".to_string(),
                    total: dec!(300),
                    outstanding: dec!(200),
                },
                PersonTotals {
                    person_id: "bruno".to_string(),
                    total: dec!(100),
                    outstanding: dec!(100),
                },
            ]
        );
    }

    #[test]
    fn test_invalid_purchase_fails_the_view() {
        let mut bad = purchases();
        bad.insert(
            "zero".to_string(),
            purchase("zero", "ana", "visa", dec!(10), 0, date(2026, 3, 1)),
        );
        assert!(project_all(&cards(), &bad, &State::default(), Split::default()).is_err());
    }
}
