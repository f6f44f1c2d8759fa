use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Card, Purchase};
use crate::error::{LedgerError, Result};

/// Where the rounding remainder goes when a total does not split evenly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Every share is the exact quotient, no rounding
    #[serde(rename = "none")]
    Unrounded,
    First,
    #[default]
    Last,
}

/// How a purchase total is divided into installment amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub remainder: RemainderPolicy,
    /// Decimal places of each rounded share
    pub scale: u32,
}

impl Default for Split {
    fn default() -> Self {
        Self {
            remainder: RemainderPolicy::Last,
            scale: 2,
        }
    }
}

/// One scheduled portion of a purchase. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    pub id: String,
    pub purchase_id: String,
    pub person_id: String,
    pub installment_number: u32,
    pub total_installments: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub store: String,
}

/// Project the installments a purchase generates on its card.
///
/// A purchase made after the card's closing day misses the current bill and
/// first falls due two months later; otherwise it falls due the next month.
/// The first due date takes the card's due day (clamped to the month's last
/// day) and every following one is a calendar month after the previous due
/// date, so clamping carries forward: a due day of 31 landing in February
/// gives Feb 28, Mar 28, Apr 28, ...
pub fn project_installments(purchase: &Purchase, card: &Card, split: Split) -> Result<Vec<Installment>> {
    validate(purchase, card)?;

    let out_of_range = || LedgerError::DateOutOfRange(purchase.id.clone());
    let amounts = split_amount(purchase.total_amount, purchase.installments, split);
    let mut due_date = first_due_date(purchase.purchase_date, card.closing_day, card.due_day)
        .ok_or_else(out_of_range)?;

    let mut installments = Vec::with_capacity(amounts.len());
    for (idx, amount) in amounts.into_iter().enumerate() {
        let installment_number = idx as u32 + 1;
        if installment_number > 1 {
            due_date = due_date
                .checked_add_months(Months::new(1))
                .ok_or_else(out_of_range)?;
        }

        installments.push(Installment {
            id: format!("{}-{}", purchase.id, installment_number),
            purchase_id: purchase.id.clone(),
            person_id: purchase.person.clone(),
            installment_number,
            total_installments: purchase.installments,
            amount,
            due_date,
            store: purchase.store.clone(),
        });
    }

    debug!(
        purchase = %purchase.id,
        card = %card.id,
        count = installments.len(),
        first_due = %installments[0].due_date,
        "projected installments"
    );

    Ok(installments)
}

fn validate(purchase: &Purchase, card: &Card) -> Result<()> {
    for (field, day) in [("closing day", card.closing_day), ("due day", card.due_day)] {
        if !(1..=31).contains(&day) {
            return Err(LedgerError::InvalidCardDay {
                card: card.id.clone(),
                field,
                day,
            });
        }
    }

    if purchase.installments < 1 {
        return Err(LedgerError::InvalidInstallmentCount {
            purchase: purchase.id.clone(),
            count: purchase.installments,
        });
    }

    if purchase.total_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            purchase: purchase.id.clone(),
            amount: purchase.total_amount,
        });
    }

    Ok(())
}

/// Due date of the first installment of a purchase made on `purchase_date`.
pub fn first_due_date(purchase_date: NaiveDate, closing_day: u32, due_day: u32) -> Option<NaiveDate> {
    let months_ahead = if purchase_date.day() > closing_day { 2 } else { 1 };
    let billing_month = purchase_date
        .with_day(1)?
        .checked_add_months(Months::new(months_ahead))?;
    let last_day = last_day_of_month(billing_month)?;
    billing_month.with_day(due_day.min(last_day))
}

fn last_day_of_month(first_of_month: NaiveDate) -> Option<u32> {
    first_of_month
        .checked_add_months(Months::new(1))?
        .pred_opt()
        .map(|d| d.day())
}

/// Divide `total` into `count` shares according to `split`.
///
/// Rounded policies truncate every share to `split.scale` places and add the
/// leftover to one installment, so the shares always sum to `total` exactly.
pub fn split_amount(total: Decimal, count: u32, split: Split) -> Vec<Decimal> {
    if count == 0 {
        return Vec::new();
    }

    let quotient = total / Decimal::from(count);
    let mut shares = match split.remainder {
        RemainderPolicy::Unrounded => return vec![quotient; count as usize],
        RemainderPolicy::First | RemainderPolicy::Last => {
            let share = quotient.round_dp_with_strategy(split.scale, RoundingStrategy::ToZero);
            vec![share; count as usize]
        }
    };

    let remainder = total - shares.iter().copied().sum::<Decimal>();
    let target = match split.remainder {
        RemainderPolicy::First => 0,
        _ => shares.len() - 1,
    };
    shares[target] += remainder;
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(closing_day: u32, due_day: u32) -> Card {
        Card {
            id: "visa".to_string(),
            name: "Visa Gold".to_string(),
            brand: None,
            closing_day,
            due_day,
        }
    }

    fn purchase(total: Decimal, installments: u32, purchase_date: NaiveDate) -> Purchase {
        Purchase {
            id: "p1".to_string(),
            person: "ana".to_string(),
            card: "visa".to_string(),
            store: "Loja".to_string(),
            items: None,
            total_amount: total,
            installments,
            purchase_date,
        }
    }

    fn due_dates(installments: &[Installment]) -> Vec<NaiveDate> {
        installments.iter().map(|i| i.due_date).collect()
    }

    #[test]
    fn test_purchase_after_closing_bills_two_months_ahead() {
        let result = project_installments(
            &purchase(dec!(300), 3, date(2026, 3, 15)),
            &card(10, 5),
            Split::default(),
        )
        .unwrap();

        assert_eq!(
            due_dates(&result),
            vec![date(2026, 5, 5), date(2026, 6, 5), date(2026, 7, 5)]
        );
        assert!(result.iter().all(|i| i.amount == dec!(100)));
        assert_eq!(
            result.iter().map(|i| i.installment_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(result.iter().all(|i| i.total_installments == 3));
        assert_eq!(result[1].id, "p1-2");
    }

    #[test]
    fn test_purchase_before_closing_bills_next_month() {
        let result = project_installments(
            &purchase(dec!(99.90), 1, date(2026, 3, 5)),
            &card(10, 20),
            Split::default(),
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].due_date, date(2026, 4, 20));
        assert_eq!(result[0].amount, dec!(99.90));
        assert_eq!(result[0].person_id, "ana");
        assert_eq!(result[0].store, "Loja");
    }

    #[test]
    fn test_purchase_on_closing_day_bills_next_month() {
        let result = project_installments(
            &purchase(dec!(50), 1, date(2026, 3, 10)),
            &card(10, 5),
            Split::default(),
        )
        .unwrap();

        assert_eq!(result[0].due_date, date(2026, 4, 5));
    }

    #[test]
    fn test_due_dates_roll_over_the_year() {
        let result = project_installments(
            &purchase(dec!(400), 4, date(2026, 11, 20)),
            &card(10, 5),
            Split::default(),
        )
        .unwrap();

        assert_eq!(
            due_dates(&result),
            vec![
                date(2027, 1, 5),
                date(2027, 2, 5),
                date(2027, 3, 5),
                date(2027, 4, 5)
            ]
        );
    }

    #[test]
    fn test_due_day_clamps_and_drift_carries_forward() {
        let result = project_installments(
            &purchase(dec!(300), 3, date(2026, 1, 5)),
            &card(10, 31),
            Split::default(),
        )
        .unwrap();

        assert_eq!(
            due_dates(&result),
            vec![date(2026, 2, 28), date(2026, 3, 28), date(2026, 4, 28)]
        );
    }

    #[test]
    fn test_due_day_clamps_to_thirty_day_month() {
        let result = project_installments(
            &purchase(dec!(200), 2, date(2026, 2, 20)),
            &card(10, 31),
            Split::default(),
        )
        .unwrap();

        assert_eq!(due_dates(&result), vec![date(2026, 4, 30), date(2026, 5, 30)]);
    }

    #[test]
    fn test_due_day_clamps_to_leap_february() {
        let due = first_due_date(date(2028, 1, 2), 5, 30).unwrap();
        assert_eq!(due, date(2028, 2, 29));
    }

    #[test]
    fn test_closing_day_after_due_day() {
        // Closing on the 25th, due on the 3rd: a purchase on the 26th misses the cycle.
        assert_eq!(first_due_date(date(2026, 6, 26), 25, 3), Some(date(2026, 8, 3)));
        assert_eq!(first_due_date(date(2026, 6, 25), 25, 3), Some(date(2026, 7, 3)));
    }

    #[test]
    fn test_due_dates_strictly_increase_by_one_month() {
        let result = project_installments(
            &purchase(dec!(1200), 12, date(2026, 8, 31)),
            &card(30, 31),
            Split::default(),
        )
        .unwrap();

        assert_eq!(result.len(), 12);
        for pair in result.windows(2) {
            assert!(pair[0].due_date < pair[1].due_date);
            assert_eq!(
                pair[0].due_date.checked_add_months(Months::new(1)),
                Some(pair[1].due_date)
            );
        }
    }

    #[test]
    fn test_projection_is_idempotent() {
        let p = purchase(dec!(1000), 7, date(2026, 5, 17));
        let c = card(12, 22);
        assert_eq!(
            project_installments(&p, &c, Split::default()).unwrap(),
            project_installments(&p, &c, Split::default()).unwrap()
        );
    }

    #[test]
    fn test_remainder_lands_on_last_installment() {
        let shares = split_amount(dec!(100), 3, Split::default());
        assert_eq!(shares, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(shares.iter().copied().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_remainder_lands_on_first_installment() {
        let split = Split {
            remainder: RemainderPolicy::First,
            scale: 2,
        };
        let shares = split_amount(dec!(100), 3, split);
        assert_eq!(shares, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_unrounded_shares_sum_within_tolerance() {
        let split = Split {
            remainder: RemainderPolicy::Unrounded,
            scale: 2,
        };
        let shares = split_amount(dec!(100), 3, split);
        assert_eq!(shares.len(), 3);
        assert!(shares.iter().all(|s| *s == shares[0]));
        let sum: Decimal = shares.iter().copied().sum();
        assert!((sum - dec!(100)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_rejects_invalid_card_days() {
        let p = purchase(dec!(100), 1, date(2026, 1, 1));
        assert!(matches!(
            project_installments(&p, &card(0, 5), Split::default()),
            Err(LedgerError::InvalidCardDay { field: "closing day", day: 0, .. })
        ));
        assert!(matches!(
            project_installments(&p, &card(10, 32), Split::default()),
            Err(LedgerError::InvalidCardDay { field: "due day", day: 32, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_installments_and_non_positive_amounts() {
        let c = card(10, 5);
        assert!(matches!(
            project_installments(&purchase(dec!(100), 0, date(2026, 1, 1)), &c, Split::default()),
            Err(LedgerError::InvalidInstallmentCount { count: 0, .. })
        ));
        assert!(matches!(
            project_installments(&purchase(dec!(0), 2, date(2026, 1, 1)), &c, Split::default()),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            project_installments(&purchase(dec!(-5), 2, date(2026, 1, 1)), &c, Split::default()),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }
}
