use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::vehicle::RateTable;

const MS_PER_DAY: i64 = 86_400_000;

/// Derived quote for a rental period: billed day count and total in CZK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub days: i64,
    pub day_rate: Decimal,
    pub total: Decimal,
}

/// Billed day count for a period: the millisecond span rounded up to whole
/// days, so any started day bills as a full day. Zero for an empty or
/// inverted period.
pub fn billed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let span_ms = (end - start).num_milliseconds();
    if span_ms <= 0 {
        return 0;
    }
    (span_ms + MS_PER_DAY - 1) / MS_PER_DAY
}

/// Full day-based quote, or None when no price applies: a missing day rate
/// or an empty period. The hour4/hour12/month tiers are carried on the
/// rate table but never participate in this calculation.
pub fn quote(rates: &RateTable, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<PriceQuote> {
    let day_rate = rates.day?;
    let days = billed_days(start, end);
    if days == 0 {
        return None;
    }

    Some(PriceQuote { days, day_rate, total: Decimal::from(days) * day_rate })
}

/// Rental total as shown live while the operator edits the selection:
/// zero until both timestamps are present and a quote applies. Pure and
/// cheap enough to recompute on every input change.
pub fn rental_total(
    rates: &RateTable,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Decimal {
    match (start, end) {
        (Some(start), Some(end)) => {
            quote(rates, start, end).map(|q| q.total).unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::domain::vehicle::RateTable;

    use super::{billed_days, quote, rental_total};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn fifty_six_hours_bill_as_three_days() {
        let rates = RateTable::day_only(Decimal::from(1500));
        let q = quote(&rates, at(2024, 6, 10, 9, 0), at(2024, 6, 12, 17, 0)).expect("quote");

        assert_eq!(q.days, 3);
        assert_eq!(q.total, Decimal::from(4500));
    }

    #[test]
    fn exact_day_boundary_bills_one_day() {
        assert_eq!(billed_days(at(2024, 1, 1, 0, 0), at(2024, 1, 2, 0, 0)), 1);
    }

    #[test]
    fn one_minute_past_a_day_bills_the_next_day() {
        assert_eq!(billed_days(at(2024, 1, 1, 0, 0), at(2024, 1, 2, 0, 1)), 2);
    }

    #[test]
    fn short_positive_span_bills_one_full_day() {
        assert_eq!(billed_days(at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 30)), 1);
    }

    #[test]
    fn equal_timestamps_price_zero() {
        let rates = RateTable::day_only(Decimal::from(1500));
        let t = at(2024, 1, 1, 0, 0);
        assert_eq!(rental_total(&rates, Some(t), Some(t)), Decimal::ZERO);
    }

    #[test]
    fn inverted_period_prices_zero() {
        let rates = RateTable::day_only(Decimal::from(1600));
        let total = rental_total(&rates, Some(at(2024, 6, 12, 9, 0)), Some(at(2024, 6, 10, 9, 0)));
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn missing_timestamp_prices_zero() {
        let rates = RateTable::day_only(Decimal::from(1500));
        assert_eq!(rental_total(&rates, Some(at(2024, 6, 10, 9, 0)), None), Decimal::ZERO);
        assert_eq!(rental_total(&rates, None, Some(at(2024, 6, 12, 9, 0))), Decimal::ZERO);
    }

    #[test]
    fn table_without_day_rate_prices_zero_even_with_other_tiers() {
        let rates = RateTable {
            hour4: Some(Decimal::from(400)),
            hour12: Some(Decimal::from(900)),
            day: None,
            month: Some(Decimal::from(28000)),
        };

        let total = rental_total(&rates, Some(at(2024, 6, 10, 9, 0)), Some(at(2024, 6, 12, 9, 0)));
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn totals_scale_with_the_day_count() {
        let rates = RateTable::day_only(Decimal::from(1600));
        for days in 1..=30i64 {
            let end = at(2024, 3, 1, 0, 0) + chrono::Duration::days(days);
            let q = quote(&rates, at(2024, 3, 1, 0, 0), end).expect("quote");
            assert_eq!(q.days, days);
            assert_eq!(q.total, Decimal::from(days) * Decimal::from(1600));
        }
    }
}
