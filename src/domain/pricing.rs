use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{expand_days, nights_between};
use super::seasons::{SeasonTable, SeasonTier};
use super::DomainError;

/// Integer division rounding half away from zero, for non-negative
/// amounts. All money stays in minor units (cents); every line item is
/// rounded exactly once, never re-derived from an already-rounded
/// total.
pub fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub base_price_cents: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub cleaning_fee_cents: i64,
    pub service_fee_bps: i64,
    pub tax_bps: i64,
    pub deposit_cents: i64,
}

/// Nights grouped by season tier, in order of first occurrence within
/// the stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonLine {
    pub tier: SeasonTier,
    pub nights: i64,
    pub price_per_night_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub nights: i64,
    pub per_night: Vec<SeasonLine>,
    pub subtotal_cents: i64,
    pub cleaning_fee_cents: i64,
    pub service_fee_cents: i64,
    pub taxes_cents: i64,
    pub deposit_cents: i64,
    pub total_cents: i64,
}

/// Price a stay. Deterministic: same input, same output — the only
/// dates consulted are the ones in the supplied range.
pub fn compute_quote(input: &QuoteInput, seasons: &SeasonTable) -> Result<Quote, DomainError> {
    let nights = nights_between(input.check_in, input.check_out)?;

    let mut per_night: Vec<SeasonLine> = Vec::new();
    let mut subtotal_cents = 0i64;
    for day in expand_days(input.check_in, input.check_out) {
        let (tier, price) = seasons.nightly_price(input.base_price_cents, day);
        subtotal_cents += price;
        match per_night
            .iter_mut()
            .find(|line| line.tier == tier && line.price_per_night_cents == price)
        {
            Some(line) => {
                line.nights += 1;
                line.subtotal_cents += price;
            }
            None => per_night.push(SeasonLine {
                tier,
                nights: 1,
                price_per_night_cents: price,
                subtotal_cents: price,
            }),
        }
    }

    let service_fee_cents = round_half_up(subtotal_cents * input.service_fee_bps, 10_000);
    let taxes_cents = round_half_up(
        (subtotal_cents + input.cleaning_fee_cents + service_fee_cents) * input.tax_bps,
        10_000,
    );
    let total_cents = subtotal_cents
        + input.cleaning_fee_cents
        + service_fee_cents
        + taxes_cents
        + input.deposit_cents;

    Ok(Quote {
        nights,
        per_night,
        subtotal_cents,
        cleaning_fee_cents: input.cleaning_fee_cents,
        service_fee_cents,
        taxes_cents,
        deposit_cents: input.deposit_cents,
        total_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input(check_in: NaiveDate, check_out: NaiveDate) -> QuoteInput {
        QuoteInput {
            base_price_cents: 20_000,
            check_in,
            check_out,
            cleaning_fee_cents: 8_000,
            service_fee_bps: 1_200,
            tax_bps: 1_000,
            deposit_cents: 0,
        }
    }

    #[test]
    fn mid_season_five_night_breakdown() {
        // €200/night base, 5 mid-season nights, €80 cleaning, 12%
        // service, 10% tax, no deposit. Taxes apply to subtotal +
        // cleaning + service: (100000 + 8000 + 12000) × 10% = 12000.
        let quote = compute_quote(
            &input(d(2026, 4, 6), d(2026, 4, 11)),
            &SeasonTable::default(),
        )
        .unwrap();

        assert_eq!(quote.nights, 5);
        assert_eq!(quote.subtotal_cents, 100_000);
        assert_eq!(quote.service_fee_cents, 12_000);
        assert_eq!(quote.taxes_cents, 12_000);
        assert_eq!(quote.total_cents, 132_000);
        assert_eq!(
            quote.per_night,
            vec![SeasonLine {
                tier: SeasonTier::Mid,
                nights: 5,
                price_per_night_cents: 20_000,
                subtotal_cents: 100_000,
            }]
        );
    }

    #[test]
    fn cleaning_fee_is_part_of_the_tax_base() {
        let mut stay = input(d(2026, 4, 6), d(2026, 4, 11));
        stay.cleaning_fee_cents = 0;
        let without = compute_quote(&stay, &SeasonTable::default()).unwrap();
        assert_eq!(without.taxes_cents, 11_200);
        assert_eq!(without.total_cents, 123_200);

        stay.cleaning_fee_cents = 8_000;
        let with = compute_quote(&stay, &SeasonTable::default()).unwrap();
        // The €80 fee raises the tax by 10% of itself.
        assert_eq!(with.taxes_cents, without.taxes_cents + 800);
    }

    #[test]
    fn stay_spanning_tiers_groups_by_season() {
        // Jun 29 – Jul 3: two high nights (Jun 29, 30) then two peak
        // nights (Jul 1, 2).
        let quote = compute_quote(
            &input(d(2026, 6, 29), d(2026, 7, 3)),
            &SeasonTable::default(),
        )
        .unwrap();

        assert_eq!(quote.nights, 4);
        assert_eq!(quote.per_night.len(), 2);
        assert_eq!(quote.per_night[0].tier, SeasonTier::High);
        assert_eq!(quote.per_night[0].nights, 2);
        assert_eq!(quote.per_night[0].price_per_night_cents, 24_000);
        assert_eq!(quote.per_night[1].tier, SeasonTier::Peak);
        assert_eq!(quote.per_night[1].nights, 2);
        assert_eq!(quote.per_night[1].price_per_night_cents, 30_000);
        assert_eq!(quote.subtotal_cents, 108_000);
    }

    #[test]
    fn total_identity_holds_exactly() {
        let seasons = SeasonTable::default();
        let cases = [
            (d(2026, 1, 2), d(2026, 1, 9), 13_37, 555),
            (d(2026, 6, 25), d(2026, 7, 10), 19_999, 10_000),
            (d(2026, 12, 15), d(2027, 1, 10), 8_450, 0),
        ];
        for (check_in, check_out, base, deposit) in cases {
            let quote = compute_quote(
                &QuoteInput {
                    base_price_cents: base,
                    check_in,
                    check_out,
                    cleaning_fee_cents: 4_500,
                    service_fee_bps: 1_200,
                    tax_bps: 1_000,
                    deposit_cents: deposit,
                },
                &seasons,
            )
            .unwrap();

            assert_eq!(
                quote.total_cents,
                quote.subtotal_cents
                    + quote.cleaning_fee_cents
                    + quote.service_fee_cents
                    + quote.taxes_cents
                    + quote.deposit_cents
            );
            assert_eq!(
                quote.subtotal_cents,
                quote.per_night.iter().map(|l| l.subtotal_cents).sum::<i64>()
            );
            assert_eq!(
                quote.nights,
                quote.per_night.iter().map(|l| l.nights).sum::<i64>()
            );
        }
    }

    #[test]
    fn repeated_computation_is_deterministic() {
        let seasons = SeasonTable::default();
        let stay = input(d(2026, 6, 28), d(2026, 7, 4));
        let first = compute_quote(&stay, &seasons).unwrap();
        for _ in 0..10 {
            let again = compute_quote(&stay, &seasons).unwrap();
            assert_eq!(again.total_cents, first.total_cents);
            assert_eq!(again.per_night, first.per_night);
        }
    }

    #[test]
    fn rejects_empty_or_inverted_range() {
        let seasons = SeasonTable::default();
        assert!(matches!(
            compute_quote(&input(d(2026, 4, 6), d(2026, 4, 6)), &seasons),
            Err(DomainError::InvalidRange { .. })
        ));
        assert!(matches!(
            compute_quote(&input(d(2026, 4, 6), d(2026, 4, 1)), &seasons),
            Err(DomainError::InvalidRange { .. })
        ));
    }

    #[test]
    fn service_fee_rounds_half_up_once() {
        // subtotal 10047 × 12% = 1205.64 → 1206; tax on
        // 10047 + 0 + 1206 = 11253 × 10% = 1125.3 → 1125.
        let quote = compute_quote(
            &QuoteInput {
                base_price_cents: 3_349,
                check_in: d(2026, 4, 6),
                check_out: d(2026, 4, 9),
                cleaning_fee_cents: 0,
                service_fee_bps: 1_200,
                tax_bps: 1_000,
                deposit_cents: 0,
            },
            &SeasonTable::default(),
        )
        .unwrap();
        assert_eq!(quote.subtotal_cents, 10_047);
        assert_eq!(quote.service_fee_cents, 1_206);
        assert_eq!(quote.taxes_cents, 1_125);
    }
}
