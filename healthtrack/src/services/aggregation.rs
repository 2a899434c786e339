//! Weighted sums of per-100-unit values.
//!
//! Reference data stores nutrient values per 100 g; a consumed record scales them by the eaten
//! quantity. For every dimension the total is `sum((value ?? 0) * quantity / 100)`, where each
//! term and the running sum are rounded to two decimal places, half away from zero. Arithmetic is
//! checked: a term or total outside the decimal range is [`Error::AggregationOverflow`].

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Decimal places kept by every term and total
pub const TOTAL_SCALE: u32 = 2;

const PER_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A named dimension reported by an aggregation.
pub trait Dimension: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// Every dimension, in report order
    const ALL: &'static [Self];
}

/// A record contributing to a weighted sum.
pub trait WeightedRecord<D: Dimension> {
    /// Per-100-unit value of `dimension`; `None` counts as zero
    fn value(&self, dimension: D) -> Option<Decimal>;

    /// Consumed quantity; `None` makes the record contribute nothing
    fn quantity(&self) -> Option<Decimal>;
}

/// Totals per dimension together with the records they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult<D: Ord, T> {
    pub totals: BTreeMap<D, Decimal>,
    pub details: Vec<T>,
}

impl<D: Dimension, T> AggregateResult<D, T> {
    /// Total of one dimension, zero when absent
    pub fn total(&self, dimension: D) -> Decimal {
        self.totals.get(&dimension).copied().unwrap_or(Decimal::ZERO)
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(TOTAL_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow<D: Dimension>(dimension: D) -> Error {
    Error::AggregationOverflow {
        dimension: format!("{dimension:?}").to_lowercase(),
    }
}

/// One record's rounded contribution to `dimension`.
pub fn weighted_term<D: Dimension>(dimension: D, value: Option<Decimal>, quantity: Option<Decimal>) -> Result<Decimal> {
    match (value, quantity) {
        (Some(value), Some(quantity)) => value
            .checked_mul(quantity)
            .and_then(|product| product.checked_div(PER_HUNDRED))
            .map(round)
            .ok_or_else(|| overflow(dimension)),
        _ => Ok(Decimal::ZERO),
    }
}

/// Stateless reducer over [`WeightedRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSumAggregator;

impl WeightedSumAggregator {
    /// Totals for every dimension in [`Dimension::ALL`]; an empty input yields all zeros.
    pub fn totals<D, R>(records: &[R]) -> Result<BTreeMap<D, Decimal>>
    where
        D: Dimension,
        R: WeightedRecord<D>,
    {
        D::ALL
            .iter()
            .map(|&dimension| {
                let total = records.iter().try_fold(Decimal::ZERO, |sum, record| {
                    let term = weighted_term(dimension, record.value(dimension), record.quantity())?;
                    sum.checked_add(term).map(round).ok_or_else(|| overflow(dimension))
                })?;
                Ok((dimension, fixed_scale(total)))
            })
            .collect()
    }

    /// Totals plus the records themselves
    pub fn aggregate<D, R>(records: Vec<R>) -> Result<AggregateResult<D, R>>
    where
        D: Dimension,
        R: WeightedRecord<D>,
    {
        Ok(AggregateResult {
            totals: Self::totals::<D, R>(&records)?,
            details: records,
        })
    }
}

/// Always report two decimal places, so `300` serializes as `300.00`
fn fixed_scale(mut total: Decimal) -> Decimal {
    total.rescale(TOTAL_SCALE);
    total
}

/// Nutrients tracked for diet records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    Carbohydrates,
    Water,
}

impl Dimension for Nutrient {
    const ALL: &'static [Self] = &[
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbohydrates,
        Nutrient::Water,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Energy {
        Calories,
    }

    impl Dimension for Energy {
        const ALL: &'static [Self] = &[Energy::Calories];
    }

    struct Portion {
        calories: Option<Decimal>,
        quantity: Option<Decimal>,
    }

    impl WeightedRecord<Energy> for Portion {
        fn value(&self, _dimension: Energy) -> Option<Decimal> {
            self.calories
        }

        fn quantity(&self) -> Option<Decimal> {
            self.quantity
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn portion(calories: Option<&str>, quantity: Option<&str>) -> Portion {
        Portion {
            calories: calories.map(dec),
            quantity: quantity.map(dec),
        }
    }

    #[test]
    fn empty_input_yields_zero_totals() {
        let totals = WeightedSumAggregator::totals::<Nutrient, NutrientRecord>(&[]).unwrap();
        assert_eq!(totals.len(), Nutrient::ALL.len());
        assert!(totals.values().all(|total| total.is_zero()));
    }

    #[test]
    fn null_value_contributes_zero() {
        let records = [portion(Some("200"), Some("150")), portion(None, Some("50"))];
        let totals = WeightedSumAggregator::totals::<Energy, _>(&records).unwrap();

        assert_eq!(totals[&Energy::Calories], dec("300.00"));
        assert_eq!(totals[&Energy::Calories].to_string(), "300.00");
    }

    #[test]
    fn missing_quantity_contributes_zero() {
        let records = [portion(Some("120"), None), portion(Some("80"), Some("100"))];
        let totals = WeightedSumAggregator::totals::<Energy, _>(&records).unwrap();

        assert_eq!(totals[&Energy::Calories], dec("80"));
    }

    #[test]
    fn each_term_is_rounded_half_up() {
        // 33.33 * 15 / 100 = 4.9995 -> 5.00 ; 0.5 * 1 / 100 = 0.005 -> 0.01
        let term = |value, quantity| weighted_term(Energy::Calories, Some(dec(value)), Some(dec(quantity))).unwrap();
        assert_eq!(term("33.33", "15"), dec("5.00"));
        assert_eq!(term("0.5", "1"), dec("0.01"));
        assert_eq!(term("0.4", "1"), dec("0.00"));
    }

    #[test]
    fn rounding_happens_per_term_not_on_the_sum() {
        // three terms of 0.005 each round to 0.01, giving 0.03 rather than round(0.015) = 0.02
        let records = [
            portion(Some("0.5"), Some("1")),
            portion(Some("0.5"), Some("1")),
            portion(Some("0.5"), Some("1")),
        ];
        let totals = WeightedSumAggregator::totals::<Energy, _>(&records).unwrap();

        assert_eq!(totals[&Energy::Calories], dec("0.03"));
    }

    #[test]
    fn totals_never_decrease_when_adding_non_negative_terms() {
        let mut records = Vec::new();
        let mut previous = Decimal::ZERO;
        for (value, quantity) in [("52.1", "130"), ("0", "10"), ("13.7", "99.5"), ("1.05", "0.5")] {
            records.push(portion(Some(value), Some(quantity)));
            let total = WeightedSumAggregator::totals::<Energy, _>(&records).unwrap()[&Energy::Calories];
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn overflowing_term_is_a_typed_error() {
        let result = weighted_term(Energy::Calories, Some(Decimal::MAX), Some(dec("200")));
        match result {
            Err(Error::AggregationOverflow { dimension }) => assert_eq!(dimension, "calories"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overflowing_sum_is_a_typed_error() {
        // every term is about MAX / 1000 and fits, 1001 of them do not
        let value = Decimal::MAX / dec("1000");
        let records: Vec<Portion> = (0..1001)
            .map(|_| Portion {
                calories: Some(value),
                quantity: Some(dec("100")),
            })
            .collect();

        assert!(weighted_term(Energy::Calories, Some(value), Some(dec("100"))).is_ok());
        assert!(matches!(
            WeightedSumAggregator::totals::<Energy, _>(&records),
            Err(Error::AggregationOverflow { .. })
        ));
    }

    struct NutrientRecord {
        values: [Option<Decimal>; 5],
        quantity: Decimal,
    }

    impl WeightedRecord<Nutrient> for NutrientRecord {
        fn value(&self, dimension: Nutrient) -> Option<Decimal> {
            self.values[dimension as usize]
        }

        fn quantity(&self) -> Option<Decimal> {
            Some(self.quantity)
        }
    }

    #[test]
    fn every_nutrient_is_aggregated_independently() {
        let records = vec![
            NutrientRecord {
                values: [Some(dec("130")), Some(dec("2.7")), Some(dec("0.3")), Some(dec("28")), None],
                quantity: dec("200"),
            },
            NutrientRecord {
                values: [Some(dec("155")), Some(dec("13")), Some(dec("11")), None, Some(dec("75"))],
                quantity: dec("50"),
            },
        ];

        let result = WeightedSumAggregator::aggregate::<Nutrient, _>(records).unwrap();

        assert_eq!(result.total(Nutrient::Calories), dec("337.50"));
        assert_eq!(result.total(Nutrient::Protein), dec("11.90"));
        assert_eq!(result.total(Nutrient::Fat), dec("6.10"));
        assert_eq!(result.total(Nutrient::Carbohydrates), dec("56.00"));
        assert_eq!(result.total(Nutrient::Water), dec("37.50"));
        assert_eq!(result.details.len(), 2);
    }

    #[test]
    fn totals_serialize_with_nutrient_names() {
        let result: AggregateResult<Nutrient, ()> = AggregateResult {
            totals: WeightedSumAggregator::totals::<Nutrient, NutrientRecord>(&[]).unwrap(),
            details: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totals"]["calories"], "0.00");
        assert_eq!(json["totals"]["carbohydrates"], "0.00");
    }
}
