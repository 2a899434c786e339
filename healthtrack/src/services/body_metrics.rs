//! Metrics derived from body measurements.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{Error, Result};

const CENTIMETRES_PER_METRE: Decimal = Decimal::ONE_HUNDRED;
const HEIGHT_SCALE: u32 = 4;
const BMI_SCALE: u32 = 2;

/// Largest value the `NUMERIC(6, 2)` measurement columns (weight, BMI, height) can hold
pub fn max_stored_measurement() -> Decimal {
    Decimal::new(999_999, 2)
}

fn too_large(what: &str, height_cm: Decimal, weight_kg: Decimal) -> Error {
    Error::InvalidBodyMeasurement {
        message: format!("{what} is out of range for height {height_cm} cm and weight {weight_kg} kg"),
    }
}

/// Body-mass index from a height in centimetres and a weight in kilograms.
///
/// The height is converted to metres at four decimal places and the index is reported at two,
/// both rounded half away from zero. Inputs whose index cannot be represented fail with
/// [`Error::InvalidBodyMeasurement`] instead of overflowing.
pub fn bmi(height_cm: Decimal, weight_kg: Decimal) -> Result<Decimal> {
    if height_cm <= Decimal::ZERO {
        return Err(Error::InvalidBodyMeasurement {
            message: format!("height must be positive, got {height_cm} cm"),
        });
    }
    if weight_kg <= Decimal::ZERO {
        return Err(Error::InvalidBodyMeasurement {
            message: format!("weight must be positive, got {weight_kg} kg"),
        });
    }

    let height_m = height_cm
        .checked_div(CENTIMETRES_PER_METRE)
        .ok_or_else(|| too_large("height", height_cm, weight_kg))?
        .round_dp_with_strategy(HEIGHT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let squared = height_m
        .checked_mul(height_m)
        .ok_or_else(|| too_large("height", height_cm, weight_kg))?;
    if squared.is_zero() {
        // below 0.00005 m the rounded height is zero
        return Err(Error::InvalidBodyMeasurement {
            message: format!("height {height_cm} cm is too small"),
        });
    }

    let mut index = weight_kg
        .checked_div(squared)
        .ok_or_else(|| too_large("BMI", height_cm, weight_kg))?
        .round_dp_with_strategy(BMI_SCALE, RoundingStrategy::MidpointAwayFromZero);
    index.rescale(BMI_SCALE);
    Ok(index)
}

/// [`bmi`], additionally rejecting an index too large to store.
pub fn storable_bmi(height_cm: Decimal, weight_kg: Decimal) -> Result<Decimal> {
    let index = bmi(height_cm, weight_kg)?;
    if index > max_stored_measurement() {
        return Err(too_large("BMI", height_cm, weight_kg));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn reference_value() {
        assert_eq!(bmi(dec("170"), dec("70")).unwrap(), dec("24.22"));
        assert_eq!(bmi(dec("170"), dec("70")).unwrap().to_string(), "24.22");
    }

    #[test]
    fn fractional_inputs() {
        // 1.8250 m, 3.33062500 m², 82.4 / 3.330625 = 24.7401...
        assert_eq!(bmi(dec("182.5"), dec("82.4")).unwrap(), dec("24.74"));
        // 1.6000 m, 2.56 m², 64 / 2.56 = 25 exactly, still reported with two places
        assert_eq!(bmi(dec("160"), dec("64")).unwrap().to_string(), "25.00");
    }

    #[test]
    fn height_rounds_to_four_places_first() {
        // 170.004 cm -> 1.70004 m -> 1.7000 m, so the result matches 170 cm
        assert_eq!(bmi(dec("170.004"), dec("70")).unwrap(), bmi(dec("170"), dec("70")).unwrap());
    }

    #[test]
    fn rejects_non_positive_measurements() {
        for (height, weight) in [("0", "70"), ("-170", "70"), ("170", "0"), ("170", "-1")] {
            let result = bmi(dec(height), dec(weight));
            assert!(
                matches!(result, Err(Error::InvalidBodyMeasurement { .. })),
                "height={height} weight={weight}"
            );
        }
    }

    #[test]
    fn rejects_height_that_rounds_to_zero() {
        assert!(matches!(bmi(dec("0.001"), dec("70")), Err(Error::InvalidBodyMeasurement { .. })));
    }

    #[test]
    fn huge_weight_is_an_error_not_a_panic() {
        // 1.0E21 / 0.00000001 m² and MAX / 0.25 m² both exceed the decimal range
        assert!(matches!(bmi(dec("50"), Decimal::MAX), Err(Error::InvalidBodyMeasurement { .. })));
        assert!(matches!(
            bmi(dec("0.01"), dec("1000000000000000000000")),
            Err(Error::InvalidBodyMeasurement { .. })
        ));
    }

    #[test]
    fn storable_bmi_respects_column_bounds() {
        assert_eq!(storable_bmi(dec("170"), dec("70")).unwrap(), dec("24.22"));
        // 50 kg at 1 cm is representable but far above 9999.99
        assert!(bmi(dec("1"), dec("50")).is_ok());
        assert!(matches!(storable_bmi(dec("1"), dec("50")), Err(Error::InvalidBodyMeasurement { .. })));
    }
}
