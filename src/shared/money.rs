//! Conversions between major-unit decimals (API) and minor units (storage).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert `12.34` into `1234`. Returns `None` for more than two decimal
/// places or values that do not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let normalized = amount.normalize();
    if normalized.scale() > 2 {
        return None;
    }
    (normalized * Decimal::ONE_HUNDRED).to_i64()
}

/// Convert `1234` into `12.34`.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn whole_and_fractional_amounts_convert() {
        assert_eq!(to_minor_units(Decimal::from(200)), Some(20_000));
        assert_eq!(to_minor_units(Decimal::from_str("99.90").unwrap()), Some(9_990));
        assert_eq!(to_minor_units(Decimal::from_str("0.5").unwrap()), Some(50));
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert_eq!(to_minor_units(Decimal::from_str("1.005").unwrap()), None);
    }

    #[test]
    fn minor_units_render_as_decimal() {
        assert_eq!(from_minor_units(20_000).to_string(), "200.00");
        assert_eq!(from_minor_units(5).to_string(), "0.05");
    }
}
