//! Car-number parsing with leading-zero preservation.
//!
//! Driver numbers are display identifiers, not quantities: `7`, `07` and
//! `007` are three different cars. The simulator's wire format packs the
//! numeric value together with a pad count, so the parse here keeps both
//! halves. The actual bit packing is owned by the provider
//! ([`crate::Provider::pad_car_number`]); this module only normalizes user
//! input into `(value, pad)`.

use std::fmt;
use std::str::FromStr;

use crate::{Result, TelemetryError};

/// A car number split into its numeric value and leading-zero pad count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarNumber {
    /// Numeric value of the car number, without padding.
    pub value: i32,
    /// Count of leading zeros preserved for display (`"007"` has pad 2).
    pub pad: i32,
}

impl CarNumber {
    /// Parse a car-number string, preserving leading-zero padding.
    ///
    /// Leading zeros are stripped and counted. A remainder with any non-digit
    /// character fails with `InvalidArgument`; a remainder that overflows
    /// `i32` fails with `OutOfRange`.
    ///
    /// An all-zero string such as `"000"` is special-cased: the value is 0
    /// and the pad is the length minus one, reserving one zero as the "ones"
    /// digit rather than padding. A lone `"0"` therefore has pad 0.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(TelemetryError::invalid_argument(
                "car number must be a non-empty numeric string",
            ));
        }

        let digits = text.trim_start_matches('0');
        let mut pad = (text.len() - digits.len()) as i32;

        if digits.is_empty() {
            pad = text.len() as i32 - 1;
            return Ok(Self { value: 0, pad });
        }

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TelemetryError::invalid_argument("car number must be numeric"));
        }

        let value = digits
            .parse::<i32>()
            .map_err(|_| TelemetryError::out_of_range("car number overflows i32"))?;

        Ok(Self { value, pad })
    }
}

impl From<i32> for CarNumber {
    /// Numeric input passes through unchanged; padding does not apply.
    fn from(value: i32) -> Self {
        Self { value, pad: 0 }
    }
}

impl FromStr for CarNumber {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CarNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.pad {
            write!(f, "0")?;
        }
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn padded_numbers_keep_their_zeros() {
        assert_eq!(CarNumber::parse("7").unwrap(), CarNumber { value: 7, pad: 0 });
        assert_eq!(CarNumber::parse("07").unwrap(), CarNumber { value: 7, pad: 1 });
        assert_eq!(CarNumber::parse("007").unwrap(), CarNumber { value: 7, pad: 2 });
    }

    #[test]
    fn all_zero_strings_reserve_the_ones_digit() {
        // The observed upstream rule is asymmetric with ordinary stripping
        // and consumers depend on it, so it is preserved exactly.
        assert_eq!(CarNumber::parse("0").unwrap(), CarNumber { value: 0, pad: 0 });
        assert_eq!(CarNumber::parse("00").unwrap(), CarNumber { value: 0, pad: 1 });
        assert_eq!(CarNumber::parse("000").unwrap(), CarNumber { value: 0, pad: 2 });
    }

    #[test]
    fn empty_string_is_invalid() {
        let err = CarNumber::parse("").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidArgument { .. }));
    }

    #[test]
    fn non_digit_remainder_is_invalid() {
        for bad in ["12a", "a12", "0x7", " 7", "7 ", "-7"] {
            let err = CarNumber::parse(bad).unwrap_err();
            assert!(matches!(err, TelemetryError::InvalidArgument { .. }), "input {bad:?}");
        }
    }

    #[test]
    fn overflow_is_out_of_range() {
        let err = CarNumber::parse("2147483648").unwrap_err();
        assert!(matches!(err, TelemetryError::OutOfRange { .. }));

        assert_eq!(
            CarNumber::parse("2147483647").unwrap(),
            CarNumber { value: i32::MAX, pad: 0 }
        );
    }

    #[test]
    fn numeric_input_passes_through() {
        assert_eq!(CarNumber::from(42), CarNumber { value: 42, pad: 0 });
        assert_eq!(CarNumber::from(-1), CarNumber { value: -1, pad: 0 });
    }

    #[test]
    fn display_restores_the_padding() {
        assert_eq!(CarNumber::parse("007").unwrap().to_string(), "007");
        assert_eq!(CarNumber::parse("0").unwrap().to_string(), "0");
        assert_eq!(CarNumber::from(42).to_string(), "42");
    }

    proptest! {
        #[test]
        fn prop_display_parse_round_trip(value in 1..=9999i32, pad in 0..4i32) {
            let text = format!("{}{}", "0".repeat(pad as usize), value);
            let parsed = CarNumber::parse(&text).unwrap();
            prop_assert_eq!(parsed, CarNumber { value, pad });
            prop_assert_eq!(parsed.to_string(), text);
        }

        #[test]
        fn prop_parse_never_panics(text in ".*") {
            let _ = CarNumber::parse(&text);
        }
    }
}
