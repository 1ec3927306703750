//! Amount type for handling Rupiah values.
//!
//! Sheets format money as `Rp 1.234.567,89`, where `.` groups thousands and `,` is the decimal
//! separator. `Amount` wraps a `Decimal` and knows how to read that form and how to print it back.

use crate::model::Cell;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg};
use std::str::FromStr;

/// Represents a Rupiah amount.
///
/// Serializes as a JSON number. Use `Display` (`Rp 1.234.567`) or `signed_display`
/// (`-Rp 1.234.567`) for the human-readable forms, both of which drop the fractional part.
///
/// # Examples
///
/// ```
/// # use byeboros::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("Rp 1.234.567,89").unwrap();
/// assert_eq!(amount.to_string(), "Rp 1.234.567");
/// assert_eq!(amount.signed_display(true), "+Rp 1.234.567");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Reads an amount out of a cell without failing. Numbers are taken as-is, text goes through
    /// `FromStr`, and anything unparseable (or an empty cell) becomes zero.
    pub fn from_cell(cell: &Cell) -> Self {
        match cell {
            Cell::Number(n) => Decimal::from_f64(*n).map(Amount).unwrap_or_default(),
            Cell::Text(s) => Amount::from_str(s).unwrap_or_default(),
            Cell::Empty => Amount::ZERO,
        }
    }

    /// Formats the absolute value, truncated toward zero, with `+Rp ` for income and `-Rp ` for
    /// expenses.
    pub fn signed_display(&self, is_income: bool) -> String {
        let sign = if is_income { '+' } else { '-' };
        format!("{sign}Rp {}", group_thousands(self.0))
    }

    /// The value as it should be written into a cell: a plain number with `.` as the decimal
    /// point, which the sheet parses as a number.
    pub(crate) fn to_cell_string(self) -> String {
        self.0.normalize().to_string()
    }

    /// Reads an amount typed on the command line. It is `from_str` except that every `.` must
    /// be followed by a group of exactly three digits, so `12.5` is refused rather than read as
    /// `125`. Use `,` for a fraction, e.g. `12,5`.
    pub fn from_input(s: &str) -> Result<Amount, String> {
        let whole = s.split(',').next().unwrap_or_default();
        let bad_group = whole.split('.').skip(1).any(|group| {
            let group = group.trim();
            group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit())
        });
        if bad_group {
            return Err(format!(
                "'{s}' is ambiguous: '.' separates thousands, use ',' for a fraction (e.g. 12,5)"
            ));
        }
        Amount::from_str(s).map_err(|e| format!("'{s}' is not an amount: {e}"))
    }
}

/// Truncates toward zero, drops the sign and groups thousands with `.`.
fn group_thousands(value: Decimal) -> String {
    let digits = value.trunc().abs().normalize().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(after_minus) => (true, after_minus),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        // "Rp 1.234.567,89" -> "1234567.89"
        let digits: String = rest
            .replace("Rp", "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let normalized = digits.replace('.', "").replace(',', ".");

        let value = Decimal::from_str(&normalized).map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.0.trunc().is_sign_negative() && !self.0.trunc().is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{sign}Rp {}", group_thousands(self.0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_rupiah_with_decimal_comma() {
        let amount = Amount::from_str("Rp 1.234.567,89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_plain_digits() {
        let amount = Amount::from_str("50000").unwrap();
        assert_eq!(amount.value(), dec("50000"));
    }

    #[test]
    fn test_parse_negative_rupiah() {
        let amount = Amount::from_str("-Rp 25.000").unwrap();
        assert_eq!(amount.value(), dec("-25000"));
        assert!(amount.is_negative());
    }

    #[test]
    fn test_dot_is_always_a_thousands_separator() {
        // A plain "1.5" is read the Indonesian way.
        let amount = Amount::from_str("1.5").unwrap();
        assert_eq!(amount.value(), dec("15"));
    }

    #[test]
    fn test_from_input_refuses_short_thousands_group() {
        assert!(Amount::from_input("12.5").is_err());
        assert!(Amount::from_input("1.23").is_err());
        assert!(Amount::from_input("1.2345").is_err());
        assert_eq!(Amount::from_input("12,5").unwrap().value(), dec("12.5"));
        assert_eq!(Amount::from_input("12.500").unwrap().value(), dec("12500"));
        assert_eq!(
            Amount::from_input("Rp 1.234.567,89").unwrap().value(),
            dec("1234567.89")
        );
        assert_eq!(Amount::from_input("18000").unwrap().value(), dec("18000"));
        assert!(Amount::from_input("Rp abc").is_err());
    }

    #[test]
    fn test_display_beyond_f64_precision() {
        let amount = Amount::from_str("Rp 12.345.678.901.234.567.891").unwrap();
        assert_eq!(amount.to_string(), "Rp 12.345.678.901.234.567.891");
        assert_eq!(Amount::from(100).to_string(), "Rp 100");
        assert_eq!(Amount::from(1000).to_string(), "Rp 1.000");
        assert_eq!(Amount::from(100_000).to_string(), "Rp 100.000");
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("   ").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Amount::from_str("Rp abc").is_err());
    }

    #[test]
    fn test_from_cell_is_lenient() {
        assert_eq!(Amount::from_cell(&Cell::from("Rp abc")), Amount::ZERO);
        assert_eq!(Amount::from_cell(&Cell::Empty), Amount::ZERO);
        assert_eq!(
            Amount::from_cell(&Cell::Number(45000.0)).value(),
            dec("45000")
        );
        assert_eq!(
            Amount::from_cell(&Cell::from("Rp 45.000")).value(),
            dec("45000")
        );
    }

    #[test]
    fn test_signed_display() {
        let amount = Amount::from(1_234_567);
        assert_eq!(amount.signed_display(false), "-Rp 1.234.567");
        assert_eq!(amount.signed_display(true), "+Rp 1.234.567");
    }

    #[test]
    fn test_signed_display_truncates_and_drops_sign() {
        let amount = Amount::new(dec("-999.99"));
        assert_eq!(amount.signed_display(false), "-Rp 999");
        assert_eq!(Amount::ZERO.signed_display(true), "+Rp 0");
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from(9_500_000).to_string(), "Rp 9.500.000");
        assert_eq!(Amount::from(-580_000).to_string(), "-Rp 580.000");
        assert_eq!(Amount::new(dec("-0.5")).to_string(), "Rp 0");
    }

    #[test]
    fn test_sum() {
        let total: Amount = [Amount::from(1), Amount::from(2), Amount::from(3)]
            .iter()
            .sum();
        assert_eq!(total, Amount::from(6));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Amount::from(50_000)).unwrap();
        assert_eq!(json, "50000.0");
    }

    #[test]
    fn test_to_cell_string() {
        assert_eq!(Amount::new(dec("50000.00")).to_cell_string(), "50000");
        assert_eq!(Amount::new(dec("12.50")).to_cell_string(), "12.5");
    }
}
