#![forbid(unsafe_code)]

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

/// Exact rational literal, always reduced with a positive denominator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rational(BigRational);

impl Rational {
    /// Returns `None` for a zero denominator.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        Some(Self(BigRational::new(num.into(), den.into())))
    }

    pub fn from_int(n: i64) -> Self {
        Self(BigRational::from_integer(n.into()))
    }

    /// Parses `digits` or `digits.digits` exactly, at any length.
    pub fn from_decimal(text: &str) -> Option<Self> {
        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
        if whole.is_empty() || !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let numer = BigInt::parse_bytes(format!("{whole}{frac}").as_bytes(), 10)?;
        let denom = num_traits::pow(BigInt::from(10), frac.len());
        Some(Self(BigRational::new(numer, denom)))
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn is_negative(&self) -> bool {
        self.0.numer() < &BigInt::zero()
    }

    /// Nearest float; huge magnitudes saturate to infinity.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_reduce_exactly() {
        assert_eq!(Rational::from_decimal("0.5"), Rational::new(1, 2));
        assert_eq!(Rational::from_decimal("3.30"), Rational::new(33, 10));
        assert_eq!(Rational::from_decimal("7"), Some(Rational::from_int(7)));
        assert_eq!(Rational::from_decimal("2.00").map(|r| r.is_integer()), Some(true));
    }

    #[test]
    fn long_decimals_stay_exact() {
        let r = Rational::from_decimal("0.00000000000000000001").unwrap();
        assert_eq!(r.numer(), &BigInt::from(1));
        assert_eq!(r.denom(), &num_traits::pow(BigInt::from(10), 20));
        assert_eq!(r.to_string(), "1/100000000000000000000");

        let big = Rational::from_decimal("1234567890123456789012345.5").unwrap();
        assert_eq!(big.to_string(), "2469135780246913578024691/2");
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(Rational::from_decimal(".5"), None);
        assert_eq!(Rational::from_decimal("1.x"), None);
        assert_eq!(Rational::from_decimal("-1.5"), None);
    }

    #[test]
    fn sign_lives_on_the_numerator() {
        let r = Rational::new(3, -6).unwrap();
        assert_eq!((r.numer(), r.denom()), (&BigInt::from(-1), &BigInt::from(2)));
        assert!(r.is_negative());
        assert_eq!(Rational::new(1, 0), None);
        assert_eq!(r.to_string(), "-1/2");
    }
}
