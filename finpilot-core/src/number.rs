//! Arbitrary precision numbers using dashu
//!
//! Money and rate arithmetic runs on dashu-float's DBig (decimal base),
//! so rupee amounts keep exact decimal digits and there is no NaN or
//! infinity to leak into a result.

use dashu_float::DBig;
use dashu_float::ops::{Abs, SquareRoot};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    DomainError(String),
}

/// Working precision in decimal digits
const DEFAULT_PRECISION: usize = 50;

/// Parsed literals must lie within 10^-100 ..= 10^100 in magnitude
const MAX_DECIMAL_EXPONENT: isize = 100;

/// Largest |y * ln x| that `pow_real` will exponentiate
const MAX_EXP_ARGUMENT: i64 = 100_000;

/// Arbitrary precision decimal number
///
/// Every constructor pins the working precision, so division and the
/// transcendental functions always have a finite precision to round to.
#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

impl Number {
    // ========== Construction ==========

    fn with_work_precision(val: DBig) -> DBig {
        val.with_precision(DEFAULT_PRECISION).value()
    }

    /// Parse a decimal literal: "123", "-8.5", "1.5e5", "25000"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NumberError::ParseError(s.to_string()));
        }

        let invalid = || NumberError::ParseError(s.to_string());
        let lower = s.to_lowercase();
        let inner = match lower.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: isize = exp.parse().map_err(|_| invalid())?;
                if exp.unsigned_abs() > MAX_DECIMAL_EXPONENT.unsigned_abs() {
                    return Err(NumberError::ParseError(format!("{} (exponent out of range)", s)));
                }
                // Integer mantissa ("15e5") goes through IBig so no digits
                // are lost to an intermediate float
                if mantissa.contains('.') {
                    s.parse::<DBig>().map_err(|_| invalid())?
                } else {
                    let mantissa: dashu_int::IBig = mantissa.parse().map_err(|_| invalid())?;
                    DBig::from_parts(mantissa, exp)
                }
            }
            None => s.parse::<DBig>().map_err(|_| invalid())?,
        };

        if !Self::in_literal_range(&inner) {
            return Err(NumberError::ParseError(format!("{} (magnitude out of range)", s)));
        }
        Ok(Self { inner: Self::with_work_precision(inner) })
    }

    /// Zero, or a decimal order of magnitude within ±MAX_DECIMAL_EXPONENT
    fn in_literal_range(val: &DBig) -> bool {
        if *val == DBig::ZERO {
            return true;
        }
        let (significand, exponent) = val.clone().into_repr().into_parts();
        let digits = significand.to_string().trim_start_matches('-').len() as isize;
        let magnitude = exponent.saturating_add(digits - 1);
        (-MAX_DECIMAL_EXPONENT..=MAX_DECIMAL_EXPONENT).contains(&magnitude)
    }

    pub fn from_i64(n: i64) -> Self {
        Self { inner: Self::with_work_precision(DBig::from(n)) }
    }

    /// Exact ratio num/den. A zero denominator yields zero; callers that
    /// care use `checked_div`.
    pub fn from_ratio(num: i64, den: i64) -> Self {
        if den == 0 {
            return Self::zero();
        }
        let n = Self::with_work_precision(DBig::from(num));
        let d = Self::with_work_precision(DBig::from(den));
        Self { inner: n / d }
    }

    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    pub fn one() -> Self {
        Self::from_i64(1)
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.inner > DBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        self.inner == self.inner.clone().floor()
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    pub fn neg(&self) -> Self {
        Self { inner: -&self.inner }
    }

    /// Division that reports a zero divisor instead of panicking
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self { inner: &self.inner / &other.inner })
        }
    }

    /// Integer power by repeated squaring. A negative exponent of zero
    /// is a division by zero.
    pub fn pow(&self, exp: i32) -> Result<Self, NumberError> {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut remaining = exp.unsigned_abs();

        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&base);
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul(&base);
            }
        }

        if exp < 0 {
            Self::one().checked_div(&result)
        } else {
            Ok(result)
        }
    }

    /// Real power x^y. Whole exponents use `pow`; fractional exponents go
    /// through exp(y * ln x) and need x > 0 (x = 0 gives 0).
    pub fn pow_real(&self, exp: &Self, precision: u32) -> Result<Self, NumberError> {
        if exp.is_zero() {
            return Ok(Self::one());
        }
        if exp.is_integer() {
            if let Some(e) = exp.to_i64().and_then(|e| i32::try_from(e).ok()) {
                return self.pow(e);
            }
        }
        if self.is_zero() {
            return if exp.is_negative() {
                Err(NumberError::DivisionByZero)
            } else {
                Ok(Self::zero())
            };
        }
        if self.is_negative() {
            return Err(NumberError::DomainError(format!(
                "fractional power {} of negative number {}",
                exp, self
            )));
        }

        let power = self.ln(precision)?.mul(exp);
        if power.abs() > Self::from_i64(MAX_EXP_ARGUMENT) {
            return Err(NumberError::DomainError(format!(
                "{} to the power {} is out of range",
                self, exp
            )));
        }
        Ok(power.exp(precision))
    }

    pub fn sqrt(&self, precision: u32) -> Result<Self, NumberError> {
        if self.is_negative() {
            return Err(NumberError::DomainError(
                "square root of negative number".to_string(),
            ));
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let val = self.inner.clone().with_precision(precision as usize).value();
        Ok(Self { inner: val.sqrt() })
    }

    pub fn ln(&self, precision: u32) -> Result<Self, NumberError> {
        if !self.is_positive() {
            return Err(NumberError::DomainError(
                "logarithm of non-positive number".to_string(),
            ));
        }
        let val = self.inner.clone().with_precision(precision as usize).value();
        Ok(Self { inner: val.ln() })
    }

    pub fn exp(&self, precision: u32) -> Self {
        let val = self.inner.clone().with_precision(precision as usize).value();
        Self { inner: val.exp() }
    }

    // ========== Rounding ==========

    pub fn abs(&self) -> Self {
        Self { inner: Abs::abs(self.inner.clone()) }
    }

    pub fn floor(&self) -> Self {
        Self { inner: self.inner.clone().floor() }
    }

    /// Round half away from zero to `places` decimal places
    pub fn round_to(&self, places: u32) -> Self {
        let scale = Self::from_i64(10).pow(places as i32).unwrap_or_else(|_| Self::one());
        let half = Self::from_ratio(1, 2);
        let scaled = self.abs().mul(&scale).add(&half).floor();
        let rounded = scaled.checked_div(&scale).unwrap_or_else(|_| scaled.clone());
        if self.is_negative() {
            rounded.neg()
        } else {
            rounded
        }
    }

    // ========== Conversion ==========

    /// Integer value, if this number is whole and fits in i64
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }

        // DBig is significand * 10^exponent with trailing zeros stripped
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();
        let sig: i64 = significand.try_into().ok()?;

        match exponent {
            0 => Some(sig),
            e if e > 0 => sig.checked_mul(10_i64.checked_pow(u32::try_from(e).ok()?)?),
            e => {
                let divisor = 10_i64.checked_pow(u32::try_from(-e).ok()?)?;
                (sig % divisor == 0).then(|| sig / divisor)
            }
        }
    }

    // ========== Display ==========

    /// Render with a fixed number of decimal places, exactly
    pub fn as_decimal(&self, places: u32) -> String {
        let (significand, exponent) = self.round_to(places).inner.into_repr().into_parts();
        let text = significand.to_string();
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };

        // digits * 10^(exponent + places) is the value scaled to a whole number
        let shift = exponent + places as isize;
        let mut scaled = digits.to_string();
        if shift >= 0 {
            scaled.push_str(&"0".repeat(shift as usize));
        } else {
            scaled.truncate(scaled.len().saturating_sub(shift.unsigned_abs()));
        }

        let places = places as usize;
        if scaled.len() <= places {
            scaled = format!("{}{}", "0".repeat(places + 1 - scaled.len()), scaled);
        }
        let sign = if scaled.bytes().all(|b| b == b'0') { "" } else { sign };

        if places == 0 {
            format!("{}{}", sign, scaled)
        } else {
            let (whole, fraction) = scaled.split_at(scaled.len() - places);
            format!("{}{}.{}", sign, whole, fraction)
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.as_decimal(10);
        let trimmed = text.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}", trimmed)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner
            .partial_cmp(&other.inner)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}
