//! Fixed-point scalar arithmetic
//!
//! The `Number` type is the only numeric type ChipScript programs can
//! observe. It stores a signed 64-bit raw value scaled by 1000, giving
//! exactly three fractional digits. The arithmetic laws here define
//! program semantics, so results must be bit-identical across hosts:
//! - addition, subtraction and negation wrap on the raw value
//! - multiplication and division widen through `i128` and truncate
//!   toward zero
//! - conversions from wider types saturate at the representable range
//! - degree-based trigonometry uses a pinned pi constant, never the
//!   host library's

use crate::error::{ExecutionError, ParseNumberError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Pi to eleven digits. Degree/radian conversion uses this exact value
/// so trigonometric results do not drift between platforms or math
/// library versions.
pub const PI: f64 = 3.14159265359;

/// Square root operands at or above this raw value produce `MIN`.
const SQRT_UPPER_CUTOFF: i64 = 9_223_372_036_854_775_000;

/// A fixed-point decimal with three fractional digits.
///
/// The mathematical value is `raw / 1000` where `raw` is a signed
/// 64-bit integer. Equality and ordering are equality and ordering of
/// raw values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Number(i64);

impl Number {
    /// Raw units per whole unit.
    pub const SCALE: i64 = 1000;

    /// Fractional digits carried by the textual form.
    pub const DECIMAL_DIGITS: u32 = 3;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(Self::SCALE);

    /// The most negative representable value, `-9223372036854775.808`.
    pub const MIN: Self = Self(i64::MIN);

    /// The most positive representable value, `9223372036854775.807`.
    pub const MAX: Self = Self(i64::MAX);

    /// Construct from a raw scaled value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The underlying scaled value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// True when the fractional part is zero.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.0 % Self::SCALE == 0
    }

    /// Approximate the value as a double. Lossy above 2^53 raw.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Saturating conversion from a double.
    ///
    /// Values beyond the representable range clamp to `MIN`/`MAX`. NaN
    /// maps to `MIN`, so domain errors from `sqrt`, `asin`, `acos` and
    /// `pow` all surface as the same sentinel.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        // `as` saturates at the i64 bounds and truncates toward zero.
        Self((value * Self::SCALE as f64) as i64)
    }

    /// Division. Raw result is `(raw_a * 1000) / raw_b` with an `i128`
    /// intermediate, truncating toward zero.
    ///
    /// # Errors
    ///
    /// `ExecutionError::DivideByZero` when `rhs` is zero.
    pub fn div(self, rhs: Self) -> Result<Self, ExecutionError> {
        if rhs.0 == 0 {
            return Err(ExecutionError::DivideByZero);
        }
        Ok(self.div_unchecked(rhs))
    }

    /// Division without the zero check, for operands already proven
    /// non-zero.
    #[must_use]
    pub fn div_unchecked(self, rhs: Self) -> Self {
        debug_assert!(rhs.0 != 0, "division by zero");
        let wide = i128::from(self.0) * i128::from(Self::SCALE);
        Self((wide / i128::from(rhs.0)) as i64)
    }

    /// Remainder on raw values.
    ///
    /// # Errors
    ///
    /// `ExecutionError::ModulusByZero` when `rhs` is zero.
    pub fn rem(self, rhs: Self) -> Result<Self, ExecutionError> {
        if rhs.0 == 0 {
            return Err(ExecutionError::ModulusByZero);
        }
        Ok(self.rem_unchecked(rhs))
    }

    /// Remainder without the zero check.
    #[must_use]
    pub fn rem_unchecked(self, rhs: Self) -> Self {
        debug_assert!(rhs.0 != 0, "modulus by zero");
        Self(self.0.wrapping_rem(rhs.0))
    }

    /// Add one whole unit, wrapping.
    #[must_use]
    pub const fn inc(self) -> Self {
        Self(self.0.wrapping_add(Self::SCALE))
    }

    /// Subtract one whole unit, wrapping.
    #[must_use]
    pub const fn dec(self) -> Self {
        Self(self.0.wrapping_sub(Self::SCALE))
    }

    /// Magnitude. `MIN` has no representable magnitude and stays `MIN`.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// Square root.
    ///
    /// Negative operands and operands at or above the upper cutoff
    /// return `MIN`. Otherwise the real root is computed in double
    /// precision and nudged by 5e-5 toward its own sign before
    /// converting back, so near-integer roots land on the integer.
    #[must_use]
    pub fn sqrt(self) -> Self {
        if self.0 < 0 || self.0 >= SQRT_UPPER_CUTOFF {
            return Self::MIN;
        }
        let root = self.as_f64().sqrt();
        Self::from_f64(root + root.signum() * 5e-5)
    }

    /// Sine of an angle in degrees, rounded to three decimals.
    #[must_use]
    pub fn sin(self) -> Self {
        Self((self.to_radians().sin() * Self::SCALE as f64).round() as i64)
    }

    /// Cosine of an angle in degrees, rounded to three decimals.
    #[must_use]
    pub fn cos(self) -> Self {
        Self((self.to_radians().cos() * Self::SCALE as f64).round() as i64)
    }

    /// Tangent of an angle in degrees.
    ///
    /// Unlike `sin` and `cos`, the result is not rounded; truncation
    /// through the fixed-point conversion is the only rounding step.
    #[must_use]
    pub fn tan(self) -> Self {
        Self::from_f64(self.to_radians().tan())
    }

    /// Inverse sine, in degrees. Out-of-domain operands yield `MIN`.
    #[must_use]
    pub fn asin(self) -> Self {
        Self::from_degrees(self.as_f64().asin())
    }

    /// Inverse cosine, in degrees. Out-of-domain operands yield `MIN`.
    #[must_use]
    pub fn acos(self) -> Self {
        Self::from_degrees(self.as_f64().acos())
    }

    /// Inverse tangent, in degrees.
    #[must_use]
    pub fn atan(self) -> Self {
        Self::from_degrees(self.as_f64().atan())
    }

    /// Exponentiation through double precision, saturating.
    #[must_use]
    pub fn pow(self, exponent: Self) -> Self {
        Self::from_f64(self.as_f64().powf(exponent.as_f64()))
    }

    /// Factorial of the integer part.
    ///
    /// Negative operands return `MIN`. The product wraps silently like
    /// the other integer arithmetic.
    #[must_use]
    pub fn factorial(self) -> Self {
        if self.0 < 0 {
            return Self::MIN;
        }
        let n = self.0 / Self::SCALE;
        let mut product: i64 = 1;
        for factor in 2..=n {
            product = product.wrapping_mul(factor);
        }
        Self(product.wrapping_mul(Self::SCALE))
    }

    fn to_radians(self) -> f64 {
        self.as_f64() * PI / 180.0
    }

    fn from_degrees(radians: f64) -> Self {
        Self::from_f64(radians * 180.0 / PI)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self(value.wrapping_mul(Self::SCALE))
    }
}

impl From<bool> for Number {
    fn from(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl Add for Number {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Number {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Number {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for Number {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let wide = i128::from(self.0) * i128::from(rhs.0);
        // Truncate toward zero, then wrap back into 64 bits.
        Self((wide / i128::from(Self::SCALE)) as i64)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Widen so the magnitude of MIN is representable.
        let raw = i128::from(self.0);
        let sign = if raw < 0 { "-" } else { "" };
        let magnitude = raw.unsigned_abs();
        let int_part = magnitude / 1000;
        let frac_part = magnitude % 1000;
        if frac_part == 0 {
            write!(f, "{sign}{int_part}")
        } else {
            let frac = format!("{frac_part:03}");
            write!(f, "{sign}{int_part}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseNumberError {
            text: s.to_string(),
        };
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_digits, frac_digits) = match body.split_once('.') {
            Some((int_digits, frac_digits)) => (int_digits, frac_digits),
            None => (body, ""),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }
        let all_digits = |text: &str| text.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_digits) || !all_digits(frac_digits) {
            return Err(invalid());
        }

        // 25 digits is already far outside the representable range.
        let int_value: u128 = if int_digits.len() > 24 {
            u128::MAX / 1000
        } else if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| invalid())?
        };

        // Fractional digits beyond the third truncate toward zero.
        let mut frac_raw: u128 = 0;
        let mut unit = 100;
        for b in frac_digits.bytes().take(3) {
            frac_raw += u128::from(b - b'0') * unit;
            unit /= 10;
        }

        let magnitude =
            i128::try_from(int_value.saturating_mul(1000).saturating_add(frac_raw))
                .unwrap_or(i128::MAX);
        let raw = if negative { -magnitude } else { magnitude };
        Ok(Self(
            raw.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
        ))
    }
}
