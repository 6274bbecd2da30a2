//! Dynamically typed program values
//!
//! A `Value` is either a `Number` or a `String`; the operator methods
//! here define the full type-pairing matrix that gives programs their
//! semantics. Mismatched pairings either coerce through the textual
//! number format (`+`, `-`, comparisons) or produce a `StaticError`
//! (`*`, `/`, `%`, `^`, unary math).

use crate::error::{EvalError, EvalResult, ExecutionError, StaticError};
use crate::number::Number;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The discriminant of a `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Number,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
        }
    }
}

/// A program value: a fixed-point number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Number(Number),
    String(String),
}

impl Value {
    /// The discriminant tag.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
        }
    }

    /// The tag name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Numbers are false iff zero; strings are always truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != Number::ZERO,
            Self::String(_) => true,
        }
    }

    /// `One` for true, `Zero` for false.
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::Number(Number::from(value))
    }

    /// Addition / concatenation. Any string operand turns the result
    /// into a string, with the numeric side stringified.
    #[must_use]
    pub fn add(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Self::Number(*a + *b),
            (a, b) => Self::String(format!("{a}{b}")),
        }
    }

    /// Subtraction / trim-suffix. Any string operand stringifies the
    /// numeric side and removes the rightmost occurrence of the right
    /// operand from the left.
    #[must_use]
    pub fn sub(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Self::Number(*a - *b),
            (a, b) => Self::String(trim_rightmost(&a.to_string(), &b.to_string())),
        }
    }

    /// Multiplication. Defined for numbers only.
    ///
    /// # Errors
    ///
    /// `EvalError::Static` when either operand is a string.
    pub fn mul(&self, rhs: &Self) -> EvalResult {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(*a * *b)),
            _ => Err(binary_type_error("multiply")),
        }
    }

    /// Division. Defined for numbers only.
    ///
    /// # Errors
    ///
    /// `EvalError::Static` when either operand is a string;
    /// `EvalError::Runtime(DivideByZero)` when the divisor is zero.
    pub fn div(&self, rhs: &Self) -> EvalResult {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a.div(*b)?)),
            _ => Err(binary_type_error("divide")),
        }
    }

    /// Modulus. Defined for numbers only.
    ///
    /// # Errors
    ///
    /// `EvalError::Static` when either operand is a string;
    /// `EvalError::Runtime(ModulusByZero)` when the divisor is zero.
    pub fn rem(&self, rhs: &Self) -> EvalResult {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a.rem(*b)?)),
            _ => Err(binary_type_error("modulus")),
        }
    }

    /// Exponentiation. Defined for numbers only.
    ///
    /// # Errors
    ///
    /// `EvalError::Static` when either operand is a string.
    pub fn pow(&self, rhs: &Self) -> EvalResult {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a.pow(*b))),
            _ => Err(binary_type_error("exponent")),
        }
    }

    /// `<` over the mixed ordering. Always a number 0 or 1000.
    #[must_use]
    pub fn less_than(&self, rhs: &Self) -> Self {
        Self::from_bool(self.compare(rhs) == Ordering::Less)
    }

    /// `>` over the mixed ordering.
    #[must_use]
    pub fn greater_than(&self, rhs: &Self) -> Self {
        Self::from_bool(self.compare(rhs) == Ordering::Greater)
    }

    /// `<=` over the mixed ordering.
    #[must_use]
    pub fn less_than_eq(&self, rhs: &Self) -> Self {
        Self::from_bool(self.compare(rhs) != Ordering::Greater)
    }

    /// `>=` over the mixed ordering.
    #[must_use]
    pub fn greater_than_eq(&self, rhs: &Self) -> Self {
        Self::from_bool(self.compare(rhs) != Ordering::Less)
    }

    /// `==`. Values of different types are never equal.
    #[must_use]
    pub fn equal_to(&self, rhs: &Self) -> Self {
        Self::from_bool(self.same_value(rhs))
    }

    /// `!=`. Values of different types are always unequal.
    #[must_use]
    pub fn not_equal_to(&self, rhs: &Self) -> Self {
        Self::from_bool(!self.same_value(rhs))
    }

    /// Logical conjunction over truthiness.
    #[must_use]
    pub fn and(&self, rhs: &Self) -> Self {
        Self::from_bool(self.is_truthy() && rhs.is_truthy())
    }

    /// Logical disjunction over truthiness.
    #[must_use]
    pub fn or(&self, rhs: &Self) -> Self {
        Self::from_bool(self.is_truthy() || rhs.is_truthy())
    }

    /// Logical not: zero becomes 1000, anything else becomes 0.
    #[must_use]
    pub fn not(&self) -> Self {
        Self::from_bool(!self.is_truthy())
    }

    /// Arithmetic negation.
    ///
    /// # Errors
    ///
    /// `EvalError::Static` for strings.
    pub fn neg(&self) -> EvalResult {
        match self {
            Self::Number(n) => Ok(Self::Number(-*n)),
            Self::String(_) => Err(type_error("negate")),
        }
    }

    /// Increment: numbers gain one whole unit, strings gain a space.
    #[must_use]
    pub fn inc(&self) -> Self {
        match self {
            Self::Number(n) => Self::Number(n.inc()),
            Self::String(s) => {
                let mut grown = String::with_capacity(s.len() + 1);
                grown.push_str(s);
                grown.push(' ');
                Self::String(grown)
            }
        }
    }

    /// Decrement: numbers lose one whole unit, strings lose their
    /// final character.
    ///
    /// # Errors
    ///
    /// `EvalError::Runtime(EmptyString)` for the empty string.
    pub fn dec(&self) -> EvalResult {
        match self {
            Self::Number(n) => Ok(Self::Number(n.dec())),
            Self::String(s) => {
                let mut chars = s.chars();
                match chars.next_back() {
                    Some(_) => Ok(Self::String(chars.as_str().to_string())),
                    None => Err(EvalError::Runtime(ExecutionError::EmptyString)),
                }
            }
        }
    }

    /// Magnitude. Number-only.
    pub fn abs(&self) -> EvalResult {
        self.number_unary("abs", Number::abs)
    }

    /// Square root. Number-only.
    pub fn sqrt(&self) -> EvalResult {
        self.number_unary("sqrt", Number::sqrt)
    }

    /// Sine in degrees. Number-only.
    pub fn sin(&self) -> EvalResult {
        self.number_unary("sin", Number::sin)
    }

    /// Cosine in degrees. Number-only.
    pub fn cos(&self) -> EvalResult {
        self.number_unary("cos", Number::cos)
    }

    /// Tangent in degrees. Number-only.
    pub fn tan(&self) -> EvalResult {
        self.number_unary("tan", Number::tan)
    }

    /// Inverse sine in degrees. Number-only.
    pub fn asin(&self) -> EvalResult {
        self.number_unary("asin", Number::asin)
    }

    /// Inverse cosine in degrees. Number-only.
    pub fn acos(&self) -> EvalResult {
        self.number_unary("acos", Number::acos)
    }

    /// Inverse tangent in degrees. Number-only.
    pub fn atan(&self) -> EvalResult {
        self.number_unary("atan", Number::atan)
    }

    /// Factorial of the integer part. Number-only.
    pub fn factorial(&self) -> EvalResult {
        self.number_unary("factorial", Number::factorial)
    }

    fn number_unary(&self, verb: &str, op: impl FnOnce(Number) -> Number) -> EvalResult {
        match self {
            Self::Number(n) => Ok(Self::Number(op(*n))),
            Self::String(_) => Err(type_error(verb)),
        }
    }

    fn same_value(&self, rhs: &Self) -> bool {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// Mixed ordering: numbers compare numerically, anything involving
    /// a string compares lexicographically with the numeric side in
    /// its textual form.
    fn compare(&self, rhs: &Self) -> Ordering {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Number(a), Self::String(b)) => a.to_string().as_str().cmp(b.as_str()),
            (Self::String(a), Self::Number(b)) => a.as_str().cmp(b.to_string().as_str()),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Remove the rightmost occurrence of `needle` from `haystack`. When
/// `needle` does not occur, `haystack` comes back unchanged.
fn trim_rightmost(haystack: &str, needle: &str) -> String {
    match haystack.rfind(needle) {
        Some(at) => {
            let mut trimmed = String::with_capacity(haystack.len() - needle.len());
            trimmed.push_str(&haystack[..at]);
            trimmed.push_str(&haystack[at + needle.len()..]);
            trimmed
        }
        None => haystack.to_string(),
    }
}

fn binary_type_error(verb: &str) -> EvalError {
    EvalError::Static(StaticError::new(format!(
        "Attempted to {verb} by a string"
    )))
}

fn type_error(verb: &str) -> EvalError {
    EvalError::Static(StaticError::new(format!(
        "Attempted to {verb} a string"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(raw: i64) -> Value {
        Value::Number(Number::from_raw(raw))
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    // ============================================
    // Addition row
    // ============================================

    #[test]
    fn test_add_numbers() {
        assert_eq!(n(1000).add(&n(2000)), n(3000));
    }

    #[test]
    fn test_add_number_string_concatenates() {
        assert_eq!(n(1500).add(&s("m")), s("1.5m"));
        assert_eq!(s("v=").add(&n(-1)), s("v=-0.001"));
    }

    #[test]
    fn test_add_strings() {
        assert_eq!(s("ab").add(&s("cd")), s("abcd"));
    }

    // ============================================
    // Subtraction row
    // ============================================

    #[test]
    fn test_sub_numbers() {
        assert_eq!(n(3000).sub(&n(1000)), n(2000));
    }

    #[test]
    fn test_sub_strings_trims_suffix() {
        assert_eq!(s("hello").sub(&s("lo")), s("hel"));
        assert_eq!(s("hello").sub(&s("zz")), s("hello"));
    }

    #[test]
    fn test_sub_strings_removes_rightmost_occurrence() {
        assert_eq!(s("hello").sub(&s("l")), s("helo"));
        assert_eq!(s("aXbXc").sub(&s("X")), s("aXbc"));
    }

    #[test]
    fn test_sub_mixed_stringifies_the_number() {
        assert_eq!(n(12_000).sub(&s("2")), s("1"));
        assert_eq!(s("abc1").sub(&n(1000)), s("abc"));
    }

    #[test]
    fn test_sub_empty_needle_is_identity() {
        assert_eq!(s("abc").sub(&s("")), s("abc"));
    }

    // ============================================
    // Number-only rows
    // ============================================

    #[test]
    fn test_mul_numbers() {
        assert_eq!(n(2000).mul(&n(3000)).expect("multiply"), n(6000));
    }

    #[test]
    fn test_mul_with_string_is_static_error() {
        for (lhs, rhs) in [(n(2000), s("x")), (s("x"), n(2000)), (s("x"), s("y"))] {
            let err = lhs.mul(&rhs).expect_err("type error");
            assert!(err.is_static());
            assert_eq!(err.to_string(), "Attempted to multiply by a string");
        }
    }

    #[test]
    fn test_div_numbers() {
        assert_eq!(n(1000).div(&n(3000)).expect("divide"), n(333));
    }

    #[test]
    fn test_div_by_zero_is_runtime_error() {
        let err = n(1000).div(&n(0)).expect_err("runtime error");
        assert_eq!(err, EvalError::Runtime(ExecutionError::DivideByZero));
    }

    #[test]
    fn test_div_with_string_is_static_error() {
        assert!(n(1000).div(&s("x")).expect_err("type error").is_static());
        assert!(s("x").div(&n(1000)).expect_err("type error").is_static());
    }

    #[test]
    fn test_rem_by_zero_is_runtime_error() {
        let err = n(0).rem(&n(0)).expect_err("runtime error");
        assert_eq!(err, EvalError::Runtime(ExecutionError::ModulusByZero));
    }

    #[test]
    fn test_rem_with_string_is_static_error() {
        assert!(s("x").rem(&s("y")).expect_err("type error").is_static());
    }

    #[test]
    fn test_pow_numbers() {
        assert_eq!(n(2000).pow(&n(10_000)).expect("exponent"), n(1_024_000));
    }

    #[test]
    fn test_pow_with_string_is_static_error() {
        let err = n(2000).pow(&s("x")).expect_err("type error");
        assert_eq!(err.to_string(), "Attempted to exponent by a string");
    }

    // ============================================
    // Comparisons
    // ============================================

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(n(1000).less_than(&n(2000)), n(1000));
        assert_eq!(n(2000).less_than(&n(1000)), n(0));
        assert_eq!(n(2000).greater_than(&n(1000)), n(1000));
        assert_eq!(n(1000).less_than_eq(&n(1000)), n(1000));
        assert_eq!(n(1000).greater_than_eq(&n(2000)), n(0));
    }

    #[test]
    fn test_string_comparisons_are_lexicographic() {
        assert_eq!(s("abc").less_than(&s("abd")), n(1000));
        assert_eq!(s("b").greater_than(&s("a")), n(1000));
    }

    #[test]
    fn test_mixed_comparison_uses_textual_number() {
        // "9" sorts after "10" lexicographically.
        assert_eq!(n(9000).less_than(&s("10")), n(0));
        assert_eq!(n(9000).greater_than(&s("10")), n(1000));
        assert_eq!(s("1.5").less_than_eq(&n(1500)), n(1000));
    }

    #[test]
    fn test_equal_to() {
        assert_eq!(n(1500).equal_to(&n(1500)), n(1000));
        assert_eq!(n(1500).equal_to(&n(1501)), n(0));
        assert_eq!(s("a").equal_to(&s("a")), n(1000));
        assert_eq!(s("a").equal_to(&s("b")), n(0));
    }

    #[test]
    fn test_mixed_types_are_never_equal() {
        assert_eq!(n(1000).equal_to(&s("1")), n(0));
        assert_eq!(s("1").equal_to(&n(1000)), n(0));
        assert_eq!(n(1000).not_equal_to(&s("1")), n(1000));
    }

    #[test]
    fn test_not_equal_is_complement_of_equal() {
        let pairs = [
            (n(0), n(0)),
            (n(0), n(1)),
            (s("x"), s("x")),
            (s("x"), n(0)),
        ];
        for (a, b) in pairs {
            let eq = a.equal_to(&b);
            let ne = a.not_equal_to(&b);
            assert_eq!(Value::Number(Number::ONE).sub(&eq), ne);
        }
    }

    // ============================================
    // Logic
    // ============================================

    #[test]
    fn test_truthiness() {
        assert!(!n(0).is_truthy());
        assert!(n(1).is_truthy());
        assert!(n(-1).is_truthy());
        assert!(s("").is_truthy());
        assert!(s("0").is_truthy());
    }

    #[test]
    fn test_and_or() {
        assert_eq!(n(1000).and(&n(0)), n(0));
        assert_eq!(n(1000).and(&s("")), n(1000));
        assert_eq!(n(0).or(&n(0)), n(0));
        assert_eq!(n(0).or(&s("x")), n(1000));
    }

    #[test]
    fn test_not() {
        assert_eq!(n(0).not(), n(1000));
        assert_eq!(n(5).not(), n(0));
        assert_eq!(s("").not(), n(0));
    }

    // ============================================
    // Unary
    // ============================================

    #[test]
    fn test_neg() {
        assert_eq!(n(1500).neg().expect("negate"), n(-1500));
        let err = s("x").neg().expect_err("type error");
        assert_eq!(err.to_string(), "Attempted to negate a string");
    }

    #[test]
    fn test_unary_math_rejects_strings() {
        assert!(s("x").abs().expect_err("type error").is_static());
        assert!(s("x").sqrt().expect_err("type error").is_static());
        assert!(s("x").sin().expect_err("type error").is_static());
        assert!(s("x").factorial().expect_err("type error").is_static());
    }

    #[test]
    fn test_unary_math_on_numbers() {
        assert_eq!(n(-1500).abs().expect("abs"), n(1500));
        assert_eq!(n(90_000).sin().expect("sin"), n(1000));
        assert_eq!(n(9_000_000).sqrt().expect("sqrt"), n(3000));
    }

    #[test]
    fn test_increment() {
        assert_eq!(n(500).inc(), n(1500));
        assert_eq!(s("hi").inc(), s("hi "));
        assert_eq!(s("").inc(), s(" "));
    }

    #[test]
    fn test_decrement() {
        assert_eq!(n(500).dec().expect("dec"), n(-500));
        assert_eq!(s("hi").dec().expect("dec"), s("h"));
        let err = s("").dec().expect_err("runtime error");
        assert_eq!(err, EvalError::Runtime(ExecutionError::EmptyString));
    }

    #[test]
    fn test_decrement_removes_whole_character() {
        assert_eq!(s("caf\u{e9}").dec().expect("dec"), s("caf"));
    }

    // ============================================
    // Display
    // ============================================

    #[test]
    fn test_display() {
        assert_eq!(n(1500).to_string(), "1.5");
        assert_eq!(s("plain").to_string(), "plain");
    }

    #[test]
    fn test_kind_and_type_name() {
        assert_eq!(n(0).kind(), ValueKind::Number);
        assert_eq!(s("").kind(), ValueKind::String);
        assert_eq!(n(0).type_name(), "number");
        assert_eq!(ValueKind::String.to_string(), "string");
    }
}
