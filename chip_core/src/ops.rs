//! Operator identifiers and the dispatch side table
//!
//! Every operator carries a may-throw predicate alongside its checked
//! and check-free implementations. A scheduler holding concrete
//! operands, or an analyzer holding constraints that prove operands
//! safe, can consult the predicate and select `apply_unchecked`.
//! The predicate is exact: it returns true iff `apply` on those
//! operands returns an error.

use crate::error::EvalResult;
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operator identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanEq,
    GreaterThanEq,
    And,
    Or,
}

/// Unary operator identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Negate,
    Not,
    Abs,
    Sqrt,
    Sin,
    Cos,
    Tan,
    ArcSin,
    ArcCos,
    ArcTan,
    Factorial,
    Increment,
    Decrement,
}

/// Side-table entry for a binary operator.
#[derive(Clone, Copy)]
pub struct OpSpec {
    /// True when `apply` on these operands returns an error.
    pub may_throw: fn(&Value, &Value) -> bool,
}

/// Side-table entry for a unary operator.
#[derive(Clone, Copy)]
pub struct UnOpSpec {
    /// True when `apply` on this operand returns an error.
    pub may_throw: fn(&Value) -> bool,
}

fn never_throws(_: &Value, _: &Value) -> bool {
    false
}

fn throws_on_string(lhs: &Value, rhs: &Value) -> bool {
    lhs.kind() == ValueKind::String || rhs.kind() == ValueKind::String
}

fn throws_on_string_or_zero(lhs: &Value, rhs: &Value) -> bool {
    throws_on_string(lhs, rhs) || matches!(rhs, Value::Number(n) if n.raw() == 0)
}

fn unary_never_throws(_: &Value) -> bool {
    false
}

fn unary_throws_on_string(operand: &Value) -> bool {
    operand.kind() == ValueKind::String
}

fn throws_on_empty_string(operand: &Value) -> bool {
    matches!(operand, Value::String(s) if s.is_empty())
}

impl BinOp {
    /// The side-table entry for this operator.
    #[must_use]
    pub fn spec(self) -> OpSpec {
        let may_throw = match self {
            Self::Multiply | Self::Exponent => throws_on_string,
            Self::Divide | Self::Modulo => throws_on_string_or_zero,
            _ => never_throws,
        };
        OpSpec { may_throw }
    }

    /// Checked dispatch into the operator matrix.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operator produces; see the `Value`
    /// methods for the per-pairing behavior.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> EvalResult {
        match self {
            Self::Add => Ok(lhs.add(rhs)),
            Self::Subtract => Ok(lhs.sub(rhs)),
            Self::Multiply => lhs.mul(rhs),
            Self::Divide => lhs.div(rhs),
            Self::Modulo => lhs.rem(rhs),
            Self::Exponent => lhs.pow(rhs),
            Self::EqualTo => Ok(lhs.equal_to(rhs)),
            Self::NotEqualTo => Ok(lhs.not_equal_to(rhs)),
            Self::LessThan => Ok(lhs.less_than(rhs)),
            Self::GreaterThan => Ok(lhs.greater_than(rhs)),
            Self::LessThanEq => Ok(lhs.less_than_eq(rhs)),
            Self::GreaterThanEq => Ok(lhs.greater_than_eq(rhs)),
            Self::And => Ok(lhs.and(rhs)),
            Self::Or => Ok(lhs.or(rhs)),
        }
    }

    /// Check-free dispatch for operands already proven safe.
    ///
    /// # Panics
    ///
    /// Debug builds assert the may-throw predicate is false for the
    /// given operands; release builds skip straight to the result.
    #[must_use]
    pub fn apply_unchecked(self, lhs: &Value, rhs: &Value) -> Value {
        debug_assert!(
            !(self.spec().may_throw)(lhs, rhs),
            "operands not proven safe for `{self}`"
        );
        match self {
            Self::Add => lhs.add(rhs),
            Self::Subtract => lhs.sub(rhs),
            Self::Multiply => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Value::Number(*a * *b),
                _ => unreachable!("string operand to unchecked multiply"),
            },
            Self::Divide => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a.div_unchecked(*b)),
                _ => unreachable!("string operand to unchecked divide"),
            },
            Self::Modulo => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a.rem_unchecked(*b)),
                _ => unreachable!("string operand to unchecked modulus"),
            },
            Self::Exponent => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a.pow(*b)),
                _ => unreachable!("string operand to unchecked exponent"),
            },
            Self::EqualTo => lhs.equal_to(rhs),
            Self::NotEqualTo => lhs.not_equal_to(rhs),
            Self::LessThan => lhs.less_than(rhs),
            Self::GreaterThan => lhs.greater_than(rhs),
            Self::LessThanEq => lhs.less_than_eq(rhs),
            Self::GreaterThanEq => lhs.greater_than_eq(rhs),
            Self::And => lhs.and(rhs),
            Self::Or => lhs.or(rhs),
        }
    }
}

impl UnOp {
    /// The side-table entry for this operator.
    #[must_use]
    pub fn spec(self) -> UnOpSpec {
        let may_throw = match self {
            Self::Not | Self::Increment => unary_never_throws,
            Self::Decrement => throws_on_empty_string,
            _ => unary_throws_on_string,
        };
        UnOpSpec { may_throw }
    }

    /// Checked dispatch.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operator produces.
    pub fn apply(self, operand: &Value) -> EvalResult {
        match self {
            Self::Negate => operand.neg(),
            Self::Not => Ok(operand.not()),
            Self::Abs => operand.abs(),
            Self::Sqrt => operand.sqrt(),
            Self::Sin => operand.sin(),
            Self::Cos => operand.cos(),
            Self::Tan => operand.tan(),
            Self::ArcSin => operand.asin(),
            Self::ArcCos => operand.acos(),
            Self::ArcTan => operand.atan(),
            Self::Factorial => operand.factorial(),
            Self::Increment => Ok(operand.inc()),
            Self::Decrement => operand.dec(),
        }
    }

    /// Check-free dispatch for an operand already proven safe.
    ///
    /// # Panics
    ///
    /// Debug builds assert the may-throw predicate is false for the
    /// given operand.
    #[must_use]
    pub fn apply_unchecked(self, operand: &Value) -> Value {
        debug_assert!(
            !(self.spec().may_throw)(operand),
            "operand not proven safe for `{self}`"
        );
        match self.apply(operand) {
            Ok(value) => value,
            Err(_) => unreachable!("operand not proven safe for unchecked unary"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Exponent => "^",
            Self::EqualTo => "==",
            Self::NotEqualTo => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEq => "<=",
            Self::GreaterThanEq => ">=",
            Self::And => "and",
            Self::Or => "or",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Negate => "-",
            Self::Not => "not",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::ArcSin => "asin",
            Self::ArcCos => "acos",
            Self::ArcTan => "atan",
            Self::Factorial => "!",
            Self::Increment => "++",
            Self::Decrement => "--",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    fn n(raw: i64) -> Value {
        Value::Number(Number::from_raw(raw))
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    const BIN_OPS: [BinOp; 14] = [
        BinOp::Add,
        BinOp::Subtract,
        BinOp::Multiply,
        BinOp::Divide,
        BinOp::Modulo,
        BinOp::Exponent,
        BinOp::EqualTo,
        BinOp::NotEqualTo,
        BinOp::LessThan,
        BinOp::GreaterThan,
        BinOp::LessThanEq,
        BinOp::GreaterThanEq,
        BinOp::And,
        BinOp::Or,
    ];

    const UN_OPS: [UnOp; 13] = [
        UnOp::Negate,
        UnOp::Not,
        UnOp::Abs,
        UnOp::Sqrt,
        UnOp::Sin,
        UnOp::Cos,
        UnOp::Tan,
        UnOp::ArcSin,
        UnOp::ArcCos,
        UnOp::ArcTan,
        UnOp::Factorial,
        UnOp::Increment,
        UnOp::Decrement,
    ];

    #[test]
    fn test_may_throw_predicate_is_exact_for_binary_ops() {
        let operands = [n(0), n(1000), n(-2500), s(""), s("text")];
        for op in BIN_OPS {
            for lhs in &operands {
                for rhs in &operands {
                    let predicted = (op.spec().may_throw)(lhs, rhs);
                    let actual = op.apply(lhs, rhs).is_err();
                    assert_eq!(
                        predicted, actual,
                        "may_throw mismatch for {lhs:?} {op} {rhs:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_may_throw_predicate_is_exact_for_unary_ops() {
        let operands = [n(0), n(1000), n(-2500), s(""), s("text")];
        for op in UN_OPS {
            for operand in &operands {
                let predicted = (op.spec().may_throw)(operand);
                let actual = op.apply(operand).is_err();
                assert_eq!(predicted, actual, "may_throw mismatch for {op} {operand:?}");
            }
        }
    }

    #[test]
    fn test_apply_unchecked_matches_apply_on_safe_operands() {
        let operands = [n(0), n(1000), n(-2500), s(""), s("text")];
        for op in BIN_OPS {
            for lhs in &operands {
                for rhs in &operands {
                    if (op.spec().may_throw)(lhs, rhs) {
                        continue;
                    }
                    let checked = op.apply(lhs, rhs).expect("safe operands");
                    assert_eq!(op.apply_unchecked(lhs, rhs), checked);
                }
            }
        }
    }

    #[test]
    fn test_divide_spec_accounts_for_zero_divisor() {
        let spec = BinOp::Divide.spec();
        assert!((spec.may_throw)(&n(1000), &n(0)));
        assert!(!(spec.may_throw)(&n(1000), &n(1))); // 0.001 is a fine divisor
        assert!((spec.may_throw)(&n(1000), &s("2")));
    }

    #[test]
    fn test_decrement_spec_only_rejects_empty_strings() {
        let spec = UnOp::Decrement.spec();
        assert!((spec.may_throw)(&s("")));
        assert!(!(spec.may_throw)(&s("x")));
        assert!(!(spec.may_throw)(&n(0)));
    }

    #[test]
    fn test_display_symbols() {
        assert_eq!(BinOp::Exponent.to_string(), "^");
        assert_eq!(BinOp::NotEqualTo.to_string(), "!=");
        assert_eq!(UnOp::Factorial.to_string(), "!");
        assert_eq!(UnOp::ArcTan.to_string(), "atan");
    }
}
