//! Concrete expression evaluation
//!
//! Walks an expression against a variable store. The store is owned by
//! the host (the line scheduler); operators themselves stay pure, and
//! only the increment/decrement forms write back.

use crate::ast::{Expr, VarName};
use crate::error::EvalResult;
use crate::number::Number;
use crate::ops::{BinOp, UnOp};
use crate::value::Value;
use std::collections::HashMap;

/// Read/write access to program variables.
///
/// Variables spring into existence on first read with the value zero.
pub trait VariableStore {
    fn get(&self, name: &VarName) -> Value;
    fn set(&mut self, name: &VarName, value: Value);
}

/// In-memory variable store keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct MachineState {
    variables: HashMap<VarName, Value>,
}

impl MachineState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All variables assigned so far.
    #[must_use]
    pub fn variables(&self) -> &HashMap<VarName, Value> {
        &self.variables
    }
}

impl VariableStore for MachineState {
    fn get(&self, name: &VarName) -> Value {
        self.variables
            .get(name)
            .cloned()
            .unwrap_or(Value::Number(Number::ZERO))
    }

    fn set(&mut self, name: &VarName, value: Value) {
        self.variables.insert(name.clone(), value);
    }
}

/// Evaluate an expression against a variable store.
///
/// Both operands of `and`/`or` are always evaluated; there is no
/// short-circuiting, so operand errors surface regardless of the other
/// side.
///
/// # Errors
///
/// Propagates both evaluation channels from the operator matrix.
pub fn evaluate(expr: &Expr, state: &mut impl VariableStore) -> EvalResult {
    match expr {
        Expr::ConstantNumber(n) => Ok(Value::Number(*n)),
        Expr::ConstantString(s) => Ok(Value::String(s.clone())),
        Expr::Variable(name) => Ok(state.get(name)),

        Expr::Add(a, b) => binary(BinOp::Add, a, b, state),
        Expr::Subtract(a, b) => binary(BinOp::Subtract, a, b, state),
        Expr::Multiply(a, b) => binary(BinOp::Multiply, a, b, state),
        Expr::Divide(a, b) => binary(BinOp::Divide, a, b, state),
        Expr::Modulo(a, b) => binary(BinOp::Modulo, a, b, state),
        Expr::Exponent(a, b) => binary(BinOp::Exponent, a, b, state),
        Expr::EqualTo(a, b) => binary(BinOp::EqualTo, a, b, state),
        Expr::NotEqualTo(a, b) => binary(BinOp::NotEqualTo, a, b, state),
        Expr::LessThan(a, b) => binary(BinOp::LessThan, a, b, state),
        Expr::GreaterThan(a, b) => binary(BinOp::GreaterThan, a, b, state),
        Expr::LessThanEq(a, b) => binary(BinOp::LessThanEq, a, b, state),
        Expr::GreaterThanEq(a, b) => binary(BinOp::GreaterThanEq, a, b, state),
        Expr::And(a, b) => binary(BinOp::And, a, b, state),
        Expr::Or(a, b) => binary(BinOp::Or, a, b, state),

        Expr::Not(e) => unary(UnOp::Not, e, state),
        Expr::Negate(e) => unary(UnOp::Negate, e, state),
        Expr::Abs(e) => unary(UnOp::Abs, e, state),
        Expr::Sqrt(e) => unary(UnOp::Sqrt, e, state),
        Expr::Sin(e) => unary(UnOp::Sin, e, state),
        Expr::Cos(e) => unary(UnOp::Cos, e, state),
        Expr::Tan(e) => unary(UnOp::Tan, e, state),
        Expr::ArcSin(e) => unary(UnOp::ArcSin, e, state),
        Expr::ArcCos(e) => unary(UnOp::ArcCos, e, state),
        Expr::ArcTan(e) => unary(UnOp::ArcTan, e, state),
        Expr::Factorial(e) => unary(UnOp::Factorial, e, state),

        Expr::PreIncrement(name) => {
            let next = state.get(name).inc();
            state.set(name, next.clone());
            Ok(next)
        }
        Expr::PostIncrement(name) => {
            let previous = state.get(name);
            state.set(name, previous.inc());
            Ok(previous)
        }
        Expr::PreDecrement(name) => {
            let next = state.get(name).dec()?;
            state.set(name, next.clone());
            Ok(next)
        }
        Expr::PostDecrement(name) => {
            let previous = state.get(name);
            state.set(name, previous.dec()?);
            Ok(previous)
        }
    }
}

fn binary(op: BinOp, lhs: &Expr, rhs: &Expr, state: &mut impl VariableStore) -> EvalResult {
    let lhs = evaluate(lhs, state)?;
    let rhs = evaluate(rhs, state)?;
    op.apply(&lhs, &rhs)
}

fn unary(op: UnOp, operand: &Expr, state: &mut impl VariableStore) -> EvalResult {
    let operand = evaluate(operand, state)?;
    op.apply(&operand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ExecutionError};

    fn n(raw: i64) -> Value {
        Value::Number(Number::from_raw(raw))
    }

    #[test]
    fn test_constants() {
        let mut state = MachineState::new();
        assert_eq!(
            evaluate(&Expr::num(2i64), &mut state).expect("eval"),
            n(2000)
        );
        assert_eq!(
            evaluate(&Expr::str_("hi"), &mut state).expect("eval"),
            Value::String("hi".to_string())
        );
    }

    #[test]
    fn test_unset_variable_reads_as_zero() {
        let mut state = MachineState::new();
        assert_eq!(evaluate(&Expr::var("x"), &mut state).expect("eval"), n(0));
    }

    #[test]
    fn test_variable_lookup_is_case_insensitive() {
        let mut state = MachineState::new();
        state.set(&VarName::new("Counter"), n(5000));
        assert_eq!(
            evaluate(&Expr::var("COUNTER"), &mut state).expect("eval"),
            n(5000)
        );
    }

    #[test]
    fn test_global_names_are_distinct_from_locals() {
        let mut state = MachineState::new();
        state.set(&VarName::new(":out"), n(1000));
        assert_eq!(evaluate(&Expr::var("out"), &mut state).expect("eval"), n(0));
        assert_eq!(
            evaluate(&Expr::var(":OUT"), &mut state).expect("eval"),
            n(1000)
        );
    }

    #[test]
    fn test_nested_arithmetic() {
        let mut state = MachineState::new();
        // 1 + 2 * 3 == 7
        let expr = Expr::num(1i64)
            .add(Expr::num(2i64).mul(Expr::num(3i64)))
            .eq(Expr::num(7i64));
        assert_eq!(evaluate(&expr, &mut state).expect("eval"), n(1000));
    }

    #[test]
    fn test_pre_increment_yields_new_value_and_stores_it() {
        let mut state = MachineState::new();
        let result = evaluate(&Expr::PreIncrement(VarName::new("a")), &mut state);
        assert_eq!(result.expect("eval"), n(1000));
        assert_eq!(state.get(&VarName::new("a")), n(1000));
    }

    #[test]
    fn test_post_increment_yields_old_value_and_stores_new() {
        let mut state = MachineState::new();
        state.set(&VarName::new("a"), n(2000));
        let result = evaluate(&Expr::PostIncrement(VarName::new("a")), &mut state);
        assert_eq!(result.expect("eval"), n(2000));
        assert_eq!(state.get(&VarName::new("a")), n(3000));
    }

    #[test]
    fn test_pre_decrement_on_string_pops_a_character() {
        let mut state = MachineState::new();
        state.set(&VarName::new("s"), Value::String("ab".to_string()));
        let result = evaluate(&Expr::PreDecrement(VarName::new("s")), &mut state);
        assert_eq!(result.expect("eval"), Value::String("a".to_string()));
    }

    #[test]
    fn test_post_decrement_of_empty_string_fails_without_storing() {
        let mut state = MachineState::new();
        state.set(&VarName::new("s"), Value::String(String::new()));
        let result = evaluate(&Expr::PostDecrement(VarName::new("s")), &mut state);
        assert_eq!(
            result.expect_err("runtime error"),
            EvalError::Runtime(ExecutionError::EmptyString)
        );
        assert_eq!(
            state.get(&VarName::new("s")),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_operand_errors_propagate_through_logic() {
        let mut state = MachineState::new();
        // No short-circuiting: the divide-by-zero on the right surfaces
        // even though the left side is already false.
        let expr = Expr::num(0i64).and(Expr::num(1i64).div(Expr::num(0i64)));
        let err = evaluate(&expr, &mut state).expect_err("runtime error");
        assert_eq!(err, EvalError::Runtime(ExecutionError::DivideByZero));
    }

    #[test]
    fn test_static_error_channel_propagates() {
        let mut state = MachineState::new();
        let expr = Expr::str_("x").mul(Expr::num(2i64));
        let err = evaluate(&expr, &mut state).expect_err("type error");
        assert!(err.is_static());
    }

    #[test]
    fn test_unary_chain() {
        let mut state = MachineState::new();
        let expr = Expr::Abs(Box::new(Expr::num(-3i64)));
        assert_eq!(evaluate(&expr, &mut state).expect("eval"), n(3000));
    }
}
