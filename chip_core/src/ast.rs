//! Expressions consumed from the parser
//!
//! The grammar and parser live elsewhere; this is the shape they hand
//! over. Node kinds cover every operator the language defines, whether
//! or not a given consumer (evaluator, analyzer) supports them all.

// Allow builder method names that overlap with std traits - intentional DSL design
#![allow(clippy::should_implement_trait)]

use crate::number::Number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A case-insensitive variable name.
///
/// Names are normalized to ASCII lowercase on construction. A leading
/// `:` marks the shared global namespace; the prefix is otherwise an
/// opaque part of the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarName(String);

impl VarName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_lowercase())
    }

    /// The normalized name, prefix included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `:`-prefixed names visible across machines.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.starts_with(':')
    }
}

impl From<&str> for VarName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An expression in a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // Literals
    ConstantNumber(Number),
    ConstantString(String),

    // Variables
    Variable(VarName),

    // Binary operators
    Add(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    Modulo(Box<Expr>, Box<Expr>),
    Exponent(Box<Expr>, Box<Expr>),

    // Comparisons
    EqualTo(Box<Expr>, Box<Expr>),
    NotEqualTo(Box<Expr>, Box<Expr>),
    LessThan(Box<Expr>, Box<Expr>),
    GreaterThan(Box<Expr>, Box<Expr>),
    LessThanEq(Box<Expr>, Box<Expr>),
    GreaterThanEq(Box<Expr>, Box<Expr>),

    // Logic
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),

    // Unary arithmetic
    Negate(Box<Expr>),

    // Increment and decrement target variables directly
    PreIncrement(VarName),
    PostIncrement(VarName),
    PreDecrement(VarName),
    PostDecrement(VarName),

    // Math functions
    Abs(Box<Expr>),
    Sqrt(Box<Expr>),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Tan(Box<Expr>),
    ArcSin(Box<Expr>),
    ArcCos(Box<Expr>),
    ArcTan(Box<Expr>),
    Factorial(Box<Expr>),
}

impl Expr {
    // Builder methods for convenience

    #[must_use]
    pub fn num(value: impl Into<Number>) -> Self {
        Self::ConstantNumber(value.into())
    }

    pub fn str_(value: impl Into<String>) -> Self {
        Self::ConstantString(value.into())
    }

    pub fn var(name: impl AsRef<str>) -> Self {
        Self::Variable(VarName::new(name))
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::Add(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::Subtract(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        Self::Multiply(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn div(self, other: Self) -> Self {
        Self::Divide(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn modulo(self, other: Self) -> Self {
        Self::Modulo(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn pow(self, other: Self) -> Self {
        Self::Exponent(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::EqualTo(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn ne(self, other: Self) -> Self {
        Self::NotEqualTo(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::LessThan(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::GreaterThan(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn le(self, other: Self) -> Self {
        Self::LessThanEq(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn ge(self, other: Self) -> Self {
        Self::GreaterThanEq(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn neg(self) -> Self {
        Self::Negate(Box::new(self))
    }
}
