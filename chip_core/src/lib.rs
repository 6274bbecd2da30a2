//! Core engines for the ChipScript language
//!
//! ChipScript programs are short line-based scripts over two dynamic
//! types, a fixed-point `Number` and a `String`. This crate owns the
//! semantics:
//! - the Number engine: a three-decimal fixed-point scalar whose
//!   arithmetic laws are bit-identical across hosts
//! - the Value engine: the tagged union and the full operator matrix,
//!   including the two-channel error taxonomy
//! - the AST the parser produces, consumed by both the concrete
//!   evaluator here and the symbolic backends
//!
//! The crate is backend-agnostic and serializable; solver integrations
//! live in their own crates and consume these types.

pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod number;
pub mod ops;
pub mod value;

pub use ast::*;
pub use config::*;
pub use error::*;
pub use eval::*;
pub use number::*;
pub use ops::*;
pub use value::*;
