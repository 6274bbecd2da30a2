//! Z3 Symbolic Model Backend
//!
//! This crate encodes ChipScript program variables and expressions into
//! Z3 so an analyzer can ask questions like "can `x` ever be 42 here",
//! "must `x` be a string", or "are these two expressions equivalent".
//!
//! Encoding scheme, per variable:
//! - `type`: a constant of a two-constructor datatype (number/string)
//! - `num`: an unbounded integer holding the scaled raw value
//! - `str`: a character-sequence term holding the string value
//! - `taint`: a boolean meaning "the exact value is not computable;
//!   only the type constraint is reliable"
//!
//! Taint is how partial information stays sound: when the theory cannot
//! produce a computation's exact result (mixed number/string
//! concatenation, unsupported node kinds), the encoder widens the
//! result instead of guessing. Definitive query answers must hold for
//! every concrete execution; anything else reports unknown.

use std::collections::HashMap;

use chip_core::{AnalyzerConfig, Expr, Number, Value, VarName};
use z3::ast::Ast as Z3Ast;
use z3::{ast, DatatypeBuilder, DatatypeSort, Params, SatResult as Z3SatResult, Solver};

/// Errors from building the symbolic model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The encoder met a node kind outside the encodable subset. The
    /// target binding has already been widened to fully unknown, so
    /// the caller may continue with weaker answers.
    #[error("not implemented: cannot encode {node} nodes")]
    Unsupported { node: &'static str },
}

/// Answer to a satisfiability-backed query.
///
/// `Unknown` covers solver timeouts and incomplete theories; it is
/// never upgraded to a definitive answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl Answer {
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    #[must_use]
    pub const fn is_no(self) -> bool {
        matches!(self, Self::No)
    }
}

/// Index of a binding in the model's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

/// Solver terms backing one program variable or temporary.
#[derive(Clone)]
struct Binding {
    tag: ast::Datatype,
    num: ast::Int,
    str_: ast::String,
    taint: ast::Bool,
}

/// A symbolic model over program variables.
///
/// The wrapped solver is stateful and append-only; build the model and
/// query it from one thread. Queries push a frame, assert the
/// condition under test, check, and pop, so they leave the logical
/// assertion set unchanged. Independent models may run in parallel.
pub struct ValueModel {
    solver: Solver,
    types: DatatypeSort,
    num_tag: ast::Datatype,
    str_tag: ast::Datatype,
    bindings: Vec<Binding>,
    named: HashMap<String, BindingId>,
    config: AnalyzerConfig,
}

impl ValueModel {
    /// Build an empty model. The configured timeout applies to every
    /// satisfiability check issued through this model.
    #[must_use]
    pub fn new(config: AnalyzerConfig) -> Self {
        let solver = Solver::new();
        let mut params = Params::new();
        params.set_u32(
            "timeout",
            u32::try_from(config.timeout_ms).unwrap_or(u32::MAX),
        );
        solver.set_params(&params);

        let types = DatatypeBuilder::new("ValueType")
            .variant("NumType", vec![])
            .variant("StrType", vec![])
            .finish();
        let num_tag = types.variants[0]
            .constructor
            .apply(&[])
            .as_datatype()
            .expect("nullary constructor yields a datatype value");
        let str_tag = types.variants[1]
            .constructor
            .apply(&[])
            .as_datatype()
            .expect("nullary constructor yields a datatype value");

        Self {
            solver,
            types,
            num_tag,
            str_tag,
            bindings: Vec::new(),
            named: HashMap::new(),
            config,
        }
    }

    /// The configuration this model was built with.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The binding for a program variable, created unconstrained on
    /// first use. Repeated calls return the same binding; names share
    /// the variable engine's case folding.
    pub fn get_or_create(&mut self, name: &VarName) -> BindingId {
        if let Some(&id) = self.named.get(name.as_str()) {
            return id;
        }
        tracing::debug!("creating binding for variable {name}");
        let id = self.new_binding(name.as_str());
        self.named.insert(name.as_str().to_string(), id);
        id
    }

    /// A fresh anonymous binding, unconstrained.
    pub fn fresh(&mut self) -> BindingId {
        let label = format!("__tmp{}", self.bindings.len());
        self.new_binding(&label)
    }

    /// Pin a binding to a concrete value: type and value channel are
    /// fixed and the binding is marked untainted.
    pub fn assert_value(&mut self, id: BindingId, value: &Value) {
        let binding = &self.bindings[id.0];
        match value {
            Value::Number(n) => {
                self.solver.assert(&binding.tag.eq(&self.num_tag));
                self.solver
                    .assert(&binding.num.eq(&ast::Int::from_i64(n.raw())));
            }
            Value::String(s) => {
                self.solver.assert(&binding.tag.eq(&self.str_tag));
                self.solver.assert(&binding.str_.eq(&string_literal(s)));
            }
        }
        self.solver.assert(&binding.taint.not());
    }

    /// Constrain two bindings to be the same value: type, both value
    /// channels, and taint, pairwise.
    pub fn assert_same(&mut self, a: BindingId, b: BindingId) {
        let (x, y) = (&self.bindings[a.0], &self.bindings[b.0]);
        self.solver.assert(&x.tag.eq(&y.tag));
        self.solver.assert(&x.num.eq(&y.num));
        self.solver.assert(&x.str_.eq(&y.str_));
        self.solver.assert(&x.taint.eq(&y.taint));
    }

    /// Constrain a binding to the result of an expression, encoding
    /// the expression recursively.
    ///
    /// # Errors
    ///
    /// `ModelError::Unsupported` when the expression contains a node
    /// kind outside the encodable subset. The assertions made so far
    /// remain: the unsupported subtree is widened to fully unknown
    /// (tainted, unconstrained type), which keeps every downstream
    /// answer sound.
    pub fn assert_expr(&mut self, id: BindingId, expr: &Expr) -> Result<(), ModelError> {
        let mut unsupported = None;
        let encoded = self.encode(expr, &mut unsupported);
        self.assert_same(id, encoded);
        match unsupported {
            None => Ok(()),
            Some(node) => {
                tracing::debug!("expression widened: {node} nodes are not encodable");
                Err(ModelError::Unsupported { node })
            }
        }
    }

    /// Whether the binding's exact value is available (satisfiable
    /// with taint false).
    #[must_use]
    pub fn is_value_available(&self, id: BindingId) -> Answer {
        let binding = &self.bindings[id.0];
        answer_sat(self.check_under(&binding.taint.not()))
    }

    /// Whether the binding can take this concrete value.
    #[must_use]
    pub fn can_be_value(&self, id: BindingId, value: &Value) -> Answer {
        answer_sat(self.check_under(&self.equals_concrete(id, value)))
    }

    /// Whether the binding must be exactly this value: it can equal it
    /// and provably cannot differ from it.
    #[must_use]
    pub fn is_value(&self, id: BindingId, value: &Value) -> Answer {
        let equals = self.equals_concrete(id, value);
        match self.check_under(&equals) {
            Z3SatResult::Unsat => Answer::No,
            Z3SatResult::Unknown => Answer::Unknown,
            Z3SatResult::Sat => match self.check_under(&equals.not()) {
                Z3SatResult::Unsat => Answer::Yes,
                Z3SatResult::Sat => Answer::No,
                Z3SatResult::Unknown => Answer::Unknown,
            },
        }
    }

    /// Whether the binding can be a number.
    #[must_use]
    pub fn can_be_number(&self, id: BindingId) -> Answer {
        let binding = &self.bindings[id.0];
        answer_sat(self.check_under(&binding.tag.eq(&self.num_tag)))
    }

    /// Whether the binding can be a string.
    #[must_use]
    pub fn can_be_string(&self, id: BindingId) -> Answer {
        let binding = &self.bindings[id.0];
        answer_sat(self.check_under(&binding.tag.eq(&self.str_tag)))
    }

    /// Whether two expressions evaluate to the same value under every
    /// assignment of the model's variables.
    ///
    /// Tainted results count as differing: when the theory cannot pin
    /// either side down, equivalence is not provable.
    ///
    /// # Errors
    ///
    /// `ModelError::Unsupported` as for [`Self::assert_expr`].
    pub fn are_equivalent(&mut self, a: &Expr, b: &Expr) -> Result<Answer, ModelError> {
        self.solver.push();
        let result = self.check_equivalence(a, b);
        self.solver.pop(1);
        result
    }

    fn check_equivalence(&mut self, a: &Expr, b: &Expr) -> Result<Answer, ModelError> {
        let mut unsupported = None;
        let x = self.encode(a, &mut unsupported);
        let y = self.encode(b, &mut unsupported);
        if let Some(node) = unsupported {
            return Err(ModelError::Unsupported { node });
        }
        let (xb, yb) = (&self.bindings[x.0], &self.bindings[y.0]);
        let both_num = ast::Bool::and(&[&xb.tag.eq(&self.num_tag), &yb.tag.eq(&self.num_tag)]);
        let same_channel = both_num.ite(&xb.num.eq(&yb.num), &xb.str_.eq(&yb.str_));
        let same = ast::Bool::and(&[
            &xb.tag.eq(&yb.tag),
            &same_channel,
            &xb.taint.not(),
            &yb.taint.not(),
        ]);
        tracing::debug!("checking expression equivalence");
        Ok(match self.check_under(&same.not()) {
            Z3SatResult::Unsat => Answer::Yes,
            Z3SatResult::Sat => Answer::No,
            Z3SatResult::Unknown => Answer::Unknown,
        })
    }

    /// Encode an expression, returning the binding holding its result.
    /// Unsupported node kinds produce a tainted, otherwise
    /// unconstrained binding and record their name.
    fn encode(&mut self, expr: &Expr, unsupported: &mut Option<&'static str>) -> BindingId {
        match expr {
            Expr::ConstantNumber(n) => {
                let id = self.fresh();
                self.assert_value(id, &Value::Number(*n));
                id
            }
            Expr::ConstantString(s) => {
                let id = self.fresh();
                self.assert_value(id, &Value::String(s.clone()));
                id
            }
            Expr::Variable(name) => self.get_or_create(name),
            Expr::Add(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_add(l, r)
            }
            Expr::Multiply(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_scaled_div(l, r, false)
            }
            Expr::Divide(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_scaled_div(l, r, true)
            }
            Expr::EqualTo(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_equality(l, r, false)
            }
            Expr::NotEqualTo(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_equality(l, r, true)
            }
            Expr::And(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_connective(l, r, true)
            }
            Expr::Or(a, b) => {
                let l = self.encode(a, unsupported);
                let r = self.encode(b, unsupported);
                self.encode_connective(l, r, false)
            }
            other => {
                let id = self.fresh();
                let binding = &self.bindings[id.0];
                self.solver.assert(&binding.taint);
                if unsupported.is_none() {
                    *unsupported = Some(node_name(other));
                }
                id
            }
        }
    }

    /// `+` over tagged values. Number plus number adds raw values;
    /// string plus string concatenates. A mixed pairing is a string
    /// concatenation whose numeric side the theory cannot stringify,
    /// so the result is tainted.
    fn encode_add(&mut self, l: BindingId, r: BindingId) -> BindingId {
        let t = self.fresh();
        let (lb, rb, tb) = (
            &self.bindings[l.0],
            &self.bindings[r.0],
            &self.bindings[t.0],
        );
        let both_num = ast::Bool::and(&[&lb.tag.eq(&self.num_tag), &rb.tag.eq(&self.num_tag)]);
        let both_str = ast::Bool::and(&[&lb.tag.eq(&self.str_tag), &rb.tag.eq(&self.str_tag)]);
        let mixed = ast::Bool::or(&[&both_num, &both_str]).not();
        let untainted = ast::Bool::and(&[&lb.taint.not(), &rb.taint.not()]);

        self.solver
            .assert(&tb.tag.eq(&both_num.ite(&self.num_tag, &self.str_tag)));
        self.solver.assert(
            &ast::Bool::and(&[&both_num, &untainted])
                .implies(&tb.num.eq(&ast::Int::add(&[&lb.num, &rb.num]))),
        );
        self.solver.assert(
            &ast::Bool::and(&[&both_str, &untainted])
                .implies(&tb.str_.eq(&ast::String::concat(&[&lb.str_, &rb.str_]))),
        );
        self.solver
            .assert(&tb.taint.eq(&ast::Bool::or(&[&lb.taint, &rb.taint, &mixed])));
        t
    }

    /// `*` and `/` over tagged values. The result is always a number;
    /// a string operand taints it. Division scales the dividend,
    /// multiplication scales the product back down, both truncating
    /// toward zero like the runtime engine.
    fn encode_scaled_div(&mut self, l: BindingId, r: BindingId, divide: bool) -> BindingId {
        let t = self.fresh();
        let (lb, rb, tb) = (
            &self.bindings[l.0],
            &self.bindings[r.0],
            &self.bindings[t.0],
        );
        let scale = ast::Int::from_i64(Number::SCALE);
        let both_num = ast::Bool::and(&[&lb.tag.eq(&self.num_tag), &rb.tag.eq(&self.num_tag)]);
        let untainted = ast::Bool::and(&[&lb.taint.not(), &rb.taint.not()]);

        let value = if divide {
            div_trunc(&ast::Int::mul(&[&lb.num, &scale]), &rb.num)
        } else {
            div_trunc(&ast::Int::mul(&[&lb.num, &rb.num]), &scale)
        };

        self.solver.assert(&tb.tag.eq(&self.num_tag));
        self.solver.assert(
            &ast::Bool::and(&[&both_num, &untainted]).implies(&tb.num.eq(&value)),
        );
        self.solver.assert(&tb.taint.eq(&ast::Bool::or(&[
            &lb.taint,
            &rb.taint,
            &both_num.not(),
        ])));
        t
    }

    /// `==` / `!=` over tagged values. The result is a number that is
    /// exactly 0 or 1000. Same-type untainted operands constrain it
    /// precisely; a mixed pairing leaves it unconstrained inside that
    /// bound and taints the result.
    fn encode_equality(&mut self, l: BindingId, r: BindingId, negate: bool) -> BindingId {
        let t = self.fresh();
        let (lb, rb, tb) = (
            &self.bindings[l.0],
            &self.bindings[r.0],
            &self.bindings[t.0],
        );
        let zero = ast::Int::from_i64(0);
        let one = ast::Int::from_i64(Number::ONE.raw());
        let both_num = ast::Bool::and(&[&lb.tag.eq(&self.num_tag), &rb.tag.eq(&self.num_tag)]);
        let both_str = ast::Bool::and(&[&lb.tag.eq(&self.str_tag), &rb.tag.eq(&self.str_tag)]);
        let untainted = ast::Bool::and(&[&lb.taint.not(), &rb.taint.not()]);
        let exact = ast::Bool::and(&[&ast::Bool::or(&[&both_num, &both_str]), &untainted]);

        self.solver.assert(&tb.tag.eq(&self.num_tag));
        self.solver
            .assert(&ast::Bool::or(&[&tb.num.eq(&zero), &tb.num.eq(&one)]));

        let holds = both_num.ite(&lb.num.eq(&rb.num), &lb.str_.eq(&rb.str_));
        let outcome = if negate { holds.not() } else { holds };
        self.solver
            .assert(&exact.implies(&tb.num.eq(&outcome.ite(&one, &zero))));
        self.solver.assert(&tb.taint.eq(&exact.not()));
        t
    }

    /// `and` / `or` over tagged values. The result is a number that is
    /// exactly 0 or 1000. A string operand forces truth; two untainted
    /// numbers get the usual connective of `num != 0`.
    fn encode_connective(&mut self, l: BindingId, r: BindingId, conjunction: bool) -> BindingId {
        let t = self.fresh();
        let (lb, rb, tb) = (
            &self.bindings[l.0],
            &self.bindings[r.0],
            &self.bindings[t.0],
        );
        let zero = ast::Int::from_i64(0);
        let one = ast::Int::from_i64(Number::ONE.raw());
        let any_str = ast::Bool::or(&[&lb.tag.eq(&self.str_tag), &rb.tag.eq(&self.str_tag)]);
        let both_num = ast::Bool::and(&[&lb.tag.eq(&self.num_tag), &rb.tag.eq(&self.num_tag)]);
        let untainted = ast::Bool::and(&[&lb.taint.not(), &rb.taint.not()]);

        self.solver.assert(&tb.tag.eq(&self.num_tag));
        self.solver
            .assert(&ast::Bool::or(&[&tb.num.eq(&zero), &tb.num.eq(&one)]));
        self.solver.assert(&any_str.implies(&tb.num.eq(&one)));

        let l_true = lb.num.eq(&zero).not();
        let r_true = rb.num.eq(&zero).not();
        let connective = if conjunction {
            ast::Bool::and(&[&l_true, &r_true])
        } else {
            ast::Bool::or(&[&l_true, &r_true])
        };
        self.solver.assert(
            &ast::Bool::and(&[&both_num, &untainted])
                .implies(&tb.num.eq(&connective.ite(&one, &zero))),
        );
        // A string operand decides the result regardless of taint.
        self.solver.assert(&tb.taint.eq(&ast::Bool::and(&[
            &any_str.not(),
            &ast::Bool::or(&[&lb.taint, &rb.taint]),
        ])));
        t
    }

    fn new_binding(&mut self, label: &str) -> BindingId {
        let id = BindingId(self.bindings.len());
        self.bindings.push(Binding {
            tag: ast::Datatype::new_const(format!("{label}_type"), &self.types.sort),
            num: ast::Int::new_const(format!("{label}_num")),
            str_: ast::String::new_const(format!("{label}_str")),
            taint: ast::Bool::new_const(format!("{label}_taint")),
        });
        id
    }

    /// Equality of a binding with a concrete value: matching tag and
    /// matching value channel.
    fn equals_concrete(&self, id: BindingId, value: &Value) -> ast::Bool {
        let binding = &self.bindings[id.0];
        match value {
            Value::Number(n) => ast::Bool::and(&[
                &binding.tag.eq(&self.num_tag),
                &binding.num.eq(&ast::Int::from_i64(n.raw())),
            ]),
            Value::String(s) => ast::Bool::and(&[
                &binding.tag.eq(&self.str_tag),
                &binding.str_.eq(&string_literal(s)),
            ]),
        }
    }

    /// Satisfiability of the current assertions plus one extra
    /// condition. Framed with push/pop so the assertion set is
    /// restored on every path.
    fn check_under(&self, condition: &ast::Bool) -> Z3SatResult {
        self.solver.push();
        self.solver.assert(condition);
        let result = self.solver.check();
        self.solver.pop(1);
        result
    }
}

fn answer_sat(result: Z3SatResult) -> Answer {
    match result {
        Z3SatResult::Sat => Answer::Yes,
        Z3SatResult::Unsat => Answer::No,
        Z3SatResult::Unknown => Answer::Unknown,
    }
}

/// Truncating integer division. SMT-LIB `div` is Euclidean; the
/// runtime truncates toward zero, so divide the magnitudes and restore
/// the sign.
fn div_trunc(dividend: &ast::Int, divisor: &ast::Int) -> ast::Int {
    let zero = ast::Int::from_i64(0);
    let magnitude = abs_int(dividend).div(&abs_int(divisor));
    let negative = dividend.lt(&zero).xor(&divisor.lt(&zero));
    negative.ite(&magnitude.unary_minus(), &magnitude)
}

fn abs_int(value: &ast::Int) -> ast::Int {
    let zero = ast::Int::from_i64(0);
    value.lt(&zero).ite(&value.unary_minus(), value)
}

fn string_literal(text: &str) -> ast::String {
    ast::String::from_str(text).expect("string literal contains no interior nul")
}

/// Name of a node kind outside the encodable subset.
fn node_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::ConstantNumber(_) => "ConstantNumber",
        Expr::ConstantString(_) => "ConstantString",
        Expr::Variable(_) => "Variable",
        Expr::Add(..) => "Add",
        Expr::Subtract(..) => "Subtract",
        Expr::Multiply(..) => "Multiply",
        Expr::Divide(..) => "Divide",
        Expr::Modulo(..) => "Modulo",
        Expr::Exponent(..) => "Exponent",
        Expr::EqualTo(..) => "EqualTo",
        Expr::NotEqualTo(..) => "NotEqualTo",
        Expr::LessThan(..) => "LessThan",
        Expr::GreaterThan(..) => "GreaterThan",
        Expr::LessThanEq(..) => "LessThanEq",
        Expr::GreaterThanEq(..) => "GreaterThanEq",
        Expr::And(..) => "And",
        Expr::Or(..) => "Or",
        Expr::Not(_) => "Not",
        Expr::Negate(_) => "Negate",
        Expr::PreIncrement(_) => "PreIncrement",
        Expr::PostIncrement(_) => "PostIncrement",
        Expr::PreDecrement(_) => "PreDecrement",
        Expr::PostDecrement(_) => "PostDecrement",
        Expr::Abs(_) => "Abs",
        Expr::Sqrt(_) => "Sqrt",
        Expr::Sin(_) => "Sin",
        Expr::Cos(_) => "Cos",
        Expr::Tan(_) => "Tan",
        Expr::ArcSin(_) => "ArcSin",
        Expr::ArcCos(_) => "ArcCos",
        Expr::ArcTan(_) => "ArcTan",
        Expr::Factorial(_) => "Factorial",
    }
}
