//! Attribute expression language.
//!
//! A small JavaScript subset: literals, member access, arithmetic,
//! comparison, logical operators, the conditional operator and
//! assignments. Function calls and every other construct are rejected at
//! parse time.

pub mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{AssignOp, AssignTarget, BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp, UpdateOp};
pub use eval::{assign_target, eval_expr, Environment};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse_expression, parse_program};

use crate::errors::EvalError;
use crate::value::Value;

/// Parse and evaluate `source` for reading
pub fn evaluate<E: Environment + ?Sized>(source: &str, env: &mut E) -> Result<Value, EvalError> {
    parse_program(source)?.evaluate(env)
}

/// Parse and run `source` as a statement list
pub fn execute<E: Environment + ?Sized>(source: &str, env: &mut E) -> Result<(), EvalError> {
    parse_program(source)?.execute(env)
}
