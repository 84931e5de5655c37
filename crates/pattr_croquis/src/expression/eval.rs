//! Tree-walking evaluator.
//!
//! Identifiers resolve only through the supplied [`Environment`]; nothing
//! else is reachable from an expression.

use pattr_carton::CompactString;

use super::ast::{AssignOp, AssignTarget, BinaryOp, Expr, LogicalOp, Program, UnaryOp, UpdateOp};
use crate::errors::EvalError;
use crate::value::{Object, Value};

/// Variable resolution for the evaluator
pub trait Environment {
    /// Resolve a variable; absent names are `undefined`
    fn lookup(&self, name: &str) -> Value;

    /// Write a variable
    fn assign(&mut self, name: &str, value: Value);
}

/// Evaluate one expression against `env`
pub fn eval_expr<E: Environment + ?Sized>(expr: &Expr, env: &mut E) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => Ok(env.lookup(name)),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval_expr(item, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(props) => {
            let mut object = Object::new();
            for (key, value) in props {
                object.insert(key.clone(), eval_expr(value, env)?);
            }
            Ok(Value::Object(object))
        }
        Expr::Member { object, property } => {
            let object = eval_expr(object, env)?;
            let key = eval_expr(property, env)?;
            object.get_member(&key)
        }
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, env)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Minus => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, env)?;
            let right = eval_expr(right, env)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Logical { op, left, right } => {
            let left = eval_expr(left, env)?;
            let short_circuit = match op {
                LogicalOp::And => !left.is_truthy(),
                LogicalOp::Or => left.is_truthy(),
                LogicalOp::Coalesce => !left.is_nullish(),
            };
            if short_circuit {
                Ok(left)
            } else {
                eval_expr(right, env)
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval_expr(test, env)?.is_truthy() {
                eval_expr(consequent, env)
            } else {
                eval_expr(alternate, env)
            }
        }
        Expr::Assign { op, target, value } => {
            let keys = eval_path(target, env)?;
            let new_value = match op {
                AssignOp::Assign => eval_expr(value, env)?,
                AssignOp::Compound(bin) => {
                    let current = read_target(&target.root, &keys, env)?;
                    let rhs = eval_expr(value, env)?;
                    binary(*bin, &current, &rhs)
                }
            };
            write_target(&target.root, &keys, new_value.clone(), env)?;
            Ok(new_value)
        }
        Expr::Update { op, prefix, target } => {
            let keys = eval_path(target, env)?;
            let old = read_target(&target.root, &keys, env)?.to_number();
            let new = match op {
                UpdateOp::Increment => old + 1.0,
                UpdateOp::Decrement => old - 1.0,
            };
            write_target(&target.root, &keys, Value::Number(new), env)?;
            Ok(Value::Number(if *prefix { new } else { old }))
        }
    }
}

/// Write `value` to `target` (`name` or `name.path[key]`)
pub fn assign_target<E: Environment + ?Sized>(
    target: &AssignTarget,
    value: Value,
    env: &mut E,
) -> Result<(), EvalError> {
    let keys = eval_path(target, env)?;
    write_target(&target.root, &keys, value, env)
}

/// Evaluate the member keys of an assignment target, left to right
fn eval_path<E: Environment + ?Sized>(
    target: &AssignTarget,
    env: &mut E,
) -> Result<Vec<Value>, EvalError> {
    target.path.iter().map(|key| eval_expr(key, env)).collect()
}

fn read_target<E: Environment + ?Sized>(
    root: &CompactString,
    keys: &[Value],
    env: &E,
) -> Result<Value, EvalError> {
    let mut value = env.lookup(root);
    for key in keys {
        value = value.get_member(key)?;
    }
    Ok(value)
}

/// Write through a member chain. The root is read through the environment,
/// updated as a copy and written back as a whole.
fn write_target<E: Environment + ?Sized>(
    root: &CompactString,
    keys: &[Value],
    value: Value,
    env: &mut E,
) -> Result<(), EvalError> {
    let Some((last, parents)) = keys.split_last() else {
        env.assign(root, value);
        return Ok(());
    };
    let mut root_value = env.lookup(root);
    let mut slot = &mut root_value;
    for key in parents {
        slot = member_slot(slot, key)?;
    }
    slot.set_member(last, value)?;
    env.assign(root, root_value);
    Ok(())
}

/// Mutable access to `value[key]`, which must already be an object or array
fn member_slot<'v>(value: &'v mut Value, key: &Value) -> Result<&'v mut Value, EvalError> {
    let type_name = value.type_name();
    let slot = match value {
        Value::Object(map) => map.get_mut(key.to_string().as_str()),
        Value::Array(items) => {
            let n = key.to_number();
            (n >= 0.0 && n.fract() == 0.0)
                .then_some(n as usize)
                .and_then(|i| items.get_mut(i))
        }
        _ => None,
    };
    slot.ok_or_else(|| {
        EvalError::Type(format!("cannot set property of {}[{}]", type_name, key))
    })
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", left, right))
            }
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                Value::String(format!("{}{}", left, right))
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            Value::Bool(compare(op, left, right))
        }
        BinaryOp::LooseEq => Value::Bool(left.loose_eq(right)),
        BinaryOp::LooseNotEq => Value::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_eq(right)),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::LtEq => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    // Comparisons involving NaN are false
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

impl Program {
    /// Evaluate for reading; the value of the last statement
    pub fn evaluate<E: Environment + ?Sized>(&self, env: &mut E) -> Result<Value, EvalError> {
        let mut last = Value::Undefined;
        for stmt in &self.statements {
            last = eval_expr(&stmt.expr, env)?;
        }
        Ok(last)
    }

    /// Run every statement. A failing statement does not stop the ones
    /// after it; the first error is returned once all have run.
    pub fn execute<E: Environment + ?Sized>(&self, env: &mut E) -> Result<(), EvalError> {
        let mut first_error = None;
        for stmt in &self.statements {
            if let Err(err) = eval_expr(&stmt.expr, env) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
