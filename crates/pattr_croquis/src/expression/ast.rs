//! Expression AST.
//!
//! Besides the tree itself this module answers the two questions the
//! change tracker asks of a statement: which variables it reads and which
//! variables it writes.

use pattr_carton::{CompactString, FxHashSet};

use crate::value::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Minus,
    /// `+`
    Plus,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LooseEq,
    LooseNotEq,
    StrictEq,
    StrictNotEq,
}

/// Short-circuiting operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

/// Assignment operators; compound forms carry their binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Left-hand side of an assignment: a variable plus a (possibly empty)
/// chain of member keys, e.g. `user.tags[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignTarget {
    pub root: CompactString,
    pub path: Vec<Expr>,
}

impl AssignTarget {
    /// Convert an identifier or member chain; anything else is not writable
    pub fn from_expr(expr: Expr) -> Option<Self> {
        let mut path = Vec::new();
        let mut current = expr;
        loop {
            match current {
                Expr::Identifier(root) => {
                    path.reverse();
                    return Some(Self { root, path });
                }
                Expr::Member { object, property } => {
                    path.push(*property);
                    current = *object;
                }
                _ => return None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Identifier(CompactString),
    Array(Vec<Expr>),
    Object(Vec<(CompactString, Expr)>),
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: AssignTarget,
        value: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: AssignTarget,
    },
}

impl Expr {
    /// Whether evaluating this expression writes a variable
    pub fn has_assignment(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Expr::Assign { .. } | Expr::Update { .. }) {
                found = true;
            }
        });
        found
    }

    /// Collect every variable name whose current value this expression reads
    pub fn collect_reads(&self, out: &mut FxHashSet<CompactString>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(name) => {
                out.insert(name.clone());
            }
            Expr::Array(items) => items.iter().for_each(|e| e.collect_reads(out)),
            Expr::Object(props) => props.iter().for_each(|(_, e)| e.collect_reads(out)),
            Expr::Member { object, property } => {
                object.collect_reads(out);
                property.collect_reads(out);
            }
            Expr::Unary { operand, .. } => operand.collect_reads(out),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.collect_reads(out);
                right.collect_reads(out);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_reads(out);
                consequent.collect_reads(out);
                alternate.collect_reads(out);
            }
            Expr::Assign { op, target, value } => {
                // Member writes and compound operators read the old root value
                if *op != AssignOp::Assign || !target.path.is_empty() {
                    out.insert(target.root.clone());
                }
                target.path.iter().for_each(|e| e.collect_reads(out));
                value.collect_reads(out);
            }
            Expr::Update { target, .. } => {
                out.insert(target.root.clone());
                target.path.iter().for_each(|e| e.collect_reads(out));
            }
        }
    }

    /// Collect every variable name this expression assigns
    pub fn collect_targets(&self, out: &mut FxHashSet<CompactString>) {
        self.walk(&mut |e| match e {
            Expr::Assign { target, .. } | Expr::Update { target, .. } => {
                out.insert(target.root.clone());
            }
            _ => {}
        });
    }

    /// Pre-order traversal
    fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Identifier(_) => {}
            Expr::Array(items) => items.iter().for_each(|e| e.walk(f)),
            Expr::Object(props) => props.iter().for_each(|(_, e)| e.walk(f)),
            Expr::Member { object, property } => {
                object.walk(f);
                property.walk(f);
            }
            Expr::Unary { operand, .. } => operand.walk(f),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.walk(f);
                consequent.walk(f);
                alternate.walk(f);
            }
            Expr::Assign { target, value, .. } => {
                target.path.iter().for_each(|e| e.walk(f));
                value.walk(f);
            }
            Expr::Update { target, .. } => target.path.iter().for_each(|e| e.walk(f)),
        }
    }
}

/// One `;`-separated statement
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub expr: Expr,
    /// Byte span in the program source
    pub start: u32,
    pub end: u32,
}

impl Stmt {
    pub fn reads(&self) -> FxHashSet<CompactString> {
        let mut out = FxHashSet::default();
        self.expr.collect_reads(&mut out);
        out
    }

    pub fn targets(&self) -> FxHashSet<CompactString> {
        let mut out = FxHashSet::default();
        self.expr.collect_targets(&mut out);
        out
    }
}

/// A parsed statement list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn has_assignment(&self) -> bool {
        self.statements.iter().any(|s| s.expr.has_assignment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse_program;

    fn sorted(set: FxHashSet<CompactString>) -> Vec<String> {
        let mut names: Vec<_> = set.into_iter().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_reads_and_targets() {
        let program = parse_program("a = x + y.z; b += c[k]; n++; user.name = first").unwrap();
        let reads: Vec<_> = program.statements.iter().map(|s| sorted(s.reads())).collect();
        let targets: Vec<_> = program
            .statements
            .iter()
            .map(|s| sorted(s.targets()))
            .collect();
        assert_eq!(
            reads,
            vec![
                vec!["x", "y"],
                vec!["b", "c", "k"],
                vec!["n"],
                vec!["first", "user"],
            ]
        );
        assert_eq!(targets, vec![vec!["a"], vec!["b"], vec!["n"], vec!["user"]]);
    }

    #[test]
    fn test_member_property_name_is_not_a_read() {
        let program = parse_program("total = item.price").unwrap();
        assert_eq!(sorted(program.statements[0].reads()), vec!["item"]);
    }

    #[test]
    fn test_has_assignment() {
        assert!(!parse_program("a + b").unwrap().has_assignment());
        assert!(parse_program("a ? (b = 1) : 2").unwrap().has_assignment());
        assert!(parse_program("list[i]++").unwrap().has_assignment());
    }
}
