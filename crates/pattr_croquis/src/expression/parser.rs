//! Precedence-climbing parser for attribute expressions.

use pattr_carton::CompactString;

use super::ast::{
    AssignOp, AssignTarget, BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp, UpdateOp,
};
use super::lexer::{tokenize, Token, TokenKind};
use crate::errors::EvalError;
use crate::value::Value;

/// Binding power of binary operators, lowest first
mod prec {
    pub const COALESCE: u8 = 1;
    pub const OR: u8 = 2;
    pub const AND: u8 = 3;
    pub const EQUALITY: u8 = 4;
    pub const RELATIONAL: u8 = 5;
    pub const ADDITIVE: u8 = 6;
    pub const MULTIPLICATIVE: u8 = 7;
}

/// Deepest nesting of parentheses, literals, prefix operators and operator
/// chains one expression may have
const MAX_NESTING: usize = 128;

/// Parse a `;`-separated statement list
pub fn parse_program(source: &str) -> Result<Program, EvalError> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    loop {
        while parser.eat(&TokenKind::Semicolon) {}
        if parser.at(&TokenKind::Eof) {
            break;
        }
        let start = parser.peek().start;
        let expr = parser.parse_assignment()?;
        let end = parser.previous_end;
        statements.push(Stmt { expr, start, end });
        if !parser.at(&TokenKind::Eof) {
            parser.expect(&TokenKind::Semicolon, "';'")?;
        }
    }
    Ok(Program { statements })
}

/// Parse a single expression; trailing input is an error
pub fn parse_expression(source: &str) -> Result<Expr, EvalError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_assignment()?;
    if !parser.at(&TokenKind::Eof) {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    previous_end: u32,
    depth: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, EvalError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            previous_end: 0,
            depth: 0,
        })
    }

    // ==== Token cursor ====

    #[inline]
    fn peek(&self) -> &Token {
        // tokenize always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        self.previous_end = token.end;
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, EvalError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> EvalError {
        let token = self.peek();
        match &token.kind {
            TokenKind::Unsupported(construct) => EvalError::Unsupported {
                construct: *construct,
                offset: token.start,
            },
            TokenKind::Eof => EvalError::syntax(
                format!("unexpected end of input, expected {}", expected),
                token.start,
            ),
            _ => EvalError::syntax(format!("expected {}", expected), token.start),
        }
    }

    /// Count one level of nesting. Errors leave the count raised; the
    /// parse is abandoned anyway.
    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EvalError::syntax(
                "expression is nested too deeply",
                self.peek().start,
            ));
        }
        Ok(())
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr, EvalError>) -> Result<Expr, EvalError> {
        self.enter()?;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    // ==== Expressions ====

    fn parse_assignment(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr, EvalError> {
        let start = self.peek().start;
        let left = self.parse_conditional()?;
        let op = match self.peek().kind {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusEq => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarEq => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashEq => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentEq => AssignOp::Compound(BinaryOp::Rem),
            _ => return Ok(left),
        };
        self.advance();
        let target = into_target(left, start)?;
        // Right associative: `a = b = 1`
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target,
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        let test = self.parse_binary(prec::COALESCE)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        let mut chain = 0;
        while let Some((prec, op)) = binary_operator(&self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            // Each operator deepens the left operand
            self.enter()?;
            chain += 1;
            let right = self.parse_binary(prec + 1)?;
            left = match op {
                Operator::Binary(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Operator::Logical(op) => Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        self.depth -= chain;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let start = self.peek().start;
        let op = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let update = match self.peek().kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let operand_start = self.peek().start;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Update {
                op,
                prefix: true,
                target: into_target(operand, operand_start)?,
            });
        }

        let expr = self.parse_postfix()?;
        let update = match self.peek().kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        match update {
            Some(op) => {
                self.advance();
                Ok(Expr::Update {
                    op,
                    prefix: false,
                    target: into_target(expr, start)?,
                })
            }
            None => Ok(expr),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        let mut chain = 0;
        loop {
            if matches!(self.peek().kind, TokenKind::Dot | TokenKind::LBracket) {
                self.enter()?;
                chain += 1;
            }
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let token = self.advance();
                    let TokenKind::Identifier(name) = token.kind else {
                        return Err(EvalError::syntax("expected property name", token.start));
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::Literal(Value::String(name.to_string()))),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.parse_assignment()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                    };
                }
                TokenKind::LParen => {
                    return Err(EvalError::Unsupported {
                        construct: "function call",
                        offset: self.peek().start,
                    });
                }
                _ => {
                    self.depth -= chain;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(match name.as_str() {
                    "true" => Expr::Literal(Value::Bool(true)),
                    "false" => Expr::Literal(Value::Bool(false)),
                    "null" => Expr::Literal(Value::Null),
                    "undefined" => Expr::Literal(Value::Undefined),
                    "NaN" => Expr::Literal(Value::Number(f64::NAN)),
                    "Infinity" => Expr::Literal(Value::Number(f64::INFINITY)),
                    "function" | "new" | "typeof" | "delete" | "void" | "in" | "instanceof"
                    | "this" | "class" | "var" | "let" | "const" | "return" | "if" | "for"
                    | "while" => {
                        return Err(EvalError::Unsupported {
                            construct: "keyword",
                            offset: token.start,
                        })
                    }
                    _ => Expr::Identifier(name),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.at(&TokenKind::RBracket) {
                    items.push(self.parse_assignment()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(Expr::Array(items))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut props = Vec::new();
                while !self.at(&TokenKind::RBrace) {
                    props.push(self.parse_property()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace, "'}'")?;
                Ok(Expr::Object(props))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_property(&mut self) -> Result<(CompactString, Expr), EvalError> {
        let token = self.advance();
        let key: CompactString = match token.kind {
            TokenKind::Identifier(name) => {
                // Shorthand `{ count }`
                if !self.at(&TokenKind::Colon) {
                    return Ok((name.clone(), Expr::Identifier(name)));
                }
                name
            }
            TokenKind::String(s) => s.into(),
            TokenKind::Number(n) => Value::Number(n).to_string().into(),
            _ => return Err(EvalError::syntax("expected property key", token.start)),
        };
        self.expect(&TokenKind::Colon, "':'")?;
        Ok((key, self.parse_assignment()?))
    }
}

enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn binary_operator(kind: &TokenKind) -> Option<(u8, Operator)> {
    use Operator::{Binary, Logical};
    Some(match kind {
        TokenKind::QuestionQuestion => (prec::COALESCE, Logical(LogicalOp::Coalesce)),
        TokenKind::PipePipe => (prec::OR, Logical(LogicalOp::Or)),
        TokenKind::AmpAmp => (prec::AND, Logical(LogicalOp::And)),
        TokenKind::EqEq => (prec::EQUALITY, Binary(BinaryOp::LooseEq)),
        TokenKind::BangEq => (prec::EQUALITY, Binary(BinaryOp::LooseNotEq)),
        TokenKind::EqEqEq => (prec::EQUALITY, Binary(BinaryOp::StrictEq)),
        TokenKind::BangEqEq => (prec::EQUALITY, Binary(BinaryOp::StrictNotEq)),
        TokenKind::Lt => (prec::RELATIONAL, Binary(BinaryOp::Lt)),
        TokenKind::LtEq => (prec::RELATIONAL, Binary(BinaryOp::LtEq)),
        TokenKind::Gt => (prec::RELATIONAL, Binary(BinaryOp::Gt)),
        TokenKind::GtEq => (prec::RELATIONAL, Binary(BinaryOp::GtEq)),
        TokenKind::Plus => (prec::ADDITIVE, Binary(BinaryOp::Add)),
        TokenKind::Minus => (prec::ADDITIVE, Binary(BinaryOp::Sub)),
        TokenKind::Star => (prec::MULTIPLICATIVE, Binary(BinaryOp::Mul)),
        TokenKind::Slash => (prec::MULTIPLICATIVE, Binary(BinaryOp::Div)),
        TokenKind::Percent => (prec::MULTIPLICATIVE, Binary(BinaryOp::Rem)),
        _ => return None,
    })
}

/// Turn a parsed left-hand side into an assignment target
fn into_target(expr: Expr, offset: u32) -> Result<AssignTarget, EvalError> {
    AssignTarget::from_expr(expr).ok_or(EvalError::InvalidAssignmentTarget { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn ident(name: &str) -> Expr {
        Expr::Identifier(name.into())
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * 2").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Add,
                ident("a"),
                binary(BinaryOp::Mul, ident("b"), Expr::Literal(Value::Number(2.0)))
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_expression("a - b - c").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Sub,
                binary(BinaryOp::Sub, ident("a"), ident("b")),
                ident("c")
            )
        );
    }

    #[test]
    fn test_member_assignment_target() {
        let expr = parse_expression("user.tags[0] = 'x'").unwrap();
        let Expr::Assign { target, op, .. } = expr else {
            panic!("expected assignment");
        };
        assert_eq!(op, AssignOp::Assign);
        assert_eq!(target.root, "user");
        assert_eq!(
            target.path,
            vec![
                Expr::Literal(Value::String("tags".into())),
                Expr::Literal(Value::Number(0.0)),
            ]
        );
    }

    #[test]
    fn test_program_spans() {
        let source = "a = x + 1;  b = y + 1;";
        let program = parse_program(source).unwrap();
        let spans: Vec<_> = program
            .statements
            .iter()
            .map(|s| &source[s.start as usize..s.end as usize])
            .collect();
        assert_eq!(spans, vec!["a = x + 1", "b = y + 1"]);
    }

    #[test]
    fn test_object_literal() {
        let expr = parse_expression("{ open: false, count, 'a b': 1 }").unwrap();
        let Expr::Object(props) = expr else {
            panic!("expected object");
        };
        let keys: Vec<_> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["open", "count", "a b"]);
    }

    #[test]
    fn test_rejects_calls_and_keywords() {
        assert!(matches!(
            parse_expression("alert(1)"),
            Err(EvalError::Unsupported {
                construct: "function call",
                ..
            })
        ));
        assert!(matches!(
            parse_expression("x => x"),
            Err(EvalError::Unsupported { .. })
        ));
        assert!(matches!(
            parse_expression("typeof x"),
            Err(EvalError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(matches!(
            parse_expression("a + b = 1"),
            Err(EvalError::InvalidAssignmentTarget { .. })
        ));
        assert!(matches!(
            parse_expression("1++"),
            Err(EvalError::InvalidAssignmentTarget { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        assert!(matches!(
            parse_expression(&deep),
            Err(EvalError::Syntax { .. })
        ));
        let negations = format!("{}x", "!".repeat(50_000));
        assert!(parse_expression(&negations).is_err());
        let sum = vec!["1"; 50_000].join(" + ");
        assert!(parse_program(&format!("a = {}", sum)).is_err());
        let chain = format!("a{}", ".b".repeat(50_000));
        assert!(parse_expression(&chain).is_err());

        // Ordinary nesting is unaffected
        let modest = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert!(parse_expression(&modest).is_ok());
        assert!(parse_expression(&vec!["1"; 60].join(" + ")).is_ok());
    }

    #[test]
    fn test_trailing_input() {
        assert!(parse_expression("a b").is_err());
        assert!(parse_program("a = 1 b = 2").is_err());
    }
}
