//! Formula parser producing an expression tree.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, then member access / calls / indexing.

use crate::MAX_DEPTH;
use crate::error::FormulaError;
use crate::lexer::{Lexer, Token};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token: {0:?}")]
    UnexpectedToken(Token),

    #[error("expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },

    #[error("unexpected end of formula")]
    UnexpectedEof,

    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Formula expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    Array(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    New(Box<Expr>, Vec<Expr>),
}

/// Parses formula text into an expression.
pub fn parse(input: &str) -> Result<Expr, FormulaError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;
    match parser.current() {
        Token::Eof => Ok(expr),
        other => Err(ParseError::UnexpectedToken(other.clone()).into()),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else if self.current() == &Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::Expected {
                expected,
                found: self.current().clone(),
            })
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(ParseError::TooDeep(MAX_DEPTH))
        } else {
            Ok(())
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = self.parse_conditional();
        self.leave();
        result
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_or()?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let then = self.parse_expression()?;
        self.expect(&Token::Colon, "':'")?;
        let otherwise = self.parse_expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Logical(LogicalOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Logical(LogicalOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.current() {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                Token::StrictEq => BinaryOp::StrictEq,
                Token::StrictNotEq => BinaryOp::StrictNotEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.current() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current() {
                Token::Dot => {
                    self.advance();
                    expr = Expr::Member(Box::new(expr), self.parse_property_name()?);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Token::LParen => {
                    self.advance();
                    let args = self.parse_list(&Token::RParen, "')'")?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_property_name(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            Token::Eof => Err(ParseError::UnexpectedEof),
            found => Err(ParseError::Expected {
                expected: "property name",
                found,
            }),
        }
    }

    /// Parses comma separated expressions up to and including `close`.
    fn parse_list(&mut self, close: &Token, expected: &'static str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma, expected)?;
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Num(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "undefined" => Ok(Expr::Undefined),
                "new" => self.parse_new(),
                _ => Ok(Expr::Ident(name)),
            },
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => Ok(Expr::Array(self.parse_list(&Token::RBracket, "']'")?)),
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken(other)),
        }
    }

    /// `new Callee(args)` where the callee is a name or dotted path.
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let mut callee = match self.advance() {
            Token::Ident(name) => Expr::Ident(name),
            Token::Eof => return Err(ParseError::UnexpectedEof),
            found => {
                return Err(ParseError::Expected {
                    expected: "constructor name",
                    found,
                });
            }
        };
        while self.eat(&Token::Dot) {
            callee = Expr::Member(Box::new(callee), self.parse_property_name()?);
        }
        let args = if self.eat(&Token::LParen) {
            self.parse_list(&Token::RParen, "')'")?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(callee), args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                num(1.0),
                Box::new(Expr::Binary(BinaryOp::Mul, num(2.0), num(3.0)))
            )
        );
    }

    #[test]
    fn left_associative_subtraction() {
        assert_eq!(
            parse("5 - 2 - 1").unwrap(),
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Binary(BinaryOp::Sub, num(5.0), num(2.0))),
                num(1.0)
            )
        );
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        match expr {
            Expr::Conditional { otherwise, .. } => {
                assert!(matches!(*otherwise, Expr::Conditional { .. }))
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn new_date_with_method_call() {
        let expr = parse("new Date(\"2020-01-01\").getFullYear()").unwrap();
        assert_eq!(
            expr,
            Expr::Call(
                Box::new(Expr::Member(
                    Box::new(Expr::New(
                        Box::new(Expr::Ident("Date".into())),
                        vec![Expr::Str("2020-01-01".into())]
                    )),
                    "getFullYear".into()
                )),
                vec![]
            )
        );
    }

    #[test]
    fn keywords_become_literals() {
        assert_eq!(parse("undefined").unwrap(), Expr::Undefined);
        assert_eq!(parse("null").unwrap(), Expr::Null);
        assert_eq!(
            parse("[true, false]").unwrap(),
            Expr::Array(vec![Expr::Bool(true), Expr::Bool(false)])
        );
    }

    #[test]
    fn trailing_tokens_rejected() {
        assert!(matches!(
            parse("1 2"),
            Err(FormulaError::Parse(ParseError::UnexpectedToken(Token::Num(_))))
        ));
    }

    #[test]
    fn incomplete_input_rejected() {
        assert_eq!(parse("1 +"), Err(FormulaError::Parse(ParseError::UnexpectedEof)));
        assert_eq!(parse("(1"), Err(FormulaError::Parse(ParseError::UnexpectedEof)));
        assert!(parse("").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&deep), Err(FormulaError::Parse(ParseError::TooDeep(MAX_DEPTH))));
        let negations = format!("{}1", "-".repeat(200));
        assert!(parse(&negations).is_err());
        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&shallow).unwrap(), Expr::Number(1.0));
    }
}
