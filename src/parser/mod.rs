//! Parser for While programs
//!
//! Recursive descent over the token stream. Statement grammar:
//!
//! ```text
//! S   ->  S1 (';' S)?
//! S1  ->  'skip' | Var ':=' E | 'if' E 'then' S 'else' S1
//!       | 'while' E 'do' S1 | '(' S ')' | 'assert' E
//! Var ->  id ('[' E ']')?
//! E   ->  'not' E | E0 (op E0)? (('and'|'or'|'mod') E)?
//! E0  ->  Var | num | '??' | 'true' | 'false' | '(' E ')'
//! ```
//!
//! Binary operators carry no precedence; the pretty-printer parenthesizes
//! every application, so round-tripped programs never rely on it.

use crate::ast::{BinOp, Cmd, Expr};
use crate::error::{ParserError, SourceLocation};
use crate::lexer::{Keyword, Lexer, Token, TokenType};

/// Parser state over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// Parse a complete program
pub fn parse(source: &str) -> Result<Cmd, ParserError> {
    parse_named(source, "<input>")
}

/// Parse a complete program, naming the source for error locations
pub fn parse_named(source: &str, file_name: &str) -> Result<Cmd, ParserError> {
    let tokens = Lexer::new(source, file_name.to_string()).tokenize()?;
    let mut parser = Parser::new(tokens);
    let program = parser.parse_seq()?;
    parser.expect_eof()?;
    Ok(program)
}

/// Parse a bare predicate expression (used for pre/post-conditions and
/// loop invariants)
pub fn parse_predicate(source: &str) -> Result<Expr, ParserError> {
    let tokens = Lexer::new(source, "<predicate>".to_string()).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &TokenType {
        self.tokens
            .get(self.position)
            .map(|t| &t.token_type)
            .unwrap_or(&TokenType::Eof)
    }

    fn current_location(&self) -> SourceLocation {
        self.tokens
            .get(self.position)
            .map(|t| t.location.clone())
            .unwrap_or_else(SourceLocation::unknown)
    }

    fn advance(&mut self) -> TokenType {
        let token_type = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token_type
    }

    fn check(&self, expected: &TokenType) -> bool {
        self.current() == expected
    }

    fn consume(&mut self, expected: TokenType, description: &str) -> Result<(), ParserError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            self.unexpected(description)
        }
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.current(), TokenType::Keyword(k) if *k == keyword)
    }

    fn consume_keyword(&mut self, keyword: Keyword, description: &str) -> Result<(), ParserError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            self.unexpected(description)
        }
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T, ParserError> {
        match self.current() {
            TokenType::Eof => Err(ParserError::UnexpectedEof {
                expected: expected.to_string(),
            }),
            found => Err(ParserError::UnexpectedToken {
                found: format!("{found:?}"),
                expected: expected.to_string(),
                location: self.current_location(),
            }),
        }
    }

    fn expect_eof(&self) -> Result<(), ParserError> {
        if self.check(&TokenType::Eof) {
            Ok(())
        } else {
            Err(ParserError::TrailingInput {
                location: self.current_location(),
            })
        }
    }

    /// S -> S1 (';' S)?
    pub fn parse_seq(&mut self) -> Result<Cmd, ParserError> {
        let first = self.parse_stmt()?;
        if self.check(&TokenType::Semicolon) {
            self.advance();
            let rest = self.parse_seq()?;
            Ok(Cmd::Seq(Box::new(first), Box::new(rest)))
        } else {
            Ok(first)
        }
    }

    /// S1 -> skip | Var := E | if | while | ( S ) | assert E
    fn parse_stmt(&mut self) -> Result<Cmd, ParserError> {
        match self.current().clone() {
            TokenType::Keyword(Keyword::Skip) => {
                self.advance();
                Ok(Cmd::Skip)
            }
            TokenType::Keyword(Keyword::Assert) => {
                self.advance();
                Ok(Cmd::Assert(self.parse_expr()?))
            }
            TokenType::Keyword(Keyword::If) => {
                self.advance();
                let cond = self.parse_expr()?;
                self.consume_keyword(Keyword::Then, "'then'")?;
                let then_branch = self.parse_seq()?;
                self.consume_keyword(Keyword::Else, "'else'")?;
                let else_branch = self.parse_stmt()?;
                Ok(Cmd::If {
                    cond,
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                })
            }
            TokenType::Keyword(Keyword::While) => {
                self.advance();
                let cond = self.parse_expr()?;
                self.consume_keyword(Keyword::Do, "'do'")?;
                let body = self.parse_stmt()?;
                Ok(Cmd::While {
                    cond,
                    body: Box::new(body),
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_seq()?;
                self.consume(TokenType::RightParen, "')'")?;
                Ok(inner)
            }
            TokenType::Identifier(name) => {
                self.advance();
                if self.check(&TokenType::LeftBracket) {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.consume(TokenType::RightBracket, "']'")?;
                    self.consume(TokenType::Assign, "':='")?;
                    let value = self.parse_expr()?;
                    Ok(Cmd::Store {
                        array: name,
                        index,
                        value,
                    })
                } else {
                    self.consume(TokenType::Assign, "':='")?;
                    let value = self.parse_expr()?;
                    Ok(Cmd::Assign { name, value })
                }
            }
            _ => self.unexpected("a statement"),
        }
    }

    /// E -> not E | E0 (op E0)? (('and'|'or'|'mod') E)?
    pub fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        if self.check_keyword(Keyword::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_expr()?)));
        }

        let mut expr = self.parse_atom()?;

        if let Some(op) = self.comparison_or_arith_op() {
            self.advance();
            let right = self.parse_atom()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        if let Some(op) = self.connective_op() {
            self.advance();
            let right = self.parse_expr()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison_or_arith_op(&self) -> Option<BinOp> {
        match self.current() {
            TokenType::Plus => Some(BinOp::Add),
            TokenType::Minus => Some(BinOp::Sub),
            TokenType::Star => Some(BinOp::Mul),
            TokenType::Slash => Some(BinOp::Div),
            TokenType::Eq => Some(BinOp::Eq),
            TokenType::Ne => Some(BinOp::Ne),
            TokenType::Lt => Some(BinOp::Lt),
            TokenType::Le => Some(BinOp::Le),
            TokenType::Gt => Some(BinOp::Gt),
            TokenType::Ge => Some(BinOp::Ge),
            _ => None,
        }
    }

    fn connective_op(&self) -> Option<BinOp> {
        match self.current() {
            TokenType::Keyword(Keyword::And) => Some(BinOp::And),
            TokenType::Keyword(Keyword::Or) => Some(BinOp::Or),
            TokenType::Keyword(Keyword::Mod) => Some(BinOp::Mod),
            _ => None,
        }
    }

    /// E0 -> Var | num | ?? | true | false | ( E )
    fn parse_atom(&mut self) -> Result<Expr, ParserError> {
        match self.current().clone() {
            TokenType::Number(value) => {
                self.advance();
                Ok(Expr::Num(value))
            }
            TokenType::Hole => {
                self.advance();
                Ok(Expr::Hole { id: None })
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenType::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenType::Identifier(name) => {
                self.advance();
                if self.check(&TokenType::LeftBracket) {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.consume(TokenType::RightBracket, "']'")?;
                    Ok(Expr::Select {
                        array: name,
                        index: Box::new(index),
                    })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(TokenType::RightParen, "')'")?;
                Ok(inner)
            }
            _ => self.unexpected("an expression"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skip() {
        assert_eq!(parse("skip").expect("parse failed"), Cmd::Skip);
    }

    #[test]
    fn test_parse_sequence_right_associates() {
        let cmd = parse("a := 1 ; b := 2 ; c := 3").expect("parse failed");
        match cmd {
            Cmd::Seq(first, rest) => {
                assert!(matches!(*first, Cmd::Assign { .. }));
                assert!(matches!(*rest, Cmd::Seq(_, _)));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_absorbs_sequenced_then() {
        let cmd = parse("if x < 0 then a := 1 ; b := 2 else skip").expect("parse failed");
        match cmd {
            Cmd::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(matches!(*then_branch, Cmd::Seq(_, _)));
                assert_eq!(*else_branch, Cmd::Skip);
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_while_body_is_single_statement() {
        // The loop takes the parenthesized block; the tail assignment
        // belongs to the enclosing sequence.
        let cmd = parse("while i < n do ( i := i + 1 ); r := i").expect("parse failed");
        match cmd {
            Cmd::Seq(first, rest) => {
                assert!(matches!(*first, Cmd::While { .. }));
                assert!(matches!(*rest, Cmd::Assign { .. }));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_array_store_and_select() {
        let cmd = parse("a[i + 1] := a[i]").expect("parse failed");
        match cmd {
            Cmd::Store {
                array,
                index,
                value,
            } => {
                assert_eq!(array, "a");
                assert!(matches!(index, Expr::Binary { op: BinOp::Add, .. }));
                assert!(matches!(value, Expr::Select { .. }));
            }
            other => panic!("expected store, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_holes() {
        let cmd = parse("if x < ?? then y := ?? else y := ??").expect("parse failed");
        assert_eq!(cmd.hole_count(), 3);
        assert!(cmd.hole_ids().iter().all(|id| id.is_none()));
    }

    #[test]
    fn test_parse_connectives() {
        let expr = parse_predicate("x > 0 and y > 0 or z = 0").expect("parse failed");
        assert!(matches!(expr, Expr::Binary { op: BinOp::And, .. }));
    }

    #[test]
    fn test_parse_mod_connective_level() {
        let expr = parse_predicate("(b mod 2) = 0").expect("parse failed");
        assert!(matches!(expr, Expr::Binary { op: BinOp::Eq, .. }));
    }

    #[test]
    fn test_parse_not() {
        let expr = parse_predicate("not (x = y)").expect("parse failed");
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn test_reject_trailing_input() {
        assert!(matches!(
            parse("skip skip"),
            Err(ParserError::TrailingInput { .. })
        ));
    }

    #[test]
    fn test_reject_missing_then() {
        assert!(matches!(
            parse("if x < 0 y := 1 else skip"),
            Err(ParserError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_reject_eof_in_expression() {
        assert!(matches!(
            parse("x :="),
            Err(ParserError::UnexpectedEof { .. })
        ));
    }
}
