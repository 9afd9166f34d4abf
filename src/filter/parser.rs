//! Recursive-descent parser for the textual filter language
//!
//! ```text
//! expr       := orExpr
//! orExpr     := andExpr ( "||" andExpr )*
//! andExpr    := notExpr ( "&&" notExpr )*
//! notExpr    := "!" "(" expr ")" | "(" expr ")" | comparison | methodCall
//! comparison := field op (field | literal)
//! op         := "==" | "!=" | ">=" | ">" | "<=" | "<" | "matches"
//! methodCall := name "(" field ( "," literal )* ")"
//! literal    := string | number | "true" | "false" | "null"
//! ```
//!
//! Method names are not checked here; the compiler decides which methods
//! exist. Keywords are case-insensitive, field names are not.

use super::ast::{ComparisonOp, FilterExpr, Literal, LogicalOp};
use super::MAX_DEPTH;
use crate::core::error::FilterError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Op(ComparisonOp),
    And,
    Or,
    Bang,
    LParen,
    RParen,
    Comma,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::Str(s) => format!("string {:?}", s),
            Token::Number(n) => format!("number {}", n),
            Token::Op(op) => format!("'{}'", op.symbol()),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::End => "end of input".to_string(),
        }
    }
}

fn syntax(position: usize, message: impl Into<String>) -> FilterError {
    FilterError::Syntax {
        position,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let two = input.get(start..start + 2);
        let token = match (c, two) {
            (_, Some("&&")) => {
                chars.nth(1);
                Token::And
            }
            (_, Some("||")) => {
                chars.nth(1);
                Token::Or
            }
            (_, Some("==")) => {
                chars.nth(1);
                Token::Op(ComparisonOp::Eq)
            }
            (_, Some("!=")) => {
                chars.nth(1);
                Token::Op(ComparisonOp::Ne)
            }
            (_, Some(">=")) => {
                chars.nth(1);
                Token::Op(ComparisonOp::Ge)
            }
            (_, Some("<=")) => {
                chars.nth(1);
                Token::Op(ComparisonOp::Le)
            }
            ('>', _) => {
                chars.next();
                Token::Op(ComparisonOp::Gt)
            }
            ('<', _) => {
                chars.next();
                Token::Op(ComparisonOp::Lt)
            }
            ('!', _) => {
                chars.next();
                Token::Bang
            }
            ('(', _) => {
                chars.next();
                Token::LParen
            }
            (')', _) => {
                chars.next();
                Token::RParen
            }
            (',', _) => {
                chars.next();
                Token::Comma
            }
            ('"' | '\'', _) => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((pos, ch)) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, escaped)) => value.push(escaped),
                            None => return Err(syntax(pos, "dangling escape")),
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => value.push(ch),
                    }
                }
                if !closed {
                    return Err(syntax(start, "unterminated string"));
                }
                Token::Str(value)
            }
            (c, _) if c.is_ascii_digit() || (c == '-' && starts_number(input, start + 1)) => {
                let mut end = start;
                let mut seen_dot = false;
                let mut seen_exp = false;
                while let Some(&(pos, ch)) = chars.peek() {
                    let accept = match ch {
                        '-' | '+' => {
                            pos == start || (seen_exp && matches!(input[..pos].chars().last(), Some('e' | 'E')))
                        }
                        '.' if !seen_dot && !seen_exp => {
                            seen_dot = true;
                            true
                        }
                        'e' | 'E' if !seen_exp => {
                            seen_exp = true;
                            true
                        }
                        ch => ch.is_ascii_digit(),
                    };
                    if !accept {
                        break;
                    }
                    end = pos + ch.len_utf8();
                    chars.next();
                }
                Token::Number(input[start..end].to_string())
            }
            (c, _) if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(pos, ch)) = chars.peek() {
                    if !(ch.is_alphanumeric() || ch == '_' || ch == '.') {
                        break;
                    }
                    end = pos + ch.len_utf8();
                    chars.next();
                }
                let word = &input[start..end];
                if word.eq_ignore_ascii_case("matches") {
                    Token::Op(ComparisonOp::Matches)
                } else {
                    Token::Ident(word.to_string())
                }
            }
            (c, _) => return Err(syntax(start, format!("unexpected character '{}'", c))),
        };
        tokens.push((token, start));
    }

    tokens.push((Token::End, input.len()));
    Ok(tokens)
}

fn starts_number(input: &str, at: usize) -> bool {
    input[at..].starts_with(|c: char| c.is_ascii_digit())
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)].0
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        &self.tokens[(self.cursor + ahead).min(self.tokens.len() - 1)].0
    }

    fn position(&self) -> usize {
        self.tokens[self.cursor.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), FilterError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn unexpected(&self, wanted: &str) -> FilterError {
        syntax(
            self.position(),
            format!("expected {}, found {}", wanted, self.peek().describe()),
        )
    }

    fn expr(&mut self) -> Result<FilterExpr, FilterError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut operands = vec![self.and_expr()?];
        while *self.peek() == Token::Or {
            self.advance();
            operands.push(self.and_expr()?);
        }
        Ok(collapse(LogicalOp::Or, operands))
    }

    fn and_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut operands = vec![self.not_expr()?];
        while *self.peek() == Token::And {
            self.advance();
            operands.push(self.not_expr()?);
        }
        Ok(collapse(LogicalOp::And, operands))
    }

    fn not_expr(&mut self) -> Result<FilterExpr, FilterError> {
        match self.peek() {
            Token::Bang => {
                self.advance();
                Ok(FilterExpr::not(self.group()?))
            }
            Token::LParen => self.group(),
            Token::Ident(_) if *self.peek_at(1) == Token::LParen => self.method_call(),
            Token::Ident(_) => self.comparison(),
            _ => Err(self.unexpected("a comparison, method call or '('")),
        }
    }

    /// `"(" expr ")"`, at most `MAX_DEPTH` levels deep
    fn group(&mut self) -> Result<FilterExpr, FilterError> {
        if *self.peek() == Token::LParen && self.depth == MAX_DEPTH {
            return Err(syntax(self.position(), "filter nested too deeply"));
        }
        self.expect(Token::LParen)?;
        self.depth += 1;
        let inner = self.expr()?;
        self.expect(Token::RParen)?;
        self.depth -= 1;
        Ok(inner)
    }

    fn comparison(&mut self) -> Result<FilterExpr, FilterError> {
        let left = self.field()?;
        let Token::Op(op) = *self.peek() else {
            return Err(self.unexpected("a comparison operator"));
        };
        self.advance();
        let right = match self.peek() {
            Token::Ident(name) if !is_keyword(name) => self.field()?,
            _ => self.literal()?,
        };
        Ok(FilterExpr::compare(op, left, right))
    }

    fn method_call(&mut self) -> Result<FilterExpr, FilterError> {
        let Token::Ident(name) = self.advance() else {
            return Err(self.unexpected("a method name"));
        };
        self.expect(Token::LParen)?;
        let mut args = vec![self.field()?];
        while *self.peek() == Token::Comma {
            self.advance();
            args.push(self.literal()?);
        }
        self.expect(Token::RParen)?;
        Ok(FilterExpr::call(name, args))
    }

    fn field(&mut self) -> Result<FilterExpr, FilterError> {
        match self.peek() {
            Token::Ident(name) if !is_keyword(name) => {
                let name = name.clone();
                self.advance();
                Ok(FilterExpr::Field(name))
            }
            _ => Err(self.unexpected("a field name")),
        }
    }

    fn literal(&mut self) -> Result<FilterExpr, FilterError> {
        let literal = match self.peek() {
            Token::Str(s) => Literal::String(s.clone()),
            Token::Number(n) => Literal::Number(n.clone()),
            Token::Ident(word) if word.eq_ignore_ascii_case("true") => Literal::Boolean(true),
            Token::Ident(word) if word.eq_ignore_ascii_case("false") => Literal::Boolean(false),
            Token::Ident(word) if word.eq_ignore_ascii_case("null") => Literal::Null,
            _ => return Err(self.unexpected("a literal")),
        };
        self.advance();
        Ok(FilterExpr::Literal(literal))
    }
}

fn is_keyword(word: &str) -> bool {
    ["true", "false", "null"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}

fn collapse(op: LogicalOp, mut operands: Vec<FilterExpr>) -> FilterExpr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        FilterExpr::Logical { op, operands }
    }
}

/// Parse filter text into an expression tree
///
/// Blank input yields `None`, meaning no filtering.
pub fn parse(input: &str) -> Result<Option<FilterExpr>, FilterError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut parser = Parser {
        tokens: tokenize(input)?,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if *parser.peek() != Token::End {
        return Err(parser.unexpected("end of input"));
    }
    Ok(Some(expr))
}
