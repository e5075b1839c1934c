use crate::bytecode::bytecode::{self, Lineno, Opcode};
use crate::scanner;

use thiserror::Error;
use tracing::debug;

/// Deepest expression nesting the compiler accepts before reporting an
/// error instead of recursing further.
pub const MAX_NESTING: usize = 512;

#[derive(Eq, PartialEq, PartialOrd, Copy, Clone, Debug)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    Literal,
    String,
}

struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub what: String,
    pub line: usize,
    pub col: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Lexical(scanner::Error),
    #[error("[line {}:{}] {}", .0.line, .0.col, .0.what)]
    Parse(ErrorInfo),
    #[error("{0}")]
    Internal(String),
}

/// Compiles `source` into a chunk ending in `Return`. On failure every
/// diagnostic found is returned, not just the first.
pub fn compile(source: &str) -> Result<bytecode::Chunk, Vec<Error>> {
    let tokens = match scanner::scan_tokens(source) {
        Ok(tokens) => tokens,
        Err(err) => return Err(vec![Error::Lexical(err)]),
    };

    let mut compiler = Compiler::new(tokens);
    compiler.program();

    if compiler.errors.is_empty() {
        debug!(
            bytes = compiler.chunk.code_len(),
            constants = compiler.chunk.constants.len(),
            "compiled chunk"
        );
        Ok(compiler.chunk)
    } else {
        Err(compiler.errors)
    }
}

struct Compiler {
    tokens: Vec<Token>,
    token_idx: usize,
    chunk: bytecode::Chunk,
    errors: Vec<Error>,
    depth: usize,
}

type Token = scanner::Token;

impl Compiler {
    fn new(tokens: Vec<Token>) -> Compiler {
        Compiler {
            tokens,
            token_idx: 0,
            chunk: bytecode::Chunk::default(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn program(&mut self) {
        while !self.is_at_end() {
            let start = self.token_idx;
            if let Err(err) = self.statement() {
                self.errors.push(err);
                // Always step past the offending token.
                if self.token_idx == start {
                    self.advance();
                }
                self.synchronize();
            }
        }

        let lineno = self.lineno(self.peek());
        self.emit_op(Opcode::Return, lineno);
    }

    fn statement(&mut self) -> Result<(), Error> {
        if self.matches(scanner::TokenType::Print) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<(), Error> {
        self.expression()?;
        self.consume(scanner::TokenType::Semicolon, "Expected ';' after value.")?;
        let lineno = self.lineno(self.previous());
        self.emit_op(Opcode::Print, lineno);
        Ok(())
    }

    fn expression_statement(&mut self) -> Result<(), Error> {
        self.expression()?;
        self.consume(
            scanner::TokenType::Semicolon,
            "Expected ';' after expression.",
        )?;
        let lineno = self.lineno(self.previous());
        self.emit_op(Opcode::Pop, lineno);
        Ok(())
    }

    fn expression(&mut self) -> Result<(), Error> {
        self.parse_precedence(Precedence::Assignment)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> Result<(), Error> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(self.peek().clone(), "Expression nests too deeply."));
        }
        self.depth += 1;
        let res = self.parse_operand_and_infixes(precedence);
        self.depth -= 1;
        res
    }

    fn parse_operand_and_infixes(&mut self, precedence: Precedence) -> Result<(), Error> {
        let prefix = match Compiler::get_rule(self.peek().ty).prefix {
            Some(parse_fn) => parse_fn,
            None => return Err(self.error_at(self.peek().clone(), "Expected expression.")),
        };
        self.advance();
        self.apply_parse_fn(prefix)?;

        while precedence <= Compiler::get_rule(self.peek().ty).precedence {
            self.advance();
            match Compiler::get_rule(self.previous().ty).infix {
                Some(parse_fn) => self.apply_parse_fn(parse_fn)?,
                None => {
                    return Err(Error::Internal(format!(
                        "no infix rule for {:?}",
                        self.previous().ty
                    )))
                }
            }
        }

        Ok(())
    }

    fn apply_parse_fn(&mut self, parse_fn: ParseFn) -> Result<(), Error> {
        match parse_fn {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::Literal => self.literal(),
            ParseFn::String => self.string(),
        }
    }

    fn grouping(&mut self) -> Result<(), Error> {
        self.expression()?;
        self.consume(
            scanner::TokenType::RightParen,
            "Expected ')' after expression.",
        )?;
        Ok(())
    }

    fn unary(&mut self) -> Result<(), Error> {
        let operator = self.previous().clone();
        self.parse_precedence(Precedence::Unary)?;

        let lineno = self.lineno(&operator);
        match operator.ty {
            scanner::TokenType::Minus => self.emit_op(Opcode::Negate, lineno),
            scanner::TokenType::Bang => self.emit_op(Opcode::Not, lineno),
            _ => {
                return Err(Error::Internal(format!(
                    "invalid token {:?} in unary expression",
                    operator.ty
                )))
            }
        }
        Ok(())
    }

    fn binary(&mut self) -> Result<(), Error> {
        let operator = self.previous().clone();
        let rule = Compiler::get_rule(operator.ty);
        self.parse_precedence(rule.precedence.next())?;

        let lineno = self.lineno(&operator);
        match operator.ty {
            scanner::TokenType::Plus => self.emit_op(Opcode::Add, lineno),
            scanner::TokenType::Minus => self.emit_op(Opcode::Subtract, lineno),
            scanner::TokenType::Star => self.emit_op(Opcode::Multiply, lineno),
            scanner::TokenType::Slash => self.emit_op(Opcode::Divide, lineno),
            scanner::TokenType::EqualEqual => self.emit_op(Opcode::Equal, lineno),
            scanner::TokenType::BangEqual => {
                self.emit_op(Opcode::Equal, lineno);
                self.emit_op(Opcode::Not, lineno);
            }
            scanner::TokenType::Greater => self.emit_op(Opcode::Greater, lineno),
            scanner::TokenType::GreaterEqual => {
                self.emit_op(Opcode::Less, lineno);
                self.emit_op(Opcode::Not, lineno);
            }
            scanner::TokenType::Less => self.emit_op(Opcode::Less, lineno),
            scanner::TokenType::LessEqual => {
                self.emit_op(Opcode::Greater, lineno);
                self.emit_op(Opcode::Not, lineno);
            }
            _ => {
                return Err(Error::Internal(format!(
                    "invalid token {:?} in binary expression",
                    operator.ty
                )))
            }
        }
        Ok(())
    }

    fn number(&mut self) -> Result<(), Error> {
        let tok = self.previous().clone();
        let lineno = self.lineno(&tok);
        match tok.literal {
            Some(scanner::Literal::Number(num)) => {
                self.emit_constant(bytecode::Constant::Number(num), lineno)
            }
            _ => Err(Error::Internal(format!(
                "Expected number at line={},col={}",
                tok.line, tok.col
            ))),
        }
    }

    fn string(&mut self) -> Result<(), Error> {
        let tok = self.previous().clone();
        let lineno = self.lineno(&tok);
        match tok.literal {
            Some(scanner::Literal::Str(s)) => {
                self.emit_constant(bytecode::Constant::String(s), lineno)
            }
            _ => Err(Error::Internal(format!(
                "Expected string at line={},col={}",
                tok.line, tok.col
            ))),
        }
    }

    fn literal(&mut self) -> Result<(), Error> {
        let tok = self.previous().clone();
        let lineno = self.lineno(&tok);
        match tok.ty {
            scanner::TokenType::Nil => self.emit_op(Opcode::Nil, lineno),
            scanner::TokenType::True => self.emit_op(Opcode::True, lineno),
            scanner::TokenType::False => self.emit_op(Opcode::False, lineno),
            _ => {
                return Err(Error::Internal(format!(
                    "invalid token {:?} in literal",
                    tok.ty
                )))
            }
        }
        Ok(())
    }

    fn emit_op(&mut self, op: Opcode, lineno: Lineno) {
        self.chunk.write_op(op, lineno);
    }

    fn emit_constant(&mut self, val: bytecode::Constant, lineno: Lineno) -> Result<(), Error> {
        self.chunk
            .write_constant(val, lineno)
            .map(|_| ())
            .map_err(Error::Internal)
    }

    /// Skips tokens until a likely statement boundary so that one mistake
    /// does not cascade into a stream of follow-on errors.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.token_idx > 0 && self.previous().ty == scanner::TokenType::Semicolon {
                return;
            }

            match self.peek().ty {
                scanner::TokenType::Class
                | scanner::TokenType::Fun
                | scanner::TokenType::Var
                | scanner::TokenType::For
                | scanner::TokenType::If
                | scanner::TokenType::While
                | scanner::TokenType::Print
                | scanner::TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn consume(&mut self, tok: scanner::TokenType, on_err_str: &str) -> Result<(), Error> {
        if self.check(tok) {
            self.advance();
            return Ok(());
        }
        Err(self.error_at(self.peek().clone(), on_err_str))
    }

    fn error_at(&self, tok: Token, what: &str) -> Error {
        let location = if tok.ty == scanner::TokenType::Eof {
            String::from("at end")
        } else {
            format!("at '{}'", tok.lexeme)
        };
        Error::Parse(ErrorInfo {
            what: format!("{} ({})", what, location),
            line: tok.line,
            col: tok.col,
        })
    }

    fn lineno(&self, tok: &Token) -> Lineno {
        Lineno(tok.line)
    }

    fn matches(&mut self, ty: scanner::TokenType) -> bool {
        if self.check(ty) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, ty: scanner::TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().ty == ty
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.token_idx += 1
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == scanner::TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.token_idx]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.token_idx - 1]
    }

    fn get_rule(operator: scanner::TokenType) -> ParseRule {
        match operator {
            scanner::TokenType::LeftParen => ParseRule {
                prefix: Some(ParseFn::Grouping),
                infix: None,
                precedence: Precedence::None,
            },
            scanner::TokenType::Minus => ParseRule {
                prefix: Some(ParseFn::Unary),
                infix: Some(ParseFn::Binary),
                precedence: Precedence::Term,
            },
            scanner::TokenType::Plus => ParseRule {
                prefix: None,
                infix: Some(ParseFn::Binary),
                precedence: Precedence::Term,
            },
            scanner::TokenType::Slash | scanner::TokenType::Star => ParseRule {
                prefix: None,
                infix: Some(ParseFn::Binary),
                precedence: Precedence::Factor,
            },
            scanner::TokenType::Bang => ParseRule {
                prefix: Some(ParseFn::Unary),
                infix: None,
                precedence: Precedence::None,
            },
            scanner::TokenType::BangEqual | scanner::TokenType::EqualEqual => ParseRule {
                prefix: None,
                infix: Some(ParseFn::Binary),
                precedence: Precedence::Equality,
            },
            scanner::TokenType::Greater
            | scanner::TokenType::GreaterEqual
            | scanner::TokenType::Less
            | scanner::TokenType::LessEqual => ParseRule {
                prefix: None,
                infix: Some(ParseFn::Binary),
                precedence: Precedence::Comparison,
            },
            scanner::TokenType::String => ParseRule {
                prefix: Some(ParseFn::String),
                infix: None,
                precedence: Precedence::None,
            },
            scanner::TokenType::Number => ParseRule {
                prefix: Some(ParseFn::Number),
                infix: None,
                precedence: Precedence::None,
            },
            scanner::TokenType::False | scanner::TokenType::True | scanner::TokenType::Nil => {
                ParseRule {
                    prefix: Some(ParseFn::Literal),
                    infix: None,
                    precedence: Precedence::None,
                }
            }
            _ => ParseRule {
                prefix: None,
                infix: None,
                precedence: Precedence::None,
            },
        }
    }
}
