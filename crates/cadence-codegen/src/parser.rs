//! Statement and expression parser.
//!
//! Hand-written precedence-climbing (Pratt) parser over the token stream
//! produced by [`tokenize`](crate::lexer::tokenize).

use crate::ast::{AssignOp, Assignment, BinaryOp, Expr, UnaryOp};
use crate::error::CompileError;
use crate::lexer::{tokenize, Lexeme, Token};

/// Token stream with single-token lookahead and line tracking.
struct TokenStream<'src> {
    lexemes: &'src [Lexeme],
    pos: usize,
}

impl<'src> TokenStream<'src> {
    fn new(lexemes: &'src [Lexeme]) -> Self {
        Self { lexemes, pos: 0 }
    }

    fn peek(&self) -> Option<&'src Token> {
        self.lexemes.get(self.pos).map(|l| &l.token)
    }

    fn advance(&mut self) -> Option<&'src Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    /// Line of the current token, or of the last token at end of input.
    fn line(&self) -> usize {
        self.lexemes
            .get(self.pos)
            .or_else(|| self.lexemes.last())
            .map_or(1, |l| l.line)
    }

    fn skip_separators(&mut self) {
        while self.peek() == Some(&Token::Separator) {
            self.pos += 1;
        }
    }

    fn error(&self, message: String) -> CompileError {
        CompileError::Syntax {
            line: self.line(),
            message,
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        match self.peek() {
            Some(found) => self.error(format!("expected {expected}, found {found}")),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), CompileError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }
}

/// Parse a block of assignment statements.
///
/// Statements are separated by newlines or `;`. Blank lines, leading
/// indentation, and `#` comments are ignored.
pub fn parse_statements(source: &str) -> Result<Vec<Assignment>, CompileError> {
    let lexemes = tokenize(source)?;
    let mut stream = TokenStream::new(&lexemes);
    let mut statements = Vec::new();
    loop {
        stream.skip_separators();
        if stream.at_end() {
            break;
        }
        statements.push(parse_assignment(&mut stream)?);
        match stream.peek() {
            None | Some(Token::Separator) => {}
            Some(_) => return Err(stream.unexpected("end of statement")),
        }
    }
    Ok(statements)
}

/// Parse a single expression, such as a subexpression definition.
pub fn parse_expression(source: &str) -> Result<Expr, CompileError> {
    let lexemes = tokenize(source)?;
    let mut stream = TokenStream::new(&lexemes);
    stream.skip_separators();
    let expr = parse_expr(&mut stream, 0)?;
    stream.skip_separators();
    if !stream.at_end() {
        return Err(stream.unexpected("end of expression"));
    }
    Ok(expr)
}

fn parse_assignment(stream: &mut TokenStream<'_>) -> Result<Assignment, CompileError> {
    let line = stream.line();
    let target = match stream.advance() {
        Some(Token::Ident(name)) => name.clone(),
        _ => {
            stream.pos = stream.pos.saturating_sub(1);
            return Err(stream.unexpected("assignment target"));
        }
    };
    let op = match stream.peek() {
        Some(Token::Assign) => AssignOp::Assign,
        Some(Token::PlusAssign) => AssignOp::AddAssign,
        Some(Token::MinusAssign) => AssignOp::SubAssign,
        Some(Token::StarAssign) => AssignOp::MulAssign,
        Some(Token::SlashAssign) => AssignOp::DivAssign,
        _ => return Err(stream.unexpected("assignment operator")),
    };
    stream.advance();
    let value = parse_expr(stream, 0)?;
    Ok(Assignment {
        target,
        op,
        value,
        line,
    })
}

/// `(left, right)` binding power of an infix token.
fn infix_binding_power(token: &Token) -> Option<(BinaryOp, u8, u8)> {
    let op = match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Mod,
        Token::Pow => BinaryOp::Pow,
        _ => return None,
    };
    let p = op.precedence() * 2;
    if op == BinaryOp::Pow {
        Some((op, p + 1, p))
    } else {
        Some((op, p, p + 1))
    }
}

const NEG_BINDING_POWER: u8 = 14;
const NOT_BINDING_POWER: u8 = 6;

fn parse_expr(stream: &mut TokenStream<'_>, min_bp: u8) -> Result<Expr, CompileError> {
    let mut lhs = parse_prefix(stream)?;
    loop {
        let Some((op, l_bp, r_bp)) = stream.peek().and_then(infix_binding_power) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }
        stream.advance();
        let rhs = parse_expr(stream, r_bp)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_unary(
    stream: &mut TokenStream<'_>,
    op: UnaryOp,
    binding_power: u8,
) -> Result<Expr, CompileError> {
    let operand = parse_expr(stream, binding_power)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_prefix(stream: &mut TokenStream<'_>) -> Result<Expr, CompileError> {
    if stream.at_end() {
        return Err(stream.unexpected("expression"));
    }
    match stream.advance() {
        Some(Token::Number(v)) => Ok(Expr::Number(*v)),
        Some(Token::True) => Ok(Expr::Bool(true)),
        Some(Token::False) => Ok(Expr::Bool(false)),
        Some(Token::Minus) => parse_unary(stream, UnaryOp::Neg, NEG_BINDING_POWER),
        Some(Token::Plus) => parse_unary(stream, UnaryOp::Pos, NEG_BINDING_POWER),
        Some(Token::Not) => parse_unary(stream, UnaryOp::Not, NOT_BINDING_POWER),
        Some(Token::LParen) => {
            let inner = parse_expr(stream, 0)?;
            stream.expect(Token::RParen, "')'")?;
            Ok(inner)
        }
        Some(Token::Ident(name)) => {
            if stream.peek() == Some(&Token::LParen) {
                stream.advance();
                let args = parse_arguments(stream)?;
                Ok(Expr::Call {
                    func: name.clone(),
                    args,
                })
            } else {
                Ok(Expr::Name(name.clone()))
            }
        }
        _ => {
            stream.pos -= 1;
            Err(stream.unexpected("expression"))
        }
    }
}

fn parse_arguments(stream: &mut TokenStream<'_>) -> Result<Vec<Expr>, CompileError> {
    let mut args = Vec::new();
    if stream.peek() == Some(&Token::RParen) {
        stream.advance();
        return Ok(args);
    }
    loop {
        args.push(parse_expr(stream, 0)?);
        match stream.peek() {
            Some(Token::Comma) => {
                stream.advance();
            }
            Some(Token::RParen) => {
                stream.advance();
                break;
            }
            _ => return Err(stream.unexpected("',' or ')'")),
        }
    }
    Ok(args)
}
