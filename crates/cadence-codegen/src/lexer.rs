//! Tokenizer for statement blocks.
//!
//! Uses logos. Newlines and `;` are statement separators and therefore
//! real tokens; other whitespace and `#` comments are skipped.

use logos::Logos;
use std::fmt;
use std::ops::Range;

use crate::error::CompileError;

/// Statement-language token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    /// End of a statement: newline or `;`.
    #[token("\n")]
    #[token(";")]
    Separator,

    /// Keyword `and`
    #[token("and")]
    And,
    /// Keyword `or`
    #[token("or")]
    Or,
    /// Keyword `not`
    #[token("not")]
    Not,
    /// Literal `True`
    #[token("True")]
    True,
    /// Literal `False`
    #[token("False")]
    False,

    /// Identifier.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Numeric literal.
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// `=`
    #[token("=")]
    Assign,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,

    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `**`
    #[token("**")]
    Pow,

    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    Le,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    Ge,

    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `,`
    #[token(",")]
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Separator => "end of statement",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::True => "True",
            Self::False => "False",
            Self::Ident(name) => return write!(f, "identifier '{name}'"),
            Self::Number(v) => return write!(f, "number {v}"),
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Pow => "**",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
        };
        write!(f, "'{s}'")
    }
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    /// The token.
    pub token: Token,
    /// 1-based line number of the token's first byte.
    pub line: usize,
}

/// Tokenize `source`, attaching line numbers.
///
/// Fails with [`CompileError::Syntax`] on the first unrecognised input.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, CompileError> {
    let mut lexemes = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let line = line_of(source, &span);
        match result {
            Ok(token) => lexemes.push(Lexeme { token, line }),
            Err(()) => {
                return Err(CompileError::Syntax {
                    line,
                    message: format!("unexpected input '{}'", &source[span]),
                })
            }
        }
    }
    Ok(lexemes)
}

fn line_of(source: &str, span: &Range<usize>) -> usize {
    source[..span.start].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn simple_assignment() {
        assert_eq!(
            tokens("a = b+c"),
            vec![
                Token::Ident("a".into()),
                Token::Assign,
                Token::Ident("b".into()),
                Token::Plus,
                Token::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn keywords_win_over_identifiers_only_on_exact_match() {
        assert_eq!(
            tokens("and andy"),
            vec![Token::And, Token::Ident("andy".into())]
        );
    }

    #[test]
    fn power_and_augmented_operators() {
        assert_eq!(
            tokens("x **= 2"),
            vec![
                Token::Ident("x".into()),
                Token::Pow,
                Token::Assign,
                Token::Number(2.0),
            ]
        );
        assert_eq!(
            tokens("v += 1.5e-3"),
            vec![Token::Ident("v".into()), Token::PlusAssign, Token::Number(1.5e-3)]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_tracked() {
        let lex = tokenize("a = 1 # first\n\nb = .5").unwrap();
        let b = lex
            .iter()
            .find(|l| l.token == Token::Ident("b".into()))
            .unwrap();
        assert_eq!(b.line, 3);
        assert!(lex.iter().any(|l| l.token == Token::Number(0.5)));
    }

    #[test]
    fn unknown_character_is_a_syntax_error() {
        match tokenize("a = b $ c") {
            Err(CompileError::Syntax { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains('$'));
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }
}
