//! Lexer for the Enki language
//!
//! The lexer converts source code into a stream of tokens terminated by an
//! `Eof` sentinel. It uses the `logos` crate for the actual scanning; this
//! wrapper classifies scan failures and normalises literal spans.

use crate::span::{SourceFile, Span};
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors. All are fatal and carry the span of the offending byte.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("unknown character '{ch}'")]
    UnknownCharacter { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::UnknownCharacter { span, .. } => *span,
        }
    }
}

/// The lexer for Enki source files
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(file: &'src SourceFile) -> Self {
        Self {
            source: file.text(),
            inner: TokenKind::lexer(file.text()),
        }
    }

    /// Produce the next token, or an error for an unlexable byte.
    /// Returns the `Eof` sentinel at end of input.
    fn next_token(&mut self) -> Result<Token, LexError> {
        match self.inner.next() {
            Some(Ok(kind)) => {
                let raw = self.inner.span();
                // String and char literal spans exclude the quotes, so the
                // lexeme is the content alone.
                let span = match kind {
                    TokenKind::String | TokenKind::Char => {
                        Span::new(raw.start + 1, raw.end - 1)
                    }
                    _ => Span::new(raw.start, raw.end),
                };
                Ok(Token::new(kind, span))
            }
            Some(Err(())) => {
                let raw = self.inner.span();
                let span = Span::new(raw.start, raw.end.max(raw.start + 1));
                Err(self.classify_error(span))
            }
            None => {
                let pos = self.source.len();
                Ok(Token::new(TokenKind::Eof, Span::new(pos, pos)))
            }
        }
    }

    /// A scan failure starting with a quote is an unterminated literal;
    /// anything else is an unknown character.
    fn classify_error(&self, span: Span) -> LexError {
        match self.source.as_bytes().get(span.start) {
            Some(b'"') => LexError::UnterminatedString { span },
            Some(b'\'') => LexError::UnterminatedChar { span },
            _ => {
                let ch = self.source[span.start..].chars().next().unwrap_or('\0');
                LexError::UnknownCharacter { ch, span }
            }
        }
    }

    /// Collect all tokens. Lexing terminates at the first error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Lex a whole source file into a token stream terminated by `Eof`
pub fn lex(file: &SourceFile) -> Result<Vec<Token>, LexError> {
    tracing::debug!(file = file.name(), "lexer: starting");
    Lexer::new(file).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let file = SourceFile::new("test.enki", source);
        lex(&file)
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(token_kinds("  \t\r\n "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords() {
        let kinds = token_kinds("let extern import from define struct enum while return");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Extern,
                TokenKind::Import,
                TokenKind::From,
                TokenKind::Define,
                TokenKind::Struct,
                TokenKind::Enum,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_type_keywords() {
        let kinds = token_kinds("int float string bool void char type");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntType,
                TokenKind::FloatType,
                TokenKind::StringType,
                TokenKind::BoolType,
                TokenKind::VoidType,
                TokenKind::CharType,
                TokenKind::TypeType,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let kinds = token_kinds("42 3.14 0");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let kinds = token_kinds("== != <= >= ->");
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqualsEquals,
                TokenKind::NotEquals,
                TokenKind::LessThanEquals,
                TokenKind::GreaterThanEquals,
                TokenKind::Arrow,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_single_char_operators() {
        let kinds = token_kinds("= ! < > + - * / % & | . , : ; ( ) { } [ ]");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Equals,
                TokenKind::Exclamation,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Dot,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LCurly,
                TokenKind::RCurly,
                TokenKind::LSquare,
                TokenKind::RSquare,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let kinds = token_kinds("// a comment\nlet x = 1 // trailing");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_span_excludes_quotes() {
        let file = SourceFile::new("test.enki", r#"let s = "hello""#);
        let tokens = lex(&file).unwrap();
        let s = &tokens[3];
        assert_eq!(s.kind, TokenKind::String);
        assert_eq!(s.text(file.text()), "hello");
    }

    #[test]
    fn test_string_with_escapes() {
        let file = SourceFile::new("test.enki", r#""a\"b\n""#);
        let tokens = lex(&file).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text(file.text()), r#"a\"b\n"#);
    }

    #[test]
    fn test_char_literal() {
        let file = SourceFile::new("test.enki", r"let c = '\n'");
        let tokens = lex(&file).unwrap();
        let c = &tokens[3];
        assert_eq!(c.kind, TokenKind::Char);
        assert_eq!(c.text(file.text()), r"\n");
    }

    #[test]
    fn test_unterminated_string() {
        let file = SourceFile::new("test.enki", r#"let s = "oops"#);
        let err = lex(&file).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
        assert_eq!(err.span().start, 8);
    }

    #[test]
    fn test_unterminated_char() {
        let file = SourceFile::new("test.enki", "let c = 'x");
        let err = lex(&file).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedChar { .. }));
    }

    #[test]
    fn test_unknown_character() {
        let file = SourceFile::new("test.enki", "let a = 1 # 2");
        let err = lex(&file).unwrap_err();
        assert!(matches!(err, LexError::UnknownCharacter { ch: '#', .. }));
    }

    #[test]
    fn test_lexeme_matches_span_text() {
        let file = SourceFile::new(
            "test.enki",
            "define add(a: int, b: int) -> int { return a + b }",
        );
        let tokens = lex(&file).unwrap();
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                continue;
            }
            assert_eq!(
                token.text(file.text()),
                &file.text()[token.span.start..token.span.end]
            );
        }
    }

    #[test]
    fn test_identifier_shapes() {
        let kinds = token_kinds("foo _bar baz_2 Color");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }
}
