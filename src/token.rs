//! Token definitions for the Enki language
//!
//! This module defines all the tokens that the lexer can produce.

use crate::span::Span;
use logos::Logos;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source. For string and char literals
    /// the span excludes the quotes, so this is the literal's content.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// All possible token types in Enki
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\x0b\x00]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
pub enum TokenKind {
    // ============ Keywords ============
    #[token("let")]
    Let,
    #[token("extern")]
    Extern,
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("define")]
    Define,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,

    // ============ Type keywords ============
    #[token("int")]
    IntType,
    #[token("float")]
    FloatType,
    #[token("string")]
    StringType,
    #[token("bool")]
    BoolType,
    #[token("void")]
    VoidType,
    #[token("char")]
    CharType,
    /// The meta-type, legal only in extern signatures
    #[token("type")]
    TypeType,

    // ============ Literals ============
    /// Integer literal: one or more digits
    #[regex(r"[0-9]+", priority = 2)]
    Int,

    /// Float literal: digits, a dot, digits
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,

    /// String literal: double-quoted, single line, backslash escapes
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    /// Character literal: single-quoted, backslash escapes
    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    /// Identifier: letter or underscore, then letters/digits/underscores
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // ============ Operators / punctuation ============
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LSquare,
    #[token("]")]
    RSquare,
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Equals,
    #[token("==")]
    EqualsEquals,
    #[token("!")]
    Exclamation,
    #[token("!=")]
    NotEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEquals,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("->")]
    Arrow,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Ampersand,

    // ============ Special ============
    /// End of file sentinel, terminates every token stream
    Eof,
}

impl TokenKind {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Extern
                | TokenKind::Import
                | TokenKind::From
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::True
                | TokenKind::False
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Define
                | TokenKind::Struct
                | TokenKind::Enum
        )
    }

    /// Check if this token names a type
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::IntType
                | TokenKind::FloatType
                | TokenKind::StringType
                | TokenKind::BoolType
                | TokenKind::VoidType
                | TokenKind::CharType
                | TokenKind::TypeType
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::True
                | TokenKind::False
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Let => "let",
            TokenKind::Extern => "extern",
            TokenKind::Import => "import",
            TokenKind::From => "from",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Define => "define",
            TokenKind::Struct => "struct",
            TokenKind::Enum => "enum",
            TokenKind::IntType => "int",
            TokenKind::FloatType => "float",
            TokenKind::StringType => "string",
            TokenKind::BoolType => "bool",
            TokenKind::VoidType => "void",
            TokenKind::CharType => "char",
            TokenKind::TypeType => "type",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::Char => "char literal",
            TokenKind::Identifier => "identifier",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LSquare => "[",
            TokenKind::RSquare => "]",
            TokenKind::LCurly => "{",
            TokenKind::RCurly => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Pipe => "|",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Equals => "=",
            TokenKind::EqualsEquals => "==",
            TokenKind::Exclamation => "!",
            TokenKind::NotEquals => "!=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanEquals => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanEquals => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Arrow => "->",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
