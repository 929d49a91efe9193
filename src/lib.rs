//! The Enki compiler
//!
//! A single-pass ahead-of-time compiler for the Enki language. The
//! artifact is a C++ translation unit handed to the host C++ compiler.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.enki)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST + scope tree (imports load recursively)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Injection  │  → AST with built-in print
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Type Check │  → Typed AST (+ synthesised enum to-string functions)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Code Gen   │  → C++ translation unit
//! └─────────────┘
//! ```

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod inject;
pub mod lexer;
pub mod modules;
pub mod parser;
pub mod serialize;
pub mod span;
pub mod token;
pub mod typeck;

// Re-exports for convenience
pub use lexer::Lexer;
pub use span::{SourceFile, Span};
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for Enki source files
pub const FILE_EXTENSION: &str = "enki";
