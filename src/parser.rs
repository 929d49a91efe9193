//! Parser for the Enki language
//!
//! A recursive descent parser over the lexer's token stream. Binary
//! expressions use a shunting-yard loop with the precedence table from
//! `BinaryOp::precedence` (tightest first, left-associative). The parser
//! also builds the lexical scope tree: each block allocates a scope in the
//! program's arena; symbol insertion is entirely the type checker's job.
//!
//! Imports are resolved synchronously through the shared `ModuleCache`; a
//! module that cannot be loaded is a soft failure and the `import`
//! statement is still emitted.

use crate::ast::*;
use crate::modules::ModuleCache;
use crate::span::{SourceFile, Span};
use crate::token::{Token, TokenKind};
use crate::typeck::scope::{ScopeArena, ScopeId};
use crate::typeck::ty::Ty;
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("missing '{delimiter}' in {context}")]
    MissingDelimiter {
        delimiter: &'static str,
        context: &'static str,
        span: Span,
    },

    #[error("dangling expression: only function calls can be used as statements")]
    DanglingExpression { span: Span },

    #[error("expression is not a valid assignment target")]
    NonAssignableTarget { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::MissingDelimiter { span, .. }
            | ParseError::DanglingExpression { span }
            | ParseError::NonAssignableTarget { span } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// The parser for one source file
pub struct Parser<'src, 'm> {
    tokens: &'src [Token],
    pos: usize,
    file: &'src SourceFile,
    scopes: ScopeArena,
    current_scope: ScopeId,
    modules: &'m mut ModuleCache,
}

/// Parse a token stream into a `Program`. The module cache is shared with
/// any imports encountered along the way.
pub fn parse(
    tokens: &[Token],
    file: &SourceFile,
    modules: &mut ModuleCache,
) -> ParseResult<Program> {
    tracing::debug!(file = file.name(), tokens = tokens.len(), "parser: starting");
    Parser::new(tokens, file, modules).parse_program()
}

impl<'src, 'm> Parser<'src, 'm> {
    pub fn new(tokens: &'src [Token], file: &'src SourceFile, modules: &'m mut ModuleCache) -> Self {
        debug_assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token streams are Eof-terminated"
        );
        let scopes = ScopeArena::new();
        let current_scope = scopes.root();
        Self {
            tokens,
            pos: 0,
            file,
            scopes,
            current_scope,
            modules,
        }
    }

    // ============ Token helpers ============

    fn current(&self) -> &Token {
        // The stream always ends with Eof, so clamping is safe
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn peek(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn consume_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn text(&self, token: &Token) -> &'src str {
        token.text(self.file.text())
    }

    /// The lexeme of the current token, for error messages
    fn found(&self) -> String {
        if self.at_eof() {
            "end of file".to_string()
        } else {
            self.text(self.current()).to_string()
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.found(),
                span: self.current().span,
            })
        }
    }

    /// Consume a required delimiter, reporting which construct it belongs to
    fn expect_delim(
        &mut self,
        kind: TokenKind,
        delimiter: &'static str,
        context: &'static str,
    ) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::MissingDelimiter {
                delimiter,
                context,
                span: self.current().span,
            })
        }
    }

    // ============ Program ============

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let span = Span::new(0, self.file.text().len());
        let global_scope = self.scopes.root();
        let mut statements = Vec::new();

        while !self.at_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            body: Block {
                statements,
                scope: global_scope,
                span,
            },
            scopes: self.scopes,
            global_scope,
            file_name: self.file.name().to_string(),
            span,
        })
    }

    // ============ Statements ============

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current().kind {
            TokenKind::Extern => self.parse_extern(),
            TokenKind::Enum => self.parse_enum_def(),
            TokenKind::Struct => self.parse_struct_def(),
            TokenKind::Define => self.parse_function_def(),
            TokenKind::Import => self.parse_import(),
            TokenKind::Let => self.parse_var_decl(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::LCurly => {
                let start = self.current().span;
                let block = self.parse_braced_block("block statement")?;
                let span = start.merge(self.previous().span);
                Ok(Stmt::new(StmtKind::Block(block), span))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression()?;

        // An expression followed by '=' is an assignment, provided the
        // target is assignable
        if self.check(TokenKind::Equals) {
            if !expr.is_assignable() {
                return Err(ParseError::NonAssignableTarget { span: expr.span });
            }
            self.advance();
            let value = self.parse_expression()?;
            let span = expr.span.merge(value.span);
            self.consume_if(TokenKind::Semicolon);
            return Ok(Stmt::new(
                StmtKind::Assignment {
                    target: expr,
                    value,
                },
                span,
            ));
        }

        // Only calls may stand alone as statements
        if matches!(expr.kind, ExprKind::Call { .. }) {
            let span = expr.span;
            self.consume_if(TokenKind::Semicolon);
            Ok(Stmt::new(StmtKind::Expression { expr }, span))
        } else {
            Err(ParseError::DanglingExpression { span: expr.span })
        }
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // let
        let name = self.parse_identifier()?;

        let ty = if self.consume_if(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect_delim(TokenKind::Equals, "=", "let statement")?;
        let init = self.parse_expression()?;
        let span = start.merge(init.span);
        self.consume_if(TokenKind::Semicolon);

        Ok(Stmt::new(StmtKind::VarDecl(VarDecl { name, ty, init }), span))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // return
        let value = if self.check(TokenKind::RCurly)
            || self.check(TokenKind::Semicolon)
            || self.at_eof()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = match &value {
            Some(expr) => start.merge(expr.span),
            None => start,
        };
        self.consume_if(TokenKind::Semicolon);
        Ok(Stmt::new(
            StmtKind::Return(ReturnStmt {
                value,
                enclosing_fn: None,
            }),
            span,
        ))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // if
        let condition = self.parse_expression()?;

        let then_start = self.current().span;
        let then_block = self.parse_braced_block("if statement")?;
        let then_span = then_start.merge(self.previous().span);
        let then_branch = Box::new(Stmt::new(StmtKind::Block(then_block), then_span));

        let else_branch = if self.consume_if(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // else-if chains nest as a statement
                Some(Box::new(self.parse_if()?))
            } else {
                let else_start = self.current().span;
                let block = self.parse_braced_block("else branch")?;
                let else_span = else_start.merge(self.previous().span);
                Some(Box::new(Stmt::new(StmtKind::Block(block), else_span)))
            }
        } else {
            None
        };

        let span = start.merge(self.previous().span);
        Ok(Stmt::new(
            StmtKind::If(IfStmt {
                condition,
                then_branch,
                else_branch,
            }),
            span,
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // while
        let condition = self.parse_expression()?;

        if !self.check(TokenKind::LCurly) {
            return Err(ParseError::MissingDelimiter {
                delimiter: "{",
                context: "while loop body",
                span: self.current().span,
            });
        }
        let body_start = self.current().span;
        let block = self.parse_braced_block("while loop body")?;
        let body_span = body_start.merge(self.previous().span);
        let span = start.merge(self.previous().span);

        Ok(Stmt::new(
            StmtKind::While(WhileStmt {
                condition,
                body: Box::new(Stmt::new(StmtKind::Block(block), body_span)),
            }),
            span,
        ))
    }

    fn parse_import(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // import
        self.expect_delim(TokenKind::LessThan, "<", "import statement")?;

        let path_token = self.expect(TokenKind::String, "module path string literal")?;
        let path_span = path_token.span;
        let path = Literal {
            kind: LitKind::String,
            value: self.text(&path_token).to_string(),
        };

        // The loader runs during parsing; failure to open the module is
        // soft and the statement is kept either way.
        self.modules.load(&path.value, Some(self.file.name()));

        self.expect_delim(TokenKind::GreaterThan, ">", "import statement")?;
        let span = start.merge(self.previous().span);

        Ok(Stmt::new(StmtKind::Import(ImportStmt { path, path_span }), span))
    }

    fn parse_extern(&mut self) -> ParseResult<Stmt> {
        // extern malloc(int) -> &void from "libc"
        let start = self.advance().span; // extern
        let name = self.parse_identifier()?;

        self.expect_delim(TokenKind::LParen, "(", "extern declaration")?;
        let mut arg_types = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_eof() {
            arg_types.push(self.parse_type()?);
            self.consume_if(TokenKind::Comma);
        }
        self.expect_delim(TokenKind::RParen, ")", "extern declaration")?;

        self.expect_delim(TokenKind::Arrow, "->", "extern declaration")?;
        let return_type = self.parse_type()?;

        self.expect(TokenKind::From, "from")?;
        let path_token = self.expect(TokenKind::String, "module path string literal")?;
        let module_path = self.text(&path_token).to_string();

        let span = start.merge(self.previous().span);
        self.consume_if(TokenKind::Semicolon);

        Ok(Stmt::new(
            StmtKind::Extern(ExternDef {
                name,
                arg_types,
                return_type,
                module_path,
            }),
            span,
        ))
    }

    fn parse_function_def(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // define
        let name = self.parse_identifier()?;

        self.expect_delim(TokenKind::LParen, "(", "function definition")?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_eof() {
            params.push(self.parse_parameter()?);
            self.consume_if(TokenKind::Comma);
        }
        self.expect_delim(TokenKind::RParen, ")", "function definition")?;

        self.expect_delim(TokenKind::Arrow, "->", "function definition")?;
        let return_type = self.parse_type()?;

        let body = self.parse_braced_block("function definition")?;
        let span = start.merge(self.previous().span);
        self.consume_if(TokenKind::Semicolon);

        Ok(Stmt::new(
            StmtKind::Function(FunctionDef {
                name,
                params,
                return_type,
                body: Some(body),
                meta: None,
                span,
            }),
            span,
        ))
    }

    fn parse_parameter(&mut self) -> ParseResult<Param> {
        let name = self.parse_identifier()?;
        self.expect_delim(TokenKind::Colon, ":", "parameter")?;
        let ty = self.parse_type()?;
        let span = name.span.merge(ty.span);
        Ok(Param { name, ty, span })
    }

    fn parse_enum_def(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // enum
        let name = self.parse_identifier()?;
        self.expect_delim(TokenKind::LCurly, "{", "enum definition")?;

        let mut members = Vec::new();
        while !self.check(TokenKind::RCurly) && !self.at_eof() {
            members.push(self.parse_identifier()?);
            self.consume_if(TokenKind::Comma);
        }
        self.expect_delim(TokenKind::RCurly, "}", "enum definition")?;

        let span = start.merge(self.previous().span);
        Ok(Stmt::new(
            StmtKind::Enum(EnumDef {
                name,
                members,
                meta: None,
                to_string_fn: None,
                span,
            }),
            span,
        ))
    }

    fn parse_struct_def(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // struct
        let name = self.parse_identifier()?;
        self.expect_delim(TokenKind::LCurly, "{", "struct definition")?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RCurly) && !self.at_eof() {
            let field_name = self.parse_identifier()?;
            self.expect_delim(TokenKind::Colon, ":", "struct field")?;
            let ty = self.parse_type()?;
            let span = field_name.span.merge(ty.span);
            fields.push(Param {
                name: field_name,
                ty,
                span,
            });
            self.consume_if(TokenKind::Comma);
        }
        self.expect_delim(TokenKind::RCurly, "}", "struct definition")?;

        let span = start.merge(self.previous().span);
        Ok(Stmt::new(
            StmtKind::Struct(StructDef {
                name,
                fields,
                meta: None,
                span,
            }),
            span,
        ))
    }

    /// Parse `{ statements }` into a block with a freshly allocated scope
    fn parse_braced_block(&mut self, context: &'static str) -> ParseResult<Block> {
        self.expect_delim(TokenKind::LCurly, "{", context)?;

        let scope = self.scopes.alloc(self.current_scope);
        let prev_scope = self.current_scope;
        self.current_scope = scope;

        let start = self.previous().span;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RCurly) && !self.at_eof() {
            statements.push(self.parse_statement()?);
        }

        self.current_scope = prev_scope;
        self.expect_delim(TokenKind::RCurly, "}", context)?;
        let span = start.merge(self.previous().span);

        Ok(Block {
            statements,
            scope,
            span,
        })
    }

    // ============ Types ============

    fn parse_type(&mut self) -> ParseResult<Ty> {
        let token = self.current().clone();
        let ty = match token.kind {
            TokenKind::IntType => Ty::int(token.span),
            TokenKind::FloatType => Ty::float(token.span),
            TokenKind::StringType => Ty::string(token.span),
            TokenKind::BoolType => Ty::bool(token.span),
            TokenKind::VoidType => Ty::void(token.span),
            TokenKind::CharType => Ty::char(token.span),
            TokenKind::TypeType => Ty::meta(token.span),
            // Could be an enum or a struct; resolved by the type checker
            TokenKind::Identifier => Ty::unknown(self.text(&token), token.span),
            TokenKind::Ampersand => {
                self.advance();
                let pointee = self.parse_type()?;
                let span = token.span.merge(pointee.span);
                return Ok(Ty::pointer(pointee, span));
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "type".to_string(),
                    found: self.found(),
                    span: token.span,
                })
            }
        };
        self.advance();
        Ok(ty)
    }

    // ============ Expressions ============

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_prefix()?;

        // Shunting yard over the binary operator cascade. The two stacks
        // keep the invariant output.len() == ops.len() + 1.
        let mut output: Vec<Expr> = vec![first];
        let mut ops: Vec<BinaryOp> = Vec::new();

        while let Some(op) = BinaryOp::from_token(self.current().kind) {
            self.advance();
            while ops
                .last()
                .is_some_and(|top| top.precedence() <= op.precedence())
            {
                let top = ops.pop().expect("checked non-empty");
                Self::reduce(&mut output, top);
            }
            let right = self.parse_prefix()?;
            output.push(right);
            ops.push(op);
        }

        while let Some(op) = ops.pop() {
            Self::reduce(&mut output, op);
        }

        Ok(output.pop().expect("shunting yard leaves one expression"))
    }

    fn reduce(output: &mut Vec<Expr>, op: BinaryOp) {
        let right = output.pop().expect("binary op right operand");
        let left = output.pop().expect("binary op left operand");
        let span = left.span.merge(right.span);
        output.push(Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        ));
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.current().kind {
            TokenKind::Ampersand => {
                let start = self.advance().span;
                let inner = self.parse_prefix()?;
                let span = start.merge(inner.span);
                Ok(Expr::new(
                    ExprKind::AddressOf {
                        inner: Box::new(inner),
                    },
                    span,
                ))
            }
            TokenKind::Asterisk => {
                let start = self.advance().span;
                let inner = self.parse_prefix()?;
                let span = start.merge(inner.span);
                Ok(Expr::new(
                    ExprKind::Dereference {
                        inner: Box::new(inner),
                    },
                    span,
                ))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::Char => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::Int => LitKind::Int,
                    TokenKind::Float => LitKind::Float,
                    TokenKind::String => LitKind::String,
                    _ => LitKind::Char,
                };
                Ok(Expr::new(
                    ExprKind::Literal(Literal {
                        kind,
                        value: self.text(&token).to_string(),
                    }),
                    token.span,
                ))
            }

            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal {
                        kind: LitKind::Bool,
                        value: self.text(&token).to_string(),
                    }),
                    token.span,
                ))
            }

            // Struct instantiation: struct Name { arg, arg }
            TokenKind::Struct => {
                self.advance();
                let type_name = self.parse_identifier()?;
                self.expect_delim(TokenKind::LCurly, "{", "struct instantiation")?;

                let mut args = Vec::new();
                while !self.check(TokenKind::RCurly) && !self.at_eof() {
                    args.push(self.parse_expression()?);
                    self.consume_if(TokenKind::Comma);
                }
                self.expect_delim(TokenKind::RCurly, "}", "struct instantiation")?;

                let span = type_name.span.merge(self.previous().span);
                Ok(Expr::new(
                    ExprKind::StructInstantiation {
                        type_name,
                        args,
                        resolved_struct: None,
                    },
                    span,
                ))
            }

            TokenKind::Identifier => {
                if self.peek(1).kind == TokenKind::LParen {
                    return self.parse_call();
                }

                self.advance();
                let ident = Expr::new(
                    ExprKind::Identifier {
                        name: self.text(&token).to_string(),
                    },
                    token.span,
                );

                if self.consume_if(TokenKind::Dot) {
                    // The right side is a full expression; the type checker
                    // only accepts an identifier there
                    let right = self.parse_expression()?;
                    let span = token.span.merge(right.span);
                    return Ok(Expr::new(
                        ExprKind::Dot {
                            left: Box::new(ident),
                            right: Box::new(right),
                        },
                        span,
                    ));
                }

                Ok(ident)
            }

            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: self.found(),
                span: token.span,
            }),
        }
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let name_token = self.advance();
        let callee = Expr::new(
            ExprKind::Identifier {
                name: self.text(&name_token).to_string(),
            },
            name_token.span,
        );
        self.advance(); // consume '('

        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            if self.at_eof() {
                return Err(ParseError::MissingDelimiter {
                    delimiter: ")",
                    context: "function call",
                    span: name_token.span,
                });
            }
            args.push(self.parse_expression()?);
            self.consume_if(TokenKind::Comma);
        }
        self.advance(); // consume ')'

        let span = name_token.span.merge(self.previous().span);
        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    fn parse_identifier(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Identifier, "identifier")?;
        Ok(Ident::new(self.text(&token), token.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> ParseResult<Program> {
        let file = SourceFile::new("test.enki", source);
        let tokens = lex(&file).expect("lex failed");
        let mut modules = ModuleCache::new();
        parse(&tokens, &file, &mut modules)
    }

    fn parse_ok(source: &str) -> Program {
        parse_source(source).expect("parse failed")
    }

    #[test]
    fn test_empty_input_is_empty_program() {
        let program = parse_ok("");
        assert!(program.body.statements.is_empty());
    }

    #[test]
    fn test_var_decl() {
        let program = parse_ok("let x = 42");
        assert_eq!(program.body.statements.len(), 1);
        match &program.body.statements[0].kind {
            StmtKind::VarDecl(decl) => {
                assert_eq!(decl.name.name, "x");
                assert!(decl.ty.is_none());
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn test_var_decl_with_ascription() {
        let program = parse_ok("let x: int = 42");
        match &program.body.statements[0].kind {
            StmtKind::VarDecl(decl) => {
                assert!(decl.ty.as_ref().is_some_and(|t| t.is_int()));
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_mul_binds_tighter() {
        let program = parse_ok("let x = 1 + 2 * 3");
        let StmtKind::VarDecl(decl) = &program.body.statements[0].kind else {
            panic!("expected var decl");
        };
        let ExprKind::Binary { op, right, .. } = &decl.init.kind else {
            panic!("expected binary expr");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_left_associativity() {
        let program = parse_ok("let x = 1 - 2 + 3");
        let StmtKind::VarDecl(decl) = &program.body.statements[0].kind else {
            panic!("expected var decl");
        };
        // (1 - 2) + 3
        let ExprKind::Binary { op, left, .. } = &decl.init.kind else {
            panic!("expected binary expr");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            left.kind,
            ExprKind::Binary {
                op: BinaryOp::Subtract,
                ..
            }
        ));
    }

    #[test]
    fn test_comparison_precedence() {
        let program = parse_ok("let x = 1 + 2 < 3 * 4");
        let StmtKind::VarDecl(decl) = &program.body.statements[0].kind else {
            panic!("expected var decl");
        };
        assert!(matches!(
            decl.init.kind,
            ExprKind::Binary {
                op: BinaryOp::LessThan,
                ..
            }
        ));
    }

    #[test]
    fn test_function_definition() {
        let program = parse_ok("define add(a: int, b: int) -> int { return a + b }");
        match &program.body.statements[0].kind {
            StmtKind::Function(def) => {
                assert_eq!(def.name.name, "add");
                assert_eq!(def.params.len(), 2);
                assert!(def.return_type.is_int());
                let body = def.body.as_ref().expect("body");
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_body_scope_is_child_of_global() {
        let program = parse_ok("define f() -> void { let x = 1 }");
        let StmtKind::Function(def) = &program.body.statements[0].kind else {
            panic!("expected function");
        };
        let body_scope = def.body.as_ref().expect("body").scope;
        assert_eq!(
            program.scopes.get(body_scope).parent,
            Some(program.global_scope)
        );
    }

    #[test]
    fn test_nested_block_scopes() {
        let program = parse_ok("{ { let x = 1 } }");
        let StmtKind::Block(outer) = &program.body.statements[0].kind else {
            panic!("expected block");
        };
        let StmtKind::Block(inner) = &outer.statements[0].kind else {
            panic!("expected inner block");
        };
        assert_eq!(program.scopes.get(inner.scope).parent, Some(outer.scope));
        assert_eq!(
            program.scopes.get(outer.scope).parent,
            Some(program.global_scope)
        );
    }

    #[test]
    fn test_enum_definition() {
        let program = parse_ok("enum Color { Red, Green, Blue }");
        match &program.body.statements[0].kind {
            StmtKind::Enum(def) => {
                assert_eq!(def.name.name, "Color");
                let names: Vec<_> = def.members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["Red", "Green", "Blue"]);
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_definition_and_instantiation() {
        let program = parse_ok("struct Point { x: int, y: int }\nlet p = struct Point { 1, 2 }");
        match &program.body.statements[0].kind {
            StmtKind::Struct(def) => {
                assert_eq!(def.name.name, "Point");
                assert_eq!(def.fields.len(), 2);
            }
            other => panic!("expected struct, got {:?}", other),
        }
        let StmtKind::VarDecl(decl) = &program.body.statements[1].kind else {
            panic!("expected var decl");
        };
        match &decl.init.kind {
            ExprKind::StructInstantiation {
                type_name, args, ..
            } => {
                assert_eq!(type_name.name, "Point");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected struct instantiation, got {:?}", other),
        }
    }

    #[test]
    fn test_extern_declaration() {
        let program = parse_ok(r#"extern malloc(int) -> &void from "libc""#);
        match &program.body.statements[0].kind {
            StmtKind::Extern(def) => {
                assert_eq!(def.name.name, "malloc");
                assert_eq!(def.arg_types.len(), 1);
                assert!(def.return_type.is_pointer());
                assert_eq!(def.module_path, "libc");
            }
            other => panic!("expected extern, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_type_nesting() {
        let program = parse_ok(r#"extern f(&&int) -> void from "m""#);
        let StmtKind::Extern(def) = &program.body.statements[0].kind else {
            panic!("expected extern");
        };
        let outer = &def.arg_types[0];
        assert!(outer.is_pointer());
        let crate::typeck::ty::TyKind::Pointer { pointee } = &outer.kind else {
            panic!("expected pointer");
        };
        assert!(pointee.is_pointer());
    }

    #[test]
    fn test_import_kept_on_missing_module() {
        let program = parse_ok(r#"import <"definitely_not_a_real_module">"#);
        match &program.body.statements[0].kind {
            StmtKind::Import(import) => {
                assert_eq!(import.path.value, "definitely_not_a_real_module");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_address_of_and_dereference() {
        let program = parse_ok("let a = 1\nlet p = &a\nlet b = *p");
        let StmtKind::VarDecl(p) = &program.body.statements[1].kind else {
            panic!("expected var decl");
        };
        assert!(matches!(p.init.kind, ExprKind::AddressOf { .. }));
        let StmtKind::VarDecl(b) = &program.body.statements[2].kind else {
            panic!("expected var decl");
        };
        assert!(matches!(b.init.kind, ExprKind::Dereference { .. }));
    }

    #[test]
    fn test_dot_expression() {
        let program = parse_ok("let c = Color.Red");
        let StmtKind::VarDecl(decl) = &program.body.statements[0].kind else {
            panic!("expected var decl");
        };
        let ExprKind::Dot { left, right } = &decl.init.kind else {
            panic!("expected dot expression");
        };
        assert!(matches!(left.kind, ExprKind::Identifier { .. }));
        assert!(matches!(right.kind, ExprKind::Identifier { .. }));
    }

    #[test]
    fn test_call_statement() {
        let program = parse_ok("print(1, 2)");
        match &program.body.statements[0].kind {
            StmtKind::Expression { expr } => match &expr.kind {
                ExprKind::Call { args, .. } => assert_eq!(args.len(), 2),
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_expression_rejected() {
        let err = parse_source("1 + 2").unwrap_err();
        assert!(matches!(err, ParseError::DanglingExpression { .. }));
    }

    #[test]
    fn test_non_assignable_target_rejected() {
        let err = parse_source("let a = 1\nlet p = &a\n*p = 2").unwrap_err();
        assert!(matches!(err, ParseError::NonAssignableTarget { .. }));
    }

    #[test]
    fn test_missing_brace_reported() {
        let err = parse_source("define f() -> int { return 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingDelimiter {
                delimiter: "}",
                ..
            }
        ));
    }

    #[test]
    fn test_if_else_chain() {
        let program = parse_ok(
            "define f(a: bool, b: bool) -> int { if a { return 1 } else if b { return 2 } else { return 3 } }",
        );
        let StmtKind::Function(def) = &program.body.statements[0].kind else {
            panic!("expected function");
        };
        let body = def.body.as_ref().expect("body");
        let StmtKind::If(if_stmt) = &body.statements[0].kind else {
            panic!("expected if");
        };
        let else_branch = if_stmt.else_branch.as_ref().expect("else branch");
        assert!(matches!(else_branch.kind, StmtKind::If(_)));
    }

    #[test]
    fn test_while_requires_brace() {
        let err = parse_source("define f() -> void { while true return }").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingDelimiter { delimiter: "{", .. }
        ));
    }

    #[test]
    fn test_spans_are_ordered() {
        let program = parse_ok(
            "enum Color { Red }\ndefine f(c: Color) -> int { if true { return 1 } return 0 }",
        );
        fn walk(stmt: &Stmt) {
            assert!(stmt.span.start <= stmt.span.end);
            if let StmtKind::Function(def) = &stmt.kind {
                for inner in def.body.iter().flat_map(|b| &b.statements) {
                    walk(inner);
                }
            }
        }
        for stmt in &program.body.statements {
            walk(stmt);
        }
    }

    #[test]
    fn test_assignment() {
        let program = parse_ok("let x = 1\nx = 2");
        assert!(matches!(
            program.body.statements[1].kind,
            StmtKind::Assignment { .. }
        ));
    }
}
