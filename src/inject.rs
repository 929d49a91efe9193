//! AST injections
//!
//! Two rewrites that run between parsing and type checking:
//!
//! 1. The built-in `print` function is prepended to the global block as a
//!    bodiless definition with a single `any` parameter. The back-end
//!    recognises it by name and lowers calls to the host's standard output.
//! 2. Enum-to-string templating: for every enum the type checker visits, a
//!    `<Enum>_to_string` function is synthesised as an if-chain over the
//!    members and registered in the enclosing scope. This runs lazily from
//!    the checker rather than as a pre-pass so the function lands in the
//!    right scope after its enum type is known.

use crate::ast::*;
use crate::span::Span;
use crate::typeck::scope::{ScopeArena, ScopeId};
use crate::typeck::ty::{EnumType, Ty, TyKind};

/// Name of the built-in print function
pub const PRINT_FN: &str = "print";

/// Prepend the built-in `print` definition to the program's global block.
/// Idempotent: a program that already starts with the definition is left
/// untouched.
pub fn inject_builtin_print(program: &mut Program) {
    if let Some(Stmt {
        kind: StmtKind::Function(def),
        ..
    }) = program.body.statements.first()
    {
        if def.name.name == PRINT_FN {
            return;
        }
    }

    let span = Span::default();
    let def = FunctionDef {
        name: Ident::new(PRINT_FN, span),
        params: vec![Param {
            name: Ident::new("value", span),
            ty: Ty::any(span),
            span,
        }],
        return_type: Ty::void(span),
        body: None,
        meta: None,
        span,
    };
    program
        .body
        .statements
        .insert(0, Stmt::new(StmtKind::Function(def), span));
    tracing::debug!("injected built-in print function");
}

/// Run the whole injection pass over a freshly parsed program
pub fn perform_injections(program: &mut Program) {
    inject_builtin_print(program);
}

/// The name of the synthesised to-string function for an enum
pub fn to_string_fn_name(enum_name: &str) -> String {
    format!("{}_to_string", enum_name)
}

/// Build `<Enum>_to_string(value: <Enum>) -> string` for the given enum.
/// The body is an if-chain comparing `value` against each member in
/// declaration order and returning the member's name as a string literal.
/// The body's scope is allocated under `parent` so name lookups from the
/// synthesised code see the enum and its members.
pub fn build_enum_to_string(
    enum_ty: &EnumType,
    span: Span,
    scopes: &mut ScopeArena,
    parent: ScopeId,
) -> FunctionDef {
    let name = to_string_fn_name(&enum_ty.name);
    let body_scope = scopes.alloc(parent);

    let mut statements = Vec::new();
    for member in &enum_ty.members {
        // value == <Enum>.<Member>
        let condition = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Equals,
                left: Box::new(Expr::new(
                    ExprKind::Identifier {
                        name: "value".to_string(),
                    },
                    span,
                )),
                right: Box::new(Expr::new(
                    ExprKind::Dot {
                        left: Box::new(Expr::new(
                            ExprKind::Identifier {
                                name: enum_ty.name.clone(),
                            },
                            span,
                        )),
                        right: Box::new(Expr::new(
                            ExprKind::Identifier {
                                name: member.name.clone(),
                            },
                            span,
                        )),
                    },
                    span,
                )),
            },
            span,
        );

        // { return "<Member>" }
        let ret = Stmt::new(
            StmtKind::Return(ReturnStmt {
                value: Some(Expr::new(
                    ExprKind::Literal(Literal {
                        kind: LitKind::String,
                        value: member.name.clone(),
                    }),
                    span,
                )),
                enclosing_fn: None,
            }),
            span,
        );
        let then_scope = scopes.alloc(body_scope);
        let then_branch = Box::new(Stmt::new(
            StmtKind::Block(Block {
                statements: vec![ret],
                scope: then_scope,
                span,
            }),
            span,
        ));

        statements.push(Stmt::new(
            StmtKind::If(IfStmt {
                condition,
                then_branch,
                else_branch: None,
            }),
            span,
        ));
    }

    FunctionDef {
        name: Ident::new(name, span),
        params: vec![Param {
            name: Ident::new("value", span),
            ty: Ty::new(TyKind::Enum(enum_ty.clone()), span),
            span,
        }],
        return_type: Ty::string(span),
        body: Some(Block {
            statements,
            scope: body_scope,
            span,
        }),
        meta: None,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::modules::ModuleCache;
    use crate::parser::parse;
    use crate::span::SourceFile;
    use crate::typeck::ty::EnumMember;

    fn parsed(source: &str) -> Program {
        let file = SourceFile::new("test.enki", source);
        let tokens = lex(&file).expect("lex failed");
        let mut modules = ModuleCache::new();
        parse(&tokens, &file, &mut modules).expect("parse failed")
    }

    #[test]
    fn test_print_is_prepended() {
        let mut program = parsed("let x = 1");
        perform_injections(&mut program);
        assert_eq!(program.body.statements.len(), 2);
        let StmtKind::Function(def) = &program.body.statements[0].kind else {
            panic!("expected print definition first");
        };
        assert_eq!(def.name.name, "print");
        assert!(def.body.is_none());
        assert!(def.params[0].ty.is_any());
        assert!(def.return_type.is_void());
    }

    #[test]
    fn test_injection_is_idempotent() {
        let mut program = parsed("let x = 1");
        perform_injections(&mut program);
        let count = program.body.statements.len();
        perform_injections(&mut program);
        assert_eq!(program.body.statements.len(), count);
    }

    #[test]
    fn test_enum_to_string_shape() {
        let mut scopes = ScopeArena::new();
        let root = scopes.root();
        let enum_ty = EnumType::new(
            "Color",
            vec![
                EnumMember {
                    name: "Red".to_string(),
                    span: Span::default(),
                },
                EnumMember {
                    name: "Green".to_string(),
                    span: Span::default(),
                },
            ],
        );

        let def = build_enum_to_string(&enum_ty, Span::default(), &mut scopes, root);
        assert_eq!(def.name.name, "Color_to_string");
        assert_eq!(def.params.len(), 1);
        assert!(matches!(def.params[0].ty.kind, TyKind::Enum(_)));
        assert!(def.return_type.is_string());

        let body = def.body.expect("body");
        assert_eq!(scopes.get(body.scope).parent, Some(root));
        // One if-statement per member, in declaration order
        assert_eq!(body.statements.len(), 2);
        let StmtKind::If(first) = &body.statements[0].kind else {
            panic!("expected if-chain");
        };
        let StmtKind::Block(then_block) = &first.then_branch.kind else {
            panic!("expected block");
        };
        let StmtKind::Return(ret) = &then_block.statements[0].kind else {
            panic!("expected return");
        };
        let Some(Expr {
            kind: ExprKind::Literal(lit),
            ..
        }) = &ret.value
        else {
            panic!("expected literal return");
        };
        assert_eq!(lit.value, "Red");
    }
}
