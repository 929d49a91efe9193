//! C++ back-end
//!
//! Emits a single C++ translation unit from a fully typed AST via a
//! read-only depth-first traversal. The front-end guarantees every
//! expression carries a resolved type with no `Unknown` bases left, which
//! this pass relies on when lowering dot access and declarations.
//!
//! `print` has no user-visible body; calls to it are recognised by name and
//! lowered to a `std::cout` chain. Externs emit nothing; the module path is
//! a hint for the host link step.

use crate::ast::*;
use crate::inject::PRINT_FN;
use crate::typeck::ty::{Ty, TyKind};

/// Generate the C++ translation unit for a typed program
pub fn codegen(program: &Program) -> String {
    tracing::debug!("codegen: starting");
    let mut gen = Codegen::default();
    gen.out.push_str("#include <iostream>\n");
    gen.out.push_str("#include <string>\n");
    gen.out.push_str("#include <stdlib.h>\n");

    for stmt in &program.body.statements {
        gen.gen_stmt(stmt);
    }
    gen.out
}

#[derive(Default)]
struct Codegen {
    out: String,
}

/// Render a C-style declarator: the type name followed by the declared
/// name, with pointers nesting into the name.
fn type_with_name(ty: &Ty, name: &str) -> String {
    match &ty.kind {
        TyKind::Int => format!("int {}", name),
        TyKind::Float => format!("float {}", name),
        TyKind::String => format!("std::string {}", name),
        TyKind::Bool => format!("bool {}", name),
        TyKind::Void => format!("void {}", name),
        TyKind::Char => format!("char {}", name),
        TyKind::Enum(e) => format!("{} {}", e.name, name),
        TyKind::Struct(s) => format!("{} {}", s.name, name),
        TyKind::Pointer { pointee } => type_with_name(pointee, &format!("*{}", name)),
        other => {
            // The type checker leaves none of these in declarations
            tracing::warn!(?other, "unexpected type in code generation");
            format!("void {}", name)
        }
    }
}

impl Codegen {
    fn gen_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Function(def) => self.gen_function(def),
            StmtKind::Enum(def) => {
                self.gen_enum(def);
                if let Some(to_string) = &def.to_string_fn {
                    self.gen_function(to_string);
                }
            }
            StmtKind::Struct(def) => self.gen_struct(def),
            // Externs are resolved by the host tool chain
            StmtKind::Extern(_) => {}
            StmtKind::Import(_) => {}
            StmtKind::VarDecl(decl) => self.gen_var_decl(decl),
            StmtKind::If(if_stmt) => self.gen_if(if_stmt),
            StmtKind::While(while_stmt) => {
                self.out.push_str("while (");
                self.gen_expr(&while_stmt.condition);
                self.out.push(')');
                self.gen_stmt(&while_stmt.body);
            }
            StmtKind::Block(block) => self.gen_block(block),
            StmtKind::Assignment { target, value } => {
                self.gen_expr(target);
                self.out.push_str(" = ");
                self.gen_expr(value);
                self.out.push_str(";\n");
            }
            StmtKind::Expression { expr } => {
                self.gen_expr(expr);
                self.out.push_str(";\n");
            }
            StmtKind::Return(ret) => {
                self.out.push_str("return");
                if let Some(value) = &ret.value {
                    self.out.push(' ');
                    self.gen_expr(value);
                }
                self.out.push_str(";\n");
            }
        }
    }

    fn gen_function(&mut self, def: &FunctionDef) {
        // Bodiless built-ins have no C++ counterpart
        let Some(body) = &def.body else { return };

        self.out
            .push_str(&type_with_name(&def.return_type, &def.name.name));
        self.out.push('(');
        for (i, param) in def.params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out
                .push_str(&type_with_name(&param.ty, &param.name.name));
        }
        self.out.push(')');
        self.gen_block(body);
    }

    fn gen_enum(&mut self, def: &EnumDef) {
        self.out
            .push_str(&format!("enum class {} {{\n", def.name.name));
        for member in &def.members {
            self.out.push_str(&format!("  {},\n", member.name));
        }
        self.out.push_str("};\n");
    }

    fn gen_struct(&mut self, def: &StructDef) {
        self.out.push_str(&format!("struct {} {{\n", def.name.name));
        for field in &def.fields {
            self.out.push_str("  ");
            self.out
                .push_str(&type_with_name(&field.ty, &field.name.name));
            self.out.push_str(";\n");
        }
        self.out.push_str("};\n");
    }

    fn gen_var_decl(&mut self, decl: &VarDecl) {
        let Some(ty) = decl.ty.as_ref() else {
            tracing::warn!(name = %decl.name.name, "declaration without a resolved type");
            return;
        };
        self.out.push_str(&type_with_name(ty, &decl.name.name));
        self.out.push_str(" = ");
        self.gen_expr(&decl.init);
        self.out.push_str(";\n");
    }

    fn gen_if(&mut self, if_stmt: &IfStmt) {
        self.out.push_str("if (");
        self.gen_expr(&if_stmt.condition);
        self.out.push(')');
        self.gen_stmt(&if_stmt.then_branch);
        if let Some(else_branch) = &if_stmt.else_branch {
            self.out.push_str(" else ");
            self.gen_stmt(else_branch);
        }
    }

    fn gen_block(&mut self, block: &Block) {
        self.out.push_str("{\n");
        for stmt in &block.statements {
            self.gen_stmt(stmt);
        }
        self.out.push_str("}\n");
    }

    fn gen_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Identifier { name } => self.out.push_str(name),

            ExprKind::Literal(lit) => match lit.kind {
                LitKind::String => self.out.push_str(&format!("\"{}\"", lit.value)),
                LitKind::Char => self.out.push_str(&format!("'{}'", lit.value)),
                _ => self.out.push_str(&lit.value),
            },

            ExprKind::Binary { op, left, right } => {
                self.out.push('(');
                self.gen_expr(left);
                self.out.push_str(&format!(" {} ", op));
                self.gen_expr(right);
                self.out.push(')');
            }

            ExprKind::Call { callee, args } => self.gen_call(callee, args),

            ExprKind::Dereference { inner } => {
                self.out.push_str("(*(");
                self.gen_expr(inner);
                self.out.push_str("))");
            }

            ExprKind::AddressOf { inner } => {
                self.out.push_str("(&(");
                self.gen_expr(inner);
                self.out.push_str("))");
            }

            ExprKind::Dot { left, right } => {
                self.gen_expr(left);
                // Enum members are scoped in C++, struct fields are not
                let is_enum = matches!(
                    left.ty.as_ref().map(|t| &t.kind),
                    Some(TyKind::Enum(_))
                );
                self.out.push_str(if is_enum { "::" } else { "." });
                self.gen_expr(right);
            }

            ExprKind::StructInstantiation {
                type_name, args, ..
            } => {
                self.out.push_str(&type_name.name);
                self.out.push('{');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.gen_expr(arg);
                }
                self.out.push('}');
            }
        }
    }

    fn gen_call(&mut self, callee: &Expr, args: &[Expr]) {
        if let ExprKind::Identifier { name } = &callee.kind {
            if name == PRINT_FN {
                self.out.push_str("std::cout << ");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(" << ");
                    }
                    self.gen_expr(arg);
                }
                self.out.push_str(" << std::endl");
                return;
            }
        }

        self.gen_expr(callee);
        self.out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.gen_expr(arg);
        }
        self.out.push(')');
    }
}
