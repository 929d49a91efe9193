//! Type checker for the Enki language
//!
//! The checker mutates the program in place: it fills every expression's
//! resolved-type slot, populates the scope symbol tables, resolves the
//! parser's `Unknown` type placeholders, and attaches synthesised
//! enum-to-string functions.
//!
//! # Two passes per block
//!
//! Every block (the global block and every function body) is processed in
//! two passes. The registration pass walks the block's statements and
//! registers enum definitions first, then structs, then function
//! signatures, so functions may reference types and each other regardless
//! of their order within the block. The checking pass then walks the
//! statements again and checks everything body-first.

pub mod error;
pub mod scope;
pub mod ty;

pub use error::{TypeError, TypeErrorKind, TypeResult};
pub use scope::{Scope, ScopeArena, ScopeId, Symbol, SymbolKind};
pub use ty::{
    can_assign, can_assign_with_context, types_equal, EnumMember, EnumType, FnType, StructType,
    Ty, TyKind, Variable,
};

use crate::ast::*;
use crate::inject;
use crate::span::Span;

/// Type-check a program in place
pub fn typecheck(program: &mut Program) -> TypeResult<()> {
    tracing::debug!(
        statements = program.body.statements.len(),
        "typechecker: starting"
    );
    let global = program.global_scope;
    let mut checker = TypeChecker {
        scopes: &mut program.scopes,
        scope_stack: Vec::new(),
        fn_stack: Vec::new(),
        global,
    };
    checker.check_block(&mut program.body)
}

struct TypeChecker<'a> {
    scopes: &'a mut ScopeArena,
    /// Innermost scope last; empty means the global scope
    scope_stack: Vec<ScopeId>,
    /// Enclosing function frames, innermost last
    fn_stack: Vec<FnType>,
    global: ScopeId,
}

impl<'a> TypeChecker<'a> {
    fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or(self.global)
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(self.current_scope(), name)
    }

    fn insert_symbol(&mut self, symbol: Symbol) {
        self.scopes.insert(self.current_scope(), symbol);
    }

    // ============ Blocks ============

    fn check_block(&mut self, block: &mut Block) -> TypeResult<()> {
        self.scope_stack.push(block.scope);

        self.register_signatures(&mut block.statements);
        for stmt in &mut block.statements {
            self.check_stmt(stmt)?;
        }

        self.scope_stack.pop();
        Ok(())
    }

    /// Registration pass: enums first, then structs, then functions, so
    /// function signatures can resolve type names already visible in this
    /// block regardless of statement order.
    fn register_signatures(&mut self, statements: &mut [Stmt]) {
        for stmt in statements.iter_mut() {
            if let StmtKind::Enum(def) = &mut stmt.kind {
                self.register_enum(def);
            }
        }
        for stmt in statements.iter_mut() {
            if let StmtKind::Struct(def) = &mut stmt.kind {
                self.register_struct(def);
            }
        }
        for stmt in statements.iter_mut() {
            if let StmtKind::Function(def) = &mut stmt.kind {
                self.register_function(def);
            }
        }
    }

    fn register_enum(&mut self, def: &mut EnumDef) {
        let members = def
            .members
            .iter()
            .map(|m| EnumMember {
                name: m.name.clone(),
                span: m.span,
            })
            .collect();
        let enum_ty = EnumType::new(def.name.name.clone(), members);
        def.meta = Some(enum_ty.clone());

        tracing::debug!(name = %def.name.name, "registered enum");
        self.insert_symbol(Symbol::new(
            def.name.name.clone(),
            SymbolKind::Enum,
            Ty::new(TyKind::Enum(enum_ty), def.span),
            def.span,
        ));
    }

    fn register_struct(&mut self, def: &mut StructDef) {
        let fields = def
            .fields
            .iter()
            .map(|f| Variable {
                name: f.name.name.clone(),
                ty: f.ty.clone(),
                span: f.span,
            })
            .collect();
        let struct_ty = StructType {
            name: def.name.name.clone(),
            fields,
        };
        def.meta = Some(struct_ty.clone());

        tracing::debug!(name = %def.name.name, "registered struct");
        self.insert_symbol(Symbol::new(
            def.name.name.clone(),
            SymbolKind::Struct,
            Ty::new(TyKind::Struct(struct_ty), def.span),
            def.span,
        ));
    }

    /// Register a function signature, resolving parameter and return types
    /// against the type names visible so far. Names that do not resolve yet
    /// stay `Unknown` and are reported when the definition is checked.
    fn register_function(&mut self, def: &mut FunctionDef) {
        let return_type = self.try_resolve(def.return_type.clone());
        let params = def
            .params
            .iter()
            .map(|p| Variable {
                name: p.name.name.clone(),
                ty: self.try_resolve(p.ty.clone()),
                span: p.span,
            })
            .collect();
        let fn_ty = FnType {
            name: def.name.name.clone(),
            params,
            return_type,
            scope: def.body.as_ref().map(|b| b.scope),
        };
        def.meta = Some(fn_ty.clone());

        tracing::debug!(name = %def.name.name, "registered function signature");
        self.insert_symbol(Symbol::new(
            def.name.name.clone(),
            SymbolKind::Function,
            Ty::new(TyKind::Function(Box::new(fn_ty)), def.span),
            def.span,
        ));
    }

    // ============ Statements ============

    fn check_stmt(&mut self, stmt: &mut Stmt) -> TypeResult<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::VarDecl(decl) => self.check_var_decl(decl, span),
            StmtKind::Assignment { target, value } => self.check_assignment(target, value, span),
            StmtKind::Expression { expr } => self.check_expr(expr).map(|_| ()),
            StmtKind::Return(ret) => self.check_return(ret, span),
            StmtKind::If(if_stmt) => self.check_if(if_stmt),
            StmtKind::While(while_stmt) => self.check_while(while_stmt),
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::Import(import) => self.check_import(import),
            StmtKind::Extern(def) => self.check_extern(def, span),
            StmtKind::Function(def) => self.check_function(def),
            StmtKind::Enum(def) => self.check_enum(def),
            // Structs carry no code; registration already did the work
            StmtKind::Struct(_) => Ok(()),
        }
    }

    fn check_var_decl(&mut self, decl: &mut VarDecl, span: Span) -> TypeResult<()> {
        let init_ty = self.check_expr(&mut decl.init)?;

        let final_ty = match &decl.ty {
            Some(declared) => {
                let declared = self.resolve(declared.clone())?;
                let is_type_ref = self.is_type_reference(&decl.init);
                if !can_assign_with_context(&declared, &init_ty, is_type_ref) {
                    return Err(TypeErrorKind::TypeMismatch {
                        expected: declared,
                        actual: init_ty,
                        context: "variable declaration",
                    }
                    .at(span));
                }
                declared
            }
            None => init_ty,
        };

        decl.ty = Some(final_ty.clone());
        self.insert_symbol(Symbol::new(
            decl.name.name.clone(),
            SymbolKind::Variable,
            final_ty,
            span,
        ));
        Ok(())
    }

    /// The assigned value must fit the target's declared type; the symbol
    /// itself is never retyped by an assignment.
    fn check_assignment(&mut self, target: &mut Expr, value: &mut Expr, span: Span) -> TypeResult<()> {
        let target_ty = self.check_expr(target)?;
        let value_ty = self.check_expr(value)?;

        if !can_assign(&target_ty, &value_ty) {
            return Err(TypeErrorKind::TypeMismatch {
                expected: target_ty,
                actual: value_ty,
                context: "assignment",
            }
            .at(span));
        }
        Ok(())
    }

    fn check_return(&mut self, ret: &mut ReturnStmt, span: Span) -> TypeResult<()> {
        let Some(func) = self.fn_stack.last().cloned() else {
            return Err(TypeErrorKind::ReturnOutsideFunction.at(span));
        };
        ret.enclosing_fn = Some(func.name.clone());

        if func.return_type.is_void() {
            if ret.value.is_some() {
                return Err(TypeErrorKind::ReturnInVoidHasValue.at(span));
            }
            return Ok(());
        }

        let Some(expr) = &mut ret.value else {
            return Err(TypeErrorKind::ReturnInNonVoidMissing.at(span));
        };
        let ty = self.check_expr(expr)?;
        let is_type_ref = self.is_type_reference(expr);
        if !can_assign_with_context(&func.return_type, &ty, is_type_ref) {
            return Err(TypeErrorKind::TypeMismatch {
                expected: func.return_type,
                actual: ty,
                context: "return",
            }
            .at(span));
        }
        Ok(())
    }

    fn check_if(&mut self, if_stmt: &mut IfStmt) -> TypeResult<()> {
        let cond_ty = self.check_expr(&mut if_stmt.condition)?;
        if cond_ty.is_meta() {
            return Err(TypeErrorKind::ConditionIsMetaType.at(if_stmt.condition.span));
        }
        if !cond_ty.is_bool() {
            return Err(TypeErrorKind::TypeMismatch {
                expected: Ty::bool(if_stmt.condition.span),
                actual: cond_ty,
                context: "if condition",
            }
            .at(if_stmt.condition.span));
        }

        self.check_stmt(&mut if_stmt.then_branch)?;
        if let Some(else_branch) = &mut if_stmt.else_branch {
            self.check_stmt(else_branch)?;
        }
        Ok(())
    }

    fn check_while(&mut self, while_stmt: &mut WhileStmt) -> TypeResult<()> {
        let cond_ty = self.check_expr(&mut while_stmt.condition)?;
        if cond_ty.is_meta() {
            return Err(TypeErrorKind::ConditionIsMetaType.at(while_stmt.condition.span));
        }
        if !cond_ty.is_bool() {
            return Err(TypeErrorKind::TypeMismatch {
                expected: Ty::bool(while_stmt.condition.span),
                actual: cond_ty,
                context: "while condition",
            }
            .at(while_stmt.condition.span));
        }

        self.check_stmt(&mut while_stmt.body)
    }

    fn check_import(&mut self, import: &ImportStmt) -> TypeResult<()> {
        if import.path.kind != LitKind::String {
            return Err(TypeErrorKind::ImportPathNotString.at(import.path_span));
        }
        Ok(())
    }

    fn check_extern(&mut self, def: &ExternDef, span: Span) -> TypeResult<()> {
        if self.current_scope() != self.global {
            return Err(TypeErrorKind::ExternNotGlobal.at(span));
        }

        // Argument types are registered as-is
        let params = def
            .arg_types
            .iter()
            .enumerate()
            .map(|(i, ty)| Variable {
                name: format!("arg_{}", i),
                ty: ty.clone(),
                span: ty.span,
            })
            .collect();
        let fn_ty = FnType {
            name: def.name.name.clone(),
            params,
            return_type: def.return_type.clone(),
            scope: None,
        };

        self.insert_symbol(Symbol::new(
            def.name.name.clone(),
            SymbolKind::Function,
            Ty::new(TyKind::Function(Box::new(fn_ty)), span),
            span,
        ));
        Ok(())
    }

    fn check_function(&mut self, def: &mut FunctionDef) -> TypeResult<()> {
        let name = def.name.name.clone();
        tracing::debug!(name = %name, "checking function definition");

        match self.lookup(&name) {
            Some(symbol) if symbol.kind == SymbolKind::Function => {}
            Some(_) => return Err(TypeErrorKind::NotAFunction { name }.at(def.name.span)),
            None => return Err(TypeErrorKind::UnknownSymbol { name }.at(def.name.span)),
        }

        // Fully resolve the signature; anything still unknown is an error now
        let return_type = self.resolve(def.return_type.clone())?;
        def.return_type = return_type.clone();

        let mut params = Vec::with_capacity(def.params.len());
        for param in &mut def.params {
            let ty = self.resolve(param.ty.clone())?;
            param.ty = ty.clone();
            params.push(Variable {
                name: param.name.name.clone(),
                ty,
                span: param.span,
            });
        }

        let fn_ty = FnType {
            name: name.clone(),
            params,
            return_type,
            scope: def.body.as_ref().map(|b| b.scope),
        };
        def.meta = Some(fn_ty.clone());

        // Write the resolved signature back into the defining scope so
        // later calls see it
        if let Some(scope) = self.scopes.lookup_scope(self.current_scope(), &name) {
            self.scopes.insert(
                scope,
                Symbol::new(
                    name,
                    SymbolKind::Function,
                    Ty::new(TyKind::Function(Box::new(fn_ty.clone())), def.span),
                    def.span,
                ),
            );
        }

        if let Some(body) = &mut def.body {
            // Parameters become symbols of the body scope
            for param in &fn_ty.params {
                self.scopes.insert(
                    body.scope,
                    Symbol::new(
                        param.name.clone(),
                        SymbolKind::Argument,
                        param.ty.clone(),
                        param.span,
                    ),
                );
            }

            self.fn_stack.push(fn_ty);
            let result = self.check_block(body);
            self.fn_stack.pop();
            result?;
        }
        Ok(())
    }

    fn check_enum(&mut self, def: &mut EnumDef) -> TypeResult<()> {
        let name = def.name.name.clone();

        let enum_ty = match self.lookup(&name) {
            Some(symbol) if symbol.kind == SymbolKind::Enum => match &symbol.ty.kind {
                TyKind::Enum(enum_ty) => enum_ty.clone(),
                _ => return Err(TypeErrorKind::SymbolIsNotEnum { name }.at(def.name.span)),
            },
            Some(_) => return Err(TypeErrorKind::SymbolIsNotEnum { name }.at(def.name.span)),
            None => return Err(TypeErrorKind::UnknownSymbol { name }.at(def.name.span)),
        };

        // Each member becomes a variable of the enum type in the current
        // scope
        let member_ty = Ty::new(TyKind::Enum(enum_ty.clone()), def.span);
        for member in &enum_ty.members {
            self.insert_symbol(Symbol::new(
                member.name.clone(),
                SymbolKind::Variable,
                member_ty.clone(),
                member.span,
            ));
        }

        // Synthesise and check the to-string function in this scope
        if def.to_string_fn.is_none() {
            let parent = self.current_scope();
            let mut to_string =
                inject::build_enum_to_string(&enum_ty, def.span, self.scopes, parent);
            self.register_function(&mut to_string);
            self.check_function(&mut to_string)?;
            tracing::debug!(name = %to_string.name.name, "injected enum to-string function");
            def.to_string_fn = Some(Box::new(to_string));
        }
        Ok(())
    }

    // ============ Expressions ============

    fn check_expr(&mut self, expr: &mut Expr) -> TypeResult<Ty> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Identifier { name } => match self.lookup(name) {
                Some(symbol) => Ok(symbol.ty.clone()),
                None => Err(TypeErrorKind::UnknownSymbol { name: name.clone() }.at(span)),
            },

            ExprKind::Literal(lit) => Ok(match lit.kind {
                LitKind::Int => Ty::int(span),
                LitKind::Float => Ty::float(span),
                LitKind::String => Ty::string(span),
                LitKind::Bool => Ty::bool(span),
                LitKind::Char => Ty::char(span),
            }),

            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                if !is_valid_binary_op(op, &left_ty, &right_ty) {
                    return Err(TypeErrorKind::InvalidBinaryOp {
                        op,
                        left: left_ty,
                        right: right_ty,
                    }
                    .at(span));
                }
                Ok(binary_op_result(op, &left_ty, &right_ty, span))
            }

            ExprKind::Call { callee, args } => self.check_call(callee, args, span),

            ExprKind::Dereference { inner } => {
                let inner_ty = self.check_expr(inner)?;
                match inner_ty.kind {
                    TyKind::Pointer { pointee } => self.resolve(*pointee),
                    kind => Err(TypeErrorKind::DereferenceNonPointer {
                        actual: Ty::new(kind, inner_ty.span),
                    }
                    .at(span)),
                }
            }

            ExprKind::AddressOf { inner } => {
                // Any expression may be addressed; l-value discipline is
                // not enforced in this revision
                let inner_ty = self.check_expr(inner)?;
                Ok(Ty::pointer(inner_ty, span))
            }

            ExprKind::Dot { left, right } => self.check_dot(left, right, span),

            ExprKind::StructInstantiation {
                type_name,
                args,
                resolved_struct,
            } => {
                let struct_ty = match self.lookup(&type_name.name) {
                    Some(symbol) if symbol.kind == SymbolKind::Struct => match &symbol.ty.kind {
                        TyKind::Struct(struct_ty) => struct_ty.clone(),
                        _ => {
                            return Err(TypeErrorKind::SymbolIsNotStruct {
                                name: type_name.name.clone(),
                            }
                            .at(type_name.span))
                        }
                    },
                    Some(_) => {
                        return Err(TypeErrorKind::SymbolIsNotStruct {
                            name: type_name.name.clone(),
                        }
                        .at(type_name.span))
                    }
                    None => {
                        return Err(TypeErrorKind::UnknownSymbol {
                            name: type_name.name.clone(),
                        }
                        .at(type_name.span))
                    }
                };

                if struct_ty.fields.len() != args.len() {
                    return Err(TypeErrorKind::ArgCountMismatch {
                        expected: struct_ty.fields.len(),
                        actual: args.len(),
                    }
                    .at(span));
                }

                for (arg, field) in args.iter_mut().zip(&struct_ty.fields) {
                    let arg_ty = self.check_expr(arg)?;
                    let field_ty = self.resolve(field.ty.clone())?;
                    if !can_assign(&field_ty, &arg_ty) {
                        return Err(TypeErrorKind::TypeMismatch {
                            expected: field_ty,
                            actual: arg_ty,
                            context: "struct field",
                        }
                        .at(arg.span));
                    }
                }

                *resolved_struct = Some(struct_ty.clone());
                Ok(Ty::new(TyKind::Struct(struct_ty), span))
            }
        }?;

        expr.ty = Some(ty.clone());
        Ok(ty)
    }

    fn check_call(&mut self, callee: &mut Expr, args: &mut [Expr], span: Span) -> TypeResult<Ty> {
        let ExprKind::Identifier { name } = &callee.kind else {
            return Err(TypeErrorKind::NotAFunction {
                name: "<expression>".to_string(),
            }
            .at(callee.span));
        };
        let name = name.clone();

        let fn_ty = match self.lookup(&name) {
            Some(symbol) if symbol.kind == SymbolKind::Function => match &symbol.ty.kind {
                TyKind::Function(fn_ty) => fn_ty.clone(),
                _ => return Err(TypeErrorKind::NotAFunction { name }.at(callee.span)),
            },
            Some(_) => return Err(TypeErrorKind::NotAFunction { name }.at(callee.span)),
            None => return Err(TypeErrorKind::UnknownSymbol { name }.at(callee.span)),
        };
        callee.ty = Some(Ty::new(TyKind::Function(fn_ty.clone()), callee.span));

        if args.len() != fn_ty.params.len() {
            return Err(TypeErrorKind::ArgCountMismatch {
                expected: fn_ty.params.len(),
                actual: args.len(),
            }
            .at(span));
        }

        for (arg, param) in args.iter_mut().zip(&fn_ty.params) {
            let arg_ty = self.check_expr(arg)?;
            let is_type_ref = self.is_type_reference(arg);
            if !can_assign_with_context(&param.ty, &arg_ty, is_type_ref) {
                return Err(TypeErrorKind::TypeMismatch {
                    expected: param.ty.clone(),
                    actual: arg_ty,
                    context: "argument",
                }
                .at(arg.span));
            }
        }

        Ok(fn_ty.return_type.clone())
    }

    fn check_dot(&mut self, left: &mut Expr, right: &mut Expr, span: Span) -> TypeResult<Ty> {
        let left_ty = self.check_expr(left)?;

        // Only an identifier is meaningful on the right of a dot
        let member = match &right.kind {
            ExprKind::Identifier { name } => Some(name.clone()),
            _ => None,
        };

        let ty = match (&left_ty.kind, member) {
            (TyKind::Struct(struct_ty), Some(field_name)) => {
                let Some(field) = struct_ty.field(&field_name) else {
                    return Err(TypeErrorKind::StructFieldNotFound {
                        struct_name: struct_ty.name.clone(),
                        field: field_name,
                    }
                    .at(right.span));
                };
                self.resolve(field.ty.clone())?
            }
            (TyKind::Enum(enum_ty), Some(member_name)) => {
                if enum_ty.member(&member_name).is_none() {
                    return Err(TypeErrorKind::EnumMemberNotFound {
                        enum_name: enum_ty.name.clone(),
                        member: member_name,
                    }
                    .at(right.span));
                }
                // An enum member's type is the enum itself
                left_ty.clone()
            }
            _ => return Err(TypeErrorKind::InvalidMemberAccess { left: left_ty }.at(span)),
        };

        right.ty = Some(ty.clone());
        Ok(ty)
    }

    // ============ Type resolution ============

    /// Resolve `Unknown` type placeholders through the scope chain,
    /// recursing through pointers. Unresolvable names are an error.
    fn resolve(&self, ty: Ty) -> TypeResult<Ty> {
        match ty.kind {
            TyKind::Unknown { name } => match self.lookup(&name) {
                Some(symbol)
                    if matches!(symbol.kind, SymbolKind::Enum | SymbolKind::Struct) =>
                {
                    Ok(Ty::new(symbol.ty.kind.clone(), ty.span))
                }
                _ => Err(TypeErrorKind::UnresolvedType { name }.at(ty.span)),
            },
            TyKind::Pointer { pointee } => Ok(Ty::pointer(self.resolve(*pointee)?, ty.span)),
            _ => Ok(ty),
        }
    }

    /// Like `resolve`, but leaves names that are not visible yet untouched.
    /// Used during signature registration.
    fn try_resolve(&self, ty: Ty) -> Ty {
        match ty.kind {
            TyKind::Unknown { ref name } => match self.lookup(name) {
                Some(symbol)
                    if matches!(symbol.kind, SymbolKind::Enum | SymbolKind::Struct) =>
                {
                    Ty::new(symbol.ty.kind.clone(), ty.span)
                }
                _ => ty,
            },
            TyKind::Pointer { pointee } => {
                let span = ty.span;
                Ty::pointer(self.try_resolve(*pointee), span)
            }
            _ => ty,
        }
    }

    /// Whether an expression is a type reference: an identifier whose
    /// symbol names an enum, a struct, or a primitive-typed binding. Only
    /// these may flow into a `type` meta-parameter.
    fn is_type_reference(&self, expr: &Expr) -> bool {
        let ExprKind::Identifier { name } = &expr.kind else {
            return false;
        };
        let Some(symbol) = self.lookup(name) else {
            return false;
        };
        matches!(symbol.kind, SymbolKind::Enum | SymbolKind::Struct) || symbol.ty.is_primitive()
    }
}

// ============ Binary operator rules ============

/// Whether `op` is defined for the given operand types. The meta-type never
/// participates in binary operators.
fn is_valid_binary_op(op: BinaryOp, left: &Ty, right: &Ty) -> bool {
    if left.is_meta() || right.is_meta() {
        return false;
    }
    if op.is_arithmetic() || op.is_comparison() {
        return left.is_numeric() && right.is_numeric();
    }
    // == and !=
    types_equal(left, right)
}

/// The result type of a valid binary operation: arithmetic promotes to
/// float when either side is float, comparisons and equality give bool.
fn binary_op_result(op: BinaryOp, left: &Ty, right: &Ty, span: Span) -> Ty {
    if op.is_arithmetic() {
        if left.is_float() || right.is_float() {
            Ty::float(span)
        } else {
            Ty::int(span)
        }
    } else {
        Ty::bool(span)
    }
}
