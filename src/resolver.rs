//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (`false`) and fully defined (`true`) names per block or
//!    function body.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, returning
//!    a value from `init`, and `this`/`super` misuse.
//! 3. **Records binding distances**: every `Variable`, `Assign`, `This` and
//!    `Super` occurrence is reported to the interpreter with the number of
//!    environments between its use site and its binding. Names that escape
//!    every scope are globals and get no entry.
//!
//! Errors accumulate; the walk always finishes so one mistake does not mask
//! the next.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::{Expr, FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body we are inside. Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are inside. Validates `this` and `super`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances by calling back into the interpreter.
pub struct Resolver<'interp, W: Write> {
    interpreter: &'interp mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'interp, W: Write> Resolver<'interp, W> {
    pub fn new(interpreter: &'interp mut Interpreter<W>) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walks all top-level statements and returns every static error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Vec<LoxError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.errors
    }

    fn report(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve_at(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare first so the initializer can be checked for reading
                // the name it is about to define.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declared and defined eagerly so the body can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.report(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.report(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), methods);
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
    ) {
        // 1. Declare & define the class name so methods can refer to it.
        self.declare(name);
        self.define(name);

        // 2. Enter the class context.
        let enclosing_class: ClassType = self.current_class;

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        // 3. Resolve the superclass and open the synthetic `super` scope.
        if let Some(super_expr) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = super_expr
            {
                if super_name.lexeme == name.lexeme {
                    self.report(super_name, "A class can't inherit from itself.");
                }
            }

            self.resolve_expr(super_expr);

            self.begin_scope();
            self.scope_define("super");
        }

        // 4. The synthetic `this` scope wraps every method body.
        self.begin_scope();
        self.scope_define("this");

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(kind, method);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        // 5. Restore the outer class context.
        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // `var a = a;` reads the declared-but-undefined binding.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.report(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.report(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.report(keyword, "Can't use 'super' outside of a class.");
                        return;
                    }

                    ClassType::Class => {
                        self.report(
                            keyword,
                            "Can't use 'super' in a class with no superclass.",
                        );
                        return;
                    }

                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.report(name, "Already a variable with this name in this scope.");
                return;
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Pre-defines a synthetic name (`this` / `super`) in the current scope.
    fn scope_define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its lexical depth, or leave it to
    /// the global environment when no scope holds it.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
