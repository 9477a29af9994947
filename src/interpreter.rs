//! Tree-walking evaluator.
//!
//! Owns the environment chain, the resolver's expression-id → scope-distance
//! table, and the output sink that `print` writes to. Statements execute in
//! source order; expressions evaluate strictly left to right apart from the
//! short-circuiting `and` / `or`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::parser::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Control-flow unwind used inside the evaluator.
///
/// `return` is not an error: it carries the returned value up to the nearest
/// enclosing call frame, which absorbs it. Runtime errors ride the same
/// channel but pass through call frames untouched, all the way to
/// [`Interpreter::interpret`].
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Scope distances recorded by the resolver, keyed by expression id.
    /// Expressions with no entry are globals.
    locals: HashMap<usize, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Records a resolved local: the expression with this id reads its
    /// binding exactly `depth` environments up. Called by the resolver.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        debug!("Noting local: expr #{} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Runs a program. A runtime error aborts execution and is returned; the
    /// environment keeps whatever definitions completed before it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                // The resolver rejects top-level returns, so an unwind that
                // reaches here carries no value worth keeping.
                Err(Unwind::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let child =
                    Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(child)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Runs `statements` inside `environment`, restoring the previous
    /// environment on every exit path, unwinds included.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> std::result::Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        for stmt in statements {
            if let Err(unwound) = self.execute(stmt) {
                self.environment = previous;
                return Err(unwound);
            }
        }

        self.environment = previous;

        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> std::result::Result<(), Unwind> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(Unwind::Error(LoxError::runtime(
                        line,
                        "Superclass must be a class.",
                    )));
                }
            },

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // When subclassing, method closures capture a synthetic environment
        // that binds `super` to the superclass.
        let method_closure: Rc<RefCell<Environment>> = match &superclass_value {
            Some(class) => {
                let mut env = Environment::with_enclosing(Rc::clone(&self.environment));
                env.define("super", Value::Class(Rc::clone(class)));
                Rc::new(RefCell::new(env))
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            let is_initializer = declaration.name.lexeme == "init";

            let function = LoxFunction::new(
                Rc::clone(declaration),
                Rc::clone(&method_closure),
                is_initializer,
            );

            method_map.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let class = Value::Class(Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            method_map,
        )));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, class, name.line)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let value = self.evaluate(right)?;
                Ok(evaluate_unary(operator, value)?)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                Ok(evaluate_binary(left_val, operator, right_val)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                // Short-circuit: the left value itself is the result when it
                // decides the answer.
                match operator.token_type {
                    TokenType::OR if is_truthy(&left_val) => Ok(left_val),
                    TokenType::AND if !is_truthy(&left_val) => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => Ok(self.look_up_variable(*id, name)?),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, args, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let this_value = Value::Instance(Rc::clone(&instance));
                    Ok(instance.borrow().get(name, &this_value)?)
                }

                _ => Err(Unwind::Error(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                ))),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;
                    instance.borrow_mut().set(name, value.clone());
                    Ok(value)
                }

                _ => Err(Unwind::Error(LoxError::runtime(
                    name.line,
                    "Only instances have fields.",
                ))),
            },

            Expr::This { id, keyword } => Ok(self.look_up_variable(*id, keyword)?),

            Expr::Super {
                id,
                keyword,
                method,
            } => Ok(self.evaluate_super(*id, keyword, method)?),
        }
    }

    fn evaluate_super(&mut self, id: usize, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&d) => d,
            None => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Undefined variable 'super'.",
                ))
            }
        };

        let superclass: Rc<LoxClass> =
            match Environment::get_at(&self.environment, distance, "super", keyword.line)? {
                Value::Class(class) => class,
                _ => {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Superclass must be a class.",
                    ))
                }
            };

        // `this` lives one environment nearer than `super`.
        let object: Value =
            Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?;

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Callee dispatch: native functions, user functions, and classes are
    /// callable; everything else is a runtime error. Arity is checked before
    /// invocation.
    fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> std::result::Result<Value, Unwind> {
        let result: Result<Value> = match callee {
            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity, arguments.len(), paren)?;
                func(&arguments)
            }

            Value::Function(function) => {
                check_arity(function.arity(), arguments.len(), paren)?;
                function.call(self, arguments)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arguments.len(), paren)?;
                LoxClass::instantiate(&class, self, arguments)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        };

        result.map_err(Unwind::Error)
    }

    fn look_up_variable(&self, id: usize, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        ))
    }
}

fn evaluate_unary(operator: &Token, value: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::MINUS => match value {
            Value::Number(n) => Ok(Value::Number(-n)),

            _ => Err(LoxError::runtime(
                operator.line,
                "Operand must be a number.",
            )),
        },

        TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

        _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
    }
}

fn evaluate_binary(left: Value, operator: &Token, right: Value) -> Result<Value> {
    let numbers_error =
        || LoxError::runtime(operator.line, "Operands must be numbers.");

    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

            _ => Err(LoxError::runtime(
                operator.line,
                "Operands must be two numbers or two strings.",
            )),
        },

        TokenType::MINUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

            _ => Err(numbers_error()),
        },

        TokenType::STAR => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

            _ => Err(numbers_error()),
        },

        TokenType::SLASH => match (left, right) {
            (Value::Number(a), Value::Number(b)) => {
                if b == 0.0 {
                    Err(LoxError::runtime(operator.line, "Division by zero."))
                } else {
                    Ok(Value::Number(a / b))
                }
            }

            _ => Err(numbers_error()),
        },

        TokenType::GREATER => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

            _ => Err(numbers_error()),
        },

        TokenType::GREATER_EQUAL => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

            _ => Err(numbers_error()),
        },

        TokenType::LESS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

            _ => Err(numbers_error()),
        },

        TokenType::LESS_EQUAL => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

            _ => Err(numbers_error()),
        },

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

        TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

        _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
    }
}

/// `nil` and `false` are falsey; everything else, `0` and `""` included, is
/// truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("clock: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
