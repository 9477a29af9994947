use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::{Interpreter, Unwind};
use crate::parser::FunctionDecl;
use crate::value::Value;

/// A user-defined function at runtime: the declaration it was built from,
/// the environment it closed over, and whether it is a class `init`.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Returns a copy of this function whose closure has `this` bound to the
    /// given instance. Method lookup goes through here so every access yields
    /// a freshly bound callable.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invokes the function: a fresh environment chained onto the closure,
    /// parameters bound left to right, then the body. A `return` unwind stops
    /// here; runtime errors keep propagating.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling <fn {}> with {} args", self.name(), arguments.len());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment = Rc::new(RefCell::new(environment));

        match interpreter.execute_block(&self.declaration.body, environment) {
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    // An initializer yields its receiver no matter what the
                    // return statement said.
                    self.this_binding()
                } else {
                    Ok(value)
                }
            }

            Err(Unwind::Error(e)) => Err(e),

            Ok(()) => {
                if self.is_initializer {
                    self.this_binding()
                } else {
                    Ok(Value::Nil)
                }
            }
        }
    }

    /// The `this` a bound initializer closed over, at distance 0 in its
    /// closure.
    fn this_binding(&self) -> Result<Value> {
        Environment::get_at(&self.closure, 0, "this", self.declaration.name.line)
    }
}
