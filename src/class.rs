use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class at runtime. The class stores behaviour; state lives on instances.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Looks the method up here first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class called as a constructor has the arity of its `init`, or zero.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map_or(0, |initializer| initializer.arity())
    }

    /// Calling a class builds an instance and runs `init` (if any) bound to
    /// it.
    pub fn instantiate<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(class)));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// An instance: a class pointer plus mutable per-instance fields.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: &Rc<LoxClass>) -> Self {
        LoxInstance {
            class: Rc::clone(class),
            fields: HashMap::new(),
        }
    }

    /// Property lookup: fields shadow methods; methods come back bound to
    /// `this_value` (which must be the `Value::Instance` wrapping `self`).
    pub fn get(&self, name: &Token, this_value: &Value) -> Result<Value> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(this_value.clone()))));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Fields are freely created: assignment defines or overwrites.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
