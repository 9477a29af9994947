use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// A lexical scope at runtime: a name→value map plus a link to the enclosing
/// scope. Environments are shared (`Rc<RefCell<..>>`) because closures keep
/// the scope of their declaration site alive past its block.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Defining never fails: redefinition in the same scope overwrites.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Assignment cannot define: an unbound name anywhere up the chain is an
    /// error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Reads a binding exactly `distance` environments up. The resolver
    /// guarantees the binding exists there.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        Self::ancestor(env, distance).borrow().values.get(name).cloned().ok_or_else(|| {
            LoxError::runtime(line, format!("Undefined variable '{}'.", name))
        })
    }

    /// Writes a binding exactly `distance` environments up.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let target = Self::ancestor(env, distance);
        let mut target = target.borrow_mut();

        if target.values.contains_key(name) {
            target.values.insert(name.to_string(), value);
            Ok(())
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current
                .borrow()
                .enclosing
                .clone()
                .expect("resolver produced a distance past the environment chain");
            current = next;
        }

        current
    }
}
