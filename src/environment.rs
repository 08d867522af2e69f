use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Position, TinyTalkError},
    value::Value,
};

pub type EnvironmentRef = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            bindings: IndexMap::new(),
        }))
    }

    pub fn with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            bindings: IndexMap::new(),
        }))
    }

    /// Declares a name in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: String, value: Value, mutable: bool) {
        self.bindings.insert(name, Binding { value, mutable });
    }

    /// Assigns to the nearest scope that declares `name`, preserving
    /// closure-over-mutable-variable semantics.
    pub fn assign(
        env: &EnvironmentRef,
        name: &str,
        value: Value,
        pos: Position,
    ) -> Result<(), TinyTalkError> {
        if let Some(binding) = env.borrow_mut().bindings.get_mut(name) {
            if !binding.mutable {
                return Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Type,
                        format!("cannot assign to immutable binding `{name}`"),
                    )
                    .at(pos),
                ));
            }
            binding.value = value;
            return Ok(());
        }
        if let Some(parent) = env.borrow().parent.clone() {
            return Environment::assign(&parent, name, value, pos);
        }
        Err(TinyTalkError::from(
            Diagnostic::new(
                DiagnosticKind::Name,
                format!("undefined variable `{name}`"),
            )
            .at(pos),
        ))
    }

    pub fn get(
        env: &EnvironmentRef,
        name: &str,
        pos: Position,
    ) -> Result<Value, TinyTalkError> {
        if let Some(binding) = env.borrow().bindings.get(name) {
            return Ok(binding.value.clone());
        }
        if let Some(parent) = env.borrow().parent.clone() {
            return Environment::get(&parent, name, pos);
        }
        Err(TinyTalkError::from(
            Diagnostic::new(
                DiagnosticKind::Name,
                format!("undefined variable `{name}`"),
            )
            .at(pos),
        ))
    }
}

#[derive(Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}
