//! Typed commands invocable on entities
//!
//! A command carries its parameter signature; dispatch validates arity and
//! per-position argument types before the handler runs, so handlers only
//! ever see well-typed argument slices.

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{Value, ValueType};

/// Handler invoked after arity and type validation
pub type CommandFn = Rc<dyn Fn(&[Value]) -> Result<Option<Value>>>;

/// A named, documented, typed operation bound to an entity
#[derive(Clone)]
pub struct Command {
    name: String,
    doc: String,
    params: Vec<ValueType>,
    returns: Option<ValueType>,
    handler: CommandFn,
}

impl Command {
    /// Create a command with an empty signature
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&[Value]) -> Result<Option<Value>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            params: Vec::new(),
            returns: None,
            handler: Rc::new(handler),
        }
    }

    /// Set the docstring
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Set the ordered parameter types
    pub fn with_params(mut self, params: Vec<ValueType>) -> Self {
        self.params = params;
        self
    }

    /// Set the return type
    pub fn with_return(mut self, ty: ValueType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Get the command name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the docstring
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Get the ordered parameter types
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Get the return type, if the command returns anything
    pub fn returns(&self) -> Option<ValueType> {
        self.returns
    }

    /// Validate the arguments and invoke the handler
    ///
    /// Arity is checked first, then each argument against its declared
    /// parameter type (positions are 1-based in the error; an `Int` is
    /// accepted and widened where a `Scalar` is declared). A failure inside
    /// the handler is wrapped as [`Error::CommandExecutionError`] carrying
    /// the original message.
    pub fn execute(&self, args: &[Value]) -> Result<Option<Value>> {
        if args.len() != self.params.len() {
            return Err(Error::ArityMismatch {
                command: self.name.clone(),
                expected: self.params.len(),
                given: args.len(),
            });
        }
        let mut coerced = Vec::with_capacity(args.len());
        for (position, (arg, ty)) in args.iter().zip(&self.params).enumerate() {
            match arg.clone().coerce_to(*ty) {
                Some(value) => coerced.push(value),
                None => {
                    return Err(Error::CommandArgumentTypeMismatch {
                        command: self.name.clone(),
                        position: position + 1,
                        expected: *ty,
                        got: arg.value_type(),
                    })
                }
            }
        }
        (self.handler)(&coerced).map_err(|err| match err {
            already @ Error::CommandExecutionError { .. } => already,
            other => Error::CommandExecutionError {
                command: self.name.clone(),
                message: other.to_string(),
            },
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}
