//! Error types for plugboard-core

use thiserror::Error;

use crate::value::ValueType;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
///
/// Every failure is local to the operation that raised it: a failed
/// precondition mutates nothing, and nothing in the core retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Class name not present in the registry's class table
    #[error("unknown entity class: {0}")]
    UnknownEntityClass(String),

    /// Class name registered twice
    #[error("entity class already registered: {0}")]
    DuplicateClassName(String),

    /// Instance name already taken; the existing instance is untouched
    #[error("instance name already registered: {0}")]
    DuplicateInstanceName(String),

    /// Instance name not present in the registry's instance table
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// Signal name not declared by the entity
    #[error("entity {entity} has no signal {signal}")]
    UnknownSignal { entity: String, signal: String },

    /// Command name bound neither on the instance nor on the class
    #[error("entity {entity} has no command {command}")]
    UnknownCommand { entity: String, command: String },

    /// Read of a signal that has neither a value nor a value source
    #[error("signal {0} is not initialized")]
    SignalNotInitialized(String),

    /// Type tags disagree at wiring or assignment time
    #[error("type mismatch: {target} expects {expected}, {src} is {got}")]
    SignalTypeMismatch {
        /// Side providing the value (output signal, assigned value, callback result)
        src: String,
        got: ValueType,
        /// Side receiving the value
        target: String,
        expected: ValueType,
    },

    /// Traversal depth guard tripped during a pull
    #[error("dependency cycle detected while recomputing {0}")]
    GraphCycleDetected(String),

    /// Wrong number of command arguments
    #[error("command {command} takes {expected} parameters, {given} given")]
    ArityMismatch {
        command: String,
        expected: usize,
        given: usize,
    },

    /// A command argument has the wrong type; positions are 1-based
    #[error("command {command}: argument {position} should be a {expected}, got {got}")]
    CommandArgumentTypeMismatch {
        command: String,
        position: usize,
        expected: ValueType,
        got: ValueType,
    },

    /// A command handler failed; carries the handler's own message
    #[error("command {command} failed: {message}")]
    CommandExecutionError { command: String, message: String },

    /// Read through a plug whose upstream entity was destroyed
    #[error("signal {0} reads through a destroyed entity")]
    UpstreamEntityDestroyed(String),
}
