//! Plugboard Core - dynamic computation-graph runtime
//!
//! This crate provides the entity/signal runtime underlying real-time
//! control software:
//! - Dynamic value types ([`Value`], [`ValueType`])
//! - Typed, time-stamped, lazily recomputed signals ([`Signal`])
//! - Entities as named containers of signals and commands ([`Entity`])
//! - Run-time wiring of output signals into input signals ([`plug`])
//! - A class catalog and live-instance registry ([`Registry`])
//! - Per-entity logging with a verbosity ladder ([`Logger`])
//!
//! A host process registers entity classes, instantiates and wires them
//! during a configuration phase, then drives the graph by advancing a
//! [`Clock`] and pulling output signals once per cycle. Evaluation is
//! pull-based and memoized by tick: branches nobody reads are never
//! computed, and a signal recomputes at most once per tick.
//!
//! ```
//! use plugboard_core::{Entity, Registry, SignalDirection, Value, ValueType};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register_class("doubler", |class, instance| {
//!         let mut entity = Entity::new(class, instance);
//!         let input = entity.new_signal("in", SignalDirection::In, ValueType::Scalar);
//!         let out = entity.new_signal("out", SignalDirection::Out, ValueType::Scalar);
//!         out.set_callback(move |t| {
//!             let x = input.get(t)?.as_scalar().unwrap_or_default();
//!             Ok(Value::Scalar(2.0 * x))
//!         });
//!         Ok(entity)
//!     })
//!     .unwrap();
//!
//! let stage = registry.create("doubler", "stage").unwrap();
//! stage.borrow().signal("in").unwrap().set(21.0).unwrap();
//! let out = stage.borrow().signal("out").unwrap();
//! assert_eq!(out.get(1).unwrap(), Value::Scalar(42.0));
//! ```

mod command;
mod entity;
mod error;
mod logger;
mod registry;
mod signal;
mod time;
mod value;

pub use command::{Command, CommandFn};
pub use entity::Entity;
pub use error::{Error, Result};
pub use logger::{BufferSink, ConsoleSink, LogEntry, LogLevel, LogSink, Logger, Verbosity};
pub use registry::{ClassBuilder, EntityHandle, Registry};
pub use signal::{plug, unplug, Callback, Signal, SignalDirection};
pub use time::{Clock, Tick};
pub use value::{Value, ValueType};
