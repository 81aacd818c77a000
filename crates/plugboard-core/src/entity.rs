//! Entities: named containers of signals and commands
//!
//! An entity is the unit of instantiation. Its class constructor declares
//! the signal set and the class-level commands; individual instances may
//! additionally bind ad-hoc commands, which shadow class commands of the
//! same name.

use indexmap::IndexMap;
use std::fmt;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::logger::{LogLevel, Logger, Verbosity};
use crate::signal::{Signal, SignalDirection};
use crate::value::{Value, ValueType};

/// A live entity instance
pub struct Entity {
    class_name: String,
    instance_name: String,
    /// Declaration order is preserved for display and iteration
    signals: IndexMap<String, Signal>,
    class_commands: IndexMap<String, Command>,
    /// Instance-level bindings, checked before the class table
    commands: IndexMap<String, Command>,
    logger: Logger,
}

impl Entity {
    /// Create an entity with the standard command set bound
    ///
    /// Every class exposes `set_verbosity(int)` and `get_verbosity() -> int`
    /// addressing the entity's logging threshold.
    pub fn new(class_name: impl Into<String>, instance_name: impl Into<String>) -> Self {
        let instance_name = instance_name.into();
        let logger = Logger::new(instance_name.clone());
        let mut entity = Self {
            class_name: class_name.into(),
            instance_name,
            signals: IndexMap::new(),
            class_commands: IndexMap::new(),
            commands: IndexMap::new(),
            logger: logger.clone(),
        };

        let setter = logger.clone();
        entity.add_class_command(
            Command::new("set_verbosity", move |args| {
                let level = args[0].as_int().unwrap_or_default();
                let verbosity =
                    Verbosity::from_int(level).ok_or_else(|| Error::CommandExecutionError {
                        command: "set_verbosity".to_string(),
                        message: format!("no verbosity level {}", level),
                    })?;
                setter.set_verbosity(verbosity);
                Ok(None)
            })
            .with_doc("Set the logging verbosity level (0 = none .. 4 = all)")
            .with_params(vec![ValueType::Int]),
        );

        let getter = logger;
        entity.add_class_command(
            Command::new("get_verbosity", move |_| {
                Ok(Some(Value::Int(getter.verbosity().as_int())))
            })
            .with_doc("Get the logging verbosity level")
            .with_return(ValueType::Int),
        );

        entity
    }

    /// Get the registered class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Get the instance name (unique within the registry)
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Get the entity's logger handle
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Get the current logging verbosity
    pub fn verbosity(&self) -> Verbosity {
        self.logger.verbosity()
    }

    /// Set the logging verbosity
    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.logger.set_verbosity(verbosity);
    }

    /// Register a signal
    ///
    /// Signal names are unique within the entity; re-registering a name
    /// replaces the previous signal and logs a warning.
    pub fn add_signal(&mut self, signal: Signal) {
        let name = signal.name();
        if self.signals.contains_key(&name) {
            self.logger.emit(
                LogLevel::Warn,
                format!("signal {} already registered, replacing", name),
            );
        }
        self.signals.insert(name, signal);
    }

    /// Create and register a signal owned by this entity
    pub fn new_signal(
        &mut self,
        name: impl Into<String>,
        direction: SignalDirection,
        ty: ValueType,
    ) -> Signal {
        let signal = Signal::new(self.instance_name.clone(), name, direction, ty);
        self.add_signal(signal.clone());
        signal
    }

    /// Deregister a signal
    pub fn remove_signal(&mut self, name: &str) -> Result<()> {
        self.signals
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownSignal {
                entity: self.instance_name.clone(),
                signal: name.to_string(),
            })
    }

    /// Get a signal handle by name
    pub fn signal(&self, name: &str) -> Result<Signal> {
        self.signals
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSignal {
                entity: self.instance_name.clone(),
                signal: name.to_string(),
            })
    }

    /// Iterate over the signals in declaration order
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Bind a class-level command (called by class constructors)
    pub fn add_class_command(&mut self, command: Command) {
        self.class_commands
            .insert(command.name().to_string(), command);
    }

    /// Bind an instance-level command
    ///
    /// Instance bindings shadow class commands of the same name; the
    /// collision is logged as a warning but the binding proceeds.
    pub fn bind_command(&mut self, command: Command) {
        let name = command.name().to_string();
        if self.class_commands.contains_key(&name) || self.commands.contains_key(&name) {
            self.logger.emit(
                LogLevel::Warn,
                format!("command {} already bound, shadowing", name),
            );
        }
        self.commands.insert(name, command);
    }

    /// Resolve a command, instance table first
    pub fn command(&self, name: &str) -> Result<&Command> {
        self.commands
            .get(name)
            .or_else(|| self.class_commands.get(name))
            .ok_or_else(|| Error::UnknownCommand {
                entity: self.instance_name.clone(),
                command: name.to_string(),
            })
    }

    /// List the bound command names, class table first
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.class_commands.keys().cloned().collect();
        for name in self.commands.keys() {
            if !self.class_commands.contains_key(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Resolve and execute a command
    pub fn execute(&self, name: &str, args: &[Value]) -> Result<Option<Value>> {
        self.command(name)?.execute(args)
    }

    /// Render the instance header and one summary line per signal
    pub fn describe(&self) -> String {
        let mut out = format!("{} ({})\n", self.instance_name, self.class_name);
        for signal in self.signals.values() {
            out.push_str("  ");
            out.push_str(&signal.summary());
            out.push('\n');
        }
        out
    }

    /// Mark every signal as belonging to a destroyed entity
    pub(crate) fn mark_destroyed(&self) {
        for signal in self.signals.values() {
            signal.mark_destroyed();
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("class", &self.class_name)
            .field("instance", &self.instance_name)
            .field("signals", &self.signals.keys().collect::<Vec<_>>())
            .field("commands", &self.command_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::BufferSink;

    fn filter_entity() -> Entity {
        let mut entity = Entity::new("filter", "f1");
        entity.new_signal("in", SignalDirection::In, ValueType::Scalar);
        entity.new_signal("gain", SignalDirection::In, ValueType::Scalar);
        entity.new_signal("out", SignalDirection::Out, ValueType::Scalar);
        entity
    }

    #[test]
    fn test_signals_keep_declaration_order() {
        let entity = filter_entity();
        let names: Vec<String> = entity.signals().map(|s| s.name()).collect();
        assert_eq!(names, vec!["in", "gain", "out"]);
    }

    #[test]
    fn test_unknown_signal() {
        let entity = filter_entity();
        assert_eq!(
            entity.signal("nope").unwrap_err(),
            Error::UnknownSignal {
                entity: "f1".to_string(),
                signal: "nope".to_string(),
            }
        );
    }

    #[test]
    fn test_remove_signal() {
        let mut entity = filter_entity();
        entity.remove_signal("gain").unwrap();
        assert!(entity.signal("gain").is_err());
        assert!(matches!(
            entity.remove_signal("gain"),
            Err(Error::UnknownSignal { .. })
        ));
    }

    #[test]
    fn test_describe() {
        let entity = filter_entity();
        entity.signal("gain").unwrap().set(2.5).unwrap();
        let text = entity.describe();
        assert!(text.starts_with("f1 (filter)\n"));
        assert!(text.contains("  in (in, scalar): -@0\n"));
        assert!(text.contains("  gain (in, scalar): 2.5@0\n"));
        assert!(text.contains("  out (out, scalar): -@0\n"));
    }

    #[test]
    fn test_standard_verbosity_commands() {
        let entity = filter_entity();
        assert!(entity.command_names().contains(&"set_verbosity".to_string()));

        entity.execute("set_verbosity", &[Value::Int(4)]).unwrap();
        assert_eq!(entity.verbosity(), Verbosity::All);

        let level = entity.execute("get_verbosity", &[]).unwrap();
        assert_eq!(level, Some(Value::Int(4)));

        let err = entity
            .execute("set_verbosity", &[Value::Int(9)])
            .unwrap_err();
        assert!(matches!(err, Error::CommandExecutionError { .. }));
    }

    #[test]
    fn test_unknown_command() {
        let entity = filter_entity();
        assert_eq!(
            entity.execute("nope", &[]).unwrap_err(),
            Error::UnknownCommand {
                entity: "f1".to_string(),
                command: "nope".to_string(),
            }
        );
    }

    #[test]
    fn test_instance_command_shadows_class_command() {
        let mut entity = filter_entity();
        entity.add_class_command(Command::new("ping", |_| Ok(Some(Value::Int(1)))));
        assert_eq!(entity.execute("ping", &[]).unwrap(), Some(Value::Int(1)));

        let sink = BufferSink::new();
        entity.logger().add_sink(sink.clone());
        entity.set_verbosity(Verbosity::WarningError);

        entity.bind_command(Command::new("ping", |_| Ok(Some(Value::Int(2)))));
        assert_eq!(entity.execute("ping", &[]).unwrap(), Some(Value::Int(2)));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("ping"));
    }
}
